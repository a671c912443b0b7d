//! Confirmation policy for destructive card operations.
//!
//! The card store consults an injected policy before deletes, unlinks and
//! tag removals. UI shells can wire this to an actual prompt; programmatic
//! callers keep the default that always allows.

/// Decides whether a destructive operation proceeds.
pub trait ConfirmPolicy {
    /// Returns true when the operation described by `prompt` may proceed.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Default policy: every operation proceeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllow;

impl ConfirmPolicy for AlwaysAllow {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Policy that declines everything. Useful in tests and dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl ConfirmPolicy for DenyAll {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Adapter turning a closure into a policy.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmFn<F>(pub F);

impl<F> ConfirmPolicy for ConfirmFn<F>
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        (self.0)(prompt)
    }
}
