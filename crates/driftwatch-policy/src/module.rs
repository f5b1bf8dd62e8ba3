use crate::input::PolicyInput;
use crate::result::PolicyResult;

/// One named, pre-compiled rule module. The pluggable contract a Rego-class
/// engine would sit behind; this crate ships two ordinary Rust structs that
/// implement it directly (see [`crate::builtin`]).
///
/// `evaluate` returns `None` when the module has nothing to say about this
/// resource — it did not match, not that it matched with an `allow`.
pub trait PolicyModule: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, input: &PolicyInput) -> Option<PolicyResult>;
}
