//! The error taxonomy of spec.md §7, as a single `snafu`-derived enum.
//!
//! Each component crate (`o2ims-transport`, `o2ims-repository`,
//! `o2ims-collector`, `o2ims-alarm-dictionary`, `o2ims-alarm-events`,
//! `o2ims-notifier`) defines its own scoped error type and `impl From<..>
//! for CoreError` at the `o2ims-agent` boundary, the same shape the teacher
//! uses to fold `StoreError`/`SvcError` into `ReplyError`
//! (`common/src/types/mod.rs`).

use snafu::Snafu;

pub type CoreResult<T> = Result<T, CoreError>;

/// The six error categories of spec.md §7. Each carries a human message and,
/// where one exists, the `source` error that caused it.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CoreError {
    /// Startup-fatal: missing or invalid configuration (spec.md §7).
    #[snafu(display("configuration error: {details}"))]
    Config { details: String },

    /// Network/DB failures and 5xx responses; retried at C1 or by
    /// rerunning the enclosing reconcile loop (spec.md §7).
    #[snafu(display("transient error: {details}"))]
    Transient { details: String },

    /// A malformed upstream payload; the offending record is skipped and
    /// logged, the run continues (spec.md §7).
    #[snafu(display("invalid input: {details}"))]
    Input { details: String },

    /// Surfaced to API callers as 404; never fatal internally (spec.md §7).
    #[snafu(display("{resource} not found"))]
    NotFound { resource: String },

    /// A unique-constraint violation, e.g. on a subscription callback URL;
    /// surfaced as 400 (spec.md §7).
    #[snafu(display("conflict: {details}"))]
    Conflict { details: String },

    /// "Expected 1 record, got N" and similar: the run aborts and is
    /// retried on the next tick (spec.md §7).
    #[snafu(display("invariant violated: {details}"))]
    FatalInvariant { details: String },
}

impl CoreError {
    pub fn config(details: impl Into<String>) -> Self {
        Self::Config { details: details.into() }
    }

    pub fn transient(details: impl Into<String>) -> Self {
        Self::Transient { details: details.into() }
    }

    pub fn input(details: impl Into<String>) -> Self {
        Self::Input { details: details.into() }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn conflict(details: impl Into<String>) -> Self {
        Self::Conflict { details: details.into() }
    }

    pub fn fatal_invariant(details: impl Into<String>) -> Self {
        Self::FatalInvariant { details: details.into() }
    }

    /// Whether the producing operation should simply be retried on the next
    /// tick rather than treated as a hard failure (spec.md §7's propagation
    /// rules for C3/C4/C5).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::FatalInvariant { .. })
    }
}
