//! Errors surfaced to a caller of a [`ClientStub`](crate::client::ClientStub).
//!
//! Mirrors the error taxonomy in spec.md §7: a remote failure (handler threw,
//! codec rejected input, or a filter matched), a timeout, or the channel
//! having closed out from under an in-flight call. The latter collapses into
//! whichever of the first two observes it first, exactly as spec.md
//! prescribes, so callers only ever match on two variants.

use derive_more::{Display, Error, From};

/// Error returned to a caller when a method invocation does not produce a
/// [`Status::Success`](crate::common::Status) response.
#[derive(Clone, Debug, Display, Error, From, PartialEq, Eq)]
pub enum CallError {
    /// The handler threw, the codec rejected the arguments, or a filter
    /// matched the method. Carries the server-provided description verbatim.
    #[display(fmt = "{_0}")]
    Failed(#[error(not(source))] String),

    /// The per-call timeout elapsed before a response arrived.
    #[display(fmt = "call timed out")]
    Timeout,
}

impl CallError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CallError::Timeout)
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        CallError::Failed(msg.into())
    }
}

/// Programmer-error conditions that spec.md §7 says must abort the actor
/// loudly rather than be surfaced to a caller: an unrecognized method tag
/// reaching `handle()`, or two tasks parked on the same waiting-manager id.
///
/// These are never returned from a public API; they are passed to
/// `panic!` at the single call site in each component that can detect them,
/// so the actor's `JoinHandle` observably dies instead of the invariant
/// silently rotting server state.
#[derive(Clone, Debug, Display, Error)]
pub enum Aborted {
    #[display(fmt = "no handler registered for method tag {tag:?}")]
    UnknownMethod { tag: String },

    #[display(fmt = "waiting manager already has a parked waiter for id {id}")]
    DuplicateWaiter { id: u64 },
}
