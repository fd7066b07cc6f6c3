//! Identifiers and control-plane commands (spec.md §3, §6).

use std::time::Duration;

/// A request id, unique within the scope of the [`WaitingManager`](crate::client::WaitingManager)
/// that issued it.
///
/// spec.md §9 deliberately tightens this away from a process-global counter:
/// each `WaitingManager` owns its own `u64` sequence, so tests spinning up
/// many actors get independent id sequences and no cross-stub id collision is
/// possible even under a handler-vs-handler race.
pub type Id = u64;

/// An opaque, deterministic identifier for one overload of one service
/// method, contributed by the (external) reflection layer described in
/// spec.md §6. This crate never inspects the bytes of a tag, only compares
/// them for equality and prints them for diagnostics.
pub type MethodTag = String;

/// The one method tag this crate reserves for itself. A request bearing this
/// tag is never dispatched to the user implementation; it instructs the
/// [`ServerLoop`](crate::server::ServerLoop) to terminate (spec.md §4.4, §6).
pub const SHUTDOWN_METHOD_TAG: &str = "shutdown@command";

/// Enqueued on an actor's `sleep` channel to enter or extend a sleep window
/// (spec.md §3).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SleepCmd {
    /// How long from the moment this command is processed the actor should
    /// remain asleep.
    pub duration: Duration,
    /// Whether requests arriving during the window are discarded (`true`)
    /// or merely deferred until the window ends (`false`).
    pub drop: bool,
}

impl SleepCmd {
    pub fn new(duration: Duration, drop: bool) -> Self {
        Self { duration, drop }
    }
}

/// Enqueued on an actor's `filter` channel to install or clear a method
/// filter (spec.md §3, §6).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCmd {
    /// The tag to reject, and the human-readable name to quote back to the
    /// caller in the synthesized failure description. `None` clears the
    /// filter.
    entry: Option<(MethodTag, String)>,
}

impl FilterCmd {
    /// Builds a filter that rejects `tag`, describing it as `pretty` in the
    /// failure message a matching caller sees.
    pub fn reject(tag: MethodTag, pretty: impl Into<String>) -> Self {
        Self {
            entry: Some((tag, pretty.into())),
        }
    }

    /// The cleared filter: no method is rejected.
    pub fn clear() -> Self {
        Self { entry: None }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Returns the quoted description to use in a `Failed` response if `tag`
    /// matches this filter's rejected method.
    pub fn rejection_message(&self, tag: &str) -> Option<String> {
        let (filtered_tag, pretty) = self.entry.as_ref()?;
        (filtered_tag == tag).then(|| format!("Filtered method '{pretty}'"))
    }
}
