use crate::common::control::Id;

/// The outcome of a single [`Request`](super::Request) (spec.md §3).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// `data` is the encoded return value (empty for a void return).
    Success,
    /// `data` is a human-readable error description.
    Failed,
    /// Synthesized locally by the client once its deadline elapses; never
    /// transmitted over a channel.
    Timeout,
}

/// A reply to a [`Request`](super::Request), routed back to the issuing
/// client by `id` (spec.md §3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub id: Id,
    pub data: Vec<u8>,
}

impl Response {
    pub fn success(id: Id, data: Vec<u8>) -> Self {
        Self {
            status: Status::Success,
            id,
            data,
        }
    }

    pub fn failed(id: Id, description: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            id,
            data: description.into().into_bytes(),
        }
    }

    /// Built by a [`WaitingManager`](crate::client::WaitingManager) when a
    /// call's deadline elapses with no matching reply observed.
    pub fn timeout(id: Id) -> Self {
        Self {
            status: Status::Timeout,
            id,
            data: Vec::new(),
        }
    }

    /// `data` interpreted as UTF-8, for the `Failed`/`Timeout` description —
    /// lossy because a hostile or buggy handler could in principle encode a
    /// non-UTF-8 failure description.
    pub fn description(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}
