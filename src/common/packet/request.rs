use crate::common::control::{Id, MethodTag};
use crate::endpoint::ClientEndpoint;

/// A single method invocation in flight from a [`ClientStub`](crate::client::ClientStub)
/// to a [`ServerLoop`](crate::server::ServerLoop) (spec.md §3).
///
/// Immutable once built, consumed by exactly one server dispatch task.
/// `reply_to` is `None` only for the reserved shutdown sentinel (spec.md
/// §4.6), which carries no caller to answer.
#[derive(Clone, Debug)]
pub struct Request {
    pub reply_to: Option<ClientEndpoint>,
    pub id: Id,
    pub method: MethodTag,
    pub args: Vec<u8>,
}

impl Request {
    pub fn new(reply_to: ClientEndpoint, id: Id, method: impl Into<MethodTag>, args: Vec<u8>) -> Self {
        Self {
            reply_to: Some(reply_to),
            id,
            method: method.into(),
            args,
        }
    }

    /// The `{replyTo: null, id: 0, method: "shutdown@command"}` sentinel
    /// spec.md §4.6 describes.
    pub fn shutdown() -> Self {
        Self {
            reply_to: None,
            id: 0,
            method: crate::common::control::SHUTDOWN_METHOD_TAG.to_string(),
            args: Vec::new(),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.method == crate::common::control::SHUTDOWN_METHOD_TAG
    }
}
