use crate::common::{ChannelClosed, Id, Response};
use crate::endpoint::ClientEndpoint;

/// The send half of one request's round trip, handed to a dispatch task so
/// it can answer exactly once (spec.md §4.4 `handle(req)`).
///
/// Grounded on `distant-net`'s `ServerReply<T>`, trimmed to the direct,
/// single-shot variant only — spec.md's request/response model is strictly
/// one-reply-per-request, so the queued/held variant `distant-net` also
/// offers (`QueuedServerReply`) has no counterpart here (see DESIGN.md).
#[derive(Clone, Debug)]
pub struct ReplyHandle {
    origin_id: Id,
    reply_to: ClientEndpoint,
}

impl ReplyHandle {
    pub(crate) fn new(origin_id: Id, reply_to: ClientEndpoint) -> Self {
        Self {
            origin_id,
            reply_to,
        }
    }

    pub fn success(&self, data: Vec<u8>) -> Result<(), ChannelClosed> {
        self.reply_to.put_response(Response::success(self.origin_id, data))
    }

    pub fn failed(&self, description: impl Into<String>) -> Result<(), ChannelClosed> {
        self.reply_to
            .put_response(Response::failed(self.origin_id, description))
    }

    /// Whether the caller's response channel has already gone away — the
    /// client shut down, or timed out and unwound, while we were still
    /// working (spec.md §5: "the server is not notified ... may still
    /// complete the work and attempt to send a response that the client
    /// discards").
    pub fn is_closed(&self) -> bool {
        self.reply_to.res_channel().is_closed()
    }
}
