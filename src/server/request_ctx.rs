use crate::common::{Id, MethodTag};
use crate::server::reply::ReplyHandle;

/// Everything a dispatch task needs to answer one request (spec.md §4.4).
///
/// Grounded on `distant-net`'s `ServerCtx<T, U, D>`, trimmed to the fields
/// spec.md's `handle(req)` actually uses: there is no connection id or
/// per-connection local data here, since an actor is addressed by its
/// [`ServerEndpoint`](crate::endpoint::ServerEndpoint) directly rather than
/// through a multiplexed connection.
pub struct RequestCtx {
    pub id: Id,
    pub method: MethodTag,
    pub args: Vec<u8>,
    pub reply: ReplyHandle,
}
