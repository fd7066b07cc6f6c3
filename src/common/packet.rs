//! Wire records exchanged between a [`ClientStub`](crate::client::ClientStub)
//! and a [`ServerLoop`](crate::server), plus the control commands that flow
//! alongside them.
//!
//! Grounded on `distant-net`'s `common/packet/{request,response}.rs`, cut
//! down to the fields spec.md §3 actually names: there is no msgpack header
//! here, because `args`/`data` are already opaque bytes handed to us by an
//! external codec, and the only metadata a request needs is who to reply to.

mod request;
mod response;

pub use request::Request;
pub use response::{Response, Status};
