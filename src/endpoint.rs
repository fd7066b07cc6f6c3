//! Addressable actor and client handles (spec.md §4.3).
//!
//! Grounded on `distant-net`'s `Client`/`Channel` types, whose `Debug` impls
//! render the channel identity rather than deriving a default one — the
//! `STR(...)`/`CTR(...)` rendering below follows the same idea.

use std::fmt;

use crate::common::{Channel, ChannelClosed, FilterCmd, Request, Response, SleepCmd};

/// The addressable identity of one actor: the three channels its
/// [`ServerLoop`](crate::server::ServerLoop) reads from (spec.md §4.3).
///
/// Cloning a `ServerEndpoint` yields another handle to the same underlying
/// channels (spec.md §4.3: "Owned by the ServerLoop; a strong reference also
/// held by anyone who may address the actor").
///
/// Because [`Channel::send`] and [`Channel::close`] are both non-blocking —
/// our `Channel<T>` is unbounded, so a `send` never has to wait for room —
/// every method here is a plain synchronous call safe from any thread,
/// cooperative or not. There is no blocking put for a bootstrapped
/// `Scheduler` to paper over.
#[derive(Clone)]
pub struct ServerEndpoint {
    req: Channel<Request>,
    sleep: Channel<SleepCmd>,
    filter: Channel<FilterCmd>,
}

impl ServerEndpoint {
    pub fn new() -> Self {
        Self {
            req: Channel::new(),
            sleep: Channel::new(),
            filter: Channel::new(),
        }
    }

    pub fn put_request(&self, req: Request) -> Result<(), ChannelClosed> {
        self.req.send(req)
    }

    pub fn put_sleep(&self, cmd: SleepCmd) -> Result<(), ChannelClosed> {
        self.sleep.send(cmd)
    }

    pub fn put_filter(&self, cmd: FilterCmd) -> Result<(), ChannelClosed> {
        self.filter.send(cmd)
    }

    /// Closes all three channels. Idempotent.
    pub fn close(&self) {
        self.req.close();
        self.sleep.close();
        self.filter.close();
    }

    pub(crate) fn req_channel(&self) -> &Channel<Request> {
        &self.req
    }

    pub(crate) fn sleep_channel(&self) -> &Channel<SleepCmd> {
        &self.sleep
    }

    pub(crate) fn filter_channel(&self) -> &Channel<FilterCmd> {
        &self.filter
    }
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ServerEndpoint {
    fn eq(&self, other: &Self) -> bool {
        self.req.identity() == other.req.identity()
    }
}

impl Eq for ServerEndpoint {}

impl fmt::Debug for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STR({:x}:0)", self.req.identity())
    }
}

/// The addressable identity of one [`ClientStub`](crate::client::ClientStub):
/// its single inbound response channel (spec.md §4.3).
#[derive(Clone)]
pub struct ClientEndpoint {
    res: Channel<Response>,
}

impl ClientEndpoint {
    pub fn new() -> Self {
        Self {
            res: Channel::new(),
        }
    }

    pub fn put_response(&self, res: Response) -> Result<(), ChannelClosed> {
        self.res.send(res)
    }

    pub fn close(&self) {
        self.res.close();
    }

    pub(crate) fn res_channel(&self) -> &Channel<Response> {
        &self.res
    }
}

impl Default for ClientEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ClientEndpoint {
    fn eq(&self, other: &Self) -> bool {
        self.res.identity() == other.res.identity()
    }
}

impl Eq for ClientEndpoint {}

impl fmt::Debug for ClientEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CTR(0:{:x})", self.res.identity())
    }
}
