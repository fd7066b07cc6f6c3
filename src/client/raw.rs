use std::rc::Rc;
use std::time::Duration;

use log::trace;
use tokio::sync::Notify;

use crate::common::{ChannelClosed, Id, MethodTag, Request, Response, Status};
use crate::endpoint::{ClientEndpoint, ServerEndpoint};
use crate::error::CallError;
use crate::scheduler::Scheduler;

use super::waiting::WaitingManager;

/// The per-stub knobs a caller can set, mirroring `distant-net`'s
/// `ClientConfig`: a small `Copy`/`Clone` struct of durations rather than an
/// external configuration file, since nothing in this spec's scope implies
/// one (spec.md §10.3 of the expanded spec).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Per-call deadline. `Duration::ZERO` means "no timeout" (spec.md §4.6,
    /// §5).
    pub default_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
        }
    }
}

/// The untyped caller-side façade (spec.md §4.6), operating purely on
/// `(MethodTag, Vec<u8>)` — the encode/decode calls a generated, typed
/// wrapper contributes are not this type's concern.
///
/// Grounded on `distant-net`'s `UntypedClient`/`UntypedChannel` pair
/// (spec.md's expansion, §11.1): this is the core a typed
/// [`ClientStub`](super::ClientStub) wraps.
pub struct RawClientStub {
    server: ServerEndpoint,
    client: ClientEndpoint,
    waiting: Rc<WaitingManager>,
    config: ClientConfig,
}

impl RawClientStub {
    pub fn new(server: ServerEndpoint, config: ClientConfig) -> Self {
        Self {
            server,
            client: ClientEndpoint::new(),
            waiting: Rc::new(WaitingManager::new()),
            config,
        }
    }

    pub fn client_endpoint(&self) -> &ClientEndpoint {
        &self.client
    }

    pub fn config(&self) -> ClientConfig {
        self.config
    }

    /// Performs one invocation end to end (spec.md §4.6 steps 1-2, 4-7).
    ///
    /// Must run with a `Scheduler`/`LocalSet` already driving the current
    /// OS thread — true whenever this is awaited from inside a handler
    /// (re-entrant calls, spec.md §9 "Re-entrancy") or from inside the
    /// bootstrap [`call_blocking`](Self::call_blocking) sets up. Step 3
    /// ("ensure a Scheduler is installed, install one if needed") is
    /// `call_blocking`'s job, not this method's — an `async fn` can always
    /// assume its caller already has one, which is simpler than detecting
    /// and branching here.
    pub async fn call(&self, method: impl Into<MethodTag>, args: Vec<u8>) -> Result<Response, CallError> {
        self.call_with_timeout(method, args, self.config.default_timeout).await
    }

    pub async fn call_with_timeout(
        &self,
        method: impl Into<MethodTag>,
        args: Vec<u8>,
        timeout: Duration,
    ) -> Result<Response, CallError> {
        let id = self.waiting.alloc_id();
        let method = method.into();
        trace!("issuing call id={id} method={method}");

        let req = Request::new(self.client.clone(), id, method, args);

        // Step 4: spawn a task that performs the send. A failed send means
        // the server vanished; deliver a synthetic failure immediately
        // instead of making the caller wait out the full timeout for a
        // response that will never come.
        let sender_endpoint = self.server.clone();
        let sender_waiting = Rc::clone(&self.waiting);
        tokio::task::spawn_local(async move {
            if let Err(ChannelClosed) = sender_endpoint.put_request(req) {
                sender_waiting.deliver(Response::failed(id, "server endpoint closed")).await;
            }
        });

        // Step 5: spawn a task that drains this stub's response channel and
        // delivers to the waiting manager until told to stop. Several
        // concurrent calls on the same stub each spawn one of these; they
        // race harmlessly over the same multi-consumer channel; whichever
        // task dequeues a given response still routes it to the right
        // waiter because `deliver` looks the id up in the manager shared by
        // all of them.
        let terminate = Rc::new(Notify::new());
        let receiver_endpoint = self.client.clone();
        let receiver_waiting = Rc::clone(&self.waiting);
        let receiver_terminate = Rc::clone(&terminate);
        tokio::task::spawn_local(async move {
            loop {
                tokio::select! {
                    _ = receiver_terminate.notified() => break,
                    received = receiver_endpoint.res_channel().receive() => {
                        match received {
                            Ok(res) => receiver_waiting.deliver(res).await,
                            Err(ChannelClosed) => break,
                        }
                    }
                }
            }
        });

        // Step 6-7: the root wait.
        let response = self.waiting.wait_response(id, timeout).await;
        terminate.notify_waiters();

        match response.status {
            Status::Success => Ok(response),
            Status::Failed => Err(CallError::failed(response.description().into_owned())),
            Status::Timeout => Err(CallError::Timeout),
        }
    }

    /// Convenience for a caller on a bare OS thread with no ambient
    /// `Scheduler`: bootstraps a short-lived one and blocks until the call
    /// resolves (spec.md §4.6 step 3, §5 "the calling thread temporarily
    /// hosts a Scheduler").
    ///
    /// # Panics
    ///
    /// Panics if a `Scheduler` is already driving the current thread (e.g.
    /// called synchronously from inside a handler) — nesting a blocking
    /// runtime inside a running one is a programmer error here just as it
    /// is in `tokio` itself; re-entrant callers should `.await` [`call`](Self::call)
    /// directly instead.
    pub fn call_blocking(&self, method: impl Into<MethodTag>, args: Vec<u8>) -> Result<Response, CallError> {
        assert!(
            !Scheduler::is_installed(),
            "call_blocking must not be invoked from a thread already driven by a Scheduler; \
             await RawClientStub::call directly instead"
        );
        let scheduler = Scheduler::new();
        scheduler.start(async move { self.call(method, args).await })
    }

    /// Ends this stub: no more responses will be routed to any still-parked
    /// waiter. Any in-flight call then resolves as *Failed* or *Timeout*
    /// depending on which observation arrives first (spec.md §4.6, §7).
    pub fn close(&self) {
        self.client.close();
    }

    pub fn id_exists(&self, id: Id) -> bool {
        self.waiting.exists(id)
    }
}
