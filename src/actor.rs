//! Actor lifecycle: spawn, control, shutdown (spec.md §3 "Lifecycle", §6
//! "Control surface").
//!
//! Grounded on `distant-net`'s `ServerRef`/`GenericServerRef` (a handle
//! wrapping a task and exposing `is_finished`/`abort`) and `UntypedClient`'s
//! `shutdown`/`wait` pair — here the "task" is an OS thread rather than a
//! `tokio::task`, because spec.md §3 requires each actor to own its own OS
//! thread with its own cooperative scheduler, not merely another task on a
//! shared runtime.

use std::fmt;
use std::thread::{self, JoinHandle};

use log::debug;

use crate::common::{ChannelClosed, FilterCmd, MethodTag, Request, SleepCmd};
use crate::endpoint::ServerEndpoint;
use crate::scheduler::Scheduler;
use crate::server::{Server, ServerLoop};

/// Builds an [`Actor`] from a factory that constructs the user
/// implementation and its dispatch [`Server`] (spec.md §3 "Lifecycle":
/// "constructs the user implementation inside that thread").
///
/// The factory itself must be `Send` — it is moved onto the new OS thread
/// and invoked there — but its *output* need not be: the registered
/// handlers are free to close over `Rc`/`RefCell` state, since spec.md §5
/// guarantees the user implementation is only ever touched from its own
/// actor's thread.
pub struct ActorBuilder {
    build: Box<dyn FnOnce() -> Server + Send + 'static>,
}

impl ActorBuilder {
    pub fn new<F>(build: F) -> Self
    where
        F: FnOnce() -> Server + Send + 'static,
    {
        Self { build: Box::new(build) }
    }

    /// Spawns the actor's OS thread and starts its [`ServerLoop`] (spec.md
    /// §3 "Lifecycle" steps: allocate a server endpoint, spawn a thread,
    /// construct the implementation, start the loop on a fresh scheduler).
    pub fn spawn(self) -> Actor {
        let endpoint = ServerEndpoint::new();
        let thread_endpoint = endpoint.clone();
        let build = self.build;

        let handle = thread::Builder::new()
            .name("stagehand-actor".into())
            .spawn(move || {
                let server = std::rc::Rc::new(build());
                let scheduler = Scheduler::new();
                debug!("actor thread starting server loop");
                scheduler.start(ServerLoop::run(thread_endpoint, server));
                debug!("actor thread exiting, server loop returned");
            })
            .expect("spawning the actor's OS thread should never fail under normal operation");

        Actor {
            endpoint,
            join: Some(handle),
        }
    }
}

/// A live, addressable actor: one OS thread running one [`ServerLoop`]
/// (spec.md §3 "Lifecycle").
///
/// Cloning the actor's [`ServerEndpoint`] (via [`Actor::endpoint`]) is how a
/// [`ClientStub`](crate::client::ClientStub) or a test harness addresses it;
/// the `Actor` handle itself owns the thread's [`JoinHandle`] and is the
/// only thing that can [`shutdown`](Self::shutdown) it.
pub struct Actor {
    endpoint: ServerEndpoint,
    join: Option<JoinHandle<()>>,
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("endpoint", &self.endpoint)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Actor {
    /// Shorthand for `ActorBuilder::new(build).spawn()`.
    pub fn spawn<F>(build: F) -> Self
    where
        F: FnOnce() -> Server + Send + 'static,
    {
        ActorBuilder::new(build).spawn()
    }

    /// The addressable handle a [`ClientStub`](crate::client::ClientStub)
    /// or control call uses to reach this actor. Cloning it is cheap and
    /// yields another reference to the same three channels.
    pub fn endpoint(&self) -> ServerEndpoint {
        self.endpoint.clone()
    }

    /// Whether the actor's OS thread has exited, either due to
    /// [`shutdown`](Self::shutdown) or an aborted invariant violation
    /// (spec.md §7 "internal invariant violations abort loudly").
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Enqueues a [`SleepCmd`] (spec.md §6 `sleep(duration, drop)`).
    pub fn sleep(&self, duration: std::time::Duration, drop: bool) -> Result<(), ChannelClosed> {
        self.endpoint.put_sleep(SleepCmd::new(duration, drop))
    }

    /// Enqueues a [`FilterCmd`] rejecting `tag`, describing it as `pretty`
    /// in the synthetic failure message a matching caller observes (spec.md
    /// §6 `filter(method)` / `filter(method, overload-signature)`).
    pub fn filter(&self, tag: impl Into<MethodTag>, pretty: impl Into<String>) -> Result<(), ChannelClosed> {
        self.endpoint.put_filter(FilterCmd::reject(tag.into(), pretty))
    }

    /// Clears any installed filter (spec.md §6 `clear_filter()`).
    pub fn clear_filter(&self) -> Result<(), ChannelClosed> {
        self.endpoint.put_filter(FilterCmd::clear())
    }

    /// Posts the reserved shutdown request and closes all three server
    /// channels (spec.md §6 `shutdown()`, §3 "Lifecycle"), then waits for
    /// the actor's OS thread to join.
    ///
    /// Grounded on `distant-net`'s `UntypedClient::wait`/`ServerRef::is_finished`
    /// pair (spec.md §11.5 "Graceful actor join with bounded wait"): unlike
    /// a fire-and-forget signal, this gives testable property 8 ("shutdown
    /// terminates... within a bounded time") a direct `await`-able API.
    ///
    /// Calling this a second time is a no-op that immediately returns `Ok(())`.
    pub async fn shutdown(&mut self) -> std::thread::Result<()> {
        let Some(handle) = self.join.take() else {
            return Ok(());
        };

        // Best-effort: the loop may already have exited (e.g. aborted on an
        // invariant violation), in which case both sends simply fail and we
        // still join below.
        let _ = self.endpoint.put_request(Request::shutdown());
        self.endpoint.close();

        tokio::task::spawn_blocking(move || handle.join())
            .await
            .expect("join task itself should never be cancelled or panic")
    }
}
