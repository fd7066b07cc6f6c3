use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::common::{ChannelClosed, FilterCmd, SleepCmd};
use crate::endpoint::ServerEndpoint;
use crate::error::Aborted;
use crate::scheduler::Condition;
use crate::server::registry::Server;
use crate::server::reply::ReplyHandle;
use crate::server::request_ctx::RequestCtx;

/// How often a deferred (sleeping, `drop=false`) request re-checks whether
/// the sleep window has ended, matching spec.md §4.4's literal
/// `wait(c, 1ms)` busy wait.
const DEFERRED_DISPATCH_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Default)]
struct ControlState {
    filter: FilterCmd,
    sleep_until: Option<Instant>,
    drop_while_sleeping: bool,
}

impl ControlState {
    fn sleeping(&self) -> bool {
        self.sleep_until.is_some_and(|until| Instant::now() < until)
    }
}

/// The per-actor event loop (spec.md §4.4): owns the user implementation's
/// dispatch table and drains `req`/`sleep`/`filter` concurrently on its own
/// cooperative tasks until it observes the reserved shutdown request.
///
/// Grounded on `distant-net`'s `Server`/`ServerExt::start` pair, which spawns
/// one task per inbound connection plus a shared reader/writer loop; this
/// loop is simpler because there is exactly one "connection" (the actor's
/// endpoint) for the lifetime of the OS thread.
pub struct ServerLoop;

impl ServerLoop {
    /// Runs until the reserved shutdown request is received on `req`, or
    /// all three inbound channels close. Intended to be the root future
    /// passed to [`Scheduler::start`](crate::scheduler::Scheduler::start);
    /// must run on a thread that has an installed `Scheduler`/`LocalSet`
    /// context so its internal `spawn_local` calls succeed.
    pub async fn run(endpoint: ServerEndpoint, server: Rc<Server>) {
        let state = Rc::new(RefCell::new(ControlState::default()));

        let sleep_task = run_sleep_task(endpoint.clone(), Rc::clone(&state));
        let filter_task = run_filter_task(endpoint.clone(), Rc::clone(&state));
        let request_task = run_request_task(endpoint, server, state);

        tokio::join!(sleep_task, filter_task, request_task);
    }
}

async fn run_sleep_task(endpoint: ServerEndpoint, state: Rc<RefCell<ControlState>>) {
    loop {
        match endpoint.sleep_channel().receive().await {
            Ok(SleepCmd { duration, drop }) => {
                debug!("sleep window entered: duration={duration:?} drop={drop}");
                let mut state = state.borrow_mut();
                state.sleep_until = Some(Instant::now() + duration);
                state.drop_while_sleeping = drop;
            }
            Err(ChannelClosed) => break,
        }
    }
}

async fn run_filter_task(endpoint: ServerEndpoint, state: Rc<RefCell<ControlState>>) {
    loop {
        match endpoint.filter_channel().receive().await {
            Ok(cmd) => {
                debug!("filter updated: empty={}", cmd.is_empty());
                state.borrow_mut().filter = cmd;
            }
            Err(ChannelClosed) => break,
        }
    }
}

async fn run_request_task(endpoint: ServerEndpoint, server: Rc<Server>, state: Rc<RefCell<ControlState>>) {
    loop {
        let req = match endpoint.req_channel().receive().await {
            Ok(req) => req,
            Err(ChannelClosed) => break,
        };

        if req.is_shutdown() {
            debug!("shutdown request observed, no further dispatch will be spawned");
            break;
        }

        let Some(reply_to) = req.reply_to.clone() else {
            warn!("non-shutdown request with no reply_to, discarding id={}", req.id);
            continue;
        };

        if !server.is_registered(&req.method) {
            // Programmer error: the reflection/registration layer produced
            // a request tagged with a method this actor never registered.
            // This must not be swallowed as an ordinary request failure —
            // panicking here, in the request task itself (not a nested
            // spawned task), unwinds straight out of the enclosing
            // `Scheduler::start` call and kills the actor's OS thread.
            panic!("{}", Aborted::UnknownMethod { tag: req.method });
        }

        trace!("dispatching request id={} method={}", req.id, req.method);

        let ctx = RequestCtx {
            id: req.id,
            method: req.method,
            args: req.args,
            reply: ReplyHandle::new(req.id, reply_to),
        };

        if !state.borrow().sleeping() {
            tokio::task::spawn_local(handle(ctx, Rc::clone(&server), Rc::clone(&state)));
        } else if !state.borrow().drop_while_sleeping {
            tokio::task::spawn_local(handle_after_sleep(ctx, Rc::clone(&server), Rc::clone(&state)));
        } else {
            trace!("dropping request id={} while sleeping with drop=true", ctx.id);
        }
    }
}

async fn handle_after_sleep(ctx: RequestCtx, server: Rc<Server>, state: Rc<RefCell<ControlState>>) {
    let cond = Condition::new();
    while state.borrow().sleeping() {
        cond.wait(DEFERRED_DISPATCH_POLL_INTERVAL).await;
    }
    handle(ctx, server, state).await;
}

/// spec.md §4.4 `handle(req)`: check the live filter, then dispatch, then
/// answer with exactly one response.
async fn handle(ctx: RequestCtx, server: Rc<Server>, state: Rc<RefCell<ControlState>>) {
    let rejection = state.borrow().filter.rejection_message(&ctx.method);
    if let Some(message) = rejection {
        if ctx.reply.failed(message).is_err() {
            trace!("caller for request id={} vanished before filter reply", ctx.id);
        }
        return;
    }

    // spec.md §4.4 step 3 / §7 count a panicking handler as "the
    // implementation threw", answered with `Failed`, same as a codec or
    // `Err` rejection — not a silently dropped task that leaves the caller
    // waiting out its full timeout. Running the dispatch itself as its own
    // `spawn_local` task lets us observe that panic via the task's
    // `JoinHandle` instead of letting it vanish with the discarded handle
    // the outer dispatch task already is.
    let method = ctx.method;
    let args = ctx.args;
    let dispatch = {
        let server = Rc::clone(&server);
        tokio::task::spawn_local(async move { server.dispatch(&method, args).await })
    };

    match dispatch.await {
        Ok(Ok(data)) => {
            if ctx.reply.success(data).is_err() {
                trace!("caller for request id={} vanished before success reply", ctx.id);
            }
        }
        Ok(Err(description)) => {
            if ctx.reply.failed(description).is_err() {
                trace!("caller for request id={} vanished before failure reply", ctx.id);
            }
        }
        Err(join_err) => {
            let description = panic_description(join_err);
            warn!("handler for request id={} panicked: {description}", ctx.id);
            if ctx.reply.failed(description).is_err() {
                trace!("caller for request id={} vanished before panic reply", ctx.id);
            }
        }
    }
}

/// Renders a handler panic's payload as the human-readable description
/// spec.md §3/§7 says a `Failed` response carries, matching the
/// `downcast_ref::<&str>`/`downcast_ref::<String>` pattern used throughout
/// the pack's own panic-to-message helpers for exactly this payload shape.
fn panic_description(join_err: tokio::task::JoinError) -> String {
    match join_err.try_into_panic() {
        Ok(payload) => {
            if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "handler panicked with a non-string payload".to_string()
            }
        }
        Err(_) => "handler task was cancelled".to_string(),
    }
}
