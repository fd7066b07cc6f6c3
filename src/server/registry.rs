use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::common::MethodTag;
use crate::error::Aborted;

/// `Ok(encoded return value)`, or `Err(human-readable description)` to be
/// reported back to the caller as a `Failed` response (spec.md §4.4 step 3).
pub type HandlerResult = Result<Vec<u8>, String>;

type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult>>>;

/// One registered method: decodes its argument bytes, invokes the user
/// implementation, and encodes the result — all of that is the external
/// reflection/codec collaborator's job (spec.md §1, §6); this crate only
/// stores and calls the closure it produces.
///
/// Not `Send`/`Sync`: a handler runs exclusively on its actor's own OS
/// thread as a task spawned on that thread's [`Scheduler`](crate::scheduler::Scheduler),
/// so it is free to close over `Rc`-shared, non-`Sync` state the way
/// spec.md §5 describes ("the user implementation is accessed only from the
/// actor's thread; no locks are required in user code").
type Handler = Rc<dyn Fn(Vec<u8>) -> HandlerFuture>;

/// The per-actor dispatch table: a runtime registry mapping a
/// [`MethodTag`] to the closure that serves it, populated at actor
/// construction (spec.md §9, design note "Automatic server dispatch
/// table" — "a runtime registry populated at actor construction from
/// (tag → handler closure) pairs").
///
/// Grounded on `distant-net`'s `Server`/`ServerHandler` split, collapsed
/// into a single concrete type: this crate has no generated trait to
/// dispatch through, since the interface-reflection layer is external
/// (spec.md §1), so a plain `HashMap` plays the role `ServerHandler::on_request`
/// played there.
#[derive(Default)]
pub struct Server {
    handlers: HashMap<MethodTag, Handler>,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `tag`. `handler` is called with the raw
    /// argument bytes and must return the raw encoded result or a failure
    /// description; decoding/encoding is the handler's own responsibility.
    pub fn register<F, Fut>(&mut self, tag: impl Into<MethodTag>, handler: F) -> &mut Self
    where
        F: Fn(Vec<u8>) -> Fut + 'static,
        Fut: Future<Output = HandlerResult> + 'static,
    {
        self.handlers
            .insert(tag.into(), Rc::new(move |args| Box::pin(handler(args)) as HandlerFuture));
        self
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Invokes the handler for `method`. Panics with [`Aborted::UnknownMethod`]
    /// if no handler is registered — spec.md §4.4 step 4 calls an
    /// unrecognized tag reaching here a programmer error, to be guarded
    /// loudly rather than surfaced to a caller.
    pub(crate) async fn dispatch(&self, method: &str, args: Vec<u8>) -> HandlerResult {
        match self.handlers.get(method) {
            Some(handler) => handler(args).await,
            None => panic!(
                "{}",
                Aborted::UnknownMethod {
                    tag: method.to_string()
                }
            ),
        }
    }
}
