use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

use log::warn;
use tokio::sync::oneshot;

use crate::common::{Id, Response};
use crate::error::Aborted;

/// How long [`WaitingManager::deliver`] waits, between polls, for a
/// just-issued id's waiter entry to appear — covers the race spec.md §4.5
/// and §9 describe, where the sender and receiver tasks are siblings and a
/// response can in principle arrive before the caller finishes installing
/// its waiter.
const DELIVER_RACE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How many times `deliver` retries before giving up and logging the
/// response as dropped (spec.md §9, "Open question — dropped-request
/// memory semantics" is about a different race, but the same "don't spin
/// forever" discipline applies here).
const DELIVER_RACE_MAX_ATTEMPTS: u32 = 50;

/// The per-[`RawClientStub`](crate::client::RawClientStub) response
/// correlator (spec.md §4.5).
///
/// Grounded on `distant-net`'s `PostOffice`/`Mailbox` pair
/// (`client/channel/mailbox.rs`), narrowed from a many-response mailbox (an
/// SSH process's stdout/stderr keep arriving) down to the single-response
/// shape this crate needs: delivery is single-fire, so a `tokio::sync::oneshot`
/// per id replaces `distant-net`'s bounded `mpsc::Sender`, matching the
/// `HashMap<MessageId, oneshot::Sender<_>>` pending-map pattern `toy-rpc`
/// uses for the same purpose.
///
/// `next_id` lives here, per instance, rather than as a function-local
/// static — spec.md §9 calls this out as a deliberate tightening so that
/// spinning up many actors/stubs in one test process gives each stub an
/// independent id sequence.
pub struct WaitingManager {
    next_id: Cell<Id>,
    waiters: RefCell<HashMap<Id, oneshot::Sender<Response>>>,
}

impl Default for WaitingManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitingManager {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            waiters: RefCell::new(HashMap::new()),
        }
    }

    /// Returns and increments the counter. Ids are unique and strictly
    /// increasing for the lifetime of this manager.
    pub fn alloc_id(&self) -> Id {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    pub fn exists(&self, id: Id) -> bool {
        self.waiters.borrow().contains_key(&id)
    }

    /// Parks on `id` until a response is delivered or `timeout` elapses.
    /// `timeout == Duration::ZERO` waits indefinitely (spec.md §4.5/§5).
    ///
    /// # Panics
    ///
    /// Panics with [`Aborted::DuplicateWaiter`] if a waiter for `id` is
    /// already parked — spec.md's invariant "at most one task parked per
    /// id" is a programmer error to violate, not a recoverable condition.
    pub async fn wait_response(&self, id: Id, timeout: Duration) -> Response {
        let (tx, rx) = oneshot::channel();
        {
            let mut waiters = self.waiters.borrow_mut();
            if waiters.insert(id, tx).is_some() {
                panic!("{}", Aborted::DuplicateWaiter { id });
            }
        }

        let received = if timeout.is_zero() {
            rx.await.ok()
        } else {
            match tokio::time::timeout(timeout, rx).await {
                Ok(res) => res.ok(),
                Err(_) => None,
            }
        };

        // Clearing the waiter entry on the way out is mandatory even when
        // the wait above timed out, so a late response can't find a stale
        // slot and deliver into it.
        self.waiters.borrow_mut().remove(&id);

        received.unwrap_or_else(|| Response::timeout(id))
    }

    /// Routes `res` to its parked waiter by id, removing the entry on
    /// delivery (spec.md §3 invariant: "a response is delivered at most
    /// once"). If the waiter hasn't been installed yet, retries briefly
    /// before giving up.
    pub async fn deliver(&self, res: Response) {
        for _ in 0..DELIVER_RACE_MAX_ATTEMPTS {
            if let Some(tx) = self.waiters.borrow_mut().remove(&res.id) {
                // The receiver may already be gone (its call timed out and
                // unwound); a failed send just means the response is
                // discarded, exactly as spec.md §5 describes.
                let _ = tx.send(res);
                return;
            }
            tokio::time::sleep(DELIVER_RACE_POLL_INTERVAL).await;
        }
        warn!("response for unknown id {} dropped after grace window", res.id);
    }
}
