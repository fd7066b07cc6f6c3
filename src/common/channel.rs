use derive_more::{Display, Error};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Returned by [`Channel::send`] and [`Channel::receive`] once a channel has
/// been closed (spec.md §4.1): a send after close never drops its value
/// silently, and a receive against an empty, closed channel cannot block
/// forever.
#[derive(Copy, Clone, Debug, Display, Error, PartialEq, Eq)]
#[display(fmt = "channel closed")]
pub struct ChannelClosed;

struct Inner<T> {
    queue: Mutex<VecDeque<T>>,
    closed: AtomicBool,
    notify: Notify,
}

/// An unbounded, closable, typed, multi-producer multi-consumer FIFO queue.
///
/// Grounded on `distant-net`'s `transport/mpsc.rs`, which pairs an
/// `mpsc::Sender`/`Receiver` to move typed values across tasks without a
/// byte-oriented transport underneath. This type goes one step further, per
/// spec.md §4.1's implementation notes, and is built directly on a
/// mutex-protected deque plus a `Notify` rather than `tokio::sync::mpsc`,
/// because this crate needs an explicit idempotent `close()` that wakes
/// every waiter with a distinguished outcome — `mpsc`'s own closing (tied to
/// sender/receiver drop) doesn't give us that on demand.
///
/// Cloning a `Channel` is cheap (an `Arc` bump) and yields another handle to
/// the same underlying queue; this is how one [`Endpoint`](crate::endpoint)
/// is shared by many senders.
pub struct Channel<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Channel<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(VecDeque::new()),
                closed: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Enqueues `v` and wakes one waiter. Fails without enqueuing if the
    /// channel is already closed.
    pub fn send(&self, v: T) -> Result<(), ChannelClosed> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(ChannelClosed);
        }
        self.inner.queue.lock().unwrap().push_back(v);
        self.inner.notify.notify_one();
        Ok(())
    }

    /// Dequeues the head, suspending the caller while the queue is empty.
    /// Fails with [`ChannelClosed`] once the channel is closed and drained.
    pub async fn receive(&self) -> Result<T, ChannelClosed> {
        loop {
            if let Some(v) = self.inner.queue.lock().unwrap().pop_front() {
                return Ok(v);
            }

            // Register interest in the notifier before re-checking `closed`,
            // so a concurrent close() can't land in the gap between our
            // empty-queue observation and the point we start waiting.
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.closed.load(Ordering::Acquire) {
                if let Some(v) = self.inner.queue.lock().unwrap().pop_front() {
                    return Ok(v);
                }
                return Err(ChannelClosed);
            }

            notified.await;
        }
    }

    /// Like [`receive`](Self::receive), but gives up after `timeout` and
    /// returns `None` instead of blocking indefinitely. A zero duration
    /// polls the queue once without sleeping.
    pub async fn try_receive(&self, timeout: Duration) -> Option<T> {
        if timeout.is_zero() {
            return self.inner.queue.lock().unwrap().pop_front();
        }

        match tokio::time::timeout(timeout, self.receive()).await {
            Ok(Ok(v)) => Some(v),
            Ok(Err(ChannelClosed)) | Err(_) => None,
        }
    }

    /// Idempotently marks the channel closed and wakes every waiter so it
    /// observes [`ChannelClosed`]. Values already enqueued are still
    /// delivered, in order, to whoever calls [`receive`](Self::receive) next.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Stable identity for two handles to the same underlying queue —
    /// used for endpoint equality and debug rendering (spec.md §4.3).
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test(tokio::test)]
    async fn send_then_receive_preserves_fifo_order() {
        let ch = Channel::new();
        ch.send(1).unwrap();
        ch.send(2).unwrap();
        ch.send(3).unwrap();
        assert_eq!(ch.receive().await, Ok(1));
        assert_eq!(ch.receive().await, Ok(2));
        assert_eq!(ch.receive().await, Ok(3));
    }

    #[test(tokio::test)]
    async fn receive_suspends_until_a_value_arrives() {
        let ch: Channel<u32> = Channel::new();
        let reader = ch.clone();
        let task = tokio::spawn(async move { reader.receive().await });

        tokio::task::yield_now().await;
        ch.send(42).unwrap();

        assert_eq!(task.await.unwrap(), Ok(42));
    }

    #[test(tokio::test)]
    async fn send_after_close_fails_without_dropping_value() {
        let ch = Channel::new();
        ch.close();
        assert_eq!(ch.send(1), Err(ChannelClosed));
    }

    #[test(tokio::test)]
    async fn close_still_delivers_already_enqueued_values_in_order() {
        let ch = Channel::new();
        ch.send(1).unwrap();
        ch.send(2).unwrap();
        ch.close();

        assert_eq!(ch.receive().await, Ok(1));
        assert_eq!(ch.receive().await, Ok(2));
        assert_eq!(ch.receive().await, Err(ChannelClosed));
    }

    #[test(tokio::test)]
    async fn close_wakes_blocked_receivers() {
        let ch: Channel<u32> = Channel::new();
        let reader = ch.clone();
        let task = tokio::spawn(async move { reader.receive().await });

        tokio::task::yield_now().await;
        ch.close();

        assert_eq!(task.await.unwrap(), Err(ChannelClosed));
    }

    #[test(tokio::test)]
    async fn try_receive_returns_none_on_timeout() {
        let ch: Channel<u32> = Channel::new();
        assert_eq!(ch.try_receive(Duration::from_millis(20)).await, None);
    }

    #[test(tokio::test)]
    async fn try_receive_zero_duration_polls_without_sleeping() {
        let ch = Channel::new();
        ch.send(7).unwrap();
        assert_eq!(ch.try_receive(Duration::ZERO).await, Some(7));
        assert_eq!(ch.try_receive(Duration::ZERO).await, None);
    }

    #[test(tokio::test)]
    async fn multiple_receivers_each_get_a_distinct_value() {
        let ch = Channel::new();
        ch.send(1).unwrap();
        ch.send(2).unwrap();

        let a = ch.clone();
        let b = ch.clone();
        let (r1, r2) = tokio::join!(a.receive(), b.receive());
        let mut got = vec![r1.unwrap(), r2.unwrap()];
        got.sort();
        assert_eq!(got, vec![1, 2]);
    }
}
