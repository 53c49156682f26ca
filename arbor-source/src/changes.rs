use std::sync::Arc;

use flume::{
    Receiver, Sender, TryRecvError as FlumeTryRecvError,
    TrySendError as FlumeTrySendError,
};
use log::{debug, trace};
use thiserror::Error;

/// Error returned when receiving a visible sequence fails.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ChangeRecvError {
    #[error("data source dropped")]
    Disconnected,
}

/// Error returned when a non-blocking receive fails.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ChangeTryRecvError {
    #[error("no visible sequence queued")]
    Empty,

    #[error("data source dropped")]
    Disconnected,
}

pub type ChangeRecvResult<T> = std::result::Result<T, ChangeRecvError>;
pub type ChangeTryRecvResult<T> = std::result::Result<T, ChangeTryRecvError>;

/// Subscription to the visible sequence of a data source.
///
/// The first value is the visible sequence at connect time; one value follows
/// per recomputation. Dropping the data source disconnects the stream.
#[derive(Debug)]
pub struct TreeChanges<F> {
    id: u64,
    receiver: Receiver<Arc<[F]>>,
}

impl<F> TreeChanges<F> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Blocking receive.
    pub fn recv(&self) -> ChangeRecvResult<Arc<[F]>> {
        self.receiver
            .recv()
            .map_err(|_| ChangeRecvError::Disconnected)
    }

    /// Async receive.
    pub async fn recv_async(&self) -> ChangeRecvResult<Arc<[F]>> {
        self.receiver
            .recv_async()
            .await
            .map_err(|_| ChangeRecvError::Disconnected)
    }

    /// Non-blocking receive.
    pub fn try_recv(&self) -> ChangeTryRecvResult<Arc<[F]>> {
        self.receiver.try_recv().map_err(map_try_recv_error)
    }

    /// Drop every queued value but the newest one and return it.
    pub fn drain_latest(&self) -> Option<Arc<[F]>> {
        self.receiver.try_iter().last()
    }
}

/// Producer side of one subscription.
///
/// The broadcaster keeps a receiver clone so it can drop the oldest queued
/// value when the subscriber falls behind.
struct Subscriber<F> {
    id: u64,
    sender: Sender<Arc<[F]>>,
    backlog: Receiver<Arc<[F]>>,
}

impl<F> Subscriber<F> {
    /// Whether the subscriber still holds its receiver.
    fn is_connected(&self) -> bool {
        self.sender.receiver_count() > 1
    }

    /// Queue `update`, replacing the oldest queued value when the channel is
    /// full.
    fn offer(&self, mut update: Arc<[F]>) {
        loop {
            match self.sender.try_send(update) {
                Ok(()) => return,
                Err(FlumeTrySendError::Full(rejected)) => {
                    trace!(
                        "subscriber {} lagging, oldest update replaced",
                        self.id
                    );
                    if self.backlog.try_recv().is_err() {
                        return;
                    }
                    update = rejected;
                },
                Err(FlumeTrySendError::Disconnected(_)) => return,
            }
        }
    }
}

pub(crate) struct ChangeBroadcaster<F> {
    capacity: Option<usize>,
    next_id: u64,
    subscribers: Vec<Subscriber<F>>,
}

impl<F> ChangeBroadcaster<F> {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, current: Arc<[F]>) -> TreeChanges<F> {
        let (sender, receiver) = match self.capacity {
            Some(cap) => flume::bounded(cap.max(1)),
            None => flume::unbounded(),
        };

        let id = self.next_id;
        self.next_id += 1;
        let subscriber = Subscriber {
            id,
            sender,
            backlog: receiver.clone(),
        };
        subscriber.offer(current);
        self.subscribers.push(subscriber);
        debug!("subscriber {id} connected ({} total)", self.subscribers.len());
        TreeChanges { id, receiver }
    }

    /// Release the subscription. Returns `false` when it was already gone.
    pub(crate) fn unsubscribe(&mut self, changes: TreeChanges<F>) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|subscriber| subscriber.id != changes.id);
        let removed = self.subscribers.len() != before;
        if removed {
            debug!("subscriber {} disconnected", changes.id);
        }
        removed
    }

    /// Queue `visible` for every subscriber. A subscriber whose channel is
    /// full loses its oldest queued value, so the newest one always arrives.
    pub(crate) fn publish(&mut self, visible: &Arc<[F]>) {
        self.subscribers.retain(|subscriber| {
            if !subscriber.is_connected() {
                debug!("subscriber {} dropped its receiver", subscriber.id);
                return false;
            }
            subscriber.offer(Arc::clone(visible));
            true
        });
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}

fn map_try_recv_error(err: FlumeTryRecvError) -> ChangeTryRecvError {
    match err {
        FlumeTryRecvError::Empty => ChangeTryRecvError::Empty,
        FlumeTryRecvError::Disconnected => ChangeTryRecvError::Disconnected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: &[u8]) -> Arc<[u8]> {
        Arc::from(values.to_vec())
    }

    #[test]
    fn subscribe_delivers_current_value_first() {
        let mut broadcaster = ChangeBroadcaster::new(None);
        let changes = broadcaster.subscribe(rows(&[1, 2]));

        assert_eq!(&*changes.try_recv().expect("initial value"), &[1, 2]);
        assert_eq!(changes.try_recv(), Err(ChangeTryRecvError::Empty));
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let mut broadcaster = ChangeBroadcaster::new(None);
        let first = broadcaster.subscribe(rows(&[]));
        let second = broadcaster.subscribe(rows(&[]));

        broadcaster.publish(&rows(&[7]));

        for changes in [&first, &second] {
            assert_eq!(changes.drain_latest().as_deref(), Some(&[7][..]));
        }
    }

    #[test]
    fn unsubscribe_releases_only_that_subscription() {
        let mut broadcaster = ChangeBroadcaster::new(None);
        let kept = broadcaster.subscribe(rows(&[]));
        let released = broadcaster.subscribe(rows(&[]));
        let released_id = released.id();

        assert!(broadcaster.unsubscribe(released));
        assert_eq!(broadcaster.len(), 1);

        broadcaster.publish(&rows(&[3]));
        assert_eq!(kept.drain_latest().as_deref(), Some(&[3][..]));
        assert_ne!(kept.id(), released_id);
    }

    #[test]
    fn dropped_receivers_are_pruned_on_publish() {
        let mut broadcaster = ChangeBroadcaster::new(None);
        drop(broadcaster.subscribe(rows(&[])));

        broadcaster.publish(&rows(&[1]));
        assert_eq!(broadcaster.len(), 0);
    }

    #[test]
    fn full_channel_keeps_the_newest_update() {
        let mut broadcaster = ChangeBroadcaster::new(Some(1));
        let changes = broadcaster.subscribe(rows(&[1]));

        broadcaster.publish(&rows(&[2]));
        broadcaster.publish(&rows(&[3]));
        assert_eq!(broadcaster.len(), 1);
        assert_eq!(&*changes.recv().expect("queued value"), &[3]);
        assert_eq!(changes.try_recv(), Err(ChangeTryRecvError::Empty));
    }

    #[test]
    fn lagging_subscriber_keeps_the_most_recent_window() {
        let mut broadcaster = ChangeBroadcaster::new(Some(2));
        let changes = broadcaster.subscribe(rows(&[]));
        for value in 1..=4 {
            broadcaster.publish(&rows(&[value]));
        }

        assert_eq!(&*changes.recv().expect("older"), &[3]);
        assert_eq!(&*changes.recv().expect("newest"), &[4]);
        assert_eq!(changes.try_recv(), Err(ChangeTryRecvError::Empty));
    }

    #[test]
    fn drained_subscriber_receives_later_updates() {
        let mut broadcaster = ChangeBroadcaster::new(Some(1));
        let changes = broadcaster.subscribe(rows(&[1]));
        assert!(changes.recv().is_ok());

        broadcaster.publish(&rows(&[2]));
        assert_eq!(changes.drain_latest().as_deref(), Some(&[2][..]));
    }

    #[test]
    fn dropping_the_broadcaster_disconnects_subscribers() {
        let mut broadcaster = ChangeBroadcaster::new(None);
        let changes = broadcaster.subscribe(rows(&[]));
        drop(broadcaster);

        assert!(changes.recv().is_ok());
        assert_eq!(changes.recv(), Err(ChangeRecvError::Disconnected));
    }

    #[tokio::test]
    async fn recv_async_yields_published_values() {
        let mut broadcaster = ChangeBroadcaster::new(None);
        let changes = broadcaster.subscribe(rows(&[]));
        broadcaster.publish(&rows(&[5, 6]));

        assert!(changes.recv_async().await.expect("initial").is_empty());
        let next = changes.recv_async().await.expect("published");
        assert_eq!(&*next, &[5, 6]);
    }
}
