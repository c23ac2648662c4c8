//! Capacity-one result channel
//!
//! The single synchronization point between concurrent producers and one
//! consumer: fetch tasks hand their outcome to the aggregator through it,
//! and worker threads hand job output back to the I/O domain through it.
//! At most one element is in flight; a send suspends until the consumer
//! has drained the slot.

use tokio::sync::mpsc;

pub use tokio::sync::mpsc::error::SendError;

/// Create a linked sender/receiver pair with a single in-flight slot.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = mpsc::channel(1);
    (Sender(tx), Receiver(rx))
}

/// Producer half. Cheap to clone, one per producer task.
#[derive(Debug)]
pub struct Sender<T>(mpsc::Sender<T>);

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Sender(self.0.clone())
    }
}

impl<T> Sender<T> {
    /// Suspends until the slot is free, then hands `value` to the
    /// consumer. Fails only when the receiver has been dropped, in which
    /// case the value is returned inside the error.
    pub async fn send(&self, value: T) -> Result<(), SendError<T>> {
        self.0.send(value).await
    }

    /// Blocking variant for producers on plain OS threads.
    ///
    /// Must not be called from within an async context.
    pub fn blocking_send(&self, value: T) -> Result<(), SendError<T>> {
        self.0.blocking_send(value)
    }
}

/// Consumer half. Exactly one per channel.
#[derive(Debug)]
pub struct Receiver<T>(mpsc::Receiver<T>);

impl<T> Receiver<T> {
    /// Suspends until a producer is ready. Returns `None` once every
    /// sender has been dropped and the slot is empty.
    pub async fn recv(&mut self) -> Option<T> {
        self.0.recv().await
    }
}
