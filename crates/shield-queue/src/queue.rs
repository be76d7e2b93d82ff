//! Bounded async queue carrying agent telemetry to the hive.
//!
//! `tokio::sync::mpsc` already gives a bounded, back-pressured channel: a
//! full producer-side `send` awaits capacity, and a receiver sees `None`
//! once every sender has dropped. `shutdown()` flips a shared flag and
//! closes the sending side so in-flight `recv` calls drain what remains
//! before reporting the queue closed, matching "producers return error,
//! consumers return remaining items then error".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{QueueError, Result};
use crate::wire::Frame;

struct Shared {
    shut_down: AtomicBool,
}

pub struct QueueProducer {
    sender: mpsc::Sender<Frame>,
    shared: Arc<Shared>,
}

impl QueueProducer {
    /// Blocks (asynchronously) until there is room, unless the queue has
    /// been shut down, in which case it returns immediately.
    pub async fn push(&self, frame: Frame) -> Result<()> {
        if self.shared.shut_down.load(Ordering::Acquire) {
            return Err(QueueError::ShutDown);
        }
        self.sender.send(frame).await.map_err(|_| QueueError::ShutDown)
    }

    pub fn shutdown(&self) {
        self.shared.shut_down.store(true, Ordering::Release);
    }
}

pub struct QueueConsumer {
    receiver: mpsc::Receiver<Frame>,
}

impl QueueConsumer {
    /// Returns the next frame, or `None` once the queue is drained and
    /// closed. Never blocks past shutdown once the channel is empty.
    pub async fn pop(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }
}

/// Creates a linked producer/consumer pair backed by a channel of the given
/// capacity (the bound on in-flight, unconsumed frames).
pub fn bounded(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let shared = Arc::new(Shared { shut_down: AtomicBool::new(false) });
    (QueueProducer { sender, shared }, QueueConsumer { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::MessageType;

    fn frame(seq: u32) -> Frame {
        Frame::new(MessageType::Heartbeat, 1, seq, 0, Vec::new()).unwrap()
    }

    #[tokio::test]
    async fn pushed_frames_pop_in_fifo_order() {
        let (producer, mut consumer) = bounded(4);
        producer.push(frame(1)).await.unwrap();
        producer.push(frame(2)).await.unwrap();
        assert_eq!(consumer.pop().await.unwrap().header.sequence, 1);
        assert_eq!(consumer.pop().await.unwrap().header.sequence, 2);
    }

    #[tokio::test]
    async fn dropping_producer_drains_then_closes() {
        let (producer, mut consumer) = bounded(4);
        producer.push(frame(1)).await.unwrap();
        drop(producer);
        assert_eq!(consumer.pop().await.unwrap().header.sequence, 1);
        assert!(consumer.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_security_shutdown_rejects_further_pushes() {
        let (producer, _consumer) = bounded(4);
        producer.shutdown();
        assert!(producer.push(frame(1)).await.is_err());
    }

    #[tokio::test]
    async fn backpressure_blocks_producer_until_consumer_drains() {
        let (producer, mut consumer) = bounded(1);
        producer.push(frame(1)).await.unwrap();
        let producer = Arc::new(producer);
        let producer2 = Arc::clone(&producer);
        let handle = tokio::spawn(async move { producer2.push(frame(2)).await });
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());
        consumer.pop().await.unwrap();
        handle.await.unwrap().unwrap();
    }
}
