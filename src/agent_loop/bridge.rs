//! Ordered hand-off of run events from the producer task to the consumer.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use super::events::RunEvent;
use crate::error::RunError;

type Item = Result<RunEvent, RunError>;

/// Create a connected producer/consumer pair.
pub fn event_bridge() -> (EventSender, RunEventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventSender { tx },
        RunEventStream {
            rx,
            finished: false,
        },
    )
}

/// Producer side. Sends never block; they fail only once the consumer is gone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Item>,
}

impl EventSender {
    /// Queue an event. Returns `false` when the consumer has been dropped.
    pub fn send(&self, event: RunEvent) -> bool {
        self.tx.send(Ok(event)).is_ok()
    }

    pub fn send_error(&self, error: RunError) -> bool {
        self.tx.send(Err(error)).is_ok()
    }

    /// Resolves once the consumer has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

/// Consumer side of a run: every event in production order.
///
/// Ends right after yielding a terminal event (`response.completed` or
/// `response.closed`), or when the producer goes away.
#[derive(Debug)]
pub struct RunEventStream {
    rx: mpsc::UnboundedReceiver<Item>,
    finished: bool,
}

impl RunEventStream {
    /// Collect every remaining event, stopping at the first error.
    pub async fn collect_events(mut self) -> Result<Vec<RunEvent>, RunError> {
        use futures::StreamExt;
        let mut events = Vec::new();
        while let Some(item) = self.next().await {
            events.push(item?);
        }
        Ok(events)
    }
}

impl Stream for RunEventStream {
    type Item = Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(Ok(event))) => {
                if event.is_terminal() {
                    self.finished = true;
                    self.rx.close();
                }
                Poll::Ready(Some(Ok(event)))
            }
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err))),
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn stops_after_terminal_event() {
        let (tx, mut rx) = event_bridge();
        assert!(tx.send(RunEvent::tool_result("a", json!(1))));
        assert!(tx.send(RunEvent::closed()));
        tx.send(RunEvent::tool_result("late", json!(2)));

        assert_eq!(rx.next().await.unwrap().unwrap().event_type(), "function.tool_result");
        assert!(rx.next().await.unwrap().unwrap().is_terminal());
        assert!(rx.next().await.is_none());
    }

    #[tokio::test]
    async fn ends_when_producer_vanishes() {
        let (tx, rx) = event_bridge();
        tx.send(RunEvent::tool_result("a", json!(1)));
        drop(tx);
        let events = rx.collect_events().await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn sender_observes_consumer_drop() {
        let (tx, rx) = event_bridge();
        drop(rx);
        tx.closed().await;
        assert!(!tx.send(RunEvent::closed()));
    }
}
