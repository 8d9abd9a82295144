//! Inbound message sources.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

use thronebot_router::Incoming;

use crate::error::RuntimeResult;

/// Something the runtime pulls inbound messages from.
///
/// `Ok(None)` means the source is exhausted and the runtime stops accepting
/// messages. An error also ends the run and is returned from
/// [`ThronebotRuntime::run`](crate::ThronebotRuntime::run).
#[async_trait]
pub trait MessageSource: Send {
    async fn next_message(&mut self) -> RuntimeResult<Option<Incoming>>;
}

#[async_trait]
impl MessageSource for mpsc::Receiver<Incoming> {
    async fn next_message(&mut self) -> RuntimeResult<Option<Incoming>> {
        Ok(self.recv().await)
    }
}

#[async_trait]
impl MessageSource for mpsc::UnboundedReceiver<Incoming> {
    async fn next_message(&mut self) -> RuntimeResult<Option<Incoming>> {
        Ok(self.recv().await)
    }
}

/// Adapts any stream of messages into a [`MessageSource`].
#[derive(Debug)]
pub struct StreamSource<S>(pub S);

#[async_trait]
impl<S> MessageSource for StreamSource<S>
where
    S: Stream<Item = Incoming> + Unpin + Send,
{
    async fn next_message(&mut self) -> RuntimeResult<Option<Incoming>> {
        Ok(self.0.next().await)
    }
}
