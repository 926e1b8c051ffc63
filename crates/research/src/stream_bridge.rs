//! Streaming bridge — turns a blocking, callback-driven completion call
//! into a pull-based async token sequence.
//!
//! The producer is a dedicated OS thread running the provider's blocking
//! streaming call; every token it yields is pushed onto an unbounded
//! channel, and a sentinel closes the stream on success or failure. The
//! consumer pulls with `next()`, which yields `None` exactly once at end
//! of stream. `close()` makes all subsequent pulls return `None`
//! immediately; the producer thread may keep running in the background,
//! bounded by the provider's request timeout.

use lorebase_core::error::ProviderError;
use lorebase_core::provider::{CompletionRequest, StreamingCompletion};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

enum StreamSignal {
    Token(String),
    End(Result<(), ProviderError>),
}

pub struct StreamingBridge {
    rx: mpsc::UnboundedReceiver<StreamSignal>,
    closed: bool,
}

impl StreamingBridge {
    /// Start the producer thread and return the consumer handle.
    pub fn spawn(provider: Arc<dyn StreamingCompletion>, request: CompletionRequest) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let sentinel_tx = tx.clone();
        let spawned = std::thread::Builder::new()
            .name("stream-producer".into())
            .spawn(move || {
                let mut on_token = |token: &str| {
                    // A send failure means the consumer closed early; the
                    // provider call runs to completion regardless.
                    let _ = tx.send(StreamSignal::Token(token.to_string()));
                };
                let result = provider.complete_blocking(request, &mut on_token);
                let _ = tx.send(StreamSignal::End(result));
            });

        if let Err(e) = spawned {
            let _ = sentinel_tx.send(StreamSignal::End(Err(ProviderError::NotConfigured(
                format!("failed to spawn producer thread: {e}"),
            ))));
        }

        Self { rx, closed: false }
    }

    /// Pull the next token. Yields `None` once the stream has ended or
    /// been closed, and forever after.
    pub async fn next(&mut self) -> Option<String> {
        if self.closed {
            return None;
        }
        match self.rx.recv().await {
            Some(StreamSignal::Token(token)) => Some(token),
            Some(StreamSignal::End(result)) => {
                self.closed = true;
                if let Err(e) = result {
                    warn!(error = %e, "Token stream ended with error");
                }
                None
            }
            None => {
                self.closed = true;
                None
            }
        }
    }

    /// Stop consuming. Subsequent `next()` calls return `None`
    /// immediately; already-buffered tokens are discarded.
    pub fn close(&mut self) {
        self.closed = true;
        self.rx.close();
    }
}
