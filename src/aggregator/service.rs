use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::Aggregator;
use crate::messaging::Envelope;

impl Aggregator {
    /// Serve the inbox until every [`AggregatorHandle`] is dropped
    ///
    /// Each envelope runs in its own task, so a slow or failing handler never
    /// holds up the others. A failed handler drops its reply channel, which is
    /// the only failure signal the sender gets. A reply nobody waits for any
    /// more is discarded. Returns once the inbox is closed and every in-flight
    /// handler has finished.
    ///
    /// [`AggregatorHandle`]: crate::messaging::AggregatorHandle
    pub async fn serve(self: Arc<Self>, mut inbox: mpsc::UnboundedReceiver<Envelope>) {
        let mut handlers = JoinSet::new();
        log::info!("Aggregator started");

        loop {
            tokio::select! {
                envelope = inbox.recv() => {
                    let Some(envelope) = envelope else { break };
                    let aggregator = Arc::clone(&self);
                    handlers.spawn(async move { aggregator.dispatch(envelope).await });
                }
                Some(joined) = handlers.join_next(), if !handlers.is_empty() => {
                    if let Err(e) = joined {
                        log::error!("Message handler panicked: {}", e);
                    }
                }
            }
        }

        while let Some(joined) = handlers.join_next().await {
            if let Err(e) = joined {
                log::error!("Message handler panicked: {}", e);
            }
        }

        log::info!("Aggregator stopped");
    }

    async fn dispatch(&self, envelope: Envelope) {
        let Envelope { request, reply } = envelope;
        let kind = request.kind();

        match self.handle(request).await {
            Ok(response) => {
                if let Some(reply) = reply
                    && reply.send(response).is_err()
                {
                    log::debug!("Sender of {} went away before the reply", kind);
                }
            }
            Err(e) => log::warn!("Failed to handle {}: {:#}", kind, e),
        }
    }
}
