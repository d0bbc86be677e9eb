//! The outbox polling worker.

use std::sync::Arc;
use std::time::Duration;

use orderflow_core::broker::EventBroker;
use orderflow_core::outbox::OutboxEvent;
use orderflow_core::repository::OutboxRepository;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Tunables for the outbox publisher.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Time between polling cycles. Doubles as the implicit retry backoff.
    pub poll_interval: Duration,
    /// Maximum number of events fetched per cycle.
    pub batch_size: i64,
    /// Failed attempts before an event goes terminal FAILED.
    pub max_retries: i32,
    /// Bound on a single broker publish call; a timeout counts as a failure.
    pub publish_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 50,
            max_retries: 3,
            publish_timeout: Duration::from_secs(5),
        }
    }
}

/// Counts for one polling cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Events marked processed this cycle.
    pub published: usize,
    /// Events whose publish attempt failed this cycle.
    pub failed: usize,
}

/// Relays committed outbox events to the broker.
///
/// The worker communicates with the rest of the system only through the
/// outbox store, so a process restart never loses pending work. Per-event
/// failures are isolated: they are logged, counted against the event's
/// retry allowance, and never crash the loop.
pub struct OutboxPublisher {
    outbox: Arc<dyn OutboxRepository>,
    broker: Arc<dyn EventBroker>,
    config: PublisherConfig,
}

impl OutboxPublisher {
    /// Creates a new publisher.
    pub fn new(
        outbox: Arc<dyn OutboxRepository>,
        broker: Arc<dyn EventBroker>,
        config: PublisherConfig,
    ) -> Self {
        Self {
            outbox,
            broker,
            config,
        }
    }

    /// Runs one polling cycle: fetch a batch of pending events oldest first,
    /// publish each, and record the outcome.
    ///
    /// Never returns an error; storage failures are logged and retried on
    /// the next cycle, leaving every unpublished event PENDING.
    pub async fn run_once(&self) -> BatchOutcome {
        let batch = match self.outbox.fetch_pending(self.config.batch_size).await {
            Ok(batch) => batch,
            Err(err) => {
                tracing::warn!(error = %err, "outbox fetch failed, retrying next cycle");
                return BatchOutcome::default();
            }
        };

        let mut outcome = BatchOutcome::default();
        for event in batch {
            if self.publish_one(&event).await {
                outcome.published += 1;
            } else {
                outcome.failed += 1;
            }
        }

        if outcome.published > 0 || outcome.failed > 0 {
            tracing::info!(
                published = outcome.published,
                failed = outcome.failed,
                "outbox cycle complete"
            );
        }
        outcome
    }

    /// Publishes a single event, bounded by the configured timeout, and
    /// records success or failure. Returns true on success.
    async fn publish_one(&self, event: &OutboxEvent) -> bool {
        let attempt = tokio::time::timeout(self.config.publish_timeout, async {
            self.broker.publish(event).await
        })
        .await;

        let error = match attempt {
            Ok(Ok(())) => {
                if let Err(err) = self.outbox.mark_processed(event.event_id).await {
                    // The publish succeeded; the event stays PENDING and will
                    // be re-published. Duplicate delivery is the accepted
                    // trade-off, silent loss is not.
                    tracing::warn!(
                        event_id = %event.event_id,
                        error = %err,
                        "failed to mark event processed"
                    );
                }
                tracing::debug!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    "event published"
                );
                return true;
            }
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!(
                "publish timed out after {:?}",
                self.config.publish_timeout
            ),
        };

        tracing::warn!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            retry_count = event.retry_count,
            error = %error,
            "event publish failed"
        );
        if let Err(err) = self
            .outbox
            .mark_failed(event.event_id, &error, self.config.max_retries)
            .await
        {
            tracing::warn!(
                event_id = %event.event_id,
                error = %err,
                "failed to record publish failure"
            );
        }
        false
    }

    /// Starts the polling loop on the runtime, returning a handle that stops
    /// it gracefully.
    #[must_use]
    pub fn start(self) -> PublisherHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let poll_interval = self.config.poll_interval;

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(interval = ?poll_interval, "outbox publisher started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("outbox publisher stopping");
                        break;
                    }
                }
            }
        });

        PublisherHandle {
            shutdown_tx,
            join,
        }
    }
}

/// Handle to a running publisher loop.
pub struct PublisherHandle {
    shutdown_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl PublisherHandle {
    /// Signals the loop to stop and waits for it to finish the current
    /// cycle. Events not yet published simply stay PENDING.
    pub async fn stop(self) {
        // The receiver is gone only if the task already exited.
        let _ = self.shutdown_tx.send(());
        if let Err(err) = self.join.await {
            tracing::warn!(error = %err, "publisher task join failed");
        }
    }
}
