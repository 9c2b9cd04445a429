use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::clients::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Time between request ticks.
    pub period: Duration,
    /// Deadline for a single request.
    pub timeout: Duration,
}

impl PollSettings {
    pub fn new(period: Duration, timeout: Duration) -> Self {
        Self { period, timeout }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(10))
    }
}

/// A running periodic poll.
///
/// A request is issued on start and then at every tick, without waiting for
/// earlier requests to resolve. Each request carries a sequence number so the
/// consumer can order results. Once stopped, no result reaches the sink, even
/// one whose request was already in flight. Dropping the handle stops it.
pub struct PollerHandle {
    label: String,
    token: CancellationToken,
}

impl PollerHandle {
    pub fn spawn<F, Fut, T, S>(
        label: impl Into<String>,
        settings: PollSettings,
        fetch: F,
        sink: S,
    ) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
        T: Send + 'static,
        S: Fn(u64, T) + Send + Sync + 'static,
    {
        let label = label.into();
        let token = CancellationToken::new();
        tokio::spawn(run(
            label.clone(),
            settings,
            token.clone(),
            fetch,
            Arc::new(sink),
        ));
        Self { label, token }
    }

    pub fn is_alive(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            debug!(poller = %self.label, "stopping poller");
            self.token.cancel();
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run<F, Fut, T, S>(
    label: String,
    settings: PollSettings,
    token: CancellationToken,
    fetch: F,
    sink: Arc<S>,
) where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    T: Send + 'static,
    S: Fn(u64, T) + Send + Sync + 'static,
{
    let mut interval = time::interval(settings.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seq = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(poller = %label, "poller stopped");
                return;
            }
            _ = interval.tick() => {
                seq += 1;
                tokio::spawn(request(
                    label.clone(),
                    seq,
                    settings.timeout,
                    token.clone(),
                    fetch(),
                    sink.clone(),
                ));
            }
        }
    }
}

async fn request<Fut, T, S>(
    label: String,
    seq: u64,
    timeout: Duration,
    token: CancellationToken,
    fut: Fut,
    sink: Arc<S>,
) where
    Fut: Future<Output = Result<T, ClientError>>,
    S: Fn(u64, T),
{
    let outcome = tokio::select! {
        _ = token.cancelled() => return,
        r = time::timeout(timeout, fut) => r,
    };

    // Cancellation can land between completion and here.
    if token.is_cancelled() {
        debug!(poller = %label, seq, "discarding result from stopped poller");
        return;
    }

    match outcome {
        Ok(Ok(value)) => (*sink)(seq, value),
        Ok(Err(e)) => warn!(poller = %label, seq, "poll failed: {}", e),
        Err(_) => warn!(
            poller = %label,
            seq,
            "poll failed: {}",
            ClientError::Timeout(timeout)
        ),
    }
}
