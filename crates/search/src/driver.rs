use std::sync::Arc;
use std::time::Duration;

use marquee_metadata::models::SearchSuggestion;
use marquee_metadata::{MetadataError, MetadataSource};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::machine::{Effect, Input, Machine, Snapshot};

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    pub debounce: Duration,
    pub blur_grace: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            blur_grace: Duration::from_millis(150),
        }
    }
}

/// Anything that can answer a suggestion query.
#[async_trait::async_trait]
pub trait SuggestionFetcher: Send + Sync {
    async fn fetch_suggestions(&self, query: &str) -> Result<Vec<SearchSuggestion>, MetadataError>;
}

#[async_trait::async_trait]
impl<T: MetadataSource + ?Sized> SuggestionFetcher for T {
    async fn fetch_suggestions(&self, query: &str) -> Result<Vec<SearchSuggestion>, MetadataError> {
        self.search_suggestions(query).await
    }
}

/// A [`Machine`] running on its own task, fed through a channel.
///
/// Superseded requests are cancelled (their task is told to stop and its
/// result is never delivered) in addition to the machine's token check.
pub struct SuggestionCoordinator {
    inputs: mpsc::UnboundedSender<Input>,
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl SuggestionCoordinator {
    pub fn spawn<F>(fetcher: Arc<F>, config: CoordinatorConfig) -> Self
    where
        F: SuggestionFetcher + ?Sized + 'static,
    {
        let (inputs, rx) = mpsc::unbounded_channel();
        let (snap_tx, snapshots) = watch::channel(Machine::new().snapshot());
        let task = tokio::spawn(run(fetcher, config, rx, snap_tx));
        Self {
            inputs,
            snapshots,
            task,
        }
    }

    /// Returns false once the coordinator has stopped.
    pub fn send(&self, input: Input) -> bool {
        self.inputs.send(input).is_ok()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }
}

impl Drop for SuggestionCoordinator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

type FetchResult = (u64, Result<Vec<SearchSuggestion>, MetadataError>);

async fn run<F>(
    fetcher: Arc<F>,
    config: CoordinatorConfig,
    mut inputs: mpsc::UnboundedReceiver<Input>,
    snapshots: watch::Sender<Snapshot>,
) where
    F: SuggestionFetcher + ?Sized + 'static,
{
    let mut machine = Machine::new();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<FetchResult>();
    let mut debounce: Option<(u64, Instant)> = None;
    let mut blur_grace: Option<(u64, Instant)> = None;
    let mut in_flight: Option<CancellationToken> = None;

    loop {
        let effects = tokio::select! {
            input = inputs.recv() => match input {
                Some(input) => machine.handle(input),
                None => break,
            },
            _ = wait_until(debounce.map(|(_, at)| at)) => match debounce.take() {
                Some((token, _)) => machine.debounce_elapsed(token),
                None => Vec::new(),
            },
            _ = wait_until(blur_grace.map(|(_, at)| at)) => match blur_grace.take() {
                Some((token, _)) => machine.blur_elapsed(token),
                None => Vec::new(),
            },
            Some((token, result)) = done_rx.recv() => machine.fetch_finished(token, result),
        };

        for effect in effects {
            match effect {
                Effect::ArmDebounce { token } => {
                    debounce = Some((token, Instant::now() + config.debounce));
                }
                Effect::CancelDebounce => debounce = None,
                Effect::ArmBlurGrace { token } => {
                    blur_grace = Some((token, Instant::now() + config.blur_grace));
                }
                Effect::CancelBlurGrace => blur_grace = None,
                Effect::CancelFetch => {
                    if let Some(cancel) = in_flight.take() {
                        cancel.cancel();
                    }
                }
                Effect::Fetch { token, query } => {
                    if let Some(cancel) = in_flight.take() {
                        cancel.cancel();
                    }
                    let cancel = CancellationToken::new();
                    in_flight = Some(cancel.clone());

                    let fetcher = fetcher.clone();
                    let done = done_tx.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                debug!(token, "suggestion request cancelled");
                            }
                            result = fetcher.fetch_suggestions(&query) => {
                                let _ = done.send((token, result));
                            }
                        }
                    });
                }
            }
        }

        let next = machine.snapshot();
        snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    if let Some(cancel) = in_flight {
        cancel.cancel();
    }
}
