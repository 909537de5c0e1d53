//! Gesture-to-delivery wiring.
//!
//! The poller owns the [`GestureDetector`]; every confirmed double copy spawns an
//! independent tokio task that resolves the language pair, calls the chat
//! backend and hands exactly one [`Delivery`] to the [`Presenter`]. Runs are
//! never queued, coalesced or cancelled.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::client::{ChatBackend, TranslationClient};
use crate::config::Config;
use crate::error::{ErrorKind, TranslateError};
use crate::gesture::GestureDetector;
use crate::language::{LanguageConfig, LanguageDetector};
use crate::prompt::{bundled_examples, load_examples, ChatMessage, PromptBuilder};

pub type RunId = u64;

/// Wall time as seen by the tokio clock, so paused-time tests drive the poller.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Clipboard access supplied by the platform.
pub trait ClipboardSource: Send + Sync {
    /// Monotonic counter bumped by every clipboard write.
    fn change_counter(&self) -> u64;
    fn current_text(&self) -> Option<String>;
}

/// Receives every finished run, successful or not.
pub trait Presenter: Send + Sync {
    fn deliver(&self, delivery: Delivery);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub source_language: String,
    pub target_language: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResult {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&TranslateError> for ErrorResult {
    fn from(e: &TranslateError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Translated(TranslationResult),
    Failed(ErrorResult),
}

/// One run's result, tagged with the run and the clipboard state that started it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub run: RunId,
    pub clipboard_counter: u64,
    pub outcome: Outcome,
}

impl Delivery {
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    /// Text for the bubble; errors are marked so they can't pass for a translation.
    pub fn display_text(&self) -> String {
        match &self.outcome {
            Outcome::Translated(r) => r.text.clone(),
            Outcome::Failed(e) => format!("⚠ {}: {}", e.kind, e.message),
        }
    }
}

/// Presenter that forwards deliveries to a channel, for a UI thread to drain.
pub struct ChannelPresenter {
    tx: crossbeam_channel::Sender<Delivery>,
}

impl ChannelPresenter {
    pub fn new(tx: crossbeam_channel::Sender<Delivery>) -> Self {
        Self { tx }
    }
}

impl Presenter for ChannelPresenter {
    fn deliver(&self, delivery: Delivery) {
        if self.tx.send(delivery).is_err() {
            warn!("Presenter channel closed; delivery dropped");
        }
    }
}

/// Stands in for the HTTP client when the endpoint could not be resolved, so each
/// run still reports the configuration problem.
struct UnavailableBackend {
    reason: String,
}

#[async_trait]
impl ChatBackend for UnavailableBackend {
    async fn send(&self, _messages: &[ChatMessage]) -> Result<String, TranslateError> {
        Err(TranslateError::Configuration(self.reason.clone()))
    }
}

/// Stateless text -> translation path shared by all runs.
pub struct Pipeline {
    detector: LanguageDetector,
    prompts: PromptBuilder,
    backend: Arc<dyn ChatBackend>,
}

impl Pipeline {
    pub fn new(languages: &LanguageConfig, prompts: PromptBuilder, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            detector: LanguageDetector::new(languages),
            prompts,
            backend,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let examples = match &cfg.few_shot_examples_path {
            Some(path) => load_examples(path).unwrap_or_else(|e| {
                warn!("{:#}; using bundled examples", e);
                bundled_examples()
            }),
            None => bundled_examples(),
        };
        let backend: Arc<dyn ChatBackend> = match TranslationClient::from_config(cfg) {
            Ok(client) => {
                info!("Chat completions endpoint: {}", client.endpoint().url);
                Arc::new(client)
            }
            Err(e) => {
                error!("Translation endpoint unavailable: {}", e);
                let reason = match e {
                    TranslateError::Configuration(reason) => reason,
                    other => other.to_string(),
                };
                Arc::new(UnavailableBackend { reason })
            }
        };
        Self::new(&cfg.language_config(), PromptBuilder::new(examples), backend)
    }

    pub async fn translate(&self, text: &str) -> Result<TranslationResult, TranslateError> {
        let direction = self.detector.resolve(text);
        info!(
            "Translating {} chars {} -> {}",
            text.chars().count(),
            direction.source,
            direction.target
        );
        let messages = self.prompts.build(text, &direction.source, &direction.target);
        let translated = self.backend.send(&messages).await?;
        Ok(TranslationResult {
            source_language: direction.source,
            target_language: direction.target,
            text: translated,
        })
    }
}

/// Polls the clipboard, detects double copies and launches translation runs.
pub struct Orchestrator {
    pipeline: Arc<Pipeline>,
    clipboard: Arc<dyn ClipboardSource>,
    presenter: Arc<dyn Presenter>,
    gesture: GestureDetector,
    next_run: RunId,
    discard_stale: bool,
}

impl Orchestrator {
    pub fn new(
        pipeline: Arc<Pipeline>,
        clipboard: Arc<dyn ClipboardSource>,
        presenter: Arc<dyn Presenter>,
        gap: Duration,
    ) -> Self {
        let gesture = GestureDetector::new(gap, clipboard.change_counter(), now());
        Self {
            pipeline,
            clipboard,
            presenter,
            gesture,
            next_run: 1,
            discard_stale: false,
        }
    }

    /// Drop results whose clipboard changed while they were in flight.
    pub fn discard_stale_results(mut self, enabled: bool) -> Self {
        self.discard_stale = enabled;
        self
    }

    /// One poll. Returns the spawned run, if this tick started one.
    pub fn tick(&mut self, now: Instant) -> Option<JoinHandle<()>> {
        let counter = self.clipboard.change_counter();
        if !self.gesture.on_tick(counter, now) {
            return None;
        }
        debug!("Double copy detected (counter {})", counter);
        self.start_run(counter)
    }

    fn start_run(&mut self, counter: u64) -> Option<JoinHandle<()>> {
        let text = match self.clipboard.current_text() {
            Some(t) if !t.trim().is_empty() => t,
            _ => {
                info!("Double copy with empty clipboard; nothing to translate");
                return None;
            }
        };

        let run = self.next_run;
        self.next_run += 1;

        let pipeline = Arc::clone(&self.pipeline);
        let clipboard = Arc::clone(&self.clipboard);
        let presenter = Arc::clone(&self.presenter);
        let discard_stale = self.discard_stale;

        let task = async move {
            let outcome = match pipeline.translate(&text).await {
                Ok(result) => Outcome::Translated(result),
                Err(e) => {
                    warn!("Translation failed: {}", e);
                    Outcome::Failed(ErrorResult::from(&e))
                }
            };
            if discard_stale && clipboard.change_counter() != counter {
                info!("Clipboard changed while translating; dropping stale result");
                return;
            }
            presenter.deliver(Delivery {
                run,
                clipboard_counter: counter,
                outcome,
            });
        };
        Some(tokio::spawn(task.instrument(info_span!("run", id = run))))
    }

    /// Poll forever on `poll_interval`. Runs are detached from the poller.
    pub async fn run(mut self, poll_interval: Duration) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "Watching clipboard every {:?} (double-copy gap {:?})",
            poll_interval,
            self.gesture.gap()
        );
        loop {
            ticker.tick().await;
            let _ = self.tick(now());
        }
    }
}
