//! Routes classified intents, voice triggers, and API requests into gated
//! device commands

use crate::config::BrightnessPresets;
use crate::device::{Command, SessionHandle};
use crate::error::DeviceError;
use crate::events::PipelineEvent;
use crate::gate::{ActionCategory, ActionGate};
use crate::intent::{Intent, IntentDebouncer};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Voice label that maps to the toggle action.
const VOICE_TOGGLE_LABEL: &str = "snap";
/// Fixed confidence bar for accepting a voice trigger.
const VOICE_SCORE_THRESHOLD: f32 = 0.5;

/// Command channel to the bound device, abstracted so the dispatch path can
/// be exercised without a real bulb.
#[async_trait]
pub trait DeviceControl: Send + Sync {
    async fn send(&self, command: Command) -> Result<(), DeviceError>;
}

#[async_trait]
impl DeviceControl for SessionHandle {
    async fn send(&self, command: Command) -> Result<(), DeviceError> {
        self.command(command).await
    }
}

/// Direct user-facing brightness action from the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrightAction {
    Up,
    Down,
}

/// Funnels every entry point through the action gate into the device session.
///
/// All entry points are best-effort: a gate rejection or a device failure is
/// a logged no-op, never an error surfaced to the gesture/voice/API source.
pub struct CommandDispatcher {
    gate: ActionGate,
    device: Arc<dyn DeviceControl>,
    presets: BrightnessPresets,
}

impl CommandDispatcher {
    pub fn new(gate: ActionGate, device: Arc<dyn DeviceControl>, presets: BrightnessPresets) -> Self {
        Self {
            gate,
            device,
            presets,
        }
    }

    /// Handle a classified gesture intent.
    pub async fn on_intent(&self, intent: Intent) {
        match intent {
            Intent::Brighten => self.set_brightness(self.presets.high).await,
            Intent::Dim => self.set_brightness(self.presets.low).await,
            Intent::Toggle => self.toggle().await,
        }
    }

    /// Handle one (label, score) pair from the voice classifier.
    pub async fn on_voice(&self, label: &str, score: f32) {
        if label != VOICE_TOGGLE_LABEL || score <= VOICE_SCORE_THRESHOLD {
            return;
        }
        debug!(%label, score, "voice trigger accepted");
        self.toggle().await;
    }

    /// Handle a brightness request from the HTTP control surface.
    pub async fn on_api_request(&self, action: BrightAction) {
        match action {
            BrightAction::Up => self.set_brightness(self.presets.high).await,
            BrightAction::Down => self.set_brightness(self.presets.low).await,
        }
    }

    async fn set_brightness(&self, level: u8) {
        if !self.gate.try_acquire(ActionCategory::Brightness).await {
            debug!(level, "brightness change suppressed by cooldown");
            return;
        }
        self.issue(Command::SetBrightness {
            level,
            mode: self.presets.mode,
            duration_ms: self.presets.transition_ms,
        })
        .await;
    }

    async fn toggle(&self) {
        if !self.gate.try_acquire(ActionCategory::Toggle).await {
            debug!("toggle suppressed by cooldown");
            return;
        }
        self.issue(Command::Toggle).await;
    }

    async fn issue(&self, command: Command) {
        // The HTTP caller was already answered and the gesture source never
        // listens; the outcome still goes to the logs.
        match self.device.send(command.clone()).await {
            Ok(()) => debug!(?command, "command delivered"),
            Err(e) => warn!(?command, error = %e, "command not delivered"),
        }
    }
}

/// Consume the merged event stream from the interaction producers.
///
/// The debouncer lives here so landmark frames are processed strictly one at
/// a time; ordering within each producer is preserved by its channel sends.
pub async fn run_pipeline(
    mut events: mpsc::Receiver<PipelineEvent>,
    mut debouncer: IntentDebouncer,
    dispatcher: Arc<CommandDispatcher>,
) {
    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::Frame(frame) => {
                for hand in &frame.hands {
                    let Some(first) = hand.landmarks.first() else {
                        continue;
                    };
                    if let Some(intent) = debouncer.observe(first.y) {
                        debug!(
                            ?intent,
                            hand = ?hand.handedness,
                            x = first.x,
                            y = first.y,
                            "gesture intent"
                        );
                        dispatcher.on_intent(intent).await;
                    }
                }
            }
            PipelineEvent::Voice(result) => {
                for (label, score) in result.labels.iter().zip(&result.scores) {
                    dispatcher.on_voice(label, *score).await;
                }
            }
        }
    }
}
