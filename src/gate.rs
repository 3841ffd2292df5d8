//! Per-category cooldown gate for outbound device actions

use crate::config::GateConfig;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Action categories rate-limited independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Toggle,
    Brightness,
}

impl ActionCategory {
    fn index(self) -> usize {
        match self {
            ActionCategory::Toggle => 0,
            ActionCategory::Brightness => 1,
        }
    }
}

/// Lossy rate limiter: at most one action per category per cooldown window.
///
/// Rejected requests are dropped, never queued or merged; callers treat a
/// `false` as a no-op. The check-and-set happens under one lock acquisition,
/// so concurrent callers (HTTP handlers racing the gesture pipeline) cannot
/// both acquire the same category.
pub struct ActionGate {
    cooldowns: [Duration; 2],
    deadlines: Mutex<[Option<Instant>; 2]>,
}

impl ActionGate {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            cooldowns: [config.toggle_cooldown, config.brightness_cooldown],
            deadlines: Mutex::new([None, None]),
        }
    }

    /// Try to acquire the category's cooldown slot.
    ///
    /// Returns `false` without side effects while the category is cooling
    /// down; otherwise starts the window and returns `true`.
    pub async fn try_acquire(&self, category: ActionCategory) -> bool {
        let idx = category.index();
        let now = Instant::now();

        let mut deadlines = self.deadlines.lock().await;
        if let Some(until) = deadlines[idx] {
            if now < until {
                return false;
            }
        }
        deadlines[idx] = Some(now + self.cooldowns[idx]);
        true
    }
}
