//! Typed events pushed by the interaction sources into the pipeline
//!
//! The landmark and voice producers deliver already-computed numeric outputs;
//! this module only defines the shapes they arrive in and the merged event
//! type the pipeline consumer reads.

use serde::Deserialize;

/// Which hand the detector attributed the landmarks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

/// A normalized screen coordinate of one tracked point on a hand.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

/// One detected hand: ordered landmark list plus a handedness label.
///
/// Only `landmarks[0].y` is consumed by the gesture path.
#[derive(Debug, Clone, Deserialize)]
pub struct HandDetection {
    pub handedness: Handedness,
    pub landmarks: Vec<Landmark>,
}

/// Zero or more hand detections for one processed frame.
#[derive(Debug, Clone, Deserialize)]
pub struct HandFrame {
    pub hands: Vec<HandDetection>,
}

/// One utterance window from the voice classifier: a fixed label vocabulary
/// with a parallel score array.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceResult {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

/// Merged event stream consumed by the pipeline task.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Frame(HandFrame),
    Voice(VoiceResult),
}
