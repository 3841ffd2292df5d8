//! HTTP control surface and event ingestion endpoints
//!
//! The control endpoints are fire-and-forget: they answer before knowing
//! whether the gate accepted the action or the device command succeeded. The
//! ingestion endpoints are how the external landmark detector and voice
//! classifier deliver their per-frame / per-utterance outputs.

use crate::dispatch::{BrightAction, CommandDispatcher};
use crate::events::{HandFrame, PipelineEvent, VoiceResult};
use crate::intent::Intent;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<CommandDispatcher>,
    pub events: mpsc::Sender<PipelineEvent>,
}

#[derive(Debug, Deserialize)]
struct BrightRequest {
    action: BrightAction,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/bright", post(bright))
        .route("/api/toggle", post(toggle))
        .route("/api/landmarks", post(landmarks))
        .route("/api/voice", post(voice))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Malformed bodies are rejected by the extractor with a client error and
/// never reach the dispatcher.
async fn bright(State(state): State<AppState>, Json(req): Json<BrightRequest>) -> StatusCode {
    state.dispatcher.on_api_request(req.action).await;
    StatusCode::NO_CONTENT
}

async fn toggle(State(state): State<AppState>) -> StatusCode {
    state.dispatcher.on_intent(Intent::Toggle).await;
    StatusCode::NO_CONTENT
}

async fn landmarks(State(state): State<AppState>, Json(frame): Json<HandFrame>) -> StatusCode {
    enqueue(&state, PipelineEvent::Frame(frame)).await
}

async fn voice(State(state): State<AppState>, Json(result): Json<VoiceResult>) -> StatusCode {
    enqueue(&state, PipelineEvent::Voice(result)).await
}

async fn enqueue(state: &AppState, event: PipelineEvent) -> StatusCode {
    if state.events.send(event).await.is_err() {
        warn!("pipeline closed, dropping event");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::ACCEPTED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrightnessPresets, GateConfig};
    use crate::device::{Command, TransitionMode};
    use crate::dispatch::DeviceControl;
    use crate::error::DeviceError;
    use crate::gate::ActionGate;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::advance;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingDevice {
        commands: Mutex<Vec<Command>>,
    }

    #[async_trait]
    impl DeviceControl for RecordingDevice {
        async fn send(&self, command: Command) -> Result<(), DeviceError> {
            self.commands.lock().await.push(command);
            Ok(())
        }
    }

    fn test_app() -> (Arc<RecordingDevice>, Router, mpsc::Receiver<PipelineEvent>) {
        let device = Arc::new(RecordingDevice::default());
        let dispatcher = Arc::new(CommandDispatcher::new(
            ActionGate::new(&GateConfig::default()),
            device.clone(),
            BrightnessPresets::default(),
        ));
        let (events, event_rx) = mpsc::channel(8);
        let router = build_router(AppState { dispatcher, events });
        (device, router, event_rx)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_empty(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_bright_up_issues_one_set_brightness() {
        let (device, router, _events) = test_app();

        let response = router
            .clone()
            .oneshot(post_json("/api/bright", r#"{"action":"up"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // A second identical request inside the brightness cooldown is a
        // silent no-op: same status, no extra command.
        advance(Duration::from_millis(500)).await;
        let response = router
            .oneshot(post_json("/api/bright", r#"{"action":"up"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        assert_eq!(
            *device.commands.lock().await,
            vec![Command::SetBrightness {
                level: 95,
                mode: TransitionMode::Smooth,
                duration_ms: 1000,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_bright_down_maps_to_low_preset() {
        let (device, router, _events) = test_app();

        let response = router
            .oneshot(post_json("/api/bright", r#"{"action":"down"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            *device.commands.lock().await,
            vec![Command::SetBrightness {
                level: 5,
                mode: TransitionMode::Smooth,
                duration_ms: 1000,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_action_rejected_at_boundary() {
        let (device, router, _events) = test_app();

        let response = router
            .clone()
            .oneshot(post_json("/api/bright", r#"{"action":"sideways"}"#))
            .await
            .unwrap();
        assert!(response.status().is_client_error());

        let response = router
            .oneshot(post_json("/api/bright", r#"{}"#))
            .await
            .unwrap();
        assert!(response.status().is_client_error());

        assert!(device.commands.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_endpoint() {
        let (device, router, _events) = test_app();

        let response = router.oneshot(post_empty("/api/toggle")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(*device.commands.lock().await, vec![Command::Toggle]);
    }

    #[tokio::test]
    async fn test_landmarks_are_enqueued() {
        let (_device, router, mut events) = test_app();

        let body = r#"{"hands":[{"handedness":"left","landmarks":[{"x":0.2,"y":0.7}]}]}"#;
        let response = router
            .oneshot(post_json("/api/landmarks", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        match events.recv().await {
            Some(PipelineEvent::Frame(frame)) => {
                assert_eq!(frame.hands[0].landmarks[0].y, 0.7);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_voice_is_enqueued() {
        let (_device, router, mut events) = test_app();

        let response = router
            .oneshot(post_json(
                "/api/voice",
                r#"{"labels":["snap"],"scores":[0.9]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        assert!(matches!(events.recv().await, Some(PipelineEvent::Voice(_))));
    }

    #[tokio::test]
    async fn test_healthz() {
        let (_device, router, _events) = test_app();
        let response = router
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
