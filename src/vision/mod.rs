//! Obstacle detection via the vision backend
//!
//! Frames go to the backend at a fixed interval; obstacles directly ahead
//! and above the confidence threshold are announced through the speech
//! channel. Detection failures are silent so a flaky camera or backend
//! never interrupts guidance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;

use crate::control::CancelToken;
use crate::speech::{SpeechChannel, SpeechOptions};
use crate::{Error, Result};

/// A detected obstacle
#[derive(Debug, Clone, Deserialize)]
pub struct Obstacle {
    pub object_type: String,
    pub confidence: f32,
    pub position: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Capability interface for grabbing one camera frame (JPEG bytes)
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Capture one frame
    ///
    /// # Errors
    ///
    /// Returns error if the camera is unavailable
    async fn capture_frame(&self) -> Result<Vec<u8>>;
}

/// HTTP client for the obstacle vision backend
pub struct VisionClient {
    client: reqwest::Client,
    base_url: String,
}

impl VisionClient {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Send one frame for detection
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or a non-success response
    pub async fn detect(&self, image: Vec<u8>) -> Result<Vec<Obstacle>> {
        #[derive(Deserialize)]
        struct VisionResponse {
            success: bool,
            #[serde(default)]
            obstacles: Vec<Obstacle>,
            #[serde(default)]
            message: Option<String>,
        }

        let part = reqwest::multipart::Part::bytes(image)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| Error::Vision(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(format!("{}/vision", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Vision(format!(
                "vision backend error {}",
                response.status()
            )));
        }

        let parsed: VisionResponse = response.json().await?;
        if !parsed.success {
            return Err(Error::Vision(
                parsed.message.unwrap_or_else(|| "detection failed".to_string()),
            ));
        }

        Ok(parsed.obstacles)
    }
}

/// Periodic obstacle announcer
pub struct ObstacleAnnouncer {
    vision: Arc<VisionClient>,
    frames: Arc<dyn FrameSource>,
    speech: SpeechChannel,
    options: SpeechOptions,
    interval: Duration,
    confidence_threshold: f32,
    cooldown: Duration,
}

impl ObstacleAnnouncer {
    #[must_use]
    pub fn new(
        vision: Arc<VisionClient>,
        frames: Arc<dyn FrameSource>,
        speech: SpeechChannel,
        options: SpeechOptions,
        interval: Duration,
        confidence_threshold: f32,
        cooldown: Duration,
    ) -> Self {
        Self {
            vision,
            frames,
            speech,
            options,
            interval,
            confidence_threshold,
            cooldown,
        }
    }

    /// Run until cancelled, announcing obstacles directly ahead
    pub async fn run(&self, cancel: &CancelToken) {
        // Last announcement time per object type, for the repeat cooldown
        let mut last_announced: HashMap<String, Instant> = HashMap::new();

        tracing::info!(
            interval = ?self.interval,
            threshold = self.confidence_threshold,
            "obstacle detection started"
        );

        while !cancel.is_cancelled() {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }

            let frame = match self.frames.capture_frame().await {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!(error = %e, "frame capture failed");
                    continue;
                }
            };

            let obstacles = match self.vision.detect(frame).await {
                Ok(obstacles) => obstacles,
                Err(e) => {
                    tracing::debug!(error = %e, "obstacle detection failed");
                    continue;
                }
            };

            for obstacle in obstacles {
                if !obstacle.position.eq_ignore_ascii_case("front")
                    || obstacle.confidence < self.confidence_threshold
                {
                    continue;
                }

                let now = Instant::now();
                let recently = last_announced
                    .get(&obstacle.object_type)
                    .is_some_and(|at| now.duration_since(*at) < self.cooldown);
                if recently {
                    continue;
                }
                last_announced.insert(obstacle.object_type.clone(), now);

                let text = obstacle
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Caution. {} ahead.", obstacle.object_type));

                tracing::info!(
                    object = %obstacle.object_type,
                    confidence = obstacle.confidence,
                    "obstacle announced"
                );
                self.speech.enqueue_speak(&text, &self.options).await;
            }
        }

        tracing::info!("obstacle detection stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacle_deserializes_backend_shape() {
        let obstacle: Obstacle = serde_json::from_str(
            r#"{
                "object_type": "pole",
                "confidence": 0.91,
                "position": "front",
                "description": "Caution. Pole directly ahead."
            }"#,
        )
        .unwrap();

        assert_eq!(obstacle.object_type, "pole");
        assert!(obstacle.confidence > 0.9);
    }
}
