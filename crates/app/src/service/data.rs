//! Wire-facing request and response bodies.

use serde::{Deserialize, Serialize};

use crate::service::pipeline::{FrameReport, PipelineError};

/// Request body shared by `/predict`, `/process_frame`, and the WebSocket
/// surface: one base64-encoded image, optionally with a data-URI header.
#[derive(Debug, Deserialize)]
pub(crate) struct ImagePayload {
    pub(crate) image: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct BannerResponse {
    pub(crate) message: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictResponse {
    pub(crate) label: &'static str,
    pub(crate) count: u32,
    pub(crate) confidence: f64,
}

/// Structured result object shared by the HTTP and WebSocket surfaces.
/// Both surfaces report failures through this one shape; nothing is ever
/// silently echoed back.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum ProcessResponse {
    Done {
        success: bool,
        hand_detected: bool,
        num_hands: usize,
        processed_frame: String,
    },
    Failed {
        success: bool,
        error: String,
    },
}

impl ProcessResponse {
    pub(crate) fn from_result(result: Result<FrameReport, PipelineError>) -> Self {
        match result {
            Ok(report) => Self::Done {
                success: true,
                hand_detected: report.hand_detected,
                num_hands: report.num_hands,
                processed_frame: report.processed_frame,
            },
            Err(err) => Self::Failed {
                success: false,
                error: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_serialises_with_the_expected_fields() {
        let response = ProcessResponse::from_result(Ok(FrameReport {
            hand_detected: true,
            num_hands: 2,
            processed_frame: "data:image/jpeg;base64,AAAA".to_string(),
        }));
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&response).unwrap()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["hand_detected"], true);
        assert_eq!(json["num_hands"], 2);
        assert!(json["processed_frame"].as_str().unwrap().starts_with("data:image/jpeg"));
    }

    #[test]
    fn failure_serialises_success_false_and_a_message() {
        let response = ProcessResponse::from_result(Err(PipelineError::WorkersUnavailable));
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&response).unwrap()).unwrap();
        assert_eq!(json["success"], false);
        assert!(!json["error"].as_str().unwrap().is_empty());
        assert!(json.get("processed_frame").is_none());
    }
}
