//! Shared helpers for the service test modules: scripted detector backends
//! and ready-made frames/payloads.

use std::{path::PathBuf, sync::Arc};

use hand_core::{
    detector::{DetectorError, LandmarkModel, ModelFactory},
    HandDetection, Handedness, Landmark, LANDMARK_COUNT,
};

use crate::service::{codec, frame::Frame};

/// Detector stand-in that replays a fixed script.
pub(crate) struct ScriptedModel {
    hands: Vec<HandDetection>,
    fail_with: Option<String>,
}

impl LandmarkModel for ScriptedModel {
    fn detect(
        &mut self,
        _rgb: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<HandDetection>, DetectorError> {
        match &self.fail_with {
            Some(message) => Err(DetectorError::Inference(message.clone())),
            None => Ok(self.hands.clone()),
        }
    }
}

/// Factory whose models always report the given hands.
pub(crate) fn scripted_factory(hands: Vec<HandDetection>) -> ModelFactory {
    Arc::new(move || {
        Ok(Box::new(ScriptedModel {
            hands: hands.clone(),
            fail_with: None,
        }) as Box<dyn LandmarkModel>)
    })
}

/// Factory whose models fail every `detect` call.
pub(crate) fn failing_detect_factory(message: &str) -> ModelFactory {
    let message = message.to_string();
    Arc::new(move || {
        Ok(Box::new(ScriptedModel {
            hands: Vec::new(),
            fail_with: Some(message.clone()),
        }) as Box<dyn LandmarkModel>)
    })
}

/// Factory that fails construction the way a missing weights file does.
pub(crate) fn missing_model_factory() -> ModelFactory {
    Arc::new(|| {
        Err(DetectorError::ModelNotFound(PathBuf::from(
            "./models/landmark.task",
        )))
    })
}

/// A detection whose 21 landmarks all sit at the same normalized point.
pub(crate) fn hand_at(x: f32, y: f32) -> HandDetection {
    HandDetection {
        landmarks: [Landmark { x, y, z: 0.0 }; LANDMARK_COUNT],
        score: 0.9,
        handedness: Handedness::Unknown,
    }
}

pub(crate) fn solid_frame(width: u32, height: u32, bgr: [u8; 3]) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for _ in 0..width * height {
        data.extend_from_slice(&bgr);
    }
    Frame {
        data,
        width,
        height,
    }
}

/// Base64 JPEG data URI of a solid-color frame, ready to submit.
pub(crate) fn solid_payload(width: u32, height: u32) -> String {
    codec::encode_frame(&solid_frame(width, height, [64, 96, 128]), 85)
        .expect("encode test frame")
}
