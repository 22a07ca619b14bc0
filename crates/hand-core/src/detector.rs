//! Detector seam: configuration, error taxonomy, and the `LandmarkModel`
//! trait the service drives. The TorchScript-backed implementation lives
//! behind the `with-tch` feature so default builds stay free of libtorch.

use std::{path::PathBuf, sync::Arc};

use thiserror::Error;

use crate::HandDetection;

/// Single-image versus temporally-aware video inference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunningMode {
    Image,
    Video,
}

/// Configuration handed to a detector backend at construction time.
#[derive(Clone, Debug)]
pub struct DetectorOptions {
    pub model_path: PathBuf,
    pub max_hands: usize,
    pub min_detection_confidence: f32,
    /// Minimum presence/tracking confidence; only consulted in video mode.
    pub min_presence_confidence: f32,
    pub running_mode: RunningMode,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/landmark.task"),
            max_hands: 1,
            min_detection_confidence: 0.5,
            min_presence_confidence: 0.5,
            running_mode: RunningMode::Image,
        }
    }
}

#[derive(Debug, Error)]
pub enum DetectorError {
    /// Fatal at startup: the service refuses to run without its weights.
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("failed to load model: {0}")]
    ModelLoad(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Opaque landmark detector: one RGB image in, zero or more hands out.
///
/// Implementations are owned by exactly one worker thread, so `detect`
/// takes `&mut self` and no synchronisation is required.
pub trait LandmarkModel: Send {
    fn detect(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<HandDetection>, DetectorError>;
}

/// Builds one model instance per detection worker.
pub type ModelFactory =
    Arc<dyn Fn() -> Result<Box<dyn LandmarkModel>, DetectorError> + Send + Sync>;

#[cfg(feature = "with-tch")]
mod torchscript {
    use tch::{CModule, Kind, Tensor};
    use tracing::debug;

    use super::{DetectorError, DetectorOptions, LandmarkModel};
    use crate::{HandDetection, Handedness, Landmark, LANDMARK_COUNT};

    /// Values per output row: 21 landmarks × (x, y, z), then the score.
    const ROW_WIDTH: usize = LANDMARK_COUNT * 3 + 1;

    /// TorchScript-backed hand landmarker.
    ///
    /// Expects a module mapping a `[1, 3, H, W]` float tensor in `[0, 1]` to
    /// a `[N, 64]` tensor of per-hand rows: 63 normalized landmark
    /// coordinates followed by the presence score, optionally a 65th column
    /// with the handedness sign (negative left, positive right).
    pub struct TorchLandmarker {
        module: CModule,
        options: DetectorOptions,
    }

    impl TorchLandmarker {
        pub fn new(options: DetectorOptions) -> Result<Self, DetectorError> {
            if !options.model_path.is_file() {
                return Err(DetectorError::ModelNotFound(options.model_path.clone()));
            }
            let module = CModule::load(&options.model_path)
                .map_err(|err| DetectorError::ModelLoad(err.to_string()))?;
            debug!("loaded landmark model from {}", options.model_path.display());
            Ok(Self { module, options })
        }

        fn rgb_to_tensor(rgb: &[u8], width: u32, height: u32) -> Result<Tensor, DetectorError> {
            let expected = width as usize * height as usize * 3;
            if rgb.len() != expected {
                return Err(DetectorError::Inference(format!(
                    "unexpected frame buffer size: got {} bytes, expected {expected}",
                    rgb.len()
                )));
            }
            let tensor = Tensor::from_slice(rgb)
                .to_kind(Kind::Float)
                .view([1, height as i64, width as i64, 3])
                .permute([0, 3, 1, 2])
                / 255.0;
            Ok(tensor)
        }
    }

    impl LandmarkModel for TorchLandmarker {
        fn detect(
            &mut self,
            rgb: &[u8],
            width: u32,
            height: u32,
        ) -> Result<Vec<HandDetection>, DetectorError> {
            let input = Self::rgb_to_tensor(rgb, width, height)?;
            let output = self
                .module
                .forward_ts(&[input])
                .map_err(|err| DetectorError::Inference(err.to_string()))?;

            let shape = output.size();
            if shape.len() != 2 || (shape[1] as usize) < ROW_WIDTH {
                return Err(DetectorError::Inference(format!(
                    "unexpected model output shape: {shape:?}"
                )));
            }

            let rows: Vec<Vec<f32>> = Vec::<Vec<f32>>::try_from(&output.contiguous())
                .map_err(|err| DetectorError::Inference(err.to_string()))?;

            let mut detections = Vec::new();
            for row in rows {
                let score = row[ROW_WIDTH - 1];
                if score < self.options.min_detection_confidence {
                    continue;
                }
                let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
                for (index, chunk) in row[..LANDMARK_COUNT * 3].chunks_exact(3).enumerate() {
                    landmarks[index] = Landmark {
                        x: chunk[0],
                        y: chunk[1],
                        z: chunk[2],
                    };
                }
                let handedness = match row.get(ROW_WIDTH) {
                    Some(sign) if *sign < 0.0 => Handedness::Left,
                    Some(_) => Handedness::Right,
                    None => Handedness::Unknown,
                };
                detections.push(HandDetection {
                    landmarks,
                    score,
                    handedness,
                });
                if detections.len() >= self.options.max_hands {
                    break;
                }
            }

            Ok(detections)
        }
    }
}

#[cfg(feature = "with-tch")]
pub use torchscript::TorchLandmarker;
