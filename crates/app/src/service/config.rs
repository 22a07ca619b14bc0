use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use hand_core::detector::{DetectorOptions, RunningMode};

/// Immutable service configuration, built once at startup and passed by
/// reference into the components that need it.
#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub listen: String,
    pub model_path: PathBuf,
    pub max_hands: usize,
    pub min_detection_confidence: f32,
    pub min_presence_confidence: f32,
    pub running_mode: RunningMode,
    pub workers: usize,
    pub jpeg_quality: u8,
    pub allowed_origin: String,
    pub verbose: bool,
}

pub const SERVE_USAGE: &str = "Usage: handframe serve [--listen <addr>] [--model <path>] \
[--max-hands <n>] [--min-detection-confidence <0-1>] [--min-presence-confidence <0-1>] \
[--running-mode image|video] [--workers <n>] [--jpeg-quality <1-100>] \
[--allowed-origin <origin>] [--verbose]";

impl ServeConfig {
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut listen: Option<String> = None;
        let mut model_path: Option<PathBuf> = None;
        let mut max_hands: Option<usize> = None;
        let mut min_detection_confidence: Option<f32> = None;
        let mut min_presence_confidence: Option<f32> = None;
        let mut running_mode: Option<RunningMode> = None;
        let mut workers: Option<usize> = None;
        let mut jpeg_quality: Option<u8> = None;
        let mut allowed_origin: Option<String> = None;
        let mut verbose = false;

        let mut idx = 2;
        while idx < args.len() {
            match args[idx].as_str() {
                "--listen" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--listen requires a value"))?
                        .clone();
                    listen = Some(value);
                    idx += 1;
                }
                "--model" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--model requires a value"))?
                        .clone();
                    model_path = Some(PathBuf::from(value));
                    idx += 1;
                }
                "--max-hands" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--max-hands requires a value"))?
                        .parse::<usize>()
                        .with_context(|| "--max-hands must be a positive integer".to_string())?;
                    if value == 0 {
                        bail!("--max-hands must be at least 1");
                    }
                    max_hands = Some(value);
                    idx += 1;
                }
                "--min-detection-confidence" => {
                    idx += 1;
                    let value = parse_confidence(args.get(idx), "--min-detection-confidence")?;
                    min_detection_confidence = Some(value);
                    idx += 1;
                }
                "--min-presence-confidence" => {
                    idx += 1;
                    let value = parse_confidence(args.get(idx), "--min-presence-confidence")?;
                    min_presence_confidence = Some(value);
                    idx += 1;
                }
                "--running-mode" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--running-mode requires a value"))?;
                    running_mode = Some(match value.as_str() {
                        "image" => RunningMode::Image,
                        "video" => RunningMode::Video,
                        other => bail!("--running-mode must be `image` or `video`, got `{other}`"),
                    });
                    idx += 1;
                }
                "--workers" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--workers requires a value"))?
                        .parse::<usize>()
                        .with_context(|| "--workers must be a positive integer".to_string())?;
                    if value == 0 {
                        bail!("--workers must be at least 1");
                    }
                    workers = Some(value);
                    idx += 1;
                }
                "--jpeg-quality" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--jpeg-quality requires a value"))?
                        .parse::<u8>()
                        .with_context(|| {
                            "--jpeg-quality must be an integer between 1 and 100".to_string()
                        })?;
                    if !(1..=100).contains(&value) {
                        bail!("--jpeg-quality must be an integer between 1 and 100");
                    }
                    jpeg_quality = Some(value);
                    idx += 1;
                }
                "--allowed-origin" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--allowed-origin requires a value"))?
                        .clone();
                    allowed_origin = Some(value);
                    idx += 1;
                }
                "--verbose" => {
                    verbose = true;
                    idx += 1;
                }
                arg if arg.starts_with('-') => {
                    bail!("Unrecognised flag: {arg}\n\n{SERVE_USAGE}");
                }
                other => {
                    bail!("Unexpected argument: {other}\n\n{SERVE_USAGE}");
                }
            }
        }

        Ok(Self {
            listen: listen.unwrap_or_else(|| "127.0.0.1:8000".to_string()),
            model_path: model_path.unwrap_or_else(|| PathBuf::from("./models/landmark.task")),
            max_hands: max_hands.unwrap_or(1),
            min_detection_confidence: min_detection_confidence.unwrap_or(0.5),
            min_presence_confidence: min_presence_confidence.unwrap_or(0.5),
            running_mode: running_mode.unwrap_or(RunningMode::Image),
            workers: workers.unwrap_or(1),
            jpeg_quality: jpeg_quality.unwrap_or(85),
            allowed_origin: allowed_origin.unwrap_or_else(|| "http://localhost:5173".to_string()),
            verbose,
        })
    }

    /// Detector configuration handed to each worker's model instance.
    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            model_path: self.model_path.clone(),
            max_hands: self.max_hands,
            min_detection_confidence: self.min_detection_confidence,
            min_presence_confidence: self.min_presence_confidence,
            running_mode: self.running_mode,
        }
    }
}

fn parse_confidence(value: Option<&String>, flag: &str) -> Result<f32> {
    let value = value
        .ok_or_else(|| anyhow!("{flag} requires a value"))?
        .parse::<f32>()
        .with_context(|| format!("{flag} must be a number between 0 and 1"))?;
    if !(0.0..=1.0).contains(&value) {
        bail!("{flag} must be between 0 and 1");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg_vec(tail: &[&str]) -> Vec<String> {
        let mut args = vec!["handframe".to_string(), "serve".to_string()];
        args.extend(tail.iter().map(|s| s.to_string()));
        args
    }

    #[test]
    fn defaults_match_the_documented_surface() {
        let config = ServeConfig::from_args(&arg_vec(&[])).unwrap();
        assert_eq!(config.listen, "127.0.0.1:8000");
        assert_eq!(config.model_path, PathBuf::from("./models/landmark.task"));
        assert_eq!(config.max_hands, 1);
        assert_eq!(config.min_detection_confidence, 0.5);
        assert_eq!(config.running_mode, RunningMode::Image);
        assert_eq!(config.workers, 1);
        assert_eq!(config.jpeg_quality, 85);
        assert_eq!(config.allowed_origin, "http://localhost:5173");
        assert!(!config.verbose);
    }

    #[test]
    fn flags_override_defaults() {
        let config = ServeConfig::from_args(&arg_vec(&[
            "--listen",
            "0.0.0.0:9100",
            "--model",
            "weights/hands.pt",
            "--max-hands",
            "2",
            "--min-detection-confidence",
            "0.7",
            "--running-mode",
            "video",
            "--workers",
            "4",
            "--jpeg-quality",
            "70",
            "--allowed-origin",
            "https://example.test",
            "--verbose",
        ]))
        .unwrap();
        assert_eq!(config.listen, "0.0.0.0:9100");
        assert_eq!(config.model_path, PathBuf::from("weights/hands.pt"));
        assert_eq!(config.max_hands, 2);
        assert_eq!(config.min_detection_confidence, 0.7);
        assert_eq!(config.running_mode, RunningMode::Video);
        assert_eq!(config.workers, 4);
        assert_eq!(config.jpeg_quality, 70);
        assert_eq!(config.allowed_origin, "https://example.test");
        assert!(config.verbose);
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(ServeConfig::from_args(&arg_vec(&["--workers", "0"])).is_err());
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        assert!(ServeConfig::from_args(&arg_vec(&["--jpeg-quality", "0"])).is_err());
        assert!(ServeConfig::from_args(&arg_vec(&["--jpeg-quality", "101"])).is_err());
    }

    #[test]
    fn confidence_outside_unit_interval_is_rejected() {
        assert!(
            ServeConfig::from_args(&arg_vec(&["--min-detection-confidence", "1.5"])).is_err()
        );
    }

    #[test]
    fn unknown_flags_and_positional_arguments_are_rejected() {
        assert!(ServeConfig::from_args(&arg_vec(&["--frobnicate"])).is_err());
        assert!(ServeConfig::from_args(&arg_vec(&["surprise"])).is_err());
    }

    #[test]
    fn detector_options_carry_the_configured_surface() {
        let config =
            ServeConfig::from_args(&arg_vec(&["--max-hands", "3", "--running-mode", "video"]))
                .unwrap();
        let options = config.detector_options();
        assert_eq!(options.max_hands, 3);
        assert_eq!(options.running_mode, RunningMode::Video);
        assert_eq!(options.model_path, config.model_path);
    }
}
