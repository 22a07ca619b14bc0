//! Detection worker pool and per-frame orchestration.
//!
//! Each worker thread owns a private model instance; a frame job travels
//! over a channel and the submitting handler awaits the reply on a oneshot.
//! A model that fails to load surfaces as a startup error, not a
//! per-request one. Errors inside a frame are values in the reply, never
//! panics.

use std::{thread, time::Instant};

use crossbeam_channel::{Receiver, Sender};
use hand_core::detector::{DetectorError, LandmarkModel, ModelFactory};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::service::{
    annotate,
    codec::{self, CodecError},
    color,
};

#[derive(Debug, Error)]
pub(crate) enum PipelineError {
    #[error("frame decode failed: {0}")]
    Decode(CodecError),
    #[error("hand detection failed: {0}")]
    Detection(#[from] DetectorError),
    #[error("frame encode failed: {0}")]
    Encode(CodecError),
    #[error("detection workers are unavailable")]
    WorkersUnavailable,
}

/// Outcome of one successful pipeline pass.
#[derive(Clone, Debug)]
pub(crate) struct FrameReport {
    pub(crate) hand_detected: bool,
    pub(crate) num_hands: usize,
    pub(crate) processed_frame: String,
}

struct FrameJob {
    payload: String,
    reply: oneshot::Sender<Result<FrameReport, PipelineError>>,
}

/// Handle to the detection worker pool.
#[derive(Debug)]
pub(crate) struct FramePipeline {
    jobs: Sender<FrameJob>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl FramePipeline {
    /// Spawn `workers` detection workers, each building its own model via
    /// the factory. Fails if any worker cannot construct its model, so a
    /// missing weights file stops the service before it binds.
    pub(crate) fn spawn(
        workers: usize,
        jpeg_quality: u8,
        factory: ModelFactory,
    ) -> anyhow::Result<Self> {
        let worker_count = workers.max(1);
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<FrameJob>();
        let (init_tx, init_rx) =
            crossbeam_channel::bounded::<Result<String, DetectorError>>(worker_count);

        let mut handles = Vec::with_capacity(worker_count);
        for worker_index in 0..worker_count {
            let worker_rx = job_rx.clone();
            let worker_init_tx = init_tx.clone();
            let worker_factory = factory.clone();
            let handle = thread::Builder::new()
                .name(format!("hand-detect-{worker_index}"))
                .spawn(move || {
                    worker_loop(
                        worker_index,
                        worker_factory,
                        worker_init_tx,
                        worker_rx,
                        jpeg_quality,
                    )
                })?;
            handles.push(handle);
        }
        drop(init_tx);
        drop(job_rx);

        for _ in 0..worker_count {
            match init_rx.recv() {
                Ok(Ok(message)) => debug!("{message}"),
                Ok(Err(err)) => {
                    drop(job_tx);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    anyhow::bail!("failed to initialise landmark detector: {err}");
                }
                Err(err) => {
                    drop(job_tx);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    anyhow::bail!("detection worker exited before reporting readiness: {err}");
                }
            }
        }

        Ok(Self {
            jobs: job_tx,
            workers: handles,
        })
    }

    /// Run one payload through decode → detect → annotate → encode on the
    /// worker pool. Replies arrive one-for-one and in submission order for
    /// a sequential caller.
    pub(crate) async fn process(&self, payload: String) -> Result<FrameReport, PipelineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = FrameJob {
            payload,
            reply: reply_tx,
        };
        if self.jobs.send(job).is_err() {
            return Err(PipelineError::WorkersUnavailable);
        }
        metrics::gauge!("hand_queue_depth").set(self.jobs.len() as f64);
        reply_rx.await.map_err(|_| PipelineError::WorkersUnavailable)?
    }

    /// Stop accepting jobs and join the worker threads.
    pub(crate) fn shutdown(self) {
        drop(self.jobs);
        for handle in self.workers {
            let _ = handle.join();
        }
    }
}

fn worker_loop(
    worker_index: usize,
    factory: ModelFactory,
    init_tx: Sender<Result<String, DetectorError>>,
    jobs: Receiver<FrameJob>,
    jpeg_quality: u8,
) {
    let mut model = match factory() {
        Ok(model) => {
            let ready = format!("worker #{worker_index}: landmark model ready");
            if init_tx.send(Ok(ready)).is_err() {
                return;
            }
            model
        }
        Err(err) => {
            let _ = init_tx.send(Err(err));
            return;
        }
    };
    drop(init_tx);

    for job in jobs {
        let started = Instant::now();
        let result = run_frame(model.as_mut(), &job.payload, jpeg_quality);
        if let Err(ref err) = result {
            warn!("frame processing failed: {err}");
            metrics::counter!("hand_frame_errors_total").increment(1);
        }
        metrics::histogram!("hand_frame_seconds").record(started.elapsed().as_secs_f64());
        if job.reply.send(result).is_err() {
            debug!("caller went away before its frame finished");
        }
    }
}

/// One pipeline pass over a single payload.
fn run_frame(
    model: &mut dyn LandmarkModel,
    payload: &str,
    jpeg_quality: u8,
) -> Result<FrameReport, PipelineError> {
    let decode_start = Instant::now();
    let frame = codec::decode_payload(payload).map_err(PipelineError::Decode)?;
    metrics::histogram!("hand_stage_seconds", "stage" => "decode")
        .record(decode_start.elapsed().as_secs_f64());

    let detect_start = Instant::now();
    let rgb = color::bgr_to_rgb(&frame);
    let detections = model.detect(&rgb, frame.width, frame.height)?;
    metrics::histogram!("hand_stage_seconds", "stage" => "detect")
        .record(detect_start.elapsed().as_secs_f64());

    let num_hands = detections.len();
    // without detections the original frame passes through unannotated
    let annotated = if detections.is_empty() {
        frame
    } else {
        annotate::draw_detections(&frame, &detections)
    };

    let encode_start = Instant::now();
    let processed_frame =
        codec::encode_frame(&annotated, jpeg_quality).map_err(PipelineError::Encode)?;
    metrics::histogram!("hand_stage_seconds", "stage" => "encode")
        .record(encode_start.elapsed().as_secs_f64());

    Ok(FrameReport {
        hand_detected: num_hands > 0,
        num_hands,
        processed_frame,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{
        codec::JPEG_PREFIX,
        testutil::{failing_detect_factory, hand_at, missing_model_factory, scripted_factory, solid_payload},
    };

    #[actix_web::test]
    async fn zero_hands_pass_the_frame_through() {
        let pipeline = FramePipeline::spawn(1, 85, scripted_factory(Vec::new())).unwrap();
        let report = pipeline.process(solid_payload(100, 100)).await.unwrap();
        assert!(!report.hand_detected);
        assert_eq!(report.num_hands, 0);
        assert!(report.processed_frame.starts_with(JPEG_PREFIX));
        let frame = codec::decode_payload(&report.processed_frame).unwrap();
        assert_eq!((frame.width, frame.height), (100, 100));
        pipeline.shutdown();
    }

    #[actix_web::test]
    async fn hand_counts_track_the_detections() {
        let hands = vec![hand_at(0.3, 0.3), hand_at(0.7, 0.7)];
        let pipeline = FramePipeline::spawn(1, 85, scripted_factory(hands)).unwrap();
        let report = pipeline.process(solid_payload(64, 64)).await.unwrap();
        assert!(report.hand_detected);
        assert_eq!(report.num_hands, 2);
        pipeline.shutdown();
    }

    #[actix_web::test]
    async fn malformed_payload_is_a_decode_error() {
        let pipeline = FramePipeline::spawn(1, 85, scripted_factory(Vec::new())).unwrap();
        let err = pipeline.process("not-base64!!".to_string()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)), "got {err:?}");
        pipeline.shutdown();
    }

    #[actix_web::test]
    async fn detector_failures_surface_as_detection_errors() {
        let pipeline =
            FramePipeline::spawn(1, 85, failing_detect_factory("backend exploded")).unwrap();
        let err = pipeline.process(solid_payload(32, 32)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Detection(_)), "got {err:?}");
        pipeline.shutdown();
    }

    #[actix_web::test]
    async fn sequential_frames_reply_one_for_one_in_order() {
        let pipeline = FramePipeline::spawn(2, 85, scripted_factory(Vec::new())).unwrap();
        let sizes = [(50u32, 40u32), (60, 50), (70, 60)];
        for (width, height) in sizes {
            let report = pipeline.process(solid_payload(width, height)).await.unwrap();
            let frame = codec::decode_payload(&report.processed_frame).unwrap();
            assert_eq!((frame.width, frame.height), (width, height));
        }
        pipeline.shutdown();
    }

    #[test]
    fn missing_model_fails_startup() {
        let err = FramePipeline::spawn(1, 85, missing_model_factory()).unwrap_err();
        assert!(err.to_string().contains("landmark detector"), "got {err}");
    }
}
