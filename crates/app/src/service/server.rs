//! Actix Web surface: one-shot HTTP endpoints and the streaming WebSocket.
//!
//! Both surfaces map pipeline results onto the same structured
//! success/error object; a failed frame is reported in the body, never as
//! a transport error and never as a silent echo of the input.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use actix_ws::{Message, MessageStream, Session};
use anyhow::Context as _;
use hand_core::detector::ModelFactory;
use rand::Rng as _;
use tracing::{debug, error, info};

use crate::service::{
    config::ServeConfig,
    data::{BannerResponse, ImagePayload, PredictResponse, ProcessResponse},
    pipeline::FramePipeline,
    telemetry,
};

pub(crate) struct ServerState {
    pub(crate) pipeline: Arc<FramePipeline>,
}

/// Build the worker pool and serve until the process is stopped. Fails
/// before binding if any worker cannot load its model.
pub fn run(config: ServeConfig, factory: ModelFactory) -> anyhow::Result<()> {
    telemetry::init(config.verbose);
    let _ = telemetry::init_metrics_recorder();

    let pipeline = Arc::new(FramePipeline::spawn(
        config.workers,
        config.jpeg_quality,
        factory,
    )?);

    let listen = config.listen.clone();
    let allowed_origin = config.allowed_origin.clone();
    let state = web::Data::new(ServerState {
        pipeline: pipeline.clone(),
    });
    info!("hand landmark service listening on {listen}");

    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allowed_origin(&allowed_origin)
                .allowed_methods(vec!["GET", "POST"])
                .allow_any_header();
            App::new()
                .wrap(cors)
                .app_data(state.clone())
                .route("/", web::get().to(index))
                .route("/predict", web::post().to(predict))
                .route("/process_frame", web::post().to(process_frame))
                .route("/ws", web::get().to(stream_frames))
                .route("/metrics", web::get().to(render_metrics))
        })
        .bind(&listen)
        .with_context(|| format!("failed to bind {listen}"))?
        .run()
        .await
        .context("server terminated abnormally")
    })?;

    if let Ok(pipeline) = Arc::try_unwrap(pipeline) {
        pipeline.shutdown();
    }
    Ok(())
}

/// Liveness banner.
async fn index() -> HttpResponse {
    HttpResponse::Ok().json(BannerResponse {
        message: "hand landmark service running",
    })
}

/// Documented stub: ignores the image content and invents a detection
/// count, for wiring up clients before a model is available.
async fn predict(payload: web::Json<ImagePayload>) -> HttpResponse {
    debug!("predict stub received {} payload chars", payload.image.len());
    metrics::counter!("hand_requests_total", "endpoint" => "predict").increment(1);
    let mut rng = rand::rng();
    let count: u32 = rng.random_range(1..=5);
    let confidence = (rng.random_range(0.80_f64..0.99) * 100.0).round() / 100.0;
    HttpResponse::Ok().json(PredictResponse {
        label: "fingers detected",
        count,
        confidence,
    })
}

/// One payload in, one structured result out.
async fn process_frame(
    state: web::Data<ServerState>,
    payload: web::Json<ImagePayload>,
) -> HttpResponse {
    metrics::counter!("hand_requests_total", "endpoint" => "process_frame").increment(1);
    let result = state.pipeline.process(payload.into_inner().image).await;
    HttpResponse::Ok().json(ProcessResponse::from_result(result))
}

/// Prometheus exposition.
async fn render_metrics() -> HttpResponse {
    match telemetry::prometheus_handle() {
        Some(handle) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(handle.render()),
        None => HttpResponse::ServiceUnavailable().finish(),
    }
}

/// Upgrade to a WebSocket and process frames one message at a time.
async fn stream_frames(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<ServerState>,
) -> actix_web::Result<HttpResponse> {
    let (response, session, stream) = actix_ws::handle(&req, body)?;
    let pipeline = state.pipeline.clone();
    actix_web::rt::spawn(frame_loop(session, stream, pipeline));
    Ok(response)
}

/// Sequential per-connection loop: each text message carries one payload
/// and is answered with exactly one structured reply before the next
/// message is read. The loop ends on close or connection error.
async fn frame_loop(mut session: Session, mut stream: MessageStream, pipeline: Arc<FramePipeline>) {
    debug!("websocket client connected");
    while let Some(Ok(message)) = stream.recv().await {
        match message {
            Message::Text(payload) => {
                metrics::counter!("hand_requests_total", "endpoint" => "ws").increment(1);
                let result = pipeline.process(payload.to_string()).await;
                let reply = ProcessResponse::from_result(result);
                match serde_json::to_string(&reply) {
                    Ok(json) => {
                        if session.text(json).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        error!("failed to serialise frame reply: {err}");
                        break;
                    }
                }
            }
            Message::Ping(bytes) => {
                if session.pong(&bytes).await.is_err() {
                    break;
                }
            }
            Message::Close(reason) => {
                debug!("websocket client closed: {reason:?}");
                return;
            }
            _ => {}
        }
    }
    let _ = session.close(None).await;
}
