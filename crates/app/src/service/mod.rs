//! Per-frame hand-landmark service: decode → color-convert → detect →
//! annotate → re-encode, exposed over one-shot HTTP and a streaming
//! WebSocket.
//!
//! The module is split into focused submodules:
//! - `config`: CLI configuration parsing.
//! - `frame`: Raw BGR frame buffer shared between stages.
//! - `codec`: base64 ⇄ JPEG frame conversion.
//! - `color`: BGR/RGB channel order adapter.
//! - `annotate`: Skeleton overlay drawing.
//! - `pipeline`: Detection worker pool and per-frame orchestration.
//! - `server`: Actix Web HTTP and WebSocket handlers.
//! - `telemetry`: Tracing subscriber and Prometheus metrics.
//! - `data`: Wire-facing request/response structs.

pub use config::{ServeConfig, SERVE_USAGE};
pub use server::run;

mod annotate;
mod codec;
mod color;
mod config;
mod data;
mod frame;
mod pipeline;
mod server;
mod telemetry;

#[cfg(test)]
pub(crate) mod testutil;
