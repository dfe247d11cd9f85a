//! idcapture: autonomous capture-quality decisions for remote identity
//! verification.
//!
//! The crate watches a video stream and decides, frame by frame, when an
//! ID document or a face is good enough to photograph: correctly framed,
//! sharp, well lit, and held steady. Model inference and video decoding
//! stay outside the crate behind traits; everything downstream of a raw
//! detector tensor, from decoding through the quality gates to the
//! encoded capture artifact, lives here.
//!
//! # Usage
//! ```rust,ignore
//! use idcapture::config::AutoCaptureConfig;
//! use idcapture::session::{CaptureSession, TickOutcome};
//!
//! let config = AutoCaptureConfig::load_or_default();
//! let mut session = CaptureSession::new(config, detector, face, landmarks, frames)?;
//! session.start();
//! loop {
//!     match session.tick().await {
//!         TickOutcome::Captured { target, .. } => log::info!("captured {target:?}"),
//!         TickOutcome::Continue { status: Some(msg), .. } => show_guidance(&msg),
//!         _ => {}
//!     }
//!     if session.verification_ready().is_some() {
//!         break;
//!     }
//! }
//! ```

pub mod config;
pub mod decode;
pub mod encode;
pub mod errors;
pub mod feedback;
pub mod gates;
pub mod letterbox;
pub mod metrics;
pub mod model;
pub mod nms;
pub mod pose;
pub mod select;
pub mod session;
pub mod stability;
pub mod types;

// Testing utilities - synthetic data and scripted collaborators for
// offline testing
pub mod testing;

// Re-exports for convenience
pub use errors::PipelineError;
pub use gates::{GateVerdict, RejectReason};
pub use session::{CaptureSession, LivenessToken, ScanPhase, TickOutcome};
pub use types::{
    BoundingBox, CaptureFormat, CaptureResult, CaptureTarget, ClassId, Frame, QualityMetrics,
};

/// Initialize logging for the capture pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "idcapture=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
