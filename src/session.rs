//! Capture orchestrator: sequences targets, owns session capture state,
//! and drives the per-tick decision pipeline.
//!
//! The session is single-threaded and cooperative. One `tick` runs per
//! available frame; because `tick` borrows the session mutably, no two
//! evaluations for the same target can ever run concurrently and a new
//! tick cannot start while an inference is still in flight. Cancellation
//! is a liveness token checked at the top of the tick and after every
//! suspension point, so a resolved inference belonging to a stale target
//! is discarded rather than acted upon.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use crate::config::AutoCaptureConfig;
use crate::decode::decode;
use crate::encode::encode_frame;
use crate::errors::PipelineError;
use crate::feedback::StatusThrottle;
use crate::gates::document;
use crate::gates::face::{self, expand_face_box, select_face};
use crate::gates::{GateVerdict, RejectReason};
use crate::letterbox::{letterbox, to_model_input, unletterbox};
use crate::model::{DocumentDetector, FaceModel, FrameSource, LandmarkModel, ModelInput};
use crate::nms::non_max_suppression;
use crate::select::{select_candidate, DocumentSide};
use crate::stability::StabilityState;
use crate::types::{
    CaptureResult, CaptureTarget, DetectionCandidate, Frame, QualityMetrics, SessionCaptureSet,
};

/// Where the session currently is in the capture sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    ScanningFace,
    ScanningFront,
    ScanningBack,
    Complete,
}

impl ScanPhase {
    /// The target being scanned in this phase, if any.
    pub fn target(&self) -> Option<CaptureTarget> {
        match self {
            ScanPhase::ScanningFace => Some(CaptureTarget::Face),
            ScanPhase::ScanningFront => Some(CaptureTarget::DocumentFront),
            ScanPhase::ScanningBack => Some(CaptureTarget::DocumentBack),
            ScanPhase::Idle | ScanPhase::Complete => None,
        }
    }

    fn for_target(target: CaptureTarget) -> ScanPhase {
        match target {
            CaptureTarget::Face => ScanPhase::ScanningFace,
            CaptureTarget::DocumentFront => ScanPhase::ScanningFront,
            CaptureTarget::DocumentBack => ScanPhase::ScanningBack,
        }
    }
}

/// Result of one decision tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No capture this tick; keep feeding frames. `status` carries the
    /// throttled guidance string when one should reach the operator.
    Continue {
        reason: RejectReason,
        status: Option<String>,
    },
    /// A capture was emitted and stored for `target`.
    Captured { id: Uuid, target: CaptureTarget },
    /// A collaborator misbehaved; the tick was delayed and should simply
    /// be retried.
    Error {
        error: PipelineError,
        status: Option<String>,
    },
}

/// Cooperative cancellation flag shared with the caller.
///
/// Revoking the token makes in-flight work inert: continuations observe
/// the flag before acting on any resolved inference.
#[derive(Debug, Clone, Default)]
pub struct LivenessToken(Arc<AtomicBool>);

impl LivenessToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Capture cadence state: cooldown since the last capture plus the
/// capture-in-progress lock. Owned by the session, never by gates.
#[derive(Debug, Clone, Copy, Default)]
struct CooldownState {
    last_capture_at: Option<Instant>,
    locked_until: Option<Instant>,
}

impl CooldownState {
    fn cooled_down(&self, now: Instant, cooldown: Duration) -> bool {
        self.last_capture_at
            .map_or(true, |at| now.duration_since(at) >= cooldown)
    }

    fn locked(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    fn record_capture(&mut self, now: Instant, lock: Duration) {
        self.last_capture_at = Some(now);
        self.locked_until = Some(now + lock);
    }
}

/// Per-target capture cadence. The debounce guards repeat emission for
/// the *same* target; capturing one target never delays the next.
#[derive(Debug, Clone, Copy, Default)]
struct DebounceState {
    face: CooldownState,
    document_front: CooldownState,
    document_back: CooldownState,
}

impl DebounceState {
    fn slot(&self, target: CaptureTarget) -> &CooldownState {
        match target {
            CaptureTarget::Face => &self.face,
            CaptureTarget::DocumentFront => &self.document_front,
            CaptureTarget::DocumentBack => &self.document_back,
        }
    }

    fn slot_mut(&mut self, target: CaptureTarget) -> &mut CooldownState {
        match target {
            CaptureTarget::Face => &mut self.face,
            CaptureTarget::DocumentFront => &mut self.document_front,
            CaptureTarget::DocumentBack => &mut self.document_back,
        }
    }
}

/// The capture session. Generic over the model and frame collaborators
/// so tests can script them.
pub struct CaptureSession<D, F, L, S> {
    config: AutoCaptureConfig,
    detector: D,
    face_model: F,
    landmark_model: L,
    frames: S,
    phase: ScanPhase,
    captures: SessionCaptureSet,
    stability: StabilityState,
    debounce: DebounceState,
    throttle: StatusThrottle,
    liveness: LivenessToken,
    backoff: Duration,
}

impl<D, F, L, S> CaptureSession<D, F, L, S>
where
    D: DocumentDetector,
    F: FaceModel,
    L: LandmarkModel,
    S: FrameSource,
{
    pub fn new(
        config: AutoCaptureConfig,
        detector: D,
        face_model: F,
        landmark_model: L,
        frames: S,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        let backoff = Duration::from_millis(config.session.backoff_min_ms);
        let throttle = StatusThrottle::new(
            Duration::from_millis(config.session.status_min_gap_ms),
            Duration::from_millis(config.session.status_repeat_gap_ms),
        );
        Ok(Self {
            config,
            detector,
            face_model,
            landmark_model,
            frames,
            phase: ScanPhase::Idle,
            captures: SessionCaptureSet::default(),
            stability: StabilityState::default(),
            debounce: DebounceState::default(),
            throttle,
            liveness: LivenessToken::new(),
            backoff,
        })
    }

    /// Begin scanning, starting with the face target.
    pub fn start(&mut self) {
        log::info!("Capture session started");
        self.phase = ScanPhase::ScanningFace;
        self.stability = StabilityState::default();
    }

    /// Revoke the liveness token; subsequent ticks become no-ops and any
    /// in-flight inference result is discarded.
    pub fn cancel(&mut self) {
        log::info!("Capture session cancelled");
        self.liveness.revoke();
    }

    /// Clone of the liveness token for external cancellation.
    pub fn liveness_token(&self) -> LivenessToken {
        self.liveness.clone()
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn captures(&self) -> &SessionCaptureSet {
        &self.captures
    }

    /// Capture ids when all three slots are filled.
    ///
    /// Downstream verification must be keyed on these ids: a later
    /// recapture empties a slot first, so an earlier snapshot no longer
    /// matches and the completeness signal is invalidated.
    pub fn verification_ready(&self) -> Option<[Uuid; 3]> {
        if self.phase == ScanPhase::Complete {
            self.captures.capture_ids()
        } else {
            None
        }
    }

    /// Clear a slot and re-enter its scanning phase.
    ///
    /// The slot is emptied before scanning restarts; other filled slots
    /// are left untouched.
    pub fn recapture(&mut self, target: CaptureTarget) {
        log::info!("Recapture requested for {}", target.as_str());
        self.captures.clear(target);
        self.phase = ScanPhase::for_target(target);
        self.stability = StabilityState::default();
    }

    /// Run one decision tick against the current frame.
    pub async fn tick(&mut self) -> TickOutcome {
        if !self.liveness.is_live() {
            return TickOutcome::Continue {
                reason: RejectReason::Inactive,
                status: None,
            };
        }
        let Some(target) = self.phase.target() else {
            return TickOutcome::Continue {
                reason: RejectReason::Inactive,
                status: None,
            };
        };
        let Some(frame) = self.frames.current_frame() else {
            return self.keep_trying(RejectReason::FrameUnavailable);
        };

        match target {
            CaptureTarget::Face => self.tick_face(frame).await,
            CaptureTarget::DocumentFront => {
                self.tick_document(frame, DocumentSide::Front, target).await
            }
            CaptureTarget::DocumentBack => {
                self.tick_document(frame, DocumentSide::Back, target).await
            }
        }
    }

    async fn tick_document(
        &mut self,
        frame: Frame,
        side: DocumentSide,
        target: CaptureTarget,
    ) -> TickOutcome {
        let size = self.config.detector.model_size;
        let (canvas, meta) = letterbox(&frame, size);
        let input = ModelInput {
            data: to_model_input(&canvas, size),
            size,
        };

        let output = match self.detector.infer(&input).await {
            Ok(output) => output,
            Err(error) => return self.inference_failed(error).await,
        };
        if !self.liveness.is_live() {
            return TickOutcome::Continue {
                reason: RejectReason::Inactive,
                status: None,
            };
        }

        let candidates = match decode(
            &output,
            self.config.detector.num_classes,
            self.config.detector.confidence_threshold,
            size,
        ) {
            Ok(candidates) => candidates,
            Err(error) => return self.shape_failed(error).await,
        };
        self.backoff = Duration::from_millis(self.config.session.backoff_min_ms);

        // A tick without a usable candidate breaks the consecutive
        // observation requirement, so the count starts over.
        if candidates.is_empty() {
            self.stability = StabilityState::default();
            return self.keep_trying(RejectReason::NoCandidate { side });
        }

        let keep = non_max_suppression(&candidates, self.config.detector.iou_threshold);
        let survivors: Vec<&DetectionCandidate> = keep.iter().map(|&i| &candidates[i]).collect();
        let Some(selected) =
            select_candidate(&survivors, side, self.config.detector.marker_bonus)
        else {
            self.stability = StabilityState::default();
            return self.keep_trying(RejectReason::NoCandidate { side });
        };

        let mapped = unletterbox(&selected.bbox, &meta, true);
        let (x, y, w, h) = mapped.to_pixel_rect();
        if w == 0 || h == 0 {
            return self.keep_trying(RejectReason::Reposition { side });
        }

        let crop = frame.crop(x, y, w, h);
        let decision = document::evaluate(
            &crop,
            &mapped,
            frame.area() as f32,
            selected.score,
            selected.class_id,
            target,
            self.stability,
            &self.config.document,
        );
        self.stability = decision.stability;

        match decision.verdict {
            GateVerdict::Reject(reason) => self.keep_trying(reason),
            GateVerdict::Accept(metrics) => self.emit_capture(crop, target, metrics),
        }
    }

    async fn tick_face(&mut self, frame: Frame) -> TickOutcome {
        let detections = match self.face_model.detect(&frame).await {
            Ok(detections) => detections,
            Err(error) => return self.inference_failed(error).await,
        };
        if !self.liveness.is_live() {
            return TickOutcome::Continue {
                reason: RejectReason::Inactive,
                status: None,
            };
        }

        let detection = match select_face(&detections, &self.config.face) {
            Ok(detection) => detection,
            Err(reason) => {
                self.stability = StabilityState::default();
                return self.keep_trying(reason);
            }
        };
        let bbox = expand_face_box(&detection, frame.width, frame.height, self.config.face.pad);

        let mesh = match self.landmark_model.landmarks(&frame).await {
            Ok(Some(mesh)) => mesh,
            Ok(None) => {
                self.stability = StabilityState::default();
                return self.keep_trying(RejectReason::NoLandmarks);
            }
            Err(error) => return self.inference_failed(error).await,
        };
        if !self.liveness.is_live() {
            return TickOutcome::Continue {
                reason: RejectReason::Inactive,
                status: None,
            };
        }
        self.backoff = Duration::from_millis(self.config.session.backoff_min_ms);

        let decision = face::evaluate(&frame, &bbox, &mesh, self.stability, &self.config.face);
        self.stability = decision.stability;

        match decision.verdict {
            GateVerdict::Reject(reason) => self.keep_trying(reason),
            GateVerdict::Accept(metrics) => {
                let now = Instant::now();
                let cooldown = Duration::from_millis(self.config.face.cooldown_ms);
                if !self
                    .debounce
                    .slot(CaptureTarget::Face)
                    .cooled_down(now, cooldown)
                {
                    return self.keep_trying(RejectReason::CoolingDown);
                }
                let (x, y, w, h) = bbox.to_pixel_rect();
                self.emit_capture(frame.crop(x, y, w, h), CaptureTarget::Face, metrics)
            }
        }
    }

    /// Encode, store, and report an accepted crop. Guarded by the
    /// capture lock so one debounce window emits at most one result.
    fn emit_capture(
        &mut self,
        crop: Frame,
        target: CaptureTarget,
        metrics: QualityMetrics,
    ) -> TickOutcome {
        let now = Instant::now();
        if self.debounce.slot(target).locked(now) {
            return self.keep_trying(RejectReason::CoolingDown);
        }

        let format = self.config.session.capture_format(target);
        let encoded = match encode_frame(&crop, format) {
            Ok(encoded) => encoded,
            Err(error) => {
                log::warn!("Failed to encode {} capture: {}", target.as_str(), error);
                return TickOutcome::Error {
                    error,
                    status: None,
                };
            }
        };

        let result = CaptureResult {
            id: Uuid::new_v4(),
            target,
            encoded_image: encoded,
            format,
            timestamp: Utc::now(),
            metrics,
        };
        let id = result.id;
        log::info!(
            "Captured {} ({} bytes, blur {:.0}, brightness {:.0})",
            target.as_str(),
            result.encoded_image.len(),
            metrics.blur_variance,
            metrics.brightness_mean
        );

        self.captures.store(result);
        self.stability = StabilityState::default();
        self.debounce
            .slot_mut(target)
            .record_capture(now, Duration::from_millis(self.config.face.capture_lock_ms));
        self.advance_phase();

        TickOutcome::Captured { id, target }
    }

    /// Move to the first target still missing a capture, in the fixed
    /// face, front, back order; Complete when every slot is filled.
    fn advance_phase(&mut self) {
        let next = [
            CaptureTarget::Face,
            CaptureTarget::DocumentFront,
            CaptureTarget::DocumentBack,
        ]
        .into_iter()
        .find(|&t| self.captures.slot(t).is_none());
        self.phase = match next {
            Some(target) => ScanPhase::for_target(target),
            None => ScanPhase::Complete,
        };
        log::debug!("Phase advanced to {:?}", self.phase);
    }

    fn keep_trying(&mut self, reason: RejectReason) -> TickOutcome {
        let status = self.throttle.offer(&reason.to_string());
        TickOutcome::Continue { reason, status }
    }

    async fn inference_failed(&mut self, error: PipelineError) -> TickOutcome {
        log::warn!("Inference failed, retrying in {:?}: {}", self.backoff, error);
        let status = self.throttle.offer("Detector error, retrying");
        tokio::time::sleep(self.backoff).await;
        self.backoff = (self.backoff * 2)
            .min(Duration::from_millis(self.config.session.backoff_max_ms));
        TickOutcome::Error { error, status }
    }

    async fn shape_failed(&mut self, error: PipelineError) -> TickOutcome {
        log::warn!("Detector contract violation: {}", error);
        let status = self.throttle.offer("Unexpected detector output, retrying");
        tokio::time::sleep(Duration::from_millis(self.config.session.shape_retry_delay_ms)).await;
        TickOutcome::Error { error, status }
    }
}
