//! Configuration management for the capture pipeline.
//!
//! Every gate threshold and session knob lives in one root structure so
//! nothing is scattered as a magic literal. Values load from TOML, save
//! back, and validate before use.

use crate::errors::PipelineError;
use crate::gates::document::DocumentGateConfig;
use crate::gates::face::FaceGateConfig;
use crate::types::{CaptureFormat, CaptureTarget};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoCaptureConfig {
    pub detector: DetectorConfig,
    pub document: DocumentGateConfig,
    pub face: FaceGateConfig,
    pub session: SessionConfig,
}

/// Document detector contract and decoding thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Model input edge length (square).
    pub model_size: u32,
    /// Number of detector classes (back, front, marker).
    pub num_classes: usize,
    /// Minimum post-sigmoid class score kept by the decoder.
    pub confidence_threshold: f32,
    /// NMS overlap threshold.
    pub iou_threshold: f32,
    /// Score bonus for front candidates containing a marker box.
    pub marker_bonus: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_size: 640,
            num_classes: 3,
            confidence_threshold: 0.50,
            iou_threshold: 0.45,
            marker_bonus: 0.15,
        }
    }
}

/// Session loop behavior: retry pacing, status throttling, and output
/// encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Initial inference retry backoff in milliseconds.
    pub backoff_min_ms: u64,
    /// Backoff ceiling in milliseconds.
    pub backoff_max_ms: u64,
    /// Delay before retrying after a shape error, in milliseconds.
    pub shape_retry_delay_ms: u64,
    /// Minimum interval between status emissions, in milliseconds.
    pub status_min_gap_ms: u64,
    /// Minimum interval before repeating an identical status.
    pub status_repeat_gap_ms: u64,
    /// Encoding for document captures ("png" or "jpeg").
    pub document_format: String,
    /// Encoding for face captures ("png" or "jpeg").
    pub face_format: String,
    /// JPEG quality (1-100) when a JPEG format is selected.
    pub jpeg_quality: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backoff_min_ms: 250,
            backoff_max_ms: 1500,
            shape_retry_delay_ms: 600,
            status_min_gap_ms: 400,
            status_repeat_gap_ms: 1200,
            document_format: "png".to_string(),
            face_format: "jpeg".to_string(),
            jpeg_quality: 92,
        }
    }
}

impl SessionConfig {
    /// Resolve the encoding for a capture target.
    pub fn capture_format(&self, target: CaptureTarget) -> CaptureFormat {
        let name = match target {
            CaptureTarget::Face => &self.face_format,
            _ => &self.document_format,
        };
        match name.as_str() {
            "jpeg" => CaptureFormat::Jpeg(self.jpeg_quality),
            _ => CaptureFormat::Png,
        }
    }
}

impl Default for AutoCaptureConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            document: DocumentGateConfig::default(),
            face: FaceGateConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl AutoCaptureConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Failed to read config file: {}", e)))?;

        let config: AutoCaptureConfig = toml::from_str(&contents)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PipelineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| PipelineError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        PathBuf::from("idcapture.toml")
    }

    /// Load from the default location or fall back to defaults.
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.detector.model_size == 0 {
            return Err("Model size must be non-zero".to_string());
        }
        if self.detector.num_classes < 3 {
            return Err("Detector needs back, front, and marker classes".to_string());
        }
        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err("Confidence threshold must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.detector.iou_threshold) {
            return Err("IoU threshold must be between 0.0 and 1.0".to_string());
        }

        if self.document.min_aspect >= self.document.max_aspect {
            return Err("Document aspect range is empty".to_string());
        }
        if self.document.min_area_ratio >= self.document.max_area_ratio {
            return Err("Document area range is empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.document.continuity_iou) {
            return Err("Continuity IoU must be between 0.0 and 1.0".to_string());
        }
        if self.document.required_stable_frames == 0 {
            return Err("Document stability requires at least one frame".to_string());
        }

        if !(0.0..=1.0).contains(&self.face.min_coverage) {
            return Err("Face coverage must be between 0.0 and 1.0".to_string());
        }
        if self.face.required_stable_frames == 0 {
            return Err("Face stability requires at least one frame".to_string());
        }

        if self.session.backoff_min_ms == 0 || self.session.backoff_min_ms > self.session.backoff_max_ms
        {
            return Err("Backoff range is invalid".to_string());
        }
        if self.session.jpeg_quality == 0 || self.session.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }
        for format in [&self.session.document_format, &self.session.face_format] {
            if format != "png" && format != "jpeg" {
                return Err(format!("Unknown capture format: {}", format));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AutoCaptureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detector.model_size, 640);
        assert_eq!(config.document.required_stable_frames, 4);
        assert_eq!(config.face.cooldown_ms, 2500);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AutoCaptureConfig::default();
        config.detector.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = AutoCaptureConfig::default();
        config.document.min_aspect = 0.9;
        assert!(config.validate().is_err());

        let mut config = AutoCaptureConfig::default();
        config.session.face_format = "webp".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capture_format_resolution() {
        let config = SessionConfig::default();
        assert_eq!(
            config.capture_format(CaptureTarget::DocumentFront),
            CaptureFormat::Png
        );
        assert_eq!(
            config.capture_format(CaptureTarget::Face),
            CaptureFormat::Jpeg(92)
        );
    }

    #[test]
    fn test_config_toml_format() {
        let config = AutoCaptureConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[detector]"));
        assert!(toml_string.contains("[document]"));
        assert!(toml_string.contains("[face]"));
        assert!(toml_string.contains("[session]"));
        assert!(toml_string.contains("required_stable_frames"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = AutoCaptureConfig::load_from_file("nonexistent_idcapture.toml");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), AutoCaptureConfig::default());
    }
}
