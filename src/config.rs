//! Operator-supplied decoder configuration, loaded from JSON.
//!
//! The core itself persists nothing; this is purely a convenience for the
//! CLI driver so SCR and tolerance settings can be scripted instead of
//! passed as repeated flags.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TetrapolError};
use crate::tables::DEFAULT_SCR_CONFIDENCE;

/// Settings applied to a [`crate::phys_ch::PhysCh`] before it starts receiving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Fixed scrambling constant, or `None` to blind-detect.
    #[serde(default)]
    pub scr: Option<u8>,
    /// Confidence threshold (matching frames) before a blind SCR lock is accepted.
    #[serde(default = "default_scr_confidence")]
    pub scr_confidence: u32,
    /// Tolerated channel-decode disagreements per frame.
    #[serde(default)]
    pub max_channel_errors: u32,
}

fn default_scr_confidence() -> u32 {
    DEFAULT_SCR_CONFIDENCE
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            scr: None,
            scr_confidence: DEFAULT_SCR_CONFIDENCE,
            max_channel_errors: 0,
        }
    }
}

impl DecoderConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Reject settings outside what the decoder can act on.
    pub fn validate(&self) -> Result<()> {
        if let Some(scr) = self.scr {
            if scr > 127 {
                return Err(TetrapolError::InvalidConfig(format!(
                    "scr {scr} out of range 0..=127"
                )));
            }
        }
        if self.scr_confidence == 0 {
            return Err(TetrapolError::InvalidConfig(
                "scr_confidence must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_reference_tolerance() {
        let config = DecoderConfig::default();
        assert_eq!(config.scr, None);
        assert_eq!(config.scr_confidence, DEFAULT_SCR_CONFIDENCE);
        assert_eq!(config.max_channel_errors, 0);
    }

    #[test]
    fn parses_partial_json_with_defaults() {
        let config = DecoderConfig::from_json(r#"{"scr": 42}"#).unwrap();
        assert_eq!(config.scr, Some(42));
        assert_eq!(config.scr_confidence, DEFAULT_SCR_CONFIDENCE);
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(DecoderConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_scr_above_127() {
        let config = DecoderConfig {
            scr: Some(200),
            ..DecoderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TetrapolError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_confidence() {
        let config = DecoderConfig {
            scr_confidence: 0,
            ..DecoderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TetrapolError::InvalidConfig(_))
        ));
    }
}
