//! Engine configuration and validation.

use std::fmt;

/// Tuning knobs for playback sessions.
///
/// Constructed via [`Default`] and validated once when the controller
/// is built, so a running session never carries invalid settings.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Distance between state checkpoints, in ticks.
    ///
    /// Bounds the worst-case seek cost: any seek replays at most this
    /// many ticks after a checkpoint restore. Memory grows inversely,
    /// one retained snapshot per interval of session length.
    pub checkpoint_interval: u64,
    /// Playback cadence override, in ticks per wall-clock second.
    ///
    /// `None` plays at the rate recorded in the log header.
    pub playback_hz: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 1000,
            playback_hz: None,
        }
    }
}

impl EngineConfig {
    /// Check the configuration for nonsensical values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkpoint_interval == 0 {
            return Err(ConfigError::ZeroCheckpointInterval);
        }
        if let Some(rate) = self.playback_hz {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ConfigError::InvalidPlaybackRate { rate });
            }
        }
        Ok(())
    }
}

/// Rejected engine configuration.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// `checkpoint_interval` must be at least 1.
    ZeroCheckpointInterval,
    /// `playback_hz` must be a finite positive number when set.
    InvalidPlaybackRate {
        /// The rejected rate.
        rate: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCheckpointInterval => {
                write!(f, "checkpoint interval must be at least 1 tick")
            }
            Self::InvalidPlaybackRate { rate } => {
                write!(f, "playback rate {rate} is not a finite positive number")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_interval_rejected() {
        let config = EngineConfig {
            checkpoint_interval: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroCheckpointInterval)
        );
    }

    #[test]
    fn bad_playback_rate_rejected() {
        for rate in [0.0, -30.0, f64::NAN, f64::INFINITY] {
            let config = EngineConfig {
                playback_hz: Some(rate),
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidPlaybackRate { .. })
            ));
        }
    }
}
