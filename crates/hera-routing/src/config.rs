//! HERA configuration
//!
//! Two layers:
//!
//! - [`HeraSettings`]: the raw key/value record found under the
//!   `[HeraRouter]` namespace of a settings file. Every key is optional
//!   except `secondsInTimeUnit`.
//! - [`HeraConfig`]: the resolved, validated, immutable parameters a
//!   router runs with. Replicas of a prototype router share one
//!   `Arc<HeraConfig>`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::hop_vector::HopVector;

/// Settings namespace for the router's keys
pub const SETTINGS_NAMESPACE: &str = "HeraRouter";

/// Default number of hop levels (H)
pub const DEFAULT_HOP_COUNT: usize = 5;

/// Default transitivity/accrual weights (lambda)
pub const DEFAULT_LAMBDA: [f64; DEFAULT_HOP_COUNT] = [1.0, 0.5, 0.05, 0.005, 0.0005];

/// Default decision weights (gamma)
pub const DEFAULT_GAMMA: [f64; DEFAULT_HOP_COUNT] = [1.0, 0.5, 0.05, 0.005, 0.0005];

/// Default aging base (alpha)
pub const DEFAULT_ALPHA: f64 = 0.98;

/// Raw router settings as read from a settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeraSettings {
    /// Duration of one aging time unit, in seconds (required)
    pub seconds_in_time_unit: Option<f64>,
    /// Number of hop levels
    pub hop_count: Option<usize>,
    /// Transitivity/accrual weights, one per hop level
    pub lambda: Option<Vec<f64>>,
    /// Decision weights, one per hop level
    pub gamma: Option<Vec<f64>>,
    /// Aging base
    pub alpha: Option<f64>,
}

impl HeraSettings {
    /// Settings with only the required time unit set
    pub fn with_time_unit(seconds: f64) -> Self {
        Self {
            seconds_in_time_unit: Some(seconds),
            ..Default::default()
        }
    }

    /// Resolve defaults and validate
    ///
    /// A weight array is used only when `hopCount` is supplied alongside
    /// it; otherwise the default size and default array are used as a
    /// pair. After defaulting, any disagreement between the arrays and
    /// the hop count is a [`ConfigError::LengthMismatch`].
    pub fn resolve(&self) -> Result<HeraConfig, ConfigError> {
        let unit_seconds = self
            .seconds_in_time_unit
            .ok_or(ConfigError::MissingSetting("secondsInTimeUnit"))?;

        let (hop_count, lambda) = match (self.hop_count, &self.lambda) {
            (Some(hops), Some(lambda)) => (hops, lambda.clone()),
            _ => {
                if self.lambda.is_some() {
                    tracing::warn!("lambda supplied without hopCount, using defaults");
                }
                (DEFAULT_HOP_COUNT, DEFAULT_LAMBDA.to_vec())
            }
        };

        let gamma = match (self.hop_count, &self.gamma) {
            (Some(_), Some(gamma)) => gamma.clone(),
            _ => {
                if self.gamma.is_some() {
                    tracing::warn!("gamma supplied without hopCount, using defaults");
                }
                DEFAULT_GAMMA.to_vec()
            }
        };

        let alpha = self.alpha.unwrap_or(DEFAULT_ALPHA);

        HeraConfig::new(hop_count, lambda, gamma, alpha, unit_seconds)
    }
}

/// Validated, immutable router parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeraConfig {
    hop_count: usize,
    lambda: HopVector,
    gamma: HopVector,
    alpha: f64,
    unit_seconds: f64,
}

impl HeraConfig {
    /// Build and validate a configuration
    pub fn new(
        hop_count: usize,
        lambda: Vec<f64>,
        gamma: Vec<f64>,
        alpha: f64,
        unit_seconds: f64,
    ) -> Result<Self, ConfigError> {
        if hop_count == 0 {
            return Err(ConfigError::InvalidHopCount(hop_count));
        }
        check_weights("lambda", &lambda, hop_count)?;
        check_weights("gamma", &gamma, hop_count)?;

        if !(unit_seconds.is_finite() && unit_seconds > 0.0) {
            return Err(ConfigError::InvalidTimeUnit(unit_seconds));
        }
        if !(alpha.is_finite() && alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha(alpha));
        }

        Ok(Self {
            hop_count,
            lambda: HopVector::from(lambda),
            gamma: HopVector::from(gamma),
            alpha,
            unit_seconds,
        })
    }

    /// Default weights and aging base with the given time unit
    pub fn with_time_unit(unit_seconds: f64) -> Result<Self, ConfigError> {
        Self::new(
            DEFAULT_HOP_COUNT,
            DEFAULT_LAMBDA.to_vec(),
            DEFAULT_GAMMA.to_vec(),
            DEFAULT_ALPHA,
            unit_seconds,
        )
    }

    /// Number of hop levels (H)
    pub fn hop_count(&self) -> usize {
        self.hop_count
    }

    /// Transitivity/accrual weights
    pub fn lambda(&self) -> &HopVector {
        &self.lambda
    }

    /// Decision weights
    pub fn gamma(&self) -> &HopVector {
        &self.gamma
    }

    /// Aging base
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Seconds per aging time unit
    pub fn unit_seconds(&self) -> f64 {
        self.unit_seconds
    }
}

fn check_weights(name: &'static str, weights: &[f64], hop_count: usize) -> Result<(), ConfigError> {
    if weights.len() != hop_count {
        return Err(ConfigError::LengthMismatch {
            name,
            expected: hop_count,
            actual: weights.len(),
        });
    }
    for (index, &value) in weights.iter().enumerate() {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ConfigError::InvalidWeight { name, index, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve() {
        let config = HeraSettings::with_time_unit(30.0).resolve().unwrap();
        assert_eq!(config.hop_count(), 5);
        assert_eq!(config.lambda().as_slice(), &DEFAULT_LAMBDA);
        assert_eq!(config.gamma().as_slice(), &DEFAULT_GAMMA);
        assert_eq!(config.alpha(), 0.98);
        assert_eq!(config.unit_seconds(), 30.0);
    }

    #[test]
    fn test_missing_time_unit() {
        let err = HeraSettings::default().resolve().unwrap_err();
        assert_eq!(err, ConfigError::MissingSetting("secondsInTimeUnit"));
    }

    #[test]
    fn test_custom_arrays_with_hop_count() {
        let settings = HeraSettings {
            seconds_in_time_unit: Some(60.0),
            hop_count: Some(3),
            lambda: Some(vec![1.0, 0.5, 0.05]),
            gamma: Some(vec![1.0, 0.25, 0.0]),
            alpha: Some(0.9),
        };
        let config = settings.resolve().unwrap();
        assert_eq!(config.hop_count(), 3);
        assert_eq!(config.gamma().as_slice(), &[1.0, 0.25, 0.0]);
        assert_eq!(config.alpha(), 0.9);
    }

    #[test]
    fn test_lambda_without_hop_count_falls_back() {
        let settings = HeraSettings {
            seconds_in_time_unit: Some(60.0),
            lambda: Some(vec![2.0, 1.0]),
            ..Default::default()
        };
        let config = settings.resolve().unwrap();
        assert_eq!(config.hop_count(), DEFAULT_HOP_COUNT);
        assert_eq!(config.lambda().as_slice(), &DEFAULT_LAMBDA);
    }

    #[test]
    fn test_custom_lambda_with_default_gamma_is_inconsistent() {
        // hopCount=3 with custom lambda, but gamma falls back to the
        // five-entry default: never mix a custom size with a default array.
        let settings = HeraSettings {
            seconds_in_time_unit: Some(60.0),
            hop_count: Some(3),
            lambda: Some(vec![1.0, 0.5, 0.05]),
            ..Default::default()
        };
        let err = settings.resolve().unwrap_err();
        assert_eq!(
            err,
            ConfigError::LengthMismatch {
                name: "gamma",
                expected: 3,
                actual: 5
            }
        );
    }

    #[test]
    fn test_lambda_length_mismatch() {
        let settings = HeraSettings {
            seconds_in_time_unit: Some(60.0),
            hop_count: Some(4),
            lambda: Some(vec![1.0, 0.5, 0.05]),
            gamma: Some(vec![1.0, 0.5, 0.05, 0.005]),
            alpha: None,
        };
        assert!(matches!(
            settings.resolve(),
            Err(ConfigError::LengthMismatch { name: "lambda", .. })
        ));
    }

    #[test]
    fn test_invalid_scalars() {
        assert_eq!(
            HeraConfig::with_time_unit(0.0).unwrap_err(),
            ConfigError::InvalidTimeUnit(0.0)
        );
        assert!(HeraConfig::with_time_unit(f64::NAN).is_err());
        assert_eq!(
            HeraConfig::new(1, vec![1.0], vec![1.0], -0.5, 1.0).unwrap_err(),
            ConfigError::InvalidAlpha(-0.5)
        );
        assert!(HeraConfig::new(1, vec![1.0], vec![1.0], 1.5, 1.0).is_err());
        assert!(HeraConfig::new(1, vec![1.0], vec![1.0], 1.0, 1.0).is_ok());
        assert_eq!(
            HeraConfig::new(0, vec![], vec![], 0.98, 1.0).unwrap_err(),
            ConfigError::InvalidHopCount(0)
        );
    }

    #[test]
    fn test_negative_gamma_rejected() {
        let err = HeraConfig::new(2, vec![1.0, 0.5], vec![1.0, -0.5], 0.98, 1.0).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidWeight {
                name: "gamma",
                index: 1,
                value: -0.5
            }
        );
    }

    #[test]
    fn test_settings_deserialize_camel_case() {
        let json = r#"{"secondsInTimeUnit": 30, "hopCount": 2, "lambda": [1, 0.5], "gamma": [1, 0.1]}"#;
        let settings: HeraSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.seconds_in_time_unit, Some(30.0));
        assert_eq!(settings.hop_count, Some(2));
        let config = settings.resolve().unwrap();
        assert_eq!(config.lambda().as_slice(), &[1.0, 0.5]);
    }
}
