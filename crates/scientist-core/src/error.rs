//! Error types for Scientist experiments
//!
//! Provides the error taxonomy for:
//! - Configuration errors (invalid names, missing behaviors, bad config files)
//! - Pre-run hook failures
//! - Runner failures surfaced by [`ExperimentRunner`](crate::ExperimentRunner) implementations

/// Main experiment error type
#[derive(Debug, thiserror::Error)]
pub enum ExperimentError {
    /// Experiment name was empty
    #[error("experiment name must not be empty")]
    EmptyName,

    /// Build attempted without a control behavior
    #[error("experiment '{experiment}' has no control behavior")]
    MissingControl {
        /// Experiment name
        experiment: String,
    },

    /// Build attempted without a candidate behavior
    #[error("experiment '{experiment}' has no candidate behavior")]
    MissingCandidate {
        /// Experiment name
        experiment: String,
    },

    /// Configuration could not be loaded or serialized
    #[error("configuration error: {0}")]
    Config(String),

    /// Pre-run hook failed
    #[error("before-run hook failed for experiment '{experiment}': {source}")]
    Hook {
        /// Experiment name
        experiment: String,
        /// Failure raised by the hook
        #[source]
        source: anyhow::Error,
    },

    /// Control behavior failed inside a runner
    #[error("control failed for experiment '{experiment}': {message}")]
    ControlFailed {
        /// Experiment name
        experiment: String,
        /// Failure description
        message: String,
    },
}

impl ExperimentError {
    /// Check if error was raised while configuring (as opposed to executing)
    #[inline]
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyName
                | Self::MissingControl { .. }
                | Self::MissingCandidate { .. }
                | Self::Config(_)
        )
    }

    /// Create hook failure error
    #[inline]
    pub fn hook(experiment: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Hook {
            experiment: experiment.into(),
            source,
        }
    }
}

impl From<toml::de::Error> for ExperimentError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ExperimentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_control_display() {
        let err = ExperimentError::MissingControl {
            experiment: "feature-x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "experiment 'feature-x' has no control behavior"
        );
    }

    #[test]
    fn configuration_errors_classified() {
        assert!(ExperimentError::EmptyName.is_configuration_error());
        assert!(ExperimentError::MissingCandidate {
            experiment: "x".to_string()
        }
        .is_configuration_error());
        assert!(ExperimentError::Config("bad".to_string()).is_configuration_error());

        let hook = ExperimentError::hook("x", anyhow::anyhow!("boom"));
        assert!(!hook.is_configuration_error());
    }

    #[test]
    fn hook_error_keeps_source() {
        let err = ExperimentError::hook("x", anyhow::anyhow!("disk full"));
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk full"));
        assert!(err.to_string().contains("disk full"));
    }
}
