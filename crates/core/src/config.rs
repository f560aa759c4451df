//! Cleaner configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Hyperlink substring identifying the default watermark family.
pub const DEFAULT_TARGET_DOMAIN: &str = "gamma.app";

/// Default fraction of slide width/height where the corner region starts.
pub const DEFAULT_CORNER_THRESHOLD: f64 = 0.7;

/// Settings for a [`WatermarkCleaner`](crate::WatermarkCleaner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Lowercased substring matched against hyperlink addresses.
    target_domain: String,

    /// Fraction in (0, 1) of slide width/height defining the bottom-right corner.
    corner_threshold: f64,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            target_domain: DEFAULT_TARGET_DOMAIN.to_string(),
            corner_threshold: DEFAULT_CORNER_THRESHOLD,
        }
    }
}

impl CleanerConfig {
    /// Create a configuration with the default domain and threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different target domain. Matching is case-insensitive.
    pub fn with_target_domain(mut self, domain: impl AsRef<str>) -> Self {
        self.target_domain = domain.as_ref().trim().to_lowercase();
        self
    }

    /// Use a different corner threshold.
    pub fn with_corner_threshold(mut self, threshold: f64) -> Self {
        self.corner_threshold = threshold;
        self
    }

    pub fn target_domain(&self) -> &str {
        &self.target_domain
    }

    pub fn corner_threshold(&self) -> f64 {
        self.corner_threshold
    }

    /// Check that the domain is non-empty and the threshold lies in (0, 1).
    pub fn validate(&self) -> Result<()> {
        if self.target_domain.is_empty() {
            return Err(Error::InvalidConfig(
                "target domain must not be empty".to_string(),
            ));
        }

        if !(self.corner_threshold > 0.0 && self.corner_threshold < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "corner threshold must be between 0 and 1 (exclusive), got {}",
                self.corner_threshold
            )));
        }

        Ok(())
    }

    /// Whether `address` contains the target domain, ignoring case.
    pub fn matches(&self, address: &str) -> bool {
        address.to_lowercase().contains(&self.target_domain)
    }
}
