#![forbid(unsafe_code)]

//! Tracker configuration.
//!
//! ```toml
//! # pxdoc-history.toml
//! max_undo_depth = 200
//! merge_single_change_packets = true
//! max_merged_packet_len = 4096
//! ```
//!
//! ```rust,ignore
//! let config = TrackerConfig::from_toml_file("pxdoc-history.toml")?;
//! ```
//!
//! `TrackerConfig::default()` keeps every packet and enables packet merging.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Configuration for [`DocumentChangeTracker`](crate::DocumentChangeTracker).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TrackerConfig {
    /// Maximum number of packets on the undo stack (0 = unlimited).
    ///
    /// Oldest packets are evicted and disposed when a commit boundary pushes
    /// past the limit.
    pub max_undo_depth: usize,
    /// Fold a boundary-closed single change onto the newest undo packet when
    /// they are mergeable.
    pub merge_single_change_packets: bool,
    /// Stop merging onto a packet once it holds this many changes
    /// (0 = unlimited). Bounds the homologous scan on long gestures.
    pub max_merged_packet_len: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: 0,
            merge_single_change_packets: true,
            max_merged_packet_len: 0,
        }
    }
}

impl TrackerConfig {
    /// Set the undo depth limit (0 = unlimited).
    #[must_use]
    pub fn with_max_undo_depth(mut self, depth: usize) -> Self {
        self.max_undo_depth = depth;
        self
    }

    /// Enable or disable packet merging.
    #[must_use]
    pub fn with_packet_merging(mut self, enabled: bool) -> Self {
        self.merge_single_change_packets = enabled;
        self
    }

    /// Set the merged packet length limit (0 = unlimited).
    #[must_use]
    pub fn with_max_merged_packet_len(mut self, len: usize) -> Self {
        self.max_merged_packet_len = len;
        self
    }

    /// Whether a packet of `len` changes may still take a merged change.
    #[must_use]
    pub fn allows_merge_into(&self, len: usize) -> bool {
        self.merge_single_change_packets
            && (self.max_merged_packet_len == 0 || len < self.max_merged_packet_len)
    }

    /// Whether `depth` undo packets exceed the configured limit.
    #[must_use]
    pub fn exceeds_depth(&self, depth: usize) -> bool {
        self.max_undo_depth > 0 && depth > self.max_undo_depth
    }

    /// Validate parameters. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_merged_packet_len == 1 {
            errors.push(
                "max_merged_packet_len must be 0 (unlimited) or at least 2".to_string(),
            );
        }
        errors
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    #[cfg(feature = "config")]
    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors that can occur when loading a tracker configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
