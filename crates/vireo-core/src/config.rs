//! Evaluation configuration.

use std::fmt;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::execution::DEFAULT_CHUNK_SIZE;

/// How batch evaluation obtains scratch columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferMode {
    /// Shared, lock-protected pool. Safe to use from many threads.
    #[default]
    Pooled,
    /// Buffers owned by a single evaluator. No locking; one thread only.
    Exclusive,
}

impl fmt::Display for BufferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pooled => write!(f, "pooled"),
            Self::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// Errors from [`EvalConfig::validate()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Chunk capacity must be greater than zero.
    ZeroChunkCapacity,
    /// Time zone offset is outside +/- 24 hours.
    InvalidTimeZone(i32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroChunkCapacity => write!(f, "chunk_capacity must be greater than zero"),
            Self::InvalidTimeZone(secs) => {
                write!(f, "time zone offset of {secs} seconds is out of range")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Session-scoped evaluation settings.
///
/// ```
/// use vireo_core::config::{BufferMode, EvalConfig};
///
/// let config = EvalConfig::default()
///     .without_vectorization()
///     .with_time_zone_offset(8 * 3600)
///     .with_buffer_mode(BufferMode::Exclusive);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Session-wide switch for batch evaluation.
    ///
    /// When off, every function runs its per-row form in a loop.
    pub vectorized: bool,

    /// Rows per chunk; also the initial capacity of scratch columns.
    pub chunk_capacity: usize,

    /// Session time zone as seconds east of UTC.
    pub time_zone_offset_secs: i32,

    /// Scratch buffer discipline.
    pub buffer_mode: BufferMode,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            vectorized: true,
            chunk_capacity: DEFAULT_CHUNK_SIZE,
            time_zone_offset_secs: 0,
            buffer_mode: BufferMode::default(),
        }
    }
}

impl EvalConfig {
    /// Disables batch evaluation.
    #[must_use]
    pub fn without_vectorization(mut self) -> Self {
        self.vectorized = false;
        self
    }

    /// Sets the vectorization switch.
    #[must_use]
    pub fn with_vectorized(mut self, vectorized: bool) -> Self {
        self.vectorized = vectorized;
        self
    }

    /// Sets the chunk capacity.
    #[must_use]
    pub fn with_chunk_capacity(mut self, capacity: usize) -> Self {
        self.chunk_capacity = capacity;
        self
    }

    /// Sets the session time zone offset in seconds east of UTC.
    #[must_use]
    pub fn with_time_zone_offset(mut self, secs: i32) -> Self {
        self.time_zone_offset_secs = secs;
        self
    }

    /// Sets the scratch buffer discipline.
    #[must_use]
    pub fn with_buffer_mode(mut self, mode: BufferMode) -> Self {
        self.buffer_mode = mode;
        self
    }

    /// The session time zone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeZone`] if the offset is out of range.
    pub fn time_zone(&self) -> std::result::Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.time_zone_offset_secs)
            .ok_or(ConfigError::InvalidTimeZone(self.time_zone_offset_secs))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any setting is invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.chunk_capacity == 0 {
            return Err(ConfigError::ZeroChunkCapacity);
        }
        self.time_zone()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = EvalConfig::default();
        assert!(config.vectorized);
        assert_eq!(config.chunk_capacity, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.time_zone_offset_secs, 0);
        assert_eq!(config.buffer_mode, BufferMode::Pooled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_chaining() {
        let config = EvalConfig::default()
            .without_vectorization()
            .with_chunk_capacity(32)
            .with_time_zone_offset(-5 * 3600)
            .with_buffer_mode(BufferMode::Exclusive);
        assert!(!config.vectorized);
        assert_eq!(config.chunk_capacity, 32);
        assert_eq!(config.time_zone().unwrap().local_minus_utc(), -5 * 3600);
        assert_eq!(config.buffer_mode, BufferMode::Exclusive);
        assert!(config.with_vectorized(true).vectorized);
    }

    #[test]
    fn test_config_validate() {
        assert_eq!(
            EvalConfig::default().with_chunk_capacity(0).validate(),
            Err(ConfigError::ZeroChunkCapacity)
        );
        assert_eq!(
            EvalConfig::default().with_time_zone_offset(90_000).validate(),
            Err(ConfigError::InvalidTimeZone(90_000))
        );
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::ZeroChunkCapacity.to_string(),
            "chunk_capacity must be greater than zero"
        );
    }

    #[test]
    fn test_config_from_json() {
        let config: EvalConfig =
            serde_json::from_str(r#"{"vectorized": false, "buffer_mode": "exclusive"}"#).unwrap();
        assert!(!config.vectorized);
        assert_eq!(config.buffer_mode, BufferMode::Exclusive);
        assert_eq!(config.chunk_capacity, DEFAULT_CHUNK_SIZE);
        assert_eq!(BufferMode::Exclusive.to_string(), "exclusive");
    }
}
