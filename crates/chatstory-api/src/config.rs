//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use chatstory_narrative::domain::playback::{DEFAULT_PACING, PlaybackConfig};

use crate::error::AppError;

/// Runtime configuration for the preview host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Fixed spacing between revealed messages.
    pub pacing: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3000,
            pacing: DEFAULT_PACING,
        }
    }
}

impl AppConfig {
    /// Reads `HOST`, `PORT` and `PLAYBACK_PACING_MS`, falling back to
    /// defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => defaults.port,
        };
        let pacing = match lookup("PLAYBACK_PACING_MS") {
            Some(raw) => raw.parse().map(Duration::from_millis).map_err(|e| {
                AppError::Config(format!("PLAYBACK_PACING_MS must be a whole number: {e}"))
            })?,
            None => defaults.pacing,
        };
        Ok(Self { host, port, pacing })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if host and port do not form an address.
    pub fn addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Playback tunables derived from this configuration.
    #[must_use]
    pub fn playback(&self) -> PlaybackConfig {
        PlaybackConfig {
            pacing: self.pacing,
        }
    }
}
