//! Error types for the gateway

use inkcast_drivers::radio::A7106Error;
use inkcast_hal::BusError;
use inkcast_hal_linux::LinuxHalError;

/// Result type alias
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Gateway error types
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for the expected layout
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// GPIO setup failed
    #[error("GPIO setup failed: {0}")]
    Hal(#[from] LinuxHalError),

    /// Radio operation failed
    #[error("Radio error: {0}")]
    Radio(A7106Error<BusError>),

    /// Image file could not be used
    #[error("Image {path}: {reason}")]
    Image {
        /// File the image was read from
        path: String,
        /// What was wrong with it
        reason: String,
    },

    /// Invalid command-line argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<A7106Error<BusError>> for GatewayError {
    fn from(e: A7106Error<BusError>) -> Self {
        GatewayError::Radio(e)
    }
}
