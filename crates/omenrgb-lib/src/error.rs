//! Unified error type for the omenrgb-lib crate.
//!
//! [`OmenError`] wraps module-specific errors (`FirmwareError`, `AttrError`)
//! and domain-specific error kinds (`Config`, `Color`, `Image`).
//! `From` impls allow `?` to propagate across module boundaries.

use std::fmt;

use crate::attr::AttrError;
use crate::query::FirmwareError;

/// Unified error type for omenrgb-lib operations.
#[derive(Debug)]
pub enum OmenError {
    /// Firmware query failure or invalid query argument.
    Firmware(FirmwareError),
    /// Attribute read/write failure.
    Attr(AttrError),
    /// Standard I/O error (config and image persistence).
    Io(std::io::Error),
    /// Configuration validation error.
    Config(String),
    /// Color parsing error.
    Color(String),
    /// Firmware image decoding error.
    Image(String),
}

impl fmt::Display for OmenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OmenError::Firmware(e) => write!(f, "{e}"),
            OmenError::Attr(e) => write!(f, "{e}"),
            OmenError::Io(e) => write!(f, "I/O error: {e}"),
            OmenError::Config(e) => write!(f, "Config error: {e}"),
            OmenError::Color(e) => write!(f, "Color error: {e}"),
            OmenError::Image(e) => write!(f, "Image error: {e}"),
        }
    }
}

impl std::error::Error for OmenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OmenError::Firmware(e) => Some(e),
            OmenError::Attr(e) => Some(e),
            OmenError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FirmwareError> for OmenError {
    fn from(e: FirmwareError) -> Self {
        OmenError::Firmware(e)
    }
}

impl From<AttrError> for OmenError {
    fn from(e: AttrError) -> Self {
        OmenError::Attr(e)
    }
}

impl From<std::io::Error> for OmenError {
    fn from(e: std::io::Error) -> Self {
        OmenError::Io(e)
    }
}

/// Crate-level Result alias using [`OmenError`].
pub type Result<T> = std::result::Result<T, OmenError>;
