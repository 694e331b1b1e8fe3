//! Error types shared by the decoder, the typed views and the converters.

use crate::color::ColorConverter;
use thiserror::Error;

/// Errors raised while decoding or operating on sensor messages.
///
/// Every variant carries the offending value so the caller can tell which
/// tag, index or label triggered the failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("Corrupt header (sensor tag {tag:?}): need {needed} bytes, got {actual}")]
    CorruptHeader {
        tag: Option<u8>,
        needed: usize,
        actual: usize,
    },

    #[error("Unknown sensor tag: {0}")]
    UnknownSensorTag(u8),

    #[error("{modality} payload of {payload_len} bytes does not fit records of {record_size} bytes")]
    SizeMismatch {
        modality: &'static str,
        payload_len: usize,
        record_size: usize,
    },

    #[error("Image geometry {width}x{height} does not match payload of {pixels} pixels")]
    GeometryMismatch { width: u32, height: u32, pixels: usize },

    #[error("Frame of {width}x{height} pixels cannot be allocated")]
    FrameTooLarge { width: u32, height: u32 },

    #[error("Index {index} out of range for {len} elements")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid color converter: {0}")]
    InvalidColorConverter(String),

    #[error("Invalid semantic label {label} at pixel {index}")]
    InvalidLabel { index: usize, label: u8 },

    #[error("Image already converted with {current:?}, cannot apply {requested:?}")]
    AlreadyConverted {
        current: ColorConverter,
        requested: ColorConverter,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SensorError>;
