//! Per-pixel color converters for camera images.
//!
//! Converters either rewrite an [`Image`] in place ([`Image::convert`],
//! which needs `&mut`) or materialize a converted copy and leave the source
//! untouched ([`Image::converted`], which only needs `&`).

use crate::error::{Result, SensorError};
use crate::measurement::Image;
use crate::record::Record;
use crate::types::Color;
use crate::view::Measurement;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Largest value encodable in the three 8-bit depth channels.
const MAX_DEPTH: f32 = 16_777_215.0;

/// Divisor of the logarithmic depth curve, ln of the depth range in cm.
const LOG_DEPTH_SCALE: f32 = 5.70378;

/// Floor of the logarithmic depth curve so near-zero depth stays visible.
const LOG_DEPTH_FLOOR: f32 = 0.005;

/// Semantic segmentation colors indexed by label id, RGB.
pub const CITYSCAPES_PALETTE: [[u8; 3]; 23] = [
    [0, 0, 0],       // unlabeled
    [70, 70, 70],    // building
    [100, 40, 40],   // fence
    [55, 90, 80],    // other
    [220, 20, 60],   // pedestrian
    [153, 153, 153], // pole
    [157, 234, 50],  // road line
    [128, 64, 128],  // road
    [244, 35, 232],  // sidewalk
    [107, 142, 35],  // vegetation
    [0, 0, 142],     // vehicle
    [102, 102, 156], // wall
    [220, 220, 0],   // traffic sign
    [70, 130, 180],  // sky
    [81, 0, 81],     // ground
    [150, 100, 100], // bridge
    [230, 150, 140], // rail track
    [180, 165, 180], // guard rail
    [250, 170, 30],  // traffic light
    [110, 190, 160], // static
    [170, 120, 50],  // dynamic
    [45, 60, 150],   // water
    [145, 170, 100], // terrain
];

/// Pixel transform applied to an [`Image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ColorConverter {
    /// Pixels as produced by the camera
    #[default]
    Raw = 0,
    /// Linear grayscale depth
    Depth = 1,
    /// Logarithmic grayscale depth, more contrast close to the camera
    LogarithmicDepth = 2,
    /// Semantic label ids mapped to display colors
    CityScapesPalette = 3,
}

impl TryFrom<u8> for ColorConverter {
    type Error = SensorError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Depth),
            2 => Ok(Self::LogarithmicDepth),
            3 => Ok(Self::CityScapesPalette),
            _ => Err(SensorError::InvalidColorConverter(value.to_string())),
        }
    }
}

impl FromStr for ColorConverter {
    type Err = SensorError;

    /// Parses names like "depth", "LogarithmicDepth" or "cityscapes-palette".
    fn from_str(s: &str) -> Result<Self> {
        let name: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match name.as_str() {
            "raw" => Ok(Self::Raw),
            "depth" => Ok(Self::Depth),
            "logarithmicdepth" | "logdepth" => Ok(Self::LogarithmicDepth),
            "cityscapespalette" | "cityscapes" => Ok(Self::CityScapesPalette),
            _ => Err(SensorError::InvalidColorConverter(s.to_string())),
        }
    }
}

impl fmt::Display for ColorConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raw => "Raw",
            Self::Depth => "Depth",
            Self::LogarithmicDepth => "LogarithmicDepth",
            Self::CityScapesPalette => "CityScapesPalette",
        };
        f.write_str(name)
    }
}

/// Depth encoded in the color channels, normalized to `[0, 1]`.
///
/// Red is the least significant byte and blue the most significant.
#[inline]
pub fn decode_depth(pixel: Color) -> f32 {
    let depth = pixel.r as u32 + pixel.g as u32 * 256 + pixel.b as u32 * 65_536;
    depth as f32 / MAX_DEPTH
}

/// Gray pixel for a normalized value, rounded to the nearest level.
#[inline]
fn gray(pixel: Color, value: f32) -> Color {
    let v = (255.0 * value + 0.5) as u8;
    Color {
        b: v,
        g: v,
        r: v,
        a: pixel.a,
    }
}

impl ColorConverter {
    /// Converts a single pixel.
    ///
    /// Returns `None` when a palette lookup misses.
    #[inline]
    pub fn apply(self, pixel: Color) -> Option<Color> {
        match self {
            Self::Raw => Some(pixel),
            Self::Depth => Some(gray(pixel, decode_depth(pixel))),
            Self::LogarithmicDepth => {
                let log = 1.0 + decode_depth(pixel).ln() / LOG_DEPTH_SCALE;
                Some(gray(pixel, log.clamp(LOG_DEPTH_FLOOR, 1.0)))
            }
            Self::CityScapesPalette => {
                let [r, g, b] = *CITYSCAPES_PALETTE.get(pixel.r as usize)?;
                Some(Color { b, g, r, a: pixel.a })
            }
        }
    }

    /// Converts packed BGRA pixels in place.
    ///
    /// Palette labels are validated before any pixel is written, so a failed
    /// conversion leaves `pixels` untouched.
    pub fn convert_pixels(self, pixels: &mut [u8]) -> Result<()> {
        if self == Self::CityScapesPalette {
            if let Some((index, label)) = pixels
                .chunks_exact(Color::SIZE)
                .map(|chunk| Color::read(chunk).r)
                .enumerate()
                .find(|(_, label)| *label as usize >= CITYSCAPES_PALETTE.len())
            {
                return Err(SensorError::InvalidLabel { index, label });
            }
        }
        for (index, chunk) in pixels.chunks_exact_mut(Color::SIZE).enumerate() {
            let pixel = Color::read(chunk);
            let converted = self.apply(pixel).ok_or(SensorError::InvalidLabel {
                index,
                label: pixel.r,
            })?;
            converted.write(chunk);
        }
        Ok(())
    }
}

impl Image {
    /// Returns `true` when converting with `converter` changes nothing.
    fn check_conversion(&self, converter: ColorConverter) -> Result<bool> {
        let current = self.converter();
        if converter == ColorConverter::Raw || converter == current {
            return Ok(true);
        }
        if current != ColorConverter::Raw {
            return Err(SensorError::AlreadyConverted {
                current,
                requested: converter,
            });
        }
        Ok(false)
    }

    /// Converts the pixels in place.
    ///
    /// `Raw` and the converter already applied are no-ops, so repeating a
    /// conversion is idempotent. Chaining a different converter onto an
    /// already converted image fails with `AlreadyConverted`.
    pub fn convert(&mut self, converter: ColorConverter) -> Result<()> {
        if self.check_conversion(converter)? {
            return Ok(());
        }
        trace!(frame = self.frame(), %converter, pixels = self.len(), "converting image in place");
        converter.convert_pixels(self.pixel_bytes_mut())?;
        self.set_converter(converter);
        Ok(())
    }

    /// Returns a converted copy in a new buffer, leaving `self` untouched.
    pub fn converted(&self, converter: ColorConverter) -> Result<Image> {
        let mut pixels = self.raw_data().to_vec();
        if self.check_conversion(converter)? {
            return self.with_pixels(&pixels, self.converter());
        }
        trace!(frame = self.frame(), %converter, pixels = self.len(), "materializing converted image");
        converter.convert_pixels(&mut pixels)?;
        self.with_pixels(&pixels, converter)
    }
}
