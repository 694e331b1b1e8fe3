//! Array-shaped measurements: camera images, lidar and radar scans, DVS
//! event streams.
//!
//! Each type owns its message and dereferences to the [`RecordArray`] that
//! overlays the payload, so `len`, `at`, `set`, `iter` and `raw_data` are
//! available on all of them. `Image` only derefs immutably and provides its
//! own `set`.

use crate::color::ColorConverter;
use crate::error::{Result, SensorError};
use crate::header::{min_header_len, ModalityHeader, SensorHeader};
use crate::raw::RawBuffer;
use crate::types::{Color, DvsEvent, Location, RadarDetection};
use crate::view::{Measurement, RecordArray};
use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::warn;

fn camera_geometry(raw: &RawBuffer) -> Result<(u32, u32, f32)> {
    match raw.header().modality {
        ModalityHeader::Camera { width, height, fov } => Ok((width, height, fov)),
        _ => Err(missing_modality_header(raw)),
    }
}

fn missing_modality_header(raw: &RawBuffer) -> SensorError {
    let tag = raw.header().sensor_tag;
    SensorError::CorruptHeader {
        tag: Some(tag),
        needed: min_header_len(tag),
        actual: raw.header().encoded_len(),
    }
}

macro_rules! deref_records {
    ($ty:ty, $field:ident, $record:ty, mut) => {
        deref_records!($ty, $field, $record);

        impl DerefMut for $ty {
            #[inline]
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.$field
            }
        }
    };
    ($ty:ty, $field:ident, $record:ty) => {
        impl Deref for $ty {
            type Target = RecordArray<$record>;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.$field
            }
        }

        impl Measurement for $ty {
            #[inline]
            fn header(&self) -> &SensorHeader {
                self.$field.header()
            }
        }

        impl<'a> IntoIterator for &'a $ty {
            type Item = $record;
            type IntoIter = crate::view::RecordIter<'a, $record>;

            fn into_iter(self) -> Self::IntoIter {
                self.$field.iter()
            }
        }
    };
}

// ============================================================================
// Image
// ============================================================================

/// A camera frame of `width * height` BGRA pixels.
///
/// Pixel writes go through [`Image::set`] so the converter state stays
/// accurate; the record array is only reachable read-only.
#[derive(Debug)]
pub struct Image {
    pixels: RecordArray<Color>,
    width: u32,
    height: u32,
    fov: f32,
    converter: ColorConverter,
}

deref_records!(Image, pixels, Color);

impl Image {
    pub(crate) fn from_raw(raw: RawBuffer) -> Result<Self> {
        let (width, height, fov) = camera_geometry(&raw)?;
        let pixels = RecordArray::<Color>::new(raw, "Image")?;
        if pixels.len() as u64 != width as u64 * height as u64 {
            return Err(SensorError::GeometryMismatch {
                width,
                height,
                pixels: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            fov,
            converter: ColorConverter::Raw,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Horizontal field of view in degrees.
    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Converter that produced the current pixel values.
    #[inline]
    pub fn converter(&self) -> ColorConverter {
        self.converter
    }

    /// Overwrites the pixel at `index` with a camera-space value.
    ///
    /// The image is marked [`ColorConverter::Raw`] afterwards, so a later
    /// [`Image::convert`] runs over every pixel again instead of treating
    /// the write as already converted.
    pub fn set(&mut self, index: usize, pixel: Color) -> Result<()> {
        self.pixels.set(index, pixel)?;
        self.converter = ColorConverter::Raw;
        Ok(())
    }

    pub(crate) fn pixel_bytes_mut(&mut self) -> &mut [u8] {
        self.pixels.raw_data_mut()
    }

    pub(crate) fn set_converter(&mut self, converter: ColorConverter) {
        self.converter = converter;
    }

    pub(crate) fn with_pixels(&self, pixels: &[u8], converter: ColorConverter) -> Result<Self> {
        let raw = RawBuffer::new(self.header().clone(), pixels);
        let mut image = Self::from_raw(raw)?;
        image.converter = converter;
        Ok(image)
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Image(frame={}, timestamp={:.6}, size={}x{})",
            self.frame(),
            self.timestamp(),
            self.width,
            self.height
        )
    }
}

// ============================================================================
// LidarMeasurement
// ============================================================================

/// A lidar sweep: one point per return, grouped by laser channel.
#[derive(Debug)]
pub struct LidarMeasurement {
    points: RecordArray<Location>,
    horizontal_angle: f32,
    channel_points: Vec<u32>,
}

deref_records!(LidarMeasurement, points, Location, mut);

impl LidarMeasurement {
    pub(crate) fn from_raw(raw: RawBuffer) -> Result<Self> {
        let (horizontal_angle, channel_points) = match &raw.header().modality {
            ModalityHeader::Lidar {
                horizontal_angle,
                channel_points,
            } => (*horizontal_angle, channel_points.clone()),
            _ => return Err(missing_modality_header(&raw)),
        };
        let points = RecordArray::<Location>::new(raw, "LidarMeasurement")?;

        let declared: u64 = channel_points.iter().map(|&c| c as u64).sum();
        if declared != points.len() as u64 {
            warn!(
                frame = points.frame(),
                declared,
                actual = points.len(),
                "lidar channel table does not match point count"
            );
        }

        Ok(Self {
            points,
            horizontal_angle,
            channel_points,
        })
    }

    /// Horizontal angle of the sweep in degrees.
    #[inline]
    pub fn horizontal_angle(&self) -> f32 {
        self.horizontal_angle
    }

    #[inline]
    pub fn channel_count(&self) -> u32 {
        self.channel_points.len() as u32
    }

    /// Number of points produced by laser `channel`.
    pub fn point_count(&self, channel: usize) -> Result<u32> {
        self.channel_points
            .get(channel)
            .copied()
            .ok_or(SensorError::IndexOutOfRange {
                index: channel,
                len: self.channel_points.len(),
            })
    }
}

impl fmt::Display for LidarMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LidarMeasurement(frame={}, timestamp={:.6}, number_of_points={})",
            self.frame(),
            self.timestamp(),
            self.len()
        )
    }
}

// ============================================================================
// RadarMeasurement
// ============================================================================

/// Radar returns for one frame.
#[derive(Debug)]
pub struct RadarMeasurement {
    detections: RecordArray<RadarDetection>,
}

deref_records!(RadarMeasurement, detections, RadarDetection, mut);

impl RadarMeasurement {
    pub(crate) fn from_raw(raw: RawBuffer) -> Result<Self> {
        Ok(Self {
            detections: RecordArray::new(raw, "RadarMeasurement")?,
        })
    }

    #[inline]
    pub fn detection_count(&self) -> usize {
        self.detections.len()
    }
}

impl fmt::Display for RadarMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RadarMeasurement(frame={}, timestamp={:.6}, point_count={})",
            self.frame(),
            self.timestamp(),
            self.detection_count()
        )
    }
}

// ============================================================================
// DVSEventArray
// ============================================================================

/// Events emitted by a dynamic vision sensor during one frame.
#[derive(Debug)]
pub struct DvsEventArray {
    events: RecordArray<DvsEvent>,
    width: u32,
    height: u32,
    fov: f32,
}

deref_records!(DvsEventArray, events, DvsEvent, mut);

impl DvsEventArray {
    pub(crate) fn from_raw(raw: RawBuffer) -> Result<Self> {
        let (width, height, fov) = camera_geometry(&raw)?;
        Ok(Self {
            events: RecordArray::new(raw, "DVSEventArray")?,
            width,
            height,
            fov,
        })
    }

    /// Sensor width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Sensor height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }
}

impl fmt::Display for DvsEventArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EventArray(frame={}, timestamp={:.6}, dimensions={}x{}, number_of_events={})",
            self.frame(),
            self.timestamp(),
            self.width,
            self.height,
            self.len()
        )
    }
}
