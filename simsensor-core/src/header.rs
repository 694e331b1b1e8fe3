//! Fixed-width message header codec.
//!
//! Layout (little-endian):
//! ```text
//! [0]      sensor_tag u8
//! [1:9]    frame u64
//! [9:17]   timestamp f64 (seconds)
//! [17:41]  transform: location x,y,z + rotation pitch,yaw,roll (6 x f32)
//! [41..]   modality header
//!            Image / DVS : width u32, height u32, fov f32
//!            Lidar       : horizontal_angle f32, channels u32, channels x u32
//! ```

use crate::error::{Result, SensorError};
use crate::types::{Location, Rotation, SensorTag, Transform};
use byteorder::{ByteOrder, LittleEndian};

/// Size of the prefix shared by every modality.
pub const COMMON_HEADER_SIZE: usize = 41;

/// Size of the camera-like (Image, DVS) modality header.
pub const CAMERA_HEADER_SIZE: usize = 12;

/// Size of the fixed part of the lidar modality header.
pub const LIDAR_HEADER_SIZE: usize = 8;

/// Modality-specific header fields following the common prefix.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ModalityHeader {
    #[default]
    None,
    Camera {
        width: u32,
        height: u32,
        fov: f32,
    },
    Lidar {
        horizontal_angle: f32,
        channel_points: Vec<u32>,
    },
}

impl ModalityHeader {
    fn encoded_len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Camera { .. } => CAMERA_HEADER_SIZE,
            Self::Lidar { channel_points, .. } => LIDAR_HEADER_SIZE + 4 * channel_points.len(),
        }
    }
}

/// Decoded message header.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorHeader {
    /// Raw modality discriminant, see [`SensorTag`]
    pub sensor_tag: u8,
    /// Simulator frame number
    pub frame: u64,
    /// Simulation time in seconds
    pub timestamp: f64,
    /// Sensor-to-world transform at capture time
    pub transform: Transform,
    /// Modality-specific fields
    pub modality: ModalityHeader,
}

impl SensorHeader {
    /// Creates a header with no modality fields.
    pub fn new(tag: SensorTag, frame: u64, timestamp: f64, transform: Transform) -> Self {
        Self {
            sensor_tag: tag as u8,
            frame,
            timestamp,
            transform,
            modality: ModalityHeader::None,
        }
    }

    /// Attaches camera geometry (Image and DVS).
    pub fn with_camera(mut self, width: u32, height: u32, fov: f32) -> Self {
        self.modality = ModalityHeader::Camera { width, height, fov };
        self
    }

    /// Attaches lidar scan information.
    pub fn with_lidar(mut self, horizontal_angle: f32, channel_points: Vec<u32>) -> Self {
        self.modality = ModalityHeader::Lidar {
            horizontal_angle,
            channel_points,
        };
        self
    }

    /// Returns the modality, if the tag is recognized.
    #[inline]
    pub fn tag(&self) -> Option<SensorTag> {
        SensorTag::from_u8(self.sensor_tag)
    }

    /// Total encoded size of this header.
    pub fn encoded_len(&self) -> usize {
        COMMON_HEADER_SIZE + self.modality.encoded_len()
    }
}

/// Minimum header size for the declared sensor tag.
///
/// For lidar this is the size before the per-channel table, whose length is
/// only known once the channel count has been read.
pub fn min_header_len(sensor_tag: u8) -> usize {
    match SensorTag::from_u8(sensor_tag) {
        Some(SensorTag::Image) | Some(SensorTag::Dvs) => COMMON_HEADER_SIZE + CAMERA_HEADER_SIZE,
        Some(SensorTag::Lidar) => COMMON_HEADER_SIZE + LIDAR_HEADER_SIZE,
        _ => COMMON_HEADER_SIZE,
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn u8(&mut self) -> u8 {
        self.pos += 1;
        self.buf[self.pos - 1]
    }

    fn u32(&mut self) -> u32 {
        self.pos += 4;
        LittleEndian::read_u32(&self.buf[self.pos - 4..self.pos])
    }

    fn u64(&mut self) -> u64 {
        self.pos += 8;
        LittleEndian::read_u64(&self.buf[self.pos - 8..self.pos])
    }

    fn f32(&mut self) -> f32 {
        self.pos += 4;
        LittleEndian::read_f32(&self.buf[self.pos - 4..self.pos])
    }

    fn f64(&mut self) -> f64 {
        self.pos += 8;
        LittleEndian::read_f64(&self.buf[self.pos - 8..self.pos])
    }
}

struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    fn u8(&mut self, v: u8) {
        self.buf[self.pos] = v;
        self.pos += 1;
    }

    fn u32(&mut self, v: u32) {
        LittleEndian::write_u32(&mut self.buf[self.pos..self.pos + 4], v);
        self.pos += 4;
    }

    fn u64(&mut self, v: u64) {
        LittleEndian::write_u64(&mut self.buf[self.pos..self.pos + 8], v);
        self.pos += 8;
    }

    fn f32(&mut self, v: f32) {
        LittleEndian::write_f32(&mut self.buf[self.pos..self.pos + 4], v);
        self.pos += 4;
    }

    fn f64(&mut self, v: f64) {
        LittleEndian::write_f64(&mut self.buf[self.pos..self.pos + 8], v);
        self.pos += 8;
    }
}

/// Decodes the header at the start of `buf`.
///
/// Returns the header and the offset at which the payload starts. Unknown
/// tags decode the common prefix only; rejecting them is left to dispatch.
pub fn decode(buf: &[u8]) -> Result<(SensorHeader, usize)> {
    let corrupt = |tag: Option<u8>, needed: usize| SensorError::CorruptHeader {
        tag,
        needed,
        actual: buf.len(),
    };

    let Some(&sensor_tag) = buf.first() else {
        return Err(corrupt(None, COMMON_HEADER_SIZE));
    };
    let needed = min_header_len(sensor_tag);
    if buf.len() < needed {
        return Err(corrupt(Some(sensor_tag), needed));
    }

    let mut r = Reader { buf, pos: 0 };
    r.u8();
    let frame = r.u64();
    let timestamp = r.f64();
    let location = Location::new(r.f32(), r.f32(), r.f32());
    let rotation = Rotation::new(r.f32(), r.f32(), r.f32());

    let modality = match SensorTag::from_u8(sensor_tag) {
        Some(SensorTag::Image) | Some(SensorTag::Dvs) => ModalityHeader::Camera {
            width: r.u32(),
            height: r.u32(),
            fov: r.f32(),
        },
        Some(SensorTag::Lidar) => {
            let horizontal_angle = r.f32();
            let channels = r.u32() as usize;
            let needed = needed + 4 * channels;
            if buf.len() < needed {
                return Err(corrupt(Some(sensor_tag), needed));
            }
            let channel_points = (0..channels).map(|_| r.u32()).collect();
            ModalityHeader::Lidar {
                horizontal_angle,
                channel_points,
            }
        }
        _ => ModalityHeader::None,
    };

    let header = SensorHeader {
        sensor_tag,
        frame,
        timestamp,
        transform: Transform::new(location, rotation),
        modality,
    };
    Ok((header, r.pos))
}

/// Appends the encoded header to `out`.
pub fn encode(header: &SensorHeader, out: &mut Vec<u8>) {
    let start = out.len();
    out.resize(start + header.encoded_len(), 0);
    let mut w = Writer {
        buf: &mut out[start..],
        pos: 0,
    };

    w.u8(header.sensor_tag);
    w.u64(header.frame);
    w.f64(header.timestamp);
    let Transform { location, rotation } = header.transform;
    w.f32(location.x);
    w.f32(location.y);
    w.f32(location.z);
    w.f32(rotation.pitch);
    w.f32(rotation.yaw);
    w.f32(rotation.roll);

    match &header.modality {
        ModalityHeader::None => {}
        ModalityHeader::Camera { width, height, fov } => {
            w.u32(*width);
            w.u32(*height);
            w.f32(*fov);
        }
        ModalityHeader::Lidar {
            horizontal_angle,
            channel_points,
        } => {
            w.f32(*horizontal_angle);
            w.u32(channel_points.len() as u32);
            for &count in channel_points {
                w.u32(count);
            }
        }
    }
}
