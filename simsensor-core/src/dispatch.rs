//! Sensor tag dispatch.
//!
//! [`deserialize`] consumes a [`RawBuffer`] and moves it into the typed
//! measurement selected by its sensor tag.

use crate::error::{Result, SensorError};
use crate::header::SensorHeader;
use crate::measurement::{DvsEventArray, Image, LidarMeasurement, RadarMeasurement};
use crate::raw::RawBuffer;
use crate::scalar::{
    CollisionEvent, GnssMeasurement, ImuMeasurement, LaneInvasionEvent, ObstacleDetectionEvent,
};
use crate::types::SensorTag;
use crate::view::Measurement;
use std::fmt;
use tracing::debug;

/// A decoded sensor message of any modality.
#[derive(Debug)]
pub enum SensorData {
    Image(Image),
    Lidar(LidarMeasurement),
    Radar(RadarMeasurement),
    Dvs(DvsEventArray),
    Gnss(GnssMeasurement),
    Imu(ImuMeasurement),
    Collision(CollisionEvent),
    ObstacleDetection(ObstacleDetectionEvent),
    LaneInvasion(LaneInvasionEvent),
}

/// Builds the typed measurement for a received message.
pub fn deserialize(raw: RawBuffer) -> Result<SensorData> {
    let sensor_tag = raw.header().sensor_tag;
    let tag = SensorTag::from_u8(sensor_tag).ok_or(SensorError::UnknownSensorTag(sensor_tag))?;
    let payload_len = raw.payload().len();

    let data = match tag {
        SensorTag::Image => SensorData::Image(Image::from_raw(raw)?),
        SensorTag::Lidar => SensorData::Lidar(LidarMeasurement::from_raw(raw)?),
        SensorTag::Radar => SensorData::Radar(RadarMeasurement::from_raw(raw)?),
        SensorTag::Dvs => SensorData::Dvs(DvsEventArray::from_raw(raw)?),
        SensorTag::Gnss => SensorData::Gnss(GnssMeasurement::from_raw(raw)?),
        SensorTag::Imu => SensorData::Imu(ImuMeasurement::from_raw(raw)?),
        SensorTag::Collision => SensorData::Collision(CollisionEvent::from_raw(raw)?),
        SensorTag::ObstacleDetection => {
            SensorData::ObstacleDetection(ObstacleDetectionEvent::from_raw(raw)?)
        }
        SensorTag::LaneInvasion => SensorData::LaneInvasion(LaneInvasionEvent::from_raw(raw)?),
    };

    debug!(
        sensor = tag.name(),
        frame = data.frame(),
        payload_len,
        records = data.record_count(),
        "deserialized sensor message"
    );
    Ok(data)
}

/// Decodes the header of `bytes` and dispatches it.
pub fn deserialize_bytes(bytes: Vec<u8>) -> Result<SensorData> {
    deserialize(RawBuffer::from_bytes(bytes)?)
}

impl SensorData {
    pub fn tag(&self) -> SensorTag {
        match self {
            Self::Image(_) => SensorTag::Image,
            Self::Lidar(_) => SensorTag::Lidar,
            Self::Radar(_) => SensorTag::Radar,
            Self::Dvs(_) => SensorTag::Dvs,
            Self::Gnss(_) => SensorTag::Gnss,
            Self::Imu(_) => SensorTag::Imu,
            Self::Collision(_) => SensorTag::Collision,
            Self::ObstacleDetection(_) => SensorTag::ObstacleDetection,
            Self::LaneInvasion(_) => SensorTag::LaneInvasion,
        }
    }

    /// Record count for array-shaped measurements, `None` for scalar ones.
    pub fn record_count(&self) -> Option<usize> {
        match self {
            Self::Image(m) => Some(m.len()),
            Self::Lidar(m) => Some(m.len()),
            Self::Radar(m) => Some(m.len()),
            Self::Dvs(m) => Some(m.len()),
            _ => None,
        }
    }
}

impl Measurement for SensorData {
    fn header(&self) -> &SensorHeader {
        match self {
            Self::Image(m) => m.header(),
            Self::Lidar(m) => m.header(),
            Self::Radar(m) => m.header(),
            Self::Dvs(m) => m.header(),
            Self::Gnss(m) => m.header(),
            Self::Imu(m) => m.header(),
            Self::Collision(m) => m.header(),
            Self::ObstacleDetection(m) => m.header(),
            Self::LaneInvasion(m) => m.header(),
        }
    }
}

impl fmt::Display for SensorData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(m) => fmt::Display::fmt(m, f),
            Self::Lidar(m) => fmt::Display::fmt(m, f),
            Self::Radar(m) => fmt::Display::fmt(m, f),
            Self::Dvs(m) => fmt::Display::fmt(m, f),
            Self::Gnss(m) => fmt::Display::fmt(m, f),
            Self::Imu(m) => fmt::Display::fmt(m, f),
            Self::Collision(m) => fmt::Display::fmt(m, f),
            Self::ObstacleDetection(m) => fmt::Display::fmt(m, f),
            Self::LaneInvasion(m) => fmt::Display::fmt(m, f),
        }
    }
}
