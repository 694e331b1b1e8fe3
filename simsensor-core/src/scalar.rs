//! Scalar-shaped measurements.
//!
//! These payloads are a small fixed set of fields decoded once when the view
//! is built. The message bytes are released after decoding; only the header
//! is kept.

use crate::error::{Result, SensorError};
use crate::header::SensorHeader;
use crate::raw::RawBuffer;
use crate::record::Record;
use crate::types::{ActorId, LaneMarking, Vector3D};
use crate::view::Measurement;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

fn exact_payload<'a>(raw: &'a RawBuffer, modality: &'static str, size: usize) -> Result<&'a [u8]> {
    let payload = raw.payload();
    if payload.len() != size {
        return Err(SensorError::SizeMismatch {
            modality,
            payload_len: payload.len(),
            record_size: size,
        });
    }
    Ok(payload)
}

fn read_vector(buf: &[u8]) -> Vector3D {
    Vector3D::new(
        LittleEndian::read_f32(&buf[0..4]),
        LittleEndian::read_f32(&buf[4..8]),
        LittleEndian::read_f32(&buf[8..12]),
    )
}

macro_rules! impl_measurement {
    ($($ty:ty),+) => {
        $(
            impl Measurement for $ty {
                #[inline]
                fn header(&self) -> &SensorHeader {
                    &self.header
                }
            }
        )+
    };
}

impl_measurement!(
    GnssMeasurement,
    ImuMeasurement,
    CollisionEvent,
    ObstacleDetectionEvent,
    LaneInvasionEvent
);

// ============================================================================
// GnssMeasurement
// Payload: latitude f64 | longitude f64 | altitude f64
// ============================================================================

/// Geodetic position fix.
#[derive(Debug, Clone, PartialEq)]
pub struct GnssMeasurement {
    header: SensorHeader,
    latitude: f64,
    longitude: f64,
    altitude: f64,
}

impl GnssMeasurement {
    pub const PAYLOAD_SIZE: usize = 24;

    pub(crate) fn from_raw(raw: RawBuffer) -> Result<Self> {
        let p = exact_payload(&raw, "GnssMeasurement", Self::PAYLOAD_SIZE)?;
        Ok(Self {
            latitude: LittleEndian::read_f64(&p[0..8]),
            longitude: LittleEndian::read_f64(&p[8..16]),
            altitude: LittleEndian::read_f64(&p[16..24]),
            header: raw.header().clone(),
        })
    }

    /// Packs the payload for a GNSS message.
    pub fn encode_payload(latitude: f64, longitude: f64, altitude: f64) -> Vec<u8> {
        let mut buf = vec![0u8; Self::PAYLOAD_SIZE];
        LittleEndian::write_f64(&mut buf[0..8], latitude);
        LittleEndian::write_f64(&mut buf[8..16], longitude);
        LittleEndian::write_f64(&mut buf[16..24], altitude);
        buf
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[inline]
    pub fn altitude(&self) -> f64 {
        self.altitude
    }
}

impl fmt::Display for GnssMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GnssMeasurement(frame={}, timestamp={:.6}, lat={:.6}, lon={:.6}, alt={:.6})",
            self.frame(),
            self.timestamp(),
            self.latitude,
            self.longitude,
            self.altitude
        )
    }
}

// ============================================================================
// IMUMeasurement
// Payload: accelerometer 3 x f32 | gyroscope 3 x f32 | compass f32
// ============================================================================

/// Inertial measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ImuMeasurement {
    header: SensorHeader,
    accelerometer: Vector3D,
    gyroscope: Vector3D,
    compass: f32,
}

impl ImuMeasurement {
    pub const PAYLOAD_SIZE: usize = 28;

    pub(crate) fn from_raw(raw: RawBuffer) -> Result<Self> {
        let p = exact_payload(&raw, "IMUMeasurement", Self::PAYLOAD_SIZE)?;
        Ok(Self {
            accelerometer: read_vector(&p[0..12]),
            gyroscope: read_vector(&p[12..24]),
            compass: LittleEndian::read_f32(&p[24..28]),
            header: raw.header().clone(),
        })
    }

    /// Packs the payload for an IMU message.
    pub fn encode_payload(accelerometer: Vector3D, gyroscope: Vector3D, compass: f32) -> Vec<u8> {
        let values = [
            accelerometer.x,
            accelerometer.y,
            accelerometer.z,
            gyroscope.x,
            gyroscope.y,
            gyroscope.z,
            compass,
        ];
        let mut buf = vec![0u8; Self::PAYLOAD_SIZE];
        LittleEndian::write_f32_into(&values, &mut buf);
        buf
    }

    /// Linear acceleration in m/s^2.
    #[inline]
    pub fn accelerometer(&self) -> Vector3D {
        self.accelerometer
    }

    /// Angular velocity in rad/s.
    #[inline]
    pub fn gyroscope(&self) -> Vector3D {
        self.gyroscope
    }

    /// Heading in radians, north is 0.
    #[inline]
    pub fn compass(&self) -> f32 {
        self.compass
    }
}

impl fmt::Display for ImuMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IMUMeasurement(frame={}, timestamp={:.6}, accelerometer={}, gyroscope={}, compass={:.6})",
            self.frame(),
            self.timestamp(),
            self.accelerometer,
            self.gyroscope,
            self.compass
        )
    }
}

// ============================================================================
// CollisionEvent
// Payload: actor u32 | other_actor u32 | normal_impulse 3 x f32
// ============================================================================

/// The sensor's parent actor hit something.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    header: SensorHeader,
    actor: ActorId,
    other_actor: ActorId,
    normal_impulse: Vector3D,
}

impl CollisionEvent {
    pub const PAYLOAD_SIZE: usize = 20;

    pub(crate) fn from_raw(raw: RawBuffer) -> Result<Self> {
        let p = exact_payload(&raw, "CollisionEvent", Self::PAYLOAD_SIZE)?;
        Ok(Self {
            actor: LittleEndian::read_u32(&p[0..4]),
            other_actor: LittleEndian::read_u32(&p[4..8]),
            normal_impulse: read_vector(&p[8..20]),
            header: raw.header().clone(),
        })
    }

    /// Packs the payload for a collision message.
    pub fn encode_payload(actor: ActorId, other_actor: ActorId, normal_impulse: Vector3D) -> Vec<u8> {
        let mut buf = vec![0u8; Self::PAYLOAD_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], actor);
        LittleEndian::write_u32(&mut buf[4..8], other_actor);
        LittleEndian::write_f32_into(
            &[normal_impulse.x, normal_impulse.y, normal_impulse.z],
            &mut buf[8..20],
        );
        buf
    }

    #[inline]
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    #[inline]
    pub fn other_actor(&self) -> ActorId {
        self.other_actor
    }

    /// Impulse of the collision, N*s.
    #[inline]
    pub fn normal_impulse(&self) -> Vector3D {
        self.normal_impulse
    }
}

impl fmt::Display for CollisionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CollisionEvent(frame={}, timestamp={:.6}, other_actor={})",
            self.frame(),
            self.timestamp(),
            self.other_actor
        )
    }
}

// ============================================================================
// ObstacleDetectionEvent
// Payload: actor u32 | other_actor u32 | distance f32
// ============================================================================

/// An obstacle entered the detection volume in front of the parent actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleDetectionEvent {
    header: SensorHeader,
    actor: ActorId,
    other_actor: ActorId,
    distance: f32,
}

impl ObstacleDetectionEvent {
    pub const PAYLOAD_SIZE: usize = 12;

    pub(crate) fn from_raw(raw: RawBuffer) -> Result<Self> {
        let p = exact_payload(&raw, "ObstacleDetectionEvent", Self::PAYLOAD_SIZE)?;
        Ok(Self {
            actor: LittleEndian::read_u32(&p[0..4]),
            other_actor: LittleEndian::read_u32(&p[4..8]),
            distance: LittleEndian::read_f32(&p[8..12]),
            header: raw.header().clone(),
        })
    }

    /// Packs the payload for an obstacle detection message.
    pub fn encode_payload(actor: ActorId, other_actor: ActorId, distance: f32) -> Vec<u8> {
        let mut buf = vec![0u8; Self::PAYLOAD_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], actor);
        LittleEndian::write_u32(&mut buf[4..8], other_actor);
        LittleEndian::write_f32(&mut buf[8..12], distance);
        buf
    }

    #[inline]
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    #[inline]
    pub fn other_actor(&self) -> ActorId {
        self.other_actor
    }

    /// Distance to the obstacle in meters.
    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance
    }
}

impl fmt::Display for ObstacleDetectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ObstacleDetectionEvent(frame={}, timestamp={:.6}, other_actor={})",
            self.frame(),
            self.timestamp(),
            self.other_actor
        )
    }
}

// ============================================================================
// LaneInvasionEvent
// Payload: actor u32 | N x LaneMarking (7 bytes each)
// ============================================================================

/// The parent actor crossed one or more lane markings.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneInvasionEvent {
    header: SensorHeader,
    actor: ActorId,
    crossed_lane_markings: Vec<LaneMarking>,
}

impl LaneInvasionEvent {
    pub(crate) fn from_raw(raw: RawBuffer) -> Result<Self> {
        let payload = raw.payload();
        if payload.len() < 4 || (payload.len() - 4) % LaneMarking::SIZE != 0 {
            return Err(SensorError::SizeMismatch {
                modality: "LaneInvasionEvent",
                payload_len: payload.len(),
                record_size: LaneMarking::SIZE,
            });
        }
        Ok(Self {
            actor: LittleEndian::read_u32(&payload[0..4]),
            crossed_lane_markings: payload[4..]
                .chunks_exact(LaneMarking::SIZE)
                .map(LaneMarking::read)
                .collect(),
            header: raw.header().clone(),
        })
    }

    /// Packs the payload for a lane invasion message.
    pub fn encode_payload(actor: ActorId, markings: &[LaneMarking]) -> Vec<u8> {
        let mut buf = actor.to_le_bytes().to_vec();
        buf.extend_from_slice(&crate::record::pack(markings));
        buf
    }

    #[inline]
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn crossed_lane_markings(&self) -> &[LaneMarking] {
        &self.crossed_lane_markings
    }
}

impl fmt::Display for LaneInvasionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LaneInvasionEvent(frame={}, timestamp={:.6})",
            self.frame(),
            self.timestamp()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SensorTag, Transform};

    fn raw(tag: SensorTag, payload: &[u8]) -> RawBuffer {
        RawBuffer::new(SensorHeader::new(tag, 12, 3.25, Transform::default()), payload)
    }

    #[test]
    fn test_gnss() {
        let payload = GnssMeasurement::encode_payload(48.858844, 2.294351, 35.5);
        let gnss = GnssMeasurement::from_raw(raw(SensorTag::Gnss, &payload)).unwrap();
        assert_eq!(gnss.latitude(), 48.858844);
        assert_eq!(
            gnss.to_string(),
            "GnssMeasurement(frame=12, timestamp=3.250000, lat=48.858844, lon=2.294351, alt=35.500000)"
        );
    }

    #[test]
    fn test_gnss_wrong_size() {
        assert_eq!(
            GnssMeasurement::from_raw(raw(SensorTag::Gnss, &[0u8; 23])).unwrap_err(),
            SensorError::SizeMismatch {
                modality: "GnssMeasurement",
                payload_len: 23,
                record_size: 24
            }
        );
    }

    #[test]
    fn test_imu() {
        let payload = ImuMeasurement::encode_payload(
            Vector3D::new(0.5, 0.0, 9.75),
            Vector3D::new(0.0, -0.25, 0.0),
            1.5,
        );
        let imu = ImuMeasurement::from_raw(raw(SensorTag::Imu, &payload)).unwrap();
        assert_eq!(imu.gyroscope().y, -0.25);
        assert_eq!(
            imu.to_string(),
            "IMUMeasurement(frame=12, timestamp=3.250000, \
             accelerometer=Vector3D(x=0.500000, y=0.000000, z=9.750000), \
             gyroscope=Vector3D(x=0.000000, y=-0.250000, z=0.000000), compass=1.500000)"
        );
    }

    #[test]
    fn test_collision() {
        let payload = CollisionEvent::encode_payload(7, 221, Vector3D::new(100.0, 0.0, -2.0));
        let event = CollisionEvent::from_raw(raw(SensorTag::Collision, &payload)).unwrap();
        assert_eq!(event.actor(), 7);
        assert_eq!(event.normal_impulse().z, -2.0);
        assert_eq!(
            event.to_string(),
            "CollisionEvent(frame=12, timestamp=3.250000, other_actor=221)"
        );
    }

    #[test]
    fn test_obstacle() {
        let payload = ObstacleDetectionEvent::encode_payload(7, 88, 12.5);
        let event =
            ObstacleDetectionEvent::from_raw(raw(SensorTag::ObstacleDetection, &payload)).unwrap();
        assert_eq!(event.distance(), 12.5);
        assert_eq!(
            event.to_string(),
            "ObstacleDetectionEvent(frame=12, timestamp=3.250000, other_actor=88)"
        );
    }

    #[test]
    fn test_lane_invasion() {
        let markings = [
            LaneMarking {
                kind: 1,
                color: 0,
                lane_change: 3,
                width: 0.15,
            },
            LaneMarking {
                kind: 2,
                color: 1,
                lane_change: 0,
                width: 0.3,
            },
        ];
        let payload = LaneInvasionEvent::encode_payload(5, &markings);
        let event = LaneInvasionEvent::from_raw(raw(SensorTag::LaneInvasion, &payload)).unwrap();
        assert_eq!(event.actor(), 5);
        assert_eq!(event.crossed_lane_markings(), &markings);
        assert_eq!(event.to_string(), "LaneInvasionEvent(frame=12, timestamp=3.250000)");

        assert!(matches!(
            LaneInvasionEvent::from_raw(raw(SensorTag::LaneInvasion, &payload[..10])),
            Err(SensorError::SizeMismatch { .. })
        ));
    }
}
