//! Core types for simulator sensor messages.
//!
//! This module defines the sensor tag discriminant, the geometric types found
//! in every header, and the fixed-size records stored in array-shaped payloads.

use std::fmt;

/// Modality discriminant carried in the first byte of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorTag {
    /// Camera image, BGRA pixels (0)
    Image = 0,
    /// Lidar point cloud (1)
    Lidar = 1,
    /// Radar detections (2)
    Radar = 2,
    /// Dynamic vision sensor events (3)
    Dvs = 3,
    /// GNSS fix (4)
    Gnss = 4,
    /// Inertial measurement (5)
    Imu = 5,
    /// Collision event (6)
    Collision = 6,
    /// Obstacle detection event (7)
    ObstacleDetection = 7,
    /// Lane invasion event (8)
    LaneInvasion = 8,
}

impl SensorTag {
    /// Attempts to parse a sensor tag from its wire value.
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Image),
            1 => Some(Self::Lidar),
            2 => Some(Self::Radar),
            3 => Some(Self::Dvs),
            4 => Some(Self::Gnss),
            5 => Some(Self::Imu),
            6 => Some(Self::Collision),
            7 => Some(Self::ObstacleDetection),
            8 => Some(Self::LaneInvasion),
            _ => None,
        }
    }

    /// Name of the measurement type produced for this tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Lidar => "LidarMeasurement",
            Self::Radar => "RadarMeasurement",
            Self::Dvs => "DVSEventArray",
            Self::Gnss => "GnssMeasurement",
            Self::Imu => "IMUMeasurement",
            Self::Collision => "CollisionEvent",
            Self::ObstacleDetection => "ObstacleDetectionEvent",
            Self::LaneInvasion => "LaneInvasionEvent",
        }
    }
}

/// Simulator actor identifier.
pub type ActorId = u32;

/// A point in world or sensor space, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Location {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Euler rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotation {
    #[inline]
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// Sensor-to-world transform stored in every message header.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub location: Location,
    pub rotation: Rotation,
}

impl Transform {
    #[inline]
    pub fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }
}

/// Generic three component vector (accelerations, angular rates, impulses).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3D {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vector3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector3D(x={:.6}, y={:.6}, z={:.6})", self.x, self.y, self.z)
    }
}

/// A BGRA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Color {
    #[inline]
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }
}

/// A single brightness change reported by a dynamic vision sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DvsEvent {
    /// Pixel column
    pub x: u16,
    /// Pixel row
    pub y: u16,
    /// Timestamp in simulator ticks
    pub t: i64,
    /// `true` for a brightness increase
    pub pol: bool,
}

impl DvsEvent {
    #[inline]
    pub fn new(x: u16, y: u16, t: i64, pol: bool) -> Self {
        Self { x, y, t, pol }
    }
}

impl fmt::Display for DvsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({},{},{},{})", self.x, self.y, self.t, self.pol as u8)
    }
}

/// One radar return.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RadarDetection {
    /// Radial velocity towards the sensor, m/s
    pub velocity: f32,
    /// Azimuth angle, radians
    pub azimuth: f32,
    /// Altitude angle, radians
    pub altitude: f32,
    /// Distance, meters
    pub depth: f32,
}

impl RadarDetection {
    #[inline]
    pub fn new(velocity: f32, azimuth: f32, altitude: f32, depth: f32) -> Self {
        Self {
            velocity,
            azimuth,
            altitude,
            depth,
        }
    }
}

impl fmt::Display for RadarDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RadarDetection(velocity={:.6}, azimuth={:.6}, altitude={:.6}, depth={:.6})",
            self.velocity, self.azimuth, self.altitude, self.depth
        )
    }
}

/// A lane marking crossed during a lane invasion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LaneMarking {
    /// Marking kind (broken, solid, ...) as reported by the simulator
    pub kind: u8,
    /// Marking color id
    pub color: u8,
    /// Allowed lane change bitmask
    pub lane_change: u8,
    /// Marking width in meters
    pub width: f32,
}
