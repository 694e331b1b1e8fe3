//! Fixed-size record codecs.
//!
//! Every record stored in an array-shaped payload is packed little-endian with
//! no padding. Records are decoded field by field so the layout never depends
//! on the platform's struct layout.

use crate::types::{Color, DvsEvent, LaneMarking, Location, RadarDetection};
use byteorder::{ByteOrder, LittleEndian};

/// A record with a fixed packed size on the wire.
pub trait Record: Copy {
    /// Packed size in bytes.
    const SIZE: usize;

    /// Decodes a record from exactly `SIZE` bytes.
    fn read(buf: &[u8]) -> Self;

    /// Encodes the record into exactly `SIZE` bytes.
    fn write(&self, buf: &mut [u8]);
}

// ============================================================================
// Color
// Bytes: [0] b | [1] g | [2] r | [3] a
// ============================================================================

impl Record for Color {
    const SIZE: usize = 4;

    #[inline]
    fn read(buf: &[u8]) -> Self {
        Self {
            b: buf[0],
            g: buf[1],
            r: buf[2],
            a: buf[3],
        }
    }

    #[inline]
    fn write(&self, buf: &mut [u8]) {
        buf[..4].copy_from_slice(&[self.b, self.g, self.r, self.a]);
    }
}

// ============================================================================
// DVSEvent
// Bytes: [0:2] x u16 | [2:4] y u16 | [4:12] t i64 | [12] pol (0/1)
// ============================================================================

impl Record for DvsEvent {
    const SIZE: usize = 13;

    #[inline]
    fn read(buf: &[u8]) -> Self {
        Self {
            x: LittleEndian::read_u16(&buf[0..2]),
            y: LittleEndian::read_u16(&buf[2..4]),
            t: LittleEndian::read_i64(&buf[4..12]),
            pol: buf[12] != 0,
        }
    }

    #[inline]
    fn write(&self, buf: &mut [u8]) {
        LittleEndian::write_u16(&mut buf[0..2], self.x);
        LittleEndian::write_u16(&mut buf[2..4], self.y);
        LittleEndian::write_i64(&mut buf[4..12], self.t);
        buf[12] = self.pol as u8;
    }
}

// ============================================================================
// RadarDetection
// Bytes: [0:4] velocity | [4:8] azimuth | [8:12] altitude | [12:16] depth
// ============================================================================

impl Record for RadarDetection {
    const SIZE: usize = 16;

    #[inline]
    fn read(buf: &[u8]) -> Self {
        Self {
            velocity: LittleEndian::read_f32(&buf[0..4]),
            azimuth: LittleEndian::read_f32(&buf[4..8]),
            altitude: LittleEndian::read_f32(&buf[8..12]),
            depth: LittleEndian::read_f32(&buf[12..16]),
        }
    }

    #[inline]
    fn write(&self, buf: &mut [u8]) {
        LittleEndian::write_f32(&mut buf[0..4], self.velocity);
        LittleEndian::write_f32(&mut buf[4..8], self.azimuth);
        LittleEndian::write_f32(&mut buf[8..12], self.altitude);
        LittleEndian::write_f32(&mut buf[12..16], self.depth);
    }
}

// ============================================================================
// Location (lidar point)
// Bytes: [0:4] x | [4:8] y | [8:12] z
// ============================================================================

impl Record for Location {
    const SIZE: usize = 12;

    #[inline]
    fn read(buf: &[u8]) -> Self {
        Self {
            x: LittleEndian::read_f32(&buf[0..4]),
            y: LittleEndian::read_f32(&buf[4..8]),
            z: LittleEndian::read_f32(&buf[8..12]),
        }
    }

    #[inline]
    fn write(&self, buf: &mut [u8]) {
        LittleEndian::write_f32(&mut buf[0..4], self.x);
        LittleEndian::write_f32(&mut buf[4..8], self.y);
        LittleEndian::write_f32(&mut buf[8..12], self.z);
    }
}

// ============================================================================
// LaneMarking
// Bytes: [0] kind | [1] color | [2] lane_change | [3:7] width f32
// ============================================================================

impl Record for LaneMarking {
    const SIZE: usize = 7;

    #[inline]
    fn read(buf: &[u8]) -> Self {
        Self {
            kind: buf[0],
            color: buf[1],
            lane_change: buf[2],
            width: LittleEndian::read_f32(&buf[3..7]),
        }
    }

    #[inline]
    fn write(&self, buf: &mut [u8]) {
        buf[0] = self.kind;
        buf[1] = self.color;
        buf[2] = self.lane_change;
        LittleEndian::write_f32(&mut buf[3..7], self.width);
    }
}

/// Encodes a slice of records into a freshly allocated payload.
pub fn pack<R: Record>(records: &[R]) -> Vec<u8> {
    let mut payload = vec![0u8; records.len() * R::SIZE];
    for (record, chunk) in records.iter().zip(payload.chunks_exact_mut(R::SIZE)) {
        record.write(chunk);
    }
    payload
}
