//! Zero-copy decoder for simulator sensor messages.
//!
//! This crate turns the opaque byte buffers produced by a driving simulator
//! into typed, per-modality measurements without copying the payload, and
//! offers post-hoc transforms on those measurements: color conversion for
//! camera images and structured export for lidar and DVS data.
//!
//! # Example
//!
//! ```no_run
//! use simsensor_core::{deserialize_bytes, ColorConverter, SensorData};
//!
//! let bytes = std::fs::read("frame.bin").unwrap();
//! match deserialize_bytes(bytes).unwrap() {
//!     SensorData::Image(mut image) => {
//!         image.convert(ColorConverter::Depth).unwrap();
//!         println!("{image}");
//!     }
//!     SensorData::Dvs(events) => {
//!         let frame = events.to_image().unwrap();
//!         println!("{events}: {} pixels", frame.len());
//!     }
//!     other => println!("{other}"),
//! }
//! ```
//!
//! # Features
//!
//! - Explicit little-endian header and record codecs, no struct transmutes
//! - Bounds-checked random access and restartable lazy iteration
//! - In-place or materialized color conversion (depth, log depth, CityScapes)
//! - DVS rasterization and flat array export
//! - CSV, PNG and PLY writers

pub mod color;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod header;
pub mod measurement;
pub mod output;
pub mod raw;
pub mod record;
pub mod scalar;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use color::ColorConverter;
pub use dispatch::{deserialize, deserialize_bytes, SensorData};
pub use error::{Result, SensorError};
pub use export::{ImageCodec, PixelView, PointCloudCodec};
pub use header::SensorHeader;
pub use measurement::{DvsEventArray, Image, LidarMeasurement, RadarMeasurement};
pub use output::{ExportError, FieldOrder, PlyWriter, PngWriter};
pub use raw::RawBuffer;
pub use record::Record;
pub use scalar::{
    CollisionEvent, GnssMeasurement, ImuMeasurement, LaneInvasionEvent, ObstacleDetectionEvent,
};
pub use types::{
    ActorId, Color, DvsEvent, LaneMarking, Location, RadarDetection, Rotation, SensorTag,
    Transform, Vector3D,
};
pub use view::{Measurement, RecordArray, RecordIter};
