//! Disk writers for exported measurements.
//!
//! Supports CSV for DVS events, PNG for images and ASCII PLY for point clouds.

use crate::error::SensorError;
use crate::export::{ImageCodec, PixelView, PointCloudCodec};
use crate::types::{DvsEvent, Location};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Sensor(#[from] SensorError),
}

/// Field ordering for CSV output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    /// x, y, p, t (default)
    #[default]
    XYPT,
    /// t, x, y, p
    TXYP,
    /// x, y, t, p (same column order as `to_array`)
    XYTP,
    /// Custom order specified by indices
    Custom([usize; 4]),
}

/// Column index of a CSV field name: x=0, y=1, p=2, t=3.
fn column(name: &str) -> Option<usize> {
    match name.to_ascii_lowercase().as_str() {
        "x" => Some(0),
        "y" => Some(1),
        "p" | "polarity" => Some(2),
        "t" => Some(3),
        _ => None,
    }
}

impl std::str::FromStr for FieldOrder {
    type Err = ExportError;

    /// Parses a comma-separated permutation of `x`, `y`, `p` and `t`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let columns = s
            .split(',')
            .map(|name| {
                column(name.trim()).ok_or_else(|| {
                    ExportError::InvalidFormat(format!("unknown column {:?}, use x, y, p, t", name))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let indices: [usize; 4] = columns.try_into().map_err(|c: Vec<usize>| {
            ExportError::InvalidFormat(format!("expected 4 columns, got {}", c.len()))
        })?;
        if (0..4).any(|field| !indices.contains(&field)) {
            return Err(ExportError::InvalidFormat(format!("{:?} repeats a column", s)));
        }

        Ok(match indices {
            [0, 1, 2, 3] => Self::XYPT,
            [3, 0, 1, 2] => Self::TXYP,
            [0, 1, 3, 2] => Self::XYTP,
            _ => Self::Custom(indices),
        })
    }
}

impl FieldOrder {
    fn indices(&self) -> [usize; 4] {
        match self {
            Self::XYPT => [0, 1, 2, 3],
            Self::TXYP => [3, 0, 1, 2],
            Self::XYTP => [0, 1, 3, 2],
            Self::Custom(indices) => *indices,
        }
    }

    /// Returns the CSV header line for this field order.
    pub fn header(&self) -> String {
        const NAMES: [&str; 4] = ["x", "y", "polarity", "t"];
        self.indices().map(|i| NAMES[i]).join(",")
    }
}

/// CSV writer for DVS events.
pub struct CsvWriter<W: Write> {
    writer: BufWriter<W>,
    field_order: FieldOrder,
}

impl<W: Write> CsvWriter<W> {
    /// Creates a new CSV writer.
    pub fn new(writer: W, field_order: FieldOrder) -> Self {
        Self {
            writer: BufWriter::new(writer),
            field_order,
        }
    }

    /// Writes the geometry comment and the column header.
    pub fn write_header(&mut self, geometry: Option<(u32, u32)>) -> Result<(), ExportError> {
        if let Some((width, height)) = geometry {
            writeln!(self.writer, "%geometry:{},{}", width, height)?;
        }
        writeln!(self.writer, "{}", self.field_order.header())?;
        Ok(())
    }

    /// Writes a batch of events.
    pub fn write_events<I>(&mut self, events: I) -> Result<(), ExportError>
    where
        I: IntoIterator<Item = DvsEvent>,
    {
        for event in events {
            self.write_event(&event)?;
        }
        Ok(())
    }

    /// Writes a single event, polarity as 0 / 1.
    #[inline]
    fn write_event(&mut self, event: &DvsEvent) -> Result<(), ExportError> {
        let values = [event.x as i64, event.y as i64, event.pol as i64, event.t];
        let [a, b, c, d] = self.field_order.indices();
        writeln!(
            self.writer,
            "{},{},{},{}",
            values[a], values[b], values[c], values[d]
        )?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), ExportError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Creates missing parent directories and appends `extension` when the path
/// has none.
pub fn validate_file_path(path: &Path, extension: &str) -> Result<PathBuf, ExportError> {
    let mut path = path.to_path_buf();
    if path.extension().is_none() {
        path.set_extension(extension);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(path)
}

/// Writes DVS events to a CSV file.
pub fn write_events_csv<P, I>(
    path: P,
    events: I,
    geometry: Option<(u32, u32)>,
    field_order: FieldOrder,
) -> Result<PathBuf, ExportError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = DvsEvent>,
{
    let path = validate_file_path(path.as_ref(), "csv")?;
    let file = File::create(&path)?;
    let mut writer = CsvWriter::new(file, field_order);
    writer.write_header(geometry)?;
    writer.write_events(events)?;
    writer.flush()?;
    Ok(path)
}

/// PNG image codec.
///
/// The alpha channel is dropped; rasterized event frames leave it at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngWriter;

impl ImageCodec for PngWriter {
    fn write_image(&self, path: &Path, view: PixelView<'_>) -> Result<PathBuf, ExportError> {
        let expected = (view.width as usize)
            .checked_mul(view.height as usize)
            .and_then(|pixels| pixels.checked_mul(4));
        if expected != Some(view.bgra.len()) {
            return Err(ExportError::InvalidFormat(format!(
                "{}x{} image does not match {} bytes of pixels",
                view.width,
                view.height,
                view.bgra.len()
            )));
        }
        let rgb: Vec<u8> = view
            .bgra
            .chunks_exact(4)
            .flat_map(|p| [p[2], p[1], p[0]])
            .collect();
        let image = image::RgbImage::from_raw(view.width, view.height, rgb)
            .ok_or_else(|| ExportError::InvalidFormat("pixel buffer too small".to_string()))?;

        let path = validate_file_path(path, "png")?;
        image.save_with_format(&path, image::ImageFormat::Png)?;
        Ok(path)
    }
}

/// ASCII PLY point cloud codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlyWriter;

impl PointCloudCodec for PlyWriter {
    fn write_points<I>(&self, path: &Path, points: I) -> Result<PathBuf, ExportError>
    where
        I: ExactSizeIterator<Item = Location>,
    {
        let path = validate_file_path(path, "ply")?;
        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "ply")?;
        writeln!(writer, "format ascii 1.0")?;
        writeln!(writer, "element vertex {}", points.len())?;
        writeln!(writer, "property float32 x")?;
        writeln!(writer, "property float32 y")?;
        writeln!(writer, "property float32 z")?;
        writeln!(writer, "end_header")?;
        for p in points {
            writeln!(writer, "{:.4} {:.4} {:.4}", p.x, p.y, p.z)?;
        }
        writer.flush()?;
        Ok(path)
    }
}
