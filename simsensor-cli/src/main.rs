//! Simulator sensor message CLI.
//!
//! Decodes serialized sensor messages, prints a summary line per message and
//! optionally exports images, point clouds and DVS events to disk.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use simsensor_core::{
    deserialize_bytes, output, ColorConverter, FieldOrder, ImageCodec, PixelView, PlyWriter,
    PngWriter, SensorData,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Decoder for serialized simulator sensor messages.
///
/// Each input file holds one message: the sensor header followed by its
/// payload, as emitted by the simulator.
#[derive(Parser, Debug)]
#[command(name = "simsensor")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serialized sensor message files
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Color converter applied before image export.
    ///
    /// One of: raw, depth, logarithmic-depth, cityscapes-palette
    #[arg(short, long, default_value = "raw")]
    convert: String,

    /// Write camera images as PNG to this path
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Write lidar point clouds as PLY to this path
    #[arg(long, value_name = "PATH")]
    points: Option<PathBuf>,

    /// Write DVS events as CSV to this path
    #[arg(long, value_name = "PATH")]
    events: Option<PathBuf>,

    /// Write the rasterized DVS frame as PNG to this path
    #[arg(long, value_name = "PATH")]
    events_image: Option<PathBuf>,

    /// Field order for the events CSV.
    ///
    /// Format: comma-separated field names (x, y, p, t)
    ///
    /// Examples:
    /// - "x,y,p,t" (default)
    /// - "t,x,y,p" (timestamp first)
    #[arg(short, long, default_value = "x,y,p,t")]
    format: String,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Log decoding details (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

/// Export destinations and options shared by every input.
struct Exports {
    converter: ColorConverter,
    field_order: FieldOrder,
    image: Option<PathBuf>,
    points: Option<PathBuf>,
    events: Option<PathBuf>,
    events_image: Option<PathBuf>,
    /// Several inputs write to the same destinations, so each file name gets
    /// the input's stem appended.
    per_input: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let converter = ColorConverter::from_str(&args.convert)
        .context("Invalid color converter. Use raw, depth, logarithmic-depth or cityscapes-palette")?;
    let field_order = FieldOrder::from_str(&args.format)
        .context("Invalid field format. Use comma-separated: x,y,p,t")?;

    check_extension(args.image.as_deref(), "--image", "png")?;
    check_extension(args.events_image.as_deref(), "--events-image", "png")?;
    check_extension(args.points.as_deref(), "--points", "ply")?;
    check_extension(args.events.as_deref(), "--events", "csv")?;

    let exports = Exports {
        converter,
        field_order,
        image: args.image,
        points: args.points,
        events: args.events,
        events_image: args.events_image,
        per_input: args.inputs.len() > 1,
    };

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
                .context("Invalid progress template")?,
        );
        pb
    };

    let start_time = Instant::now();
    let mut written = 0usize;

    for input in &args.inputs {
        progress.set_message(format!("{:?}", input.file_name().unwrap_or_default()));

        let bytes = std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
        let data = deserialize_bytes(bytes)
            .with_context(|| format!("Failed to decode {:?}", input))?;

        progress.suspend(|| println!("{data}"));
        written += export(&data, input, &exports)
            .with_context(|| format!("Failed to export {:?}", input))?;

        progress.inc(1);
    }

    progress.finish_with_message(format!(
        "Done! Decoded {} messages, wrote {} files in {:.2}s",
        args.inputs.len(),
        written,
        start_time.elapsed().as_secs_f64()
    ));

    Ok(())
}

/// Runs every export that applies to the decoded modality and returns the
/// number of files written.
fn export(data: &SensorData, input: &Path, exports: &Exports) -> Result<usize> {
    let mut written = 0;
    let target = |base: &PathBuf| output_path(base, input, exports.per_input);

    match data {
        SensorData::Image(image) => {
            if let Some(base) = &exports.image {
                let path = image.save_to_disk(&PngWriter, target(base), exports.converter)?;
                debug!(path = %path.display(), "wrote image");
                written += 1;
            }
        }
        SensorData::Lidar(lidar) => {
            if let Some(base) = &exports.points {
                let path = lidar.save_to_disk(&PlyWriter, target(base))?;
                debug!(path = %path.display(), "wrote point cloud");
                written += 1;
            }
        }
        SensorData::Dvs(events) => {
            if let Some(base) = &exports.events {
                let path = output::write_events_csv(
                    target(base),
                    events.iter(),
                    Some((events.width(), events.height())),
                    exports.field_order,
                )?;
                debug!(path = %path.display(), events = events.len(), "wrote events");
                written += 1;
            }
            if let Some(base) = &exports.events_image {
                let frame = simsensor_core::record::pack(&events.to_image()?);
                let view = PixelView::new(events.width(), events.height(), &frame);
                let path = PngWriter.write_image(&target(base), view)?;
                debug!(path = %path.display(), "wrote event frame");
                written += 1;
            }
        }
        _ => {}
    }

    if written == 0 && wants_export(exports) {
        warn!(sensor = data.tag().name(), input = %input.display(), "no export applies to this sensor");
    }
    Ok(written)
}

/// Rejects an output path whose extension names a different format.
///
/// Paths without an extension are accepted; the writer appends `expected`.
fn check_extension(path: Option<&Path>, flag: &str, expected: &str) -> Result<()> {
    let Some(ext) = path.and_then(Path::extension) else {
        return Ok(());
    };
    if !ext.eq_ignore_ascii_case(expected) {
        bail!(
            "Unsupported output format for {}: .{}. Use .{}",
            flag,
            ext.to_string_lossy(),
            expected
        );
    }
    Ok(())
}

fn wants_export(exports: &Exports) -> bool {
    exports.image.is_some()
        || exports.points.is_some()
        || exports.events.is_some()
        || exports.events_image.is_some()
}

/// `frame.png` + `msg_0042.bin` becomes `frame_msg_0042.png` when several
/// inputs share one destination.
fn output_path(base: &Path, input: &Path, per_input: bool) -> PathBuf {
    if !per_input {
        return base.to_path_buf();
    }
    let stem = base.file_stem().unwrap_or_default().to_string_lossy();
    let input_stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let mut name = format!("{stem}_{input_stem}");
    if let Some(ext) = base.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    base.with_file_name(name)
}
