//! Export encoders.
//!
//! Structured conversions from typed measurements into flat arrays, a
//! rasterized event frame, or an external image / point cloud codec.

use crate::color::ColorConverter;
use crate::error::{Result, SensorError};
use crate::measurement::{DvsEventArray, Image, LidarMeasurement};
use crate::output::ExportError;
use crate::types::{Color, Location};
use crate::view::Measurement;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Borrowed packed BGRA pixels with their geometry.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    pub width: u32,
    pub height: u32,
    pub bgra: &'a [u8],
}

impl<'a> PixelView<'a> {
    pub fn new(width: u32, height: u32, bgra: &'a [u8]) -> Self {
        Self {
            width,
            height,
            bgra,
        }
    }
}

/// Writes an image to disk and returns the path actually written.
pub trait ImageCodec {
    fn write_image(&self, path: &Path, view: PixelView<'_>) -> std::result::Result<PathBuf, ExportError>;
}

/// Writes a point cloud to disk and returns the path actually written.
pub trait PointCloudCodec {
    fn write_points<I>(&self, path: &Path, points: I) -> std::result::Result<PathBuf, ExportError>
    where
        I: ExactSizeIterator<Item = Location>;
}

impl Image {
    /// Borrows the pixels for a codec.
    pub fn pixel_view(&self) -> PixelView<'_> {
        PixelView::new(self.width(), self.height(), self.raw_data())
    }

    /// Saves the image through `codec`, converting first if requested.
    ///
    /// A conversion is materialized into a new buffer, so the image stays
    /// usable afterwards.
    pub fn save_to_disk<C: ImageCodec>(
        &self,
        codec: &C,
        path: impl AsRef<Path>,
        converter: ColorConverter,
    ) -> std::result::Result<PathBuf, ExportError> {
        let path = path.as_ref();
        trace!(frame = self.frame(), %converter, path = %path.display(), "saving image");
        if converter == ColorConverter::Raw || converter == self.converter() {
            return codec.write_image(path, self.pixel_view());
        }
        let converted = self.converted(converter)?;
        codec.write_image(path, converted.pixel_view())
    }
}

impl LidarMeasurement {
    /// Saves the point cloud through `codec`.
    pub fn save_to_disk<C: PointCloudCodec>(
        &self,
        codec: &C,
        path: impl AsRef<Path>,
    ) -> std::result::Result<PathBuf, ExportError> {
        let path = path.as_ref();
        trace!(frame = self.frame(), points = self.len(), path = %path.display(), "saving point cloud");
        codec.write_points(path, self.iter())
    }
}

impl DvsEventArray {
    /// Rasterizes the events into a `width * height` frame.
    ///
    /// Pixels start zeroed. A positive event sets the blue channel to 255 and
    /// a negative one the red channel; the other channels of the pixel are
    /// left as they are, so opposite events on one pixel add up to magenta.
    ///
    /// A geometry too large to allocate fails with `FrameTooLarge`.
    pub fn to_image(&self) -> Result<Vec<Color>> {
        let too_large = SensorError::FrameTooLarge {
            width: self.width(),
            height: self.height(),
        };
        let (width, height) = (self.width() as usize, self.height() as usize);
        let pixels = width.checked_mul(height).ok_or_else(|| too_large.clone())?;
        let mut image = Vec::new();
        image.try_reserve_exact(pixels).map_err(|_| too_large)?;
        image.resize(pixels, Color::default());
        for event in self.iter() {
            let (x, y) = (event.x as usize, event.y as usize);
            if x >= width || y >= height {
                return Err(SensorError::IndexOutOfRange {
                    index: width * y + x,
                    len: image.len(),
                });
            }
            let pixel = &mut image[width * y + x];
            if event.pol {
                pixel.b = 255;
            } else {
                pixel.r = 255;
            }
        }
        Ok(image)
    }

    /// One `[x, y, t, pol]` row per event, polarity as 0 / 1.
    pub fn to_array(&self) -> Vec<[i64; 4]> {
        self.iter()
            .map(|e| [e.x as i64, e.y as i64, e.t, e.pol as i64])
            .collect()
    }

    pub fn to_array_x(&self) -> Vec<i64> {
        self.iter().map(|e| e.x as i64).collect()
    }

    pub fn to_array_y(&self) -> Vec<i64> {
        self.iter().map(|e| e.y as i64).collect()
    }

    pub fn to_array_t(&self) -> Vec<i64> {
        self.iter().map(|e| e.t).collect()
    }

    /// Polarity per event as +1 / -1.
    ///
    /// Note this differs from the 0 / 1 encoding used by [`Self::to_array`].
    pub fn to_array_pol(&self) -> Vec<i16> {
        self.iter().map(|e| if e.pol { 1 } else { -1 }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::SensorHeader;
    use crate::raw::RawBuffer;
    use crate::types::{DvsEvent, SensorTag, Transform};
    use std::cell::RefCell;

    fn events(width: u32, height: u32, events: &[DvsEvent]) -> DvsEventArray {
        let header = SensorHeader::new(SensorTag::Dvs, 1, 0.0, Transform::default())
            .with_camera(width, height, 90.0);
        DvsEventArray::from_raw(RawBuffer::from_records(header, events)).unwrap()
    }

    fn opposite_pair() -> DvsEventArray {
        events(
            2,
            1,
            &[DvsEvent::new(1, 0, 100, true), DvsEvent::new(1, 0, 105, false)],
        )
    }

    #[test]
    fn test_rasterize_combines_channels() {
        let image = opposite_pair().to_image().unwrap();
        assert_eq!(image.len(), 2);
        assert_eq!(image[0], Color::default());
        // both events hit pixel 1; the second only touches red
        assert_eq!(image[1].b, 255);
        assert_eq!(image[1].r, 255);
        assert_eq!(image[1].g, 0);
        assert_eq!(image[1].a, 0);
    }

    #[test]
    fn test_rasterize_out_of_range() {
        let array = events(2, 2, &[DvsEvent::new(0, 0, 1, true), DvsEvent::new(2, 0, 2, true)]);
        assert!(matches!(
            array.to_image(),
            Err(SensorError::IndexOutOfRange { .. })
        ));
        let array = events(2, 2, &[DvsEvent::new(0, 2, 1, false)]);
        assert!(array.to_image().is_err());
    }

    #[test]
    fn test_rasterize_unallocatable_geometry() {
        let array = events(u32::MAX, u32::MAX, &[DvsEvent::new(0, 0, 1, true)]);
        assert_eq!(
            array.to_image().unwrap_err(),
            SensorError::FrameTooLarge {
                width: u32::MAX,
                height: u32::MAX
            }
        );
    }

    #[test]
    fn test_polarity_encodings_differ() {
        let array = opposite_pair();
        assert_eq!(array.to_array(), vec![[1, 0, 100, 1], [1, 0, 105, 0]]);
        assert_eq!(array.to_array_pol(), vec![1, -1]);
    }

    #[test]
    fn test_field_projections() {
        let array = events(
            8,
            8,
            &[
                DvsEvent::new(3, 4, -7, true),
                DvsEvent::new(5, 6, 9, false),
                DvsEvent::new(7, 0, 11, true),
            ],
        );
        assert_eq!(array.to_array_x(), vec![3, 5, 7]);
        assert_eq!(array.to_array_y(), vec![4, 6, 0]);
        assert_eq!(array.to_array_t(), vec![-7, 9, 11]);
    }

    #[test]
    fn test_empty_array_exports() {
        let array = events(4, 3, &[]);
        assert_eq!(array.to_image().unwrap(), vec![Color::default(); 12]);
        assert!(array.to_array().is_empty());
        assert!(array.to_array_pol().is_empty());
    }

    #[derive(Default)]
    struct Recorder {
        images: RefCell<Vec<(u32, u32, Vec<u8>)>>,
        points: RefCell<Vec<Location>>,
    }

    impl ImageCodec for Recorder {
        fn write_image(&self, path: &Path, view: PixelView<'_>) -> std::result::Result<PathBuf, ExportError> {
            self.images
                .borrow_mut()
                .push((view.width, view.height, view.bgra.to_vec()));
            Ok(path.to_path_buf())
        }
    }

    impl PointCloudCodec for Recorder {
        fn write_points<I>(&self, path: &Path, points: I) -> std::result::Result<PathBuf, ExportError>
        where
            I: ExactSizeIterator<Item = Location>,
        {
            self.points.borrow_mut().extend(points);
            Ok(path.to_path_buf())
        }
    }

    #[test]
    fn test_image_save_materializes_conversion() {
        let header = SensorHeader::new(SensorTag::Image, 1, 0.0, Transform::default())
            .with_camera(1, 1, 90.0);
        let image = Image::from_raw(RawBuffer::from_records(header, &[Color::new(7, 0, 0, 255)])).unwrap();
        let codec = Recorder::default();

        let written = image
            .save_to_disk(&codec, "out.png", ColorConverter::CityScapesPalette)
            .unwrap();
        assert_eq!(written, PathBuf::from("out.png"));
        image.save_to_disk(&codec, "raw.png", ColorConverter::Raw).unwrap();

        let images = codec.images.borrow();
        assert_eq!(images[0], (1, 1, vec![128, 64, 128, 255]));
        assert_eq!(images[1], (1, 1, vec![0, 0, 7, 255]));
        assert_eq!(image.at(0).unwrap(), Color::new(7, 0, 0, 255));
    }

    #[test]
    fn test_lidar_save_hands_points_in_order() {
        let header = SensorHeader::new(SensorTag::Lidar, 1, 0.0, Transform::default())
            .with_lidar(0.0, vec![2]);
        let points = [Location::new(1.0, 2.0, 3.0), Location::new(4.0, 5.0, 6.0)];
        let lidar = LidarMeasurement::from_raw(RawBuffer::from_records(header, &points)).unwrap();
        let codec = Recorder::default();
        lidar.save_to_disk(&codec, "cloud.ply").unwrap();
        assert_eq!(codec.points.borrow().as_slice(), &points);
    }
}
