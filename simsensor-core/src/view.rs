//! Zero-copy record array views.
//!
//! A [`RecordArray`] owns a [`RawBuffer`] and overlays its payload as a
//! sequence of fixed-size records. Records are decoded on access and encoded
//! in place on `set`, so the payload is never copied into a separate vector.

use crate::error::{Result, SensorError};
use crate::header::SensorHeader;
use crate::raw::RawBuffer;
use crate::record::Record;
use crate::types::Transform;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::slice::ChunksExact;

/// Accessors shared by every typed measurement.
pub trait Measurement {
    fn header(&self) -> &SensorHeader;

    #[inline]
    fn frame(&self) -> u64 {
        self.header().frame
    }

    #[inline]
    fn timestamp(&self) -> f64 {
        self.header().timestamp
    }

    #[inline]
    fn transform(&self) -> Transform {
        self.header().transform
    }
}

/// An array-shaped payload of `R` records.
#[derive(Debug)]
pub struct RecordArray<R: Record> {
    raw: RawBuffer,
    _record: PhantomData<R>,
}

impl<R: Record> RecordArray<R> {
    /// Wraps a buffer, checking that the payload is a whole number of records.
    pub(crate) fn new(raw: RawBuffer, modality: &'static str) -> Result<Self> {
        let payload_len = raw.payload().len();
        if payload_len % R::SIZE != 0 {
            return Err(SensorError::SizeMismatch {
                modality,
                payload_len,
                record_size: R::SIZE,
            });
        }
        Ok(Self {
            raw,
            _record: PhantomData,
        })
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.payload().len() / R::SIZE
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn check(&self, index: usize) -> Result<()> {
        let len = self.len();
        if index >= len {
            return Err(SensorError::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    /// Returns the record at `index`.
    pub fn at(&self, index: usize) -> Result<R> {
        self.check(index)?;
        let start = index * R::SIZE;
        Ok(R::read(&self.raw.payload()[start..start + R::SIZE]))
    }

    /// Overwrites the record at `index` in place.
    pub fn set(&mut self, index: usize, record: R) -> Result<()> {
        self.check(index)?;
        let start = index * R::SIZE;
        record.write(&mut self.raw.payload_mut()[start..start + R::SIZE]);
        Ok(())
    }

    /// Iterates over the records in storage order.
    ///
    /// Each call starts a fresh pass from index 0.
    pub fn iter(&self) -> RecordIter<'_, R> {
        RecordIter {
            chunks: self.raw.payload().chunks_exact(R::SIZE),
            _record: PhantomData,
        }
    }

    /// Borrows the packed payload without copying.
    ///
    /// The borrow keeps the view alive and blocks in-place mutation until it
    /// is released.
    #[inline]
    pub fn raw_data(&self) -> &[u8] {
        self.raw.payload()
    }

    #[inline]
    pub(crate) fn raw_data_mut(&mut self) -> &mut [u8] {
        self.raw.payload_mut()
    }

    /// Gives the underlying message back.
    pub fn into_raw(self) -> RawBuffer {
        self.raw
    }
}

impl<R: Record> Measurement for RecordArray<R> {
    #[inline]
    fn header(&self) -> &SensorHeader {
        self.raw.header()
    }
}

impl<'a, R: Record> IntoIterator for &'a RecordArray<R> {
    type Item = R;
    type IntoIter = RecordIter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator decoding one record per step.
#[derive(Debug, Clone)]
pub struct RecordIter<'a, R> {
    chunks: ChunksExact<'a, u8>,
    _record: PhantomData<R>,
}

impl<R: Record> Iterator for RecordIter<'_, R> {
    type Item = R;

    #[inline]
    fn next(&mut self) -> Option<R> {
        self.chunks.next().map(R::read)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl<R: Record> DoubleEndedIterator for RecordIter<'_, R> {
    #[inline]
    fn next_back(&mut self) -> Option<R> {
        self.chunks.next_back().map(R::read)
    }
}

impl<R: Record> ExactSizeIterator for RecordIter<'_, R> {}

impl<R: Record> FusedIterator for RecordIter<'_, R> {}
