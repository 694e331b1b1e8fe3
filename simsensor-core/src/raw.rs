//! Owned raw sensor messages.

use crate::error::Result;
use crate::header::{self, SensorHeader};
use crate::record::{self, Record};

/// One complete sensor message: the wire bytes plus their decoded header.
///
/// A `RawBuffer` has a single owner. Dispatch moves it into the typed view,
/// after which it is only reachable through that view.
#[derive(Debug)]
pub struct RawBuffer {
    data: Vec<u8>,
    header: SensorHeader,
    payload_offset: usize,
}

impl RawBuffer {
    /// Takes ownership of a received message and decodes its header.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let (header, payload_offset) = header::decode(&data)?;
        Ok(Self {
            data,
            header,
            payload_offset,
        })
    }

    /// Serializes a message from a header and an already packed payload.
    pub fn new(header: SensorHeader, payload: &[u8]) -> Self {
        let mut data = Vec::with_capacity(header.encoded_len() + payload.len());
        header::encode(&header, &mut data);
        let payload_offset = data.len();
        data.extend_from_slice(payload);
        Self {
            data,
            header,
            payload_offset,
        }
    }

    /// Serializes a message whose payload is an array of records.
    pub fn from_records<R: Record>(header: SensorHeader, records: &[R]) -> Self {
        Self::new(header, &record::pack(records))
    }

    #[inline]
    pub fn header(&self) -> &SensorHeader {
        &self.header
    }

    /// Payload bytes following the header.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[self.payload_offset..]
    }

    #[inline]
    pub(crate) fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.payload_offset..]
    }

    /// The complete wire message, header included.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, SensorTag, Transform};

    #[test]
    fn test_wire_bytes_round_trip() {
        let header = SensorHeader::new(SensorTag::Image, 7, 1.25, Transform::default())
            .with_camera(2, 1, 90.0);
        let pixels = [Color::new(1, 2, 3, 4), Color::new(5, 6, 7, 8)];
        let raw = RawBuffer::from_records(header.clone(), &pixels);
        assert_eq!(raw.payload(), &[3, 2, 1, 4, 7, 6, 5, 8]);

        let received = RawBuffer::from_bytes(raw.into_bytes()).unwrap();
        assert_eq!(received.header(), &header);
        assert_eq!(received.payload().len(), 8);
    }

    #[test]
    fn test_as_bytes_is_header_then_payload() {
        let header = SensorHeader::new(SensorTag::Radar, 9, 0.5, Transform::default());
        let raw = RawBuffer::new(header.clone(), &[1, 2, 3]);
        let bytes = raw.as_bytes();
        assert_eq!(bytes.len(), header.encoded_len() + 3);
        assert_eq!(bytes[0], SensorTag::Radar as u8);
        assert_eq!(&bytes[header.encoded_len()..], raw.payload());
    }
}
