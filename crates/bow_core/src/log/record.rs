//! Log record types and serialization.

use crate::error::{CoreError, CoreResult};
use crate::types::{BucketId, SequenceNumber};

/// Magic bytes identifying a log record.
pub const RECORD_MAGIC: [u8; 4] = *b"BREC";

/// Current record format version.
pub const RECORD_VERSION: u16 = 1;

/// Size of the checksum fields.
pub const CRC_SIZE: usize = 4;

/// Size of the header fields covered by the header checksum: magic,
/// version, type and payload length.
pub const HEADER_FIELDS_SIZE: usize = 4 + 2 + 1 + 4;

/// Size of the record header, including its own checksum.
///
/// The payload length is only trusted once this checksum matches, so a
/// damaged length can't pass for a record cut short by the end of file.
pub const HEADER_SIZE: usize = HEADER_FIELDS_SIZE + CRC_SIZE;

/// Type of log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    /// A bucket was created.
    CreateBucket = 1,
    /// A key was written.
    Put = 2,
    /// A key was removed.
    Delete = 3,
    /// The preceding records form a committed transaction.
    Commit = 4,
}

impl RecordType {
    /// Converts a byte to a record type.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::CreateBucket),
            2 => Some(Self::Put),
            3 => Some(Self::Delete),
            4 => Some(Self::Commit),
            _ => None,
        }
    }

    /// Converts the record type to a byte.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A record in the store log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LogRecord {
    /// Registers a bucket name under an ID.
    CreateBucket {
        /// ID assigned to the bucket.
        bucket: BucketId,
        /// Bucket name.
        name: String,
    },

    /// Stores a value under a key.
    Put {
        /// Target bucket.
        bucket: BucketId,
        /// Encoded key.
        key: Vec<u8>,
        /// Encoded record.
        value: Vec<u8>,
    },

    /// Removes a key.
    Delete {
        /// Target bucket.
        bucket: BucketId,
        /// Encoded key.
        key: Vec<u8>,
    },

    /// Ends a transaction.
    Commit {
        /// Sequence number assigned to this commit.
        sequence: SequenceNumber,
    },
}

impl LogRecord {
    /// Maximum length of a key or value in a record.
    pub const MAX_FIELD_SIZE: usize = u32::MAX as usize;

    /// Maximum length of a bucket name.
    pub const MAX_NAME_SIZE: usize = u16::MAX as usize;

    /// Returns the record type.
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::CreateBucket { .. } => RecordType::CreateBucket,
            Self::Put { .. } => RecordType::Put,
            Self::Delete { .. } => RecordType::Delete,
            Self::Commit { .. } => RecordType::Commit,
        }
    }

    /// Offset of the value bytes from the start of an encoded `Put`
    /// record whose key is `key_len` bytes long.
    pub const fn put_value_offset(key_len: usize) -> usize {
        HEADER_SIZE + 4 + 4 + key_len + 4
    }

    /// Serializes the record with its envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if a key, value or name is too long for its
    /// length field.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let payload = self.encode_payload()?;
        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
        buf.extend_from_slice(&RECORD_MAGIC);
        buf.extend_from_slice(&RECORD_VERSION.to_le_bytes());
        buf.push(self.record_type().as_byte());
        let len = u32::try_from(payload.len()).map_err(|_| {
            CoreError::invalid_operation(format!(
                "record payload too large: {} bytes",
                payload.len()
            ))
        })?;
        buf.extend_from_slice(&len.to_le_bytes());
        let header_crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&header_crc.to_le_bytes());
        buf.extend_from_slice(&payload);
        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }

    fn encode_payload(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::new();

        match self {
            Self::CreateBucket { bucket, name } => {
                let len = u16::try_from(name.len()).map_err(|_| {
                    CoreError::invalid_operation(format!(
                        "bucket name too long: {} bytes exceeds maximum of {} bytes",
                        name.len(),
                        Self::MAX_NAME_SIZE
                    ))
                })?;
                buf.extend_from_slice(&bucket.as_u32().to_le_bytes());
                buf.extend_from_slice(&len.to_le_bytes());
                buf.extend_from_slice(name.as_bytes());
            }

            Self::Put { bucket, key, value } => {
                buf.extend_from_slice(&bucket.as_u32().to_le_bytes());
                put_field(&mut buf, "key", key)?;
                put_field(&mut buf, "value", value)?;
            }

            Self::Delete { bucket, key } => {
                buf.extend_from_slice(&bucket.as_u32().to_le_bytes());
                put_field(&mut buf, "key", key)?;
            }

            Self::Commit { sequence } => {
                buf.extend_from_slice(&sequence.as_u64().to_le_bytes());
            }
        }

        Ok(buf)
    }

    /// Deserializes a record from its type and payload.
    pub fn decode_payload(record_type: RecordType, payload: &[u8]) -> CoreResult<Self> {
        let mut cursor = PayloadCursor::new(record_type, payload);

        let record = match record_type {
            RecordType::CreateBucket => {
                let bucket = BucketId::new(cursor.read_u32()?);
                let len = usize::from(cursor.read_u16()?);
                let name = String::from_utf8(cursor.read_bytes(len)?.to_vec())
                    .map_err(|_| CoreError::corruption("bucket name is not valid UTF-8"))?;
                Self::CreateBucket { bucket, name }
            }

            RecordType::Put => {
                let bucket = BucketId::new(cursor.read_u32()?);
                let key = cursor.read_field()?;
                let value = cursor.read_field()?;
                Self::Put { bucket, key, value }
            }

            RecordType::Delete => {
                let bucket = BucketId::new(cursor.read_u32()?);
                let key = cursor.read_field()?;
                Self::Delete { bucket, key }
            }

            RecordType::Commit => Self::Commit {
                sequence: SequenceNumber::new(cursor.read_u64()?),
            },
        };

        cursor.finish()?;
        Ok(record)
    }
}

fn put_field(buf: &mut Vec<u8>, what: &str, bytes: &[u8]) -> CoreResult<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        CoreError::invalid_operation(format!(
            "{what} too large: {} bytes exceeds maximum of {} bytes",
            bytes.len(),
            LogRecord::MAX_FIELD_SIZE
        ))
    })?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

struct PayloadCursor<'a> {
    record_type: RecordType,
    payload: &'a [u8],
    pos: usize,
}

impl<'a> PayloadCursor<'a> {
    fn new(record_type: RecordType, payload: &'a [u8]) -> Self {
        Self {
            record_type,
            payload,
            pos: 0,
        }
    }

    fn read_bytes(&mut self, len: usize) -> CoreResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.payload.len())
            .ok_or_else(|| {
                CoreError::corruption(format!(
                    "unexpected end of {:?} payload",
                    self.record_type
                ))
            })?;
        let bytes = &self.payload[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> CoreResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_u16(&mut self) -> CoreResult<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    fn read_u32(&mut self) -> CoreResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> CoreResult<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_field(&mut self) -> CoreResult<Vec<u8>> {
        let len = self.read_u32()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    fn finish(self) -> CoreResult<()> {
        if self.pos != self.payload.len() {
            return Err(CoreError::corruption(format!(
                "trailing bytes in {:?} record: expected {} bytes, got {}",
                self.record_type,
                self.pos,
                self.payload.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> LogRecord {
        let record_type = RecordType::from_byte(bytes[6]).unwrap();
        let payload = &bytes[HEADER_SIZE..bytes.len() - CRC_SIZE];
        LogRecord::decode_payload(record_type, payload).unwrap()
    }

    #[test]
    fn record_type_bytes() {
        for t in [
            RecordType::CreateBucket,
            RecordType::Put,
            RecordType::Delete,
            RecordType::Commit,
        ] {
            assert_eq!(RecordType::from_byte(t.as_byte()), Some(t));
        }
        assert_eq!(RecordType::from_byte(0), None);
    }

    #[test]
    fn put_value_offset_points_at_value() {
        let record = LogRecord::Put {
            bucket: BucketId::new(3),
            key: b"123".to_vec(),
            value: vec![0xCA, 0xFE],
        };
        let bytes = record.encode().unwrap();
        let offset = LogRecord::put_value_offset(3);
        assert_eq!(&bytes[offset..offset + 2], &[0xCA, 0xFE]);
        assert_eq!(decode(&bytes), record);
    }

    #[test]
    fn envelope_checksum_covers_header_and_payload() {
        let bytes = LogRecord::Commit {
            sequence: SequenceNumber::new(9),
        }
        .encode()
        .unwrap();
        let split = bytes.len() - CRC_SIZE;
        let stored = u32::from_le_bytes(bytes[split..].try_into().unwrap());
        assert_eq!(stored, crc32fast::hash(&bytes[..split]));
        assert_eq!(&bytes[0..4], b"BREC");
    }

    #[test]
    fn header_checksum_covers_length() {
        let bytes = LogRecord::Put {
            bucket: BucketId::new(1),
            key: b"k".to_vec(),
            value: b"v".to_vec(),
        }
        .encode()
        .unwrap();
        let stored = u32::from_le_bytes(bytes[HEADER_FIELDS_SIZE..HEADER_SIZE].try_into().unwrap());
        assert_eq!(stored, crc32fast::hash(&bytes[..HEADER_FIELDS_SIZE]));
        let payload_len = u32::from_le_bytes(bytes[7..11].try_into().unwrap()) as usize;
        assert_eq!(bytes.len(), HEADER_SIZE + payload_len + CRC_SIZE);
    }

    #[test]
    fn create_bucket_and_delete_decode() {
        let create = LogRecord::CreateBucket {
            bucket: BucketId::new(1),
            name: "arrows".into(),
        };
        assert_eq!(decode(&create.encode().unwrap()), create);

        let delete = LogRecord::Delete {
            bucket: BucketId::new(1),
            key: vec![0x80, 0, 0, 1],
        };
        assert_eq!(decode(&delete.encode().unwrap()), delete);
    }

    #[test]
    fn oversized_name_rejected() {
        let record = LogRecord::CreateBucket {
            bucket: BucketId::new(1),
            name: "x".repeat(LogRecord::MAX_NAME_SIZE + 1),
        };
        assert!(matches!(
            record.encode(),
            Err(CoreError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn truncated_and_trailing_payloads_rejected() {
        assert!(matches!(
            LogRecord::decode_payload(RecordType::Commit, &[1, 2, 3]),
            Err(CoreError::Corruption { .. })
        ));
        assert!(matches!(
            LogRecord::decode_payload(RecordType::Commit, &[0; 9]),
            Err(CoreError::Corruption { .. })
        ));
        // key length claims more bytes than present
        let mut payload = 1u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&100u32.to_le_bytes());
        assert!(matches!(
            LogRecord::decode_payload(RecordType::Delete, &payload),
            Err(CoreError::Corruption { .. })
        ));
    }
}
