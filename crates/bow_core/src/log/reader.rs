//! Streaming reader over the records of a store file.

use super::record::{
    LogRecord, RecordType, CRC_SIZE, HEADER_FIELDS_SIZE, HEADER_SIZE, RECORD_MAGIC, RECORD_VERSION,
};
use crate::error::{CoreError, CoreResult};
use bow_storage::StorageBackend;

/// Default read buffer size (64 KB).
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// A record together with its position in the file.
#[derive(Debug)]
pub(crate) struct LogEntry {
    /// Offset of the record envelope.
    pub offset: u64,
    /// Length of the whole envelope.
    pub len: u64,
    /// The decoded record.
    pub record: LogRecord,
}

impl LogEntry {
    /// Offset just past this record.
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// Reads records sequentially with a fixed read buffer.
///
/// - Checksum mismatches, bad magic and unknown record types are errors
/// - A record cut short by the end of the file ends iteration; its offset
///   is reported by [`torn_at`](Self::torn_at). A record only counts as cut
///   short once its header checksum matches.
pub(crate) struct LogReader<'a> {
    backend: &'a dyn StorageBackend,
    end: u64,
    offset: u64,
    buffer: Vec<u8>,
    buffer_start: u64,
    torn_at: Option<u64>,
    finished: bool,
}

impl<'a> LogReader<'a> {
    /// Creates a reader starting at `start`.
    pub fn new(backend: &'a dyn StorageBackend, start: u64) -> CoreResult<Self> {
        let end = backend.size()?;
        Ok(Self {
            backend,
            end,
            offset: start,
            buffer: Vec::new(),
            buffer_start: start,
            torn_at: None,
            finished: false,
        })
    }

    /// Offset of an incomplete trailing record, if iteration hit one.
    pub fn torn_at(&self) -> Option<u64> {
        self.torn_at
    }

    /// Returns `len` bytes at the current offset, refilling the buffer as
    /// needed, or `None` if the file ends first.
    fn window(&mut self, len: usize) -> CoreResult<Option<&[u8]>> {
        if self.offset + len as u64 > self.end {
            return Ok(None);
        }

        let mut rel = (self.offset - self.buffer_start) as usize;
        if rel + len > self.buffer.len() {
            let remaining = self.end - self.offset;
            let read_len = remaining.min(len.max(READ_BUFFER_SIZE) as u64) as usize;
            self.buffer = self.backend.read_at(self.offset, read_len)?;
            self.buffer_start = self.offset;
            rel = 0;
        }

        Ok(Some(&self.buffer[rel..rel + len]))
    }

    fn read_next(&mut self) -> CoreResult<Option<LogEntry>> {
        if self.finished || self.offset >= self.end {
            self.finished = true;
            return Ok(None);
        }
        let offset = self.offset;

        let Some(header) = self.window(HEADER_SIZE)? else {
            self.torn_at = Some(offset);
            return Ok(None);
        };

        if header[0..4] != RECORD_MAGIC {
            return Err(CoreError::corruption(format!(
                "invalid record magic at offset {offset}"
            )));
        }
        let stored = u32::from_le_bytes([header[11], header[12], header[13], header[14]]);
        let computed = crc32fast::hash(&header[..HEADER_FIELDS_SIZE]);
        if stored != computed {
            return Err(CoreError::ChecksumMismatch {
                offset,
                expected: stored,
                actual: computed,
            });
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version > RECORD_VERSION {
            return Err(CoreError::corruption(format!(
                "unsupported record version {version} at offset {offset}"
            )));
        }
        let type_byte = header[6];
        let payload_len = u32::from_le_bytes([header[7], header[8], header[9], header[10]]) as usize;
        let record_type = RecordType::from_byte(type_byte).ok_or_else(|| {
            CoreError::corruption(format!(
                "unknown record type {type_byte} at offset {offset}"
            ))
        })?;

        let total = HEADER_SIZE + payload_len + CRC_SIZE;
        let Some(bytes) = self.window(total)? else {
            self.torn_at = Some(offset);
            return Ok(None);
        };

        let crc_start = HEADER_SIZE + payload_len;
        let stored = u32::from_le_bytes([
            bytes[crc_start],
            bytes[crc_start + 1],
            bytes[crc_start + 2],
            bytes[crc_start + 3],
        ]);
        let computed = crc32fast::hash(&bytes[..crc_start]);
        if stored != computed {
            return Err(CoreError::ChecksumMismatch {
                offset,
                expected: stored,
                actual: computed,
            });
        }

        let record = LogRecord::decode_payload(record_type, &bytes[HEADER_SIZE..crc_start])?;
        self.offset += total as u64;

        Ok(Some(LogEntry {
            offset,
            len: total as u64,
            record,
        }))
    }
}

impl Iterator for LogReader<'_> {
    type Item = CoreResult<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_next() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BucketId, SequenceNumber};
    use bow_storage::InMemoryBackend;

    fn backend_with(records: &[LogRecord]) -> InMemoryBackend {
        let mut backend = InMemoryBackend::new();
        for record in records {
            backend.append(&record.encode().unwrap()).unwrap();
        }
        backend
    }

    fn sample() -> Vec<LogRecord> {
        vec![
            LogRecord::CreateBucket {
                bucket: BucketId::new(1),
                name: "arrows".into(),
            },
            LogRecord::Put {
                bucket: BucketId::new(1),
                key: b"123".to_vec(),
                value: vec![1, 2, 3],
            },
            LogRecord::Commit {
                sequence: SequenceNumber::new(1),
            },
        ]
    }

    #[test]
    fn reads_all_records_with_offsets() {
        let records = sample();
        let backend = backend_with(&records);
        let mut reader = LogReader::new(&backend, 0).unwrap();

        let entries: Vec<LogEntry> = reader.by_ref().collect::<CoreResult<_>>().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].offset, 0);
        assert_eq!(entries[1].offset, entries[0].end());
        assert_eq!(entries[2].end(), backend.size().unwrap());
        let decoded: Vec<LogRecord> = entries.into_iter().map(|e| e.record).collect();
        assert_eq!(decoded, records);
        assert_eq!(reader.torn_at(), None);
    }

    #[test]
    fn empty_log() {
        let backend = InMemoryBackend::new();
        let mut reader = LogReader::new(&backend, 0).unwrap();
        assert!(reader.next().is_none());
        assert_eq!(reader.torn_at(), None);
    }

    #[test]
    fn torn_tail_ends_iteration() {
        let records = sample();
        let mut data = backend_with(&records).data();
        let full = data.len() as u64;
        data.truncate(data.len() - 3);
        let backend = InMemoryBackend::with_data(data);

        let mut reader = LogReader::new(&backend, 0).unwrap();
        let entries: Vec<LogEntry> = reader.by_ref().collect::<CoreResult<_>>().unwrap();
        assert_eq!(entries.len(), 2);
        let commit_len = records[2].encode().unwrap().len() as u64;
        assert_eq!(reader.torn_at(), Some(full - commit_len));
    }

    #[test]
    fn flipped_bit_is_checksum_error() {
        let mut data = backend_with(&sample()).data();
        data[HEADER_SIZE + 1] ^= 0x01;
        let backend = InMemoryBackend::with_data(data);

        let mut reader = LogReader::new(&backend, 0).unwrap();
        assert!(matches!(
            reader.next(),
            Some(Err(CoreError::ChecksumMismatch { offset: 0, .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn damaged_length_is_checksum_error() {
        let mut data = backend_with(&sample()).data();
        // high byte of the first record's payload length, now far past the end
        data[10] ^= 0x40;
        let backend = InMemoryBackend::with_data(data);

        let mut reader = LogReader::new(&backend, 0).unwrap();
        assert!(matches!(
            reader.next(),
            Some(Err(CoreError::ChecksumMismatch { offset: 0, .. }))
        ));
        assert_eq!(reader.torn_at(), None);
    }

    #[test]
    fn partial_header_is_torn() {
        let records = sample();
        let mut data = backend_with(&records).data();
        let intact = data.len() as u64;
        data.extend_from_slice(&records[0].encode().unwrap()[..HEADER_SIZE - 1]);
        let backend = InMemoryBackend::with_data(data);

        let mut reader = LogReader::new(&backend, 0).unwrap();
        assert_eq!(reader.by_ref().count(), 3);
        assert_eq!(reader.torn_at(), Some(intact));
    }

    #[test]
    fn garbage_is_corruption() {
        let backend = InMemoryBackend::with_data(vec![0xEE; 32]);
        let mut reader = LogReader::new(&backend, 0).unwrap();
        assert!(matches!(
            reader.next(),
            Some(Err(CoreError::Corruption { .. }))
        ));
    }

    #[test]
    fn records_larger_than_buffer() {
        let record = LogRecord::Put {
            bucket: BucketId::new(1),
            key: b"big".to_vec(),
            value: vec![7; READ_BUFFER_SIZE * 2],
        };
        let backend = backend_with(&[record.clone(), record.clone()]);
        let reader = LogReader::new(&backend, 0).unwrap();
        let entries: Vec<LogEntry> = reader.collect::<CoreResult<_>>().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].record, record);
    }
}
