//! BIFF8 record stream iteration.
//!
//! A BIFF8 stream is a sequence of `[u16 type][u16 length][body]` records.
//! CONTINUE records (0x003C) extend the body of the preceding record past
//! the 8224-byte per-record limit and are merged here, so downstream code
//! sees one logical record. A record whose declared length runs past the
//! end of the stream stops iteration; everything accumulated so far is
//! returned.

use super::records;

/// A single logical BIFF8 record (CONTINUE bodies already merged).
#[derive(Debug)]
pub struct BiffRecord {
    /// Record type ID (e.g. `records::SST`, `records::NUMBER`)
    pub record_type: u16,
    /// Record body (CONTINUE records concatenated)
    pub data: Vec<u8>,
    /// Byte offset of the record header in the stream
    pub stream_offset: usize,
}

/// Read all records from a BIFF8 stream.
pub fn read_all_records(stream: &[u8]) -> Vec<BiffRecord> {
    let mut records: Vec<BiffRecord> = Vec::new();
    let mut pos = 0usize;

    while pos + 4 <= stream.len() {
        let record_type = u16::from_le_bytes([stream[pos], stream[pos + 1]]);
        let body_len = u16::from_le_bytes([stream[pos + 2], stream[pos + 3]]) as usize;
        let body_start = pos + 4;

        if body_start + body_len > stream.len() {
            log::warn!(
                "record 0x{record_type:04X} at offset {pos} declares {body_len} bytes \
                 but only {} remain; stopping",
                stream.len() - body_start
            );
            break;
        }

        let body = &stream[body_start..body_start + body_len];
        if record_type == records::CONTINUE {
            // Orphaned CONTINUE records (no preceding record) are dropped.
            if let Some(prev) = records.last_mut() {
                prev.data.extend_from_slice(body);
            }
        } else {
            records.push(BiffRecord {
                record_type,
                data: body.to_vec(),
                stream_offset: pos,
            });
        }

        pos = body_start + body_len;
    }

    records
}

/// Extract `(version, substream_type)` from a BOF record body.
pub fn parse_bof(data: &[u8]) -> Option<(u16, u16)> {
    if data.len() < 4 {
        return None;
    }
    let version = u16::from_le_bytes([data[0], data[1]]);
    let dt = u16::from_le_bytes([data[2], data[3]]);
    Some((version, dt))
}
