//! Record binary encoding
//!
//! ```text
//! [RowLen: u16][Row][FamLen: u8][Family][QualLen: u32][Qualifier]
//! [Timestamp: u64][Type: u8][Sequence: u64][ValLen: u32][Value]
//! ```
//! All integers little endian.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, StrataError};

use super::{Record, RecordType};

/// Fixed part of an encoded record: 2 + 1 + 4 + 8 + 1 + 8 + 4
const FIXED_LEN: usize = 28;

/// Size of `record` once encoded
pub fn encoded_len(record: &Record) -> usize {
    FIXED_LEN + record.row.len() + record.family.len() + record.qualifier.len() + record.value.len()
}

/// Append the encoding of `record` to `buf`
pub fn encode_record(record: &Record, buf: &mut BytesMut) -> Result<()> {
    if record.row.len() > u16::MAX as usize {
        return Err(StrataError::InvalidArgument(format!(
            "Row too long: {} bytes",
            record.row.len()
        )));
    }
    if record.family.len() > u8::MAX as usize {
        return Err(StrataError::InvalidArgument(format!(
            "Family too long: {} bytes",
            record.family.len()
        )));
    }
    if record.qualifier.len() > u32::MAX as usize || record.value.len() > u32::MAX as usize {
        return Err(StrataError::InvalidArgument(
            "Qualifier or value exceeds 4 GiB".to_string(),
        ));
    }

    buf.reserve(encoded_len(record));
    buf.put_u16_le(record.row.len() as u16);
    buf.put_slice(&record.row);
    buf.put_u8(record.family.len() as u8);
    buf.put_slice(&record.family);
    buf.put_u32_le(record.qualifier.len() as u32);
    buf.put_slice(&record.qualifier);
    buf.put_u64_le(record.timestamp);
    buf.put_u8(record.record_type.code());
    buf.put_u64_le(record.sequence);
    buf.put_u32_le(record.value.len() as u32);
    buf.put_slice(&record.value);
    Ok(())
}

fn take(buf: &mut Bytes, len: usize, what: &str) -> Result<Bytes> {
    if buf.remaining() < len {
        return Err(StrataError::Corruption(format!(
            "Truncated record: need {} bytes for {}, have {}",
            len,
            what,
            buf.remaining()
        )));
    }
    Ok(buf.split_to(len))
}

fn ensure(buf: &Bytes, len: usize, what: &str) -> Result<()> {
    if buf.remaining() < len {
        return Err(StrataError::Corruption(format!(
            "Truncated record: missing {}",
            what
        )));
    }
    Ok(())
}

/// Decode one record from the front of `buf`, advancing it
///
/// Field bytes are zero-copy slices of `buf`.
pub fn decode_record(buf: &mut Bytes) -> Result<Record> {
    ensure(buf, 2, "row length")?;
    let row_len = buf.get_u16_le() as usize;
    let row = take(buf, row_len, "row")?;

    ensure(buf, 1, "family length")?;
    let family_len = buf.get_u8() as usize;
    let family = take(buf, family_len, "family")?;

    ensure(buf, 4, "qualifier length")?;
    let qualifier_len = buf.get_u32_le() as usize;
    let qualifier = take(buf, qualifier_len, "qualifier")?;

    ensure(buf, 8 + 1 + 8 + 4, "timestamp/type/sequence/value length")?;
    let timestamp = buf.get_u64_le();
    let record_type = RecordType::from_code(buf.get_u8())?;
    let sequence = buf.get_u64_le();
    let value_len = buf.get_u32_le() as usize;
    let value = take(buf, value_len, "value")?;

    Ok(Record {
        row,
        family,
        qualifier,
        timestamp,
        record_type,
        sequence,
        value,
    })
}
