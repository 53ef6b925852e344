use crate::{Field, ParseError, RawRecord};
use std::path::Path;
use tracing::{debug, error, info};

/// Marks the start of every block after the first one
pub const BLOCK_DELIMITER: &[u8] = b"\n{\n    timestamp:";

const OPENING_BRACE: &[u8] = b"{";
const TIMESTAMP_PREFIX: &[u8] = b"    timestamp: ";
// What is left of the timestamp prefix once the delimiter has consumed the rest
const CONTINUED_TIMESTAMP_PREFIX: &[u8] = b" ";
const CHAT_ID_PREFIX: &[u8] = b"    chat_id: ";
const SENDER_PREFIX: &[u8] = b"    sender_alias: ";
const MESSAGE_PREFIX: &[u8] = b"    message: ";
const BLOCK_CLOSE: &[u8] = b"\n}";

/// Reads a dump file into memory in one go
pub fn read_dump(path: impl AsRef<Path>) -> Result<Vec<u8>, ParseError> {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(data) => {
            info!("Read {} bytes from dump {}", data.len(), path.display());
            Ok(data)
        }
        Err(e) => {
            error!("Failed to read dump {}: {}", path.display(), e);
            Err(e.into())
        }
    }
}

/// Partitions a dump into one byte span per block, in file order.
///
/// The first span still carries its opening brace and `timestamp:` key;
/// later spans start right after the consumed delimiter. A single newline
/// after the final closing brace is dropped.
pub fn split_blocks(dump: &[u8]) -> Vec<&[u8]> {
    let dump = if dump.ends_with(b"\n}\n") {
        &dump[..dump.len() - 1]
    } else {
        dump
    };

    if dump.is_empty() {
        return Vec::new();
    }

    let mut blocks = Vec::new();
    let mut rest = dump;
    while let Some(pos) = find(rest, BLOCK_DELIMITER) {
        blocks.push(&rest[..pos]);
        rest = &rest[pos + BLOCK_DELIMITER.len()..];
    }
    blocks.push(rest);

    debug!("Split dump into {} blocks", blocks.len());
    blocks
}

/// Cuts one block span into a RawRecord, checking every structural marker
pub fn parse_block(index: usize, block: &[u8]) -> Result<RawRecord, ParseError> {
    let (timestamp_line, chat_line, sender_line, rest) = if index == 0 {
        let parts: Vec<&[u8]> = block.splitn(5, |b| *b == b'\n').collect();
        if parts.len() < 5 {
            return Err(ParseError::malformed(
                index,
                Field::Block,
                format!("expected an opening brace and four field lines, found {} lines", parts.len()),
            ));
        }
        if parts[0] != OPENING_BRACE {
            return Err(ParseError::malformed(
                index,
                Field::Block,
                "block does not start with an opening brace line",
            ));
        }
        let timestamp = field_line(index, Field::Timestamp, parts[1], TIMESTAMP_PREFIX)?;
        (timestamp, parts[2], parts[3], parts[4])
    } else {
        let parts: Vec<&[u8]> = block.splitn(4, |b| *b == b'\n').collect();
        if parts.len() < 4 {
            return Err(ParseError::malformed(
                index,
                Field::Block,
                format!("expected four field lines, found {} lines", parts.len()),
            ));
        }
        let timestamp = field_line(index, Field::Timestamp, parts[0], CONTINUED_TIMESTAMP_PREFIX)?;
        (timestamp, parts[1], parts[2], parts[3])
    };

    let chat_id_text = field_line(index, Field::ChatId, chat_line, CHAT_ID_PREFIX)?;
    let sender_text = field_line(index, Field::SenderAlias, sender_line, SENDER_PREFIX)?;
    let payload_bytes = message_body(index, rest)?.to_vec();

    Ok(RawRecord {
        index,
        timestamp_text: timestamp_line,
        chat_id_text,
        sender_text,
        payload_bytes,
    })
}

/// Yields one result per block so callers can decide what a bad block means
pub fn records(dump: &[u8]) -> impl Iterator<Item = Result<RawRecord, ParseError>> + '_ {
    split_blocks(dump)
        .into_iter()
        .enumerate()
        .map(|(index, block)| parse_block(index, block))
}

/// Splits the whole dump, failing on the first malformed block
pub fn split(dump: &[u8]) -> Result<Vec<RawRecord>, ParseError> {
    let records = records(dump).collect::<Result<Vec<_>, _>>()?;
    info!("Split complete: {} records", records.len());
    Ok(records)
}

/// Strips `prefix` and the single trailing terminator byte from a field line
fn field_line(index: usize, field: Field, line: &[u8], prefix: &[u8]) -> Result<String, ParseError> {
    let value = line.strip_prefix(prefix).ok_or_else(|| {
        ParseError::malformed(
            index,
            field,
            format!("expected line to start with {:?}", String::from_utf8_lossy(prefix)),
        )
    })?;

    let (_, value) = value
        .split_last()
        .ok_or_else(|| ParseError::malformed(index, field, "line is missing its terminator"))?;

    String::from_utf8(value.to_vec())
        .map_err(|e| ParseError::malformed(index, field, format!("not valid UTF-8: {}", e)))
}

fn message_body(index: usize, rest: &[u8]) -> Result<&[u8], ParseError> {
    let body = rest.strip_prefix(MESSAGE_PREFIX).ok_or_else(|| {
        ParseError::malformed(
            index,
            Field::Message,
            format!("expected line to start with {:?}", String::from_utf8_lossy(MESSAGE_PREFIX)),
        )
    })?;

    body.strip_suffix(BLOCK_CLOSE).ok_or_else(|| {
        ParseError::malformed(index, Field::Message, "block is not closed by a newline and '}'")
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
