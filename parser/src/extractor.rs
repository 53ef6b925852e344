use crate::{message_id, Field, NormalizedEvent, ParseError, RawRecord};
use chrono::{NaiveDateTime, Timelike};
use tracing::debug;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Turns a RawRecord into a NormalizedEvent with its derived id and network
pub fn extract(record: RawRecord) -> Result<NormalizedEvent, ParseError> {
    let index = record.index;

    let epoch_timestamp = parse_timestamp(&record.timestamp_text).ok_or_else(|| {
        ParseError::malformed(
            index,
            Field::Timestamp,
            format!("'{}' does not match YYYY-MM-DD HH:MM:SS", record.timestamp_text),
        )
    })?;

    if record.chat_id_text.is_empty() {
        return Err(ParseError::malformed(index, Field::ChatId, "chat_id is empty"));
    }
    let network = network_of(&record.chat_id_text).map(str::to_owned).ok_or_else(|| {
        ParseError::malformed(
            index,
            Field::ChatId,
            format!("'{}' has no network segment after a colon", record.chat_id_text),
        )
    })?;

    if record.sender_text.is_empty() {
        return Err(ParseError::malformed(index, Field::SenderAlias, "sender_alias is empty"));
    }

    let message_id = message_id::derive(
        epoch_timestamp,
        &record.chat_id_text,
        &record.sender_text,
        &record.payload_bytes,
    );
    debug!("Record #{} -> message id {}", index, message_id);

    Ok(NormalizedEvent {
        index,
        message_id: message_id.to_string(),
        epoch_timestamp,
        network,
        sender_username: record.sender_text.clone(),
        sender_id: record.sender_text,
        chat_id: record.chat_id_text,
        payload: record.payload_bytes,
    })
}

/// Parses `YYYY-MM-DD HH:MM:SS` as UTC civil time into epoch seconds.
///
/// Surrounding whitespace and a leap second (`:60`) are rejected.
pub fn parse_timestamp(text: &str) -> Option<i64> {
    if text.trim() != text {
        return None;
    }
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .ok()
        // chrono stores a leap second as nanosecond >= 1_000_000_000
        .filter(|naive| naive.nanosecond() < 1_000_000_000)
        .map(|naive| naive.and_utc().timestamp())
}

/// Second colon-delimited component of a chat id (`!room:example.org` -> `example.org`)
pub fn network_of(chat_id: &str) -> Option<&str> {
    chat_id.split(':').nth(1).filter(|network| !network.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(timestamp: &str, chat_id: &str, sender: &str, payload: &[u8]) -> RawRecord {
        RawRecord {
            index: 7,
            timestamp_text: timestamp.to_string(),
            chat_id_text: chat_id.to_string(),
            sender_text: sender.to_string(),
            payload_bytes: payload.to_vec(),
        }
    }

    #[test]
    fn test_parse_timestamp_utc() {
        assert_eq!(parse_timestamp("2021-01-01 00:00:00"), Some(1_609_459_200));
        assert_eq!(parse_timestamp("1970-01-01 00:00:00"), Some(0));
        assert_eq!(parse_timestamp("2021-01-01 00:01:00"), Some(1_609_459_260));
    }

    #[test]
    fn test_parse_timestamp_rejects_other_patterns() {
        assert_eq!(parse_timestamp("2021-01-01T00:00:00"), None);
        assert_eq!(parse_timestamp("2021-01-01"), None);
        assert_eq!(parse_timestamp("2021-13-01 00:00:00"), None);
        assert_eq!(parse_timestamp("2021-01-01 00:00:00 extra"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_parse_timestamp_rejects_leap_second() {
        assert_eq!(parse_timestamp("2016-12-31 23:59:59"), Some(1_483_228_799));
        assert_eq!(parse_timestamp("2016-12-31 23:59:60"), None);
    }

    #[test]
    fn test_parse_timestamp_rejects_surrounding_whitespace() {
        assert_eq!(parse_timestamp(" 2021-01-01 00:00:00"), None);
        assert_eq!(parse_timestamp("2021-01-01 00:00:00 "), None);
        assert_eq!(parse_timestamp("\t2021-01-01 00:00:00"), None);
    }

    #[test]
    fn test_network_of() {
        assert_eq!(network_of("!room1:example.org"), Some("example.org"));
        assert_eq!(network_of("!room:matrix.org:8448"), Some("matrix.org"));
        assert_eq!(network_of("no-colon-here"), None);
        assert_eq!(network_of("!room:"), None);
    }

    #[test]
    fn test_extract_fields() {
        let event = extract(raw(
            "2021-01-01 00:00:00",
            "!room1:example.org",
            "@alice:example.org",
            b"hello",
        ))
        .unwrap();

        assert_eq!(event.index, 7);
        assert_eq!(event.message_id, "29858f44-a4cc-59a7-a0b8-d6dd549766d5");
        assert_eq!(event.epoch_timestamp, 1_609_459_200);
        assert_eq!(event.chat_id, "!room1:example.org");
        assert_eq!(event.network, "example.org");
        assert_eq!(event.sender_id, "@alice:example.org");
        assert_eq!(event.sender_username, "@alice:example.org");
        assert_eq!(event.payload, b"hello");
    }

    #[test]
    fn test_extract_same_input_same_id() {
        let first = extract(raw("2021-06-01 12:30:45", "!r:example.org", "@a:example.org", b"x")).unwrap();
        let second = extract(raw("2021-06-01 12:30:45", "!r:example.org", "@a:example.org", b"x")).unwrap();
        assert_eq!(first.message_id, second.message_id);
    }

    #[test]
    fn test_extract_chat_id_without_colon() {
        let err = extract(raw("2021-01-01 00:00:00", "lobby", "@a:example.org", b"x")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedRecord { index: 7, field: Field::ChatId, .. }
        ));
    }

    #[test]
    fn test_extract_bad_timestamp() {
        let err = extract(raw("01/01/2021", "!r:example.org", "@a:example.org", b"x")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedRecord { index: 7, field: Field::Timestamp, .. }
        ));
    }

    #[test]
    fn test_extract_leap_second_timestamp() {
        let err = extract(raw("2016-12-31 23:59:60", "!r:example.org", "@a:example.org", b"x")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedRecord { index: 7, field: Field::Timestamp, .. }
        ));
    }

    #[test]
    fn test_extract_empty_sender() {
        let err = extract(raw("2021-01-01 00:00:00", "!r:example.org", "", b"x")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedRecord { field: Field::SenderAlias, .. }
        ));
    }

    #[test]
    fn test_extract_empty_chat_id() {
        let err = extract(raw("2021-01-01 00:00:00", "", "@a:example.org", b"x")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedRecord { field: Field::ChatId, .. }
        ));
    }
}
