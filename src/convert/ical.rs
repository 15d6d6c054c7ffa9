//! iCalendar event codec
//!
//! Events are `BEGIN:VEVENT` ... `END:VEVENT` blocks. Each field is the
//! first match of its own pattern inside the block; the whole block text is
//! retained and re-emitted verbatim when writing.
//!
//! Also parses the Android calendar content-provider query output, where
//! timestamps are milliseconds since the Unix epoch.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const BEGIN_EVENT: &str = "BEGIN:VEVENT";
const END_EVENT: &str = "END:VEVENT";

/// PRODID written into generated calendars
pub const PRODID: &str = "-//Device Migration Tool//Cross Transfer//PT";

/// Content-provider query listing calendar events on Android
pub const ANDROID_EVENTS_QUERY: &str = "content query --uri content://com.android.calendar/events --projection title:description:dtstart:dtend:eventLocation";

/// Canonical UTC text encoding, e.g. `20240115T103000Z`
const ICAL_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

fn field_regex(name: &str) -> Regex {
    // Parameters such as `DTSTART;TZID=...:` are skipped
    Regex::new(&format!(r"(?m)^{}(?:;[^:\r\n]*)?:([^\r\n]*)", name))
        .expect("calendar field pattern is valid")
}

static UID_RE: Lazy<Regex> = Lazy::new(|| field_regex("UID"));
static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| field_regex("SUMMARY"));
static DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| field_regex("DESCRIPTION"));
static DTSTART_RE: Lazy<Regex> = Lazy::new(|| field_regex("DTSTART"));
static DTEND_RE: Lazy<Regex> = Lazy::new(|| field_regex("DTEND"));
static LOCATION_RE: Lazy<Regex> = Lazy::new(|| field_regex("LOCATION"));

/// Column names in the content-provider output
static QUERY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|,\s*|\s)(title|description|dtstart|dtend|eventLocation)=")
        .expect("query column pattern is valid")
});

/// One calendar event in interchange form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub uid: String,
    pub summary: String,
    pub description: String,
    /// `YYYYMMDDTHHMMSSZ` or whatever the source block carried
    pub start: String,
    pub end: String,
    pub location: String,
    /// The block exactly as read from the source
    pub original: Option<String>,
}

fn first_match(re: &Regex, block: &str) -> String {
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Parse every event block in an iCalendar text
pub fn parse_ics(text: &str) -> Vec<CalendarEvent> {
    let mut events = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(BEGIN_EVENT) {
        let from_begin = &rest[start..];
        let Some(end) = from_begin.find(END_EVENT) else {
            break;
        };
        let block = &from_begin[..end + END_EVENT.len()];

        events.push(CalendarEvent {
            uid: first_match(&UID_RE, block),
            summary: first_match(&SUMMARY_RE, block),
            description: first_match(&DESCRIPTION_RE, block),
            start: first_match(&DTSTART_RE, block),
            end: first_match(&DTEND_RE, block),
            location: first_match(&LOCATION_RE, block),
            original: Some(block.to_string()),
        });

        rest = &from_begin[end + END_EVENT.len()..];
    }

    events
}

/// Render one event, preferring its stored original
///
/// Reconstructed events contain only the non-empty fields.
pub fn write_event(event: &CalendarEvent) -> String {
    if let Some(original) = &event.original {
        return original.clone();
    }

    let mut lines = vec![BEGIN_EVENT.to_string()];
    let fields = [
        ("UID", &event.uid),
        ("SUMMARY", &event.summary),
        ("DESCRIPTION", &event.description),
        ("DTSTART", &event.start),
        ("DTEND", &event.end),
        ("LOCATION", &event.location),
    ];
    for (name, value) in fields {
        if !value.is_empty() {
            lines.push(format!("{}:{}", name, value));
        }
    }
    lines.push(END_EVENT.to_string());
    lines.join("\n")
}

/// Render a complete calendar
pub fn write_ics(events: &[CalendarEvent]) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODID),
    ];
    for event in events {
        lines.push(write_event(event));
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render Unix-epoch milliseconds as `YYYYMMDDTHHMMSSZ`
pub fn format_ical_utc(unix_ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(unix_ms).map(|dt| dt.format(ICAL_UTC_FORMAT).to_string())
}

fn query_value(raw: &str) -> Option<&str> {
    let value = raw.trim();
    if value.is_empty() || value == "NULL" {
        None
    } else {
        Some(value)
    }
}

/// Parse content-provider query output into events
///
/// Each `Row:` line yields one event. A row without a title is dropped;
/// the other fields are optional.
pub fn parse_content_query(output: &str) -> Vec<CalendarEvent> {
    let mut events = Vec::new();

    for line in output.lines().map(str::trim).filter(|l| l.starts_with("Row:")) {
        let keys: Vec<_> = QUERY_KEY_RE.captures_iter(line).collect();
        let mut title = None;
        let mut description = None;
        let mut start = None;
        let mut end = None;
        let mut location = None;

        for (i, caps) in keys.iter().enumerate() {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value_end = keys
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(line.len());
            let value = query_value(&line[whole.end()..value_end]);

            match key.as_str() {
                "title" => title = value,
                "description" => description = value,
                "dtstart" => start = value.and_then(|v| v.parse::<i64>().ok()),
                "dtend" => end = value.and_then(|v| v.parse::<i64>().ok()),
                "eventLocation" => location = value,
                _ => {}
            }
        }

        let Some(title) = title else {
            continue;
        };

        let start_text = start.and_then(format_ical_utc).unwrap_or_default();
        let uid = format!(
            "{}-{}@device-migration",
            start.unwrap_or_default(),
            events.len()
        );

        events.push(CalendarEvent {
            uid,
            summary: title.to_string(),
            description: description.unwrap_or_default().to_string(),
            start: start_text,
            end: end.and_then(format_ical_utc).unwrap_or_default(),
            location: location.unwrap_or_default().to_string(),
            original: None,
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Apple Inc.//iOS 17//EN\r\nBEGIN:VEVENT\r\nUID:abc-123\r\nSUMMARY:Reunião de equipe\r\nDESCRIPTION:Pauta semanal\r\nDTSTART;TZID=America/Sao_Paulo:20240115T100000\r\nDTEND;TZID=America/Sao_Paulo:20240115T110000\r\nLOCATION:Sala 2\r\nSUMMARY:Ignored second summary\r\nEND:VEVENT\r\nBEGIN:VEVENT\r\nSUMMARY:Dentista\r\nDTSTART:20240120T140000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    #[test]
    fn test_parse_first_match_per_field() {
        let events = parse_ics(SAMPLE);
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.uid, "abc-123");
        assert_eq!(first.summary, "Reunião de equipe");
        assert_eq!(first.description, "Pauta semanal");
        assert_eq!(first.start, "20240115T100000");
        assert_eq!(first.end, "20240115T110000");
        assert_eq!(first.location, "Sala 2");

        let second = &events[1];
        assert_eq!(second.summary, "Dentista");
        assert_eq!(second.start, "20240120T140000Z");
        assert!(second.uid.is_empty());
        assert!(second.location.is_empty());
    }

    #[test]
    fn test_original_reemitted_verbatim() {
        for event in parse_ics(SAMPLE) {
            let original = event.original.clone().unwrap();
            assert_eq!(write_event(&event), original);
        }
    }

    #[test]
    fn test_reconstruction_includes_only_non_empty_fields() {
        let event = CalendarEvent {
            summary: "Aniversário".into(),
            start: "20240301T000000Z".into(),
            ..Default::default()
        };
        let text = write_event(&event);
        assert!(text.starts_with("BEGIN:VEVENT"));
        assert!(text.ends_with("END:VEVENT"));
        assert!(text.contains("SUMMARY:Aniversário"));
        assert!(text.contains("DTSTART:20240301T000000Z"));
        assert!(!text.contains("UID:"));
        assert!(!text.contains("DTEND"));
        assert!(!text.contains("LOCATION"));
    }

    #[test]
    fn test_write_ics_wraps_calendar() {
        let ics = write_ics(&[CalendarEvent {
            uid: "u1".into(),
            summary: "X".into(),
            ..Default::default()
        }]);
        assert!(ics.starts_with("BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:"));
        assert!(ics.trim_end().ends_with("END:VCALENDAR"));
        assert_eq!(parse_ics(&ics).len(), 1);
    }

    #[test]
    fn test_format_ical_utc() {
        assert_eq!(
            format_ical_utc(1_705_314_600_000).as_deref(),
            Some("20240115T103000Z")
        );
        assert_eq!(format_ical_utc(0).as_deref(), Some("19700101T000000Z"));
    }

    #[test]
    fn test_parse_content_query() {
        let output = "Row: 0 title=Standup, description=NULL, dtstart=1705314600000, dtend=1705316400000, eventLocation=Sala 1, andar 2\n\
                      Row: 1 title=NULL, description=x, dtstart=1705314600000, dtend=1705316400000, eventLocation=\n\
                      Row: 2 title=Almoço, description=Com a equipe, dtstart=1705330800000, dtend=NULL, eventLocation=NULL\n";

        let events = parse_content_query(output);
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].summary, "Standup");
        assert_eq!(events[0].start, "20240115T103000Z");
        assert_eq!(events[0].end, "20240115T110000Z");
        assert_eq!(events[0].location, "Sala 1, andar 2");
        assert!(events[0].description.is_empty());

        assert_eq!(events[1].summary, "Almoço");
        assert_eq!(events[1].description, "Com a equipe");
        assert!(events[1].end.is_empty());
        assert!(events[1].original.is_none());
        assert_ne!(events[0].uid, events[1].uid);
    }

    #[test]
    fn test_first_column_after_row_prefix() {
        let output = "Row: 0 title=Consulta, description=NULL, dtstart=1705314600000, dtend=1705318200000, eventLocation=Clinica";
        let events = parse_content_query(output);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Consulta");
        assert_eq!(events[0].location, "Clinica");
        assert_eq!(events[0].end, "20240115T113000Z");

        let reordered = "Row: 3 dtstart=1705314600000,title=Retorno,eventLocation=NULL";
        let events = parse_content_query(reordered);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Retorno");
        assert_eq!(events[0].start, "20240115T103000Z");
        assert!(events[0].location.is_empty());
    }

    #[test]
    fn test_parse_content_query_no_rows() {
        assert!(parse_content_query("No result found.").is_empty());
        assert!(parse_content_query("").is_empty());
    }
}
