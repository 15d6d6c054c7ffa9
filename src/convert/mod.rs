//! Interchange format converters
//!
//! Contacts travel as vCard 3.0, messages as a JSON record list, calendar
//! events as iCalendar. Photo normalization re-encodes HEIC for targets
//! that cannot display it.

pub mod ical;
pub mod photo;
pub mod sms;
pub mod vcard;

pub use ical::{format_ical_utc, parse_content_query, parse_ics, write_ics, CalendarEvent};
pub use photo::{convert_if_needed, heif_conversion_available, needs_conversion};
pub use sms::{parse_messages_json, read_native_store, write_messages_json, Direction, SmsEntry};
pub use vcard::{parse_vcards, write_vcard, write_vcards, ContactEntry};
