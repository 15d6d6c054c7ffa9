//! Mock data generator for populating simulated phones
//!
//! Media content only needs a believable header followed by deterministic
//! filler, so sizes stay in the kilobyte range. Personal data (contacts,
//! messages, calendar rows) is produced in the formats the devices export.

use crate::convert::sms::{Direction, SmsEntry};
use crate::convert::vcard::ContactEntry;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Default size of a generated media file
pub const MEDIA_FILE_SIZE: usize = 2 * 1024;

/// Base timestamp for generated records (2024-01-01 00:00:00 UTC), in ms
pub const BASE_TIMESTAMP_MS: i64 = 1_704_067_200_000;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Fábio", "Gabriela", "Heitor", "Isabela", "João",
];

const LAST_NAMES: &[&str] = &[
    "Silva", "Santos", "Oliveira", "Souza", "Lima", "Pereira", "Costa", "Almeida",
];

const MESSAGE_BODIES: &[&str] = &[
    "Oi, tudo bem?",
    "Chego em 10 minutos",
    "Pode me ligar depois?",
    "Obrigado!",
    "Vamos almoçar amanhã?",
    "Confirmado para sexta",
];

const EVENT_TITLES: &[&str] = &["Dentista", "Reunião de equipe", "Aniversário", "Academia"];

/// Deterministic byte stream seeded through `DefaultHasher`
struct Filler {
    state: u64,
}

impl Filler {
    fn new(seed: u64) -> Self {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        Self {
            state: hasher.finish(),
        }
    }

    fn next_byte(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.state >> 33) as u8
    }

    fn fill(&mut self, data: &mut Vec<u8>, size: usize) {
        while data.len() < size {
            data.push(self.next_byte());
        }
    }
}

/// ISO base media `ftyp` box with the given brands
fn ftyp_box(major: &[u8; 4], compatible: &[&[u8; 4]]) -> Vec<u8> {
    let size = (16 + 4 * compatible.len()) as u32;
    let mut data = Vec::with_capacity(size as usize);
    data.extend_from_slice(&size.to_be_bytes());
    data.extend_from_slice(b"ftyp");
    data.extend_from_slice(major);
    data.extend_from_slice(&[0, 0, 0, 0]);
    for brand in compatible {
        data.extend_from_slice(*brand);
    }
    data
}

/// Generates file content and personal data for mock devices
pub struct MockDataGenerator;

impl MockDataGenerator {
    /// Header bytes identifying a file of `extension`
    pub fn header_for_extension(extension: &str) -> Vec<u8> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0],
            "heic" | "heif" => ftyp_box(b"heic", &[b"mif1", b"heic"]),
            "png" => vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
            "gif" => b"GIF89a".to_vec(),
            "webp" => b"RIFF\0\0\0\0WEBPVP8 ".to_vec(),
            "mov" => ftyp_box(b"qt  ", &[b"qt  "]),
            "mp4" | "m4a" => ftyp_box(b"isom", &[b"isom", b"mp42"]),
            "3gp" => ftyp_box(b"3gp4", &[b"3gp4"]),
            "mp3" => vec![b'I', b'D', b'3', 0x04, 0x00, 0x00],
            "opus" | "ogg" => b"OggS".to_vec(),
            "pdf" => b"%PDF-1.7\n".to_vec(),
            _ => Vec::new(),
        }
    }

    /// Media file of `size` bytes: header plus seeded filler
    pub fn media_file(extension: &str, size: usize, seed: u64) -> Vec<u8> {
        let mut data = Self::header_for_extension(extension);
        Filler::new(seed).fill(&mut data, size);
        data.truncate(size.max(1));
        data
    }

    /// `count` camera-style file names with content, alternating HEIC and JPEG on iOS
    pub fn camera_roll(count: usize, heic: bool) -> Vec<(String, Vec<u8>)> {
        (0..count)
            .map(|i| {
                let (name, ext) = if heic && i % 2 == 0 {
                    (format!("IMG_{:04}.HEIC", i + 1), "heic")
                } else if heic {
                    (format!("IMG_{:04}.JPG", i + 1), "jpg")
                } else {
                    (format!("IMG_2024010{}_{:06}.jpg", i % 9 + 1, i), "jpg")
                };
                (name, Self::media_file(ext, MEDIA_FILE_SIZE, i as u64))
            })
            .collect()
    }

    /// `count` distinct contacts with phones and some emails
    pub fn contacts(count: usize) -> Vec<ContactEntry> {
        (0..count)
            .map(|i| {
                let first = FIRST_NAMES[i % FIRST_NAMES.len()];
                let last = LAST_NAMES[(i / FIRST_NAMES.len() + i) % LAST_NAMES.len()];
                let mut entry = ContactEntry::new(&format!("{} {}", first, last))
                    .with_phone(&format!("+55 11 9{:04}-{:04}", 1000 + i, 2000 + i * 7));
                if i % 3 == 0 {
                    entry = entry.with_email(&format!(
                        "{}.{}@exemplo.com.br",
                        first.to_lowercase(),
                        last.to_lowercase()
                    ));
                }
                entry
            })
            .collect()
    }

    /// `count` messages spread over a few threads, one minute apart
    pub fn messages(count: usize) -> Vec<SmsEntry> {
        (0..count)
            .map(|i| {
                let thread = (i % 3) as i64 + 1;
                SmsEntry {
                    address: format!("+55119{:08}", 80_000_000 + thread),
                    body: MESSAGE_BODIES[i % MESSAGE_BODIES.len()].to_string(),
                    timestamp_ms: BASE_TIMESTAMP_MS + i as i64 * 60_000,
                    direction: if i % 2 == 0 {
                        Direction::Inbound
                    } else {
                        Direction::Outbound
                    },
                    read: i % 4 != 0,
                    thread_id: thread,
                }
            })
            .collect()
    }

    /// Output of the Android calendar content query for `count` events
    pub fn calendar_query_output(count: usize) -> String {
        if count == 0 {
            return "No result found.\n".to_string();
        }
        let mut output = String::new();
        for i in 0..count {
            let start = BASE_TIMESTAMP_MS + i as i64 * 86_400_000;
            output.push_str(&format!(
                "Row: {} title={}, description=NULL, dtstart={}, dtend={}, eventLocation={}\n",
                i,
                EVENT_TITLES[i % EVENT_TITLES.len()],
                start,
                start + 3_600_000,
                if i % 2 == 0 { "São Paulo" } else { "NULL" }
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ical::parse_content_query;
    use crate::convert::vcard::{parse_vcards, write_vcards};

    #[test]
    fn test_media_is_deterministic() {
        let a = MockDataGenerator::media_file("jpg", 256, 7);
        let b = MockDataGenerator::media_file("jpg", 256, 7);
        let c = MockDataGenerator::media_file("jpg", 256, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 256);
        assert_eq!(&a[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_heic_header() {
        let data = MockDataGenerator::media_file("HEIC", 128, 1);
        assert_eq!(&data[4..8], b"ftyp");
        assert_eq!(&data[8..12], b"heic");
    }

    #[test]
    fn test_camera_roll_mixes_formats() {
        let roll = MockDataGenerator::camera_roll(4, true);
        assert_eq!(roll.len(), 4);
        assert!(roll[0].0.ends_with(".HEIC"));
        assert!(roll[1].0.ends_with(".JPG"));
    }

    #[test]
    fn test_contacts_survive_vcard() {
        let contacts = MockDataGenerator::contacts(12);
        let parsed = parse_vcards(&write_vcards(&contacts));
        assert_eq!(parsed.len(), 12);
        assert_eq!(parsed[0].name, contacts[0].name);
        assert!(!parsed[0].emails.is_empty());
    }

    #[test]
    fn test_calendar_output_parses() {
        let events = parse_content_query(&MockDataGenerator::calendar_query_output(3));
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].summary, "Dentista");
        assert_eq!(events[0].location, "São Paulo");
        assert!(parse_content_query(&MockDataGenerator::calendar_query_output(0)).is_empty());
    }

    #[test]
    fn test_messages_are_ordered() {
        let messages = MockDataGenerator::messages(5);
        assert!(messages.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms));
    }
}
