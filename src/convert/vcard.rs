//! vCard 3.0 contact codec
//!
//! Parsing is a line scanner over `BEGIN:VCARD` ... `END:VCARD` blocks.
//! Every parsed card keeps its original text, and the writer re-emits that
//! text verbatim instead of rebuilding the card.

use log::debug;
use serde::{Deserialize, Serialize};

const BEGIN_CARD: &str = "BEGIN:VCARD";
const END_CARD: &str = "END:VCARD";

/// One contact in interchange form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub name: String,
    /// Insertion order from the source; duplicates allowed
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub organization: String,
    pub note: String,
    /// The card exactly as read from the source
    pub original: Option<String>,
}

impl ContactEntry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phones.push(phone.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.emails.push(email.to_string());
        self
    }
}

/// Split a content line into its upper-cased property name and value
fn split_property(line: &str) -> Option<(String, &str)> {
    let (key, value) = line.split_once(':')?;
    let name = key.split(';').next().unwrap_or(key).trim();
    // Grouped properties ("item1.TEL") keep only the property name
    let name = name.rsplit('.').next().unwrap_or(name);
    Some((name.to_ascii_uppercase(), value))
}

fn unescape(value: &str) -> String {
    value
        .replace("\\n", "\n")
        .replace("\\N", "\n")
        .replace("\\,", ",")
        .replace("\\;", ";")
        .replace("\\\\", "\\")
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

fn parse_card(card: &str) -> ContactEntry {
    let mut entry = ContactEntry {
        original: Some(card.to_string()),
        ..Default::default()
    };
    let mut structured_name = String::new();

    for line in card.lines() {
        let line = line.trim_end_matches('\r');
        let Some((property, value)) = split_property(line) else {
            continue;
        };
        let value = value.trim();

        match property.as_str() {
            "FN" => entry.name = unescape(value),
            "N" => {
                let mut parts = value.split(';');
                let family = parts.next().unwrap_or("").trim();
                let given = parts.next().unwrap_or("").trim();
                structured_name = format!("{} {}", unescape(given), unescape(family))
                    .trim()
                    .to_string();
            }
            "TEL" if !value.is_empty() => entry.phones.push(value.to_string()),
            "EMAIL" if !value.is_empty() => entry.emails.push(value.to_string()),
            "ORG" => {
                entry.organization = unescape(value.split(';').next().unwrap_or("").trim());
            }
            "NOTE" => entry.note = unescape(value),
            _ => {}
        }
    }

    if entry.name.is_empty() {
        entry.name = structured_name;
    }

    entry
}

/// Parse every card in a vCard text blob
pub fn parse_vcards(text: &str) -> Vec<ContactEntry> {
    let mut entries = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(BEGIN_CARD) {
        let block = &rest[start..];
        let Some(end) = block.find(END_CARD) else {
            debug!("Unterminated vCard block ignored");
            break;
        };
        let card = &block[..end + END_CARD.len()];
        entries.push(parse_card(card));
        rest = &block[end + END_CARD.len()..];
    }

    entries
}

/// Render one entry, preferring its stored original
pub fn write_vcard(entry: &ContactEntry) -> String {
    if let Some(original) = &entry.original {
        return original.clone();
    }

    let name = entry.name.trim();
    let (given, family) = match name.rsplit_once(' ') {
        Some((given, family)) => (given.trim(), family.trim()),
        None => (name, ""),
    };

    let mut lines = vec![
        BEGIN_CARD.to_string(),
        "VERSION:3.0".to_string(),
        format!("N:{};{};;;", escape(family), escape(given)),
        format!("FN:{}", escape(name)),
    ];
    if !entry.organization.is_empty() {
        lines.push(format!("ORG:{}", escape(&entry.organization)));
    }
    for phone in &entry.phones {
        lines.push(format!("TEL;TYPE=CELL:{}", phone));
    }
    for email in &entry.emails {
        lines.push(format!("EMAIL;TYPE=INTERNET:{}", email));
    }
    if !entry.note.is_empty() {
        lines.push(format!("NOTE:{}", escape(&entry.note)));
    }
    lines.push(END_CARD.to_string());

    lines.join("\n")
}

/// Render a whole contact list as one vCard file
pub fn write_vcards(entries: &[ContactEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&write_vcard(entry));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "BEGIN:VCARD\r\nVERSION:3.0\r\nN:Silva;Maria;;;\r\nFN:Maria Silva\r\nORG:Acme Ltda;Vendas\r\nTEL;TYPE=CELL:+55 11 91234-5678\r\nTEL;TYPE=HOME:+55 11 3333-4444\r\nEMAIL;TYPE=INTERNET:maria@example.com\r\nNOTE:Linha 1\\nLinha 2\r\nEND:VCARD\r\nBEGIN:VCARD\nVERSION:3.0\nN:Souza;João;;;\nTEL:+55 21 90000-0000\nTEL:+55 21 90000-0000\nEND:VCARD\n";

    #[test]
    fn test_parse_fields() {
        let entries = parse_vcards(SAMPLE);
        assert_eq!(entries.len(), 2);

        let maria = &entries[0];
        assert_eq!(maria.name, "Maria Silva");
        assert_eq!(
            maria.phones,
            vec!["+55 11 91234-5678", "+55 11 3333-4444"]
        );
        assert_eq!(maria.emails, vec!["maria@example.com"]);
        assert_eq!(maria.organization, "Acme Ltda");
        assert_eq!(maria.note, "Linha 1\nLinha 2");
    }

    #[test]
    fn test_structured_name_fallback_and_duplicates() {
        let entries = parse_vcards(SAMPLE);
        let joao = &entries[1];
        assert_eq!(joao.name, "João Souza");
        assert_eq!(joao.phones.len(), 2);
        assert_eq!(joao.phones[0], joao.phones[1]);
    }

    #[test]
    fn test_original_reemitted_verbatim() {
        for entry in parse_vcards(SAMPLE) {
            let original = entry.original.clone().unwrap();
            assert!(original.starts_with("BEGIN:VCARD"));
            assert!(original.ends_with("END:VCARD"));
            assert_eq!(write_vcard(&entry), original);
        }
    }

    #[test]
    fn test_write_without_original() {
        let mut entry = ContactEntry::new("Ana Paula Costa")
            .with_phone("+5511988887777")
            .with_email("ana@example.com");
        entry.organization = "Clínica".to_string();
        entry.note = "VIP".to_string();

        let card = write_vcard(&entry);
        assert_eq!(
            card,
            "BEGIN:VCARD\nVERSION:3.0\nN:Costa;Ana Paula;;;\nFN:Ana Paula Costa\nORG:Clínica\nTEL;TYPE=CELL:+5511988887777\nEMAIL;TYPE=INTERNET:ana@example.com\nNOTE:VIP\nEND:VCARD"
        );

        let reparsed = parse_vcards(&card);
        assert_eq!(reparsed[0].name, "Ana Paula Costa");
        assert_eq!(reparsed[0].phones, entry.phones);
    }

    #[test]
    fn test_write_omits_empty_optional_fields() {
        let card = write_vcard(&ContactEntry::new("Solo"));
        assert!(card.contains("N:;Solo;;;"));
        assert!(!card.contains("ORG:"));
        assert!(!card.contains("NOTE:"));
    }

    #[test]
    fn test_garbage_yields_nothing() {
        assert!(parse_vcards("").is_empty());
        assert!(parse_vcards("hello world").is_empty());
        assert!(parse_vcards("BEGIN:VCARD\nFN:Unterminated").is_empty());
    }

    #[test]
    fn test_write_vcards_joins_cards() {
        let out = write_vcards(&[ContactEntry::new("A"), ContactEntry::new("B")]);
        assert_eq!(out.matches("BEGIN:VCARD").count(), 2);
        assert!(out.ends_with("END:VCARD\n"));
    }
}
