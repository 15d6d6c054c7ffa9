//! Messages step
//!
//! Sources may export either the JSON interchange list or, for iOS backups,
//! the native SQLite store. A native store is converted to JSON in the
//! staging folder before import.

use super::{CategoryStrategy, StepOutcome, TransferContext};
use crate::convert::sms::{parse_messages_json, read_native_store, write_messages_json};
use crate::core::config::Category;
use crate::core::error::Result;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions identifying a native message store export
const NATIVE_STORE_EXTENSIONS: &[&str] = &["db", "sqlite", "sqlitedb"];

fn is_native_store(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| NATIVE_STORE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Produce the JSON interchange file and its record count
fn to_interchange(export: &Path, dir: &Path) -> Result<(PathBuf, usize)> {
    if is_native_store(export) {
        let entries = read_native_store(export)?;
        let json_path = dir.join("sms.json");
        fs::write(&json_path, write_messages_json(&entries)?)?;
        return Ok((json_path, entries.len()));
    }

    let count = match fs::read_to_string(export) {
        Ok(text) => parse_messages_json(&text).len(),
        Err(e) => {
            warn!("Could not read {} for counting: {}", export.display(), e);
            0
        }
    };
    Ok((export.to_path_buf(), count))
}

pub struct MessagesStrategy;

impl CategoryStrategy for MessagesStrategy {
    fn category(&self) -> Category {
        Category::Messages
    }

    fn run(&self, ctx: &mut TransferContext<'_>) -> Result<StepOutcome> {
        let dir = ctx.category_dir(Category::Messages)?;

        ctx.set_current_item("Exportando mensagens");
        let Some(export) = ctx.source.export_messages(&dir)? else {
            ctx.warn("Nenhuma mensagem encontrada no dispositivo de origem");
            return Ok(StepOutcome::nothing());
        };

        let (json_path, count) = to_interchange(&export, &dir)?;
        info!("Exported {} message(s) to {}", count, json_path.display());

        let target_platform = ctx.target.platform();
        if !target_platform.allows_message_insert() {
            ctx.warn(format!(
                "{} não permite importar SMS por programas externos; as mensagens foram preservadas apenas para referência em {}",
                target_platform,
                json_path.display()
            ));
        }

        ctx.set_current_item(format!("Importando {} mensagem(ns)", count));
        let imported = ctx.target.import_messages(&json_path)?;
        if !imported {
            ctx.error("Falha ao importar mensagens no dispositivo de destino");
        }

        Ok(StepOutcome::from_result(imported, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::sms::{Direction, SmsEntry};
    use crate::strategies::test_support::Harness;
    use crate::testdb::MockDevice;

    fn sample() -> Vec<SmsEntry> {
        vec![SmsEntry {
            address: "+5511999990000".into(),
            body: "Oi".into(),
            timestamp_ms: 1_678_307_200_000,
            direction: Direction::Inbound,
            read: true,
            thread_id: 3,
        }]
    }

    #[test]
    fn test_android_target_imports() {
        let mut h = Harness::new(
            MockDevice::iphone("I1").with_messages(sample()),
            MockDevice::android("A1"),
        );
        let outcome = h.run(&MessagesStrategy).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.pushed, 1);
        assert_eq!(h.target_device().imported_messages(), sample().as_slice());
        assert!(h.progress().warnings.is_empty());
    }

    #[test]
    fn test_ios_target_warns_and_respects_import_result() {
        let mut h = Harness::new(
            MockDevice::android("A1").with_messages(sample()),
            MockDevice::iphone("I1"),
        );
        let outcome = h.run(&MessagesStrategy).unwrap();
        assert!(!outcome.success);
        assert_eq!(h.progress().warnings.len(), 1);
        assert!(h.progress().warnings[0].contains("referência"));
        assert_eq!(h.progress().errors.len(), 1);
    }

    #[test]
    fn test_ios_target_that_accepts_import_succeeds() {
        let mut h = Harness::new(
            MockDevice::android("A1").with_messages(sample()),
            MockDevice::iphone("I1").with_message_import(true),
        );
        let outcome = h.run(&MessagesStrategy).unwrap();
        assert!(outcome.success);
        assert_eq!(h.progress().warnings.len(), 1);
    }

    #[test]
    fn test_no_messages_is_a_warning() {
        let mut h = Harness::new(MockDevice::android("A1"), MockDevice::android("A2"));
        let outcome = h.run(&MessagesStrategy).unwrap();
        assert!(outcome.success);
        assert!(h.progress().warnings[0].starts_with("Nenhuma"));
    }

    #[test]
    fn test_native_store_detection() {
        assert!(is_native_store(Path::new("/tmp/sms.db")));
        assert!(is_native_store(Path::new("/tmp/3d0d7e5fb2ce288813306e4d4636395e047a3d28.SQLITEDB")));
        assert!(!is_native_store(Path::new("/tmp/sms.json")));
    }
}
