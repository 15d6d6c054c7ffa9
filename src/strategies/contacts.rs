//! Contacts step
//!
//! The exported vCard file is handed to the target untouched; it is parsed
//! only to count cards for the log.

use super::{CategoryStrategy, StepOutcome, TransferContext};
use crate::convert::parse_vcards;
use crate::core::config::Category;
use crate::core::error::Result;
use log::{info, warn};
use std::fs;

pub struct ContactsStrategy;

impl CategoryStrategy for ContactsStrategy {
    fn category(&self) -> Category {
        Category::Contacts
    }

    fn run(&self, ctx: &mut TransferContext<'_>) -> Result<StepOutcome> {
        let dir = ctx.category_dir(Category::Contacts)?;

        ctx.set_current_item("Exportando contatos");
        let Some(vcf_path) = ctx.source.export_contacts(&dir)? else {
            ctx.warn("Nenhum contato encontrado no dispositivo de origem");
            return Ok(StepOutcome::nothing());
        };

        let count = match fs::read_to_string(&vcf_path) {
            Ok(text) => parse_vcards(&text).len(),
            Err(e) => {
                warn!("Could not read {} for counting: {}", vcf_path.display(), e);
                0
            }
        };
        info!("Exported {} contact(s) to {}", count, vcf_path.display());

        ctx.set_current_item(format!("Importando {} contato(s)", count));
        let imported = ctx.target.import_contacts(&vcf_path)?;
        if !imported {
            ctx.error("Falha ao importar contatos no dispositivo de destino");
        }

        Ok(StepOutcome::from_result(imported, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::Harness;
    use crate::testdb::{MockDevice, MockDeviceConfig};

    const CARDS: &str = "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Maria Silva\r\nTEL:+5511900000000\r\nEND:VCARD\r\nBEGIN:VCARD\r\nVERSION:2.1\r\nN:Souza;João\r\nX-CUSTOM:keep me\r\nEND:VCARD\r\n";

    #[test]
    fn test_exported_bytes_reach_target_unmodified() {
        let mut h = Harness::new(
            MockDevice::android("A1").with_contacts(CARDS),
            MockDevice::iphone("I1"),
        );
        let outcome = h.run(&ContactsStrategy).unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.pulled, 2);
        assert_eq!(h.target_device().imported_contacts(), &[CARDS.to_string()]);
        assert!(h.staging.path().join("contacts/contacts.vcf").exists());
    }

    #[test]
    fn test_no_contacts_is_a_warning() {
        let mut h = Harness::new(MockDevice::android("A1"), MockDevice::iphone("I1"));
        let outcome = h.run(&ContactsStrategy).unwrap();

        assert!(outcome.success);
        assert!(h.progress().warnings[0].contains("Nenhum"));
        assert!(h.progress().errors.is_empty());
        assert!(h.target_device().imported_contacts().is_empty());
    }

    #[test]
    fn test_failed_import_is_failure() {
        let mut h = Harness::new(
            MockDevice::iphone("I1").with_contacts(CARDS),
            MockDevice::android("A1").with_config(MockDeviceConfig {
                simulate_locked: true,
                ..Default::default()
            }),
        );
        assert!(h.run(&ContactsStrategy).is_err());
    }
}
