//! Calendar step
//!
//! Only Android exposes a structured event query. Events are written to an
//! iCalendar file and pushed into the target's downloads folder, where the
//! user opens it with the calendar app.

use super::{CategoryStrategy, StepOutcome, TransferContext};
use crate::convert::ical::{parse_content_query, write_ics, ANDROID_EVENTS_QUERY};
use crate::core::config::Category;
use crate::core::error::Result;
use crate::device::{join_remote, DeviceHandle, PATH_DOWNLOADS};
use log::info;
use std::fs;

/// File name of the pushed calendar
pub const CALENDAR_IMPORT_FILE: &str = "calendar_import.ics";

/// Downloads folder on `device`, falling back to the platform default
pub(crate) fn downloads_dir(device: &DeviceHandle<'_>) -> String {
    device
        .category_paths()
        .remove(PATH_DOWNLOADS)
        .and_then(|paths| paths.into_iter().next())
        .unwrap_or_else(|| device.platform().default_downloads_dir().to_string())
}

pub struct CalendarStrategy;

impl CategoryStrategy for CalendarStrategy {
    fn category(&self) -> Category {
        Category::Calendar
    }

    fn run(&self, ctx: &mut TransferContext<'_>) -> Result<StepOutcome> {
        let source_platform = ctx.source.platform();
        if !source_platform.has_calendar_query() {
            ctx.warn(format!(
                "Exportação de calendário não suportada em {}; sincronize o calendário pela conta na nuvem",
                source_platform
            ));
            return Ok(StepOutcome::nothing());
        }

        ctx.set_current_item("Consultando eventos");
        let output = match ctx.source.execute_command(ANDROID_EVENTS_QUERY) {
            Ok(output) => output,
            Err(e) if e.is_unsupported() => {
                ctx.warn(format!("Exportação de calendário indisponível: {}", e));
                return Ok(StepOutcome::nothing());
            }
            Err(e) => return Err(e),
        };

        let events = parse_content_query(&output);
        if events.is_empty() {
            ctx.warn("Nenhum evento de calendário encontrado no dispositivo de origem");
            return Ok(StepOutcome::nothing());
        }

        let dir = ctx.category_dir(Category::Calendar)?;
        let ics_path = dir.join("calendar.ics");
        fs::write(&ics_path, write_ics(&events))?;
        info!("Wrote {} event(s) to {}", events.len(), ics_path.display());

        let remote = join_remote(&downloads_dir(&ctx.target), CALENDAR_IMPORT_FILE);
        ctx.set_current_item(format!("Enviando {} evento(s)", events.len()));
        let pushed = ctx.target.push_file(&ics_path, &remote);
        if !pushed {
            ctx.error(format!("Falha ao enviar calendário para {}", remote));
        }

        Ok(StepOutcome::from_result(pushed, events.len()))
    }
}
