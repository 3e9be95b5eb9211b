//! Bulk guest import.

use std::path::Path;

use super::Workspace;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use guest_roster::{GuestRecord, GuestWriter};
use serde_json::json;

/// Reads groups from a JSON document: an array of groups, each an array of
/// guest objects with the invitee first.
fn read_groups(content: &str) -> Result<Vec<Vec<GuestRecord>>> {
    let groups: Vec<Vec<GuestRecord>> =
        serde_json::from_str(content).context("expected an array of guest groups")?;
    Ok(groups.into_iter().filter(|group| !group.is_empty()).collect())
}

/// Import groups of guests into an event.
///
/// Groups are written in order. When one fails, the groups already written
/// are kept and saved before the error is reported.
pub fn guests_import(
    workspace: &Workspace,
    event: &str,
    file: &Path,
    format: &OutputFormat,
) -> Result<()> {
    let event = workspace.event(event)?.key;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let groups = read_groups(&content)?;
    let total = groups.len();

    let result = workspace.roster().import_groups(&event, groups);
    workspace.save()?;
    let receipts = result?;

    let guests: usize = receipts.iter().map(|r| r.keys().count()).sum();
    match format {
        OutputFormat::Text => {
            output::print_success(
                &format!("Imported {} groups ({} guests) into {}", total, guests, event),
                format,
            );
        }
        OutputFormat::Json => output::print_json(&json!({
            "event": event,
            "groups": receipts,
        }))?,
    }
    Ok(())
}
