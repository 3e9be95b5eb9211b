//! Event management commands.

use super::Workspace;
use crate::output::{self, OutputFormat, Table};
use anyhow::Result;
use guest_roster::{EventConfig, EventKey, GuestReader};

/// List events with their guest totals.
pub fn events_list(workspace: &Workspace, format: &OutputFormat) -> Result<()> {
    let events = workspace.store().events();

    match format {
        OutputFormat::Text => {
            if events.is_empty() {
                println!("No events found");
                return Ok(());
            }
            let mut table = Table::new(
                ["Key", "Name", "Date", "Location", "Guests"]
                    .map(String::from)
                    .to_vec(),
            );
            for event in &events {
                let counts = workspace.roster().counts(&event.key)?;
                table.push(vec![
                    event.key.to_string(),
                    event.name.clone(),
                    event.date.clone(),
                    event.location.clone(),
                    counts.total.to_string(),
                ]);
            }
            println!("{}", table.render());
        }
        OutputFormat::Json => output::print_json(&events)?,
    }

    Ok(())
}

/// Create or replace an event.
///
/// Events created without options use the configured default options.
pub fn events_set(
    workspace: &Workspace,
    key: &str,
    name: String,
    date: String,
    location: String,
    options: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let key = key.trim();
    if key.is_empty() || key.contains('/') {
        anyhow::bail!("event key must be non-empty and must not contain '/'");
    }
    if name.trim().is_empty() {
        anyhow::bail!("event name must not be empty");
    }

    let options = options
        .filter(|raw| !raw.trim().is_empty())
        .unwrap_or_else(|| workspace.config().default_options.clone());

    let event = EventConfig {
        key: EventKey::from(key),
        name,
        date,
        location,
        options: Some(options),
    };
    workspace.store().put_event(event);
    workspace.save()?;

    tracing::info!(event = %key, "event saved");
    output::print_success(&format!("Event {} saved", key), format);
    Ok(())
}
