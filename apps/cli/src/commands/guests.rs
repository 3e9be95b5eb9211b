//! Guest management commands.

use super::Workspace;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use guest_roster::{
    GuestAttribute, GuestKey, GuestPatch, GuestReader, GuestRecord, GuestWriter,
};
use serde_json::json;

fn record(name: String, attributes: &[(GuestAttribute, String)]) -> GuestRecord {
    attributes
        .iter()
        .fold(GuestRecord::new(name), |record, (attr, value)| {
            record.with_attribute(*attr, value.clone())
        })
}

/// Add a guest.
///
/// With companions the whole party is written as one group; with a parent
/// the guest joins an existing party.
pub fn guests_add(
    workspace: &Workspace,
    event: &str,
    name: String,
    attributes: Vec<(GuestAttribute, String)>,
    companions: Vec<String>,
    parent: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let event = workspace.event(event)?.key;
    let primary = record(name, &attributes);
    let roster = workspace.roster();

    let keys: Vec<GuestKey> = match parent {
        Some(parent) => {
            vec![roster.add_companion(&event, &GuestKey::from(parent), primary)?]
        }
        None if companions.is_empty() => vec![roster.create_guest(&event, primary)?],
        None => {
            let group = std::iter::once(primary)
                .chain(companions.into_iter().map(GuestRecord::new))
                .collect();
            match roster.add_group(&event, group)? {
                Some(receipt) => receipt.keys().cloned().collect(),
                None => Vec::new(),
            }
        }
    };
    workspace.save()?;

    match format {
        OutputFormat::Text => {
            for key in &keys {
                println!("Guest added: {}", key);
            }
        }
        OutputFormat::Json => output::print_json(&json!({ "event": event, "keys": keys }))?,
    }
    Ok(())
}

/// Edit a guest's fields.
pub fn guests_edit(
    workspace: &Workspace,
    event: &str,
    guest: &str,
    name: Option<String>,
    attributes: Vec<(GuestAttribute, String)>,
    cleared: Vec<GuestAttribute>,
    format: &OutputFormat,
) -> Result<()> {
    let path = workspace.guest_path(event, guest)?;

    let mut patch = GuestPatch::new();
    if let Some(name) = name {
        patch = patch.name(name);
    }
    for (attr, value) in attributes {
        patch = patch.set(attr, value);
    }
    for attr in cleared {
        patch = patch.clear(attr);
    }

    workspace.roster().update_guest(&path, patch)?;
    workspace.save()?;

    output::print_success(&format!("Guest {} updated", path.guest), format);
    Ok(())
}

/// Check a guest in or undo the check-in.
pub fn guests_arrive(
    workspace: &Workspace,
    event: &str,
    guest: &str,
    arrived: bool,
    format: &OutputFormat,
) -> Result<()> {
    let path = workspace.guest_path(event, guest)?;
    workspace.roster().set_arrived(&path, arrived)?;
    workspace.save()?;

    let message = if arrived {
        format!("Guest {} checked in", path.guest)
    } else {
        format!("Guest {} check-in undone", path.guest)
    };
    output::print_success(&message, format);
    Ok(())
}

/// Remove a guest, asking first unless `yes` is set.
pub fn guests_remove(
    workspace: &Workspace,
    event: &str,
    guest: &str,
    yes: bool,
    format: &OutputFormat,
) -> Result<()> {
    let path = workspace.guest_path(event, guest)?;
    let snapshot = workspace.roster().snapshot(&path.event)?;
    let Some(record) = snapshot.get(&path.guest) else {
        anyhow::bail!("guest not found: {}", path);
    };

    if !yes {
        let question = format!("Deseja excluir o convidado {}?", record.name);
        if !output::confirm(&question)? {
            output::print_success("Removal cancelled", format);
            return Ok(());
        }
    }

    workspace.roster().remove_guest(&path)?;
    workspace.save()?;

    output::print_success(&format!("Guest {} removed", path.guest), format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guest_roster::{EventConfig, EventKey};
    use guestlist_config_and_utils::{Config, Paths};
    use tempfile::tempdir;

    fn workspace(dir: &std::path::Path) -> Workspace {
        let paths = Paths::with_base_dir(dir.to_path_buf());
        let ws = Workspace::open(paths, Config::default()).unwrap();
        ws.store().put_event(EventConfig {
            key: EventKey::from("e1"),
            name: "Casamento".to_string(),
            ..Default::default()
        });
        ws
    }

    #[test]
    fn add_with_companions_writes_one_party() {
        let dir = tempdir().unwrap();
        let ws = workspace(dir.path());

        guests_add(
            &ws,
            "e1",
            "Alice".to_string(),
            vec![(GuestAttribute::Table, "3".to_string())],
            vec!["Bob".to_string(), "Carol".to_string()],
            None,
            &OutputFormat::Json,
        )
        .unwrap();

        let forest = ws.roster().forest(&EventKey::from("e1")).unwrap();
        assert_eq!(forest.len(), 1);
        let root = &forest.roots()[0];
        assert_eq!(root.record.table.as_deref(), Some("3"));
        assert_eq!(root.children.len(), 2);
        assert!(dir.path().join("guests.json").exists());
    }

    #[test]
    fn add_to_unknown_event_fails() {
        let dir = tempdir().unwrap();
        let ws = workspace(dir.path());

        let result = guests_add(
            &ws,
            "missing",
            "Alice".to_string(),
            Vec::new(),
            Vec::new(),
            None,
            &OutputFormat::Text,
        );
        assert!(result.is_err());
        assert!(!dir.path().join("guests.json").exists());
    }

    #[test]
    fn arrive_edit_and_remove() {
        let dir = tempdir().unwrap();
        let ws = workspace(dir.path());
        let event = EventKey::from("e1");
        let key = ws
            .roster()
            .create_guest(&event, GuestRecord::new("Alice"))
            .unwrap();

        guests_arrive(&ws, "e1", key.as_str(), true, &OutputFormat::Json).unwrap();
        guests_edit(
            &ws,
            "e1",
            key.as_str(),
            Some("Alice Souza".to_string()),
            vec![(GuestAttribute::Phone, "555".to_string())],
            Vec::new(),
            &OutputFormat::Json,
        )
        .unwrap();

        let snapshot = ws.roster().snapshot(&event).unwrap();
        let record = snapshot.get(&key).unwrap();
        assert!(record.arrived);
        assert_eq!(record.name, "Alice Souza");
        assert_eq!(record.phone.as_deref(), Some("555"));

        guests_remove(&ws, "e1", key.as_str(), true, &OutputFormat::Json).unwrap();
        assert!(ws.roster().snapshot(&event).unwrap().is_empty());
    }

    #[test]
    fn remove_unknown_guest_fails() {
        let dir = tempdir().unwrap();
        let ws = workspace(dir.path());

        assert!(guests_remove(&ws, "e1", "nobody", true, &OutputFormat::Text).is_err());
    }
}
