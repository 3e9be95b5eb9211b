//! Event view: details, totals and the guest table.

use std::cmp::Ordering;

use super::Workspace;
use crate::output::{self, OutputFormat, Table};
use anyhow::Result;
use guest_roster::{
    derive_columns, ColumnKind, ColumnSpec, EventConfig, GuestCounts, GuestForest, GuestKey,
    GuestNode, GuestRecord, StatusFilter, SyncOptions, SyncState, SyncView,
};
use serde::Serialize;

/// A table row: a guest and whether it is shown as a companion.
#[derive(Debug, Clone, Copy)]
struct Row<'a> {
    node: &'a GuestNode,
    companion: bool,
}

/// Flattens the forest into table rows.
///
/// A party is kept when its invitee or any companion passes `filter`;
/// companions are listed only when they pass it themselves. Sorting uses the
/// name column's ordering, within parties too.
fn visible_rows<'a>(
    forest: &'a GuestForest,
    columns: &[ColumnSpec],
    filter: Option<StatusFilter>,
    descending: Option<bool>,
) -> Vec<Row<'a>> {
    let passes = |node: &GuestNode| filter.map_or(true, |f| f.matches(&node.record));
    let sort_column = columns.iter().find(|c| matches!(c.kind, ColumnKind::Name));
    let sort = |nodes: &mut Vec<&'a GuestNode>| {
        if let (Some(column), Some(descending)) = (sort_column, descending) {
            nodes.sort_by(|a, b| {
                let ord = column
                    .compare(&a.record, &b.record)
                    .unwrap_or(Ordering::Equal);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
    };

    let mut roots: Vec<&GuestNode> = forest
        .roots()
        .iter()
        .filter(|root| root.iter_party().any(|node| passes(node)))
        .collect();
    sort(&mut roots);

    let mut rows = Vec::new();
    for root in roots {
        // The invitee heads the party even when only a companion matched.
        rows.push(Row {
            node: root,
            companion: false,
        });
        let mut companions: Vec<&GuestNode> =
            root.children.iter().filter(|c| passes(c)).collect();
        sort(&mut companions);
        rows.extend(companions.into_iter().map(|node| Row {
            node,
            companion: true,
        }));
    }
    rows
}

fn render_table(rows: &[Row<'_>], columns: &[ColumnSpec]) -> Table {
    let shown: Vec<&ColumnSpec> = columns
        .iter()
        .filter(|c| !matches!(c.kind, ColumnKind::Action))
        .collect();

    let mut headers = vec!["ID".to_string()];
    headers.extend(shown.iter().map(|c| c.title.clone()));
    let mut table = Table::new(headers);

    for row in rows {
        let id = if row.companion {
            format!("  {}", row.node.key)
        } else {
            row.node.key.to_string()
        };
        let mut cells = vec![id];
        cells.extend(shown.iter().map(|c| c.cell(row.node)));
        table.push(cells);
    }
    table
}

/// A guest as printed: its key followed by the record fields.
#[derive(Serialize)]
struct GuestOutput<'a> {
    key: &'a GuestKey,
    #[serde(flatten)]
    record: GuestRecord,
}

impl<'a> GuestOutput<'a> {
    fn new(node: &'a GuestNode) -> Self {
        let mut record = node.record.clone();
        // A stored `key` field would shadow the real key.
        record.extra.remove("key");
        Self {
            key: &node.key,
            record,
        }
    }
}

#[derive(Serialize)]
struct PartyOutput<'a> {
    #[serde(flatten)]
    guest: GuestOutput<'a>,
    companions: Vec<GuestOutput<'a>>,
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    event: &'a EventConfig,
    state: SyncState,
    counts: GuestCounts,
    columns: &'a [ColumnSpec],
    parties: Vec<PartyOutput<'a>>,
}

fn parties<'a>(rows: &[Row<'a>]) -> Vec<PartyOutput<'a>> {
    let mut parties: Vec<PartyOutput<'a>> = Vec::new();
    for row in rows {
        let guest = GuestOutput::new(row.node);
        match parties.last_mut() {
            Some(party) if row.companion => party.companions.push(guest),
            _ => parties.push(PartyOutput {
                guest,
                companions: Vec::new(),
            }),
        }
    }
    parties
}

/// Waits until the sync controller either delivers the event or gives up.
async fn sync_event(workspace: &Workspace, event: &EventConfig) -> Result<SyncView> {
    let options = SyncOptions::from_timeout_ms(workspace.config().sync_timeout_ms);
    let controller = workspace.roster().sync_controller(options);
    let mut views = controller.views();

    controller.activate(event.key.clone());
    let view = views
        .wait_for(|view| matches!(view.state, SyncState::Synced | SyncState::TimedOut))
        .await?
        .clone();
    controller.deactivate();
    Ok(view)
}

/// Show an event with its totals and guest table.
pub async fn show(
    workspace: &Workspace,
    event: &str,
    filter: Option<StatusFilter>,
    descending: Option<bool>,
    format: &OutputFormat,
) -> Result<()> {
    let event = workspace.event(event)?;
    let view = sync_event(workspace, &event).await?;

    if view.state == SyncState::TimedOut {
        anyhow::bail!("timed out waiting for the guests of {}", event.key);
    }

    let columns = derive_columns(event.options.as_deref());
    let counts = view.counts();
    let rows = visible_rows(&view.forest, &columns, filter, descending);

    match format {
        OutputFormat::Text => {
            output::print_heading(&event.name);
            output::print_row("Data do evento", &event.date);
            output::print_row("Localização", &event.location);
            output::print_row("Total de convidados", &counts.total.to_string());
            output::print_row("Chegaram", &counts.arrived.to_string());
            output::print_row("Não Chegaram", &counts.not_arrived.to_string());
            if let Some(filter) = filter {
                output::print_row("Filtro", filter.label());
            }
            println!();

            if rows.is_empty() {
                println!("No guests found");
            } else {
                println!("{}", render_table(&rows, &columns).render());
            }
        }
        OutputFormat::Json => output::print_json(&ShowOutput {
            event: &event,
            state: view.state,
            counts,
            columns: &columns,
            parties: parties(&rows),
        })?,
    }
    Ok(())
}

/// Print the column schema of an event.
pub fn columns(workspace: &Workspace, event: &str, format: &OutputFormat) -> Result<()> {
    let event = workspace.event(event)?;
    let columns = derive_columns(event.options.as_deref());

    match format {
        OutputFormat::Text => {
            let mut table = Table::new(
                ["Key", "Title", "Align", "Sort", "Filters"]
                    .map(String::from)
                    .to_vec(),
            );
            for column in &columns {
                let sortable = matches!(column.kind, ColumnKind::Name);
                let filters: Vec<_> = column.filters().iter().map(|f| f.label()).collect();
                table.push(vec![
                    column.key.clone(),
                    column.title.clone(),
                    format!("{:?}", column.align).to_lowercase(),
                    if sortable { "yes" } else { "" }.to_string(),
                    filters.join(", "),
                ]);
            }
            println!("{}", table.render());
        }
        OutputFormat::Json => output::print_json(&columns)?,
    }
    Ok(())
}
