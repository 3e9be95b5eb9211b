//! Column schema derived from an event's configured options.
//!
//! The event stores a comma-separated list of attribute names. The schema is
//! always: the name column, then the configured attributes in configured
//! order, then the fixed status and action columns.

use std::cmp::Ordering;

use serde::Serialize;

use crate::hierarchy::GuestNode;
use crate::types::{GuestAttribute, GuestRecord};

/// Options used when an event has none configured.
pub const DEFAULT_OPTIONS: &str = "name";

const NAME_TITLE: &str = "Nome do Convidado";
const STATUS_TITLE: &str = "Status";
const ACTION_TITLE: &str = "Ação";

/// Human-readable title for a configured option.
///
/// This is the one place option names are mapped to titles. Unrecognized
/// options get an empty title.
pub fn option_title(option: &str) -> &'static str {
    match GuestAttribute::parse(option) {
        Some(GuestAttribute::Rg) => "R.G.",
        Some(GuestAttribute::Phone) => "Telefone",
        Some(GuestAttribute::Table) => "Mesa",
        Some(GuestAttribute::Email) => "Email",
        Some(GuestAttribute::Cpf) => "CPF",
        Some(GuestAttribute::City) => "Cidade",
        Some(GuestAttribute::Company) => "Empresa",
        None => "",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
}

/// What a column shows and how it behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnKind {
    /// Guest name; sortable.
    Name,
    /// A configured option. `attribute` is `None` for unrecognized options.
    Attribute {
        option: String,
        attribute: Option<GuestAttribute>,
    },
    /// Arrival status; filterable.
    Status,
    /// Row actions.
    Action,
}

/// Filters offered by the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    Arrived,
    NotArrived,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 2] = [StatusFilter::Arrived, StatusFilter::NotArrived];

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::Arrived => "Chegou",
            StatusFilter::NotArrived => "Não chegou",
        }
    }

    pub fn matches(&self, record: &GuestRecord) -> bool {
        match self {
            StatusFilter::Arrived => record.arrived,
            StatusFilter::NotArrived => !record.arrived,
        }
    }
}

/// Actions offered on every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestAction {
    Edit,
    Delete,
}

impl GuestAction {
    pub const ALL: [GuestAction; 2] = [GuestAction::Edit, GuestAction::Delete];

    pub fn label(&self) -> &'static str {
        match self {
            GuestAction::Edit => "Editar",
            GuestAction::Delete => "Excluir",
        }
    }
}

/// One column of the guest table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub title: String,
    /// Record field shown in the column. `None` for the action column.
    pub data_index: Option<String>,
    pub key: String,
    pub align: Align,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    fn name() -> Self {
        Self {
            title: NAME_TITLE.to_string(),
            data_index: Some("name".to_string()),
            key: "name".to_string(),
            align: Align::Left,
            kind: ColumnKind::Name,
        }
    }

    fn attribute(option: &str) -> Self {
        Self {
            title: option_title(option).to_string(),
            data_index: Some(option.to_string()),
            key: option.to_string(),
            align: Align::Left,
            kind: ColumnKind::Attribute {
                option: option.to_string(),
                attribute: GuestAttribute::parse(option),
            },
        }
    }

    fn status() -> Self {
        Self {
            title: STATUS_TITLE.to_string(),
            data_index: Some("arrived".to_string()),
            key: "arrived".to_string(),
            align: Align::Left,
            kind: ColumnKind::Status,
        }
    }

    fn action() -> Self {
        Self {
            title: ACTION_TITLE.to_string(),
            data_index: None,
            key: "action".to_string(),
            align: Align::Center,
            kind: ColumnKind::Action,
        }
    }

    /// Text shown in this column for a guest.
    pub fn cell(&self, node: &GuestNode) -> String {
        match &self.kind {
            ColumnKind::Name => node.record.name.clone(),
            ColumnKind::Attribute { option, .. } => node.record.field(option).unwrap_or_default(),
            ColumnKind::Status => {
                if node.record.arrived {
                    "chegou".to_string()
                } else {
                    "não chegou".to_string()
                }
            }
            ColumnKind::Action => GuestAction::ALL
                .iter()
                .map(GuestAction::label)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    /// Ordering used when sorting by this column. Only the name column sorts.
    pub fn compare(&self, a: &GuestRecord, b: &GuestRecord) -> Option<Ordering> {
        match self.kind {
            ColumnKind::Name => Some(
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then_with(|| a.name.cmp(&b.name)),
            ),
            _ => None,
        }
    }

    /// Filters offered by this column.
    pub fn filters(&self) -> &'static [StatusFilter] {
        match self.kind {
            ColumnKind::Status => &StatusFilter::ALL,
            _ => &[],
        }
    }
}

/// Derives the ordered column schema from an event's options string.
///
/// Absent or blank options mean just `name`. Tokens are trimmed and empty
/// tokens skipped. `name` is always first regardless of where it appears.
pub fn derive_columns(options: Option<&str>) -> Vec<ColumnSpec> {
    let options = options
        .filter(|raw| !raw.trim().is_empty())
        .unwrap_or(DEFAULT_OPTIONS);

    let mut columns = vec![ColumnSpec::name()];
    columns.extend(
        options
            .split(',')
            .map(str::trim)
            .filter(|option| !option.is_empty() && *option != "name")
            .map(ColumnSpec::attribute),
    );
    columns.push(ColumnSpec::status());
    columns.push(ColumnSpec::action());
    columns
}
