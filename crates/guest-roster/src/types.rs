//! Core types for the guest roster.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ulid::Ulid;

/// Unique identifier for an event (owned by the event collaborator).
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(pub String);

impl EventKey {
    /// Creates an event key from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the event key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EventKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a guest record within an event.
///
/// Store-generated keys are monotonic ULIDs, so lexicographic key order
/// follows creation order. Snapshot iteration relies on that.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestKey(pub String);

impl GuestKey {
    /// Creates a new random guest key.
    ///
    /// Keys made in different milliseconds sort by creation time; within one
    /// millisecond the order is random. Stores hand out strictly increasing
    /// keys through [`GuestStore::new_key`](crate::GuestStore::new_key).
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Creates a guest key from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the guest key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GuestKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GuestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GuestKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GuestKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<Ulid> for GuestKey {
    fn from(id: Ulid) -> Self {
        Self(id.to_string())
    }
}

/// Location of one guest record: `guests/{event}/{guest}`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GuestPath {
    pub event: EventKey,
    pub guest: GuestKey,
}

impl GuestPath {
    pub fn new(event: impl Into<EventKey>, guest: impl Into<GuestKey>) -> Self {
        Self {
            event: event.into(),
            guest: guest.into(),
        }
    }
}

impl std::fmt::Display for GuestPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "guests/{}/{}", self.event, self.guest)
    }
}

/// The optional attributes an event can expose as columns.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestAttribute {
    Rg,
    Phone,
    Table,
    Email,
    Cpf,
    City,
    Company,
}

impl GuestAttribute {
    /// Every recognized attribute, in declaration order.
    pub const ALL: [GuestAttribute; 7] = [
        GuestAttribute::Rg,
        GuestAttribute::Phone,
        GuestAttribute::Table,
        GuestAttribute::Email,
        GuestAttribute::Cpf,
        GuestAttribute::City,
        GuestAttribute::Company,
    ];

    /// The option name used in event configuration and stored records.
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestAttribute::Rg => "rg",
            GuestAttribute::Phone => "phone",
            GuestAttribute::Table => "table",
            GuestAttribute::Email => "email",
            GuestAttribute::Cpf => "cpf",
            GuestAttribute::City => "city",
            GuestAttribute::Company => "company",
        }
    }

    /// Parses an option name. Matching is exact.
    pub fn parse(option: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.as_str() == option)
    }
}

impl std::fmt::Display for GuestAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A guest as stored in an event's collection.
///
/// The key is not part of the record; it is the collection entry's key.
/// Fields the roster does not model are kept in `extra` and written back
/// untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuestRecord {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_opt_text")]
    pub rg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_opt_text")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_opt_text")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_opt_text")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_opt_text")]
    pub cpf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_opt_text")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_opt_text")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "deserialize_truthy")]
    pub arrived: bool,
    /// `None` for a root guest. Serialized as `""` in that case.
    #[serde(
        default,
        deserialize_with = "deserialize_parent",
        serialize_with = "serialize_parent"
    )]
    pub parent: Option<GuestKey>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl GuestRecord {
    /// Creates a root guest with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, attr: GuestAttribute, value: impl Into<String>) -> Self {
        self.set_attribute(attr, Some(value.into()));
        self
    }

    /// Builder-style parent setter.
    pub fn with_parent(mut self, parent: impl Into<GuestKey>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Returns true when the guest has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn attribute(&self, attr: GuestAttribute) -> Option<&str> {
        self.attribute_slot(attr).as_deref()
    }

    pub fn set_attribute(&mut self, attr: GuestAttribute, value: Option<String>) {
        *self.attribute_slot_mut(attr) = value.filter(|v| !v.is_empty());
    }

    /// Reads a field by its column data index.
    ///
    /// Recognized attributes come from their typed slots; anything else is
    /// looked up in `extra` and rendered as text.
    pub fn field(&self, data_index: &str) -> Option<String> {
        if data_index == "name" {
            return Some(self.name.clone());
        }
        if let Some(attr) = GuestAttribute::parse(data_index) {
            return self.attribute(attr).map(str::to_string);
        }
        self.extra.get(data_index).and_then(value_as_text)
    }

    fn attribute_slot(&self, attr: GuestAttribute) -> &Option<String> {
        match attr {
            GuestAttribute::Rg => &self.rg,
            GuestAttribute::Phone => &self.phone,
            GuestAttribute::Table => &self.table,
            GuestAttribute::Email => &self.email,
            GuestAttribute::Cpf => &self.cpf,
            GuestAttribute::City => &self.city,
            GuestAttribute::Company => &self.company,
        }
    }

    fn attribute_slot_mut(&mut self, attr: GuestAttribute) -> &mut Option<String> {
        match attr {
            GuestAttribute::Rg => &mut self.rg,
            GuestAttribute::Phone => &mut self.phone,
            GuestAttribute::Table => &mut self.table,
            GuestAttribute::Email => &mut self.email,
            GuestAttribute::Cpf => &mut self.cpf,
            GuestAttribute::City => &mut self.city,
            GuestAttribute::Company => &mut self.company,
        }
    }
}

/// A field-level partial update of a guest record.
///
/// Fields left untouched keep their stored value (last write wins per
/// field). The parent link cannot be patched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuestPatch {
    pub name: Option<String>,
    pub arrived: Option<bool>,
    /// `Some(None)` clears the attribute.
    pub attributes: BTreeMap<GuestAttribute, Option<String>>,
}

impl GuestPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn arrived(mut self, arrived: bool) -> Self {
        self.arrived = Some(arrived);
        self
    }

    pub fn set(mut self, attr: GuestAttribute, value: impl Into<String>) -> Self {
        self.attributes.insert(attr, Some(value.into()));
        self
    }

    pub fn clear(mut self, attr: GuestAttribute) -> Self {
        self.attributes.insert(attr, None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.arrived.is_none() && self.attributes.is_empty()
    }

    /// Applies the patch to a record in place.
    pub fn apply_to(&self, record: &mut GuestRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(arrived) = self.arrived {
            record.arrived = arrived;
        }
        for (attr, value) in &self.attributes {
            record.set_attribute(*attr, value.clone());
        }
    }
}

/// Event details supplied by the event collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default)]
    pub key: EventKey,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    /// Comma-separated attribute names to show as columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

fn value_as_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_opt_text(deserializer)?.unwrap_or_default())
}

/// Accepts strings, numbers and booleans; empty strings and null map to `None`.
fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_as_text(&value).filter(|s| !s.is_empty()))
}

/// Stored data uses both booleans and marker strings ("chegou") for arrival.
fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// Any falsy value (`null`, `false`, `0`, `""`) marks a root guest.
fn deserialize_parent<'de, D>(deserializer: D) -> Result<Option<GuestKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if !is_truthy(&value) {
        return Ok(None);
    }
    Ok(value_as_text(&value).map(GuestKey))
}

fn serialize_parent<S>(parent: &Option<GuestKey>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(parent.as_ref().map(GuestKey::as_str).unwrap_or(""))
}
