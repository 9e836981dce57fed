//! Data store schema reference
//!
//! Read-only descriptions of the tables and database functions the phone
//! automation backend exposes. Used by the CLI `schema` command.

use serde::Serialize;

/// Kind of schema object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaObjectKind {
    Table,
    Function,
}

/// One documented schema object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaEntry {
    pub name: &'static str,
    pub kind: SchemaObjectKind,
    pub description: &'static str,
}

const fn table(name: &'static str, description: &'static str) -> SchemaEntry {
    SchemaEntry {
        name,
        kind: SchemaObjectKind::Table,
        description,
    }
}

const fn function(name: &'static str, description: &'static str) -> SchemaEntry {
    SchemaEntry {
        name,
        kind: SchemaObjectKind::Function,
        description,
    }
}

const BUILTIN: &[SchemaEntry] = &[
    table(
        "businesses",
        "Small businesses using the service: name, timezone, owner contact and forwarding number",
    ),
    table(
        "phone_numbers",
        "Provisioned inbound numbers, each owned by exactly one business",
    ),
    table(
        "customers",
        "Callers and texters known to a business, keyed by E.164 phone number",
    ),
    table(
        "calls",
        "One row per inbound call: call SID, stream SID, status, start and end timestamps",
    ),
    table(
        "call_transcripts",
        "Ordered transcript segments for a call, with speaker and offset in milliseconds",
    ),
    table(
        "sms_messages",
        "Inbound and outbound SMS with direction, sender, recipient and body",
    ),
    table(
        "appointments",
        "Jobs booked from calls or texts: customer, catalog item, requested window",
    ),
    table(
        "catalog_items",
        "Local mirror of commerce catalog items with the remote catalog object id",
    ),
    function(
        "get_business_by_phone",
        "Returns the business owning an inbound number, or no rows",
    ),
    function(
        "upsert_customer",
        "Inserts or updates a customer by phone number and returns its id",
    ),
    function(
        "log_call_event",
        "Appends a lifecycle event (start, stop, transfer) to a call",
    ),
    function(
        "search_catalog_items",
        "Full-text search over a business's catalog items by name and description",
    ),
];

/// Static mapping of schema object name to description
#[derive(Debug, Clone, Copy)]
pub struct SchemaDescriptor {
    entries: &'static [SchemaEntry],
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemaDescriptor {
    /// The schema shipped with the backend
    pub const fn builtin() -> Self {
        Self { entries: BUILTIN }
    }

    /// All entries in declaration order
    pub fn entries(&self) -> &'static [SchemaEntry] {
        self.entries
    }

    /// Description of a table or function
    pub fn describe(&self, name: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.description)
    }

    /// Table entries
    pub fn tables(&self) -> impl Iterator<Item = &'static SchemaEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == SchemaObjectKind::Table)
    }

    /// Function entries
    pub fn functions(&self) -> impl Iterator<Item = &'static SchemaEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == SchemaObjectKind::Function)
    }
}
