// ============================================================
// ENTITY SCHEMAS
// ============================================================
// Canonical field lists and header synonym tables per importable entity.
// Field order doubles as the auto-mapping priority.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::system_field::{EnumPolicy, FieldKind, SystemField};
use crate::domain::error::AppError;

/// Entities that can be bulk-loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Control,
    Vendor,
    Backup,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Control, EntityKind::Vendor, EntityKind::Backup];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Control => "control",
            EntityKind::Vendor => "vendor",
            EntityKind::Backup => "backup",
        }
    }

    pub fn schema(&self) -> &'static EntitySchema {
        match self {
            EntityKind::Control => &CONTROL_SCHEMA,
            EntityKind::Vendor => &VENDOR_SCHEMA,
            EntityKind::Backup => &BACKUP_SCHEMA,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "control" | "controls" => Ok(EntityKind::Control),
            "vendor" | "vendors" => Ok(EntityKind::Vendor),
            "backup" | "backups" | "backup_record" | "backup_records" => Ok(EntityKind::Backup),
            other => Err(AppError::ValidationError(format!(
                "Unknown import entity: {}",
                other
            ))),
        }
    }
}

/// `canonical_key -> aliases`
pub type SynonymTable = &'static [(&'static str, &'static [&'static str])];

/// Everything the importer needs to know about one entity
#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,

    /// Target table in the record store
    pub table: &'static str,

    pub fields: &'static [SystemField],

    pub synonyms: SynonymTable,
}

impl EntitySchema {
    pub fn field(&self, key: &str) -> Option<&'static SystemField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static SystemField> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn identifier(&self) -> Option<&'static SystemField> {
        self.fields.iter().find(|f| f.is_identifier())
    }

    pub fn aliases(&self, key: &str) -> &'static [&'static str] {
        self.synonyms
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|f| f.key)
    }
}

// ------------------------------------------------------------
// Controls
// ------------------------------------------------------------

pub const CONTROL_STATUSES: &[&str] = &["not_started", "in_progress", "implemented", "not_applicable"];

static CONTROL_FIELDS: [SystemField; 11] = [
    SystemField::new(
        "code",
        "Control code",
        true,
        "Unique control reference, e.g. CTRL-001",
        FieldKind::Identifier { prefix: None },
        "CTRL-001",
    ),
    SystemField::new("name", "Name", true, "Short control title", FieldKind::Name, "Access Control Policy"),
    SystemField::new(
        "description",
        "Description",
        false,
        "What the control requires",
        FieldKind::Text,
        "Access to systems is granted on a need-to-know basis",
    ),
    SystemField::new("category", "Category", false, "Control domain", FieldKind::Text, "Access Management"),
    SystemField::new("framework", "Framework", false, "Source framework", FieldKind::Text, "ISO 27001"),
    SystemField::new(
        "status",
        "Status",
        false,
        "Implementation status",
        FieldKind::Enumeration {
            allowed: CONTROL_STATUSES,
            policy: EnumPolicy::Fallback("not_started"),
        },
        "in_progress",
    ),
    SystemField::new(
        "weight",
        "Weight",
        false,
        "Relative importance from 1 to 5",
        FieldKind::Integer {
            min: 1,
            max: 5,
            default: Some(1),
        },
        "3",
    ),
    SystemField::new("owner", "Owner", false, "Responsible person", FieldKind::Text, "Jane Doe"),
    SystemField::new(
        "owner_email",
        "Owner e-mail",
        false,
        "Contact address of the owner",
        FieldKind::Email,
        "jane.doe@example.com",
    ),
    SystemField::new(
        "review_date",
        "Review date",
        false,
        "Next review, YYYY-MM-DD",
        FieldKind::Date,
        "2025-06-30",
    ),
    SystemField::new(
        "order_index",
        "Order",
        false,
        "Sort position in the control list",
        FieldKind::OrderIndex,
        "1",
    ),
];

const CONTROL_SYNONYMS: SynonymTable = &[
    (
        "code",
        &["code", "controlcode", "controlid", "id", "ref", "reference", "number", "nr", "kennung"],
    ),
    ("name", &["name", "title", "controlname", "control", "bezeichnung", "titel"]),
    ("description", &["description", "desc", "details", "requirement", "beschreibung"]),
    ("category", &["category", "domain", "group", "kategorie", "bereich"]),
    ("framework", &["framework", "standard", "source", "norm"]),
    ("status", &["status", "state", "implementationstatus", "zustand"]),
    ("weight", &["weight", "priority", "importance", "gewichtung", "prio"]),
    ("owner", &["owner", "responsible", "assignee", "verantwortlich"]),
    ("owner_email", &["owneremail", "email", "mail", "contactemail"]),
    ("review_date", &["reviewdate", "nextreview", "duedate", "review", "datum"]),
    ("order_index", &["orderindex", "order", "sort", "sortorder", "position", "reihenfolge"]),
];

pub static CONTROL_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Control,
    table: "controls",
    fields: &CONTROL_FIELDS,
    synonyms: CONTROL_SYNONYMS,
};

// ------------------------------------------------------------
// Vendors
// ------------------------------------------------------------

pub const VENDOR_CRITICALITIES: &[&str] = &["low", "medium", "high", "critical"];
pub const VENDOR_CLASSIFICATIONS: &[&str] = &["public", "internal", "confidential", "restricted"];
pub const VENDOR_STATUSES: &[&str] = &["active", "onboarding", "inactive", "offboarded"];

static VENDOR_FIELDS: [SystemField; 13] = [
    SystemField::new(
        "code",
        "Vendor code",
        false,
        "Unique vendor reference; generated as VND-### when empty",
        FieldKind::Identifier { prefix: Some("VND") },
        "VND-001",
    ),
    SystemField::new("name", "Name", true, "Legal or trading name", FieldKind::Name, "Acme Hosting GmbH"),
    SystemField::new("contact_name", "Contact", false, "Primary contact person", FieldKind::Text, "John Smith"),
    SystemField::new(
        "contact_email",
        "Contact e-mail",
        false,
        "Primary contact address",
        FieldKind::Email,
        "john.smith@acme.example",
    ),
    SystemField::new("website", "Website", false, "Vendor website", FieldKind::Text, "https://acme.example"),
    SystemField::new("category", "Category", false, "Service category", FieldKind::Text, "Cloud Hosting"),
    SystemField::new(
        "criticality",
        "Criticality",
        false,
        "Business criticality",
        FieldKind::Enumeration {
            allowed: VENDOR_CRITICALITIES,
            policy: EnumPolicy::Strict,
        },
        "high",
    ),
    SystemField::new(
        "classification",
        "Data classification",
        false,
        "Highest classification of data shared with the vendor",
        FieldKind::Enumeration {
            allowed: VENDOR_CLASSIFICATIONS,
            policy: EnumPolicy::Fallback("internal"),
        },
        "confidential",
    ),
    SystemField::new(
        "status",
        "Status",
        false,
        "Relationship status",
        FieldKind::Enumeration {
            allowed: VENDOR_STATUSES,
            policy: EnumPolicy::Fallback("active"),
        },
        "active",
    ),
    SystemField::new(
        "risk_weight",
        "Risk weight",
        false,
        "Inherent risk from 1 to 5",
        FieldKind::Integer {
            min: 1,
            max: 5,
            default: Some(3),
        },
        "4",
    ),
    SystemField::new(
        "contract_start",
        "Contract start",
        false,
        "YYYY-MM-DD",
        FieldKind::Date,
        "2024-01-01",
    ),
    SystemField::new("contract_end", "Contract end", false, "YYYY-MM-DD", FieldKind::Date, "2026-12-31"),
    SystemField::new("notes", "Notes", false, "Free text", FieldKind::Text, "Annual audit report on file"),
];

const VENDOR_SYNONYMS: SynonymTable = &[
    ("code", &["code", "vendorcode", "vendorid", "supplierid", "id", "ref", "reference", "lieferantennummer"]),
    (
        "name",
        &["name", "vendor", "vendorname", "supplier", "suppliername", "company", "companyname", "lieferant", "firma"],
    ),
    ("contact_name", &["contactname", "contact", "contactperson", "ansprechpartner"]),
    ("contact_email", &["contactemail", "email", "mail", "emailaddress", "e-mail"]),
    ("website", &["website", "url", "homepage", "web"]),
    ("category", &["category", "type", "servicetype", "service", "kategorie"]),
    ("criticality", &["criticality", "critical", "severity", "kritikalitat", "kritikalität"]),
    ("classification", &["classification", "dataclassification", "confidentiality", "schutzbedarf"]),
    ("status", &["status", "state", "vendorstatus"]),
    ("risk_weight", &["riskweight", "weight", "risk", "riskscore", "risikogewicht"]),
    ("contract_start", &["contractstart", "startdate", "start", "vertragsbeginn"]),
    ("contract_end", &["contractend", "enddate", "end", "vertragsende"]),
    ("notes", &["notes", "note", "comment", "comments", "remarks", "bemerkung"]),
];

pub static VENDOR_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Vendor,
    table: "vendors",
    fields: &VENDOR_FIELDS,
    synonyms: VENDOR_SYNONYMS,
};

// ------------------------------------------------------------
// Backup records
// ------------------------------------------------------------

pub const BACKUP_TYPES: &[&str] = &["full", "incremental", "differential", "snapshot"];
pub const BACKUP_FREQUENCIES: &[&str] = &["hourly", "daily", "weekly", "monthly"];
pub const BACKUP_STATUSES: &[&str] = &["successful", "failed", "partial", "pending"];

static BACKUP_FIELDS: [SystemField; 12] = [
    SystemField::new(
        "code",
        "Backup code",
        false,
        "Unique backup job reference; generated as BKP-### when empty",
        FieldKind::Identifier { prefix: Some("BKP") },
        "BKP-001",
    ),
    SystemField::new(
        "system_name",
        "System",
        true,
        "System or application being backed up",
        FieldKind::Name,
        "ERP Database",
    ),
    SystemField::new(
        "backup_type",
        "Backup type",
        false,
        "full, incremental, differential or snapshot",
        FieldKind::Enumeration {
            allowed: BACKUP_TYPES,
            policy: EnumPolicy::Strict,
        },
        "full",
    ),
    SystemField::new(
        "frequency",
        "Frequency",
        false,
        "How often the backup runs",
        FieldKind::Enumeration {
            allowed: BACKUP_FREQUENCIES,
            policy: EnumPolicy::Fallback("daily"),
        },
        "daily",
    ),
    SystemField::new(
        "status",
        "Last status",
        false,
        "Outcome of the last run",
        FieldKind::Enumeration {
            allowed: BACKUP_STATUSES,
            policy: EnumPolicy::Fallback("pending"),
        },
        "successful",
    ),
    SystemField::new(
        "criticality",
        "Criticality",
        false,
        "Recovery priority from 1 to 3",
        FieldKind::Integer {
            min: 1,
            max: 3,
            default: Some(2),
        },
        "1",
    ),
    SystemField::new("location", "Location", false, "Storage target", FieldKind::Text, "Offsite S3 bucket"),
    SystemField::new(
        "responsible_email",
        "Responsible e-mail",
        false,
        "Who gets paged on failure",
        FieldKind::Email,
        "ops@example.com",
    ),
    SystemField::new(
        "last_backup_date",
        "Last backup",
        false,
        "YYYY-MM-DD",
        FieldKind::Date,
        "2025-01-15",
    ),
    SystemField::new(
        "last_test_date",
        "Last restore test",
        false,
        "YYYY-MM-DD",
        FieldKind::Date,
        "2024-12-01",
    ),
    SystemField::new(
        "retention_days",
        "Retention (days)",
        false,
        "Days backups are kept, 1 to 3650",
        FieldKind::Integer {
            min: 1,
            max: 3650,
            default: None,
        },
        "90",
    ),
    SystemField::new("notes", "Notes", false, "Free text", FieldKind::Text, "Encrypted at rest"),
];

const BACKUP_SYNONYMS: SynonymTable = &[
    ("code", &["code", "backupcode", "backupid", "jobid", "id", "ref", "reference"]),
    ("system_name", &["systemname", "system", "application", "app", "asset", "name", "server"]),
    ("backup_type", &["backuptype", "type", "method", "sicherungsart"]),
    ("frequency", &["frequency", "schedule", "interval", "rhythmus"]),
    ("status", &["status", "laststatus", "result", "state"]),
    ("criticality", &["criticality", "priority", "tier", "prio"]),
    ("location", &["location", "target", "storage", "destination", "speicherort"]),
    ("responsible_email", &["responsibleemail", "email", "owneremail", "contactemail", "mail"]),
    ("last_backup_date", &["lastbackupdate", "lastbackup", "backupdate", "date"]),
    ("last_test_date", &["lasttestdate", "lasttest", "restoretest", "testdate"]),
    ("retention_days", &["retentiondays", "retention", "keepdays", "aufbewahrung"]),
    ("notes", &["notes", "note", "comment", "comments", "remarks"]),
];

pub static BACKUP_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Backup,
    table: "backup_records",
    fields: &BACKUP_FIELDS,
    synonyms: BACKUP_SYNONYMS,
};
