use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::decode_json_list;
use crate::db::DatabaseError;
use crate::models::enums::{ContraindicationKind, ContraindicationSeverity};
use crate::models::{normalize_code, normalize_name, ContraindicationRecord};

struct ContraindicationRow {
    medication: String,
    condition_code: String,
    kind: String,
    severity: String,
    rationale: String,
    alternatives: String,
    evidence_level: Option<String>,
}

impl ContraindicationRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            medication: row.get("medication")?,
            condition_code: row.get("condition_code")?,
            kind: row.get("kind")?,
            severity: row.get("severity")?,
            rationale: row.get("rationale")?,
            alternatives: row.get("alternatives")?,
            evidence_level: row.get("evidence_level")?,
        })
    }

    fn into_record(self) -> Result<ContraindicationRecord, DatabaseError> {
        Ok(ContraindicationRecord {
            medication: self.medication,
            condition_code: self.condition_code,
            kind: ContraindicationKind::from_str(&self.kind)?,
            severity: ContraindicationSeverity::from_str(&self.severity)?,
            rationale: self.rationale,
            alternatives: decode_json_list("contraindications", "alternatives", &self.alternatives)?,
            evidence_level: self.evidence_level,
        })
    }
}

/// Exact lookup by medication name (case-insensitive) and ICD-10 code
/// (upper-cased).
pub fn find_contraindication(
    conn: &Connection,
    medication: &str,
    condition_code: &str,
) -> Result<Option<ContraindicationRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT medication, condition_code, kind, severity, rationale, alternatives, evidence_level
             FROM contraindications
             WHERE LOWER(medication) = ?1 AND UPPER(condition_code) = ?2",
            params![normalize_name(medication), normalize_code(condition_code)],
            ContraindicationRow::read,
        )
        .optional()?;

    row.map(ContraindicationRow::into_record).transpose()
}
