use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::enums::InteractionSeverity;
use crate::models::{InteractionRecord, MedicationRef};

struct InteractionRow {
    drug_a: String,
    drug_a_code: Option<String>,
    drug_b: String,
    drug_b_code: Option<String>,
    severity: String,
    description: String,
    recommended_action: String,
}

impl InteractionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            drug_a: row.get("drug_a")?,
            drug_a_code: row.get("drug_a_code")?,
            drug_b: row.get("drug_b")?,
            drug_b_code: row.get("drug_b_code")?,
            severity: row.get("severity")?,
            description: row.get("description")?,
            recommended_action: row.get("recommended_action")?,
        })
    }

    fn into_record(self) -> Result<InteractionRecord, DatabaseError> {
        Ok(InteractionRecord {
            drug_a: self.drug_a,
            drug_a_code: self.drug_a_code,
            drug_b: self.drug_b,
            drug_b_code: self.drug_b_code,
            severity: InteractionSeverity::from_str(&self.severity)?,
            description: self.description,
            recommended_action: self.recommended_action,
        })
    }
}

/// Find the interaction recorded for an unordered pair. Names match
/// case-insensitively; RxNorm codes match when both sides carry one. When
/// several rows match, the most severe wins.
pub fn find_interaction(
    conn: &Connection,
    a: &MedicationRef,
    b: &MedicationRef,
) -> Result<Option<InteractionRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT drug_a, drug_a_code, drug_b, drug_b_code, severity, description, recommended_action
             FROM interactions
             WHERE (LOWER(drug_a) = ?1 AND LOWER(drug_b) = ?2)
                OR (LOWER(drug_a) = ?2 AND LOWER(drug_b) = ?1)
                OR (?3 IS NOT NULL AND ?4 IS NOT NULL
                    AND ((drug_a_code = ?3 AND drug_b_code = ?4)
                      OR (drug_a_code = ?4 AND drug_b_code = ?3)))
             ORDER BY CASE severity
                 WHEN 'contraindicated' THEN 3
                 WHEN 'major' THEN 2
                 WHEN 'moderate' THEN 1
                 ELSE 0 END DESC
             LIMIT 1",
            params![
                a.normalized_name(),
                b.normalized_name(),
                a.rx_norm_code.as_deref(),
                b.rx_norm_code.as_deref(),
            ],
            InteractionRow::read,
        )
        .optional()?;

    row.map(InteractionRow::into_record).transpose()
}
