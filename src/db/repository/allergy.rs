use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::decode_json_list;
use crate::db::DatabaseError;
use crate::models::enums::AllergySeverity;
use crate::models::{normalize_name, AllergyRecord};

struct AllergyRow {
    patient_id: Option<String>,
    allergen: String,
    allergen_class: Option<String>,
    severity: String,
    reaction: Option<String>,
    cross_reactive_classes: String,
}

impl AllergyRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            patient_id: row.get("patient_id")?,
            allergen: row.get("allergen")?,
            allergen_class: row.get("allergen_class")?,
            severity: row.get("severity")?,
            reaction: row.get("reaction")?,
            cross_reactive_classes: row.get("cross_reactive_classes")?,
        })
    }

    fn into_record(self) -> Result<AllergyRecord, DatabaseError> {
        Ok(AllergyRecord {
            patient_id: self.patient_id,
            allergen: self.allergen,
            allergen_class: self.allergen_class,
            severity: AllergySeverity::from_str(&self.severity)?,
            reaction: self.reaction,
            cross_reactive_classes: decode_json_list(
                "allergies",
                "cross_reactive_classes",
                &self.cross_reactive_classes,
            )?,
        })
    }
}

/// Look up an allergen record. With a `patient_id` the patient's own record
/// is preferred over the catalogue entry; without one only catalogue rows
/// (`patient_id IS NULL`) are considered.
pub fn find_allergy(
    conn: &Connection,
    allergen: &str,
    patient_id: Option<&str>,
) -> Result<Option<AllergyRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT patient_id, allergen, allergen_class, severity, reaction, cross_reactive_classes
             FROM allergies
             WHERE LOWER(allergen) = ?1 AND (patient_id IS NULL OR patient_id = ?2)
             ORDER BY patient_id IS NULL, id
             LIMIT 1",
            params![normalize_name(allergen), patient_id],
            AllergyRow::read,
        )
        .optional()?;

    row.map(AllergyRow::into_record).transpose()
}
