use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::decode_json_list;
use crate::db::DatabaseError;
use crate::models::enums::PediatricFormula;
use crate::models::{
    normalize_name, GeriatricRule, HepaticRule, PediatricRule, RenalRule, TherapeuticRange,
};

const TABLE: &str = "therapeutic_ranges";

struct TherapeuticRangeRow {
    medication: String,
    route: String,
    min_dose: f64,
    max_dose: f64,
    unit: String,
    max_daily_dose: Option<f64>,
    pediatric_rule: i32,
    pediatric_formula: Option<String>,
    geriatric_max_reduction_percent: Option<f64>,
    geriatric_recommendation: Option<String>,
    renal_gfr_threshold: Option<f64>,
    renal_reduction_percent: Option<f64>,
    hepatic_recommendation: Option<String>,
    monitoring: String,
}

impl TherapeuticRangeRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            medication: row.get("medication")?,
            route: row.get("route")?,
            min_dose: row.get("min_dose")?,
            max_dose: row.get("max_dose")?,
            unit: row.get("unit")?,
            max_daily_dose: row.get("max_daily_dose")?,
            pediatric_rule: row.get("pediatric_rule")?,
            pediatric_formula: row.get("pediatric_formula")?,
            geriatric_max_reduction_percent: row.get("geriatric_max_reduction_percent")?,
            geriatric_recommendation: row.get("geriatric_recommendation")?,
            renal_gfr_threshold: row.get("renal_gfr_threshold")?,
            renal_reduction_percent: row.get("renal_reduction_percent")?,
            hepatic_recommendation: row.get("hepatic_recommendation")?,
            monitoring: row.get("monitoring")?,
        })
    }

    fn into_range(self) -> Result<TherapeuticRange, DatabaseError> {
        let pediatric = if self.pediatric_rule != 0 {
            let formula = self
                .pediatric_formula
                .as_deref()
                .map(PediatricFormula::from_str)
                .transpose()?;
            Some(PediatricRule { formula })
        } else {
            None
        };

        let geriatric = self
            .geriatric_max_reduction_percent
            .map(|max_reduction_percent| GeriatricRule {
                max_reduction_percent,
                recommendation: self.geriatric_recommendation,
            });

        let renal = match (self.renal_gfr_threshold, self.renal_reduction_percent) {
            (Some(gfr_threshold), Some(reduction_percent)) => Some(RenalRule {
                gfr_threshold,
                reduction_percent,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(incomplete("renal_reduction_percent")),
            (None, Some(_)) => return Err(incomplete("renal_gfr_threshold")),
        };

        Ok(TherapeuticRange {
            medication: self.medication,
            route: self.route,
            min_dose: self.min_dose,
            max_dose: self.max_dose,
            unit: self.unit,
            max_daily_dose: self.max_daily_dose,
            pediatric,
            geriatric,
            renal,
            hepatic: self
                .hepatic_recommendation
                .map(|recommendation| HepaticRule { recommendation }),
            monitoring: decode_json_list(TABLE, "monitoring", &self.monitoring)?,
        })
    }
}

fn incomplete(column: &'static str) -> DatabaseError {
    DatabaseError::InvalidColumn {
        table: TABLE,
        column,
        reason: "renal rule requires both threshold and reduction".into(),
    }
}

pub fn find_therapeutic_range(
    conn: &Connection,
    medication: &str,
    route: &str,
) -> Result<Option<TherapeuticRange>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT medication, route, min_dose, max_dose, unit, max_daily_dose,
                    pediatric_rule, pediatric_formula,
                    geriatric_max_reduction_percent, geriatric_recommendation,
                    renal_gfr_threshold, renal_reduction_percent,
                    hepatic_recommendation, monitoring
             FROM therapeutic_ranges
             WHERE LOWER(medication) = ?1 AND LOWER(route) = ?2",
            params![normalize_name(medication), normalize_name(route)],
            TherapeuticRangeRow::read,
        )
        .optional()?;

    row.map(TherapeuticRangeRow::into_range).transpose()
}
