use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::normalize_name;

pub fn get_drug_class(conn: &Connection, medication: &str) -> Result<Option<String>, DatabaseError> {
    let class = conn
        .query_row(
            "SELECT drug_class FROM drug_classes WHERE LOWER(medication) = ?1",
            params![normalize_name(medication)],
            |row| row.get::<_, String>("drug_class"),
        )
        .optional()?;
    Ok(class)
}
