//! Repository layer: typed, read-mostly access to the reference tables.
//!
//! Rows are decoded by column name into an intermediate row struct, then
//! validated into the domain record. A missing column, a NULL in a required
//! column, an unknown enum value or malformed JSON list is an error, never a
//! partially filled record.

mod allergy;
mod contraindication;
mod drug_class;
mod interaction;
mod therapeutic_range;

pub use allergy::*;
pub use contraindication::*;
pub use drug_class::*;
pub use interaction::*;
pub use therapeutic_range::*;

use super::DatabaseError;

/// Decode a JSON array-of-strings column.
pub(crate) fn decode_json_list(
    table: &'static str,
    column: &'static str,
    raw: &str,
) -> Result<Vec<String>, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::InvalidColumn {
        table,
        column,
        reason: e.to_string(),
    })
}

#[cfg(test)]
pub(crate) fn encode_json_list(items: &[String]) -> String {
    serde_json::Value::from(items.to_vec()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_list_decodes_strings() {
        let list = decode_json_list("t", "c", r#"["a","b"]"#).unwrap();
        assert_eq!(list, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn json_list_rejects_non_arrays() {
        let err = decode_json_list("allergies", "cross_reactive_classes", "penicillin").unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::InvalidColumn { column: "cross_reactive_classes", .. }
        ));
    }

    #[test]
    fn json_list_roundtrips_through_encoder() {
        let items = vec!["INR".to_string(), "signs of \"bleeding\"".to_string()];
        let raw = encode_json_list(&items);
        assert_eq!(decode_json_list("t", "c", &raw).unwrap(), items);
    }
}
