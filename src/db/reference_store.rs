use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use super::{
    find_allergy, find_contraindication, find_interaction, find_therapeutic_range,
    get_drug_class, open_database, open_memory_database, DatabaseError,
};
use crate::clinical::{LookupError, ReferenceStore};
use crate::models::{
    AllergyRecord, ContraindicationRecord, InteractionRecord, MedicationRef, TherapeuticRange,
};

/// `ReferenceStore` over the SQLite reference database. The connection is
/// shared behind a mutex.
pub struct SqliteReferenceStore {
    conn: Mutex<Connection>,
}

impl SqliteReferenceStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(open_database(path)?))
    }

    /// Migrated and seeded in-memory database.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(open_memory_database()?))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, LookupError> {
        self.conn
            .lock()
            .map_err(|_| LookupError::Unavailable("reference database lock poisoned".into()))
    }
}

impl ReferenceStore for SqliteReferenceStore {
    fn drug_class(&self, medication: &str) -> Result<Option<String>, LookupError> {
        Ok(get_drug_class(&*self.conn()?, medication)?)
    }

    fn find_interaction(
        &self,
        a: &MedicationRef,
        b: &MedicationRef,
    ) -> Result<Option<InteractionRecord>, LookupError> {
        Ok(find_interaction(&*self.conn()?, a, b)?)
    }

    fn find_allergy(
        &self,
        allergen: &str,
        patient_id: Option<&str>,
    ) -> Result<Option<AllergyRecord>, LookupError> {
        Ok(find_allergy(&*self.conn()?, allergen, patient_id)?)
    }

    fn find_contraindication(
        &self,
        medication: &str,
        condition_code: &str,
    ) -> Result<Option<ContraindicationRecord>, LookupError> {
        Ok(find_contraindication(&*self.conn()?, medication, condition_code)?)
    }

    fn find_therapeutic_range(
        &self,
        medication: &str,
        route: &str,
    ) -> Result<Option<TherapeuticRange>, LookupError> {
        Ok(find_therapeutic_range(&*self.conn()?, medication, route)?)
    }
}
