//! `SQLite` storage for the local backend's member table.
//!
//! Member ids are the table's integer primary key, so a [`MemberId`] that
//! does not parse as an integer simply matches nothing.

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::error::{BackendError, BackendResult};
use crate::member::{FamilySituation, Gender, MemberFields, MemberId, MemberRecord, SalaryType};

const MEMBER_COLUMNS: &str = "id, first_name, last_name, date_of_birth, gender, national_number, \
     jamaat, family_situation, children_count, children_over_15_count, spouse_is_ahmadi, \
     salary_mad, salary_type, monthly_tchanda, is_mousi, is_active, jamaat_role";

fn db_error(e: &rusqlite::Error) -> BackendError {
    BackendError::Server(format!("Database error: {e}"))
}

fn parse_column<T>(idx: usize, raw: &str, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown value: {raw}").into(),
        )
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<MemberRecord> {
    let id: i64 = row.get(0)?;
    let gender: String = row.get(4)?;
    let family_situation: String = row.get(7)?;
    let salary_type: String = row.get(12)?;

    Ok(MemberRecord {
        id: MemberId::from(id),
        fields: MemberFields {
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            date_of_birth: row.get(3)?,
            gender: parse_column(4, &gender, Gender::parse)?,
            national_number: row.get(5)?,
            jamaat: row.get(6)?,
            family_situation: parse_column(7, &family_situation, FamilySituation::parse)?,
            children_count: row.get(8)?,
            children_over_15_count: row.get(9)?,
            spouse_is_ahmadi: row.get(10)?,
            salary_mad: row.get(11)?,
            salary_type: parse_column(12, &salary_type, SalaryType::parse)?,
            monthly_tchanda: row.get(13)?,
            is_mousi: row.get(14)?,
            is_active: row.get(15)?,
            jamaat_role: row.get(16)?,
        },
    })
}

/// `SQLite`-based storage for member records.
///
/// Thread-safe wrapper around a `SQLite` connection.
pub struct MemberStorage {
    conn: Mutex<Connection>,
}

impl MemberStorage {
    /// Opens (or creates) the member database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn new(path: &Path) -> BackendResult<Self> {
        let conn = Connection::open(path).map_err(|e| db_error(&e))?;
        Self::with_connection(conn)
    }

    /// Creates an in-memory member database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> BackendResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| db_error(&e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> BackendResult<Self> {
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn lock(&self) -> BackendResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| BackendError::Server(format!("Failed to acquire database lock: {e}")))
    }

    /// Initializes the database schema.
    fn initialize_schema(&self) -> BackendResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS members (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                date_of_birth TEXT NOT NULL,
                gender TEXT NOT NULL,
                national_number TEXT NOT NULL,
                jamaat TEXT NOT NULL,
                family_situation TEXT NOT NULL,
                children_count INTEGER NOT NULL DEFAULT 0,
                children_over_15_count INTEGER NOT NULL DEFAULT 0,
                spouse_is_ahmadi INTEGER NOT NULL DEFAULT 0,
                salary_mad REAL NOT NULL DEFAULT 0,
                salary_type TEXT NOT NULL,
                monthly_tchanda REAL NOT NULL DEFAULT 0,
                is_mousi INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                jamaat_role TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )
        .map_err(|e| db_error(&e))?;

        Ok(())
    }

    /// Inserts a member and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_member(&self, fields: &MemberFields) -> BackendResult<MemberRecord> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            r"
            INSERT INTO members (
                first_name, last_name, date_of_birth, gender, national_number, jamaat,
                family_situation, children_count, children_over_15_count, spouse_is_ahmadi,
                salary_mad, salary_type, monthly_tchanda, is_mousi, is_active, jamaat_role,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)
            ",
            params![
                &fields.first_name,
                &fields.last_name,
                &fields.date_of_birth,
                fields.gender.as_str(),
                &fields.national_number,
                &fields.jamaat,
                fields.family_situation.as_str(),
                fields.children_count,
                fields.children_over_15_count,
                fields.spouse_is_ahmadi,
                fields.salary_mad,
                fields.salary_type.as_str(),
                fields.monthly_tchanda,
                fields.is_mousi,
                fields.is_active,
                &fields.jamaat_role,
                now,
            ],
        )
        .map_err(|e| db_error(&e))?;

        Ok(MemberRecord {
            id: MemberId::from(conn.last_insert_rowid()),
            fields: fields.clone(),
        })
    }

    /// Retrieves a member by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_member(&self, id: &MemberId) -> BackendResult<Option<MemberRecord>> {
        let Ok(rowid) = id.as_str().parse::<i64>() else {
            return Ok(None);
        };
        let conn = self.lock()?;

        conn.query_row(
            &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"),
            params![rowid],
            member_from_row,
        )
        .optional()
        .map_err(|e| db_error(&e))
    }

    /// Retrieves all members ordered by last name, then first name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_members(&self) -> BackendResult<Vec<MemberRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {MEMBER_COLUMNS} FROM members ORDER BY last_name, first_name, id"
            ))
            .map_err(|e| db_error(&e))?;

        let members = stmt
            .query_map([], member_from_row)
            .map_err(|e| db_error(&e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| db_error(&e))?;

        Ok(members)
    }

    /// Overwrites a member's fields.
    ///
    /// Returns `false` if no member has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn replace_member(&self, id: &MemberId, fields: &MemberFields) -> BackendResult<bool> {
        let Ok(rowid) = id.as_str().parse::<i64>() else {
            return Ok(false);
        };
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        let changed = conn
            .execute(
                r"
                UPDATE members SET
                    first_name = ?2, last_name = ?3, date_of_birth = ?4, gender = ?5,
                    national_number = ?6, jamaat = ?7, family_situation = ?8,
                    children_count = ?9, children_over_15_count = ?10, spouse_is_ahmadi = ?11,
                    salary_mad = ?12, salary_type = ?13, monthly_tchanda = ?14,
                    is_mousi = ?15, is_active = ?16, jamaat_role = ?17, updated_at = ?18
                WHERE id = ?1
                ",
                params![
                    rowid,
                    &fields.first_name,
                    &fields.last_name,
                    &fields.date_of_birth,
                    fields.gender.as_str(),
                    &fields.national_number,
                    &fields.jamaat,
                    fields.family_situation.as_str(),
                    fields.children_count,
                    fields.children_over_15_count,
                    fields.spouse_is_ahmadi,
                    fields.salary_mad,
                    fields.salary_type.as_str(),
                    fields.monthly_tchanda,
                    fields.is_mousi,
                    fields.is_active,
                    &fields.jamaat_role,
                    now,
                ],
            )
            .map_err(|e| db_error(&e))?;

        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fields(first: &str, last: &str) -> MemberFields {
        MemberFields {
            first_name: first.to_string(),
            last_name: last.to_string(),
            date_of_birth: "1990-01-01".to_string(),
            gender: Gender::Male,
            national_number: "MOR0001".to_string(),
            jamaat: "Rabat".to_string(),
            family_situation: FamilySituation::Married,
            children_count: 1,
            children_over_15_count: 0,
            spouse_is_ahmadi: true,
            salary_mad: 4200.75,
            salary_type: SalaryType::Fixed,
            monthly_tchanda: 120.0,
            is_mousi: true,
            is_active: true,
            jamaat_role: "Member".to_string(),
        }
    }

    #[test]
    fn insert_assigns_ids() {
        let storage = MemberStorage::in_memory().unwrap();
        let a = storage.insert_member(&fields("Ali", "Hassan")).unwrap();
        let b = storage.insert_member(&fields("Fatima", "Zahra")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn get_round_trips_all_columns() {
        let storage = MemberStorage::in_memory().unwrap();
        let created = storage.insert_member(&fields("Ali", "Hassan")).unwrap();

        let loaded = storage.get_member(&created.id).unwrap().unwrap();

        assert_eq!(loaded, created);
    }

    #[test]
    fn get_unknown_or_non_numeric_id_is_none() {
        let storage = MemberStorage::in_memory().unwrap();
        assert!(storage.get_member(&MemberId::new("99")).unwrap().is_none());
        assert!(storage.get_member(&MemberId::new("abc")).unwrap().is_none());
    }

    #[test]
    fn list_orders_by_name() {
        let storage = MemberStorage::in_memory().unwrap();
        storage.insert_member(&fields("Fatima", "Zahra")).unwrap();
        storage.insert_member(&fields("Ali", "Hassan")).unwrap();

        let names: Vec<String> = storage
            .list_members()
            .unwrap()
            .iter()
            .map(MemberRecord::full_name)
            .collect();

        assert_eq!(names, vec!["Ali Hassan", "Fatima Zahra"]);
    }

    #[test]
    fn replace_updates_existing_only() {
        let storage = MemberStorage::in_memory().unwrap();
        let created = storage.insert_member(&fields("Ali", "Hassan")).unwrap();

        let mut changed = created.fields.clone();
        changed.is_active = false;
        assert!(storage.replace_member(&created.id, &changed).unwrap());
        assert!(!storage.replace_member(&MemberId::new("42"), &changed).unwrap());

        let loaded = storage.get_member(&created.id).unwrap().unwrap();
        assert!(!loaded.fields.is_active);
    }

    #[test]
    fn file_backed_storage_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("members.db");

        let id = {
            let storage = MemberStorage::new(&path).unwrap();
            storage.insert_member(&fields("Ali", "Hassan")).unwrap().id
        };

        let reopened = MemberStorage::new(&path).unwrap();
        assert!(reopened.get_member(&id).unwrap().is_some());
    }
}
