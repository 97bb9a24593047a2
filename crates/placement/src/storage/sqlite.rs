//! SQLite-backed record store

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use super::{ApplicationFilter, InternshipFilter, PlacementRepository, RepositoryError};
use crate::identity::{NewUser, Role, User, UserId};
use crate::workflows::placement::domain::{
    Application, ApplicationId, ApplicationStatus, Internship, InternshipId, NewApplication,
    NewInternship,
};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS internships (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        employer_id INTEGER NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        description TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS applications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES users(id),
        internship_id INTEGER NOT NULL REFERENCES internships(id),
        status TEXT NOT NULL DEFAULT 'pending'
    );

    CREATE INDEX IF NOT EXISTS idx_internships_employer ON internships(employer_id);
    CREATE INDEX IF NOT EXISTS idx_applications_student ON applications(student_id);
"#;

const DROP_ALL: &str = r#"
    DROP TABLE IF EXISTS applications;
    DROP TABLE IF EXISTS internships;
    DROP TABLE IF EXISTS users;
"#;

const USER_COLUMNS: &str = "id, username, password_hash, role";
const INTERNSHIP_COLUMNS: &str = "id, employer_id, title, description, is_active, created_at";
const APPLICATION_COLUMNS: &str = "id, student_id, internship_id, status";

/// Store backed by a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database file and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        }

        tracing::info!(path = %path.display(), "opening placement database");
        let conn = Connection::open(path).map_err(map_sqlite_error)?;
        Self::with_connection(conn)
    }

    /// Private database that disappears with the store.
    pub fn in_memory() -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, RepositoryError> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(map_sqlite_error)?;
        conn.execute_batch(SCHEMA).map_err(map_sqlite_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("sqlite connection mutex poisoned".to_string()))
    }
}

fn map_sqlite_error(err: rusqlite::Error) -> RepositoryError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            match failure.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => return RepositoryError::Conflict,
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return RepositoryError::NotFound,
                _ => {}
            }
        }
    }
    RepositoryError::Unavailable(err.to_string())
}

fn encode_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| RepositoryError::Corrupt(format!("created_at '{raw}': {err}")))
}

struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
}

impl UserRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            role: row.get(3)?,
        })
    }

    fn decode(self) -> Result<User, RepositoryError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|err| RepositoryError::Corrupt(err.to_string()))?;
        Ok(User {
            id: UserId(self.id),
            username: self.username,
            password_hash: self.password_hash,
            role,
        })
    }
}

struct InternshipRow {
    id: i64,
    employer_id: i64,
    title: String,
    description: Option<String>,
    is_active: bool,
    created_at: String,
}

impl InternshipRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            employer_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            is_active: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn decode(self) -> Result<Internship, RepositoryError> {
        Ok(Internship {
            id: InternshipId(self.id),
            employer_id: UserId(self.employer_id),
            title: self.title,
            description: self.description,
            is_active: self.is_active,
            created_at: decode_timestamp(&self.created_at)?,
        })
    }
}

struct ApplicationRow {
    id: i64,
    student_id: i64,
    internship_id: i64,
    status: String,
}

impl ApplicationRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            student_id: row.get(1)?,
            internship_id: row.get(2)?,
            status: row.get(3)?,
        })
    }

    fn decode(self) -> Result<Application, RepositoryError> {
        let status = ApplicationStatus::from_label(&self.status).ok_or_else(|| {
            RepositoryError::Corrupt(format!("unknown application status '{}'", self.status))
        })?;
        Ok(Application {
            id: ApplicationId(self.id),
            student_id: UserId(self.student_id),
            internship_id: InternshipId(self.internship_id),
            status,
        })
    }
}

impl PlacementRepository for SqliteStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
            params![user.username, user.password_hash, user.role.label()],
        )
        .map_err(map_sqlite_error)?;

        Ok(User {
            id: UserId(conn.last_insert_rowid()),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
        })
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.0],
            UserRow::read,
        )
        .optional()
        .map_err(map_sqlite_error)?
        .map(UserRow::decode)
        .transpose()
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            UserRow::read,
        )
        .optional()
        .map_err(map_sqlite_error)?
        .map(UserRow::decode)
        .transpose()
    }

    fn users(&self) -> Result<Vec<User>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map([], UserRow::read)
            .map_err(map_sqlite_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sqlite_error)?;
        rows.into_iter().map(UserRow::decode).collect()
    }

    fn insert_internship(
        &self,
        internship: NewInternship,
    ) -> Result<Internship, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO internships (employer_id, title, description, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                internship.employer_id.0,
                internship.title,
                internship.description,
                internship.is_active,
                encode_timestamp(&internship.created_at),
            ],
        )
        .map_err(map_sqlite_error)?;

        Ok(Internship {
            id: InternshipId(conn.last_insert_rowid()),
            employer_id: internship.employer_id,
            title: internship.title,
            description: internship.description,
            is_active: internship.is_active,
            created_at: internship.created_at,
        })
    }

    fn fetch_internship(&self, id: InternshipId) -> Result<Option<Internship>, RepositoryError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {INTERNSHIP_COLUMNS} FROM internships WHERE id = ?1"),
            params![id.0],
            InternshipRow::read,
        )
        .optional()
        .map_err(map_sqlite_error)?
        .map(InternshipRow::decode)
        .transpose()
    }

    fn internships(&self, filter: InternshipFilter) -> Result<Vec<Internship>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {INTERNSHIP_COLUMNS} FROM internships
                 WHERE (?1 IS NULL OR employer_id = ?1)
                 ORDER BY id"
            ))
            .map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map(
                params![filter.employer_id.map(|id| id.0)],
                InternshipRow::read,
            )
            .map_err(map_sqlite_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sqlite_error)?;
        rows.into_iter().map(InternshipRow::decode).collect()
    }

    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO applications (student_id, internship_id, status) VALUES (?1, ?2, ?3)",
            params![
                application.student_id.0,
                application.internship_id.0,
                application.status.label(),
            ],
        )
        .map_err(map_sqlite_error)?;

        Ok(Application {
            id: ApplicationId(conn.last_insert_rowid()),
            student_id: application.student_id,
            internship_id: application.internship_id,
            status: application.status,
        })
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1"),
            params![id.0],
            ApplicationRow::read,
        )
        .optional()
        .map_err(map_sqlite_error)?
        .map(ApplicationRow::decode)
        .transpose()
    }

    fn applications(
        &self,
        filter: ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {APPLICATION_COLUMNS} FROM applications
                 WHERE (?1 IS NULL OR student_id = ?1)
                   AND (?2 IS NULL OR internship_id = ?2)
                 ORDER BY id"
            ))
            .map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map(
                params![
                    filter.student_id.map(|id| id.0),
                    filter.internship_id.map(|id| id.0),
                ],
                ApplicationRow::read,
            )
            .map_err(map_sqlite_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sqlite_error)?;
        rows.into_iter().map(ApplicationRow::decode).collect()
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE applications SET status = ?1 WHERE id = ?2",
                params![application.status.label(), application.id.0],
            )
            .map_err(map_sqlite_error)?;
        if changed == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn reset(&self) -> Result<(), RepositoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(map_sqlite_error)?;
        tx.execute_batch(DROP_ALL).map_err(map_sqlite_error)?;
        tx.execute_batch(SCHEMA).map_err(map_sqlite_error)?;
        tx.commit().map_err(map_sqlite_error)?;
        tracing::info!("placement database reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_employer() -> (SqliteStore, User) {
        let store = SqliteStore::in_memory().expect("in-memory database opens");
        let employer = store
            .insert_user(NewUser {
                username: "employer1".to_string(),
                password_hash: "digest".to_string(),
                role: Role::Employer,
            })
            .expect("insert employer");
        (store, employer)
    }

    #[test]
    fn duplicate_usernames_map_to_conflict() {
        let (store, employer) = store_with_employer();
        let duplicate = NewUser {
            username: employer.username.clone(),
            password_hash: "other".to_string(),
            role: Role::Student,
        };
        assert!(matches!(
            store.insert_user(duplicate),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn dangling_references_map_to_not_found() {
        let (store, _) = store_with_employer();
        let result = store.insert_application(NewApplication {
            student_id: UserId(1),
            internship_id: InternshipId(42),
            status: ApplicationStatus::Pending,
        });
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[test]
    fn internship_round_trips_timestamp_and_optional_description() {
        let (store, employer) = store_with_employer();
        let created = store
            .insert_internship(NewInternship {
                employer_id: employer.id,
                title: "Data intern".to_string(),
                description: None,
                is_active: true,
                created_at: Utc::now(),
            })
            .expect("insert internship");

        let fetched = store
            .fetch_internship(created.id)
            .expect("fetch succeeds")
            .expect("internship present");
        assert_eq!(fetched, created);
        assert!(fetched.description.is_none());
    }

    #[test]
    fn corrupt_role_surfaces_as_corrupt_error() {
        let (store, employer) = store_with_employer();
        store
            .conn()
            .expect("connection")
            .execute(
                "UPDATE users SET role = 'dean' WHERE id = ?1",
                params![employer.id.0],
            )
            .expect("tamper");
        assert!(matches!(
            store.fetch_user(employer.id),
            Err(RepositoryError::Corrupt(_))
        ));
    }

    #[test]
    fn reset_drops_records_and_restarts_ids() {
        let (store, _) = store_with_employer();
        store.reset().expect("reset succeeds");
        assert!(store.users().expect("list users").is_empty());
        let again = store
            .insert_user(NewUser {
                username: "staff1".to_string(),
                password_hash: "digest".to_string(),
                role: Role::Staff,
            })
            .expect("insert after reset");
        assert_eq!(again.id, UserId(1));
    }
}
