//! SQLite user store.
//!
//! # Responsibility
//! - Implement `EntityRepository<User>` over the `users` table.
//!
//! # Invariants
//! - Handles come from `AUTOINCREMENT` and are never reused.
//! - Update never inserts; an unknown handle yields `NotFound`.

use crate::db::SharedConnection;
use crate::model::user::{User, UserId};
use crate::repo::{ensure_connection_ready, not_found, EntityRepository, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    user_id,
    email,
    login,
    name,
    birthday
FROM users";

/// SQLite-backed user repository.
pub struct SqliteUserRepository {
    conn: SharedConnection,
}

impl SqliteUserRepository {
    /// Creates the repository from a migrated connection.
    pub fn try_new(conn: SharedConnection) -> RepoResult<Self> {
        {
            let guard = conn.lock()?;
            ensure_connection_ready(&guard)?;
        }
        Ok(Self { conn })
    }
}

impl EntityRepository<User> for SqliteUserRepository {
    fn add(&self, user: &User) -> RepoResult<User> {
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO users (email, login, name, birthday)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.email.as_str(),
                user.login.as_str(),
                user.name.as_str(),
                user.birthday,
            ],
        )?;
        let id = conn.last_insert_rowid();
        load_user(&conn, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("user {id} missing right after insert"))
        })
    }

    fn get_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let conn = self.conn.lock()?;
        load_user(&conn, id)
    }

    fn update(&self, user: &User) -> RepoResult<User> {
        let conn = self.conn.lock()?;
        let changed = conn.execute(
            "UPDATE users
             SET
                email = ?1,
                login = ?2,
                name = ?3,
                birthday = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE user_id = ?5;",
            params![
                user.email.as_str(),
                user.login.as_str(),
                user.name.as_str(),
                user.birthday,
                user.id,
            ],
        )?;
        if changed == 0 {
            return Err(not_found::<User>(user.id));
        }
        load_user(&conn, user.id)?.ok_or_else(|| not_found::<User>(user.id))
    }

    fn get_all(&self) -> RepoResult<Vec<User>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} ORDER BY user_id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }
}

fn load_user(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("{USER_SELECT_SQL} WHERE user_id = ?1;"),
            [id],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("user_id")?,
        email: row.get("email")?,
        login: row.get("login")?,
        name: row.get("name")?,
        birthday: row.get("birthday")?,
    })
}
