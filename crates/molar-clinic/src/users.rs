//! Staff account records.
//!
//! The password hash never leaves this module except through
//! [`UserCredentials`], which exists solely for the login path. Every other
//! query returns [`User`], which carries no credential material.

use molar_types::{Role, UnknownEnumValue};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::ClinicError;

/// A staff account as exposed to the rest of the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Internal database ID.
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    /// Clinical specialization, for doctors.
    pub specialization: Option<String>,
    pub phone: Option<String>,
    /// Deactivated accounts keep their history but cannot sign in.
    pub is_active: bool,
    /// Last successful login (ISO 8601), if any.
    pub last_login_at: Option<String>,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
    /// Last modification timestamp (ISO 8601).
    pub updated_at: String,
}

/// The subset of a user row needed to check a login attempt.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub password_hash: String,
    pub is_active: bool,
}

/// Parameters for creating a new staff account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    /// Already-hashed credential; this crate never sees the plaintext.
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub specialization: Option<String>,
    pub phone: Option<String>,
}

/// Parameters for updating an existing staff account.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUserParams {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

/// Creates a staff account and returns the stored row.
pub fn create_user(conn: &Connection, params: &NewUser) -> Result<User, ClinicError> {
    let user = conn.query_row(
        "INSERT INTO users (username, email, password_hash, full_name, role, specialization, phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         RETURNING id, username, email, full_name, role, specialization, phone,
                   is_active, last_login_at, created_at, updated_at",
        params![
            params.username,
            params.email,
            params.password_hash,
            params.full_name,
            params.role.as_str(),
            params.specialization,
            params.phone,
        ],
        map_row_to_user,
    )?;
    Ok(user)
}

/// Retrieves a staff account by internal id.
pub fn get_user(conn: &Connection, id: i64) -> Result<User, ClinicError> {
    conn.query_row(
        "SELECT id, username, email, full_name, role, specialization, phone,
                is_active, last_login_at, created_at, updated_at
         FROM users WHERE id = ?1",
        [id],
        map_row_to_user,
    )
    .optional()?
    .ok_or_else(|| ClinicError::not_found("user", id))
}

/// Looks up the credential row for a login attempt.
///
/// Returns `None` for an unknown username so the caller can answer the same
/// way for unknown users and wrong passwords.
pub fn find_credentials(
    conn: &Connection,
    username: &str,
) -> Result<Option<UserCredentials>, ClinicError> {
    let row = conn
        .query_row(
            "SELECT id, username, role, password_hash, is_active
             FROM users WHERE username = ?1",
            [username],
            |row| {
                let role_str: String = row.get(2)?;
                let role = Role::from_str(&role_str).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        Box::new(UnknownEnumValue(role_str.clone())),
                    )
                })?;
                Ok(UserCredentials {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    role,
                    password_hash: row.get(3)?,
                    is_active: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Lists staff accounts, optionally filtered by role, ordered by username.
pub fn list_users(conn: &Connection, role: Option<Role>) -> Result<Vec<User>, ClinicError> {
    let mut stmt;
    let rows = match role {
        Some(role) => {
            stmt = conn.prepare(
                "SELECT id, username, email, full_name, role, specialization, phone,
                        is_active, last_login_at, created_at, updated_at
                 FROM users WHERE role = ?1 ORDER BY username ASC",
            )?;
            stmt.query_map([role.as_str()], map_row_to_user)?
        }
        None => {
            stmt = conn.prepare(
                "SELECT id, username, email, full_name, role, specialization, phone,
                        is_active, last_login_at, created_at, updated_at
                 FROM users ORDER BY username ASC",
            )?;
            stmt.query_map([], map_row_to_user)?
        }
    };

    let mut users = Vec::new();
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

/// Updates an account using a single atomic UPDATE statement.
///
/// Only fields that are `Some` in `updates` are modified; `None` fields are
/// left untouched.
pub fn update_user(
    conn: &Connection,
    id: i64,
    updates: &UpdateUserParams,
) -> Result<(), ClinicError> {
    let mut set_parts: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1usize;

    if let Some(email) = &updates.email {
        set_parts.push(format!("email = ?{}", idx));
        values.push(Box::new(email.clone()));
        idx += 1;
    }
    if let Some(full_name) = &updates.full_name {
        set_parts.push(format!("full_name = ?{}", idx));
        values.push(Box::new(full_name.clone()));
        idx += 1;
    }
    if let Some(role) = &updates.role {
        set_parts.push(format!("role = ?{}", idx));
        values.push(Box::new(role.as_str()));
        idx += 1;
    }
    if let Some(specialization) = &updates.specialization {
        set_parts.push(format!("specialization = ?{}", idx));
        values.push(Box::new(specialization.clone()));
        idx += 1;
    }
    if let Some(phone) = &updates.phone {
        set_parts.push(format!("phone = ?{}", idx));
        values.push(Box::new(phone.clone()));
        idx += 1;
    }
    if let Some(is_active) = &updates.is_active {
        set_parts.push(format!("is_active = ?{}", idx));
        values.push(Box::new(*is_active));
        idx += 1;
    }

    if set_parts.is_empty() {
        let _ = get_user(conn, id)?;
        return Ok(());
    }
    set_parts.push("updated_at = datetime('now')".to_string());

    let sql = format!(
        "UPDATE users SET {} WHERE id = ?{}",
        set_parts.join(", "),
        idx
    );
    values.push(Box::new(id));

    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let count = conn.execute(&sql, params.as_slice())?;
    if count == 0 {
        return Err(ClinicError::not_found("user", id));
    }
    Ok(())
}

/// Stamps the account's last successful login.
pub fn touch_last_login(conn: &Connection, id: i64) -> Result<(), ClinicError> {
    conn.execute(
        "UPDATE users SET last_login_at = datetime('now') WHERE id = ?1",
        [id],
    )?;
    Ok(())
}

/// Returns whether the account is active, or `None` if the row is gone.
pub fn user_is_active(conn: &Connection, id: i64) -> Result<Option<bool>, ClinicError> {
    let active = conn
        .query_row("SELECT is_active FROM users WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(active)
}

fn map_row_to_user(row: &Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(4)?;
    let role = Role::from_str(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            Box::new(UnknownEnumValue(role_str.clone())),
        )
    })?;

    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        full_name: row.get(3)?,
        role,
        specialization: row.get(5)?,
        phone: row.get(6)?,
        is_active: row.get(7)?,
        last_login_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
