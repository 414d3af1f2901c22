// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User lookup, first-contact creation and administrative updates.

use parley_core::{NewUser, ParleyError, User, UserPatch, UserRole, UserStatus};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::enum_column;
use crate::database::{Database, map_tr_err, new_id, now_iso};

const COLUMNS: &str =
    "id, user_id, name, contact, role, status, preferences, created_at, updated_at, version";

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        contact: row.get(3)?,
        role: enum_column(row, 4)?,
        status: enum_column(row, 5)?,
        preferences: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        version: row.get(9)?,
    })
}

pub(crate) fn select_by_user_id(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM users WHERE user_id = ?1"),
        params![user_id],
        from_row,
    )
    .optional()
}

/// Returns the user with `new.user_id`, inserting it on first contact.
pub async fn find_or_create_user(db: &Database, new: NewUser) -> Result<User, ParleyError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if let Some(existing) = select_by_user_id(&tx, &new.user_id)? {
                return Ok(existing);
            }
            let now = now_iso();
            let user = User {
                id: new_id(),
                user_id: new.user_id,
                name: new.name,
                contact: new.contact,
                role: UserRole::User,
                status: UserStatus::Active,
                preferences: None,
                created_at: now.clone(),
                updated_at: now,
                version: 0,
            };
            tx.execute(
                &format!("INSERT INTO users ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
                params![
                    user.id,
                    user.user_id,
                    user.name,
                    user.contact,
                    user.role.to_string(),
                    user.status.to_string(),
                    user.preferences,
                    user.created_at,
                    user.updated_at,
                    user.version,
                ],
            )?;
            tx.commit()?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user(db: &Database, user_id: &str) -> Result<Option<User>, ParleyError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| select_by_user_id(conn, &user_id))
        .await
        .map_err(map_tr_err)
}

/// Applies `patch` if the stored version equals `expected_version`.
pub async fn update_user(
    db: &Database,
    user_id: &str,
    patch: UserPatch,
    expected_version: i64,
) -> Result<User, ParleyError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(current) = select_by_user_id(&tx, &user_id)? else {
                return Ok(Err(ParleyError::NotFound {
                    entity: "user",
                    id: user_id,
                }));
            };
            let role = patch.role.unwrap_or(current.role);
            let status = patch.status.unwrap_or(current.status);
            let preferences = patch.preferences.or(current.preferences);
            let changed = tx.execute(
                "UPDATE users SET role = ?1, status = ?2, preferences = ?3, updated_at = ?4, \
                 version = version + 1 WHERE id = ?5 AND version = ?6",
                params![
                    role.to_string(),
                    status.to_string(),
                    preferences,
                    now_iso(),
                    current.id,
                    expected_version,
                ],
            )?;
            if changed == 0 {
                return Ok(Err(ParleyError::Conflict {
                    entity: "user",
                    id: user_id,
                    expected_version,
                }));
            }
            let updated = select_by_user_id(&tx, &user_id)?;
            tx.commit()?;
            Ok(updated.ok_or(ParleyError::NotFound {
                entity: "user",
                id: user_id,
            }))
        })
        .await
        .map_err(map_tr_err)?
}
