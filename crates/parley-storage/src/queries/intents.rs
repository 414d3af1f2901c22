// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent CRUD.

use parley_core::{Intent, NewIntent, ParleyError};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err, new_id, now_iso};

const COLUMNS: &str = "id, name, trigger_text, response, active, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Intent> {
    Ok(Intent {
        id: row.get(0)?,
        name: row.get(1)?,
        trigger: row.get(2)?,
        response: row.get(3)?,
        active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn select_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Intent>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM intents WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

/// Id of the intent currently holding `name`, if any.
fn name_owner(conn: &Connection, name: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT id FROM intents WHERE name = ?1", params![name], |row| row.get(0))
        .optional()
}

/// Active intents ordered by name, which is also the match precedence.
pub async fn list_active(db: &Database) -> Result<Vec<Intent>, ParleyError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM intents WHERE active = 1 ORDER BY name ASC"
            ))?;
            let rows = stmt.query_map([], from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_intent(db: &Database, id: &str) -> Result<Option<Intent>, ParleyError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_by_id(conn, &id))
        .await
        .map_err(map_tr_err)
}

pub async fn create_intent(db: &Database, new: NewIntent) -> Result<Intent, ParleyError> {
    new.validate()?;
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if name_owner(&tx, &new.name)?.is_some() {
                return Ok(Err(ParleyError::AlreadyExists {
                    entity: "intent",
                    key: new.name,
                }));
            }
            let now = now_iso();
            let intent = Intent {
                id: new_id(),
                name: new.name,
                trigger: new.trigger,
                response: new.response,
                active: new.active,
                created_at: now.clone(),
                updated_at: now,
            };
            tx.execute(
                &format!("INSERT INTO intents ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                params![
                    intent.id,
                    intent.name,
                    intent.trigger,
                    intent.response,
                    intent.active,
                    intent.created_at,
                    intent.updated_at,
                ],
            )?;
            tx.commit()?;
            Ok(Ok(intent))
        })
        .await
        .map_err(map_tr_err)?
}

/// Replaces name, trigger, response and active flag.
pub async fn update_intent(
    db: &Database,
    id: &str,
    update: NewIntent,
) -> Result<Intent, ParleyError> {
    update.validate()?;
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(existing) = select_by_id(&tx, &id)? else {
                return Ok(Err(ParleyError::NotFound { entity: "intent", id }));
            };
            if name_owner(&tx, &update.name)?.is_some_and(|owner| owner != id) {
                return Ok(Err(ParleyError::AlreadyExists {
                    entity: "intent",
                    key: update.name,
                }));
            }
            let intent = Intent {
                name: update.name,
                trigger: update.trigger,
                response: update.response,
                active: update.active,
                updated_at: now_iso(),
                ..existing
            };
            tx.execute(
                "UPDATE intents SET name = ?1, trigger_text = ?2, response = ?3, active = ?4, \
                 updated_at = ?5 WHERE id = ?6",
                params![
                    intent.name,
                    intent.trigger,
                    intent.response,
                    intent.active,
                    intent.updated_at,
                    intent.id,
                ],
            )?;
            tx.commit()?;
            Ok(Ok(intent))
        })
        .await
        .map_err(map_tr_err)?
}

/// Deletes the intent; referencing messages have their `intent_id` nulled
/// by the foreign key.
pub async fn delete_intent(db: &Database, id: &str) -> Result<(), ParleyError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let removed = conn.execute("DELETE FROM intents WHERE id = ?1", params![id])?;
            if removed == 0 {
                return Ok(Err(ParleyError::NotFound { entity: "intent", id }));
            }
            Ok(Ok(()))
        })
        .await
        .map_err(map_tr_err)?
}
