// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation resolution and status changes.

use parley_core::{Conversation, ConversationStatus, CorrelationPolicy, ParleyError, User};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::enum_column;
use crate::database::{Database, map_tr_err, new_id, now_iso};

pub(crate) const COLUMNS: &str = "id, conversation_id, owner_id, contact, status, last_message, \
     message_count, created_at, updated_at, version";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        owner_id: row.get(2)?,
        contact: row.get(3)?,
        status: enum_column(row, 4)?,
        last_message: row.get(5)?,
        message_count: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        version: row.get(9)?,
    })
}

pub(crate) fn select_by_row_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Conversation>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM conversations WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

fn select_by_external_id(
    conn: &Connection,
    conversation_id: &str,
) -> rusqlite::Result<Option<Conversation>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM conversations WHERE conversation_id = ?1"),
        params![conversation_id],
        from_row,
    )
    .optional()
}

fn select_open_for_owner(conn: &Connection, owner_id: &str) -> rusqlite::Result<Option<Conversation>> {
    conn.query_row(
        &format!(
            "SELECT {COLUMNS} FROM conversations \
             WHERE owner_id = ?1 AND status IN ('ACTIVE', 'PAUSED') \
             ORDER BY updated_at DESC, rowid DESC LIMIT 1"
        ),
        params![owner_id],
        from_row,
    )
    .optional()
}

/// Picks the conversation for a new inbound message from `owner`.
///
/// Under [`CorrelationPolicy::ReuseActive`] the most recently updated
/// ACTIVE or PAUSED conversation is reused; otherwise, or when none is
/// open, a new ACTIVE conversation is created.
pub async fn resolve_conversation(
    db: &Database,
    owner: &User,
    policy: CorrelationPolicy,
) -> Result<Conversation, ParleyError> {
    let owner_id = owner.id.clone();
    let contact = owner.contact.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if policy == CorrelationPolicy::ReuseActive
                && let Some(open) = select_open_for_owner(&tx, &owner_id)?
            {
                return Ok(open);
            }
            let now = now_iso();
            let conversation = Conversation {
                id: new_id(),
                conversation_id: new_id(),
                owner_id,
                contact,
                status: ConversationStatus::Active,
                last_message: None,
                message_count: 0,
                created_at: now.clone(),
                updated_at: now,
                version: 0,
            };
            tx.execute(
                &format!(
                    "INSERT INTO conversations ({COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ),
                params![
                    conversation.id,
                    conversation.conversation_id,
                    conversation.owner_id,
                    conversation.contact,
                    conversation.status.to_string(),
                    conversation.last_message,
                    conversation.message_count,
                    conversation.created_at,
                    conversation.updated_at,
                    conversation.version,
                ],
            )?;
            tx.commit()?;
            Ok(conversation)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_conversation(
    db: &Database,
    conversation_id: &str,
) -> Result<Option<Conversation>, ParleyError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| select_by_external_id(conn, &conversation_id))
        .await
        .map_err(map_tr_err)
}

/// Sets the status if the stored version equals `expected_version`.
pub async fn update_status(
    db: &Database,
    conversation_id: &str,
    status: ConversationStatus,
    expected_version: i64,
) -> Result<Conversation, ParleyError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if select_by_external_id(&tx, &conversation_id)?.is_none() {
                return Ok(Err(ParleyError::NotFound {
                    entity: "conversation",
                    id: conversation_id,
                }));
            }
            let changed = tx.execute(
                "UPDATE conversations SET status = ?1, updated_at = ?2, version = version + 1 \
                 WHERE conversation_id = ?3 AND version = ?4",
                params![status.to_string(), now_iso(), conversation_id, expected_version],
            )?;
            if changed == 0 {
                return Ok(Err(ParleyError::Conflict {
                    entity: "conversation",
                    id: conversation_id,
                    expected_version,
                }));
            }
            let updated = select_by_external_id(&tx, &conversation_id)?;
            tx.commit()?;
            Ok(updated.ok_or(ParleyError::NotFound {
                entity: "conversation",
                id: conversation_id,
            }))
        })
        .await
        .map_err(map_tr_err)?
}
