// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message append and history queries.

use parley_core::{ChatMessage, NewChatMessage, ParleyError};
use rusqlite::{Row, params};

use super::{enum_column, sql_limit};
use crate::database::{Database, map_tr_err, new_id, now_iso};
use crate::queries::conversations;

const COLUMNS: &str = "id, conversation_ref, conversation_id, sender_id, body, direction, \
     intent_id, external_id, provider_timestamp, created_at, version";

fn from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.get(0)?,
        conversation_ref: row.get(1)?,
        conversation_id: row.get(2)?,
        sender_id: row.get(3)?,
        body: row.get(4)?,
        direction: enum_column(row, 5)?,
        intent_id: row.get(6)?,
        external_id: row.get(7)?,
        provider_timestamp: row.get(8)?,
        created_at: row.get(9)?,
        version: row.get(10)?,
    })
}

/// Inserts the message and bumps the owning conversation's counters in
/// one transaction.
pub async fn append_message(
    db: &Database,
    message: NewChatMessage,
) -> Result<ChatMessage, ParleyError> {
    message.validate()?;
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            if let Some(external_id) = &message.external_id {
                let seen: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM messages WHERE external_id = ?1)",
                    params![external_id],
                    |row| row.get(0),
                )?;
                if seen {
                    return Ok(Err(ParleyError::Duplicate {
                        external_id: external_id.clone(),
                    }));
                }
            }

            if conversations::select_by_row_id(&tx, &message.conversation_ref)?.is_none() {
                return Ok(Err(ParleyError::NotFound {
                    entity: "conversation",
                    id: message.conversation_id,
                }));
            }

            let stored = ChatMessage {
                id: new_id(),
                conversation_ref: message.conversation_ref,
                conversation_id: message.conversation_id,
                sender_id: message.sender_id,
                body: message.body,
                direction: message.direction,
                intent_id: message.intent_id,
                external_id: message.external_id,
                provider_timestamp: message.provider_timestamp,
                created_at: now_iso(),
                version: 0,
            };
            tx.execute(
                &format!(
                    "INSERT INTO messages ({COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                params![
                    stored.id,
                    stored.conversation_ref,
                    stored.conversation_id,
                    stored.sender_id,
                    stored.body,
                    stored.direction.to_string(),
                    stored.intent_id,
                    stored.external_id,
                    stored.provider_timestamp,
                    stored.created_at,
                    stored.version,
                ],
            )?;
            tx.execute(
                "UPDATE conversations SET message_count = message_count + 1, last_message = ?1, \
                 updated_at = ?2, version = version + 1 WHERE id = ?3",
                params![stored.body, stored.created_at, stored.conversation_ref],
            )?;
            tx.commit()?;
            Ok(Ok(stored))
        })
        .await
        .map_err(map_tr_err)?
}

/// Messages of one conversation in insertion order.
pub async fn get_messages_for_conversation(
    db: &Database,
    conversation_id: &str,
    limit: Option<i64>,
) -> Result<Vec<ChatMessage>, ParleyError> {
    let conversation_id = conversation_id.to_string();
    let limit = sql_limit(limit);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages WHERE conversation_id = ?1 \
                 ORDER BY created_at ASC, rowid ASC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![conversation_id, limit], from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Messages across every conversation owned by `user_id`, newest first.
pub async fn history_for_user(
    db: &Database,
    user_id: &str,
    limit: i64,
) -> Result<Vec<ChatMessage>, ParleyError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.conversation_ref, m.conversation_id, m.sender_id, m.body, \
                 m.direction, m.intent_id, m.external_id, m.provider_timestamp, m.created_at, \
                 m.version \
                 FROM messages m \
                 JOIN conversations c ON c.id = m.conversation_ref \
                 JOIN users u ON u.id = c.owner_id \
                 WHERE u.user_id = ?1 \
                 ORDER BY m.created_at DESC, m.rowid DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user_id, limit], from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}
