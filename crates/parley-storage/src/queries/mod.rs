// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table.
//!
//! Each function takes `&Database` and runs its statements inside a single
//! `call()` on the writer thread, so multi-statement operations are atomic
//! with respect to each other. Domain failures (not found, version
//! mismatch, duplicates) are decided inside that closure and surface as an
//! inner `Result`.

pub mod conversations;
pub mod intents;
pub mod messages;
pub mod users;

use std::str::FromStr;

use rusqlite::Row;
use rusqlite::types::Type;

/// Reads a TEXT column into a strum-backed enum.
pub(crate) fn enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Maps `None` to SQLite's "no limit".
pub(crate) fn sql_limit(limit: Option<i64>) -> i64 {
    limit.filter(|l| *l >= 0).unwrap_or(-1)
}
