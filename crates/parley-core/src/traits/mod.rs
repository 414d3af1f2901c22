// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`Adapter`] base trait and use `#[async_trait]`
//! so they can be held as `Arc<dyn ...>`.

pub mod adapter;
pub mod dispatch;
pub mod storage;

pub use adapter::Adapter;
pub use dispatch::Dispatcher;
pub use storage::MessageStore;
