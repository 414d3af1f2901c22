// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides a mock dispatcher, webhook payload builders and a harness
//! wiring a temp SQLite store into the pipeline and router, for fast,
//! deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockDispatcher`] - records sends, fails on demand
//! - [`TestHarness`] - temp store + pipeline + router
//! - [`payload`] - Cloud API shaped webhook bodies

pub mod harness;
pub mod mock_dispatcher;
pub mod payload;

pub use harness::{
    TEST_API_KEY, TEST_FALLBACK, TEST_PHONE_NUMBER_ID, TEST_VERIFY_TOKEN, TestHarness,
    TestHarnessBuilder,
};
pub use mock_dispatcher::{MOCK_PHONE_ID, MockDispatcher, SentText};
pub use payload::{TextMessage, status_event, text_event, webhook_event};
