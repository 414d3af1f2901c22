// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley webhook chatbot.
//!
//! This crate provides the domain types, error types and adapter traits
//! shared by the storage, dispatch, pipeline and gateway crates.

pub mod error;
pub mod secret;
pub mod traits;
pub mod types;

pub use error::{DispatchError, ParleyError};
pub use types::{
    AdapterType, ChatMessage, Conversation, ConversationStatus, CorrelationPolicy, Direction,
    DispatchReceipt, HealthStatus, Intent, NewChatMessage, NewIntent, NewUser, PhoneInfo, User,
    UserPatch, UserRole, UserStatus,
};

pub use traits::{Adapter, Dispatcher, MessageStore};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn dispatch_error_converts_into_parley_error() {
        let err: ParleyError = DispatchError::Timeout {
            duration: Duration::from_secs(10),
        }
        .into();
        assert!(matches!(err, ParleyError::Dispatch(DispatchError::Timeout { .. })));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn storage_helper_wraps_source() {
        let err = ParleyError::storage(std::io::Error::other("disk gone"));
        assert_eq!(err.to_string(), "storage error: disk gone");
    }

    #[test]
    fn conflict_message_names_entity() {
        let err = ParleyError::Conflict {
            entity: "conversation",
            id: "c-1".into(),
            expected_version: 3,
        };
        assert_eq!(
            err.to_string(),
            "conversation c-1 was modified concurrently (expected version 3)"
        );
    }

    #[test]
    fn adapter_traits_are_object_safe() {
        fn _store(_: &dyn MessageStore) {}
        fn _dispatcher(_: &dyn Dispatcher) {}
    }

    #[test]
    fn receipt_first_id() {
        let receipt = DispatchReceipt {
            message_ids: vec!["wamid.1".into(), "wamid.2".into()],
        };
        assert_eq!(receipt.first_id(), Some("wamid.1"));
        assert_eq!(DispatchReceipt::default().first_id(), None);
    }
}
