// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite message store.

use std::sync::Arc;

use parley_config::model::StorageConfig;
use parley_core::{
    Adapter, ConversationStatus, CorrelationPolicy, Direction, HealthStatus, MessageStore, NewChatMessage,
    NewIntent, NewUser, ParleyError, User, UserPatch, UserStatus,
};
use parley_storage::SqliteStore;
use tempfile::TempDir;

async fn store() -> (SqliteStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::new(StorageConfig {
        database_path: dir.path().join("parley.db").display().to_string(),
        wal_mode: true,
    });
    store.initialize().await.unwrap();
    (store, dir)
}

async fn alice(store: &SqliteStore) -> User {
    store
        .find_or_create_user(NewUser {
            user_id: "15550001".into(),
            name: "Alice".into(),
            contact: "15550001".into(),
        })
        .await
        .unwrap()
}

fn intent(name: &str, trigger: &str, response: &str) -> NewIntent {
    NewIntent {
        name: name.into(),
        trigger: trigger.into(),
        response: response.into(),
        active: true,
    }
}

#[tokio::test]
async fn operations_fail_before_initialize() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::new(StorageConfig {
        database_path: dir.path().join("x.db").display().to_string(),
        wal_mode: true,
    });
    assert!(matches!(
        store.list_active_intents().await,
        Err(ParleyError::Storage { .. })
    ));
    assert!(matches!(
        store.health_check().await.unwrap(),
        HealthStatus::Unhealthy(_)
    ));
}

#[tokio::test]
async fn initialize_is_idempotent_and_healthy() {
    let (store, _dir) = store().await;
    store.initialize().await.unwrap();
    assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    store.shutdown().await.unwrap();
}

#[tokio::test]
async fn first_contact_creates_user_once() {
    let (store, _dir) = store().await;
    let first = alice(&store).await;
    let second = alice(&store).await;
    assert_eq!(first.id, second.id);
    assert_eq!(first.status, UserStatus::Active);
    assert_eq!(first.version, 0);
    assert_eq!(store.get_user("15550001").await.unwrap(), Some(first));
    assert_eq!(store.get_user("nobody").await.unwrap(), None);
}

#[tokio::test]
async fn reuse_active_returns_open_conversation() {
    let (store, _dir) = store().await;
    let user = alice(&store).await;
    let a = store
        .resolve_conversation(&user, CorrelationPolicy::ReuseActive)
        .await
        .unwrap();
    let b = store
        .resolve_conversation(&user, CorrelationPolicy::ReuseActive)
        .await
        .unwrap();
    assert_eq!(a.conversation_id, b.conversation_id);
    assert_eq!(a.status, ConversationStatus::Active);
    assert_eq!(a.contact, "15550001");
}

#[tokio::test]
async fn per_event_always_mints_new_conversation() {
    let (store, _dir) = store().await;
    let user = alice(&store).await;
    let a = store
        .resolve_conversation(&user, CorrelationPolicy::PerEvent)
        .await
        .unwrap();
    let b = store
        .resolve_conversation(&user, CorrelationPolicy::PerEvent)
        .await
        .unwrap();
    assert_ne!(a.conversation_id, b.conversation_id);
}

#[tokio::test]
async fn ended_conversation_is_not_reused() {
    let (store, _dir) = store().await;
    let user = alice(&store).await;
    let open = store
        .resolve_conversation(&user, CorrelationPolicy::ReuseActive)
        .await
        .unwrap();
    store
        .update_conversation_status(&open.conversation_id, ConversationStatus::Ended, 0)
        .await
        .unwrap();
    let next = store
        .resolve_conversation(&user, CorrelationPolicy::ReuseActive)
        .await
        .unwrap();
    assert_ne!(next.conversation_id, open.conversation_id);
}

#[tokio::test]
async fn append_updates_conversation_counters() {
    let (store, _dir) = store().await;
    let user = alice(&store).await;
    let conv = store
        .resolve_conversation(&user, CorrelationPolicy::ReuseActive)
        .await
        .unwrap();

    let inbound = NewChatMessage::inbound(&conv, &user.user_id, "hello")
        .with_external_id(Some("wamid.1".into()))
        .with_provider_timestamp(Some(1_700_000_000));
    let stored = store.append_message(inbound).await.unwrap();
    assert_eq!(stored.direction, Direction::Inbound);
    assert_eq!(stored.provider_timestamp, Some(1_700_000_000));

    store
        .append_message(NewChatMessage::outbound(&conv, "bot", "Hi there!", None))
        .await
        .unwrap();

    let after = store
        .get_conversation(&conv.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.message_count, 2);
    assert_eq!(after.last_message.as_deref(), Some("Hi there!"));
    assert_eq!(after.version, conv.version + 2);

    let messages = store.get_messages(&conv.conversation_id, None).await.unwrap();
    let bodies: Vec<_> = messages.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["hello", "Hi there!"]);
}

#[tokio::test]
async fn duplicate_external_id_writes_nothing() {
    let (store, _dir) = store().await;
    let user = alice(&store).await;
    let conv = store
        .resolve_conversation(&user, CorrelationPolicy::ReuseActive)
        .await
        .unwrap();
    let msg = NewChatMessage::inbound(&conv, &user.user_id, "hello")
        .with_external_id(Some("wamid.dup".into()));

    store.append_message(msg.clone()).await.unwrap();
    let err = store.append_message(msg).await.unwrap_err();
    assert!(matches!(err, ParleyError::Duplicate { ref external_id } if external_id == "wamid.dup"));

    let after = store
        .get_conversation(&conv.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.message_count, 1);
}

#[tokio::test]
async fn inbound_with_intent_is_rejected() {
    let (store, _dir) = store().await;
    let user = alice(&store).await;
    let conv = store
        .resolve_conversation(&user, CorrelationPolicy::ReuseActive)
        .await
        .unwrap();
    let mut msg = NewChatMessage::inbound(&conv, &user.user_id, "hello");
    msg.intent_id = Some("whatever".into());
    assert!(matches!(
        store.append_message(msg).await,
        Err(ParleyError::Validation(_))
    ));
}

#[tokio::test]
async fn concurrent_appends_keep_count_exact() {
    let (store, _dir) = store().await;
    let store = Arc::new(store);
    let user = alice(&store).await;
    let conv = store
        .resolve_conversation(&user, CorrelationPolicy::ReuseActive)
        .await
        .unwrap();

    let tasks = (0..20).map(|i| {
        let store = Arc::clone(&store);
        let msg = NewChatMessage::inbound(&conv, &user.user_id, &format!("message {i}"));
        async move { store.append_message(msg).await }
    });
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    let after = store
        .get_conversation(&conv.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.message_count, 20);
    assert_eq!(after.version, 20);
}

#[tokio::test]
async fn stale_version_conflicts() {
    let (store, _dir) = store().await;
    let user = alice(&store).await;
    let conv = store
        .resolve_conversation(&user, CorrelationPolicy::ReuseActive)
        .await
        .unwrap();

    let paused = store
        .update_conversation_status(&conv.conversation_id, ConversationStatus::Paused, 0)
        .await
        .unwrap();
    assert_eq!(paused.version, 1);

    let err = store
        .update_conversation_status(&conv.conversation_id, ConversationStatus::Blocked, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::Conflict { expected_version: 0, .. }));

    let missing = store
        .update_conversation_status("nope", ConversationStatus::Ended, 0)
        .await
        .unwrap_err();
    assert!(matches!(missing, ParleyError::NotFound { entity: "conversation", .. }));
}

#[tokio::test]
async fn user_patch_respects_version() {
    let (store, _dir) = store().await;
    let user = alice(&store).await;
    let patch = UserPatch {
        status: Some(UserStatus::Suspended),
        preferences: Some("{\"lang\":\"en\"}".into()),
        ..UserPatch::default()
    };
    let updated = store
        .update_user(&user.user_id, patch.clone(), 0)
        .await
        .unwrap();
    assert_eq!(updated.status, UserStatus::Suspended);
    assert_eq!(updated.role, user.role);
    assert_eq!(updated.version, 1);

    assert!(matches!(
        store.update_user(&user.user_id, patch.clone(), 0).await,
        Err(ParleyError::Conflict { .. })
    ));
    assert!(matches!(
        store.update_user("ghost", patch, 0).await,
        Err(ParleyError::NotFound { entity: "user", .. })
    ));
}

#[tokio::test]
async fn history_spans_conversations_newest_first() {
    let (store, _dir) = store().await;
    let user = alice(&store).await;
    for text in ["one", "two"] {
        let conv = store
            .resolve_conversation(&user, CorrelationPolicy::PerEvent)
            .await
            .unwrap();
        store
            .append_message(NewChatMessage::inbound(&conv, &user.user_id, text))
            .await
            .unwrap();
        store
            .append_message(NewChatMessage::outbound(&conv, "bot", &format!("re: {text}"), None))
            .await
            .unwrap();
    }

    let history = store.history_for_user(&user.user_id, 50).await.unwrap();
    let bodies: Vec<_> = history.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["re: two", "two", "re: one", "one"]);

    let limited = store.history_for_user(&user.user_id, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert!(store.history_for_user("unknown", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn intents_list_active_ordered_by_name() {
    let (store, _dir) = store().await;
    store.create_intent(intent("zeta", "z", "Z")).await.unwrap();
    store.create_intent(intent("alpha", "a", "A")).await.unwrap();
    let mut hidden = intent("middle", "m", "M");
    hidden.active = false;
    store.create_intent(hidden).await.unwrap();

    let names: Vec<_> = store
        .list_active_intents()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[tokio::test]
async fn intent_name_uniqueness() {
    let (store, _dir) = store().await;
    let greeting = store.create_intent(intent("greeting", "hello", "Hi")).await.unwrap();
    let farewell = store.create_intent(intent("farewell", "bye", "Bye")).await.unwrap();

    assert!(matches!(
        store.create_intent(intent("greeting", "hey", "Hey")).await,
        Err(ParleyError::AlreadyExists { entity: "intent", .. })
    ));
    assert!(matches!(
        store.update_intent(&farewell.id, intent("greeting", "bye", "Bye")).await,
        Err(ParleyError::AlreadyExists { .. })
    ));

    let renamed = store
        .update_intent(&greeting.id, intent("greeting", "hi", "Hello!"))
        .await
        .unwrap();
    assert_eq!(renamed.trigger, "hi");
    assert_eq!(renamed.created_at, greeting.created_at);

    assert!(matches!(
        store.update_intent("missing", intent("x", "y", "z")).await,
        Err(ParleyError::NotFound { .. })
    ));
}

#[tokio::test]
async fn deleting_intent_nulls_message_reference() {
    let (store, _dir) = store().await;
    let user = alice(&store).await;
    let conv = store
        .resolve_conversation(&user, CorrelationPolicy::ReuseActive)
        .await
        .unwrap();
    let greeting = store.create_intent(intent("greeting", "hello", "Hi")).await.unwrap();
    let reply = store
        .append_message(NewChatMessage::outbound(&conv, "bot", "Hi", Some(&greeting)))
        .await
        .unwrap();
    assert_eq!(reply.intent_id.as_deref(), Some(greeting.id.as_str()));

    store.delete_intent(&greeting.id).await.unwrap();
    assert!(store.get_intent(&greeting.id).await.unwrap().is_none());

    let messages = store.get_messages(&conv.conversation_id, None).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].intent_id.is_none());

    assert!(matches!(
        store.delete_intent(&greeting.id).await,
        Err(ParleyError::NotFound { .. })
    ));
}
