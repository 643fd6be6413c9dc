// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;

use course_chat_core::domain::connection::models::BackoffPolicy;
use course_chat_core::domain::history::models::PageLoadOutcome;
use course_chat_core::domain::messaging::models::{
    DeliveryStatus, MessageDraft, MessageId, ThreadEventPayload,
};
use course_chat_core::domain::mutations::models::MutationError;
use course_chat_core::domain::sending::models::SendError;
use course_chat_core::ChatConfig;

use crate::common::{
    confirmed, confirmed_in, event, ids, wait_for_feed, wait_until, TestClient, COURSE,
};

mod common;

#[tokio::test]
async fn test_live_echo_replaces_pending_message() -> Result<()> {
    let t = TestClient::new();
    t.open().await;

    let temp_id = t.client.thread.submit(MessageDraft::text("Hello class"))?;
    assert_eq!(temp_id, "t1".into());
    assert_eq!(t.server.sent().len(), 1);
    assert_eq!(ids(&t.client.thread.feed()), vec!["t1"]);

    let mut echo = confirmed("m1", 1);
    echo.temp_id = Some("t1".into());
    echo.content = Some("Hello class".to_string());
    t.server.push(event(ThreadEventPayload::NewMessage(echo)));

    wait_for_feed(&t.client, |feed| ids(feed) == vec!["m1"]).await;

    let feed = t.client.thread.feed();
    assert_eq!(feed.messages.len(), 1);
    assert_eq!(feed.messages[0].delivery_status, DeliveryStatus::Confirmed);
    assert_eq!(feed.messages[0].content.as_deref(), Some("Hello class"));

    Ok(())
}

#[tokio::test]
async fn test_live_message_is_inserted_between_history() -> Result<()> {
    let t = TestClient::new();
    t.history
        .enqueue(common::COURSE, vec![confirmed("m1", 10), confirmed("m3", 30)], false);
    t.open().await;

    assert_eq!(ids(&t.client.thread.feed()), vec!["m1", "m3"]);

    t.server
        .push(event(ThreadEventPayload::NewMessage(confirmed("m2", 20))));

    wait_for_feed(&t.client, |feed| feed.messages.len() == 3).await;
    assert_eq!(ids(&t.client.thread.feed()), vec!["m1", "m2", "m3"]);

    Ok(())
}

#[tokio::test]
async fn test_timed_out_send_can_be_retried() -> Result<()> {
    let t = TestClient::new();
    t.open().await;

    let temp_id = t.client.thread.submit(MessageDraft::text("Is anyone here?"))?;
    t.clock.advance(Duration::from_secs(16));

    wait_for_feed(&t.client, |feed| {
        feed.messages
            .first()
            .map(|message| message.delivery_status == DeliveryStatus::Error)
            .unwrap_or(false)
    })
    .await;
    assert_eq!(
        t.client.thread.feed().messages[0].send_error,
        Some(SendError::TimedOut)
    );

    let retried = t.client.thread.retry(&temp_id)?;
    assert_eq!(retried, "t2".into());

    let feed = t.client.thread.feed();
    assert_eq!(ids(&feed), vec!["t2"]);
    assert_eq!(feed.messages[0].delivery_status, DeliveryStatus::Pending);
    assert_eq!(
        t.server
            .sent()
            .into_iter()
            .map(|message| message.temp_id.to_string())
            .collect::<Vec<_>>(),
        vec!["t1", "t2"]
    );

    let mut echo = confirmed("m1", 16);
    echo.temp_id = Some("t2".into());
    echo.content = Some("Is anyone here?".to_string());
    t.server.push(event(ThreadEventPayload::NewMessage(echo)));

    wait_for_feed(&t.client, |feed| ids(feed) == vec!["m1"]).await;
    assert_eq!(
        t.client.thread.feed().messages[0].delivery_status,
        DeliveryStatus::Confirmed
    );

    Ok(())
}

#[tokio::test]
async fn test_forbidden_edit_is_reverted() -> Result<()> {
    let t = TestClient::new();
    t.history.enqueue(common::COURSE, vec![confirmed("m1", 10)], false);
    t.open().await;

    t.mutations.respond_to_update(Err(MutationError::Forbidden));

    let result = t.client.thread.edit(&"m1".into(), "Changed my mind").await;
    assert_eq!(result, Err(MutationError::Forbidden));
    assert_eq!(t.mutations.calls(), 1);

    let feed = t.client.thread.feed();
    assert_eq!(feed.messages[0].content.as_deref(), Some("Message m1"));
    assert_eq!(feed.messages[0].update_status, None);

    Ok(())
}

#[tokio::test]
async fn test_accepted_edit_keeps_server_revision() -> Result<()> {
    let t = TestClient::new();
    t.history.enqueue(common::COURSE, vec![confirmed("m1", 10)], false);
    t.open().await;

    let mut edited = confirmed("m1", 10);
    edited.content = Some("Fixed a typo".to_string());
    edited.edited_at = Some(common::at(60));
    t.mutations.respond_to_update(Ok(edited));

    t.client.thread.edit(&"m1".into(), "Fixed a typo").await?;

    let feed = t.client.thread.feed();
    assert_eq!(feed.messages[0].content.as_deref(), Some("Fixed a typo"));
    assert_eq!(feed.messages[0].edited_at, Some(common::at(60)));

    Ok(())
}

#[tokio::test]
async fn test_stale_page_is_dropped_after_course_switch() -> Result<()> {
    let t = TestClient::new();
    t.history.enqueue(common::COURSE, vec![confirmed("m5", 50)], true);
    t.history.enqueue(common::COURSE, vec![confirmed("m4", 40)], false);
    t.history
        .enqueue("course-2", vec![confirmed_in("course-2", "x1", 10)], false);
    t.open().await;

    let gate = t.history.hold_next_load();
    let load = {
        let client = t.client.clone();
        tokio::spawn(async move { client.thread.load_older().await })
    };

    wait_until(|| t.history.requests().len() == 2).await;
    assert!(t.client.thread.is_loading_history());

    t.client.thread.switch_course("course-2".into()).await?;
    gate.notify_one();

    assert_eq!(load.await?, Ok(PageLoadOutcome::Discarded));

    let feed = t.client.thread.feed();
    assert_eq!(feed.course_id, Some("course-2".into()));
    assert_eq!(ids(&feed), vec!["x1"]);

    Ok(())
}

#[tokio::test]
async fn test_message_deleted_across_reconnect_stays_gone() -> Result<()> {
    let t = TestClient::with_config(ChatConfig {
        backoff: BackoffPolicy {
            initial_delay: Duration::from_millis(10),
            ..Default::default()
        },
        timeout_check_interval: Duration::from_millis(100),
        ..Default::default()
    });
    t.history
        .enqueue(COURSE, vec![confirmed("m1", 10), confirmed("m2", 20)], false);
    // The catch-up page was produced before the delete went through.
    t.history.enqueue(
        COURSE,
        vec![confirmed("m1", 10), confirmed("m2", 20), confirmed("m3", 30)],
        false,
    );
    t.open().await;

    let gate = t.mutations.hold_next_delete();
    let delete = {
        let client = t.client.clone();
        tokio::spawn(async move { client.thread.delete(&"m1".into()).await })
    };
    wait_for_feed(&t.client, |feed| ids(feed) == vec!["m2"]).await;

    t.server.drop_connection();
    wait_for_feed(&t.client, |feed| ids(feed) == vec!["m2", "m3"]).await;

    let feed = t.client.thread.feed();
    assert_eq!(feed.deleting, vec![MessageId::from("m1")]);

    gate.notify_one();
    assert_eq!(delete.await?, Ok(()));

    let feed = t.client.thread.feed();
    assert_eq!(ids(&feed), vec!["m2", "m3"]);
    assert!(feed.deleting.is_empty());

    Ok(())
}
