use uuid::Uuid;

use notification_cell::services::realtime::RealtimeChannelRegistry;

#[tokio::test]
async fn every_session_of_an_owner_receives_the_event() {
    let registry = RealtimeChannelRegistry::new();
    let owner_id = Uuid::new_v4();

    let mut first = registry.register(owner_id).await;
    let mut second = registry.register(owner_id).await;

    assert!(registry.send_to_owner(owner_id, "ping".to_string()).await);

    assert_eq!(first.recv().await.unwrap(), "ping");
    assert_eq!(second.recv().await.unwrap(), "ping");
}

#[tokio::test]
async fn sending_without_a_channel_is_a_noop() {
    let registry = RealtimeChannelRegistry::new();

    assert!(!registry.send_to_owner(Uuid::new_v4(), "ping".to_string()).await);
}

#[tokio::test]
async fn stale_channels_are_dropped_on_delivery() {
    let registry = RealtimeChannelRegistry::new();
    let owner_id = Uuid::new_v4();

    let receiver = registry.register(owner_id).await;
    assert_eq!(registry.active_owner_count().await, 1);

    // Session went away without an explicit release
    drop(receiver);

    assert!(!registry.send_to_owner(owner_id, "ping".to_string()).await);
    assert_eq!(registry.active_owner_count().await, 0);
}

#[tokio::test]
async fn release_keeps_channels_with_live_sessions() {
    let registry = RealtimeChannelRegistry::new();
    let owner_id = Uuid::new_v4();

    let first = registry.register(owner_id).await;
    let second = registry.register(owner_id).await;

    drop(first);
    registry.release(owner_id).await;
    // The second session is still subscribed, so the channel survives.
    assert_eq!(registry.active_owner_count().await, 1);

    drop(second);
    registry.release(owner_id).await;
    assert_eq!(registry.active_owner_count().await, 0);
}
