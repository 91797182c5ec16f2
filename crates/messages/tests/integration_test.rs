use pyon_connection::{ConnectionConfig, ConnectionEvent};
use pyon_messages::{Error, MessageConnection};
use pyon_transport_memory::MemoryTransport;
use std::time::Duration;
use tokio::sync::broadcast;

fn config() -> ConnectionConfig {
    ConnectionConfig::default().with_receive_interval(Duration::from_millis(5))
}

async fn wait_for_key(rx: &mut broadcast::Receiver<ConnectionEvent>, wanted: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(ConnectionEvent::MessageUpdated { key, .. }) if key == wanted => return,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for message");
}

#[tokio::test]
async fn test_heartbeat_end_to_end() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = MemoryTransport::new().with_initial_data("PyON 1 heartbeat\n42\n---\n");
    let connection = MessageConnection::new(transport, config());
    let mut rx = connection.subscribe();

    connection.connect("localhost", 36330, None).await.unwrap();
    wait_for_key(&mut rx, "heartbeat").await;

    let message = connection.get_message("heartbeat").unwrap();
    assert_eq!(message.value(), "42");
    assert_eq!(
        connection.get_json_message("heartbeat").unwrap(),
        Some(serde_json::json!(42))
    );
    assert!(connection.get_message("units").is_none());
    assert_eq!(connection.get_json_message("units").unwrap(), None);

    connection.close().await;
}

#[tokio::test]
async fn test_final_frame_kept_when_peer_closes() {
    let transport = MemoryTransport::new().with_initial_data("PyON 1 heartbeat\n42\n---\n");
    let remote = transport.remote();
    let connection = MessageConnection::new(transport, config());
    let mut rx = connection.subscribe();

    connection.connect("localhost", 36330, None).await.unwrap();
    remote.close();

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(ConnectionEvent::ConnectedChanged(false)) => return,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for disconnect");

    assert!(!connection.is_connected());
    assert_eq!(connection.get_message("heartbeat").unwrap().value(), "42");
}

#[tokio::test]
async fn test_none_rewritten_end_to_end() {
    let transport = MemoryTransport::new();
    let remote = transport.remote();
    let connection = MessageConnection::new(transport, config());
    let mut rx = connection.subscribe();

    connection.connect("localhost", 36330, None).await.unwrap();
    remote.push("PyON 1 options\r\n{\"a\": None}\r\n---\r\n");
    wait_for_key(&mut rx, "options").await;

    assert_eq!(connection.get_message("options").unwrap().value(), "{\"a\": null}");
    assert_eq!(
        connection.get_json_message("options").unwrap(),
        Some(serde_json::json!({ "a": null }))
    );
}

#[tokio::test]
async fn test_frame_split_across_ticks() {
    let transport = MemoryTransport::new();
    let remote = transport.remote();
    let connection = MessageConnection::new(transport, config());
    let mut rx = connection.subscribe();

    connection.connect("localhost", 36330, None).await.unwrap();

    remote.push("PyON 1 units\n[{\"id\": ");
    tokio::time::timeout(Duration::from_secs(5), async {
        while connection.pending_text().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert!(connection.get_message("units").is_none());

    remote.push("\"00\"}]\n---\n");
    wait_for_key(&mut rx, "units").await;

    assert_eq!(connection.get_message("units").unwrap().value(), "[{\"id\": \"00\"}]");
    assert_eq!(connection.pending_text(), "");
}

#[tokio::test]
async fn test_last_write_wins_and_update_finished_follows() {
    let transport = MemoryTransport::new();
    let remote = transport.remote();
    let connection = MessageConnection::new(transport, config());
    let mut rx = connection.subscribe();

    connection.connect("localhost", 36330, None).await.unwrap();
    remote.push("PyON 1 heartbeat\n1\n---\nPyON 1 heartbeat\n2\n---\n");

    let keys = tokio::time::timeout(Duration::from_secs(5), async {
        let mut keys = Vec::new();
        loop {
            match rx.recv().await.unwrap() {
                ConnectionEvent::MessageUpdated { key, .. } => keys.push(key),
                ConnectionEvent::UpdateFinished if !keys.is_empty() => return keys,
                _ => {}
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(keys, vec!["heartbeat", "heartbeat"]);
    assert_eq!(connection.get_message("heartbeat").unwrap().value(), "2");
    assert_eq!(connection.cache().len(), 1);
}

#[tokio::test]
async fn test_invalid_json_is_reported() {
    let transport = MemoryTransport::new().with_initial_data("PyON 1 info\n[unterminated\n---\n");
    let connection = MessageConnection::new(transport, config());
    let mut rx = connection.subscribe();

    connection.connect("localhost", 36330, None).await.unwrap();
    wait_for_key(&mut rx, "info").await;

    let result = connection.get_json_message("info");
    assert!(matches!(result, Err(Error::Json { ref key, .. }) if key == "info"));
}

#[tokio::test]
async fn test_partial_frame_dropped_on_reconnect() {
    let transport = MemoryTransport::new();
    let remote = transport.remote();
    let connection = MessageConnection::new(transport, config());
    let mut rx = connection.subscribe();

    connection.connect("localhost", 36330, None).await.unwrap();
    remote.push("PyON 1 units\n[");
    tokio::time::timeout(Duration::from_secs(5), async {
        while connection.pending_text().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    connection.close().await;

    connection.connect("localhost", 36330, None).await.unwrap();
    assert_eq!(connection.pending_text(), "");

    remote.push("PyON 1 slots\n[]\n---\n");
    wait_for_key(&mut rx, "slots").await;
    assert!(connection.get_message("units").is_none());
}
