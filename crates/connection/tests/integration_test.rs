use pyon_connection::{Connection, ConnectionConfig, ConnectionEvent, ConnectionState};
use pyon_transport_memory::MemoryTransport;
use pyon_transport_tcp::TcpTransport;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

async fn wait_for(
    rx: &mut broadcast::Receiver<ConnectionEvent>,
    wanted: &ConnectionEvent,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(event) if &event == wanted => return,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event");
}

#[tokio::test]
async fn test_tcp_session() {
    let _ = tracing_subscriber::fmt::try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(b"\nWelcome\n").await.unwrap();

        let mut received = Vec::new();
        let mut buf = [0u8; 256];
        while !received.ends_with(b"info\n") {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed early");
            received.extend_from_slice(&buf[..n]);
        }
        String::from_utf8(received).unwrap()
    });

    let connection = Connection::new(TcpTransport::new(), ConnectionConfig::default());
    let mut rx = connection.subscribe();

    connection
        .connect("127.0.0.1", port, Some("pw"))
        .await
        .unwrap();
    connection.send_command("info").await.unwrap();

    assert_eq!(server.await.unwrap(), "auth pw\ninfo\n");

    tokio::time::timeout(Duration::from_secs(5), async {
        while connection.get_buffer(false) != "\nWelcome\n" {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    // The server task has finished and dropped its socket
    wait_for(&mut rx, &ConnectionEvent::ConnectedChanged(false)).await;
    assert_eq!(connection.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_reconnect_after_peer_close() {
    let transport = MemoryTransport::new().with_initial_data("first");
    let remote = transport.remote();
    let connection = Connection::new(
        transport,
        ConnectionConfig::default().with_receive_interval(Duration::from_millis(5)),
    );
    let mut rx = connection.subscribe();

    connection.connect("localhost", 36330, None).await.unwrap();
    remote.close();
    wait_for(&mut rx, &ConnectionEvent::ConnectedChanged(false)).await;

    connection.connect("localhost", 36330, None).await.unwrap();
    wait_for(&mut rx, &ConnectionEvent::DataReceived(5)).await;

    assert_eq!(remote.connects(), 2);
    // Each session starts with an empty buffer
    assert_eq!(connection.get_buffer(false), "first");
    connection.close().await;
}
