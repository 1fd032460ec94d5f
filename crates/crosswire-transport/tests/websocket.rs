//! Integration tests for the WebSocket transport: real sockets, real
//! frames.

#[cfg(feature = "websocket")]
mod websocket {
    use crosswire_transport::{Connection, Transport, WebSocketTransport};

    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on a random port, connects one client, and returns both ends.
    async fn pair() -> (
        crosswire_transport::WebSocketConnection,
        ClientWs,
    ) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().unwrap().to_string();

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let (client_ws, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("client should connect");
        let server_conn = server_handle.await.expect("task should complete");

        (server_conn, client_ws)
    }

    #[tokio::test]
    async fn test_send_and_receive_round_trip() {
        let (server_conn, mut client_ws) = pair().await;

        assert!(server_conn.id().into_inner() > 0);

        // Server → client.
        server_conn
            .send(b"hello from server")
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"hello from server");

        // Client → server.
        client_ws
            .send(Message::Binary(b"hello from client".to_vec().into()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"hello from client");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_text_frames_arrive_as_bytes() {
        // Browser clients send JSON as text frames; the transport
        // normalizes both frame types to bytes.
        let (server_conn, mut client_ws) = pair().await;

        client_ws
            .send(Message::Text("{\"type\":\"ping\"}".into()))
            .await
            .unwrap();

        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, b"{\"type\":\"ping\"}");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (server_conn, mut client_ws) = pair().await;

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_send_while_recv_is_blocked() {
        // A writer task must be able to push data while another task is
        // parked in recv() — broadcasts would otherwise deadlock behind
        // an idle reader.
        let (server_conn, mut client_ws) = pair().await;
        let server_conn = std::sync::Arc::new(server_conn);

        let reader = {
            let conn = std::sync::Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };
        // Let the reader reach recv() before sending.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        server_conn.send(b"pushed mid-recv").await.expect("send");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"pushed mid-recv");

        // Unblock and finish the reader.
        client_ws
            .send(Message::Binary(b"done".to_vec().into()))
            .await
            .unwrap();
        let received = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(received, b"done");
    }
}
