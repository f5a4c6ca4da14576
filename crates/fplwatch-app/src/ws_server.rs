// WebSocket server pushing dashboard updates to any number of clients.

use futures_util::stream::Stream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use crate::protocol::DashboardUpdate;

/// Accept clients on `listener` forever. Each client gets its own task and
/// its own subscription to `updates`.
pub async fn run(
    listener: TcpListener,
    updates: broadcast::Sender<DashboardUpdate>,
) -> anyhow::Result<()> {
    let local_addr = listener.local_addr()?;
    info!("WebSocket server listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        let addr = addr.to_string();
        let rx = updates.subscribe();

        tokio::spawn(async move {
            match tokio_tungstenite::accept_async(stream).await {
                Ok(ws) => {
                    info!("WebSocket client connected from {addr}");
                    serve_client(ws, rx, &addr).await;
                    info!("WebSocket client {addr} disconnected");
                }
                Err(e) => warn!("WebSocket handshake failed for {addr}: {e}"),
            }
        });
    }
}

/// Push updates to one client until it closes, errors, or the update
/// channel closes.
pub async fn serve_client<S>(
    ws: WebSocketStream<S>,
    updates: broadcast::Receiver<DashboardUpdate>,
    addr: &str,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (write, read) = ws.split();
    tokio::select! {
        _ = forward_updates(updates, write, addr) => {}
        _ = drain_incoming(read, addr) => {}
    }
}

/// Serialize each update as a JSON text frame and write it to `sink`.
///
/// A client that falls more than the channel capacity behind skips the
/// missed updates and carries on from the oldest one still buffered.
pub async fn forward_updates<Si>(
    mut updates: broadcast::Receiver<DashboardUpdate>,
    mut sink: Si,
    addr: &str,
) where
    Si: Sink<Message> + Unpin,
    Si::Error: std::fmt::Display,
{
    loop {
        let update = match updates.recv().await {
            Ok(update) => update,
            Err(RecvError::Lagged(skipped)) => {
                warn!("client {addr} lagged, skipped {skipped} updates");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let text = match serde_json::to_string(&update) {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to serialize update: {e}");
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(text.into())).await {
            warn!("failed to send to {addr}: {e}");
            break;
        }
    }
}

/// Read frames from the client until it closes or errors. Clients have
/// nothing to say; incoming text is logged and dropped.
pub async fn drain_incoming<St>(mut stream: St, addr: &str)
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Close(_)) => {
                info!("Client {addr} sent close frame");
                break;
            }
            Ok(Message::Text(text)) => debug!("ignoring message from {addr}: {text}"),
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use futures_util::stream;
    use tokio_tungstenite::tungstenite::Error as WsError;

    use crate::protocol::MetricKind;

    fn failed(n: usize) -> DashboardUpdate {
        DashboardUpdate::Failed {
            metric: MetricKind::Team,
            entry_id: Some(1),
            message: format!("failure {n}"),
        }
    }

    fn texts(sent: &[Message]) -> Vec<serde_json::Value> {
        sent.iter()
            .map(|m| match m {
                Message::Text(t) => serde_json::from_str(t.as_str()).unwrap(),
                other => panic!("expected text frame, got {other:?}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn updates_are_sent_as_tagged_json() {
        let (tx, rx) = broadcast::channel(8);
        tx.send(failed(1)).unwrap();
        tx.send(DashboardUpdate::Disconnected).unwrap();
        drop(tx);

        let mut sent: Vec<Message> = Vec::new();
        forward_updates(rx, &mut sent, "test").await;

        let json = texts(&sent);
        assert_eq!(json.len(), 2);
        assert_eq!(json[0]["type"], "failed");
        assert_eq!(json[0]["message"], "failure 1");
        assert_eq!(json[1]["type"], "disconnected");
    }

    #[tokio::test]
    async fn lagging_client_skips_missed_updates() {
        let (tx, rx) = broadcast::channel(2);
        for n in 0..5 {
            tx.send(failed(n)).unwrap();
        }
        drop(tx);

        let mut sent: Vec<Message> = Vec::new();
        forward_updates(rx, &mut sent, "test").await;

        let json = texts(&sent);
        let messages: Vec<_> = json.iter().map(|j| j["message"].as_str().unwrap().to_string()).collect();
        assert_eq!(messages, vec!["failure 3", "failure 4"]);
    }

    #[tokio::test]
    async fn close_frame_ends_client_read_loop() {
        let frames: Vec<Result<Message, WsError>> = vec![
            Ok(Message::Text("hello".into())),
            Ok(Message::Close(None)),
            Ok(Message::Text("never read".into())),
        ];
        let mut frames = stream::iter(frames);
        drain_incoming(&mut frames, "test").await;
        assert_eq!(frames.next().await.unwrap().unwrap(), Message::Text("never read".into()));
    }

    #[tokio::test]
    async fn read_error_ends_client_read_loop() {
        let frames: Vec<Result<Message, WsError>> = vec![
            Err(WsError::ConnectionClosed),
            Ok(Message::Text("never read".into())),
        ];
        let mut frames = stream::iter(frames);
        drain_incoming(&mut frames, "test").await;
        assert!(frames.next().await.is_some());
    }

    #[tokio::test]
    async fn connected_client_receives_broadcasts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, _keep) = broadcast::channel(8);
        let server = tokio::spawn(run(listener, tx.clone()));

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();

        // The server subscribes on accept; wait for it before publishing.
        while tx.receiver_count() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tx.send(DashboardUpdate::Disconnected).unwrap();

        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
        assert_eq!(json["type"], "disconnected");

        server.abort();
    }
}
