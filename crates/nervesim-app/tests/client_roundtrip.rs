use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use nervesim_app::{ClientConfig, run_client, share};
use nervesim_core::{ArenaBounds, SimConfig, SimulationSession};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

async fn next_json<S>(socket: &mut S) -> Value
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let message = timeout(WAIT, socket.next())
            .await
            .expect("frame before timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("json frame");
        }
    }
}

#[tokio::test]
async fn client_answers_updates_and_reconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let session = share(
        SimulationSession::new(SimConfig {
            rng_seed: Some(5),
            ..SimConfig::default()
        })
        .expect("valid config"),
    );
    let client = tokio::spawn(run_client(
        session.clone(),
        ClientConfig {
            url: format!("ws://{addr}/ws"),
            bounds: ArenaBounds::centered(800.0, 600.0),
            reconnect: Duration::from_millis(20),
            max_reconnect: Duration::from_millis(40),
        },
    ));

    for round in 1..=2_u64 {
        let (stream, _) = timeout(WAIT, listener.accept())
            .await
            .expect("client connects")
            .expect("accept");
        let mut socket = accept_async(stream).await.expect("handshake");

        let init = next_json(&mut socket).await;
        assert_eq!(init["command"], "init");
        assert!(init["callback_id"].is_u64());

        let response = json!({
            "command": "init response",
            "payload": { "inputs": ["ES", "FASL1"], "outputs": ["STL1", "MO"] }
        });
        socket
            .send(Message::text(response.to_string()))
            .await
            .expect("send init response");
        let update = json!({
            "command": "update",
            "payload": { "STL1": 0.5, "status": "walking" }
        });
        socket
            .send(Message::text(update.to_string()))
            .await
            .expect("send update");

        let sensors = next_json(&mut socket).await;
        assert_eq!(sensors["command"], "sensors");
        let payload = sensors["payload"].as_object().expect("payload object");
        assert_eq!(payload.len(), 2);
        assert!(payload["ES"].as_f64().is_some_and(|v| v > 0.0));

        assert_eq!(session.lock().expect("lock").tick().0, 1, "round {round}");
        socket.close(None).await.expect("close");
    }

    client.abort();
}
