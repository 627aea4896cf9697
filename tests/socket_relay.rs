//! End-to-end tests: real server, real WebSocket clients

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use wind_dashboard::api::{build_router, AppState};
use wind_dashboard::config::Config;
use wind_dashboard::feeder::{Feeder, FeederConfig};
use wind_dashboard::sample::{FrameNormalizer, RawFrame, Sample};
use wind_dashboard::socketio::{
    engine_url, EnginePacket, HubConfig, SocketHub, SocketOptions, SocketPacketKind,
};
use wind_dashboard::source::{SampleSource, SourceError};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn start_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn next_packet(client: &mut Client) -> EnginePacket {
    loop {
        let frame = tokio::time::timeout(WAIT, client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return EnginePacket::decode(&text).unwrap();
        }
    }
}

/// Open a socket and join the default namespace
async fn join(addr: SocketAddr) -> Client {
    let url = engine_url(&format!("http://{}", addr));
    let (mut client, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let EnginePacket::Open(handshake) = next_packet(&mut client).await else {
        panic!("expected open handshake");
    };
    assert!(!handshake.sid.is_empty());
    assert!(handshake.upgrades.is_empty());

    client.send(Message::Text("40".to_string())).await.unwrap();

    let EnginePacket::Message(connect) = next_packet(&mut client).await else {
        panic!("expected connect ack");
    };
    assert_eq!(connect.kind, SocketPacketKind::Connect);

    let EnginePacket::Message(status) = next_packet(&mut client).await else {
        panic!("expected status event");
    };
    assert_eq!(status.event_name(), Some("status"));
    assert_eq!(
        status.event_args()[0]["message"],
        "Server connected, ready to receive data"
    );

    client
}

async fn next_sample(client: &mut Client) -> Sample {
    loop {
        if let EnginePacket::Message(packet) = next_packet(client).await {
            if packet.event_name() == Some("data") {
                return serde_json::from_value(packet.event_args()[0].clone()).unwrap();
            }
        }
    }
}

#[tokio::test]
async fn test_pushed_sample_reaches_viewer() {
    let state = AppState::default();
    let hub = state.hub.clone();
    let addr = start_server(state).await;

    let mut viewer = join(addr).await;
    let mut pusher = join(addr).await;

    pusher
        .send(Message::Text(
            r#"42["data",{"timestamp":7,"channels":[1,2,3]}]"#.to_string(),
        ))
        .await
        .unwrap();

    let sample = next_sample(&mut viewer).await;
    assert_eq!(sample, Sample::new(7.0, vec![1.0, 2.0, 3.0]));
    assert_eq!(hub.latest().await, Some(sample));
    assert_eq!(hub.joined_count().await, 2);
}

#[tokio::test]
async fn test_malformed_event_is_dropped() {
    let state = AppState::default();
    let hub = state.hub.clone();
    let addr = start_server(state).await;

    let mut viewer = join(addr).await;

    viewer
        .send(Message::Text(r#"42["data","not a sample"]"#.to_string()))
        .await
        .unwrap();
    viewer
        .send(Message::Text(r#"42["data",{"timestamp":3}]"#.to_string()))
        .await
        .unwrap();

    // The session survives and only the valid sample is relayed
    let sample = next_sample(&mut viewer).await;
    assert_eq!(sample, Sample::new(3.0, vec![]));
    assert_eq!(hub.published_count(), 1);
}

#[tokio::test]
async fn test_invalid_namespace_is_refused() {
    let addr = start_server(AppState::default()).await;
    let url = engine_url(&format!("http://{}", addr));
    let (mut client, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    assert!(matches!(next_packet(&mut client).await, EnginePacket::Open(_)));
    client
        .send(Message::Text("40/admin,".to_string()))
        .await
        .unwrap();

    let EnginePacket::Message(refusal) = next_packet(&mut client).await else {
        panic!("expected connect_error");
    };
    assert_eq!(refusal.kind, SocketPacketKind::ConnectError);
    assert_eq!(refusal.namespace, "/admin");
}

#[tokio::test]
async fn test_heartbeat_and_timeout() {
    let options = SocketOptions {
        ping_interval: Duration::from_millis(100),
        ping_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let state = AppState::new(SocketHub::new(HubConfig::default()), options);
    let hub = state.hub.clone();
    let addr = start_server(state).await;

    let mut client = join(addr).await;

    // Answered ping keeps the session alive
    assert_eq!(next_packet(&mut client).await, EnginePacket::Ping(None));
    client.send(Message::Text("3".to_string())).await.unwrap();
    assert_eq!(next_packet(&mut client).await, EnginePacket::Ping(None));

    // Unanswered ping drops it
    tokio::time::timeout(WAIT, async {
        while let Some(Ok(frame)) = client.next().await {
            if matches!(frame, Message::Close(_)) {
                break;
            }
        }
    })
    .await
    .expect("server did not drop the socket");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(hub.connection_count().await, 0);
}

#[tokio::test]
async fn test_zero_ping_interval_keeps_sessions_alive() {
    let config = Config::parse("[server]\nping_interval_ms = 0\n").unwrap();
    let state = AppState::from_config(&config);
    let hub = state.hub.clone();
    let addr = start_server(state).await;

    let url = engine_url(&format!("http://{}", addr));
    let (mut client, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    assert!(matches!(next_packet(&mut client).await, EnginePacket::Open(_)));
    client.send(Message::Text("40".to_string())).await.unwrap();

    // Pings arrive every millisecond; answer them until the connect ack
    loop {
        match next_packet(&mut client).await {
            EnginePacket::Ping(probe) => {
                client
                    .send(Message::Text(EnginePacket::Pong(probe).encode()))
                    .await
                    .unwrap();
            }
            EnginePacket::Message(packet) if packet.kind == SocketPacketKind::Connect => break,
            _ => {}
        }
    }

    assert_eq!(hub.joined_count().await, 1);
}

/// Emits a fixed list of frames, then ends
struct ScriptedSource(Vec<RawFrame>);

#[async_trait]
impl SampleSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError> {
        if self.0.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.0.remove(0)))
        }
    }
}

#[tokio::test]
async fn test_feeder_relays_through_server() {
    let state = AppState::default();
    let hub = state.hub.clone();
    let addr = start_server(state).await;

    let mut viewer = join(addr).await;

    let source = ScriptedSource(vec![
        RawFrame::Flat(vec![1.0, 10.0, 11.0]),
        RawFrame::Flat(vec![2.0, 20.0, 21.0]),
    ]);
    let config = FeederConfig {
        url: format!("http://{}", addr),
        ..Default::default()
    };
    let mut feeder = Feeder::new(Box::new(source), FrameNormalizer::default(), config);

    tokio::time::timeout(WAIT, feeder.run())
        .await
        .expect("feeder did not finish")
        .unwrap();
    assert_eq!(feeder.sent(), 2);

    assert_eq!(next_sample(&mut viewer).await, Sample::new(1.0, vec![10.0, 11.0]));
    assert_eq!(next_sample(&mut viewer).await, Sample::new(2.0, vec![20.0, 21.0]));
    assert_eq!(hub.published_count(), 2);
}
