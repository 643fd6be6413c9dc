// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::domain::connection::models::{ConnectParams, TransportError};
use crate::domain::connection::services::{
    ClientFrame, Connection, ConnectionEvent, ConnectionEventHandler, Connector,
};
use crate::infra::wire::{decode_server_frame, encode_client_frame, ClientFrameDto, ServerFrame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SharedHandler = Arc<dyn Fn(ConnectionEvent) + Send + Sync>;

const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens authenticated websocket connections to the chat backend.
///
/// Every connection starts with an `AUTH` frame and is only handed out once the server answered
/// with `AUTH_OK`.
pub struct WebsocketConnector {
    url: Url,
    heartbeat_interval: Duration,
}

impl WebsocketConnector {
    pub fn new(url: Url, heartbeat_interval: Duration) -> Self {
        Self {
            url,
            heartbeat_interval,
        }
    }
}

#[async_trait]
impl Connector for WebsocketConnector {
    async fn connect(
        &self,
        params: &ConnectParams,
        event_handler: ConnectionEventHandler,
    ) -> Result<Box<dyn Connection>, TransportError> {
        let (stream, _) = tokio::time::timeout(AUTH_TIMEOUT, connect_async(self.url.as_str()))
            .await
            .map_err(|_| TransportError::TimedOut)?
            .map_err(TransportError::generic)?;

        let (mut sink, mut stream) = stream.split();

        let auth = encode_client_frame(&ClientFrameDto::auth(params))
            .map_err(TransportError::generic)?;
        sink.send(Message::Text(auth))
            .await
            .map_err(TransportError::generic)?;

        tokio::time::timeout(AUTH_TIMEOUT, await_auth(&mut stream))
            .await
            .map_err(|_| TransportError::TimedOut)??;

        info!("Authenticated for course {}.", params.course_id);

        let handler: SharedHandler = Arc::from(event_handler);
        let (tx, rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(write_frames(sink, rx));
        let reader = tokio::spawn(read_frames(stream, handler.clone()));
        let heartbeat = tokio::spawn(tick_heartbeat(self.heartbeat_interval, handler));

        Ok(Box::new(WebsocketConnection {
            tx: Mutex::new(Some(tx)),
            reader,
            heartbeat,
        }))
    }
}

struct WebsocketConnection {
    tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    reader: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
}

impl Connection for WebsocketConnection {
    fn send(&self, frame: ClientFrame) -> Result<(), TransportError> {
        let text = encode_client_frame(&frame.into()).map_err(TransportError::generic)?;
        let tx = self.tx.lock();
        let Some(tx) = tx.as_ref() else {
            return Err(TransportError::NotConnected);
        };
        tx.send(text).map_err(|_| TransportError::NotConnected)
    }

    fn disconnect(&self) {
        // Stop reporting first so that closing does not look like a drop.
        self.reader.abort();
        self.heartbeat.abort();
        // Dropping the sender lets the writer send a close frame and finish.
        self.tx.lock().take();
    }
}

impl Drop for WebsocketConnection {
    fn drop(&mut self) {
        // The writer finishes by itself once the sender is gone.
        self.reader.abort();
        self.heartbeat.abort();
    }
}

async fn await_auth(stream: &mut SplitStream<WsStream>) -> Result<(), TransportError> {
    while let Some(message) = stream.next().await {
        match message.map_err(TransportError::generic)? {
            Message::Text(text) => match decode_server_frame(&text) {
                Ok(ServerFrame::AuthOk) => return Ok(()),
                Ok(ServerFrame::AuthError { reason }) => {
                    error!("Server rejected credentials. {reason}");
                    return Err(TransportError::InvalidCredentials);
                }
                Ok(frame) => debug!("Ignoring frame before authentication: {frame:?}"),
                Err(err) => warn!("Failed to decode frame. {err}"),
            },
            Message::Close(_) => break,
            _ => (),
        }
    }
    Err(TransportError::generic(
        "Connection closed during authentication.",
    ))
}

async fn write_frames(
    mut sink: SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(text) = rx.recv().await {
        if let Err(err) = sink.send(Message::Text(text)).await {
            warn!("Failed to write frame. {err}");
            return;
        }
    }
    if let Err(err) = sink.close().await {
        debug!("Failed to close websocket. {err}");
    }
}

async fn read_frames(mut stream: SplitStream<WsStream>, handler: SharedHandler) {
    let error = loop {
        let Some(message) = stream.next().await else {
            break None;
        };

        let message = match message {
            Ok(message) => message,
            Err(err) => break Some(TransportError::generic(err)),
        };

        match message {
            Message::Text(text) => match decode_server_frame(&text) {
                Ok(ServerFrame::Event(event)) => handler(ConnectionEvent::Event(event)),
                Ok(ServerFrame::Pong) => handler(ConnectionEvent::Pong),
                Ok(ServerFrame::Unknown { frame_type }) => {
                    debug!("Skipping frame of unknown type {frame_type}.")
                }
                Ok(frame) => debug!("Ignoring unexpected frame {frame:?}"),
                Err(err) => warn!("Skipping undecodable frame. {err}"),
            },
            Message::Close(frame) => {
                info!("Server closed the connection. {frame:?}");
                break None;
            }
            _ => (),
        }
    };

    handler(ConnectionEvent::Disconnected { error })
}

async fn tick_heartbeat(period: Duration, handler: SharedHandler) {
    let mut interval = tokio::time::interval(period.max(Duration::from_secs(1)));
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        handler(ConnectionEvent::PingTimer);
    }
}
