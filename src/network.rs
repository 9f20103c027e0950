use std::{fmt, time::Duration};

use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Serialize;
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    task::JoinHandle,
    time::timeout,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self,
        protocol::{frame::coding::CloseCode, CloseFrame},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::{
    config::{Config, GAME_STATE_CHANNEL_CAPACITY},
    protocol::{
        GameState, PlayerInfo, PlayerInput, ReadyMessage, ServerMessage, SessionInfo,
        SpectateRequest,
    },
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum NetError {
    Dial(tungstenite::Error),
    DialTimeout,
    WriteTimeout,
    ReadTimeout,
    Ws(tungstenite::Error),
    Decode(serde_json::Error),
    Encode(serde_json::Error),
    /// The server closed the socket or the stream ended.
    Closed,
    Http(reqwest::Error),
    HttpStatus(u16),
    NotConnected,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Dial(e) => write!(f, "failed to connect to server: {e}"),
            NetError::DialTimeout => write!(f, "timed out connecting to server"),
            NetError::WriteTimeout => write!(f, "timed out sending to server"),
            NetError::ReadTimeout => write!(f, "server stopped sending updates"),
            NetError::Ws(e) => write!(f, "websocket error: {e}"),
            NetError::Decode(e) => write!(f, "malformed server message: {e}"),
            NetError::Encode(e) => write!(f, "failed to encode message: {e}"),
            NetError::Closed => write!(f, "connection closed by server"),
            NetError::Http(e) => write!(f, "http request failed: {e}"),
            NetError::HttpStatus(status) => write!(f, "server answered with status {status}"),
            NetError::NotConnected => write!(f, "not connected"),
        }
    }
}

impl std::error::Error for NetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetError::Dial(e) | NetError::Ws(e) => Some(e),
            NetError::Decode(e) | NetError::Encode(e) => Some(e),
            NetError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<tungstenite::Error> for NetError {
    fn from(e: tungstenite::Error) -> Self {
        NetError::Ws(e)
    }
}

impl From<reqwest::Error> for NetError {
    fn from(e: reqwest::Error) -> Self {
        NetError::Http(e)
    }
}

// ---------------------------------------------------------------------------
// Events the receive task sends back to the game loop
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum NetworkEvent {
    /// Both players joined; carries names and sides.
    Ready(ReadyMessage),
    /// Authoritative snapshot for this tick.
    State(GameState),
    /// The receive loop stopped on an error. Always the last event.
    Failed(NetError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Multiplayer,
    Spectate,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Multiplayer => "/multiplayer",
            Endpoint::Spectate => "/spectate",
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// One websocket connection, scoped to a single match attempt.
///
/// Writes go through the sink owned here; reads happen on a task started by
/// `receive_game_state`. Dropping or closing the client stops that task.
pub struct NetworkClient {
    sink: SplitSink<WsStream, Message>,
    stream: Option<SplitStream<WsStream>>,
    cancel: watch::Sender<bool>,
    write_timeout: Duration,
    read_timeout: Duration,
    closed: bool,
}

impl NetworkClient {
    pub async fn connect(config: &Config, endpoint: Endpoint) -> Result<Self, NetError> {
        let url = config.websocket_url(endpoint.path());
        debug!(%url, "dialing game server");

        let (ws, _response) = timeout(config.dial_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| NetError::DialTimeout)?
            .map_err(NetError::Dial)?;

        info!(%url, "connected to game server");

        let (sink, stream) = ws.split();
        let (cancel, _) = watch::channel(false);

        Ok(Self {
            sink,
            stream: Some(stream),
            cancel,
            write_timeout: config.write_timeout,
            read_timeout: config.read_timeout,
            closed: false,
        })
    }

    pub async fn send_player_info(&mut self, info: &PlayerInfo) -> Result<(), NetError> {
        self.send_json(info).await
    }

    pub async fn send_spectate_request(&mut self, session_id: &str) -> Result<(), NetError> {
        self.send_json(&SpectateRequest {
            session_id: session_id.to_string(),
        })
        .await
    }

    /// Idle input is never sent.
    pub async fn send_player_input(&mut self, input: PlayerInput) -> Result<(), NetError> {
        if input.is_idle() {
            return Ok(());
        }

        self.send_json(&input).await
    }

    /// Starts the receive loop on the current tokio runtime. Can only be
    /// called once per connection.
    pub fn receive_game_state(
        &mut self,
        events: mpsc::Sender<NetworkEvent>,
    ) -> Result<JoinHandle<()>, NetError> {
        if self.closed {
            return Err(NetError::NotConnected);
        }

        let stream = self.stream.take().ok_or(NetError::NotConnected)?;
        let cancel = self.cancel.subscribe();

        Ok(tokio::spawn(receive_loop(
            stream,
            events,
            cancel,
            self.read_timeout,
        )))
    }

    /// Stops the receive loop and sends a normal close frame. Failures are
    /// only logged.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel.send_replace(true);

        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        match timeout(self.write_timeout, self.sink.send(Message::Close(Some(frame)))).await {
            Ok(Ok(())) => debug!("websocket closed"),
            Ok(Err(e)) => warn!(error = %e, "failed to close websocket"),
            Err(_) => warn!("timed out closing websocket"),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn send_json<T: Serialize>(&mut self, msg: &T) -> Result<(), NetError> {
        if self.closed {
            return Err(NetError::NotConnected);
        }

        let text = serde_json::to_string(msg).map_err(NetError::Encode)?;
        timeout(self.write_timeout, self.sink.send(Message::text(text)))
            .await
            .map_err(|_| NetError::WriteTimeout)??;

        Ok(())
    }
}

/// A connected client plus the consumer end of its event channel.
pub struct Link {
    pub client: NetworkClient,
    pub events: mpsc::Receiver<NetworkEvent>,
}

impl Link {
    /// Connects to `/multiplayer`, registers the player and starts receiving.
    pub async fn multiplayer(config: &Config, info: &PlayerInfo) -> Result<Self, NetError> {
        let mut client = NetworkClient::connect(config, Endpoint::Multiplayer).await?;
        client.send_player_info(info).await?;
        Self::start(client)
    }

    /// Connects to `/spectate` and asks to follow `session_id`.
    pub async fn spectate(config: &Config, session_id: &str) -> Result<Self, NetError> {
        let mut client = NetworkClient::connect(config, Endpoint::Spectate).await?;
        client.send_spectate_request(session_id).await?;
        Self::start(client)
    }

    fn start(mut client: NetworkClient) -> Result<Self, NetError> {
        let (tx, events) = mpsc::channel(GAME_STATE_CHANNEL_CAPACITY);
        client.receive_game_state(tx)?;
        Ok(Self { client, events })
    }
}

// ---------------------------------------------------------------------------
// Receive loop
// ---------------------------------------------------------------------------

async fn receive_loop(
    mut stream: SplitStream<WsStream>,
    events: mpsc::Sender<NetworkEvent>,
    mut cancel: watch::Receiver<bool>,
    read_timeout: Duration,
) {
    // No read deadline until the first message: the server stays silent while
    // the player waits for an opponent.
    let mut started = false;

    loop {
        if *cancel.borrow() {
            break;
        }

        let next = tokio::select! {
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
                continue;
            }
            next = read_message(&mut stream, started.then_some(read_timeout)) => next,
        };

        let event = match next {
            Ok(Some(msg)) => {
                started = true;
                match msg {
                    ServerMessage::Ready(ready) => NetworkEvent::Ready(ready),
                    ServerMessage::State(state) => NetworkEvent::State(state),
                }
            }
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "receive loop stopped");
                let _ = events.send(NetworkEvent::Failed(e)).await;
                break;
            }
        };

        if events.send(event).await.is_err() {
            debug!("game state consumer dropped; receive loop exiting");
            break;
        }
    }

    debug!("receive loop finished");
}

/// Reads one frame. `Ok(None)` for control frames that carry no message.
async fn read_message(
    stream: &mut SplitStream<WsStream>,
    deadline: Option<Duration>,
) -> Result<Option<ServerMessage>, NetError> {
    let frame = match deadline {
        Some(limit) => timeout(limit, stream.next())
            .await
            .map_err(|_| NetError::ReadTimeout)?,
        None => stream.next().await,
    };

    match frame {
        None => Err(NetError::Closed),
        Some(Err(e)) => Err(NetError::Ws(e)),
        Some(Ok(Message::Text(text))) => serde_json::from_str(text.as_str())
            .map(Some)
            .map_err(NetError::Decode),
        Some(Ok(Message::Binary(data))) => serde_json::from_slice(&data)
            .map(Some)
            .map_err(NetError::Decode),
        Some(Ok(Message::Close(frame))) => {
            debug!(?frame, "server sent close");
            Err(NetError::Closed)
        }
        Some(Ok(_)) => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Session listing
// ---------------------------------------------------------------------------

/// `GET /sessions`. Anything but 200 with a JSON array is an error.
pub async fn fetch_sessions(config: &Config) -> Result<Vec<SessionInfo>, NetError> {
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    let res = http.get(config.http_url("/sessions")).send().await?;
    let status = res.status();
    if status != reqwest::StatusCode::OK {
        return Err(NetError::HttpStatus(status.as_u16()));
    }

    let body = res.bytes().await?;
    serde_json::from_slice(&body).map_err(NetError::Decode)
}
