// Shared fakes for the integration tests: a scripted keyboard, a surface that
// records what it was asked to draw, and a tiny stand-in for the game server.
#![allow(dead_code)]

use std::{
    collections::HashSet,
    net::SocketAddr,
    thread,
    time::{Duration, Instant},
};

use pong_multiplayer::{
    config::Config,
    game::{Game, Session},
    geometry::{Rect, Vector},
    render::{Key, Keyboard, Surface, TextStyle, Tone},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    runtime::Runtime,
};

/// Keys for the next frame. Tapped keys and typed text only last one frame.
#[derive(Default)]
pub struct ScriptedKeyboard {
    held: HashSet<Key>,
    tapped: HashSet<Key>,
    typed: Vec<char>,
}

impl ScriptedKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tap(&mut self, key: Key) {
        self.tapped.insert(key);
    }

    pub fn hold(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn type_text(&mut self, text: &str) {
        self.typed.extend(text.chars());
    }

    pub fn next_frame(&mut self) {
        self.tapped.clear();
        self.typed.clear();
    }
}

impl Keyboard for ScriptedKeyboard {
    fn is_pressed(&self, key: Key) -> bool {
        self.held.contains(&key) || self.tapped.contains(&key)
    }

    fn just_pressed(&self, key: Key) -> bool {
        self.tapped.contains(&key)
    }

    fn typed(&self) -> &[char] {
        &self.typed
    }
}

/// Remembers every call. Text is 10 units wide per character.
#[derive(Default)]
pub struct RecordingSurface {
    pub texts: Vec<(String, Vector, TextStyle)>,
    pub rects: Vec<(Rect, Tone)>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts.iter().any(|(text, _, _)| text.contains(needle))
    }
}

impl Surface for RecordingSurface {
    fn fill_rect(&mut self, rect: Rect, tone: Tone) {
        self.rects.push((rect, tone));
    }

    fn draw_text(&mut self, text: &str, at: Vector, style: TextStyle) {
        self.texts.push((text.to_string(), at, style));
    }

    fn measure(&self, text: &str, size: f64) -> (f64, f64) {
        (text.chars().count() as f64 * 10.0, size)
    }
}

/// Plain-text config pointed at `server_host`, with short timeouts.
pub fn local_config(server_host: &str) -> Config {
    Config {
        server_host: server_host.to_string(),
        secure: false,
        dial_timeout: Duration::from_secs(2),
        write_timeout: Duration::from_secs(2),
        read_timeout: Duration::from_secs(2),
        http_timeout: Duration::from_secs(2),
        ..Config::default()
    }
}

/// The runtime has to outlive the game: the session holds its handle.
pub fn new_game(config: Config) -> (Runtime, Game) {
    let runtime = Runtime::new().expect("test runtime");
    let session = Session::new(config, runtime.handle().clone());
    (runtime, Game::new(session))
}

/// One frame with the current keys, then forget taps.
pub fn step(game: &mut Game, keys: &mut ScriptedKeyboard) {
    game.update(&*keys).expect("frame update");
    keys.next_frame();
}

pub fn tap(game: &mut Game, keys: &mut ScriptedKeyboard, key: Key) {
    keys.tap(key);
    step(game, keys);
}

/// Runs frames without pause until the named state is active.
pub fn run_until(game: &mut Game, keys: &mut ScriptedKeyboard, state: &str, frames: usize) -> bool {
    for _ in 0..frames {
        if game.state_name() == state {
            return true;
        }
        step(game, keys);
    }
    game.state_name() == state
}

/// Like `run_until`, but gives background tasks time to run between frames.
pub fn wait_for(game: &mut Game, keys: &mut ScriptedKeyboard, state: &str, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if game.state_name() == state {
            return true;
        }
        step(game, keys);
        thread::sleep(Duration::from_millis(5));
    }
    game.state_name() == state
}

pub fn draw(game: &Game) -> RecordingSurface {
    let mut surface = RecordingSurface::new();
    game.draw(&mut surface);
    surface
}

pub async fn listen() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    (listener, addr)
}

/// Whether the connection opens with an HTTP request for `path`, without
/// consuming anything.
pub async fn requests_path(tcp: &TcpStream, path: &str) -> bool {
    let wanted = format!("GET {path}");
    let mut head = [0u8; 64];
    for _ in 0..100 {
        let n = tcp.peek(&mut head).await.expect("peek request");
        if n >= wanted.len() {
            return head[..n].starts_with(wanted.as_bytes());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

/// Reads one HTTP request and answers it with `body` and `status`.
pub async fn answer_http(mut tcp: TcpStream, status: &str, body: &str) {
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = tcp.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..n]);
    }

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    tcp.write_all(response.as_bytes())
        .await
        .expect("write response");
    let _ = tcp.shutdown().await;
}

/// Snapshot JSON as the server sends it. `winner` flags the left player.
pub fn state_json(left_y: f64, right_y: f64, scores: (i8, i8), winner: bool) -> String {
    serde_json::json!({
        "ball": {"angle": 30.0, "bounces": 2, "position": {"X": 300.0, "Y": 200.0}},
        "current": {
            "position_y": left_y, "side": 2, "score": scores.0, "ping": 12,
            "name": "ada", "winner": winner
        },
        "opponent": {
            "position_y": right_y, "side": 1, "score": scores.1, "ping": 34,
            "name": "grace", "winner": false
        }
    })
    .to_string()
}
