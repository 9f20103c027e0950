//! JSON messages exchanged with the game server.

use serde::{Deserialize, Serialize};

use crate::{
    geometry::{Side, Vector},
    level::Level,
};

/// Registration sent once right after connecting to `/multiplayer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_name: String,
    pub level: Level,
    pub screen_width: u16,
    pub screen_height: u16,
    pub max_score: i8,
}

/// Held direction keys. Only sent while at least one is down.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub up: bool,
    pub down: bool,
}

impl PlayerInput {
    pub fn is_idle(&self) -> bool {
        !self.up && !self.down
    }
}

impl From<crate::paddle::Input> for PlayerInput {
    fn from(input: crate::paddle::Input) -> Self {
        Self {
            up: input.up,
            down: input.down,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectateRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub angle: f64,
    pub bounces: u32,
    pub position: Vector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position_y: f64,
    pub side: Side,
    pub score: i8,
    pub ping: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub winner: bool,
}

/// Snapshot pushed by the server every tick. `current` is the receiving
/// client's own player, from the server's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub ball: BallState,
    #[serde(rename = "current")]
    pub current_player: PlayerState,
    #[serde(rename = "opponent")]
    pub opponent_player: PlayerState,
}

impl GameState {
    pub fn players(&self) -> [&PlayerState; 2] {
        [&self.current_player, &self.opponent_player]
    }

    pub fn winner(&self) -> Option<&PlayerState> {
        self.players().into_iter().find(|player| player.winner)
    }
}

/// Handshake some servers send once both players have joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyMessage {
    pub ready: bool,
    pub name: String,
    pub opponent_name: String,
    pub side: Side,
    #[serde(default)]
    pub opponent_side: Side,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Ready(ReadyMessage),
    State(GameState),
}

/// One entry of `GET /sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub player1: String,
    pub player2: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_state() -> GameState {
        GameState {
            ball: BallState {
                angle: 137.5,
                bounces: 7,
                position: Vector::new(312.25, 118.0),
            },
            current_player: PlayerState {
                position_y: 40.0,
                side: Side::Left,
                score: 3,
                ping: 27,
                name: "ada".to_string(),
                winner: false,
            },
            opponent_player: PlayerState {
                position_y: 380.5,
                side: Side::Right,
                score: 9,
                ping: 114,
                name: "grace".to_string(),
                winner: true,
            },
        }
    }

    #[test]
    fn game_state_survives_json() {
        let state = sample_state();
        let text = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&text).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.winner().map(|p| p.name.as_str()), Some("grace"));
    }

    #[test]
    fn wire_field_names() {
        let value = serde_json::to_value(sample_state()).unwrap();
        assert_eq!(value["current"]["side"], json!(2));
        assert_eq!(value["opponent"]["side"], json!(1));
        assert_eq!(value["current"]["position_y"], json!(40.0));
        assert_eq!(value["ball"]["position"]["x"], json!(312.25));

        let info = PlayerInfo {
            player_name: "ada".to_string(),
            level: Level::Hard,
            screen_width: 640,
            screen_height: 480,
            max_score: 10,
        };
        assert_eq!(
            serde_json::to_value(info).unwrap(),
            json!({
                "player_name": "ada",
                "level": 2,
                "screen_width": 640,
                "screen_height": 480,
                "max_score": 10
            })
        );
    }

    #[test]
    fn server_messages_are_told_apart() {
        let ready = r#"{"ready":true,"name":"ada","opponent_name":"grace","side":1}"#;
        match serde_json::from_str::<ServerMessage>(ready).unwrap() {
            ServerMessage::Ready(msg) => {
                assert_eq!(msg.side, Side::Right);
                assert_eq!(msg.opponent_side, Side::Undefined);
            }
            other => panic!("unexpected {other:?}"),
        }

        let state = r#"{
            "ball": {"angle": 10, "bounces": 0, "position": {"X": 1, "Y": 2}},
            "current": {"position_y": 5, "side": 2, "score": 0, "ping": 3},
            "opponent": {"position_y": 6, "side": 1, "score": 1, "ping": 4, "name": "bo"}
        }"#;
        match serde_json::from_str::<ServerMessage>(state).unwrap() {
            ServerMessage::State(msg) => {
                assert_eq!(msg.ball.position, Vector::new(1.0, 2.0));
                assert_eq!(msg.current_player.name, "");
                assert!(msg.winner().is_none());
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(serde_json::from_str::<ServerMessage>(r#"{"hello":1}"#).is_err());
    }
}
