use crate::game::grid::{Direction, Position};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    #[serde(rename = "direction")]
    Direction { direction: Direction },
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "startGame")]
    StartGame,
}

pub fn decode_client_message(text: &str) -> Option<ClientMessage> {
    serde_json::from_str(text).ok()
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    #[serde(rename = "game_state")]
    GameState(GameStatePayload),
    #[serde(rename = "player_join")]
    PlayerJoin(PlayerRef),
    #[serde(rename = "player_leave")]
    PlayerLeave(PlayerRef),
    #[serde(rename = "player_dead")]
    PlayerDead(PlayerRef),
    #[serde(rename = "game_start")]
    GameStart,
    #[serde(rename = "game_over")]
    GameOver { winner: Option<String> },
    #[serde(rename = "ready_state")]
    ReadyState(ReadyStatePayload),
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameStatePayload {
    pub players: Vec<PlayerStatePayload>,
    pub foods: Vec<Position>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatePayload {
    pub id: String,
    pub name: String,
    pub snake: SnakeStatePayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnakeStatePayload {
    pub body: Vec<Position>,
    pub alive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadyStatePayload {
    #[serde(rename = "allReady")]
    pub all_ready: bool,
    #[serde(rename = "playerCount")]
    pub player_count: usize,
    pub players: Vec<ReadyPlayerPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadyPlayerPayload {
    pub id: String,
    pub name: String,
    pub ready: bool,
}
