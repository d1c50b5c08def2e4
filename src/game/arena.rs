use super::grid::{Direction, Grid, Position};
use super::resolver::{self, MoveOutcome, SnakeView};
use super::types::Player;
use crate::config::{GameConfig, GameMode};
use crate::protocol::{
    self, ClientMessage, GameStatePayload, PlayerRef, PlayerStatePayload, ReadyPlayerPayload,
    ReadyStatePayload, ServerMessage, SnakeStatePayload,
};
use crate::shared::names::{generate_player_name, sanitize_player_name};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Ended,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArenaStats {
    pub players: usize,
    pub phase: Phase,
}

#[derive(Debug)]
enum Command {
    Register {
        session_id: String,
        name: Option<String>,
        sender: mpsc::Sender<String>,
    },
    Unregister {
        session_id: String,
    },
    Direction {
        session_id: String,
        direction: Direction,
    },
    Ready {
        session_id: String,
    },
    StartGame {
        session_id: String,
    },
}

// Handle to one arena. The arena's state lives inside a spawned task that is
// its sole mutator; this handle only enqueues commands, which the task drains
// at the next tick boundary.
#[derive(Debug)]
pub struct Arena {
    commands: mpsc::UnboundedSender<Command>,
    stats: Arc<StdMutex<ArenaStats>>,
}

impl Arena {
    pub fn new(config: GameConfig) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let stats = Arc::new(StdMutex::new(ArenaStats {
            players: 0,
            phase: Phase::Idle,
        }));
        let state = ArenaState::new(config);
        tokio::spawn(run_loop(state, receiver, Arc::clone(&stats)));
        Self { commands, stats }
    }

    pub fn connect(&self, session_id: String, name: Option<String>, sender: mpsc::Sender<String>) {
        let _ = self.commands.send(Command::Register {
            session_id,
            name,
            sender,
        });
    }

    pub fn disconnect(&self, session_id: &str) {
        let _ = self.commands.send(Command::Unregister {
            session_id: session_id.to_string(),
        });
    }

    pub fn handle_text_message(&self, session_id: &str, text: &str) {
        let Some(message) = protocol::decode_client_message(text) else {
            tracing::debug!(session_id, "dropping malformed client frame");
            return;
        };
        let command = match message {
            ClientMessage::Direction { direction } => Command::Direction {
                session_id: session_id.to_string(),
                direction,
            },
            ClientMessage::Ready => Command::Ready {
                session_id: session_id.to_string(),
            },
            ClientMessage::StartGame => Command::StartGame {
                session_id: session_id.to_string(),
            },
        };
        let _ = self.commands.send(command);
    }

    pub fn stats(&self) -> ArenaStats {
        *self.stats.lock().unwrap()
    }
}

async fn run_loop(
    mut state: ArenaState,
    mut receiver: mpsc::UnboundedReceiver<Command>,
    stats: Arc<StdMutex<ArenaStats>>,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(state.config.tick_rate_ms));
    let mut pending: Vec<Command> = Vec::new();
    loop {
        tokio::select! {
            _ = interval.tick() => {
                while let Ok(command) = receiver.try_recv() {
                    pending.push(command);
                }
                for command in pending.drain(..) {
                    state.apply(command);
                }
                state.tick();
                *stats.lock().unwrap() = state.stats();
            }
            received = receiver.recv() => {
                match received {
                    // Buffered until the next tick boundary; intents never
                    // take effect mid-resolution.
                    Some(command) => pending.push(command),
                    None => break,
                }
            }
        }
    }
}

#[derive(Debug)]
struct ArenaState {
    config: GameConfig,
    grid: Grid,
    players: BTreeMap<String, Player>,
    foods: Vec<Position>,
    phase: Phase,
    rng: StdRng,
}

impl ArenaState {
    fn new(config: GameConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            grid: Grid {
                width: config.width,
                height: config.height,
            },
            config,
            players: BTreeMap::new(),
            foods: Vec::new(),
            phase: Phase::Idle,
            rng,
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Register {
                session_id,
                name,
                sender,
            } => self.register(session_id, name, sender),
            Command::Unregister { session_id } => self.unregister(&session_id),
            Command::Direction {
                session_id,
                direction,
            } => self.submit_direction(&session_id, direction),
            Command::Ready { session_id } => self.mark_ready(&session_id),
            Command::StartGame { session_id } => self.start_game(&session_id),
        }
    }

    fn register(&mut self, session_id: String, name: Option<String>, sender: mpsc::Sender<String>) {
        if let Some(player) = self.players.get_mut(&session_id) {
            // Duplicate registration keeps the existing player and only
            // refreshes its outbound queue.
            player.sender = sender;
            return;
        }
        if self.config.mode == GameMode::Lobby && self.phase != Phase::Idle {
            send_error(&sender, "game already started");
            return;
        }
        if self.players.len() >= self.config.max_players {
            send_error(&sender, "arena is full");
            return;
        }
        let occupied = self.occupied_cells();
        let Some(snake) = resolver::spawn_snake(self.grid, &occupied, &mut self.rng) else {
            send_error(&sender, "no room to spawn");
            return;
        };
        let name = match name {
            Some(value) => sanitize_player_name(&value, "Player"),
            None => generate_player_name(&mut self.rng),
        };
        tracing::info!(session_id, name, "player registered");
        self.players.insert(
            session_id.clone(),
            Player {
                id: session_id.clone(),
                name: name.clone(),
                snake,
                ready: false,
                sender,
            },
        );
        self.broadcast(&ServerMessage::PlayerJoin(PlayerRef {
            id: session_id,
            name,
        }));
        if self.config.mode == GameMode::Lobby {
            self.broadcast_ready_state();
        } else if self.phase == Phase::Idle {
            self.begin_running();
        }
        // A state frame right away, so the new player sees the board before
        // the next tick lands.
        self.broadcast_game_state();
    }

    fn unregister(&mut self, session_id: &str) {
        let Some(player) = self.players.remove(session_id) else {
            return;
        };
        if player.snake.alive {
            // A departing snake leaves its mass behind as food.
            self.foods.extend(player.snake.body.iter().copied());
        }
        tracing::info!(session_id, name = player.name, "player unregistered");
        self.broadcast(&ServerMessage::PlayerLeave(PlayerRef {
            id: player.id,
            name: player.name,
        }));
        if self.config.mode == GameMode::Lobby {
            match self.phase {
                Phase::Idle => self.broadcast_ready_state(),
                Phase::Running => {
                    if self.players.len() < self.config.min_players_to_start
                        || self.live_count() <= 1
                    {
                        self.finish_game();
                    }
                }
                Phase::Ended => {
                    // The last session leaving resets the lobby for a new match.
                    if self.players.is_empty() {
                        self.phase = Phase::Idle;
                        self.foods.clear();
                    }
                }
            }
        }
    }

    fn submit_direction(&mut self, session_id: &str, direction: Direction) {
        let Some(player) = self.players.get_mut(session_id) else {
            return;
        };
        if !player.snake.alive {
            return;
        }
        player.snake.turn(direction);
    }

    fn mark_ready(&mut self, session_id: &str) {
        if self.config.mode != GameMode::Lobby || self.phase != Phase::Idle {
            return;
        }
        let Some(player) = self.players.get_mut(session_id) else {
            return;
        };
        player.ready = true;
        self.broadcast_ready_state();
    }

    fn start_game(&mut self, session_id: &str) {
        if self.config.mode != GameMode::Lobby || self.phase != Phase::Idle {
            return;
        }
        let Some(player) = self.players.get(session_id) else {
            return;
        };
        let all_ready = self.players.values().all(|player| player.ready);
        let enough = self.players.len() == 1 || self.players.len() >= self.config.min_players_to_start;
        if all_ready && enough {
            self.begin_running();
        } else {
            send_error(
                &player.sender,
                "cannot start: players not ready or not enough players",
            );
        }
    }

    fn begin_running(&mut self) {
        self.phase = Phase::Running;
        self.top_up_foods();
        tracing::info!(players = self.players.len(), "game started");
        self.broadcast(&ServerMessage::GameStart);
    }

    fn tick(&mut self) {
        if self.phase != Phase::Running {
            return;
        }

        if self.config.mode == GameMode::OpenArena {
            self.respawn_dead_players();
        }

        let mut ids: Vec<String> = Vec::new();
        let mut views: Vec<SnakeView> = Vec::new();
        for (id, player) in &self.players {
            if player.snake.alive {
                ids.push(id.clone());
                views.push(SnakeView {
                    body: player.snake.body.clone(),
                    direction: player.snake.direction,
                });
            }
        }

        let outcomes = resolver::resolve_tick(self.grid, &self.foods, &views);

        let mut consumed: HashSet<usize> = HashSet::new();
        let mut died: Vec<String> = Vec::new();
        for (id, outcome) in ids.iter().zip(outcomes) {
            match outcome {
                MoveOutcome::Move { new_head } => {
                    if let Some(player) = self.players.get_mut(id) {
                        player.snake.advance(new_head, false);
                    }
                }
                MoveOutcome::Grow {
                    new_head,
                    food_index,
                } => {
                    consumed.insert(food_index);
                    if let Some(player) = self.players.get_mut(id) {
                        player.snake.advance(new_head, true);
                    }
                }
                MoveOutcome::Die { cause } => {
                    tracing::debug!(session_id = id.as_str(), ?cause, "snake died");
                    died.push(id.clone());
                }
            }
        }

        if !consumed.is_empty() {
            let mut index = 0;
            self.foods.retain(|_| {
                let keep = !consumed.contains(&index);
                index += 1;
                keep
            });
        }

        for id in died {
            self.handle_death(&id);
        }

        self.top_up_foods();

        if self.config.mode == GameMode::Lobby && self.live_count() <= 1 {
            self.finish_game();
        }

        self.broadcast_game_state();
    }

    fn handle_death(&mut self, session_id: &str) {
        let (food_drop, player_ref) = {
            let Some(player) = self.players.get_mut(session_id) else {
                return;
            };
            if !player.snake.alive {
                return;
            }
            player.snake.alive = false;
            (
                player.snake.body.clone(),
                PlayerRef {
                    id: player.id.clone(),
                    name: player.name.clone(),
                },
            )
        };
        // Mass conservation: every segment of the dead body becomes food at
        // its former cell.
        self.foods.extend(food_drop);
        self.broadcast(&ServerMessage::PlayerDead(player_ref));
        if self.config.mode == GameMode::OpenArena {
            self.respawn(session_id);
        }
    }

    fn respawn_dead_players(&mut self) {
        let dead: Vec<String> = self
            .players
            .iter()
            .filter(|(_, player)| !player.snake.alive)
            .map(|(id, _)| id.clone())
            .collect();
        for id in dead {
            self.respawn(&id);
        }
    }

    fn respawn(&mut self, session_id: &str) {
        let occupied = self.occupied_cells();
        let Some(snake) = resolver::spawn_snake(self.grid, &occupied, &mut self.rng) else {
            // No safe cell this tick; the next tick retries.
            return;
        };
        if let Some(player) = self.players.get_mut(session_id) {
            tracing::debug!(session_id, "player respawned");
            player.snake = snake;
        }
    }

    fn finish_game(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        self.phase = Phase::Ended;
        let mut live = self.players.values().filter(|player| player.snake.alive);
        let winner = match (live.next(), live.next()) {
            (Some(player), None) => Some(player.id.clone()),
            _ => None,
        };
        tracing::info!(?winner, "game over");
        self.broadcast(&ServerMessage::GameOver { winner });
    }

    fn live_count(&self) -> usize {
        self.players
            .values()
            .filter(|player| player.snake.alive)
            .count()
    }

    fn occupied_cells(&self) -> HashSet<Position> {
        self.players
            .values()
            .filter(|player| player.snake.alive)
            .flat_map(|player| player.snake.body.iter().copied())
            .collect()
    }

    fn top_up_foods(&mut self) {
        let mut blocked = self.occupied_cells();
        blocked.extend(self.foods.iter().copied());
        while self.foods.len() < self.config.food_count {
            let Some(food) = resolver::spawn_food(self.grid, &blocked, &mut self.rng) else {
                break;
            };
            blocked.insert(food);
            self.foods.push(food);
        }
    }

    fn game_state_payload(&self) -> GameStatePayload {
        GameStatePayload {
            players: self
                .players
                .values()
                .map(|player| PlayerStatePayload {
                    id: player.id.clone(),
                    name: player.name.clone(),
                    snake: SnakeStatePayload {
                        body: player.snake.body.clone(),
                        alive: player.snake.alive,
                    },
                })
                .collect(),
            foods: self.foods.clone(),
        }
    }

    fn broadcast_game_state(&mut self) {
        let message = ServerMessage::GameState(self.game_state_payload());
        self.broadcast(&message);
    }

    fn broadcast_ready_state(&mut self) {
        let players: Vec<ReadyPlayerPayload> = self
            .players
            .values()
            .map(|player| ReadyPlayerPayload {
                id: player.id.clone(),
                name: player.name.clone(),
                ready: player.ready,
            })
            .collect();
        let all_ready = !players.is_empty() && players.iter().all(|player| player.ready);
        let message = ServerMessage::ReadyState(ReadyStatePayload {
            all_ready,
            player_count: players.len(),
            players,
        });
        self.broadcast(&message);
    }

    fn broadcast(&mut self, message: &ServerMessage) {
        let payload = match message.encode() {
            Ok(payload) => payload,
            Err(error) => {
                // Simulation continuity outranks delivery; skip this frame.
                tracing::warn!(?error, "failed to encode broadcast frame");
                return;
            }
        };
        let mut stale: Vec<String> = Vec::new();
        for (session_id, player) in &self.players {
            match player.sender.try_send(payload.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    // Slow consumer: drop this frame for this session only.
                    tracing::debug!(session_id, "outbound queue full, dropping frame");
                }
                Err(TrySendError::Closed(_)) => stale.push(session_id.clone()),
            }
        }
        for session_id in stale {
            self.unregister(&session_id);
        }
    }

    fn stats(&self) -> ArenaStats {
        ArenaStats {
            players: self.players.len(),
            phase: self.phase,
        }
    }
}

fn send_error(sender: &mpsc::Sender<String>, message: &str) {
    let frame = ServerMessage::Error {
        message: message.to_string(),
    };
    match frame.encode() {
        Ok(payload) => {
            let _ = sender.try_send(payload);
        }
        Err(error) => tracing::warn!(?error, "failed to encode error frame"),
    }
}
