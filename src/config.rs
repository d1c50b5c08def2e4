use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    // Persistent arena: starts with the first player, never ends, death
    // respawns immediately.
    OpenArena,
    // Closed lobby: starts once everyone is ready, eliminates the dead, ends
    // when at most one snake is left standing.
    Lobby,
}

#[derive(Debug, Clone, Copy)]
pub struct GameConfig {
    pub width: i32,
    pub height: i32,
    pub tick_rate_ms: u64,
    pub max_players: usize,
    pub min_players_to_start: usize,
    pub food_count: usize,
    pub mode: GameMode,
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            tick_rate_ms: 100,
            max_players: 8,
            min_players_to_start: 2,
            food_count: 10,
            mode: GameMode::OpenArena,
            rng_seed: None,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            width: parse_var(&lookup, "GRID_WIDTH")
                .unwrap_or(defaults.width)
                .max(10),
            height: parse_var(&lookup, "GRID_HEIGHT")
                .unwrap_or(defaults.height)
                .max(10),
            tick_rate_ms: parse_var(&lookup, "TICK_RATE_MS")
                .unwrap_or(defaults.tick_rate_ms)
                .max(10),
            max_players: parse_var(&lookup, "MAX_PLAYERS")
                .unwrap_or(defaults.max_players)
                .max(1),
            min_players_to_start: parse_var(&lookup, "MIN_PLAYERS_TO_START")
                .unwrap_or(defaults.min_players_to_start)
                .max(1),
            food_count: parse_var(&lookup, "FOOD_COUNT").unwrap_or(defaults.food_count),
            mode: match lookup("GAME_MODE").as_deref() {
                Some("lobby") => GameMode::Lobby,
                Some("open") => GameMode::OpenArena,
                _ => defaults.mode,
            },
            rng_seed: parse_var(&lookup, "GAME_RNG_SEED"),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> GameConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        GameConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.width, 50);
        assert_eq!(config.height, 50);
        assert_eq!(config.tick_rate_ms, 100);
        assert_eq!(config.mode, GameMode::OpenArena);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn recognized_options_are_parsed() {
        let config = config_from(&[
            ("GRID_WIDTH", "30"),
            ("GRID_HEIGHT", "20"),
            ("TICK_RATE_MS", "50"),
            ("MAX_PLAYERS", "4"),
            ("MIN_PLAYERS_TO_START", "3"),
            ("FOOD_COUNT", "5"),
            ("GAME_MODE", "lobby"),
            ("GAME_RNG_SEED", "1234"),
        ]);
        assert_eq!(config.width, 30);
        assert_eq!(config.height, 20);
        assert_eq!(config.tick_rate_ms, 50);
        assert_eq!(config.max_players, 4);
        assert_eq!(config.min_players_to_start, 3);
        assert_eq!(config.food_count, 5);
        assert_eq!(config.mode, GameMode::Lobby);
        assert_eq!(config.rng_seed, Some(1234));
    }

    #[test]
    fn unparseable_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("GRID_WIDTH", "wide"),
            ("GAME_MODE", "battle-royale"),
            ("GAME_RNG_SEED", "-1"),
        ]);
        assert_eq!(config.width, 50);
        assert_eq!(config.mode, GameMode::OpenArena);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn degenerate_values_are_clamped() {
        let config = config_from(&[
            ("GRID_WIDTH", "1"),
            ("TICK_RATE_MS", "0"),
            ("MAX_PLAYERS", "0"),
        ]);
        assert_eq!(config.width, 10);
        assert_eq!(config.tick_rate_ms, 10);
        assert_eq!(config.max_players, 1);
    }
}
