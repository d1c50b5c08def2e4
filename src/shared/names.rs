use rand::Rng;

pub const MAX_PLAYER_NAME_LENGTH: usize = 20;

const ADJECTIVES: [&str; 8] = [
    "Happy", "Brave", "Clever", "Swift", "Sly", "Lucky", "Quiet", "Bold",
];

const ANIMALS: [&str; 8] = [
    "Viper", "Cobra", "Python", "Mamba", "Boa", "Adder", "Taipan", "Krait",
];

pub fn sanitize_player_name(name: &str, fallback: &str) -> String {
    let cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return fallback.to_string();
    }
    cleaned.chars().take(MAX_PLAYER_NAME_LENGTH).collect()
}

pub fn generate_player_name<R: Rng>(rng: &mut R) -> String {
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let animal = ANIMALS[rng.gen_range(0..ANIMALS.len())];
    format!("{adjective}{animal}")
}
