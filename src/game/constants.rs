pub const STARTING_LENGTH: usize = 3;
pub const SPAWN_MARGIN: i32 = 3;
pub const SPAWN_CLEARANCE: i32 = 2;
pub const MAX_SPAWN_ATTEMPTS: usize = 32;
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;
