/// Arena grid defaults
pub mod arena {
    /// Grid width in cells
    pub const WIDTH: i32 = 25;
    /// Grid height in cells
    pub const HEIGHT: i32 = 25;
    /// Pixels per cell, for renderers only
    pub const PIXELS_PER_FIELD: u32 = 16;
}

/// Scoring and collision tunables
pub mod scoring {
    /// Radius used for spawn-sound proximity and explosion scatter
    pub const MAX_COLLISION_DISTANCE: u32 = 4;
    /// Points each player loses when two players meet on a cell
    pub const PLAYER_COLLISION_COST: u32 = 100;
    /// Points lost when bumping into the grid border
    pub const WALL_COLLISION_COST: u32 = 150;
    /// Score a player joins with
    pub const INITIAL_SCORE: u32 = 500;
    /// Quantity of each auto-spawned crystal
    pub const AUTO_DROP_CRYSTAL_VALUE: u32 = 50;
}

/// Crystal spawning schedule
pub mod spawn {
    /// Crystals seeded when the arena starts
    pub const INITIAL_CRYSTALS: usize = 5;
    /// Seconds between periodic crystal spawns
    pub const INTERVAL_SECS: u64 = 20;
}

/// Game loop timing
pub mod game {
    /// How often queued commands are drained, in milliseconds
    pub const COMMAND_POLL_MS: u64 = 16;
    /// Default capacity of the command buffer
    pub const COMMAND_BUFFER_CAPACITY: usize = 1000;
    /// Rows in the score table
    pub const LEADERBOARD_SIZE: usize = 10;
}
