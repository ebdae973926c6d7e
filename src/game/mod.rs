pub mod arena;
pub mod command_buffer;
pub mod commands;
pub mod constants;
pub mod events;
pub mod game_loop;
pub mod leaderboard;
pub mod spatial;
pub mod state;
pub mod systems;
