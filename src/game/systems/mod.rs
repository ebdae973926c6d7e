pub mod collision;
pub mod distribution;
pub mod movement;
