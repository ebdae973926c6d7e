//! Crystal Arena Server Library
//!
//! Authoritative simulation for a multiplayer grid arena: players walk a grid,
//! drink crystals, bump into walls and each other, and every point they lose is
//! scattered back onto the grid as new crystals. State changes are published as
//! events to any number of observers.
//!
//! # Features
//!
//! - `metrics_http` - Serve the metrics registry over HTTP when `METRICS_PORT` is set (enabled by default)

pub mod config;
pub mod game;
pub mod metrics;
pub mod net;
