pub mod ai;
pub mod ball;
pub mod config;
pub mod error;
pub mod game;
pub mod game_theme;
pub mod geometry;
pub mod level;
pub mod network;
pub mod paddle;
pub mod protocol;
pub mod render;
