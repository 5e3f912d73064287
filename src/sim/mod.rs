pub mod commands;
pub mod event;
pub mod game;
pub mod host;
pub mod tween;
