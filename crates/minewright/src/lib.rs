//! Minewright - a scripted game-server agent with a supervised session.

pub mod bridge;
pub mod chat;
pub mod config;
pub mod handlers;
pub mod routines;
pub mod server;
pub mod supervisor;
