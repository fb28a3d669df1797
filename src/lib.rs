//! # Postpilot Library
//!
//! Core of the postpilot service: the OAuth handshake state store, linked
//! social accounts, and the post lifecycle from draft through publication.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod cursor;
pub mod db;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod publisher;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
