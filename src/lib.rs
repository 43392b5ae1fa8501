//! rating-bot - A Discord bot that watches VSUET student ratings.
//!
//! This crate provides:
//! - Scraping of the university rating tables
//! - Change detection and direct-message notifications
//! - A guided dialog for subscribing and viewing rating cards

pub mod bot;
pub mod clock;
pub mod config;
pub mod dialog;
pub mod error;
pub mod logging;
pub mod rating;
pub mod render;
pub mod store;
pub mod task;
pub mod transport;
