//! Episodic playback continuity for a media-browsing client.
//!
//! nextup decides, while an episode is playing, what comes next: it looks one
//! episode ahead in the active translation (dub or sub group), pre-buffers it
//! in the player's queue, saves resume positions on a fixed cadence and falls
//! back gracefully when the translation runs out of episodes.
//!
//! # Features
//!
//! - Next-episode search across seasons and sibling translations
//! - Quality selection with a fixed fallback ranking
//! - Resume positions and watched flags through a pluggable progress store
//! - A single-writer engine driven by timer, player and host events
//!
//! # Usage
//!
//! ```bash
//! # Where does playback continue after S1 E12?
//! cargo run -- next --catalog show.json --season 1 --episode 12
//!
//! # Run a simulated session
//! cargo run -- play --catalog show.json --group "Studio A" --speed 30
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod preferences;
pub mod progress;
pub mod reachability;
pub mod stream;
pub mod types;
