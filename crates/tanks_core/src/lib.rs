//! # Tanks! Simulation Core
//!
//! The simulation engine shared by the game server and client.
//!
//! ## Overview
//!
//! This crate provides the deterministic, single-threaded simulation core:
//!
//! - **Object Registry**: slot-reuse arena with sequence-tagged [`handle::Handle`]s
//! - **Railway**: clothoid segment network, tangent-continuous A\*, train controller
//! - **Ship Interiors**: compartment graph pathfinding and atmosphere flow
//! - **Input**: key bindings compiled into per-frame [`usercmd::Usercmd`] records
//! - **Replication**: snapshot emission and apply between server and client sessions
//!
//! ## Key Concepts
//!
//! - **Frames**: the world advances in fixed ticks of [`FRAMETIME`] seconds
//! - **Handles**: 64-bit values that resolve to an object or to nothing, never to
//!   a stranger that reused the slot
//! - **Deterministic**: seeded RNG and a fixed per-frame ordering (messages, input,
//!   think in registry order, removals, snapshot)
//!
//! ## Example
//!
//! ```rust,no_run
//! use tanks_core::world::World;
//! use tanks_core::train::Train;
//!
//! let mut world = World::new().expect("world slot");
//! let train = world.spawn(Train::new(2)).expect("spawn");
//! world.run_frame();
//! assert!(world.get(train).is_some());
//! ```

pub mod clothoid;
pub mod config;
pub mod handle;
pub mod hextile;
pub mod object;
pub mod protocol;
pub mod rail;
pub mod render;
pub mod session;
pub mod ship;
pub mod sound;
pub mod tank;
pub mod train;
pub mod usercmd;
pub mod world;

mod search;

/// Duration of one simulation tick in seconds.
pub const FRAMETIME: f32 = 0.05;

/// Maximum number of player slots in a session.
pub const MAX_PLAYERS: usize = 16;
