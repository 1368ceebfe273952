//! Shared vocabulary for Arenaforge.
//!
//! This crate defines the "language" every other layer speaks:
//!
//! - **Identity** ([`PlayerId`], [`ArenaId`], [`WorldId`]): newtype ids
//!   that can't be mixed up with each other.
//! - **Geometry** ([`Location`], [`RelativeLocation`]): where arenas and
//!   spawn points sit inside a world.
//! - **Notifications** ([`LifecycleEvent`]): what the orchestrator tells
//!   the outside world after a lifecycle change commits.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how notifications are
//!   turned into bytes for whoever delivers them.
//!
//! # Architecture
//!
//! The protocol layer sits underneath everything else. It doesn't know
//! about arenas or worlds as *things*, only about the values that
//! describe them.
//!
//! ```text
//! Protocol (ids, geometry, events) → Arena (state machine) → World (placement) → Orchestrator
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ArenaId, LifecycleEvent, Location, PlayerId, RelativeLocation, WorldId,
};
