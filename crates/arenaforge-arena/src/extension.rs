//! The `ArenaExtension` trait: the slot where callers attach their own
//! data and behavior to an arena.
//!
//! Arenas aren't subclassed. Instead, an arena can carry one boxed
//! extension, and the arena calls its hooks at the right time. The
//! extension can be read back (and downcast to its concrete type) through
//! [`Arena::extension`](crate::Arena::extension).

use std::any::Any;

use arenaforge_protocol::PlayerId;

use crate::Arena;

/// Caller-supplied payload and lifecycle hooks for one arena.
///
/// Every hook runs after the arena's own state change has been applied, so
/// `arena` already reflects it. Hooks default to no-ops.
///
/// The two `as_any` methods enable downcasting; implement them as
/// `{ self }`.
///
/// ```rust
/// use std::any::Any;
/// use arenaforge_arena::{Arena, ArenaExtension};
/// use arenaforge_protocol::PlayerId;
///
/// #[derive(Default)]
/// struct Scoreboard { kills: u32 }
///
/// impl ArenaExtension for Scoreboard {
///     fn on_player_leave(&mut self, _arena: &Arena, _player: PlayerId) {
///         self.kills = 0;
///     }
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
/// ```
pub trait ArenaExtension: Send + 'static {
    /// Called after `player` has been added to `arena`.
    fn on_player_join(&mut self, _arena: &Arena, _player: PlayerId) {}

    /// Called after `player` has been removed from `arena`.
    fn on_player_leave(&mut self, _arena: &Arena, _player: PlayerId) {}

    /// Called once the arena is `Running`.
    fn on_start(&mut self, _arena: &Arena) {}

    /// Called once the arena is `Ended`. Membership has already been
    /// cleared; `departed` lists who was still inside.
    fn on_end(&mut self, _arena: &Arena, _departed: &[PlayerId]) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
