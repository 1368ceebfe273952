//! A single arena: its placement, membership, spawn assignment, and
//! lifecycle state.
//!
//! `Arena` is plain data with `&mut self` transitions. It does no locking
//! of its own; whoever shares it (the orchestrator) wraps it in a mutex so
//! that membership checks and state changes happen atomically.

use std::fmt;

use arenaforge_protocol::{ArenaId, Location, PlayerId, WorldId};
use indexmap::IndexMap;

use crate::{ArenaConfig, ArenaError, ArenaExtension, ArenaState, SchematicData};

/// A snapshot of arena metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaInfo {
    pub arena_id: ArenaId,
    pub world_id: WorldId,
    pub schematic: String,
    pub origin: Location,
    pub state: ArenaState,
    pub player_count: usize,
    pub max_players: usize,
}

/// What a successful [`Arena::join`] produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinOutcome {
    /// Where the player should be spawned.
    pub spawn: Location,
    /// `true` if this join pushed the arena into `Running`.
    pub started: bool,
}

/// One game session.
pub struct Arena {
    id: ArenaId,
    world_id: WorldId,
    schematic: String,
    origin: Location,
    /// Absolute spawns: origin plus each schematic offset.
    spawns: Vec<Location>,
    config: ArenaConfig,
    state: ArenaState,
    /// Members in join order, each with the index of their spawn.
    members: IndexMap<PlayerId, usize>,
    /// Total successful joins, used to rotate through spawns.
    joins: usize,
    extension: Option<Box<dyn ArenaExtension>>,
}

impl Arena {
    /// Builds an arena in the `Created` state at `origin` in `world_id`.
    pub fn new(
        id: ArenaId,
        world_id: WorldId,
        schematic: &SchematicData,
        origin: Location,
        config: ArenaConfig,
    ) -> Self {
        let spawns = schematic
            .spawn_points()
            .iter()
            .map(|rel| origin.offset(rel))
            .collect();
        Self {
            id,
            world_id,
            schematic: schematic.name().to_string(),
            origin,
            spawns,
            config,
            state: ArenaState::Created,
            members: IndexMap::new(),
            joins: 0,
            extension: None,
        }
    }

    /// Attaches an extension, replacing any previous one.
    pub fn with_extension(mut self, extension: Box<dyn ArenaExtension>) -> Self {
        self.extension = Some(extension);
        self
    }

    /// Opens a freshly built arena for players. Unlike [`open`](Self::open)
    /// this cannot fail, since a new arena is always `Created`; an arena
    /// that is already past `Created` is returned unchanged.
    pub fn opened(mut self) -> Self {
        if self.state == ArenaState::Created {
            self.transition(ArenaState::Waiting);
        }
        self
    }

    /// Swaps the extension slot, returning what was there.
    pub fn set_extension(
        &mut self,
        extension: Option<Box<dyn ArenaExtension>>,
    ) -> Option<Box<dyn ArenaExtension>> {
        std::mem::replace(&mut self.extension, extension)
    }

    /// Borrows the extension as its concrete type.
    ///
    /// Returns `None` if there is no extension, if it is a different type,
    /// or when called from inside one of the extension's own hooks.
    pub fn extension<T: ArenaExtension>(&self) -> Option<&T> {
        self.extension.as_deref()?.as_any().downcast_ref()
    }

    pub fn extension_mut<T: ArenaExtension>(&mut self) -> Option<&mut T> {
        self.extension.as_deref_mut()?.as_any_mut().downcast_mut()
    }

    pub fn id(&self) -> ArenaId {
        self.id
    }

    pub fn world_id(&self) -> WorldId {
        self.world_id
    }

    pub fn schematic(&self) -> &str {
        &self.schematic
    }

    pub fn origin(&self) -> Location {
        self.origin
    }

    pub fn spawn_locations(&self) -> &[Location] {
        &self.spawns
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn state(&self) -> ArenaState {
        self.state
    }

    /// Members in join order.
    pub fn members(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.members.keys().copied()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.members.contains_key(&player_id)
    }

    /// The spawn assigned to `player_id` when they joined.
    pub fn spawn_for(&self, player_id: PlayerId) -> Option<Location> {
        let index = *self.members.get(&player_id)?;
        self.spawns.get(index).copied()
    }

    pub fn info(&self) -> ArenaInfo {
        ArenaInfo {
            arena_id: self.id,
            world_id: self.world_id,
            schematic: self.schematic.clone(),
            origin: self.origin,
            state: self.state,
            player_count: self.members.len(),
            max_players: self.config.max_players_per_arena,
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// `Created → Waiting`. Done once, right after placement.
    pub fn open(&mut self) -> Result<(), ArenaError> {
        self.ensure_live()?;
        if self.state != ArenaState::Created {
            return Err(self.invalid("arena is already open"));
        }
        self.transition(ArenaState::Waiting);
        Ok(())
    }

    /// Adds a player.
    ///
    /// If auto-start is on and this join reaches `min_players_to_start`,
    /// the arena goes straight through `Starting` to `Running` before this
    /// returns.
    ///
    /// # Errors
    /// - [`ArenaError::ArenaEnded`] if the arena has ended
    /// - [`ArenaError::InvalidState`] if the arena isn't `Waiting`
    /// - [`ArenaError::AlreadyMember`] if the player is already inside
    /// - [`ArenaError::ArenaFull`] if every slot is taken
    pub fn join(&mut self, player_id: PlayerId) -> Result<JoinOutcome, ArenaError> {
        self.ensure_live()?;
        if !self.state.is_joinable() {
            return Err(self.invalid("arena is not accepting players"));
        }
        if self.members.contains_key(&player_id) {
            return Err(ArenaError::AlreadyMember(player_id, self.id));
        }
        if self.members.len() >= self.config.max_players_per_arena {
            return Err(ArenaError::ArenaFull(self.id));
        }

        let spawn_index = self.joins % self.spawns.len().max(1);
        self.joins += 1;
        self.members.insert(player_id, spawn_index);
        tracing::info!(
            arena_id = %self.id,
            %player_id,
            players = self.members.len(),
            "player joined"
        );
        self.notify(|ext, arena| ext.on_player_join(arena, player_id));

        let started = self.config.auto_start_arenas
            && self.members.len() >= self.config.min_players_to_start;
        if started {
            self.run();
        }

        Ok(JoinOutcome {
            spawn: self.spawns.get(spawn_index).copied().unwrap_or(self.origin),
            started,
        })
    }

    /// Removes a player. Emptying a `Running` arena does not end it.
    ///
    /// # Errors
    /// - [`ArenaError::ArenaEnded`] if the arena has ended
    /// - [`ArenaError::InvalidState`] outside `Waiting` and `Running`
    /// - [`ArenaError::NotMember`] if the player isn't inside
    pub fn leave(&mut self, player_id: PlayerId) -> Result<(), ArenaError> {
        self.ensure_live()?;
        if !self.state.allows_leave() {
            return Err(self.invalid("players cannot leave right now"));
        }
        if self.members.shift_remove(&player_id).is_none() {
            return Err(ArenaError::NotMember(player_id, self.id));
        }
        tracing::info!(
            arena_id = %self.id,
            %player_id,
            players = self.members.len(),
            "player left"
        );
        self.notify(|ext, arena| ext.on_player_leave(arena, player_id));
        Ok(())
    }

    /// Starts a `Waiting` arena that has enough players.
    ///
    /// # Errors
    /// - [`ArenaError::ArenaEnded`] if the arena has ended
    /// - [`ArenaError::InvalidState`] if it isn't `Waiting` or is short of
    ///   `min_players_to_start`
    pub fn start(&mut self) -> Result<(), ArenaError> {
        self.ensure_live()?;
        if self.state != ArenaState::Waiting {
            return Err(self.invalid("only a waiting arena can be started"));
        }
        if self.members.len() < self.config.min_players_to_start {
            return Err(self.invalid(format!(
                "needs {} players to start, has {}",
                self.config.min_players_to_start,
                self.members.len()
            )));
        }
        self.run();
        Ok(())
    }

    /// First half of ending: moves to `Ending` and returns the state it
    /// came from, so a failed detach can [`abort_end`](Self::abort_end).
    ///
    /// # Errors
    /// - [`ArenaError::ArenaEnded`] if the arena has ended
    /// - [`ArenaError::InvalidState`] if it is already `Ending`
    pub fn begin_end(&mut self) -> Result<ArenaState, ArenaError> {
        self.ensure_live()?;
        if !self.state.can_transition_to(ArenaState::Ending) {
            return Err(self.invalid("arena is already ending"));
        }
        let previous = self.state;
        self.transition(ArenaState::Ending);
        Ok(previous)
    }

    /// Rolls an `Ending` arena back to `previous`.
    ///
    /// Only meaningful between [`begin_end`](Self::begin_end) and
    /// [`finish_end`](Self::finish_end) under the same lock, so no caller
    /// ever observes the rollback.
    pub fn abort_end(&mut self, previous: ArenaState) {
        if self.state == ArenaState::Ending {
            tracing::debug!(arena_id = %self.id, to = %previous, "arena end rolled back");
            self.state = previous;
        }
    }

    /// Second half of ending: `Ending → Ended`. Clears membership and
    /// returns the players who were still inside, in join order.
    pub fn finish_end(&mut self) -> Vec<PlayerId> {
        if self.state != ArenaState::Ending {
            return Vec::new();
        }
        self.transition(ArenaState::Ended);
        let departed: Vec<PlayerId> = self.members.drain(..).map(|(p, _)| p).collect();
        tracing::info!(
            arena_id = %self.id,
            world_id = %self.world_id,
            departed = departed.len(),
            "arena ended"
        );
        self.notify(|ext, arena| ext.on_end(arena, &departed));
        departed
    }

    /// Both halves of ending at once, for arenas that aren't attached to a
    /// world.
    pub fn end(&mut self) -> Result<Vec<PlayerId>, ArenaError> {
        self.begin_end()?;
        Ok(self.finish_end())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn run(&mut self) {
        self.transition(ArenaState::Starting);
        self.transition(ArenaState::Running);
        tracing::info!(
            arena_id = %self.id,
            players = self.members.len(),
            "arena started"
        );
        self.notify(|ext, arena| ext.on_start(arena));
    }

    fn transition(&mut self, target: ArenaState) {
        debug_assert!(
            self.state.can_transition_to(target),
            "illegal transition {} -> {}",
            self.state,
            target
        );
        self.state = target;
    }

    fn ensure_live(&self) -> Result<(), ArenaError> {
        if self.state.is_terminal() {
            return Err(ArenaError::ArenaEnded(self.id));
        }
        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> ArenaError {
        ArenaError::InvalidState {
            arena_id: self.id,
            state: self.state,
            reason: reason.into(),
        }
    }

    /// Runs a hook with the extension temporarily taken out of its slot,
    /// so the hook can borrow the arena immutably.
    fn notify(&mut self, hook: impl FnOnce(&mut dyn ArenaExtension, &Arena)) {
        if let Some(mut extension) = self.extension.take() {
            hook(&mut *extension, self);
            self.extension = Some(extension);
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("world_id", &self.world_id)
            .field("schematic", &self.schematic)
            .field("origin", &self.origin)
            .field("state", &self.state)
            .field("members", &self.members.len())
            .field("extension", &self.extension.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use arenaforge_protocol::RelativeLocation;

    use super::*;
    use crate::{ArenaConfigOverrides, SchematicRegistry};

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn schematic(spawns: &[(f64, f64, f64)]) -> SchematicData {
        let mut registry = SchematicRegistry::new();
        registry
            .register(
                "arena_a",
                spawns
                    .iter()
                    .map(|&(x, y, z)| RelativeLocation::new(x, y, z))
                    .collect(),
            )
            .unwrap();
        registry.resolve("arena_a").unwrap().clone()
    }

    fn open_arena(overrides: ArenaConfigOverrides) -> Arena {
        let config = ArenaConfig::default().merge(&overrides).unwrap();
        let mut arena = Arena::new(
            ArenaId(1),
            WorldId(1),
            &schematic(&[(0.0, 64.0, 0.0), (10.0, 64.0, 0.0)]),
            Location::new(200.0, 0.0, -100.0),
            config,
        );
        arena.open().unwrap();
        arena
    }

    fn auto_start(min: usize, max: usize) -> ArenaConfigOverrides {
        ArenaConfigOverrides::default()
            .with_auto_start_arenas(true)
            .with_min_players_to_start(min)
            .with_max_players_per_arena(max)
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl ArenaExtension for Recorder {
        fn on_player_join(&mut self, arena: &Arena, player: PlayerId) {
            self.calls.push(format!("join {player} ({})", arena.member_count()));
        }
        fn on_player_leave(&mut self, _arena: &Arena, player: PlayerId) {
            self.calls.push(format!("leave {player}"));
        }
        fn on_start(&mut self, arena: &Arena) {
            self.calls.push(format!("start {}", arena.state()));
        }
        fn on_end(&mut self, _arena: &Arena, departed: &[PlayerId]) {
            self.calls.push(format!("end {}", departed.len()));
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_new_resolves_absolute_spawns() {
        let arena = open_arena(ArenaConfigOverrides::default());
        assert_eq!(
            arena.spawn_locations(),
            &[
                Location::new(200.0, 64.0, -100.0),
                Location::new(210.0, 64.0, -100.0)
            ]
        );
    }

    #[test]
    fn test_new_starts_created_and_open_moves_to_waiting() {
        let config = ArenaConfig::default();
        let mut arena = Arena::new(
            ArenaId(1),
            WorldId(1),
            &schematic(&[(0.0, 0.0, 0.0)]),
            Location::default(),
            config,
        );
        assert_eq!(arena.state(), ArenaState::Created);
        assert!(matches!(arena.join(pid(1)), Err(ArenaError::InvalidState { .. })));

        arena.open().unwrap();
        assert_eq!(arena.state(), ArenaState::Waiting);
        assert!(arena.open().is_err());
    }

    #[test]
    fn test_opened_moves_fresh_arena_to_waiting() {
        let arena = Arena::new(
            ArenaId(1),
            WorldId(1),
            &schematic(&[(0.0, 0.0, 0.0)]),
            Location::default(),
            ArenaConfig::default(),
        )
        .opened();
        assert_eq!(arena.state(), ArenaState::Waiting);

        let mut arena = arena.opened();
        assert_eq!(arena.state(), ArenaState::Waiting);
        assert!(arena.join(pid(1)).is_ok());
    }

    #[test]
    fn test_join_below_threshold_stays_waiting() {
        let mut arena = open_arena(auto_start(2, 4));
        let outcome = arena.join(pid(1)).unwrap();
        assert!(!outcome.started);
        assert_eq!(arena.state(), ArenaState::Waiting);
    }

    #[test]
    fn test_join_reaching_threshold_auto_starts() {
        let mut arena = open_arena(auto_start(2, 4));
        arena.join(pid(1)).unwrap();
        let outcome = arena.join(pid(2)).unwrap();
        assert!(outcome.started);
        assert_eq!(arena.state(), ArenaState::Running);
    }

    #[test]
    fn test_join_without_auto_start_never_starts() {
        let mut arena = open_arena(ArenaConfigOverrides::default().with_max_players_per_arena(3));
        for i in 1..=3 {
            assert!(!arena.join(pid(i)).unwrap().started);
        }
        assert_eq!(arena.state(), ArenaState::Waiting);
    }

    #[test]
    fn test_join_full_returns_error_without_side_effect() {
        let overrides = ArenaConfigOverrides::default()
            .with_min_players_to_start(1)
            .with_max_players_per_arena(2);
        let mut arena = open_arena(overrides);
        arena.join(pid(1)).unwrap();
        arena.join(pid(2)).unwrap();

        let result = arena.join(pid(3));

        assert!(matches!(result, Err(ArenaError::ArenaFull(_))));
        assert_eq!(arena.member_count(), 2);
        assert!(!arena.contains(pid(3)));
    }

    #[test]
    fn test_join_twice_returns_already_member() {
        let mut arena = open_arena(ArenaConfigOverrides::default());
        arena.join(pid(1)).unwrap();
        assert!(matches!(arena.join(pid(1)), Err(ArenaError::AlreadyMember(..))));
        assert_eq!(arena.member_count(), 1);
    }

    #[test]
    fn test_join_running_returns_invalid_state() {
        let mut arena = open_arena(auto_start(1, 4));
        arena.join(pid(1)).unwrap();
        let result = arena.join(pid(2));
        assert!(matches!(
            result,
            Err(ArenaError::InvalidState { state: ArenaState::Running, .. })
        ));
    }

    #[test]
    fn test_spawns_rotate_in_join_order() {
        let mut arena = open_arena(ArenaConfigOverrides::default());
        let first = arena.join(pid(1)).unwrap().spawn;
        let second = arena.join(pid(2)).unwrap().spawn;
        let third = arena.join(pid(3)).unwrap().spawn;

        assert_eq!(first, Location::new(200.0, 64.0, -100.0));
        assert_eq!(second, Location::new(210.0, 64.0, -100.0));
        assert_eq!(third, first);
        assert_eq!(arena.spawn_for(pid(2)), Some(second));
        assert_eq!(arena.spawn_for(pid(9)), None);
    }

    #[test]
    fn test_leave_in_waiting_and_running() {
        let mut arena = open_arena(auto_start(2, 4));
        arena.join(pid(1)).unwrap();
        arena.leave(pid(1)).unwrap();
        assert_eq!(arena.member_count(), 0);

        arena.join(pid(1)).unwrap();
        arena.join(pid(2)).unwrap();
        assert_eq!(arena.state(), ArenaState::Running);

        arena.leave(pid(1)).unwrap();
        arena.leave(pid(2)).unwrap();
        // Last player out does not end the arena.
        assert_eq!(arena.state(), ArenaState::Running);
    }

    #[test]
    fn test_leave_non_member_returns_error() {
        let mut arena = open_arena(ArenaConfigOverrides::default());
        assert!(matches!(arena.leave(pid(1)), Err(ArenaError::NotMember(..))));
    }

    #[test]
    fn test_start_requires_waiting_and_min_players() {
        let mut arena = open_arena(ArenaConfigOverrides::default());
        arena.join(pid(1)).unwrap();
        assert!(matches!(arena.start(), Err(ArenaError::InvalidState { .. })));
        assert_eq!(arena.state(), ArenaState::Waiting);

        arena.join(pid(2)).unwrap();
        arena.start().unwrap();
        assert_eq!(arena.state(), ArenaState::Running);

        assert!(matches!(arena.start(), Err(ArenaError::InvalidState { .. })));
    }

    #[test]
    fn test_end_from_waiting_clears_members() {
        let mut arena = open_arena(ArenaConfigOverrides::default());
        arena.join(pid(1)).unwrap();
        arena.join(pid(2)).unwrap();

        let departed = arena.end().unwrap();

        assert_eq!(departed, vec![pid(1), pid(2)]);
        assert_eq!(arena.state(), ArenaState::Ended);
        assert_eq!(arena.member_count(), 0);
    }

    #[test]
    fn test_operations_after_end_return_arena_ended() {
        let mut arena = open_arena(ArenaConfigOverrides::default());
        arena.end().unwrap();

        assert!(matches!(arena.end(), Err(ArenaError::ArenaEnded(_))));
        assert!(matches!(arena.join(pid(1)), Err(ArenaError::ArenaEnded(_))));
        assert!(matches!(arena.leave(pid(1)), Err(ArenaError::ArenaEnded(_))));
        assert!(matches!(arena.start(), Err(ArenaError::ArenaEnded(_))));
        assert!(matches!(arena.open(), Err(ArenaError::ArenaEnded(_))));
        assert_eq!(arena.state(), ArenaState::Ended);
    }

    #[test]
    fn test_abort_end_restores_previous_state() {
        let mut arena = open_arena(auto_start(1, 4));
        arena.join(pid(1)).unwrap();

        let previous = arena.begin_end().unwrap();
        assert_eq!(previous, ArenaState::Running);
        assert!(arena.begin_end().is_err());

        arena.abort_end(previous);

        assert_eq!(arena.state(), ArenaState::Running);
        assert!(arena.contains(pid(1)));
    }

    #[test]
    fn test_extension_hooks_fire_in_order() {
        let mut arena = open_arena(auto_start(2, 4))
            .with_extension(Box::new(Recorder::default()));

        arena.join(pid(1)).unwrap();
        arena.join(pid(2)).unwrap();
        arena.leave(pid(1)).unwrap();
        arena.end().unwrap();

        let recorder = arena.extension::<Recorder>().unwrap();
        assert_eq!(
            recorder.calls,
            vec!["join P-1 (1)", "join P-2 (2)", "start Running", "leave P-1", "end 1"]
        );
    }

    #[test]
    fn test_extension_downcast_wrong_type_is_none() {
        struct Other;
        impl ArenaExtension for Other {
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        let mut arena = open_arena(ArenaConfigOverrides::default())
            .with_extension(Box::new(Other));
        assert!(arena.extension::<Recorder>().is_none());
        assert!(arena.extension_mut::<Other>().is_some());
    }

    #[test]
    fn test_info_snapshot() {
        let mut arena = open_arena(ArenaConfigOverrides::default().with_max_players_per_arena(6));
        arena.join(pid(1)).unwrap();

        let info = arena.info();

        assert_eq!(info.arena_id, ArenaId(1));
        assert_eq!(info.world_id, WorldId(1));
        assert_eq!(info.schematic, "arena_a");
        assert_eq!(info.player_count, 1);
        assert_eq!(info.max_players, 6);
        assert_eq!(info.state, ArenaState::Waiting);
    }
}
