use std::any::Any;

use arenaforge::prelude::*;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Arena extension
// ---------------------------------------------------------------------------

/// Per-arena bookkeeping a game mode might keep: who has played here and
/// how many were left standing at the end.
#[derive(Default)]
struct Roster {
    seen: Vec<PlayerId>,
    started: bool,
}

impl ArenaExtension for Roster {
    fn on_player_join(&mut self, _arena: &Arena, player: PlayerId) {
        if !self.seen.contains(&player) {
            self.seen.push(player);
        }
    }

    fn on_start(&mut self, arena: &Arena) {
        self.started = true;
        tracing::info!(arena_id = %arena.id(), players = arena.member_count(), "round begins");
    }

    fn on_end(&mut self, arena: &Arena, departed: &[PlayerId]) {
        tracing::info!(
            arena_id = %arena.id(),
            survivors = departed.len(),
            seen = self.seen.len(),
            "round over"
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

const SETTINGS: &str = r#"{
    "defaults": {
        "max_arenas_per_world": 2,
        "min_distance_between_arenas": 64.0,
        "auto_start_arenas": true,
        "min_players_to_start": 2,
        "max_players_per_arena": 4
    },
    "placement": { "world_name_prefix": "skirmish_" }
}"#;

/// What a run left behind.
#[derive(Debug, PartialEq)]
struct Summary {
    arenas_created: usize,
    worlds_used: usize,
    worlds_left: usize,
}

/// Plays a few rounds across several arenas and shuts everything down.
fn run<B: ContainerBackend, S: EventSink>(
    orchestrator: &Orchestrator<B, S>,
) -> Result<Summary, OrchestratorError> {
    orchestrator.register_schematic(
        "arena_a",
        vec![
            RelativeLocation::new(0.0, 64.0, 12.0).with_rotation(180.0, 0.0),
            RelativeLocation::new(0.0, 64.0, -12.0),
            RelativeLocation::new(12.0, 64.0, 0.0).with_rotation(90.0, 0.0),
            RelativeLocation::new(-12.0, 64.0, 0.0).with_rotation(270.0, 0.0),
        ],
    )?;
    orchestrator.register_schematic("duel", vec![RelativeLocation::new(0.0, 70.0, 8.0)])?;
    orchestrator.add_spawn_point("duel", RelativeLocation::new(0.0, 70.0, -8.0))?;

    let mut arenas = Vec::new();
    for schematic in ["arena_a", "arena_a", "duel"] {
        let id = orchestrator.create_arena_with(
            schematic,
            &ArenaConfigOverrides::default(),
            Box::new(Roster::default()),
        )?;
        arenas.push(id);
    }
    let worlds_used = orchestrator.world_count();

    // Fill each arena; the second join starts it.
    let mut next_player = 1;
    for &arena in &arenas {
        for _ in 0..2 {
            let player = PlayerId(next_player);
            next_player += 1;
            let outcome = orchestrator.join(arena, player)?;
            tracing::info!(%arena, %player, spawn = %outcome.spawn, started = outcome.started, "joined");
        }
    }

    // A player drops out mid-round; the arena keeps running.
    orchestrator.leave(arenas[0], PlayerId(1))?;

    for info in orchestrator.list_arenas() {
        tracing::info!(
            arena_id = %info.arena_id,
            world_id = %info.world_id,
            origin = %info.origin,
            state = %info.state,
            players = info.player_count,
            "arena status"
        );
    }

    // End the rounds in the first world; it empties and is torn down.
    orchestrator.end(arenas[0])?;
    orchestrator.end(arenas[1])?;

    orchestrator.shutdown()?;

    Ok(Summary {
        arenas_created: arenas.len(),
        worlds_used,
        worlds_left: orchestrator.world_count(),
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("arenaforge=info".parse()?)
                .add_directive("arenaforge_world=info".parse()?)
                .add_directive("skirmish=info".parse()?),
        )
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SETTINGS.to_string(),
    };
    let config = OrchestratorConfig::from_json_str(&settings)?;

    // Forward every notification, JSON-encoded, from a separate task.
    let (tx, mut rx) = mpsc::unbounded_channel::<LifecycleEvent>();
    let printer = tokio::spawn(async move {
        let codec = JsonCodec;
        while let Some(event) = rx.recv().await {
            match codec.encode(&event) {
                Ok(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
                Err(err) => tracing::warn!(error = %err, "failed to encode event"),
            }
        }
    });

    let orchestrator = Orchestrator::builder(MemoryBackend::new())
        .config(config)
        .sink(tx)
        .build()?;
    let summary = run(&orchestrator)?;
    drop(orchestrator);
    printer.await?;

    eprintln!(
        "{} arenas across {} worlds, {} left standing",
        summary.arenas_created, summary.worlds_used, summary.worlds_left
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_run_leaves_nothing_behind() {
        let log = Arc::new(EventLog::new());
        let config = OrchestratorConfig::from_json_str(SETTINGS).unwrap();
        let orchestrator = Orchestrator::builder(MemoryBackend::new())
            .config(config)
            .sink(Arc::clone(&log))
            .build()
            .unwrap();

        let summary = run(&orchestrator).unwrap();

        assert_eq!(
            summary,
            Summary {
                arenas_created: 3,
                worlds_used: 2,
                worlds_left: 0,
            }
        );
        assert!(orchestrator.backend().live_containers().is_empty());

        let events = log.events();
        let count = |pred: fn(&LifecycleEvent) -> bool| events.iter().filter(|e| pred(e)).count();
        assert_eq!(count(|e| matches!(e, LifecycleEvent::WorldCreated { .. })), 2);
        assert_eq!(count(|e| matches!(e, LifecycleEvent::ArenaStarted { .. })), 3);
        assert_eq!(count(|e| matches!(e, LifecycleEvent::ArenaEnded { .. })), 3);
        assert_eq!(count(|e| matches!(e, LifecycleEvent::WorldRemoved { .. })), 2);
    }
}
