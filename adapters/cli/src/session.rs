//! Drives one level attempt: world, ghost recording and playback, race timer.

use std::time::Duration;

use gravitation_core::{Command, Event, FrameInput, GhostFrame, Pose};
use gravitation_system_ghost::{GhostPlayback, GhostRecorder};
use gravitation_system_race_timer::RaceTimer;
use gravitation_world::{self as world, query, LevelSetup, World};
use tracing::info;

/// Result of feeding one tick of input to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// No level is loaded.
    InMenu,
    /// The player abandoned the level.
    ReturnedToMenu,
    /// The ship is still flying.
    Flying,
    /// The ship reached the goal in the given time.
    Completed {
        /// Race time of the finished attempt.
        time: Duration,
    },
}

/// State of the game between the menu and a finished level.
#[derive(Debug)]
pub(crate) struct Session {
    level_name: String,
    setup: LevelSetup,
    best_ghost: Option<Vec<GhostFrame>>,
    world: Option<World>,
    recorder: GhostRecorder,
    playback: GhostPlayback,
    timer: RaceTimer,
    clock: Duration,
}

impl Session {
    /// Creates a session sitting in the menu for the given level.
    pub(crate) fn new(level_name: impl Into<String>, setup: LevelSetup) -> Self {
        Self {
            level_name: level_name.into(),
            setup,
            best_ghost: None,
            world: None,
            recorder: GhostRecorder::default(),
            playback: GhostPlayback::default(),
            timer: RaceTimer::default(),
            clock: Duration::ZERO,
        }
    }

    /// Starts a fresh attempt, racing `best_ghost` when one exists.
    pub(crate) fn enter_level(&mut self, best_ghost: Option<Vec<GhostFrame>>) {
        self.best_ghost = best_ghost.filter(|frames| !frames.is_empty());
        self.world = Some(World::new(self.setup.clone()));
        info!(level = %self.level_name, ghost = self.best_ghost.is_some(), "entered level");
        self.restart_attempt();
    }

    /// Resets the ship in place and restarts recording, playback and timer.
    pub(crate) fn retry(&mut self) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        let mut events = Vec::new();
        world::apply(world, Command::ResetShip, &mut events);
        world::apply(world, Command::PoseGhost { pose: None }, &mut events);
        info!(level = %self.level_name, "attempt restarted");
        self.restart_attempt();
    }

    /// Discards the level and the in-flight attempt.
    pub(crate) fn back_to_menu(&mut self) {
        self.world = None;
        self.recorder.stop();
        self.recorder.clear();
        self.playback.stop();
        self.timer.stop();
        info!(level = %self.level_name, "returned to menu");
    }

    fn restart_attempt(&mut self) {
        self.recorder.start();
        match &self.best_ghost {
            Some(frames) => {
                self.playback.load(frames.clone());
                self.playback.start();
            }
            None => self.playback.stop(),
        }
        self.timer.start(self.clock);
    }

    /// Advances the attempt by `dt` with the given input.
    pub(crate) fn step(&mut self, dt: Duration, input: FrameInput) -> StepOutcome {
        if self.world.is_none() {
            return StepOutcome::InMenu;
        }
        if input.back_to_menu {
            self.back_to_menu();
            return StepOutcome::ReturnedToMenu;
        }
        if input.reset {
            self.retry();
        }

        let Some(world) = self.world.as_mut() else {
            return StepOutcome::InMenu;
        };
        if query::level_completed(world) {
            return StepOutcome::Completed {
                time: self.timer.elapsed(),
            };
        }

        let mut events = Vec::new();
        world::apply(
            world,
            Command::SetControls {
                controls: input.controls(),
            },
            &mut events,
        );
        world::apply(world, Command::Tick { dt }, &mut events);
        self.clock = self.clock.saturating_add(dt);

        self.recorder.handle(&events);
        let mut commands = Vec::new();
        self.playback.handle(&events, &mut commands);
        for command in commands {
            world::apply(world, command, &mut events);
        }

        self.timer.update(self.clock);
        if events
            .iter()
            .any(|event| matches!(event, Event::LevelCompleted { .. }))
        {
            self.timer.stop();
            info!(level = %self.level_name, time = %self.timer.formatted(), "level completed");
            return StepOutcome::Completed {
                time: self.timer.elapsed(),
            };
        }

        StepOutcome::Flying
    }

    /// Name of the level being played.
    pub(crate) fn level_name(&self) -> &str {
        &self.level_name
    }

    /// Pose of the ship, if a level is loaded.
    pub(crate) fn ship_pose(&self) -> Option<Pose> {
        self.world.as_ref().map(query::ship_pose)
    }

    /// Frames recorded for the current attempt.
    pub(crate) fn recording(&self) -> &[GhostFrame] {
        self.recorder.frames()
    }

    /// Formatted race time of the current attempt.
    pub(crate) fn formatted_time(&self) -> String {
        self.timer.formatted()
    }
}
