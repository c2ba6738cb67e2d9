#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ghost recording and playback driven by world events.
//!
//! The recorder samples the ship's settled pose once per tick, timestamped by
//! the simulation time accumulated from [`Event::TimeAdvanced`]. Playback walks
//! a recorded trace with a forward-only cursor and emits
//! [`Command::PoseGhost`] for the world's ghost entity.

use std::time::Duration;

use gravitation_core::{Command, Event, GhostFrame};

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Samples the ship's pose once per tick while active.
#[derive(Debug, Default)]
pub struct GhostRecorder {
    frames: Vec<GhostFrame>,
    elapsed: Duration,
    recording: bool,
}

impl GhostRecorder {
    /// Discards any previous trace and begins recording from time zero.
    pub fn start(&mut self) {
        self.clear();
        self.recording = true;
    }

    /// Stops appending frames, keeping the trace recorded so far.
    pub fn stop(&mut self) {
        self.recording = false;
    }

    /// Discards the trace and resets the recording clock.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.elapsed = Duration::ZERO;
    }

    /// Reports whether frames are currently being appended.
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.recording
    }

    /// Consumes world events, appending a frame for every settled pose.
    ///
    /// Recording stops automatically once the level is completed.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            if !self.recording {
                return;
            }

            match event {
                Event::TimeAdvanced { dt } => self.elapsed = self.elapsed.saturating_add(*dt),
                Event::ShipSettled { pose } => {
                    self.frames
                        .push(GhostFrame::from_pose(millis(self.elapsed), *pose));
                }
                Event::LevelCompleted { .. } => self.recording = false,
                _ => {}
            }
        }
    }

    /// Frames recorded so far, ordered by timestamp.
    #[must_use]
    pub fn frames(&self) -> &[GhostFrame] {
        &self.frames
    }

    /// Copies the trace out for persistence.
    #[must_use]
    pub fn export(&self) -> Vec<GhostFrame> {
        self.frames.clone()
    }
}

/// Replays a recorded trace against the simulation clock.
#[derive(Debug, Default)]
pub struct GhostPlayback {
    frames: Vec<GhostFrame>,
    cursor: usize,
    elapsed: Duration,
    playing: bool,
}

impl GhostPlayback {
    /// Replaces the trace and stops playback.
    pub fn load(&mut self, frames: Vec<GhostFrame>) {
        self.frames = frames;
        self.cursor = 0;
        self.elapsed = Duration::ZERO;
        self.playing = false;
    }

    /// Rewinds the cursor and the playback clock and begins playing.
    pub fn start(&mut self) {
        self.cursor = 0;
        self.elapsed = Duration::ZERO;
        self.playing = true;
    }

    /// Stops playback.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Reports whether playback is running.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Number of frames the cursor has moved past.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the latest frame whose timestamp is not after `elapsed`.
    ///
    /// The cursor only moves forward, so asking for an earlier time than a
    /// previous call keeps returning the frame already reached.
    pub fn frame_at(&mut self, elapsed: Duration) -> Option<GhostFrame> {
        let now = millis(elapsed);
        while self
            .frames
            .get(self.cursor)
            .is_some_and(|frame| frame.timestamp <= now)
        {
            self.cursor += 1;
        }

        self.cursor
            .checked_sub(1)
            .and_then(|index| self.frames.get(index).copied())
    }

    /// Advances the playback clock from world events and stages the ghost pose.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        if !self.playing {
            return;
        }

        let mut advanced = false;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.elapsed = self.elapsed.saturating_add(*dt);
                advanced = true;
            }
        }

        if advanced {
            let pose = self.frame_at(self.elapsed).map(|frame| frame.pose());
            out.push(Command::PoseGhost { pose });
        }
    }
}
