use crate::model::{RepeatMode, Track};
use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

/// What the control loop should do after the engine reports end-of-media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    /// Seek the current track back to zero and keep playing.
    Restart,
    /// Load and play the catalog index that was just made current.
    Advance(usize),
    /// Remain stopped at the end of the ordering.
    Stop,
}

/// Session state: the append-only track catalog, the current index, the
/// shuffle permutation, and the repeat mode. All mutation happens on the
/// control thread.
#[derive(Debug)]
pub struct PlayerSession {
    tracks: Vec<Track>,
    current: Option<usize>,
    shuffle_enabled: bool,
    shuffle_order: Vec<usize>,
    shuffle_rng: SmallRng,
    repeat_mode: RepeatMode,
    pub selected_track: usize,
    pub status: String,
    pub dirty: bool,
}

impl PlayerSession {
    pub fn new(repeat_mode: RepeatMode) -> Self {
        Self {
            tracks: Vec::new(),
            current: None,
            shuffle_enabled: false,
            shuffle_order: Vec::new(),
            shuffle_rng: SmallRng::from_os_rng(),
            repeat_mode,
            selected_track: 0,
            status: String::from("Ready"),
            dirty: true,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, index: usize) -> Result<&Track> {
        self.tracks
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("track index {index} out of range 0..{}", self.tracks.len()))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|idx| self.tracks.get(idx))
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    pub fn shuffle_order(&self) -> &[usize] {
        &self.shuffle_order
    }

    /// Appends a track and returns its index. The first track of a session
    /// becomes current; the caller is expected to load it into the engine.
    pub fn append_track(&mut self, track: Track) -> usize {
        let index = self.tracks.len();
        self.set_status(&format!("Added {}", track.display_name));
        self.tracks.push(track);

        if self.current.is_none() {
            self.current = Some(index);
        }
        // Keep the permutation a bijection over the live catalog.
        if self.shuffle_enabled {
            self.rebuild_shuffle_order();
        }
        index
    }

    pub fn set_current(&mut self, index: usize) -> Result<()> {
        if index >= self.tracks.len() {
            anyhow::bail!("track index {index} out of range 0..{}", self.tracks.len());
        }
        self.current = Some(index);
        self.dirty = true;
        Ok(())
    }

    /// Manual-next target. Always wraps; `None` only when the catalog is
    /// empty.
    pub fn next_index(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }

        if self.shuffle_enabled && !self.shuffle_order.is_empty() {
            let followup = self
                .current
                .and_then(|current| self.shuffle_position(current))
                .and_then(|pos| self.shuffle_order.get(pos + 1).copied());
            return followup.or_else(|| self.shuffle_order.first().copied());
        }

        match self.current {
            Some(current) => Some((current + 1) % self.tracks.len()),
            None => Some(0),
        }
    }

    /// Manual-previous target, symmetric to `next_index`.
    pub fn previous_index(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }

        if self.shuffle_enabled && !self.shuffle_order.is_empty() {
            let preceding = self
                .current
                .and_then(|current| self.shuffle_position(current))
                .filter(|pos| *pos > 0)
                .and_then(|pos| self.shuffle_order.get(pos - 1).copied());
            return preceding.or_else(|| self.shuffle_order.last().copied());
        }

        match self.current {
            Some(0) | None => Some(self.tracks.len() - 1),
            Some(current) => Some(current - 1),
        }
    }

    pub fn advance_next(&mut self) -> Option<usize> {
        let index = self.next_index();
        if index.is_none() {
            self.set_status("No tracks loaded");
            return None;
        }
        self.current = index;
        self.dirty = true;
        index
    }

    pub fn advance_previous(&mut self) -> Option<usize> {
        let index = self.previous_index();
        if index.is_none() {
            self.set_status("No tracks loaded");
            return None;
        }
        self.current = index;
        self.dirty = true;
        index
    }

    pub fn toggle_shuffle(&mut self) {
        self.shuffle_enabled = !self.shuffle_enabled;
        if self.shuffle_enabled {
            self.rebuild_shuffle_order();
            self.set_status("Shuffle ON");
        } else {
            self.shuffle_order.clear();
            self.set_status("Shuffle OFF");
        }
    }

    pub fn toggle_repeat(&mut self) {
        self.repeat_mode = self.repeat_mode.next();
        self.set_status(&format!("Repeat {}", self.repeat_mode.label()));
    }

    /// End-of-media transition. Off suppresses the wrap that manual
    /// navigation performs; that asymmetry is deliberate.
    pub fn track_ended(&mut self) -> TrackEnd {
        match self.repeat_mode {
            RepeatMode::One => {
                if self.current.is_some() {
                    TrackEnd::Restart
                } else {
                    TrackEnd::Stop
                }
            }
            RepeatMode::All => match self.advance_next() {
                Some(index) => TrackEnd::Advance(index),
                None => TrackEnd::Stop,
            },
            RepeatMode::Off => {
                let Some(current) = self.current else {
                    return TrackEnd::Stop;
                };

                let forward = if self.shuffle_enabled {
                    self.shuffle_position(current)
                        .and_then(|pos| self.shuffle_order.get(pos + 1).copied())
                } else if current + 1 < self.tracks.len() {
                    Some(current + 1)
                } else {
                    None
                };

                match forward {
                    Some(index) => {
                        self.current = Some(index);
                        self.dirty = true;
                        TrackEnd::Advance(index)
                    }
                    None => {
                        self.set_status("Reached end of queue");
                        TrackEnd::Stop
                    }
                }
            }
        }
    }

    pub fn select_next(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.selected_track = (self.selected_track + 1).min(self.tracks.len() - 1);
        self.dirty = true;
    }

    pub fn select_previous(&mut self) {
        self.selected_track = self.selected_track.saturating_sub(1);
        self.dirty = true;
    }

    pub fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }

    fn shuffle_position(&self, index: usize) -> Option<usize> {
        self.shuffle_order.iter().position(|entry| *entry == index)
    }

    fn rebuild_shuffle_order(&mut self) {
        self.shuffle_order = (0..self.tracks.len()).collect();
        self.shuffle_order.shuffle(&mut self.shuffle_rng);
    }
}
