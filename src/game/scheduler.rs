use crate::config::{Settings, SPAWN_EPSILON_MS};
use crate::game::lane::{self, Lane};
use crate::game::note::NoteType;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleMode {
    Procedural,
    Scripted,
}

/// One record of the score-parser boundary format. Times are score-relative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScriptedNote {
    pub pitch: u8,
    pub start_ms: f64,
    #[serde(default)]
    pub duration_ms: f64,
    pub note_type: NoteType,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScoreInfo {
    pub title: String,
    pub tempo_bpm: f64,
    pub duration_ms: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScriptedScore {
    #[serde(default)]
    pub info: ScoreInfo,
    pub notes: Vec<ScriptedNote>,
}

/// Reads a parsed score from disk. The note list is re-sorted on load so the
/// scheduler can rely on time order.
pub fn load_score_file(path: &Path) -> Result<ScriptedScore, Box<dyn Error>> {
    let raw = fs::read_to_string(path)?;
    let mut score: ScriptedScore = serde_json::from_str(&raw)?;
    sort_by_start(&mut score.notes);
    Ok(score)
}

fn sort_by_start(notes: &mut [ScriptedNote]) {
    notes.sort_by(|a, b| {
        a.start_ms
            .partial_cmp(&b.start_ms)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// A note the game loop should add to its active collection.
#[derive(Clone, Debug)]
pub struct SpawnRequest {
    pub pitch: u8,
    pub lane: usize,
    pub note_type: NoteType,
    pub spawn_ms: f64,
    pub target_ms: f64,
    pub duration_ms: f64,
}

/// Produces the session's note stream, either procedurally or by activating
/// pre-parsed score records when their spawn deadline comes up. Holds no
/// cross-frame state beyond its spawn bookkeeping.
pub struct Scheduler {
    mode: ScheduleMode,
    rng: StdRng,
    // Procedural: deadline for the next spawn, drawn after each emission.
    next_spawn_deadline_ms: Option<f64>,
    // Scripted: time-ordered records, plus exactly-once bookkeeping.
    scripted: Vec<ScriptedNote>,
    spawned: HashSet<usize>,
    cursor: usize,
}

impl Scheduler {
    pub fn new(mode: ScheduleMode) -> Self {
        Self::from_rng(mode, StdRng::from_os_rng())
    }

    /// Deterministic scheduler for tests and replays.
    pub fn with_seed(mode: ScheduleMode, seed: u64) -> Self {
        Self::from_rng(mode, StdRng::seed_from_u64(seed))
    }

    fn from_rng(mode: ScheduleMode, rng: StdRng) -> Self {
        Self {
            mode,
            rng,
            next_spawn_deadline_ms: None,
            scripted: Vec::new(),
            spawned: HashSet::new(),
            cursor: 0,
        }
    }

    #[inline(always)]
    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ScheduleMode) {
        self.mode = mode;
        self.reset();
    }

    /// Replaces the scripted note list. Records are re-sorted; bookkeeping is
    /// cleared so the new list plays from the top.
    pub fn load_notes(&mut self, mut notes: Vec<ScriptedNote>) {
        sort_by_start(&mut notes);
        debug!("Scheduler loaded {} scripted notes.", notes.len());
        self.scripted = notes;
        self.reset();
    }

    /// Clears spawn bookkeeping; the loaded note list survives.
    pub fn reset(&mut self) {
        self.next_spawn_deadline_ms = None;
        self.spawned.clear();
        self.cursor = 0;
    }

    /// Polled once per simulation tick. Appends the notes that should spawn
    /// at `now_ms` to `out`.
    pub fn poll(
        &mut self,
        now_ms: f64,
        lanes: &[Lane],
        settings: &Settings,
        out: &mut Vec<SpawnRequest>,
    ) {
        match self.mode {
            ScheduleMode::Procedural => self.poll_procedural(now_ms, lanes, settings, out),
            ScheduleMode::Scripted => self.poll_scripted(now_ms, lanes, settings, out),
        }
    }

    fn poll_procedural(
        &mut self,
        now_ms: f64,
        lanes: &[Lane],
        settings: &Settings,
        out: &mut Vec<SpawnRequest>,
    ) {
        if lanes.is_empty() {
            return;
        }

        if self.next_spawn_deadline_ms.is_none() {
            self.next_spawn_deadline_ms = Some(now_ms + self.draw_spawn_interval(settings));
        }
        let Some(deadline) = self.next_spawn_deadline_ms else {
            return;
        };
        if now_ms < deadline {
            return;
        }

        let lane = &lanes[self.rng.random_range(0..lanes.len())];
        let is_hold = self.rng.random_bool(settings.hold_note_chance);
        let duration_ms = if is_hold {
            self.rng
                .random_range(settings.hold_duration_min_ms..=settings.hold_duration_max_ms)
        } else {
            0.0
        };

        out.push(SpawnRequest {
            pitch: lane.pitch,
            lane: lane.lane_index,
            note_type: if is_hold { NoteType::Hold } else { NoteType::Tap },
            spawn_ms: now_ms,
            target_ms: now_ms + settings.fall_duration_ms,
            duration_ms,
        });

        // Exactly one note per tick; the next deadline starts from now.
        self.next_spawn_deadline_ms = Some(now_ms + self.draw_spawn_interval(settings));
    }

    fn draw_spawn_interval(&mut self, settings: &Settings) -> f64 {
        self.rng
            .random_range(settings.spawn_interval_min_ms..=settings.spawn_interval_max_ms)
    }

    fn poll_scripted(
        &mut self,
        now_ms: f64,
        lanes: &[Lane],
        settings: &Settings,
        out: &mut Vec<SpawnRequest>,
    ) {
        while self.cursor < self.scripted.len() {
            let index = self.cursor;
            let record = &self.scripted[index];
            let target_ms = settings.preroll_delay_ms + record.start_ms;
            let spawn_ms = target_ms - settings.fall_duration_ms;

            // A small tolerance absorbs frame jitter around the deadline.
            if now_ms + SPAWN_EPSILON_MS < spawn_ms {
                break;
            }
            self.cursor += 1;

            // Each record spawns at most once, even if its deadline window is
            // re-entered under clock jitter.
            if !self.spawned.insert(index) {
                continue;
            }

            match lane::lane_for_pitch(lanes, record.pitch) {
                Some(lane_index) => out.push(SpawnRequest {
                    pitch: record.pitch,
                    lane: lane_index,
                    note_type: record.note_type,
                    spawn_ms,
                    target_ms,
                    duration_ms: record.duration_ms,
                }),
                None => warn!(
                    "Dropping scripted note at {:.0}ms: pitch {} is outside the lane range.",
                    record.start_ms, record.pitch
                ),
            }
        }
    }
}
