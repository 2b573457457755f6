use crate::config::{
    self, Settings, FEEDBACK_LIFETIME_MS, KEY_EVENT_RETENTION_MS, MIN_FALL_DURATION_MS,
    RETIRE_MARGIN_MS,
};
use crate::core::input::{drain_edges, KeyEvent, KeyEventKind, KeyboardSnapshot, PITCH_COUNT};
use crate::game::judgment::{self, HoldStartQuality, JudgeGrade, Judgment, TimingWindows};
use crate::game::lane::{self, Lane};
use crate::game::note::{Note, NoteType};
use crate::game::scheduler::{ScheduleMode, Scheduler, ScriptedNote};
use crate::game::score::ScoreState;
use log::{debug, info, warn};
use std::collections::VecDeque;

/// Transient display event for a landed judgement, kept alive for a short
/// flourish window.
#[derive(Clone, Debug)]
pub struct HitFeedback {
    pub grade: JudgeGrade,
    pub lane: usize,
    pub at_ms: f64,
}

/// An in-progress hold: one per lane at most, created by a qualifying press
/// and destroyed by release or forced retirement.
#[derive(Clone, Copy, Debug)]
pub struct ActiveHoldClaim {
    pub note_id: u64,
    pub lane: usize,
    pub claim_start_ms: f64,
    pub expected_duration_ms: f64,
    pub start_quality: HoldStartQuality,
}

/// Render-facing view of one active note, computed per tick.
#[derive(Clone, Debug)]
pub struct NoteView {
    pub id: u64,
    pub lane: usize,
    pub pitch: u8,
    pub note_type: NoteType,
    pub progress: f32,
    pub hold_progress: Option<f32>,
    pub is_actively_held: bool,
}

/// All session state, owned exclusively by the game loop. The other engine
/// components are pure functions over snapshots of this plus their own small
/// working sets.
pub struct State {
    pub lanes: Vec<Lane>,
    pub windows: TimingWindows,
    pub settings: Settings,
    pub running: bool,
    pub score: ScoreState,
    pub notes: Vec<Note>,
    pub feedback: Vec<HitFeedback>,
    pub scheduler: Scheduler,
    // One claim slot per lane.
    claims: Vec<Option<ActiveHoldClaim>>,
    key_events: VecDeque<KeyEvent>,
    prev_down: [bool; PITCH_COUNT],
    next_note_id: u64,
}

pub fn init(mode: ScheduleMode) -> State {
    init_with_settings(config::get(), mode)
}

pub fn init_with_settings(settings: Settings, mode: ScheduleMode) -> State {
    let lanes = lane::build_lanes(settings.start_octave, settings.end_octave);
    if lanes.is_empty() {
        warn!(
            "Octave range {}..={} yields no playable lanes.",
            settings.start_octave, settings.end_octave
        );
    } else {
        info!(
            "Initialized {} lanes covering octaves {}..={}.",
            lanes.len(),
            settings.start_octave,
            settings.end_octave
        );
    }

    let lane_count = lanes.len();
    State {
        lanes,
        windows: TimingWindows::default(),
        settings,
        running: false,
        score: ScoreState::default(),
        notes: Vec::new(),
        feedback: Vec::new(),
        scheduler: Scheduler::new(mode),
        claims: vec![None; lane_count],
        key_events: VecDeque::new(),
        prev_down: [false; PITCH_COUNT],
        next_note_id: 0,
    }
}

// --- Commands ---

/// Reinitializes all owned state and begins judging. Idempotent.
pub fn start(state: &mut State) {
    reset(state);
    state.running = true;
    info!("Session started in {:?} mode.", state.scheduler.mode());
}

/// Stops judging and clears the transient collections. The final score stays
/// readable. Idempotent.
pub fn stop(state: &mut State) {
    if state.running {
        info!(
            "Session stopped. Score {} ({} perfect / {} good / {} miss, best streak {}).",
            state.score.total_score,
            state.score.perfect_count,
            state.score.good_count,
            state.score.miss_count,
            state.score.max_streak
        );
    }
    state.running = false;
    clear_transients(state);
}

/// Clears everything the loop owns: score, notes, claims, spawn bookkeeping
/// and the key-event buffer.
pub fn reset(state: &mut State) {
    clear_transients(state);
    state.score.reset();
    state.scheduler.reset();
    state.next_note_id = 0;
}

fn clear_transients(state: &mut State) {
    state.notes.clear();
    state.claims.fill(None);
    state.key_events.clear();
    state.feedback.clear();
    state.prev_down = [false; PITCH_COUNT];
}

/// Mid-session speed change. Notes already in flight keep their original
/// spawn and target times.
pub fn set_fall_duration(state: &mut State, fall_duration_ms: f64) {
    let clamped = fall_duration_ms.max(MIN_FALL_DURATION_MS);
    state.settings.fall_duration_ms = clamped;
    info!("Fall duration set to {:.0}ms.", clamped);
}

pub fn select_mode(state: &mut State, mode: ScheduleMode) {
    state.scheduler.set_mode(mode);
    info!("Schedule mode set to {:?}.", mode);
}

pub fn load_scripted_notes(state: &mut State, notes: Vec<ScriptedNote>) {
    state.scheduler.load_notes(notes);
}

// --- Per-tick update ---

/// One simulation tick. `snapshot` is the device layer's current held-key
/// set; `now_ms` comes from the session clock (or straight from a test).
pub fn update(state: &mut State, snapshot: &KeyboardSnapshot, now_ms: f64) {
    if !state.running {
        return;
    }

    spawn_pending_notes(state, now_ms);
    buffer_input_edges(state, snapshot, now_ms);
    process_events_of_kind(state, KeyEventKind::Press);
    process_events_of_kind(state, KeyEventKind::Release);
    sweep_missed_notes(state, now_ms);
    retire_offscreen_notes(state, now_ms);
    expire_transients(state, now_ms);
}

fn spawn_pending_notes(state: &mut State, now_ms: f64) {
    let mut requests = Vec::new();
    state
        .scheduler
        .poll(now_ms, &state.lanes, &state.settings, &mut requests);

    for req in requests {
        let id = state.next_note_id;
        state.next_note_id += 1;
        debug!(
            "Spawned note {} ({:?}) in lane {} targeting {:.0}ms.",
            id, req.note_type, req.lane, req.target_ms
        );
        state.notes.push(Note {
            id,
            pitch: req.pitch,
            lane: req.lane,
            note_type: req.note_type,
            spawn_ms: req.spawn_ms,
            target_ms: req.target_ms,
            duration_ms: req.duration_ms,
            result: None,
        });
    }
}

fn buffer_input_edges(state: &mut State, snapshot: &KeyboardSnapshot, now_ms: f64) {
    let mut edges = Vec::new();
    drain_edges(&mut state.prev_down, snapshot, now_ms, &mut edges);
    state.key_events.extend(edges);
}

/// Runs one kind of buffered edge against the note field, consuming matched
/// events and keeping the rest buffered for later ticks.
fn process_events_of_kind(state: &mut State, kind: KeyEventKind) {
    let mut pending = std::mem::take(&mut state.key_events);
    let mut kept = VecDeque::with_capacity(pending.len());

    while let Some(event) = pending.pop_front() {
        let consumed = if event.kind == kind {
            match kind {
                KeyEventKind::Press => try_match_press(state, &event),
                KeyEventKind::Release => try_match_release(state, &event),
            }
        } else {
            false
        };
        if !consumed {
            kept.push_back(event);
        }
    }

    state.key_events = kept;
}

/// Finds the best reachable pending note for a press: smallest absolute
/// timing error across in-window taps and claimable holds in the event's
/// lane. Timing error always comes from the event's own timestamp.
fn try_match_press(state: &mut State, event: &KeyEvent) -> bool {
    let Some(lane_index) = lane::lane_for_pitch(&state.lanes, event.pitch) else {
        // Unplayable pitch: this edge can never match anything.
        return true;
    };

    let mut best: Option<(usize, f64)> = None;
    for (idx, note) in state.notes.iter().enumerate() {
        if note.lane != lane_index || !note.is_pending() {
            continue;
        }
        let err = event.timestamp_ms - note.target_ms;
        let eligible = match note.note_type {
            NoteType::Tap => state.windows.judge_tap(err).is_some(),
            NoteType::Hold => {
                state.claims[lane_index].is_none()
                    && err.abs() <= state.windows.hold_entry_window_ms(note.duration_ms)
            }
        };
        if eligible && best.is_none_or(|(_, best_err)| err.abs() < best_err.abs()) {
            best = Some((idx, err));
        }
    }

    let Some((note_index, err)) = best else {
        return false;
    };

    match state.notes[note_index].note_type {
        NoteType::Tap => {
            if let Some(grade) = state.windows.judge_tap(err) {
                apply_judgment(state, note_index, grade, judgment::tap_base_points(grade), err, event.timestamp_ms);
            }
        }
        NoteType::Hold => open_hold_claim(state, note_index, event, err),
    }
    true
}

fn open_hold_claim(state: &mut State, note_index: usize, event: &KeyEvent, err: f64) {
    let note = &state.notes[note_index];
    let lane_index = note.lane;
    debug_assert!(
        state.claims[lane_index].is_none(),
        "second hold claim opened in lane {lane_index}"
    );

    let start_quality = state.windows.classify_hold_start(err);
    state.claims[lane_index] = Some(ActiveHoldClaim {
        note_id: note.id,
        lane: lane_index,
        claim_start_ms: event.timestamp_ms,
        expected_duration_ms: note.duration_ms.max(1.0),
        start_quality,
    });
    info!(
        "CLAIMED: hold {} in lane {} ({:?} start, {:+.1}ms).",
        note.id, lane_index, start_quality, err
    );
}

fn try_match_release(state: &mut State, event: &KeyEvent) -> bool {
    let Some(lane_index) = lane::lane_for_pitch(&state.lanes, event.pitch) else {
        return true;
    };
    let Some(claim) = state.claims[lane_index] else {
        // No claim to close; the edge expires with the buffer.
        return false;
    };
    // A release older than the claim belongs to an earlier press in this
    // lane and cannot close it.
    if event.timestamp_ms < claim.claim_start_ms {
        return true;
    }

    state.claims[lane_index] = None;
    resolve_hold_claim(state, claim, event.timestamp_ms);
    true
}

/// Closes a hold claim at `at_ms`, whether from a real release or a forced
/// retirement, and judges it from the sustained fraction.
fn resolve_hold_claim(state: &mut State, claim: ActiveHoldClaim, at_ms: f64) {
    let Some(note_index) = state.notes.iter().position(|n| n.id == claim.note_id) else {
        return;
    };
    if !state.notes[note_index].is_pending() {
        return;
    }

    let completion =
        ((at_ms - claim.claim_start_ms) / claim.expected_duration_ms).clamp(0.0, 1.0);
    let (grade, base_points) = judgment::judge_hold_release(completion, claim.start_quality);
    let err = at_ms - (claim.claim_start_ms + claim.expected_duration_ms);
    debug!(
        "Hold {} resolved with completion {:.2} ({:?} start).",
        claim.note_id, completion, claim.start_quality
    );
    apply_judgment(state, note_index, grade, base_points, err, at_ms);
}

/// The single place a note leaves the pending state. Writes the terminal
/// result, updates the score and emits feedback.
fn apply_judgment(
    state: &mut State,
    note_index: usize,
    grade: JudgeGrade,
    base_points: u64,
    time_error_ms: f64,
    at_ms: f64,
) {
    debug_assert!(state.notes[note_index].is_pending(), "note judged twice");

    let points = state.score.apply(grade, base_points);
    let lane_index = state.notes[note_index].lane;
    state.notes[note_index].result = Some(Judgment {
        grade,
        time_error_ms,
        points,
    });
    state.feedback.push(HitFeedback {
        grade,
        lane: lane_index,
        at_ms,
    });
    info!(
        "JUDGED: note {}, lane {}, error {:+.1}ms, {:?} (+{} pts, combo {}).",
        state.notes[note_index].id, lane_index, time_error_ms, grade, points, state.score.combo
    );
}

/// Transitions notes that slid past their last reachable window to Missed.
/// Holds under an active claim are exempt; they resolve on release or
/// retirement.
fn sweep_missed_notes(state: &mut State, now_ms: f64) {
    let mut missed = Vec::new();
    for (idx, note) in state.notes.iter().enumerate() {
        if !note.is_pending() {
            continue;
        }
        let err = now_ms - note.target_ms;
        let is_missed = match note.note_type {
            NoteType::Tap => state.windows.is_tap_missed(err),
            NoteType::Hold => {
                claim_for_note(state, note.id).is_none()
                    && state.windows.is_hold_missed(err, note.duration_ms)
            }
        };
        if is_missed {
            missed.push(idx);
        }
    }

    for note_index in missed {
        let err = now_ms - state.notes[note_index].target_ms;
        apply_judgment(state, note_index, JudgeGrade::Miss, 0, err, now_ms);
    }
}

/// Removes notes that have scrolled past the judged region plus the retention
/// margin. A hold still claimed at that point is resolved as if released at
/// retirement time, so no claim is ever silently dropped.
fn retire_offscreen_notes(state: &mut State, now_ms: f64) {
    let mut forced = Vec::new();
    for note in &state.notes {
        if now_ms <= retire_at(note) {
            continue;
        }
        if let Some(claim) = state.claims[note.lane] {
            if claim.note_id == note.id {
                forced.push(claim);
            }
        }
    }
    for claim in forced {
        state.claims[claim.lane] = None;
        resolve_hold_claim(state, claim, now_ms);
    }

    let before = state.notes.len();
    state.notes.retain(|note| now_ms <= retire_at(note));
    let retired = before - state.notes.len();
    if retired > 0 {
        debug!("Retired {} note(s).", retired);
    }
}

#[inline(always)]
fn retire_at(note: &Note) -> f64 {
    note.target_ms + note.duration_ms + RETIRE_MARGIN_MS
}

fn expire_transients(state: &mut State, now_ms: f64) {
    state
        .key_events
        .retain(|event| now_ms - event.timestamp_ms <= KEY_EVENT_RETENTION_MS);
    state
        .feedback
        .retain(|feedback| now_ms - feedback.at_ms <= FEEDBACK_LIFETIME_MS);
}

// --- Render exposure ---

pub fn claim_for_note(state: &State, note_id: u64) -> Option<&ActiveHoldClaim> {
    state
        .claims
        .iter()
        .flatten()
        .find(|claim| claim.note_id == note_id)
}

pub fn claim_in_lane(state: &State, lane_index: usize) -> Option<&ActiveHoldClaim> {
    state.claims.get(lane_index).and_then(|slot| slot.as_ref())
}

/// Per-tick view of the active note field for the renderer: positions plus
/// hold progress for claimed notes.
pub fn note_views(state: &State, now_ms: f64) -> Vec<NoteView> {
    state
        .notes
        .iter()
        .map(|note| {
            let claim = claim_for_note(state, note.id);
            NoteView {
                id: note.id,
                lane: note.lane,
                pitch: note.pitch,
                note_type: note.note_type,
                progress: note.progress(now_ms),
                hold_progress: claim.map(|c| {
                    (((now_ms - c.claim_start_ms) / c.expected_duration_ms) as f32).clamp(0.0, 1.0)
                }),
                is_actively_held: claim.is_some(),
            }
        })
        .collect()
}
