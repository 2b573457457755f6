use keyfall::config::{self, SIM_STEP_MS};
use keyfall::core::clock::{FixedStep, GameClock};
use keyfall::core::input::KeyboardSnapshot;
use keyfall::game::gameplay::{self, State};
use keyfall::game::note::NoteType;
use keyfall::game::scheduler::{self, ScheduleMode};
use log::{info, LevelFilter};
use std::error::Error;
use std::path::Path;

const DEMO_DURATION_MS: f64 = 30_000.0;
const RENDER_FRAME_MS: f64 = 1000.0 / 60.0;

fn main() -> Result<(), Box<dyn Error>> {
    // --- Logging Setup ---
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .filter_module("keyfall::game::scheduler", LevelFilter::Debug)
        .init();

    config::load();
    info!("Engine demo starting...");

    let wall_clock = GameClock::new();

    // With a score file argument the demo plays it back; otherwise it runs
    // the procedural generator.
    let mut state = match std::env::args().nth(1) {
        Some(path) => {
            let score = scheduler::load_score_file(Path::new(&path))?;
            info!(
                "Loaded '{}' ({} notes, {:.0} bpm).",
                score.info.title,
                score.notes.len(),
                score.info.tempo_bpm
            );
            let mut state = gameplay::init(ScheduleMode::Scripted);
            gameplay::load_scripted_notes(&mut state, score.notes);
            state
        }
        None => gameplay::init(ScheduleMode::Procedural),
    };
    gameplay::start(&mut state);

    // Headless smoke run: a synthetic 60Hz render loop polling the 120Hz
    // simulation, with an auto-player that presses each note as it reaches
    // the hit line and releases holds near full completion.
    let mut stepper = FixedStep::new(SIM_STEP_MS);
    let mut snapshot = KeyboardSnapshot::new();
    let mut sim_ms = 0.0;
    let mut frame_ms = 0.0;
    while frame_ms < DEMO_DURATION_MS {
        for _ in 0..stepper.advance(frame_ms) {
            sim_ms += stepper.step_ms();
            autoplay(&state, &mut snapshot, sim_ms);
            gameplay::update(&mut state, &snapshot, sim_ms);
        }
        frame_ms += RENDER_FRAME_MS;
    }
    gameplay::stop(&mut state);

    info!(
        "Demo finished in {:.0}ms wall time: score {}, accuracy {:.1}%, best streak {}.",
        wall_clock.now_ms(),
        state.score.total_score,
        state.score.accuracy() * 100.0,
        state.score.max_streak
    );
    Ok(())
}

fn autoplay(state: &State, snapshot: &mut KeyboardSnapshot, now_ms: f64) {
    for note in &state.notes {
        if note.is_pending()
            && !snapshot.is_down(note.pitch)
            && now_ms >= note.target_ms
            && now_ms <= note.target_ms + 50.0
        {
            snapshot.press(note.pitch, 100, now_ms);
        }
    }

    for note in &state.notes {
        if let Some(held) = snapshot.held(note.pitch) {
            let hold_for_ms = match note.note_type {
                NoteType::Hold => note.duration_ms * 0.95,
                NoteType::Tap => 120.0,
            };
            if now_ms - held.pressed_at_ms >= hold_for_ms {
                snapshot.release(note.pitch);
            }
        }
    }
}
