use configparser::ini::Ini;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

// Timing windows (ms)
pub const PERFECT_WINDOW_MS: f64 = 100.0;
pub const GOOD_WINDOW_MS: f64 = 200.0;
// Hold entry tolerance widens with note length: GOOD + factor * duration.
pub const HOLD_ENTRY_DURATION_FACTOR: f64 = 0.10;

// Scoring
pub const TAP_PERFECT_POINTS: u64 = 100;
pub const TAP_GOOD_POINTS: u64 = 50;
pub const COMBO_MULTIPLIER_STEP: u32 = 10;

// Hold completion thresholds
pub const HOLD_COMPLETION_PERFECT: f64 = 0.9;
pub const HOLD_COMPLETION_GOOD: f64 = 0.7;

// Loop bookkeeping (ms)
pub const SPAWN_EPSILON_MS: f64 = 30.0;
pub const KEY_EVENT_RETENTION_MS: f64 = 2000.0;
pub const FEEDBACK_LIFETIME_MS: f64 = 1200.0;
pub const RETIRE_MARGIN_MS: f64 = 500.0;

// Simulation
pub const SIM_STEP_MS: f64 = 1000.0 / 120.0;
pub const MAX_FRAME_DELTA_MS: f64 = 100.0;

pub const MIN_FALL_DURATION_MS: f64 = 250.0;

// --- Settings Data ---
const SETTINGS_DIR: &str = "save";
const SETTINGS_INI_PATH: &str = "save/keyfall.ini";

#[derive(Debug, Clone)]
pub struct Settings {
    pub start_octave: i32,
    pub end_octave: i32,
    pub fall_duration_ms: f64,
    pub preroll_delay_ms: f64,
    pub spawn_interval_min_ms: f64,
    pub spawn_interval_max_ms: f64,
    pub hold_note_chance: f64,
    pub hold_duration_min_ms: f64,
    pub hold_duration_max_ms: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_octave: 4,
            end_octave: 5,
            fall_duration_ms: 4000.0,
            preroll_delay_ms: 2000.0,
            spawn_interval_min_ms: 600.0,
            spawn_interval_max_ms: 1000.0,
            hold_note_chance: 0.3,
            hold_duration_min_ms: 500.0,
            hold_duration_max_ms: 2000.0,
        }
    }
}

// Global static for the current settings.
static SETTINGS: Lazy<Mutex<Settings>> = Lazy::new(|| Mutex::new(Settings::default()));

/// Creates the default settings file if it doesn't exist.
fn create_default_file() -> Result<(), std::io::Error> {
    info!("Settings file not found, creating defaults in '{}'.", SETTINGS_DIR);
    fs::create_dir_all(SETTINGS_DIR)?;

    if !Path::new(SETTINGS_INI_PATH).exists() {
        let defaults = Settings::default();
        let mut conf = Ini::new();
        conf.set("lanes", "StartOctave", Some(defaults.start_octave.to_string()));
        conf.set("lanes", "EndOctave", Some(defaults.end_octave.to_string()));
        conf.set("gameplay", "FallDurationMs", Some(defaults.fall_duration_ms.to_string()));
        conf.set("gameplay", "PrerollDelayMs", Some(defaults.preroll_delay_ms.to_string()));
        conf.set("scheduler", "SpawnIntervalMinMs", Some(defaults.spawn_interval_min_ms.to_string()));
        conf.set("scheduler", "SpawnIntervalMaxMs", Some(defaults.spawn_interval_max_ms.to_string()));
        conf.set("scheduler", "HoldNoteChance", Some(defaults.hold_note_chance.to_string()));
        conf.set("scheduler", "HoldDurationMinMs", Some(defaults.hold_duration_min_ms.to_string()));
        conf.set("scheduler", "HoldDurationMaxMs", Some(defaults.hold_duration_max_ms.to_string()));
        conf.write(SETTINGS_INI_PATH)?;
    }

    Ok(())
}

pub fn load() {
    if !Path::new(SETTINGS_INI_PATH).exists() {
        if let Err(e) = create_default_file() {
            warn!("Failed to create default settings file: {}", e);
            // Proceed with default struct values.
            return;
        }
    }

    let mut settings = SETTINGS.lock().unwrap();
    let defaults = Settings::default();

    let mut conf = Ini::new();
    if conf.load(SETTINGS_INI_PATH).is_ok() {
        settings.start_octave = conf
            .get("lanes", "StartOctave")
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(defaults.start_octave);
        settings.end_octave = conf
            .get("lanes", "EndOctave")
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(defaults.end_octave);
        settings.fall_duration_ms = conf
            .get("gameplay", "FallDurationMs")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.fall_duration_ms)
            .max(MIN_FALL_DURATION_MS);
        settings.preroll_delay_ms = conf
            .get("gameplay", "PrerollDelayMs")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.preroll_delay_ms)
            .max(0.0);
        settings.spawn_interval_min_ms = conf
            .get("scheduler", "SpawnIntervalMinMs")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.spawn_interval_min_ms);
        settings.spawn_interval_max_ms = conf
            .get("scheduler", "SpawnIntervalMaxMs")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.spawn_interval_max_ms)
            .max(settings.spawn_interval_min_ms);
        settings.hold_note_chance = conf
            .get("scheduler", "HoldNoteChance")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.hold_note_chance)
            .clamp(0.0, 1.0);
        settings.hold_duration_min_ms = conf
            .get("scheduler", "HoldDurationMinMs")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.hold_duration_min_ms);
        settings.hold_duration_max_ms = conf
            .get("scheduler", "HoldDurationMaxMs")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.hold_duration_max_ms)
            .max(settings.hold_duration_min_ms);
    } else {
        warn!("Failed to load '{}', using default settings.", SETTINGS_INI_PATH);
    }
}

/// Returns a copy of the currently loaded settings.
pub fn get() -> Settings {
    SETTINGS.lock().unwrap().clone()
}
