//! Timing core for a falling-notes keyboard trainer: lanes derived from an
//! octave range, a procedural/scripted note scheduler, millisecond timing
//! windows, hold-claim tracking and a frame-rate independent game loop.
//!
//! Rendering, windowing and the MIDI device layer are the host's business;
//! the engine consumes a held-key snapshot per tick and exposes its state
//! through explicit return values.

pub mod config;
pub mod core;
pub mod game;
