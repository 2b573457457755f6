use crate::game::judgment::Judgment;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteType {
    Tap,
    Hold,
}

/// A spawned target note, owned by the game loop's active collection.
///
/// `result` is written at most once: `None` while pending, then either a
/// non-Miss grade (hit) or Miss. Spawn and target times are both fixed at
/// spawn, so a mid-session fall-duration change never moves notes already in
/// flight.
#[derive(Clone, Debug)]
pub struct Note {
    pub id: u64,
    pub pitch: u8,
    pub lane: usize,
    pub note_type: NoteType,
    pub spawn_ms: f64,
    pub target_ms: f64,
    pub duration_ms: f64,
    pub result: Option<Judgment>,
}

impl Note {
    #[inline(always)]
    pub fn is_pending(&self) -> bool {
        self.result.is_none()
    }

    /// Fractional progress through the judged region: 0 at spawn, 1 when the
    /// leading edge reaches the hit line.
    pub fn progress(&self, now_ms: f64) -> f32 {
        let fall = self.target_ms - self.spawn_ms;
        if fall <= 0.0 {
            return 1.0;
        }
        (((now_ms - self.spawn_ms) / fall) as f32).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tap(spawn_ms: f64, target_ms: f64) -> Note {
        Note {
            id: 1,
            pitch: 60,
            lane: 0,
            note_type: NoteType::Tap,
            spawn_ms,
            target_ms,
            duration_ms: 0.0,
            result: None,
        }
    }

    #[test]
    fn progress_spans_spawn_to_target() {
        let note = tap(1000.0, 5000.0);
        assert_eq!(note.progress(1000.0), 0.0);
        assert_eq!(note.progress(3000.0), 0.5);
        assert_eq!(note.progress(5000.0), 1.0);
    }

    #[test]
    fn progress_is_clamped_outside_the_fall() {
        let note = tap(1000.0, 5000.0);
        assert_eq!(note.progress(0.0), 0.0);
        assert_eq!(note.progress(9000.0), 1.0);
    }
}
