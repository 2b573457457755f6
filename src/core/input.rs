pub const PITCH_COUNT: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEventKind {
    Press,
    Release,
}

/// A discrete edge derived from the held-key snapshot. Judging always uses the
/// event's own timestamp, never the tick that happened to process it.
#[derive(Clone, Copy, Debug)]
pub struct KeyEvent {
    pub pitch: u8,
    pub kind: KeyEventKind,
    pub velocity: u8,
    pub timestamp_ms: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct HeldKey {
    pub velocity: u8,
    pub pressed_at_ms: f64,
}

/// Snapshot of currently held pitches, written by the device layer and read
/// once per tick. The engine never blocks on input; it diffs this against the
/// previous tick's down-set to derive edges.
#[derive(Clone)]
pub struct KeyboardSnapshot {
    keys: [Option<HeldKey>; PITCH_COUNT],
}

impl KeyboardSnapshot {
    pub fn new() -> Self {
        Self {
            keys: [None; PITCH_COUNT],
        }
    }

    pub fn press(&mut self, pitch: u8, velocity: u8, at_ms: f64) {
        if let Some(slot) = self.keys.get_mut(pitch as usize) {
            if slot.is_none() {
                *slot = Some(HeldKey {
                    velocity,
                    pressed_at_ms: at_ms,
                });
            }
        }
    }

    pub fn release(&mut self, pitch: u8) {
        if let Some(slot) = self.keys.get_mut(pitch as usize) {
            *slot = None;
        }
    }

    #[inline(always)]
    pub fn is_down(&self, pitch: u8) -> bool {
        self.keys
            .get(pitch as usize)
            .is_some_and(|slot| slot.is_some())
    }

    pub fn held(&self, pitch: u8) -> Option<HeldKey> {
        self.keys.get(pitch as usize).copied().flatten()
    }

    pub fn clear(&mut self) {
        self.keys = [None; PITCH_COUNT];
    }
}

impl Default for KeyboardSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Diffs the previous tick's down-set against the current snapshot, appending
/// one edge per changed pitch and updating `prev_down` in place. Press edges
/// carry the device-reported press time (more accurate than the tick instant);
/// release edges carry `now_ms` since the snapshot holds no release time.
pub fn drain_edges(
    prev_down: &mut [bool; PITCH_COUNT],
    snapshot: &KeyboardSnapshot,
    now_ms: f64,
    out: &mut Vec<KeyEvent>,
) {
    for pitch in 0..PITCH_COUNT as u8 {
        let was_down = prev_down[pitch as usize];
        let held = snapshot.held(pitch);

        match (was_down, held) {
            (false, Some(key)) => {
                out.push(KeyEvent {
                    pitch,
                    kind: KeyEventKind::Press,
                    velocity: key.velocity,
                    timestamp_ms: key.pressed_at_ms.min(now_ms),
                });
                prev_down[pitch as usize] = true;
            }
            (true, None) => {
                out.push(KeyEvent {
                    pitch,
                    kind: KeyEventKind::Release,
                    velocity: 0,
                    timestamp_ms: now_ms,
                });
                prev_down[pitch as usize] = false;
            }
            _ => {}
        }
    }
}
