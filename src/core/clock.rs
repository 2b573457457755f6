use crate::config::MAX_FRAME_DELTA_MS;
use std::time::Instant;

/// Monotonic session clock. All engine timestamps are milliseconds since the
/// clock's epoch, so judging code never touches wall-clock time directly and
/// tests can feed explicit values instead.
pub struct GameClock {
    epoch: Instant,
}

impl GameClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    #[inline(always)]
    pub fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Moves the epoch to the present, restarting the session timeline at zero.
    pub fn restart(&mut self) {
        self.epoch = Instant::now();
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts arbitrary poll instants (one per rendered frame) into a whole
/// number of fixed simulation steps, so timing-window math is independent of
/// the host's refresh rate. Frame deltas are capped to keep a stalled frame
/// from triggering a catch-up burst.
pub struct FixedStep {
    step_ms: f64,
    last_poll_ms: Option<f64>,
    accumulator_ms: f64,
}

impl FixedStep {
    pub fn new(step_ms: f64) -> Self {
        Self {
            step_ms: step_ms.max(f64::EPSILON),
            last_poll_ms: None,
            accumulator_ms: 0.0,
        }
    }

    #[inline(always)]
    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    /// Returns how many simulation steps have elapsed up to `now_ms`.
    pub fn advance(&mut self, now_ms: f64) -> u32 {
        let delta = match self.last_poll_ms {
            Some(last) => (now_ms - last).clamp(0.0, MAX_FRAME_DELTA_MS),
            None => 0.0,
        };
        self.last_poll_ms = Some(now_ms);
        self.accumulator_ms += delta;

        let mut steps = 0;
        while self.accumulator_ms >= self.step_ms {
            self.accumulator_ms -= self.step_ms;
            steps += 1;
        }
        steps
    }

    pub fn reset(&mut self) {
        self.last_poll_ms = None;
        self.accumulator_ms = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_poll_yields_no_steps() {
        let mut fs = FixedStep::new(10.0);
        assert_eq!(fs.advance(1234.5), 0);
    }

    #[test]
    fn steps_match_elapsed_time_regardless_of_poll_cadence() {
        // 100ms of simulated time at 10ms steps: 10 steps total, whether
        // polled every 4ms or in one big gap.
        let mut fine = FixedStep::new(10.0);
        fine.advance(0.0);
        let mut fine_steps = 0;
        let mut t = 0.0;
        while t < 100.0 {
            t += 4.0;
            fine_steps += fine.advance(t);
        }

        let mut coarse = FixedStep::new(10.0);
        coarse.advance(0.0);
        let coarse_steps = coarse.advance(100.0);

        assert_eq!(fine_steps, 10);
        assert_eq!(coarse_steps, 10);
    }

    #[test]
    fn frame_delta_is_capped() {
        let mut fs = FixedStep::new(10.0);
        fs.advance(0.0);
        // A 5-second stall is treated as MAX_FRAME_DELTA_MS of elapsed time.
        let steps = fs.advance(5000.0);
        assert_eq!(steps as f64, (MAX_FRAME_DELTA_MS / 10.0).floor());
    }

    #[test]
    fn reset_clears_accumulated_time() {
        let mut fs = FixedStep::new(10.0);
        fs.advance(0.0);
        fs.advance(5.0);
        fs.reset();
        assert_eq!(fs.advance(1000.0), 0);
    }
}
