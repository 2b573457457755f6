use crate::config::{
    COMBO_MULTIPLIER_STEP, GOOD_WINDOW_MS, HOLD_COMPLETION_GOOD, HOLD_COMPLETION_PERFECT,
    HOLD_ENTRY_DURATION_FACTOR, PERFECT_WINDOW_MS, TAP_GOOD_POINTS, TAP_PERFECT_POINTS,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum JudgeGrade {
    Perfect,
    Good,
    Miss,
}

impl JudgeGrade {
    #[inline(always)]
    pub fn is_combo_break(self) -> bool {
        self == JudgeGrade::Miss
    }
}

/// The judgement attached to a note once it leaves the pending state.
#[derive(Copy, Clone, Debug)]
pub struct Judgment {
    pub grade: JudgeGrade,
    pub time_error_ms: f64,
    pub points: u64,
}

/// How a hold claim was entered. Late starts are still inside the extended
/// entry window but cap the best reachable outcome.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HoldStartQuality {
    Perfect,
    Good,
    Late,
}

#[derive(Debug, Clone)]
pub struct TimingWindows {
    pub perfect_ms: f64,
    pub good_ms: f64,
}

impl Default for TimingWindows {
    fn default() -> Self {
        Self {
            perfect_ms: PERFECT_WINDOW_MS,
            good_ms: GOOD_WINDOW_MS,
        }
    }
}

impl TimingWindows {
    /// Classifies a tap press by signed timing error (positive = late).
    /// None means the press is outside every window and matches nothing.
    pub fn judge_tap(&self, time_error_ms: f64) -> Option<JudgeGrade> {
        let abs = time_error_ms.abs();
        if abs <= self.perfect_ms {
            Some(JudgeGrade::Perfect)
        } else if abs <= self.good_ms {
            Some(JudgeGrade::Good)
        } else {
            None
        }
    }

    /// Entry tolerance for claiming a hold. Longer notes get a wider window.
    #[inline(always)]
    pub fn hold_entry_window_ms(&self, duration_ms: f64) -> f64 {
        self.good_ms + HOLD_ENTRY_DURATION_FACTOR * duration_ms
    }

    pub fn classify_hold_start(&self, time_error_ms: f64) -> HoldStartQuality {
        let abs = time_error_ms.abs();
        if abs <= self.perfect_ms {
            HoldStartQuality::Perfect
        } else if abs <= self.good_ms {
            HoldStartQuality::Good
        } else {
            HoldStartQuality::Late
        }
    }

    /// A pending tap this far past its target can no longer be hit.
    #[inline(always)]
    pub fn is_tap_missed(&self, time_error_ms: f64) -> bool {
        time_error_ms > self.good_ms
    }

    /// An unclaimed hold this far past its target can no longer be claimed.
    #[inline(always)]
    pub fn is_hold_missed(&self, time_error_ms: f64, duration_ms: f64) -> bool {
        time_error_ms > self.hold_entry_window_ms(duration_ms)
    }
}

#[inline(always)]
pub fn tap_base_points(grade: JudgeGrade) -> u64 {
    match grade {
        JudgeGrade::Perfect => TAP_PERFECT_POINTS,
        JudgeGrade::Good => TAP_GOOD_POINTS,
        JudgeGrade::Miss => 0,
    }
}

/// Every ten consecutive non-miss judgements add one multiplier step.
#[inline(always)]
pub fn combo_multiplier(combo: u32) -> u64 {
    ((combo / COMBO_MULTIPLIER_STEP) as u64).max(1)
}

/// Resolves a released (or force-retired) hold claim into a grade and base
/// points from the sustained fraction and the entry quality.
pub fn judge_hold_release(completion: f64, start: HoldStartQuality) -> (JudgeGrade, u64) {
    if completion >= HOLD_COMPLETION_PERFECT {
        match start {
            HoldStartQuality::Perfect => (JudgeGrade::Perfect, 150),
            HoldStartQuality::Good => (JudgeGrade::Perfect, 125),
            HoldStartQuality::Late => (JudgeGrade::Good, 100),
        }
    } else if completion >= HOLD_COMPLETION_GOOD {
        match start {
            HoldStartQuality::Perfect => (JudgeGrade::Good, 100),
            HoldStartQuality::Good => (JudgeGrade::Good, 85),
            HoldStartQuality::Late => (JudgeGrade::Good, 70),
        }
    } else {
        (JudgeGrade::Miss, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_windows() {
        let windows = TimingWindows::default();
        assert_eq!(windows.judge_tap(0.0), Some(JudgeGrade::Perfect));
        assert_eq!(windows.judge_tap(100.0), Some(JudgeGrade::Perfect));
        assert_eq!(windows.judge_tap(-100.0), Some(JudgeGrade::Perfect));
        assert_eq!(windows.judge_tap(150.0), Some(JudgeGrade::Good));
        assert_eq!(windows.judge_tap(-200.0), Some(JudgeGrade::Good));
        assert_eq!(windows.judge_tap(250.0), None);
        assert_eq!(windows.judge_tap(-250.0), None);
    }

    #[test]
    fn hold_entry_window_scales_with_duration() {
        let windows = TimingWindows::default();
        assert_eq!(windows.hold_entry_window_ms(0.0), 200.0);
        assert_eq!(windows.hold_entry_window_ms(1000.0), 300.0);
        assert_eq!(windows.hold_entry_window_ms(2000.0), 400.0);
    }

    #[test]
    fn hold_start_quality_bands() {
        let windows = TimingWindows::default();
        assert_eq!(windows.classify_hold_start(50.0), HoldStartQuality::Perfect);
        assert_eq!(windows.classify_hold_start(-180.0), HoldStartQuality::Good);
        assert_eq!(windows.classify_hold_start(260.0), HoldStartQuality::Late);
    }

    #[test]
    fn miss_thresholds_are_late_only() {
        let windows = TimingWindows::default();
        assert!(!windows.is_tap_missed(-500.0));
        assert!(!windows.is_tap_missed(200.0));
        assert!(windows.is_tap_missed(201.0));
        assert!(!windows.is_hold_missed(350.0, 2000.0));
        assert!(windows.is_hold_missed(401.0, 2000.0));
    }

    #[test]
    fn hold_release_outcome_matrix() {
        use HoldStartQuality::*;
        assert_eq!(judge_hold_release(0.95, Perfect), (JudgeGrade::Perfect, 150));
        assert_eq!(judge_hold_release(0.95, Good), (JudgeGrade::Perfect, 125));
        assert_eq!(judge_hold_release(0.95, Late), (JudgeGrade::Good, 100));
        assert_eq!(judge_hold_release(0.75, Perfect), (JudgeGrade::Good, 100));
        assert_eq!(judge_hold_release(0.75, Good), (JudgeGrade::Good, 85));
        assert_eq!(judge_hold_release(0.75, Late), (JudgeGrade::Good, 70));
        assert_eq!(judge_hold_release(0.6, Perfect), (JudgeGrade::Miss, 0));
        assert_eq!(judge_hold_release(0.6, Late), (JudgeGrade::Miss, 0));
        // Boundary rows sit in the higher band.
        assert_eq!(judge_hold_release(0.9, Perfect).1, 150);
        assert_eq!(judge_hold_release(0.7, Perfect).1, 100);
    }

    #[test]
    fn combo_multiplier_steps_every_ten() {
        assert_eq!(combo_multiplier(0), 1);
        assert_eq!(combo_multiplier(9), 1);
        assert_eq!(combo_multiplier(10), 1);
        assert_eq!(combo_multiplier(19), 1);
        assert_eq!(combo_multiplier(20), 2);
        assert_eq!(combo_multiplier(25), 2);
        assert_eq!(combo_multiplier(100), 10);
    }
}
