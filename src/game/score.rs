use crate::game::judgment::{combo_multiplier, JudgeGrade};

/// Running score for one session. Mutated only by the game loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreState {
    pub total_score: u64,
    pub combo: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub perfect_count: u32,
    pub good_count: u32,
    pub miss_count: u32,
}

impl ScoreState {
    /// Applies one judgement and returns the points it earned. The combo
    /// multiplier uses the combo value current at judging time, then the
    /// combo advances (or resets on a miss). `max_streak` only ever grows.
    pub fn apply(&mut self, grade: JudgeGrade, base_points: u64) -> u64 {
        match grade {
            JudgeGrade::Miss => {
                self.miss_count += 1;
                self.combo = 0;
                self.streak = 0;
                0
            }
            _ => {
                let earned = base_points * combo_multiplier(self.combo);
                match grade {
                    JudgeGrade::Perfect => self.perfect_count += 1,
                    JudgeGrade::Good => self.good_count += 1,
                    JudgeGrade::Miss => unreachable!(),
                }
                self.total_score += earned;
                self.combo += 1;
                self.streak += 1;
                self.max_streak = self.max_streak.max(self.streak);
                earned
            }
        }
    }

    pub fn judged_total(&self) -> u32 {
        self.perfect_count + self.good_count + self.miss_count
    }

    /// Weighted hit rate: perfects count full, goods half. 0.0 before any
    /// judgement has landed.
    pub fn accuracy(&self) -> f64 {
        let total = self.judged_total();
        if total == 0 {
            return 0.0;
        }
        (self.perfect_count as f64 + 0.5 * self.good_count as f64) / total as f64
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
