//! Final score reporting.

use std::fmt;

/// Whole-number percentage of correct answers, rounded half up.
///
/// An empty quiz scores zero.
pub fn percentage(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = score.min(total);
    ((200 * score + total) / (2 * total)) as u32
}

/// Performance band derived from the final percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreBand {
    /// 100%
    Perfect,
    /// 70% to 99%
    Good,
    /// 50% to 69%
    Okay,
    /// Below 50%
    NeedsWork,
}

impl ScoreBand {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            100.. => ScoreBand::Perfect,
            70..=99 => ScoreBand::Good,
            50..=69 => ScoreBand::Okay,
            _ => ScoreBand::NeedsWork,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Perfect => "perfect",
            ScoreBand::Good => "good",
            ScoreBand::Okay => "okay",
            ScoreBand::NeedsWork => "needs work",
        }
    }

    /// Headline shown on the results screen.
    pub fn headline(self) -> &'static str {
        match self {
            ScoreBand::Perfect => "Perfect Score!",
            ScoreBand::Good => "Well Done!",
            ScoreBand::Okay => "Good Effort!",
            ScoreBand::NeedsWork => "Keep Learning!",
        }
    }

    pub fn encouragement(self) -> &'static str {
        match self {
            ScoreBand::Perfect => "Outstanding! You've mastered this topic!",
            ScoreBand::Good => "Great job! You're doing well!",
            ScoreBand::Okay => "Not bad! Keep practicing!",
            ScoreBand::NeedsWork => "Don't worry, practice makes perfect!",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_quarters() {
        assert_eq!(percentage(3, 4), 75);
        assert_eq!(ScoreBand::from_percentage(75), ScoreBand::Good);
        assert_eq!(percentage(4, 4), 100);
        assert_eq!(ScoreBand::from_percentage(100), ScoreBand::Perfect);
        assert_eq!(percentage(2, 4), 50);
        assert_eq!(ScoreBand::from_percentage(50), ScoreBand::Okay);
        assert_eq!(percentage(1, 4), 25);
        assert_eq!(ScoreBand::from_percentage(25), ScoreBand::NeedsWork);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(ScoreBand::from_percentage(99), ScoreBand::Good);
        assert_eq!(ScoreBand::from_percentage(70), ScoreBand::Good);
        assert_eq!(ScoreBand::from_percentage(69), ScoreBand::Okay);
        assert_eq!(ScoreBand::from_percentage(49), ScoreBand::NeedsWork);
        assert_eq!(ScoreBand::NeedsWork.to_string(), "needs work");
        assert_eq!(ScoreBand::Good.headline(), "Well Done!");
    }

    proptest! {
        #[test]
        fn percentage_matches_float_rounding(total in 1usize..500, score in 0usize..500) {
            let score = score.min(total);
            let expected = (100.0 * score as f64 / total as f64).round() as u32;
            prop_assert_eq!(percentage(score, total), expected);
        }

        #[test]
        fn band_never_drops_as_score_rises(total in 1usize..200, score in 0usize..200) {
            let score = score.min(total - 1);
            let rank = |b: ScoreBand| match b {
                ScoreBand::NeedsWork => 0,
                ScoreBand::Okay => 1,
                ScoreBand::Good => 2,
                ScoreBand::Perfect => 3,
            };
            let lower = ScoreBand::from_percentage(percentage(score, total));
            let higher = ScoreBand::from_percentage(percentage(score + 1, total));
            prop_assert!(rank(lower) <= rank(higher));
        }
    }
}
