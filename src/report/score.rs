use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBucket {
    Emerald,
    Green,
    Lime,
    Yellow,
    Orange,
    Red,
    DeepRed,
}

/// Which box palette to classify against.
///
/// `Summary` is the coarse palette used on the report overview and page
/// cards; `Detailed` is the seven-tier palette used on page detail views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreScale {
    Summary,
    Detailed,
}

impl ScoreBucket {
    pub fn classify(score: f64, scale: ScoreScale) -> Self {
        match scale {
            ScoreScale::Summary => {
                if score >= 9.0 {
                    Self::Emerald
                } else if score >= 7.0 {
                    Self::Green
                } else if score >= 5.0 {
                    Self::Yellow
                } else {
                    Self::Red
                }
            }
            ScoreScale::Detailed => {
                if score >= 9.0 {
                    Self::Emerald
                } else if score >= 7.0 {
                    Self::Green
                } else if score >= 6.0 {
                    Self::Lime
                } else if score >= 5.0 {
                    Self::Yellow
                } else if score >= 4.0 {
                    Self::Orange
                } else if score >= 2.0 {
                    Self::Red
                } else {
                    Self::DeepRed
                }
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emerald => "emerald",
            Self::Green => "green",
            Self::Lime => "lime",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::DeepRed => "deep_red",
        }
    }

    pub fn box_classes(self) -> &'static str {
        match self {
            Self::Emerald => "bg-emerald-100 text-emerald-800 border-emerald-300",
            Self::Green => "bg-green-100 text-green-800 border-green-300",
            Self::Lime => "bg-lime-100 text-lime-800 border-lime-300",
            Self::Yellow => "bg-yellow-100 text-yellow-800 border-yellow-300",
            Self::Orange => "bg-orange-100 text-orange-800 border-orange-300",
            Self::Red => "bg-red-100 text-red-700 border-red-300",
            Self::DeepRed => "bg-red-200 text-red-900 border-red-400",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    Excellent,
    Good,
    NeedsImprovement,
}

impl ScoreStatus {
    pub fn classify(score: f64) -> Self {
        if score >= 8.0 {
            Self::Excellent
        } else if score >= 6.0 {
            Self::Good
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Four-tier tone shared by progress bars and score text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTone {
    Emerald,
    Green,
    Amber,
    Red,
}

impl ScoreTone {
    pub fn classify(score: f64) -> Self {
        if score >= 8.0 {
            Self::Emerald
        } else if score >= 6.0 {
            Self::Green
        } else if score >= 4.0 {
            Self::Amber
        } else {
            Self::Red
        }
    }

    pub fn progress_class(self) -> &'static str {
        match self {
            Self::Emerald => "bg-emerald-500",
            Self::Green => "bg-green-500",
            Self::Amber => "bg-amber-500",
            Self::Red => "bg-red-500",
        }
    }

    pub fn text_class(self) -> &'static str {
        match self {
            Self::Emerald => "text-emerald-600",
            Self::Green => "text-green-600",
            Self::Amber => "text-amber-600",
            Self::Red => "text-red-600",
        }
    }
}

/// Everything a view needs to present one score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBadge {
    pub score: f64,
    pub bucket: ScoreBucket,
    pub box_classes: &'static str,
    pub status: ScoreStatus,
    pub status_text: &'static str,
    pub progress_class: &'static str,
    pub text_class: &'static str,
}

impl ScoreBadge {
    pub fn new(score: f64, scale: ScoreScale) -> Self {
        let bucket = ScoreBucket::classify(score, scale);
        let status = ScoreStatus::classify(score);
        let tone = ScoreTone::classify(score);
        Self {
            score,
            bucket,
            box_classes: bucket.box_classes(),
            status,
            status_text: status.label(),
            progress_class: tone.progress_class(),
            text_class: tone.text_class(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_scale_uses_inclusive_thresholds() {
        assert_eq!(
            ScoreBucket::classify(9.0, ScoreScale::Summary),
            ScoreBucket::Emerald
        );
        assert_eq!(
            ScoreBucket::classify(8.9, ScoreScale::Summary),
            ScoreBucket::Green
        );
        assert_eq!(
            ScoreBucket::classify(6.99, ScoreScale::Summary),
            ScoreBucket::Yellow
        );
        assert_eq!(
            ScoreBucket::classify(4.99, ScoreScale::Summary),
            ScoreBucket::Red
        );
    }

    #[test]
    fn detailed_scale_walks_every_tier() {
        let cases = [
            (10.0, ScoreBucket::Emerald),
            (7.0, ScoreBucket::Green),
            (6.99, ScoreBucket::Lime),
            (6.0, ScoreBucket::Lime),
            (5.0, ScoreBucket::Yellow),
            (4.0, ScoreBucket::Orange),
            (2.0, ScoreBucket::Red),
            (1.99, ScoreBucket::DeepRed),
            (0.0, ScoreBucket::DeepRed),
        ];
        for (score, expected) in cases {
            assert_eq!(
                ScoreBucket::classify(score, ScoreScale::Detailed),
                expected,
                "score {score}"
            );
        }
    }

    #[test]
    fn status_and_tone_share_eight_and_six_boundaries() {
        assert_eq!(ScoreStatus::classify(8.0).label(), "Excellent");
        assert_eq!(ScoreStatus::classify(7.99).label(), "Good");
        assert_eq!(ScoreStatus::classify(5.99).label(), "Needs Improvement");

        assert_eq!(ScoreTone::classify(4.0), ScoreTone::Amber);
        assert_eq!(ScoreTone::classify(3.9).progress_class(), "bg-red-500");
    }

    #[test]
    fn classifiers_are_total_for_out_of_range_input() {
        assert_eq!(
            ScoreBucket::classify(-3.0, ScoreScale::Detailed),
            ScoreBucket::DeepRed
        );
        assert_eq!(
            ScoreBucket::classify(f64::NAN, ScoreScale::Summary),
            ScoreBucket::Red
        );
        assert_eq!(ScoreStatus::classify(42.0), ScoreStatus::Excellent);
    }
}
