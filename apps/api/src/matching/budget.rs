//! Point budget: the scoring-consistency post-processor.
//!
//! 100 points are split across five categories. Each category gets an evidence band
//! `[floor, ceiling]`; the model's numbers are clamped into those bands and then
//! reconciled so the categories always sum exactly to the overall score.
//!
//! Leftover points are handed out one at a time in a rotation that starts at an
//! offset derived from the match fingerprint, so identical inputs always produce
//! identical breakdowns.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::matching::evidence::Evidence;
use crate::matching::fingerprint::rotation_offset;

/// Overall-score drift (model vs final) above which a warning is logged.
const DRIFT_WARN_POINTS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Skills,
    Experience,
    Education,
    RoleFit,
    Extras,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 5] = [
        ScoreCategory::Skills,
        ScoreCategory::Experience,
        ScoreCategory::Education,
        ScoreCategory::RoleFit,
        ScoreCategory::Extras,
    ];

    pub fn max_points(self) -> u8 {
        match self {
            ScoreCategory::Skills => 40,
            ScoreCategory::Experience => 25,
            ScoreCategory::Education => 15,
            ScoreCategory::RoleFit => 10,
            ScoreCategory::Extras => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreCategory::Skills => "Skills",
            ScoreCategory::Experience => "Experience",
            ScoreCategory::Education => "Education",
            ScoreCategory::RoleFit => "Role fit",
            ScoreCategory::Extras => "Extras",
        }
    }
}

/// Inclusive `[floor, ceiling]` a category's points must land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub floor: u8,
    pub ceiling: u8,
}

impl Band {
    pub fn full(category: ScoreCategory) -> Self {
        Band {
            floor: 0,
            ceiling: category.max_points(),
        }
    }

    fn clamp(self, points: i64) -> u8 {
        points.clamp(self.floor as i64, self.ceiling as i64) as u8
    }

    /// Midpoint, rounded down.
    pub fn midpoint(self) -> u8 {
        ((self.floor as u16 + self.ceiling as u16) / 2) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: ScoreCategory,
    pub points: u8,
    pub max_points: u8,
    pub rationale: String,
}

/// A category score as proposed by a scorer, before reconciliation.
#[derive(Debug, Clone)]
pub struct ProposedScore {
    pub category: ScoreCategory,
    pub points: i64,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledScore {
    pub categories: Vec<CategoryScore>,
    pub overall: u8,
    /// True when any proposed number had to change.
    pub adjusted: bool,
}

/// Evidence-derived bands, in `ScoreCategory::ALL` order.
pub fn anchor_bands(evidence: &Evidence) -> [Band; 5] {
    let skills_max = ScoreCategory::Skills.max_points() as f32;
    let experience_max = ScoreCategory::Experience.max_points() as f32;

    let skills_ceiling = (skills_max
        * (0.8 * evidence.skill_coverage + 0.2 * evidence.preferred_coverage + 0.15).min(1.0))
    .round() as u8;
    let skills_floor = (skills_max * 0.5 * evidence.skill_coverage).round() as u8;

    let experience_ceiling =
        (experience_max * (evidence.experience_ratio + 0.15).min(1.0)).round() as u8;
    let experience_floor = (experience_max * 0.5 * evidence.experience_ratio).round() as u8;

    let education = match evidence.education_met {
        Some(true) => Band { floor: 8, ceiling: 15 },
        Some(false) => Band { floor: 0, ceiling: 8 },
        None => Band::full(ScoreCategory::Education),
    };

    [
        Band {
            floor: skills_floor.min(skills_ceiling),
            ceiling: skills_ceiling,
        },
        Band {
            floor: experience_floor.min(experience_ceiling),
            ceiling: experience_ceiling,
        },
        education,
        Band::full(ScoreCategory::RoleFit),
        Band::full(ScoreCategory::Extras),
    ]
}

/// Clamps proposed scores into their bands and distributes points until the
/// category sum equals the (clamped) proposed overall.
///
/// Invariants of the result:
/// - every category lies within `[0, max]` and within its band
/// - the category points sum exactly to `overall`
/// - identical arguments produce identical output
pub fn reconcile(
    proposed: &[ProposedScore],
    proposed_overall: i64,
    bands: &[Band; 5],
    fingerprint: &str,
) -> ReconciledScore {
    let mut adjusted = false;

    let mut categories: Vec<CategoryScore> = ScoreCategory::ALL
        .iter()
        .zip(bands.iter())
        .map(|(&category, &band)| {
            let (points, rationale) = proposed
                .iter()
                .find(|p| p.category == category)
                .map(|p| (p.points, p.rationale.clone()))
                .unwrap_or_else(|| (band.midpoint() as i64, String::new()));
            let within_max = points.clamp(0, category.max_points() as i64);
            let clamped = band.clamp(within_max);
            if clamped as i64 != points {
                adjusted = true;
            }
            CategoryScore {
                category,
                points: clamped,
                max_points: category.max_points(),
                rationale,
            }
        })
        .collect();

    let floor_sum: i64 = bands.iter().map(|b| b.floor as i64).sum();
    let ceiling_sum: i64 = bands.iter().map(|b| b.ceiling as i64).sum();
    let target = proposed_overall.clamp(0, 100).clamp(floor_sum, ceiling_sum);
    if target != proposed_overall {
        adjusted = true;
    }

    let current: i64 = categories.iter().map(|c| c.points as i64).sum();
    let mut remaining = target - current;
    if remaining != 0 {
        adjusted = true;
    }

    let start = rotation_offset(fingerprint, categories.len());
    let order: Vec<usize> = (0..categories.len())
        .map(|i| (start + i) % categories.len())
        .collect();

    while remaining != 0 {
        let mut moved = false;
        for &idx in &order {
            if remaining == 0 {
                break;
            }
            let band = bands[idx];
            let score = &mut categories[idx];
            if remaining > 0 && score.points < band.ceiling {
                score.points += 1;
                remaining -= 1;
                moved = true;
            } else if remaining < 0 && score.points > band.floor {
                score.points -= 1;
                remaining += 1;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }

    let overall: i64 = categories.iter().map(|c| c.points as i64).sum();
    if (overall - proposed_overall).abs() > DRIFT_WARN_POINTS {
        warn!(
            "Match score moved from {} to {} to stay within evidence bands",
            proposed_overall, overall
        );
    }

    ReconciledScore {
        categories,
        overall: overall as u8,
        adjusted,
    }
}
