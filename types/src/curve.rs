//! Level curves: how a raw stat value maps to a discrete level.
//!
//! A curve holds four tunable parameters and derives an ordered threshold
//! sequence from them: `levels[i] = weight^i` for `i` in `0..=max`, computed
//! with saturating arithmetic. `levels[i]` is the minimum value required to be
//! at level `i`.
//!
//! Curves are immutable. Every `with_*` method validates the candidate
//! parameters and returns a fresh curve with its thresholds re-derived, so a
//! partially-valid curve is never observable.

use crate::math::SaturatingMath;
use crate::random::UniformSource;
use crate::StatError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The parameter a curve validation error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CurveField {
    Default,
    Random,
    Max,
    Weight,
}

impl fmt::Display for CurveField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CurveField::Default => "default",
            CurveField::Random => "random",
            CurveField::Max => "max",
            CurveField::Weight => "weight",
        };
        f.write_str(name)
    }
}

/// Threshold curve for one stat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CurveParams", into = "CurveParams")]
pub struct StatCurve {
    description: String,
    default: i64,
    random: i64,
    max: i32,
    weight: i64,
    levels: Vec<i64>,
}

impl StatCurve {
    /// Highest level cap a curve may be configured with.
    pub const LEVEL_CAP: i32 = 100_000;

    pub const DEFAULT_MAX: i32 = 1;
    pub const DEFAULT_WEIGHT: i64 = 2;

    /// Build a curve from all four parameters at once.
    pub fn new(default: i64, random: i64, max: i32, weight: i64) -> Result<Self, StatError> {
        Self::build(CurveField::Default, String::new(), default, random, max, weight)
    }

    /// Replace the baseline value.
    pub fn with_default(&self, default: i64) -> Result<Self, StatError> {
        Self::build(
            CurveField::Default,
            self.description.clone(),
            default,
            self.random,
            self.max,
            self.weight,
        )
    }

    /// Replace the random spread around the baseline.
    pub fn with_random(&self, random: i64) -> Result<Self, StatError> {
        Self::build(
            CurveField::Random,
            self.description.clone(),
            self.default,
            random,
            self.max,
            self.weight,
        )
    }

    /// Replace the level cap.
    pub fn with_max(&self, max: i32) -> Result<Self, StatError> {
        Self::build(
            CurveField::Max,
            self.description.clone(),
            self.default,
            self.random,
            max,
            self.weight,
        )
    }

    /// Replace the growth base.
    pub fn with_weight(&self, weight: i64) -> Result<Self, StatError> {
        Self::build(
            CurveField::Weight,
            self.description.clone(),
            self.default,
            self.random,
            self.max,
            weight,
        )
    }

    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self.clone()
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default_value(&self) -> i64 {
        self.default
    }

    pub fn random(&self) -> i64 {
        self.random
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn weight(&self) -> i64 {
        self.weight
    }

    /// The threshold sequence, `max + 1` entries long.
    pub fn levels(&self) -> &[i64] {
        &self.levels
    }

    /// Highest level whose threshold is `<= value`, or 0 below the first threshold.
    ///
    /// Binary search over the threshold sequence; O(log max).
    pub fn level(&self, value: i64) -> i32 {
        let reached = self.levels.partition_point(|&threshold| threshold <= value);
        reached.saturating_sub(1) as i32
    }

    /// Value required to be at `level`, if the level exists on this curve.
    pub fn threshold(&self, level: i32) -> Option<i64> {
        usize::try_from(level)
            .ok()
            .and_then(|index| self.levels.get(index).copied())
    }

    /// First threshold strictly above `value`; `None` once the cap is reached.
    pub fn next_threshold(&self, value: i64) -> Option<i64> {
        let reached = self.levels.partition_point(|&threshold| threshold <= value);
        self.levels.get(reached).copied()
    }

    /// Value assigned to a player's stat when nothing has been persisted yet.
    ///
    /// `default + (u1 * 2 * random - random) * u2`, floored at zero. The
    /// second draw scales the deviation, skewing results toward `default`.
    pub fn randomized_default(&self, source: &dyn UniformSource) -> i64 {
        let spread = self.random as f64;
        let deviation = (source.next_unit() * 2.0 * spread - spread) * source.next_unit();
        self.default.clamped_add(deviation as i64).max(0)
    }

    fn build(
        field: CurveField,
        description: String,
        default: i64,
        random: i64,
        max: i32,
        weight: i64,
    ) -> Result<Self, StatError> {
        if default < 0 {
            return Err(invalid(CurveField::Default, format!("{default} is negative")));
        }
        if random < 0 {
            return Err(invalid(CurveField::Random, format!("{random} is negative")));
        }
        if !(1..=Self::LEVEL_CAP).contains(&max) {
            return Err(invalid(
                CurveField::Max,
                format!("{max} is outside 1..={}", Self::LEVEL_CAP),
            ));
        }
        if weight < 0 {
            return Err(invalid(CurveField::Weight, format!("{weight} is negative")));
        }

        let levels = compute_levels(max, weight)?;
        let top = levels[levels.len() - 1];
        let top_reachable = top <= default.clamped_add(random);
        let floor_non_negative = default.clamped_sub(random) >= 0;

        if !(top_reachable || floor_non_negative) {
            return Err(invalid(
                field,
                format!(
                    "spread {random} can take default {default} below zero \
                     and the top threshold {top} is unreachable"
                ),
            ));
        }

        Ok(Self {
            description,
            default,
            random,
            max,
            weight,
            levels,
        })
    }
}

impl Default for StatCurve {
    fn default() -> Self {
        Self {
            description: String::new(),
            default: 0,
            random: 0,
            max: Self::DEFAULT_MAX,
            weight: Self::DEFAULT_WEIGHT,
            levels: vec![1, Self::DEFAULT_WEIGHT],
        }
    }
}

fn invalid(field: CurveField, reason: String) -> StatError {
    StatError::InvalidCurve { field, reason }
}

fn compute_levels(max: i32, weight: i64) -> Result<Vec<i64>, StatError> {
    (0..=max).map(|level| weight.clamped_pow(level)).collect()
}

// ── Serialized form ────────────────────────────────────────────────────

/// On-disk parameters. `levels` is never stored; it is re-derived and the
/// parameters re-validated on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct CurveParams {
    #[serde(default)]
    description: String,
    #[serde(default)]
    default: i64,
    #[serde(default)]
    random: i64,
    #[serde(default = "default_max")]
    max: i32,
    #[serde(default = "default_weight")]
    weight: i64,
}

fn default_max() -> i32 {
    StatCurve::DEFAULT_MAX
}

fn default_weight() -> i64 {
    StatCurve::DEFAULT_WEIGHT
}

impl TryFrom<CurveParams> for StatCurve {
    type Error = StatError;

    fn try_from(params: CurveParams) -> Result<Self, Self::Error> {
        Self::build(
            CurveField::Default,
            params.description,
            params.default,
            params.random,
            params.max,
            params.weight,
        )
    }
}

impl From<StatCurve> for CurveParams {
    fn from(curve: StatCurve) -> Self {
        Self {
            description: curve.description,
            default: curve.default,
            random: curve.random,
            max: curve.max,
            weight: curve.weight,
        }
    }
}
