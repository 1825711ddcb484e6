use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::PlayerKey;
use crate::odds::odds_to_prob;

/// Short tag for one sportsbook / pick'em site, e.g. `PP`, `DK`, `UD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into().trim().to_ascii_uppercase())
    }

    pub fn prizepicks() -> Self {
        Self::new("PP")
    }

    pub fn draftkings() -> Self {
        Self::new("DK")
    }

    pub fn underdog() -> Self {
        Self::new("UD")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Over,
    Under,
}

/// Odds fields as scraped. Values stay raw text until a probability is
/// needed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Prices {
    #[default]
    LineOnly,
    Single {
        odds: Option<String>,
        label: Option<String>,
    },
    TwoSided {
        over: Option<String>,
        under: Option<String>,
    },
}

impl Prices {
    pub fn single_odds(&self) -> Option<&str> {
        match self {
            Prices::Single { odds, .. } => odds.as_deref(),
            _ => None,
        }
    }

    pub fn side(&self, side: Side) -> Option<&str> {
        match (self, side) {
            (Prices::TwoSided { over, .. }, Side::Over) => over.as_deref(),
            (Prices::TwoSided { under, .. }, Side::Under) => under.as_deref(),
            _ => None,
        }
    }

    pub fn is_two_sided(&self) -> bool {
        matches!(self, Prices::TwoSided { .. })
    }

    /// Highest implied probability this record quotes. Used to pick one
    /// listing when a source lists the same player more than once.
    pub fn best_prob(&self) -> Option<f64> {
        match self {
            Prices::LineOnly => None,
            Prices::Single { odds, .. } => odds_to_prob(odds.as_deref()),
            Prices::TwoSided { over, under } => {
                match (odds_to_prob(over.as_deref()), odds_to_prob(under.as_deref())) {
                    (Some(o), Some(u)) => Some(o.max(u)),
                    (o, u) => o.or(u),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPropRecord {
    pub source: SourceId,
    pub player: String,
    pub team: Option<String>,
    pub stat_type: Option<String>,
    pub line: Option<f64>,
    pub prices: Prices,
}

/// A secondary source's listing attached to a merged row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceQuote {
    pub record: PlayerPropRecord,
    /// Whether this quote's line is within tolerance of the primary line.
    /// Prices from a non-matching quote are never used.
    pub line_match: bool,
}

impl SourceQuote {
    pub fn usable_single(&self) -> Option<&str> {
        self.line_match
            .then(|| self.record.prices.single_odds())
            .flatten()
    }

    pub fn usable_side(&self, side: Side) -> Option<&str> {
        self.line_match
            .then(|| self.record.prices.side(side))
            .flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    Over,
    Under,
    /// Pass-through pick backed only by a single-price source's odds.
    SourceOdds(SourceId),
}

impl Direction {
    pub fn from_side(side: Side) -> Self {
        match side {
            Side::Over => Direction::Over,
            Side::Under => Direction::Under,
        }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Direction::Over => Some(Side::Over),
            Direction::Under => Some(Side::Under),
            Direction::SourceOdds(_) => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Over => f.write_str("OVER"),
            Direction::Under => f.write_str("UNDER"),
            Direction::SourceOdds(source) => write!(f, "{source}_ODDS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgePick {
    pub direction: Direction,
    pub edge: f64,
}

/// Outcome of edge selection for one row. Direction and edge live together
/// in `pick`, so one is never present without the other.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeResult {
    pub pick: Option<EdgePick>,
    pub avg_odds: Option<i32>,
}

impl EdgeResult {
    pub fn direction(&self) -> Option<&Direction> {
        self.pick.as_ref().map(|p| &p.direction)
    }

    pub fn edge(&self) -> Option<f64> {
        self.pick.as_ref().map(|p| p.edge)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedPlayerRow {
    pub key: PlayerKey,
    pub primary: PlayerPropRecord,
    /// One slot per secondary source, in the slate's source order.
    pub quotes: Vec<Option<SourceQuote>>,
    #[serde(default)]
    pub edge: EdgeResult,
}

impl MergedPlayerRow {
    pub fn line(&self) -> Option<f64> {
        self.primary.line
    }

    /// The primary record's own single price. It is quoted at the primary
    /// line, so it only needs that line to exist.
    pub fn primary_single(&self) -> Option<&str> {
        self.primary.line?;
        self.primary.prices.single_odds()
    }

    pub fn present_quotes(&self) -> impl Iterator<Item = &SourceQuote> {
        self.quotes.iter().flatten()
    }
}

/// Merge output plus the source ordering needed to label its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedSlate {
    pub primary_source: SourceId,
    pub secondary_sources: Vec<SourceId>,
    pub rows: Vec<MergedPlayerRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRecord {
    pub player: String,
    pub predicted: f64,
}
