use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::edge::{anchor_odds, representative_odds};
use crate::identity::{KeyScheme, PlayerKey, resolve};
use crate::slate::{Direction, MergedPlayerRow, ProjectionRecord, Side};

/// External predictions indexed by canonical key.
#[derive(Debug, Clone, Default)]
pub struct ProjectionFeed {
    scheme: KeyScheme,
    by_key: HashMap<PlayerKey, f64>,
}

/// One pitcher's line from a game-log export. Only starts count toward the
/// strikeout projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLogRow {
    pub name: String,
    pub games_started: u32,
    pub games: u32,
    pub strikeouts: u32,
}

impl ProjectionFeed {
    /// Duplicate keys keep the first prediction; non-finite values are dropped.
    pub fn new(records: &[ProjectionRecord], scheme: KeyScheme) -> Self {
        let mut by_key = HashMap::with_capacity(records.len());
        for record in records {
            if !record.predicted.is_finite() {
                warn!(player = %record.player, "skipping non-finite projection");
                continue;
            }
            let key = resolve(&record.player, scheme);
            if key.is_empty() {
                continue;
            }
            by_key.entry(key).or_insert(record.predicted);
        }
        Self { scheme, by_key }
    }

    /// Strikeouts per game over each pitcher's logged starts.
    pub fn from_game_logs(logs: &[GameLogRow], scheme: KeyScheme) -> Self {
        let mut totals: HashMap<PlayerKey, (u64, u64)> = HashMap::new();
        for row in logs.iter().filter(|r| r.games_started > 0) {
            let key = resolve(&row.name, scheme);
            if key.is_empty() {
                continue;
            }
            let entry = totals.entry(key).or_insert((0, 0));
            entry.0 += u64::from(row.strikeouts);
            entry.1 += u64::from(row.games);
        }
        let by_key = totals
            .into_iter()
            .filter(|(_, (_, games))| *games > 0)
            .map(|(key, (so, games))| (key, so as f64 / games as f64))
            .collect::<HashMap<_, _>>();
        debug!(pitchers = by_key.len(), "projections derived from game logs");
        Self { scheme, by_key }
    }

    pub fn get(&self, player: &str) -> Option<f64> {
        self.by_key.get(&resolve(player, self.scheme)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPick {
    pub player: String,
    pub team: Option<String>,
    pub line: f64,
    pub predicted: f64,
    pub direction: Direction,
    /// `predicted - line`, two decimals, signed.
    pub edge: f64,
    pub avg_odds: Option<i32>,
}

/// Compare a projection with the market line. A missing projection stands in
/// as the line itself, which yields a zero-edge pick. Rows without a line
/// have nothing to compare against.
pub fn blend(row: &MergedPlayerRow, projection: Option<f64>) -> Option<ProjectionPick> {
    let line = row.line().filter(|l| l.is_finite())?;
    let predicted = projection.unwrap_or(line);
    // Strict: a projection equal to the line is an UNDER.
    let side = if predicted > line { Side::Over } else { Side::Under };
    let avg_odds = representative_odds(row, anchor_odds(row), Some(side));
    Some(ProjectionPick {
        player: row.primary.player.clone(),
        team: row.primary.team.clone(),
        line,
        predicted,
        direction: Direction::from_side(side),
        edge: round2(predicted - line),
        avg_odds,
    })
}

pub fn blend_rows(rows: &[MergedPlayerRow], feed: &ProjectionFeed) -> Vec<ProjectionPick> {
    let picks: Vec<ProjectionPick> = rows
        .iter()
        .filter_map(|row| blend(row, feed.get(&row.primary.player)))
        .collect();
    let covered = rows
        .iter()
        .filter(|row| feed.get(&row.primary.player).is_some())
        .count();
    debug!(rows = rows.len(), covered, picks = picks.len(), "blended projections");
    picks
}

/// Never returns `-0.0`, which would print as "-0.00".
fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}
