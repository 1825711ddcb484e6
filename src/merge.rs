use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::identity::{KeyScheme, PlayerKey, resolve};
use crate::slate::{MergedPlayerRow, MergedSlate, PlayerPropRecord, SourceId, SourceQuote};

/// All records scraped from one source for one slate.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub source: SourceId,
    pub records: Vec<PlayerPropRecord>,
}

impl SourceTable {
    pub fn new(source: SourceId, records: Vec<PlayerPropRecord>) -> Self {
        Self { source, records }
    }
}

/// Left-join every secondary source onto the primary by canonical key.
///
/// Each source contributes at most one record per key (the listing with the
/// highest implied probability, first seen on ties). Primary rows without a
/// secondary match are kept with empty slots.
pub fn merge(
    primary: &SourceTable,
    secondaries: &[SourceTable],
    cfg: &EngineConfig,
) -> MergedSlate {
    let scheme = cfg.merge_key_scheme;
    let primary_rows = dedup_by_key(primary, scheme, true);

    let lookups: Vec<HashMap<PlayerKey, &PlayerPropRecord>> = secondaries
        .iter()
        .map(|table| dedup_by_key(table, scheme, false).into_iter().collect())
        .collect();

    let rows: Vec<MergedPlayerRow> = primary_rows
        .into_iter()
        .map(|(key, record)| {
            let quotes = lookups
                .iter()
                .map(|lookup| {
                    lookup.get(&key).map(|other| SourceQuote {
                        record: (*other).clone(),
                        line_match: lines_match(record.line, other.line, cfg.line_tolerance),
                    })
                })
                .collect();
            MergedPlayerRow {
                key,
                primary: record.clone(),
                quotes,
                edge: Default::default(),
            }
        })
        .collect();

    debug!(
        primary = %primary.source,
        primary_records = primary.records.len(),
        secondaries = secondaries.len(),
        merged_rows = rows.len(),
        "merged slate"
    );

    MergedSlate {
        primary_source: primary.source.clone(),
        secondary_sources: secondaries.iter().map(|t| t.source.clone()).collect(),
        rows,
    }
}

/// Both lines present and no further apart than `tolerance`.
pub fn lines_match(primary: Option<f64>, other: Option<f64>, tolerance: f64) -> bool {
    match (primary, other) {
        (Some(a), Some(b)) => (a - b).abs() <= tolerance,
        _ => false,
    }
}

/// One record per key, keys in first-seen order. Records whose name cleans
/// to nothing cannot be joined; with `keep_unkeyed` each one stays as its
/// own entry, otherwise it is skipped.
fn dedup_by_key(
    table: &SourceTable,
    scheme: KeyScheme,
    keep_unkeyed: bool,
) -> Vec<(PlayerKey, &PlayerPropRecord)> {
    let mut order: Vec<(PlayerKey, &PlayerPropRecord)> = Vec::new();
    let mut index: HashMap<PlayerKey, usize> = HashMap::new();

    for record in &table.records {
        let key = resolve(&record.player, scheme);
        if key.is_empty() {
            if keep_unkeyed {
                debug!(source = %table.source, player = %record.player, "keeping unjoinable record");
                order.push((key, record));
            } else {
                warn!(source = %table.source, player = %record.player, "skipping record with empty player key");
            }
            continue;
        }
        match index.get(&key).copied() {
            Some(slot) => {
                if prob_beats(record, order[slot].1) {
                    order[slot].1 = record;
                }
            }
            None => {
                index.insert(key.clone(), order.len());
                order.push((key, record));
            }
        }
    }

    let dropped = table.records.len() - order.len();
    if dropped > 0 {
        debug!(source = %table.source, dropped, "collapsed duplicate listings");
    }
    order
}

fn prob_beats(candidate: &PlayerPropRecord, current: &PlayerPropRecord) -> bool {
    match (candidate.prices.best_prob(), current.prices.best_prob()) {
        (Some(c), Some(k)) => c > k,
        (Some(_), None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slate::Prices;

    fn dk(player: &str, line: f64, odds: &str) -> PlayerPropRecord {
        PlayerPropRecord {
            source: SourceId::draftkings(),
            player: player.to_string(),
            team: None,
            stat_type: None,
            line: Some(line),
            prices: Prices::Single {
                odds: Some(odds.to_string()),
                label: Some("Over".to_string()),
            },
        }
    }

    fn pp(player: &str, line: f64) -> PlayerPropRecord {
        PlayerPropRecord {
            source: SourceId::prizepicks(),
            player: player.to_string(),
            team: Some("NYY".to_string()),
            stat_type: Some("Pitcher Strikeouts".to_string()),
            line: Some(line),
            prices: Prices::LineOnly,
        }
    }

    #[test]
    fn duplicate_listing_keeps_higher_probability() {
        let primary = SourceTable::new(SourceId::prizepicks(), vec![pp("Gerrit Cole", 6.5)]);
        let books = SourceTable::new(
            SourceId::draftkings(),
            vec![
                dk("Gerrit Cole", 6.5, "+110"),
                dk("Gerrit Cole", 6.5, "-130"),
                dk("Gerrit Cole", 6.5, "-115"),
            ],
        );
        let slate = merge(&primary, &[books], &EngineConfig::default());
        assert_eq!(slate.rows.len(), 1);
        let quote = slate.rows[0].quotes[0].as_ref().expect("matched");
        assert_eq!(quote.record.prices.single_odds(), Some("-130"));
    }

    #[test]
    fn duplicate_ties_keep_first_seen() {
        let books = SourceTable::new(
            SourceId::draftkings(),
            vec![dk("A Pitcher", 5.5, "-110"), dk("A Pitcher", 6.5, "-110")],
        );
        let out = dedup_by_key(&books, KeyScheme::FullName, false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1.line, Some(5.5));
    }

    #[test]
    fn unmatched_primary_rows_survive() {
        let primary = SourceTable::new(
            SourceId::prizepicks(),
            vec![pp("Gerrit Cole", 6.5), pp("Chris Sale", 7.5)],
        );
        let books = SourceTable::new(SourceId::draftkings(), vec![dk("Chris Sale", 7.5, "-120")]);
        let slate = merge(&primary, &[books], &EngineConfig::default());
        assert_eq!(slate.rows.len(), 2);
        assert!(slate.rows[0].quotes[0].is_none());
        assert!(slate.rows[1].quotes[0].is_some());
    }

    #[test]
    fn tolerance_gates_line_match() {
        let primary = SourceTable::new(
            SourceId::prizepicks(),
            vec![pp("Gerrit Cole", 5.5), pp("Chris Sale", 5.5)],
        );
        let books = SourceTable::new(
            SourceId::draftkings(),
            vec![dk("Gerrit Cole", 6.0, "-110"), dk("Chris Sale", 6.5, "-110")],
        );
        let slate = merge(&primary, &[books], &EngineConfig::default());
        assert!(slate.rows[0].quotes[0].as_ref().unwrap().line_match);
        assert!(!slate.rows[1].quotes[0].as_ref().unwrap().line_match);
    }

    #[test]
    fn missing_line_never_matches() {
        assert!(!lines_match(None, Some(5.5), 0.5));
        assert!(!lines_match(Some(5.5), None, 0.5));
        assert!(lines_match(Some(5.5), Some(5.5), 0.0));
    }

    #[test]
    fn unjoinable_primary_rows_are_kept_apart() {
        let primary = SourceTable::new(
            SourceId::prizepicks(),
            vec![pp("Jr.", 5.5), pp("Chris Sale", 7.5), pp("(CLE)", 4.5)],
        );
        let books = SourceTable::new(
            SourceId::draftkings(),
            vec![dk("Sr.", 5.5, "-150"), dk("Chris Sale", 7.5, "-120")],
        );
        let slate = merge(&primary, &[books], &EngineConfig::default());
        let players: Vec<&str> = slate.rows.iter().map(|r| r.primary.player.as_str()).collect();
        assert_eq!(players, vec!["Jr.", "Chris Sale", "(CLE)"]);
        assert!(slate.rows[0].key.is_empty());
        assert!(slate.rows[0].quotes[0].is_none());
        assert!(slate.rows[1].quotes[0].is_some());
        assert!(slate.rows[2].quotes[0].is_none());
    }
}
