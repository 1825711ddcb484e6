use rayon::prelude::*;

use crate::config::{EdgeStrategy, EngineConfig};
use crate::odds::{american_to_prob, average_odds, odds_to_prob, parse_american};
use crate::slate::{Direction, EdgePick, EdgeResult, MergedPlayerRow, Side, SourceId};

const FAIR_PROB: f64 = 0.5;

/// A single-price quote usable for this row.
#[derive(Debug, Clone, Copy)]
struct SinglePrice<'a> {
    source: &'a SourceId,
    odds: &'a str,
}

/// Attach an [`EdgeResult`] to every row. Rows are independent, so they are
/// scored in parallel; order is untouched.
pub fn score_rows(rows: &mut [MergedPlayerRow], cfg: &EngineConfig) {
    rows.par_iter_mut().for_each(|row| {
        let result = select_edge(row, cfg);
        row.edge = result;
    });
}

pub fn select_edge(row: &MergedPlayerRow, cfg: &EngineConfig) -> EdgeResult {
    let singles = single_prices(row);
    let anchor = singles.first().copied();

    let pick = match cfg.strategy {
        EdgeStrategy::TwoSided => two_sided_pick(row, anchor),
        EdgeStrategy::Magnitude => magnitude_pick(row, &singles),
    };
    let Some((pick, single)) = pick else {
        return EdgeResult::default();
    };

    // A pass-through pick is priced by the quote it came from; OVER/UNDER
    // picks average the anchor with the matching side.
    let first = match pick.direction {
        Direction::SourceOdds(_) => single,
        _ => anchor,
    };
    let avg_odds = representative_odds(row, first.map(|s| s.odds), pick.direction.side());
    EdgeResult {
        pick: Some(pick),
        avg_odds,
    }
}

/// Price attached to a pick: the mean of a single-price quote and the first
/// line-matched two-sided quote for `side`.
pub(crate) fn representative_odds(
    row: &MergedPlayerRow,
    single: Option<&str>,
    side: Option<Side>,
) -> Option<i32> {
    let side_odds = side.and_then(|side| {
        row.present_quotes()
            .filter(|q| q.record.prices.is_two_sided())
            .find_map(|q| q.usable_side(side))
    });
    average_odds(single, side_odds)
}

/// The anchor single price of a row, if any quote provides one.
pub(crate) fn anchor_odds(row: &MergedPlayerRow) -> Option<&str> {
    single_prices(row).first().map(|s| s.odds)
}

/// Parseable, line-matched single prices: the primary's own first, then
/// secondary sources in slate order.
fn single_prices(row: &MergedPlayerRow) -> Vec<SinglePrice<'_>> {
    let own = row.primary_single().map(|odds| SinglePrice {
        source: &row.primary.source,
        odds,
    });
    let secondary = row.present_quotes().filter_map(|q| {
        q.usable_single().map(|odds| SinglePrice {
            source: &q.record.source,
            odds,
        })
    });
    own.into_iter()
        .chain(secondary)
        .filter(|s| parse_american(s.odds).is_some())
        .collect()
}

fn two_sided_pick<'a>(
    row: &'a MergedPlayerRow,
    anchor: Option<SinglePrice<'a>>,
) -> Option<(EdgePick, Option<SinglePrice<'a>>)> {
    for quote in row.present_quotes() {
        let over = odds_to_prob(quote.usable_side(Side::Over));
        let under = odds_to_prob(quote.usable_side(Side::Under));
        if let (Some(over), Some(under)) = (over, under) {
            let side = if over > under { Side::Over } else { Side::Under };
            return Some((
                EdgePick {
                    direction: Direction::from_side(side),
                    edge: over.max(under) - FAIR_PROB,
                },
                None,
            ));
        }
    }

    let anchor = anchor?;
    let prob = odds_to_prob(Some(anchor.odds))?;
    Some((
        EdgePick {
            direction: Direction::SourceOdds(anchor.source.clone()),
            edge: prob - FAIR_PROB,
        },
        Some(anchor),
    ))
}

/// Largest absolute price wins; the first candidate wins ties.
fn magnitude_pick<'a>(
    row: &'a MergedPlayerRow,
    singles: &[SinglePrice<'a>],
) -> Option<(EdgePick, Option<SinglePrice<'a>>)> {
    let mut candidates: Vec<(Direction, i32, Option<SinglePrice<'a>>)> = singles
        .iter()
        .filter_map(|s| {
            parse_american(s.odds).map(|v| (Direction::SourceOdds(s.source.clone()), v, Some(*s)))
        })
        .collect();
    for quote in row.present_quotes() {
        for side in [Side::Over, Side::Under] {
            if let Some(v) = quote.usable_side(side).and_then(parse_american) {
                candidates.push((Direction::from_side(side), v, None));
            }
        }
    }

    let mut best: Option<(Direction, i32, Option<SinglePrice<'a>>)> = None;
    for candidate in candidates {
        let beats = match &best {
            Some((_, current, _)) => candidate.1.unsigned_abs() > current.unsigned_abs(),
            None => true,
        };
        if beats {
            best = Some(candidate);
        }
    }

    let (direction, odds, single) = best?;
    Some((
        EdgePick {
            direction,
            edge: american_to_prob(odds) - FAIR_PROB,
        },
        single,
    ))
}
