use tracing::info;

use crate::config::EngineConfig;
use crate::edge::score_rows;
use crate::merge::{SourceTable, merge};
use crate::projection::{ProjectionFeed, ProjectionPick, blend_rows};
use crate::rankings::BestLinesReport;
use crate::slate::MergedSlate;

/// Everything one run produces: the scored slate, the projection picks and
/// the ranked report built from both.
#[derive(Debug, Clone)]
pub struct Published {
    pub slate: MergedSlate,
    pub picks: Vec<ProjectionPick>,
    pub report: BestLinesReport,
}

/// Merge, score, blend and rank. A missing feed still yields model picks,
/// each with zero edge.
pub fn publish(
    primary: &SourceTable,
    secondaries: &[SourceTable],
    feed: Option<&ProjectionFeed>,
    cfg: &EngineConfig,
) -> Published {
    let mut slate = merge(primary, secondaries, cfg);
    score_rows(&mut slate.rows, cfg);

    let empty = ProjectionFeed::default();
    let picks = blend_rows(&slate.rows, feed.unwrap_or(&empty));
    let report = BestLinesReport::build(&slate, &picks, cfg);

    let scored = slate.rows.iter().filter(|r| r.edge.pick.is_some()).count();
    info!(
        rows = slate.rows.len(),
        scored,
        model_picks = picks.len(),
        "published best lines"
    );

    Published {
        slate,
        picks,
        report,
    }
}
