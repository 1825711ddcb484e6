use serde::Serialize;

use crate::config::EngineConfig;
use crate::odds::format_american;
use crate::projection::ProjectionPick;
use crate::slate::{MergedPlayerRow, MergedSlate};

pub const MODEL_SECTION_SEPARATOR: &str = "─── MODEL PICKS ───";
pub const STAT_SOURCE: &str = "Stat";
pub const MODEL_SOURCE: &str = "Model";

/// Rows with a pick, best edge first. Equal edges keep input order.
pub fn rank_edges(rows: &[MergedPlayerRow], top_n: usize) -> Vec<&MergedPlayerRow> {
    let mut ranked: Vec<(&MergedPlayerRow, f64)> = rows
        .iter()
        .filter_map(|row| row.edge.edge().map(|edge| (row, edge)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().take(top_n).map(|(row, _)| row).collect()
}

/// Projection picks by signed edge, so the biggest OVER gaps lead and large
/// UNDER gaps sink to the bottom.
pub fn rank_projections(picks: &[ProjectionPick], top_n: usize) -> Vec<&ProjectionPick> {
    let mut ranked: Vec<&ProjectionPick> = picks.iter().collect();
    ranked.sort_by(|a, b| b.edge.total_cmp(&a.edge));
    ranked.truncate(top_n);
    ranked
}

pub fn format_edge_pct(edge: f64) -> String {
    format!("{:.1}%", edge * 100.0)
}

pub fn format_line(line: Option<f64>) -> String {
    line.map(|v| format!("{v:.1}")).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeTableRow {
    pub player: String,
    pub team: String,
    /// Primary line first, then one per secondary source.
    pub lines: Vec<Option<f64>>,
    pub pick: String,
    pub average_odds: Option<String>,
    pub edge: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionTableRow {
    pub player: String,
    pub team: String,
    pub line: f64,
    pub predicted: f64,
    pub pick: String,
    pub average_odds: Option<String>,
    pub edge: String,
}

/// The published output: odds-based picks, a separator, then model picks.
/// The two sections are ranked independently and never interleaved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestLinesReport {
    pub line_sources: Vec<String>,
    pub stat: Vec<EdgeTableRow>,
    pub model: Vec<ProjectionTableRow>,
}

impl BestLinesReport {
    /// `slate` rows must already carry their edge results.
    pub fn build(slate: &MergedSlate, picks: &[ProjectionPick], cfg: &EngineConfig) -> Self {
        let line_sources = std::iter::once(&slate.primary_source)
            .chain(slate.secondary_sources.iter())
            .map(|s| s.to_string())
            .collect();

        let stat = rank_edges(&slate.rows, cfg.top_n)
            .into_iter()
            .map(edge_table_row)
            .collect();
        let model = rank_projections(picks, cfg.projection_top_n)
            .into_iter()
            .map(projection_table_row)
            .collect();

        Self {
            line_sources,
            stat,
            model,
        }
    }

    pub fn header(&self) -> Vec<String> {
        let mut out = vec!["Player".to_string(), "Team".to_string()];
        out.extend(self.line_sources.iter().map(|s| format!("Line ({s})")));
        out.extend(
            ["Predicted", "Pick", "Average Odds", "Edge", "Source"]
                .iter()
                .map(|s| s.to_string()),
        );
        out
    }

    /// Body rows in output order, separator included.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let width = self.header().len();
        let mut out = Vec::with_capacity(self.stat.len() + self.model.len() + 1);

        for row in &self.stat {
            let mut cells = vec![row.player.clone(), row.team.clone()];
            for idx in 0..self.line_sources.len() {
                cells.push(format_line(row.lines.get(idx).copied().flatten()));
            }
            cells.push(String::new());
            cells.push(row.pick.clone());
            cells.push(row.average_odds.clone().unwrap_or_default());
            cells.push(row.edge.clone());
            cells.push(STAT_SOURCE.to_string());
            out.push(cells);
        }

        let mut separator = vec![String::new(); width];
        separator[0] = MODEL_SECTION_SEPARATOR.to_string();
        out.push(separator);

        for row in &self.model {
            let mut cells = vec![row.player.clone(), row.team.clone()];
            cells.push(format_line(Some(row.line)));
            cells.extend((1..self.line_sources.len()).map(|_| String::new()));
            cells.push(format!("{:.2}", row.predicted));
            cells.push(row.pick.clone());
            cells.push(row.average_odds.clone().unwrap_or_default());
            cells.push(row.edge.clone());
            cells.push(MODEL_SOURCE.to_string());
            out.push(cells);
        }

        out
    }

    /// Fixed-width text rendering for the terminal.
    pub fn render_text(&self) -> String {
        let header = self.header();
        let rows = self.rows();
        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (idx, cell) in row.iter().enumerate() {
                // The separator spans the table; it should not widen column 0.
                if cell == MODEL_SECTION_SEPARATOR {
                    continue;
                }
                widths[idx] = widths[idx].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &header, &widths);
        let rule: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(rule));
        out.push('\n');
        for row in &rows {
            if row.first().is_some_and(|c| c == MODEL_SECTION_SEPARATOR) {
                out.push_str(MODEL_SECTION_SEPARATOR);
                out.push('\n');
                continue;
            }
            push_line(&mut out, row, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{cell:<w$}", w = *w))
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

fn edge_table_row(row: &MergedPlayerRow) -> EdgeTableRow {
    let lines = std::iter::once(row.primary.line)
        .chain(row.quotes.iter().map(|q| q.as_ref().and_then(|q| q.record.line)))
        .collect();
    EdgeTableRow {
        player: row.primary.player.clone(),
        team: row.primary.team.clone().unwrap_or_default(),
        lines,
        pick: row
            .edge
            .direction()
            .map(|d| d.to_string())
            .unwrap_or_default(),
        average_odds: row.edge.avg_odds.map(format_american),
        edge: row.edge.edge().map(format_edge_pct).unwrap_or_default(),
    }
}

fn projection_table_row(pick: &ProjectionPick) -> ProjectionTableRow {
    ProjectionTableRow {
        player: pick.player.clone(),
        team: pick.team.clone().unwrap_or_default(),
        line: pick.line,
        predicted: pick.predicted,
        pick: pick.direction.to_string(),
        average_odds: pick.avg_odds.map(format_american),
        edge: format!("{:.2}", pick.edge),
    }
}
