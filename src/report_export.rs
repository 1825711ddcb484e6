use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::ingest::{SlateLayout, write_slate};
use crate::rankings::{BestLinesReport, format_line};
use crate::slate::MergedSlate;

/// `<dir>/best_lines_<date>.csv`
pub fn best_lines_path(dir: &Path, date: &str) -> PathBuf {
    dir.join(format!("best_lines_{date}.csv"))
}

/// `<dir>/mlb_pitcher_slate_<date>.csv`
pub fn slate_path(dir: &Path, date: &str) -> PathBuf {
    dir.join(format!("mlb_pitcher_slate_{date}.csv"))
}

/// Header, stat rows, separator, model rows; the same layout the terminal shows.
pub fn write_report_csv<W: Write>(writer: W, report: &BestLinesReport) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(report.header())
        .context("write report header")?;
    for row in report.rows() {
        out.write_record(&row).context("write report row")?;
    }
    out.flush().context("flush report csv")?;
    Ok(())
}

pub fn save_report_csv(path: &Path, report: &BestLinesReport) -> Result<()> {
    let file = create(path)?;
    write_report_csv(file, report).with_context(|| format!("write {}", path.display()))
}

pub fn save_slate_csv(path: &Path, slate: &MergedSlate, layout: &SlateLayout) -> Result<()> {
    let file = create(path)?;
    write_slate(file, slate, layout).with_context(|| format!("write {}", path.display()))
}

/// One sheet per ranked table.
pub fn export_report_xlsx(path: &Path, report: &BestLinesReport) -> Result<()> {
    let mut stat_rows = vec![stat_header(report)];
    for row in &report.stat {
        let mut cells = vec![row.player.clone(), row.team.clone()];
        cells.extend(row.lines.iter().map(|line| format_line(*line)));
        cells.push(row.pick.clone());
        cells.push(row.average_odds.clone().unwrap_or_default());
        cells.push(row.edge.clone());
        stat_rows.push(cells);
    }

    let mut model_rows = vec![vec![
        "Player".to_string(),
        "Team".to_string(),
        "Line".to_string(),
        "Predicted".to_string(),
        "Pick".to_string(),
        "Average Odds".to_string(),
        "Edge".to_string(),
    ]];
    for row in &report.model {
        model_rows.push(vec![
            row.player.clone(),
            row.team.clone(),
            format_line(Some(row.line)),
            format!("{:.2}", row.predicted),
            row.pick.clone(),
            row.average_odds.clone().unwrap_or_default(),
            row.edge.clone(),
        ]);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Stat")?;
        write_rows(sheet, &stat_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Model")?;
        write_rows(sheet, &model_rows)?;
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn stat_header(report: &BestLinesReport) -> Vec<String> {
    let mut out = vec!["Player".to_string(), "Team".to_string()];
    out.extend(report.line_sources.iter().map(|s| format!("Line ({s})")));
    out.extend(["Pick", "Average Odds", "Edge"].iter().map(|s| s.to_string()));
    out
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("create {}", path.display()))
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rankings::{EdgeTableRow, MODEL_SECTION_SEPARATOR, ProjectionTableRow};

    fn report() -> BestLinesReport {
        BestLinesReport {
            line_sources: vec!["PP".into(), "DK".into()],
            stat: vec![EdgeTableRow {
                player: "Logan Webb".into(),
                team: "SF".into(),
                lines: vec![Some(6.5), None],
                pick: "UNDER".into(),
                average_odds: Some("-118".into()),
                edge: "4.1%".into(),
            }],
            model: vec![ProjectionTableRow {
                player: "Logan Webb".into(),
                team: "SF".into(),
                line: 6.5,
                predicted: 5.9,
                pick: "UNDER".into(),
                average_odds: None,
                edge: "-0.60".into(),
            }],
        }
    }

    #[test]
    fn csv_keeps_sections_apart() {
        let mut buf = Vec::new();
        write_report_csv(&mut buf, &report()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Player,Team,Line (PP),Line (DK),Predicted,Pick,Average Odds,Edge,Source"
        );
        assert_eq!(lines[1], "Logan Webb,SF,6.5,,,UNDER,-118,4.1%,Stat");
        assert!(lines[2].starts_with(MODEL_SECTION_SEPARATOR));
        assert_eq!(lines[3], "Logan Webb,SF,6.5,,5.90,UNDER,,-0.60,Model");
    }

    #[test]
    fn xlsx_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("best_lines.xlsx");
        export_report_xlsx(&path, &report()).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn dated_paths() {
        let path = best_lines_path(Path::new("best_lines"), "2025-07-04");
        assert_eq!(path, Path::new("best_lines/best_lines_2025-07-04.csv"));
    }
}
