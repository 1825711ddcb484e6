//! CSV source tables. Cells may be blank or garbage (treated as missing);
//! a required column that is absent from the header is a [`SchemaError`].

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SchemaError;
use crate::merge::SourceTable;
use crate::projection::GameLogRow;
use crate::slate::{MergedSlate, PlayerPropRecord, Prices, ProjectionRecord, SourceId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PriceColumns {
    LineOnly,
    Single { odds: String, label: Option<String> },
    TwoSided { over: String, under: String },
}

/// Column names for one source's table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    pub source: SourceId,
    pub player: String,
    pub team: Option<String>,
    pub stat_type: Option<String>,
    pub line: String,
    pub prices: PriceColumns,
}

impl TableLayout {
    pub fn prizepicks() -> Self {
        Self {
            source: SourceId::prizepicks(),
            player: "player".into(),
            team: Some("team".into()),
            stat_type: Some("stat_type".into()),
            line: "prizepicks_line".into(),
            prices: PriceColumns::LineOnly,
        }
    }

    pub fn draftkings() -> Self {
        Self {
            source: SourceId::draftkings(),
            player: "player".into(),
            team: None,
            stat_type: None,
            line: "dk_line".into(),
            prices: PriceColumns::Single {
                odds: "dk_odds".into(),
                label: Some("dk_label".into()),
            },
        }
    }

    pub fn underdog() -> Self {
        Self {
            source: SourceId::underdog(),
            player: "player".into(),
            team: None,
            stat_type: None,
            line: "line".into(),
            prices: PriceColumns::TwoSided {
                over: "over_odds".into(),
                under: "under_odds".into(),
            },
        }
    }

    fn required_columns(&self) -> Vec<&str> {
        let mut out = vec![self.player.as_str()];
        out.extend(self.team.as_deref());
        out.extend(self.stat_type.as_deref());
        out.push(self.line.as_str());
        match &self.prices {
            PriceColumns::LineOnly => {}
            PriceColumns::Single { odds, label } => {
                out.push(odds);
                out.extend(label.as_deref());
            }
            PriceColumns::TwoSided { over, under } => {
                out.push(over);
                out.push(under);
            }
        }
        out
    }
}

/// Column layout of a merged slate file: one primary table plus the
/// secondary sources flattened next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlateLayout {
    pub primary: TableLayout,
    pub secondaries: Vec<TableLayout>,
}

impl Default for SlateLayout {
    /// The PrizePicks / DraftKings / Underdog slate.
    fn default() -> Self {
        let primary = TableLayout {
            player: "player_pp".into(),
            ..TableLayout::prizepicks()
        };
        let draftkings = TableLayout {
            player: primary.player.clone(),
            ..TableLayout::draftkings()
        };
        let underdog = TableLayout {
            player: primary.player.clone(),
            line: "line_ud".into(),
            prices: PriceColumns::TwoSided {
                over: "over_odds_ud".into(),
                under: "under_odds_ud".into(),
            },
            ..TableLayout::underdog()
        };
        Self {
            primary,
            secondaries: vec![draftkings, underdog],
        }
    }
}

pub fn load_table(path: &Path, layout: &TableLayout) -> Result<SourceTable, SchemaError> {
    let file = open(path)?;
    read_table(file, layout, &path.display().to_string())
}

pub fn read_table<R: Read>(
    reader: R,
    layout: &TableLayout,
    table: &str,
) -> Result<SourceTable, SchemaError> {
    let (header, rows) = read_all(reader, table)?;
    let columns = LayoutColumns::resolve(layout, &header, table)?;
    let records: Vec<PlayerPropRecord> = rows
        .iter()
        .filter_map(|row| columns.record(layout, row))
        .collect();
    debug!(table, source = %layout.source, records = records.len(), "loaded source table");
    Ok(SourceTable::new(layout.source.clone(), records))
}

pub fn load_slate(
    path: &Path,
    layout: &SlateLayout,
) -> Result<(SourceTable, Vec<SourceTable>), SchemaError> {
    let file = open(path)?;
    read_slate(file, layout, &path.display().to_string())
}

/// Split a merged slate file back into its source tables. Secondary cells
/// left blank by an unmatched join produce no record.
pub fn read_slate<R: Read>(
    reader: R,
    layout: &SlateLayout,
    table: &str,
) -> Result<(SourceTable, Vec<SourceTable>), SchemaError> {
    let (header, rows) = read_all(reader, table)?;

    let primary_cols = LayoutColumns::resolve(&layout.primary, &header, table)?;
    let primary = SourceTable::new(
        layout.primary.source.clone(),
        rows.iter()
            .filter_map(|row| primary_cols.record(&layout.primary, row))
            .collect(),
    );

    let mut secondaries = Vec::with_capacity(layout.secondaries.len());
    for secondary in &layout.secondaries {
        let cols = LayoutColumns::resolve(secondary, &header, table)?;
        let records = rows
            .iter()
            .filter_map(|row| cols.record(secondary, row))
            .filter(|r| r.line.is_some() || has_raw_price(&r.prices))
            .collect();
        secondaries.push(SourceTable::new(secondary.source.clone(), records));
    }
    Ok((primary, secondaries))
}

/// Write a merged slate in `layout`'s columns, one row per merged player.
pub fn write_slate<W: Write>(
    writer: W,
    slate: &MergedSlate,
    layout: &SlateLayout,
) -> Result<(), SchemaError> {
    let table = "merged slate";
    let csv_err = |source| SchemaError::Csv {
        table: table.to_string(),
        source,
    };
    let mut out = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = layout.primary.required_columns();
    for secondary in &layout.secondaries {
        header.extend(
            secondary
                .required_columns()
                .into_iter()
                .filter(|c| *c != secondary.player),
        );
    }
    out.write_record(&header).map_err(csv_err)?;

    for row in &slate.rows {
        let mut cells = record_cells(&layout.primary, &row.primary, true);
        for (idx, secondary) in layout.secondaries.iter().enumerate() {
            let quote = row.quotes.get(idx).and_then(|q| q.as_ref());
            match quote {
                Some(q) => cells.extend(record_cells(secondary, &q.record, false)),
                None => cells.extend(
                    std::iter::repeat_n(String::new(), secondary.required_columns().len() - 1),
                ),
            }
        }
        out.write_record(&cells).map_err(csv_err)?;
    }
    out.flush().map_err(|source| SchemaError::Io {
        path: table.into(),
        source,
    })?;
    Ok(())
}

/// Projection feed with `player` and `predicted` columns (names configurable).
pub fn read_projections<R: Read>(
    reader: R,
    player_col: &str,
    predicted_col: &str,
    table: &str,
) -> Result<Vec<ProjectionRecord>, SchemaError> {
    let (header, rows) = read_all(reader, table)?;
    let player = column(&header, player_col, table)?;
    let predicted = column(&header, predicted_col, table)?;
    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(name) = cell(row, player) else {
            continue;
        };
        match cell(row, predicted).and_then(parse_finite) {
            Some(value) => out.push(ProjectionRecord {
                player: name.to_string(),
                predicted: value,
            }),
            None => warn!(table, player = name, "skipping projection without a numeric value"),
        }
    }
    Ok(out)
}

pub fn load_projections(
    path: &Path,
    player_col: &str,
    predicted_col: &str,
) -> Result<Vec<ProjectionRecord>, SchemaError> {
    let file = open(path)?;
    read_projections(file, player_col, predicted_col, &path.display().to_string())
}

/// Game logs with `Name`, `GS`, `G` and `SO` columns.
pub fn read_game_logs<R: Read>(reader: R, table: &str) -> Result<Vec<GameLogRow>, SchemaError> {
    let (header, rows) = read_all(reader, table)?;
    let name = column(&header, "Name", table)?;
    let gs = column(&header, "GS", table)?;
    let g = column(&header, "G", table)?;
    let so = column(&header, "SO", table)?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            Some(GameLogRow {
                name: cell(row, name)?.to_string(),
                games_started: count(row, gs)?,
                games: count(row, g)?,
                strikeouts: count(row, so)?,
            })
        })
        .collect())
}

pub fn load_game_logs(path: &Path) -> Result<Vec<GameLogRow>, SchemaError> {
    let file = open(path)?;
    read_game_logs(file, &path.display().to_string())
}

struct LayoutColumns {
    player: usize,
    team: Option<usize>,
    stat_type: Option<usize>,
    line: usize,
    prices: ResolvedPrices,
}

enum ResolvedPrices {
    LineOnly,
    Single { odds: usize, label: Option<usize> },
    TwoSided { over: usize, under: usize },
}

impl LayoutColumns {
    fn resolve(layout: &TableLayout, header: &StringRecord, table: &str) -> Result<Self, SchemaError> {
        let opt = |name: &Option<String>| -> Result<Option<usize>, SchemaError> {
            name.as_deref().map(|n| column(header, n, table)).transpose()
        };
        let prices = match &layout.prices {
            PriceColumns::LineOnly => ResolvedPrices::LineOnly,
            PriceColumns::Single { odds, label } => ResolvedPrices::Single {
                odds: column(header, odds, table)?,
                label: opt(label)?,
            },
            PriceColumns::TwoSided { over, under } => ResolvedPrices::TwoSided {
                over: column(header, over, table)?,
                under: column(header, under, table)?,
            },
        };
        Ok(Self {
            player: column(header, &layout.player, table)?,
            team: opt(&layout.team)?,
            stat_type: opt(&layout.stat_type)?,
            line: column(header, &layout.line, table)?,
            prices,
        })
    }

    fn record(&self, layout: &TableLayout, row: &StringRecord) -> Option<PlayerPropRecord> {
        let player = cell(row, self.player)?;
        let owned = |idx: Option<usize>| idx.and_then(|i| cell(row, i)).map(str::to_string);
        let prices = match self.prices {
            ResolvedPrices::LineOnly => Prices::LineOnly,
            ResolvedPrices::Single { odds, label } => Prices::Single {
                odds: owned(Some(odds)),
                label: owned(label),
            },
            ResolvedPrices::TwoSided { over, under } => Prices::TwoSided {
                over: owned(Some(over)),
                under: owned(Some(under)),
            },
        };
        Some(PlayerPropRecord {
            source: layout.source.clone(),
            player: player.to_string(),
            team: owned(self.team),
            stat_type: owned(self.stat_type),
            line: cell(row, self.line).and_then(parse_finite),
            prices,
        })
    }
}

fn record_cells(layout: &TableLayout, record: &PlayerPropRecord, with_player: bool) -> Vec<String> {
    let mut cells = Vec::new();
    if with_player {
        cells.push(record.player.clone());
    }
    if layout.team.is_some() {
        cells.push(record.team.clone().unwrap_or_default());
    }
    if layout.stat_type.is_some() {
        cells.push(record.stat_type.clone().unwrap_or_default());
    }
    cells.push(record.line.map(|v| v.to_string()).unwrap_or_default());
    match (&layout.prices, &record.prices) {
        (PriceColumns::LineOnly, _) => {}
        (PriceColumns::Single { label, .. }, Prices::Single { odds, label: value }) => {
            cells.push(odds.clone().unwrap_or_default());
            if label.is_some() {
                cells.push(value.clone().unwrap_or_default());
            }
        }
        (PriceColumns::TwoSided { .. }, Prices::TwoSided { over, under }) => {
            cells.push(over.clone().unwrap_or_default());
            cells.push(under.clone().unwrap_or_default());
        }
        (PriceColumns::Single { label, .. }, _) => {
            cells.push(String::new());
            if label.is_some() {
                cells.push(String::new());
            }
        }
        (PriceColumns::TwoSided { .. }, _) => {
            cells.push(String::new());
            cells.push(String::new());
        }
    }
    cells
}

fn has_raw_price(prices: &Prices) -> bool {
    match prices {
        Prices::LineOnly => false,
        Prices::Single { odds, .. } => odds.is_some(),
        Prices::TwoSided { over, under } => over.is_some() || under.is_some(),
    }
}

fn open(path: &Path) -> Result<File, SchemaError> {
    File::open(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_all<R: Read>(reader: R, table: &str) -> Result<(StringRecord, Vec<StringRecord>), SchemaError> {
    let csv_err = |source| SchemaError::Csv {
        table: table.to_string(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let header = rdr.headers().map_err(csv_err)?.clone();
    let rows = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_err)?;
    Ok((header, rows))
}

fn column(header: &StringRecord, name: &str, table: &str) -> Result<usize, SchemaError> {
    header
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        .ok_or_else(|| SchemaError::MissingColumn {
            table: table.to_string(),
            column: name.to_string(),
        })
}

fn cell(row: &StringRecord, idx: usize) -> Option<&str> {
    row.get(idx).map(str::trim).filter(|v| !v.is_empty())
}

/// `f64::from_str` accepts "NaN" and "inf"; those are garbage here too.
fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Counting stats sometimes arrive as floats ("3.0").
fn count(row: &StringRecord, idx: usize) -> Option<u32> {
    let value = cell(row, idx)?.parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then(|| value.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_column_is_schema_error() {
        let csv = "player,team,stat_type\nGerrit Cole,NYY,Pitcher Strikeouts\n";
        let err = read_table(csv.as_bytes(), &TableLayout::prizepicks(), "pp").unwrap_err();
        match err {
            SchemaError::MissingColumn { table, column } => {
                assert_eq!(table, "pp");
                assert_eq!(column, "prizepicks_line");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_and_garbage_cells_are_missing_values() {
        let csv = "player,dk_line,dk_odds,dk_label\n\
                   Chris Sale,7.5,\u{2212}125,Over\n\
                   Logan Webb,n/a,,Under\n\
                   ,6.5,-110,Over\n";
        let table = read_table(csv.as_bytes(), &TableLayout::draftkings(), "dk").unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].line, Some(7.5));
        assert_eq!(table.records[0].prices.single_odds(), Some("\u{2212}125"));
        assert_eq!(table.records[1].line, None);
        assert_eq!(table.records[1].prices.single_odds(), None);
    }

    #[test]
    fn non_finite_numbers_read_as_missing() {
        let csv = "player,team,stat_type,prizepicks_line\n\
                   A Pitcher,SEA,Pitcher Strikeouts,NaN\n\
                   B Pitcher,SEA,Pitcher Strikeouts,inf\n\
                   C Pitcher,SEA,Pitcher Strikeouts,-Infinity\n\
                   D Pitcher,SEA,Pitcher Strikeouts,5.5\n";
        let table = read_table(csv.as_bytes(), &TableLayout::prizepicks(), "pp").unwrap();
        let lines: Vec<Option<f64>> = table.records.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![None, None, None, Some(5.5)]);

        let csv = "player,predicted\nA Pitcher,nan\nB Pitcher,6.1\nC Pitcher,infinity\n";
        let rows = read_projections(csv.as_bytes(), "player", "predicted", "preds").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player, "B Pitcher");
    }

    #[test]
    fn game_logs_accept_float_counts() {
        let csv = "Name,GS,G,SO,ERA\nZack Wheeler,5.0,5,38,2.10\nBad Row,x,1,2,0\n";
        let logs = read_game_logs(csv.as_bytes(), "logs").unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].games_started, 5);
        assert_eq!(logs[0].strikeouts, 38);
    }

    #[test]
    fn projections_skip_non_numeric() {
        let csv = "player_pp,predicted_ks\nA Pitcher,6.2\nB Pitcher,\n";
        let rows = read_projections(csv.as_bytes(), "player_pp", "predicted_ks", "preds").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].predicted, 6.2);
    }
}
