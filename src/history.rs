use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::debug;

use crate::rankings::{BestLinesReport, MODEL_SOURCE, STAT_SOURCE, format_line};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredPick {
    pub slate_date: String,
    pub rank: u32,
    pub source: String,
    pub player: String,
    pub team: String,
    pub line: Option<f64>,
    pub predicted: Option<f64>,
    pub pick: String,
    pub average_odds: Option<String>,
    pub edge: String,
}

pub fn default_db_path() -> PathBuf {
    PathBuf::from("data").join("prop_history.sqlite")
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS picks (
            slate_date TEXT NOT NULL,
            source TEXT NOT NULL,
            rank INTEGER NOT NULL,
            player TEXT NOT NULL,
            team TEXT NOT NULL,
            line REAL NULL,
            predicted REAL NULL,
            pick TEXT NOT NULL,
            average_odds TEXT NULL,
            edge TEXT NOT NULL,
            recorded_at TEXT NOT NULL,
            PRIMARY KEY (slate_date, source, rank)
        );
        CREATE INDEX IF NOT EXISTS idx_picks_player ON picks(player);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Store every published row for `slate_date`. Re-publishing a date replaces
/// its earlier picks.
pub fn record_report(conn: &mut Connection, slate_date: &str, report: &BestLinesReport) -> Result<usize> {
    let tx = conn.transaction().context("begin history transaction")?;
    tx.execute("DELETE FROM picks WHERE slate_date = ?1", params![slate_date])
        .context("clear previous picks")?;

    let mut stored = 0usize;
    for (idx, row) in report.stat.iter().enumerate() {
        insert_pick(
            &tx,
            &StoredPick {
                slate_date: slate_date.to_string(),
                rank: idx as u32 + 1,
                source: STAT_SOURCE.to_string(),
                player: row.player.clone(),
                team: row.team.clone(),
                line: row.lines.first().copied().flatten(),
                predicted: None,
                pick: row.pick.clone(),
                average_odds: row.average_odds.clone(),
                edge: row.edge.clone(),
            },
        )?;
        stored += 1;
    }
    for (idx, row) in report.model.iter().enumerate() {
        insert_pick(
            &tx,
            &StoredPick {
                slate_date: slate_date.to_string(),
                rank: idx as u32 + 1,
                source: MODEL_SOURCE.to_string(),
                player: row.player.clone(),
                team: row.team.clone(),
                line: Some(row.line),
                predicted: Some(row.predicted),
                pick: row.pick.clone(),
                average_odds: row.average_odds.clone(),
                edge: row.edge.clone(),
            },
        )?;
        stored += 1;
    }
    tx.commit().context("commit history transaction")?;
    debug!(slate_date, stored, "recorded published picks");
    Ok(stored)
}

fn insert_pick(tx: &rusqlite::Transaction<'_>, p: &StoredPick) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO picks (
            slate_date, source, rank, player, team,
            line, predicted, pick, average_odds, edge, recorded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            p.slate_date,
            p.source,
            p.rank as i64,
            p.player,
            p.team,
            p.line,
            p.predicted,
            p.pick,
            p.average_odds,
            p.edge,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("insert pick")?;
    Ok(())
}

/// Stat picks first, then model picks, each in published rank order.
pub fn picks_for_date(conn: &Connection, slate_date: &str) -> Result<Vec<StoredPick>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT slate_date, rank, source, player, team,
                   line, predicted, pick, average_odds, edge
            FROM picks
            WHERE slate_date = ?1
            ORDER BY CASE source WHEN ?2 THEN 0 ELSE 1 END, rank ASC
            "#,
        )
        .context("prepare picks query")?;

    let rows = stmt
        .query_map(params![slate_date, STAT_SOURCE], |row| {
            Ok(StoredPick {
                slate_date: row.get(0)?,
                rank: row.get::<_, u32>(1)?,
                source: row.get(2)?,
                player: row.get(3)?,
                team: row.get(4)?,
                line: row.get(5)?,
                predicted: row.get(6)?,
                pick: row.get(7)?,
                average_odds: row.get(8)?,
                edge: row.get(9)?,
            })
        })
        .context("query picks")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode pick row")?);
    }
    Ok(out)
}

impl StoredPick {
    pub fn summary(&self) -> String {
        format!(
            "{} #{} {} {} {} {} ({})",
            self.source,
            self.rank,
            self.player,
            self.pick,
            format_line(self.line),
            self.edge,
            self.average_odds.as_deref().unwrap_or("-"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rankings::{EdgeTableRow, ProjectionTableRow};

    fn report(edge: &str) -> BestLinesReport {
        BestLinesReport {
            line_sources: vec!["PP".into(), "UD".into()],
            stat: vec![EdgeTableRow {
                player: "Hunter Brown".into(),
                team: "HOU".into(),
                lines: vec![Some(6.5), Some(6.5)],
                pick: "OVER".into(),
                average_odds: Some("-125".into()),
                edge: edge.into(),
            }],
            model: vec![ProjectionTableRow {
                player: "Hunter Brown".into(),
                team: "HOU".into(),
                line: 6.5,
                predicted: 7.1,
                pick: "OVER".into(),
                average_odds: Some("-125".into()),
                edge: "0.60".into(),
            }],
        }
    }

    #[test]
    fn records_and_reads_back_in_rank_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = open_db(&dir.path().join("history.sqlite")).unwrap();
        assert_eq!(record_report(&mut conn, "2025-06-01", &report("5.6%")).unwrap(), 2);

        let picks = picks_for_date(&conn, "2025-06-01").unwrap();
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].source, STAT_SOURCE);
        assert_eq!(picks[0].line, Some(6.5));
        assert_eq!(picks[0].predicted, None);
        assert_eq!(picks[1].source, MODEL_SOURCE);
        assert_eq!(picks[1].predicted, Some(7.1));
        assert!(picks_for_date(&conn, "2025-06-02").unwrap().is_empty());
    }

    #[test]
    fn republishing_a_date_replaces_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = open_db(&dir.path().join("history.sqlite")).unwrap();
        record_report(&mut conn, "2025-06-01", &report("5.6%")).unwrap();
        record_report(&mut conn, "2025-06-01", &report("7.0%")).unwrap();
        let picks = picks_for_date(&conn, "2025-06-01").unwrap();
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].edge, "7.0%");
    }
}
