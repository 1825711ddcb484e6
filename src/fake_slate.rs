//! Synthetic slates for demo runs and benchmarks.

use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::identity::KeyScheme;
use crate::merge::SourceTable;
use crate::projection::ProjectionFeed;
use crate::slate::{PlayerPropRecord, Prices, ProjectionRecord, SourceId};

const FIRST_NAMES: &[&str] = &[
    "Jacob", "Logan", "Zack", "Tyler", "Shane", "Framber", "Yoshinobu", "Germán", "Corbin",
    "Hunter", "Kevin", "Luis", "Pablo", "Dylan", "Tarik", "Spencer",
];
const LAST_NAMES: &[&str] = &[
    "Webb", "Gallen", "Wheeler", "Glasnow", "Bieber", "Valdez", "Yamamoto", "Márquez", "Burnes",
    "Brown", "Gausman", "Castillo", "López", "Cease", "Skubal", "Strider",
];
const TEAMS: &[&str] = &[
    "ARI", "ATL", "BAL", "BOS", "CHC", "CLE", "COL", "DET", "HOU", "LAD", "NYY", "SD", "SEA",
    "SF", "TOR",
];

#[derive(Debug, Clone)]
pub struct FakeSlate {
    pub primary: SourceTable,
    pub secondaries: Vec<SourceTable>,
    pub projections: Vec<ProjectionRecord>,
}

impl FakeSlate {
    pub fn projection_feed(&self, scheme: KeyScheme) -> ProjectionFeed {
        ProjectionFeed::new(&self.projections, scheme)
    }
}

/// Deterministic slate for a given seed.
pub fn seeded_slate(seed: u64, pitchers: usize) -> FakeSlate {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_slate(&mut rng, pitchers)
}

/// PrizePicks lines with DraftKings and Underdog quotes around them. Books
/// sometimes skip a pitcher, hang a different line, list a pitcher twice or
/// spell the name differently, the way real feeds do.
pub fn generate_slate(rng: &mut impl Rng, pitchers: usize) -> FakeSlate {
    let mut pp = Vec::with_capacity(pitchers);
    let mut dk = Vec::with_capacity(pitchers);
    let mut ud = Vec::with_capacity(pitchers);
    let mut projections = Vec::with_capacity(pitchers);

    for idx in 0..pitchers {
        let name = pitcher_name(idx);
        let team = TEAMS[rng.gen_range(0..TEAMS.len())];
        let line = f64::from(rng.gen_range(3_u8..9)) + 0.5;

        pp.push(PlayerPropRecord {
            source: SourceId::prizepicks(),
            player: format!("{name} ({team})"),
            team: Some(team.to_string()),
            stat_type: Some("Pitcher Strikeouts".to_string()),
            line: Some(line),
            prices: Prices::LineOnly,
        });

        if rng.gen_bool(0.85) {
            let listings = if rng.gen_bool(0.2) { 2 } else { 1 };
            for _ in 0..listings {
                dk.push(PlayerPropRecord {
                    source: SourceId::draftkings(),
                    player: book_spelling(&name, rng),
                    team: None,
                    stat_type: None,
                    line: Some(shifted(line, rng)),
                    prices: Prices::Single {
                        odds: Some(random_odds(rng)),
                        label: Some(if rng.gen_bool(0.5) { "Over" } else { "Under" }.to_string()),
                    },
                });
            }
        }

        if rng.gen_bool(0.75) {
            ud.push(PlayerPropRecord {
                source: SourceId::underdog(),
                player: book_spelling(&name, rng),
                team: None,
                stat_type: None,
                line: Some(shifted(line, rng)),
                prices: Prices::TwoSided {
                    over: Some(random_odds(rng)),
                    under: Some(random_odds(rng)),
                },
            });
        }

        if rng.gen_bool(0.9) {
            projections.push(ProjectionRecord {
                player: name.clone(),
                predicted: (line + rng.gen_range(-2.0..2.0)).max(0.0),
            });
        }
    }

    FakeSlate {
        primary: SourceTable::new(SourceId::prizepicks(), pp),
        secondaries: vec![
            SourceTable::new(SourceId::draftkings(), dk),
            SourceTable::new(SourceId::underdog(), ud),
        ],
        projections,
    }
}

fn pitcher_name(idx: usize) -> String {
    let first = FIRST_NAMES[idx % FIRST_NAMES.len()];
    let last = LAST_NAMES[(idx / FIRST_NAMES.len() + idx) % LAST_NAMES.len()];
    let round = idx / (FIRST_NAMES.len() * LAST_NAMES.len());
    if round == 0 {
        format!("{first} {last}")
    } else {
        let initial = char::from(b'A' + (round % 26) as u8);
        format!("{first} {initial}. {last}")
    }
}

fn book_spelling(name: &str, rng: &mut impl Rng) -> String {
    match rng.gen_range(0..4) {
        0 => name.to_uppercase(),
        1 => format!("  {name} "),
        _ => name.to_string(),
    }
}

fn shifted(line: f64, rng: &mut impl Rng) -> f64 {
    match rng.gen_range(0..10) {
        0 => line + 1.0,
        1 => line - 1.0,
        _ => line,
    }
}

fn random_odds(rng: &mut impl Rng) -> String {
    if rng.gen_bool(0.6) {
        format!("-{}", rng.gen_range(100..=220))
    } else {
        format!("+{}", rng.gen_range(100..=180))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odds::parse_american;

    #[test]
    fn seeded_slates_are_reproducible() {
        let a = seeded_slate(7, 40);
        let b = seeded_slate(7, 40);
        assert_eq!(a.primary, b.primary);
        assert_eq!(a.secondaries, b.secondaries);
        assert_eq!(a.primary.records.len(), 40);
    }

    #[test]
    fn projection_feed_follows_key_scheme() {
        let slate = seeded_slate(5, 200);
        let record = slate
            .projections
            .iter()
            .find(|p| p.player.starts_with("Jacob "))
            .expect("a Jacob among 200 pitchers");
        let nickname = record.player.replacen("Jacob", "Jacoby", 1);

        let short = slate.projection_feed(KeyScheme::ShortKey);
        assert_eq!(short.get(&nickname), Some(record.predicted));
        let full = slate.projection_feed(KeyScheme::FullName);
        assert_eq!(full.get(&nickname), None);
    }

    #[test]
    fn generated_prices_parse() {
        let slate = seeded_slate(11, 60);
        for table in &slate.secondaries {
            for record in &table.records {
                match &record.prices {
                    Prices::Single { odds, .. } => {
                        assert!(odds.as_deref().and_then(parse_american).is_some())
                    }
                    Prices::TwoSided { over, under } => {
                        assert!(over.as_deref().and_then(parse_american).is_some());
                        assert!(under.as_deref().and_then(parse_american).is_some());
                    }
                    Prices::LineOnly => panic!("book quote without prices"),
                }
            }
        }
    }
}
