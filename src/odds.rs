//! American-odds parsing and implied probabilities.
//!
//! Every function here is total: malformed input yields `None`, which the
//! rest of the engine treats as "no signal".

const UNICODE_MINUS: char = '\u{2212}';

/// Parse a signed American-odds value as scraped, e.g. `"-110"`, `"+105"`,
/// `"−125"` (unicode minus) or `" 150 "`.
pub fn parse_american(raw: &str) -> Option<i32> {
    let cleaned = raw.trim().replace(UNICODE_MINUS, "-");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<i32>().ok()
}

/// Implied win probability of a price, ignoring the book's margin.
///
/// `0` is not a meaningful American price; it falls through to the
/// non-positive branch and yields `0.0`.
pub fn american_to_prob(odds: i32) -> f64 {
    if odds > 0 {
        100.0 / (f64::from(odds) + 100.0)
    } else {
        let abs = f64::from(odds).abs();
        abs / (abs + 100.0)
    }
}

pub fn odds_to_prob(raw: Option<&str>) -> Option<f64> {
    raw.and_then(parse_american).map(american_to_prob)
}

/// Representative price of two quotes. Unparseable inputs are ignored; the
/// mean is rounded half-to-even.
pub fn average_odds(a: Option<&str>, b: Option<&str>) -> Option<i32> {
    let vals: Vec<i32> = [a, b]
        .into_iter()
        .flatten()
        .filter_map(parse_american)
        .collect();
    if vals.is_empty() {
        return None;
    }
    let sum: f64 = vals.iter().map(|v| f64::from(*v)).sum();
    Some((sum / vals.len() as f64).round_ties_even() as i32)
}

pub fn format_american(odds: i32) -> String {
    format!("{odds:+}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn implied_probability_both_signs() {
        assert!(close(odds_to_prob(Some("+150")).unwrap(), 0.4));
        assert!(close(odds_to_prob(Some("150")).unwrap(), 0.4));
        assert!(close(odds_to_prob(Some("-150")).unwrap(), 0.6));
        assert!(close(odds_to_prob(Some("\u{2212}150")).unwrap(), 0.6));
        assert!(close(american_to_prob(100), 0.5));
        assert!(close(american_to_prob(-100), 0.5));
    }

    #[test]
    fn zero_odds_boundary_is_preserved() {
        assert_eq!(odds_to_prob(Some("0")), Some(0.0));
    }

    #[test]
    fn garbage_is_no_signal() {
        assert_eq!(odds_to_prob(Some("abc")), None);
        assert_eq!(odds_to_prob(Some("")), None);
        assert_eq!(odds_to_prob(Some("-11O")), None);
        assert_eq!(odds_to_prob(None), None);
    }

    #[test]
    fn average_of_two_one_or_none() {
        assert_eq!(average_odds(Some("-110"), Some("-120")), Some(-115));
        assert_eq!(average_odds(None, Some("-120")), Some(-120));
        assert_eq!(average_odds(Some("x"), Some("+105")), Some(105));
        assert_eq!(average_odds(None, None), None);
        assert_eq!(average_odds(Some("n/a"), Some("")), None);
    }

    #[test]
    fn average_rounds_half_to_even() {
        // -110 and +105 → -2.5 → -2
        assert_eq!(average_odds(Some("-110"), Some("+105")), Some(-2));
        // -111 and +104 → -3.5 → -4
        assert_eq!(average_odds(Some("-111"), Some("+104")), Some(-4));
    }

    #[test]
    fn formats_with_explicit_sign() {
        assert_eq!(format_american(105), "+105");
        assert_eq!(format_american(-115), "-115");
        assert_eq!(format_american(0), "+0");
    }
}
