use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::ConfigError;

static SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(jr|sr|ii|iii|iv|v)\b\.?").expect("suffix pattern"));
static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]*\)").expect("paren pattern"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("space pattern"));

/// How a cleaned display name becomes a join key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScheme {
    /// The cleaned name, verbatim.
    #[default]
    FullName,
    /// First two letters of the first name plus the full last name, so
    /// "Jake Latz" and "Jacob Latz" land on the same key.
    ShortKey,
}

impl FromStr for KeyScheme {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "full" | "full_name" | "fullname" => Ok(Self::FullName),
            "short" | "short_key" | "shortkey" => Ok(Self::ShortKey),
            other => Err(ConfigError::UnknownVariant {
                field: "key scheme",
                value: other.to_string(),
                expected: "full_name, short_key",
            }),
        }
    }
}

/// Canonical identity of a player within one run. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PlayerKey(String);

impl PlayerKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn resolve(raw: &str, scheme: KeyScheme) -> PlayerKey {
    let cleaned = clean_name(raw);
    match scheme {
        KeyScheme::FullName => PlayerKey(cleaned),
        KeyScheme::ShortKey => PlayerKey(short_key(&cleaned)),
    }
}

/// Missing names resolve to the empty key.
pub fn resolve_opt(raw: Option<&str>, scheme: KeyScheme) -> PlayerKey {
    raw.map(|name| resolve(name, scheme)).unwrap_or_default()
}

/// Transliterate to ASCII, lower-case, and strip generational suffixes and
/// parenthetical annotations such as a team tag.
pub fn clean_name(raw: &str) -> String {
    let ascii: String = raw.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii.to_ascii_lowercase();
    let lowered = lowered.trim();
    let no_suffix = SUFFIX_RE.replace_all(lowered, "");
    let no_paren = PAREN_RE.replace_all(&no_suffix, "");
    SPACE_RE.replace_all(&no_paren, " ").trim().to_string()
}

fn short_key(cleaned: &str) -> String {
    let parts: Vec<&str> = cleaned.split_whitespace().collect();
    let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
        return cleaned.to_string();
    };
    if parts.len() < 2 {
        return cleaned.to_string();
    }
    let initials: String = first.chars().take(2).collect();
    format!("{initials}_{last}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics() {
        assert_eq!(clean_name("Germán Márquez"), "german marquez");
        assert_eq!(clean_name("José Berríos"), "jose berrios");
    }

    #[test]
    fn short_key_unifies_accented_spelling() {
        let a = resolve("Germán Márquez", KeyScheme::ShortKey);
        let b = resolve("German Marquez", KeyScheme::ShortKey);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "ge_marquez");
    }

    #[test]
    fn full_name_drops_team_annotation() {
        assert_eq!(
            resolve("Logan Allen (CLE)", KeyScheme::FullName),
            resolve("Logan Allen", KeyScheme::FullName)
        );
    }

    #[test]
    fn suffixes_removed_as_whole_words() {
        assert_eq!(clean_name("Lance McCullers Jr."), "lance mccullers");
        assert_eq!(clean_name("Luis Garcia II"), "luis garcia");
        // "v" inside a word stays.
        assert_eq!(clean_name("Devin Williams"), "devin williams");
    }

    #[test]
    fn short_key_nickname_variance() {
        assert_eq!(
            resolve("Jake Latz", KeyScheme::ShortKey),
            resolve("Jacob Latz", KeyScheme::ShortKey)
        );
    }

    #[test]
    fn missing_and_single_token_names() {
        assert_eq!(resolve_opt(None, KeyScheme::FullName).as_str(), "");
        assert_eq!(resolve_opt(None, KeyScheme::ShortKey).as_str(), "");
        assert_eq!(resolve("", KeyScheme::ShortKey).as_str(), "");
        assert_eq!(resolve("Ohtani", KeyScheme::ShortKey).as_str(), "ohtani");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean_name("  Zack   Wheeler \t"), "zack wheeler");
    }

    #[test]
    fn scheme_parses_from_env_strings() {
        assert_eq!("short".parse::<KeyScheme>(), Ok(KeyScheme::ShortKey));
        assert_eq!("Full_Name".parse::<KeyScheme>(), Ok(KeyScheme::FullName));
        assert!("initials".parse::<KeyScheme>().is_err());
    }
}
