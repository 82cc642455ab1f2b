//! Cross-source identity resolution for teams and players.
//!
//! Every source spells club names its own way ("Atlético Mineiro Saf",
//! "Atlético-MG", "Atlético Mineiro"). Resolution goes alias tables first,
//! then a deterministic normalization pipeline, then a small set of hand-coded
//! exception substitutions. An unresolved name is returned as `None` — the
//! caller logs it and skips the record, never drops it silently.

pub mod aliases;
pub mod matcher;

use std::collections::HashMap;

use crate::resolve::aliases::{lookup, OFFICIAL_LONG_TO_SHORT, THIRD_PARTY_TO_OFFICIAL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    OfficialApi,
    OfficialSite,
    ThirdParty,
}

pub struct TeamResolver {
    /// canonical normalized key → team_id
    by_key: HashMap<String, i64>,
}

impl TeamResolver {
    /// Builds the resolver from the official team list of the current season.
    /// Keys are derived from the canonical short spelling of each club.
    pub fn new(teams: &[(i64, String)]) -> Self {
        let mut by_key = HashMap::with_capacity(teams.len());
        for (team_id, long_name) in teams {
            let short = lookup(OFFICIAL_LONG_TO_SHORT, long_name).unwrap_or(long_name);
            by_key.insert(canonical_key(short), *team_id);
        }
        Self { by_key }
    }

    /// Resolves a raw team name from any source to its team id.
    pub fn resolve(&self, raw_name: &str, source: Source) -> Option<i64> {
        // Source-specific alias hop: third-party spellings map to the official
        // long spelling, which in turn maps to the canonical short spelling.
        let name = match source {
            Source::ThirdParty => lookup(THIRD_PARTY_TO_OFFICIAL, raw_name).unwrap_or(raw_name),
            Source::OfficialApi | Source::OfficialSite => raw_name,
        };
        let name = lookup(OFFICIAL_LONG_TO_SHORT, name).unwrap_or(name);
        self.by_key.get(&canonical_key(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Normalizes a club spelling into its canonical lookup key: fold diacritics,
/// lowercase, strip corporate suffix tokens, strip punctuation, drop spaces,
/// then apply the fixed exception substitutions.
pub fn canonical_key(name: &str) -> String {
    let mut key = fold_diacritics(name).to_lowercase();
    for suffix in [" s.a.f.", " saf", " ec", " fc"] {
        key = key.replace(suffix, "");
    }
    key.retain(|c| !matches!(c, '.' | ',' | '-') && !c.is_whitespace());
    apply_exceptions(key)
}

/// Names whose normalized form collides with or diverges from the registered
/// key. Kept tiny on purpose; anything systematic belongs in the alias tables.
fn apply_exceptions(key: String) -> String {
    if key.contains("redbullbragantino") {
        return key.replace("redbull", "rb");
    }
    match key.as_str() {
        "atleticomineiro" => "atleticomg".to_string(),
        "america" | "americasaf" => "americamg".to_string(),
        _ => key,
    }
}

/// Normalizes a displayed player name for roster keys and photo lookups.
pub fn normalize_player_name(name: &str) -> String {
    fold_diacritics(name).to_lowercase().trim().to_string()
}

/// ASCII-folds the accented Latin characters the sources actually emit.
pub fn fold_diacritics(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            'ñ' => 'n',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
