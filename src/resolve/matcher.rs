//! Tiered fallback matching of a displayed player name against a previously
//! scraped photo index.
//!
//! The lineup widget and the squad page rarely agree on how a player is
//! written ("G. Arrascaeta" vs "giorgian de arrascaeta"). Matching runs three
//! tiers and stops at the first that yields a result; ties within a tier go to
//! the first-encountered entry in index order. Two teammates sharing a surname
//! can bind the wrong photo — known precision limit of the source data.

use std::collections::HashMap;

/// Per-team photo index preserving insertion order.
#[derive(Debug, Default)]
pub struct PhotoIndex {
    entries: Vec<(String, String)>,
}

impl PhotoIndex {
    pub fn insert(&mut self, normalized_name: String, url: String) {
        self.entries.push((normalized_name, url));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a photo for a normalized display name.
    ///
    /// Tier 1: exact match. Tier 2: the name's first token is a substring of
    /// an indexed name. Tier 3: the name ends with an indexed entry's surname.
    pub fn lookup(&self, normalized_name: &str) -> Option<&str> {
        if let Some((_, url)) = self.entries.iter().find(|(n, _)| n == normalized_name) {
            return Some(url);
        }

        if let Some(first_token) = normalized_name.split_whitespace().next() {
            if let Some((_, url)) = self.entries.iter().find(|(n, _)| n.contains(first_token)) {
                return Some(url);
            }
        }

        self.entries
            .iter()
            .find(|(n, _)| {
                n.split_whitespace()
                    .last()
                    .is_some_and(|surname| normalized_name.ends_with(surname))
            })
            .map(|(_, url)| url.as_str())
    }
}

/// Photo indexes for the whole league, keyed by team id.
#[derive(Debug, Default)]
pub struct LeaguePhotos {
    by_team: HashMap<i64, PhotoIndex>,
}

impl LeaguePhotos {
    pub fn index_mut(&mut self, team_id: i64) -> &mut PhotoIndex {
        self.by_team.entry(team_id).or_default()
    }

    pub fn lookup(&self, team_id: i64, normalized_name: &str) -> Option<&str> {
        self.by_team.get(&team_id)?.lookup(normalized_name)
    }

    pub fn total_entries(&self) -> usize {
        self.by_team.values().map(PhotoIndex::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn index(entries: &[(&str, &str)]) -> PhotoIndex {
        let mut idx = PhotoIndex::default();
        for (name, url) in entries {
            idx.insert(name.to_string(), url.to_string());
        }
        idx
    }

    #[test]
    fn exact_match_wins_over_later_tiers() {
        let idx = index(&[
            ("pedro henrique", "u1"),
            ("pedro", "u2"),
        ]);
        assert_eq!(idx.lookup("pedro"), Some("u2"));
    }

    #[test]
    fn first_token_substring_is_second_tier() {
        let idx = index(&[("giorgian de arrascaeta", "u1")]);
        assert_eq!(idx.lookup("arrascaeta g."), Some("u1"));
    }

    #[test]
    fn surname_suffix_is_last_tier() {
        let idx = index(&[("bruno silva", "u1")]);
        // First token "w." matches nothing as a substring; surname tier hits.
        assert_eq!(idx.lookup("w. silva"), Some("u1"));
    }

    #[test]
    fn ties_resolve_to_first_indexed_entry() {
        let idx = index(&[("joao silva", "first"), ("marcos silva", "second")]);
        assert_eq!(idx.lookup("x. silva"), Some("first"));
    }

    #[test]
    fn miss_returns_none() {
        let idx = index(&[("bruno silva", "u1")]);
        assert_eq!(idx.lookup("cafu"), None);
    }

    #[test]
    fn league_index_is_scoped_per_team() {
        let mut league = LeaguePhotos::default();
        league.index_mut(1).insert("bruno silva".into(), "team1".into());
        league.index_mut(2).insert("bruno silva".into(), "team2".into());
        assert_eq!(league.lookup(1, "bruno silva"), Some("team1"));
        assert_eq!(league.lookup(2, "bruno silva"), Some("team2"));
        assert_eq!(league.lookup(3, "bruno silva"), None);
    }
}
