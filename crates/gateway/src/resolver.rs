//! Keyword resolver turning utterances into intents.

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

use sports_query_core::{
    slot, traits::IntentResolver, Action, Domain, Error, Intent, Result,
};

use crate::vocabulary::alias::{edit_distance, fuzzy_threshold};
use crate::vocabulary::{tables, ActionRule, AliasTable, Normalized, Vocabulary};

/// Shortest word considered for fuzzy matching.
const MIN_FUZZY_LEN: usize = 5;

/// Round used when none is named.
const LAST_ROUND: &str = "last";

/// A term of an alias table found in the text.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    canonical: &'a str,
    exact: bool,
    alias_len: usize,
    distance: usize,
}

impl Candidate<'_> {
    /// Exact beats fuzzy, then longer alias, then closer spelling.
    fn beats(&self, other: &Candidate<'_>) -> bool {
        (self.exact, self.alias_len, std::cmp::Reverse(self.distance))
            > (other.exact, other.alias_len, std::cmp::Reverse(other.distance))
    }
}

/// Keyword and alias based resolver.
///
/// Domain detection counts distinct keyword and alias hits per domain. The
/// action is the rule with most keyword hits, ties going to the longer
/// keyword and then to declaration order. Identifier slots take the best
/// alias hit; missing slots get the domain default.
pub struct KeywordResolver {
    vocabulary: Arc<Vocabulary>,
    reserved: HashSet<String>,
    reference_date: Option<NaiveDate>,
    digits: Regex,
    round_patterns: Vec<Regex>,
}

impl KeywordResolver {
    /// Create a resolver over a vocabulary.
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            reserved: vocabulary.reserved_words(),
            vocabulary,
            reference_date: None,
            digits: Regex::new(r"[0-9]+").unwrap(),
            round_patterns: vec![
                Regex::new(r"(?:^|[^0-9])第?\s*([0-9]{1,2})\s*[轮站场]").unwrap(),
                Regex::new(r"(?:round|rd)\s*([0-9]{1,2})").unwrap(),
            ],
        }
    }

    /// Compute date-relative defaults from a fixed day instead of today.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    // =========================================================================
    // Domain & action
    // =========================================================================

    fn domain_score(&self, domain: Domain, text: &Normalized) -> usize {
        let keywords = self
            .vocabulary
            .domain_keywords(domain)
            .iter()
            .filter(|k| k.matches(text))
            .count();
        let aliases: usize = self
            .vocabulary
            .tables(domain)
            .map(|table| {
                let mut terms: Vec<&str> = self
                    .candidates(table, text)
                    .iter()
                    .map(|c| c.canonical)
                    .collect();
                terms.dedup();
                terms.len()
            })
            .sum();
        keywords + aliases
    }

    fn detect_domain(&self, text: &Normalized) -> Result<Domain> {
        let scores: Vec<(Domain, usize)> = Domain::ALL
            .iter()
            .map(|d| (*d, self.domain_score(*d, text)))
            .collect();
        let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
        if best == 0 {
            return Err(Error::unresolved(format!("no sport recognised in '{}'", text.text)));
        }

        let top: Vec<Domain> = scores
            .iter()
            .filter(|(_, s)| *s == best)
            .map(|(d, _)| *d)
            .collect();
        match top.as_slice() {
            [domain] => Ok(*domain),
            _ => Err(Error::AmbiguousDomain(top)),
        }
    }

    fn detect_action(&self, domain: Domain, text: &Normalized) -> Result<&ActionRule> {
        let mut best: Option<(&ActionRule, usize, usize)> = None;
        for rule in self.vocabulary.rules(domain) {
            let matched: Vec<usize> = rule
                .keywords
                .iter()
                .filter(|k| k.matches(text))
                .map(|k| k.len())
                .collect();
            if matched.is_empty() {
                continue;
            }
            let hits = matched.len();
            let longest = matched.iter().copied().max().unwrap_or(0);
            let better = match best {
                None => true,
                Some((_, h, l)) => (hits, longest) > (h, l),
            };
            if better {
                best = Some((rule, hits, longest));
            }
        }
        best.map(|(rule, _, _)| rule).ok_or_else(|| {
            Error::unresolved(format!("no {} action recognised in '{}'", domain, text.text))
        })
    }

    // =========================================================================
    // Slots
    // =========================================================================

    /// Terms of `table` named in the text, exact hits first.
    fn candidates<'a>(&self, table: &'a AliasTable, text: &Normalized) -> Vec<Candidate<'a>> {
        let mut exact: Vec<Candidate<'a>> = Vec::new();
        for term in &table.terms {
            let longest = term
                .aliases
                .iter()
                .filter(|a| a.matches(text))
                .map(|a| a.len())
                .max();
            if let Some(alias_len) = longest {
                exact.push(Candidate {
                    canonical: &term.canonical,
                    exact: true,
                    alias_len,
                    distance: 0,
                });
            }
        }
        if !exact.is_empty() {
            return exact;
        }

        let words: Vec<&str> = text
            .ascii_tokens()
            .filter(|w| w.chars().count() >= MIN_FUZZY_LEN && !self.reserved.contains(*w))
            .collect();
        let mut fuzzy = Vec::new();
        for term in &table.terms {
            let closest = term
                .aliases
                .iter()
                .filter_map(|a| a.single_word())
                .filter(|a| a.len() >= MIN_FUZZY_LEN)
                .flat_map(|alias| {
                    words.iter().filter_map(move |word| {
                        let distance = edit_distance(word, alias);
                        (distance <= fuzzy_threshold(alias.len())).then_some((alias.len(), distance))
                    })
                })
                .min_by_key(|(_, distance)| *distance);
            if let Some((alias_len, distance)) = closest {
                fuzzy.push(Candidate {
                    canonical: &term.canonical,
                    exact: false,
                    alias_len,
                    distance,
                });
            }
        }
        fuzzy
    }

    fn match_identifier(&self, table: &AliasTable, text: &Normalized) -> Option<String> {
        let mut best: Option<Candidate<'_>> = None;
        for candidate in self.candidates(table, text) {
            if best.map_or(true, |b| candidate.beats(&b)) {
                best = Some(candidate);
            }
        }
        if let Some(c) = best.filter(|c| !c.exact) {
            tracing::debug!(slot = table.slot, value = c.canonical, distance = c.distance, "Fuzzy alias match");
        }
        best.map(|c| c.canonical.to_string())
    }

    fn extract_year(&self, domain: Domain, text: &Normalized) -> Option<String> {
        let latest = self.today().year() + 1;
        self.digits
            .find_iter(&text.text)
            .filter(|m| m.as_str().len() == 4)
            .filter_map(|m| m.as_str().parse::<i32>().ok())
            .find(|year| (tables::first_season(domain)..=latest).contains(year))
            .map(|year| year.to_string())
    }

    fn extract_round(&self, text: &Normalized) -> Option<String> {
        let from_phrase = self
            .round_patterns
            .iter()
            .find_map(|re| re.captures(&text.text))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok());
        let from_token = || {
            text.ascii_tokens()
                .filter_map(|t| t.strip_prefix('r'))
                .filter(|n| (1..=2).contains(&n.len()))
                .find_map(|n| n.parse::<u32>().ok())
        };
        from_phrase
            .or_else(from_token)
            .filter(|round| *round > 0)
            .map(|round| round.to_string())
    }

    /// Value used when the text does not name a slot.
    fn default_slot(&self, domain: Domain, action: Action, slot_name: &str) -> Option<String> {
        let today = self.today();
        match slot_name {
            slot::YEAR => {
                let year = match (domain, action) {
                    (Domain::Motorsport, Action::Schedule) => today.year(),
                    (Domain::Motorsport, _) => today.year() - 1,
                    (Domain::Basketball, _) if today.month() >= 10 => today.year(),
                    _ => today.year() - 1,
                };
                Some(year.to_string())
            }
            slot::ROUND => Some(LAST_ROUND.to_string()),
            slot::DATE => Some(today.format("%Y-%m-%d").to_string()),
            other => self
                .vocabulary
                .default_identifier(domain, other)
                .map(str::to_string),
        }
    }

    fn fill_slot(&self, domain: Domain, slot_name: &str, text: &Normalized) -> Option<String> {
        match slot_name {
            slot::YEAR => self.extract_year(domain, text),
            slot::ROUND => self.extract_round(text),
            slot::DATE => None,
            other => self
                .vocabulary
                .table(domain, other)
                .and_then(|table| self.match_identifier(table, text)),
        }
    }
}

impl IntentResolver for KeywordResolver {
    fn resolve(&self, text: &str) -> Result<Intent> {
        let normalized = Normalized::new(text);
        if normalized.tokens.is_empty() {
            return Err(Error::unresolved("empty query"));
        }

        let domain = self.detect_domain(&normalized)?;
        let rule = self.detect_action(domain, &normalized)?;

        let mut intent = Intent::new(domain, rule.action);
        for slot_name in &rule.slots {
            let value = self
                .fill_slot(domain, slot_name, &normalized)
                .or_else(|| self.default_slot(domain, rule.action, slot_name));
            match value {
                Some(value) => intent = intent.with_slot(*slot_name, value),
                None => {
                    return Err(Error::internal(format!(
                        "no default for slot '{}' of {}/{}",
                        slot_name, domain, rule.action
                    )))
                }
            }
        }

        tracing::debug!(
            text = %text,
            domain = %intent.domain,
            action = %intent.action,
            slots = ?intent.slots,
            "Resolved intent"
        );
        Ok(intent)
    }

    fn actions(&self) -> Vec<(Domain, Action)> {
        self.vocabulary.actions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> KeywordResolver {
        KeywordResolver::new(Arc::new(Vocabulary::standard()))
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 5, 18).unwrap())
    }

    #[test]
    fn test_f1_driver_standings() {
        let intent = resolver().resolve("2023年F1车手积分榜").unwrap();
        assert_eq!(intent, Intent::new(Domain::Motorsport, Action::DriverStandings).with_slot("year", "2023"));
    }

    #[test]
    fn test_team_alias_in_chinese() {
        let intent = resolver().resolve("湖人队赛程").unwrap();
        assert_eq!(intent, Intent::new(Domain::Basketball, Action::TeamSchedule).with_slot("team", "Lakers"));
    }

    #[test]
    fn test_team_spellings_converge() {
        let r = resolver();
        let a = r.resolve("Lakers schedule").unwrap();
        let b = r.resolve("LAL schedule").unwrap();
        let c = r.resolve("lakers schedule").unwrap();
        let d = r.resolve("lakres schedule").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(c, d);
        assert_eq!(a.slot("team"), Some("Lakers"));
    }

    #[test]
    fn test_constructor_beats_driver_on_team_keywords() {
        let intent = resolver().resolve("F1车队积分榜").unwrap();
        assert_eq!(intent.action, Action::ConstructorStandings);
        assert_eq!(intent.slot("year"), Some("2023"));
    }

    #[test]
    fn test_qualifying_round() {
        let intent = resolver().resolve("2024年F1第5站排位赛结果").unwrap();
        assert_eq!(intent.action, Action::QualifyingResults);
        assert_eq!(intent.slot("year"), Some("2024"));
        assert_eq!(intent.slot("round"), Some("5"));

        let intent = resolver().resolve("f1 race results").unwrap();
        assert_eq!(intent.slot("round"), Some("last"));

        let intent = resolver().resolve("2023年F1 12轮正赛结果").unwrap();
        assert_eq!(intent.slot("year"), Some("2023"));
        assert_eq!(intent.slot("round"), Some("12"));
    }

    #[test]
    fn test_football_defaults_and_leagues() {
        let r = resolver();
        assert_eq!(r.resolve("西甲积分榜").unwrap().slot("league"), Some("PD"));
        assert_eq!(r.resolve("足球积分榜").unwrap().slot("league"), Some("PL"));

        let scorers = r.resolve("英超射手榜").unwrap();
        assert_eq!(scorers.action, Action::TopScorers);

        let today = r.resolve("今天的足球比赛").unwrap();
        assert_eq!(today.action, Action::TodayMatches);
        assert_eq!(today.slot("date"), Some("2024-05-18"));
    }

    #[test]
    fn test_player_stats() {
        let intent = resolver().resolve("库里本赛季数据").unwrap();
        assert_eq!(intent.domain, Domain::Basketball);
        assert_eq!(intent.action, Action::PlayerStats);
        assert_eq!(intent.slot("player"), Some("Stephen Curry"));
    }

    #[test]
    fn test_basketball_season_default() {
        let intent = resolver().resolve("NBA排名").unwrap();
        assert_eq!(intent.action, Action::Standings);
        assert_eq!(intent.slot("year"), Some("2023"));
    }

    #[test]
    fn test_ambiguous_domain() {
        let err = resolver().resolve("足球和篮球").unwrap_err();
        match err {
            Error::AmbiguousDomain(domains) => {
                assert_eq!(domains, vec![Domain::Football, Domain::Basketball]);
            }
            other => panic!("Expected AmbiguousDomain, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_action_is_reported() {
        let err = resolver().resolve("湖人").unwrap_err();
        assert!(matches!(err, Error::UnresolvedIntent(_)));

        let err = resolver().resolve("what's the weather").unwrap_err();
        assert!(matches!(err, Error::UnresolvedIntent(_)));
    }

    #[test]
    fn test_implausible_year_is_ignored() {
        let intent = resolver().resolve("F1 1066 driver standings").unwrap();
        assert_eq!(intent.slot("year"), Some("2023"));
    }

    #[test]
    fn test_every_vocabulary_action_is_reported() {
        let r = resolver();
        assert_eq!(r.actions().len(), 14);
        assert!(r.actions().contains(&(Domain::Football, Action::LiveMatches)));
    }
}
