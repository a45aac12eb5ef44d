//! Alias tables and action vocabulary.
//!
//! Built once at startup from the static tables and shared read-only by the
//! resolver and the dispatcher.

pub mod alias;
pub mod tables;

use std::collections::HashSet;

use sports_query_core::{Action, Domain};

pub use alias::{Normalized, Pattern};

/// Canonical value of a slot and how it is written.
#[derive(Debug, Clone)]
pub struct Term {
    pub canonical: String,
    pub display: String,
    pub provider_id: Option<String>,
    pub aliases: Vec<Pattern>,
}

/// Alias table for one identifier slot of one domain.
#[derive(Debug, Clone)]
pub struct AliasTable {
    pub domain: Domain,
    pub slot: &'static str,
    pub terms: Vec<Term>,
}

impl AliasTable {
    /// Term with the given canonical value, case-insensitively.
    pub fn term(&self, canonical: &str) -> Option<&Term> {
        self.terms
            .iter()
            .find(|t| t.canonical.eq_ignore_ascii_case(canonical))
    }
}

/// Keywords selecting an action, and the slots it takes.
#[derive(Debug, Clone)]
pub struct ActionRule {
    pub domain: Domain,
    pub action: Action,
    pub keywords: Vec<Pattern>,
    pub slots: Vec<&'static str>,
}

/// The complete, immutable vocabulary.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    domain_keywords: Vec<(Domain, Vec<Pattern>)>,
    rules: Vec<ActionRule>,
    tables: Vec<AliasTable>,
    identifier_defaults: Vec<(Domain, &'static str, String)>,
}

impl Vocabulary {
    /// Vocabulary for motorsport, football and basketball.
    pub fn standard() -> Self {
        let domain_keywords = tables::DOMAIN_KEYWORDS
            .iter()
            .map(|(domain, words)| (*domain, words.iter().map(|w| Pattern::parse(w)).collect()))
            .collect();

        let rules = tables::ACTIONS
            .iter()
            .map(|def| ActionRule {
                domain: def.domain,
                action: def.action,
                keywords: def.keywords.iter().map(|w| Pattern::parse(w)).collect(),
                slots: def.slots.to_vec(),
            })
            .collect();

        let tables = tables::TABLES
            .iter()
            .map(|(domain, slot, defs)| AliasTable {
                domain: *domain,
                slot: *slot,
                terms: defs
                    .iter()
                    .map(|def| Term {
                        canonical: def.canonical.to_string(),
                        display: def.display.to_string(),
                        provider_id: def.provider_id.map(str::to_string),
                        aliases: def.aliases.iter().map(|a| Pattern::parse(a)).collect(),
                    })
                    .collect(),
            })
            .collect();

        let identifier_defaults = tables::IDENTIFIER_DEFAULTS
            .iter()
            .map(|(domain, slot, value)| (*domain, *slot, value.to_string()))
            .collect();

        Self {
            domain_keywords,
            rules,
            tables,
            identifier_defaults,
        }
    }

    /// Keywords naming a domain directly.
    pub fn domain_keywords(&self, domain: Domain) -> &[Pattern] {
        self.domain_keywords
            .iter()
            .find(|(d, _)| *d == domain)
            .map(|(_, words)| words.as_slice())
            .unwrap_or(&[])
    }

    /// Action rules of a domain in declaration order.
    pub fn rules(&self, domain: Domain) -> impl Iterator<Item = &ActionRule> {
        self.rules.iter().filter(move |r| r.domain == domain)
    }

    /// Slot schema of an action.
    pub fn schema(&self, domain: Domain, action: Action) -> Option<&[&'static str]> {
        self.rules
            .iter()
            .find(|r| r.domain == domain && r.action == action)
            .map(|r| r.slots.as_slice())
    }

    /// Every `(domain, action)` pair with a rule.
    pub fn actions(&self) -> Vec<(Domain, Action)> {
        self.rules.iter().map(|r| (r.domain, r.action)).collect()
    }

    /// Alias tables of a domain.
    pub fn tables(&self, domain: Domain) -> impl Iterator<Item = &AliasTable> {
        self.tables.iter().filter(move |t| t.domain == domain)
    }

    /// Alias table for a slot.
    pub fn table(&self, domain: Domain, slot: &str) -> Option<&AliasTable> {
        self.tables
            .iter()
            .find(|t| t.domain == domain && t.slot == slot)
    }

    /// Default canonical value of an identifier slot.
    pub fn default_identifier(&self, domain: Domain, slot: &str) -> Option<&str> {
        self.identifier_defaults
            .iter()
            .find(|(d, s, _)| *d == domain && *s == slot)
            .map(|(_, _, v)| v.as_str())
    }

    /// Provider identifier for a canonical slot value.
    pub fn provider_id(&self, domain: Domain, slot: &str, canonical: &str) -> Option<&str> {
        self.table(domain, slot)?
            .term(canonical)?
            .provider_id
            .as_deref()
    }

    /// Display name for a canonical slot value.
    pub fn display_name(&self, domain: Domain, slot: &str, canonical: &str) -> Option<&str> {
        self.table(domain, slot)?
            .term(canonical)
            .map(|t| t.display.as_str())
    }

    /// Single ASCII words with a fixed meaning, which fuzzy matching must not rewrite.
    pub fn reserved_words(&self) -> HashSet<String> {
        let keywords = self
            .domain_keywords
            .iter()
            .flat_map(|(_, words)| words.iter())
            .chain(self.rules.iter().flat_map(|r| r.keywords.iter()));
        let aliases = self
            .tables
            .iter()
            .flat_map(|t| t.terms.iter())
            .flat_map(|term| term.aliases.iter());
        keywords
            .chain(aliases)
            .filter_map(Pattern::single_word)
            .map(str::to_string)
            .collect()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::standard()
    }
}
