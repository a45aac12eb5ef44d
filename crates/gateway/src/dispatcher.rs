//! Route table from intents to provider requests.

use std::collections::HashMap;
use std::sync::Arc;

use sports_query_core::{slot, Action, Domain, Error, Intent, Result, SourceRequest};

use crate::vocabulary::Vocabulary;

/// One `(domain, action)` route.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    /// Endpoint template; `{slot}` placeholders are filled from the intent.
    pub endpoint: &'static str,
    /// Query parameters as `(name, slot or literal)`.
    pub params: &'static [(&'static str, Param)],
}

/// Source of a query parameter value.
#[derive(Debug, Clone, Copy)]
pub enum Param {
    Slot(&'static str),
    Literal(&'static str),
}

const ROUTES: &[(Domain, Action, Route)] = &[
    (Domain::Motorsport, Action::Schedule, Route { endpoint: "{year}.json", params: &[] }),
    (Domain::Motorsport, Action::DriverStandings, Route { endpoint: "{year}/driverStandings.json", params: &[] }),
    (Domain::Motorsport, Action::ConstructorStandings, Route { endpoint: "{year}/constructorStandings.json", params: &[] }),
    (Domain::Motorsport, Action::RaceResults, Route { endpoint: "{year}/{round}/results.json", params: &[] }),
    (Domain::Motorsport, Action::QualifyingResults, Route { endpoint: "{year}/{round}/qualifying.json", params: &[] }),
    (Domain::Football, Action::Standings, Route { endpoint: "competitions/{league}/standings", params: &[] }),
    (Domain::Football, Action::TopScorers, Route { endpoint: "competitions/{league}/scorers", params: &[] }),
    (
        Domain::Football,
        Action::TodayMatches,
        Route {
            endpoint: "matches",
            params: &[("dateFrom", Param::Slot(slot::DATE)), ("dateTo", Param::Slot(slot::DATE))],
        },
    ),
    (
        Domain::Football,
        Action::LiveMatches,
        Route { endpoint: "matches", params: &[("status", Param::Literal("LIVE"))] },
    ),
    (Domain::Basketball, Action::Teams, Route { endpoint: "teams", params: &[] }),
    (
        Domain::Basketball,
        Action::Standings,
        Route { endpoint: "standings", params: &[("season", Param::Slot(slot::YEAR))] },
    ),
    (Domain::Basketball, Action::TeamSchedule, Route { endpoint: "teams/{team}/schedule", params: &[] }),
    (Domain::Basketball, Action::TeamRoster, Route { endpoint: "teams/{team}/roster", params: &[] }),
    (Domain::Basketball, Action::PlayerStats, Route { endpoint: "athletes/{player}", params: &[] }),
];

/// Pure mapping from intents to source requests.
pub struct Dispatcher {
    routes: HashMap<(Domain, Action), Route>,
    vocabulary: Arc<Vocabulary>,
}

impl Dispatcher {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            routes: ROUTES
                .iter()
                .map(|(domain, action, route)| ((*domain, *action), *route))
                .collect(),
            vocabulary,
        }
    }

    /// Check that every resolver action has a route.
    ///
    /// A mismatch is a deployment defect; callers should refuse to start.
    pub fn validate(&self, actions: &[(Domain, Action)]) -> Result<()> {
        let missing: Vec<String> = actions
            .iter()
            .filter(|key| !self.routes.contains_key(*key))
            .map(|(domain, action)| format!("{}/{}", domain, action))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::VocabularyMismatch(format!(
                "no route for {}",
                missing.join(", ")
            )))
        }
    }

    /// Build the provider request for an intent.
    pub fn build(&self, intent: &Intent) -> Result<SourceRequest> {
        let route = self
            .routes
            .get(&(intent.domain, intent.action))
            .ok_or(Error::NoRoute {
                domain: intent.domain,
                action: intent.action,
            })?;
        let provider = intent.domain.provider();

        let endpoint = self.render(route.endpoint, intent)?;
        let mut request = SourceRequest::new(provider, endpoint);
        for (name, param) in route.params {
            let value = match param {
                Param::Slot(slot_name) => self.slot_value(intent, slot_name)?,
                Param::Literal(value) => value.to_string(),
            };
            request = request.with_param(*name, value);
        }
        Ok(request)
    }

    fn render(&self, template: &str, intent: &Intent) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            let close = rest[open..]
                .find('}')
                .map(|i| open + i)
                .ok_or_else(|| Error::internal(format!("unclosed placeholder in '{}'", template)))?;
            out.push_str(&rest[..open]);
            out.push_str(&self.slot_value(intent, &rest[open + 1..close])?);
            rest = &rest[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Slot value as the provider expects it (ids for teams and players).
    fn slot_value(&self, intent: &Intent, slot_name: &str) -> Result<String> {
        let value = intent.slot(slot_name).ok_or_else(|| {
            Error::internal(format!(
                "{}/{} is missing slot '{}'",
                intent.domain, intent.action, slot_name
            ))
        })?;
        match self.vocabulary.table(intent.domain, slot_name) {
            Some(table) => {
                let term = table.term(value).ok_or_else(|| {
                    Error::unresolved(format!("unknown {} '{}'", slot_name, value))
                })?;
                Ok(term
                    .provider_id
                    .clone()
                    .unwrap_or_else(|| term.canonical.clone()))
            }
            None => Ok(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sports_query_core::{IntentResolver, Provider};

    use crate::resolver::KeywordResolver;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(Vocabulary::standard()))
    }

    #[test]
    fn test_resolver_and_routes_agree() {
        let vocab = Arc::new(Vocabulary::standard());
        let resolver = KeywordResolver::new(vocab.clone());
        Dispatcher::new(vocab).validate(&resolver.actions()).unwrap();
    }

    #[test]
    fn test_missing_route_is_a_mismatch() {
        let mut d = dispatcher();
        d.routes.remove(&(Domain::Football, Action::LiveMatches));
        let err = d
            .validate(&[(Domain::Football, Action::LiveMatches)])
            .unwrap_err();
        assert!(matches!(err, Error::VocabularyMismatch(_)));

        let intent = Intent::new(Domain::Football, Action::LiveMatches);
        assert!(matches!(d.build(&intent), Err(Error::NoRoute { .. })));
    }

    #[test]
    fn test_build_motorsport() {
        let intent = Intent::new(Domain::Motorsport, Action::RaceResults)
            .with_slot("year", "2023")
            .with_slot("round", "last");
        let req = dispatcher().build(&intent).unwrap();
        assert_eq!(req.provider, Provider::Ergast);
        assert_eq!(req.endpoint, "2023/last/results.json");
    }

    #[test]
    fn test_build_uses_provider_ids() {
        let intent = Intent::new(Domain::Basketball, Action::TeamSchedule).with_slot("team", "Lakers");
        assert_eq!(dispatcher().build(&intent).unwrap().endpoint, "teams/13/schedule");

        let intent = Intent::new(Domain::Basketball, Action::PlayerStats).with_slot("player", "Stephen Curry");
        assert_eq!(dispatcher().build(&intent).unwrap().endpoint, "athletes/3975");
    }

    #[test]
    fn test_build_params() {
        let intent = Intent::new(Domain::Football, Action::TodayMatches).with_slot("date", "2024-05-18");
        let req = dispatcher().build(&intent).unwrap();
        assert_eq!(req.to_string(), "football_data:matches?dateFrom=2024-05-18&dateTo=2024-05-18");

        let live = dispatcher()
            .build(&Intent::new(Domain::Football, Action::LiveMatches))
            .unwrap();
        assert_eq!(live.params, vec![("status".to_string(), "LIVE".to_string())]);

        let standings = Intent::new(Domain::Football, Action::Standings).with_slot("league", "pd");
        assert_eq!(dispatcher().build(&standings).unwrap().endpoint, "competitions/PD/standings");
    }
}
