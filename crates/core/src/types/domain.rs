use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// =============================================================================
// Domains
// =============================================================================

/// Sport a query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Motorsport,
    Football,
    Basketball,
}

impl Domain {
    /// All domains in declaration order.
    pub const ALL: [Domain; 3] = [Domain::Motorsport, Domain::Football, Domain::Basketball];

    /// Stable identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Motorsport => "motorsport",
            Domain::Football => "football",
            Domain::Basketball => "basketball",
        }
    }

    /// Provider that serves this domain.
    pub fn provider(&self) -> Provider {
        match self {
            Domain::Motorsport => Provider::Ergast,
            Domain::Football => Provider::FootballData,
            Domain::Basketball => Provider::Espn,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "motorsport" | "f1" => Ok(Domain::Motorsport),
            "football" | "soccer" => Ok(Domain::Football),
            "basketball" | "nba" => Ok(Domain::Basketball),
            other => Err(Error::unresolved(format!("unknown domain '{}'", other))),
        }
    }
}

// =============================================================================
// Actions
// =============================================================================

/// Operation requested within a domain.
///
/// Names are shared across domains where the meaning matches
/// (`standings` exists for both football and basketball).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Schedule,
    DriverStandings,
    ConstructorStandings,
    RaceResults,
    QualifyingResults,
    Standings,
    TopScorers,
    TodayMatches,
    LiveMatches,
    Teams,
    TeamSchedule,
    TeamRoster,
    PlayerStats,
}

impl Action {
    /// Stable identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Schedule => "schedule",
            Action::DriverStandings => "driver_standings",
            Action::ConstructorStandings => "constructor_standings",
            Action::RaceResults => "race_results",
            Action::QualifyingResults => "qualifying_results",
            Action::Standings => "standings",
            Action::TopScorers => "top_scorers",
            Action::TodayMatches => "today_matches",
            Action::LiveMatches => "live_matches",
            Action::Teams => "teams",
            Action::TeamSchedule => "team_schedule",
            Action::TeamRoster => "team_roster",
            Action::PlayerStats => "player_stats",
        }
    }

    /// Short human title used in option labels.
    pub fn title(&self) -> &'static str {
        match self {
            Action::Schedule => "schedule",
            Action::DriverStandings => "driver standings",
            Action::ConstructorStandings => "constructor standings",
            Action::RaceResults => "race results",
            Action::QualifyingResults => "qualifying results",
            Action::Standings => "standings",
            Action::TopScorers => "top scorers",
            Action::TodayMatches => "matches",
            Action::LiveMatches => "live matches",
            Action::Teams => "teams",
            Action::TeamSchedule => "schedule",
            Action::TeamRoster => "roster",
            Action::PlayerStats => "stats",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s.trim().to_lowercase().as_str() {
            "schedule" => Action::Schedule,
            "driver_standings" => Action::DriverStandings,
            "constructor_standings" => Action::ConstructorStandings,
            "race_results" => Action::RaceResults,
            "qualifying_results" => Action::QualifyingResults,
            "standings" => Action::Standings,
            "top_scorers" => Action::TopScorers,
            "today_matches" => Action::TodayMatches,
            "live_matches" => Action::LiveMatches,
            "teams" => Action::Teams,
            "team_schedule" => Action::TeamSchedule,
            "team_roster" => Action::TeamRoster,
            "player_stats" => Action::PlayerStats,
            other => return Err(Error::unresolved(format!("unknown action '{}'", other))),
        };
        Ok(action)
    }
}

// =============================================================================
// Providers
// =============================================================================

/// External data provider behind a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Ergast-compatible motorsport API.
    Ergast,
    /// football-data.org v4.
    FootballData,
    /// ESPN site API (NBA).
    Espn,
}

impl Provider {
    /// All providers.
    pub const ALL: [Provider; 3] = [Provider::Ergast, Provider::FootballData, Provider::Espn];

    /// Stable identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ergast => "ergast",
            Provider::FootballData => "football_data",
            Provider::Espn => "espn",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Slot names
// =============================================================================

/// Well-known slot names.
pub mod slot {
    pub const YEAR: &str = "year";
    pub const ROUND: &str = "round";
    pub const LEAGUE: &str = "league";
    pub const TEAM: &str = "team";
    pub const PLAYER: &str = "player";
    pub const DATE: &str = "date";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trips_through_str() {
        for action in [Action::DriverStandings, Action::TeamSchedule, Action::Standings] {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert!("transfer_rumours".parse::<Action>().is_err());
    }

    #[test]
    fn test_domain_aliases() {
        assert_eq!("NBA".parse::<Domain>().unwrap(), Domain::Basketball);
        assert_eq!("soccer".parse::<Domain>().unwrap(), Domain::Football);
        assert_eq!(Domain::Motorsport.provider(), Provider::Ergast);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Action::TopScorers).unwrap();
        assert_eq!(json, "\"top_scorers\"");
        let json = serde_json::to_string(&Provider::FootballData).unwrap();
        assert_eq!(json, "\"football_data\"");
    }
}
