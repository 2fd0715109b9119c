//! Value types for teams, divisions, scheduling requirements and solved fixtures.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

/// Length of the season in weeks.
pub const SEASON_WEEKS: u8 = 18;

/// Length of a half-season; the mirrored strategy solves only this span.
pub const HALF_SEASON_WEEKS: u8 = 9;

#[derive(Debug, Error)]
#[error("invalid team code '{code}'")]
pub struct InvalidTeamCode {
    pub code: String,
}

#[derive(Debug, Error)]
#[error("team {code} appears in both '{first}' and '{second}'")]
pub struct DuplicateTeam {
    pub code: String,
    pub first: String,
    pub second: String,
}

/// A team, identified league-wide by a code of the form `[A-Z]+[0-9]+`, e.g. `WAN1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    pub code: String,
    pub club: String,
    pub number: u8,
    pub division: String,
}
impl Team {
    /// Splits a team code into its club prefix and side number. Fails unless the
    /// code is one or more uppercase letters followed by one or more digits.
    pub fn from_code(code: &str, division: &str) -> Result<Self, InvalidTeamCode> {
        let invalid = || InvalidTeamCode {
            code: code.to_string(),
        };
        let split = code
            .find(|ch: char| ch.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (club, digits) = code.split_at(split);
        if club.is_empty() || !club.chars().all(|ch| ch.is_ascii_uppercase()) {
            return Err(invalid());
        }
        if !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }
        let number = digits.parse().map_err(|_| invalid())?;
        Ok(Self {
            code: code.to_string(),
            club: club.to_string(),
            number,
            division: division.to_string(),
        })
    }

    /// Ground-sharing bucket within a club: sides {1,2}, {3,4}, {5,6} and {7,8}
    /// play on the same pitch pairwise.
    pub fn ground_group(&self) -> u8 {
        (self.number.saturating_sub(1)) / 2
    }
}

impl Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// A division of either 10 or 11 teams playing a double round-robin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Division {
    pub name: String,
    pub teams: Vec<Team>,
    pub tier: u8,
}
impl Division {
    pub fn from_row(name: &str, codes: &[String]) -> Result<Self, InvalidTeamCode> {
        let teams = codes
            .iter()
            .map(|code| Team::from_code(code, name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            teams,
            tier: tier_of(name),
        })
    }

    /// An 11-team division cannot fit a full double round-robin into 18 weeks;
    /// one team sits out each week.
    pub fn has_bye_weeks(&self) -> bool {
        self.teams.len() == 11
    }
}

/// Seniority tier 1–4, derived from the division name. Used only to weight
/// ground-sharing penalties in the soft formulation.
fn tier_of(name: &str) -> u8 {
    if name.contains("Premier") || matches!(name, "Div 1" | "Div 2" | "Div 3" | "Div 4") {
        1
    } else if matches!(name, "Div 5" | "Div 6" | "Div 7") {
        2
    } else if matches!(name, "Div 8" | "Div 9") {
        3
    } else if matches!(name, "Div 10" | "Div 11" | "Div 12") {
        4
    } else if name.contains("1st XI") {
        1
    } else if name.contains("2nd XI") {
        2
    } else if name.contains("3rd XI") {
        3
    } else {
        4
    }
}

/// Requires two teams to meet in a specific week; the home/away orientation is
/// left to the solver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedMatch {
    pub week: u8,
    pub team1: String,
    pub team2: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumString)]
pub enum Venue {
    #[strum(serialize = "h")]
    Home,
    #[strum(serialize = "a")]
    Away,
}

/// Requires a team to play at the given venue in the given week; the opponent
/// is left to the solver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VenueRequirement {
    pub team: String,
    pub venue: Venue,
    pub week: u8,
}
impl VenueRequirement {
    pub fn parse_venue(venue: &str) -> Option<Venue> {
        Venue::from_str(venue.trim()).ok()
    }
}

/// Two or more teams that share a physical pitch and can therefore never all
/// be at home in the same week.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VenueConflict {
    pub teams: Vec<String>,
}
impl VenueConflict {
    /// Unordered pairs drawn from the group.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.teams.iter().enumerate().flat_map(move |(index, t1)| {
            self.teams[index + 1..]
                .iter()
                .map(move |t2| (t1.as_str(), t2.as_str()))
        })
    }
}

/// A solved match: one week, one home side, one away side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Fixture {
    pub week: u8,
    pub home_team: String,
    pub away_team: String,
    pub division: String,
}
impl Fixture {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }
}

impl Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wk{} {} v {} [{}]",
            self.week, self.home_team, self.away_team, self.division
        )
    }
}
