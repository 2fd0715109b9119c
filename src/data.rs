//! CSV loaders for the four league inputs.

use std::path::Path;

use anyhow::{bail, Context};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::csv::CsvReader;
use crate::domain::{
    Division, DuplicateTeam, FixedMatch, VenueConflict, VenueRequirement, SEASON_WEEKS,
};

/// Loads `divisions.csv`: one row per division, division name followed by team
/// codes. A team code appearing twice anywhere in the league is fatal.
pub fn load_divisions(path: impl AsRef<Path>) -> anyhow::Result<Vec<Division>> {
    let mut divisions = vec![];
    for record in CsvReader::open(&path).context("cannot open divisions file")? {
        let record = record?;
        if record.len() < 2 {
            continue;
        }
        let name = record[0].trim();
        let codes: Vec<String> = record[1..]
            .iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
        divisions.push(Division::from_row(name, &codes)?);
    }

    let mut seen: FxHashMap<&str, &str> = FxHashMap::default();
    for division in &divisions {
        for team in &division.teams {
            if let Some(first) = seen.insert(&team.code, &division.name) {
                return Err(DuplicateTeam {
                    code: team.code.clone(),
                    first: first.to_string(),
                    second: division.name.clone(),
                }
                .into());
            }
        }
    }

    debug!("loaded {} divisions", divisions.len());
    Ok(divisions)
}

/// Loads `fixReq.csv`: `<week>, <team1>, <team2>`. Rows with fewer than three
/// fields are skipped.
pub fn load_fixed_matches(path: impl AsRef<Path>) -> anyhow::Result<Vec<FixedMatch>> {
    let mut matches = vec![];
    for record in CsvReader::open(&path).context("cannot open fixed matches file")? {
        let record = record?;
        if record.len() < 3 {
            continue;
        }
        let week = parse_week(&record[0])?;
        matches.push(FixedMatch {
            week,
            team1: record[1].trim().to_string(),
            team2: record[2].trim().to_string(),
        });
    }
    debug!("loaded {} fixed matches", matches.len());
    Ok(matches)
}

/// Loads `venReq.csv`: `<team>, <h|a>, <week>`. Rows with fewer than three
/// fields are skipped.
pub fn load_venue_requirements(path: impl AsRef<Path>) -> anyhow::Result<Vec<VenueRequirement>> {
    let mut requirements = vec![];
    for record in CsvReader::open(&path).context("cannot open venue requirements file")? {
        let record = record?;
        if record.len() < 3 {
            continue;
        }
        let Some(venue) = VenueRequirement::parse_venue(&record[1]) else {
            bail!("invalid venue '{}' (expected 'h' or 'a')", record[1].trim());
        };
        let week = parse_week(&record[2])?;
        requirements.push(VenueRequirement {
            team: record[0].trim().to_string(),
            venue,
            week,
        });
    }
    debug!("loaded {} venue requirements", requirements.len());
    Ok(requirements)
}

/// Loads `venConflicts.csv`: each row lists two or more teams that share a
/// pitch. A missing file is treated as no conflicts.
pub fn load_venue_conflicts(path: impl AsRef<Path>) -> anyhow::Result<Vec<VenueConflict>> {
    if !path.as_ref().exists() {
        return Ok(vec![]);
    }
    let mut conflicts = vec![];
    for record in CsvReader::open(&path).context("cannot open venue conflicts file")? {
        let record = record?;
        let mut teams: Vec<String> = record
            .iter()
            .map(|team| team.trim().to_string())
            .filter(|team| !team.is_empty())
            .collect();
        teams.sort();
        teams.dedup();
        if teams.len() >= 2 {
            conflicts.push(VenueConflict { teams });
        }
    }
    debug!("loaded {} venue conflict groups", conflicts.len());
    Ok(conflicts)
}

fn parse_week(field: &str) -> anyhow::Result<u8> {
    let week: u8 = field
        .trim()
        .parse()
        .with_context(|| format!("invalid week '{}'", field.trim()))?;
    if !(1..=SEASON_WEEKS).contains(&week) {
        bail!("week {week} is outside 1..={SEASON_WEEKS}");
    }
    Ok(week)
}
