//! Post-hoc validation of a solved season. Every hard invariant is re-checked
//! from the fixture list alone, independently of the solver's constraints; a
//! correct solve produces no issues, so anything reported here points at a
//! modelling mistake.

use rustc_hash::FxHashMap;

use crate::domain::{Division, Fixture, VenueConflict, SEASON_WEEKS};
use crate::grounds;

/// Checks a generated fixture list against the per-division invariants and
/// returns a human-readable issue per violation.
pub fn validate_fixtures(fixtures: &[Fixture], divisions: &[Division]) -> Vec<String> {
    let mut issues = vec![];

    let mut by_division: FxHashMap<&str, Vec<&Fixture>> = FxHashMap::default();
    for fixture in fixtures {
        by_division
            .entry(fixture.division.as_str())
            .or_default()
            .push(fixture);
    }

    for division in divisions {
        let div_fixtures: &[&Fixture] = by_division
            .get(division.name.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let teams: Vec<&str> = division
            .teams
            .iter()
            .map(|team| team.code.as_str())
            .collect();

        let mut weekly = [0usize; SEASON_WEEKS as usize];
        for fixture in div_fixtures {
            weekly[fixture.week as usize - 1] += 1;
        }
        for (index, count) in weekly.iter().enumerate() {
            if *count != 5 {
                issues.push(format!(
                    "{}: {} matches in week {}, expected 5",
                    division.name,
                    count,
                    index + 1
                ));
            }
        }

        for &team in &teams {
            let home = div_fixtures
                .iter()
                .filter(|fixture| fixture.home_team == team)
                .count();
            let away = div_fixtures
                .iter()
                .filter(|fixture| fixture.away_team == team)
                .count();
            let games = home + away;
            if division.has_bye_weeks() {
                if !(16..=17).contains(&games) {
                    issues.push(format!("{team}: plays {games} games, expected 16-17"));
                }
                // bye weeks rule out exact balance; flag only a lopsided split
                if games >= 16 && (home < 6 || away < 6) {
                    issues.push(format!("{team}: unbalanced venues ({home}H/{away}A)"));
                }
            } else {
                if games != 18 {
                    issues.push(format!("{team}: plays {games} games, expected 18"));
                }
                if home != 9 {
                    issues.push(format!("{team}: {home} home games, expected 9"));
                }
                if away != 9 {
                    issues.push(format!("{team}: {away} away games, expected 9"));
                }
            }
        }

        for (offset, &t1) in teams.iter().enumerate() {
            for &t2 in &teams[offset + 1..] {
                let meetings: Vec<&&Fixture> = div_fixtures
                    .iter()
                    .filter(|fixture| fixture.involves(t1) && fixture.involves(t2))
                    .collect();
                let expected = if division.has_bye_weeks() { 1..=2 } else { 2..=2 };
                if !expected.contains(&meetings.len()) {
                    issues.push(format!(
                        "{t1} v {t2}: {} meetings, expected {:?}",
                        meetings.len(),
                        expected
                    ));
                }
                if meetings.len() == 2 {
                    if meetings[0].home_team == meetings[1].home_team {
                        issues.push(format!("{t1} v {t2}: the same side hosts both meetings"));
                    }
                    let mut weeks = [meetings[0].week, meetings[1].week];
                    weeks.sort();
                    if weeks[1] - weeks[0] == 1 {
                        issues.push(format!(
                            "{t1} v {t2}: reverse fixture in adjacent weeks {} and {}",
                            weeks[0], weeks[1]
                        ));
                    }
                }
            }
        }

        for &team in &teams {
            let mut venues = [None; SEASON_WEEKS as usize];
            for fixture in div_fixtures {
                if fixture.home_team == team {
                    venues[fixture.week as usize - 1] = Some(true);
                } else if fixture.away_team == team {
                    venues[fixture.week as usize - 1] = Some(false);
                }
            }
            for (start, window) in venues.windows(4).enumerate() {
                if window.iter().all(|venue| *venue == Some(true)) {
                    issues.push(format!(
                        "{team}: 4 consecutive home games from week {}",
                        start + 1
                    ));
                } else if window.iter().all(|venue| *venue == Some(false)) {
                    issues.push(format!(
                        "{team}: 4 consecutive away games from week {}",
                        start + 1
                    ));
                }
            }
        }
    }

    issues
}

/// Reports weeks in which both members of a derived same-club ground-sharing
/// pair are at home. Sharing spans divisions, so this is checked across the
/// whole league rather than per division.
pub fn cross_division_violations(fixtures: &[Fixture], divisions: &[Division]) -> Vec<String> {
    let home_weeks = home_weeks_by_team(fixtures);
    let mut violations = vec![];
    for pair in grounds::sharing_pairs(divisions) {
        report_clashes(&home_weeks, &pair.team1, &pair.team2, &mut violations);
    }
    violations
}

/// Reports weeks in which two members of an explicit venue-conflict group are
/// simultaneously at home.
pub fn conflict_violations(fixtures: &[Fixture], conflicts: &[VenueConflict]) -> Vec<String> {
    let home_weeks = home_weeks_by_team(fixtures);
    let mut violations = vec![];
    for (team1, team2) in grounds::conflict_pairs(conflicts) {
        report_clashes(&home_weeks, &team1, &team2, &mut violations);
    }
    violations
}

fn home_weeks_by_team(fixtures: &[Fixture]) -> FxHashMap<&str, Vec<u8>> {
    let mut home_weeks: FxHashMap<&str, Vec<u8>> = FxHashMap::default();
    for fixture in fixtures {
        home_weeks
            .entry(fixture.home_team.as_str())
            .or_default()
            .push(fixture.week);
    }
    home_weeks
}

fn report_clashes(
    home_weeks: &FxHashMap<&str, Vec<u8>>,
    team1: &str,
    team2: &str,
    violations: &mut Vec<String>,
) {
    let empty = vec![];
    let first = home_weeks.get(team1).unwrap_or(&empty);
    let second = home_weeks.get(team2).unwrap_or(&empty);
    let mut clashes: Vec<u8> = first
        .iter()
        .filter(|week| second.contains(week))
        .copied()
        .collect();
    clashes.sort();
    if !clashes.is_empty() {
        violations.push(format!(
            "{team1} and {team2} share a ground but are both home in weeks {clashes:?}"
        ));
    }
}
