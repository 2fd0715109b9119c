use std::time::Duration;

use crate::domain::{FixedMatch, Venue, VenueConflict, VenueRequirement};
use crate::testing;
use crate::validation::{conflict_violations, validate_fixtures};

use super::{generate, mirroring_conflicts, SolverConfig, Strategy};

fn config(seconds: u64) -> SolverConfig {
    SolverConfig {
        time_limit: Duration::from_secs(seconds),
        full_time_factor: 1,
        workers: 4,
        ..SolverConfig::default()
    }
}

fn requirement(team: &str, venue: Venue, week: u8) -> VenueRequirement {
    VenueRequirement {
        team: team.to_string(),
        venue,
        week,
    }
}

#[test]
fn mirror_conflicts_require_the_same_venue_nine_weeks_apart() {
    let conflicts = mirroring_conflicts(&[
        requirement("A1", Venue::Home, 2),
        requirement("A1", Venue::Home, 11),
    ]);
    assert_eq!(1, conflicts.len());
    assert_eq!("A1", conflicts[0].team);
    assert_eq!(2, conflicts[0].week);

    // opposite venues across the mirror are exactly what mirroring delivers
    let conflicts = mirroring_conflicts(&[
        requirement("A1", Venue::Home, 2),
        requirement("A1", Venue::Away, 11),
    ]);
    assert!(conflicts.is_empty());

    let conflicts = mirroring_conflicts(&[
        requirement("B1", Venue::Away, 7),
        requirement("B1", Venue::Away, 16),
    ]);
    assert_eq!(1, conflicts.len());

    // requirements in only one half never conflict
    let conflicts = mirroring_conflicts(&[
        requirement("C1", Venue::Home, 3),
        requirement("C1", Venue::Home, 4),
    ]);
    assert!(conflicts.is_empty());
}

#[test]
fn ten_team_division_solves_mirrored() {
    let divisions = vec![testing::numbered_division("Div 1", 'A', 10)];
    let generation = generate(&divisions, &[], &[], &[], Some(1), &config(15));
    assert_eq!(Some(Strategy::Mirrored), generation.strategy);
    assert_eq!(1, generation.seed);
    assert_eq!(90, generation.fixtures.len());
    let issues = validate_fixtures(&generation.fixtures, &divisions);
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn fixed_match_lands_in_its_week() {
    let divisions = vec![testing::numbered_division("Div 1", 'A', 10)];
    let fixed = vec![FixedMatch {
        week: 5,
        team1: "A1".to_string(),
        team2: "A2".to_string(),
    }];
    let generation = generate(&divisions, &fixed, &[], &[], Some(2), &config(15));
    assert!(generation.strategy.is_some());
    let meetings: Vec<_> = generation
        .fixtures
        .iter()
        .filter(|fixture| fixture.week == 5 && fixture.involves("A1") && fixture.involves("A2"))
        .collect();
    assert_eq!(1, meetings.len(), "{meetings:?}");
    let issues = validate_fixtures(&generation.fixtures, &divisions);
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn same_venue_across_the_mirror_forces_the_full_solver() {
    let divisions = vec![testing::numbered_division("Div 1", 'A', 10)];
    let requirements = vec![
        requirement("A1", Venue::Home, 1),
        requirement("A1", Venue::Home, 10),
    ];
    let generation = generate(&divisions, &[], &requirements, &[], Some(3), &config(60));
    assert_eq!(Some(Strategy::Full), generation.strategy);
    for week in [1, 10] {
        let fixture = generation
            .fixtures
            .iter()
            .find(|fixture| fixture.week == week && fixture.involves("A1"))
            .expect("A1 plays every week");
        assert_eq!("A1", fixture.home_team, "week {week}");
    }
    let issues = validate_fixtures(&generation.fixtures, &divisions);
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn venue_conflicts_are_mutually_exclusive() {
    let divisions = vec![
        testing::numbered_division("Div 1", 'A', 10),
        testing::numbered_division("Div 2", 'B', 10),
    ];
    let conflicts = vec![VenueConflict {
        teams: vec!["A1".to_string(), "B1".to_string()],
    }];
    let generation = generate(&divisions, &[], &[], &conflicts, Some(4), &config(30));
    assert!(generation.strategy.is_some());
    let violations = conflict_violations(&generation.fixtures, &conflicts);
    assert!(violations.is_empty(), "{violations:?}");
    let issues = validate_fixtures(&generation.fixtures, &divisions);
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn eleven_team_division_takes_byes() {
    let divisions = vec![testing::numbered_division("Div 1", 'C', 11)];
    let generation = generate(&divisions, &[], &[], &[], Some(5), &config(120));
    assert_eq!(Some(Strategy::Full), generation.strategy);
    // five matches in each of eighteen weeks
    assert_eq!(90, generation.fixtures.len());
    for team in divisions[0].teams.iter().map(|team| team.code.as_str()) {
        let games = generation
            .fixtures
            .iter()
            .filter(|fixture| fixture.involves(team))
            .count();
        assert!((16..=17).contains(&games), "{team} plays {games} games");
    }
    let issues = validate_fixtures(&generation.fixtures, &divisions);
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn forced_three_in_a_row_is_feasible_with_penalty() {
    let divisions = vec![testing::numbered_division("Div 1", 'A', 10)];
    let requirements = vec![
        requirement("A1", Venue::Home, 3),
        requirement("A1", Venue::Home, 4),
        requirement("A1", Venue::Home, 5),
    ];
    let generation = generate(&divisions, &[], &requirements, &[], Some(6), &config(20));
    assert_eq!(Some(Strategy::Mirrored), generation.strategy);
    for week in [3, 4, 5] {
        let fixture = generation
            .fixtures
            .iter()
            .find(|fixture| fixture.week == week && fixture.involves("A1"))
            .expect("A1 plays every week");
        assert_eq!("A1", fixture.home_team, "week {week}");
    }
    // three in a row is allowed but costs; four would have been refused
    assert!(generation.objective.unwrap_or_default() > 0);
    let issues = validate_fixtures(&generation.fixtures, &divisions);
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn a_drawn_seed_is_reported_in_range() {
    let generation = generate(&[], &[], &[], &[], None, &config(5));
    assert!(
        (1..=999_999).contains(&generation.seed),
        "seed {} out of range",
        generation.seed
    );
}

#[test]
fn the_supplied_seed_is_echoed_back() {
    let generation = generate(&[], &[], &[], &[], Some(777_777), &config(5));
    assert_eq!(777_777, generation.seed);
}
