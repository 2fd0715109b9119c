//! The mirrored half-season model. Only weeks 1..9 are solved; the matchup
//! played in week `w` recurs in week `w + 9` with home and away swapped, so
//! weeks 10..18 are expressed as negations of the first-half home indicators.

use tracing::{debug, info};

use crate::domain::{Fixture, Venue, HALF_SEASON_WEEKS, SEASON_WEEKS};
use crate::sat::search::{Options, Outcome};
use crate::sat::{Model, Var};

use super::Instance;

pub(crate) fn solve(instance: &Instance, options: &Options) -> Option<(Vec<Fixture>, i64)> {
    let build = build(instance);
    debug!(
        "mirrored model: {} variables, {} constraints",
        build.model.num_vars(),
        build.model.num_constraints()
    );
    let outcome = build.model.solve(options);
    if !outcome.status.solved() {
        info!("mirrored solve ended {}", outcome.status);
        return None;
    }
    info!(
        "mirrored solve ended {} with penalty {}",
        outcome.status, outcome.objective
    );
    Some((extract(instance, &build, &outcome), outcome.objective))
}

struct Build {
    model: Model,
    /// Per division, per pair: the half-season week and the t1-home flag.
    pair_vars: Vec<Vec<(Var, Var)>>,
}

const HALF: usize = HALF_SEASON_WEEKS as usize;

fn build(instance: &Instance) -> Build {
    let mut model = Model::new();
    let team_count = instance.team_count();

    // per (team, half-season week): is the team at home?
    let is_home: Vec<Vec<Var>> = (0..team_count)
        .map(|_| (0..HALF).map(|_| model.new_bool()).collect())
        .collect();

    // weeks 10..18 derived as negations, giving a uniform 18-week vector for
    // the sliding venue windows
    let season: Vec<Vec<Var>> = (0..team_count)
        .map(|team| {
            let mut weeks = is_home[team].clone();
            for week in 0..HALF {
                let negated = model.new_bool();
                model.linear(vec![(1, is_home[team][week]), (1, negated)], 1, 1);
                weeks.push(negated);
            }
            weeks
        })
        .collect();

    // matchup variables and their linkage to the home indicators
    let mut membership: Vec<Vec<Vec<Var>>> = vec![vec![vec![]; HALF]; team_count];
    let mut indicators: Vec<Vec<Vec<Var>>> = vec![vec![vec![]; HALF]; team_count];
    let mut pair_vars = vec![];
    for pairs in &instance.div_pairs {
        let mut division_pairs = vec![];
        for &(t1, t2) in pairs {
            let week = model.new_int(1, HALF_SEASON_WEEKS);
            let home = model.new_bool();
            model.decide(week);
            model.decide_later(home);
            let mut played_weeks = vec![];
            for value in 1..=HALF_SEASON_WEEKS {
                let played = model.eq_reif(week, value);
                let index = value as usize - 1;
                membership[t1][index].push(played);
                membership[t2][index].push(played);
                let t1_home = model.and_reif(vec![played.pos(), home.pos()]);
                let t2_home = model.and_reif(vec![played.pos(), home.neg()]);
                indicators[t1][index].push(t1_home);
                indicators[t2][index].push(t2_home);
                played_weeks.push(played);
            }
            // the matchup lands on exactly one week
            model.exactly(&played_weeks, 1);
            division_pairs.push((week, home));
        }
        pair_vars.push(division_pairs);
    }

    // each team plays exactly one matchup per week, which with nine opponents
    // over nine weeks forces a complete half-season round-robin; is_home then
    // equals the count of home indicators for the week
    for team in 0..team_count {
        for week in 0..HALF {
            model.exactly(&membership[team][week], 1);
            let mut terms = vec![(1, is_home[team][week])];
            terms.extend(indicators[team][week].iter().map(|&var| (-1, var)));
            model.linear(terms, 0, 0);
        }
    }

    // fixed matches: a second-half week pins the mirror week
    for &(div_index, pair_index, week) in &instance.fixed {
        let (week_var, _) = pair_vars[div_index][pair_index];
        let pinned = if week <= HALF_SEASON_WEEKS {
            week
        } else {
            week - HALF_SEASON_WEEKS
        };
        model.fix(week_var, pinned);
    }

    // venue requirements: a second-half requirement is the negation of its
    // mirror week's indicator
    for &(team, week, venue) in &instance.venue {
        let home = venue == Venue::Home;
        if week <= HALF_SEASON_WEEKS {
            model.fix(is_home[team][week as usize - 1], home as u8);
        } else {
            let mirror = (week - HALF_SEASON_WEEKS) as usize - 1;
            model.fix(is_home[team][mirror], !home as u8);
        }
    }

    // never four consecutive weeks at the same venue, including the windows
    // crossing the mirror seam
    for team in 0..team_count {
        for start in 0..SEASON_WEEKS as usize - 3 {
            let terms = (0..4).map(|offset| (1, season[team][start + offset])).collect();
            model.linear(terms, 1, 3);
        }
    }

    // ground sharing, hard: exactly one of the pair at home each week. Both
    // away in week w would mean both home in week w + 9.
    for &(t1, t2) in &instance.hard_pairs {
        for week in 0..HALF {
            model.linear(
                vec![(1, is_home[t1][week]), (1, is_home[t2][week])],
                1,
                1,
            );
        }
    }

    // ground sharing, soft: a clash either way costs the pair's tier weight
    for &(t1, t2, weight) in &instance.soft_pairs {
        for week in 0..HALF {
            let both_home =
                model.and_reif(vec![is_home[t1][week].pos(), is_home[t2][week].pos()]);
            model.minimize(weight, both_home);
            let both_away =
                model.and_reif(vec![is_home[t1][week].neg(), is_home[t2][week].neg()]);
            model.minimize(weight, both_away);
        }
    }

    // three consecutive weeks at the same venue is only discouraged. Windows
    // starting at week 10 or later are exact negation-mirrors of first-half
    // windows, so the starts stop at the seam.
    for team in 0..team_count {
        for start in 0..HALF {
            let window: Vec<Var> = (0..3).map(|offset| season[team][start + offset]).collect();
            let all_home = model.and_reif(window.iter().map(|&var| var.pos()).collect());
            model.minimize(instance.consecutive_penalty, all_home);
            let all_away = model.and_reif(window.iter().map(|&var| var.neg()).collect());
            model.minimize(instance.consecutive_penalty, all_away);
        }
    }

    Build { model, pair_vars }
}

fn extract(instance: &Instance, build: &Build, outcome: &Outcome) -> Vec<Fixture> {
    let mut fixtures = vec![];
    for (div_index, pairs) in instance.div_pairs.iter().enumerate() {
        let division = &instance.divisions[div_index].name;
        for (pair_index, &(t1, t2)) in pairs.iter().enumerate() {
            let (week_var, home_var) = build.pair_vars[div_index][pair_index];
            let week = outcome.value(week_var);
            let (home, away) = if outcome.bool_value(home_var) {
                (t1, t2)
            } else {
                (t2, t1)
            };
            fixtures.push(Fixture {
                week,
                home_team: instance.teams[home].to_string(),
                away_team: instance.teams[away].to_string(),
                division: division.clone(),
            });
            fixtures.push(Fixture {
                week: week + HALF_SEASON_WEEKS,
                home_team: instance.teams[away].to_string(),
                away_team: instance.teams[home].to_string(),
                division: division.clone(),
            });
        }
    }
    fixtures
}
