//! The full 18-week model. Required when mirroring cannot satisfy the venue
//! requirements, and for 11-team divisions, where every week sees exactly five
//! matches and one team takes a bye. Each pair owns two meeting slots; in a
//! bye-week division a slot's week of 0 means the meeting is not played.

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::domain::{Fixture, Venue, SEASON_WEEKS};
use crate::sat::search::{Options, Outcome};
use crate::sat::{Model, Var};

use super::Instance;

pub(crate) fn solve(instance: &Instance, options: &Options) -> Option<(Vec<Fixture>, i64)> {
    let build = build(instance);
    debug!(
        "full model: {} variables, {} constraints",
        build.model.num_vars(),
        build.model.num_constraints()
    );
    let outcome = build.model.solve(options);
    if !outcome.status.solved() {
        info!("full solve ended {}", outcome.status);
        return None;
    }
    info!(
        "full solve ended {} with penalty {}",
        outcome.status, outcome.objective
    );
    Some((extract(instance, &build, &outcome), outcome.objective))
}

struct Build {
    model: Model,
    /// Per division, per pair: two meeting slots of (week, t1-home flag).
    pair_slots: Vec<Vec<[(Var, Var); 2]>>,
}

/// Minimum and maximum byes for a team in an 11-team division, keeping it at
/// 16 or 17 games. Each team owns twenty meeting slots.
const BYE_RANGE: (i32, i32) = (3, 4);

const WEEKS: usize = SEASON_WEEKS as usize;

fn build(instance: &Instance) -> Build {
    let mut model = Model::new();
    let team_count = instance.team_count();

    let is_home: Vec<Vec<Var>> = (0..team_count)
        .map(|_| (0..WEEKS).map(|_| model.new_bool()).collect())
        .collect();

    let mut membership: Vec<Vec<Vec<Var>>> = vec![vec![vec![]; WEEKS]; team_count];
    let mut indicators: Vec<Vec<Vec<Var>>> = vec![vec![vec![]; WEEKS]; team_count];
    let mut byes_of: Vec<bool> = vec![false; team_count];
    let mut unused_slots: Vec<Vec<Var>> = vec![vec![]; team_count];
    let mut pair_slots = vec![];

    for (div_index, pairs) in instance.div_pairs.iter().enumerate() {
        let byes = instance.divisions[div_index].has_bye_weeks();
        for &team in &instance.div_teams[div_index] {
            byes_of[team] = byes;
        }

        // per week, the slot indicators across the whole division, for the
        // five-matches-a-week rule
        let mut week_load: Vec<Vec<Var>> = vec![vec![]; WEEKS];
        let mut division_unused = vec![];

        let mut division_pairs = vec![];
        for &(t1, t2) in pairs {
            let mut slots = vec![];
            let mut slot_vars = vec![];
            let mut slot_unused = vec![];
            for _meeting in 0..2 {
                let week = if byes {
                    model.new_int(0, SEASON_WEEKS)
                } else {
                    model.new_int(1, SEASON_WEEKS)
                };
                if byes {
                    model.decide_deferring(week, 0);
                } else {
                    model.decide(week);
                }
                let home = model.new_bool();
                model.decide_later(home);

                let mut played = vec![];
                for value in 1..=SEASON_WEEKS {
                    let in_week = model.eq_reif(week, value);
                    let index = value as usize - 1;
                    membership[t1][index].push(in_week);
                    membership[t2][index].push(in_week);
                    let t1_home = model.and_reif(vec![in_week.pos(), home.pos()]);
                    let t2_home = model.and_reif(vec![in_week.pos(), home.neg()]);
                    indicators[t1][index].push(t1_home);
                    indicators[t2][index].push(t2_home);
                    if byes {
                        week_load[index].push(in_week);
                    }
                    played.push(in_week);
                }

                // the slot takes exactly one of its values
                if byes {
                    let unused = model.eq_reif(week, 0);
                    let mut partition = played.clone();
                    partition.push(unused);
                    model.exactly(&partition, 1);
                    slot_unused.push(unused);
                    division_unused.push(unused);
                } else {
                    model.exactly(&played, 1);
                }

                slots.push(played);
                slot_vars.push((week, home));
            }

            // reverse fixtures are never in adjacent weeks
            for index in 0..WEEKS - 1 {
                model.at_most(&[slots[0][index], slots[1][index + 1]], 1);
                model.at_most(&[slots[1][index], slots[0][index + 1]], 1);
            }

            let (week0, home0) = slot_vars[0];
            let (week1, home1) = slot_vars[1];
            if byes {
                // at most one meeting may go unplayed; when both are played
                // they take opposite orientations
                let (unused0, unused1) = (slot_unused[0], slot_unused[1]);
                model.at_most(&[unused0, unused1], 1);
                let both_played = model.and_reif(vec![unused0.neg(), unused1.neg()]);
                model.linear_if(vec![(1, home0), (1, home1)], 1, 1, both_played.pos());
                unused_slots[t1].push(unused0);
                unused_slots[t1].push(unused1);
                unused_slots[t2].push(unused0);
                unused_slots[t2].push(unused1);
            } else {
                model.linear(vec![(1, home0), (1, home1)], 1, 1);
            }

            division_pairs.push([slot_vars[0], slot_vars[1]]);
        }

        if byes {
            // exactly five matches a week leaves exactly one team resting,
            // and fixes the division-wide count of unplayed meetings
            for load in &week_load {
                model.exactly(load, 5);
            }
            let unplayed = (division_pairs.len() * 2) as i32 - 5 * WEEKS as i32;
            model.exactly(&division_unused, unplayed);
        }
        pair_slots.push(division_pairs);
    }

    for team in 0..team_count {
        for week in 0..WEEKS {
            if byes_of[team] {
                model.at_most(&membership[team][week], 1);
            } else {
                model.exactly(&membership[team][week], 1);
            }
            let mut terms = vec![(1, is_home[team][week])];
            terms.extend(indicators[team][week].iter().map(|&var| (-1, var)));
            model.linear(terms, 0, 0);
        }
        if byes_of[team] {
            // one or two byes, i.e. 16 or 17 games
            let terms = unused_slots[team].iter().map(|&var| (1, var)).collect();
            model.linear(terms, BYE_RANGE.0, BYE_RANGE.1);
        } else {
            // nine home and nine away games
            let terms = is_home[team].iter().map(|&var| (1, var)).collect();
            model.linear(terms, 9, 9);
        }
    }

    // fixed matches claim a pair's slots in order of appearance
    let mut claimed: FxHashMap<(usize, usize), usize> = FxHashMap::default();
    for &(div_index, pair_index, week) in &instance.fixed {
        let slot = *claimed
            .entry((div_index, pair_index))
            .and_modify(|slot| *slot += 1)
            .or_insert(0);
        let (week_var, _) = pair_slots[div_index][pair_index][slot.min(1)];
        model.fix(week_var, week);
    }

    for &(team, week, venue) in &instance.venue {
        let home = venue == Venue::Home;
        model.fix(is_home[team][week as usize - 1], home as u8);
    }

    // never four consecutive weeks at the same venue; a bye counts as away
    for team in 0..team_count {
        for start in 0..WEEKS - 3 {
            let terms = (0..4)
                .map(|offset| (1, is_home[team][start + offset]))
                .collect();
            model.linear(terms, 1, 3);
        }
    }

    // ground sharing, hard: the pair are never both at home
    for &(t1, t2) in &instance.hard_pairs {
        for week in 0..WEEKS {
            model.at_most(&[is_home[t1][week], is_home[t2][week]], 1);
        }
    }

    // ground sharing, soft
    for &(t1, t2, weight) in &instance.soft_pairs {
        for week in 0..WEEKS {
            let both_home =
                model.and_reif(vec![is_home[t1][week].pos(), is_home[t2][week].pos()]);
            model.minimize(weight, both_home);
        }
    }

    // three consecutive weeks at the same venue is only discouraged
    for team in 0..team_count {
        for start in 0..WEEKS - 2 {
            let window: Vec<Var> = (0..3)
                .map(|offset| is_home[team][start + offset])
                .collect();
            let all_home = model.and_reif(window.iter().map(|&var| var.pos()).collect());
            model.minimize(instance.consecutive_penalty, all_home);
            let all_away = model.and_reif(window.iter().map(|&var| var.neg()).collect());
            model.minimize(instance.consecutive_penalty, all_away);
        }
    }

    Build { model, pair_slots }
}

fn extract(instance: &Instance, build: &Build, outcome: &Outcome) -> Vec<Fixture> {
    let mut fixtures = vec![];
    for (div_index, pairs) in instance.div_pairs.iter().enumerate() {
        let division = &instance.divisions[div_index].name;
        for (pair_index, &(t1, t2)) in pairs.iter().enumerate() {
            for &(week_var, home_var) in &build.pair_slots[div_index][pair_index] {
                let week = outcome.value(week_var);
                if week == 0 {
                    continue;
                }
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
            }
        }
    }
    fixtures
}
