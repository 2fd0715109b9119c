//! Strategy selection and orchestration. A season is preferably solved as a
//! mirrored half-season (weeks 10..18 are the home/away negation of 1..9);
//! when mirroring cannot satisfy the venue requirements, or a division
//! carries bye weeks, the full 18-week model is solved instead.

pub mod full;
pub mod mirrored;

#[cfg(test)]
mod tests;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rustc_hash::FxHashMap;
use tinyrand::{Rand, Seeded, StdRand};
use tracing::{debug, info, warn};

use crate::domain::{
    Division, FixedMatch, Fixture, Venue, VenueConflict, VenueRequirement, HALF_SEASON_WEEKS,
};
use crate::grounds;
use crate::sat::search::Options;

/// How ground sharing is expressed in the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum GroundShareMode {
    /// Hard mutual exclusion over the explicit conflict groups when any are
    /// supplied; otherwise tier-weighted penalties over derived club pairs.
    Auto,
    /// Hard mutual exclusion over the explicit conflict groups only.
    HardConflicts,
    /// Tier-weighted penalties over club pairs derived from side numbers.
    TierWeighted,
}

#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Budget for the mirrored solve; the full solve gets this multiplied by
    /// [full_time_factor](Self::full_time_factor).
    pub time_limit: Duration,
    pub full_time_factor: u32,
    pub workers: usize,
    /// Penalty per three-consecutive-same-venue window.
    pub consecutive_penalty: i64,
    pub ground_share: GroundShareMode,
}
impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(300),
            full_time_factor: 3,
            workers: 8,
            consecutive_penalty: 50,
            ground_share: GroundShareMode::Auto,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Strategy {
    Mirrored,
    Full,
}

/// The outcome of a generation run. An empty fixture list with no strategy
/// means both solvers came up dry; the seed is reported regardless.
#[derive(Clone, Debug)]
pub struct Generation {
    pub fixtures: Vec<Fixture>,
    pub seed: u32,
    pub strategy: Option<Strategy>,
    pub objective: Option<i64>,
}

/// A team that demands the same venue in some week `w` and its mirror week
/// `w + 9`, which no mirrored schedule can deliver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorConflict {
    pub team: String,
    pub week: u8,
}

/// Finds every venue requirement pair that rules the mirrored strategy out.
pub fn mirroring_conflicts(requirements: &[VenueRequirement]) -> Vec<MirrorConflict> {
    let mut by_team: FxHashMap<&str, FxHashMap<u8, Venue>> = FxHashMap::default();
    for requirement in requirements {
        by_team
            .entry(&requirement.team)
            .or_default()
            .insert(requirement.week, requirement.venue);
    }

    let mut conflicts = vec![];
    for (team, weeks) in &by_team {
        for week in 1..=HALF_SEASON_WEEKS {
            if let (Some(first), Some(second)) =
                (weeks.get(&week), weeks.get(&(week + HALF_SEASON_WEEKS)))
            {
                if first == second {
                    conflicts.push(MirrorConflict {
                        team: team.to_string(),
                        week,
                    });
                }
            }
        }
    }
    conflicts.sort_by(|a, b| (&a.team, a.week).cmp(&(&b.team, b.week)));
    conflicts
}

/// Generates the season. Draws and reports a seed when none is supplied, tries
/// the mirrored strategy where it can possibly work, then falls back to the
/// full 18-week model. Infeasibility is not an error: the caller receives an
/// empty fixture list and the seed that was used.
pub fn generate(
    divisions: &[Division],
    fixed_matches: &[FixedMatch],
    venue_requirements: &[VenueRequirement],
    venue_conflicts: &[VenueConflict],
    seed: Option<u32>,
    config: &SolverConfig,
) -> Generation {
    let seed = seed.unwrap_or_else(draw_seed);
    info!("using seed {seed}");
    let mut rand = StdRand::seed(seed as u64);
    let instance = Instance::build(
        divisions,
        fixed_matches,
        venue_requirements,
        venue_conflicts,
        config,
        &mut rand,
    );
    let options = Options {
        max_time: config.time_limit,
        workers: config.workers,
        seed: seed as u64,
    };

    if divisions.iter().any(Division::has_bye_weeks) {
        info!("a division carries bye weeks; skipping the mirrored strategy");
    } else {
        let conflicts = mirroring_conflicts(venue_requirements);
        if conflicts.is_empty() {
            info!("attempting the mirrored half-season strategy");
            if let Some((fixtures, objective)) = mirrored::solve(&instance, &options) {
                return Generation {
                    fixtures,
                    seed,
                    strategy: Some(Strategy::Mirrored),
                    objective: Some(objective),
                };
            }
            info!("mirrored strategy found no solution; falling back to the full season");
        } else {
            for conflict in &conflicts {
                debug!(
                    "{} requires the same venue in weeks {} and {}",
                    conflict.team,
                    conflict.week,
                    conflict.week + HALF_SEASON_WEEKS
                );
            }
            info!(
                "{} mirroring conflict(s); using the full-season strategy",
                conflicts.len()
            );
        }
    }

    let options = Options {
        max_time: config.time_limit * config.full_time_factor,
        ..options
    };
    if let Some((fixtures, objective)) = full::solve(&instance, &options) {
        return Generation {
            fixtures,
            seed,
            strategy: Some(Strategy::Full),
            objective: Some(objective),
        };
    }

    warn!("no feasible fixture set found under either strategy");
    Generation {
        fixtures: vec![],
        seed,
        strategy: None,
        objective: None,
    }
}

fn draw_seed() -> u32 {
    let clock = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let mut rand = StdRand::seed(clock.as_nanos() as u64);
    (rand.next_u64() % 999_999) as u32 + 1
}

pub(crate) fn shuffle<T>(items: &mut [T], rand: &mut impl Rand) {
    for index in (1..items.len()).rev() {
        let other = (rand.next_u64() % (index as u64 + 1)) as usize;
        items.swap(index, other);
    }
}

/// The solver-facing view of the league: teams flattened to dense indices in
/// seed-permuted order, pair lists per division (also permuted), requirements
/// resolved against those indices, and the ground-sharing formulation already
/// chosen. Both strategies build their models from this one view.
pub(crate) struct Instance<'a> {
    pub divisions: &'a [Division],
    pub teams: Vec<&'a str>,
    pub div_teams: Vec<Vec<usize>>,
    pub div_pairs: Vec<Vec<(usize, usize)>>,
    pub fixed: Vec<(usize, usize, u8)>,
    pub venue: Vec<(usize, u8, Venue)>,
    pub hard_pairs: Vec<(usize, usize)>,
    pub soft_pairs: Vec<(usize, usize, i64)>,
    pub consecutive_penalty: i64,
}
impl<'a> Instance<'a> {
    pub fn build(
        divisions: &'a [Division],
        fixed_matches: &[FixedMatch],
        venue_requirements: &[VenueRequirement],
        venue_conflicts: &[VenueConflict],
        config: &SolverConfig,
        rand: &mut impl Rand,
    ) -> Self {
        let mut teams: Vec<&'a str> = vec![];
        let mut div_teams = vec![];
        let mut div_pairs = vec![];
        let mut team_index: FxHashMap<&'a str, usize> = FxHashMap::default();
        let mut division_of: FxHashMap<usize, usize> = FxHashMap::default();

        for (div_index, division) in divisions.iter().enumerate() {
            let mut members: Vec<&'a str> =
                division.teams.iter().map(|team| team.code.as_str()).collect();
            shuffle(&mut members, rand);

            let mut indices = vec![];
            for code in members {
                let index = teams.len();
                teams.push(code);
                team_index.insert(code, index);
                division_of.insert(index, div_index);
                indices.push(index);
            }

            let mut pairs = vec![];
            for (offset, &t1) in indices.iter().enumerate() {
                for &t2 in &indices[offset + 1..] {
                    pairs.push((t1, t2));
                }
            }
            shuffle(&mut pairs, rand);

            div_teams.push(indices);
            div_pairs.push(pairs);
        }

        let mut fixed = vec![];
        for fixed_match in fixed_matches {
            let resolved = (
                team_index.get(fixed_match.team1.as_str()),
                team_index.get(fixed_match.team2.as_str()),
            );
            let (Some(&t1), Some(&t2)) = resolved else {
                debug!("fixed match {fixed_match:?} names an unknown team; ignoring");
                continue;
            };
            if division_of[&t1] != division_of[&t2] {
                debug!("fixed match {fixed_match:?} spans divisions; ignoring");
                continue;
            }
            let div_index = division_of[&t1];
            let pair_index = div_pairs[div_index]
                .iter()
                .position(|&(a, b)| (a, b) == (t1, t2) || (a, b) == (t2, t1))
                .expect("pair list covers every team pair in the division");
            fixed.push((div_index, pair_index, fixed_match.week));
        }

        let mut venue = vec![];
        for requirement in venue_requirements {
            let Some(&team) = team_index.get(requirement.team.as_str()) else {
                debug!("venue requirement {requirement:?} names an unknown team; ignoring");
                continue;
            };
            venue.push((team, requirement.week, requirement.venue));
        }

        let hard = match config.ground_share {
            GroundShareMode::Auto => !venue_conflicts.is_empty(),
            GroundShareMode::HardConflicts => true,
            GroundShareMode::TierWeighted => false,
        };
        let mut hard_pairs = vec![];
        let mut soft_pairs = vec![];
        if hard {
            for (team1, team2) in grounds::conflict_pairs(venue_conflicts) {
                let resolved = (team_index.get(team1.as_str()), team_index.get(team2.as_str()));
                if let (Some(&t1), Some(&t2)) = resolved {
                    hard_pairs.push((t1, t2));
                } else {
                    debug!("venue conflict {team1}/{team2} names an unknown team; ignoring");
                }
            }
        } else {
            for pair in grounds::sharing_pairs(divisions) {
                let t1 = team_index[pair.team1.as_str()];
                let t2 = team_index[pair.team2.as_str()];
                soft_pairs.push((t1, t2, grounds::tier_weight(pair.tier)));
            }
        }

        Self {
            divisions,
            teams,
            div_teams,
            div_pairs,
            fixed,
            venue,
            hard_pairs,
            soft_pairs,
            consecutive_penalty: config.consecutive_penalty,
        }
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }
}
