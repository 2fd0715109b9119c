//! Ground-sharing analysis: which teams contend for the same pitch, and how
//! heavily a clash should be penalized when sharing is treated softly.

use rustc_hash::FxHashMap;

use crate::domain::{Division, Team, VenueConflict};

/// A pair of same-club teams whose side numbers fall in the same pairing
/// bucket, carrying the more senior of the two division tiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharingPair {
    pub team1: String,
    pub team2: String,
    pub tier: u8,
}

/// Penalty applied per week in which both members of a sharing pair are at
/// home (or, under mirroring, both away), by seniority tier.
pub fn tier_weight(tier: u8) -> i64 {
    match tier {
        1 => 1000,
        2 => 500,
        3 => 100,
        _ => 10,
    }
}

/// Derives ground-sharing pairs across the whole league by grouping each
/// club's teams into their pairing buckets.
pub fn sharing_pairs(divisions: &[Division]) -> Vec<SharingPair> {
    let mut by_bucket: FxHashMap<(&str, u8), Vec<&Team>> = FxHashMap::default();
    for division in divisions {
        for team in &division.teams {
            by_bucket
                .entry((team.club.as_str(), team.ground_group()))
                .or_default()
                .push(team);
        }
    }

    let tiers: FxHashMap<&str, u8> = divisions
        .iter()
        .map(|division| (division.name.as_str(), division.tier))
        .collect();

    let mut keys: Vec<_> = by_bucket.keys().copied().collect();
    keys.sort();

    let mut pairs = vec![];
    for key in keys {
        let teams = &by_bucket[&key];
        for (index, t1) in teams.iter().enumerate() {
            for t2 in &teams[index + 1..] {
                let tier = u8::min(
                    tiers.get(t1.division.as_str()).copied().unwrap_or(4),
                    tiers.get(t2.division.as_str()).copied().unwrap_or(4),
                );
                pairs.push(SharingPair {
                    team1: t1.code.clone(),
                    team2: t2.code.clone(),
                    tier,
                });
            }
        }
    }
    pairs
}

/// Flattens explicit conflict groups into the unordered pairs the solvers
/// constrain, de-duplicated across overlapping groups.
pub fn conflict_pairs(conflicts: &[VenueConflict]) -> Vec<(String, String)> {
    let mut pairs = vec![];
    for conflict in conflicts {
        for (t1, t2) in conflict.pairs() {
            pairs.push((t1.to_string(), t2.to_string()));
        }
    }
    pairs.sort();
    pairs.dedup();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Division;

    fn division(name: &str, codes: &[&str]) -> Division {
        let codes: Vec<String> = codes.iter().map(ToString::to_string).collect();
        Division::from_row(name, &codes).unwrap()
    }

    #[test]
    fn pairs_within_buckets_only() {
        let divisions = vec![
            division("Premier", &["WAN1", "OTH1"]),
            division("Div 5", &["WAN2", "OTH3"]),
            division("Div 8", &["WAN3", "OTH4"]),
        ];
        let pairs = sharing_pairs(&divisions);
        // WAN1/WAN2 share a bucket; WAN3 does not. OTH3/OTH4 share; OTH1 does not.
        assert_eq!(2, pairs.len());
        assert!(pairs
            .iter()
            .any(|pair| pair.team1 == "OTH3" && pair.team2 == "OTH4" && pair.tier == 2));
        assert!(pairs
            .iter()
            .any(|pair| pair.team1 == "WAN1" && pair.team2 == "WAN2" && pair.tier == 1));
    }

    #[test]
    fn pair_tier_takes_the_senior_division() {
        let divisions = vec![
            division("Div 11", &["AAA1"]),
            division("Premier", &["AAA2"]),
        ];
        let pairs = sharing_pairs(&divisions);
        assert_eq!(1, pairs.len());
        assert_eq!(1, pairs[0].tier);
    }

    #[test]
    fn weights_by_tier() {
        assert_eq!(1000, tier_weight(1));
        assert_eq!(500, tier_weight(2));
        assert_eq!(100, tier_weight(3));
        assert_eq!(10, tier_weight(4));
        assert_eq!(10, tier_weight(9));
    }

    #[test]
    fn conflict_pairs_deduplicate() {
        let conflicts = vec![
            VenueConflict {
                teams: vec!["A1".into(), "B1".into(), "C1".into()],
            },
            VenueConflict {
                teams: vec!["A1".into(), "B1".into()],
            },
        ];
        let pairs = conflict_pairs(&conflicts);
        assert_eq!(
            vec![
                ("A1".to_string(), "B1".to_string()),
                ("A1".to_string(), "C1".to_string()),
                ("B1".to_string(), "C1".to_string()),
            ],
            pairs
        );
    }
}
