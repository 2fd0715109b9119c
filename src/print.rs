//! Tabulation of solved fixtures for the terminal: one grid per division,
//! split into the two half-seasons.

use rustc_hash::FxHashMap;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};

use crate::domain::{Division, Fixture, HALF_SEASON_WEEKS};

/// Renders the full set of per-division grids with the seed noted up top.
pub fn fixture_grids(fixtures: &[Fixture], divisions: &[Division], seed: u32) -> String {
    let mut out = String::new();
    out.push_str(&format!("Generated with seed: {seed}\n"));

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
        out.push('\n');
        out.push_str(&format!("=== {} ===\n", division.name));
        for (label, start_week) in [
            ("First half (weeks 1-9)", 1),
            ("Second half (weeks 10-18)", HALF_SEASON_WEEKS + 1),
        ] {
            out.push_str(&format!("{label}\n"));
            let table = tabulate_half(div_fixtures, start_week);
            out.push_str(&format!("{}\n", Console::default().render(&table)));
        }
    }
    out
}

/// One half-season grid: a column per week, a row per simultaneous match.
fn tabulate_half(fixtures: &[&Fixture], start_week: u8) -> Table {
    let weeks: Vec<u8> = (start_week..start_week + HALF_SEASON_WEEKS).collect();
    let mut by_week: FxHashMap<u8, Vec<&Fixture>> = FxHashMap::default();
    for &fixture in fixtures {
        if weeks.contains(&fixture.week) {
            by_week.entry(fixture.week).or_default().push(fixture);
        }
    }
    for matches in by_week.values_mut() {
        matches.sort_by(|a, b| a.home_team.cmp(&b.home_team));
    }
    let rows = by_week.values().map(Vec::len).max().unwrap_or(0);

    let mut table = Table::default()
        .with_cols(
            weeks
                .iter()
                .map(|_| Col::new(Styles::default().with(MinWidth(11)).with(HAlign::Centred)))
                .collect(),
        )
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            weeks
                .iter()
                .map(|week| format!("Wk{week}").into())
                .collect(),
        ));
    for index in 0..rows {
        let cells = weeks
            .iter()
            .map(|week| {
                by_week
                    .get(week)
                    .and_then(|matches| matches.get(index))
                    .map(|fixture| format!("{}-{}", fixture.home_team, fixture.away_team))
                    .unwrap_or_default()
                    .into()
            })
            .collect();
        table.push_row(Row::new(Styles::default(), cells));
    }
    table
}

/// Fixture counts per division, for the run summary.
pub fn tabulate_division_counts(fixtures: &[Fixture]) -> Table {
    let mut counts: Vec<(&str, usize)> = vec![];
    for fixture in fixtures {
        match counts
            .iter_mut()
            .find(|(division, _)| *division == fixture.division)
        {
            Some((_, count)) => *count += 1,
            None => counts.push((fixture.division.as_str(), 1)),
        }
    }

    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(20))),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Division".into(), "Fixtures".into()],
        ));
    for (division, count) in counts {
        table.push_row(Row::new(
            Styles::default(),
            vec![division.into(), format!("{count}").into()],
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn grids_place_matches_under_their_week() {
        let divisions = vec![testing::division("Div 1", &["AAA1", "BBB1"])];
        let fixtures = vec![
            Fixture {
                week: 2,
                home_team: "AAA1".into(),
                away_team: "BBB1".into(),
                division: "Div 1".into(),
            },
            Fixture {
                week: 11,
                home_team: "BBB1".into(),
                away_team: "AAA1".into(),
                division: "Div 1".into(),
            },
        ];
        let rendered = fixture_grids(&fixtures, &divisions, 42);
        assert!(rendered.contains("Generated with seed: 42"));
        assert!(rendered.contains("=== Div 1 ==="));
        assert!(rendered.contains("AAA1-BBB1"));
        assert!(rendered.contains("BBB1-AAA1"));
        assert!(rendered.contains("Wk11"));
    }

    #[test]
    fn division_counts_accumulate() {
        let fixtures = vec![
            Fixture {
                week: 1,
                home_team: "AAA1".into(),
                away_team: "BBB1".into(),
                division: "Div 1".into(),
            },
            Fixture {
                week: 2,
                home_team: "BBB1".into(),
                away_team: "AAA1".into(),
                division: "Div 1".into(),
            },
        ];
        let table = tabulate_division_counts(&fixtures);
        let rendered = format!("{}", Console::default().render(&table));
        assert!(rendered.contains("Div 1"));
        assert!(rendered.contains('2'));
    }
}
