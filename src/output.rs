//! Emission of solved fixtures: the canonical CSV, an HTML rendering and an
//! optional JSON dump.

use std::fs;
use std::io;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::csv::CsvWriter;
use crate::domain::{Division, Fixture, HALF_SEASON_WEEKS};

/// Output order: by week, then division, then home team.
pub fn sorted_for_output(fixtures: &[Fixture]) -> Vec<&Fixture> {
    let mut sorted: Vec<&Fixture> = fixtures.iter().collect();
    sorted.sort_by(|a, b| {
        (a.week, &a.division, &a.home_team).cmp(&(b.week, &b.division, &b.home_team))
    });
    sorted
}

/// Writes `fixtures.csv`: a seed comment, a header row, then one row per
/// fixture in output order.
pub fn write_fixtures_csv(
    fixtures: &[Fixture],
    path: impl AsRef<Path>,
    seed: u32,
) -> Result<(), io::Error> {
    let mut writer = CsvWriter::create(path)?;
    writer.comment(&format!("# Generated with seed: {seed}"))?;
    writer.append(["game_week", "home_team", "away_team", "division"])?;
    for fixture in sorted_for_output(fixtures) {
        writer.append([
            fixture.week.to_string(),
            fixture.home_team.clone(),
            fixture.away_team.clone(),
            fixture.division.clone(),
        ])?;
    }
    writer.flush()
}

/// Writes an HTML view: one section per division, each split into the two
/// half-seasons with a `Wk<n>` column per week.
pub fn write_fixtures_html(
    fixtures: &[Fixture],
    divisions: &[Division],
    path: impl AsRef<Path>,
    seed: u32,
) -> Result<(), io::Error> {
    let mut by_division: FxHashMap<&str, Vec<&Fixture>> = FxHashMap::default();
    for fixture in fixtures {
        by_division
            .entry(fixture.division.as_str())
            .or_default()
            .push(fixture);
    }

    let mut html = vec![
        "<!DOCTYPE html>".to_string(),
        "<html>".to_string(),
        "<head>".to_string(),
        "<meta charset='utf-8'>".to_string(),
        format!("<title>Cricket League Fixtures (Seed: {seed})</title>"),
        "<style>".to_string(),
        "body { font-family: monospace; font-size: 14px; margin: 20px; }".to_string(),
        ".seed { color: #666; font-size: 12px; margin-bottom: 10px; }".to_string(),
        "h2 { margin-top: 30px; border-bottom: 2px solid #333; padding-bottom: 5px; }".to_string(),
        "h3 { margin: 15px 0 10px 0; color: #555; }".to_string(),
        "table { border-collapse: collapse; margin-bottom: 20px; }".to_string(),
        "th, td { padding: 4px 8px; text-align: center; }".to_string(),
        "th { background: #f0f0f0; }".to_string(),
        "td { border-bottom: 1px solid #ddd; }".to_string(),
        "</style>".to_string(),
        "</head>".to_string(),
        "<body>".to_string(),
        "<h1>Cricket League Fixtures</h1>".to_string(),
        format!("<p class='seed'>Generated with seed: {seed}</p>"),
    ];

    for division in divisions {
        let div_fixtures: &[&Fixture] = by_division
            .get(division.name.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let mut by_week: FxHashMap<u8, Vec<&Fixture>> = FxHashMap::default();
        for &fixture in div_fixtures {
            by_week.entry(fixture.week).or_default().push(fixture);
        }
        for matches in by_week.values_mut() {
            matches.sort_by(|a, b| a.home_team.cmp(&b.home_team));
        }
        let rows = by_week.values().map(Vec::len).max().unwrap_or(0);

        html.push(format!("<h2>{}</h2>", division.name));
        for (label, start_week) in [("Weeks 1-9", 1), ("Weeks 10-18", HALF_SEASON_WEEKS + 1)] {
            html.push(format!("<h3>{label}</h3>"));
            html.push("<table>".to_string());
            html.push("<tr>".to_string());
            for week in start_week..start_week + HALF_SEASON_WEEKS {
                html.push(format!("<th>Wk{week}</th>"));
            }
            html.push("</tr>".to_string());
            for index in 0..rows {
                html.push("<tr>".to_string());
                for week in start_week..start_week + HALF_SEASON_WEEKS {
                    let cell = by_week
                        .get(&week)
                        .and_then(|matches| matches.get(index))
                        .map(|fixture| format!("{}-{}", fixture.home_team, fixture.away_team))
                        .unwrap_or_default();
                    html.push(format!("<td>{cell}</td>"));
                }
                html.push("</tr>".to_string());
            }
            html.push("</table>".to_string());
        }
    }

    html.push("</body>".to_string());
    html.push("</html>".to_string());
    fs::write(path, html.join("\n"))
}

#[derive(Serialize)]
struct SeasonDump<'a> {
    seed: u32,
    fixtures: Vec<&'a Fixture>,
}

/// Writes the fixtures as JSON, in output order, with the seed alongside.
pub fn write_fixtures_json(
    fixtures: &[Fixture],
    path: impl AsRef<Path>,
    seed: u32,
) -> Result<(), io::Error> {
    let file = fs::File::create(path)?;
    let dump = SeasonDump {
        seed,
        fixtures: sorted_for_output(fixtures),
    };
    serde_json::to_writer_pretty(file, &dump)?;
    Ok(())
}
