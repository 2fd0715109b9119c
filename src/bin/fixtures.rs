use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info, warn};

use willow::data::{
    load_divisions, load_fixed_matches, load_venue_conflicts, load_venue_requirements,
};
use willow::output::{write_fixtures_csv, write_fixtures_html, write_fixtures_json};
use willow::print::{fixture_grids, tabulate_division_counts};
use willow::solver::{generate, GroundShareMode, SolverConfig};
use willow::timed::Timed;
use willow::validation::{conflict_violations, cross_division_violations, validate_fixtures};

const SHOWN_ISSUES: usize = 10;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// directory holding divisions.csv, fixReq.csv, venReq.csv and
    /// (optionally) venConflicts.csv
    #[clap(short = 'd', long, default_value = "data")]
    data_dir: PathBuf,

    /// directory the fixture outputs are written to
    #[clap(short = 'o', long, default_value = "output")]
    out_dir: PathBuf,

    /// seed for reproducible generation; drawn at random when omitted
    #[clap(short = 's', long)]
    seed: Option<u32>,

    /// solver budget in seconds; the full-season strategy gets three times this
    #[clap(short = 't', long, default_value_t = 300)]
    time_limit: u64,

    /// engine worker threads
    #[clap(short = 'w', long, default_value_t = 8)]
    workers: usize,

    /// also dump fixtures.json
    #[clap(short = 'j', long)]
    json: bool,

    /// penalize ground sharing by division tier instead of excluding it outright
    #[clap(long)]
    soft_grounds: bool,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if !self.data_dir.is_dir() {
            bail!("data directory {} does not exist", self.data_dir.display());
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let divisions = load_divisions(args.data_dir.join("divisions.csv"))?;
    let fixed_matches = load_fixed_matches(args.data_dir.join("fixReq.csv"))?;
    let venue_requirements = load_venue_requirements(args.data_dir.join("venReq.csv"))?;
    let venue_conflicts = load_venue_conflicts(args.data_dir.join("venConflicts.csv"))?;
    info!(
        "loaded {} divisions, {} fixed matches, {} venue requirements, {} conflict groups",
        divisions.len(),
        fixed_matches.len(),
        venue_requirements.len(),
        venue_conflicts.len()
    );

    let config = SolverConfig {
        time_limit: Duration::from_secs(args.time_limit),
        workers: args.workers,
        ground_share: if args.soft_grounds {
            GroundShareMode::TierWeighted
        } else {
            GroundShareMode::Auto
        },
        ..SolverConfig::default()
    };

    let timed = Timed::run(|| {
        generate(
            &divisions,
            &fixed_matches,
            &venue_requirements,
            &venue_conflicts,
            args.seed,
            &config,
        )
    });
    let generation = timed.value;
    info!("solve took {:.1?}", timed.elapsed);

    if generation.fixtures.is_empty() {
        // infeasibility is an outcome, not an error: report and exit cleanly
        warn!(
            "no fixtures could be generated with seed {}; nothing written",
            generation.seed
        );
        return Ok(());
    }
    if let Some(strategy) = generation.strategy {
        info!(
            "strategy {strategy} succeeded with penalty {}",
            generation.objective.unwrap_or_default()
        );
    }

    fs::create_dir_all(&args.out_dir)?;
    write_fixtures_csv(
        &generation.fixtures,
        args.out_dir.join("fixtures.csv"),
        generation.seed,
    )?;
    write_fixtures_html(
        &generation.fixtures,
        &divisions,
        args.out_dir.join("fixtures.html"),
        generation.seed,
    )?;
    if args.json {
        write_fixtures_json(
            &generation.fixtures,
            args.out_dir.join("fixtures.json"),
            generation.seed,
        )?;
    }

    let grids = fixture_grids(&generation.fixtures, &divisions, generation.seed);
    println!("{grids}");
    fs::write(args.out_dir.join("fixtures.txt"), &grids)?;

    println!("{}", Console::default().render(&tabulate_division_counts(&generation.fixtures)));
    println!("Total fixtures: {}", generation.fixtures.len());

    let issues = validate_fixtures(&generation.fixtures, &divisions);
    report("validation issue", &issues);

    let clashes = if venue_conflicts.is_empty() {
        cross_division_violations(&generation.fixtures, &divisions)
    } else {
        conflict_violations(&generation.fixtures, &venue_conflicts)
    };
    report("ground-sharing clash", &clashes);

    info!("outputs written to {}", args.out_dir.display());
    Ok(())
}

fn report(noun: &str, findings: &[String]) {
    if findings.is_empty() {
        println!("No {noun}s.");
        return;
    }
    println!("{} {noun}(s):", findings.len());
    for finding in findings.iter().take(SHOWN_ISSUES) {
        println!("  - {finding}");
    }
    if findings.len() > SHOWN_ISSUES {
        println!("  ... and {} more", findings.len() - SHOWN_ISSUES);
    }
}
