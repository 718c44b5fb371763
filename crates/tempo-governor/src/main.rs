//! `tempo-governor` command line: simulation, hint parsing and config checks

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::time::Duration;
use tempo_governor::hint::parse_backoff_hint;
use tempo_governor::logging::{init_tracing, LogFormat};
use tempo_governor::test_harness::{run_simulator, JitterMode, ScriptStep, SimulatorConfig};
use tempo_governor::GovernorConfig;

fn cli() -> Command {
    Command::new("tempo-governor")
        .version(tempo_governor::VERSION)
        .about("Loop governor: pacing and backoff for periodic work")
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("plain")
                .value_parser(value_parser!(LogFormat))
                .help("Log output format (plain or json)"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Replay an outcome script on virtual time and print the sleeps")
                .arg(
                    Arg::new("script")
                        .long("script")
                        .default_value("ok")
                        .help("Comma separated steps: ok, fail, nohint, fatal, hint:<dur>, throttle:<msg>"),
                )
                .arg(
                    Arg::new("cycles")
                        .long("cycles")
                        .default_value("3")
                        .value_parser(value_parser!(NonZeroU64))
                        .help("Number of cycles to run"),
                )
                .arg(
                    Arg::new("work-secs")
                        .long("work-secs")
                        .default_value("0")
                        .value_parser(value_parser!(f64))
                        .help("Virtual seconds spent inside each cycle"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML governor config (defaults used if omitted)"),
                )
                .arg(
                    Arg::new("jitter")
                        .long("jitter")
                        .default_value("0.4")
                        .value_parser(value_parser!(f64))
                        .help("Fixed jitter draw in [0, 1)"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .conflicts_with("jitter")
                        .help("Seed for pseudo-random jitter instead of a fixed draw"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("parse-hint")
                .about("Extract the backoff hint from an error message")
                .arg(Arg::new("message").required(true).help("Error message text")),
        )
        .subcommand(
            Command::new("check-config")
                .about("Load and validate a TOML governor config")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Path to config file"),
                ),
        )
}

fn simulate(args: &ArgMatches) -> Result<bool> {
    let script = args
        .get_one::<String>("script")
        .map_or("ok", String::as_str);
    let cycles = args
        .get_one::<NonZeroU64>("cycles")
        .copied()
        .context("missing --cycles")?;
    let work_secs = args.get_one::<f64>("work-secs").copied().unwrap_or_default();
    let work = Duration::try_from_secs_f64(work_secs).context("invalid --work-secs")?;

    let governor = match args.get_one::<PathBuf>("config") {
        Some(path) => GovernorConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GovernorConfig::default(),
    };
    let jitter = match args.get_one::<u64>("seed") {
        Some(seed) => JitterMode::Seeded(*seed),
        None => JitterMode::Fixed(args.get_one::<f64>("jitter").copied().unwrap_or(0.4)),
    };

    let config = SimulatorConfig {
        governor,
        cycles,
        script: ScriptStep::parse_script(script)?,
        work,
        jitter,
    };
    tracing::info!(%script, cycles = cycles.get(), "simulating");

    let report = run_simulator(config)?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        print!("{}", report.generate_text());
    }
    Ok(report.completed())
}

fn parse_hint(args: &ArgMatches) -> Result<bool> {
    let message = args
        .get_one::<String>("message")
        .context("missing message")?;
    match parse_backoff_hint(message) {
        Some(hint) => println!("hint: {}s", hint.as_secs_f64()),
        None => println!("no hint"),
    }
    Ok(true)
}

fn check_config(args: &ArgMatches) -> Result<bool> {
    let path = args.get_one::<PathBuf>("path").context("missing path")?;
    let config = GovernorConfig::load(path)
        .with_context(|| format!("validating {}", path.display()))?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(true)
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let format = matches
        .get_one::<LogFormat>("log-format")
        .copied()
        .unwrap_or_default();
    init_tracing(format);

    let ok = match matches.subcommand() {
        Some(("simulate", args)) => simulate(args)?,
        Some(("parse-hint", args)) => parse_hint(args)?,
        Some(("check-config", args)) => check_config(args)?,
        _ => true,
    };

    std::process::exit(if ok { 0 } else { 1 });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn simulate_parses_arguments() {
        let matches = cli()
            .try_get_matches_from([
                "tempo-governor",
                "simulate",
                "--script",
                "fail",
                "--cycles",
                "3",
                "--work-secs",
                "1",
                "--json",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "simulate");
        assert_eq!(args.get_one::<NonZeroU64>("cycles").map(|n| n.get()), Some(3));
        assert!(args.get_flag("json"));
    }

    #[test]
    fn zero_cycles_rejected() {
        let result = cli().try_get_matches_from(["tempo-governor", "simulate", "--cycles", "0"]);
        assert!(result.is_err());
    }
}
