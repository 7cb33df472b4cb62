use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use trellis_kernel::test_harness::{run_simulator, SimulatorConfig};
use trellis_kernel::{logging, ExperimentConfig};

fn cli() -> Command {
    Command::new("trellis")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Trellis experiment session kernel")
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run random concurrent sessions against the demo experiment")
                .arg(
                    Arg::new("sessions")
                        .long("sessions")
                        .default_value("32")
                        .value_parser(value_parser!(u64))
                        .help("Number of concurrent sessions"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("max-moves")
                        .long("max-moves")
                        .default_value("60")
                        .value_parser(value_parser!(usize))
                        .help("Move requests per session"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Report only the first violation"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Parse and validate an experiment config file")
                .arg(Arg::new("path").required(true).help("Path to the TOML config")),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    logging::init("info", matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("simulate", args)) => {
            let defaults = SimulatorConfig::default();
            let config = SimulatorConfig {
                seed: args.get_one::<u64>("seed").copied().unwrap_or(defaults.seed),
                sessions: args.get_one::<u64>("sessions").copied().unwrap_or(defaults.sessions),
                max_moves: args
                    .get_one::<usize>("max-moves")
                    .copied()
                    .unwrap_or(defaults.max_moves),
                stop_on_first_violation: args.get_flag("stop-on-violation"),
                ..defaults
            };

            let report = run_simulator(config).await;
            println!("{}", report.generate_text());
            if !report.passed() {
                std::process::exit(1);
            }
        }
        Some(("check-config", args)) => {
            let path = args
                .get_one::<String>("path")
                .context("missing config path")?;
            let config = ExperimentConfig::load(path).with_context(|| format!("checking {path}"))?;
            println!("{} v{}", config.title, config.version);
            match config.session.timeout_secs {
                Some(secs) => println!("  timeout: {secs}s"),
                None => println!("  timeout: none"),
            }
            println!("  debug: {}", config.session.debug);
            let mut targets = config.session.persistence.clone();
            targets.sort_by_key(|t| t.priority);
            for target in targets {
                println!(
                    "  target {} (priority {}, {}{}): {:?}",
                    target.name,
                    target.priority,
                    if target.active { "active" } else { "inactive" },
                    if target.assure_initialization { ", required" } else { "" },
                    target.sink
                );
            }
        }
        _ => {
            cli().print_help()?;
        }
    }
    Ok(())
}
