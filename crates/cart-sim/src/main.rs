use anyhow::Context;
use cart_core::CartConfig;
use cart_sim::{run_demo, run_simulator, SimulatorConfig};
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Command::new("cart-sim")
        .version(cart_sim::VERSION)
        .about("Storefront cart simulator")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("simulate")
                .about("Run a seeded cart session and check invariants")
                .arg(
                    Arg::new("operations")
                        .long("ops")
                        .value_parser(value_parser!(u64))
                        .help("Number of operations to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Simulator config file (TOML)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the report as JSON"),
                ),
        )
        .subcommand(Command::new("demo").about("Play a scripted shopping session"))
        .subcommand(
            Command::new("check-config")
                .about("Validate a cart config file")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Cart config file (TOML)"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("simulate", args)) => {
            let mut config = match args.get_one::<PathBuf>("config") {
                Some(path) => SimulatorConfig::load(path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => SimulatorConfig::default(),
            };
            if let Some(&operations) = args.get_one::<u64>("operations") {
                config.total_operations = operations;
            }
            if let Some(&seed) = args.get_one::<u64>("seed") {
                config.seed = seed;
            }
            if args.get_flag("stop-on-violation") {
                config.stop_on_first_violation = true;
            }

            let report = run_simulator(config).await;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.generate_text());
            }

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("demo", _)) => {
            let (summary, _) = run_demo(std::io::stdout()).await?;
            tracing::info!(order_id = summary.order_id, total = %summary.total, "demo finished");
        }
        Some(("check-config", args)) => {
            let path = args
                .get_one::<PathBuf>("config")
                .context("--config is required")?;
            let config = CartConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?;

            println!("Config OK: {}", path.display());
            println!("  reservation: {}", config.reservation_url());
            println!("  checkout:    {}", config.checkout_url());
            println!("  timeout:     {} ms", config.request_timeout_ms);
            match config.minimum_order {
                Some(minimum) => {
                    println!("  minimum:     {}", minimum.with_symbol(&config.currency_symbol));
                }
                None => println!("  minimum:     none"),
            }
        }
        _ => {}
    }

    Ok(())
}
