//! Command line front end for Bedrock process spaces
//!
//! ```text
//! bedrock-space sample   --config space.toml [--seed N] [--count N] [--format json|yaml]
//! bedrock-space describe --config space.toml
//! bedrock-space defaults --config space.toml
//! ```

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bedrock_space::{FrozenSpace, SampledConfiguration};
use bedrock_spec::{BuilderRegistry, ProcSpec, ProviderSpaceFactory, SpaceConfig};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

/// Build the argument parser
#[must_use]
pub fn command() -> Command {
    let config = Arg::new("config")
        .long("config")
        .short('c')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Space config file (.toml, .json, .yaml)");
    let address = Arg::new("address")
        .long("address")
        .default_value("na+sm")
        .help("Address recorded in the specification");
    let format = Arg::new("format")
        .long("format")
        .default_value("json")
        .value_parser(["json", "yaml"])
        .help("Output format");
    let indent = Arg::new("indent")
        .long("indent")
        .default_value("4")
        .value_parser(value_parser!(usize))
        .help("JSON indentation, 0 for compact");

    Command::new("bedrock-space")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sample process specifications from Bedrock configuration spaces")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("sample")
                .about("Sample configurations and materialize them")
                .arg(config.clone())
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .short('n')
                        .default_value("1")
                        .value_parser(value_parser!(usize))
                        .help("Number of specifications to sample"),
                )
                .arg(
                    Arg::new("flat")
                        .long("flat")
                        .action(ArgAction::SetTrue)
                        .help("Print flat configurations instead of specifications"),
                )
                .arg(address.clone())
                .arg(format.clone())
                .arg(indent.clone()),
        )
        .subcommand(
            Command::new("describe")
                .about("Print the frozen configuration space")
                .arg(config.clone()),
        )
        .subcommand(
            Command::new("defaults")
                .about("Materialize the default configuration")
                .arg(config)
                .arg(address)
                .arg(format)
                .arg(indent),
        )
}

/// Install the global tracing subscriber
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Logs go to stderr.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Registry with every builder kind this binary knows
#[must_use]
pub fn registry() -> BuilderRegistry {
    let mut registry = BuilderRegistry::with_defaults();
    bedrock_warabi::register(&mut registry);
    registry
}

/// Run the parsed subcommand, writing results to `out`
///
/// # Errors
/// Config, construction, validation, or output errors
pub fn run(matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    match matches.subcommand() {
        Some(("sample", args)) => sample(args, out),
        Some(("describe", args)) => {
            let (space, _) = load(args)?;
            write!(out, "{space}")?;
            Ok(())
        }
        Some(("defaults", args)) => {
            let (space, factories) = load(args)?;
            let config = space.default_configuration();
            emit(args, &config, &factories, out)
        }
        _ => anyhow::bail!("no subcommand given"),
    }
}

fn sample(args: &ArgMatches, out: &mut impl Write) -> Result<()> {
    let (space, factories) = load(args)?;
    let seed = args
        .get_one::<u64>("seed")
        .copied()
        .unwrap_or_else(rand::random);
    let count = args.get_one::<usize>("count").copied().unwrap_or(1);
    tracing::info!(seed, count, "sampling");

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..count {
        let config = space.sample_configuration(&mut rng);
        if args.get_flag("flat") {
            writeln!(out, "{}", config.to_json()?)?;
        } else {
            emit(args, &config, &factories, out)?;
        }
    }
    Ok(())
}

fn load(args: &ArgMatches) -> Result<(FrozenSpace, Vec<ProviderSpaceFactory>)> {
    let path = args
        .get_one::<PathBuf>("config")
        .context("missing --config")?;
    let config = SpaceConfig::from_path(path)
        .with_context(|| format!("loading {}", path.display()))?;

    let registry = registry();
    let factories = config.to_factories(&registry)?;
    let space = config
        .to_builder(&registry)?
        .build()?
        .freeze()
        .context("space failed validation")?;
    tracing::info!(parameters = space.len(), "space ready");
    Ok((space, factories))
}

fn emit(
    args: &ArgMatches,
    config: &SampledConfiguration,
    factories: &[ProviderSpaceFactory],
    out: &mut impl Write,
) -> Result<()> {
    let address = args
        .get_one::<String>("address")
        .map_or("na+sm", String::as_str);
    let spec = ProcSpec::from_config_with(address, config, factories)?;

    match args.get_one::<String>("format").map(String::as_str) {
        Some("yaml") => write!(out, "---\n{}", spec.to_yaml()?)?,
        _ => {
            let indent = args.get_one::<usize>("indent").copied().unwrap_or(4);
            writeln!(out, "{}", spec.to_json(indent)?)?;
        }
    }
    Ok(())
}
