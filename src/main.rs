use std::process::ExitCode;

use clap::{Arg, ArgAction, Command};
use dnssec_chain::chain_file::parse_timestamp;
use dnssec_chain::{ChainFile, ConfigError, DnsSecValidator, ValidationResult, ValidatorConfig};
use tracing::{error, info};

fn main() -> ExitCode {
    let matches = Command::new("dnssec-chain")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Validate an offline DNSSEC chain of trust")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Validator configuration file (TOML)"),
        )
        .arg(
            Arg::new("at")
                .long("at")
                .value_name("TIME")
                .help("Validate at this time (RFC 3339, YYYYMMDDHHmmSS or epoch seconds)"),
        )
        .arg(
            Arg::new("no-builtin-anchors")
                .long("no-builtin-anchors")
                .help("Do not trust the built-in root KSKs")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v debug, -vv trace)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("chain")
                .value_name("CHAIN_FILE")
                .help("Chain description (TOML)")
                .required(true),
        )
        .get_matches();

    let level = match matches.get_count("verbose") {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{}", e);
            eprintln!("dnssec-chain: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Validate the chain and print one verdict per zone. Returns whether the
/// last zone is secure.
fn run(matches: &clap::ArgMatches) -> Result<bool, ConfigError> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ValidatorConfig::from_file(path)?,
        None => ValidatorConfig::default(),
    };
    config.apply_env()?;
    if matches.get_flag("no-builtin-anchors") {
        config.use_builtin_root_anchors = false;
    }
    config.validate()?;

    let anchors = config.trust_anchor_store()?;
    info!(
        "Loaded {} trust anchors for {} zones",
        anchors.len(),
        anchors.domain_count()
    );

    let mut validator = DnsSecValidator::new();
    if let Some(at) = matches.get_one::<String>("at") {
        validator.set_current_time(parse_timestamp(at)?);
    }

    let chain_path = matches
        .get_one::<String>("chain")
        .ok_or_else(|| ConfigError::Parse("missing chain file".to_string()))?;
    let chain = ChainFile::from_file(chain_path)?.build(config.max_chain_depth)?;

    let verdicts = chain.evaluate(&validator, &anchors);
    for ((_, node), verdict) in chain.iter().zip(&verdicts) {
        println!("{:<40} {}", node.zone().to_string(), verdict);
    }

    Ok(matches!(verdicts.last(), Some(ValidationResult::Secure)))
}
