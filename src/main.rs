use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use upwatch::{
    config::Config,
    inventory::load_applications,
    model::{ApplicationDescriptor, CheckReport, CheckedApplication, UpdateDecision},
    output::{print_report, OutputFormat},
    resolver::UpdateResolver,
    scraper::{HttpTransport, ScraperRegistry},
};

/// Exit codes for scripting
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const UPDATES_AVAILABLE: u8 = 10;
}

#[derive(Parser)]
#[command(name = "upwatch")]
#[command(
    author,
    version,
    about = "Check installed applications for newer upstream versions"
)]
struct Cli {
    /// Log progress and scraping details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a list of applications for updates
    Check {
        /// JSON or TOML file listing the applications
        file: PathBuf,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write JSON output to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the number of online checks allowed this session
        #[arg(long)]
        max_checks: Option<usize>,

        /// Exit with code 10 if any update is available
        #[arg(long)]
        fail_on_update: bool,
    },

    /// List the publisher strategies in match order
    ListStrategies,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "upwatch=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load()?;

    match cli.command {
        Commands::Check {
            file,
            format,
            output,
            max_checks,
            fail_on_update,
        } => {
            let mut config = config;
            if let Some(max_checks) = max_checks {
                config.max_checks_per_session = max_checks;
            }
            run_check(&config, file, &format, output, fail_on_update).await
        }
        Commands::ListStrategies => {
            list_strategies(&config)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn build_registry(config: &Config) -> Result<ScraperRegistry> {
    let transport = HttpTransport::new(&config.user_agent, config.request_timeout())?;
    let registry = ScraperRegistry::with_defaults_and_search(Arc::new(transport), &config.search_url);

    Ok(if config.generic_fallback {
        registry
    } else {
        registry.without_fallback()
    })
}

async fn run_check(
    config: &Config,
    file: PathBuf,
    format: &str,
    output_file: Option<PathBuf>,
    fail_on_update: bool,
) -> Result<u8> {
    let format = OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Table;

    let applications = load_applications(&file)?;
    info!("Loaded {} applications from {}", applications.len(), file.display());

    let resolver = UpdateResolver::new(build_registry(config)?, config.resolver_config());
    let results = check_concurrent(&resolver, config, applications, is_interactive).await;
    let report = CheckReport::new(results);

    if let Some(path) = output_file {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)?;
        if is_interactive {
            println!("Results written to: {}", path.display());
        }
    } else {
        print_report(&report, format)?;
    }

    if fail_on_update && report.has_updates() {
        Ok(exit_codes::UPDATES_AVAILABLE)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

/// Resolve all applications concurrently against one shared resolver
async fn check_concurrent(
    resolver: &UpdateResolver,
    config: &Config,
    applications: Vec<ApplicationDescriptor>,
    is_interactive: bool,
) -> Vec<CheckedApplication> {
    let progress = if is_interactive && !applications.is_empty() {
        let pb = ProgressBar::new(applications.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Checking for updates...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let futures: Vec<_> = applications
        .into_iter()
        .map(|application| {
            let pb = progress.as_ref();
            async move {
                let decision = if application.version.trim().is_empty() {
                    UpdateDecision::unresolved(&application.version, "No installed version reported")
                } else if config.ignore.should_ignore(&application) {
                    UpdateDecision::unresolved(&application.version, "Ignored by configuration")
                } else {
                    resolver.resolve_update(&application).await
                };
                if let Some(pb) = pb {
                    pb.inc(1);
                }
                CheckedApplication {
                    application,
                    decision,
                }
            }
        })
        .collect();

    let results = join_all(futures).await;

    if let Some(pb) = progress {
        let updates = results.iter().filter(|r| r.decision.has_update).count();
        pb.finish_with_message(format!("Found {} updates", updates));
    }

    results
}

fn list_strategies(config: &Config) -> Result<()> {
    let registry = build_registry(config)?;

    println!("Publisher strategies (first match wins):");
    println!();

    for strategy in registry.strategies() {
        println!("  {:<12} {}", strategy.publisher_key(), strategy.name());
        println!("  {:<12} Source: {}", "", strategy.source_url());
        println!();
    }

    match registry.fallback() {
        Some(fallback) => {
            println!("  {:<12} {}", "(fallback)", fallback.name());
            println!("  {:<12} Source: {}", "", fallback.source_url());
        }
        None => println!("  Fallback search disabled."),
    }

    Ok(())
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'upwatch config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
