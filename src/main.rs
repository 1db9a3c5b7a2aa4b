//! caredash - Customer Care dashboard
//!
//! A CLI tool that signs in to the Customer Care API, fetches table,
//! customer and energy statistics concurrently, and renders them as a
//! Markdown or JSON dashboard.
//!
//! Exit codes:
//!   0   - Dashboard rendered
//!   1   - Runtime error (config, I/O, client setup)
//!   2   - Access denied or redirected (not signed in, wrong user class, missing role)
//!   130 - Cancelled with Ctrl-C before the data arrived

mod access;
mod analysis;
mod api;
mod cli;
mod config;
mod dashboard;
mod models;
mod report;

use access::{AccessDecision, Route, Session};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use dashboard::LoadOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use models::{DashboardReport, ReportMetadata};
use report::RenderOptions;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const EXIT_ACCESS: i32 = 2;
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("caredash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_dashboard(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .caredash.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  .caredash.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .caredash.toml")?;

    println!("✅ Created .caredash.toml with default settings.");
    println!("   Edit it to set the API URL, user and roles.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Sign in, check access, load and render the dashboard. Returns the exit code.
async fn run_dashboard(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let now = Utc::now();
    // Signing in requires a token
    let session = args
        .token
        .clone()
        .map(|token| {
            Session::sign_in(
                config.session.username.clone(),
                config.session.user_class,
                config.session.roles.clone(),
                Some(token),
                now,
                config.session.ttl_minutes,
            )
        })
        .transpose()
        .context("Failed to sign in")?;

    // Decided once, before anything is fetched
    let decision = access::evaluate(session.as_ref(), &Route::Dashboard.requirement(), now);
    info!(
        "Access to {} for {}: {:?}",
        Route::Dashboard,
        session
            .as_ref()
            .map_or("anonymous", |s| s.username.as_str()),
        decision
    );

    let session = match (decision, session) {
        (AccessDecision::Granted, Some(session)) => session,
        (decision, session) => {
            report_refusal(&config, decision)?;
            if let Some(session) = session {
                session.sign_out();
            }
            return Ok(EXIT_ACCESS);
        }
    };

    let reachable: Vec<String> = [
        Route::Dashboard,
        Route::Tables,
        Route::Tariffs,
        Route::Reports,
    ]
    .iter()
    .filter(|route| session.can(route, now))
    .map(|route| route.path())
    .collect();
    debug!("Views available to {}: {}", session.username, reachable.join(", "));

    let client = api::ApiClient::new(config.api.clone(), Some(&session))
        .context("Failed to initialize API client")?;
    info!("Fetching dashboard data from {}", client.base_url());

    let cancel = CancellationToken::new();
    let watcher = spawn_ctrl_c_watcher(cancel.clone());

    let spinner = if args.show_progress() {
        Some(create_spinner())
    } else {
        None
    };

    let outcome = dashboard::load_dashboard(&client, &cancel).await;
    watcher.abort();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let data = match outcome {
        LoadOutcome::Loaded(data) => data,
        LoadOutcome::Cancelled => {
            eprintln!("\n⏹  Cancelled.");
            session.sign_out();
            return Ok(EXIT_CANCELLED);
        }
    };

    let report = DashboardReport {
        metadata: ReportMetadata {
            api_url: client.base_url().to_string(),
            generated_at: Utc::now(),
            username: session.username.clone(),
            user_class: session.user_class.to_string(),
        },
        data,
    };

    let options = RenderOptions {
        top_sites: config.report.top_sites,
        ratio_precision: config.report.ratio_precision,
    };
    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &options),
    };

    emit(&config, &output)?;

    if !args.quiet {
        if let Some(ref path) = config.report.output {
            eprintln!("✅ Dashboard saved to: {}", path);
        }
    }

    session.sign_out();
    Ok(0)
}

/// Tell the user why the dashboard was not shown.
fn report_refusal(config: &Config, decision: AccessDecision) -> Result<()> {
    match decision {
        AccessDecision::Denied { message } => {
            emit(config, &report::render_access_denied(&message))?;
        }
        AccessDecision::RedirectToProfile => {
            eprintln!(
                "↪️  The dashboard is for employees. Your profile is at {}",
                Route::Profile
            );
        }
        AccessDecision::RedirectToLogin | AccessDecision::Granted => {
            eprintln!(
                "🔒 Not signed in. Pass --token (or set CAREDASH_TOKEN) to sign in at {}",
                Route::Login
            );
        }
    }
    Ok(())
}

/// Write rendered output to the configured file, or stdout.
fn emit(config: &Config, output: &str) -> Result<()> {
    match config.report.output {
        Some(ref path) => std::fs::write(path, output)
            .with_context(|| format!("Failed to write dashboard to {}", path)),
        None => {
            println!("{}", output);
            Ok(())
        }
    }
}

/// Cancel `token` when the user presses Ctrl-C.
fn spawn_ctrl_c_watcher(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    })
}

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Fetching tables, sites and statistics...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .caredash.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
