//! livecap - live caption translation
//!
//! Entry point for the `livecap` binary: the HTTP API used by the browser
//! overlay plus command line access to each pipeline stage.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use livecap::cli::{Args, Commands, ConfigAction};
use livecap::config::Config;
use livecap::server::{AppState, HttpServer};
use livecap::subtitle::generate_srt;
use livecap::sync::SimulatedClock;
use livecap::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = load_config(args.config.as_deref())?;
    config.apply_env_overrides()?;

    match args.command {
        Commands::Config { action: ConfigAction::Init { output } } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
            return Ok(());
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let workflow = Workflow::new(&config)?;
            let server = HttpServer::new(&config, AppState::new(workflow, &config));
            server.run_with_shutdown(shutdown_signal()).await?;
            info!("HTTP server stopped");
        }
        Commands::Resolve { url } => {
            config.validate()?;
            let workflow = Workflow::new(&config)?;
            println!("{}", workflow.resolve(&url)?);
        }
        Commands::Captions { url, lang, json } => {
            config.validate()?;
            let lang = lang.unwrap_or_else(|| config.captions.default_lang.clone());
            let workflow = Workflow::new(&config)?;

            let track = with_spinner("Fetching captions...", workflow.fetch_captions(&url, &lang)).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&track)?);
            } else {
                println!("{} captions ({}) for {}: {} lines", track.lang, track.source, track.video_id, track.len());
                for line in &track.lines {
                    println!("[{:>8.2} +{:.2}] {}", line.start, line.duration, line.text);
                }
            }
        }
        Commands::Translate { target, source, texts } => {
            config.validate()?;
            let target = target.unwrap_or_else(|| config.translate.default_target.clone());
            let source = source.unwrap_or_else(|| config.translate.default_source.clone());
            let workflow = Workflow::new(&config)?;

            let translations =
                with_spinner("Translating...", workflow.translate(&texts, &target, &source)).await?;

            for translation in translations {
                println!("{}", translation);
            }
        }
        Commands::Play { url, lang, target, start, rate, interval_ms } => {
            if let Some(ms) = interval_ms {
                config.sync.poll_interval_ms = ms;
            }
            config.validate()?;
            let lang = lang.unwrap_or_else(|| config.captions.default_lang.clone());
            let target = target.unwrap_or_else(|| config.translate.default_target.clone());
            let workflow = Workflow::new(&config)?;

            let session = with_spinner(
                "Fetching and translating captions...",
                workflow.prepare_session(&url, &lang, &target),
            )
            .await?;

            info!(
                "Playing {} lines from {:.1}s at {}x",
                session.track().len(),
                start,
                rate
            );
            let clock = SimulatedClock::new(start, rate)?;
            let playback = session.run(&clock, config.sync.poll_interval(), |state, active| match active {
                Some(caption) => {
                    println!("[{:>8.2}] {}", state.current_time, caption.line.text);
                    if !caption.translation.is_empty() {
                        println!("{:>10} {}", "", caption.translation);
                    }
                }
                None => println!("[{:>8.2}]", state.current_time),
            });

            tokio::select! {
                last = playback => info!("Playback finished at {:.2}s", last.current_time),
                _ = shutdown_signal() => info!("Playback interrupted"),
            }
        }
        Commands::Export { url, lang, target, output } => {
            config.validate()?;
            let lang = lang.unwrap_or_else(|| config.captions.default_lang.clone());
            let target = target.unwrap_or_else(|| config.translate.default_target.clone());
            let workflow = Workflow::new(&config)?;

            let session = with_spinner(
                "Fetching and translating captions...",
                workflow.prepare_session(&url, &lang, &target),
            )
            .await?;

            generate_srt(&session.track().lines, session.translations(), &output).await?;
            println!("Wrote {} captions to {}", session.track().len(), output.display());
        }
    }

    Ok(())
}

/// Load `path`, else `./config.toml` if present, else defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

/// Await `future` behind a terminal spinner
async fn with_spinner<F, T>(message: &'static str, future: F) -> Result<T>
where
    F: Future<Output = livecap::error::Result<T>>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = future.await;
    spinner.finish_and_clear();
    Ok(result?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received ctrl-c, shutting down");
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".livecap").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "livecap.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Flushes on drop; must live until exit
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("livecap.log").display()
    );

    Ok(())
}
