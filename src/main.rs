use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use chainfeed::config::{Config, SourceKind};
use chainfeed::headless::{self, OutputFormat};
use chainfeed::pipeline::{self, Pipeline};
use chainfeed::ExclusionSet;
use chainfeed_tui::FeedLink;
use clap::{Parser, ValueEnum};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Stdin,
    File,
    Ws,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Stdin => SourceKind::Stdin,
            SourceArg::File => SourceKind::File,
            SourceArg::Ws => SourceKind::Ws,
        }
    }
}

#[derive(Parser)]
#[command(name = "chainfeed", about = "Live feed of chain-node system events")]
struct Cli {
    /// Where events come from. Overrides `[source] kind`.
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// JSON-lines file to read when `--source file`.
    #[arg(long)]
    path: Option<PathBuf>,

    /// WebSocket JSON-RPC endpoint when `--source ws`.
    #[arg(long)]
    url: Option<String>,

    /// Subscribe method when `--source ws`.
    #[arg(long)]
    method: Option<String>,

    /// Print entries to stdout instead of starting the TUI.
    #[arg(long)]
    headless: bool,

    /// Output format for `--headless`.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Cap on the feed pane height, in rows.
    #[arg(long)]
    max_height: Option<u16>,

    /// Write debug logs to /tmp/chainfeed-debug.log (tail -f to inspect).
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(kind) = self.source {
            config.source.kind = kind.into();
        }
        if let Some(path) = &self.path {
            config.source.path = Some(path.clone());
            // A bare --path implies a file source.
            if self.source.is_none() {
                config.source.kind = SourceKind::File;
            }
        }
        if let Some(url) = &self.url {
            config.source.url = url.clone();
        }
        if let Some(method) = &self.method {
            config.source.method = method.clone();
        }
        if let Some(h) = self.max_height {
            config.feed.max_height = h;
        }
    }
}

/// How long leftover runtime work (a stdin read blocked on the blocking pool)
/// may hold up exit.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/chainfeed-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("chainfeed debug log started, tail -f /tmp/chainfeed-debug.log");
    }

    let mut config = Config::load()?;
    cli.apply(&mut config);
    tracing::debug!(source = %config.source.kind, headless = cli.headless, "starting");

    if !cli.headless {
        pipeline::check_tui_source(&config.source, std::io::stdin().is_terminal())?;
    }

    let runtime = Runtime::new()?;
    let result = if cli.headless {
        runtime.block_on(run_headless(config, cli.format))
    } else {
        run_tui(&runtime, config)
    };
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

fn run_tui(runtime: &Runtime, config: Config) -> anyhow::Result<()> {
    let source = runtime.block_on(pipeline::source_from_config(&config.source))?;
    let source_name = source.name().to_string();
    let pipeline = {
        let _guard = runtime.enter();
        Pipeline::start(source, ExclusionSet::default())
    };

    let handle = pipeline.handle().clone();
    let link = FeedLink {
        state: pipeline.state(),
        commands: pipeline.commands(),
        source: source_name,
        live: Box::new(move || handle.is_active()),
    };

    let ui_result = chainfeed_tui::run(link, config);

    let (source_result, final_state) = runtime.block_on(pipeline.shutdown());
    tracing::debug!(entries = final_state.len(), "pipeline stopped");
    if let Err(e) = source_result {
        tracing::warn!(error = %e, "source ended with an error");
        if ui_result.is_ok() {
            eprintln!("chainfeed: source error: {e}");
        }
    }
    ui_result
}

async fn run_headless(config: Config, format: OutputFormat) -> anyhow::Result<()> {
    let source = pipeline::source_from_config(&config.source).await?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut stdout = std::io::stdout().lock();
    let printed = headless::run(source, ExclusionSet::default(), format, &mut stdout, cancel).await?;
    tracing::debug!(printed, "headless run finished");
    Ok(())
}
