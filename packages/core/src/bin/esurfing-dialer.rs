// Точка входа ESurfing dialer

use anyhow::{Context, Result};
use clap::Parser;
use esurfing_core::config::Config;
use esurfing_core::protocol::probe::HttpPortalProbe;
use esurfing_core::protocol::transport::HttpTransport;
use esurfing_core::protocol::verify::{CodePrompt, HttpSmsVerifier, LinePrompt};
use esurfing_core::state::{CancellationToken, ClientContext, Collaborators, Credentials, Dialer, Shutdown};
use esurfing_core::storage::FileArtifactSink;
use esurfing_core::utils::logging;
use esurfing_core::utils::time::SystemClock;
use esurfing_core::utils::validation::{validate_credentials, validate_mac_address};
use std::io::{self, BufReader, Stdin, Write};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "esurfing-dialer", version, about = "ESurfing captive portal dialer")]
struct Cli {
    /// Login user (phone number or other)
    #[arg(short, long)]
    user: String,

    /// Login user password
    #[arg(short, long)]
    password: String,

    /// Pre-entered SMS verification code
    #[arg(short, long)]
    sms: Option<String>,

    /// MAC address override (aa:bb:cc:dd:ee:ff)
    #[arg(short, long)]
    mac: Option<String>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

/// Чтение SMS-кода с stdin; сигнал остановки прерывает ожидание ввода
struct StdinPrompt {
    input: LinePrompt<BufReader<Stdin>>,
}

impl StdinPrompt {
    fn new(cancel: CancellationToken) -> Self {
        Self {
            input: LinePrompt::new(BufReader::new(io::stdin()), cancel),
        }
    }
}

impl CodePrompt for StdinPrompt {
    fn read_code(&mut self) -> esurfing_core::Result<String> {
        print!("Input Code: ");
        io::stdout().flush()?;
        self.input.read_code()
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut term) = signal(SignalKind::terminate()) {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
            return;
        }
    }
    let _ = tokio::signal::ctrl_c().await;
}

/// Отдельный поток ждёт SIGINT/SIGTERM и отменяет токен.
/// Главный цикл просыпается на ближайшей паузе или в ожидании кода,
/// затем `main` отправляет term-запрос, освобождает сессию и выходит.
fn spawn_signal_listener(cancel: CancellationToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;

    thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            runtime.block_on(wait_for_shutdown_signal());
            info!("Shutting down...");
            cancel.cancel();
        })
        .context("Failed to spawn signal listener")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    validate_credentials(&cli.user, &cli.password)?;
    if let Some(mac) = cli.mac.as_deref().filter(|m| !m.is_empty()) {
        validate_mac_address(mac)?;
    }

    Config::init_from_env().map_err(anyhow::Error::msg)?;
    let config = Config::global().clone();

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone())?;

    let creds = Credentials::new(cli.user, cli.password).with_sms_code(cli.sms.unwrap_or_default());
    let ctx = ClientContext::new(&config, cli.mac);

    let parts = Collaborators {
        probe: Box::new(HttpPortalProbe::new(&config)?),
        transport: Box::new(HttpTransport::new(&config)?),
        verifier: Box::new(HttpSmsVerifier::new(&config)?),
        prompt: Box::new(StdinPrompt::new(cancel.clone())),
        sink: Box::new(FileArtifactSink::new(config.dump_dir.clone())),
        clock: Arc::new(SystemClock::new()),
    };

    let mut dialer = Dialer::new(config, creds, ctx, parts, cancel);
    let outcome = dialer.run();
    dialer.terminate();

    match outcome {
        Ok(Shutdown::Cancelled) => Ok(()),
        Err(e) => {
            error!(error = %e, "Dialer stopped");
            Err(e).context("fatal dialer error")
        }
    }
}
