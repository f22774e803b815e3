mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use socket_lab_abstract::{DEFAULT_BUFFER_SIZE, EchoOverride, LabConfig, TransferOverride};
use socket_lab_core::{EchoClient, EchoServer, FileReceiver, FileSender, RECEIVED_TARGET};

#[derive(Parser, Debug)]
#[command(author, version, about = "TCP echo and UDP file transfer lab programs")]
struct Args {
    /// TOML profile applied over the built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reply "message received" to every line until the client sends "exit".
    EchoServer {
        #[arg(long)]
        bind: Option<SocketAddr>,
        #[arg(long)]
        backlog: Option<u32>,
        /// Serve a single client, then exit.
        #[arg(long, default_value_t = false)]
        once: bool,
    },

    /// Send lines typed on stdin to the echo server and print its replies.
    EchoClient {
        #[arg(long)]
        server: Option<SocketAddr>,
    },

    /// Receive one file over UDP: first datagram is the file name.
    FileReceiver {
        #[arg(long)]
        bind: Option<SocketAddr>,
        /// Directory received files are confined to.
        #[arg(long)]
        base_dir: Option<PathBuf>,
        /// Write to the requested path as-is, even absolute or with `..`.
        #[arg(long, default_value_t = false)]
        trust_paths: bool,
        /// Drop datagrams that do not come from the sender of the file name.
        #[arg(long, default_value_t = false)]
        pin_sender: bool,
        #[arg(long)]
        idle_timeout_ms: Option<u64>,
        /// Write a JSON summary of the finished transfer.
        #[arg(long)]
        report_out: Option<PathBuf>,
    },

    /// Send a local file to a file receiver.
    FileSender {
        #[arg(long)]
        to: SocketAddr,
        /// File name announced to the receiver.
        #[arg(long)]
        dest: String,
        #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
        chunk_size: usize,
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let mut config = settings::load_config(args.config.as_deref())?;
    match args.command {
        Command::EchoServer {
            bind,
            backlog,
            once,
        } => {
            EchoOverride {
                bind,
                backlog,
                ..Default::default()
            }
            .apply_to(&mut config.echo);
            run_echo_server(&config, once).await
        }
        Command::EchoClient { server } => {
            EchoOverride {
                server,
                ..Default::default()
            }
            .apply_to(&mut config.echo);
            run_echo_client(&config).await
        }
        Command::FileReceiver {
            bind,
            base_dir,
            trust_paths,
            pin_sender,
            idle_timeout_ms,
            report_out,
        } => {
            TransferOverride {
                bind,
                base_dir,
                trust_paths: trust_paths.then_some(true),
                pin_sender: pin_sender.then_some(true),
                idle_timeout_ms,
                ..Default::default()
            }
            .apply_to(&mut config.transfer);
            run_file_receiver(&config, report_out.as_deref()).await
        }
        Command::FileSender {
            to,
            dest,
            chunk_size,
            file,
        } => run_file_sender(to, &dest, chunk_size, &file).await,
    }
}

fn init_logging() {
    // stdout belongs to the interactive client.
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

/// `RUST_LOG` (default `info`) with the echo server's `received` lines
/// forced on, since they are the server's output rather than diagnostics.
fn log_filter(rust_log: Option<&str>) -> String {
    let base = rust_log.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("info");
    format!("{base},{RECEIVED_TARGET}=info")
}

async fn run_echo_server(config: &LabConfig, once: bool) -> Result<()> {
    let server = EchoServer::bind(&config.echo)
        .await
        .context("Failed to start echo server")?;

    if once {
        let summary = server.serve_one().await?;
        info!(
            "Session with {} ended ({:?}) after {} message(s)",
            summary.peer, summary.reason, summary.messages
        );
    } else {
        server.serve(shutdown_signal()).await?;
    }
    Ok(())
}

async fn run_echo_client(config: &LabConfig) -> Result<()> {
    let mut client = EchoClient::connect(config.echo.server, config.echo.max_frame).await?;
    let input = BufReader::new(tokio::io::stdin());
    let exit = client.run(input, tokio::io::stdout()).await?;
    info!("Echo client finished: {exit:?}");
    Ok(())
}

async fn run_file_receiver(config: &LabConfig, report_out: Option<&Path>) -> Result<()> {
    let receiver = FileReceiver::bind(&config.transfer).await?;
    let report = receiver.receive().await.context("File transfer failed")?;

    if let Some(path) = report_out {
        write_report(path, &report)?;
    }
    Ok(())
}

async fn run_file_sender(to: SocketAddr, dest: &str, chunk_size: usize, file: &Path) -> Result<()> {
    let sender = FileSender::connect(to, chunk_size).await?;
    let report = sender
        .send_file(dest, file)
        .await
        .with_context(|| format!("Failed to send {}", file.display()))?;
    info!(
        "Sent {} bytes in {} datagrams to {}",
        report.bytes, report.datagrams, report.target
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C ({e}); stop the server with a signal instead");
        std::future::pending::<()>().await;
    }
}

fn write_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize transfer report")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write report file {}", path.display()))?;
    Ok(())
}
