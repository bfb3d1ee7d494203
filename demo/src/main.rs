//! coprosock demo - one HTTP/1.1 GET over the loopback transport
//!
//! The loopback transport stands in for a WiFi coprocessor: after the request is
//! written, a canned response is queued on the socket's slot as if the peer had
//! answered. Status line and headers are read with `readline`, the body with a
//! sized `read`.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use coprosock::{
    AddrInfoHints, ConnectionMode, LoggingConfig, LoopbackTransport, SocketConfig,
    SocketFactory, StreamSocket,
};
use tracing::{info, warn};

/// Address the loopback transport resolves every demo host to (TEST-NET-1)
const DEMO_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10));

const DEMO_BODY: &str = "hello from the coprocessor\n";

/// Issue an HTTP GET through a coprosock stream socket
#[derive(Parser, Debug)]
#[command(name = "coprosock-demo", version, about)]
struct Cli {
    /// Host to request
    #[arg(default_value = "example.com")]
    host: String,

    /// Request path
    #[arg(default_value = "/")]
    path: String,

    /// Remote port
    #[arg(long, short = 'p', default_value_t = 80)]
    port: u16,

    /// Connect in TLS mode (negotiated by the coprocessor)
    #[arg(long)]
    tls: bool,

    /// Socket configuration file (TOML, YAML or JSON)
    #[arg(long, short = 'c', env = "COPROSOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Line-read timeout in milliseconds; 0 blocks
    #[arg(long, default_value_t = 5_000)]
    timeout_ms: u64,

    /// Log filter directive
    #[arg(long, default_value = "info", env = "COPROSOCK_LOG")]
    log_level: String,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    /// Print link counters as JSON when done
    #[arg(long)]
    metrics: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = if cli.json_logs {
        LoggingConfig::structured(cli.log_level.clone())
    } else {
        LoggingConfig::stderr(cli.log_level.clone())
    };
    logging.init().context("failed to initialize logging")?;

    let config = match &cli.config {
        Some(path) => SocketConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => SocketConfig::default(),
    };

    let transport = Arc::new(LoopbackTransport::new().with_host(&cli.host, DEMO_IP));
    let factory = SocketFactory::new(transport.clone()).with_config(config);

    let infos = factory.getaddrinfo(&cli.host, cli.port, AddrInfoHints::default())?;
    let Some(target) = infos.first() else {
        bail!("no address for {}", cli.host);
    };
    info!(host = %cli.host, addr = %target.addr, "resolved");

    let mut socket = factory.stream()?;
    socket.set_timeout(Some(Duration::from_millis(cli.timeout_ms)))?;
    if cli.tls {
        socket.connect((cli.host.as_str(), cli.port), Some(ConnectionMode::Tls))?;
    } else {
        socket.connect(target.addr, None)?;
    }

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        cli.path, cli.host
    );
    socket.write(request.as_bytes())?;
    transport.push_inbound(socket.handle(), canned_response().as_bytes())?;

    let body = read_response(&mut socket)?;
    print!("{}", String::from_utf8_lossy(&body));
    socket.close()?;

    if cli.metrics {
        let snapshot = factory.metrics().snapshot();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}

fn canned_response() -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        DEMO_BODY.len(),
        DEMO_BODY
    )
}

/// Print status line and headers, return the body
fn read_response(socket: &mut StreamSocket) -> Result<Vec<u8>> {
    let status = socket.readline()?;
    println!("{}", String::from_utf8_lossy(&status));

    let mut content_length = None;
    loop {
        let line = socket.readline()?;
        if line.is_empty() {
            break;
        }
        let header = String::from_utf8_lossy(&line);
        println!("{header}");
        if let Some((name, value)) = header.split_once(':')
            && name.trim().eq_ignore_ascii_case("content-length")
        {
            content_length = Some(
                value
                    .trim()
                    .parse::<usize>()
                    .context("invalid Content-Length")?,
            );
        }
    }
    println!();

    let body = match content_length {
        Some(len) => socket.read(len)?,
        None => socket.read(0)?,
    };
    if let Some(len) = content_length
        && body.len() < len
    {
        warn!(expected = len, got = body.len(), "short body");
    }
    Ok(body.to_vec())
}
