use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use clap::{Args, Subcommand};
use satlink_ingest::config::DEFAULT_PORT;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the ingestion service and print decoded frames.
    Listen(ListenArgs),
    /// Decode one hex frame offline and show the alerts it would raise.
    Decode(DecodeArgs),
    /// Send one hex datagram.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind.
    #[arg(long, env = "SATLINK_UDP_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    /// UDP port to bind.
    #[arg(long, env = "SATLINK_UDP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Exit after decoding N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex frame text; whitespace and 0x markers are ignored.
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Target host.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    /// Target UDP port.
    #[arg(long, env = "SATLINK_UDP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Datagram text, sent as-is.
    #[arg(long)]
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Resolve `host:port` to the first address it names.
pub fn resolve_target(host: &str, port: u16) -> CliResult<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(|err| CliError::new(USAGE, format!("cannot resolve {host}: {err}")))?
        .next()
        .ok_or_else(|| CliError::new(USAGE, format!("{host} resolved to no addresses")))
}
