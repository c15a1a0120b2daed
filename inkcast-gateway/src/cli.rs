//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands;
use crate::config::GatewayConfig;
use crate::error::Result;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "inkcast-gateway")]
#[command(about = "Serves a shared image to e-ink tags over an A7106 radio")]
pub struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(short, long, default_value = "gateway.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the image distribution server
    Serve,

    /// Generate radio addresses with low autocorrelation
    GenId {
        /// Leading hex digit of the address
        #[arg(short, long, default_value = "a", value_parser = parse_nibble)]
        prefix: u8,

        /// Score threshold
        #[arg(short, long, default_value_t = inkcast_core::ident::DEFAULT_THRESHOLD)]
        threshold: u32,

        /// Number of addresses to print
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// Print the autocorrelation of existing addresses
    CheckId {
        /// Addresses in hex
        #[arg(value_name = "HEX", required = true)]
        ids: Vec<String>,
    },

    /// Initialize the radio and dump its registers
    DumpRegs,

    /// Log every packet received on an address
    Listen {
        /// Address to listen on (default: gateway id)
        #[arg(short, long, value_parser = parse_address)]
        address: Option<u32>,
    },

    /// Periodically transmit a timestamp packet
    Beacon {
        /// Address to send to (default: gateway id)
        #[arg(short, long, value_parser = parse_address)]
        address: Option<u32>,

        /// Time between packets in milliseconds
        #[arg(short, long, default_value = "500")]
        interval_ms: u64,
    },
}

fn parse_address(text: &str) -> std::result::Result<u32, String> {
    commands::parse_hex(text).map_err(|e| e.to_string())
}

fn parse_nibble(text: &str) -> std::result::Result<u8, String> {
    match u8::from_str_radix(text, 16) {
        Ok(value) if value <= 0xF => Ok(value),
        _ => Err(format!("{} is not a single hex digit", text)),
    }
}

/// Execute the parsed CLI command.
pub fn run(command: Commands, config: &GatewayConfig) -> Result<()> {
    match command {
        Commands::Serve => commands::serve(config),
        Commands::GenId {
            prefix,
            threshold,
            count,
        } => commands::gen_id(prefix, threshold, count),
        Commands::CheckId { ids } => commands::check_id(&ids),
        Commands::DumpRegs => commands::dump_regs(config),
        Commands::Listen { address } => commands::listen(config, address),
        Commands::Beacon {
            address,
            interval_ms,
        } => commands::beacon(config, address, interval_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nibble() {
        assert_eq!(parse_nibble("a"), Ok(0xA));
        assert_eq!(parse_nibble("F"), Ok(0xF));
        assert!(parse_nibble("10").is_err());
        assert!(parse_nibble("g").is_err());
    }

    #[test]
    fn test_subcommands_parse() {
        let cli = Cli::parse_from(["inkcast-gateway", "gen-id", "-p", "5", "-n", "3"]);
        assert!(matches!(
            cli.command,
            Commands::GenId {
                prefix: 5,
                count: 3,
                ..
            }
        ));
        assert_eq!(cli.config, PathBuf::from("gateway.toml"));

        let cli = Cli::parse_from([
            "inkcast-gateway",
            "--config",
            "/etc/inkcast.toml",
            "listen",
            "--address",
            "0x930b51de",
        ]);
        assert_eq!(cli.config, PathBuf::from("/etc/inkcast.toml"));
        assert!(matches!(
            cli.command,
            Commands::Listen {
                address: Some(0x930B_51DE)
            }
        ));
    }

    #[test]
    fn test_check_id_requires_values() {
        assert!(Cli::try_parse_from(["inkcast-gateway", "check-id"]).is_err());
    }
}
