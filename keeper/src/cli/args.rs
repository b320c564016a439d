//! CLI argument definitions.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};

use crate::models::Scheme;

/// Keeper - keep captured requests alive by replaying them on an interval
#[derive(Parser, Debug)]
#[command(name = "keeper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay one or more captured requests on an interval until stopped
    Run {
        /// Captured request to keep alive: <file>@<host>:<port>[:<scheme>].
        /// Repeat for multiple independent sessions.
        #[arg(short = 'r', long = "request", required = true)]
        requests: Vec<RequestSpec>,

        /// Seconds between replays
        #[arg(short, long, default_value = "10")]
        interval: String,

        /// Maximum replays per session before it auto-stops (empty = unlimited)
        #[arg(short, long, default_value = "")]
        max: String,

        /// Print final per-session summaries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send a captured request once and print the outcome
    Send {
        /// Captured request: <file>@<host>:<port>[:<scheme>]
        #[arg(short = 'r', long = "request")]
        request: RequestSpec,
    },
}

/// One captured request and where to replay it.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// File holding the raw request bytes.
    pub file: PathBuf,
    /// Destination host.
    pub host: String,
    /// Destination port.
    pub port: u16,
    /// Endpoint scheme. Defaults to https for port 443, http otherwise.
    pub scheme: Scheme,
}

impl FromStr for RequestSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (file, endpoint) = s
            .split_once('@')
            .ok_or_else(|| format!("expected <file>@<host>:<port>[:<scheme>], got '{s}'"))?;
        if file.is_empty() {
            return Err("capture file path is empty".to_string());
        }

        let mut parts = endpoint.split(':');
        let host = parts
            .next()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| format!("missing host in '{endpoint}'"))?;
        let port = parts
            .next()
            .ok_or_else(|| format!("missing port in '{endpoint}'"))?
            .parse::<u16>()
            .map_err(|_| format!("invalid port in '{endpoint}'"))?;
        let scheme = match parts.next() {
            Some(text) => {
                Scheme::from_str(text).ok_or_else(|| format!("unknown scheme '{text}'"))?
            }
            None if port == Scheme::Https.default_port() => Scheme::Https,
            None => Scheme::Http,
        };
        if parts.next().is_some() {
            return Err(format!("trailing fields in '{endpoint}'"));
        }

        Ok(Self {
            file: PathBuf::from(file),
            host: host.to_string(),
            port,
            scheme,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_with_scheme() {
        let spec: RequestSpec = "login.raw@app.internal:8443:https".parse().unwrap();
        assert_eq!(spec.file, PathBuf::from("login.raw"));
        assert_eq!(spec.host, "app.internal");
        assert_eq!(spec.port, 8443);
        assert_eq!(spec.scheme, Scheme::Https);
    }

    #[test]
    fn test_spec_scheme_defaults_by_port() {
        let spec: RequestSpec = "r.raw@example.com:443".parse().unwrap();
        assert_eq!(spec.scheme, Scheme::Https);
        let spec: RequestSpec = "r.raw@example.com:8080".parse().unwrap();
        assert_eq!(spec.scheme, Scheme::Http);
    }

    #[test]
    fn test_spec_rejects_malformed_input() {
        assert!("no-endpoint.raw".parse::<RequestSpec>().is_err());
        assert!("r.raw@:80".parse::<RequestSpec>().is_err());
        assert!("r.raw@example.com".parse::<RequestSpec>().is_err());
        assert!("r.raw@example.com:notaport".parse::<RequestSpec>().is_err());
        assert!("r.raw@example.com:80:gopher".parse::<RequestSpec>().is_err());
        assert!("r.raw@example.com:80:http:extra".parse::<RequestSpec>().is_err());
    }

    #[test]
    fn test_cli_parses_run_command() {
        let cli = Cli::try_parse_from([
            "keeper",
            "run",
            "--request",
            "a.raw@example.com:80",
            "--request",
            "b.raw@example.com:8080",
            "--interval",
            "5",
            "--max",
            "20",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                requests,
                interval,
                max,
                json,
            } => {
                assert_eq!(requests.len(), 2);
                assert_eq!(interval, "5");
                assert_eq!(max, "20");
                assert!(!json);
            }
            Commands::Send { .. } => panic!("expected run command"),
        }
    }
}
