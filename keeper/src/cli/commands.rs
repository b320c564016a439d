//! Command execution logic.
//!
//! The CLI is the display collaborator: it feeds captures and plain-text
//! interval/max fields into the core, renders countdowns and status
//! transitions, and turns Ctrl-C into the process-wide stop contract.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::debug;
use uuid::Uuid;

use crate::models::{SessionConfig, TargetRequest};
use crate::registry::SessionRegistry;
use crate::transport::{TcpTransport, Transport};

use super::args::{Cli, Commands, RequestSpec};

/// Execute the parsed CLI command.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            requests,
            interval,
            max,
            json,
        } => run(requests, &interval, &max, json).await,
        Commands::Send { request } => send(&request).await,
    }
}

/// Read a capture file into a target request.
fn load_target(spec: &RequestSpec) -> Result<TargetRequest> {
    let raw = std::fs::read(&spec.file)
        .with_context(|| format!("Failed to read capture file {}", spec.file.display()))?;
    if raw.is_empty() {
        bail!("Capture file {} is empty", spec.file.display());
    }
    Ok(TargetRequest::new(
        raw,
        spec.host.clone(),
        spec.port,
        spec.scheme,
    ))
}

/// Run one session per request spec until every session stops or Ctrl-C.
async fn run(requests: Vec<RequestSpec>, interval: &str, max: &str, json: bool) -> Result<()> {
    // The interval/max flags stay text all the way to the core's parser, the
    // same path a host UI's text fields would take.
    let config =
        SessionConfig::parse(interval, max).map_err(|err| anyhow::anyhow!("{err}"))?;

    let transport: Arc<dyn Transport> = Arc::new(TcpTransport);
    let mut registry = SessionRegistry::new(transport);
    let mut ids = Vec::with_capacity(requests.len());

    for spec in &requests {
        let target = load_target(spec)?;
        let id = registry.route_captured_request(target).await;
        let session = registry
            .get_mut(id)
            .context("session vanished after creation")?;
        session
            .set_config(config)
            .await
            .map_err(|err| anyhow::anyhow!("{err}"))?;
        session
            .start()
            .await
            .map_err(|err| anyhow::anyhow!("{err}"))?;
        println!(
            "{}: {} -> {}",
            registry.rendered_status(id).unwrap_or_default(),
            spec.file.display(),
            spec.host
        );
        ids.push(id);
    }

    watch_sessions(&mut registry, &ids).await;
    registry.shutdown_all().await;

    if json {
        let summaries: Vec<_> = registry.sessions().map(crate::session::Session::summary).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for id in &ids {
            if let Some(session) = registry.get(*id) {
                println!(
                    "{}: {} (sent {})",
                    registry.rendered_status(*id).unwrap_or_default(),
                    session.last_status(),
                    session.sent_count()
                );
            }
        }
    }
    Ok(())
}

/// Poll once per second, printing status transitions, until every session
/// has stopped on its own or Ctrl-C requests teardown.
async fn watch_sessions(registry: &mut SessionRegistry, ids: &[Uuid]) {
    let mut last_seen: HashMap<Uuid, String> = HashMap::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Stopping all sessions");
                registry.shutdown_all().await;
                return;
            }
            () = tokio::time::sleep(Duration::from_secs(1)) => {}
        }

        let mut any_running = false;
        for id in ids {
            let Some(session) = registry.get(*id) else {
                continue;
            };
            if session.is_running() {
                any_running = true;
            }
            if let Some(countdown) = session.countdown() {
                debug!(session = session.name(), remaining = *countdown.borrow());
            }
            let status = session.last_status();
            if last_seen.get(id) != Some(&status) {
                println!(
                    "{}: {}",
                    registry.rendered_status(*id).unwrap_or_default(),
                    status
                );
                last_seen.insert(*id, status);
            }
        }

        if !any_running {
            return;
        }
    }
}

/// Replay a capture once and print the outcome.
async fn send(spec: &RequestSpec) -> Result<()> {
    let target = load_target(spec)?;
    println!("Sending {} to {}", spec.file.display(), target.endpoint());

    match TcpTransport.replay(&target).await {
        Ok(Some(response)) => {
            println!("{} {}", response.status_code, response.status_line);
            Ok(())
        }
        Ok(None) => {
            println!("ERROR: No response");
            Ok(())
        }
        Err(err) => bail!("Error: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scheme;
    use std::io::Write;

    fn spec(path: &std::path::Path) -> RequestSpec {
        RequestSpec {
            file: path.to_path_buf(),
            host: "example.com".to_string(),
            port: 8080,
            scheme: Scheme::Http,
        }
    }

    #[test]
    fn test_load_target_reads_raw_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n")
            .unwrap();

        let target = load_target(&spec(file.path())).unwrap();
        assert_eq!(target.host, "example.com");
        assert_eq!(target.port, 8080);
        assert!(target.raw.starts_with(b"GET / HTTP/1.1"));
    }

    #[test]
    fn test_load_target_rejects_empty_capture() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = load_target(&spec(file.path())).unwrap_err();
        assert!(err.to_string().contains("is empty"));
    }

    #[test]
    fn test_load_target_missing_file() {
        let spec = spec(std::path::Path::new("/nonexistent/capture.raw"));
        let err = load_target(&spec).unwrap_err();
        assert!(err.to_string().contains("Failed to read capture file"));
    }
}
