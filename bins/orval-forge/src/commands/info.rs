//! Info command - version and available HTTP clients

use crate::OutputFormat;
use anyhow::Result;
use forge_cli::Status;
use forge_http::ClientType;
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct JsonInfo {
    version: &'static str,
    clients: Vec<ClientInfo>,
}

#[derive(Debug, Serialize)]
struct ClientInfo {
    name: &'static str,
    adapter: &'static str,
    description: &'static str,
}

/// Run info command
pub fn run(format: OutputFormat) -> Result<()> {
    let clients: Vec<ClientInfo> = ClientType::all()
        .iter()
        .map(|t| ClientInfo {
            name: t.as_str(),
            adapter: t.adapter_file(),
            description: t.description(),
        })
        .collect();

    if format == OutputFormat::Json {
        let info = JsonInfo {
            version: env!("CARGO_PKG_VERSION"),
            clients,
        };
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    Status::header("orval-forge");
    Status::detail("Version", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Available HTTP Clients:");
    for client in &clients {
        println!(
            "  {:<8} {} {}",
            client.name.bold(),
            client.description,
            format!("({})", client.adapter).dimmed()
        );
    }
    Ok(())
}
