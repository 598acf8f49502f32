//! Canvas LMS API CLI binary.
//!
//! A command-line interface for running Canvas resource operations.

use std::process::ExitCode;

use bytes::Bytes;
use canvasapi::cli::{Cli, Command};
use canvasapi::{ActionItem, BinaryPayload, CanvasClient, Dispatcher, Resource};
use clap::Parser;
use serde_json::Value;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("canvasapi=info")),
        )
        .init();

    let cli = Cli::parse();

    let client = match CanvasClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Set CANVAS_DOMAIN and CANVAS_ACCESS_TOKEN environment variables");
            return ExitCode::FAILURE;
        }
    };

    match run(client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: CanvasClient, cli: Cli) -> canvasapi::Result<()> {
    let Command::Run {
        resource,
        operation,
        params,
        file,
        content_type,
        continue_on_fail,
        all,
        limit,
    } = cli.command;

    let resource: Resource = resource.parse()?;

    let mut params = match serde_json::from_str::<Value>(&params)? {
        Value::Object(map) => map,
        _ => {
            eprintln!("Error: --params must be a JSON object");
            return Err(canvasapi::CanvasError::MissingParameter("params"));
        }
    };
    if all {
        params.insert("returnAll".to_string(), Value::Bool(true));
    }
    if let Some(limit) = limit {
        params.insert("limit".to_string(), Value::from(limit));
    }

    let mut item = ActionItem::new(params);
    if let Some(path) = file {
        let data = std::fs::read(&path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        item = item.with_binary(BinaryPayload {
            file_name,
            content_type,
            data: Bytes::from(data),
        });
    }

    let mut dispatcher = Dispatcher::new(client).continue_on_fail(continue_on_fail);
    let records = dispatcher.execute(resource, &operation, vec![item]).await?;

    let output: Vec<Value> = records.into_iter().map(|record| record.json).collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
