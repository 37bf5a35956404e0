//! Collection GraphQL - build a schema from collection definitions
//!
//! Prints the schema SDL or runs one query against the in-memory collections
//! described by the definition file.

mod cli;

use std::io::Read;

use anyhow::Context;
use async_graphql::{Request, Variables};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use collection_graphql::collection::CollectionsFile;
use collection_graphql::config::{AdapterConfig, LogFormat, Settings};
use collection_graphql::graphql;

use crate::cli::CliOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    let options = CliOptions::from_args();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "collection_graphql=info".into());
    // stdout carries the query result; logs go to stderr
    match settings.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    let path = options
        .collections
        .clone()
        .unwrap_or_else(|| settings.collections_path.clone());
    let definitions = CollectionsFile::load(&path)
        .with_context(|| format!("Failed to load collections from {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        collections = definitions.collections.len(),
        "Collection definitions loaded"
    );

    let config = AdapterConfig::new(definitions.into_collections())
        .expose_query_language(settings.expose_query_language || options.expose_query_language);
    let schema = graphql::build(&config)?;

    if options.print_sdl {
        println!("{}", schema.sdl());
        return Ok(());
    }

    let query = match options.query {
        Some(query) => query,
        None => {
            let mut query = String::new();
            std::io::stdin()
                .read_to_string(&mut query)
                .context("Failed to read query from stdin")?;
            query
        }
    };

    let mut request = Request::new(query);
    if let Some(ref variables) = options.variables {
        let variables: serde_json::Value =
            serde_json::from_str(variables).context("Invalid --variables JSON")?;
        request = request.variables(Variables::from_json(variables));
    }

    let response = schema.execute(request).await;
    if !response.errors.is_empty() {
        tracing::warn!(errors = response.errors.len(), "Query finished with errors");
    }
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
