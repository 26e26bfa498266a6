use anyhow::Result;
use clap::Parser;
use doxygen_search_mcp::cli::{Cli, Commands, require_docs, run_check, run_export, run_search};
use doxygen_search_mcp::{CatalogCache, DocState, SearchServer};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        docs,
        no_cache,
        log_json,
        command,
    } = Cli::parse();

    doxygen_search_mcp::tracing::init(log_json);

    let disk_cache = if no_cache {
        None
    } else {
        CatalogCache::platform_default()
    };
    match &disk_cache {
        Some(cache) => tracing::debug!("Catalog cache at {}", cache.dir().display()),
        None => tracing::debug!("Catalog cache disabled"),
    }
    let state = Arc::new(DocState::new(disk_cache));

    match command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(state, docs).await,
        Commands::Search {
            query,
            section,
            prefix,
            limit,
            json,
        } => {
            let docs = require_docs(docs.as_deref())?;
            let output = run_search(&state, docs, query, section, prefix, limit, json).await?;
            println!("{}", output);
            Ok(())
        }
        Commands::Export { section, format } => {
            let docs = require_docs(docs.as_deref())?;
            print!("{}", run_export(&state, docs, &section, format).await?);
            Ok(())
        }
        Commands::Check => {
            let docs = require_docs(docs.as_deref())?;
            print!("{}", run_check(&state, docs).await?);
            Ok(())
        }
    }
}

async fn serve(state: Arc<DocState>, docs: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting doxygen-search-mcp MCP server");

    if let Some(docs) = docs {
        match state.open(&docs).await {
            Ok(catalog) => tracing::info!(
                "Opened {} ({} entries)",
                catalog.search_dir().display(),
                catalog.entry_count()
            ),
            Err(e) => tracing::warn!("Could not open {}: {:#}", docs.display(), e),
        }
    }

    // Create and serve the MCP server over stdio
    let server = SearchServer::new(state);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    // Wait for the service to complete
    service.waiting().await?;

    Ok(())
}
