//! MCP server exposing Doxygen search indexes as tools.

use crate::schema::inline_schema_for_type;
use crate::state::DocState;
use crate::tools::list_sections::handle_list_sections;
use crate::tools::open_index::{OpenIndexRequest, handle_open_index};
use crate::tools::search::{SearchRequest, handle_search};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP Server for Doxygen documentation search
#[derive(Clone)]
pub struct SearchServer {
    /// Shared catalog state (active index, LRU, disk cache)
    state: Arc<DocState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for SearchServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl SearchServer {
    /// Create a new SearchServer over shared state.
    pub fn new(state: Arc<DocState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Open the Doxygen search index of a documentation site. Accepts the HTML output directory or its search/ subdirectory and makes it the index later searches use."
    )]
    async fn open_index(
        &self,
        Parameters(request): Parameters<OpenIndexRequest>,
    ) -> std::result::Result<String, String> {
        handle_open_index(&self.state, request).await
    }

    #[tool(
        description = "Search the open Doxygen index for classes, functions, members and files. Matches the query against symbol keys case-insensitively and returns every documented occurrence with its page link.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request).await
    }

    #[tool(description = "List the sections (All, Classes, Functions, Files, ...) of the open Doxygen index.")]
    async fn list_sections(&self) -> std::result::Result<String, String> {
        handle_list_sections(&self.state).await
    }
}

#[tool_handler]
impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "doxygen-search-mcp: Looks up C++ (and other Doxygen-documented) symbols in a generated \
                 documentation site's search index. Use open_index with the HTML output directory unless \
                 one was given at startup, then search by symbol name."
                    .to_string(),
            )
    }
}
