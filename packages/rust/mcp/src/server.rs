//! MCP bridge exposing [`DocsTools`] through rmcp over stdio.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use magedocs_shared::{DocsError, SourceFilter, SourceId};

use crate::tools::{
    DEFAULT_SEARCH_LIMIT, DocsTools, MAX_SEARCH_LIMIT, MIN_QUERY_CHARS, UPDATE_SHORTCUTS,
    find_shortcut, render_document,
};
use crate::topics::{TOPICS, find_topic};

const INSTRUCTIONS: &str = "Use search_docs to find any fragment across MageOS/Hyvä/Satoshi \
    documentation, then call get_doc for the full text. Dedicated topic tools (hyva_*, mageos_*, \
    satoshi_*) instantly return curated excerpts for the most common workflows.";

const REFRESH_DESCRIPTION: &str = "Trigger documentation refresh for the specified sources.";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GetDocArgs {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RefreshArgs {
    #[serde(default)]
    sources: Option<Vec<String>>,
}

/// rmcp server handler for the documentation index.
#[derive(Clone)]
pub struct DocsServer {
    tools: Arc<DocsTools>,
}

impl DocsServer {
    pub fn new(tools: Arc<DocsTools>) -> Self {
        Self { tools }
    }

    /// Serve over stdin/stdout until the client disconnects or Ctrl-C.
    pub async fn serve_stdio(self) -> magedocs_shared::Result<()> {
        info!(refresh = self.tools.can_refresh(), "serving MCP over stdio");
        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| DocsError::Protocol(e.to_string()))?;

        let cancel = service.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping MCP service");
                cancel.cancel();
            }
        });

        match service.waiting().await {
            Ok(reason) => info!(?reason, "MCP service stopped"),
            Err(e) => warn!(error = %e, "MCP service task failed"),
        }
        Ok(())
    }

    /// Every tool this server currently offers, in listing order.
    pub fn tool_list(&self) -> Vec<Tool> {
        let mut tools = vec![
            descriptor(
                "search_docs",
                "Search documentation",
                "Full-text search across MageOS, Hyvä and Satoshi indexes.",
                search_schema(),
                true,
            ),
            descriptor(
                "get_doc",
                "Get document",
                "Return the full text of an indexed document by id.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "minimum": 1, "description": "Document id from search results" }
                    },
                    "required": ["id"]
                }),
                true,
            ),
            descriptor(
                "docs_status",
                "Documentation status",
                "Show the number of indexed documents per source.",
                empty_schema(),
                true,
            ),
        ];

        if self.tools.can_refresh() {
            tools.push(descriptor(
                "refresh_docs",
                "Refresh documentation",
                REFRESH_DESCRIPTION,
                json!({
                    "type": "object",
                    "properties": {
                        "sources": {
                            "type": "array",
                            "items": { "type": "string", "enum": source_names() },
                            "minItems": 1,
                            "maxItems": SourceId::ALL.len()
                        }
                    }
                }),
                false,
            ));
            tools.extend(UPDATE_SHORTCUTS.iter().map(|shortcut| {
                descriptor(
                    shortcut.name,
                    shortcut.title,
                    REFRESH_DESCRIPTION,
                    empty_schema(),
                    false,
                )
            }));
        }

        tools.extend(TOPICS.iter().map(|topic| {
            descriptor(
                topic.name,
                topic.title,
                topic.description,
                empty_schema(),
                true,
            )
        }));
        tools
    }

    /// Execute a tool by name. Domain failures become tool errors; unknown
    /// names and malformed arguments become protocol errors.
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<CallToolResult, McpError> {
        let outcome = match name {
            "search_docs" => {
                let args: SearchArgs = parse_args(args)?;
                self.search(args).await
            }
            "get_doc" => {
                let args: GetDocArgs = parse_args(args)?;
                self.tools
                    .get_doc(args.id)
                    .await
                    .and_then(|doc| rendered(render_document(&doc), &doc))
            }
            "docs_status" => self
                .tools
                .docs_status()
                .await
                .and_then(|report| rendered(report.render(), &report.counts)),
            "refresh_docs" if self.tools.can_refresh() => {
                let args: RefreshArgs = parse_args(args)?;
                self.refresh(args).await
            }
            _ => {
                if let Some(shortcut) = find_shortcut(name).filter(|_| self.tools.can_refresh()) {
                    self.tools.run_shortcut(shortcut).await.and_then(|report| {
                        rendered(report.render(&format!("{} finished.", shortcut.title)), &report)
                    })
                } else if find_topic(name).is_some() {
                    self.tools
                        .topic(name)
                        .await
                        .and_then(|response| rendered(response.render(), &response))
                } else {
                    return Err(McpError::new(
                        ErrorCode::METHOD_NOT_FOUND,
                        format!("no tool registered with name: {name}"),
                        None,
                    ));
                }
            }
        };

        Ok(match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "tool call failed");
                CallToolResult::error(vec![Content::text(e.to_string())])
            }
        })
    }

    async fn search(&self, args: SearchArgs) -> magedocs_shared::Result<CallToolResult> {
        let source: SourceFilter = match args.source.as_deref() {
            Some(source) => source.parse()?,
            None => SourceFilter::All,
        };
        let limit = args
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(0));
        let response = self.tools.search_docs(&args.query, source, limit).await?;
        rendered(response.render(), &response)
    }

    async fn refresh(&self, args: RefreshArgs) -> magedocs_shared::Result<CallToolResult> {
        let sources = args
            .sources
            .map(|names| {
                names
                    .iter()
                    .map(|name| name.parse::<SourceId>())
                    .collect::<magedocs_shared::Result<Vec<_>>>()
            })
            .transpose()?;
        let report = self.tools.refresh_docs(sources.as_deref()).await?;
        rendered(report.render("Reindex triggered."), &report)
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, McpError> {
    serde_json::from_value(args).map_err(|e| {
        McpError::new(
            ErrorCode::INVALID_PARAMS,
            format!("invalid arguments: {e}"),
            None,
        )
    })
}

/// Text content plus the same data as structured JSON.
fn rendered<T: serde::Serialize>(
    text: String,
    data: &T,
) -> magedocs_shared::Result<CallToolResult> {
    let structured = serde_json::to_value(data).map_err(|e| DocsError::parse(e.to_string()))?;
    let mut result = CallToolResult::success(vec![Content::text(text)]);
    result.structured_content = Some(structured);
    Ok(result)
}

fn descriptor(
    name: &'static str,
    title: &'static str,
    description: &'static str,
    schema: Value,
    read_only: bool,
) -> Tool {
    let input_schema = match schema {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(Map::new()),
    };
    Tool {
        name: Cow::Borrowed(name),
        title: Some(title.to_string()),
        description: Some(Cow::Borrowed(description)),
        input_schema,
        output_schema: None,
        annotations: Some(ToolAnnotations::new().read_only(read_only)),
        execution: None,
        icons: None,
        meta: None,
    }
}

fn source_names() -> Vec<&'static str> {
    SourceId::ALL.iter().map(SourceId::as_str).collect()
}

fn search_schema() -> Value {
    let mut sources = vec!["all"];
    sources.extend(source_names());
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "minLength": MIN_QUERY_CHARS },
            "source": { "type": "string", "enum": sources, "default": "all" },
            "limit": {
                "type": "integer",
                "minimum": 1,
                "maximum": MAX_SEARCH_LIMIT,
                "default": DEFAULT_SEARCH_LIMIT
            }
        },
        "required": ["query"]
    })
}

fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

impl ServerHandler for DocsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "magedocs".to_string(),
                title: Some("MageOS, Hyvä and Satoshi docs".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.tool_list())))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tool_list().into_iter().find(|tool| tool.name == name)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = request
            .arguments
            .map(Value::Object)
            .unwrap_or(Value::Object(Map::new()));
        self.dispatch(&request.name, args).await
    }
}
