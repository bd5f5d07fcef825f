/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin, one per line
/// 2. Dispatches tool calls to the habit ledger tools
/// 3. Writes JSON-RPC responses to stdout

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::*;
use crate::storage::SqliteStorage;
use crate::tools;
use crate::tracker::TrackerError;
use crate::{HabitTrackerServer, ServerError};

/// Every tool the server exposes, with its description
const TOOLS: &[(&str, &str)] = &[
    ("habit_create", "Create a new habit owned by the calling user"),
    ("habit_get", "Show one habit owned by the calling user"),
    ("habit_list", "List the calling user's habits with their current streaks"),
    ("habit_update", "Rename, re-target, reorder, archive or restore a habit"),
    ("habit_delete", "Permanently delete a habit and its completion history"),
    ("habit_mark", "Mark a day as completed, or clear it, as a calendar check-box does"),
    ("habit_log", "Log a day as completed or skipped with optional progress value and notes"),
    ("habit_calendar", "List the days of a month on which the habit was completed"),
    ("habit_entries", "List all records for a habit between two dates"),
    ("habit_streak", "Show the current streak for a habit"),
];

/// MCP server that handles communication with the client
pub struct McpServer {
    habit_tracker: HabitTrackerServer,
    initialized: bool,
}

impl McpServer {
    pub fn new(habit_tracker: HabitTrackerServer) -> Self {
        Self {
            habit_tracker,
            initialized: false,
        }
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line) {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    pub(crate) fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        Some(self.handle_request(request))
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" | "initialized" => {
                self.initialized = true;
                info!("MCP client initialized");
            }
            other => debug!("Ignoring notification '{}'", other),
        }
    }

    fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.unwrap_or(Value::Null);
        match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        }
    }

    fn handle_initialize(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        match params.map(serde_json::from_value::<InitializeParams>) {
            Some(Ok(params)) => {
                let client = params
                    .client_info
                    .map(|c| format!("{} {}", c.name, c.version))
                    .unwrap_or_else(|| "unknown client".to_string());
                info!("MCP client connected: {} (protocol {})", client, params.protocol_version);
            }
            Some(Err(e)) => warn!("Unreadable initialize parameters: {}", e),
            None => info!("MCP client connected"),
        }

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "Habit Ledger MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_response(id, &result)
    }

    fn handle_tools_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid parameters: {}", e),
                    None,
                );
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        debug!("Calling tool {}", tool_params.name);
        let args = tool_params.arguments;
        let result = match tool_params.name.as_str() {
            "habit_create" => self.invoke(args, tools::create_habit),
            "habit_get" => self.invoke(args, tools::get_habit),
            "habit_list" => self.invoke(args, tools::list_habits),
            "habit_update" => self.invoke(args, tools::update_habit),
            "habit_delete" => self.invoke(args, tools::delete_habit),
            "habit_mark" => self.invoke(args, tools::mark_habit),
            "habit_log" => self.invoke(args, tools::log_habit),
            "habit_calendar" => self.invoke(args, tools::habit_calendar),
            "habit_entries" => self.invoke(args, tools::habit_entries),
            "habit_streak" => self.invoke(args, tools::habit_streak),
            other => Err(JsonRpcError {
                code: error_codes::METHOD_NOT_FOUND,
                message: format!("Unknown tool: {}", other),
                data: None,
            }),
        };

        match result {
            Ok(result) => to_response(id, &result),
            Err(e) => JsonRpcResponse::error(id, e.code, e.message, e.data),
        }
    }

    /// Decode the arguments, run the tool and wrap its response
    ///
    /// Malformed arguments are a protocol error; failures inside the tool
    /// become an `isError` result carrying the mapped error code.
    fn invoke<P, R, F>(&self, args: Map<String, Value>, tool: F) -> Result<ToolCallResult, JsonRpcError>
    where
        P: DeserializeOwned,
        R: Serialize,
        F: FnOnce(&SqliteStorage, P) -> Result<R, TrackerError>,
    {
        let params: P = serde_json::from_value(Value::Object(args)).map_err(|e| JsonRpcError {
            code: error_codes::INVALID_PARAMS,
            message: format!("Invalid arguments: {}", e),
            data: None,
        })?;

        match tool(self.habit_tracker.storage(), params) {
            Ok(response) => {
                let structured = serde_json::to_value(&response).map_err(|e| JsonRpcError {
                    code: error_codes::INTERNAL_ERROR,
                    message: format!("Failed to serialize tool response: {}", e),
                    data: None,
                })?;
                let text = structured
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Ok(ToolCallResult::success(text, structured))
            }
            Err(e) => {
                debug!("Tool failed ({}): {}", e.kind(), e);
                Ok(ToolCallResult::from_tracker_error(&e))
            }
        }
    }
}

fn to_response<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(
            id,
            error_codes::INTERNAL_ERROR,
            format!("Failed to serialize result: {}", e),
            None,
        ),
    }
}

fn input_schema<P: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(P)).unwrap_or_else(|_| json!({ "type": "object" }))
}

/// Tool definitions advertised by tools/list
pub fn tool_definitions() -> Vec<ToolDefinition> {
    TOOLS
        .iter()
        .map(|(name, description)| {
            let input_schema = match *name {
                "habit_create" => input_schema::<tools::CreateHabitParams>(),
                "habit_get" => input_schema::<tools::GetHabitParams>(),
                "habit_list" => input_schema::<tools::ListHabitsParams>(),
                "habit_update" => input_schema::<tools::UpdateHabitParams>(),
                "habit_delete" => input_schema::<tools::DeleteHabitParams>(),
                "habit_mark" => input_schema::<tools::MarkHabitParams>(),
                "habit_log" => input_schema::<tools::LogHabitParams>(),
                "habit_calendar" => input_schema::<tools::CalendarParams>(),
                "habit_entries" => input_schema::<tools::EntriesParams>(),
                "habit_streak" => input_schema::<tools::StreakParams>(),
                _ => json!({ "type": "object" }),
            };
            ToolDefinition {
                name: name.to_string(),
                description: description.to_string(),
                input_schema,
            }
        })
        .collect()
}
