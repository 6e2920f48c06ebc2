use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router,
    schemars::JsonSchema,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use checkpoint_core::{CheckpointError, CheckpointService};

#[derive(Clone)]
pub struct McpServer {
    service: CheckpointService,
    tool_router: ToolRouter<Self>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveCheckpointRequest {
    #[schemars(description = "Unique name for the checkpoint")]
    pub name: String,
    #[schemars(
        description = "Checkpoint data: summary, current_goal, working_directory, git_branch, git_status (or a nested context object), todos, file_modifications, key_decisions and artifacts"
    )]
    pub data: Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckpointNameRequest {
    #[schemars(description = "Name of the checkpoint")]
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCheckpointRequest {
    #[schemars(description = "Name of the checkpoint to update")]
    pub name: String,
    #[schemars(
        description = "Fields to update (summary, current_goal, working_directory, git_branch, git_status)"
    )]
    pub updates: Value,
}

impl McpServer {
    pub fn new(service: CheckpointService) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    fn to_mcp_error(err: CheckpointError) -> McpError {
        match err {
            CheckpointError::NotFound(_)
            | CheckpointError::Validation(_)
            | CheckpointError::UniquenessConflict(_) => McpError::invalid_params(err.to_string(), None),
            _ => McpError::internal_error(err.to_string(), None),
        }
    }

    fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_router]
impl McpServer {
    #[tool(description = "Save a new checkpoint or replace an existing one with the current project state")]
    async fn save_checkpoint(
        &self,
        params: Parameters<SaveCheckpointRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let outcome = self
            .service
            .save(&req.name, &req.data)
            .map_err(Self::to_mcp_error)?;
        Self::json_result(&outcome)
    }

    #[tool(description = "Load a checkpoint by name with all related data, as YAML")]
    async fn resume_checkpoint(
        &self,
        params: Parameters<CheckpointNameRequest>,
    ) -> Result<CallToolResult, McpError> {
        let yaml = self
            .service
            .resume_yaml(&params.0.name)
            .map_err(Self::to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(yaml)]))
    }

    #[tool(description = "List all checkpoints ordered by most recent update")]
    async fn list_checkpoints(&self) -> Result<CallToolResult, McpError> {
        let list = self.service.list().map_err(Self::to_mcp_error)?;
        Self::json_result(&list)
    }

    #[tool(description = "Delete a checkpoint and all its related data")]
    async fn delete_checkpoint(
        &self,
        params: Parameters<CheckpointNameRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .service
            .delete(&params.0.name)
            .map_err(Self::to_mcp_error)?;
        Self::json_result(&outcome)
    }

    #[tool(description = "Partially update a checkpoint's summary, goal or environment fields")]
    async fn update_checkpoint(
        &self,
        params: Parameters<UpdateCheckpointRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let outcome = self
            .service
            .update(&req.name, &req.updates)
            .map_err(Self::to_mcp_error)?;
        Self::json_result(&outcome)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Checkpoint manager: save, resume, list, update and delete named task-session checkpoints".into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(service: CheckpointService) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let server = McpServer::new(service).serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
