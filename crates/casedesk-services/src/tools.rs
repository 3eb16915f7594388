//! Tools exposed to the language model.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::llm::ToolDefinition;

pub const STORE_FILES: &str = "store_files";
pub const LIST_CLIENT_FILES: &str = "list_client_files";

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct StoreFilesInput {
    #[schemars(description = "Client the files belong to; omit to queue them as unassigned")]
    #[serde(default)]
    pub client_name: Option<String>,
    #[schemars(description = "Staging ids of the files to store; omit to store every staged file")]
    #[serde(default)]
    pub temp_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListClientFilesInput {
    #[schemars(description = "Client whose stored files should be listed")]
    pub client_name: String,
    #[schemars(description = "Maximum number of files to return")]
    #[serde(default)]
    pub limit: Option<i64>,
}

fn input_schema<T: JsonSchema>() -> JsonValue {
    serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| json!({"type": "object"}))
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: STORE_FILES.to_string(),
            description: "Store the files uploaded in this conversation permanently and \
                          associate them with a client. Returns what was stored."
                .to_string(),
            input_schema: input_schema::<StoreFilesInput>(),
        },
        ToolDefinition {
            name: LIST_CLIENT_FILES.to_string(),
            description: "List files already stored for a client, newest first.".to_string(),
            input_schema: input_schema::<ListClientFilesInput>(),
        },
    ]
}
