//! Builds the MCP tool list from a loaded manifest. One tool per task;
//! daemon tasks get an extra `action` field instead of four tools.

use std::sync::Arc;

use rmcp::model::Tool;
use runbook_manifest::{Manifest, TaskKind};
use serde_json::{json, Map, Value};

pub fn build_tools(manifest: &Manifest) -> Vec<Tool> {
    manifest
        .tasks
        .iter()
        .map(|(name, task)| {
            let mut properties = Map::new();
            for (param_name, spec) in &task.params {
                let mut prop = Map::new();
                prop.insert("type".to_string(), json!("string"));
                if let Some(description) = &spec.description {
                    prop.insert("description".to_string(), json!(description));
                }
                if let Some(default) = &spec.default {
                    prop.insert("default".to_string(), json!(default));
                }
                properties.insert(param_name.clone(), Value::Object(prop));
            }

            if task.kind == TaskKind::Daemon {
                properties.insert(
                    "action".to_string(),
                    json!({
                        "type": "string",
                        "enum": ["start", "stop", "status", "logs"],
                        "description": "daemon lifecycle verb to invoke; defaults to status",
                    }),
                );
            }

            let mut schema = Map::new();
            schema.insert("type".to_string(), json!("object"));
            schema.insert("properties".to_string(), Value::Object(properties));

            let description = task
                .description
                .clone()
                .unwrap_or_else(|| format!("run the {name} task"));

            Tool::new(name.clone(), description, Arc::new(schema))
        })
        .collect()
}
