// Request and response bodies specific to the HTTP surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub connected_entry: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleQuery {
    pub view: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// `PUT /api/session`. The id may arrive as a JSON number or string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    #[serde(default)]
    pub team_id: Value,
}

impl ConnectRequest {
    pub fn team_id_text(&self) -> String {
        match &self.team_id {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}
