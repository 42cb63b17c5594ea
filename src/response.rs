use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub const INVALID_EVENT_BODY: &str = "Invalid event structure";
pub const SUCCESS_MESSAGE: &str = "Data inserted successfully!";

/// Lambda proxy style result: `{"statusCode": ..., "body": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub body: String,
}

impl Response {
    /// 400, plain text body.
    pub fn invalid_event() -> Self {
        Self {
            status_code: 400,
            body: INVALID_EVENT_BODY.to_owned(),
        }
    }

    /// 200, JSON string body.
    pub fn success() -> Self {
        Self {
            status_code: 200,
            body: json_string(SUCCESS_MESSAGE),
        }
    }

    /// 500, JSON string body carrying the error description.
    pub fn failure(error: &impl Display) -> Self {
        Self {
            status_code: 500,
            body: json_string(&format!("Error: {error}")),
        }
    }
}

fn json_string(message: &str) -> String {
    serde_json::Value::from(message).to_string()
}
