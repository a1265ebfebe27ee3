use std::fmt;

use log::warn;
use serde_json::Value;

/// Failure reported in the `zt` field of a service reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    LoginExpired,
    Rejected(String),
    Malformed(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServiceError::LoginExpired => f.write_str("login expired, sign in again"),
            ServiceError::Rejected(message) => write!(f, "request rejected: {message}"),
            ServiceError::Malformed(err) => write!(f, "malformed service reply: {err}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// `zt` 1 and 2 are successes, 9 means the session is gone. Any other reply
/// carries its reason in `info`, or in `text` when `info` is not a string.
pub fn check_status(body: &str) -> Result<Value, ServiceError> {
    let json: Value =
        serde_json::from_str(body).map_err(|err| ServiceError::Malformed(err.to_string()))?;

    match json.get("zt").and_then(Value::as_i64) {
        Some(1 | 2) => Ok(json),
        Some(9) => {
            warn!("[status] login expired");
            Err(ServiceError::LoginExpired)
        }
        _ => {
            let message = match (json.get("info"), json.get("text")) {
                (Some(Value::String(info)), _) => info.clone(),
                (_, Some(Value::String(text))) => text.clone(),
                (_, Some(other)) if !other.is_null() => other.to_string(),
                _ => String::new(),
            };
            Err(ServiceError::Rejected(message))
        }
    }
}
