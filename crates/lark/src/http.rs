use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Deserialize)]
struct ErrorEnvelope {
    code: Option<i64>,
    msg: Option<String>,
}

/// Describe a non-2xx response.
///
/// The platform usually still returns its `{code, msg}` envelope on 4xx, so
/// the platform message is preferred over the raw body when it parses.
pub(crate) fn describe_http_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            code: Some(code),
            msg: Some(msg),
        }) if !msg.is_empty() => format!("HTTP {status}: {msg} (code {code})"),
        _ if body.is_empty() => format!("HTTP {status}"),
        _ => format!("HTTP {status}: {body}"),
    }
}
