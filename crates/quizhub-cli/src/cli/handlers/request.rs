//! Raw API request handler

use crate::cli::handlers::build_client;
use crate::config::CliConfig;
use crate::error::{CliError, Result};
use crate::output::{json_output, print_success};
use quizhub_sdk::{unwrap_data, ApiError, Method, RequestOptions};
use serde_json::Value;

/// Handle request command
pub async fn handle_request(
    config: &CliConfig,
    method: &str,
    path: &str,
    body: Option<&str>,
    raw: bool,
) -> Result<()> {
    let options = build_options(method, body)?;
    let client = build_client(config)?;

    let response = client.request(path, options).await.map_err(|e| {
        let reauth = e.requires_reauthentication();
        let err = CliError::from(e);
        if reauth {
            err.with_suggestion("Run 'quizhub login' to start a new session")
        } else {
            err
        }
    })?;

    match render(response, raw) {
        Value::Null => {
            print_success("Request completed (no content)");
            Ok(())
        }
        value => json_output(&value),
    }
}

/// Parse the method and body arguments into request options
pub fn build_options(method: &str, body: Option<&str>) -> Result<RequestOptions> {
    let method = parse_method(method)?;
    let options = RequestOptions::new(method);
    match body {
        Some(body) => {
            let value: Value = serde_json::from_str(body).map_err(|e| {
                CliError::internal(format!("--body is not valid JSON: {e}"))
            })?;
            Ok(options.json(&value)?)
        }
        None => Ok(options),
    }
}

fn parse_method(method: &str) -> Result<Method> {
    let upper = method.to_ascii_uppercase();
    match upper.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD" | "OPTIONS" => {
            Method::from_bytes(upper.as_bytes()).map_err(|e| {
                CliError::from(ApiError::InvalidRequest {
                    message: e.to_string(),
                })
            })
        }
        _ => Err(CliError::from(ApiError::InvalidRequest {
            message: format!("Unsupported HTTP method '{method}'"),
        })),
    }
}

fn render(response: Value, raw: bool) -> Value {
    if raw {
        response
    } else {
        unwrap_data(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_method_is_case_insensitive() {
        assert_eq!(parse_method("patch").unwrap(), Method::PATCH);
        assert_eq!(parse_method("GET").unwrap(), Method::GET);
        assert!(parse_method("FETCH").is_err());
    }

    #[test]
    fn test_invalid_body_rejected() {
        assert!(build_options("POST", Some("{not json")).is_err());
        assert!(build_options("POST", Some("{\"choice\": 2}")).is_ok());
    }

    #[test]
    fn test_render_unwraps_unless_raw() {
        let body = json!({ "statusCode": 200, "data": { "id": "q1" } });
        assert_eq!(render(body.clone(), false), json!({ "id": "q1" }));
        assert_eq!(render(body.clone(), true), body);
    }
}
