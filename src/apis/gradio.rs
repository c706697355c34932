use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use crate::dispatcher::{CallError, RemoteProcedure};
use crate::generation::GenerationRequest;
use crate::utilities::api_utils::DetectServerError;
use crate::utilities::config::Config;

#[derive(Default, Deserialize)]
struct AppConfig {
    #[serde(default)]
    api_prefix: String,
}

#[derive(Deserialize)]
struct ApiInfo {
    #[serde(default)]
    named_endpoints: HashMap<String, EndpointInfo>,
}

#[derive(Deserialize)]
struct EndpointInfo {
    #[serde(default)]
    parameters: Vec<Parameter>,
}

#[derive(Deserialize)]
struct Parameter {
    parameter_name: Option<String>,
    #[serde(default)]
    parameter_has_default: bool,
    #[serde(default)]
    parameter_default: Value,
}

#[derive(Serialize)]
struct Payload {
    data: Vec<Value>,
}

#[derive(Deserialize)]
struct Event {
    event_id: String,
}

/// Client for a Gradio app, talking to its HTTP queue API.
pub struct GradioClient {
    http_client: reqwest::Client,
    /// service root including the api prefix, without a trailing slash
    api_root: String,
    endpoints: HashMap<String, EndpointInfo>,
    timeout: Option<Duration>,
}

impl GradioClient {
    /// Fetches the app config and API description of the configured server.
    ///
    /// Only a failure to reach the server is an error. Servers that don't describe their
    /// API get positional arguments.
    pub async fn connect(http_client: reqwest::Client, config: &Config) -> Result<Self, CallError> {
        let root = config.service_url.as_str().trim_end_matches('/').to_string();

        let response = with_timeout(http_client.get(format!("{root}/config")), config.call_timeout)
            .send()
            .await?
            .server_error()?;

        let app_config = if response.status().is_success() {
            response.json::<AppConfig>().await.unwrap_or_default()
        } else {
            log::warn!("{root} has no readable app config ({})", response.status());
            AppConfig::default()
        };

        let api_root = format!("{root}{}", app_config.api_prefix.trim_end_matches('/'));

        let endpoints = match with_timeout(
            http_client.get(format!("{api_root}/info")),
            config.call_timeout,
        )
        .send()
        .await
        {
            Ok(response) if response.status().is_success() => {
                response.json::<ApiInfo>().await.map(|info| info.named_endpoints).unwrap_or_default()
            }
            Ok(response) => {
                log::warn!("{api_root} does not describe its API ({})", response.status());
                HashMap::new()
            }
            Err(err) => {
                log::warn!("fetching the API description failed: {}", err.without_url());
                HashMap::new()
            }
        };

        log::debug!(
            "connected to {api_root}, described endpoints: {:?}",
            endpoints.keys().collect::<Vec<_>>()
        );

        Ok(Self { http_client, api_root, endpoints, timeout: config.call_timeout })
    }

    fn arguments(&self, endpoint: &str, request: &GenerationRequest) -> Vec<Value> {
        arrange_arguments(named_arguments(request), self.endpoints.get(endpoint))
    }
}

#[async_trait]
impl RemoteProcedure for GradioClient {
    async fn call(&self, endpoint: &str, request: &GenerationRequest) -> Result<String, CallError> {
        let call_url = format!("{}/call/{}", self.api_root, endpoint.trim_start_matches('/'));
        let payload = Payload { data: self.arguments(endpoint, request) };

        let Event { event_id } = with_timeout(self.http_client.post(&call_url), self.timeout)
            .json(&payload)
            .send()
            .await?
            .server_error()?
            .error_for_status()?
            .json::<Event>()
            .await?;

        log::debug!("{endpoint} queued as event {event_id}");

        let stream = with_timeout(self.http_client.get(format!("{call_url}/{event_id}")), self.timeout)
            .send()
            .await?
            .server_error()?
            .error_for_status()?
            .text()
            .await?;

        let output = parse_event_stream(&stream)?;

        Ok(extract_artifact(&output, &self.api_root).unwrap_or_default())
    }
}

fn with_timeout(
    builder: reqwest::RequestBuilder,
    timeout: Option<Duration>,
) -> reqwest::RequestBuilder {
    match timeout {
        Some(timeout) => builder.timeout(timeout),
        None => builder,
    }
}

fn named_arguments(request: &GenerationRequest) -> [(&'static str, Value); 6] {
    [
        ("prompt", json!(request.prompt())),
        ("negative_prompt", json!(request.negative_prompt())),
        ("num_frames", json!(request.frame_count())),
        ("aspect_ratio", json!(request.aspect_ratio().as_str())),
        ("resolution", json!(request.resolution().as_str())),
        ("seed", json!(request.seed())),
    ]
}

/// Orders the named arguments the way the endpoint declares its parameters, filling
/// unknown parameters with their defaults. Undescribed endpoints get the named
/// arguments in their conventional order.
fn arrange_arguments<const N: usize>(
    named: [(&'static str, Value); N],
    endpoint: Option<&EndpointInfo>,
) -> Vec<Value> {
    let Some(endpoint) = endpoint.filter(|endpoint| !endpoint.parameters.is_empty()) else {
        return named.into_iter().map(|(_, value)| value).collect();
    };

    endpoint
        .parameters
        .iter()
        .map(|parameter| {
            let named_value = parameter.parameter_name.as_deref().and_then(|parameter_name| {
                named.iter().find(|(name, _)| *name == parameter_name).map(|(_, value)| value)
            });

            match named_value {
                Some(value) => value.clone(),
                None if parameter.parameter_has_default => parameter.parameter_default.clone(),
                None => Value::Null,
            }
        })
        .collect()
}

/// Reads a finished `/call/<name>/<event_id>` event stream and returns the output data.
fn parse_event_stream(stream: &str) -> Result<Value, CallError> {
    let mut event = None;

    for line in stream.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = Some(name.trim());
        } else if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            match event {
                Some("complete") => return Ok(serde_json::from_str(data)?),
                Some("error") => return Err(CallError::Remote(error_message(data))),
                _ => {}
            }
        }
    }

    Err(CallError::MalformedResponse("the event stream ended without a result"))
}

fn error_message(data: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::String(message)) if !message.is_empty() => message,
        Ok(Value::Null) | Err(_) if data.is_empty() || data == "null" => {
            "the endpoint raised an error".into()
        }
        Ok(Value::Object(object)) => object
            .get("error")
            .or_else(|| object.get("message"))
            .and_then(Value::as_str)
            .map_or_else(|| data.to_string(), ToString::to_string),
        _ => data.to_string(),
    }
}

/// Finds the video reference in the output data of a call.
///
/// Strings are taken as they are, file objects give their URL, or a `/file=` URL when the
/// server only reports a path.
fn extract_artifact(output: &Value, api_root: &str) -> Option<String> {
    match output {
        Value::String(reference) if !reference.is_empty() => Some(reference.clone()),
        Value::Array(items) => items.iter().find_map(|item| extract_artifact(item, api_root)),
        Value::Object(object) => {
            if let Some(video) = object.get("video") {
                return extract_artifact(video, api_root);
            }

            if let Some(url) = object.get("url").and_then(Value::as_str).filter(|url| !url.is_empty())
            {
                return Some(url.into());
            }

            object
                .get("path")
                .and_then(Value::as_str)
                .filter(|path| !path.is_empty())
                .map(|path| match Url::parse(path) {
                    Ok(url) if matches!(url.scheme(), "http" | "https") => path.into(),
                    _ => format!("{api_root}/file={path}"),
                })
        }
        _ => None,
    }
}
