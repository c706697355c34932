use std::fmt;
use std::time::{Duration, Instant};

use crate::apis::gradio::GradioClient;
use crate::dispatcher::{self, CallError, DispatchError};
use crate::generation::GenerationRequest;
use crate::utilities::config::Config;
use crate::utilities::ffprobe::{self, Ffprobe};
use crate::utilities::file_download::{DownloadError, SavedVideo};
use crate::utilities::text_utils::TruncateWithEllipsis;

#[derive(Debug)]
pub enum GenerationError {
    Connect(CallError),
    Dispatch(DispatchError),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(err) => write!(f, "connecting to the inference server failed: {err}"),
            Self::Dispatch(err) => err.fmt(f),
        }
    }
}

impl From<DispatchError> for GenerationError {
    fn from(value: DispatchError) -> Self {
        Self::Dispatch(value)
    }
}

pub struct Generated {
    pub endpoint: String,
    pub artifact: String,
    pub attempts: usize,
    pub elapsed: Duration,
}

/// Connects to the configured server and dispatches the request over the configured
/// API names.
pub async fn generate(
    http_client: &reqwest::Client,
    config: &Config,
    request: &GenerationRequest,
) -> Result<Generated, GenerationError> {
    log::info!(
        "generating {:?} as {request}",
        request.prompt().to_string().truncate_with_ellipsis(60)
    );

    let start = Instant::now();
    let client =
        GradioClient::connect(http_client.clone(), config).await.map_err(GenerationError::Connect)?;

    log::info!("waiting in the GPU queue");
    let dispatched = dispatcher::dispatch(&client, request, config.api_names.as_slice()).await?;

    Ok(Generated {
        endpoint: dispatched.endpoint,
        artifact: dispatched.artifact,
        attempts: dispatched.attempts,
        elapsed: start.elapsed(),
    })
}

/// Saves the generated video into the output directory.
pub async fn deliver(
    http_client: &reqwest::Client,
    config: &Config,
    generated: &Generated,
) -> Result<SavedVideo, DownloadError> {
    let saved =
        SavedVideo::save(http_client, &generated.artifact, &config.output_dir, &config.output_file)
            .await?;

    log::debug!("saved {} to {}", generated.artifact, saved.file_path.display());

    Ok(saved)
}

/// Inspects a saved video, returning `None` when ffprobe is unavailable or fails.
pub async fn inspect(saved: &SavedVideo) -> Option<Ffprobe> {
    match ffprobe::ffprobe(&saved.file_path).await {
        Ok(video_info) => Some(video_info),
        Err(err) => {
            log::warn!("{err}");
            None
        }
    }
}
