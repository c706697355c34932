use std::fmt;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tempfile::NamedTempFile;
use url::Url;

use super::api_utils::DetectServerError;

pub const MEBIBYTE: usize = 1024 * 1024;

#[derive(Debug)]
pub enum DownloadError {
    RequestError(reqwest::Error),
    FilesystemError(io::Error),
    InvalidResponse(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestError(err) => write!(f, "downloading the video failed: {err}"),
            Self::FilesystemError(err) => write!(f, "failed to save the video to the drive: {err}"),
            Self::InvalidResponse(reason) => write!(f, "the video could not be retrieved: {reason}"),
        }
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(value: reqwest::Error) -> Self {
        Self::RequestError(value.without_url())
    }
}

impl From<io::Error> for DownloadError {
    fn from(value: io::Error) -> Self {
        Self::FilesystemError(value)
    }
}

/// Where an artifact reference points to.
#[derive(Debug, PartialEq, Eq)]
pub enum ArtifactLocation {
    Remote(Url),
    Local(PathBuf),
}

impl ArtifactLocation {
    pub fn parse(reference: &str) -> Self {
        match Url::parse(reference) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            Ok(url) if url.scheme() == "file" => {
                url.to_file_path().map_or_else(|()| Self::Local(reference.into()), Self::Local)
            }
            _ => Self::Local(reference.into()),
        }
    }
}

pub struct SavedVideo {
    pub file_path: PathBuf,
    pub content_type: Option<String>,
}

impl SavedVideo {
    /// Stores the artifact as `output_dir/file_name`, downloading it when it is a URL and
    /// copying it otherwise.
    pub async fn save(
        http_client: &reqwest::Client,
        reference: &str,
        output_dir: &Path,
        file_name: &str,
    ) -> Result<Self, DownloadError> {
        tokio::fs::create_dir_all(output_dir).await?;
        let file_path = output_dir.join(file_name);

        match ArtifactLocation::parse(reference) {
            ArtifactLocation::Remote(url) => {
                let content_type = download(http_client, url, output_dir, &file_path).await?;
                Ok(Self { file_path, content_type })
            }
            ArtifactLocation::Local(path) => {
                if !tokio::fs::try_exists(&path).await? {
                    return Err(DownloadError::InvalidResponse(format!(
                        "{} does not exist on this machine",
                        path.display()
                    )));
                }

                // the source may be the output file itself, so never write over it directly
                let temp_file = NamedTempFile::new_in(output_dir)?;
                tokio::fs::copy(&path, temp_file.path()).await?;
                temp_file
                    .persist(&file_path)
                    .map_err(|err| DownloadError::FilesystemError(err.error))?;

                Ok(Self { file_path, content_type: None })
            }
        }
    }
}

async fn download(
    http_client: &reqwest::Client,
    url: Url,
    output_dir: &Path,
    file_path: &Path,
) -> Result<Option<String>, DownloadError> {
    let response = http_client
        .get(url)
        .timeout(Duration::from_secs(3600))
        .send()
        .await?
        .server_error()
        .map_err(|err| DownloadError::InvalidResponse(format!("server error ({})", err.0)))?
        .error_for_status()?;

    let content_type = match response.headers().get(CONTENT_TYPE) {
        Some(header) => Some(
            header
                .to_str()
                .map_err(|_| DownloadError::InvalidResponse("invalid content type".into()))?
                .to_string(),
        ),
        None => None,
    };

    if let Some(content_type) = content_type.as_deref()
        && !content_type.starts_with("video/")
        && content_type != "application/octet-stream"
    {
        log::warn!("the artifact is served as {content_type}, saving it anyway");
    }

    let temp_file = NamedTempFile::new_in(output_dir)?;
    let mut file = BufWriter::with_capacity(4 * MEBIBYTE, temp_file.as_file());

    let mut stream = response.bytes_stream();
    while let Some(bytes) = stream.next().await {
        file.write_all(&bytes?)?;
    }

    file.flush()?;
    drop(file);

    temp_file.persist(file_path).map_err(|err| DownloadError::FilesystemError(err.error))?;

    Ok(content_type)
}
