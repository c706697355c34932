use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub const DEFAULT_API_NAMES: [&str; 4] = ["/generate_video", "/predict", "/generate", "/run"];
const DEFAULT_OUTPUT_FILE: &str = "velo_video.mp4";
/// left in place by whoever forgot to paste the share link
const PLACEHOLDER_MARKERS: [&str; 2] = ["your-link", "your_link"];

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    MissingServiceUrl,
    PlaceholderServiceUrl,
    InvalidServiceUrl(url::ParseError),
    UnsupportedScheme(String),
    InvalidTimeout(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingServiceUrl => write!(f, "VELO_GRADIO_URL is not set"),
            Self::PlaceholderServiceUrl => {
                write!(f, "VELO_GRADIO_URL still holds a placeholder, update the Gradio link")
            }
            Self::InvalidServiceUrl(err) => write!(f, "VELO_GRADIO_URL is not a valid URL: {err}"),
            Self::UnsupportedScheme(scheme) => {
                write!(f, "VELO_GRADIO_URL must use http or https, not {scheme}")
            }
            Self::InvalidTimeout(value) => {
                write!(f, "VELO_CALL_TIMEOUT must be a positive number of seconds, got {value:?}")
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub service_url: Url,
    pub api_names: Vec<String>,
    pub output_dir: PathBuf,
    pub output_file: String,
    pub call_timeout: Option<Duration>,
}

impl Config {
    /// Reads the configuration from the environment. Call `dotenvy::dotenv` first to
    /// honor a `.env` file.
    pub fn load() -> Result<Self, ConfigError> {
        let var = |name: &str| env::var(name).ok();

        Self::from_values(
            var("VELO_GRADIO_URL").as_deref(),
            var("VELO_API_NAMES").as_deref(),
            var("VELO_OUTPUT_DIR").as_deref(),
            var("VELO_OUTPUT_FILE").as_deref(),
            var("VELO_CALL_TIMEOUT").as_deref(),
        )
    }

    pub fn from_values(
        service_url: Option<&str>,
        api_names: Option<&str>,
        output_dir: Option<&str>,
        output_file: Option<&str>,
        call_timeout: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let service_url = parse_service_url(service_url.unwrap_or_default())?;

        let api_names = api_names.map_or_else(
            || DEFAULT_API_NAMES.iter().map(ToString::to_string).collect(),
            |names| {
                names
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(|name| {
                        if name.starts_with('/') { name.to_string() } else { format!("/{name}") }
                    })
                    .collect()
            },
        );

        let call_timeout = match call_timeout.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => match value.parse() {
                Ok(seconds) if seconds > 0 => Some(Duration::from_secs(seconds)),
                _ => return Err(ConfigError::InvalidTimeout(value.into())),
            },
            None => None,
        };

        let config = Self {
            service_url,
            api_names,
            output_dir: output_dir.filter(|dir| !dir.is_empty()).unwrap_or(".").into(),
            output_file: output_file
                .filter(|file| !file.is_empty())
                .unwrap_or(DEFAULT_OUTPUT_FILE)
                .into(),
            call_timeout,
        };

        log::debug!(
            "loaded config: {} with API names {:?}",
            config.service_url,
            config.api_names
        );

        Ok(config)
    }
}

fn parse_service_url(value: &str) -> Result<Url, ConfigError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ConfigError::MissingServiceUrl);
    }

    if PLACEHOLDER_MARKERS.iter().any(|marker| value.contains(marker)) {
        return Err(ConfigError::PlaceholderServiceUrl);
    }

    let url = Url::parse(value).map_err(ConfigError::InvalidServiceUrl)?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::UnsupportedScheme(scheme.into())),
    }
}
