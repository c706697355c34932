use colored::Colorize;

use super::config::ConfigError;
use super::ffprobe::Ffprobe;
use super::file_download::{DownloadError, SavedVideo};
use super::text_utils;
use crate::dispatcher::DispatchError;
use crate::generate::{GenerationError, Generated};

pub fn report_config_error(err: &ConfigError) {
    log::error!("configuration error: {err}");
    println!("{}", config_headline(err).bright_red().bold());
    println!("{err}");
}

fn config_headline(err: &ConfigError) -> &'static str {
    match err {
        ConfigError::MissingServiceUrl
        | ConfigError::PlaceholderServiceUrl
        | ConfigError::InvalidServiceUrl(_)
        | ConfigError::UnsupportedScheme(_) => "❌ Owner must update the Gradio link!",
        ConfigError::InvalidTimeout(_) => "❌ Invalid configuration",
    }
}

pub fn report_generation_error(err: &GenerationError) {
    match err {
        GenerationError::Connect(err) => {
            log::error!("connecting failed: {err}");
            println!("{}", "❌ Error".bright_red().bold());
            println!("General error: {err}");
        }
        GenerationError::Dispatch(DispatchError::NoCandidates) => {
            log::error!("no API names configured");
            println!("{}", "❌ Connection Failed".bright_red().bold());
            println!("no API names are configured, set VELO_API_NAMES.");
        }
        GenerationError::Dispatch(err @ DispatchError::Exhausted(_)) => {
            log::error!("{err}");
            println!("{}", "❌ Connection Failed".bright_red().bold());
            println!("None of the standard API names worked.");
            println!("Technical error: {}", technical_error(err));
        }
    }
}

fn technical_error(err: &DispatchError) -> String {
    err.last_error().map_or_else(
        || "every endpoint returned an empty result".into(),
        ToString::to_string,
    )
}

pub fn report_generated(generated: &Generated) {
    println!(
        "{} in {} via {} ({} attempt{})",
        "✅ Video Ready!".bright_green().bold(),
        text_utils::format_duration(generated.elapsed.as_secs()),
        generated.endpoint,
        generated.attempts,
        if generated.attempts == 1 { "" } else { "s" }
    );
    println!("{}", generated.artifact);
}

pub fn report_saved(saved: &SavedVideo, video_info: Option<&Ffprobe>) {
    println!(
        "{} {}{}",
        "📥 Saved".bright_cyan().bold(),
        saved.file_path.display(),
        saved_details(saved, video_info)
    );
}

fn saved_details(saved: &SavedVideo, video_info: Option<&Ffprobe>) -> String {
    let mut details = Vec::new();

    if let Some(video_info) = video_info {
        if let Some((width, height)) = video_info.video_size() {
            details.push(format!("{width}x{height}"));
        }
        if let Some(duration) = video_info.duration() {
            details.push(format!("{duration:.1}s"));
        }
    }

    if let Some(content_type) = &saved.content_type {
        details.push(content_type.clone());
    }

    if details.is_empty() { String::new() } else { format!(" ({})", details.join(", ")) }
}

pub fn report_download_error(err: &DownloadError) {
    match err {
        DownloadError::RequestError(err) => log::warn!("artifact download failed: {err}"),
        DownloadError::FilesystemError(err) => log::error!("writing the artifact failed: {err}"),
        DownloadError::InvalidResponse(reason) => log::warn!("artifact unavailable: {reason}"),
    }

    println!("{}", "⚠️ The video was generated but could not be saved".bright_yellow().bold());
    println!("{err}");
}
