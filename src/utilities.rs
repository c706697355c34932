pub mod api_utils;
pub mod config;
pub mod ffprobe;
pub mod file_download;
pub mod logchamp;
pub mod parse_arguments;
pub mod status;
pub mod text_utils;

#[cfg(test)]
pub mod test_fixtures;
