use std::fmt;
use std::io;
use std::path::Path;

use serde::Deserialize;
use tokio::process::Command;

#[derive(Deserialize)]
pub struct Ffprobe {
    pub streams: Option<Vec<Streams>>,
    pub format: Option<Format>,
}

#[derive(Deserialize)]
pub struct Streams {
    pub codec_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Deserialize)]
pub struct Format {
    pub duration: Option<String>,
}

impl Ffprobe {
    pub fn video_size(&self) -> Option<(u32, u32)> {
        self.streams.as_ref()?.iter().find_map(|stream| {
            if stream.codec_type.as_deref() == Some("video") {
                Some((stream.width?, stream.height?))
            } else {
                None
            }
        })
    }

    pub fn duration(&self) -> Option<f64> {
        self.format.as_ref()?.duration.as_ref()?.parse().ok()
    }
}

pub enum ProbeError {
    Spawn(io::Error),
    InvalidOutput(serde_json::Error),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "running ffprobe failed: {err}"),
            Self::InvalidOutput(err) => write!(f, "ffprobe returned unreadable output: {err}"),
        }
    }
}

pub async fn ffprobe(path: &Path) -> Result<Ffprobe, ProbeError> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("quiet")
        .arg("-output_format")
        .arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(path)
        .output()
        .await
        .map_err(ProbeError::Spawn)?;

    serde_json::from_slice(&output.stdout).map_err(ProbeError::InvalidOutput)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_video_info() {
        let probe: Ffprobe = serde_json::from_str(
            r#"{
                "streams": [
                    { "codec_type": "audio" },
                    { "codec_type": "video", "width": 1080, "height": 1920 }
                ],
                "format": { "duration": "10.041667" }
            }"#,
        )
        .unwrap();

        assert_eq!(probe.video_size(), Some((1080, 1920)));
        assert!(probe.duration().is_some_and(|duration| (duration - 10.04).abs() < 0.01));

        let probe: Ffprobe = serde_json::from_str("{}").unwrap();
        assert_eq!(probe.video_size(), None);
        assert_eq!(probe.duration(), None);
    }
}
