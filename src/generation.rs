use std::fmt;
use std::str::FromStr;

use crate::utilities::text_utils;

/// frames sent to the server per second of requested video
pub const FRAME_MULTIPLIER: u32 = 8;
/// lets the server pick a random seed
pub const RANDOM_SEED: i64 = -1;
pub const MIN_DURATION: u8 = 5;
pub const MAX_DURATION: u8 = 15;
pub const DEFAULT_DURATION: u8 = 10;
pub const DEFAULT_NEGATIVE_PROMPT: &str = "blurry, low quality, distorted";

/// 1080p renders are pinned to this duration
const FULL_HD_DURATION: u8 = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Resolution {
    P480,
    #[default]
    P720,
    P1080,
}

impl Resolution {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
        }
    }
}

impl FromStr for Resolution {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "480p" | "480" => Ok(Self::P480),
            "720p" | "720" => Ok(Self::P720),
            "1080p" | "1080" => Ok(Self::P1080),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AspectRatio {
    #[default]
    Landscape,
    Portrait,
    Square,
}

impl AspectRatio {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Square => "1:1",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            "1:1" => Ok(Self::Square),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum InvalidRequest {
    Prompt(&'static str),
    Duration(u8),
}

impl fmt::Display for InvalidRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prompt(issue) => f.write_str(issue),
            Self::Duration(duration) => write!(
                f,
                "duration must be between {MIN_DURATION} and {MAX_DURATION} seconds, got {duration}."
            ),
        }
    }
}

/// Parameters of a single video generation.
///
/// Only constructed through [`GenerationRequest::new`], which rejects invalid input and
/// applies the 1080p restrictions, so a 1080p request is always 9:16 and 10 seconds long.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    negative_prompt: String,
    resolution: Resolution,
    aspect_ratio: AspectRatio,
    duration_seconds: u8,
    seed: i64,
}

impl GenerationRequest {
    pub fn new(
        prompt: String,
        negative_prompt: String,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
        duration_seconds: u8,
        seed: i64,
    ) -> Result<Self, InvalidRequest> {
        if let Some(issue) = text_utils::check_prompt(&prompt) {
            return Err(InvalidRequest::Prompt(issue));
        }

        if !(MIN_DURATION..=MAX_DURATION).contains(&duration_seconds) {
            return Err(InvalidRequest::Duration(duration_seconds));
        }

        let mut request = Self {
            prompt: prompt.trim().into(),
            negative_prompt: negative_prompt.trim().into(),
            resolution,
            aspect_ratio,
            duration_seconds,
            seed,
        };
        request.normalize();

        Ok(request)
    }

    fn normalize(&mut self) {
        if self.resolution == Resolution::P1080 {
            if self.aspect_ratio != AspectRatio::Portrait
                || self.duration_seconds != FULL_HD_DURATION
            {
                log::warn!("1080p is locked to 9:16 and {FULL_HD_DURATION}s, overriding selection");
            }

            self.aspect_ratio = AspectRatio::Portrait;
            self.duration_seconds = FULL_HD_DURATION;
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn negative_prompt(&self) -> &str {
        &self.negative_prompt
    }

    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub const fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub const fn duration_seconds(&self) -> u8 {
        self.duration_seconds
    }

    pub const fn seed(&self) -> i64 {
        self.seed
    }

    pub fn frame_count(&self) -> u32 {
        u32::from(self.duration_seconds) * FRAME_MULTIPLIER
    }
}

impl fmt::Display for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}s ({} frames)",
            self.resolution,
            self.aspect_ratio,
            self.duration_seconds,
            self.frame_count()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn request(resolution: Resolution, aspect_ratio: AspectRatio, duration: u8) -> GenerationRequest {
        GenerationRequest::new(
            "a red car in a forest".into(),
            String::new(),
            resolution,
            aspect_ratio,
            duration,
            RANDOM_SEED,
        )
        .unwrap()
    }

    #[test]
    fn test_full_hd_is_locked() {
        for aspect_ratio in [AspectRatio::Landscape, AspectRatio::Portrait, AspectRatio::Square] {
            for duration in MIN_DURATION..=MAX_DURATION {
                let request = request(Resolution::P1080, aspect_ratio, duration);
                assert_eq!(request.aspect_ratio(), AspectRatio::Portrait);
                assert_eq!(request.duration_seconds(), 10);
                assert_eq!(request.frame_count(), 80);
            }
        }
    }

    #[test]
    fn test_lower_resolutions_keep_selection() {
        for resolution in [Resolution::P480, Resolution::P720] {
            for aspect_ratio in [AspectRatio::Landscape, AspectRatio::Portrait, AspectRatio::Square]
            {
                for duration in MIN_DURATION..=MAX_DURATION {
                    let request = request(resolution, aspect_ratio, duration);
                    assert_eq!(request.resolution(), resolution);
                    assert_eq!(request.aspect_ratio(), aspect_ratio);
                    assert_eq!(request.duration_seconds(), duration);
                    assert_eq!(request.frame_count(), u32::from(duration) * FRAME_MULTIPLIER);
                }
            }
        }
    }

    #[test]
    fn test_invalid_requests() {
        let result = GenerationRequest::new(
            "   ".into(),
            String::new(),
            Resolution::P720,
            AspectRatio::Landscape,
            10,
            RANDOM_SEED,
        );
        assert!(matches!(result, Err(InvalidRequest::Prompt(_))));

        let result = GenerationRequest::new(
            "prompt".into(),
            String::new(),
            Resolution::P720,
            AspectRatio::Landscape,
            16,
            RANDOM_SEED,
        );
        assert_eq!(result, Err(InvalidRequest::Duration(16)));

        // duration is validated before the 1080p override
        let result = GenerationRequest::new(
            "prompt".into(),
            String::new(),
            Resolution::P1080,
            AspectRatio::Portrait,
            4,
            RANDOM_SEED,
        );
        assert_eq!(result, Err(InvalidRequest::Duration(4)));
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("1080p".parse(), Ok(Resolution::P1080));
        assert_eq!("480".parse(), Ok(Resolution::P480));
        assert_eq!("4k".parse::<Resolution>(), Err(()));
        assert_eq!("9:16".parse(), Ok(AspectRatio::Portrait));
        assert_eq!("4:3".parse::<AspectRatio>(), Err(()));
    }
}
