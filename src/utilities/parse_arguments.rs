use clap::Parser;

use crate::generation::{
    AspectRatio, DEFAULT_DURATION, DEFAULT_NEGATIVE_PROMPT, GenerationRequest, InvalidRequest,
    MAX_DURATION, MIN_DURATION, RANDOM_SEED, Resolution,
};

/// Generate a video on a remote Gradio server.
#[derive(Parser, Debug)]
#[command(name = "velo", version)]
pub struct Arguments {
    /// render resolution, 1080p is always 9:16 and 10 seconds long
    #[arg(short, long, default_value = "720p", value_parser = parse_resolution)]
    pub resolution: Resolution,
    /// aspect ratio
    #[arg(short, long, default_value = "16:9", value_parser = parse_aspect_ratio)]
    pub aspect_ratio: AspectRatio,
    /// duration in seconds
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_DURATION,
        value_parser = clap::value_parser!(u8).range(i64::from(MIN_DURATION)..=i64::from(MAX_DURATION))
    )]
    pub duration: u8,
    /// things the video should avoid
    #[arg(short, long, default_value = DEFAULT_NEGATIVE_PROMPT)]
    pub negative_prompt: String,
    /// generation seed, `random` or -1 lets the server choose
    #[arg(short, long, default_value = "random", allow_negative_numbers = true, value_parser = parse_seed)]
    pub seed: i64,
    /// what the video should show
    #[arg(required = true)]
    pub prompt: Vec<String>,
}

impl Arguments {
    /// Validates the arguments and applies the resolution restrictions.
    pub fn into_request(self) -> Result<GenerationRequest, InvalidRequest> {
        GenerationRequest::new(
            self.prompt.join(" "),
            self.negative_prompt,
            self.resolution,
            self.aspect_ratio,
            self.duration,
            self.seed,
        )
    }
}

fn parse_resolution(value: &str) -> Result<Resolution, String> {
    value.trim().parse().map_err(|()| "expected 480p, 720p or 1080p".into())
}

fn parse_aspect_ratio(value: &str) -> Result<AspectRatio, String> {
    value.trim().parse().map_err(|()| "expected 16:9, 9:16 or 1:1".into())
}

fn parse_seed(value: &str) -> Result<i64, String> {
    match value.trim() {
        "random" => Ok(RANDOM_SEED),
        seed => match seed.parse() {
            Ok(seed) if seed >= RANDOM_SEED => Ok(seed),
            _ => Err("expected -1, random or a positive number".into()),
        },
    }
}

#[cfg(test)]
mod test {
    use clap::error::ErrorKind;

    use super::*;

    fn parse(arguments: &[&str]) -> Result<Arguments, clap::Error> {
        Arguments::try_parse_from(std::iter::once("velo").chain(arguments.iter().copied()))
    }

    fn request(arguments: &[&str]) -> GenerationRequest {
        parse(arguments).unwrap().into_request().unwrap()
    }

    #[test]
    fn test_defaults() {
        let request = request(&["a", "red", "car"]);

        assert_eq!(request.prompt(), "a red car");
        assert_eq!(request.negative_prompt(), DEFAULT_NEGATIVE_PROMPT);
        assert_eq!(request.resolution(), Resolution::P720);
        assert_eq!(request.aspect_ratio(), AspectRatio::Landscape);
        assert_eq!(request.duration_seconds(), 10);
        assert_eq!(request.seed(), RANDOM_SEED);
    }

    #[test]
    fn test_options() {
        let request = request(&[
            "-r", "480p", "--aspect-ratio=1:1", "-d", "7", "-n", "", "--seed", "42", "forest",
        ]);

        assert_eq!(request.prompt(), "forest");
        assert_eq!(request.negative_prompt(), "");
        assert_eq!(request.resolution(), Resolution::P480);
        assert_eq!(request.aspect_ratio(), AspectRatio::Square);
        assert_eq!(request.duration_seconds(), 7);
        assert_eq!(request.frame_count(), 56);
        assert_eq!(request.seed(), 42);
    }

    #[test]
    fn test_negative_seed() {
        assert_eq!(request(&["--seed", "-1", "forest"]).seed(), RANDOM_SEED);
        assert!(parse(&["--seed", "-2", "forest"]).is_err());
    }

    #[test]
    fn test_full_hd_overrides_options() {
        let request = request(&["--resolution", "1080p", "-a", "16:9", "-d", "15", "city"]);

        assert_eq!(request.aspect_ratio(), AspectRatio::Portrait);
        assert_eq!(request.duration_seconds(), 10);
    }

    #[test]
    fn test_prompt_after_separator() {
        let request = request(&["--", "-dash", "--prompt"]);
        assert_eq!(request.prompt(), "-dash --prompt");
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
        assert_eq!(
            parse(&[]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(parse(&["-d", "4", "foo"]).unwrap_err().kind(), ErrorKind::ValueValidation);
        assert_eq!(parse(&["-d", "16", "foo"]).unwrap_err().kind(), ErrorKind::ValueValidation);
        assert_eq!(parse(&["-r", "4k", "foo"]).unwrap_err().kind(), ErrorKind::ValueValidation);
        assert_eq!(parse(&["-a", "21:9", "foo"]).unwrap_err().kind(), ErrorKind::ValueValidation);
        assert_eq!(parse(&["--fps", "24", "foo"]).unwrap_err().kind(), ErrorKind::UnknownArgument);
        assert!(matches!(
            parse(&["   "]).unwrap().into_request(),
            Err(InvalidRequest::Prompt(_))
        ));
    }
}
