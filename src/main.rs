use std::process::ExitCode;

use clap::Parser;
use utilities::config::Config;
use utilities::parse_arguments::Arguments;
use utilities::{logchamp, status};

mod apis;
mod dispatcher;
mod generate;
mod generation;
mod utilities;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let arguments = Arguments::parse();

    dotenvy::dotenv().ok();
    logchamp::init();

    let request = match arguments.into_request() {
        Ok(request) => request,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            status::report_config_error(&err);
            return ExitCode::FAILURE;
        }
    };

    let http_client = reqwest::Client::new();

    let generated = match generate::generate(&http_client, &config, &request).await {
        Ok(generated) => generated,
        Err(err) => {
            status::report_generation_error(&err);
            return ExitCode::FAILURE;
        }
    };

    status::report_generated(&generated);

    match generate::deliver(&http_client, &config, &generated).await {
        Ok(saved) => {
            let video_info = generate::inspect(&saved).await;
            status::report_saved(&saved, video_info.as_ref());
            ExitCode::SUCCESS
        }
        Err(err) => {
            status::report_download_error(&err);
            ExitCode::from(3)
        }
    }
}
