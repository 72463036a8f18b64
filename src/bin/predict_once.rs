//! predict_once - submit a single image and print the prediction.
//!
//! Health-checks the backend, encodes the image as a JPEG frame, posts it to
//! the predict endpoint and writes the decoded result to stdout as JSON.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use neuralpose_client::ingest::{MediaCategory, StillImage};
use neuralpose_client::ui::Ui;
use neuralpose_client::{ClientConfig, InferenceClient};

#[derive(Parser, Debug)]
#[command(
    name = "predict_once",
    version,
    about = "Submit one image to the activity-recognition backend"
)]
struct Args {
    /// JPEG or PNG image to submit.
    #[arg(long, value_name = "PATH")]
    image: PathBuf,

    /// Override the configured backend base URL.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let mut config = ClientConfig::load()?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    let client = InferenceClient::from_config(&config);

    {
        let _stage = ui.stage("Check backend health");
        client
            .check_health()
            .context("backend offline - cannot process")?;
    }

    let frame = {
        let _stage = ui.stage("Encode image");
        if !MediaCategory::Image.matches(&args.image) {
            return Err(anyhow!("{} is not a JPEG or PNG image", args.image.display()));
        }
        let bytes = std::fs::read(&args.image)
            .with_context(|| format!("read {}", args.image.display()))?;
        let name = args
            .image
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        StillImage::decode(&name, &bytes)?.encode()?
    };

    let result = {
        let _stage = ui.stage("Submit frame");
        client.submit_frame(frame)?
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
