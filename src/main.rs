use std::path::PathBuf;
use std::time::Duration;

use eyre::{Result, bail};
use log::{debug, info};

mod cli;

use cli::{Cli, OutputFormat};
use video_analyzer::gemini::GeminiClient;
use video_analyzer::{AnalysisRequest, Analyzer, DEFAULT_MODEL, VideoSource};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("video-analyzer.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("video-analyzer")
        .join("logs")
}

fn build_after_help() -> String {
    let log_path = log_dir().join("video-analyzer.log");
    let config_path = video_analyzer::config::config_path();

    format!(
        "\nEXAMPLES:\n  \
         video-analyzer --youtube https://www.youtube.com/watch?v=dQw4w9WgXcQ\n  \
         video-analyzer -p \"Summarize the key points\" -l ./talk.mp4 -w https://webhook.site/<id>\n  \
         video-analyzer -u https://example.com/video.mp4 -f json\n\n\
         Config is read from: {}\nLogs are written to: {}",
        config_path.display(),
        log_path.display()
    )
}

fn source_from(cli: &Cli) -> Result<VideoSource> {
    if let Some(ref input) = cli.youtube {
        let url = video_analyzer::normalize_youtube_url(input).unwrap_or_else(|| input.trim().to_string());
        return Ok(VideoSource::YouTube(url));
    }
    if let Some(ref path) = cli.local {
        if !path.is_file() {
            bail!("file does not exist: {}", path.display());
        }
        return Ok(VideoSource::Local(path.clone()));
    }
    if let Some(ref url) = cli.url {
        return Ok(VideoSource::Remote(url.trim().to_string()));
    }
    bail!("one of --youtube, --local or --url is required");
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = video_analyzer::config::Config::load().unwrap_or_default();

    let Some(api_key) = cli.api_key.clone().filter(|k| !k.trim().is_empty()) else {
        bail!("an API key is required\n\nSet GOOGLE_AI_API_KEY or pass --api-key");
    };

    let source = source_from(&cli)?;

    // CLI flags take priority over config values
    let model = cli
        .model
        .clone()
        .or_else(|| config.default_model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let webhook = cli.webhook.clone().or_else(|| config.webhook_url.clone());

    let mut settings = config.analyzer_settings();
    settings.show_progress = cli.verbose;

    if cli.verbose {
        let config_path = video_analyzer::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!("Model: {model}");
        match cli.prompt {
            Some(ref prompt) => eprintln!("Prompt: {prompt}"),
            None => eprintln!("Prompt: built-in default"),
        }
        match &source {
            VideoSource::YouTube(url) => eprintln!("YouTube video: {url}"),
            VideoSource::Local(path) => eprintln!("Local video: {}", path.display()),
            VideoSource::Remote(url) => eprintln!("Video URL: {url}"),
        }
        if let Some(ref url) = webhook {
            eprintln!("Webhook: {url}");
        }
    }
    debug!("Poll settings: {:?}", settings.poll);

    let client = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
    let analyzer = Analyzer::new(GeminiClient::new(api_key).with_client(client.clone()))
        .with_client(client)
        .with_settings(settings);
    let request = AnalysisRequest {
        prompt: cli.prompt.clone(),
        source,
        model,
    };

    let result = analyzer.analyze(&request, webhook.as_deref()).await;

    let rendered = match cli.format {
        OutputFormat::Text => video_analyzer::output::render_text(&result),
        OutputFormat::Json => video_analyzer::output::render_json(&result),
    };

    if let Some(ref path) = cli.output {
        std::fs::write(path, &rendered)?;
        if cli.verbose {
            eprintln!("Output written to: {}", path.display());
        }
    } else {
        println!("{rendered}");
    }

    if result.is_error() {
        std::process::exit(1);
    }

    Ok(())
}
