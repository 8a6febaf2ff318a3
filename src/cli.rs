use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "video-analyzer",
    about = "Analyze a YouTube video, local file or video URL with Gemini",
    version = env!("GIT_DESCRIBE"),
    group(ArgGroup::new("source").required(true).args(["youtube", "local", "url"])),
)]
pub struct Cli {
    /// Analysis prompt (uses the built-in tech video prompt if omitted)
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// YouTube video URL or video ID
    #[arg(short, long)]
    pub youtube: Option<String>,

    /// Local video file path
    #[arg(short, long)]
    pub local: Option<PathBuf>,

    /// Video URL to download and analyze (non-YouTube)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Webhook that receives the result as JSON
    #[arg(short, long)]
    pub webhook: Option<String>,

    /// Gemini model [default: gemini-2.5-flash]
    #[arg(short, long)]
    pub model: Option<String>,

    /// Google AI API key
    #[arg(short = 'k', long, env = "GOOGLE_AI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show settings and download progress
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["video-analyzer", "-k", "key"]).is_err());
        assert!(
            Cli::try_parse_from(["video-analyzer", "-k", "key", "-y", "dQw4w9WgXcQ", "-l", "a.mp4"]).is_err()
        );
    }

    #[test]
    fn test_parse_local_with_webhook() {
        let cli = Cli::try_parse_from([
            "video-analyzer",
            "--local",
            "sample.mp4",
            "--prompt",
            "describe this video",
            "--webhook",
            "https://hooks.example.com/x",
            "--api-key",
            "key",
        ])
        .unwrap();
        assert_eq!(cli.local, Some(PathBuf::from("sample.mp4")));
        assert_eq!(cli.prompt.as_deref(), Some("describe this video"));
        assert_eq!(cli.webhook.as_deref(), Some("https://hooks.example.com/x"));
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.model.is_none());
    }
}
