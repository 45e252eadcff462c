use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "agrisens-server")]
#[command(about = "AgriSens crop and fertilizer recommendation server", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Directory holding model artifacts
    #[arg(short, long)]
    pub models_dir: Option<PathBuf>,

    /// SQLite database path
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Comma-separated CORS origins; `*` or empty allows any
    #[arg(long, env = "ALLOWED_ORIGINS")]
    pub allowed_origins: Option<String>,

    /// OpenWeatherMap API key
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub weather_api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
