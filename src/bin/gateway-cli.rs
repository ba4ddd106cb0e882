use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the verification gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8085")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway liveness
    Health,
    /// Show gateway version and effective configuration
    Version,
    /// Submit a CNIC document image (file path or https URL)
    Cnic { image: String },
    /// Submit a CNIC image and a selfie for face matching
    Face { cnic: String, selfie: String },
    /// Submit a shop image (file path or https URL)
    Shop { image: String },
}

/// Image argument: a remote URL is passed through, anything else is read
/// from disk and inlined as base64.
enum ImageArg {
    Url(String),
    Inline(String),
}

impl ImageArg {
    fn load(arg: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if arg.starts_with("https://") || arg.starts_with("http://") {
            return Ok(Self::Url(arg.to_string()));
        }
        let bytes = std::fs::read(Path::new(arg))
            .map_err(|e| format!("cannot read image file '{}': {}", arg, e))?;
        Ok(Self::Inline(STANDARD.encode(bytes)))
    }

    fn insert(self, body: &mut Map<String, Value>, inline_field: &str, url_field: &str) {
        match self {
            Self::Url(url) => body.insert(url_field.to_string(), Value::String(url)),
            Self::Inline(data) => body.insert(inline_field.to_string(), Value::String(data)),
        };
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Version => client.get(format!("{}/version", base)).send().await?,
        Commands::Cnic { image } => {
            let mut body = Map::new();
            ImageArg::load(&image)?.insert(&mut body, "image", "imageUrl");
            client.post(format!("{}/verify-cnic", base)).json(&body).send().await?
        }
        Commands::Face { cnic, selfie } => {
            let mut body = Map::new();
            ImageArg::load(&cnic)?.insert(&mut body, "cnicImage", "cnicImageUrl");
            ImageArg::load(&selfie)?.insert(&mut body, "selfieImage", "selfieUrl");
            client.post(format!("{}/face-verify", base)).json(&body).send().await?
        }
        Commands::Shop { image } => {
            let mut body = Map::new();
            ImageArg::load(&image)?.insert(&mut body, "image", "imageUrl");
            client.post(format!("{}/shop-verify", base)).json(&body).send().await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("Response: {}", rendered);
    }
    Ok(())
}
