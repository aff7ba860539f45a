//! CLI for ImageSwap - AI image replacement backend.

use clap::{Args, Parser, Subcommand};
use imageswap::server::{self, AppState, ServerConfig};
use imageswap::{
    replace_image, FireflyProvider, GenerationRequest, GoogleWorkspace, ImageProvider,
    ReplaceRequest,
};
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imageswap")]
#[command(about = "Generate images with Firefly and swap them into Google Docs and Sheets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service used by the browser plugin
    Serve(ServeArgs),

    /// Generate an image from a text prompt
    Generate(GenerateArgs),

    /// Replace a placeholder (or the first image) in a Docs/Sheets document
    Replace(ReplaceArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "IMAGESWAP_ADDR", default_value = "127.0.0.1:8787")]
    addr: SocketAddr,

    /// Origins allowed to call the API (comma-separated)
    #[arg(long, env = "IMAGESWAP_ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// Wildcard origin, e.g. https://*.example.app
    #[arg(long, env = "IMAGESWAP_ORIGIN_PATTERN")]
    origin_pattern: Option<String>,

    /// Seconds to wait for a single image generation
    #[arg(long, env = "IMAGESWAP_GENERATION_TIMEOUT_SECS", default_value_t = 60)]
    generation_timeout_secs: u64,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Args)]
struct ReplaceArgs {
    /// Google Docs or Sheets URL
    doc_url: String,

    /// URL of the image to insert
    image_url: String,

    /// Text to replace
    #[arg(long)]
    placeholder: Option<String>,

    /// Inserted image width in points (Docs only)
    #[arg(long)]
    width_pt: Option<f64>,

    /// Inserted image height in points (Docs only)
    #[arg(long)]
    height_pt: Option<f64>,

    /// Document id, overriding the one in the URL
    #[arg(long)]
    document_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("imageswap=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await?,
        Commands::Generate(args) => generate(args, cli.json).await?,
        Commands::Replace(args) => replace(args, cli.json).await?,
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = ServerConfig {
        addr: args.addr,
        allowed_origins: args.allowed_origins,
        origin_pattern: args.origin_pattern,
        generation_timeout: Duration::from_secs(args.generation_timeout_secs),
    };
    if config.allowed_origins.is_empty() && config.origin_pattern.is_none() {
        tracing::warn!("no allowed origins configured; browsers will be refused");
    }

    let state = AppState::from_config(&config);
    server::serve(config, state).await?;
    Ok(())
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let mut request = GenerationRequest::new(&args.prompt);
    match (args.width, args.height) {
        (Some(w), Some(h)) => request = request.with_size(w, h),
        (None, None) => {}
        _ => anyhow::bail!("--width and --height must be given together"),
    }

    let provider = FireflyProvider::builder().build()?;
    let image = provider.generate(&request).await?;

    if json_output {
        let result = serde_json::json!({
            "imageUrl": image.image_url,
            "provider": image.provider.to_string(),
            "duration_ms": image.metadata.duration_ms,
            "raw": image.raw,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Generated image: {} via {}", image.image_url, provider.name());
        if let Some(duration) = image.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}

async fn replace(args: ReplaceArgs, json_output: bool) -> anyhow::Result<()> {
    let mut request = ReplaceRequest::new(args.doc_url, args.image_url);
    request.placeholder = args.placeholder;
    request.width_pt = args.width_pt;
    request.height_pt = args.height_pt;
    request.document_id = args.document_id;

    // Fail on a bad request before requiring credentials
    request.validate()?;

    let workspace = GoogleWorkspace::from_env()?;
    let outcome = replace_image(&workspace, &request).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        match (outcome.replaced, outcome.mode) {
            (imageswap::Replaced::Flag(true), Some(_)) => {
                println!("No placeholder found; replaced the first image ({})", outcome.kind)
            }
            (imageswap::Replaced::Count(n), _) => println!("Replaced {} in {}", n, outcome.kind),
            (imageswap::Replaced::Flag(_), _) => println!("Nothing replaced in {}", outcome.kind),
        }
    }

    Ok(())
}
