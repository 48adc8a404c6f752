//! CLI for Paint A Place - satellite view to painting.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use paintaplace::config::{self, Config};
use paintaplace::session::Session;
use paintaplace::{
    ActionOutcome, Capabilities, GeminiModel, GeminiPainter, GoogleGeocoder, MapOptions,
    MapRegion, RegionRasterizer, StaticMapRenderer, ViewController,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paintaplace")]
#[command(about = "Turn the satellite view of an address into a painting (Google Maps + Gemini)")]
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
    /// Search an address and paint its satellite view
    Paint(PaintArgs),

    /// List autocomplete candidates for partial input
    Suggest(SuggestArgs),

    /// Type addresses and press the buttons from a prompt
    Interactive(RegionArgs),

    /// Report which credentials are configured
    Check,
}

#[derive(Args)]
struct PaintArgs {
    /// The address to paint
    address: String,

    /// Output file path for the painting
    #[arg(short, long)]
    output: PathBuf,

    /// Also save the exact map snapshot sent for painting here
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[command(flatten)]
    region: RegionArgs,
}

#[derive(Args)]
struct RegionArgs {
    /// Map region size, e.g. 640x500 (each side at most 4096)
    #[arg(long, value_parser = parse_region)]
    region: Option<(u32, u32)>,

    /// Map zoom level (max 21)
    #[arg(long, default_value_t = 20)]
    zoom: u8,

    /// Render at double pixel density
    #[arg(long)]
    hidpi: bool,
}

#[derive(Args)]
struct SuggestArgs {
    /// Partial address text
    input: String,
}

fn parse_region(raw: &str) -> Result<(u32, u32), String> {
    config::parse_region(raw).ok_or_else(|| {
        format!(
            "expected WxH like 640x500 with sides up to {}, got {raw:?}",
            paintaplace::map::MAX_REGION_SIDE
        )
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment still applies.
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paintaplace=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Paint(args) => {
            paint(&config, args, cli.json).await?;
        }
        Commands::Suggest(args) => {
            suggest(&config, args, cli.json).await?;
        }
        Commands::Interactive(args) => {
            interactive(&config, args).await?;
        }
        Commands::Check => {
            check(&config, cli.json)?;
        }
    }

    Ok(())
}

fn build_controller(config: &Config, args: &RegionArgs) -> anyhow::Result<ViewController> {
    // Surface every missing credential at once instead of on first use.
    config.validate()?;

    let maps_key = config.maps_api_key.clone().unwrap_or_default();
    let gemini_key = config.gemini_api_key.clone().unwrap_or_default();

    let mut painter = GeminiPainter::builder().api_key(gemini_key);
    if let Some(ref model) = config.gemini_model {
        painter = painter.model(GeminiModel::from_id(model));
    }

    let caps = Capabilities {
        resolver: Arc::new(GoogleGeocoder::builder().api_key(maps_key.clone()).build()?),
        renderer: Arc::new(StaticMapRenderer::builder().api_key(maps_key).build()?),
        capturer: Arc::new(RegionRasterizer::new()),
        painter: Arc::new(painter.build()?),
    };

    let (width, height) = args.region.unwrap_or_else(|| config.region_size());
    let region = MapRegion::new(width, height).with_scale(if args.hidpi { 2 } else { 1 });

    Ok(ViewController::new(caps, region)
        .with_map_options(MapOptions::default().with_zoom(args.zoom)))
}

async fn paint(config: &Config, args: PaintArgs, json_output: bool) -> anyhow::Result<()> {
    let controller = build_controller(config, &args.region)?;

    controller.set_query(&args.address);
    if let Some(message) = failure(controller.search().await) {
        anyhow::bail!(message);
    }

    let outcome = controller.generate_painting().await;

    // Saved even when generation failed, since it shows what was sent.
    if let Some(ref path) = args.snapshot {
        if let Some(snapshot) = controller.last_snapshot() {
            snapshot
                .save(path)
                .with_context(|| format!("saving snapshot to {}", path.display()))?;
        }
    }

    if let Some(message) = failure(outcome) {
        anyhow::bail!(message);
    }

    let painting = controller
        .painting()
        .context("generation finished without a painting")?;
    painting
        .save(&args.output)
        .with_context(|| format!("saving painting to {}", args.output.display()))?;

    let state = controller.state();
    let location = state.location.as_ref();

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "address": args.address,
            "formatted_address": location.and_then(|l| l.formatted_address.clone()),
            "lat": location.map(|l| l.coordinate.lat),
            "lng": location.map(|l| l.coordinate.lng),
            "output": args.output.display().to_string(),
            "snapshot": args.snapshot.as_ref().map(|p| p.display().to_string()),
            "size_bytes": painting.image.size(),
            "format": painting.image.format.extension(),
            "model": painting.metadata.model,
            "duration_ms": painting.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", controller.view());
        println!("Saved painting: {} ({} bytes)", args.output.display(), painting.image.size());
        if let Some(duration) = painting.metadata.duration_ms {
            println!("Generation time: {}ms", duration);
        }
    }

    Ok(())
}

fn failure(outcome: ActionOutcome) -> Option<String> {
    match outcome {
        ActionOutcome::Completed => None,
        ActionOutcome::Failed(message) => Some(message),
        ActionOutcome::Rejected(rejection) => Some(rejection.to_string()),
    }
}

async fn suggest(config: &Config, args: SuggestArgs, json_output: bool) -> anyhow::Result<()> {
    use paintaplace::AddressResolver;

    let key = config
        .maps_api_key
        .clone()
        .with_context(|| format!("{} is not set", config::MAPS_KEY_VAR))?;
    let resolver = GoogleGeocoder::builder().api_key(key).build()?;
    let suggestions = resolver.suggest(&args.input).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
    } else if suggestions.is_empty() {
        println!("No suggestions for \"{}\".", args.input);
    } else {
        for (i, s) in suggestions.iter().enumerate() {
            println!("{:>2}. {}", i + 1, s.description);
        }
    }

    Ok(())
}

async fn interactive(config: &Config, args: RegionArgs) -> anyhow::Result<()> {
    let controller = build_controller(config, &args)?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    Session::new(&controller)
        .run(stdin, tokio::io::stdout())
        .await?;
    Ok(())
}

fn check(config: &Config, json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct CredentialInfo {
        name: &'static str,
        env_var: &'static str,
        configured: bool,
    }

    let credentials = vec![
        CredentialInfo {
            name: "Google Maps (geocoding, places, static maps)",
            env_var: config::MAPS_KEY_VAR,
            configured: config.maps_api_key.is_some(),
        },
        CredentialInfo {
            name: "Gemini (painting)",
            env_var: config::GEMINI_KEY_VAR,
            configured: config.gemini_api_key.is_some(),
        },
    ];

    if json_output {
        println!("{}", serde_json::to_string_pretty(&credentials)?);
    } else {
        println!("Credentials:\n");
        for c in &credentials {
            let status = if c.configured { "✓" } else { "✗" };
            println!("  {} {}", status, c.name);
            println!("    env: {}", c.env_var);
        }
        let (w, h) = config.region_size();
        println!("\nMap region: {}x{}", w, h);
    }

    config.validate()?;
    Ok(())
}
