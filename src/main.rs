use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "slidesmith",
    version,
    about = "Composite text overlays onto background photos and schedule them as short-form slides"
)]
struct Cli {
    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings", global = true)]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Composite a deck script onto background photos
    Compose(ComposeArgs),
    /// Generate background photos with an image provider
    Backgrounds(BackgroundsArgs),
    /// Upload composed slides and create a scheduled post
    Publish(PublishArgs),
    /// Run the admin/preview HTTP server
    Serve(ServeArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Deck script (TOML)
    #[arg(short = 's', long = "script")]
    script: String,

    /// Directory holding bg-NN images
    #[arg(short = 'b', long = "backgrounds-dir", default_value = "backgrounds")]
    backgrounds_dir: String,

    /// Output directory for slide-NN.png files
    #[arg(short = 'o', long = "out-dir", default_value = "out")]
    out_dir: String,

    /// Seed for randomized position/style/crop selection (omit for a fixed rotation)
    #[arg(long = "seed")]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct BackgroundsArgs {
    /// Output directory for bg-NN.png files
    #[arg(short = 'o', long = "out-dir", default_value = "backgrounds")]
    out_dir: String,

    /// Provider or provider:model (e.g. openai:gpt-image-1, stability)
    #[arg(short = 'm', long = "provider")]
    provider: Option<String>,

    /// API key (overrides environment variables)
    #[arg(short = 'k', long = "key")]
    key: Option<String>,

    /// File with one prompt per line (defaults to [backgrounds] prompts)
    #[arg(short = 'p', long = "prompts")]
    prompts: Option<String>,
}

#[derive(Parser, Debug)]
struct PublishArgs {
    /// Deck script (TOML), used for the caption
    #[arg(short = 's', long = "script")]
    script: String,

    /// Directory holding composed slide-NN.png files
    #[arg(short = 'd', long = "slides-dir", default_value = "out")]
    slides_dir: String,

    /// RFC-3339 time to schedule the post for (defaults to one hour from now)
    #[arg(long = "schedule")]
    schedule: Option<String>,

    /// Scheduler API token (overrides SLIDESMITH_SCHEDULER_TOKEN)
    #[arg(long = "token")]
    token: Option<String>,
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to bind
    #[arg(short = 'a', long = "addr", default_value = "127.0.0.1:8787")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    slidesmith::logging::init(cli.verbose)?;

    let command = match cli.command {
        Commands::Compose(args) => slidesmith::Command::Compose {
            script: args.script,
            backgrounds_dir: args.backgrounds_dir,
            out_dir: args.out_dir,
            seed: args.seed,
        },
        Commands::Backgrounds(args) => slidesmith::Command::Backgrounds {
            out_dir: args.out_dir,
            provider: args.provider,
            key: args.key,
            prompts_file: args.prompts,
        },
        Commands::Publish(args) => slidesmith::Command::Publish {
            script: args.script,
            slides_dir: args.slides_dir,
            schedule: args.schedule,
            token: args.token,
        },
        Commands::Serve(args) => slidesmith::Command::Serve { addr: args.addr },
    };

    let output = slidesmith::run(slidesmith::Config {
        settings_path: cli.read_settings,
        command,
    })
    .await?;

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
