//! CLI command definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Fabula - illustrated storybook generator driving text- and image-generation APIs
#[derive(Parser, Debug)]
#[command(name = "fabula")]
#[command(about = "Generate multi-page illustrated storybooks from an outline", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a complete illustrated book
    Create(CreateArgs),

    /// Generate a single image from a prompt
    Image(ImageArgs),

    /// List the available illustration styles
    Styles {
        /// Path to a prompt library TOML (bundled library when omitted)
        #[arg(long)]
        prompts: Option<PathBuf>,
    },

    /// Run the HTTP front end
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: String,

        /// Root directory for generated books
        #[arg(long, default_value = "output_books")]
        output_dir: PathBuf,
    },
}

/// Arguments for book generation.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Book title (also names the output directory)
    #[arg(long)]
    pub title: String,

    /// Style catalog key (see `fabula styles`)
    #[arg(long)]
    pub style: String,

    /// Total number of pages
    #[arg(long, default_value = "10")]
    pub pages: u32,

    /// Story outline or concept
    #[arg(long)]
    pub outline: String,

    /// Character as NAME=DESCRIPTION; repeat for more characters
    #[arg(long = "character", value_name = "NAME=DESCRIPTION")]
    pub characters: Vec<String>,

    /// Infer 2-4 characters from the outline instead of providing them
    #[arg(long, conflicts_with = "characters")]
    pub infer_characters: bool,

    /// Produce each page by editing the previous page's image
    #[arg(long)]
    pub consistency: bool,

    /// Root directory for generated books
    #[arg(long, default_value = "output_books")]
    pub output_dir: PathBuf,

    /// Which backend renders the illustrations
    #[arg(long, value_enum, default_value_t = ImageProvider::Openai)]
    pub image_provider: ImageProvider,

    /// Path to a prompt library TOML (bundled library when omitted)
    #[arg(long)]
    pub prompts: Option<PathBuf>,
}

/// Arguments for single-image generation.
#[derive(Args, Debug)]
pub struct ImageArgs {
    /// The image prompt
    pub prompt: String,

    /// Image size (1024x1024, 1536x1024, 1024x1536, auto)
    #[arg(long, default_value = "1024x1024")]
    pub size: String,

    /// Image quality (low, medium, high, auto)
    #[arg(long, default_value = "high")]
    pub quality: String,

    /// Directory to write the image into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

/// Image backend options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageProvider {
    /// OpenAI Images API (generation + edits)
    Openai,
    /// Replicate flux-kontext predictions
    Replicate,
}
