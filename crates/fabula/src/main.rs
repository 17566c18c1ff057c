//! Fabula CLI binary.
//!
//! This binary provides command-line access to Fabula's functionality:
//! - Generate a complete illustrated book
//! - Generate a single image from a prompt
//! - List the style catalog
//! - Run the HTTP front end

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, run_create, run_image, run_serve, show_styles};

    // API keys may live in a .env file next to the working directory.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Execute the requested command
    match cli.command {
        Commands::Create(args) => {
            run_create(args).await?;
        }

        Commands::Image(args) => {
            run_image(args).await?;
        }

        Commands::Styles { prompts } => {
            show_styles(prompts.as_deref())?;
        }

        Commands::Serve { bind, output_dir } => {
            run_serve(bind, output_dir).await?;
        }
    }

    Ok(())
}
