//! Single-image command handler.

use crate::cli::ImageArgs;
use fabula_core::{ImageQuality, ImageRequest, ImageSize};
use fabula_error::{ConfigError, FabulaResult};
use fabula_interface::ImageDriver;
use fabula_models::{OpenAiImageClient, ProviderConfig, openai_api_key};
use fabula_storage::save_unique;
use std::str::FromStr;

/// Generate one image from a prompt and save it under a prompt-derived name.
pub async fn run_image(args: ImageArgs) -> FabulaResult<()> {
    let size = ImageSize::from_str(&args.size)
        .map_err(|_| ConfigError::new(format!("unsupported size '{}'", args.size)))?;
    let quality = ImageQuality::from_str(&args.quality)
        .map_err(|_| ConfigError::new(format!("unsupported quality '{}'", args.quality)))?;

    let providers = ProviderConfig::load()?;
    let client = OpenAiImageClient::from_config(openai_api_key()?, &providers);

    let request = ImageRequest::builder()
        .prompt(args.prompt.clone())
        .size(size)
        .quality(quality)
        .build()
        .map_err(|e| ConfigError::new(e.to_string()))?;

    tracing::info!(size = %size, quality = %quality, "Generating image");
    let artifact = client.generate_image(&request).await?;

    let path = save_unique(&args.output_dir, &args.prompt, "png", artifact.bytes()).await?;
    println!("Image saved as {}", path.display());
    Ok(())
}
