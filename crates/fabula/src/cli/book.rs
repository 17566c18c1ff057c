//! Book generation command handler.

use crate::cli::{CreateArgs, ImageProvider};
use fabula_book::{BookPipeline, BookSpec, CharacterSet, PromptLibrary};
use fabula_error::{BookError, BookErrorKind, ConfigError, FabulaResult};
use fabula_interface::{BookExecution, ImageDriver, ImageEditing, PageStatus};
use fabula_models::{
    OpenAiChatClient, OpenAiImageClient, ProviderConfig, ReplicateImageClient, openai_api_key,
    replicate_api_token,
};
use fabula_storage::BookStorage;

/// Generate a complete book from CLI arguments.
pub async fn run_create(args: CreateArgs) -> FabulaResult<()> {
    let prompts = load_prompts(args.prompts.as_deref())?;
    let providers = ProviderConfig::load()?;

    let characters = parse_characters(&args.characters)?;
    let spec = BookSpec::builder()
        .title(args.title)
        .style(args.style)
        .pages(args.pages)
        .outline(args.outline)
        .characters(characters)
        .quick_mode(args.infer_characters)
        .consistency(args.consistency)
        .build()
        .map_err(|e| BookError::new(BookErrorKind::InvalidSpec(e.to_string())))?;
    spec.validate()?;

    let storage = BookStorage::new(args.output_dir)?;
    let api_key = openai_api_key()?;
    let text = OpenAiChatClient::from_config(api_key.clone(), &providers);

    let execution = match args.image_provider {
        ImageProvider::Openai => {
            let image = OpenAiImageClient::from_config(api_key, &providers);
            run_pipeline(text, image, prompts, &providers, &spec, &storage).await?
        }
        ImageProvider::Replicate => {
            let image = ReplicateImageClient::from_config(replicate_api_token()?, &providers);
            run_pipeline(text, image, prompts, &providers, &spec, &storage).await?
        }
    };

    print_summary(&execution);
    Ok(())
}

async fn run_pipeline<I: ImageDriver + ImageEditing>(
    text: OpenAiChatClient,
    image: I,
    prompts: PromptLibrary,
    providers: &ProviderConfig,
    spec: &BookSpec,
    storage: &BookStorage,
) -> FabulaResult<BookExecution> {
    let pipeline = BookPipeline::new(text, image, prompts).with_token_limits(
        providers.openai.max_tokens,
        providers.openai.inference_max_tokens,
    );
    pipeline.generate(spec, storage).await
}

/// Load the prompt library from a file, or the bundled one.
pub(crate) fn load_prompts(path: Option<&std::path::Path>) -> FabulaResult<PromptLibrary> {
    match path {
        Some(path) => PromptLibrary::from_file(path),
        None => PromptLibrary::bundled(),
    }
}

/// Parse repeated `NAME=DESCRIPTION` flags into a roster.
fn parse_characters(raw: &[String]) -> FabulaResult<CharacterSet> {
    let mut characters = CharacterSet::new();
    for entry in raw {
        let (name, description) = entry.split_once('=').ok_or_else(|| {
            ConfigError::new(format!(
                "character '{entry}' is not in NAME=DESCRIPTION form"
            ))
        })?;
        let name = name.trim();
        let description = description.trim();
        if name.is_empty() || description.is_empty() {
            return Err(ConfigError::new(format!(
                "character '{entry}' has an empty name or description"
            ))
            .into());
        }
        characters.push(name, description);
    }
    Ok(characters)
}

fn print_summary(execution: &BookExecution) {
    println!("\nBook Generation Summary:");
    println!("========================");
    println!("Title: {}", execution.title);
    println!("Style: {}", execution.style);
    println!("Output: {}", execution.book_dir.display());
    println!(
        "Cover: {}",
        execution
            .cover_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(skipped)".to_string())
    );
    println!();

    for page in &execution.pages {
        let status = match page.status {
            PageStatus::Complete => "complete",
            PageStatus::TextOnly => "text only (image skipped)",
            PageStatus::Failed => "failed",
            PageStatus::NotAttempted => "not attempted",
        };
        println!("Page {}: {}", page.page_number, status);
        for error in &page.errors {
            println!("  error: {}", error);
        }
    }
    println!();

    if execution.all_successful {
        println!("All pages processed successfully!");
    } else {
        println!("Some pages encountered errors during generation.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn characters_parse_from_key_value_flags() {
        let roster = parse_characters(&[
            "Leo=A curious little lion cub".to_string(),
            "Maya = A swift swallow".to_string(),
        ])
        .unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.iter().next().unwrap().name, "Leo");
        assert_eq!(roster.iter().nth(1).unwrap().description, "A swift swallow");
    }

    #[test]
    fn character_flag_without_equals_is_rejected() {
        assert!(parse_characters(&["Leo the cub".to_string()]).is_err());
    }

    #[test]
    fn character_flag_with_empty_description_is_rejected() {
        assert!(parse_characters(&["Leo=".to_string()]).is_err());
    }
}
