//! Book generation pipeline.
//!
//! This module provides the executor that turns a [`BookSpec`] into a
//! directory of illustrations by alternating Stage-1 text calls (threading
//! conversation history) and Stage-2 image calls.

use crate::{
    BookSpec, CharacterSet, PageContent, PromptLibrary, Recovery, RecoveryHandler, SkipOnFailure,
    StyleConfig, StyleKind, characters::first_text, infer_characters, render_template,
};
use fabula_core::{
    GenerateRequest, ImageArtifact, ImageQuality, ImageRequest, ImageSize, Message, Role,
};
use fabula_error::{BookError, BookErrorKind, FabulaError, FabulaResult};
use fabula_interface::{
    BookExecution, ImageDriver, ImageEditing, PageRecord, PageStatus, TextDriver,
};
use fabula_storage::{BookDirectory, BookManifest, BookStorage};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Token ceiling for one page's JSON structure.
const DEFAULT_PAGE_MAX_TOKENS: u32 = 1000;
/// Token ceiling for character inference.
const DEFAULT_INFERENCE_MAX_TOKENS: u32 = 500;

/// Generates books by calling the text and image APIs in sequence.
///
/// Each page's Stage-1 call sees the full conversation so far: the first
/// page seeds the history with the style's system message and the formatted
/// opening prompt, later pages append only a short continuation request.
/// Stage 2 then renders the page's illustration, editing the previous image
/// when consistency mode is on.
pub struct BookPipeline<T: TextDriver, I: ImageDriver + ImageEditing> {
    text: T,
    image: I,
    prompts: PromptLibrary,
    recovery: Box<dyn RecoveryHandler>,
    page_max_tokens: u32,
    inference_max_tokens: u32,
}

impl<T: TextDriver, I: ImageDriver + ImageEditing> BookPipeline<T, I> {
    /// Create a pipeline with the default (skip-on-failure) recovery.
    pub fn new(text: T, image: I, prompts: PromptLibrary) -> Self {
        Self {
            text,
            image,
            prompts,
            recovery: Box::new(SkipOnFailure),
            page_max_tokens: DEFAULT_PAGE_MAX_TOKENS,
            inference_max_tokens: DEFAULT_INFERENCE_MAX_TOKENS,
        }
    }

    /// Replace the recovery handler.
    pub fn with_recovery(mut self, recovery: Box<dyn RecoveryHandler>) -> Self {
        self.recovery = recovery;
        self
    }

    /// Override the Stage-1 token ceilings.
    pub fn with_token_limits(mut self, page_max_tokens: u32, inference_max_tokens: u32) -> Self {
        self.page_max_tokens = page_max_tokens;
        self.inference_max_tokens = inference_max_tokens;
        self
    }

    /// The text driver backing Stage 1.
    pub fn text_driver(&self) -> &T {
        &self.text
    }

    /// The image driver backing Stage 2.
    pub fn image_driver(&self) -> &I {
        &self.image
    }

    /// Generate a complete book under the given storage root.
    ///
    /// # Errors
    ///
    /// Returns an error for unrecoverable setup failures: invalid spec,
    /// unknown style, character inference failure, or storage failures.
    /// Per-page API failures are recorded in the execution instead.
    #[tracing::instrument(skip(self, spec, storage), fields(title = %spec.title(), pages = spec.pages(), style = %spec.style()))]
    pub async fn generate(
        &self,
        spec: &BookSpec,
        storage: &BookStorage,
    ) -> FabulaResult<BookExecution> {
        spec.validate()?;
        let style = self.prompts.style(spec.style())?;

        // Resolve the roster before touching the filesystem; inference
        // failure aborts the run the same way a bad spec does.
        let characters = if *spec.quick_mode() && spec.characters().is_empty() {
            info!("Quick mode: inferring characters from the outline");
            infer_characters(
                &self.text,
                &self.prompts,
                spec.outline(),
                self.inference_max_tokens,
            )
            .await?
        } else {
            spec.characters().clone()
        };

        let book = storage.open_book(spec.title())?;
        info!(dir = %book.path().display(), "Writing book");

        let mut manifest =
            BookManifest::new(spec.title().clone(), spec.style().clone(), *spec.consistency());

        // Cover
        let (cover_path, cover_artifact, cover_aborted) = self
            .generate_cover(spec, style, &characters, &book, &mut manifest)
            .await?;

        let mut pages: Vec<PageRecord> = Vec::with_capacity(*spec.pages() as usize);

        if cover_aborted {
            for page_number in 1..=*spec.pages() {
                pages.push(PageRecord::not_attempted(page_number));
            }
            book.write_manifest(&manifest).await?;
            return Ok(BookExecution {
                title: spec.title().clone(),
                style: spec.style().clone(),
                book_dir: book.path().to_path_buf(),
                cover_path,
                pages,
                all_successful: false,
            });
        }

        // Page loop
        let mut history: Vec<Message> = Vec::new();
        // In consistency mode the cover seeds the first edit.
        let mut previous: Option<ImageArtifact> = cover_artifact;
        let mut aborted = false;

        for page_number in 1..=*spec.pages() {
            if aborted {
                pages.push(PageRecord::not_attempted(page_number));
                continue;
            }

            let percent = page_number * 100 / spec.pages();
            info!(
                page = page_number,
                total = spec.pages(),
                percent,
                "Processing page"
            );

            let mut record = PageRecord {
                page_number,
                status: PageStatus::Failed,
                scene_description: None,
                text: None,
                image_path: None,
                edited_from_previous: false,
                errors: Vec::new(),
            };

            // Stage 1
            let content = match self
                .stage1(spec, *style.kind(), &characters, page_number, &mut history)
                .await
            {
                Ok(content) => content,
                Err(e) => {
                    warn!(page = page_number, error = %e, "Stage 1 failed");
                    record.errors.push(e.to_string());
                    pages.push(record);
                    continue;
                }
            };

            record.scene_description = Some(content.scene_description.clone());
            record.text = Some(content.text(*style.kind()).to_string());
            if content.text(*style.kind()).is_empty() {
                warn!(page = page_number, "Stage 1 returned empty page text");
            }
            debug!(page = page_number, "Stage 1 succeeded");

            // Stage 2
            aborted = self
                .stage2(
                    spec,
                    style,
                    &characters,
                    &content,
                    &book,
                    &mut previous,
                    &mut manifest,
                    &mut record,
                )
                .await?;

            pages.push(record);
        }

        book.write_manifest(&manifest).await?;

        let all_successful =
            !aborted && pages.iter().all(|p| p.status == PageStatus::Complete);
        info!(
            completed = pages.iter().filter(|p| p.status == PageStatus::Complete).count(),
            total = spec.pages(),
            all_successful,
            "Book generation finished"
        );

        Ok(BookExecution {
            title: spec.title().clone(),
            style: spec.style().clone(),
            book_dir: book.path().to_path_buf(),
            cover_path,
            pages,
            all_successful,
        })
    }

    /// Generate and persist the cover.
    ///
    /// Returns the saved path, the artifact for consistency seeding, and
    /// whether the recovery handler aborted the run.
    async fn generate_cover(
        &self,
        spec: &BookSpec,
        style: &StyleConfig,
        characters: &CharacterSet,
        book: &BookDirectory,
        manifest: &mut BookManifest,
    ) -> FabulaResult<(Option<std::path::PathBuf>, Option<ImageArtifact>, bool)> {
        info!("Generating cover");

        let details = characters.details_block();
        let vars = HashMap::from([
            ("character_details_string", details.as_str()),
            ("book_title", spec.title().as_str()),
            ("style_description", style.description().as_str()),
        ]);
        let prompt = render_template("cover", self.prompts.cover_template(), &vars)?;

        let mut request = ImageRequest::builder()
            .prompt(prompt)
            .size(ImageSize::Wide)
            .quality(ImageQuality::High)
            .build()
            .map_err(|e| build_error(format!("Failed to build cover request: {e}")))?;

        loop {
            match self.image.generate_image(&request).await {
                Ok(artifact) => {
                    let path = book.save_cover(artifact.bytes()).await?;
                    manifest.record("cover.png", artifact.bytes());
                    info!(path = %path.display(), "Cover saved");
                    let seed = if *spec.consistency() {
                        Some(artifact)
                    } else {
                        None
                    };
                    return Ok((Some(path), seed, false));
                }
                Err(e) => {
                    warn!(error = %e, "Cover generation failed");
                    match self.recovery.on_cover_failure(request.prompt(), &e) {
                        Recovery::Skip => {
                            info!("Skipping cover");
                            return Ok((None, None, false));
                        }
                        Recovery::Retry(prompt) => {
                            info!("Retrying cover with revised prompt");
                            request = request.with_prompt(prompt);
                        }
                        Recovery::Abort => {
                            warn!("Aborting book generation at cover");
                            return Ok((None, None, true));
                        }
                    }
                }
            }
        }
    }

    /// Run Stage 1 for one page, threading the conversation history.
    ///
    /// The assistant reply is appended to the history whether or not it
    /// parses, so the conversation stays coherent for later pages.
    async fn stage1(
        &self,
        spec: &BookSpec,
        kind: StyleKind,
        characters: &CharacterSet,
        page_number: u32,
        history: &mut Vec<Message>,
    ) -> FabulaResult<PageContent> {
        if page_number == 1 {
            let pair = self.prompts.stage1(kind)?;
            let characters_json = characters.to_pretty_json();
            let page_str = page_number.to_string();
            let total_str = spec.pages().to_string();
            let vars = HashMap::from([
                ("characters_json", characters_json.as_str()),
                ("story_outline", spec.outline().as_str()),
                ("page_number", page_str.as_str()),
                ("total_pages", total_str.as_str()),
            ]);
            let user_prompt = render_template("stage1", pair.user_template(), &vars)?;

            history.push(Message::text(Role::System, pair.system_message().clone()));
            history.push(Message::text(Role::User, user_prompt));
        } else {
            history.push(Message::text(
                Role::User,
                format!(
                    "Now generate ONLY the JSON object for page {page_number}, continuing the story logically."
                ),
            ));
        }

        let request = GenerateRequest::builder()
            .messages(history.clone())
            .max_tokens(Some(self.page_max_tokens))
            .json(true)
            .build()
            .map_err(|e| build_error(format!("Failed to build page request: {e}")))?;

        debug!(page = page_number, messages = history.len(), "Requesting page structure");
        let response = self.text.generate(&request).await?;
        let reply = first_text(&response.outputs)?;

        // Keep the reply in the history even if it fails validation below.
        history.push(Message::text(Role::Assistant, reply.clone()));

        PageContent::parse(&reply, page_number, kind)
    }

    /// Run Stage 2 for one page: build the prompt, generate or edit, apply
    /// recovery, and persist.
    ///
    /// Returns true when the recovery handler aborted the run.
    #[allow(clippy::too_many_arguments)]
    async fn stage2(
        &self,
        spec: &BookSpec,
        style: &StyleConfig,
        characters: &CharacterSet,
        content: &PageContent,
        book: &BookDirectory,
        previous: &mut Option<ImageArtifact>,
        manifest: &mut BookManifest,
        record: &mut PageRecord,
    ) -> FabulaResult<bool> {
        let page_number = content.page_number;
        let consistency = *spec.consistency();

        // Characters mentioned in this scene. In consistency mode the edited
        // image already carries appearance, so later pages list names only.
        let mentioned = characters.mentioned_in(&content.scene_description);
        let details = if consistency && page_number > 2 {
            if mentioned.is_empty() {
                "(Characters from previous pages)".to_string()
            } else {
                mentioned.names_block()
            }
        } else if mentioned.is_empty() {
            "(No specific characters mentioned in scene description)".to_string()
        } else {
            mentioned.details_block()
        };

        let template = if consistency {
            match style.edit_template() {
                Some(edit) => edit.as_str(),
                None => {
                    warn!(
                        style = %spec.style(),
                        "No edit template for style, using the generation template"
                    );
                    style.template().as_str()
                }
            }
        } else {
            style.template().as_str()
        };

        let (page_text, script_text) = match style.kind() {
            StyleKind::Childrens => (content.text(StyleKind::Childrens), ""),
            StyleKind::Narrative => ("", content.text(StyleKind::Narrative)),
        };
        let vars = HashMap::from([
            ("scene_description", content.scene_description.as_str()),
            ("character_details_string", details.as_str()),
            ("page_text", page_text),
            ("script_text", script_text),
        ]);
        let prompt = match render_template(spec.style(), template, &vars) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(page = page_number, error = %e, "Image prompt formatting failed");
                record.errors.push(e.to_string());
                record.status = PageStatus::TextOnly;
                return Ok(false);
            }
        };

        let mut request = ImageRequest::builder()
            .prompt(prompt)
            .size(ImageSize::Wide)
            .quality(ImageQuality::High)
            .build()
            .map_err(|e| build_error(format!("Failed to build image request: {e}")))?;

        // First attempt: edit the previous image in consistency mode, with
        // standard generation as the fallback.
        let mut attempt = match (consistency, previous.as_ref()) {
            (true, Some(base)) => {
                debug!(page = page_number, "Editing previous image");
                match self.image.edit_image(base, &request).await {
                    Ok(artifact) => Ok((artifact, true)),
                    Err(e) => {
                        warn!(page = page_number, error = %e, "Image edit failed, falling back to generation");
                        record.errors.push(format!("edit failed: {e}"));
                        self.image.generate_image(&request).await.map(|a| (a, false))
                    }
                }
            }
            _ => {
                debug!(page = page_number, "Generating image");
                self.image.generate_image(&request).await.map(|a| (a, false))
            }
        };

        loop {
            match attempt {
                Ok((artifact, edited)) => {
                    let path = book.save_page(page_number, artifact.bytes()).await?;
                    manifest.record(
                        path.file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_default(),
                        artifact.bytes(),
                    );
                    info!(page = page_number, path = %path.display(), "Page image saved");
                    record.image_path = Some(path);
                    record.edited_from_previous = edited;
                    record.status = PageStatus::Complete;
                    if consistency {
                        *previous = Some(artifact);
                    }
                    return Ok(false);
                }
                Err(e) => {
                    warn!(page = page_number, error = %e, "Image generation failed");
                    record.errors.push(e.to_string());
                    match self
                        .recovery
                        .on_page_image_failure(page_number, request.prompt(), &e)
                    {
                        Recovery::Skip => {
                            info!(page = page_number, "Skipping page image");
                            record.status = PageStatus::TextOnly;
                            return Ok(false);
                        }
                        Recovery::Retry(prompt) => {
                            info!(page = page_number, "Retrying image with revised prompt");
                            request = request.with_prompt(prompt);
                            attempt = self
                                .image
                                .generate_image(&request)
                                .await
                                .map(|a| (a, false));
                        }
                        Recovery::Abort => {
                            warn!(page = page_number, "Aborting remaining pages");
                            record.status = PageStatus::TextOnly;
                            return Ok(true);
                        }
                    }
                }
            }
        }
    }
}

fn build_error(message: String) -> FabulaError {
    BookError::new(BookErrorKind::InvalidSpec(message)).into()
}
