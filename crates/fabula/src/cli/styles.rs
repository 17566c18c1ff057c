//! Style catalog listing.

use crate::cli::book::load_prompts;
use fabula_error::FabulaResult;
use std::path::Path;

/// Print the style catalog.
pub fn show_styles(prompts: Option<&Path>) -> FabulaResult<()> {
    let library = load_prompts(prompts)?;

    println!("Available styles:");
    for (key, style) in library.styles() {
        let edit = if style.edit_template().is_some() {
            " (supports consistency edits)"
        } else {
            ""
        };
        println!("  {key:<20} {} [{}]{edit}", style.description(), style.kind());
    }
    Ok(())
}
