//! Tests for prompt library loading and validation.

use fabula_book::{PromptLibrary, StyleKind};

#[test]
fn bundled_library_loads_and_validates() {
    let library = PromptLibrary::bundled().unwrap();

    let styles: Vec<&str> = library.styles().map(|(key, _)| key).collect();
    assert!(styles.contains(&"childrens_dreamy"));
    assert!(styles.contains(&"dark_anime"));
    assert!(styles.contains(&"comic_noir"));

    let childrens = library.style("childrens_dreamy").unwrap();
    assert_eq!(childrens.kind(), &StyleKind::Childrens);
    assert!(childrens.edit_template().is_some());

    let noir = library.style("comic_noir").unwrap();
    assert_eq!(noir.kind(), &StyleKind::Narrative);
    assert!(noir.edit_template().is_none());
}

#[test]
fn bundled_templates_reference_the_expected_placeholders() {
    let library = PromptLibrary::bundled().unwrap();

    let childrens = library.stage1(StyleKind::Childrens).unwrap();
    for placeholder in ["{characters_json}", "{story_outline}", "{page_number}", "{total_pages}"] {
        assert!(
            childrens.user_template().contains(placeholder),
            "stage1 childrens template missing {placeholder}"
        );
    }

    for placeholder in ["{book_title}", "{style_description}", "{character_details_string}"] {
        assert!(
            library.cover_template().contains(placeholder),
            "cover template missing {placeholder}"
        );
    }

    for (key, style) in library.styles() {
        assert!(
            style.template().contains("{scene_description}"),
            "style {key} missing scene placeholder"
        );
        let text_placeholder = format!("{{{}}}", style.kind().text_field());
        assert!(
            style.template().contains(&text_placeholder),
            "style {key} missing {text_placeholder}"
        );
    }
}

#[test]
fn unknown_style_is_an_error() {
    let library = PromptLibrary::bundled().unwrap();
    let err = library.style("cave_painting").unwrap_err();
    assert!(format!("{}", err).contains("cave_painting"));
}

#[test]
fn invalid_toml_is_an_error() {
    let result: Result<PromptLibrary, _> = "not = [valid".parse();
    assert!(result.is_err());
}

#[test]
fn empty_style_catalog_fails_validation() {
    let toml = r#"
[stage1.childrens]
system_message = "sys"
user_template = "user {page_number}"

[cover]
template = "cover {book_title}"

[character_inference]
system_message = "sys"
user_template = "infer {story_concept}"

[styles]
"#;
    let err = toml.parse::<PromptLibrary>().unwrap_err();
    assert!(format!("{}", err).contains("catalog"));
}

#[test]
fn style_kind_without_stage1_prompt_fails_validation() {
    let toml = r#"
[stage1.childrens]
system_message = "sys"
user_template = "user {page_number}"

[cover]
template = "cover {book_title}"

[character_inference]
system_message = "sys"
user_template = "infer {story_concept}"

[styles.noir]
description = "Noir"
kind = "narrative"
template = "scene {scene_description} {script_text}"
"#;
    let err = toml.parse::<PromptLibrary>().unwrap_err();
    assert!(format!("{}", err).contains("narrative"));
}

#[test]
fn empty_template_fails_validation() {
    let toml = r#"
[stage1.childrens]
system_message = "sys"
user_template = "user {page_number}"

[cover]
template = "cover {book_title}"

[character_inference]
system_message = "sys"
user_template = "infer {story_concept}"

[styles.blank]
description = "Blank"
kind = "childrens"
template = "   "
"#;
    let err = toml.parse::<PromptLibrary>().unwrap_err();
    assert!(format!("{}", err).contains("blank"));
}
