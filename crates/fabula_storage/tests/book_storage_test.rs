//! Tests for the book output storage.

use fabula_storage::{BookManifest, BookStorage, save_unique};
use tempfile::TempDir;

#[tokio::test]
async fn cover_and_pages_land_in_sanitized_book_dir() {
    let temp_dir = TempDir::new().unwrap();
    let storage = BookStorage::new(temp_dir.path().join("output_books")).unwrap();

    let book = storage.open_book("A Test Book, featuring Two Friends").unwrap();
    assert!(book.path().ends_with("A_Test_Book_featuring_Two_Friends"));

    let cover = book.save_cover(b"cover-bytes").await.unwrap();
    assert_eq!(cover.file_name().unwrap(), "cover.png");
    assert_eq!(std::fs::read(&cover).unwrap(), b"cover-bytes");

    let page = book.save_page(3, b"page-bytes").await.unwrap();
    assert_eq!(page.file_name().unwrap(), "page_03.png");
    assert_eq!(std::fs::read(&page).unwrap(), b"page-bytes");

    // No temp files left behind by the atomic write.
    let leftovers: Vec<_> = std::fs::read_dir(book.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn page_numbers_are_zero_padded() {
    let temp_dir = TempDir::new().unwrap();
    let storage = BookStorage::new(temp_dir.path()).unwrap();
    let book = storage.open_book("Padding").unwrap();

    let page = book.save_page(12, b"x").await.unwrap();
    assert_eq!(page.file_name().unwrap(), "page_12.png");
}

#[tokio::test]
async fn reopening_a_book_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let storage = BookStorage::new(temp_dir.path()).unwrap();

    let first = storage.open_book("Same Title").unwrap();
    first.save_cover(b"one").await.unwrap();

    let second = storage.open_book("Same Title").unwrap();
    assert_eq!(first.path(), second.path());
    // Re-saving overwrites rather than erroring.
    second.save_cover(b"two").await.unwrap();
    assert_eq!(
        std::fs::read(second.path().join("cover.png")).unwrap(),
        b"two"
    );
}

#[tokio::test]
async fn save_unique_suffixes_on_collision() {
    let temp_dir = TempDir::new().unwrap();

    let first = save_unique(temp_dir.path(), "A harbor at dawn", "png", b"one")
        .await
        .unwrap();
    let second = save_unique(temp_dir.path(), "A harbor at dawn", "png", b"two")
        .await
        .unwrap();

    assert_eq!(first.file_name().unwrap(), "A_harbor_at_dawn.png");
    assert_eq!(second.file_name().unwrap(), "A_harbor_at_dawn_1.png");
    assert_eq!(std::fs::read(&second).unwrap(), b"two");
}

#[tokio::test]
async fn manifest_round_trips_through_book_json() {
    let temp_dir = TempDir::new().unwrap();
    let storage = BookStorage::new(temp_dir.path()).unwrap();
    let book = storage.open_book("Manifested").unwrap();

    let mut manifest = BookManifest::new("Manifested", "childrens_dreamy", true);
    manifest.record("cover.png", b"cover-bytes");
    manifest.record("page_01.png", b"page-bytes");

    let path = book.write_manifest(&manifest).await.unwrap();
    let loaded: BookManifest =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();

    assert_eq!(loaded, manifest);
    assert_eq!(loaded.entries.len(), 2);
    assert!(loaded.consistency);
}
