//! Book output persistence.
//!
//! A generated book lands in one directory per title under a configurable
//! output root: `cover.png`, `page_01.png` .. `page_NN.png`, and a
//! `book.json` manifest recording what was written, with content hashes.
//! All image writes are atomic (temp file + rename).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod book_dir;
mod manifest;
mod sanitize;

pub use book_dir::{BookDirectory, BookStorage, save_unique};
pub use manifest::{BookManifest, ManifestEntry};
pub use sanitize::sanitize_name;
