//! Built-in templates embedded at compile time.

use include_dir::{include_dir, Dir};

/// Embedded templates directory.
static TEMPLATES_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Fetch an embedded template body by file name.
pub fn get(name: &str) -> Option<&'static str> {
    TEMPLATES_DIR.get_file(name).and_then(|f| f.contents_utf8())
}

/// Names of all embedded templates.
pub fn names() -> Vec<&'static str> {
    TEMPLATES_DIR
        .files()
        .filter_map(|f| f.path().to_str())
        .collect()
}
