use anyhow::Result;
use std::path::{Path, PathBuf};

fn rust_files(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            rust_files(&path, found)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            found.push(path);
        }
    }
    Ok(())
}

#[test]
fn test_source_comments_are_english_ascii() -> Result<()> {
    let mut files = Vec::new();
    rust_files(&Path::new(env!("CARGO_MANIFEST_DIR")).join("src"), &mut files)?;
    assert!(!files.is_empty());

    let mut offending = Vec::new();
    for file in &files {
        for (number, line) in std::fs::read_to_string(file)?.lines().enumerate() {
            if let Some(comment) = line.trim_start().strip_prefix("//") {
                if !comment.is_ascii() {
                    offending.push(format!("{}:{}", file.display(), number + 1));
                }
            }
        }
    }
    assert!(offending.is_empty(), "non-ASCII comments at {:?}", offending);
    Ok(())
}
