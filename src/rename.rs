use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::config::is_ignored;
use crate::error::{Error, Result};

/// Import spellings that mark a file as using React, which makes it a `.tsx` file.
const REACT_IMPORTS: [&str; 4] = [
    "from \"react\"",
    "require(\"react\")",
    "from 'react'",
    "require('react')",
];

/// Checks whether `source` imports React.
pub fn is_react_file(source: &str) -> bool {
    REACT_IMPORTS.iter().any(|import| source.contains(import))
}

/// The TypeScript name for a JavaScript file: `.tsx` for React files and `.jsx` files,
/// `.ts` for everything else.
pub fn typescript_path(path: &Path, react: bool) -> PathBuf {
    let jsx = path.extension().map_or(false, |ext| ext == "jsx");
    path.with_extension(if react || jsx { "tsx" } else { "ts" })
}

/// Recursively finds `.js` and `.jsx` files under `root`, skipping ignored paths.
///
/// The list is sorted so renames happen in a stable order.
pub fn find_javascript_files(root: &Path, ignore: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry.path(), ignore));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if matches!(path.extension().and_then(|ext| ext.to_str()), Some("js") | Some("jsx")) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Renames one JavaScript file to TypeScript and returns its new path.
pub fn move_file_to_typescript(path: &Path) -> Result<PathBuf> {
    info!("Converting {}", path.display());

    let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let new_path = typescript_path(path, is_react_file(&source));
    fs::rename(path, &new_path).map_err(|e| Error::io(path, e))?;

    info!("Done converting to {}", new_path.display());
    Ok(new_path)
}

/// Renames every JavaScript file under `root` to TypeScript.
pub fn move_to_typescript(root: &Path, ignore: &[String]) -> Result<Vec<PathBuf>> {
    let files = find_javascript_files(root, ignore)?;
    debug!("Found {} JavaScript files in {}", files.len(), root.display());

    files.iter().map(|path| move_file_to_typescript(path)).collect()
}
