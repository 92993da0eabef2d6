use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::annotate::SENTINEL;
use crate::config::is_ignored;
use crate::error::{Error, Result};

/// Matches a suppression comment in either spelling.
static SUPPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(//[ \t]*{sentinel}|/\*\s*{sentinel}\s*\*/)",
        sentinel = regex::escape(SENTINEL)
    ))
    .expect("suppression pattern is valid")
});

/// Removes every suppression comment from `source`.
///
/// Lines that held nothing but suppression comments are removed entirely; other lines keep
/// their code.
pub fn remove_suppressions(source: &str) -> String {
    source
        .split('\n')
        .filter_map(|line| {
            if !SUPPRESSION.is_match(line) {
                return Some(line.to_string());
            }

            let stripped = SUPPRESSION.replace_all(line, "");
            if stripped.trim().is_empty() {
                None
            } else {
                Some(stripped.trim_end().to_string())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Recursively finds `.ts` and `.tsx` files under `root`, skipping ignored paths.
pub fn find_typescript_files(root: &Path, ignore: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry.path(), ignore));

    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file()
            && matches!(path.extension().and_then(|ext| ext.to_str()), Some("ts") | Some("tsx"))
        {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Strips suppression comments from every TypeScript file under `root`.
///
/// Returns the files that changed; files without suppression comments are not rewritten.
pub fn undo_ignore_comments(root: &Path, ignore: &[String]) -> Result<Vec<PathBuf>> {
    let files = find_typescript_files(root, ignore)?;
    info!("Removing comments in {} files", files.len());

    let mut changed = Vec::new();
    for path in files {
        let source = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let cleaned = remove_suppressions(&source);
        if cleaned == source {
            continue;
        }

        fs::write(&path, cleaned).map_err(|e| Error::io(&path, e))?;
        debug!("Removed comments from {}", path.display());
        changed.push(path);
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::annotate::{BLOCK_COMMENT, LINE_COMMENT};

    #[test]
    fn removes_all_comments() {
        let source = "
}).pipe(
tap(requestResponse => {
    if (
    // @ts-ignore typescript-all-in
    requestResponse.code >= 300
    ) {
    throw new Error(getErrorMessage(requestResponse));
    }
})
        ";
        let cleaned = remove_suppressions(source);

        assert!(!cleaned.contains(SENTINEL));
        assert_eq!(cleaned.lines().count(), source.lines().count() - 1);
    }

    #[test]
    fn keeps_code_sharing_a_line() {
        assert_eq!(
            remove_suppressions(&format!("return 3 * {}\n    str;", LINE_COMMENT)),
            "return 3 *\n    str;"
        );
        assert_eq!(
            remove_suppressions(&format!("const a = {} 1;", BLOCK_COMMENT)),
            "const a =  1;"
        );
    }

    #[test]
    fn keeps_other_ignore_comments() {
        let source = "// @ts-ignore\nconst a: number = \"b\";\n";
        assert_eq!(remove_suppressions(source), source);
    }

    #[test]
    fn rewrites_only_annotated_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.ts"), format!("{}\nconst a: number = \"a\";\n", LINE_COMMENT)).unwrap();
        fs::write(root.join("b.ts"), "const b = 1;\n").unwrap();
        fs::write(root.join("c.js"), format!("{}\nconst c = 1;\n", LINE_COMMENT)).unwrap();

        let changed = undo_ignore_comments(root, &[]).unwrap();

        assert_eq!(changed, vec![root.join("a.ts")]);
        assert_eq!(
            fs::read_to_string(root.join("a.ts")).unwrap(),
            "const a: number = \"a\";\n"
        );
        assert!(fs::read_to_string(root.join("c.js")).unwrap().contains(SENTINEL));
    }
}
