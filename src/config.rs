use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// The name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "tsconfig.json";

/// The parts of a `tsconfig.json` the migration looks at.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Where the configuration was loaded from.
    #[serde(skip)]
    pub path: PathBuf,

    /// The configuration this one extends, if any.
    #[serde(default)]
    pub extends: Option<Value>,

    /// Files listed explicitly.
    #[serde(default)]
    pub files: Vec<String>,

    /// Glob patterns of files to include.
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns of files to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Compiler options, passed through to the type checker untouched.
    #[serde(default)]
    pub compiler_options: Map<String, Value>,
}

impl ProjectConfig {
    /// Finds the nearest `tsconfig.json` in `root` or any of its parents and loads it.
    pub fn discover(root: &Path) -> Result<ProjectConfig> {
        let path = find_config(root)?;
        ProjectConfig::load(&path)
    }

    /// Loads the configuration at `path`. Comments and trailing commas are allowed, as `tsc`
    /// allows them.
    pub fn load(path: &Path) -> Result<ProjectConfig> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config: ProjectConfig =
            json5::from_str(&text).map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        config.path = path.to_path_buf();
        debug!("Loaded {}", path.display());
        Ok(config)
    }

    /// The directory holding the configuration file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Walks upward from `root` looking for a `tsconfig.json`.
pub fn find_config(root: &Path) -> Result<PathBuf> {
    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let found = root
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file());

    found.ok_or(Error::ConfigNotFound(root))
}

/// Checks whether `path` contains any of the `ignore` substrings.
pub fn is_ignored(path: &Path, ignore: &[String]) -> bool {
    let path = path.to_string_lossy();
    ignore
        .iter()
        .any(|pattern| !pattern.is_empty() && path.contains(pattern.as_str()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn accepts_comments_and_trailing_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "{\n  /* strict */\n  \"compilerOptions\": {\"strict\": true,},\n  \"include\": [\"src\",], // sources\n}\n",
        )
        .unwrap();

        let config = ProjectConfig::load(&path).expect("config");

        assert_eq!(config.include, vec!["src".to_string()]);
        assert_eq!(config.compiler_options["strict"], Value::Bool(true));
    }

    #[test]
    fn keeps_comment_markers_in_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "include": ["src/**/*.ts", "http://example.com/*"] }"#).unwrap();

        let config = ProjectConfig::load(&path).expect("config");

        assert_eq!(config.include, vec!["src/**/*.ts", "http://example.com/*"]);
    }

    #[test]
    fn discovers_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "{\n  // comments are fine\n  \"compilerOptions\": { \"strict\": true },\n  \"exclude\": [\"node_modules\"]\n}\n",
        )
        .unwrap();

        let config = ProjectConfig::discover(&nested).expect("config");

        assert_eq!(config.exclude, vec!["node_modules".to_string()]);
        assert_eq!(config.compiler_options["strict"], Value::Bool(true));
        assert_eq!(
            fs::canonicalize(config.dir()).unwrap(),
            fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn missing_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // tempdirs normally live outside any project, but guard against a stray tsconfig above
        if find_config(dir.path()).is_ok() {
            return;
        }

        let err = ProjectConfig::discover(dir.path()).expect_err("no config");
        assert!(matches!(err, Error::ConfigNotFound(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn unparsable_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ \"compilerOptions\": ").unwrap();

        let err = ProjectConfig::discover(dir.path()).expect_err("broken config");
        assert!(matches!(err, Error::ConfigParse { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn ignore_filter() {
        let ignore = vec!["node_modules".to_string(), "/generated/".to_string()];

        assert!(is_ignored(Path::new("/app/node_modules/react/index.ts"), &ignore));
        assert!(is_ignored(Path::new("/app/src/generated/api.ts"), &ignore));
        assert!(!is_ignored(Path::new("/app/src/index.ts"), &ignore));
        assert!(!is_ignored(Path::new("/app/src/index.ts"), &[String::new()]));
    }
}
