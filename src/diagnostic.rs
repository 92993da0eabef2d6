use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ProjectConfig;
use crate::error::{Error, Result};

/// `src/index.ts(3,7): error TS2322: Type 'string' is not assignable to type 'number'.`
static LOCATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<file>.+?)\((?P<line>\d+),(?P<column>\d+)\): (?:error|warning|message) TS(?P<code>\d+): (?P<message>.*)$")
        .expect("located diagnostic pattern is valid")
});

/// `error TS5023: Unknown compiler option 'foo'.`
static GLOBAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:error|warning|message) TS(?P<code>\d+): (?P<message>.*)$")
        .expect("global diagnostic pattern is valid")
});

/// A problem reported by the type checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The file the problem is in. Project-wide problems have none.
    pub file: Option<PathBuf>,

    /// Byte offset of the problem in the file's text.
    pub offset: Option<usize>,

    /// The checker's error code (`2322` for `TS2322`).
    pub code: Option<u32>,

    /// The message, with continuation lines joined by line breaks.
    pub message: String,
}

/// Something that type checks a project and reports its diagnostics.
pub trait TypeChecker {
    /// Checks the project described by `config`.
    ///
    /// An error means the checker could not run at all, which aborts the migration.
    fn check(&self, config: &ProjectConfig) -> Result<Vec<Diagnostic>>;
}

/// Runs the TypeScript compiler, `tsc --noEmit --pretty false -p <tsconfig>`.
#[derive(Debug, Clone)]
pub struct Tsc {
    program: String,
}

impl Tsc {
    /// Uses `program` as the compiler executable.
    pub fn new(program: impl Into<String>) -> Self {
        Tsc {
            program: program.into(),
        }
    }
}

impl Default for Tsc {
    fn default() -> Self {
        Tsc::new("tsc")
    }
}

impl TypeChecker for Tsc {
    fn check(&self, config: &ProjectConfig) -> Result<Vec<Diagnostic>> {
        debug!("Running {} -p {}", self.program, config.path.display());
        let output = Command::new(&self.program)
            .args(["--noEmit", "--pretty", "false", "-p"])
            .arg(&config.path)
            .current_dir(config.dir())
            .output()
            .map_err(|source| Error::TypeChecker {
                program: self.program.clone(),
                source,
            })?;

        let reports = parse_tsc_output(&String::from_utf8_lossy(&output.stdout));
        if reports.is_empty() && !output.status.success() {
            warn!(
                "{} exited with {} without reporting diagnostics: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(resolve_offsets(config.dir(), reports))
    }
}

/// A diagnostic as printed by `tsc`, before its position is turned into an offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The file as printed, usually relative to the project directory.
    pub file: Option<String>,

    /// 1-based line.
    pub line: usize,

    /// 1-based column, counted in UTF-16 code units.
    pub column: usize,

    /// The `TSnnnn` code.
    pub code: u32,

    /// The message.
    pub message: String,
}

/// Parses the non-pretty output of `tsc`.
///
/// Indented lines continue the message of the diagnostic before them; anything else that is
/// not a diagnostic is skipped.
pub fn parse_tsc_output(output: &str) -> Vec<Report> {
    let mut reports: Vec<Report> = Vec::new();

    for line in output.lines() {
        if let Some(caps) = LOCATED.captures(line) {
            reports.push(Report {
                file: Some(caps["file"].to_string()),
                line: caps["line"].parse().unwrap_or(1),
                column: caps["column"].parse().unwrap_or(1),
                code: caps["code"].parse().unwrap_or_default(),
                message: caps["message"].to_string(),
            });
        } else if let Some(caps) = GLOBAL.captures(line) {
            reports.push(Report {
                file: None,
                line: 0,
                column: 0,
                code: caps["code"].parse().unwrap_or_default(),
                message: caps["message"].to_string(),
            });
        } else if line.starts_with(char::is_whitespace) && !line.trim().is_empty() {
            if let Some(last) = reports.last_mut() {
                last.message.push('\n');
                last.message.push_str(line.trim());
            }
        }
    }

    reports
}

/// Turns printed positions into byte offsets by reading each reported file once.
///
/// Relative paths are resolved against `base`. A file that cannot be read keeps its
/// diagnostics, without offsets.
pub fn resolve_offsets(base: &Path, reports: Vec<Report>) -> Vec<Diagnostic> {
    let mut texts: HashMap<PathBuf, Option<String>> = HashMap::new();

    reports
        .into_iter()
        .map(|report| {
            let file = report.file.as_deref().map(|file| {
                let joined = base.join(file);
                fs::canonicalize(&joined).unwrap_or(joined)
            });

            let offset = file.as_ref().and_then(|file| {
                let text = texts
                    .entry(file.clone())
                    .or_insert_with(|| fs::read_to_string(file).ok());
                text.as_deref()
                    .and_then(|text| line_column_to_offset(text, report.line, report.column))
            });

            Diagnostic {
                file,
                offset,
                code: Some(report.code),
                message: report.message,
            }
        })
        .collect()
}

/// Converts a 1-based line and 1-based UTF-16 column into a byte offset into `text`.
///
/// Columns past the end of a line are clamped to the end of that line. Returns `None` when
/// the line does not exist.
pub fn line_column_to_offset(text: &str, line: usize, column: usize) -> Option<usize> {
    let line_start = match line {
        0 => return None,
        1 => 0,
        _ => text.match_indices('\n').nth(line - 2)?.0 + 1,
    };

    let target = column.saturating_sub(1);
    let mut units = 0;
    for (idx, ch) in text[line_start..].char_indices() {
        if units >= target || ch == '\n' {
            return Some(line_start + idx);
        }
        units += ch.len_utf16();
    }

    Some(text.len())
}

/// Groups diagnostics by file. Diagnostics without a file are logged and dropped.
pub fn group_by_file(diagnostics: Vec<Diagnostic>) -> BTreeMap<PathBuf, Vec<Diagnostic>> {
    let mut by_file: BTreeMap<PathBuf, Vec<Diagnostic>> = BTreeMap::new();

    for diagnostic in diagnostics {
        match &diagnostic.file {
            Some(file) => by_file.entry(file.clone()).or_default().push(diagnostic),
            None => debug!("Ignoring error without file: \"{}\"", diagnostic.message),
        }
    }

    by_file
}
