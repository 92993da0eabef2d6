use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::annotate::{insert, SENTINEL};
use crate::config::{is_ignored, ProjectConfig};
use crate::diagnostic::{group_by_file, Diagnostic, TypeChecker};
use crate::error::{Error, Result};
use crate::locate::SyntaxTree;
use crate::parse::ParsedFile;
use crate::print::{print, reformat, Reformatter};
use crate::reconcile::reconcile_text;

/// Options for a [`run`].
#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    /// Files whose path contains any of these substrings are left alone.
    pub ignore: Vec<String>,
}

/// What a [`run`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Files that were rewritten.
    pub files_written: usize,

    /// Suppression comments added across all files.
    pub annotations: usize,

    /// Files with diagnostics that could not be read, parsed or printed.
    pub files_skipped: usize,
}

/// The outcome of annotating a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFix {
    /// Number of suppression comments added.
    pub annotations: usize,

    /// The new text of the file, or `None` when nothing was added and the file must stay as is.
    pub text: Option<String>,
}

/// Annotates `source` so that the diagnostics at `offsets` are suppressed.
///
/// Offsets without a matching syntax node are skipped.
pub fn fix_source(
    path: &Path,
    source: String,
    offsets: &[usize],
    formatter: &dyn Reformatter,
) -> Result<FileFix> {
    let file = ParsedFile::parse(path, source)?;
    debug!("Parsed {}", path.display());

    let tree = SyntaxTree::build(&file);
    let mut annotations = 0;
    for &offset in offsets {
        let node = u32::try_from(offset)
            .ok()
            .and_then(|offset| tree.locate(offset))
            .map(|id| &tree[tree.resolve(id)]);

        if node.is_none() {
            debug!("No node at offset {} in {}", offset, path.display());
        }

        if insert(&file, node) {
            annotations += 1;
        }
    }

    debug!("Adding {} comments to {}", annotations, path.display());
    if annotations == 0 {
        return Ok(FileFix {
            annotations,
            text: None,
        });
    }

    let existing = file.source().matches(SENTINEL).count();
    let printed = print(file)?;
    let printed_annotations = printed.matches(SENTINEL).count().saturating_sub(existing);
    if printed_annotations < annotations {
        warn!(
            "Only {} of {} comments could be printed in {}",
            printed_annotations,
            annotations,
            path.display()
        );
    }

    let annotations = printed_annotations.min(annotations);
    if annotations == 0 {
        return Ok(FileFix {
            annotations,
            text: None,
        });
    }

    let formatted = reformat(path, printed, formatter);

    Ok(FileFix {
        annotations,
        text: Some(reconcile_text(&formatted)),
    })
}

/// Reads and annotates the file at `path`.
///
/// Returns `Ok(None)` when the file could not be read, parsed or printed; the failure is logged
/// and the file must be left untouched.
pub fn fix_file(
    path: &Path,
    diagnostics: &[Diagnostic],
    formatter: &dyn Reformatter,
) -> Result<Option<FileFix>> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            warn!("{}", Error::io(path, e));
            return Ok(None);
        }
    };

    let offsets: Vec<usize> = diagnostics
        .iter()
        .filter_map(|diagnostic| {
            if diagnostic.offset.is_none() {
                debug!(
                    "Ignoring error without position in {}: \"{}\"",
                    path.display(),
                    diagnostic.message
                );
            }
            diagnostic.offset
        })
        .collect();

    match fix_source(path, source, &offsets, formatter) {
        Ok(fix) => Ok(Some(fix)),
        Err(e @ (Error::Parse { .. } | Error::Print { .. })) => {
            warn!("Skipping {}: {}", path.display(), e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Suppresses every type error in the project rooted at `project_root`.
///
/// Configuration and type checker failures abort before any file is written. Files that fail
/// on their own are skipped; write failures are returned.
pub fn run(
    project_root: &Path,
    options: &FixOptions,
    checker: &dyn TypeChecker,
    formatter: &dyn Reformatter,
) -> Result<RunReport> {
    let config = ProjectConfig::discover(project_root)?;
    info!("Ignoring Typescript errors using {}", config.path.display());

    let diagnostics = checker.check(&config)?;
    info!("Found {} errors", diagnostics.len());

    let mut report = RunReport::default();
    for (path, diagnostics) in group_by_file(diagnostics) {
        if is_ignored(&path, &options.ignore) {
            debug!("Ignoring {}", path.display());
            continue;
        }

        let fix = match fix_file(&path, &diagnostics, formatter)? {
            Some(fix) => fix,
            None => {
                report.files_skipped += 1;
                continue;
            }
        };

        if let Some(text) = fix.text {
            debug!("Writing {}", path.display());
            fs::write(&path, text).map_err(|e| Error::io(&path, e))?;
            report.files_written += 1;
            report.annotations += fix.annotations;
        }
    }

    info!(
        "Added {} comments to {} files",
        report.annotations, report.files_written
    );
    Ok(report)
}
