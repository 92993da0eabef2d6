use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while migrating a project.
#[derive(Debug, Error)]
pub enum Error {
    /// No `tsconfig.json` was found in the project root or any of its parents.
    #[error("could not find a valid 'tsconfig.json' in {} or any parent directory", .0.display())]
    ConfigNotFound(PathBuf),

    /// The project configuration exists but is not valid JSON, even allowing comments and
    /// trailing commas.
    #[error("could not parse config {}: {source}", path.display())]
    ConfigParse {
        /// Path of the configuration file.
        path: PathBuf,

        /// The underlying JSON5 error.
        source: json5::Error,
    },

    /// The external type checker could not be started.
    #[error("failed to run type checker `{program}`: {source}")]
    TypeChecker {
        /// The program that was invoked.
        program: String,

        /// The underlying spawn error.
        source: io::Error,
    },

    /// A source file could not be parsed.
    #[error("failed to parse {}:{line}:{column}: {message}", path.display())]
    Parse {
        /// The file being parsed.
        path: PathBuf,

        /// 1-based line of the error.
        line: usize,

        /// 0-based column of the error.
        column: usize,

        /// Description of the syntax error.
        message: String,
    },

    /// The annotated tree could not be printed back to source.
    #[error("failed to print {}: {source}", path.display())]
    Print {
        /// The file being printed.
        path: PathBuf,

        /// The underlying writer error.
        source: io::Error,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// Walking a directory tree failed.
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// Builds an [`Error::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors that abort the whole run before any file is touched.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound(_) | Error::ConfigParse { .. } | Error::TypeChecker { .. }
        )
    }
}

/// Errors produced by a [`crate::print::Reformatter`]. These are never fatal.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The formatter program could not be started or talked to.
    #[error("could not run formatter `{program}`: {source}")]
    Spawn {
        /// The formatter program.
        program: String,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// The formatter exited unsuccessfully.
    #[error("formatter `{program}` exited with {status}: {stderr}")]
    Failed {
        /// The formatter program.
        program: String,

        /// Exit status of the program.
        status: std::process::ExitStatus,

        /// Whatever the program wrote to stderr.
        stderr: String,
    },

    /// The formatter produced output that is not UTF-8.
    #[error("formatter `{program}` produced invalid UTF-8")]
    InvalidOutput {
        /// The formatter program.
        program: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
