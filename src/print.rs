use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use swc_ecma_codegen::text_writer::JsWriter;
use swc_ecma_codegen::{Config, Emitter};

use crate::annotate::{LINE_COMMENT, SENTINEL};
use crate::error::{Error, FormatError, Result};
use crate::parse::ParsedFile;

/// Matches the block spelling of a suppression comment plus the blanks (and line break) after it.
///
/// The inserter only writes line comments; block spellings come from reformatters or hand edits.
static BLOCK_SENTINEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"/\*\s*{}\s*\*/[ \t]*(\r?\n)?",
        regex::escape(SENTINEL)
    ))
    .expect("sentinel pattern is valid")
});

/// Prints an annotated file back to source text.
///
/// Printing hands the file's comments to the code generator, so the file is consumed. The
/// output is the same for the same tree and comments.
pub fn print(file: ParsedFile) -> Result<String> {
    let mut buf = Vec::new();

    {
        let mut emitter = Emitter {
            cfg: Config::default(),
            cm: file.cm.clone(),
            comments: Some(&file.comments),
            wr: JsWriter::new(file.cm.clone(), "\n", &mut buf, None),
        };

        emitter
            .emit_module(&file.module)
            .map_err(|source| Error::Print {
                path: file.path.clone(),
                source,
            })?;
    }

    let text = String::from_utf8(buf).map_err(|e| Error::Print {
        path: file.path.clone(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })?;

    Ok(normalize_sentinels(&text))
}

/// Rewrites every block-spelled suppression comment into the line spelling on its own line.
pub fn normalize_sentinels(text: &str) -> String {
    BLOCK_SENTINEL
        .replace_all(text, format!("{}\n", LINE_COMMENT).as_str())
        .into_owned()
}

/// Runs `formatter` over `text`, falling back to `text` itself if formatting fails.
pub fn reformat(path: &Path, text: String, formatter: &dyn Reformatter) -> String {
    match formatter.reformat(path, &text) {
        Ok(formatted) => formatted,
        Err(e) => {
            warn!("Could not reformat {}: {}", path.display(), e);
            text
        }
    }
}

/// A best-effort source formatter applied to printed files.
///
/// Implementations must not keep state between calls.
pub trait Reformatter {
    /// Formats `source`, which will be written to `path`.
    fn reformat(&self, path: &Path, source: &str) -> Result<String, FormatError>;
}

/// Leaves the printed text alone. This is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFormatter;

impl Reformatter for NoopFormatter {
    fn reformat(&self, _path: &Path, source: &str) -> Result<String, FormatError> {
        Ok(source.to_string())
    }
}

/// Pipes the printed text through an external program, for example
/// `prettier --stdin-filepath <path>`.
///
/// The file path is passed as the last argument; the source is written to the program's
/// stdin and the formatted source read from its stdout.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    /// Creates a formatter running `program` with `args` followed by the file path.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandFormatter {
            program: program.into(),
            args,
        }
    }

    /// A formatter for `prettier`.
    pub fn prettier() -> Self {
        CommandFormatter::new("prettier", vec!["--stdin-filepath".to_string()])
    }

    fn spawn_error(&self, source: io::Error) -> FormatError {
        FormatError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl Reformatter for CommandFormatter {
    fn reformat(&self, path: &Path, source: &str) -> Result<String, FormatError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.spawn_error(io::ErrorKind::BrokenPipe.into()))?;
        let input = source.to_string();
        let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output().map_err(|e| self.spawn_error(e))?;
        match writer.join() {
            Ok(written) => written.map_err(|e| self.spawn_error(e))?,
            Err(_) => return Err(self.spawn_error(io::ErrorKind::BrokenPipe.into())),
        }

        if !output.status.success() {
            return Err(FormatError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| FormatError::InvalidOutput {
            program: self.program.clone(),
        })
    }
}
