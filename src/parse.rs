use std::path::{Path, PathBuf};

use log::debug;
use swc_common::comments::SingleThreadedComments;
use swc_common::sync::Lrc;
use swc_common::{BytePos, FileName, SourceFile, SourceMap, Span, Spanned};
use swc_ecma_ast::Module;
use swc_ecma_parser::lexer::Lexer;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsConfig};

use crate::error::{Error, Result};

/// A parsed source file together with everything needed to annotate and print it again.
///
/// The module and its comments are owned by a single per-file pass; nothing here is shared
/// between files.
pub struct ParsedFile {
    /// The file the source came from. Diagnostics and write-back use this path.
    pub path: PathBuf,

    /// The parsed module.
    pub module: Module,

    /// All comments of the file, keyed by the position of the token they precede or follow.
    pub comments: SingleThreadedComments,

    pub(crate) cm: Lrc<SourceMap>,
    fm: Lrc<SourceFile>,
}

impl ParsedFile {
    /// Parses `source` as TypeScript, enabling JSX for `.tsx` and `.jsx` files.
    ///
    /// Recoverable syntax errors are logged and ignored; a fatal one is returned as
    /// [`Error::Parse`].
    pub fn parse(path: &Path, source: String) -> Result<ParsedFile> {
        let cm = Lrc::<SourceMap>::default();
        let fm = cm.new_source_file(FileName::Real(path.to_path_buf()), source);
        let comments = SingleThreadedComments::default();

        let lexer = Lexer::new(
            syntax_for(path),
            // EsVersion defaults to es5, the syntax decides what gets parsed
            Default::default(),
            StringInput::from(&*fm),
            Some(&comments),
        );

        let mut parser = Parser::new_from(lexer);
        let module = parser.parse_module();

        for e in parser.take_errors() {
            debug!("Recovered from syntax error in {}: {:?}", path.display(), e.kind());
        }

        let module = module.map_err(|e| {
            let loc = cm.lookup_char_pos(e.span().lo);
            Error::Parse {
                path: path.to_path_buf(),
                line: loc.line,
                column: loc.col.0,
                message: format!("{:?}", e.kind()),
            }
        })?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            module,
            comments,
            cm,
            fm,
        })
    }

    /// The original source text.
    pub fn source(&self) -> &str {
        &self.fm.src
    }

    /// Converts a byte offset into the file into an absolute source map position.
    pub fn pos(&self, offset: u32) -> BytePos {
        BytePos(self.fm.start_pos.0 + offset)
    }

    /// Converts a span into `(start, end)` byte offsets relative to the start of the file.
    ///
    /// Returns `None` for synthesized spans and spans outside this file.
    pub fn offsets(&self, span: Span) -> Option<(u32, u32)> {
        if span.is_dummy() || span.lo < self.fm.start_pos || span.hi > self.fm.end_pos {
            return None;
        }

        Some((span.lo.0 - self.fm.start_pos.0, span.hi.0 - self.fm.start_pos.0))
    }
}

/// Picks the parser configuration for a file based on its extension.
pub fn syntax_for(path: &Path) -> Syntax {
    let tsx = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("tsx") | Some("jsx")
    );

    Syntax::Typescript(TsConfig {
        tsx,
        decorators: true,
        ..Default::default()
    })
}
