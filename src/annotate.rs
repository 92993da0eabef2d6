use swc_common::comments::{Comment, CommentKind, Comments};
use swc_common::DUMMY_SP;

use crate::locate::SyntaxNode;
use crate::parse::ParsedFile;

/// The text every suppression comment carries. The reconciler and the undo pass search for
/// exactly this string.
pub const SENTINEL: &str = "@ts-ignore typescript-all-in";

/// The canonical spelling of a suppression comment in printed source.
pub const LINE_COMMENT: &str = "// @ts-ignore typescript-all-in";

/// The block spelling of a suppression comment, rewritten to [`LINE_COMMENT`] after printing.
pub const BLOCK_COMMENT: &str = "/* @ts-ignore typescript-all-in */";

/// Body of the line comment as swc stores it, without the leading `//`.
const COMMENT_TEXT: &str = " @ts-ignore typescript-all-in";

/// Checks whether `comment` is a suppression comment, regardless of its kind.
pub fn is_sentinel(comment: &Comment) -> bool {
    comment.text.trim() == SENTINEL
}

/// Attaches a suppression comment in front of `node`.
///
/// Does nothing when there is no node or when the node already carries a suppression comment,
/// so visiting the same node twice in a run (or in a later run) adds a single comment.
/// Returns whether a comment was added.
pub fn insert(file: &ParsedFile, node: Option<&SyntaxNode>) -> bool {
    let node = match node {
        Some(node) => node,
        None => return false,
    };

    let pos = file.pos(node.start);
    let annotated = file
        .comments
        .get_leading(pos)
        .map_or(false, |comments| comments.iter().any(is_sentinel));

    if annotated {
        return false;
    }

    // swc always ends a line comment with a line break, which keeps the comment off the
    // line of the code it guards
    file.comments.add_leading(
        pos,
        Comment {
            kind: CommentKind::Line,
            span: DUMMY_SP,
            text: COMMENT_TEXT.into(),
        },
    );
    true
}
