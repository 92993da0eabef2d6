use std::collections::VecDeque;

use crate::annotate::LINE_COMMENT;

/// Checks whether a line holds code, as opposed to being blank or a comment.
pub fn is_code_line(line: &str) -> bool {
    let line = line.trim_start();
    !(line.is_empty() || line.starts_with("//") || line.starts_with("/*"))
}

/// Finds the index of the first line holding code, or `None` if there is none.
pub fn position_of_next_non_comment_line<I>(lines: I) -> Option<usize>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    lines.into_iter().position(|line| is_code_line(line.as_ref()))
}

/// Removes suppression comments that do not directly precede the code they guard.
///
/// Lines are folded from the last to the first, so the lines following the current one are
/// already final when it is looked at. A suppression comment is kept only when the next line
/// is code. Otherwise a line consisting of just the comment is dropped, and a line holding
/// other code keeps that code with the comment stripped.
pub fn reconcile<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut kept: VecDeque<String> = VecDeque::with_capacity(lines.len());

    for line in lines.iter().rev() {
        let line = line.as_ref();
        if !line.contains(LINE_COMMENT) {
            kept.push_front(line.to_string());
            continue;
        }

        match position_of_next_non_comment_line(&kept) {
            Some(0) => kept.push_front(line.to_string()),
            _ if line.trim() == LINE_COMMENT => {}
            _ => kept.push_front(line.replace(LINE_COMMENT, "")),
        }
    }

    kept.into()
}

/// Runs [`reconcile`] over a whole file, keeping its line breaks.
pub fn reconcile_text(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    reconcile(&lines).join("\n")
}
