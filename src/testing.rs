use std::path::Path;

use super::parse::ParsedFile;

pub(crate) fn parse_helper(contents: &str) -> ParsedFile {
    parse_file_helper("test.ts", contents)
}

pub(crate) fn parse_file_helper(name: &str, contents: &str) -> ParsedFile {
    ParsedFile::parse(Path::new(name), contents.to_string()).expect("error parsing")
}

/// Byte offset of the first occurrence of `needle` in `source`.
pub(crate) fn offset_of(source: &str, needle: &str) -> u32 {
    let offset = source
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in {:?}", needle, source));
    offset as u32
}
