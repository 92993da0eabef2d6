#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// Attaches `// @ts-ignore typescript-all-in` comments to syntax nodes.
pub mod annotate;

/// Finds and loads the project's `tsconfig.json`.
pub mod config;

/// Runs the type checker and turns its output into per-file diagnostics with byte offsets.
pub mod diagnostic;

/// Error types shared by the whole crate.
pub mod error;

/// Drives a whole migration: collect diagnostics, annotate each file, write it back.
pub mod fix;

/// Builds a flat, position-indexed view of a module and maps error offsets to the nodes that
/// should carry a suppression comment.
pub mod locate;

/// Parses TypeScript and TSX sources with [`swc_ecma_parser`], keeping their comments.
pub mod parse;

/// Prints annotated modules back to source and optionally reformats them.
pub mod print;

/// Removes suppression comments that ended up stacked or detached from the code they guard.
pub mod reconcile;

/// Renames JavaScript files to TypeScript.
pub mod rename;

/// Private crate for testing utilities.
#[cfg(test)]
pub(crate) mod testing;

/// Strips suppression comments from a project again.
pub mod undo;

pub use error::{Error, Result};
