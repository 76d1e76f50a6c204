//! Error types for loading, resolving and exporting .bvh data.
//!
//! Line numbers carried by parse errors are 0-based indices into the input lines.

use std::path::PathBuf;
use thiserror::Error;

/// Grammar violation: missing brace, unexpected token, unknown channel name.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("syntax error at line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

/// Wrong token count or unparseable number on a numeric line.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("format error at line {line}: {message}")]
pub struct FormatError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructuralError {
    #[error("missing {0} section")]
    MissingSection(&'static str),
    #[error("expected ROOT joint at line {line}")]
    MissingRoot { line: usize },
    #[error("unexpected end of input while parsing {context}")]
    UnexpectedEof { context: String },
    #[error("header declares {declared} frames but {found} frame lines are present")]
    FrameCountMismatch { declared: usize, found: usize },
    #[error("joint at line {line} is nested deeper than {limit} levels")]
    TooDeep { line: usize, limit: usize },
}

/// A frame whose length does not match the skeleton's channel count.
///
/// `joint` names the joint whose channels ran past the end of the frame. It is
/// `None` when the frame is too long (values left over after the last joint).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("malformed frame{}: {}", fmt_frame_index(.frame_index), fmt_overrun(.joint, .expected, .found))]
pub struct MalformedFrameError {
    pub frame_index: Option<usize>,
    pub joint: Option<String>,
    pub expected: usize,
    pub found: usize,
}

fn fmt_frame_index(frame_index: &Option<usize>) -> String {
    match frame_index {
        Some(index) => format!(" {}", index),
        None => String::new(),
    }
}

fn fmt_overrun(joint: &Option<String>, expected: &usize, found: &usize) -> String {
    match joint {
        Some(name) => format!(
            "joint '{}' needs channel values past the end ({} of {} expected values present)",
            name, found, expected
        ),
        None => format!("{} values present but the skeleton has {} channels", found, expected),
    }
}

impl MalformedFrameError {
    pub(crate) fn at_frame(mut self, index: usize) -> Self {
        self.frame_index = Some(index);
        self
    }
}

/// Export attempted on something that cannot be written as a .bvh hierarchy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidStateError {
    #[error("no skeleton loaded, nothing to export")]
    NoSkeleton,
    #[error("skeleton root is an End Site, a .bvh hierarchy needs a ROOT joint")]
    EndSiteRoot,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
    #[error(transparent)]
    MalformedFrame(#[from] MalformedFrameError),
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
