//! MOTION section: `Frames:` and `Frame Time:` headers followed by one line of numbers per frame.

use crate::config::{FrameCountPolicy, LoadOptions};
use crate::error::{FormatError, LoadError, StructuralError, SyntaxError};
use crate::parse::__skip_blank;
use crate::types::{Frame, Motion};
use rayon::prelude::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static RE_FRAMES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Frames:\s*(.*)$").expect("static regex"));
static RE_FRAME_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Frame\s+Time:\s*(.*)$").expect("static regex"));

/// Value of the header `re` expects at `lines[i]`. `first_line` maps `i` back to the file's line index.
fn __header<'a>(
    lines: &[&'a str],
    i: usize,
    first_line: usize,
    re: &Regex,
    name: &str,
) -> Result<&'a str, LoadError> {
    let line = lines
        .get(i)
        .map(|line| line.trim())
        .ok_or_else(|| StructuralError::UnexpectedEof {
            context: format!("'{}' header", name),
        })?;
    let value = re
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
        .ok_or_else(|| SyntaxError {
            line: first_line + i,
            message: format!("expected '{}' header, found '{}'", name, line),
        })?;
    Ok(value)
}

fn __parse_frame(line_index: usize, line: &str) -> Result<Frame, FormatError> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| FormatError {
                line: line_index,
                message: format!("motion value '{}' is not a number", token),
            })
        })
        .collect::<Result<Vec<f64>, _>>()
        .map(Frame::new)
}

/// Tokenize frame lines, each tagged with its line index in the file.
///
/// With `parallel` the lines are spread over the rayon pool. Results are collected by index, so
/// `frames[i]` always comes from `lines[i]`. On failure the error of the earliest bad line is
/// returned, whichever worker finished first.
pub fn tokenize_frames(lines: &[(usize, &str)], parallel: bool) -> Result<Vec<Frame>, FormatError> {
    let results: Vec<Result<Frame, FormatError>> = if parallel {
        lines
            .par_iter()
            .map(|&(line_index, line)| __parse_frame(line_index, line))
            .collect()
    } else {
        lines
            .iter()
            .map(|&(line_index, line)| __parse_frame(line_index, line))
            .collect()
    };
    results.into_iter().collect()
}

/// Parse the lines following the MOTION keyword. `first_line` is the file line index of `lines[0]`.
pub fn parse_motion(
    lines: &[&str],
    first_line: usize,
    options: &LoadOptions,
) -> Result<Motion, LoadError> {
    //// Frames: N
    let i = __skip_blank(lines, 0);
    let declared = __header(lines, i, first_line, &RE_FRAMES, "Frames:")?;
    let declared_frames: usize = declared.parse().map_err(|_| FormatError {
        line: first_line + i,
        message: format!("frame count '{}' is not an unsigned integer", declared),
    })?;

    //// Frame Time: T
    let i = __skip_blank(lines, i + 1);
    let frame_time = __header(lines, i, first_line, &RE_FRAME_TIME, "Frame Time:")?;
    let frame_time: f64 = frame_time.parse().map_err(|_| FormatError {
        line: first_line + i,
        message: format!("frame time '{}' is not a number", frame_time),
    })?;

    //// one frame per remaining non-blank line
    let frame_lines: Vec<(usize, &str)> = lines
        .iter()
        .enumerate()
        .skip(i + 1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(j, line)| (first_line + j, *line))
        .collect();
    let parallel = frame_lines.len() >= options.parallel_threshold;
    debug!(lines = frame_lines.len(), parallel, "tokenizing motion");
    let frames = tokenize_frames(&frame_lines, parallel)?;

    if frames.len() != declared_frames {
        match options.frame_count_policy {
            FrameCountPolicy::Advisory => warn!(
                declared = declared_frames,
                found = frames.len(),
                "Frames header does not match the number of frame lines"
            ),
            FrameCountPolicy::Strict => {
                return Err(StructuralError::FrameCountMismatch {
                    declared: declared_frames,
                    found: frames.len(),
                }
                .into())
            }
        }
    }

    Ok(Motion {
        frame_time,
        frames,
        declared_frames,
    })
}
