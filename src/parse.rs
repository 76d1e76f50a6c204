use crate::config::LoadOptions;
use crate::error::{FormatError, LoadError, StructuralError, SyntaxError};
use crate::motion;
use crate::types::*;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

static RE_JOINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(ROOT|JOINT)\s+(\S.*?)\s*$").expect("static regex"));
static RE_END_SITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^End\s+Site$").expect("static regex"));
static RE_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^OFFSET(?:\s+(.*))?$").expect("static regex"));
static RE_CHANNELS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CHANNELS(?:\s+(.*))?$").expect("static regex"));

/// Deepest joint nesting the parser accepts; the root is at depth 0.
pub const MAX_JOINT_DEPTH: usize = 256;

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn __syntax(line: usize, message: impl Into<String>) -> LoadError {
    SyntaxError {
        line,
        message: message.into(),
    }
    .into()
}

fn __format(line: usize, message: impl Into<String>) -> LoadError {
    FormatError {
        line,
        message: message.into(),
    }
    .into()
}

/// Trimmed line `i`, or an end-of-input error mentioning what was being parsed.
fn __line<'a>(lines: &[&'a str], i: usize, context: &str) -> Result<&'a str, LoadError> {
    lines.get(i).map(|line| line.trim()).ok_or_else(|| {
        StructuralError::UnexpectedEof {
            context: context.to_string(),
        }
        .into()
    })
}

/// Index of the first non-blank line at or after `i`.
pub(crate) fn __skip_blank(lines: &[&str], mut i: usize) -> usize {
    while i < lines.len() && lines[i].trim().is_empty() {
        i += 1;
    }
    i
}

/// The header line at `i` must be followed immediately by a lone `{`.
fn __expect_open_brace(lines: &[&str], i: usize, context: &str) -> Result<(), LoadError> {
    let next = __line(lines, i + 1, context)?;
    if next != "{" {
        return Err(__syntax(
            i,
            format!("expected '{{' on the line after '{}', found '{}'", lines[i].trim(), next),
        ));
    }
    Ok(())
}

fn __parse_offset(lines: &[&str], i: usize, context: &str) -> Result<Position, LoadError> {
    let line = __line(lines, i, context)?;
    let captures = RE_OFFSET
        .captures(line)
        .ok_or_else(|| __syntax(i, format!("expected OFFSET, found '{}'", line)))?;
    let tokens: Vec<&str> = captures
        .get(1)
        .map(|m| m.as_str().split_whitespace().collect())
        .unwrap_or_default();
    if tokens.len() != 3 {
        return Err(__format(
            i,
            format!("OFFSET needs exactly 3 values, found {}", tokens.len()),
        ));
    }
    let mut xyz = [0.0; 3];
    for (slot, token) in xyz.iter_mut().zip(&tokens) {
        *slot = token
            .parse::<f64>()
            .map_err(|_| __format(i, format!("OFFSET value '{}' is not a number", token)))?;
    }
    Ok(Position::new(xyz[0], xyz[1], xyz[2]))
}

fn __parse_channels(line: &str, i: usize) -> Result<Vec<ChannelKind>, LoadError> {
    let rest = RE_CHANNELS
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .unwrap_or("");
    let mut tokens = rest.split_whitespace();
    let count = tokens
        .next()
        .ok_or_else(|| __format(i, "CHANNELS is missing its channel count"))?;
    let count: usize = count
        .parse()
        .map_err(|_| __format(i, format!("channel count '{}' is not an integer", count)))?;
    let names: Vec<&str> = tokens.collect();
    if names.len() != count {
        return Err(__format(
            i,
            format!("CHANNELS declares {} channels but lists {}", count, names.len()),
        ));
    }
    names
        .into_iter()
        .map(|name| {
            name.parse::<ChannelKind>()
                .map_err(|_| __syntax(i, format!("unknown channel '{}'", name)))
        })
        .collect()
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// `End Site { OFFSET x y z }` starting at line `i`.
fn __parse_end_site(lines: &[&str], i: usize) -> Result<(Joint, usize), LoadError> {
    const CONTEXT: &str = "End Site";
    __expect_open_brace(lines, i, CONTEXT)?;
    let offset = __parse_offset(lines, i + 2, CONTEXT)?;
    let close = __line(lines, i + 3, CONTEXT)?;
    if close != "}" {
        return Err(__syntax(
            i + 3,
            format!("expected '}}' closing End Site, found '{}'", close),
        ));
    }
    Ok((Joint::end_site(offset), i + 4))
}

/// Parse the ROOT/JOINT/End Site block starting at line `i`.
///
/// Returns the joint with its whole subtree and the index of the first line after its closing brace.
/// Each level only ever looks for its own closing brace; nested blocks are consumed by the recursive call.
fn __parse_joint(lines: &[&str], i: usize, depth: usize) -> Result<(Joint, usize), LoadError> {
    if depth >= MAX_JOINT_DEPTH {
        return Err(StructuralError::TooDeep {
            line: i,
            limit: MAX_JOINT_DEPTH,
        }
        .into());
    }
    let line = __line(lines, i, "joint")?;
    if RE_END_SITE.is_match(line) {
        return __parse_end_site(lines, i);
    }

    let captures = RE_JOINT
        .captures(line)
        .ok_or_else(|| __syntax(i, format!("expected JOINT or End Site, found '{}'", line)))?;
    let keyword = captures.get(1).map_or("", |m| m.as_str());
    let name = captures.get(2).map_or("", |m| m.as_str()).to_string();
    match (depth, keyword) {
        (0, "ROOT") | (1.., "JOINT") => {}
        (0, _) => return Err(__syntax(i, format!("expected ROOT, found '{}'", line))),
        _ => return Err(__syntax(i, "ROOT is only allowed for the top joint")),
    }

    let context = format!("joint '{}'", name);
    __expect_open_brace(lines, i, &context)?;
    let offset = __parse_offset(lines, i + 2, &context)?;

    //// CHANNELS is optional
    let mut cursor = i + 3;
    let channels = {
        let line = __line(lines, cursor, &context)?;
        if RE_CHANNELS.is_match(line) {
            cursor += 1;
            __parse_channels(line, cursor - 1)?
        } else {
            Vec::new()
        }
    };

    let mut joint = Joint::new(name, offset, channels);
    loop {
        let line = __line(lines, cursor, &context)?;
        if line.is_empty() {
            cursor += 1;
        } else if line == "}" {
            debug!(joint = %joint.name, depth, children = joint.children.len(), "parsed joint");
            return Ok((joint, cursor + 1));
        } else if RE_JOINT.is_match(line) || RE_END_SITE.is_match(line) {
            let (child, next) = __parse_joint(lines, cursor, depth + 1)?;
            joint.children.push(child);
            cursor = next;
        } else {
            return Err(__syntax(
                cursor,
                format!("unexpected '{}' inside joint '{}'", line, joint.name),
            ));
        }
    }
}

/// Parse the HIERARCHY section. Returns the skeleton and the index of the first line after it.
pub fn parse_hierarchy(lines: &[&str]) -> Result<(Skeleton, usize), LoadError> {
    let start = __skip_blank(lines, 0);
    match lines.get(start) {
        Some(line) if line.trim() == "HIERARCHY" => {}
        _ => return Err(StructuralError::MissingSection("HIERARCHY").into()),
    }

    let root_line = __skip_blank(lines, start + 1);
    let is_root = lines
        .get(root_line)
        .and_then(|line| RE_JOINT.captures(line.trim()))
        .is_some_and(|captures| &captures[1] == "ROOT");
    if !is_root {
        return Err(StructuralError::MissingRoot { line: root_line }.into());
    }

    let (root, next) = __parse_joint(lines, root_line, 0)?;
    let skeleton = Skeleton::new(root);
    debug!(
        root = %skeleton.root().name,
        joints = skeleton.joint_count(),
        channels = skeleton.channel_count(),
        "hierarchy parsed"
    );
    Ok((skeleton, next))
}

fn __load_bvh(text: &str, options: &LoadOptions) -> Result<(Skeleton, Motion), LoadError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text.lines().collect();

    //// HIERARCHY
    let (skeleton, next) = parse_hierarchy(&lines)?;

    //// MOTION
    let motion_line = __skip_blank(&lines, next);
    match lines.get(motion_line).map(|line| line.trim()) {
        Some("MOTION") => {}
        Some(other) => {
            return Err(__syntax(
                motion_line,
                format!("expected MOTION after the hierarchy, found '{}'", other),
            ))
        }
        None => return Err(StructuralError::MissingSection("MOTION").into()),
    }
    let motion = motion::parse_motion(&lines[motion_line + 1..], motion_line + 1, options)?;

    info!(
        root = %skeleton.root().name,
        joints = skeleton.joint_count(),
        frames = motion.num_frames(),
        frame_time = motion.frame_time,
        "bvh loaded"
    );
    Ok((skeleton, motion))
}

//////////////////////////////////////////////////////////////// PUBLIC ////////////////////////////////////////////////////////

/// load a bvh file from a file path
pub fn load(path: impl AsRef<Path>) -> Result<(Skeleton, Motion), LoadError> {
    load_with(path, &LoadOptions::default())
}

pub fn load_with(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<(Skeleton, Motion), LoadError> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading bvh file");
    let mut file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    drop(file);
    __load_bvh(&contents, options)
}

/// load a bvh file from a string
pub fn load_from_str(bvh_string: &str) -> Result<(Skeleton, Motion), LoadError> {
    __load_bvh(bvh_string, &LoadOptions::default())
}

pub fn load_from_str_with(
    bvh_string: &str,
    options: &LoadOptions,
) -> Result<(Skeleton, Motion), LoadError> {
    __load_bvh(bvh_string, options)
}
