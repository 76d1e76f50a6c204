//! Write a skeleton and its motion back to .bvh text.

use crate::config::ExportOptions;
use crate::error::{ExportError, InvalidStateError};
use crate::kinematics::check_frame;
use crate::types::*;
use crate::utils::{__format_exact, __format_number};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

const INDENT: &str = "  ";

fn __format_offset(offset: &Position) -> String {
    format!(
        "{} {} {}",
        __format_exact(offset.x),
        __format_exact(offset.y),
        __format_exact(offset.z)
    )
}

fn __write_joint<W: Write>(w: &mut W, joint: &Joint, depth: usize) -> io::Result<()> {
    let indent = INDENT.repeat(depth);
    if joint.is_end_site() {
        writeln!(w, "{}End Site", indent)?;
        writeln!(w, "{}{{", indent)?;
        writeln!(w, "{}{}OFFSET {}", indent, INDENT, __format_offset(&joint.offset))?;
        writeln!(w, "{}}}", indent)?;
        return Ok(());
    }

    let keyword = if depth == 0 { "ROOT" } else { "JOINT" };
    writeln!(w, "{}{} {}", indent, keyword, joint.name)?;
    writeln!(w, "{}{{", indent)?;
    writeln!(w, "{}{}OFFSET {}", indent, INDENT, __format_offset(&joint.offset))?;
    let channels: Vec<&str> = joint.channels.iter().map(|c| c.as_str()).collect();
    if channels.is_empty() {
        writeln!(w, "{}{}CHANNELS 0", indent, INDENT)?;
    } else {
        writeln!(w, "{}{}CHANNELS {} {}", indent, INDENT, channels.len(), channels.join(" "))?;
    }
    for child in &joint.children {
        __write_joint(w, child, depth + 1)?;
    }
    writeln!(w, "{}}}", indent)?;
    Ok(())
}

fn __write_motion<W: Write>(w: &mut W, motion: &Motion, options: &ExportOptions) -> io::Result<()> {
    writeln!(w, "MOTION")?;
    writeln!(w, "Frames: {}", motion.frames.len())?;
    writeln!(w, "Frame Time: {}", __format_exact(motion.frame_time))?;
    for frame in &motion.frames {
        let line: Vec<String> = frame
            .values()
            .iter()
            .map(|&value| __format_number(value, options.precision))
            .collect();
        writeln!(w, "{}", line.join(" "))?;
    }
    Ok(())
}

/// The root must be a real joint and every frame must carry one value per channel before
/// anything is written.
fn __validate(skeleton: &Skeleton, motion: &Motion) -> Result<(), ExportError> {
    if skeleton.root().is_end_site() {
        return Err(InvalidStateError::EndSiteRoot.into());
    }
    for (index, frame) in motion.frames.iter().enumerate() {
        check_frame(skeleton, frame).map_err(|err| err.at_frame(index))?;
    }
    Ok(())
}

fn __write_bvh<W: Write>(
    w: &mut W,
    skeleton: &Skeleton,
    motion: &Motion,
    options: &ExportOptions,
) -> io::Result<()> {
    writeln!(w, "HIERARCHY")?;
    __write_joint(w, skeleton.root(), 0)?;
    __write_motion(w, motion, options)
}

//////////////////////////////////////////////////////////////// PUBLIC ////////////////////////////////////////////////////////

/// Write .bvh text to any writer. Frames are validated first; on a malformed frame nothing is written.
pub fn write_bvh<W: Write>(
    writer: &mut W,
    skeleton: &Skeleton,
    motion: &Motion,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    __validate(skeleton, motion)?;
    __write_bvh(writer, skeleton, motion, options)?;
    Ok(())
}

pub fn export_to_string(skeleton: &Skeleton, motion: &Motion) -> Result<String, ExportError> {
    export_to_string_with(skeleton, motion, &ExportOptions::default())
}

pub fn export_to_string_with(
    skeleton: &Skeleton,
    motion: &Motion,
    options: &ExportOptions,
) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_bvh(&mut buffer, skeleton, motion, options)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// export a skeleton and motion to a .bvh file
pub fn export(
    skeleton: &Skeleton,
    motion: &Motion,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    export_with(skeleton, motion, path, &ExportOptions::default())
}

pub fn export_with(
    skeleton: &Skeleton,
    motion: &Motion,
    path: impl AsRef<Path>,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    __validate(skeleton, motion)?;

    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    __write_bvh(&mut writer, skeleton, motion, options)?;
    writer.flush()?;

    info!(
        path = %path.display(),
        joints = skeleton.joint_count(),
        frames = motion.num_frames(),
        "bvh exported"
    );
    Ok(())
}
