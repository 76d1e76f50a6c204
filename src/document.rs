use crate::config::{ExportOptions, LoadOptions};
use crate::error::{ExportError, InvalidStateError, LoadError, MalformedFrameError};
use crate::export;
use crate::kinematics;
use crate::parse;
use crate::types::{Motion, Pose, Skeleton};
use std::path::Path;

/// A loaded animation held by a caller between load and export.
///
/// A failed load leaves the previous contents untouched, so the caller can retry with
/// another file right away.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    skeleton: Option<Skeleton>,
    motion: Motion,
    load_options: LoadOptions,
    export_options: ExportOptions,
}

impl Bvh {
    pub fn new() -> Self {
        Bvh::default()
    }

    pub fn from_parts(skeleton: Skeleton, motion: Motion) -> Self {
        Bvh {
            skeleton: Some(skeleton),
            motion,
            ..Bvh::default()
        }
    }

    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    pub fn with_export_options(mut self, options: ExportOptions) -> Self {
        self.export_options = options;
        self
    }

    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.skeleton.as_ref()
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn is_loaded(&self) -> bool {
        self.skeleton.is_some()
    }

    /// Replace the contents with the file at `path`.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let (skeleton, motion) = parse::load_with(path, &self.load_options)?;
        self.skeleton = Some(skeleton);
        self.motion = motion;
        Ok(())
    }

    /// Replace the contents with parsed `text`.
    pub fn reload_from_str(&mut self, text: &str) -> Result<(), LoadError> {
        let (skeleton, motion) = parse::load_from_str_with(text, &self.load_options)?;
        self.skeleton = Some(skeleton);
        self.motion = motion;
        Ok(())
    }

    fn __loaded(&self) -> Result<&Skeleton, InvalidStateError> {
        self.skeleton.as_ref().ok_or(InvalidStateError::NoSkeleton)
    }

    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let skeleton = self.__loaded()?;
        export::export_with(skeleton, &self.motion, path, &self.export_options)
    }

    pub fn export_to_string(&self) -> Result<String, ExportError> {
        let skeleton = self.__loaded()?;
        export::export_to_string_with(skeleton, &self.motion, &self.export_options)
    }

    /// Resolve frame `index` of the loaded motion. `None` when nothing is loaded or the index is
    /// out of range.
    pub fn pose(&self, index: usize) -> Option<Result<Pose, MalformedFrameError>> {
        let skeleton = self.skeleton.as_ref()?;
        let frame = self.motion.frames.get(index)?;
        Some(kinematics::resolve_frame(skeleton, frame).map_err(|err| err.at_frame(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = "HIERARCHY\nROOT A\n{\n  OFFSET 0 0 0\n  CHANNELS 1 Zrotation\n}\nMOTION\nFrames: 2\nFrame Time: 0.5\n0\n45\n";

    #[test]
    fn export_without_skeleton_is_invalid_state() {
        let bvh = Bvh::new();
        assert!(matches!(bvh.export_to_string(), Err(ExportError::InvalidState(InvalidStateError::NoSkeleton))));
        assert!(matches!(
            bvh.export("/tmp/never-written.bvh"),
            Err(ExportError::InvalidState(InvalidStateError::NoSkeleton))
        ));
    }

    #[test]
    fn failed_reload_keeps_previous_model() {
        let mut bvh = Bvh::new();
        bvh.reload_from_str(TINY).expect("valid");
        let before = bvh.skeleton().cloned();

        assert!(bvh.reload_from_str("HIERARCHY\nROOT B\nOFFSET 0 0 0\n").is_err());
        assert_eq!(bvh.skeleton().cloned(), before);
        assert_eq!(bvh.motion().num_frames(), 2);
    }

    #[test]
    fn pose_tags_frame_index() {
        let mut bvh = Bvh::new();
        assert!(bvh.pose(0).is_none());
        bvh.reload_from_str(TINY).expect("valid");
        assert!(bvh.pose(1).is_some_and(|pose| pose.is_ok()));
        assert!(bvh.pose(2).is_none());
    }
}
