//! Load, resolve and export BVH (Biovision Hierarchy) motion-capture files.
//!
//! ```no_run
//! let (skeleton, motion) = bvh_anim_io::load("walk.bvh")?;
//! for frame in &motion.frames {
//!     let pose = bvh_anim_io::resolve_frame(&skeleton, frame)?;
//!     for (from, to) in pose.segments(&skeleton) {
//!         // draw a bone from `from` to `to`
//!         let _ = (from, to);
//!     }
//! }
//! bvh_anim_io::export(&skeleton, &motion, "walk_copy.bvh")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod kinematics;
pub mod motion;
pub mod parse;
pub mod types;
pub mod utils;

pub use config::{ExportOptions, FrameCountPolicy, LoadOptions};
pub use document::Bvh;
pub use error::{
    ExportError, FormatError, InvalidStateError, LoadError, MalformedFrameError, StructuralError,
    SyntaxError,
};
pub use export::{export, export_to_string, export_to_string_with, export_with, write_bvh};
pub use kinematics::{check_frame, resolve_frame, resolve_motion, resolve_rest_pose};
pub use parse::{load, load_from_str, load_from_str_with, load_with, MAX_JOINT_DEPTH};
pub use types::{
    Axis, ChannelKind, Frame, Joint, JointId, JointKind, JointPose, Motion, Pose, Position,
    Quaternion, Skeleton, END_SITE_NAME,
};
