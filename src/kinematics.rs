//! Forward kinematics: world-space position and rotation of every joint for one frame.

use crate::error::MalformedFrameError;
use crate::types::*;
use crate::utils::channels_to_quat;
use cgmath::{One, Rotation};
use rayon::prelude::*;

/// Walks the skeleton in pre-order, threading one channel cursor through the frame.
struct Resolver<'a> {
    frame: &'a [f64],
    expected: usize,
    cursor: usize,
    poses: Vec<JointPose>,
}

impl<'a> Resolver<'a> {
    /// The next `count` unread values of the frame, or an error naming `joint`.
    fn take(&mut self, joint: &Joint, count: usize) -> Result<&'a [f64], MalformedFrameError> {
        let frame: &'a [f64] = self.frame;
        let end = self.cursor + count;
        if end > frame.len() {
            return Err(MalformedFrameError {
                frame_index: None,
                joint: Some(joint.name.clone()),
                expected: self.expected,
                found: frame.len(),
            });
        }
        let values = &frame[self.cursor..end];
        self.cursor = end;
        Ok(values)
    }

    fn root(&mut self, root: &Joint) -> Result<(), MalformedFrameError> {
        let values = self.take(root, root.channels.len())?;

        //// leading values are the absolute world position, each on the axis of the position channel
        //// that declares it; axes without one keep the offset
        let mut position = root.offset;
        let mut positional = 0;
        for (channel, &value) in root.channels.iter().filter(|c| c.is_position()).zip(values) {
            position[channel.axis().index()] = value;
            positional += 1;
        }

        //// remaining values pair up with the rotation channels in declared order
        let rotation = channels_to_quat(
            root.channels.iter().filter(|c| c.is_rotation()),
            &values[positional..],
        );

        self.poses.push(JointPose { position, rotation });
        for child in &root.children {
            self.joint(child, JointPose { position, rotation })?;
        }
        Ok(())
    }

    fn joint(&mut self, joint: &Joint, parent: JointPose) -> Result<(), MalformedFrameError> {
        //// End Sites carry no channels and keep the parent's rotation
        let rotation = if joint.is_end_site() {
            parent.rotation
        } else {
            let values = self.take(joint, joint.channels.len())?;
            parent.rotation * channels_to_quat(&joint.channels, values)
        };

        let pose = JointPose {
            position: parent.position + parent.rotation.rotate_vector(joint.offset),
            rotation,
        };
        self.poses.push(pose);
        for child in &joint.children {
            self.joint(child, pose)?;
        }
        Ok(())
    }
}

/// Resolve the world pose of every joint for `frame`.
///
/// Pure: the skeleton is only read, so frames can be resolved concurrently. Fails when the frame
/// length differs from [`Skeleton::channel_count`].
pub fn resolve_frame(skeleton: &Skeleton, frame: &Frame) -> Result<Pose, MalformedFrameError> {
    let mut resolver = Resolver {
        frame: frame.values(),
        expected: skeleton.channel_count(),
        cursor: 0,
        poses: Vec::with_capacity(skeleton.joint_count()),
    };
    resolver.root(skeleton.root())?;

    if resolver.cursor != frame.len() {
        return Err(MalformedFrameError {
            frame_index: None,
            joint: None,
            expected: skeleton.channel_count(),
            found: frame.len(),
        });
    }
    Ok(Pose {
        joints: resolver.poses,
    })
}

/// Check that `frame` has exactly one value per channel without resolving it.
pub fn check_frame(skeleton: &Skeleton, frame: &Frame) -> Result<(), MalformedFrameError> {
    let expected = skeleton.channel_count();
    let mut cursor = 0;
    for joint in skeleton.joints().filter(|joint| !joint.is_end_site()) {
        cursor += joint.channels.len();
        if cursor > frame.len() {
            return Err(MalformedFrameError {
                frame_index: None,
                joint: Some(joint.name.clone()),
                expected,
                found: frame.len(),
            });
        }
    }
    if frame.len() != expected {
        return Err(MalformedFrameError {
            frame_index: None,
            joint: None,
            expected,
            found: frame.len(),
        });
    }
    Ok(())
}

/// Resolve every frame of `motion` in parallel. One result per frame, in frame order;
/// a malformed frame carries its index and does not affect the others.
pub fn resolve_motion(
    skeleton: &Skeleton,
    motion: &Motion,
) -> Vec<Result<Pose, MalformedFrameError>> {
    motion
        .frames
        .par_iter()
        .enumerate()
        .map(|(index, frame)| resolve_frame(skeleton, frame).map_err(|err| err.at_frame(index)))
        .collect()
}

/// Pose with every channel at zero: identity rotations, positions from the accumulated offsets.
pub fn resolve_rest_pose(skeleton: &Skeleton) -> Pose {
    fn __walk(joint: &Joint, parent: Position, poses: &mut Vec<JointPose>) {
        let position = parent + joint.offset;
        poses.push(JointPose {
            position,
            rotation: Quaternion::one(),
        });
        for child in &joint.children {
            __walk(child, position, poses);
        }
    }

    let mut poses = Vec::with_capacity(skeleton.joint_count());
    __walk(skeleton.root(), Position::new(0.0, 0.0, 0.0), &mut poses);
    Pose { joints: poses }
}
