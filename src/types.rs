use cgmath::{Quaternion as CgQuaternion, Vector3};
use std::fmt;
use std::str::FromStr;

/////////////////////////////////////////////////////////////////////////////////////////////////

pub type Quaternion = CgQuaternion<f64>;
pub type Position = Vector3<f64>;

/// Name every End Site carries. Not unique: sibling End Sites share it.
pub const END_SITE_NAME: &str = "End Site";

/// Identity of a joint inside its skeleton: the joint's pre-order (depth-first) index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub usize);

impl JointId {
    pub fn index(self) -> usize {
        self.0
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index into a [`Position`].
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// One animated degree of freedom, as named in a CHANNELS line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Xposition,
    Yposition,
    Zposition,
    Xrotation,
    Yrotation,
    Zrotation,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 6] = [
        ChannelKind::Xposition,
        ChannelKind::Yposition,
        ChannelKind::Zposition,
        ChannelKind::Xrotation,
        ChannelKind::Yrotation,
        ChannelKind::Zrotation,
    ];

    pub fn is_position(self) -> bool {
        matches!(
            self,
            ChannelKind::Xposition | ChannelKind::Yposition | ChannelKind::Zposition
        )
    }

    pub fn is_rotation(self) -> bool {
        !self.is_position()
    }

    pub fn axis(self) -> Axis {
        match self {
            ChannelKind::Xposition | ChannelKind::Xrotation => Axis::X,
            ChannelKind::Yposition | ChannelKind::Yrotation => Axis::Y,
            ChannelKind::Zposition | ChannelKind::Zrotation => Axis::Z,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Xposition => "Xposition",
            ChannelKind::Yposition => "Yposition",
            ChannelKind::Zposition => "Zposition",
            ChannelKind::Xrotation => "Xrotation",
            ChannelKind::Yrotation => "Yrotation",
            ChannelKind::Zrotation => "Zrotation",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a CHANNELS line names something other than the six canonical channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel(pub String);

impl FromStr for ChannelKind {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownChannel(s.to_string()))
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointKind {
    Joint,
    EndSite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    pub kind: JointKind,
    pub offset: Position,
    pub channels: Vec<ChannelKind>,
    pub children: Vec<Joint>,
    /// Non-owning back-reference, filled in by [`Skeleton::new`].
    pub(crate) parent: Option<JointId>,
    /// Pre-order index, filled in by [`Skeleton::new`].
    pub(crate) id: JointId,
}

impl Joint {
    pub fn new(name: impl Into<String>, offset: Position, channels: Vec<ChannelKind>) -> Self {
        Joint {
            name: name.into(),
            kind: JointKind::Joint,
            offset,
            channels,
            children: Vec::new(),
            parent: None,
            id: JointId(0),
        }
    }

    pub fn end_site(offset: Position) -> Self {
        Joint {
            name: END_SITE_NAME.to_string(),
            kind: JointKind::EndSite,
            offset,
            channels: Vec::new(),
            children: Vec::new(),
            parent: None,
            id: JointId(0),
        }
    }

    pub fn with_child(mut self, child: Joint) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_end_site(&self) -> bool {
        self.kind == JointKind::EndSite
    }

    /// Pre-order index inside the owning skeleton. Meaningless before [`Skeleton::new`].
    pub fn id(&self) -> JointId {
        self.id
    }

    /// Parent inside the owning skeleton; `None` for the root or before [`Skeleton::new`].
    pub fn parent(&self) -> Option<JointId> {
        self.parent
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// A joint tree with exactly one root.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    root: Joint,
    joint_count: usize,
    channel_count: usize,
}

impl Skeleton {
    /// Takes ownership of `root` and numbers the tree in pre-order, linking each joint to its parent.
    pub fn new(mut root: Joint) -> Self {
        fn __number(
            joint: &mut Joint,
            parent: Option<JointId>,
            next: usize,
            channels: &mut usize,
        ) -> usize {
            joint.id = JointId(next);
            joint.parent = parent;
            if !joint.is_end_site() {
                *channels += joint.channels.len();
            }
            let mut next = next + 1;
            let id = joint.id;
            for child in joint.children.iter_mut() {
                next = __number(child, Some(id), next, channels);
            }
            next
        }

        let mut channel_count = 0;
        let joint_count = __number(&mut root, None, 0, &mut channel_count);
        Skeleton {
            root,
            joint_count,
            channel_count,
        }
    }

    pub fn root(&self) -> &Joint {
        &self.root
    }

    /// Number of joints, End Sites included.
    pub fn joint_count(&self) -> usize {
        self.joint_count
    }

    /// Number of values a frame must carry for this skeleton.
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// All joints in pre-order; the n-th item has `JointId(n)`.
    pub fn joints(&self) -> Joints<'_> {
        Joints {
            stack: vec![&self.root],
        }
    }

    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints().nth(id.0)
    }

    /// Every joint carrying `name`. Names are not unique (End Sites never are).
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Joint> + 'a {
        self.joints().filter(move |joint| joint.name == name)
    }

    /// Returns the kinematic chains of the skeleton like \[\[0,1,2,3\],\[4,5,6,7,8\],\[9,10,11\]\].
    /// A chain starts at the root or at a joint whose parent branches, and runs down single-child
    /// links until a leaf or the next branching joint (inclusive).
    pub fn kinematic_chains(&self) -> Vec<Vec<JointId>> {
        let mut chains: Vec<Vec<JointId>> = Vec::new();
        let mut chain: Vec<JointId> = Vec::new();
        let mut last: Option<JointId> = None;
        for joint in self.joints() {
            //// a joint continues the current chain only if it is the only child of the previous joint
            let continues = match (last, joint.parent) {
                (Some(prev), Some(parent)) => parent == prev,
                _ => false,
            };
            if !continues && !chain.is_empty() {
                chains.push(std::mem::take(&mut chain));
            }
            chain.push(joint.id);
            last = if joint.children.len() == 1 { Some(joint.id) } else { None };
        }
        if !chain.is_empty() {
            chains.push(chain);
        }
        chains
    }
}

/// Pre-order iterator over a skeleton's joints.
pub struct Joints<'a> {
    stack: Vec<&'a Joint>,
}

impl<'a> Iterator for Joints<'a> {
    type Item = &'a Joint;

    fn next(&mut self) -> Option<Self::Item> {
        let joint = self.stack.pop()?;
        self.stack.extend(joint.children.iter().rev());
        Some(joint)
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// One time sample: the flat channel values of the whole skeleton, in pre-order channel order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub values: Vec<f64>,
}

impl Frame {
    pub fn new(values: Vec<f64>) -> Self {
        Frame { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for Frame {
    fn from(values: Vec<f64>) -> Self {
        Frame { values }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Motion {
    /// Seconds per frame.
    pub frame_time: f64,
    pub frames: Vec<Frame>,
    /// Value of the `Frames:` header when loaded from text. Informational only.
    pub declared_frames: usize,
}

impl Motion {
    pub fn new(frame_time: f64, frames: Vec<Frame>) -> Self {
        let declared_frames = frames.len();
        Motion {
            frame_time,
            frames,
            declared_frames,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Frames per second, rounded to the nearest integer. 0 when the frame time is not positive.
    pub fn fps(&self) -> u32 {
        if self.frame_time > 0.0 {
            (1.0 / self.frame_time).round() as u32
        } else {
            0
        }
    }

    /// Length of the clip in seconds.
    pub fn duration(&self) -> f64 {
        self.frame_time * self.frames.len() as f64
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPose {
    pub position: Position,
    pub rotation: Quaternion,
}

/// World-space pose of every joint for one frame, indexed by [`JointId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub(crate) joints: Vec<JointPose>,
}

impl Pose {
    pub fn get(&self, id: JointId) -> Option<&JointPose> {
        self.joints.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (JointId, &JointPose)> {
        self.joints.iter().enumerate().map(|(i, pose)| (JointId(i), pose))
    }

    /// Parent-to-child line segments, one per non-root joint, in pre-order.
    /// This is what a viewer draws to show the skeleton.
    pub fn segments(&self, skeleton: &Skeleton) -> Vec<(Position, Position)> {
        skeleton
            .joints()
            .filter_map(|joint| {
                let parent = self.get(joint.parent?)?;
                let child = self.get(joint.id)?;
                Some((parent.position, child.position))
            })
            .collect()
    }
}
