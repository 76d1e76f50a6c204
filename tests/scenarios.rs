use bvh_anim_io::*;
use cgmath::{Deg, InnerSpace, Rotation3};

const HIPS_AND_SPINE: &str = "\
HIERARCHY
ROOT Hips
{
  OFFSET 0 0 0
  CHANNELS 4 Xposition Yposition Zposition Yrotation
  JOINT Spine
  {
    OFFSET 0 5 0
    End Site
    {
      OFFSET 0 1 0
    }
  }
}
MOTION
Frames: 1
Frame Time: 0.1
10 20 30 90
";

fn resolved() -> (Skeleton, Pose) {
    let (skeleton, motion) = load_from_str(HIPS_AND_SPINE).expect("valid bvh");
    let pose = resolve_frame(&skeleton, &motion.frames[0]).expect("conforming frame");
    (skeleton, pose)
}

#[test]
fn root_takes_world_position_and_rotation_from_the_frame() {
    let (skeleton, pose) = resolved();
    let hips = skeleton.find_by_name("Hips").next().expect("hips");
    let hips = pose.get(hips.id()).expect("hips pose");
    assert_eq!(hips.position, Position::new(10.0, 20.0, 30.0));
    let expected = Quaternion::from_angle_y(Deg(90.0));
    assert!((hips.rotation - expected).magnitude() < 1e-12);
}

#[test]
fn channelless_child_inherits_rotation_and_offsets_by_it() {
    let (skeleton, pose) = resolved();
    let spine = skeleton.find_by_name("Spine").next().expect("spine");
    assert!(spine.channels.is_empty());
    let hips = pose.get(JointId(0)).expect("hips pose");
    let spine = pose.get(spine.id()).expect("spine pose");
    assert!((spine.position - Position::new(10.0, 25.0, 30.0)).magnitude() < 1e-9);
    assert_eq!(spine.rotation, hips.rotation);
}

#[test]
fn end_site_keeps_parent_rotation() {
    let (skeleton, pose) = resolved();
    let tip = skeleton.find_by_name(END_SITE_NAME).next().expect("end site");
    assert!(tip.is_end_site() && tip.channels.is_empty() && tip.children.is_empty());
    let tip = pose.get(tip.id()).expect("tip pose");
    assert!((tip.position - Position::new(10.0, 26.0, 30.0)).magnitude() < 1e-9);
    assert_eq!(tip.rotation, pose.get(JointId(1)).expect("spine pose").rotation);
}

#[test]
fn joint_without_open_brace_is_a_syntax_error_at_that_line() {
    let text = HIPS_AND_SPINE.replacen("  JOINT Spine\n  {\n", "  JOINT Spine\n", 1);
    match load_from_str(&text) {
        Err(LoadError::Syntax(err)) => {
            assert_eq!(err.line, 5);
            assert!(err.message.contains("JOINT Spine"), "{}", err.message);
        }
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

#[test]
fn short_frame_surfaces_at_resolution_not_at_load() {
    let text = HIPS_AND_SPINE.replace("10 20 30 90", "10 20 30");
    let (skeleton, motion) = load_from_str(&text).expect("motion lines are not checked at load");
    let err = resolve_frame(&skeleton, &motion.frames[0]).expect_err("frame is short");
    assert_eq!(err.joint.as_deref(), Some("Hips"));
    assert!(matches!(export_to_string(&skeleton, &motion), Err(ExportError::MalformedFrame(_))));
}

#[test]
fn sibling_end_sites_share_their_name() {
    let text = HIPS_AND_SPINE.replacen(
        "    End Site\n",
        "    End Site\n    {\n      OFFSET 1 0 0\n    }\n    End Site\n",
        1,
    );
    let (skeleton, _) = load_from_str(&text).expect("duplicate End Site names are accepted");
    let tips: Vec<JointId> = skeleton.find_by_name(END_SITE_NAME).map(|j| j.id()).collect();
    assert_eq!(tips, vec![JointId(2), JointId(3)]);
}
