use bvh_anim_io::*;
use proptest::prelude::*;

const SAMPLE: &str = include_str!("data/sample.bvh");

fn assert_same_hierarchy(a: &Skeleton, b: &Skeleton) {
    assert_eq!(a.joint_count(), b.joint_count());
    for (ja, jb) in a.joints().zip(b.joints()) {
        assert_eq!(ja.name, jb.name);
        assert_eq!(ja.kind, jb.kind);
        assert_eq!(ja.offset, jb.offset);
        assert_eq!(ja.channels, jb.channels);
        assert_eq!(ja.parent(), jb.parent());
        assert_eq!(ja.children.len(), jb.children.len());
    }
}

fn assert_frames_near(a: &Motion, b: &Motion, tolerance: f64) {
    assert_eq!(a.frames.len(), b.frames.len());
    for (fa, fb) in a.frames.iter().zip(&b.frames) {
        assert_eq!(fa.len(), fb.len());
        for (va, vb) in fa.values().iter().zip(fb.values()) {
            assert!((va - vb).abs() <= tolerance, "{} vs {}", va, vb);
        }
    }
}

#[test]
fn loads_sample_file() {
    let (skeleton, motion) = load("tests/data/sample.bvh").expect("sample loads");
    assert_eq!(skeleton.root().name, "Hips");
    assert_eq!(skeleton.joint_count(), 10);
    assert_eq!(skeleton.channel_count(), 24);
    assert_eq!(motion.num_frames(), 3);
    assert_eq!(motion.declared_frames, 3);
    assert_eq!(motion.frame_time, 0.033333);
    assert_eq!(motion.fps(), 30);
    for frame in &motion.frames {
        check_frame(&skeleton, frame).expect("frame matches skeleton");
    }

    let legs: Vec<&str> = skeleton
        .joints()
        .filter(|j| j.name.ends_with("Leg"))
        .map(|j| j.name.as_str())
        .collect();
    assert_eq!(legs, ["LeftUpLeg", "LeftLeg", "RightUpLeg", "RightLeg"]);
}

#[test]
fn sample_round_trips_through_text() {
    let (skeleton, motion) = load_from_str(SAMPLE).expect("sample loads");
    let text = export_to_string(&skeleton, &motion).expect("exports");
    let (skeleton2, motion2) = load_from_str(&text).expect("export re-parses");
    assert_same_hierarchy(&skeleton, &skeleton2);
    assert_frames_near(&motion, &motion2, 1e-6);
    assert_eq!(motion.frame_time, motion2.frame_time);

    // exporting the re-parsed data gives the same text again
    assert_eq!(export_to_string(&skeleton2, &motion2).expect("exports"), text);
}

#[test]
fn sample_round_trips_through_a_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("copy.bvh");
    let (skeleton, motion) = load_from_str(SAMPLE).expect("sample loads");
    export(&skeleton, &motion, &path).expect("exports");
    let (skeleton2, motion2) = load(&path).expect("reloads");
    assert_same_hierarchy(&skeleton, &skeleton2);
    assert_frames_near(&motion, &motion2, 1e-6);
}

#[test]
fn export_to_missing_directory_fails_with_path() {
    let (skeleton, motion) = load_from_str(SAMPLE).expect("sample loads");
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("no/such/dir/out.bvh");
    match export(&skeleton, &motion, &path) {
        Err(ExportError::Create { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected create error, got {:?}", other),
    }
}

#[test]
fn every_sample_frame_resolves() {
    let (skeleton, motion) = load_from_str(SAMPLE).expect("sample loads");
    let poses = resolve_motion(&skeleton, &motion);
    assert_eq!(poses.len(), 3);
    for (i, pose) in poses.into_iter().enumerate() {
        let pose = pose.expect("conforming frame");
        assert_eq!(pose.len(), skeleton.joint_count());
        let hips = pose.get(JointId(0)).expect("root pose").position;
        let frame = motion.frames[i].values();
        assert_eq!(hips, Position::new(frame[0], frame[1], frame[2]));
    }
}

#[test]
fn frames_keep_line_order_under_parallel_parsing() {
    let mut text = String::from(
        "HIERARCHY\nROOT Hips\n{\n  OFFSET 0 0 0\n  CHANNELS 3 Xposition Yposition Zposition\n}\nMOTION\n",
    );
    let n = 5000;
    text.push_str(&format!("Frames: {}\nFrame Time: 0.01\n", n));
    for i in 0..n {
        text.push_str(&format!("{} {} {}\n", i, i * 2, i % 7));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("thread pool");
    let options = LoadOptions::default().with_parallel_threshold(0);
    let (_, motion) = pool
        .install(|| load_from_str_with(&text, &options))
        .expect("loads");

    assert_eq!(motion.num_frames(), n);
    for (i, frame) in motion.frames.iter().enumerate() {
        assert_eq!(frame.values(), &[i as f64, (i * 2) as f64, (i % 7) as f64]);
    }
}

#[test]
fn strict_frame_count_rejects_mismatch() {
    let text = SAMPLE.replace("Frames: 3", "Frames: 4");
    assert!(load_from_str(&text).is_ok());
    let strict = LoadOptions::default().with_frame_count_policy(FrameCountPolicy::Strict);
    assert!(matches!(
        load_from_str_with(&text, &strict),
        Err(LoadError::Structural(StructuralError::FrameCountMismatch { declared: 4, found: 3 }))
    ));
}

//////////////////////////////////////////////////////////////// PROPERTIES ////////////////////////////////////////////////////////

fn arb_offset() -> impl Strategy<Value = Position> {
    (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0).prop_map(|(x, y, z)| Position::new(x, y, z))
}

fn arb_rotation_channels() -> impl Strategy<Value = Vec<ChannelKind>> {
    use bvh_anim_io::ChannelKind::*;
    (Just(vec![Zrotation, Xrotation, Yrotation]).prop_shuffle(), 0usize..=3).prop_map(
        |(mut channels, len)| {
            channels.truncate(len);
            channels
        },
    )
}

fn build_skeleton(
    parents: &[prop::sample::Index],
    offsets: &[Position],
    rotations: &[Vec<ChannelKind>],
    tip: Position,
) -> Skeleton {
    let n = offsets.len();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for k in 1..n {
        children[parents[k].index(k)].push(k);
    }

    fn make(
        k: usize,
        children: &[Vec<usize>],
        offsets: &[Position],
        rotations: &[Vec<ChannelKind>],
        tip: Position,
    ) -> Joint {
        let mut channels = Vec::new();
        if k == 0 {
            channels.extend([ChannelKind::Xposition, ChannelKind::Yposition, ChannelKind::Zposition]);
        }
        channels.extend(rotations[k].iter().copied());
        let mut joint = Joint::new(format!("J{}", k), offsets[k], channels);
        for &c in &children[k] {
            joint = joint.with_child(make(c, children, offsets, rotations, tip));
        }
        if children[k].is_empty() {
            joint = joint.with_child(Joint::end_site(tip));
        }
        joint
    }

    Skeleton::new(make(0, &children, offsets, rotations, tip))
}

fn arb_skeleton() -> impl Strategy<Value = Skeleton> {
    (1usize..8)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(any::<prop::sample::Index>(), n),
                prop::collection::vec(arb_offset(), n),
                prop::collection::vec(arb_rotation_channels(), n),
                arb_offset(),
            )
        })
        .prop_map(|(parents, offsets, rotations, tip)| build_skeleton(&parents, &offsets, &rotations, tip))
}

fn arb_animation() -> impl Strategy<Value = (Skeleton, Motion)> {
    arb_skeleton().prop_flat_map(|skeleton| {
        let channels = skeleton.channel_count();
        (
            Just(skeleton),
            prop::collection::vec(prop::collection::vec(-1000.0f64..1000.0, channels), 0..5),
            0.001f64..1.0,
        )
            .prop_map(|(skeleton, frames, frame_time)| {
                let frames = frames.into_iter().map(Frame::new).collect();
                (skeleton, Motion::new(frame_time, frames))
            })
    })
}

proptest! {
    #[test]
    fn prop_export_then_load_round_trips((skeleton, motion) in arb_animation()) {
        let text = export_to_string(&skeleton, &motion).expect("conforming motion exports");
        let (skeleton2, motion2) = load_from_str(&text).expect("exported text loads");
        assert_same_hierarchy(&skeleton, &skeleton2);
        assert_frames_near(&motion, &motion2, 1e-6);
        prop_assert_eq!(motion.frame_time, motion2.frame_time);
    }

    #[test]
    fn prop_resolution_is_deterministic((skeleton, motion) in arb_animation()) {
        for frame in &motion.frames {
            let a = resolve_frame(&skeleton, frame).expect("conforming frame");
            let b = resolve_frame(&skeleton, frame).expect("conforming frame");
            prop_assert_eq!(a, b);
        }
    }
}

fn motion_only_bvh(frames: &[[i32; 3]]) -> String {
    let mut text = String::from(
        "HIERARCHY\nROOT Hips\n{\n  OFFSET 0 0 0\n  CHANNELS 3 Xposition Yposition Zposition\n}\nMOTION\n",
    );
    text.push_str(&format!("Frames: {}\nFrame Time: 0.01\n", frames.len()));
    for [x, y, z] in frames {
        text.push_str(&format!("{} {} {}\n", x, y, z));
    }
    text
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_parallel_tokenizing_keeps_line_order(
        frames in prop::collection::vec(any::<[i32; 3]>(), 1..3000),
    ) {
        let text = motion_only_bvh(&frames);
        let options = LoadOptions::default().with_parallel_threshold(0);
        let (_, motion) = load_from_str_with(&text, &options).expect("loads");
        prop_assert_eq!(motion.num_frames(), frames.len());
        for (frame, expected) in motion.frames.iter().zip(&frames) {
            let expected: Vec<f64> = expected.iter().map(|&v| f64::from(v)).collect();
            prop_assert_eq!(frame.values(), expected.as_slice());
        }
    }
}
