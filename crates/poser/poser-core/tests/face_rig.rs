use anyhow::Result;
use poser_core::{
    compile_all, enter_edit, evaluate, leave_edit, purge, toggle_edit, EditSession, PoseLibrary,
    PoserError, Preferences, ReportLevel, RigContext,
};
use poser_rig_core::{HostMode, MixMode, Object, ObjectKind, Scene};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn face() -> Result<(Scene, PoseLibrary)> {
    let scene: Scene = poser_test_fixtures::rigs::scene("face")?;
    let lib: PoseLibrary = poser_test_fixtures::rigs::poses("face")?.expect("face has poses");
    Ok((scene, lib))
}

fn constraint_names(scene: &Scene, bone: &str) -> Vec<String> {
    scene
        .bone("Rig", bone)
        .unwrap()
        .constraints
        .iter()
        .map(|c| c.name.clone())
        .collect()
}

#[test]
fn compile_all_builds_valid_poses_only() -> Result<()> {
    let (mut scene, lib) = face()?;
    let prefs = Preferences::default();
    let mut session = EditSession::default();
    let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);
    let report = compile_all(&mut ctx, &lib, &mut session)?;

    assert_eq!(report.count(ReportLevel::Warning), 1, "{report:?}");
    assert!(report.messages(ReportLevel::Warning)[0].contains("Broken"));
    assert_eq!(
        report.messages(ReportLevel::Info).last().copied(),
        Some("4 poses created successfully")
    );

    assert_eq!(constraint_names(&scene, "Lip.L"), ["AP-Smile.L", "AP-Open", "AP-Wide"]);
    assert_eq!(constraint_names(&scene, "Lip.R"), ["AP-Smile.R", "AP-Open"]);
    assert!(constraint_names(&scene, "Brow.L").is_empty());

    let jaw = scene.bone("Rig", "Jaw")?;
    let open = jaw.constraint("AP-Open").expect("open constraint");
    assert_eq!(open.influence, 0.8);
    assert_eq!(open.mix_mode, MixMode::After);
    assert_eq!(open.action.as_deref(), Some("AP-Open"));

    let rig = scene.object("Rig")?;
    assert_eq!(rig.animation_data.as_ref().unwrap().drivers.len(), 10);
    assert_eq!(rig.properties.len(), 5);
    Ok(())
}

#[test]
fn purge_is_idempotent_and_leaves_user_data() -> Result<()> {
    let (mut scene, lib) = face()?;
    let prefs = Preferences::default();
    let mut session = EditSession::default();
    let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);
    compile_all(&mut ctx, &lib, &mut session)?;

    let first = purge(&mut ctx)?;
    assert_eq!(first.constraints, 6);
    assert_eq!(first.drivers, 10);
    assert_eq!(first.properties, 4);
    let second = purge(&mut ctx)?;
    assert!(second.is_empty());

    let rig = scene.object("Rig")?;
    assert!(rig.animation_data.as_ref().unwrap().drivers.is_empty());
    assert_eq!(rig.properties.len(), 1);
    assert!(rig.properties.contains_key("brow"));
    Ok(())
}

#[test]
fn recompiling_reproduces_the_same_rig() -> Result<()> {
    let (mut scene, lib) = face()?;
    let prefs = Preferences::default();
    let mut session = EditSession::default();
    let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);
    compile_all(&mut ctx, &lib, &mut session)?;
    let once = ctx.scene.clone();
    compile_all(&mut ctx, &lib, &mut session)?;
    assert_eq!(*ctx.scene, once);
    Ok(())
}

#[test]
fn evaluation_blends_to_the_weakest_input() -> Result<()> {
    let (mut scene, mut lib) = face()?;
    let prefs = Preferences::default();
    let mut session = EditSession::default();
    let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);
    compile_all(&mut ctx, &lib, &mut session)?;
    let outputs = evaluate(&mut ctx, &mut lib)?;
    assert!(outputs.iter().all(|o| o.applied));

    let influence = |name: &str| lib.find(name).unwrap().influence;
    approx(influence("Smile.L"), 0.5, 1e-6);
    approx(influence("Smile.R"), 0.0, 1e-6);
    approx(influence("Open"), 0.8, 1e-6);
    approx(influence("Wide"), 0.5, 1e-6);
    approx(influence("Raise"), 0.0, 1e-6);

    let wide = scene.bone("Rig", "Lip.L")?.constraint("AP-Wide").unwrap();
    approx(wide.eval_time, 0.5, 1e-6);
    Ok(())
}

#[test]
fn action_edit_round_trip_restores_the_rig() -> Result<()> {
    let (mut scene, lib) = face()?;
    let prefs = Preferences::default();
    let mut session = EditSession::default();
    let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);
    compile_all(&mut ctx, &lib, &mut session)?;
    let before = ctx.scene.clone();

    let wide = lib.position("Wide").unwrap();
    let report = enter_edit(&mut ctx, &lib, &mut session, wide)?;
    assert!(!report.has_errors());
    assert_eq!(session.editing_pose(), Some("Wide"));
    assert!(ctx.scene.tool_settings.use_keyframe_insert_auto);
    assert_eq!(ctx.scene.object("Rig")?.active_action(), Some("AC-Wide"));
    {
        let arm = ctx.armature()?;
        assert!(arm.bones.values().all(|b| b.transform.is_identity()));
        let lip = &arm.bones["Lip.L"];
        assert!(lip
            .constraints
            .iter()
            .filter(|c| c.name.starts_with("AP-"))
            .all(|c| !c.enabled));
        let temp: Vec<(&str, f32)> = lip
            .constraints
            .iter()
            .filter(|c| c.name.starts_with("AP_TEMP-"))
            .map(|c| (c.name.as_str(), c.eval_time))
            .collect();
        assert_eq!(temp, [("AP_TEMP-Smile.L", 1.0), ("AP_TEMP-Open", 1.0)]);
        assert_eq!(arm.bones["Jaw"].constraints.len(), 2);
    }
    assert_eq!(
        enter_edit(&mut ctx, &lib, &mut session, wide),
        Err(PoserError::AlreadyEditing)
    );

    leave_edit(&mut ctx, &mut session)?;
    assert!(!session.is_editing());
    assert_eq!(ctx.scene.objects, before.objects);
    assert_eq!(ctx.scene.tool_settings, before.tool_settings);
    assert_eq!(ctx.scene.active_object, before.active_object);
    assert_eq!(
        ctx.scene.action("AC-Wide").unwrap().id_root,
        Some(ObjectKind::Armature)
    );
    assert_eq!(
        leave_edit(&mut ctx, &mut session),
        Err(PoserError::NotEditing)
    );
    Ok(())
}

#[test]
fn leaving_edit_returns_to_the_original_active_object() -> Result<()> {
    let (mut scene, lib) = face()?;
    let prefs = Preferences::default();
    let mut session = EditSession::default();
    let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);
    compile_all(&mut ctx, &lib, &mut session)?;
    let before = ctx.scene.clone();

    enter_edit(&mut ctx, &lib, &mut session, lib.position("Wide").unwrap())?;
    ctx.scene.switch_active_object("Mesh")?;
    assert_eq!(ctx.scene.mode, HostMode::Object);

    let report = leave_edit(&mut ctx, &mut session)?;
    assert!(!report.has_errors(), "{report:?}");
    assert_eq!(ctx.scene.active_object.as_deref(), Some("Rig"));
    assert_eq!(ctx.scene.mode, HostMode::Pose);
    assert_eq!(ctx.scene.objects, before.objects);
    assert_eq!(ctx.scene.tool_settings, before.tool_settings);
    Ok(())
}

#[test]
fn missing_original_active_object_still_restores_the_rig() -> Result<()> {
    let (mut scene, lib) = face()?;
    scene.add_object("Helper", Object::new(ObjectKind::Empty));
    scene.active_object = Some("Helper".into());
    let prefs = Preferences::default();
    let mut session = EditSession::default();
    let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);
    compile_all(&mut ctx, &lib, &mut session)?;
    let before = ctx.scene.clone();

    enter_edit(&mut ctx, &lib, &mut session, lib.position("Wide").unwrap())?;
    ctx.scene.objects.shift_remove("Helper");
    ctx.scene.active_object = None;

    let report = leave_edit(&mut ctx, &mut session)?;
    assert!(report.has_errors());
    assert!(report.messages(ReportLevel::Error)[0].contains("Helper"));
    assert!(!session.is_editing());
    assert_eq!(ctx.scene.object("Rig")?, before.object("Rig")?);
    assert_eq!(ctx.scene.tool_settings, before.tool_settings);
    let arm = ctx.armature()?;
    assert!(arm
        .bones
        .values()
        .flat_map(|b| &b.constraints)
        .all(|c| c.enabled && !c.name.starts_with("AP_TEMP-")));
    Ok(())
}

#[test]
fn failed_action_assignment_is_reported_not_fatal() -> Result<()> {
    let (mut scene, mut lib) = face()?;
    lib.poses[0].action = Some("MeshWobble".into());
    let prefs = Preferences::default();
    let mut session = EditSession::default();
    let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);

    let report = toggle_edit(&mut ctx, &lib, &mut session, 0)?;
    assert!(report.has_errors());
    assert!(session.is_editing());
    assert_eq!(ctx.scene.object("Rig")?.active_action(), None);

    toggle_edit(&mut ctx, &lib, &mut session, 0)?;
    assert!(!session.is_editing());
    Ok(())
}

#[test]
fn compile_all_leaves_action_edit_first() -> Result<()> {
    let (mut fresh, lib) = face()?;
    let prefs = Preferences::default();
    let mut session = EditSession::default();
    compile_all(&mut RigContext::new(&mut fresh, "Rig", &prefs), &lib, &mut session)?;

    let (mut scene, _) = face()?;
    let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);
    enter_edit(&mut ctx, &lib, &mut session, 2)?;
    let report = compile_all(&mut ctx, &lib, &mut session)?;
    assert!(!session.is_editing());
    assert!(report
        .messages(ReportLevel::Info)
        .iter()
        .any(|m| m.contains("action edit disabled")));
    assert_eq!(ctx.scene.objects, fresh.objects);
    Ok(())
}

#[test]
fn mirror_of_left_pose_matches_authored_right_pose() -> Result<()> {
    let (scene, mut lib) = face()?;
    let prefs = Preferences::default();
    let at = lib.mirror(0, &scene, "Rig", &prefs)?;
    assert_eq!(at, 1);
    assert_eq!(lib.index, 1);

    let mut mirrored = lib.poses[1].clone();
    assert_eq!(mirrored.name, "Smile.R.001");
    mirrored.name = "Smile.R".into();
    assert_eq!(&mirrored, lib.find("Smile.R").unwrap());
    Ok(())
}

#[test]
fn build_flag_and_validity_gate_compilation() -> Result<()> {
    let (mut scene, mut lib) = face()?;
    for pose in lib.poses.iter_mut() {
        pose.build = pose.name == "Raise" || pose.name == "Broken";
    }
    let prefs = Preferences::default();
    let mut session = EditSession::default();
    let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);
    let report = compile_all(&mut ctx, &lib, &mut session)?;
    assert_eq!(report.count(ReportLevel::Warning), 1);
    assert_eq!(constraint_names(&scene, "Brow.L"), ["AP-Raise"]);
    assert_eq!(constraint_names(&scene, "Brow.R"), ["AP-Raise"]);
    assert!(constraint_names(&scene, "Jaw").is_empty());
    Ok(())
}
