use std::{thread, time::Duration};

use simparam::physics::msg::named_param_type::*;
use simparam::{
    Element, PhysicsEngine, SharedEngine, TypedValue, Vector3,
    physics::{DefaultBackend, NamedParam, PhysicsMsg, Request, UpdateHandler},
};

fn engine() -> PhysicsEngine {
    PhysicsEngine::new(DefaultBackend::new("ode")).unwrap()
}

#[test]
fn test_type_cannot_be_changed() {
    let mut engine = engine();
    assert!(!engine.set_param("type", &TypedValue::String("bullet".into())));
    assert_eq!(engine.engine_type(), "ode");
    assert_eq!(engine.get_param("type"), Some(TypedValue::String("ode".into())));
}

#[test]
fn test_untagged_int_beats_string() {
    let entry = NamedParam::new("max_contacts").with_int(3).with_string("three");
    assert_eq!(entry.decode().unwrap(), TypedValue::Int(3));
}

#[test]
fn test_batch_applies_around_bad_entry() {
    let mut engine = engine();
    let msg = PhysicsMsg::new(vec![
        NamedParam::new("max_step_size").with_double(0.002),
        NamedParam::new("gravity"),
        NamedParam::new("real_time_factor").with_kind(DOUBLE_TYPE).with_double(0.5),
    ]);
    assert_eq!(engine.on_physics_msg(&msg), 2);
    assert_eq!(engine.max_step_size(), 0.002);
    assert_eq!(engine.target_real_time_factor(), 0.5);
    assert_eq!(engine.gravity(), Vector3::new(0.0, 0.0, -9.8));
}

#[test]
fn test_batch_skips_rejected_values() {
    let mut engine = engine();
    let msg = PhysicsMsg::new(vec![
        NamedParam::new("type").with_string("bullet"),
        NamedParam::new("real_time_update_rate").with_int(500),
        NamedParam::new("solver_iters").with_int(50),
        NamedParam::new("gravity").with_vector3d(Vector3::new(0.0, 0.0, -1.62)),
    ]);
    assert_eq!(engine.on_physics_msg(&msg), 1);
    assert_eq!(engine.real_time_update_rate(), 1000.0);
    assert_eq!(engine.gravity().z, -1.62);
}

#[test]
fn test_updates_persist_into_description() {
    let mut engine = engine();
    let msg = PhysicsMsg::new(vec![
        NamedParam::new("real_time_update_rate").with_double(250.0),
        NamedParam::new("magnetic_field")
            .with_kind(VECTOR3D_TYPE)
            .with_vector3d(Vector3::ZERO),
    ]);
    engine.on_physics_msg(&msg);
    assert_eq!(engine.update_period(), 0.004);

    let sdf = engine.sdf();
    assert_eq!(sdf.get::<f64>("real_time_update_rate").unwrap(), 250.0);
    assert_eq!(sdf.get::<Vector3>("magnetic_field").unwrap(), Vector3::ZERO);
    let text = sdf.to_sdf_string();
    assert!(text.contains("<real_time_update_rate>250</real_time_update_rate>"));
    assert!(text.contains("<magnetic_field>0 0 0</magnetic_field>"));

    // A fresh engine loaded from the persisted description sees the update
    let mut reloaded = PhysicsEngine::new(DefaultBackend::new("ode")).unwrap();
    reloaded.load(sdf).unwrap();
    assert_eq!(reloaded.real_time_update_rate(), 250.0);
}

#[test]
fn test_load_from_description() {
    let sdf = Element::physics_template(None).unwrap();
    simparam::config::apply_json_overrides(
        &sdf,
        r#"{ "max_step_size": 0.01, "real_time_factor": 0, "gravity": [0, 0, -3.71] }"#,
    )
    .unwrap();

    let mut engine = engine();
    engine.load(&sdf).unwrap();
    assert_eq!(engine.max_step_size(), 0.01);
    assert_eq!(engine.target_real_time_factor(), 0.0);
    assert_eq!(
        engine.get_param("gravity"),
        Some(TypedValue::Vector3(Vector3::new(0.0, 0.0, -3.71)))
    );
}

#[test]
fn test_cdr_message_applied() {
    let msg = PhysicsMsg::new(vec![
        NamedParam::new("max_step_size").with_kind(DOUBLE_TYPE).with_double(0.005),
        NamedParam::new("gravity").with_vector3d(Vector3::new(1.0, 0.0, 0.0)),
        NamedParam::new("unknown").with_kind(BOOL_TYPE),
    ]);
    let bytes = msg.to_cdr().unwrap();
    let decoded = PhysicsMsg::from_cdr(&bytes).unwrap();
    assert_eq!(decoded, msg);

    let mut engine = engine();
    assert_eq!(engine.on_physics_msg(&decoded), 2);
    assert_eq!(engine.max_step_size(), 0.005);
}

#[test]
fn test_decode_update_message_order() {
    let msg = PhysicsMsg::new(vec![
        NamedParam::new("a").with_bool(true),
        NamedParam::new("b"),
        NamedParam::new("c").with_kind(FLOAT_TYPE),
    ]);
    let decoded: Vec<_> = PhysicsEngine::decode_update_message(&msg).collect();
    assert_eq!(
        decoded,
        [
            ("a".to_string(), TypedValue::Bool(true)),
            ("c".to_string(), TypedValue::Float(0.0)),
        ]
    );
}

#[test]
fn test_background_delivery() {
    let shared = SharedEngine::new(engine());
    let handler = shared.queue_handler();

    let producer = thread::spawn(move || {
        for i in 1..=10 {
            handler.handle(PhysicsMsg::new(vec![
                NamedParam::new("real_time_factor").with_double(i as f64),
            ]));
            thread::sleep(Duration::from_millis(1));
        }
    });
    producer.join().unwrap();

    assert_eq!(shared.process_pending(), 10);
    assert_eq!(shared.pending(), 0);
    assert_eq!(shared.lock().target_real_time_factor(), 10.0);
}

#[test]
fn test_queue_handler_after_engine_dropped() {
    let shared = SharedEngine::new(engine());
    let handler = shared.queue_handler();
    drop(shared);
    // Delivery to a closed queue is dropped quietly
    handler.handle(PhysicsMsg::default());
    assert!(matches!(handler, UpdateHandler::Queue(_)));
}

#[test]
fn test_physics_info_request() {
    let shared = SharedEngine::new(engine());
    shared.lock().set_max_step_size(0.003);
    let response = shared
        .on_request(&Request::new(1, Request::PHYSICS_INFO))
        .unwrap();
    let info = PhysicsMsg::from_cdr(&response.payload).unwrap();
    let step = info
        .parameters
        .iter()
        .find(|p| p.name == "max_step_size")
        .unwrap();
    assert_eq!(step.decode().unwrap(), TypedValue::Double(0.003));
}
