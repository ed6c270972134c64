//! End-to-end scenarios driving the session controller the way the
//! presentation layer would: discrete clicks, key presses and file loads.

use std::cell::Cell;
use std::rc::Rc;

use ipen::{Action, KeyEvent, ModelType, PetriError, Session};

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build place0 -> txn0 -> place1 through clicks and put one token on place0.
fn build_chain(session: &mut Session) {
    session.menu_action(Action::Place);
    session.editor_click(100.0, 100.0).unwrap();
    session.editor_click(300.0, 100.0).unwrap();
    session.menu_action(Action::Transition);
    session.editor_click(200.0, 100.0).unwrap();
    session.menu_action(Action::Arc);
    session.place_click("place0").unwrap();
    session.transition_click("txn0").unwrap();
    session.transition_click("txn0").unwrap();
    session.place_click("place1").unwrap();
    session.menu_action(Action::Token);
    session.place_click("place0").unwrap();
}

#[test]
fn edit_run_and_undo_lifecycle() {
    init_logging();
    let mut session = Session::new().unwrap();
    let renders = Rc::new(Cell::new(0u32));
    let seen = renders.clone();
    session.on_update(move || seen.set(seen.get() + 1));

    build_chain(&mut session);
    assert!(renders.get() > 0, "edits notify the presentation layer");
    let edited_revision = session.revision();

    // run: fire the chain once, watch the marking move
    session.menu_action(Action::Execute);
    assert!(session.is_running());
    assert_eq!(session.get_state(), vec![1, 0]);
    assert!(session.test_fire("txn0").ok);
    session.transition_click("txn0").unwrap();
    assert_eq!(session.get_state(), vec![0, 1]);
    assert!(!session.test_fire("txn0").ok);
    assert!(matches!(session.commit("edit"), Err(PetriError::IllegalState(_))));

    // stop: the live vector is discarded, structure untouched
    session.menu_action(Action::Execute);
    assert!(!session.is_running());
    assert_eq!(session.get_state(), vec![1, 0]);
    assert_eq!(session.revision(), edited_revision);

    // undo the token, redo it back
    session.on_key(&KeyEvent::ctrl("z")).unwrap();
    assert_eq!(session.get_state(), vec![0, 0]);
    session.on_key(&KeyEvent::ctrl("y")).unwrap();
    assert_eq!(session.get_state(), vec![1, 0]);
}

#[test]
fn upload_round_trip_restores_structure() {
    init_logging();
    let mut session = Session::new().unwrap();
    build_chain(&mut session);
    let exported = session.to_json().unwrap();

    let mut fresh = Session::new().unwrap();
    fresh.upload_file("chain.json", &exported).unwrap();
    assert_eq!(fresh.model(), session.model());
    let entry = fresh.history().get(fresh.revision()).unwrap();
    assert_eq!(entry.action, "upload chain.json");
}

#[test]
fn malformed_upload_leaves_model_untouched() {
    init_logging();
    let mut session = Session::new().unwrap();
    build_chain(&mut session);
    let places = session.model().places().len();
    let revision = session.revision();

    assert!(session.upload_file("bad.json", "{ not json").is_err());
    assert_eq!(session.model().places().len(), places);
    assert_eq!(session.revision(), revision);
}

#[test]
fn switching_to_a_restricted_kind_relevels() {
    init_logging();
    let mut session = Session::new().unwrap();
    build_chain(&mut session);
    session.menu_action(Action::Token);
    session.place_click("place0").unwrap();
    session.place_click("place0").unwrap();
    assert_eq!(session.model().place("place0").unwrap().initial, 3);

    session.set_model_type(ModelType::Workflow).unwrap();
    assert_eq!(session.model().place("place0").unwrap().initial, 1);
    assert!(session.model().arcs().iter().all(|a| a.weight == 1));

    // restricted kinds export the default capacity
    let json = session.to_json().unwrap();
    assert!(!json.contains("capacity"));
}

#[test]
fn capacity_and_inhibitor_scenarios_through_the_stream() {
    init_logging();
    let mut session = Session::new().unwrap();

    // txn0 -> place0 (capacity 1); place1 inhibits txn0 via txn1 -> place1
    session.menu_action(Action::Place);
    session.editor_click(100.0, 100.0).unwrap();
    session.editor_click(100.0, 300.0).unwrap();
    session.menu_action(Action::Transition);
    session.editor_click(300.0, 100.0).unwrap();
    session.editor_click(300.0, 300.0).unwrap();
    session.menu_action(Action::Arc);
    session.transition_click("txn0").unwrap();
    session.place_click("place0").unwrap();
    session.place_click("place1").unwrap();
    session.transition_click("txn0").unwrap();
    // the guard arc starts as a flow arc, toggle it to an inhibitor
    session.arc_click(1).unwrap();
    session.transition_click("txn1").unwrap();
    session.place_click("place1").unwrap();
    assert!(session.model().arcs()[1].inhibit);

    // capacity edit happens before running
    {
        let json = session.to_json().unwrap();
        let mut declaration: serde_json::Value = serde_json::from_str(&json).unwrap();
        declaration["places"]["place0"]["capacity"] = 1.into();
        session
            .upload_file("capped.json", &declaration.to_string())
            .unwrap();
    }

    session.menu_action(Action::Execute);
    session.transition_click("txn0").unwrap();
    assert_eq!(session.get_token_count("place0").unwrap(), 1);

    // second firing exceeds capacity: disabled, not inhibited
    let res = session.test_fire("txn0");
    assert!(!res.ok);
    assert!(!res.inhibited);

    // raising the guarded place inhibits txn0
    session.transition_click("txn1").unwrap();
    let res = session.test_fire("txn0");
    assert!(!res.ok);
    assert!(res.inhibited);
}
