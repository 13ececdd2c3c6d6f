use form_builder::engine::error::SessionError;
use form_builder::engine::resolver::{ParentValue, SkipReason};
use form_builder::engine::session::{
    BeginOutcome, EmptyHint, FormSession, LoadStatus, ResolutionOutcome,
};
use form_builder::engine::transport::{MockReply, MockTransport};
use form_builder::schema::field_model::{DataSource, FieldOption};
use form_builder::trace::logger::TraceLogger;
use serde_json::{Value, json};

mod common;

use common::{COUNTRIES_URL, chain_url, cities_url, states_url};

// =========================================================================
// Helpers
// =========================================================================

fn mounted_geo(transport: &MockTransport) -> FormSession<&MockTransport> {
    let mut session = FormSession::new(common::geo_schema(), transport).unwrap();
    session.mount();
    session
}

fn option_values(session: &FormSession<&MockTransport>, field_id: &str) -> Vec<String> {
    session
        .options(field_id)
        .iter()
        .map(|o| o.value.clone())
        .collect()
}

// =========================================================================
// Initial load
// =========================================================================

#[test]
fn mount_resolves_independent_fields_only() {
    let transport = common::geo_transport();
    let mut session = FormSession::new(common::geo_schema(), &transport).unwrap();

    let outcomes = session.mount();

    assert_eq!(
        outcomes,
        vec![ResolutionOutcome::Loaded {
            field_id: "f_country".into(),
            count: 2
        }]
    );
    assert_eq!(transport.call_count(), 1);
    assert_eq!(transport.calls_to(COUNTRIES_URL), 1);
    assert_eq!(option_values(&session, "f_country"), ["1", "2"]);
    assert_eq!(session.status("f_state"), LoadStatus::Idle);
    assert_eq!(session.empty_hint("f_state"), Some(EmptyHint::AwaitingParent));
    assert_eq!(session.empty_hint("f_country"), None);
}

#[test]
fn mount_fetches_all_remote_fields_and_isolates_failures() {
    let api = |id: &str, url: &str| {
        json!({
            "id": id, "type": "select", "name": id,
            "apiDataSource": { "type": "api", "endpoint": url, "labelKey": "name", "valueKey": "id" }
        })
    };
    let schema = common::schema_from(json!({
        "id": "form_many",
        "name": "Many",
        "fields": [
            api("one", "https://api.test/one"),
            api("two", "https://api.test/two"),
            api("three", "https://api.test/three"),
            {
                "id": "fixed", "type": "radio", "name": "fixed",
                "apiDataSource": { "type": "static", "staticData": [{ "label": "A", "value": "a" }] }
            }
        ]
    }));
    let transport = MockTransport::new()
        .with_json("https://api.test/one", json!([{ "id": 1, "name": "One" }]))
        .with_reply("https://api.test/two", MockReply::Fail("connection refused".into()))
        .with_json(
            "https://api.test/three",
            json!([{ "id": 3, "name": "Three" }, { "id": 4, "name": "Four" }]),
        );
    let mut session = FormSession::new(schema, &transport).unwrap();

    let outcomes = session.mount();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(transport.call_count(), 3);
    assert!(matches!(&outcomes[0], ResolutionOutcome::Loaded { count: 1, .. }));
    assert!(matches!(&outcomes[1], ResolutionOutcome::Failed { field_id, .. } if field_id == "two"));
    assert!(matches!(&outcomes[2], ResolutionOutcome::Loaded { count: 2, .. }));

    assert_eq!(session.status("two"), LoadStatus::Failed);
    assert!(session.options("two").is_empty());
    assert_eq!(session.empty_hint("two"), Some(EmptyHint::Failed));
    assert_eq!(session.status("fixed"), LoadStatus::Loaded);
    assert_eq!(session.options("fixed"), [FieldOption::new("A", "a")]);
}

// =========================================================================
// Cascade
// =========================================================================

#[test]
fn selecting_parent_resolves_direct_child_only() {
    let transport = common::geo_transport();
    let mut session = mounted_geo(&transport);

    let report = session.select("f_country", "1").unwrap();

    assert_eq!(report.reset, ["f_state", "f_city"]);
    assert_eq!(
        report.outcomes,
        vec![ResolutionOutcome::Loaded {
            field_id: "f_state".into(),
            count: 2
        }]
    );
    assert_eq!(option_values(&session, "f_state"), ["10", "11"]);
    assert_eq!(transport.calls_to(&states_url("1")), 1);
    assert_eq!(transport.calls_to(&cities_url("10")), 0);
    assert_eq!(session.status("f_city"), LoadStatus::Idle);
    assert_eq!(session.empty_hint("f_city"), Some(EmptyHint::AwaitingParent));
    assert_eq!(session.value("country"), Some(&json!("1")));
}

#[test]
fn reselecting_same_parent_value_keeps_child_untouched() {
    let transport = common::geo_transport();
    let mut session = mounted_geo(&transport);
    session.select("f_country", "1").unwrap();
    session.select("f_state", "11").unwrap();

    let report = session.select("f_country", "1").unwrap();

    assert_eq!(report.untouched, ["f_state"]);
    assert!(report.reset.is_empty());
    assert!(report.outcomes.is_empty());
    assert_eq!(transport.calls_to(&states_url("1")), 1);
    assert_eq!(option_values(&session, "f_state"), ["10", "11"]);
    assert_eq!(session.value("state"), Some(&json!("11")));
    assert_eq!(option_values(&session, "f_city"), ["110", "111"]);
}

#[test]
fn changing_root_resets_exactly_the_descendant_subtree() {
    let transport = common::chain_transport();
    let mut session = FormSession::new(common::chain_schema(), &transport).unwrap();
    session.mount();
    session
        .change_value("e", Value::String("kept".into()), None)
        .unwrap();

    session.select("a", "1").unwrap();
    session.select("b", "b1").unwrap();
    session.select("c", "c1").unwrap();
    session.select("d", "d1").unwrap();
    assert_eq!(session.value("d"), Some(&json!("d1")));

    let report = session.select("a", "2").unwrap();

    assert_eq!(report.reset, ["b", "c", "d"]);
    for id in ["b", "c", "d"] {
        assert_eq!(session.value(id), None, "{} should be cleared", id);
        assert!(session.selection(id).is_none());
    }
    assert_eq!(session.value("e"), Some(&json!("kept")));
    assert_eq!(option_values(&session, "b"), ["b2"]);
    assert!(session.options("c").is_empty());
    assert!(session.options("d").is_empty());
    assert_eq!(transport.calls_to(&chain_url("b", "2")), 1);
    assert_eq!(transport.calls_to(&chain_url("c", "b2")), 0);
}

#[test]
fn changing_root_forgets_load_state_of_whole_subtree() {
    let transport = common::chain_transport();
    let mut session = FormSession::new(common::chain_schema(), &transport).unwrap();
    session.mount();
    session.select("a", "1").unwrap();
    session.select("b", "b1").unwrap();
    session.select("c", "c1").unwrap();
    assert!(!session.load_state().should_load("d", "c1"));

    session.select("a", "2").unwrap();

    let state = session.load_state();
    assert!(!state.should_load("b", "2"));
    assert!(state.should_load("b", "1"));
    assert!(state.should_load("c", "b1"));
    assert!(state.should_load("d", "c1"));

    session.select("a", "1").unwrap();
    session.select("b", "b1").unwrap();
    assert_eq!(transport.calls_to(&chain_url("b", "1")), 2);
    assert_eq!(transport.calls_to(&chain_url("c", "b1")), 2);
}

#[test]
fn no_duplicate_fetch_for_same_field_and_parent_value() {
    let transport = common::chain_transport();
    let mut session = FormSession::new(common::chain_schema(), &transport).unwrap();
    session.mount();

    for _ in 0..3 {
        session.select("a", "1").unwrap();
    }
    session.select("b", "b1").unwrap();
    session.select("b", "b1").unwrap();

    assert_eq!(transport.calls_to(&chain_url("b", "1")), 1);
    assert_eq!(transport.calls_to(&chain_url("c", "b1")), 1);
    assert_eq!(transport.call_count(), 2);
}

#[test]
fn clearing_parent_resets_children_without_fetching() {
    let transport = common::geo_transport();
    let mut session = mounted_geo(&transport);
    session.select("f_country", "1").unwrap();
    let calls = transport.call_count();

    let report = session
        .change_value("f_country", Value::String(String::new()), None)
        .unwrap();

    assert_eq!(report.reset, ["f_state", "f_city"]);
    assert_eq!(
        report.skipped,
        vec![("f_state".to_string(), SkipReason::MissingParentValue)]
    );
    assert_eq!(transport.call_count(), calls);
    assert!(session.options("f_state").is_empty());
    assert_eq!(session.empty_hint("f_state"), Some(EmptyHint::AwaitingParent));
}

#[test]
fn parent_value_prefers_configured_key_on_raw_item() {
    let mut schema = common::geo_schema();
    schema.update_field("f_state", |field| {
        if let Some(DataSource::Dependency(dep)) = field.data_source.as_mut() {
            dep.dependency_value_key = Some("code".to_string());
        }
    });
    let transport = common::geo_transport()
        .with_json(&states_url("IN"), json!([{ "id": 10, "name": "Kerala" }]));
    let mut session = FormSession::new(schema, &transport).unwrap();
    session.mount();

    session.select("f_country", "1").unwrap();

    assert_eq!(session.parent_value_for("f_state").unwrap(), ParentValue::single("IN"));
    assert_eq!(transport.calls_to(&states_url("IN")), 1);
    assert_eq!(transport.calls_to(&states_url("1")), 0);
}

#[test]
fn parent_value_falls_back_to_committed_value() {
    let transport = common::geo_transport()
        .with_json(&states_url("7"), json!([{ "id": 70, "name": "Elsewhere" }]));
    let mut session = mounted_geo(&transport);

    // 7 is not among the loaded options, so there is no selection to read from.
    session.change_value("f_country", json!(7), None).unwrap();

    assert!(session.selection("f_country").is_none());
    assert_eq!(session.parent_value_for("f_state").unwrap(), ParentValue::single("7"));
    assert_eq!(option_values(&session, "f_state"), ["70"]);

    session.change_value("f_country", json!("1"), None).unwrap();
    assert!(session.selection("f_country").is_some());
    assert_eq!(option_values(&session, "f_state"), ["10", "11"]);
}

#[test]
fn multi_parent_field_waits_for_every_parent() {
    let schema = common::schema_from(json!({
        "id": "form_multi",
        "name": "Multi",
        "fields": [
            { "id": "x", "type": "text", "name": "x" },
            { "id": "y", "type": "text", "name": "y" },
            {
                "id": "z", "type": "select", "name": "z",
                "apiDataSource": {
                    "type": "dependency",
                    "dependsOn": ["x", "y"],
                    "dependencyEndpoint": "https://api.test/z?ids={value}",
                    "labelKey": "name", "valueKey": "id"
                }
            }
        ]
    }));
    let transport =
        MockTransport::new().with_json("https://api.test/z?ids=5,9", json!([{ "id": "z1", "name": "Z" }]));
    let mut session = FormSession::new(schema, &transport).unwrap();
    session.mount();

    let first = session.change_value("x", json!("5"), None).unwrap();
    assert_eq!(first.skipped, vec![("z".to_string(), SkipReason::MissingParentValue)]);
    assert_eq!(transport.call_count(), 0);

    session.change_value("y", json!("9"), None).unwrap();
    assert_eq!(transport.calls_to("https://api.test/z?ids=5,9"), 1);
    assert_eq!(option_values(&session, "z"), ["z1"]);
}

#[test]
fn unknown_field_is_an_error() {
    let transport = common::geo_transport();
    let mut session = mounted_geo(&transport);

    let err = session.select("nope", "1").unwrap_err();
    assert!(matches!(err, SessionError::UnknownField(ref id) if id == "nope"));
}

// =========================================================================
// Stale results, failure, retry
// =========================================================================

#[test]
fn stale_completion_is_discarded() {
    let transport = common::geo_transport();
    let mut session = mounted_geo(&transport);

    let Ok(BeginOutcome::Pending(first)) =
        session.begin_resolution("f_state", Some(&ParentValue::single("1")))
    else {
        panic!("Expected pending resolution");
    };
    let Ok(BeginOutcome::Pending(second)) =
        session.begin_resolution("f_state", Some(&ParentValue::single("2")))
    else {
        panic!("Expected pending resolution");
    };
    assert!(session.is_loading("f_state"));
    assert!(second.generation > first.generation);

    let latest = session.complete_resolution(second, Ok(vec![FieldOption::new("Bagmati", "20")]));
    let stale = session.complete_resolution(first, Ok(vec![FieldOption::new("Kerala", "10")]));

    assert!(matches!(latest, ResolutionOutcome::Loaded { count: 1, .. }));
    assert!(matches!(stale, ResolutionOutcome::Discarded { .. }));
    assert_eq!(option_values(&session, "f_state"), ["20"]);
    assert_eq!(session.status("f_state"), LoadStatus::Loaded);
}

#[test]
fn reset_makes_in_flight_results_stale() {
    let transport = common::geo_transport();
    let mut session = mounted_geo(&transport);
    let Ok(BeginOutcome::Pending(pending)) =
        session.begin_resolution("f_state", Some(&ParentValue::single("1")))
    else {
        panic!("Expected pending resolution");
    };

    session.reset();
    let outcome = session.complete_resolution(pending, Ok(vec![FieldOption::new("Kerala", "10")]));

    assert!(matches!(outcome, ResolutionOutcome::Discarded { .. }));
    assert!(session.options("f_state").is_empty());
    assert!(session.load_state().is_empty());
}

#[test]
fn failed_fetch_can_be_retried_by_reselecting() {
    let transport = common::geo_transport()
        .with_reply(&states_url("2"), MockReply::Fail("timeout".into()));
    let mut session = mounted_geo(&transport);

    let report = session.select("f_country", "2").unwrap();
    assert!(matches!(&report.outcomes[0], ResolutionOutcome::Failed { .. }));
    assert_eq!(session.status("f_state"), LoadStatus::Failed);
    assert!(session.options("f_state").is_empty());
    assert!(session.load_state().should_load("f_state", "2"));

    transport.route(
        &states_url("2"),
        MockReply::Json {
            status: 200,
            body: json!([{ "id": 20, "name": "Bagmati" }]),
        },
    );
    let retry = session.select("f_country", "2").unwrap();

    assert!(matches!(&retry.outcomes[0], ResolutionOutcome::Loaded { count: 1, .. }));
    assert_eq!(transport.calls_to(&states_url("2")), 2);
    assert_eq!(option_values(&session, "f_state"), ["20"]);
}

// =========================================================================
// Lifecycle
// =========================================================================

#[test]
fn clear_values_keeps_independent_options() {
    let transport = common::geo_transport();
    let mut session = mounted_geo(&transport);
    session.select("f_country", "1").unwrap();
    session.select("f_state", "10").unwrap();

    session.clear_values();

    assert!(session.values().is_empty());
    assert_eq!(option_values(&session, "f_country"), ["1", "2"]);
    assert!(session.options("f_state").is_empty());
    assert!(session.options("f_city").is_empty());
    assert_eq!(session.status("f_city"), LoadStatus::Idle);
}

#[test]
fn replace_schema_rebuilds_graph() {
    let transport = common::geo_transport();
    let mut session = mounted_geo(&transport);
    session.select("f_country", "1").unwrap();

    let mut edited = common::geo_schema();
    edited.remove_field("f_country");
    session.replace_schema(edited).unwrap();

    assert!(!session.graph().has_parents("f_state"));
    assert!(session.values().is_empty());
    assert!(session.schema().field("f_country").is_none());
}

#[test]
fn tracer_records_resolution_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");
    let transport = common::geo_transport();
    let mut session = FormSession::new(common::geo_schema(), &transport)
        .unwrap()
        .with_tracer(TraceLogger::new(path.to_str().unwrap()));

    session.mount();
    session.select("f_country", "1").unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let events: Vec<Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let statuses: Vec<&str> = events.iter().map(|e| e["status"].as_str().unwrap()).collect();

    assert_eq!(statuses, ["loading", "loaded", "loading", "loaded"]);
    assert_eq!(events[3]["field_id"], "f_state");
    assert_eq!(events[3]["parent_value"], "1");
    assert_eq!(events[3]["option_count"], 2);
}

#[test]
fn two_phase_resolution_can_run_outside_change_value() {
    let transport = common::geo_transport();
    let mut session = mounted_geo(&transport);

    let outcome = session
        .begin_resolution("f_city", Some(&ParentValue::single("11")))
        .unwrap();
    let BeginOutcome::Pending(pending) = outcome else {
        panic!("Expected pending resolution");
    };
    assert_eq!(pending.request.url, cities_url("11"));
    assert_eq!(session.empty_hint("f_city"), Some(EmptyHint::Loading));

    let result = session.execute(&pending);
    let applied = session.complete_resolution(pending, result);

    assert!(matches!(applied, ResolutionOutcome::Loaded { count: 2, .. }));
    assert_eq!(option_values(&session, "f_city"), ["110", "111"]);
}
