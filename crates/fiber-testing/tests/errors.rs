use fiber_core::{
    component, Element, HookError, Hooks, PropValue, Props, RenderError, RootOptions,
};
use fiber_testing::prelude::*;

fn page(items: &[&str]) -> Element {
    Element::host("div")
        .children(items.iter().map(|item| Element::host(*item).child(*item)))
        .build()
}

fn shifting_state(hooks: &mut Hooks<'_>, props: &Props) -> Element {
    if props.get_int("variant") == Some(1) {
        let (label, _) = hooks.use_state(String::from("text"));
        Element::text(label)
    } else {
        let (count, _) = hooks.use_state(0_i64);
        Element::text(count)
    }
}

fn sometimes_two(hooks: &mut Hooks<'_>, props: &Props) -> Element {
    hooks.use_state(0_i64);
    if props.get_int("extra") == Some(1) {
        hooks.use_state(0_i64);
    }
    Element::text(hooks.hook_index() as i64)
}

fn always_dirty(hooks: &mut Hooks<'_>, _props: &Props) -> Element {
    let (count, set_count) = hooks.use_state(0_i64);
    set_count.set(count + 1);
    Element::text(count)
}

#[test]
fn create_failure_aborts_without_touching_the_host() {
    let mut harness = RootHarness::failing(|host| host.fail_create("em"));
    harness.set_content(page(&["p"])).unwrap();
    let before = harness.dump();

    let err = harness.set_content(page(&["p", "em"])).unwrap_err();
    assert!(matches!(err, RenderError::Host(ref host) if host.operation == "create_node"));
    assert_eq!(harness.dump(), before);
    assert!(!harness.root().has_pending_work());
    assert_eq!(
        harness.root().fiber_count(),
        harness.root().committed_fiber_count() + 1
    );

    harness.host_mut().heal();
    harness.set_content(page(&["p", "em"])).unwrap();
    assert_eq!(harness.host().memory().text_content(0), "pem");
}

#[test]
fn commit_failure_keeps_the_committed_tree_as_baseline() {
    let mut harness = RootHarness::failing(|host| host);
    harness.set_content(page(&["p"])).unwrap();
    let committed = harness.root().committed_fiber_count();

    harness.host_mut().inject_failure("insert_child");
    let err = harness.set_content(page(&["p", "b"])).unwrap_err();
    assert!(matches!(err, RenderError::Host(ref host) if host.operation == "insert_child"));
    assert_eq!(harness.root().committed_fiber_count(), committed);
    assert!(harness.root().last_commit().is_some());

    harness.host_mut().heal();
    harness.set_content(page(&["p", "b"])).unwrap();
    assert_eq!(harness.host().memory().text_content(0), "pb");
    assert_eq!(harness.root().committed_fiber_count(), committed + 2);
}

#[test]
fn failed_commit_after_a_deletion_leaves_the_root_usable() {
    let mut harness = RootHarness::failing(|host| host);
    harness.set_content(page(&["p", "b"])).unwrap();

    harness.host_mut().inject_failure("insert_child");
    let err = harness.set_content(page(&["p", "em"])).unwrap_err();
    assert!(matches!(err, RenderError::Host(ref host) if host.operation == "insert_child"));
    // the deletion reached the host before the insert failed
    assert_eq!(harness.host().memory().text_content(0), "p");
    assert!(!harness.root().has_pending_work());

    harness.host_mut().heal();
    harness.set_content(page(&["p", "em"])).unwrap();
    assert_eq!(harness.host().memory().text_content(0), "pem");

    harness.set_content(page(&["p"])).unwrap();
    assert_eq!(
        harness.dump(),
        concat!(
            "[0] <root>\n",
            "  [1] <div>\n",
            "    [2] <p>\n",
            "      [3] \"p\"\n",
        )
    );
}

#[test]
fn failed_commit_undoes_its_placements_and_updates() {
    let content = |title: &str, items: &[&str]| {
        Element::host("div")
            .attr("title", title)
            .children(items.iter().map(|item| Element::host(*item).child(*item)))
            .build()
    };
    let mut harness = RootHarness::failing(|host| host);
    harness.set_content(content("old", &["p"])).unwrap();
    let before = harness.dump();

    harness.host_mut().inject_failure_after("insert_child", 1);
    let err = harness
        .set_content(content("new", &["p", "b", "em"]))
        .unwrap_err();
    assert!(matches!(err, RenderError::Host(ref host) if host.operation == "insert_child"));
    assert_eq!(harness.dump(), before);
    // b, em and their text nodes were created for the abandoned pass
    assert_eq!(harness.host_mut().memory_mut().collect_detached(), 4);

    harness.host_mut().heal();
    harness
        .set_content(content("new", &["p", "b", "em"]))
        .unwrap();
    let div = harness.host().memory().find_all(0, "div")[0];
    assert_eq!(
        harness.host().memory().node(div).unwrap().property("title"),
        Some(&PropValue::from("new"))
    );
    assert_eq!(harness.host().memory().text_content(0), "pbem");
}

#[test]
fn malformed_child_fails_fast() {
    let mut harness = RootHarness::new();
    harness.set_content(page(&["p", "span"])).unwrap();
    let before = harness.dump();

    let err = harness.set_content(page(&["p", " ", "span"])).unwrap_err();
    assert!(matches!(
        err,
        RenderError::MalformedElement { position: 1, .. }
    ));
    assert_eq!(harness.dump(), before);
}

#[test]
fn state_type_change_is_a_hook_error() {
    let mut harness = RootHarness::new();
    let element = |variant: i64| {
        Element::component(component!(shifting_state))
            .attr("variant", variant)
            .build()
    };
    harness.set_content(element(0)).unwrap();

    let err = harness.set_content(element(1)).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Hook(HookError::TypeMismatch { index: 0, .. })
    ));
    assert_eq!(harness.text(), "0");
}

#[test]
fn conditional_hook_is_a_hook_error() {
    let mut harness = RootHarness::new();
    let element = |extra: i64| {
        Element::component(component!(sometimes_two))
            .attr("extra", extra)
            .build()
    };
    harness.set_content(element(0)).unwrap();
    assert_eq!(harness.text(), "1");

    let err = harness.set_content(element(1)).unwrap_err();
    assert_eq!(
        err,
        RenderError::Hook(HookError::CountMismatch {
            component: "sometimes_two",
            previous: 1,
            current: 2,
        })
    );
    assert!(err.to_string().contains("sometimes_two"));
}

#[test]
fn unconditional_set_state_is_a_render_loop() {
    let mut harness = RootHarness::with_options(RootOptions {
        max_restarts: 3,
        ..RootOptions::default()
    });
    let err = harness
        .set_content(Element::component(component!(always_dirty)).build())
        .unwrap_err();
    assert_eq!(err, RenderError::RenderLoop { restarts: 4 });
    assert_eq!(harness.dump(), "[0] <root>\n");
    assert!(!harness.root().has_pending_work());
}

#[test]
fn setters_outliving_their_root_are_inert() {
    let handle = run_test_root(|harness| {
        harness.set_content(page(&["p"])).unwrap();
        harness.render_handle()
    });
    assert!(!handle.is_attached());
    handle.request_render();
}

#[test]
fn failing_host_counts_injected_failures() {
    let mut harness = RootHarness::failing(|host| host.fail_create("#text"));
    assert!(harness.set_content(page(&["p"])).is_err());
    assert_eq!(harness.host().failures(), 1);
}
