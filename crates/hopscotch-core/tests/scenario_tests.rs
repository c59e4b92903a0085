use hopscotch_core::prelude::*;
use hopscotch_core::{FrameEvent, NewTabAction, PageSignal, StitchFallback, TransitionType, UrlTypedAction};
use hopscotch_test_utils::{anchor, engine_with, node_count, setup_test_engine, url_of};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_new_branch_then_link_then_back() {
    let (engine, host) = setup_test_engine();
    let t1 = host.open(TabId(1), "Start", "https://start.com");

    let n1 = engine.on_tab_created(&t1).await.unwrap();
    assert_eq!(engine.read(|s| s.tree.parent(n1)), Some(engine.read(|s| s.tree.root())));
    assert_eq!(anchor(&engine, TabId(1)), n1);

    let outcome = engine
        .on_navigation_committed(&NavigationCommit::link(TabId(1), "https://a.com"))
        .await
        .unwrap();
    let Reconciliation::Extended(n2) = outcome else {
        panic!("expected a new child, got {outcome:?}");
    };
    assert_eq!(engine.read(|s| s.tree.parent(n2)), Some(n1));
    assert_eq!(anchor(&engine, TabId(1)), n2);

    let before = node_count(&engine);
    let outcome = engine
        .on_navigation_committed(&NavigationCommit::link(TabId(1), "https://start.com"))
        .await
        .unwrap();
    assert_eq!(outcome, Reconciliation::Receded(n1));
    assert_eq!(anchor(&engine, TabId(1)), n1);
    assert_eq!(node_count(&engine), before);
}

#[tokio::test]
async fn test_new_tab_page_collapses_into_first_navigation() {
    let (engine, host) = setup_test_engine();
    let t1 = host.open(TabId(1), "New Tab", "chrome://newtab/");
    let n1 = engine.on_tab_created(&t1).await.unwrap();
    assert_eq!(node_count(&engine), 2);

    let outcome = engine
        .on_navigation_committed(&NavigationCommit::new(TabId(1), "https://a.com", TransitionType::Typed))
        .await
        .unwrap();

    assert_eq!(outcome, Reconciliation::PlaceholderRewritten(n1));
    assert_eq!(node_count(&engine), 2);
    assert_eq!(url_of(&engine, n1).as_deref(), Some("https://a.com"));
    assert_eq!(anchor(&engine, TabId(1)), n1);
}

#[tokio::test]
async fn test_revisiting_a_child_reuses_it() {
    let (engine, host) = setup_test_engine();
    let t1 = host.open(TabId(1), "Start", "https://start.com");
    let n1 = engine.on_tab_created(&t1).await.unwrap();

    let first = engine
        .on_navigation_committed(&NavigationCommit::link(TabId(1), "https://a.com"))
        .await
        .unwrap()
        .created()
        .unwrap();
    engine
        .on_navigation_committed(&NavigationCommit::link(TabId(1), "https://start.com"))
        .await
        .unwrap();

    let before = node_count(&engine);
    let outcome = engine
        .on_navigation_committed(&NavigationCommit::link(TabId(1), "https://a.com"))
        .await
        .unwrap();

    assert_eq!(outcome, Reconciliation::Revisited(first));
    assert_eq!(node_count(&engine), before);
    assert_eq!(engine.read(|s| s.tree.children(n1).len()), 1);
}

#[tokio::test]
async fn test_sub_branch_inherits_opener_anchor() {
    let config = Config::default().with_new_tab_action(NewTabAction::SubBranch);
    let (engine, host) = engine_with(config);

    // T1 has no opener and is placed through the gate
    let t1 = host.open(TabId(1), "Start", "https://start.com");
    engine.on_tab_created(&t1).await.unwrap();
    let n2 = engine
        .on_navigation_committed(&NavigationCommit::link(TabId(1), "https://a.com"))
        .await
        .unwrap()
        .created()
        .unwrap();

    let before = node_count(&engine);
    let t2 = host.open_from(TabId(2), TabId(1), "", "https://a.com");
    let at = engine.on_tab_created(&t2).await.unwrap();
    assert_eq!(at, n2);
    assert_eq!(node_count(&engine), before);

    let outcome = engine
        .on_navigation_committed(&NavigationCommit::link(TabId(2), "https://b.com"))
        .await
        .unwrap();
    let n3 = outcome.created().unwrap();
    assert_eq!(engine.read(|s| s.tree.parent(n3)), Some(n2));
    assert_eq!(anchor(&engine, TabId(1)), n2);
}

#[tokio::test]
async fn test_sub_branch_from_lost_opener_opens_new_branch() {
    let config = Config::default()
        .with_new_tab_action(NewTabAction::SubBranch)
        .with_stitch_fallback(StitchFallback::Prompt);
    let (engine, host) = engine_with(config);

    // The opener is unknown, so the gate places it lost
    host.open(TabId(1), "Lost", "https://lost.com");
    let t2 = host.open_from(TabId(2), TabId(1), "Child", "https://child.com");
    let node = engine.on_tab_created(&t2).await.unwrap();

    engine.read(|s| {
        assert!(s.tabs.get(TabId(1)).unwrap().is_lost());
        let child = s.tabs.get(TabId(2)).unwrap();
        assert!(!child.is_lost());
        assert_eq!(child.anchor, node);
        assert_eq!(s.tree.parent(node), Some(s.tree.root()));
    });
}

#[tokio::test]
async fn test_sub_branch_with_closed_opener_falls_back() {
    let config = Config::default().with_new_tab_action(NewTabAction::SubBranch);
    let (engine, host) = engine_with(config);

    let t2 = host.open_from(TabId(2), TabId(9), "Orphan", "https://orphan.com");
    let node = engine.on_tab_created(&t2).await.unwrap();

    assert_eq!(engine.read(|s| s.tree.parent(node)), Some(engine.read(|s| s.tree.root())));
    assert_eq!(url_of(&engine, node).as_deref(), Some("https://orphan.com"));
    assert!(!engine.read(|s| s.tabs.contains(TabId(9))));
}

#[tokio::test]
async fn test_reload_never_creates_nodes() {
    let (engine, host) = setup_test_engine();
    let t1 = host.open(TabId(1), "Start", "https://start.com");
    engine.on_tab_created(&t1).await.unwrap();

    let before = node_count(&engine);
    for _ in 0..3 {
        let outcome = engine
            .on_navigation_committed(&NavigationCommit::new(TabId(1), "https://start.com", TransitionType::Reload))
            .await
            .unwrap();
        assert_eq!(outcome, Reconciliation::ReloadSuppressed);
    }
    assert_eq!(node_count(&engine), before);
}

#[tokio::test]
async fn test_typed_new_branch_starts_under_root() {
    let config = Config::default().with_url_typed_action(UrlTypedAction::NewBranch);
    let (engine, host) = engine_with(config);
    let t1 = host.open(TabId(1), "Start", "https://start.com");
    engine.on_tab_created(&t1).await.unwrap();

    let outcome = engine
        .on_navigation_committed(&NavigationCommit::new(TabId(1), "https://typed.com", TransitionType::Typed))
        .await
        .unwrap();

    let Reconciliation::Branched(node) = outcome else {
        panic!("expected a branch, got {outcome:?}");
    };
    assert_eq!(engine.read(|s| s.tree.depth(node)), Some(1));
    assert_eq!(anchor(&engine, TabId(1)), node);
}

#[tokio::test]
async fn test_lost_tab_is_asked_to_resolve_once_loaded() {
    let config = Config::default().with_new_tab_action(NewTabAction::Prompt);
    let (engine, host) = engine_with(config);
    let t1 = host.open(TabId(1), "Lost", "https://lost.com");
    engine.on_tab_created(&t1).await.unwrap();

    let sub_frame = FrameEvent {
        tab_id: TabId(1),
        frame_id: 4,
    };
    assert!(!engine.on_frame_content_loaded(sub_frame).await.unwrap());

    let top = FrameEvent {
        tab_id: TabId(1),
        frame_id: 0,
    };
    assert!(engine.on_frame_content_loaded(top).await.unwrap());
    assert_eq!(host.signals(), vec![(TabId(1), PageSignal::ResolveLocation)]);
}

#[tokio::test]
async fn test_title_updates_rename_anchor() {
    let (engine, host) = setup_test_engine();
    let t1 = host.open(TabId(1), "", "https://start.com");
    let n1 = engine.on_tab_created(&t1).await.unwrap();

    let event: BrowserEvent = serde_json::from_value(serde_json::json!({
        "type": "tabUpdated",
        "tabId": 1,
        "title": "Start page"
    }))
    .unwrap();
    engine.dispatch(&event).await.unwrap();

    let name = engine.read(|s| s.tree.node(n1).unwrap().name().map(str::to_string));
    assert_eq!(name.as_deref(), Some("Start page"));
}

#[tokio::test]
async fn test_closing_a_tab_keeps_its_history() {
    let (engine, host) = setup_test_engine();
    let t1 = host.open(TabId(1), "Start", "https://start.com");
    let n1 = engine.on_tab_created(&t1).await.unwrap();

    host.forget(TabId(1));
    assert!(engine.on_tab_removed(TabId(1)));
    assert!(!engine.on_tab_removed(TabId(1)));
    assert!(engine.read(|s| s.tree.contains(n1)));
    assert!(!engine.read(|s| s.is_retired(TabId(1))));

    let err = engine
        .on_navigation_committed(&NavigationCommit::link(TabId(1), "https://late.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TabClosed(TabId(1))));
}
