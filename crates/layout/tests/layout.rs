use graphlens_layout::analytic::{radial, radial_levels};
use graphlens_layout::*;
use tracing_test::traced_test;

fn tree() -> (Vec<Node>, Vec<Edge>) {
    let mut nodes = vec![Node::new("root", "router")];
    let mut edges = Vec::new();
    for i in 0..3 {
        let child = format!("c{i}");
        nodes.push(Node::new(&child, "switch").with_subgraph("dc1"));
        edges.push(Edge::new(format!("root-{child}"), "root", &child));
        for j in 0..2 {
            let leaf = format!("c{i}-l{j}");
            nodes.push(Node::new(&leaf, "server").with_subgraph("dc1"));
            edges.push(Edge::new(format!("{child}-{leaf}"), &child, &leaf));
        }
    }
    nodes.push(Node::new("island-1", "server"));
    nodes.push(Node::new("island-2", "server"));
    (nodes, edges)
}

fn positions(dispatcher: &LayoutDispatcher) -> Vec<(String, Position)> {
    let mut out: Vec<_> = dispatcher
        .cache()
        .iter()
        .map(|(id, p)| (id.to_string(), p))
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

#[test]
fn test_analytic_layouts_are_deterministic() {
    let (nodes, edges) = tree();
    for mode in [
        LayoutMode::Circle,
        LayoutMode::Radial,
        LayoutMode::Hierarchy,
        LayoutMode::Fast,
    ] {
        let run = || {
            let mut dispatcher = LayoutDispatcher::new(LayoutSettings::default()).unwrap();
            dispatcher
                .activate(mode, nodes.clone(), edges.clone(), Dimensions::default())
                .unwrap();
            positions(&dispatcher)
        };
        let first = run();
        assert_eq!(first.len(), nodes.len(), "{mode}");
        assert_eq!(first, run(), "{mode}");
    }
}

#[test]
fn test_every_layout_ends_finite() {
    let (nodes, edges) = tree();
    let mut dispatcher = LayoutDispatcher::new(LayoutSettings::default()).unwrap();
    for mode in LayoutMode::ALL {
        dispatcher
            .activate(mode, nodes.clone(), edges.clone(), Dimensions::default())
            .unwrap();
        dispatcher.run_until_settled(1_000);
        assert_eq!(dispatcher.cache().len(), nodes.len(), "{mode}");
        assert!(
            dispatcher.cache().iter().all(|(_, p)| p.is_finite()),
            "{mode} produced a non-finite position"
        );
    }
}

#[test]
fn test_radial_ring_matches_bfs_depth() {
    let (mut nodes, edges) = tree();
    let levels = radial_levels(&nodes, &edges).unwrap();
    assert_eq!(nodes[levels.hub].id, "root");

    let dims = Dimensions::default();
    radial(&mut nodes, &edges, dims, &RadialConfig::default());
    let center = dims.center();
    let distance = |i: usize| nodes[i].position.unwrap().distance(&center);

    let mut ring_radius = vec![None::<f64>; levels.deepest() + 1];
    for (i, level) in levels.levels.iter().enumerate() {
        let Some(level) = *level else { continue };
        let d = distance(i);
        match ring_radius[level] {
            Some(r) => assert!((r - d).abs() < 1e-9, "{} off its ring", nodes[i].id),
            None => ring_radius[level] = Some(d),
        }
    }
    let radii: Vec<f64> = ring_radius.into_iter().flatten().collect();
    assert!(radii.windows(2).all(|w| w[0] < w[1]));

    let outermost = radii.last().copied().unwrap_or(0.0);
    for (i, level) in levels.levels.iter().enumerate() {
        if level.is_none() {
            assert!(distance(i) > outermost, "{} not outside", nodes[i].id);
        }
    }
}

#[test]
fn test_malformed_edge_is_ignored() {
    let mut nodes: Vec<Node> = (0..9).map(|i| Node::new(format!("n{i}"), "t")).collect();
    nodes.push(Node::new("a", "t"));
    let mut edges: Vec<Edge> = (1..9)
        .map(|i| Edge::new(format!("e{i}"), "n0", format!("n{i}")))
        .collect();
    edges.push(Edge::new("bad", "a", "zzz"));

    assert_eq!(GraphIndex::new(&nodes, &edges).dropped_edges(), 1);

    for mode in LayoutMode::ALL {
        let mut dispatcher = LayoutDispatcher::new(LayoutSettings::default()).unwrap();
        dispatcher
            .activate(mode, nodes.clone(), edges.clone(), Dimensions::default())
            .unwrap();
        dispatcher.run_until_settled(300);
        assert!(dispatcher.cache().get("zzz").is_none());
        assert!(dispatcher.cache().iter().all(|(_, p)| p.is_finite()));
    }
}

#[test]
fn test_open_ord_finishes_its_schedule() {
    let (nodes, edges) = tree();
    let mut settings = LayoutSettings::default();
    for stage in &mut settings.open_ord.schedule {
        stage.iterations = 10;
    }
    let mut dispatcher = LayoutDispatcher::new(settings).unwrap();
    dispatcher
        .activate(LayoutMode::OpenOrd, nodes, edges, Dimensions::default())
        .unwrap();
    let frames = dispatcher.run_until_settled(10_000);
    assert_eq!(frames, 50);
    assert!(!dispatcher.is_running());
}

#[test]
fn test_settings_from_json() {
    let settings: LayoutSettings = serde_json::from_str(
        r#"{ "seed": 7, "force": { "charge": 120.0 }, "open_ord": { "edge_cutoff": 0.5 } }"#,
    )
    .unwrap();
    assert_eq!(settings.seed, 7);
    assert_eq!(settings.force.charge, 120.0);
    assert_eq!(settings.force.link_distance_intra, 60.0);
    assert_eq!(settings.open_ord.edge_cutoff, 0.5);
    assert_eq!(settings.open_ord.schedule.len(), 5);

    let broken: LayoutSettings =
        serde_json::from_str(r#"{ "open_ord": { "edge_cutoff": 3.0 } }"#).unwrap();
    assert!(matches!(
        LayoutDispatcher::new(broken),
        Err(LayoutError::InvalidConfig { .. })
    ));
}

#[test]
#[traced_test]
fn test_switching_logs_stop_before_start() {
    let (nodes, edges) = tree();
    let mut dispatcher = LayoutDispatcher::new(LayoutSettings::default()).unwrap();
    dispatcher
        .activate(LayoutMode::ForceAtlas2, nodes, edges, Dimensions::default())
        .unwrap();
    for _ in 0..5 {
        dispatcher.tick();
    }
    let ticket = dispatcher.request_frame();
    dispatcher.switch_mode(LayoutMode::Force).unwrap();
    assert!(!dispatcher.run_frame(ticket));

    assert_eq!(
        dispatcher.journal(),
        &[
            Lifecycle::Started(LayoutMode::ForceAtlas2),
            Lifecycle::Stopped(LayoutMode::ForceAtlas2),
            Lifecycle::Started(LayoutMode::Force),
        ]
    );
    assert!(logs_contain("layout stopped"));
    assert!(logs_contain("dropping stale frame"));
}
