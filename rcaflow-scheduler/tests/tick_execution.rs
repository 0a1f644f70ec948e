//! Integration tests for per-tick execution.
//!
//! Tests verify that:
//! - Data flows downstream through a local chain within one tick
//! - Locally produced units are published to subscribed peers
//! - Remote proxies surface cached peer data, or empty when absent
//! - Tick cadence and counter wrap behave as specified
//! - Evaluator failures are contained within the tick
//! - The worker pool's permit count bounds concurrency

mod common;

use common::{build_task, collaborators, host_config, init_tracing, unit, ConcurrencyProbe};
use rcaflow_core::flow_unit::Record;
use rcaflow_core::graph::{GraphBuilder, Vertex};
use rcaflow_core::testing::{
    FailingEvaluator, FixedEvaluator, MockMetricSource, PassthroughEvaluator, RecordingEvaluator,
};
use rcaflow_core::traits::InputOrigin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn linear_chain_flows_data_downstream() {
    init_tracing();

    let recorder = RecordingEvaluator::new(unit("c", "score", 1.0));
    let observed = recorder.observed_handle();

    let graph = GraphBuilder::new()
        .vertex(Vertex::metric("a", ["avg"]).with_locus("data"))
        .vertex(
            Vertex::computed("b", PassthroughEvaluator)
                .with_locus("data")
                .with_upstreams(["a"]),
        )
        .vertex(
            Vertex::computed("c", recorder)
                .with_locus("data")
                .with_upstreams(["b"]),
        )
        .build()
        .unwrap();

    let c = collaborators();
    c.source.set_batch("a", vec![Record::new().with("avg", 0.5)]);
    let config = host_config("node-1", &["data"]);
    let mut task = build_task(3, 4, &graph, &config, &c);

    task.run().await;

    // c observed b's unit, which passed through a's metric batch.
    let snapshots = observed.lock();
    assert_eq!(snapshots.len(), 1);
    let inputs = &snapshots[0];
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].vertex, "b");
    assert_eq!(inputs[0].origin, InputOrigin::Local);
    assert_eq!(inputs[0].unit.first().unwrap().get_f64("avg"), Some(0.5));

    // All three produced units were persisted.
    assert_eq!(c.store.written_for("a").len(), 1);
    assert_eq!(c.store.written_for("b").len(), 1);
    assert_eq!(c.store.written_for("c").len(), 1);
    assert!(c.network.published().is_empty());
}

#[tokio::test]
async fn produced_units_are_published_to_peers() {
    let graph = GraphBuilder::new()
        .vertex(Vertex::metric("a", ["avg"]).with_locus("data"))
        .vertex(
            Vertex::computed("c", FixedEvaluator::empty())
                .with_locus("cluster")
                .with_upstreams(["a"]),
        )
        .build()
        .unwrap();

    let c = collaborators();
    c.source.set_batch("a", vec![Record::new().with("avg", 0.5)]);
    let config = host_config("node-1", &["data"]);
    let mut task = build_task(3, 4, &graph, &config, &c);

    task.run().await;

    let published = c.network.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].vertex, "a");
    assert_eq!(published[0].destinations, vec!["c".to_string()]);
    assert_eq!(
        published[0].unit.first().unwrap().get_f64("avg"),
        Some(0.5)
    );
}

#[tokio::test]
async fn empty_units_are_not_published() {
    let graph = GraphBuilder::new()
        .vertex(Vertex::metric("a", ["avg"]).with_locus("data"))
        .vertex(
            Vertex::computed("c", FixedEvaluator::empty())
                .with_locus("cluster")
                .with_upstreams(["a"]),
        )
        .build()
        .unwrap();

    let c = collaborators();
    // No batch staged: a emits the empty unit.
    let config = host_config("node-1", &["data"]);
    let mut task = build_task(3, 4, &graph, &config, &c);

    task.run().await;

    assert!(c.network.published().is_empty());
    assert!(c.store.written().is_empty());
}

#[tokio::test]
async fn remote_proxy_feeds_consumer_when_data_arrives() {
    let recorder = RecordingEvaluator::new(unit("b", "score", 1.0));
    let observed = recorder.observed_handle();

    let graph = GraphBuilder::new()
        .vertex(Vertex::metric("a", ["avg"]).with_locus("data"))
        .vertex(
            Vertex::computed("b", recorder)
                .with_locus("cluster")
                .with_upstreams(["a"]),
        )
        .build()
        .unwrap();

    let c = collaborators();
    let config = host_config("manager-1", &["cluster"]);
    let mut task = build_task(10, 4, &graph, &config, &c);

    // Nothing cached yet: the consumer sees an empty upstream.
    task.run().await;
    {
        let snapshots = observed.lock();
        assert_eq!(snapshots[0].len(), 1);
        assert_eq!(snapshots[0][0].origin, InputOrigin::Remote);
        assert!(snapshots[0][0].unit.is_empty());
    }

    // A peer's unit arrives; the next tick surfaces it.
    c.network.stage_remote("a", unit("a", "avg", 0.9));
    task.run().await;
    {
        let snapshots = observed.lock();
        assert_eq!(snapshots[1].len(), 1);
        assert_eq!(
            snapshots[1][0].unit.first().unwrap().get_f64("avg"),
            Some(0.9)
        );
    }
}

#[tokio::test]
async fn tick_cadence_gates_evaluation() {
    let recorder = RecordingEvaluator::new(unit("pulse", "beat", 1.0));
    let calls = recorder.calls_handle();

    let graph = GraphBuilder::new()
        .vertex(
            Vertex::computed("pulse", recorder)
                .with_locus("data")
                .with_period(3),
        )
        .build()
        .unwrap();

    let c = collaborators();
    let config = host_config("node-1", &["data"]);
    let mut task = build_task(6, 2, &graph, &config, &c);

    for _ in 0..6 {
        task.run().await;
    }

    // Due when the counter was 0 on entry: ticks 1 and 4.
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // After max_ticks invocations everything wrapped to zero.
    assert_eq!(task.curr_tick(), 0);
    for level in task.levels() {
        for tasklet in level {
            assert_eq!(tasklet.ticks(), 0);
        }
    }

    // The cycle repeats identically after the wrap.
    for _ in 0..6 {
        task.run().await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn evaluator_failure_is_contained() {
    let ok = RecordingEvaluator::new(unit("ok", "fine", 1.0));
    let ok_calls = ok.calls_handle();
    let sink = RecordingEvaluator::new(unit("sink", "sum", 1.0));
    let sink_observed = sink.observed_handle();

    let graph = GraphBuilder::new()
        .vertex(Vertex::metric("m", ["avg"]).with_locus("data"))
        .vertex(
            Vertex::computed("bad", FailingEvaluator::new("synthetic failure"))
                .with_locus("data")
                .with_upstreams(["m"]),
        )
        .vertex(
            Vertex::computed("ok", ok)
                .with_locus("data")
                .with_upstreams(["m"]),
        )
        .vertex(
            Vertex::computed("sink", sink)
                .with_locus("data")
                .with_upstreams(["bad", "ok"]),
        )
        .build()
        .unwrap();

    let c = collaborators();
    c.source.set_batch("m", vec![Record::new().with("avg", 0.1)]);
    let config = host_config("node-1", &["data"]);
    let mut task = build_task(3, 4, &graph, &config, &c);

    task.run().await;

    // The sibling ran despite the failure.
    assert_eq!(ok_calls.load(Ordering::SeqCst), 1);

    // The downstream vertex ran and saw empty input from the failed
    // sibling rather than a stalled future.
    let snapshots = sink_observed.lock();
    assert_eq!(snapshots.len(), 1);
    let bad_input = snapshots[0].iter().find(|u| u.vertex == "bad").unwrap();
    assert!(bad_input.unit.is_empty());
    let ok_input = snapshots[0].iter().find(|u| u.vertex == "ok").unwrap();
    assert!(!ok_input.unit.is_empty());

    assert_eq!(task.metrics().evaluation_failures.get(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_pool_bounds_concurrency() {
    let current = Arc::new(AtomicUsize::new(0));
    let max_observed = Arc::new(AtomicUsize::new(0));

    let mut builder = GraphBuilder::new();
    for i in 0..6 {
        builder = builder.vertex(
            Vertex::computed(
                format!("probe-{i}"),
                ConcurrencyProbe::new(
                    Arc::clone(&current),
                    Arc::clone(&max_observed),
                    Duration::from_millis(30),
                ),
            )
            .with_locus("data"),
        );
    }
    let graph = builder.build().unwrap();

    let c = collaborators();
    let config = host_config("node-1", &["data"]);
    let max_concurrent = 2;
    let mut task = build_task(3, max_concurrent, &graph, &config, &c);

    task.run().await;

    assert!(
        max_observed.load(Ordering::SeqCst) <= max_concurrent,
        "observed concurrency {} exceeded pool capacity {}",
        max_observed.load(Ordering::SeqCst),
        max_concurrent
    );
}

#[tokio::test]
async fn closed_pool_degrades_tick_without_crashing() {
    let graph = GraphBuilder::new()
        .vertex(Vertex::metric("a", ["avg"]).with_locus("data"))
        .build()
        .unwrap();

    let c = collaborators();
    c.source.set_batch("a", vec![Record::new().with("avg", 0.5)]);
    let config = host_config("node-1", &["data"]);
    let mut task = build_task(3, 2, &graph, &config, &c);

    task.pool().close();
    task.run().await;

    // Nothing evaluated, nothing persisted, but the tick completed.
    assert!(c.store.written().is_empty());
    assert_eq!(task.curr_tick(), 1);
}

#[tokio::test]
async fn metric_source_swap_applies_next_tick() {
    let graph = GraphBuilder::new()
        .vertex(Vertex::metric("a", ["avg"]).with_locus("data"))
        .build()
        .unwrap();

    let c = collaborators();
    c.source.set_batch("a", vec![Record::new().with("avg", 1.0)]);
    let config = host_config("node-1", &["data"]);
    let mut task = build_task(10, 2, &graph, &config, &c);

    task.run().await;

    let replacement = Arc::new(
        MockMetricSource::new().with_batch("a", vec![Record::new().with("avg", 2.0)]),
    );
    task.set_metric_source(replacement);
    task.run().await;

    let written = c.store.written_for("a");
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].first().unwrap().get_f64("avg"), Some(1.0));
    assert_eq!(written[1].first().unwrap().get_f64("avg"), Some(2.0));
    // The original source served only the first tick.
    assert_eq!(c.source.reads().len(), 1);
}

#[tokio::test]
async fn muting_skips_evaluation_until_unmuted() {
    let recorder = RecordingEvaluator::new(unit("b", "score", 1.0));
    let calls = recorder.calls_handle();

    let graph = GraphBuilder::new()
        .vertex(Vertex::metric("a", ["avg"]).with_locus("data"))
        .vertex(
            Vertex::computed("b", recorder)
                .with_locus("data")
                .with_upstreams(["a"]),
        )
        .build()
        .unwrap();

    let c = collaborators();
    c.source.set_batch("a", vec![Record::new().with("avg", 0.5)]);
    let config = host_config("node-1", &["data"]);
    let mut task = build_task(100, 4, &graph, &config, &c);

    task.run().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    task.stats().mute("b");
    task.run().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(task.stats().muted_count(), 1);

    task.stats().unmute("b");
    task.run().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn pre_wait_hook_runs_before_join() {
    let graph = GraphBuilder::new()
        .vertex(Vertex::metric("a", ["avg"]).with_locus("data"))
        .build()
        .unwrap();

    let c = collaborators();
    let config = host_config("node-1", &["data"]);
    let mut task = build_task(3, 2, &graph, &config, &c);

    let fired = Arc::new(AtomicUsize::new(0));
    let hook_fired = Arc::clone(&fired);
    task.set_pre_wait(move || {
        hook_fired.fetch_add(1, Ordering::SeqCst);
    });

    task.run().await;
    task.run().await;
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn tick_metrics_are_emitted() {
    let graph = GraphBuilder::new()
        .vertex(Vertex::metric("a", ["avg"]).with_locus("data"))
        .vertex(Vertex::metric("x", ["avg"]).with_locus("elsewhere"))
        .build()
        .unwrap();

    let c = collaborators();
    let config = host_config("node-1", &["data"]);
    let mut task = build_task(3, 2, &graph, &config, &c);
    task.stats().mute("a");

    task.run().await;

    let metrics = task.metrics();
    assert_eq!(metrics.ticks_total.get(), 1);
    // Node count covers the whole graph, not just the local slice.
    assert_eq!(metrics.graph_nodes.get(), 2);
    assert_eq!(metrics.muted_nodes.get(), 1);
    let duration_samples = metrics.tick_duration.get_sample_count();
    assert_eq!(duration_samples, 1);
}
