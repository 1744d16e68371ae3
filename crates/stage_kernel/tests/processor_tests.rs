//! Integration tests for stage_kernel
//!
//! Drives the full stream -> processor -> applier path against the headless
//! runtime and checks ordering, atomicity and reporting.

use crossbeam_channel::unbounded;
use stage_command::{Backpressure, Command, CommandStream, StreamConfig, StreamError};
use stage_core::{Color, SceneId, Shape};
use stage_kernel::*;
use stage_scene::{HeadlessRuntime, SceneDescriptor, SceneRegistry};
use std::thread;

fn runtime() -> HeadlessRuntime {
    HeadlessRuntime::new()
        .with_asset("Experience/Rover")
        .with_asset("Experience/Hab")
        .with_broken_asset("Experience/Teapot", "unsupported archive version")
}

fn registry() -> SceneRegistry {
    let mut builder = SceneRegistry::builder();
    builder.register(SceneDescriptor::asset("rover", "Experience/Rover")).unwrap();
    builder.register(SceneDescriptor::asset("hab", "Experience/Hab")).unwrap();
    builder.register(SceneDescriptor::asset("teapot", "Experience/Teapot")).unwrap();
    builder.build()
}

fn processor(stream: CommandStream) -> SceneProcessor<HeadlessRuntime> {
    SceneProcessor::new(CommandApplier::new(runtime(), registry()), stream.into_consumer())
}

#[test]
fn test_place_load_clear_sequence() {
    let stream = CommandStream::default();
    let ui = stream.publisher("ui");
    let mut processor = processor(stream);
    let view = processor.view();

    ui.publish(Command::place_block(Color::RED)).unwrap();
    ui.publish(Command::load_scene("rover")).unwrap();
    ui.publish(Command::ClearAll).unwrap();

    let first = processor.step().unwrap().unwrap();
    assert!(matches!(first.outcome, Outcome::Placed { .. }));
    assert_eq!(view.len(), 1);

    let second = processor.step().unwrap().unwrap();
    assert!(matches!(second.outcome, Outcome::Placed { .. }));
    assert_eq!(view.len(), 2);

    let third = processor.step().unwrap().unwrap();
    assert_eq!(third.outcome, Outcome::Cleared { count: 2 });
    assert_eq!(view.len(), 0);

    assert!(processor.step().unwrap().is_none());
}

#[test]
fn test_unregistered_scene_rejected() {
    let stream = CommandStream::default();
    let ui = stream.publisher("ui");
    let mut processor = processor(stream);

    ui.publish(Command::load_scene("bad_id")).unwrap();
    let report = processor.step().unwrap().unwrap();

    assert_eq!(
        report.outcome,
        Outcome::Rejected {
            scene_id: Some(SceneId::new("bad_id")),
            reason: RejectReason::NotFound,
        }
    );
    assert_eq!(processor.applier().anchors().len(), 0);
    assert_eq!(processor.applier().registry().stats().loads, 0);
}

#[test]
fn test_clear_all_on_empty_table() {
    let stream = CommandStream::default();
    let ui = stream.publisher("ui");
    let mut processor = processor(stream);

    ui.publish(Command::ClearAll).unwrap();
    ui.publish(Command::ClearAll).unwrap();

    for _ in 0..2 {
        let report = processor.step().unwrap().unwrap();
        assert_eq!(report.outcome, Outcome::Cleared { count: 0 });
    }
}

#[test]
fn test_table_matches_successful_commands_in_order() {
    let stream = CommandStream::default();
    let ui = stream.publisher("ui");
    let mut processor = processor(stream);

    let commands = vec![
        Command::load_scene("hab"),
        Command::load_scene("teapot"),
        Command::place_block(Color::GREEN),
        Command::load_scene("missing"),
        Command::PlaceObject {
            shape: Shape::Sphere { radius: -0.5 },
            color: Color::RED,
        },
        Command::ClearAll,
        Command::load_scene("rover"),
        Command::place_block(Color::BLUE),
        Command::load_scene("hab"),
    ];
    ui.publish_all(commands).unwrap();

    let mut placed_since_clear = Vec::new();
    while let Some(report) = processor.step().unwrap() {
        match report.outcome {
            Outcome::Placed { handle } => placed_since_clear.push(handle),
            Outcome::Cleared { .. } => placed_since_clear.clear(),
            Outcome::Rejected { .. } => {}
        }
    }

    let table: Vec<_> = processor.applier().anchors().handles().collect();
    assert_eq!(table, placed_since_clear);
    assert_eq!(table.len(), 3);

    let sequences: Vec<u64> = processor
        .applier()
        .anchors()
        .entries()
        .iter()
        .map(|e| e.sequence)
        .collect();
    assert_eq!(sequences, vec![7, 8, 9]);

    let stats = processor.summary().apply;
    assert_eq!(stats.applied, 9);
    assert_eq!(stats.rejected, 3);
    assert_eq!(stats.placed, 5);

    // The runtime agrees with the table
    assert_eq!(processor.applier().runtime().live_count(), 3);
}

#[test]
fn test_reports_delivered_in_order_before_next_command() {
    let stream = CommandStream::default();
    let ui = stream.publisher("ui");
    let processor = processor(stream);

    // Each report must see the view already updated for its own command
    let view = processor.view();
    let (tx, rx) = unbounded();
    let mut processor = processor.with_sink(move |r: &CommandReport| {
        let _ = tx.send((r.sequence, view.len()));
    });

    ui.publish(Command::place_block(Color::RED)).unwrap();
    ui.publish(Command::place_block(Color::RED)).unwrap();
    ui.publish(Command::ClearAll).unwrap();
    drop(ui);
    processor.run();

    let seen: Vec<(u64, usize)> = rx.try_iter().collect();
    assert_eq!(seen, vec![(1, 1), (2, 2), (3, 0)]);
}

#[test]
fn test_spawned_processor_with_two_producers() {
    let stream = CommandStream::default();
    let left = stream.publisher("left");
    let right = stream.publisher("right");
    let (tx, rx) = unbounded();

    let handle = processor(stream)
        .with_sink(ChannelSink::new(tx))
        .spawn()
        .unwrap();

    let producers: Vec<_> = [left, right]
        .into_iter()
        .map(|publisher| {
            thread::spawn(move || {
                for i in 0..50 {
                    let color = if i % 2 == 0 { Color::RED } else { Color::BLUE };
                    publisher
                        .publish(Command::PlaceObject {
                            shape: Shape::Box { size: 0.01 * (i + 1) as f32 },
                            color,
                        })
                        .unwrap();
                }
                publisher.id()
            })
        })
        .collect();

    let ids: Vec<_> = producers.into_iter().map(|p| p.join().unwrap()).collect();
    let processor = handle.join().unwrap();

    let reports: Vec<CommandReport> = rx.try_iter().collect();
    assert_eq!(reports.len(), 100);

    // Delivery sequence is gapless and increasing
    let sequences: Vec<u64> = reports.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, (1..=100).collect::<Vec<u64>>());

    // Each producer's own order is preserved
    for id in ids {
        let sizes: Vec<f32> = reports
            .iter()
            .filter(|r| r.producer == id)
            .map(|r| match r.command {
                Command::PlaceObject { shape: Shape::Box { size }, .. } => size,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(sizes.len(), 50);
        assert!(sizes.windows(2).all(|w| w[0] < w[1]));
    }

    let summary = processor.summary();
    assert_eq!(summary.anchors, 100);
    assert_eq!(summary.stream.published, 100);
    assert_eq!(summary.stream.delivered, 100);
}

#[test]
fn test_view_never_sees_partial_clear() {
    let stream = CommandStream::new(StreamConfig::bounded(16, Backpressure::Block));
    let ui = stream.publisher("ui");
    let handle = processor(stream).spawn().unwrap();
    let view = handle.view();

    let reader = thread::spawn(move || {
        let mut sizes = Vec::new();
        for _ in 0..2000 {
            sizes.push(view.snapshot().len());
        }
        sizes
    });

    for _ in 0..20 {
        for _ in 0..5 {
            ui.publish(Command::place_block(Color::WHITE)).unwrap();
        }
        ui.publish(Command::ClearAll).unwrap();
    }
    drop(ui);

    let processor = handle.join().unwrap();
    let sizes = reader.join().unwrap();

    // Table sizes only ever go 0..=5, never an in-between state of a clear
    assert!(sizes.iter().all(|&n| n <= 5));
    assert_eq!(processor.summary().anchors, 0);
    assert_eq!(processor.summary().apply.clears, 20);
}

#[test]
fn test_rejecting_stream_reports_backpressure_to_producer() {
    let stream = CommandStream::new(StreamConfig::bounded(1, Backpressure::Reject));
    let ui = stream.publisher("ui");
    let mut processor = processor(stream);

    ui.publish(Command::load_scene("rover")).unwrap();
    assert_eq!(
        ui.publish(Command::load_scene("hab")),
        Err(StreamError::BackpressureExceeded { capacity: 1 })
    );

    // The producer retries after the consumer catches up
    assert_eq!(processor.run_pending(), 1);
    ui.publish(Command::load_scene("hab")).unwrap();
    assert_eq!(processor.run_pending(), 1);

    assert_eq!(processor.applier().anchors().len(), 2);
    assert_eq!(processor.summary().stream.rejected, 1);
}

#[test]
fn test_cached_scene_loaded_once() {
    let stream = CommandStream::default();
    let ui = stream.publisher("ui");
    let mut processor = processor(stream);

    for _ in 0..3 {
        ui.publish(Command::load_scene("rover")).unwrap();
    }
    processor.run_pending();

    let applier = processor.applier();
    assert_eq!(applier.anchors().len(), 3);
    assert_eq!(applier.runtime().calls().load_count("Experience/Rover"), 1);
    assert_eq!(applier.registry().stats().cache_hits, 2);
}

#[test]
fn test_processor_from_config() {
    let config = KernelConfig::from_toml_str(
        r#"
        [registry]
        cache = false

        [[registry.scenes]]
        id = "rover"
        asset = "Experience/Rover"
        "#,
    )
    .unwrap();

    let stream = CommandStream::new(config.stream);
    let ui = stream.publisher("script");
    let applier = CommandApplier::new(runtime(), config.build_registry().unwrap())
        .with_placement(config.placement.clone());
    let mut processor = SceneProcessor::new(applier, stream.into_consumer());

    ui.publish(Command::load_scene("rover")).unwrap();
    ui.publish(Command::load_scene("rover")).unwrap();
    ui.publish(Command::load_scene("hab")).unwrap();
    drop(ui);

    let summary = processor.run();
    assert_eq!(summary.anchors, 2);
    assert_eq!(summary.apply.rejected, 1);
    assert_eq!(
        processor.applier().runtime().calls().load_count("Experience/Rover"),
        2
    );
}
