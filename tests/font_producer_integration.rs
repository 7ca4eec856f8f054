//! Font producer integration tests.
//!
//! A worker thread creates fonts through a clone of the engine's
//! [`FontRegistry`] while the render thread keeps running frames. Fonts land
//! in the buffer while producer mode is on and are merged into the primary
//! registry at the first `begin_frame` after the worker switches it off.

use std::sync::mpsc;
use std::thread;

use moonframe::Engine;
use moonframe::backend::headless::headless_backends;
use moonframe::resources::engineconfig::EngineConfig;
use moonframe::resources::fontregistry::FontMode;

// =============================================================================
// Producer thread
// =============================================================================

#[test]
fn worker_fonts_are_merged_at_the_next_frame() {
    let (backends, probes) = headless_backends();
    let mut engine = Engine::new(EngineConfig::new(), backends).unwrap();
    let fonts = engine.fonts();
    fonts.create_ttf(1, "ui.ttf", 12).unwrap();
    fonts.create_ttf(2, "title.ttf", 24).unwrap();

    fonts.set_producer_mode(true);
    let (started_tx, started_rx) = mpsc::channel();
    let (finish_tx, finish_rx) = mpsc::channel::<()>();
    let worker_fonts = fonts.clone();
    let worker = thread::spawn(move || {
        for id in 3..=20 {
            worker_fonts.create_ttf(id, "worker.ttf", 8 + id).unwrap();
        }
        started_tx.send(()).unwrap();
        finish_rx.recv().unwrap();
        worker_fonts.set_producer_mode(false);
    });

    started_rx.recv().unwrap();
    // Still producing: frames run, nothing is merged.
    engine.begin_frame_with_delta(0.1);
    assert_eq!(fonts.mode(), FontMode::Buffered);
    assert_eq!(fonts.primary_ids(), vec![1, 2]);
    assert_eq!(fonts.buffer_ids().len(), 18);
    // Readers see buffered fonts before the merge.
    assert_eq!(fonts.get(20).unwrap().point_size, 28);

    finish_tx.send(()).unwrap();
    worker.join().unwrap();
    engine.begin_frame_with_delta(0.1);

    assert_eq!(fonts.mode(), FontMode::Direct);
    assert!(fonts.buffer_ids().is_empty());
    assert_eq!(fonts.primary_ids(), (1..=20).collect::<Vec<_>>());
    assert_eq!(probes.fonts.loaded_count(), 20);
}

#[test]
fn deletes_during_production_are_applied_by_the_merge() {
    let (backends, probes) = headless_backends();
    let mut engine = Engine::new(EngineConfig::new(), backends).unwrap();
    let fonts = engine.fonts();
    fonts.create_ttf(1, "a.ttf", 10).unwrap();

    fonts.set_producer_mode(true);
    let worker_fonts = fonts.clone();
    thread::spawn(move || {
        worker_fonts.create_ttf(2, "b.ttf", 10).unwrap();
        worker_fonts.create_ttf(3, "c.ttf", 10).unwrap();
        worker_fonts.delete(1).unwrap();
        worker_fonts.delete(3).unwrap();
    })
    .join()
    .unwrap();

    // Tombstoned fonts are gone for readers right away.
    assert!(fonts.get(1).unwrap_err().is_not_found());
    assert!(!fonts.contains(3));
    assert_eq!(probes.fonts.loaded_count(), 3);

    fonts.set_producer_mode(false);
    engine.begin_frame_with_delta(0.1);
    assert_eq!(fonts.primary_ids(), vec![2]);
    assert_eq!(probes.fonts.loaded_count(), 1);
}

#[test]
fn ids_stay_unique_across_both_trees() {
    let (backends, _) = headless_backends();
    let engine = Engine::new(EngineConfig::new(), backends).unwrap();
    let fonts = engine.fonts();
    fonts.create_ttf(7, "a.ttf", 10).unwrap();
    fonts.set_producer_mode(true);
    assert!(fonts.create_ttf(7, "b.ttf", 10).is_err());
    fonts.create_ttf(8, "b.ttf", 10).unwrap();
    fonts.set_producer_mode(false);
    assert!(fonts.create_ttf(8, "c.ttf", 10).is_err());
    assert_eq!(fonts.count(), 2);
}
