use std::path::{Path, PathBuf};
use std::time::Duration;

use lumaedit_bridge::{Control, EditError, EditorBridge, EditorConfig, Preview};

const WAIT: Duration = Duration::from_secs(30);

fn write_png(dir: &Path, width: u32, height: u32, value: u8) -> PathBuf {
    let path = dir.join("input.png");
    image::RgbaImage::from_pixel(width, height, image::Rgba([value, value, value, 255]))
        .save(&path)
        .unwrap();
    path
}

fn config_for(dir: &Path) -> EditorConfig {
    EditorConfig {
        export_dir: dir.join("out"),
        ..EditorConfig::default()
    }
}

/// Wait until `rx` has produced `count` values, dispatching completions as they arrive.
fn collect<T>(bridge: &EditorBridge, rx: &crossbeam_channel::Receiver<T>, count: usize) -> Vec<T> {
    let mut values = Vec::new();
    while values.len() < count {
        assert!(bridge.wait_for_completion(WAIT) > 0, "timed out waiting for the worker");
        values.extend(rx.try_iter());
    }
    values
}

#[test]
fn test_midtone_adjust_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = EditorBridge::new(config_for(dir.path())).unwrap();
    bridge.open(write_png(dir.path(), 4, 4, 128)).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    let preview_tx = tx.clone();
    bridge.set_midtone(0.5, move |result: Result<Preview, EditError>| {
        let preview = result.unwrap();
        preview_tx.send((preview.width, preview.height, None)).unwrap();
    });
    bridge.export(move |result| {
        tx.send((0, 0, Some(result.unwrap()))).unwrap();
    });

    let outcomes = collect(&bridge, &rx, 2);
    assert_eq!((outcomes[0].0, outcomes[0].1), (2, 2));

    let path = outcomes[1].2.clone().unwrap();
    assert!(path.starts_with(dir.path().join("out")));
    assert_eq!(path.extension().unwrap(), "jpg");

    let exported = image::open(&path).unwrap().to_rgb8();
    assert_eq!(exported.dimensions(), (4, 4));
    // 128 * 0.5 = 64, then the low four bits are discarded before encoding.
    for pixel in exported.pixels() {
        assert!((pixel[0] as i32 - 64).abs() <= 3, "unexpected sample {}", pixel[0]);
    }
}

#[test]
fn test_mid_gray_survives_shadow_and_highlight() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = EditorBridge::new(config_for(dir.path())).unwrap();
    bridge.open(write_png(dir.path(), 4, 4, 128)).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    let shadow_tx = tx.clone();
    bridge.set_shadow(0.5, move |result| shadow_tx.send(result.is_ok()).unwrap());
    let highlight_tx = tx.clone();
    bridge.set_highlight(0.5, move |result| highlight_tx.send(result.is_ok()).unwrap());
    let (path_tx, path_rx) = crossbeam_channel::unbounded();
    bridge.export(move |result| {
        tx.send(true).unwrap();
        path_tx.send(result.unwrap()).unwrap();
    });

    assert_eq!(collect(&bridge, &rx, 3), vec![true, true, true]);
    let exported = image::open(path_rx.try_recv().unwrap()).unwrap().to_rgb8();
    // 128 has no low bits to discard, so only JPEG rounding remains.
    for pixel in exported.pixels() {
        assert!((pixel[0] as i32 - 128).abs() <= 2, "unexpected sample {}", pixel[0]);
    }
}

#[test]
fn test_repeated_export_writes_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = EditorBridge::new(config_for(dir.path())).unwrap();
    bridge.open(write_png(dir.path(), 6, 3, 200)).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    for _ in 0..2 {
        let tx = tx.clone();
        bridge.export(move |result| tx.send(result.unwrap()).unwrap());
    }

    let paths = collect(&bridge, &rx, 2);
    assert_ne!(paths[0], paths[1]);

    let first = image::open(&paths[0]).unwrap().to_rgb8();
    let second = image::open(&paths[1]).unwrap().to_rgb8();
    assert_eq!(first, second);
}

#[test]
fn test_no_callbacks_before_open() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = EditorBridge::new(config_for(dir.path())).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded::<()>();
    let apply_tx = tx.clone();
    bridge.set_shadow(0.5, move |_| apply_tx.send(()).unwrap());
    let restore_tx = tx.clone();
    bridge.restore(Control::Shadow, move |_| restore_tx.send(()).unwrap());
    bridge.export(move |_| tx.send(()).unwrap());

    assert_eq!(bridge.wait_for_completion(Duration::from_millis(300)), 0);
    assert!(rx.try_recv().is_err());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_no_callbacks_before_open_with_coalescing() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = EditorBridge::new(EditorConfig {
        coalesce_scrubbing: true,
        ..config_for(dir.path())
    })
    .unwrap();

    let (tx, rx) = crossbeam_channel::unbounded::<f32>();
    for factor in [0.1f32, 0.2, 0.3, 0.4] {
        let tx = tx.clone();
        bridge.set_shadow(factor, move |_| tx.send(factor).unwrap());
    }

    // Queued behind the scrub, so every shadow command has been handled
    // once this returns.
    bridge.open(write_png(dir.path(), 2, 2, 40)).unwrap();
    assert_eq!(bridge.dispatch_completions(), 0);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_failed_open_keeps_previous_image() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = EditorBridge::new(config_for(dir.path())).unwrap();
    bridge.open(write_png(dir.path(), 4, 2, 50)).unwrap();

    let broken = dir.path().join("broken.png");
    std::fs::write(&broken, b"not an image").unwrap();
    assert!(matches!(bridge.open(&broken), Err(EditError::DecodeFailure(_))));

    let (tx, rx) = crossbeam_channel::unbounded();
    bridge.flip(move |result| {
        let preview = result.unwrap();
        tx.send((preview.width, preview.height)).unwrap();
    });
    assert_eq!(collect(&bridge, &rx, 1), vec![(2, 1)]);
}

#[test]
fn test_coalesced_scrub_keeps_final_value() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = EditorBridge::new(EditorConfig {
        coalesce_scrubbing: true,
        ..config_for(dir.path())
    })
    .unwrap();
    bridge.open(write_png(dir.path(), 8, 8, 128)).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    let steps = [0.9f32, 0.8, 0.7, 0.6, 0.5];
    for factor in steps {
        let tx = tx.clone();
        bridge.set_midtone(factor, move |result| {
            tx.send((factor, result.map(|_| ()))).unwrap();
        });
    }
    let export_tx = tx.clone();
    bridge.export(move |result| {
        let _ = export_tx.send((-1.0, result.map(|_| ())));
    });

    let outcomes = collect(&bridge, &rx, steps.len() + 1);
    for (factor, result) in &outcomes {
        match result {
            Ok(()) => {}
            Err(EditError::Superseded) => assert_ne!(*factor, 0.5),
            Err(err) => panic!("unexpected error for {factor}: {err}"),
        }
    }
    assert!(outcomes.iter().any(|(f, r)| *f == 0.5 && r.is_ok()));
    assert!(outcomes.iter().any(|(f, r)| *f == -1.0 && r.is_ok()));
}
