use cgmath::Point3;
use pollster::block_on;

use voxel_path_tracer::config::{CameraPose, RenderRequest, RenderSettings, SamplingParams};
use voxel_path_tracer::error::RenderError;
use voxel_path_tracer::orchestrator::RenderOrchestrator;
use voxel_path_tracer::shading::{Material, MaterialLibrary, ModelTable, Surface};
use voxel_path_tracer::world_source::{ScanZone, SparseWorld};

fn library() -> MaterialLibrary {
    let mut library = MaterialLibrary::default();
    library.register("air");
    library.register("stone");
    library.register("lamp");
    library.colors.insert("stone".into(), [0.6, 0.6, 0.6]);
    library.materials.insert(
        "lamp".into(),
        Material::uniform(Surface::emissive([1.0, 1.0, 1.0], [1.0, 0.9, 0.7], 3.0)),
    );
    library
}

/// A floor with a pillar and a lamp on it.
fn courtyard() -> SparseWorld {
    let mut world = SparseWorld::new();
    for x in -6..6 {
        for z in -6..6 {
            world.set(Point3::new(x, 0, z), 1);
        }
    }
    for y in 1..5 {
        world.set(Point3::new(0, y, 0), 1);
    }
    world.set(Point3::new(2, 1, -2), 2);
    world
}

fn courtyard_zone() -> ScanZone {
    ScanZone::new(Point3::new(-6, 0, -6), Point3::new(6, 8, 6))
}

fn overview() -> RenderRequest {
    RenderRequest {
        pose: CameraPose {
            origin: Point3::new(0.5, 6.0, 8.0),
            pitch: -0.5,
            yaw: 0.0,
            fov: 70.0,
        },
        sampling: SamplingParams {
            samples_per_pixel: 2,
            max_bounces: 2,
            ..SamplingParams::default()
        },
    }
}

fn settings(width: u32, height: u32) -> RenderSettings {
    RenderSettings {
        width,
        height,
        ..RenderSettings::default()
    }
}

#[test]
fn test_no_workers_fails_fast() {
    let mut orchestrator =
        RenderOrchestrator::new(0, settings(4, 4), library(), ModelTable::default()).expect("empty pool");
    assert_eq!(orchestrator.worker_count(), 0);

    let scan = block_on(orchestrator.scan(&courtyard(), courtyard_zone()));
    assert!(matches!(scan, Err(RenderError::NoWorkers)));
    let render = block_on(orchestrator.render(overview()));
    assert!(matches!(render, Err(RenderError::NoWorkers)));
    let fast = block_on(orchestrator.fast_render(overview()));
    assert!(matches!(fast, Err(RenderError::NoWorkers)));
}

#[test]
fn test_band_count_does_not_change_fast_render() {
    let render_with = |workers: usize| {
        let mut orchestrator =
            RenderOrchestrator::new(workers, settings(12, 7), library(), ModelTable::default())
                .expect("workers start");
        block_on(orchestrator.scan(&courtyard(), courtyard_zone())).expect("scan");
        block_on(orchestrator.fast_render(overview())).expect("render")
    };

    let single = render_with(1);
    let split = render_with(3);
    assert_eq!(single.pixels.len(), 12 * 7 * 4);
    assert_eq!(single, split);
}

#[test]
fn test_scan_reports_and_lights_zone() {
    let mut orchestrator =
        RenderOrchestrator::new(2, settings(8, 8), library(), ModelTable::default()).expect("workers start");
    assert!(orchestrator.shadows().is_none());

    let report = block_on(orchestrator.scan(&courtyard(), courtyard_zone())).expect("scan");
    assert_eq!(report.scanned, courtyard_zone().volume());
    assert_eq!(report.solid, 12 * 12 + 4 + 1);
    assert_eq!(report.unloaded, 0);

    let shadows = orchestrator.shadows().expect("lighting merged");
    assert_eq!(shadows.get_nearest(Point3::new(-5, 7, -5)), 1.0);
    assert_eq!(orchestrator.fields().blocks.get(Point3::new(0, 3, 0)), 1);
}

#[test]
fn test_full_render_produces_opaque_frame() {
    let mut orchestrator =
        RenderOrchestrator::new(3, settings(10, 6), library(), ModelTable::default()).expect("workers start");
    block_on(orchestrator.scan(&courtyard(), courtyard_zone())).expect("scan");

    let image = block_on(orchestrator.render(overview())).expect("render");
    assert_eq!((image.width, image.height), (10, 6));
    assert_eq!(image.pixels.len(), 10 * 6 * 4);
    assert!(image.pixels.chunks_exact(4).all(|p| p[3] == 255));
}

#[test]
fn test_resize_and_validation() {
    let mut orchestrator =
        RenderOrchestrator::new(2, settings(4, 4), library(), ModelTable::default()).expect("workers start");
    block_on(orchestrator.scan(&courtyard(), courtyard_zone())).expect("scan");

    orchestrator.resize(6, 5).expect("valid size");
    let image = block_on(orchestrator.fast_render(overview())).expect("render");
    assert_eq!((image.width, image.height), (6, 5));
    assert_eq!(image.pixels.len(), 6 * 5 * 4);

    assert!(matches!(orchestrator.resize(0, 5), Err(RenderError::InvalidRequest(_))));

    let mut bad = overview();
    bad.sampling.samples_per_pixel = 0;
    let result = block_on(orchestrator.render(bad));
    assert!(matches!(result, Err(RenderError::InvalidRequest(_))));
}

#[test]
fn test_rescan_replaces_fields() {
    let mut orchestrator =
        RenderOrchestrator::new(2, settings(4, 4), library(), ModelTable::default()).expect("workers start");
    block_on(orchestrator.scan(&courtyard(), courtyard_zone())).expect("scan");
    assert_eq!(orchestrator.fields().blocks.get(Point3::new(0, 4, 0)), 1);

    let mut cleared = courtyard();
    cleared.set(Point3::new(0, 4, 0), 0);
    block_on(orchestrator.scan(&cleared, courtyard_zone())).expect("rescan");
    assert_eq!(orchestrator.fields().blocks.get(Point3::new(0, 4, 0)), 0);
    assert!(orchestrator.fields().distances.get(Point3::new(0, 4, 0)) > 0.0);
}
