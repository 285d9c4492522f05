use cgmath::{Point3, Vector3};
use pollster::block_on;

use voxel_path_tracer::config::{CameraPose, RenderRequest, RenderSettings, SamplingParams};
use voxel_path_tracer::fields::snapshot::{FieldLayout, OccupancyFields};
use voxel_path_tracer::lighting::bake::OccupiedClassifier;
use voxel_path_tracer::orchestrator::scan::populate;
use voxel_path_tracer::orchestrator::RenderOrchestrator;
use voxel_path_tracer::raymarch::RayMarcher;
use voxel_path_tracer::shading::path_tracer::finish_pixel;
use voxel_path_tracer::shading::{
    BandCamera, BandLayout, Environment, Material, MaterialLibrary, ModelTable, Surface,
};
use voxel_path_tracer::world_source::{ScanZone, SparseWorld};

fn single_voxel_world(id: u32) -> SparseWorld {
    let mut world = SparseWorld::new();
    world.set(Point3::new(1, 1, 1), id);
    world
}

fn three_cube() -> ScanZone {
    ScanZone::new(Point3::new(0, 0, 0), Point3::new(3, 3, 3))
}

fn stone_library() -> MaterialLibrary {
    let mut library = MaterialLibrary::default();
    library.register("air");
    library.register("stone");
    library.colors.insert("stone".into(), [0.5, 0.5, 0.5]);
    library
}

#[test]
fn test_marcher_hits_single_voxel_face() {
    for layout in [FieldLayout::Chunked, FieldLayout::Columnar] {
        let mut fields = OccupancyFields::new(layout);
        populate(&mut fields, &single_voxel_world(1), &stone_library(), &three_cube());
        fields.distances.bake();

        let marcher = RayMarcher::new(&fields.distances, 64.0);
        let mut classifier = OccupiedClassifier::new(&fields.blocks);
        let hit = marcher
            .trace(&mut classifier, Point3::new(1.0, 1.0, -5.0), Vector3::new(0.0, 0.0, 1.0))
            .expect("ray along +Z must hit");

        assert_eq!(hit.voxel, Point3::new(1, 1, 1), "{layout:?}");
        assert_eq!(hit.normal, Vector3::new(0.0, 0.0, -1.0), "{layout:?}");
        assert!((hit.position.z - 1.0).abs() < 1e-4, "{layout:?}");

        let miss = marcher.trace(&mut classifier, Point3::new(1.0, 1.0, -5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(miss.is_none(), "{layout:?}");
    }
}

#[test]
fn test_scanned_voxel_face_neighbours_read_one() {
    for layout in [FieldLayout::Chunked, FieldLayout::Columnar] {
        let mut fields = OccupancyFields::new(layout);
        populate(&mut fields, &single_voxel_world(1), &stone_library(), &three_cube());
        fields.distances.bake();

        let solid = Point3::new(1, 1, 1);
        assert_eq!(fields.distances.get(solid), 0.0, "{layout:?}");
        for offset in [
            Vector3::new(1, 0, 0),
            Vector3::new(-1, 0, 0),
            Vector3::new(0, 1, 0),
            Vector3::new(0, -1, 0),
            Vector3::new(0, 0, 1),
            Vector3::new(0, 0, -1),
        ] {
            assert_eq!(fields.distances.get(solid + offset), 1.0, "{layout:?} {offset:?}");
        }
        assert_eq!(fields.distances.get(Point3::new(-3, 1, 1)), 4.0, "{layout:?} outside the zone");
    }
}

#[test]
fn test_fast_render_shows_voxel_against_sky() {
    let settings = RenderSettings {
        width: 8,
        height: 8,
        ..RenderSettings::default()
    };
    let pose = CameraPose {
        origin: Point3::new(1.5, 1.5, -5.0),
        pitch: 0.0,
        yaw: std::f32::consts::PI,
        fov: 60.0,
    };
    let request = RenderRequest {
        pose,
        sampling: SamplingParams::default(),
    };
    let environment = settings.environment;

    let mut orchestrator =
        RenderOrchestrator::new(2, settings, stone_library(), ModelTable::default()).expect("workers start");
    block_on(orchestrator.scan(&single_voxel_world(1), three_cube())).expect("scan");
    assert!(orchestrator.shadows().is_some());

    let image = block_on(orchestrator.fast_render(request)).expect("render");
    assert_eq!(image.pixels.len(), 8 * 8 * 4);

    let camera = BandCamera::new(&pose, BandLayout::full(8, 8));
    let sky = |x: u32, y: u32| finish_pixel(environment.light(camera.direction(x, y)), request.sampling.exposure);

    for (x, y) in [(0, 0), (7, 0), (0, 7), (7, 7)] {
        assert_eq!(image.pixel(x, y), sky(x, y), "corner ({x}, {y})");
    }
    assert_ne!(image.pixel(4, 4), sky(4, 4), "center pixel must hit the voxel");
    assert!(image.pixels.chunks_exact(4).all(|p| p[3] == 255));
}

#[test]
fn test_emissive_frame_is_tone_mapped_emission() {
    let mut library = MaterialLibrary::default();
    library.register("air");
    library.register("lamp");
    library.materials.insert(
        "lamp".into(),
        Material::uniform(Surface::emissive([0.3, 0.3, 0.3], [1.0, 0.5, 0.25], 1.0)),
    );

    for environment in [
        Environment::default(),
        Environment {
            sun_intensity: 0.0,
            gradient_exponent: 1.0,
            ..Environment::default()
        },
    ] {
        let settings = RenderSettings {
            width: 4,
            height: 4,
            environment,
            field_layout: FieldLayout::Columnar,
            ..RenderSettings::default()
        };
        let request = RenderRequest {
            pose: CameraPose {
                origin: Point3::new(1.5, 1.5, 0.9),
                pitch: 0.0,
                yaw: std::f32::consts::PI,
                fov: 20.0,
            },
            sampling: SamplingParams {
                samples_per_pixel: 1,
                max_bounces: 1,
                ..SamplingParams::default()
            },
        };

        let mut orchestrator =
            RenderOrchestrator::new(2, settings, library.clone(), ModelTable::default()).expect("workers start");
        block_on(orchestrator.scan(&single_voxel_world(1), three_cube())).expect("scan");
        let image = block_on(orchestrator.render(request)).expect("render");

        let expected = finish_pixel(Vector3::new(1.0, 0.5, 0.25), request.sampling.exposure);
        for pixel in image.pixels.chunks_exact(4) {
            for channel in 0..4 {
                assert!((i16::from(pixel[channel]) - i16::from(expected[channel])).abs() <= 1);
            }
        }
    }
}

#[test]
fn test_placeholder_for_unknown_material() {
    let mut library = MaterialLibrary::default();
    library.register("air");
    library.register("mystery");
    let settings = RenderSettings {
        width: 4,
        height: 4,
        ..RenderSettings::default()
    };
    let request = RenderRequest {
        pose: CameraPose {
            origin: Point3::new(1.5, 1.5, 0.9),
            pitch: 0.0,
            yaw: std::f32::consts::PI,
            fov: 20.0,
        },
        sampling: SamplingParams::default(),
    };

    let mut orchestrator =
        RenderOrchestrator::new(1, settings, library, ModelTable::default()).expect("workers start");
    block_on(orchestrator.scan(&single_voxel_world(1), three_cube())).expect("scan");
    let image = block_on(orchestrator.fast_render(request)).expect("render");

    for pixel in image.pixels.chunks_exact(4) {
        assert_eq!(pixel[1], 0, "placeholder has no green");
    }
}
