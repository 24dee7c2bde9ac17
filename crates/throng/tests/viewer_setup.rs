//! Everything the viewer does before it opens a window.

use std::path::{Path, PathBuf};

use throng::camera::{scene_radius, OrbitCamera};
use throng::cli::USAGE;
use throng::config::ViewerConfig;
use throng::{load_mesh, parse_args, AppError, EdgeToggle, InputAction, ViewerInput};
use throng_shared::constants::MAX_INSTANCES;
use throng_shared::placement::{generate, Layout};
use winit::keyboard::KeyCode;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("throng_{}_{name}", std::process::id()))
}

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = temp_path(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn asset(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets").join(name)
}

// ============================================================================
// CLI
// ============================================================================

#[test]
fn test_cli_full_arguments() {
    let args = parse_args(["bunny.obj", "5000", "scatter"]).unwrap();
    assert_eq!(args.mesh_path, PathBuf::from("bunny.obj"));
    assert_eq!(args.instance_count, 5000);
    assert_eq!(args.layout, Layout::Scatter);
}

#[test]
fn test_cli_clamps_instance_count() {
    assert_eq!(parse_args(["m.obj", "0"]).unwrap().instance_count, 1);
    assert_eq!(parse_args(["m.obj", "-12"]).unwrap().instance_count, 1);
    assert_eq!(parse_args(["m.obj", "lots"]).unwrap().instance_count, 1);
    assert_eq!(parse_args(["m.obj"]).unwrap().instance_count, 1);
}

#[test]
fn test_cli_clamps_oversized_count_before_placement() {
    let args = parse_args(["m.obj", "1000000000000000000"]).unwrap();
    assert_eq!(args.instance_count, MAX_INSTANCES);

    let beyond_any_integer = "9".repeat(60);
    let args = parse_args(["m.obj", beyond_any_integer.as_str()]).unwrap();
    assert_eq!(args.instance_count, MAX_INSTANCES);

    // The clamped count is safe to hand to the generator.
    let params = ViewerConfig::default().placement.params(args.instance_count, Layout::Plane);
    assert_eq!(params.count, MAX_INSTANCES);
}

#[test]
fn test_cli_unknown_layout_falls_back_to_grid() {
    let args = parse_args(["m.obj", "10", "spiral"]).unwrap();
    assert_eq!(args.layout, Layout::Grid);
}

#[test]
fn test_cli_requires_mesh_path() {
    let empty: [&str; 0] = [];
    match parse_args(empty) {
        Err(AppError::Usage(usage)) => assert_eq!(usage, USAGE),
        other => panic!("expected usage error, got {other:?}"),
    }
}

// ============================================================================
// CONFIG
// ============================================================================

#[test]
fn test_missing_config_yields_defaults() {
    let config = ViewerConfig::load_from(&temp_path("does_not_exist.toml")).unwrap();
    assert_eq!(config, ViewerConfig::default());
}

#[test]
fn test_partial_config_overrides_only_named_keys() {
    let path = write_temp(
        "partial.toml",
        "[culling]\nenabled = false\nreadback_interval = 5\n\n[camera]\norbit_radius = 75.0\n",
    );
    let config = ViewerConfig::load_from(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!(!config.culling.enabled);
    assert_eq!(config.culling.readback_interval, 5);
    assert_eq!(config.camera.orbit_radius, Some(75.0));
    assert_eq!(config.window, ViewerConfig::default().window);
    assert_eq!(config.placement, ViewerConfig::default().placement);

    let runtime = config.culling.culling_config();
    assert!(!runtime.enabled);
    assert_eq!(runtime.readback_interval, 5);
}

#[test]
fn test_malformed_config_is_an_error() {
    let path = write_temp("broken.toml", "[window\nwidth = \"wide\"\n");
    let result = ViewerConfig::load_from(&path);
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(AppError::Config { .. })));
}

#[test]
fn test_shipped_config_parses() {
    let config = ViewerConfig::load_from(&asset("throng.toml")).unwrap();
    assert!(config.culling.enabled);
    assert_eq!(config.window.width, 1280);
    assert_eq!(config.camera.orbit_radius, None);
}

// ============================================================================
// MESH
// ============================================================================

#[test]
fn test_load_obj_accumulates_bounds() {
    let path = write_temp(
        "wedge.obj",
        "v -1 0 -2\nv 3 0 -2\nv -1 4 -2\nv -1 0 5\nf 1 3 2\nf 1 2 4\nf 1 4 3\nf 2 3 4\n",
    );
    let mesh = load_mesh(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices.len(), 12);
    assert_eq!(mesh.bounds.min, [-1.0, 0.0, -2.0]);
    assert_eq!(mesh.bounds.max, [3.0, 4.0, 5.0]);
    for v in &mesh.vertices {
        let len = (v.normal[0].powi(2) + v.normal[1].powi(2) + v.normal[2].powi(2)).sqrt();
        assert!((len - 1.0).abs() < 1e-4);
    }
}

#[test]
fn test_shipped_cube_loads() {
    let mesh = load_mesh(&asset("cube.obj")).unwrap();
    assert_eq!(mesh.indices.len(), 36);
    assert_eq!(mesh.bounds.min, [-0.5; 3]);
    assert_eq!(mesh.bounds.max, [0.5; 3]);
}

#[test]
fn test_shipped_stl_loads_with_bounds_and_normals() {
    let mesh = load_mesh(&asset("tetrahedron.stl")).unwrap();
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices.len(), 12);
    assert_eq!(mesh.bounds.min, [0.0; 3]);
    assert_eq!(mesh.bounds.max, [1.0; 3]);
    for v in &mesh.vertices {
        let len = (v.normal[0].powi(2) + v.normal[1].powi(2) + v.normal[2].powi(2)).sqrt();
        assert!((len - 1.0).abs() < 1e-4);
    }
}

#[test]
fn test_binary_stl_loads() {
    let triangles: [[[f32; 3]; 3]; 2] = [
        [[-2.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 3.0, 0.0]],
        [[-2.0, 0.0, 0.0], [2.0, 3.0, 0.0], [-2.0, 3.0, -1.0]],
    ];
    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&2u32.to_le_bytes());
    for tri in &triangles {
        for value in [0.0f32, 0.0, 1.0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        for vertex in tri {
            for value in vertex {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        bytes.extend_from_slice(&0u16.to_le_bytes());
    }
    let path = temp_path("quad.stl");
    std::fs::write(&path, &bytes).unwrap();
    let mesh = load_mesh(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices.len(), 6);
    assert_eq!(mesh.bounds.min, [-2.0, 0.0, -1.0]);
    assert_eq!(mesh.bounds.max, [2.0, 3.0, 0.0]);
}

#[test]
fn test_unknown_mesh_format_is_load_error() {
    let path = write_temp("mesh.ply", "ply\n");
    let err = load_mesh(&path).unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, AppError::MeshLoad { .. }));
}

#[test]
fn test_missing_mesh_is_load_error() {
    let err = load_mesh(&temp_path("nowhere.obj")).unwrap_err();
    assert!(matches!(err, AppError::MeshLoad { .. }));
}

#[test]
fn test_mesh_without_faces_is_rejected() {
    let path = write_temp("points.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\n");
    let err = load_mesh(&path).unwrap_err();
    std::fs::remove_file(&path).ok();

    assert!(matches!(err, AppError::MeshLoad { .. } | AppError::EmptyMesh { .. }));
}

// ============================================================================
// INPUT + CAMERA
// ============================================================================

#[test]
fn test_culling_key_is_edge_triggered() {
    let mut input = ViewerInput::new(true);

    assert_eq!(input.handle_key(KeyCode::KeyC, true), Some(InputAction::SetCulling(false)));
    // Held for many frames, plus OS repeats.
    for _ in 0..10 {
        assert_eq!(input.handle_key(KeyCode::KeyC, true), None);
    }
    assert_eq!(input.handle_key(KeyCode::KeyC, false), None);
    assert!(!input.culling());

    assert_eq!(input.handle_key(KeyCode::KeyC, true), Some(InputAction::SetCulling(true)));
    assert!(input.culling());
}

#[test]
fn test_pause_key_toggles_independently() {
    let mut input = ViewerInput::new(true);
    assert_eq!(input.handle_key(KeyCode::Space, true), Some(InputAction::SetPaused(true)));
    assert_eq!(input.handle_key(KeyCode::Space, false), None);
    assert!(input.culling());
}

#[test]
fn test_space_key_freezes_and_resumes_camera() {
    let config = ViewerConfig::default();
    let mut camera = OrbitCamera::new(&config.camera, 10.0, 1.0);
    let mut input = ViewerInput::new(true);
    let mut press = |camera: &mut OrbitCamera, pressed: bool| {
        if let Some(InputAction::SetPaused(paused)) = input.handle_key(KeyCode::Space, pressed) {
            camera.set_paused(paused);
        }
    };

    press(&mut camera, true);
    assert!(camera.is_paused());
    let angle = camera.angle;
    camera.update(2.0);
    assert!((camera.angle - angle).abs() < f32::EPSILON);

    // Held key repeats must not resume.
    press(&mut camera, true);
    assert!(camera.is_paused());

    press(&mut camera, false);
    press(&mut camera, true);
    assert!(!camera.is_paused());
    camera.update(1.0);
    assert!(camera.angle > angle);
}

#[test]
fn test_edge_toggle_default_is_off() {
    let mut toggle = EdgeToggle::default();
    assert!(!toggle.value());
    toggle.update(true);
    assert!(toggle.value());
}

#[test]
fn test_scene_radius_covers_grid() {
    let config = ViewerConfig::default();
    let transforms = generate(&config.placement.params(1000, Layout::Grid));
    let radius = scene_radius(&transforms, &throng_shared::bounds::ObjectBounds::UNIT);
    // 10x10x10 grid at spacing 2.5 reaches ~12.5 units along each axis.
    assert!(radius > 12.5 && radius < 30.0, "radius {radius}");
}
