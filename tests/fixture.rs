use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use earclip::{deviation, Earcut, Polygon};

type Coords = Vec<Vec<[f64; 2]>>;

#[derive(Deserialize)]
struct Expected {
    triangles: usize,
    deviation: f64,
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(name: &str) -> Polygon<f64> {
    let s = fs::read_to_string(fixtures_dir().join(name.to_string() + ".json")).unwrap();
    let mut rings = serde_json::from_str::<Coords>(&s).unwrap().into_iter();
    let mut polygon = Polygon::new(rings.next().unwrap_or_default());
    polygon.holes.extend(rings);
    polygon
}

fn test_fixture(name: &str) {
    let s = fs::read_to_string(fixtures_dir().join("expected.json")).unwrap();
    let expected = serde_json::from_str::<HashMap<String, Expected>>(&s).unwrap();
    let Expected {
        triangles: num_triangles,
        deviation: expected_deviation,
    } = expected[name];

    let polygon = load_fixture(name);
    let data: Vec<_> = polygon.points().collect();
    let hole_indices: Vec<u32> = polygon.hole_indices();

    // earcut
    let mut triangles: Vec<u32> = vec![];
    let mut earcut = Earcut::<f64>::new();
    earcut.triangulate(&polygon, &mut triangles);

    // check
    assert_eq!(triangles.len(), num_triangles * 3);
    assert!(triangles.iter().all(|&i| (i as usize) < data.len()));
    if !triangles.is_empty() {
        assert!(deviation(data, &hole_indices, &triangles) <= expected_deviation);
    }
}

#[test]
fn fixture_building() {
    test_fixture("building");
}

#[test]
fn fixture_arrow() {
    test_fixture("arrow");
}

#[test]
fn fixture_dented() {
    test_fixture("dented");
}

#[test]
fn fixture_frame() {
    test_fixture("frame");
}

#[test]
fn fixture_frame_cw() {
    test_fixture("frame-cw");
}

#[test]
fn fixture_two_holes() {
    test_fixture("two-holes");
}
