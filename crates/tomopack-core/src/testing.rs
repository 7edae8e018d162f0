//! Shared mesh fixtures for unit tests. Winding is counter-clockwise seen
//! from outside, matching the `ModelGeometry` contract for closed meshes.

use crate::core::models::mesh::TriMesh;
use nalgebra::Point3;
use std::f64::consts::PI;

/// An axis-aligned cube with the given half-extent.
pub(crate) fn cube_mesh(center: Point3<f64>, half: f64) -> TriMesh {
    let signs = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [-1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
    ];
    let vertices = signs
        .iter()
        .map(|s| Point3::new(center.x + half * s[0], center.y + half * s[1], center.z + half * s[2]))
        .collect();
    let triangles = vec![
        [0, 2, 3],
        [0, 3, 1],
        [4, 5, 7],
        [4, 7, 6],
        [0, 1, 5],
        [0, 5, 4],
        [2, 6, 7],
        [2, 7, 3],
        [0, 4, 6],
        [0, 6, 2],
        [1, 3, 7],
        [1, 7, 5],
    ];
    TriMesh::new(vertices, triangles).expect("cube fixture is valid")
}

/// A UV sphere with `rings` latitude bands and `segments` longitudes.
pub(crate) fn uv_sphere_mesh(center: Point3<f64>, radius: f64, rings: u32, segments: u32) -> TriMesh {
    assert!(rings >= 2 && segments >= 3);
    let mut vertices = vec![Point3::new(center.x, center.y, center.z + radius)];
    for ring in 1..rings {
        let theta = PI * ring as f64 / rings as f64;
        for segment in 0..segments {
            let phi = 2.0 * PI * segment as f64 / segments as f64;
            vertices.push(Point3::new(
                center.x + radius * theta.sin() * phi.cos(),
                center.y + radius * theta.sin() * phi.sin(),
                center.z + radius * theta.cos(),
            ));
        }
    }
    let bottom = vertices.len() as u32;
    vertices.push(Point3::new(center.x, center.y, center.z - radius));

    let index = |ring: u32, segment: u32| 1 + (ring - 1) * segments + segment % segments;

    let mut triangles = Vec::new();
    for segment in 0..segments {
        triangles.push([0, index(1, segment), index(1, segment + 1)]);
    }
    for ring in 1..rings - 1 {
        for segment in 0..segments {
            let a = index(ring, segment);
            let b = index(ring, segment + 1);
            let c = index(ring + 1, segment + 1);
            let d = index(ring + 1, segment);
            triangles.push([a, d, c]);
            triangles.push([a, c, b]);
        }
    }
    for segment in 0..segments {
        triangles.push([bottom, index(rings - 1, segment + 1), index(rings - 1, segment)]);
    }

    TriMesh::new(vertices, triangles).expect("sphere fixture is valid")
}
