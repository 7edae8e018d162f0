//! Mesh-geometry primitives: axis-aligned bounds, segment/triangle
//! intersection, point-in-mesh parity testing, and least-squares plane
//! fitting. These back both overlap estimation strategies and the boundary
//! constraint.

use nalgebra::{DMatrix, Point3, Unit, Vector3};
use tracing::warn;

/// Margin applied when re-marching a parity ray past a triangle hit, so the
/// next query starts strictly beyond the intersected surface.
const INTERCEPT_MARGIN: f64 = 1.001;
/// Hard cap on parity-ray hits; exceeding it means degenerate geometry.
const MAX_PARITY_HITS: usize = 1000;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    /// Computes the bounds of a point set. Returns `None` for an empty set.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut min = *first;
        let mut max = *first;
        for p in iter {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Some(Self { min, max })
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && self.max[axis] >= other.min[axis])
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// Overlap box of two bounds, `None` when they are disjoint.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let mut min = self.min;
        let mut max = self.max;
        for axis in 0..3 {
            min[axis] = min[axis].max(other.min[axis]);
            max[axis] = max[axis].min(other.max[axis]);
            if min[axis] > max[axis] {
                return None;
            }
        }
        Some(Aabb { min, max })
    }

    pub fn translated(&self, offset: &Vector3<f64>) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// Intersects the segment `start → end` with triangle `(a, b, c)`
/// (Möller–Trumbore). Returns the hit as a fraction of the segment length.
pub fn segment_triangle_intercept(
    start: &Point3<f64>,
    end: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Option<f64> {
    const PARALLEL_EPSILON: f64 = 1e-12;

    let dir = end - start;
    let e1 = b - a;
    let e2 = c - a;
    let pvec = dir.cross(&e2);
    let det = e1.dot(&pvec);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = start - a;
    let u = tvec.dot(&pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(&e1);
    let v = dir.dot(&qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(&qvec) * inv_det;
    if (0.0..=1.0).contains(&t) { Some(t) } else { None }
}

/// Finds the earliest intersection of a segment with a triangle soup.
/// Returns the fraction along the segment and the triangle index.
pub fn closest_segment_intercept(
    vertices: &[Point3<f64>],
    triangles: &[[u32; 3]],
    start: &Point3<f64>,
    end: &Point3<f64>,
) -> Option<(f64, usize)> {
    let mut best: Option<(f64, usize)> = None;
    for (index, tri) in triangles.iter().enumerate() {
        let a = &vertices[tri[0] as usize];
        let b = &vertices[tri[1] as usize];
        let c = &vertices[tri[2] as usize];
        if let Some(t) = segment_triangle_intercept(start, end, a, b, c)
            && best.is_none_or(|(bt, _)| t < bt)
        {
            best = Some((t, index));
        }
    }
    best
}

/// Parity test for point containment in a closed triangle mesh.
///
/// Casts a ray from the point to just beyond the nearest face of `bounds`
/// (the mesh's own bounding box) and counts surface crossings, re-marching
/// past each hit with a small margin. An odd count means inside.
pub fn point_in_mesh(
    vertices: &[Point3<f64>],
    triangles: &[[u32; 3]],
    bounds: &Aabb,
    point: &Point3<f64>,
) -> bool {
    if !bounds.contains(point) {
        return false;
    }

    // Exit through the nearest box face, overshooting it slightly so the ray
    // endpoint is strictly outside the surface.
    let size = bounds.size();
    let mut exit_axis = 0;
    let mut exit_value = 0.0;
    let mut best_distance = f64::INFINITY;
    for axis in 0..3 {
        let overshoot = size[axis] * 1e-3 + 1e-9;
        let to_min = point[axis] - bounds.min[axis];
        if to_min < best_distance {
            best_distance = to_min;
            exit_axis = axis;
            exit_value = bounds.min[axis] - overshoot;
        }
        let to_max = bounds.max[axis] - point[axis];
        if to_max < best_distance {
            best_distance = to_max;
            exit_axis = axis;
            exit_value = bounds.max[axis] + overshoot;
        }
    }
    let mut end = *point;
    end[exit_axis] = exit_value;

    let mut start = *point;
    let mut hits = 0usize;
    while let Some((fraction, _)) = closest_segment_intercept(vertices, triangles, &start, &end) {
        hits += 1;
        if hits > MAX_PARITY_HITS {
            warn!("Parity ray exceeded {} hits; treating point as outside.", MAX_PARITY_HITS);
            return false;
        }
        let remaining = end - start;
        start += remaining * (fraction * INTERCEPT_MARGIN);
    }
    hits % 2 == 1
}

/// Closest point on triangle `(a, b, c)` to `p` (Ericson's method).
pub fn closest_point_on_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Point3<f64> {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Geometric normal of triangle `(a, b, c)` following its winding order.
/// `None` for degenerate triangles.
pub fn triangle_normal(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Option<Unit<Vector3<f64>>> {
    Unit::try_new((b - a).cross(&(c - a)), 1e-12)
}

/// A least-squares plane through a point cloud.
#[derive(Debug, Clone, Copy)]
pub struct PlaneFit {
    pub centroid: Point3<f64>,
    /// Direction of least variance across the cloud.
    pub normal: Unit<Vector3<f64>>,
    /// Ratio of the two smallest singular values of the centered cloud, in
    /// `[0, 1]`. Zero for an exactly coplanar cloud; near one the least
    /// variance direction is tied and the normal is arbitrary.
    pub ambiguity: f64,
}

/// Fits a plane through a point cloud. `None` when the cloud has fewer than
/// three points or the decomposition fails.
pub fn fit_plane(points: &[Point3<f64>]) -> Option<PlaneFit> {
    if points.len() < 3 {
        return None;
    }
    let centroid_vector = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / points.len() as f64;
    let centroid = Point3::from(centroid_vector);

    let centered = DMatrix::from_fn(points.len(), 3, |row, col| points[row][col] - centroid[col]);
    let svd = centered.svd(false, true);
    let v_t = svd.v_t?;

    let mut smallest = 0;
    for i in 1..svd.singular_values.len() {
        if svd.singular_values[i] < svd.singular_values[smallest] {
            smallest = i;
        }
    }
    let next = (0..svd.singular_values.len())
        .filter(|&i| i != smallest)
        .map(|i| svd.singular_values[i])
        .fold(f64::INFINITY, f64::min);
    // A collinear cloud pins no normal at all; flag it like a tie.
    let ambiguity = if next > 1e-12 {
        svd.singular_values[smallest] / next
    } else {
        1.0
    };

    let row = v_t.row(smallest);
    let normal = Vector3::new(row[0], row[1], row[2]);
    Unit::try_new(normal, 1e-12).map(|normal| PlaneFit {
        centroid,
        normal,
        ambiguity,
    })
}

/// Greatest signed distance of any point beyond the plane `(origin, normal)`,
/// measured along the normal. Zero when every point lies on or behind it.
pub fn max_depth_beyond_plane<'a>(
    points: impl IntoIterator<Item = &'a Point3<f64>>,
    origin: &Point3<f64>,
    normal: &Unit<Vector3<f64>>,
) -> f64 {
    points
        .into_iter()
        .map(|p| (p - origin).dot(normal))
        .fold(0.0, f64::max)
}
