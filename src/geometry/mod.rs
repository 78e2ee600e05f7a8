//! Geometry helpers over node coordinates.
//!
//! Small vector routines on `[f64; 3]`, a coplanarity test used to infer
//! cell types from typeless formats, and face/cell centroids.

pub mod centroids;

pub use centroids::{cell_centroid, cell_centroids, face_centroid, face_centroids};

pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Arithmetic mean of `points`, `None` when empty.
pub fn mean(points: impl IntoIterator<Item = [f64; 3]>) -> Option<[f64; 3]> {
    let mut sum = [0.0f64; 3];
    let mut count = 0usize;
    for p in points {
        for k in 0..3 {
            sum[k] += p[k];
        }
        count += 1;
    }
    (count > 0).then(|| sum.map(|s| s / count as f64))
}

/// True when all points lie on one plane.
///
/// `rel_tol` is the allowed distance from the plane relative to the
/// bounding-box diagonal. Fewer than four points, coincident points and
/// collinear points are all coplanar.
pub fn is_coplanar(points: &[[f64; 3]], rel_tol: f64) -> bool {
    if points.len() < 4 {
        return true;
    }
    let mut lo = points[0];
    let mut hi = points[0];
    for p in points {
        for k in 0..3 {
            lo[k] = lo[k].min(p[k]);
            hi[k] = hi[k].max(p[k]);
        }
    }
    let extent = norm(sub(hi, lo));
    if !extent.is_normal() {
        return true;
    }
    let tol = rel_tol * extent;

    let origin = points[0];
    let Some(axis) = points
        .iter()
        .map(|p| sub(*p, origin))
        .find(|d| norm(*d) > tol)
    else {
        return true;
    };
    let Some(normal) = points
        .iter()
        .map(|p| cross(axis, sub(*p, origin)))
        .find(|n| norm(*n) > tol * norm(axis))
    else {
        return true;
    };
    let len = norm(normal);
    points
        .iter()
        .all(|p| (dot(sub(*p, origin), normal) / len).abs() <= tol)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    #[test]
    fn coplanarity() {
        let square = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        assert!(is_coplanar(&square, TOL));
        let tilted = [[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 0.0]];
        assert!(is_coplanar(&tilted, TOL));
        let tet = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(!is_coplanar(&tet, TOL));
        let line = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        assert!(is_coplanar(&line, TOL));
        assert!(is_coplanar(&[[1.0; 3]; 5], TOL));
    }

    #[test]
    fn rounding_noise_is_tolerated() {
        let noisy = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 4e-7], [0.0, 1.0, 0.0]];
        assert!(is_coplanar(&noisy, TOL));
        assert!(!is_coplanar(&noisy, 1e-9));
    }

    #[test]
    fn mean_of_points() {
        assert_eq!(mean([[0.0, 0.0, 0.0], [2.0, 4.0, 6.0]]), Some([1.0, 2.0, 3.0]));
        assert_eq!(mean(std::iter::empty()), None);
    }
}
