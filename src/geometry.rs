//! Shared planar geometry helpers
//!
//! Pure functions over pixel-space points plus the bounded per-joint history
//! used for jitter estimation. Every engine goes through these instead of
//! carrying its own copies.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::PixelPoint;

/// Euclidean distance between two points
pub fn distance(a: PixelPoint, b: PixelPoint) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Clamp a value to [0, 1]
pub fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Angle at vertex `b` formed by `a-b-c`, in degrees
///
/// Degenerate (zero-length) arms yield 90° rather than NaN.
pub fn angle_deg(a: PixelPoint, b: PixelPoint, c: PixelPoint) -> f64 {
    let ab = (a.x - b.x, a.y - b.y);
    let cb = (c.x - b.x, c.y - b.y);
    let dot = ab.0 * cb.0 + ab.1 * cb.1;
    let mut mag = ab.0.hypot(ab.1) * cb.0.hypot(cb.1);
    if mag == 0.0 {
        mag = 1.0;
    }
    let cos = (dot / mag).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Mean of a point set; `None` when empty
pub fn centroid(points: &[PixelPoint]) -> Option<PixelPoint> {
    if points.is_empty() {
        return None;
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let n = points.len() as f64;
    Some(PixelPoint::new(sx / n, sy / n))
}

fn cross(o: PixelPoint, a: PixelPoint, b: PixelPoint) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull via Andrew's monotone chain
///
/// Collinear points are dropped. Inputs with fewer than three points are
/// returned unchanged.
pub fn convex_hull(points: &[PixelPoint]) -> Vec<PixelPoint> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let mut lower: Vec<PixelPoint> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<PixelPoint> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Bounded ring buffer of recent positions for one joint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointHistory {
    points: VecDeque<PixelPoint>,
    capacity: usize,
}

impl JointHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a position, evicting the oldest beyond capacity
    pub fn push(&mut self, p: PixelPoint) {
        self.points.push_back(p);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Mean distance of buffered points from their centroid
    pub fn jitter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        let pts: Vec<PixelPoint> = self.points.iter().copied().collect();
        match centroid(&pts) {
            Some(center) => {
                pts.iter().map(|p| distance(*p, center)).sum::<f64>() / pts.len() as f64
            }
            None => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &PixelPoint> {
        self.points.iter()
    }
}
