//! Planar outline cleanup and ear-clipping triangulation with hole bridging.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::core::Tolerance;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(arr: [f64; 2]) -> Self {
        Self::new(arr[0], arr[1])
    }
}

/// One filled region: an outer contour and the holes cut out of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlineRegion {
    pub outer: Vec<Point2>,
    #[serde(default)]
    pub holes: Vec<Vec<Point2>>,
}

impl OutlineRegion {
    #[must_use]
    pub fn new(outer: Vec<Point2>, holes: Vec<Vec<Point2>>) -> Self {
        Self { outer, holes }
    }

    /// Outer ring followed by every hole ring, in that order.
    pub fn rings(&self) -> impl Iterator<Item = &[Point2]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.rings().map(<[Point2]>::len).sum()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OutlineError {
    #[error("outline contains non-finite coordinates")]
    NonFinite,
    #[error("outer contour has fewer than 3 distinct points")]
    TooFewPoints,
    #[error("outline degenerates after removing duplicate and collinear points")]
    Degenerate,
    #[error("failed to bridge a hole to the outer contour")]
    NoBridge,
    #[error("failed to triangulate outline (no ears found)")]
    NoEars,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineTriangulation {
    /// Every ring point in [`OutlineRegion::rings`] order.
    pub vertices: Vec<Point2>,
    /// CCW triangles indexing `vertices`.
    pub triangles: Vec<[u32; 3]>,
}

/// Signed area (shoelace); positive for CCW rings.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    0.5 * area
}

/// Drops a repeated closing point, duplicate neighbours and collinear points
/// until the ring is stable.
#[must_use]
pub fn clean_ring(points: &[Point2], tol: Tolerance) -> Vec<Point2> {
    let mut ring: Vec<Point2> = points.to_vec();
    loop {
        let n = ring.len();
        if n < 3 {
            return ring;
        }
        let removable = (0..n).find(|&i| {
            let p = ring[(i + n - 1) % n];
            let c = ring[i];
            let q = ring[(i + 1) % n];
            approx_eq_2d(p, c, tol) || distance_point_to_line_2d(p, c, q) <= tol.eps
        });
        match removable {
            Some(i) => {
                ring.remove(i);
            }
            None => return ring,
        }
    }
}

/// Cleans every ring and orients the outer contour CCW and holes CW.
/// Holes that collapse below three points are dropped.
pub fn prepare_region(region: &OutlineRegion, tol: Tolerance) -> Result<OutlineRegion, OutlineError> {
    if region.rings().flatten().any(|p| !p.is_finite()) {
        return Err(OutlineError::NonFinite);
    }

    let mut outer = clean_ring(&region.outer, tol);
    if outer.len() < 3 {
        return Err(OutlineError::TooFewPoints);
    }
    if signed_area(&outer) < 0.0 {
        outer.reverse();
    }

    let holes = region
        .holes
        .iter()
        .map(|hole| clean_ring(hole, tol))
        .filter(|hole| hole.len() >= 3)
        .map(|mut hole| {
            if signed_area(&hole) > 0.0 {
                hole.reverse();
            }
            hole
        })
        .collect();

    Ok(OutlineRegion { outer, holes })
}

/// Triangulates a region by ear clipping after bridging each hole into the
/// outer contour. Input rings are expected to be prepared with
/// [`prepare_region`]; triangle indices refer to the concatenated rings.
pub fn triangulate_region(
    region: &OutlineRegion,
    tol: Tolerance,
) -> Result<OutlineTriangulation, OutlineError> {
    let vertices: Vec<Point2> = region.rings().flatten().copied().collect();
    if vertices.iter().any(|p| !p.is_finite()) {
        return Err(OutlineError::NonFinite);
    }

    let outer_len = region.outer.len();
    if outer_len < 3 {
        return Err(OutlineError::TooFewPoints);
    }

    let mut nodes: Vec<Node> = Vec::with_capacity(vertices.len() + 2 * region.holes.len());
    let outer_start = build_ring_nodes(&mut nodes, 0, outer_len as u32, &vertices);
    let mut outer_start =
        filter_ring_points(outer_start, &mut nodes, tol).ok_or(OutlineError::Degenerate)?;

    let mut hole_starts = Vec::new();
    let mut cursor = outer_len as u32;
    for hole in &region.holes {
        let len = hole.len();
        if len >= 3 {
            let start = build_ring_nodes(&mut nodes, cursor, cursor + len as u32, &vertices);
            if let Some(filtered) = filter_ring_points(start, &mut nodes, tol) {
                hole_starts.push(filtered);
            }
        }
        cursor += len as u32;
    }

    let mut hole_lefts: Vec<usize> = hole_starts
        .into_iter()
        .map(|start| leftmost_node(start, &nodes))
        .collect();
    hole_lefts.sort_by(|&a, &b| {
        let pa = nodes[a].point;
        let pb = nodes[b].point;
        pa.x.total_cmp(&pb.x).then_with(|| pa.y.total_cmp(&pb.y))
    });

    for hole_left in hole_lefts {
        let bridge =
            find_hole_bridge(hole_left, outer_start, &nodes, tol).ok_or(OutlineError::NoBridge)?;
        split_polygon(bridge, hole_left, &mut nodes);
        outer_start =
            filter_ring_points(outer_start, &mut nodes, tol).ok_or(OutlineError::Degenerate)?;
    }

    let triangles = earclip_polygon(outer_start, &mut nodes, tol)?
        .into_iter()
        .filter(|t| t[0] != t[1] && t[1] != t[2] && t[0] != t[2])
        .collect::<Vec<_>>();
    if triangles.is_empty() {
        return Err(OutlineError::Degenerate);
    }

    Ok(OutlineTriangulation {
        vertices,
        triangles,
    })
}

// ─── Ring linked list ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Node {
    idx: u32,
    point: Point2,
    prev: usize,
    next: usize,
}

fn build_ring_nodes(nodes: &mut Vec<Node>, start: u32, end: u32, vertices: &[Point2]) -> usize {
    let start_idx = nodes.len();
    let len = (end - start) as usize;
    for i in 0..len {
        let idx = start + i as u32;
        nodes.push(Node {
            idx,
            point: vertices[idx as usize],
            prev: 0,
            next: 0,
        });
    }

    for i in 0..len {
        let current = start_idx + i;
        nodes[current].prev = start_idx + ((i + len - 1) % len);
        nodes[current].next = start_idx + ((i + 1) % len);
    }

    start_idx
}

fn ring_len(start: usize, nodes: &[Node]) -> usize {
    let mut count = 0usize;
    let mut cur = start;
    loop {
        count += 1;
        cur = nodes[cur].next;
        if cur == start || count > nodes.len().saturating_add(1) {
            break;
        }
    }
    count
}

fn filter_ring_points(start: usize, nodes: &mut [Node], tol: Tolerance) -> Option<usize> {
    if ring_len(start, nodes) < 3 {
        return None;
    }

    let mut start = start;
    let mut cur = start;
    let mut guard = 0usize;

    loop {
        guard += 1;
        if guard > nodes.len().saturating_mul(4).max(16) {
            break;
        }

        let prev = nodes[cur].prev;
        let next = nodes[cur].next;
        if cur == next || cur == prev || prev == next {
            break;
        }

        let p = nodes[prev].point;
        let c = nodes[cur].point;
        let n = nodes[next].point;

        let dup = approx_eq_2d(p, c, tol) || approx_eq_2d(c, n, tol);
        let collinear = distance_point_to_line_2d(p, c, n) <= tol.eps;

        if dup || collinear {
            if cur == start {
                start = next;
            }
            remove_node(cur, nodes);
            cur = prev;
            if ring_len(start, nodes) < 3 {
                return None;
            }
        } else {
            cur = next;
        }

        if cur == start {
            break;
        }
    }

    Some(start)
}

fn leftmost_node(start: usize, nodes: &[Node]) -> usize {
    let mut left = start;
    let mut cur = nodes[start].next;
    while cur != start {
        let a = nodes[cur].point;
        let b = nodes[left].point;
        if a.x < b.x || (a.x == b.x && a.y < b.y) {
            left = cur;
        }
        cur = nodes[cur].next;
    }
    left
}

/// Outer-ring node visible from the hole's leftmost point, found by casting a
/// ray towards -X.
fn find_hole_bridge(hole: usize, outer_start: usize, nodes: &[Node], tol: Tolerance) -> Option<usize> {
    let hole_p = nodes[hole].point;
    let mut best_x = f64::NEG_INFINITY;
    let mut best_edge = None;

    let mut p = outer_start;
    loop {
        let q = nodes[p].next;
        let a = nodes[p].point;
        let b = nodes[q].point;

        if (a.y > hole_p.y) != (b.y > hole_p.y) {
            let t = (hole_p.y - a.y) / (b.y - a.y);
            let x = a.x + t * (b.x - a.x);
            if x <= hole_p.x + tol.eps && x > best_x {
                best_x = x;
                best_edge = Some((p, q));
            }
        }

        p = q;
        if p == outer_start {
            break;
        }
    }

    let (e0, e1) = best_edge?;
    let candidates = if nodes[e0].point.x < nodes[e1].point.x {
        [e0, e1]
    } else {
        [e1, e0]
    };

    for cand in candidates {
        if is_visible(hole_p, nodes[cand].point, cand, outer_start, nodes, tol) {
            return Some(cand);
        }
    }

    let mut best = None;
    let mut best_dist2 = f64::INFINITY;
    let mut v = outer_start;
    loop {
        let p = nodes[v].point;
        if p.x <= hole_p.x + tol.eps && is_visible(hole_p, p, v, outer_start, nodes, tol) {
            let dx = p.x - hole_p.x;
            let dy = p.y - hole_p.y;
            let d2 = dx * dx + dy * dy;
            if d2 < best_dist2 {
                best_dist2 = d2;
                best = Some(v);
            }
        }

        v = nodes[v].next;
        if v == outer_start {
            break;
        }
    }

    best
}

/// Links `a` to `b` with a doubled bridge edge, merging the two rings.
fn split_polygon(a: usize, b: usize, nodes: &mut Vec<Node>) {
    let a_next = nodes[a].next;
    let b_prev = nodes[b].prev;

    let a2 = nodes.len();
    nodes.push(Node {
        idx: nodes[a].idx,
        point: nodes[a].point,
        prev: 0,
        next: 0,
    });

    let b2 = nodes.len();
    nodes.push(Node {
        idx: nodes[b].idx,
        point: nodes[b].point,
        prev: 0,
        next: 0,
    });

    nodes[a].next = b;
    nodes[b].prev = a;

    nodes[b_prev].next = b2;
    nodes[b2].prev = b_prev;

    nodes[b2].next = a2;
    nodes[a2].prev = b2;

    nodes[a2].next = a_next;
    nodes[a_next].prev = a2;
}

fn earclip_polygon(start: usize, nodes: &mut [Node], tol: Tolerance) -> Result<Vec<[u32; 3]>, OutlineError> {
    let mut start = filter_ring_points(start, nodes, tol).ok_or(OutlineError::Degenerate)?;

    let is_ccw = signed_area_ring(start, nodes) > 0.0;
    let mut remaining = ring_len(start, nodes);
    if remaining < 3 {
        return Err(OutlineError::TooFewPoints);
    }

    let mut ear = start;
    let mut stop = start;
    let mut triangles = Vec::with_capacity(remaining.saturating_sub(2));
    let mut passes_without_clip = 0usize;

    while remaining > 2 {
        let prev = nodes[ear].prev;
        let next = nodes[ear].next;
        if is_ear(prev, ear, next, nodes, is_ccw, tol) {
            if is_ccw {
                triangles.push([nodes[prev].idx, nodes[ear].idx, nodes[next].idx]);
            } else {
                triangles.push([nodes[prev].idx, nodes[next].idx, nodes[ear].idx]);
            }

            if ear == start {
                start = next;
            }
            remove_node(ear, nodes);
            remaining -= 1;
            ear = next;
            stop = next;
            passes_without_clip = 0;
            continue;
        }

        ear = next;
        if ear == stop {
            passes_without_clip += 1;
            if passes_without_clip > 2 {
                return Err(OutlineError::NoEars);
            }
            start = filter_ring_points(start, nodes, tol).ok_or(OutlineError::Degenerate)?;
            remaining = ring_len(start, nodes);
            ear = start;
            stop = start;
        }
    }

    Ok(triangles)
}

fn is_ear(prev: usize, ear: usize, next: usize, nodes: &[Node], is_ccw: bool, tol: Tolerance) -> bool {
    let a = nodes[prev].point;
    let b = nodes[ear].point;
    let c = nodes[next].point;

    let cross = orient2d(a, b, c);
    if distance_point_to_line_2d(a, b, c) <= tol.eps {
        return false;
    }

    if is_ccw {
        if cross <= 0.0 {
            return false;
        }
    } else if cross >= 0.0 {
        return false;
    }

    let mut p = nodes[next].next;
    let mut guard = 0usize;
    while p != prev {
        guard += 1;
        if guard > nodes.len().saturating_add(1) {
            break;
        }
        let pt = nodes[p].point;
        let on_corner = approx_eq_2d(pt, a, tol) || approx_eq_2d(pt, b, tol) || approx_eq_2d(pt, c, tol);
        if !on_corner && point_in_triangle(a, b, c, pt, is_ccw, tol) {
            let cross_p = orient2d(nodes[nodes[p].prev].point, pt, nodes[nodes[p].next].point);
            let is_reflex = if is_ccw {
                cross_p <= tol.eps
            } else {
                cross_p >= -tol.eps
            };
            if is_reflex {
                return false;
            }
        }
        p = nodes[p].next;
    }

    true
}

fn signed_area_ring(start: usize, nodes: &[Node]) -> f64 {
    let mut area = 0.0;
    let mut p = start;
    loop {
        let q = nodes[p].next;
        let a = nodes[p].point;
        let b = nodes[q].point;
        area += a.x * b.y - b.x * a.y;
        p = q;
        if p == start {
            break;
        }
    }
    0.5 * area
}

fn remove_node(node: usize, nodes: &mut [Node]) {
    let prev = nodes[node].prev;
    let next = nodes[node].next;
    nodes[prev].next = next;
    nodes[next].prev = prev;
}

// ─── 2D predicates ──────────────────────────────────────────────────────────

fn approx_eq_2d(a: Point2, b: Point2, tol: Tolerance) -> bool {
    (a.x - b.x).abs() <= tol.eps && (a.y - b.y).abs() <= tol.eps
}

fn orient2d(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn point_in_triangle(a: Point2, b: Point2, c: Point2, p: Point2, is_ccw: bool, tol: Tolerance) -> bool {
    let ab = orient2d(a, b, p);
    let bc = orient2d(b, c, p);
    let ca = orient2d(c, a, p);

    if is_ccw {
        ab >= -tol.eps && bc >= -tol.eps && ca >= -tol.eps
    } else {
        ab <= tol.eps && bc <= tol.eps && ca <= tol.eps
    }
}

fn is_visible(a: Point2, b: Point2, b_node: usize, ring_start: usize, nodes: &[Node], tol: Tolerance) -> bool {
    let mut e = ring_start;
    loop {
        let n = nodes[e].next;
        if e != b_node && n != b_node && segments_intersect(a, b, nodes[e].point, nodes[n].point, tol) {
            return false;
        }

        e = n;
        if e == ring_start {
            break;
        }
    }
    true
}

fn segments_intersect(a: Point2, b: Point2, c: Point2, d: Point2, tol: Tolerance) -> bool {
    let o1 = orient2d(a, b, c);
    let o2 = orient2d(a, b, d);
    let o3 = orient2d(c, d, a);
    let o4 = orient2d(c, d, b);

    if o1.abs() <= tol.eps && on_segment(a, c, b, tol) {
        return true;
    }
    if o2.abs() <= tol.eps && on_segment(a, d, b, tol) {
        return true;
    }
    if o3.abs() <= tol.eps && on_segment(c, a, d, tol) {
        return true;
    }
    if o4.abs() <= tol.eps && on_segment(c, b, d, tol) {
        return true;
    }

    let ab = (o1 > tol.eps && o2 < -tol.eps) || (o1 < -tol.eps && o2 > tol.eps);
    let cd = (o3 > tol.eps && o4 < -tol.eps) || (o3 < -tol.eps && o4 > tol.eps);
    ab && cd
}

fn on_segment(a: Point2, p: Point2, b: Point2, tol: Tolerance) -> bool {
    p.x >= a.x.min(b.x) - tol.eps
        && p.x <= a.x.max(b.x) + tol.eps
        && p.y >= a.y.min(b.y) - tol.eps
        && p.y <= a.y.max(b.y) + tol.eps
}

fn distance_point_to_line_2d(a: Point2, p: Point2, b: Point2) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let denom2 = dx * dx + dy * dy;
    if !denom2.is_finite() || denom2 <= 0.0 {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    orient2d(a, b, p).abs() / denom2.sqrt()
}
