use tracing::debug;

use crate::ccd::interval_root_finder::{interval_root_finder, RootFinderOptions};
use crate::error::{SimError, SimResult};
use crate::geometry::{point_line_signed_distance, point_plane_signed_distance, triangle_normal};
use crate::interval::{overlap_componentwise, Interval, VectorDI};
use crate::pose::Pose;
use crate::rigid_body::RigidBody;
use crate::types::Float;

/// Earliest time in [0, 1] at which a vertex of body A passes through an
/// edge of body B while both bodies move by their pose displacements.
/// Returns the conservative lower bound of the root enclosure, so the
/// reported time is never past the true time of impact.
pub fn compute_edge_vertex_time_of_impact(
    body_a: &RigidBody,
    pose_a: &Pose<Float>,
    displacement_a: &Pose<Float>,
    vertex_id: usize,
    body_b: &RigidBody,
    pose_b: &Pose<Float>,
    displacement_b: &Pose<Float>,
    edge_id: usize,
    options: &RootFinderOptions,
) -> SimResult<Option<Float>> {
    assert_eq!(body_a.dim(), 2);
    assert_eq!(body_b.dim(), 2);

    let pose_a = pose_a.cast_interval();
    let pose_b = pose_b.cast_interval();
    let displacement_a = displacement_a.cast_interval();
    let displacement_b = displacement_b.cast_interval();
    let edge = body_b.edges[edge_id];

    // world positions of the vertex and the edge endpoints at time t
    let vertices_at = |t: Interval| -> (VectorDI, VectorDI, VectorDI) {
        let pa = pose_a.clone() + displacement_a.clone() * t;
        let pb = pose_b.clone() + displacement_b.clone() * t;
        (
            body_a.world_vertex(&pa, vertex_id),
            body_b.world_vertex(&pb, edge[0]),
            body_b.world_vertex(&pb, edge[1]),
        )
    };

    let distance = |t: Interval| -> SimResult<Interval> {
        let (v0, v1, v2) = vertices_at(t);
        let d = point_line_signed_distance(&v0, &v1, &v2);
        if d.has_nan() {
            // the edge was (momentarily) degenerate over this time range
            return Err(SimError::BadArithmetic("degenerate edge in signed distance"));
        }
        Ok(d)
    };

    let is_point_along_edge = |t: Interval| -> SimResult<bool> {
        let (v0, v1, v2) = vertices_at(t);
        let edge_vec = &v2 - &v1;
        let alpha = (&v0 - &v1)
            .dot(&edge_vec)
            .checked_div(edge_vec.dot(&edge_vec))?;
        Ok(alpha.overlap(&Interval::UNIT))
    };

    let toi = interval_root_finder(distance, is_point_along_edge, Interval::UNIT, options)?;
    if let Some(t) = toi {
        debug!(
            vertex_id,
            edge_id,
            toi = t.lower(),
            "vertex-edge impact"
        );
    }
    Ok(toi.map(|t| t.lower()))
}

/// Edge-edge time of impact is not available for rigid trajectories.
pub fn compute_edge_edge_time_of_impact(
    _body_a: &RigidBody,
    _pose_a: &Pose<Float>,
    _displacement_a: &Pose<Float>,
    _edge_a_id: usize,
    _body_b: &RigidBody,
    _pose_b: &Pose<Float>,
    _displacement_b: &Pose<Float>,
    _edge_b_id: usize,
    _options: &RootFinderOptions,
) -> SimResult<Option<Float>> {
    Err(SimError::NotImplemented(
        "edge-edge time of impact for rigid bodies",
    ))
}

/// Earliest time in [0, 1] at which a vertex of body A passes through a
/// face of body B (3D).
pub fn compute_face_vertex_time_of_impact(
    body_a: &RigidBody,
    pose_a: &Pose<Float>,
    displacement_a: &Pose<Float>,
    vertex_id: usize,
    body_b: &RigidBody,
    pose_b: &Pose<Float>,
    displacement_b: &Pose<Float>,
    face_id: usize,
    options: &RootFinderOptions,
) -> SimResult<Option<Float>> {
    assert_eq!(body_a.dim(), 3);
    assert_eq!(body_b.dim(), 3);

    let pose_a = pose_a.cast_interval();
    let pose_b = pose_b.cast_interval();
    let displacement_a = displacement_a.cast_interval();
    let displacement_b = displacement_b.cast_interval();
    let face = body_b.faces[face_id];

    let vertices_at = |t: Interval| -> (VectorDI, VectorDI, VectorDI, VectorDI) {
        let pa = pose_a.clone() + displacement_a.clone() * t;
        let pb = pose_b.clone() + displacement_b.clone() * t;
        (
            body_a.world_vertex(&pa, vertex_id),
            body_b.world_vertex(&pb, face[0]),
            body_b.world_vertex(&pb, face[1]),
            body_b.world_vertex(&pb, face[2]),
        )
    };

    let distance = |t: Interval| -> SimResult<Interval> {
        let (p, f0, f1, f2) = vertices_at(t);
        let n = triangle_normal(&f0, &f1, &f2);
        let d = point_plane_signed_distance(&p, &f0, &n);
        if d.has_nan() {
            return Err(SimError::BadArithmetic("degenerate face in signed distance"));
        }
        Ok(d)
    };

    // the point projects inside the face when the three sub-triangle
    // normals (query point substituted for each face vertex in turn) are
    // componentwise co-consistent
    let is_point_inside_face = |t: Interval| -> SimResult<bool> {
        let (p, f0, f1, f2) = vertices_at(t);
        let n0 = triangle_normal(&p, &f1, &f2);
        let n1 = triangle_normal(&f0, &p, &f2);
        let n2 = triangle_normal(&f0, &f1, &p);
        Ok(overlap_componentwise(&n0, &n1)
            && overlap_componentwise(&n1, &n2)
            && overlap_componentwise(&n0, &n2))
    };

    let toi = interval_root_finder(distance, is_point_inside_face, Interval::UNIT, options)?;
    Ok(toi.map(|t| t.lower()))
}
