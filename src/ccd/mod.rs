use rayon::prelude::*;

use crate::assembler::RigidBodyAssembler;
use crate::error::SimResult;
use crate::pose::Pose;
use crate::types::Float;

pub mod interval_root_finder;
pub mod rigid_body_toi;

pub use interval_root_finder::{interval_root_finder, RootFinderOptions};
pub use rigid_body_toi::{
    compute_edge_edge_time_of_impact, compute_edge_vertex_time_of_impact,
    compute_face_vertex_time_of_impact,
};

/// A vertex-edge pair worth testing for continuous collision, in global
/// indices. Produced by the broad phase (or the brute-force fallback).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeVertexCandidate {
    pub edge_index: usize,
    pub vertex_index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceVertexCandidate {
    pub face_index: usize,
    pub vertex_index: usize,
}

/// A confirmed vertex-edge impact during the step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeVertexImpact {
    /// Conservative time of impact in [0, 1]
    pub time: Float,
    pub edge_index: usize,
    pub vertex_index: usize,
    /// Parametric position of the contact along the edge, clamped to [0, 1]
    pub alpha: Float,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceVertexImpact {
    pub time: Float,
    pub face_index: usize,
    pub vertex_index: usize,
}

/// Every cross-body vertex-edge pair. The hash-grid broad phase lives
/// outside the core; this is the exhaustive fallback.
pub fn brute_force_edge_vertex_candidates(
    assembler: &RigidBodyAssembler,
) -> Vec<EdgeVertexCandidate> {
    let mut candidates = vec![];
    for (edge_index, edge) in assembler.edges.iter().enumerate() {
        let edge_body = assembler.vertex_to_body[edge[0]];
        for vertex_index in 0..assembler.num_vertices() {
            if assembler.vertex_to_body[vertex_index] != edge_body {
                candidates.push(EdgeVertexCandidate {
                    edge_index,
                    vertex_index,
                });
            }
        }
    }
    candidates
}

pub fn brute_force_face_vertex_candidates(
    assembler: &RigidBodyAssembler,
) -> Vec<FaceVertexCandidate> {
    let mut candidates = vec![];
    for (face_index, face) in assembler.faces.iter().enumerate() {
        let face_body = assembler.vertex_to_body[face[0]];
        for vertex_index in 0..assembler.num_vertices() {
            if assembler.vertex_to_body[vertex_index] != face_body {
                candidates.push(FaceVertexCandidate {
                    face_index,
                    vertex_index,
                });
            }
        }
    }
    candidates
}

/// Run the vertex-edge TOI query over every candidate pair and return the
/// impacts sorted by time (stable, so simultaneous impacts keep candidate
/// order). The queries only read body geometry and poses, so they run in
/// parallel; the collect preserves candidate order for determinism.
pub fn detect_edge_vertex_collisions(
    assembler: &RigidBodyAssembler,
    poses_t0: &[Pose<Float>],
    displacements: &[Pose<Float>],
    candidates: &[EdgeVertexCandidate],
    options: &RootFinderOptions,
) -> SimResult<Vec<EdgeVertexImpact>> {
    let maybe_impacts: Vec<Option<EdgeVertexImpact>> = candidates
        .par_iter()
        .map(|candidate| -> SimResult<Option<EdgeVertexImpact>> {
            let (vertex_body, local_vertex) =
                assembler.global_to_local_vertex(candidate.vertex_index);
            let (edge_body, local_edge) = assembler.global_to_local_edge(candidate.edge_index);

            let toi = compute_edge_vertex_time_of_impact(
                &assembler.bodies[vertex_body],
                &poses_t0[vertex_body],
                &displacements[vertex_body],
                local_vertex,
                &assembler.bodies[edge_body],
                &poses_t0[edge_body],
                &displacements[edge_body],
                local_edge,
                options,
            )?;

            Ok(toi.map(|time| EdgeVertexImpact {
                time,
                edge_index: candidate.edge_index,
                vertex_index: candidate.vertex_index,
                alpha: edge_vertex_alpha(
                    assembler,
                    poses_t0,
                    displacements,
                    candidate,
                    time,
                ),
            }))
        })
        .collect::<SimResult<_>>()?;

    let mut impacts: Vec<EdgeVertexImpact> = maybe_impacts.into_iter().flatten().collect();
    impacts.sort_by(|a, b| a.time.total_cmp(&b.time));
    Ok(impacts)
}

pub fn detect_face_vertex_collisions(
    assembler: &RigidBodyAssembler,
    poses_t0: &[Pose<Float>],
    displacements: &[Pose<Float>],
    candidates: &[FaceVertexCandidate],
    options: &RootFinderOptions,
) -> SimResult<Vec<FaceVertexImpact>> {
    let maybe_impacts: Vec<Option<FaceVertexImpact>> = candidates
        .par_iter()
        .map(|candidate| -> SimResult<Option<FaceVertexImpact>> {
            let (vertex_body, local_vertex) =
                assembler.global_to_local_vertex(candidate.vertex_index);
            let (face_body, local_face) = assembler.global_to_local_face(candidate.face_index);

            let toi = compute_face_vertex_time_of_impact(
                &assembler.bodies[vertex_body],
                &poses_t0[vertex_body],
                &displacements[vertex_body],
                local_vertex,
                &assembler.bodies[face_body],
                &poses_t0[face_body],
                &displacements[face_body],
                local_face,
                options,
            )?;

            Ok(toi.map(|time| FaceVertexImpact {
                time,
                face_index: candidate.face_index,
                vertex_index: candidate.vertex_index,
            }))
        })
        .collect::<SimResult<_>>()?;

    let mut impacts: Vec<FaceVertexImpact> = maybe_impacts.into_iter().flatten().collect();
    impacts.sort_by(|a, b| a.time.total_cmp(&b.time));
    Ok(impacts)
}

/// Scalar projection of the impacting vertex onto the edge at the time of
/// impact, clamped to [0, 1]
fn edge_vertex_alpha(
    assembler: &RigidBodyAssembler,
    poses_t0: &[Pose<Float>],
    displacements: &[Pose<Float>],
    candidate: &EdgeVertexCandidate,
    time: Float,
) -> Float {
    let (vertex_body, local_vertex) = assembler.global_to_local_vertex(candidate.vertex_index);
    let (edge_body, local_edge) = assembler.global_to_local_edge(candidate.edge_index);
    let edge = assembler.bodies[edge_body].edges[local_edge];

    let pose_a = poses_t0[vertex_body].clone() + displacements[vertex_body].clone() * time;
    let pose_b = poses_t0[edge_body].clone() + displacements[edge_body].clone() * time;

    let v0 = assembler.bodies[vertex_body].world_vertex(&pose_a, local_vertex);
    let v1 = assembler.bodies[edge_body].world_vertex(&pose_b, edge[0]);
    let v2 = assembler.bodies[edge_body].world_vertex(&pose_b, edge[1]);

    let e = &v2 - &v1;
    let len2 = e.dot(&e);
    if len2 <= 0.0 {
        return 0.0;
    }
    ((&v0 - &v1).dot(&e) / len2).clamp(0.0, 1.0)
}
