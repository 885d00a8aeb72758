use na::dmatrix;

use crate::pose::Pose;
use crate::rigid_body::RigidBody;
use crate::types::Float;

/// Axis-aligned rectangle outline (4 vertices, 4 edges) with unit density
/// and every DoF free
pub fn build_rectangle_body(
    width: Float,
    height: Float,
    pose: Pose<Float>,
    velocity: Pose<Float>,
) -> RigidBody {
    build_rectangle_body_with(width, height, pose, velocity, 1.0, vec![false; 3])
}

pub fn build_rectangle_body_with(
    width: Float,
    height: Float,
    pose: Pose<Float>,
    velocity: Pose<Float>,
    density: Float,
    is_dof_fixed: Vec<bool>,
) -> RigidBody {
    let (w, h) = (width / 2.0, height / 2.0);
    let vertices = dmatrix![
        -w, -h;
        w, -h;
        w, h;
        -w, h
    ];
    let edges = vec![[0, 1], [1, 2], [2, 3], [3, 0]];

    RigidBody::from_points(
        vertices,
        edges,
        vec![],
        pose,
        velocity,
        density,
        is_dof_fixed,
        false,
    )
    .expect("rectangle geometry is valid")
}

/// Two-vertex segment body
pub fn build_segment_body(
    p0: [Float; 2],
    p1: [Float; 2],
    pose: Pose<Float>,
    velocity: Pose<Float>,
) -> RigidBody {
    let vertices = dmatrix![
        p0[0], p0[1];
        p1[0], p1[1]
    ];
    RigidBody::from_points(
        vertices,
        vec![[0, 1]],
        vec![],
        pose,
        velocity,
        1.0,
        vec![false; 3],
        false,
    )
    .expect("segment geometry is valid")
}

#[cfg(test)]
mod helpers_tests {
    use na::dvector;

    use super::*;
    use crate::assert_close;

    #[test]
    fn rectangle_mass_scales_with_perimeter_and_density() {
        let body = build_rectangle_body_with(
            2.0,
            1.0,
            Pose::zero(2),
            Pose::zero(2),
            0.5,
            vec![false; 3],
        );
        assert_close!(body.mass, 3.0, 1e-12);
        assert_eq!(body.num_vertices(), 4);
        assert_eq!(body.edges.len(), 4);
    }

    #[test]
    fn segment_body_keeps_its_world_endpoints() {
        let body = build_segment_body(
            [0.0, 1.0],
            [0.0, 2.0],
            Pose::zero(2),
            Pose::new(dvector![1.0, 0.0], dvector![0.0]),
        );
        let v0 = body.world_vertex(&body.pose, 0);
        assert_close!(v0[0], 0.0, 1e-12);
        assert_close!(v0[1], 1.0, 1e-12);
    }
}
