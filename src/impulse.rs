use itertools::izip;
use na::Vector2;

use crate::assembler::RigidBodyAssembler;
use crate::ccd::EdgeVertexImpact;
use crate::rigid_body::{RigidBody, Step};
use crate::types::Float;

/// Newton-restitution impulse resolution over a time-ordered list of
/// vertex-edge impacts (2D).
///
/// Normals are precomputed for every impact before any velocity changes,
/// since the sweep mutates the very velocities the later normals' flip test
/// would otherwise read. Impulses are then applied in non-decreasing
/// time-of-impact order; a DoF flagged fixed contributes zero inverse
/// mass/inertia to the effective mass and is never written.
///
/// With restitution 1 and all DoFs free the total linear and angular
/// momentum of each colliding pair is unchanged; with restitution below 1
/// kinetic energy strictly decreases.
pub fn solve_velocities(
    assembler: &mut RigidBodyAssembler,
    impacts: &[EdgeVertexImpact],
    restitution: Float,
) {
    assert_eq!(assembler.dim(), 2);

    let vertices_t0 = assembler.world_vertices_at(Step::Previous);
    let vertices_t1 = assembler.world_vertices_at(Step::Current);

    // contact normals at each impact's time, before any velocity updates
    let mut normals: Vec<Vector2<Float>> = Vec::with_capacity(impacts.len());
    for impact in impacts {
        let toi = impact.time;
        let edge = assembler.edges[impact.edge_index];
        let a_id = impact.vertex_index;
        let (b0_id, b1_id) = (edge[0], edge[1]);
        let body_b = &assembler.bodies[assembler.vertex_to_body[b0_id]];

        let at_toi = |vid: usize| -> Vector2<Float> {
            Vector2::new(
                vertices_t0[(vid, 0)] + toi * (vertices_t1[(vid, 0)] - vertices_t0[(vid, 0)]),
                vertices_t0[(vid, 1)] + toi * (vertices_t1[(vid, 1)] - vertices_t0[(vid, 1)]),
            )
        };
        let e_toi = at_toi(b1_id) - at_toi(b0_id);
        let mut n_toi = Vector2::new(-e_toi.y, e_toi.x).normalize(); // 90° ccw

        if body_b.is_oriented {
            n_toi = -n_toi;
        } else {
            // point the normal from the edge toward the incoming vertex
            let va = Vector2::new(vertices_t0[(a_id, 0)], vertices_t0[(a_id, 1)]);
            let vb = Vector2::new(vertices_t0[(b0_id, 0)], vertices_t0[(b0_id, 1)]);
            if (va - vb).dot(&n_toi) <= 0.0 {
                n_toi = -n_toi;
            }
        }
        normals.push(n_toi);
    }

    let mut prev_toi: Float = -1.0;
    for (impact, &n_toi) in izip!(impacts.iter(), normals.iter()) {
        let toi = impact.time;
        debug_assert!(prev_toi <= toi);
        prev_toi = toi;
        let alpha = impact.alpha;

        let edge = assembler.edges[impact.edge_index];
        let a_id = impact.vertex_index;
        let (b0_id, b1_id) = (edge[0], edge[1]);

        let (body_a_id, r_a_id) = assembler.global_to_local_vertex(a_id);
        let (body_b_id, r_b0_id) = assembler.global_to_local_vertex(b0_id);
        let (_, r_b1_id) = assembler.global_to_local_vertex(b1_id);

        let body_a = &assembler.bodies[body_a_id];
        let body_b = &assembler.bodies[body_b_id];

        // centroid velocities interpolated to the time of collision
        let lerp_velocity = |rb: &RigidBody| -> (Vector2<Float>, Float) {
            let lin = Vector2::new(
                rb.velocity_prev.position[0]
                    + toi * (rb.velocity.position[0] - rb.velocity_prev.position[0]),
                rb.velocity_prev.position[1]
                    + toi * (rb.velocity.position[1] - rb.velocity_prev.position[1]),
            );
            let ang = rb.velocity_prev.rotation[0]
                + toi * (rb.velocity.rotation[0] - rb.velocity_prev.rotation[0]);
            (lin, ang)
        };
        let (V_a_prev, w_a_prev) = lerp_velocity(body_a);
        let (V_b_prev, w_b_prev) = lerp_velocity(body_b);

        // inverse mass-matrix entries: 1/mass on the positional DoFs,
        // 1/principal-moment on the rotational one
        let inv_m_a = if body_a.is_dof_fixed[0] || body_a.is_dof_fixed[1] {
            0.0
        } else {
            body_a.inv_mass_matrix[0]
        };
        let inv_m_b = if body_b.is_dof_fixed[0] || body_b.is_dof_fixed[1] {
            0.0
        } else {
            body_b.inv_mass_matrix[0]
        };
        let inv_I_a = if body_a.is_dof_fixed[2] {
            0.0
        } else {
            body_a.inv_mass_matrix[2]
        };
        let inv_I_b = if body_b.is_dof_fixed[2] {
            0.0
        } else {
            body_b.inv_mass_matrix[2]
        };

        // body-local contact points
        let r0_a = Vector2::new(body_a.vertices[(r_a_id, 0)], body_a.vertices[(r_a_id, 1)]);
        let r0_b0 = Vector2::new(body_b.vertices[(r_b0_id, 0)], body_b.vertices[(r_b0_id, 1)]);
        let r0_b1 = Vector2::new(body_b.vertices[(r_b1_id, 0)], body_b.vertices[(r_b1_id, 1)]);
        let r0_b = r0_b0 + alpha * (r0_b1 - r0_b0);

        // perpendicular contact arms through the rotation gradient at the
        // angle interpolated to the time of collision
        let theta_a_toi = body_a.pose_prev.rotation[0]
            + toi * (body_a.pose.rotation[0] - body_a.pose_prev.rotation[0]);
        let theta_b_toi = body_b.pose_prev.rotation[0]
            + toi * (body_b.pose.rotation[0] - body_b.pose_prev.rotation[0]);
        let r_a_perp = RigidBody::grad_theta(theta_a_toi) * r0_a;
        let r_b_perp = RigidBody::grad_theta(theta_b_toi) * r0_b;

        // contact-point velocities before the collision
        let v_a_prev = V_a_prev + w_a_prev * r_a_perp;
        let v_b_prev = V_b_prev + w_b_prev * r_b_perp;

        let v_rel_prev = (v_a_prev - v_b_prev).dot(&n_toi);
        if v_rel_prev >= 0.0 {
            continue; // separating
        }

        let nr_a = n_toi.dot(&r_a_perp);
        let nr_b = n_toi.dot(&r_b_perp);
        let K = inv_m_a + inv_m_b + inv_I_a * nr_a * nr_a + inv_I_b * nr_b * nr_b;
        let j = -(1.0 + restitution) * v_rel_prev / K;

        let V_a = V_a_prev + inv_m_a * j * n_toi;
        let V_b = V_b_prev - inv_m_b * j * n_toi;
        let w_a = w_a_prev + inv_I_a * j * nr_a;
        let w_b = w_b_prev - inv_I_b * j * nr_b;

        {
            let body_a = &mut assembler.bodies[body_a_id];
            if !(body_a.is_dof_fixed[0] || body_a.is_dof_fixed[1]) {
                body_a.velocity.position[0] = V_a.x;
                body_a.velocity.position[1] = V_a.y;
            }
            if !body_a.is_dof_fixed[2] {
                body_a.velocity.rotation[0] = w_a;
            }
        }
        {
            let body_b = &mut assembler.bodies[body_b_id];
            if !(body_b.is_dof_fixed[0] || body_b.is_dof_fixed[1]) {
                body_b.velocity.position[0] = V_b.x;
                body_b.velocity.position[1] = V_b.y;
            }
            if !body_b.is_dof_fixed[2] {
                body_b.velocity.rotation[0] = w_b;
            }
        }
    }
}
