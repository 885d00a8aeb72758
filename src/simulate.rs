use na::Vector3;
use serde::{Deserialize, Serialize};

use crate::assembler::RigidBodyAssembler;
use crate::ccd::{
    brute_force_edge_vertex_candidates, detect_edge_vertex_collisions, EdgeVertexImpact,
    RootFinderOptions,
};
use crate::error::{SimError, SimResult};
use crate::impulse::solve_velocities;
use crate::pose::Pose;
use crate::rigid_body::RigidBody;
use crate::types::Float;

/// Simulation configuration surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Scale on the candidate displacement for the conservative collision
    /// pass: displacements are stretched by (1 + collision_eps)
    pub collision_eps: Float,
    /// Newton restitution coefficient e in [0, 1]. A negative value
    /// disables impulse resolution; velocities are then re-derived from
    /// (pose - pose_prev) / h after the step.
    pub coefficient_restitution: Float,
    /// Gravity; in 2D only the first two entries are used
    pub gravity: Vector3<Float>,
    /// Time tolerance of the interval root finder
    pub root_finder_tolerance: Float,
    pub max_bisection_depth: usize,
}

impl Default for SimSettings {
    fn default() -> Self {
        SimSettings {
            collision_eps: 2.0,
            coefficient_restitution: 0.0,
            gravity: Vector3::zeros(),
            root_finder_tolerance: 1e-6,
            max_bisection_depth: 64,
        }
    }
}

impl SimSettings {
    pub fn root_finder_options(&self) -> RootFinderOptions {
        RootFinderOptions {
            tol_t: self.root_finder_tolerance,
            max_depth: self.max_bisection_depth,
            ..RootFinderOptions::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionCheck {
    /// Displacements as proposed
    Exact,
    /// Displacements stretched by (1 + collision_eps)
    Conservative,
}

/// Next pose proposed from the current velocity and gravity over one step;
/// fixed DoFs are held in place.
fn pose_next(rb: &RigidBody, gravity: &Vector3<Float>, time_step: Float) -> Pose<Float> {
    let dim = rb.dim();
    let mut dof = rb.pose.dof();
    let vel = rb.velocity.dof();
    for i in 0..dof.len() {
        if rb.is_dof_fixed[i] {
            continue;
        }
        dof[i] += time_step * vel[i]; // momentum
        if i < dim {
            dof[i] += time_step * time_step * gravity[i]; // body forces
        }
    }
    Pose::from_dof(&dof, dim)
}

/// Detect vertex-edge impacts between the previous and current poses of
/// every body (2D).
pub fn detect_collisions(
    assembler: &RigidBodyAssembler,
    settings: &SimSettings,
    check: CollisionCheck,
) -> SimResult<Vec<EdgeVertexImpact>> {
    let scale = match check {
        CollisionCheck::Exact => 1.0,
        CollisionCheck::Conservative => 1.0 + settings.collision_eps,
    };
    let poses_t0 = assembler.rb_poses(true);
    let displacements: Vec<Pose<Float>> = assembler
        .bodies
        .iter()
        .map(|rb| (rb.pose.clone() - rb.pose_prev.clone()) * scale)
        .collect();
    let candidates = brute_force_edge_vertex_candidates(assembler);
    detect_edge_vertex_collisions(
        assembler,
        &poses_t0,
        &displacements,
        &candidates,
        &settings.root_finder_options(),
    )
}

/// One simulated step (2D): propose next poses from the current velocities
/// plus gravity, run continuous collision detection over the step, and
/// resolve the impacts with restitution impulses (or re-derive velocities
/// from positions when impulses are disabled). Position correction for any
/// remaining penetration is the optimizer's job, outside this core.
///
/// Returns the impacts resolved during the step.
pub fn simulation_step(
    assembler: &mut RigidBodyAssembler,
    settings: &SimSettings,
    time_step: Float,
) -> SimResult<Vec<EdgeVertexImpact>> {
    if assembler.dim() != 2 {
        return Err(SimError::NotImplemented("the step driver is 2D-only"));
    }

    for rb in assembler.bodies.iter_mut() {
        rb.pose_prev = rb.pose.clone();
        rb.velocity_prev = rb.velocity.clone();
        rb.pose = pose_next(rb, &settings.gravity, time_step);
        rb.velocity = (rb.pose.clone() - rb.pose_prev.clone()) / time_step;
    }

    let impacts = detect_collisions(assembler, settings, CollisionCheck::Exact)?;

    if settings.coefficient_restitution < 0.0 {
        // impulses disabled: velocities follow the positions
        for rb in assembler.bodies.iter_mut() {
            rb.velocity = (rb.pose.clone() - rb.pose_prev.clone()) / time_step;
        }
    } else {
        solve_velocities(assembler, &impacts, settings.coefficient_restitution);
    }

    Ok(impacts)
}

/// Per-body state as persisted: DoF arrays for position and velocity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub position: Vec<Float>,
    pub velocity: Vec<Float>,
}

/// Scene state snapshot handed to the serialization layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub rigid_bodies: Vec<BodySnapshot>,
    pub linear_momentum: Vec<Float>,
    pub angular_momentum: Float,
    pub kinetic_energy: Float,
    pub potential_energy: Float,
}

/// Summarize positions, velocities, momenta and energies of the scene.
/// Gravitational potential is only accumulated for bodies free to fall.
pub fn state_snapshot(assembler: &RigidBodyAssembler, settings: &SimSettings) -> SceneSnapshot {
    let dim = assembler.dim();
    let mut linear_momentum = vec![0.0; dim];
    let mut angular_momentum = 0.0;
    let mut kinetic_energy = 0.0;
    let mut potential_energy = 0.0;

    let mut rigid_bodies = Vec::with_capacity(assembler.num_bodies());
    for rb in &assembler.bodies {
        rigid_bodies.push(BodySnapshot {
            position: rb.pose.dof().iter().cloned().collect(),
            velocity: rb.velocity.dof().iter().cloned().collect(),
        });

        for d in 0..dim {
            linear_momentum[d] += rb.mass * rb.velocity.position[d];
        }
        for (inertia, omega) in rb
            .principal_inertia
            .iter()
            .zip(rb.velocity.rotation.iter())
        {
            angular_momentum += inertia * omega;
            kinetic_energy += 0.5 * inertia * omega * omega;
        }
        kinetic_energy += 0.5 * rb.mass * rb.velocity.position.norm_squared();

        let translation_free = (0..rb.pos_ndof()).all(|d| !rb.is_dof_fixed[d]);
        if translation_free {
            for d in 0..dim {
                potential_energy -= rb.mass * settings.gravity[d] * rb.pose.position[d];
            }
        }
    }

    SceneSnapshot {
        rigid_bodies,
        linear_momentum,
        angular_momentum,
        kinetic_energy,
        potential_energy,
    }
}
