use na::{DMatrix, DVector, Matrix2, Matrix3};
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::mass::compute_mass_properties;
use crate::pose::Pose;
use crate::types::{Float, SimScalar};

/// Which end of the current step to evaluate world vertices at
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    Previous,
    Current,
}

/// A rigid body: immutable body-local geometry plus the mutable pose and
/// velocity state advanced by the simulation step.
///
/// Body-local vertices are centered on the center of mass at construction,
/// so the rotation DoFs act about the centroid and the inertia terms in the
/// mass matrix are valid as stored.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidBody {
    /// |V| x dim body-local vertex coordinates, mass-centered
    pub vertices: DMatrix<Float>,
    pub edges: Vec<[usize; 2]>,
    pub faces: Vec<[usize; 3]>,
    /// Per-DoF fixity flags, length ndof
    pub is_dof_fixed: Vec<bool>,
    /// Closed oriented geometry: impact normals point outward instead of
    /// toward the incoming vertex
    pub is_oriented: bool,

    pub pose: Pose<Float>,
    pub pose_prev: Pose<Float>,
    pub velocity: Pose<Float>,
    pub velocity_prev: Pose<Float>,

    pub mass: Float,
    /// 1x1 scalar moment in 2D, full 3x3 tensor in 3D
    pub inertia: DMatrix<Float>,
    /// Diagonal rotational mass terms: the 2D moment, or the 3D principal
    /// moments (inertia eigenvalues)
    pub principal_inertia: DVector<Float>,
    /// Diagonal of the ndof x ndof mass matrix
    pub mass_matrix: DVector<Float>,
    pub inv_mass_matrix: DVector<Float>,
    /// max ‖vᵢ‖² over body-local vertices, the rotation DoF scale
    pub r_max: Float,
}

impl RigidBody {
    /// Build a body from world-space vertices. The vertices are shifted by
    /// the pose position, re-centered on their center of mass, and the pose
    /// position adjusted so world vertices are unchanged.
    pub fn from_points(
        vertices: DMatrix<Float>,
        edges: Vec<[usize; 2]>,
        faces: Vec<[usize; 3]>,
        pose: Pose<Float>,
        velocity: Pose<Float>,
        density: Float,
        is_dof_fixed: Vec<bool>,
        is_oriented: bool,
    ) -> SimResult<RigidBody> {
        let dim = vertices.ncols();
        if dim != pose.dim() || dim != velocity.dim() {
            return Err(SimError::InvalidGeometry(format!(
                "vertex dimension {} does not match pose dimension {} / velocity dimension {}",
                dim,
                pose.dim(),
                velocity.dim()
            )));
        }
        if is_dof_fixed.len() != pose.ndof() {
            return Err(SimError::InvalidGeometry(format!(
                "{} fixity flags for {} degrees of freedom",
                is_dof_fixed.len(),
                pose.ndof()
            )));
        }

        let mut world = vertices;
        for mut row in world.row_iter_mut() {
            row += pose.position.transpose();
        }

        let props = compute_mass_properties(&world, &edges, &faces, density);
        let mut centered = world;
        for mut row in centered.row_iter_mut() {
            row -= props.center.transpose();
        }

        // keep world vertices where they were: the new position is the centroid
        let adjusted_pose = Pose::new(props.center.clone(), pose.rotation.clone());

        RigidBody::new(
            centered,
            edges,
            faces,
            adjusted_pose,
            velocity,
            density,
            is_dof_fixed,
            is_oriented,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn new(
        vertices: DMatrix<Float>,
        edges: Vec<[usize; 2]>,
        faces: Vec<[usize; 3]>,
        pose: Pose<Float>,
        velocity: Pose<Float>,
        density: Float,
        is_dof_fixed: Vec<bool>,
        is_oriented: bool,
    ) -> SimResult<RigidBody> {
        let dim = vertices.ncols();
        let props = compute_mass_properties(&vertices, &edges, &faces, density);

        if !(props.mass > 0.0) || !props.mass.is_finite() {
            return Err(SimError::InvalidGeometry(format!(
                "non-positive mass {}",
                props.mass
            )));
        }
        if props.center.norm_squared() > 1e-8 {
            return Err(SimError::InvalidGeometry(format!(
                "vertices are not mass-centered: |centroid|² = {}",
                props.center.norm_squared()
            )));
        }

        let principal_inertia = if dim == 3 {
            let tensor = Matrix3::from_iterator(props.inertia.iter().cloned());
            let eigenvalues = na::SymmetricEigen::new(tensor).eigenvalues;
            DVector::from_column_slice(eigenvalues.as_slice())
        } else {
            props.inertia.diagonal()
        };

        let ndof = pose.ndof();
        let pos_ndof = pose.pos_ndof();
        let mut mass_matrix = DVector::zeros(ndof);
        for i in 0..pos_ndof {
            mass_matrix[i] = props.mass;
        }
        for i in pos_ndof..ndof {
            mass_matrix[i] = principal_inertia[i - pos_ndof];
        }
        let inv_mass_matrix = mass_matrix.map(|m| 1.0 / m);

        let r_max = vertices
            .row_iter()
            .map(|r| r.norm_squared())
            .fold(0.0, Float::max);

        debug!(
            mass = props.mass,
            r_max, "constructed rigid body with {} vertices", vertices.nrows()
        );

        Ok(RigidBody {
            vertices,
            edges,
            faces,
            is_dof_fixed,
            is_oriented,
            pose_prev: pose.clone(),
            pose,
            velocity_prev: velocity.clone(),
            velocity,
            mass: props.mass,
            inertia: props.inertia,
            principal_inertia,
            mass_matrix,
            inv_mass_matrix,
            r_max,
        })
    }

    pub fn dim(&self) -> usize {
        self.vertices.ncols()
    }

    pub fn ndof(&self) -> usize {
        self.pose.ndof()
    }

    pub fn pos_ndof(&self) -> usize {
        self.pose.pos_ndof()
    }

    pub fn rot_ndof(&self) -> usize {
        self.pose.rot_ndof()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.nrows()
    }

    /// World position of one vertex under an arbitrary pose:
    /// R(pose.rotation)·vᵢ + pose.position
    pub fn world_vertex<T: SimScalar>(&self, pose: &Pose<T>, vertex_id: usize) -> DVector<T> {
        let r = pose.construct_rotation_matrix();
        let v = self.vertices.row(vertex_id).transpose().map(T::from_float);
        r * v + pose.position.clone()
    }

    /// All world vertices under an arbitrary pose, one row per vertex
    pub fn world_vertices<T: SimScalar>(&self, pose: &Pose<T>) -> DMatrix<T> {
        let r = pose.construct_rotation_matrix();
        let body = self.vertices.map(T::from_float);
        let mut world = body * r.transpose();
        let dim = self.dim();
        for i in 0..world.nrows() {
            for d in 0..dim {
                world[(i, d)] += pose.position[d];
            }
        }
        world
    }

    pub fn world_vertices_at(&self, step: Step) -> DMatrix<Float> {
        match step {
            Step::Previous => self.world_vertices(&self.pose_prev),
            Step::Current => self.world_vertices(&self.pose),
        }
    }

    /// Analytic Jacobian of flattened world vertices (x₀, x₁, …, y₀, y₁, …)
    /// with respect to the pose DoFs. Shape |V|·dim x ndof.
    pub fn world_vertices_gradient_exact(&self, pose: &Pose<Float>) -> DMatrix<Float> {
        let n = self.vertices.nrows();
        let dim = self.dim();
        let mut gradient = DMatrix::zeros(n * dim, pose.ndof());

        // positional columns are selector matrices
        for i in 0..pose.pos_ndof() {
            for j in 0..n {
                gradient[(i * n + j, i)] = 1.0;
            }
        }

        // rotational columns are flatten(V · dR/dθᵢᵀ)
        let grad_r = pose.construct_rotation_matrix_gradient();
        for (i, dr) in grad_r.iter().enumerate() {
            let dv = &self.vertices * dr.transpose();
            gradient
                .column_mut(i + pose.pos_ndof())
                .copy_from(&crate::util::flatten(&dv));
        }

        gradient
    }

    /// Per-vertex world velocities dR/dθ·vᵢ·θ̇ + ṗ. 2D only.
    pub fn world_velocities(&self) -> SimResult<DMatrix<Float>> {
        if self.dim() != 2 {
            return Err(SimError::NotImplemented(
                "world velocities are only available in 2D",
            ));
        }
        let dr = &self.pose.construct_rotation_matrix_gradient()[0];
        let mut vel = (&self.vertices * dr.transpose()) * self.velocity.rotation[0];
        for mut row in vel.row_iter_mut() {
            row += self.velocity.position.transpose();
        }
        Ok(vel)
    }

    /// 2D rotation-matrix gradient evaluated at an interpolated angle, used
    /// for the perpendicular contact arm r⊥ = dR/dθ · r
    pub fn grad_theta(theta: Float) -> Matrix2<Float> {
        let (s, c) = theta.sin_cos();
        Matrix2::new(-s, -c, c, -s)
    }
}

#[cfg(test)]
mod rigid_body_tests {
    use na::{dmatrix, dvector};

    use super::*;
    use crate::assert_close;
    use crate::autodiff::Dual;
    use crate::helpers::build_rectangle_body;
    use crate::interval::Interval;

    #[test]
    fn construction_centers_vertices_on_center_of_mass() {
        // Arrange: an off-center square handed in with a nonzero pose
        let vertices = dmatrix![
            0.0, 0.0;
            1.0, 0.0;
            1.0, 1.0;
            0.0, 1.0
        ];
        let edges = vec![[0, 1], [1, 2], [2, 3], [3, 0]];
        let pose = Pose::new(dvector![5.0, -1.0], dvector![0.0]);

        // Act
        let body = RigidBody::from_points(
            vertices,
            edges,
            vec![],
            pose,
            Pose::zero(2),
            1.0,
            vec![false; 3],
            false,
        )
        .unwrap();

        // Assert: centroid invariant holds and world vertices are unchanged
        let centroid = body.vertices.row_sum() / body.vertices.nrows() as Float;
        assert!(centroid.norm_squared() < 1e-8);
        assert_close!(body.pose.position[0], 5.5, 1e-12);
        assert_close!(body.pose.position[1], -0.5, 1e-12);
        let world = body.world_vertices_at(Step::Current);
        assert_close!(world[(0, 0)], 5.0, 1e-12);
        assert_close!(world[(0, 1)], -1.0, 1e-12);
    }

    #[test]
    fn zero_mass_geometry_is_rejected() {
        let vertices = dmatrix![0.0, 0.0; 1.0, 0.0];
        let r = RigidBody::from_points(
            vertices,
            vec![], // no edges, no mass
            vec![],
            Pose::zero(2),
            Pose::zero(2),
            1.0,
            vec![false; 3],
            false,
        );
        assert!(matches!(r, Err(SimError::InvalidGeometry(_))));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let vertices = dmatrix![0.0, 0.0; 1.0, 0.0];
        let r = RigidBody::from_points(
            vertices,
            vec![[0, 1]],
            vec![],
            Pose::zero(3), // 3D pose for 2D vertices
            Pose::zero(3),
            1.0,
            vec![false; 6],
            false,
        );
        assert!(matches!(r, Err(SimError::InvalidGeometry(_))));
    }

    #[test]
    fn world_vertices_rotate_about_the_centroid() {
        let body = build_rectangle_body(
            1.0,
            1.0,
            Pose::new(dvector![2.0, 0.0], dvector![crate::PI / 2.0]),
            Pose::zero(2),
        );

        let world = body.world_vertices_at(Step::Current);
        // corner (0.5, 0.5) rotates to (-0.5, 0.5) about (2, 0)
        let i = (0..4)
            .find(|&i| {
                (body.vertices[(i, 0)] - 0.5).abs() < 1e-12
                    && (body.vertices[(i, 1)] - 0.5).abs() < 1e-12
            })
            .unwrap();
        assert_close!(world[(i, 0)], 1.5, 1e-12);
        assert_close!(world[(i, 1)], 0.5, 1e-12);
    }

    #[test]
    fn analytic_gradient_matches_forward_autodiff() {
        // Invariant: the analytic Jacobian and dual-number differentiation of
        // the same generic routine agree
        let body = build_rectangle_body(
            2.0,
            1.0,
            Pose::new(dvector![0.3, -0.7], dvector![0.4]),
            Pose::zero(2),
        );

        let exact = body.world_vertices_gradient_exact(&body.pose);

        // seed the three pose DoFs as differentiation variables
        let dpose = Pose::<Dual<3>>::new(
            dvector![
                Dual::variable(body.pose.position[0], 0),
                Dual::variable(body.pose.position[1], 1)
            ],
            dvector![Dual::variable(body.pose.rotation[0], 2)],
        );
        let world = body.world_vertices(&dpose);

        let n = body.num_vertices();
        for i in 0..n {
            for d in 0..2 {
                let row = d * n + i;
                for k in 0..3 {
                    assert_close!(exact[(row, k)], world[(i, d)].grad[k], 1e-6);
                }
            }
        }
    }

    #[test]
    fn world_velocities_require_2d() {
        let vertices = dmatrix![
            -1.0, 0.0, 1.0;
            1.0, 0.0, 1.0;
            0.0, 0.0, -1.0
        ];
        let body = RigidBody::from_points(
            vertices,
            vec![],
            vec![[0, 1, 2]],
            Pose::zero(3),
            Pose::zero(3),
            1.0,
            vec![false; 6],
            false,
        )
        .unwrap();
        assert!(matches!(
            body.world_velocities(),
            Err(SimError::NotImplemented(_))
        ));
    }

    #[test]
    fn world_velocities_compose_rotation_and_translation() {
        let mut body = build_rectangle_body(1.0, 1.0, Pose::zero(2), Pose::zero(2));
        body.velocity = Pose::new(dvector![1.0, 0.0], dvector![2.0]);

        let vel = body.world_velocities().unwrap();
        // vertex (0.5, 0.5): dR/dθ at θ=0 maps it to (-0.5, 0.5); times ω=2
        // plus translation (1, 0)
        let i = (0..4)
            .find(|&i| body.vertices[(i, 0)] > 0.0 && body.vertices[(i, 1)] > 0.0)
            .unwrap();
        assert_close!(vel[(i, 0)], 1.0 - 1.0, 1e-12);
        assert_close!(vel[(i, 1)], 1.0, 1e-12);
    }

    #[test]
    fn interval_world_vertex_contains_float_evaluation() {
        // Invariant: interval evaluation encloses the pointwise evaluation
        // for every sampled time along the trajectory
        let body = build_rectangle_body(
            1.0,
            1.0,
            Pose::new(dvector![0.0, 1.0], dvector![0.1]),
            Pose::zero(2),
        );
        let displacement = Pose::<Float>::new(dvector![2.0, -2.0], dvector![0.5]);

        for k in 0..=20 {
            let t = k as Float / 20.0;
            let pose_t = body.pose.clone() + displacement.clone() * t;
            let pose_i =
                body.pose.cast_interval() + displacement.cast_interval() * Interval::point(t);
            for vid in 0..body.num_vertices() {
                let exact = body.world_vertex(&pose_t, vid);
                let boxed = body.world_vertex(&pose_i, vid);
                for d in 0..2 {
                    assert!(
                        boxed[d].contains(exact[d]),
                        "vertex {} dim {} at t={}: {} not in [{}, {}]",
                        vid,
                        d,
                        t,
                        exact[d],
                        boxed[d].lower(),
                        boxed[d].upper()
                    );
                }
            }
        }
    }
}
