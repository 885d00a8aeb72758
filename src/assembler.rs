use itertools::izip;
use na::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::error::{SimError, SimResult};
use crate::pose::Pose;
use crate::rigid_body::{RigidBody, Step};
use crate::types::Float;

/// Aggregates rigid bodies into global vertex/edge/face index spaces.
///
/// Bodies live in one owned arena; edges and faces refer to vertices through
/// global integer indices (local indices shifted by the owning body's vertex
/// offset). The prefix-sum arrays resolve any global index back to
/// (body, local index) by binary search. Derived quantities (mass matrix,
/// DoF scaling) are built once here and read-only afterwards.
#[derive(Clone, Debug)]
pub struct RigidBodyAssembler {
    pub bodies: Vec<RigidBody>,

    /// Prefix sums, length num_bodies + 1
    pub body_vertex_start: Vec<usize>,
    pub body_edge_start: Vec<usize>,
    pub body_face_start: Vec<usize>,

    /// Edges and faces in global vertex indices
    pub edges: Vec<[usize; 2]>,
    pub faces: Vec<[usize; 3]>,
    /// Owning body of every global vertex
    pub vertex_to_body: Vec<usize>,

    /// Block-diagonal rigid mass matrix, one diagonal ndof x ndof block per
    /// body: mass on positional DoFs, principal moments on rotational ones
    pub rb_mass_matrix: CscMatrix<Float>,
    /// Diagonal scaling from pose parameters to commensurate DoFs: 1 on
    /// positional entries, r_max on rotational entries
    pub pose_to_dof: DVector<Float>,
    pub dof_to_pose: DVector<Float>,
    /// Concatenated per-body fixity flags, length num_bodies * ndof
    pub is_rb_dof_fixed: Vec<bool>,
}

impl RigidBodyAssembler {
    pub fn new(bodies: Vec<RigidBody>) -> SimResult<RigidBodyAssembler> {
        if let Some(first) = bodies.first() {
            if bodies.iter().any(|rb| rb.dim() != first.dim()) {
                return Err(SimError::InvalidGeometry(
                    "bodies of mixed dimension in one assembly".to_string(),
                ));
            }
        }

        let num_bodies = bodies.len();
        let mut body_vertex_start = vec![0; num_bodies + 1];
        let mut body_edge_start = vec![0; num_bodies + 1];
        let mut body_face_start = vec![0; num_bodies + 1];
        for (i, rb) in bodies.iter().enumerate() {
            body_vertex_start[i + 1] = body_vertex_start[i] + rb.num_vertices();
            body_edge_start[i + 1] = body_edge_start[i] + rb.edges.len();
            body_face_start[i + 1] = body_face_start[i] + rb.faces.len();
        }

        let mut edges = Vec::with_capacity(body_edge_start[num_bodies]);
        let mut faces = Vec::with_capacity(body_face_start[num_bodies]);
        let mut vertex_to_body = Vec::with_capacity(body_vertex_start[num_bodies]);
        for (i, rb) in bodies.iter().enumerate() {
            let offset = body_vertex_start[i];
            edges.extend(rb.edges.iter().map(|e| [e[0] + offset, e[1] + offset]));
            faces.extend(
                rb.faces
                    .iter()
                    .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
            );
            vertex_to_body.extend(std::iter::repeat(i).take(rb.num_vertices()));
        }

        let ndof = bodies.first().map_or(0, |rb| rb.ndof());
        let mut mass_triplets = CooMatrix::new(num_bodies * ndof, num_bodies * ndof);
        let mut pose_to_dof = DVector::zeros(num_bodies * ndof);
        let mut is_rb_dof_fixed = Vec::with_capacity(num_bodies * ndof);
        for (i, rb) in bodies.iter().enumerate() {
            let base = ndof * i;
            // the per-body block is the body's own diagonal mass matrix:
            // mass entries first, then the principal moments
            for d in 0..ndof {
                mass_triplets.push(base + d, base + d, rb.mass_matrix[d]);
            }
            for d in 0..rb.pos_ndof() {
                pose_to_dof[base + d] = 1.0;
            }
            for d in 0..rb.rot_ndof() {
                pose_to_dof[base + rb.pos_ndof() + d] = rb.r_max;
            }
            is_rb_dof_fixed.extend_from_slice(&rb.is_dof_fixed);
        }

        Ok(RigidBodyAssembler {
            rb_mass_matrix: CscMatrix::from(&mass_triplets),
            dof_to_pose: pose_to_dof.map(|s| 1.0 / s),
            pose_to_dof,
            is_rb_dof_fixed,
            bodies,
            body_vertex_start,
            body_edge_start,
            body_face_start,
            edges,
            faces,
            vertex_to_body,
        })
    }

    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    pub fn num_vertices(&self) -> usize {
        *self.body_vertex_start.last().unwrap_or(&0)
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn dim(&self) -> usize {
        self.bodies.first().map_or(0, |rb| rb.dim())
    }

    fn locate(starts: &[usize], global_id: usize) -> (usize, usize) {
        debug_assert!(global_id < *starts.last().unwrap());
        let body = starts.partition_point(|&s| s <= global_id) - 1;
        (body, global_id - starts[body])
    }

    /// Resolve a global vertex index to (body, local vertex)
    pub fn global_to_local_vertex(&self, global_vertex_id: usize) -> (usize, usize) {
        Self::locate(&self.body_vertex_start, global_vertex_id)
    }

    pub fn global_to_local_edge(&self, global_edge_id: usize) -> (usize, usize) {
        Self::locate(&self.body_edge_start, global_edge_id)
    }

    pub fn global_to_local_face(&self, global_face_id: usize) -> (usize, usize) {
        Self::locate(&self.body_face_start, global_face_id)
    }

    pub fn rb_poses(&self, previous: bool) -> Vec<Pose<Float>> {
        self.bodies
            .iter()
            .map(|rb| {
                if previous {
                    rb.pose_prev.clone()
                } else {
                    rb.pose.clone()
                }
            })
            .collect()
    }

    pub fn set_rb_poses(&mut self, poses: &[Pose<Float>]) {
        assert_eq!(self.num_bodies(), poses.len());
        for (rb, pose) in izip!(self.bodies.iter_mut(), poses.iter()) {
            rb.pose = pose.clone();
        }
    }

    /// Stacked world vertices of every body, |V| x dim
    pub fn world_vertices_at(&self, step: Step) -> DMatrix<Float> {
        let mut world = DMatrix::zeros(self.num_vertices(), self.dim());
        for (i, rb) in self.bodies.iter().enumerate() {
            world
                .rows_mut(self.body_vertex_start[i], rb.num_vertices())
                .copy_from(&rb.world_vertices_at(step));
        }
        world
    }

    /// Stacked per-vertex world velocities (2D)
    pub fn world_velocities(&self) -> SimResult<DMatrix<Float>> {
        let mut velocities = DMatrix::zeros(self.num_vertices(), self.dim());
        for (i, rb) in self.bodies.iter().enumerate() {
            velocities
                .rows_mut(self.body_vertex_start[i], rb.num_vertices())
                .copy_from(&rb.world_velocities()?);
        }
        Ok(velocities)
    }

    /// Global Jacobian of flattened world vertices with respect to all body
    /// DoFs, assembled from per-body analytic Jacobians by triplets.
    /// Shape (num_vertices * dim) x (num_bodies * ndof).
    pub fn world_vertices_gradient(&self, poses: &[Pose<Float>]) -> CscMatrix<Float> {
        assert_eq!(self.num_bodies(), poses.len());
        let dim = self.dim();
        let nv = self.num_vertices();
        let ndof = self.bodies.first().map_or(0, |rb| rb.ndof());

        let mut triplets = CooMatrix::new(nv * dim, self.num_bodies() * ndof);
        for (i, (rb, pose)) in izip!(self.bodies.iter(), poses.iter()).enumerate() {
            let body_grad = rb.world_vertices_gradient_exact(pose);
            let n = rb.num_vertices();
            for d in 0..dim {
                for j in 0..n {
                    for k in 0..ndof {
                        triplets.push(
                            d * nv + self.body_vertex_start[i] + j,
                            ndof * i + k,
                            body_grad[(d * n + j, k)],
                        );
                    }
                }
            }
        }
        CscMatrix::from(&triplets)
    }
}

#[cfg(test)]
mod assembler_tests {
    use na::dvector;

    use super::*;
    use crate::assert_close;
    use crate::helpers::build_rectangle_body;

    fn three_squares() -> RigidBodyAssembler {
        let mut bodies = vec![];
        for i in 0..3 {
            bodies.push(build_rectangle_body(
                1.0,
                1.0,
                Pose::new(dvector![3.0 * i as Float, 0.0], dvector![0.0]),
                Pose::zero(2),
            ));
        }
        RigidBodyAssembler::new(bodies).unwrap()
    }

    #[test]
    fn global_indices_resolve_back_to_local() {
        let assembler = three_squares();

        assert_eq!(assembler.num_vertices(), 12);
        assert_eq!(assembler.num_edges(), 12);

        for body in 0..3 {
            for local in 0..4 {
                let global = assembler.body_vertex_start[body] + local;
                assert_eq!(assembler.global_to_local_vertex(global), (body, local));
                assert_eq!(assembler.vertex_to_body[global], body);

                let global_edge = assembler.body_edge_start[body] + local;
                assert_eq!(assembler.global_to_local_edge(global_edge), (body, local));
            }
        }
    }

    #[test]
    fn global_edges_are_shifted_by_the_vertex_offset() {
        let assembler = three_squares();
        for (i, edge) in assembler.edges.iter().enumerate() {
            let (body, local) = assembler.global_to_local_edge(i);
            let local_edge = assembler.bodies[body].edges[local];
            assert_eq!(edge[0], local_edge[0] + assembler.body_vertex_start[body]);
            assert_eq!(edge[1], local_edge[1] + assembler.body_vertex_start[body]);
        }
    }

    #[test]
    fn poses_roundtrip_through_the_assembler() {
        let mut assembler = three_squares();
        let mut poses = assembler.rb_poses(false);
        poses[1] = Pose::new(dvector![7.0, -2.0], dvector![0.3]);

        assembler.set_rb_poses(&poses);
        assert_eq!(assembler.rb_poses(false), poses);
        // pose_prev untouched
        assert_close!(assembler.rb_poses(true)[1].position[0], 3.0, 1e-12);
    }

    #[test]
    fn mass_matrix_blocks_carry_mass_and_inertia() {
        let assembler = three_squares();
        let m = &assembler.rb_mass_matrix;
        assert_eq!(m.nrows(), 9);

        let dense = na::DMatrix::from(m);
        for i in 0..3 {
            let rb = &assembler.bodies[i];
            assert_close!(dense[(3 * i, 3 * i)], rb.mass, 1e-12);
            assert_close!(dense[(3 * i + 1, 3 * i + 1)], rb.mass, 1e-12);
            assert_close!(dense[(3 * i + 2, 3 * i + 2)], rb.principal_inertia[0], 1e-12);
        }
    }

    #[test]
    fn rotational_blocks_are_diagonal_principal_moments() {
        // a tilted triangle whose 3D inertia tensor has nonzero products of
        // inertia: the global block must still be the principal diagonal
        let tilted = RigidBody::from_points(
            na::dmatrix![
                1.0, 0.0, 0.0;
                0.0, 1.0, 0.0;
                0.0, 0.0, 1.0
            ],
            vec![],
            vec![[0, 1, 2]],
            Pose::zero(3),
            Pose::zero(3),
            1.0,
            vec![false; 6],
            false,
        )
        .unwrap();
        assert!(tilted.inertia[(0, 1)].abs() > 1e-6);

        let assembler = RigidBodyAssembler::new(vec![tilted]).unwrap();
        let dense = na::DMatrix::from(&assembler.rb_mass_matrix);
        assert_eq!(dense.nrows(), 6);

        let rb = &assembler.bodies[0];
        for a in 0..3 {
            assert_close!(dense[(a, a)], rb.mass, 1e-12);
            for b in 0..3 {
                let expected = if a == b { rb.principal_inertia[a] } else { 0.0 };
                assert_close!(dense[(3 + a, 3 + b)], expected, 1e-12);
            }
        }
    }

    #[test]
    fn dof_scaling_uses_r_max_on_rotational_entries() {
        let assembler = three_squares();
        for i in 0..3 {
            assert_close!(assembler.pose_to_dof[3 * i], 1.0, 1e-12);
            assert_close!(assembler.pose_to_dof[3 * i + 1], 1.0, 1e-12);
            assert_close!(
                assembler.pose_to_dof[3 * i + 2],
                assembler.bodies[i].r_max,
                1e-12
            );
            assert_close!(
                assembler.dof_to_pose[3 * i + 2] * assembler.pose_to_dof[3 * i + 2],
                1.0,
                1e-12
            );
        }
    }

    #[test]
    fn world_vertices_concatenate_per_body_results() {
        let assembler = three_squares();
        let world = assembler.world_vertices_at(Step::Current);
        assert_eq!(world.nrows(), 12);
        for (i, rb) in assembler.bodies.iter().enumerate() {
            let expected = rb.world_vertices_at(Step::Current);
            for j in 0..4 {
                for d in 0..2 {
                    assert_close!(
                        world[(assembler.body_vertex_start[i] + j, d)],
                        expected[(j, d)],
                        1e-12
                    );
                }
            }
        }
    }

    #[test]
    fn world_velocities_stack_per_body_results() {
        use approx::assert_relative_eq;

        let mut assembler = three_squares();
        assembler.bodies[1].velocity = Pose::new(dvector![1.0, -2.0], dvector![0.5]);

        let velocities = assembler.world_velocities().unwrap();
        assert_eq!(velocities.nrows(), 12);
        for (i, rb) in assembler.bodies.iter().enumerate() {
            let expected = rb.world_velocities().unwrap();
            for j in 0..4 {
                for d in 0..2 {
                    assert_relative_eq!(
                        velocities[(assembler.body_vertex_start[i] + j, d)],
                        expected[(j, d)],
                        epsilon = 1e-12
                    );
                }
            }
        }
    }

    #[test]
    fn global_gradient_matches_body_jacobians() {
        let assembler = three_squares();
        let poses = assembler.rb_poses(false);
        let grad = assembler.world_vertices_gradient(&poses);

        assert_eq!(grad.nrows(), 24);
        assert_eq!(grad.ncols(), 9);

        let dense = na::DMatrix::from(&grad);
        let nv = assembler.num_vertices();
        for (i, rb) in assembler.bodies.iter().enumerate() {
            let body_grad = rb.world_vertices_gradient_exact(&poses[i]);
            let n = rb.num_vertices();
            for d in 0..2 {
                for j in 0..n {
                    for k in 0..3 {
                        assert_close!(
                            dense[(d * nv + assembler.body_vertex_start[i] + j, 3 * i + k)],
                            body_grad[(d * n + j, k)],
                            1e-12
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn mixed_dimension_bodies_are_rejected() {
        let square = build_rectangle_body(1.0, 1.0, Pose::zero(2), Pose::zero(2));
        let triangle = RigidBody::from_points(
            na::dmatrix![
                -1.0, 0.0, 1.0;
                1.0, 0.0, 1.0;
                0.0, 0.0, -1.0
            ],
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
            RigidBodyAssembler::new(vec![square, triangle]),
            Err(SimError::InvalidGeometry(_))
        ));
    }
}
