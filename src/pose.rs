use std::ops::{Add, Div, Mul, Sub};

use na::{DMatrix, DVector};

use crate::interval::Interval;
use crate::types::{Float, SimScalar};

/// Position and rotation parameters of a rigid body.
///
/// In 2D the rotation is a single angle; in 3D it is three Euler angles
/// (α, β, γ) applied as R = Rz(γ)·Ry(β)·Rx(α). Poses form an additive group
/// on the concatenated parameter vector, which is what lets a displacement
/// be scaled by a time interval and added to a starting pose.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose<T: SimScalar> {
    pub position: DVector<T>,
    pub rotation: DVector<T>,
}

impl<T: SimScalar> Pose<T> {
    pub fn new(position: DVector<T>, rotation: DVector<T>) -> Self {
        assert_eq!(
            rotation.len(),
            Pose::<T>::dim_to_rot_ndof(position.len()),
            "rotation ndof does not match position dimension"
        );
        Pose { position, rotation }
    }

    pub fn zero(dim: usize) -> Self {
        Pose {
            position: DVector::zeros(dim),
            rotation: DVector::zeros(Pose::<T>::dim_to_rot_ndof(dim)),
        }
    }

    pub fn dim(&self) -> usize {
        self.position.len()
    }

    pub fn pos_ndof(&self) -> usize {
        self.position.len()
    }

    pub fn rot_ndof(&self) -> usize {
        self.rotation.len()
    }

    pub fn ndof(&self) -> usize {
        self.pos_ndof() + self.rot_ndof()
    }

    pub fn dim_to_rot_ndof(dim: usize) -> usize {
        assert!(dim == 2 || dim == 3, "only 2D and 3D poses are supported");
        if dim == 2 {
            1
        } else {
            3
        }
    }

    pub fn dim_to_ndof(dim: usize) -> usize {
        dim + Pose::<T>::dim_to_rot_ndof(dim)
    }

    /// Concatenated DoF vector (position then rotation)
    pub fn dof(&self) -> DVector<T> {
        let mut dof = DVector::zeros(self.ndof());
        dof.rows_mut(0, self.pos_ndof()).copy_from(&self.position);
        dof.rows_mut(self.pos_ndof(), self.rot_ndof())
            .copy_from(&self.rotation);
        dof
    }

    pub fn from_dof(dof: &DVector<T>, dim: usize) -> Self {
        assert_eq!(dof.len(), Pose::<T>::dim_to_ndof(dim));
        Pose {
            position: dof.rows(0, dim).into_owned(),
            rotation: dof.rows(dim, Pose::<T>::dim_to_rot_ndof(dim)).into_owned(),
        }
    }

    /// Cast to another scalar, e.g. Float to Interval
    pub fn map<U: SimScalar>(&self, f: impl Fn(T) -> U) -> Pose<U> {
        Pose {
            position: self.position.map(&f),
            rotation: self.rotation.map(&f),
        }
    }

    pub fn lerp(p0: &Pose<T>, p1: &Pose<T>, t: T) -> Pose<T> {
        (p1.clone() - p0.clone()) * t + p0.clone()
    }

    pub fn construct_rotation_matrix(&self) -> DMatrix<T> {
        if self.dim() == 2 {
            let s = self.rotation[0].sin();
            let c = self.rotation[0].cos();
            DMatrix::from_row_slice(2, 2, &[c, -s, s, c])
        } else {
            rot_z(self.rotation[2]) * rot_y(self.rotation[1]) * rot_x(self.rotation[0])
        }
    }

    /// dR/dθ_i, one matrix per rotational DoF
    pub fn construct_rotation_matrix_gradient(&self) -> Vec<DMatrix<T>> {
        if self.dim() == 2 {
            let s = self.rotation[0].sin();
            let c = self.rotation[0].cos();
            vec![DMatrix::from_row_slice(2, 2, &[-s, -c, c, -s])]
        } else {
            let rx = rot_x(self.rotation[0]);
            let ry = rot_y(self.rotation[1]);
            let rz = rot_z(self.rotation[2]);
            let dx = drot_x(self.rotation[0]);
            let dy = drot_y(self.rotation[1]);
            let dz = drot_z(self.rotation[2]);
            vec![
                rz.clone() * ry.clone() * dx,
                rz * dy * rx.clone(),
                dz * ry * rx,
            ]
        }
    }

    /// d²R/dθ_i dθ_j as a rot_ndof × rot_ndof block of matrices. Symmetric.
    pub fn construct_rotation_matrix_hessian(&self) -> Vec<Vec<DMatrix<T>>> {
        if self.dim() == 2 {
            // d²R/dθ² = -R
            return vec![vec![-self.construct_rotation_matrix()]];
        }
        let rx = rot_x(self.rotation[0]);
        let ry = rot_y(self.rotation[1]);
        let rz = rot_z(self.rotation[2]);
        let dx = drot_x(self.rotation[0]);
        let dy = drot_y(self.rotation[1]);
        let dz = drot_z(self.rotation[2]);
        let ddx = ddrot_x(self.rotation[0]);
        let ddy = ddrot_y(self.rotation[1]);
        let ddz = ddrot_z(self.rotation[2]);

        let h00 = rz.clone() * ry.clone() * ddx;
        let h01 = rz.clone() * dy.clone() * dx.clone();
        let h02 = dz.clone() * ry.clone() * dx;
        let h11 = rz * ddy * rx.clone();
        let h12 = dz.clone() * dy * rx.clone();
        let h22 = ddz * ry * rx;

        vec![
            vec![h00, h01.clone(), h02.clone()],
            vec![h01, h11, h12.clone()],
            vec![h02, h12, h22],
        ]
    }
}

impl Pose<Float> {
    /// Cast to interval scalars for conservative evaluation
    pub fn cast_interval(&self) -> Pose<Interval> {
        self.map(Interval::point)
    }
}

fn rot_x<T: SimScalar>(angle: T) -> DMatrix<T> {
    let s = angle.sin();
    let c = angle.cos();
    let o = T::zero();
    let l = T::one();
    DMatrix::from_row_slice(3, 3, &[l, o, o, o, c, -s, o, s, c])
}

fn rot_y<T: SimScalar>(angle: T) -> DMatrix<T> {
    let s = angle.sin();
    let c = angle.cos();
    let o = T::zero();
    let l = T::one();
    DMatrix::from_row_slice(3, 3, &[c, o, s, o, l, o, -s, o, c])
}

fn rot_z<T: SimScalar>(angle: T) -> DMatrix<T> {
    let s = angle.sin();
    let c = angle.cos();
    let o = T::zero();
    let l = T::one();
    DMatrix::from_row_slice(3, 3, &[c, -s, o, s, c, o, o, o, l])
}

fn drot_x<T: SimScalar>(angle: T) -> DMatrix<T> {
    let s = angle.sin();
    let c = angle.cos();
    let o = T::zero();
    DMatrix::from_row_slice(3, 3, &[o, o, o, o, -s, -c, o, c, -s])
}

fn drot_y<T: SimScalar>(angle: T) -> DMatrix<T> {
    let s = angle.sin();
    let c = angle.cos();
    let o = T::zero();
    DMatrix::from_row_slice(3, 3, &[-s, o, c, o, o, o, -c, o, -s])
}

fn drot_z<T: SimScalar>(angle: T) -> DMatrix<T> {
    let s = angle.sin();
    let c = angle.cos();
    let o = T::zero();
    DMatrix::from_row_slice(3, 3, &[-s, -c, o, c, -s, o, o, o, o])
}

fn ddrot_x<T: SimScalar>(angle: T) -> DMatrix<T> {
    let s = angle.sin();
    let c = angle.cos();
    let o = T::zero();
    DMatrix::from_row_slice(3, 3, &[o, o, o, o, -c, s, o, -s, -c])
}

fn ddrot_y<T: SimScalar>(angle: T) -> DMatrix<T> {
    let s = angle.sin();
    let c = angle.cos();
    let o = T::zero();
    DMatrix::from_row_slice(3, 3, &[-c, o, -s, o, o, o, s, o, -c])
}

fn ddrot_z<T: SimScalar>(angle: T) -> DMatrix<T> {
    let s = angle.sin();
    let c = angle.cos();
    let o = T::zero();
    DMatrix::from_row_slice(3, 3, &[-c, s, o, -s, -c, o, o, o, o])
}

impl<T: SimScalar> Add for Pose<T> {
    type Output = Pose<T>;

    fn add(self, rhs: Pose<T>) -> Pose<T> {
        Pose {
            position: self.position + rhs.position,
            rotation: self.rotation + rhs.rotation,
        }
    }
}

impl<T: SimScalar> Sub for Pose<T> {
    type Output = Pose<T>;

    fn sub(self, rhs: Pose<T>) -> Pose<T> {
        Pose {
            position: self.position - rhs.position,
            rotation: self.rotation - rhs.rotation,
        }
    }
}

impl<T: SimScalar> Mul<T> for Pose<T> {
    type Output = Pose<T>;

    fn mul(self, rhs: T) -> Pose<T> {
        Pose {
            position: self.position * rhs,
            rotation: self.rotation * rhs,
        }
    }
}

impl<T: SimScalar> Div<T> for Pose<T> {
    type Output = Pose<T>;

    fn div(self, rhs: T) -> Pose<T> {
        Pose {
            position: self.position / rhs,
            rotation: self.rotation / rhs,
        }
    }
}
