use na::{DMatrix, DVector};

use crate::types::Float;

/// Total mass, center of mass, and moment of inertia of a body, computed
/// from vertex-lumped masses: each edge (2D) or face (3D) spreads its
/// length- or area-proportional mass evenly onto its incident vertices.
/// The inertia is taken about the returned center of mass.
#[derive(Clone, Debug, PartialEq)]
pub struct MassProperties {
    pub mass: Float,
    pub center: DVector<Float>,
    /// 1x1 in 2D (scalar moment), 3x3 tensor in 3D
    pub inertia: DMatrix<Float>,
}

pub fn compute_mass_properties(
    vertices: &DMatrix<Float>,
    edges: &[[usize; 2]],
    faces: &[[usize; 3]],
    density: Float,
) -> MassProperties {
    if vertices.ncols() == 2 {
        compute_mass_properties_2d(vertices, edges, density)
    } else {
        compute_mass_properties_3d(vertices, faces, density)
    }
}

/// Per-vertex lumped masses: half of each incident edge's length
pub fn compute_vertex_masses_2d(
    vertices: &DMatrix<Float>,
    edges: &[[usize; 2]],
    density: Float,
) -> DVector<Float> {
    let mut masses = DVector::zeros(vertices.nrows());
    for e in edges {
        let d = vertices.row(e[1]) - vertices.row(e[0]);
        let half = 0.5 * d.norm() * density;
        masses[e[0]] += half;
        masses[e[1]] += half;
    }
    masses
}

/// Per-vertex lumped masses: a third of each incident face's area
pub fn compute_vertex_masses_3d(
    vertices: &DMatrix<Float>,
    faces: &[[usize; 3]],
    density: Float,
) -> DVector<Float> {
    let mut masses = DVector::zeros(vertices.nrows());
    for f in faces {
        let u = (vertices.row(f[1]) - vertices.row(f[0])).transpose();
        let v = (vertices.row(f[2]) - vertices.row(f[0])).transpose();
        let ux: na::Vector3<Float> = na::Vector3::new(u[0], u[1], u[2]);
        let vx: na::Vector3<Float> = na::Vector3::new(v[0], v[1], v[2]);
        let area = 0.5 * ux.cross(&vx).norm();
        let third = area / 3.0 * density;
        masses[f[0]] += third;
        masses[f[1]] += third;
        masses[f[2]] += third;
    }
    masses
}

fn center_of_mass(vertices: &DMatrix<Float>, masses: &DVector<Float>) -> (Float, DVector<Float>) {
    let total: Float = masses.sum();
    let dim = vertices.ncols();
    let mut center = DVector::zeros(dim);
    if total > 0.0 {
        for (i, m) in masses.iter().enumerate() {
            for d in 0..dim {
                center[d] += m * vertices[(i, d)];
            }
        }
        center /= total;
    }
    (total, center)
}

fn compute_mass_properties_2d(
    vertices: &DMatrix<Float>,
    edges: &[[usize; 2]],
    density: Float,
) -> MassProperties {
    let masses = compute_vertex_masses_2d(vertices, edges, density);
    let (mass, center) = center_of_mass(vertices, &masses);

    // scalar moment about the center: Σ mᵢ ‖rᵢ‖²
    let mut moment = 0.0;
    for (i, m) in masses.iter().enumerate() {
        let rx = vertices[(i, 0)] - center[0];
        let ry = vertices[(i, 1)] - center[1];
        moment += m * (rx * rx + ry * ry);
    }

    MassProperties {
        mass,
        center,
        inertia: DMatrix::from_element(1, 1, moment),
    }
}

fn compute_mass_properties_3d(
    vertices: &DMatrix<Float>,
    faces: &[[usize; 3]],
    density: Float,
) -> MassProperties {
    let masses = compute_vertex_masses_3d(vertices, faces, density);
    let (mass, center) = center_of_mass(vertices, &masses);

    // Σ mᵢ (‖rᵢ‖² I₃ − rᵢ rᵢᵀ)
    let mut inertia = DMatrix::zeros(3, 3);
    for (i, m) in masses.iter().enumerate() {
        let r = [
            vertices[(i, 0)] - center[0],
            vertices[(i, 1)] - center[1],
            vertices[(i, 2)] - center[2],
        ];
        let r2 = r[0] * r[0] + r[1] * r[1] + r[2] * r[2];
        for a in 0..3 {
            for b in 0..3 {
                let kronecker = if a == b { r2 } else { 0.0 };
                inertia[(a, b)] += m * (kronecker - r[a] * r[b]);
            }
        }
    }

    MassProperties {
        mass,
        center,
        inertia,
    }
}
