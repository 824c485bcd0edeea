use nalgebra::{Matrix3, Vector3};

const MIN_SEPARATION: f64 = 1e-12;

#[inline]
pub fn harmonic(dist: f64, r0: f64, k: f64) -> f64 {
    0.5 * k * (dist - r0).powi(2)
}

/// Gradient of a harmonic spring with respect to the second particle.
///
/// `delta` is the separation vector `x_b - x_a`; the gradient with respect to
/// the first particle is the negative. Returns `None` when the particles
/// coincide and the spring has a nonzero rest length.
#[inline]
pub fn spring_gradient(delta: &Vector3<f64>, r0: f64, k: f64) -> Option<Vector3<f64>> {
    let dist = delta.norm();
    if r0 == 0.0 {
        return Some(delta * k);
    }
    if dist < MIN_SEPARATION {
        return None;
    }
    Some(delta * (k * (dist - r0) / dist))
}

/// Second-derivative block `∂²E/∂x_b∂x_b` of a harmonic spring.
///
/// The same block appears on the diagonal for the first particle and with a
/// negative sign for the off-diagonal pair blocks.
#[inline]
pub fn spring_hessian_block(delta: &Vector3<f64>, r0: f64, k: f64) -> Option<Matrix3<f64>> {
    if r0 == 0.0 {
        return Some(Matrix3::identity() * k);
    }
    let dist = delta.norm();
    if dist < MIN_SEPARATION {
        return None;
    }
    let u = delta / dist;
    let longitudinal = u * u.transpose();
    let transverse = Matrix3::identity() - longitudinal;
    Some(longitudinal * k + transverse * (k * (1.0 - r0 / dist)))
}

#[inline]
pub fn anchor(offset: &Vector3<f64>, k: f64) -> f64 {
    0.5 * k * offset.norm_squared()
}

#[inline]
pub fn anchor_gradient(offset: &Vector3<f64>, k: f64) -> Vector3<f64> {
    offset * k
}

#[inline]
pub fn anchor_hessian_block(k: f64) -> Matrix3<f64> {
    Matrix3::identity() * k
}
