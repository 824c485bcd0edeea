use super::error::FieldError;
use super::kind::{self, FieldKind, Operation};
use super::pair::PairTensorField;
use super::scalar::ScalarField;
use super::tensor::TensorField;
use super::vector::VectorField;
use crate::core::models::structure::SnapshotTag;

/// A particle field of any kind.
///
/// Binary operations on this enum are resolved through the operation table in
/// [`kind`]: the compatibility tags are checked first, then the kinds are looked
/// up, and only then is the concrete operation executed.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticleField {
    Scalar(ScalarField),
    Vector(VectorField),
    Tensor(TensorField),
    PairTensor(PairTensorField),
}

impl ParticleField {
    pub fn kind(&self) -> FieldKind {
        match self {
            ParticleField::Scalar(_) => FieldKind::SCALAR,
            ParticleField::Vector(_) => FieldKind::VECTOR,
            ParticleField::Tensor(_) => FieldKind::TENSOR,
            ParticleField::PairTensor(_) => FieldKind::PAIR_TENSOR,
        }
    }

    pub fn tag(&self) -> SnapshotTag {
        match self {
            ParticleField::Scalar(f) => f.tag(),
            ParticleField::Vector(f) => f.tag(),
            ParticleField::Tensor(f) => f.tag(),
            ParticleField::PairTensor(f) => f.tag(),
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarField> {
        match self {
            ParticleField::Scalar(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&VectorField> {
        match self {
            ParticleField::Vector(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&TensorField> {
        match self {
            ParticleField::Tensor(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_pair_tensor(&self) -> Option<&PairTensorField> {
        match self {
            ParticleField::PairTensor(f) => Some(f),
            _ => None,
        }
    }

    fn prepare(&self, op: Operation, other: &Self) -> Result<FieldKind, FieldError> {
        self.tag().ensure_compatible(&other.tag())?;
        kind::resolve(op, self.kind(), other.kind())
    }

    fn unsupported(op: Operation, lhs: &Self, rhs: &Self) -> FieldError {
        FieldError::Unsupported {
            op,
            lhs: lhs.kind(),
            rhs: rhs.kind(),
        }
    }

    pub fn try_add(&self, other: &Self) -> Result<Self, FieldError> {
        self.prepare(Operation::Add, other)?;
        use ParticleField::*;
        Ok(match (self, other) {
            (Scalar(a), Scalar(b)) => Scalar(a.checked_add(b)?),
            (Vector(a), Vector(b)) => Vector(a.checked_add(b)?),
            (Tensor(a), Tensor(b)) => Tensor(a.checked_add(b)?),
            (PairTensor(a), PairTensor(b)) => PairTensor(a.checked_add(b)?),
            _ => return Err(Self::unsupported(Operation::Add, self, other)),
        })
    }

    pub fn try_sub(&self, other: &Self) -> Result<Self, FieldError> {
        self.prepare(Operation::Sub, other)?;
        use ParticleField::*;
        Ok(match (self, other) {
            (Scalar(a), Scalar(b)) => Scalar(a.checked_sub(b)?),
            (Vector(a), Vector(b)) => Vector(a.checked_sub(b)?),
            (Tensor(a), Tensor(b)) => Tensor(a.checked_sub(b)?),
            (PairTensor(a), PairTensor(b)) => PairTensor(a.checked_sub(b)?),
            _ => return Err(Self::unsupported(Operation::Sub, self, other)),
        })
    }

    pub fn try_mul(&self, other: &Self) -> Result<Self, FieldError> {
        self.prepare(Operation::Mul, other)?;
        use ParticleField::*;
        Ok(match (self, other) {
            (Scalar(a), Scalar(b)) => Scalar(a.weighted_by(b)?),
            (Scalar(s), Vector(v)) | (Vector(v), Scalar(s)) => Vector(v.weighted_by(s)?),
            (Vector(a), Vector(b)) => Scalar(a.dot(b)?),
            (Scalar(s), Tensor(t)) | (Tensor(t), Scalar(s)) => Tensor(t.weighted_by(s)?),
            (PairTensor(p), Vector(v)) => Vector(p.contract(v)?),
            _ => return Err(Self::unsupported(Operation::Mul, self, other)),
        })
    }

    pub fn try_div(&self, other: &Self) -> Result<Self, FieldError> {
        self.prepare(Operation::Div, other)?;
        use ParticleField::*;
        Ok(match (self, other) {
            (Scalar(a), Scalar(b)) => Scalar(a.divided_by(b)?),
            (Vector(v), Scalar(s)) => Vector(v.divided_by(s)?),
            (Tensor(t), Scalar(s)) => Tensor(t.divided_by(s)?),
            _ => return Err(Self::unsupported(Operation::Div, self, other)),
        })
    }
}

impl From<ScalarField> for ParticleField {
    fn from(field: ScalarField) -> Self {
        ParticleField::Scalar(field)
    }
}

impl From<VectorField> for ParticleField {
    fn from(field: VectorField) -> Self {
        ParticleField::Vector(field)
    }
}

impl From<TensorField> for ParticleField {
    fn from(field: TensorField) -> Self {
        ParticleField::Tensor(field)
    }
}

impl From<PairTensorField> for ParticleField {
    fn from(field: PairTensorField) -> Self {
        ParticleField::PairTensor(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particle::Particle;
    use crate::core::models::structure::Structure;
    use nalgebra::{Matrix3, Point3, Vector3};

    fn structure() -> Structure {
        Structure::new(vec![
            Particle::new("A", Point3::origin(), 1.0),
            Particle::new("B", Point3::new(1.0, 0.0, 0.0), 1.0),
        ])
    }

    #[test]
    fn vector_times_vector_gives_scalar_dot_products() {
        let s = structure();
        let v: ParticleField = VectorField::new(
            &s,
            vec![Vector3::new(1.0, 2.0, 0.0), Vector3::new(0.0, 0.0, 3.0)],
        )
        .unwrap()
        .into();
        let product = v.try_mul(&v).unwrap();
        assert_eq!(product.kind(), FieldKind::SCALAR);
        assert_eq!(product.as_scalar().unwrap().values(), &[5.0, 9.0]);
    }

    #[test]
    fn scalar_broadcasts_from_either_side() {
        let s = structure();
        let w: ParticleField = ScalarField::new(&s, vec![2.0, 3.0]).unwrap().into();
        let t: ParticleField = TensorField::new(&s, vec![Matrix3::identity(); 2]).unwrap().into();
        let left = w.try_mul(&t).unwrap();
        let right = t.try_mul(&w).unwrap();
        assert_eq!(left, right);
        assert_eq!(left.as_tensor().unwrap()[1], Matrix3::identity() * 3.0);
    }

    #[test]
    fn vector_times_tensor_is_unsupported() {
        let s = structure();
        let v: ParticleField = VectorField::zeros(&s).into();
        let t: ParticleField = TensorField::zeros(&s).into();
        assert!(matches!(
            v.try_mul(&t),
            Err(FieldError::Unsupported { op: Operation::Mul, .. })
        ));
    }

    #[test]
    fn adding_scalar_to_vector_is_rank_mismatch() {
        let s = structure();
        let a: ParticleField = ScalarField::zeros(&s).into();
        let b: ParticleField = VectorField::zeros(&s).into();
        assert_eq!(
            a.try_add(&b),
            Err(FieldError::RankMismatch {
                lhs: FieldKind::SCALAR,
                rhs: FieldKind::VECTOR
            })
        );
    }

    #[test]
    fn tag_check_runs_before_kind_lookup() {
        let a: ParticleField = ScalarField::zeros(&structure()).into();
        let b: ParticleField = VectorField::zeros(&structure()).into();
        assert_eq!(a.try_add(&b), Err(FieldError::IncompatibleUniverse));
    }

    #[test]
    fn pair_tensor_contracts_with_vector() {
        let s = structure();
        let mut p = PairTensorField::zeros(&s);
        p.set(0, 0, Matrix3::identity() * 2.0).unwrap();
        let v = VectorField::new(&s, vec![Vector3::x(), Vector3::y()]).unwrap();
        let result = ParticleField::from(p).try_mul(&v.into()).unwrap();
        assert_eq!(result.as_vector().unwrap()[0], Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(result.as_vector().unwrap()[1], Vector3::zeros());
    }

    #[test]
    fn division_by_scalar_field() {
        let s = structure();
        let v: ParticleField = VectorField::new(&s, vec![Vector3::x() * 4.0, Vector3::y()])
            .unwrap()
            .into();
        let d: ParticleField = ScalarField::new(&s, vec![2.0, 0.5]).unwrap().into();
        let q = v.try_div(&d).unwrap();
        assert_eq!(q.as_vector().unwrap()[0], Vector3::x() * 2.0);
        assert_eq!(q.as_vector().unwrap()[1], Vector3::y() * 2.0);
        assert!(d.try_div(&v).is_err());
    }
}
