use nalgebra::{Rotation3, Unit, Vector3};

/// Returns the rotation of minimal angle that maps direction `from` onto direction `to`.
///
/// Both inputs are treated as directions (their lengths are ignored). When they already
/// agree within `tolerance` radians the identity is returned. When they are opposite within
/// `tolerance`, the rotation axis is undefined; a half-turn about
/// [`perpendicular_axis(from)`](perpendicular_axis) is returned so the choice is reproducible.
pub fn minimal_rotation(
    from: &Unit<Vector3<f64>>,
    to: &Unit<Vector3<f64>>,
    tolerance: f64,
) -> Rotation3<f64> {
    let angle = from.angle(&to.into_inner());
    if angle <= tolerance {
        return Rotation3::identity();
    }
    if std::f64::consts::PI - angle <= tolerance {
        return Rotation3::from_axis_angle(&perpendicular_axis(from), std::f64::consts::PI);
    }
    match Unit::try_new(from.cross(&to.into_inner()), f64::EPSILON) {
        Some(axis) => Rotation3::from_axis_angle(&axis, angle),
        None => Rotation3::from_axis_angle(&perpendicular_axis(from), angle),
    }
}

/// A fixed unit axis orthogonal to `v`: the basis vector along `v`'s smallest absolute
/// component, crossed with `v`. Ties go to x, then y.
pub fn perpendicular_axis(v: &Unit<Vector3<f64>>) -> Unit<Vector3<f64>> {
    let (x, y, z) = (v.x.abs(), v.y.abs(), v.z.abs());
    let basis = if x <= y && x <= z {
        Vector3::x()
    } else if y <= z {
        Vector3::y()
    } else {
        Vector3::z()
    };
    Unit::new_normalize(basis.cross(&v.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-12;

    fn unit(x: f64, y: f64, z: f64) -> Unit<Vector3<f64>> {
        Unit::new_normalize(Vector3::new(x, y, z))
    }

    #[test]
    fn aligned_directions_give_identity() {
        let v = unit(1.0, 2.0, 3.0);
        let rotation = minimal_rotation(&v, &v, TOL);
        assert!(rotation.angle() < 1e-12);
    }

    #[test]
    fn general_directions_map_exactly() {
        let from = unit(1.0, 0.0, 0.0);
        let to = unit(0.0, 1.0, 1.0);
        let rotation = minimal_rotation(&from, &to, TOL);
        assert!((rotation * from.into_inner() - to.into_inner()).norm() < 1e-12);
        assert!((rotation.angle() - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn opposite_directions_use_deterministic_half_turn() {
        let from = unit(0.0, 0.0, 1.0);
        let to = unit(0.0, 0.0, -1.0);
        let rotation = minimal_rotation(&from, &to, TOL);
        assert!((rotation * from.into_inner() - to.into_inner()).norm() < 1e-12);
        assert!((rotation.angle() - PI).abs() < 1e-12);

        let again = minimal_rotation(&from, &to, TOL);
        assert_eq!(rotation, again);
        let twist_axis = Vector3::new(0.0, -1.0, 0.0);
        assert!((rotation * twist_axis - twist_axis).norm() < 1e-12);
    }

    #[test]
    fn perpendicular_axis_uses_smallest_component() {
        let v = unit(0.0, 0.0, 1.0);
        let axis = perpendicular_axis(&v);
        assert!((axis.into_inner() - Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-12);

        let w = unit(3.0, 0.5, 2.0);
        let axis = perpendicular_axis(&w);
        assert!(axis.dot(&w.into_inner()).abs() < 1e-12);
        assert!((axis.into_inner() - Vector3::y().cross(&w.into_inner()).normalize()).norm() < 1e-12);
    }
}
