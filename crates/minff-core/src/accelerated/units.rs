//! Conversions between engine units (Å, kcal/mol) and backend units (nm, kJ/mol).

pub const NM_PER_ANGSTROM: f64 = 0.1;
pub const ANGSTROMS_PER_NM: f64 = 10.0;
pub const KJ_PER_KCAL: f64 = 4.184;
pub const KCAL_PER_KJ: f64 = 1.0 / KJ_PER_KCAL;
pub const PS_PER_FS: f64 = 0.001;

/// Point-major Å buffer to per-particle nm triples.
pub fn angstrom_buffer_to_nm(buffer: &[f64]) -> Vec<[f64; 3]> {
    buffer
        .chunks_exact(3)
        .map(|c| {
            [
                c[0] * NM_PER_ANGSTROM,
                c[1] * NM_PER_ANGSTROM,
                c[2] * NM_PER_ANGSTROM,
            ]
        })
        .collect()
}

/// Backend forces (kJ/mol/nm) added into an engine gradient buffer (kcal/mol/Å).
///
/// Force is the negative gradient, hence the sign flip.
pub fn accumulate_forces_as_gradient(forces: &[[f64; 3]], grad: &mut [f64]) {
    for (f, g) in forces.iter().zip(grad.chunks_exact_mut(3)) {
        for (gk, fk) in g.iter_mut().zip(f) {
            *gk -= fk * NM_PER_ANGSTROM * KCAL_PER_KJ;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_conversions_are_inverse() {
        assert!((NM_PER_ANGSTROM * ANGSTROMS_PER_NM - 1.0).abs() < 1e-15);
        assert!((KJ_PER_KCAL * KCAL_PER_KJ - 1.0).abs() < 1e-15);
    }

    #[test]
    fn buffer_is_split_into_nm_triples() {
        let nm = angstrom_buffer_to_nm(&[10.0, 20.0, 30.0, -5.0, 0.0, 1.0]);
        assert_eq!(nm.len(), 2);
        assert!((nm[0][2] - 3.0).abs() < 1e-12);
        assert!((nm[1][0] + 0.5).abs() < 1e-12);
    }

    #[test]
    fn forces_become_negated_gradients_in_engine_units() {
        let mut grad = vec![0.0; 3];
        accumulate_forces_as_gradient(&[[41.84, 0.0, -41.84]], &mut grad);
        assert!((grad[0] + 1.0).abs() < 1e-12);
        assert_eq!(grad[1], 0.0);
        assert!((grad[2] - 1.0).abs() < 1e-12);
    }
}
