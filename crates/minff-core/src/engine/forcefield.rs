use super::EnergyEngine;
use super::bfgs::Bfgs;
use super::cache::DistanceCache;
use super::config::MinimizeOptions;
use super::error::ForceFieldError;
use super::minimize::ForceFieldObjective;
use super::solver::{QuasiNewtonSolver, STATUS_CONVERGED};
use super::state::{MinimizeOutcome, Snapshot};
use crate::core::forcefield::contribs::Contribution;
use crate::core::forcefield::term::{EnergyBreakdown, EnergyTerm};
use crate::core::models::point::{self, SharedPoint};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Contribution-based potential-energy engine over `D`-dimensional points.
///
/// Points are shared with the caller; contributions and the distance cache are
/// owned. Energy, gradient and minimization queries are only valid after
/// [`ForceField::initialize`] has succeeded for the current set of points.
#[derive(Debug)]
pub struct ForceField {
    dimension: usize,
    points: Vec<SharedPoint>,
    fixed_points: Vec<usize>,
    contributions: Vec<Box<dyn Contribution>>,
    initialized_points: usize,
    initialized: bool,
    distances: DistanceCache,
}

impl ForceField {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            points: Vec::new(),
            fixed_points: Vec::new(),
            contributions: Vec::new(),
            initialized_points: 0,
            initialized: false,
            distances: DistanceCache::default(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Current number of stored points, which may differ from the count captured by `initialize`.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn points(&self) -> &[SharedPoint] {
        &self.points
    }

    pub fn add_point(&mut self, point: SharedPoint) {
        self.points.push(point);
    }

    pub fn fixed_points(&self) -> &[usize] {
        &self.fixed_points
    }

    /// Excludes a point from gradient updates. Checked against the point count at `initialize`.
    pub fn add_fixed_point(&mut self, index: usize) {
        if !self.fixed_points.contains(&index) {
            self.fixed_points.push(index);
        }
    }

    pub fn contributions(&self) -> &[Box<dyn Contribution>] {
        &self.contributions
    }

    pub fn add_contribution(&mut self, contribution: Box<dyn Contribution>) {
        self.contributions.push(contribution);
    }

    /// Captures the point count and rebuilds the distance cache.
    pub fn initialize(&mut self) -> Result<(), ForceFieldError> {
        self.initialized = false;
        if self.dimension == 0 {
            return Err(ForceFieldError::ZeroDimension);
        }
        let len = self.points.len();
        if len == 0 {
            return Err(ForceFieldError::NoPoints);
        }

        for p in &self.points {
            let actual = point::read(p).len();
            if actual != self.dimension {
                return Err(ForceFieldError::DimensionMismatch {
                    expected: self.dimension,
                    actual,
                });
            }
        }
        for contrib in &self.contributions {
            if let Some(&index) = contrib.point_indices().iter().find(|&&idx| idx >= len) {
                return Err(ForceFieldError::IndexOutOfRange { index, len });
            }
        }
        if let Some(&index) = self.fixed_points.iter().find(|&&idx| idx >= len) {
            return Err(ForceFieldError::FixedPointOutOfRange { index, len });
        }

        self.initialized_points = len;
        self.distances = DistanceCache::new(len);
        self.initialized = true;
        debug!(
            points = len,
            contributions = self.contributions.len(),
            fixed = self.fixed_points.len(),
            "Force field initialized"
        );
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), ForceFieldError> {
        if !self.initialized {
            return Err(ForceFieldError::NotInitialized);
        }
        if self.points.len() != self.initialized_points {
            return Err(ForceFieldError::StalePointCount {
                initialized: self.initialized_points,
                current: self.points.len(),
            });
        }
        Ok(())
    }

    #[inline]
    fn buffer_len(&self) -> usize {
        self.initialized_points * self.dimension
    }

    fn check_buffer(&self, buffer: &[f64]) -> Result<(), ForceFieldError> {
        let expected = self.buffer_len();
        if buffer.len() != expected {
            return Err(ForceFieldError::BufferLength {
                expected,
                actual: buffer.len(),
            });
        }
        Ok(())
    }

    fn check_pair(&self, i: usize, j: usize) -> Result<(), ForceFieldError> {
        let len = self.initialized_points;
        for index in [i, j] {
            if index >= len {
                return Err(ForceFieldError::IndexOutOfRange { index, len });
            }
        }
        Ok(())
    }

    /// Marks every cached distance as unknown.
    pub fn init_distance_matrix(&mut self) -> Result<(), ForceFieldError> {
        self.ensure_ready()?;
        self.distances.reset();
        debug!("Distance cache reset");
        Ok(())
    }

    pub fn distance_cache(&self) -> &DistanceCache {
        &self.distances
    }

    /// Euclidean distance between points `i` and `j`.
    ///
    /// Without a buffer the resident positions are used and the result is cached;
    /// with a buffer the distance is computed from it and the cache is not touched.
    pub fn distance(
        &mut self,
        i: usize,
        j: usize,
        buffer: Option<&[f64]>,
    ) -> Result<f64, ForceFieldError> {
        self.ensure_ready()?;
        self.check_pair(i, j)?;
        if let Some(pos) = buffer {
            self.check_buffer(pos)?;
            return Ok(self.pair_distance(i, j, pos));
        }
        if let Some(cached) = self.distances.get(i, j) {
            return Ok(cached);
        }
        let dist = self.resident_distance(i, j);
        self.distances.insert(i, j, dist);
        Ok(dist)
    }

    /// Like [`ForceField::distance`] but never reads or writes the cache.
    pub fn distance_uncached(
        &self,
        i: usize,
        j: usize,
        buffer: Option<&[f64]>,
    ) -> Result<f64, ForceFieldError> {
        self.ensure_ready()?;
        self.check_pair(i, j)?;
        match buffer {
            Some(pos) => {
                self.check_buffer(pos)?;
                Ok(self.pair_distance(i, j, pos))
            }
            None => Ok(self.resident_distance(i, j)),
        }
    }

    /// Distance between two points of a point-major buffer. Indices are not checked.
    #[inline]
    pub fn pair_distance(&self, i: usize, j: usize, pos: &[f64]) -> f64 {
        let dim = self.dimension;
        let (a, b) = (&pos[i * dim..(i + 1) * dim], &pos[j * dim..(j + 1) * dim]);
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }

    fn resident_distance(&self, i: usize, j: usize) -> f64 {
        let (a, b) = (point::read(&self.points[i]), point::read(&self.points[j]));
        (&*a - &*b).norm()
    }

    /// Copies the stored positions into a new point-major buffer.
    pub fn scatter(&self) -> Vec<f64> {
        point::flatten(&self.points)
    }

    pub fn scatter_into(&self, buffer: &mut [f64]) -> Result<(), ForceFieldError> {
        let expected = self.points.len() * self.dimension;
        if buffer.len() != expected {
            return Err(ForceFieldError::BufferLength {
                expected,
                actual: buffer.len(),
            });
        }
        for (p, chunk) in self.points.iter().zip(buffer.chunks_mut(self.dimension.max(1))) {
            chunk.copy_from_slice(point::read(p).as_slice());
        }
        Ok(())
    }

    /// Writes a point-major buffer back into the shared point storage and
    /// forgets every cached distance.
    pub fn gather(&mut self, buffer: &[f64]) -> Result<(), ForceFieldError> {
        let expected = self.points.len() * self.dimension;
        if buffer.len() != expected {
            return Err(ForceFieldError::BufferLength {
                expected,
                actual: buffer.len(),
            });
        }
        for (p, chunk) in self.points.iter().zip(buffer.chunks(self.dimension.max(1))) {
            point::write(p).as_mut_slice().copy_from_slice(chunk);
        }
        self.distances.reset();
        Ok(())
    }

    fn sum_energy(&self, pos: &[f64]) -> f64 {
        self.contributions.iter().map(|c| c.energy(self, pos)).sum()
    }

    fn accumulate_gradient(&self, pos: &[f64], grad: &mut [f64]) {
        for contrib in &self.contributions {
            contrib.accumulate_gradient(self, pos, grad);
        }
        let dim = self.dimension;
        for &fixed in &self.fixed_points {
            grad[fixed * dim..(fixed + 1) * dim].fill(0.0);
        }
    }

    /// Total energy at the stored positions; zero without contributions.
    pub fn calc_energy(&self) -> Result<f64, ForceFieldError> {
        self.ensure_ready()?;
        Ok(self.sum_energy(&self.scatter()))
    }

    /// Per-contribution energies at the stored positions, in contribution order.
    pub fn calc_energy_breakdown(&self) -> Result<EnergyBreakdown, ForceFieldError> {
        self.ensure_ready()?;
        let pos = self.scatter();
        let mut breakdown = EnergyBreakdown::with_capacity(self.contributions.len());
        for contrib in &self.contributions {
            breakdown += EnergyTerm::new(contrib.name(), contrib.energy(self, &pos));
        }
        Ok(breakdown)
    }

    /// Total energy at `pos`, bypassing the stored positions. Resets the distance cache.
    pub fn calc_energy_at(&mut self, pos: &[f64]) -> Result<f64, ForceFieldError> {
        self.ensure_ready()?;
        self.check_buffer(pos)?;
        self.distances.reset();
        Ok(self.sum_energy(pos))
    }

    /// Accumulates the gradient at the stored positions into `grad`.
    ///
    /// `grad` is not zeroed first. Components of fixed points are set to zero.
    pub fn calc_grad(&self, grad: &mut [f64]) -> Result<(), ForceFieldError> {
        self.ensure_ready()?;
        self.check_buffer(grad)?;
        let pos = self.scatter();
        self.accumulate_gradient(&pos, grad);
        Ok(())
    }

    pub fn calc_grad_at(&mut self, pos: &[f64], grad: &mut [f64]) -> Result<(), ForceFieldError> {
        self.ensure_ready()?;
        self.check_buffer(pos)?;
        self.check_buffer(grad)?;
        self.accumulate_gradient(pos, grad);
        Ok(())
    }

    /// Minimizes with the built-in BFGS solver and returns its status code.
    pub fn minimize(
        &mut self,
        max_iterations: usize,
        force_tolerance: f64,
        energy_tolerance: f64,
    ) -> Result<i32, ForceFieldError> {
        let options = MinimizeOptions::new(max_iterations, force_tolerance, energy_tolerance);
        self.minimize_with(&options, &Bfgs, None).map(|o| o.status)
    }

    /// Minimizes with the given solver and writes the final iterate back to the points.
    ///
    /// The solver's status is returned unchanged. Without contributions this is a
    /// no-op that reports convergence.
    #[instrument(skip_all, name = "force_field_minimize")]
    pub fn minimize_with(
        &mut self,
        options: &MinimizeOptions,
        solver: &dyn QuasiNewtonSolver,
        snapshots: Option<&mut Vec<Snapshot>>,
    ) -> Result<MinimizeOutcome, ForceFieldError> {
        self.ensure_ready()?;
        if self.contributions.is_empty() {
            return Ok(MinimizeOutcome {
                status: STATUS_CONVERGED,
                iterations: 0,
                energy: 0.0,
            });
        }

        let mut x = self.scatter();
        info!(
            points = self.initialized_points,
            contributions = self.contributions.len(),
            max_iterations = options.max_iterations,
            "Starting minimization"
        );

        let outcome = {
            let mut objective = ForceFieldObjective::new(self);
            solver.minimize(&mut x, &mut objective, options, snapshots)?
        };
        self.gather(&x)?;

        if outcome.converged() {
            info!(
                iterations = outcome.iterations,
                energy = outcome.energy,
                "Minimization converged"
            );
        } else {
            warn!(
                status = outcome.status,
                iterations = outcome.iterations,
                energy = outcome.energy,
                "Minimization did not converge"
            );
        }
        Ok(outcome)
    }
}

/// Shares the point storage and deep-copies every contribution.
///
/// The copy starts uninitialized and must be initialized before use.
impl Clone for ForceField {
    fn clone(&self) -> Self {
        Self {
            dimension: self.dimension,
            points: self.points.iter().map(Arc::clone).collect(),
            fixed_points: self.fixed_points.clone(),
            contributions: self.contributions.clone(),
            initialized_points: 0,
            initialized: false,
            distances: DistanceCache::default(),
        }
    }
}

impl EnergyEngine for ForceField {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn num_points(&self) -> usize {
        self.points.len()
    }

    fn calc_energy(&self) -> Result<f64, ForceFieldError> {
        ForceField::calc_energy(self)
    }

    fn calc_energy_at(&mut self, pos: &[f64]) -> Result<f64, ForceFieldError> {
        ForceField::calc_energy_at(self, pos)
    }

    fn calc_grad(&self, grad: &mut [f64]) -> Result<(), ForceFieldError> {
        ForceField::calc_grad(self, grad)
    }

    fn calc_grad_at(&mut self, pos: &[f64], grad: &mut [f64]) -> Result<(), ForceFieldError> {
        ForceField::calc_grad_at(self, pos, grad)
    }

    fn minimize_with_options(
        &mut self,
        options: &MinimizeOptions,
    ) -> Result<MinimizeOutcome, ForceFieldError> {
        self.minimize_with(options, &Bfgs, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::contribs::{BondStretchContrib, VdwContrib};
    use crate::core::forcefield::params::VdwPairParams;
    use crate::core::models::point::shared_point;
    use crate::engine::solver::Objective;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn triangle() -> ForceField {
        let mut field = ForceField::new(3);
        field.add_point(shared_point(&[0.0, 0.0, 0.0]));
        field.add_point(shared_point(&[3.0, 0.0, 0.0]));
        field.add_point(shared_point(&[0.0, 4.0, 0.0]));
        field
    }

    fn initialized_triangle() -> ForceField {
        let mut field = triangle();
        field.initialize().unwrap();
        field
    }

    struct FixedStatus(i32);

    impl QuasiNewtonSolver for FixedStatus {
        fn minimize(
            &self,
            x: &mut [f64],
            objective: &mut dyn Objective,
            _options: &MinimizeOptions,
            _snapshots: Option<&mut Vec<Snapshot>>,
        ) -> Result<MinimizeOutcome, ForceFieldError> {
            for v in x.iter_mut() {
                *v += 1.0;
            }
            let energy = objective.energy(x)?;
            Ok(MinimizeOutcome {
                status: self.0,
                iterations: 1,
                energy,
            })
        }
    }

    #[test]
    fn queries_before_initialize_fail() {
        let mut field = triangle();
        assert_eq!(field.calc_energy(), Err(ForceFieldError::NotInitialized));
        assert_eq!(
            field.distance(0, 1, None),
            Err(ForceFieldError::NotInitialized)
        );
        let mut grad = vec![0.0; 9];
        assert_eq!(
            field.calc_grad(&mut grad),
            Err(ForceFieldError::NotInitialized)
        );
        assert_eq!(
            field.minimize(10, 1e-4, 1e-6),
            Err(ForceFieldError::NotInitialized)
        );
    }

    #[test]
    fn initialize_without_points_fails() {
        let mut field = ForceField::new(3);
        assert_eq!(field.initialize(), Err(ForceFieldError::NoPoints));
        assert!(!field.is_initialized());
    }

    #[test]
    fn initialize_rejects_a_zero_dimension() {
        let mut field = ForceField::new(0);
        field.add_point(shared_point(&[]));
        assert_eq!(field.initialize(), Err(ForceFieldError::ZeroDimension));
        assert!(!field.is_initialized());
    }

    #[test]
    fn initialize_rejects_points_of_the_wrong_dimension() {
        let mut field = ForceField::new(3);
        field.add_point(shared_point(&[0.0, 0.0]));
        assert_eq!(
            field.initialize(),
            Err(ForceFieldError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn initialize_rejects_contributions_built_for_a_larger_engine() {
        let big = triangle();
        let contrib = BondStretchContrib::new(&big, 0, 2, 1.0, 1.0).unwrap();

        let mut small = ForceField::new(3);
        small.add_point(shared_point(&[0.0, 0.0, 0.0]));
        small.add_point(shared_point(&[1.0, 0.0, 0.0]));
        small.add_contribution(Box::new(contrib));
        assert_eq!(
            small.initialize(),
            Err(ForceFieldError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn initialize_rejects_fixed_points_out_of_range() {
        let mut field = triangle();
        field.add_fixed_point(7);
        assert_eq!(
            field.initialize(),
            Err(ForceFieldError::FixedPointOutOfRange { index: 7, len: 3 })
        );
    }

    #[test]
    fn adding_a_point_after_initialize_requires_reinitialization() {
        let mut field = initialized_triangle();
        field.add_point(shared_point(&[1.0, 1.0, 1.0]));
        assert_eq!(
            field.calc_energy(),
            Err(ForceFieldError::StalePointCount {
                initialized: 3,
                current: 4
            })
        );
        field.initialize().unwrap();
        assert_eq!(field.calc_energy(), Ok(0.0));
        assert_eq!(field.distance_cache().len(), 10);
    }

    #[test]
    fn distance_is_symmetric_for_all_pairs() {
        let mut field = initialized_triangle();
        for i in 0..3 {
            for j in 0..3 {
                let ij = field.distance(i, j, None).unwrap();
                let ji = field.distance(j, i, None).unwrap();
                assert_eq!(ij, ji);
            }
        }
        assert!(f64_approx_equal(field.distance(1, 2, None).unwrap(), 5.0));
    }

    #[test]
    fn distance_to_self_is_zero() {
        let mut field = initialized_triangle();
        for i in 0..3 {
            assert_eq!(field.distance(i, i, None).unwrap(), 0.0);
        }
    }

    #[test]
    fn distance_out_of_range_fails() {
        let mut field = initialized_triangle();
        assert_eq!(
            field.distance(0, 3, None),
            Err(ForceFieldError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert!(field.distance_uncached(4, 0, None).is_err());
    }

    #[test]
    fn resident_distances_are_cached_and_buffer_distances_are_not() {
        let mut field = initialized_triangle();
        assert_eq!(field.distance_cache().known_entries(), 0);

        let mut buffer = field.scatter();
        buffer[3] = 6.0;
        assert!(f64_approx_equal(
            field.distance(0, 1, Some(&buffer)).unwrap(),
            6.0
        ));
        assert_eq!(field.distance_cache().known_entries(), 0);

        field.distance(0, 1, None).unwrap();
        assert_eq!(field.distance_cache().get(1, 0), Some(3.0));
        assert_eq!(field.distance_cache().known_entries(), 1);

        field.init_distance_matrix().unwrap();
        assert_eq!(field.distance_cache().known_entries(), 0);
    }

    #[test]
    fn distance_uncached_leaves_the_cache_untouched() {
        let field = initialized_triangle();
        assert!(f64_approx_equal(
            field.distance_uncached(0, 2, None).unwrap(),
            4.0
        ));
        assert_eq!(field.distance_cache().known_entries(), 0);
    }

    #[test]
    fn distance_rejects_a_buffer_of_the_wrong_length() {
        let mut field = initialized_triangle();
        assert_eq!(
            field.distance(0, 1, Some(&[0.0; 4])),
            Err(ForceFieldError::BufferLength {
                expected: 9,
                actual: 4
            })
        );
    }

    #[test]
    fn gather_of_scatter_round_trips_positions() {
        let mut field = initialized_triangle();
        let before = field.scatter();
        field.gather(&before).unwrap();
        assert_eq!(field.scatter(), before);

        let mut buffer = vec![0.0; 9];
        field.scatter_into(&mut buffer).unwrap();
        assert_eq!(buffer, before);
    }

    #[test]
    fn gather_writes_through_to_shared_points() {
        let mut field = initialized_triangle();
        let alias = Arc::clone(&field.points()[2]);
        let mut buffer = field.scatter();
        buffer[7] = -1.5;
        field.gather(&buffer).unwrap();
        assert_eq!(point::read(&alias)[1], -1.5);
    }

    #[test]
    fn gather_forgets_distances_cached_for_the_old_positions() {
        let mut field = initialized_triangle();
        assert!(f64_approx_equal(field.distance(0, 1, None).unwrap(), 3.0));

        let mut buffer = field.scatter();
        buffer[3] = 7.0;
        field.gather(&buffer).unwrap();

        assert_eq!(field.distance_cache().known_entries(), 0);
        assert!(f64_approx_equal(field.distance(0, 1, None).unwrap(), 7.0));
    }

    #[test]
    fn energy_without_contributions_is_zero() {
        let field = initialized_triangle();
        assert_eq!(field.calc_energy(), Ok(0.0));
        assert!(field.calc_energy_breakdown().unwrap().is_empty());
    }

    #[test]
    fn energy_is_additive_over_contributions() {
        let mut combined = triangle();
        let vdw = VdwContrib::new(&combined, 0, 1, VdwPairParams::new(4.0, 0.1)).unwrap();
        let bond = BondStretchContrib::new(&combined, 1, 2, 4.0, 20.0).unwrap();

        let mut only_vdw = combined.clone();
        only_vdw.add_contribution(Box::new(vdw.clone()));
        only_vdw.initialize().unwrap();
        let mut only_bond = combined.clone();
        only_bond.add_contribution(Box::new(bond.clone()));
        only_bond.initialize().unwrap();

        combined.add_contribution(Box::new(vdw));
        combined.add_contribution(Box::new(bond));
        combined.initialize().unwrap();

        let total = combined.calc_energy().unwrap();
        let parts = only_vdw.calc_energy().unwrap() + only_bond.calc_energy().unwrap();
        assert!(f64_approx_equal(total, parts));

        let breakdown = combined.calc_energy_breakdown().unwrap();
        assert_eq!(breakdown.terms()[0].name, "vdw");
        assert_eq!(breakdown.terms()[1].name, "bond-stretch");
        assert!(f64_approx_equal(breakdown.total(), total));
    }

    #[test]
    fn energy_at_external_buffer_resets_the_cache() {
        let mut field = triangle();
        let bond = BondStretchContrib::new(&field, 0, 1, 3.0, 10.0).unwrap();
        field.add_contribution(Box::new(bond));
        field.initialize().unwrap();
        field.distance(0, 1, None).unwrap();
        assert_eq!(field.distance_cache().known_entries(), 1);

        let mut buffer = field.scatter();
        buffer[3] = 4.0;
        let energy = field.calc_energy_at(&buffer).unwrap();
        assert!(f64_approx_equal(energy, 5.0));
        assert_eq!(field.distance_cache().known_entries(), 0);
        assert_eq!(field.calc_energy(), Ok(0.0));
    }

    #[test]
    fn gradient_of_fixed_points_is_exactly_zero() {
        let mut field = triangle();
        let bond = BondStretchContrib::new(&field, 0, 1, 1.0, 10.0).unwrap();
        field.add_contribution(Box::new(bond));
        field.add_fixed_point(0);
        field.initialize().unwrap();

        let mut grad = vec![5.0; 9];
        field.calc_grad(&mut grad).unwrap();
        assert_eq!(&grad[0..3], &[0.0, 0.0, 0.0]);
        assert!(grad[3] > 5.0);

        let pos = field.scatter();
        let mut grad = vec![0.0; 9];
        field.calc_grad_at(&pos, &mut grad).unwrap();
        assert_eq!(&grad[0..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn calc_grad_accumulates_into_the_callers_buffer() {
        let mut field = triangle();
        let bond = BondStretchContrib::new(&field, 0, 1, 1.0, 10.0).unwrap();
        field.add_contribution(Box::new(bond));
        field.initialize().unwrap();

        let mut fresh = vec![0.0; 9];
        field.calc_grad(&mut fresh).unwrap();
        let mut seeded = vec![1.0; 9];
        field.calc_grad(&mut seeded).unwrap();
        for (f, s) in fresh.iter().zip(&seeded) {
            assert!(f64_approx_equal(f + 1.0, *s));
        }
    }

    #[test]
    fn minimize_without_contributions_is_a_no_op() {
        let mut field = initialized_triangle();
        let before = field.scatter();
        assert_eq!(field.minimize(100, 1e-4, 1e-6), Ok(0));
        assert_eq!(field.scatter(), before);
    }

    #[test]
    fn minimize_passes_the_solver_status_through_and_writes_back() {
        let mut field = triangle();
        let bond = BondStretchContrib::new(&field, 0, 1, 3.0, 10.0).unwrap();
        field.add_contribution(Box::new(bond));
        field.initialize().unwrap();

        let outcome = field
            .minimize_with(&MinimizeOptions::default(), &FixedStatus(7), None)
            .unwrap();
        assert_eq!(outcome.status, 7);
        assert!(!outcome.converged());
        assert_eq!(field.scatter()[0], 1.0);
        assert_eq!(field.scatter()[4], 1.0);
    }

    #[test]
    fn minimize_relaxes_a_stretched_bond() {
        let mut field = ForceField::new(3);
        field.add_point(shared_point(&[0.0, 0.0, 0.0]));
        field.add_point(shared_point(&[2.5, 0.0, 0.0]));
        let bond = BondStretchContrib::new(&field, 0, 1, 1.5, 100.0).unwrap();
        field.add_contribution(Box::new(bond));
        field.add_fixed_point(0);
        field.initialize().unwrap();

        let status = field.minimize(500, 1e-6, 1e-12).unwrap();
        assert_eq!(status, 0);
        assert!((field.distance_uncached(0, 1, None).unwrap() - 1.5).abs() < 1e-3);
        assert_eq!(&field.scatter()[0..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn clone_shares_points_but_not_contributions_or_state() {
        let mut field = triangle();
        let bond = BondStretchContrib::new(&field, 0, 1, 1.0, 10.0).unwrap();
        field.add_contribution(Box::new(bond));
        field.add_fixed_point(2);
        field.initialize().unwrap();

        let mut copy = field.clone();
        assert!(!copy.is_initialized());
        assert_eq!(copy.fixed_points(), &[2]);
        assert!(Arc::ptr_eq(&copy.points()[0], &field.points()[0]));

        copy.add_contribution(Box::new(
            BondStretchContrib::new(&copy, 1, 2, 1.0, 10.0).unwrap(),
        ));
        assert_eq!(copy.contributions().len(), 2);
        assert_eq!(field.contributions().len(), 1);

        copy.initialize().unwrap();
        assert!(copy.calc_energy().unwrap() > field.calc_energy().unwrap());
    }
}
