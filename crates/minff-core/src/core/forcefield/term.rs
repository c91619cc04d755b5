use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

/// Energy of a single contribution, tagged with the contribution's name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyTerm {
    pub name: &'static str,
    pub energy: f64,
}

impl EnergyTerm {
    pub fn new(name: &'static str, energy: f64) -> Self {
        Self { name, energy }
    }
}

/// Per-contribution energies in contribution order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnergyBreakdown {
    terms: Vec<EnergyTerm>,
}

impl EnergyBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, term: EnergyTerm) {
        self.terms.push(term);
    }

    pub fn terms(&self) -> &[EnergyTerm] {
        &self.terms
    }

    pub fn energies(&self) -> Vec<f64> {
        self.terms.iter().map(|t| t.energy).collect()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.terms.iter().map(|t| t.energy).sum()
    }

    /// Sums the energies of each contribution kind.
    pub fn by_name(&self) -> BTreeMap<&'static str, f64> {
        let mut totals = BTreeMap::new();
        for term in &self.terms {
            *totals.entry(term.name).or_insert(0.0) += term.energy;
        }
        totals
    }
}

impl Add for EnergyBreakdown {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self.terms.extend(rhs.terms);
        self
    }
}

impl AddAssign<EnergyTerm> for EnergyBreakdown {
    fn add_assign(&mut self, rhs: EnergyTerm) {
        self.terms.push(rhs);
    }
}
