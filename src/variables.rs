use crate::design::{DesignVector, MachineType};
use crate::error::{GeneratorError, GeneratorResult};
use indexmap::IndexMap;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// Box bounds of a single design variable (SI units).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    lobnd: f64,
    upbnd: f64,
}

impl Variable {
    pub fn continuous(lobnd: f64, upbnd: f64) -> Self {
        Self { lobnd, upbnd }
    }

    pub fn lobnd(&self) -> f64 {
        self.lobnd
    }

    pub fn upbnd(&self) -> f64 {
        self.upbnd
    }
}

/// Bounds per named design variable. Variables that are not listed keep the
/// value of the initial design during an optimization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignBounds(IndexMap<String, Variable>);

impl Deref for DesignBounds {
    type Target = IndexMap<String, Variable>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DesignBounds {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<(String, Variable)> for DesignBounds {
    fn from_iter<T: IntoIterator<Item = (String, Variable)>>(iter: T) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}

impl IntoIterator for DesignBounds {
    type Item = <IndexMap<String, Variable> as IntoIterator>::Item;
    type IntoIter = <IndexMap<String, Variable> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Vec<(&str, Variable)>> for DesignBounds {
    fn from(value: Vec<(&str, Variable)>) -> Self {
        Self(value.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl DesignBounds {
    /// Documented physical ranges of the reference design studies.
    pub fn reference(machine: MachineType) -> Self {
        let mut bounds = vec![
            ("airgap_radius", Variable::continuous(0.2, 1.0)),
            ("core_length", Variable::continuous(0.4, 2.0)),
            ("stator_slot_height", Variable::continuous(0.04, 0.1)),
            ("rotor_slot_height", Variable::continuous(0.04, 0.1)),
            ("stator_yoke_flux_density", Variable::continuous(1.0, 2.0)),
        ];
        match machine {
            MachineType::Scig => {
                bounds.push(("magnetizing_current", Variable::continuous(5.0, 200.0)));
            }
            MachineType::Dfig => {
                bounds.push(("slip", Variable::continuous(-0.3, -0.002)));
                bounds.push(("excitation_current", Variable::continuous(5.0, 100.0)));
            }
        }
        bounds.into()
    }

    /// Maps the bounds onto the variables of `design`.
    pub fn search_space(&self, design: &DesignVector) -> GeneratorResult<SearchSpace> {
        let names = design.variable_names();
        let mut indices = Vec::with_capacity(self.len());
        let mut lower = Vec::with_capacity(self.len());
        let mut upper = Vec::with_capacity(self.len());
        for (name, variable) in self.iter() {
            let index = names.iter().position(|n| n == name).ok_or_else(|| {
                GeneratorError::config(format!(
                    "unknown {} design variable '{name}'",
                    design.machine_type()
                ))
            })?;
            if !(variable.lobnd.is_finite()
                && variable.upbnd.is_finite()
                && variable.lobnd < variable.upbnd)
            {
                return Err(GeneratorError::config(format!(
                    "invalid bounds for '{name}': [{}, {}]",
                    variable.lobnd, variable.upbnd
                )));
            }
            indices.push(index);
            lower.push(variable.lobnd);
            upper.push(variable.upbnd);
        }
        if indices.is_empty() {
            return Err(GeneratorError::config("no bounded design variables"));
        }
        Ok(SearchSpace {
            initial: *design,
            indices,
            lower: Array1::from(lower),
            upper: Array1::from(upper),
        })
    }
}

/// The bounded subspace of a design, scaled to the unit cube.
#[derive(Clone, Debug)]
pub struct SearchSpace {
    initial: DesignVector,
    indices: Vec<usize>,
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl SearchSpace {
    pub fn dimension(&self) -> usize {
        self.indices.len()
    }

    /// Unit-cube coordinates of the initial design, projected into the box.
    pub fn initial_point(&self) -> Array1<f64> {
        let values = self.initial.values();
        let x = Array1::from_iter(self.indices.iter().map(|&i| values[i]));
        let u = (&x - &self.lower) / (&self.upper - &self.lower);
        if u.iter().any(|u| !(0.0..=1.0).contains(u)) {
            warn!("initial design lies outside the bounds and is projected into the box");
        }
        u.mapv(|u| u.clamp(0.0, 1.0))
    }

    /// Builds the design corresponding to unit-cube coordinates `u`.
    pub fn design(&self, u: &Array1<f64>) -> GeneratorResult<DesignVector> {
        let mut values = self.initial.values();
        for (k, &i) in self.indices.iter().enumerate() {
            let u = u[k].clamp(0.0, 1.0);
            values[i] = self.lower[k] + u * (self.upper[k] - self.lower[k]);
        }
        self.initial.with_values(&values)
    }
}
