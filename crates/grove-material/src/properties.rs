//! Elastic material properties.
//!
//! Stored as Lamé parameters plus density; constructors convert from
//! the engineering constants scenarios are usually specified with.

use serde::{Deserialize, Serialize};

use grove_types::{GroveError, GroveResult};

use crate::linear::LinearElastic;
use crate::neo_hookean::NeoHookean;
use crate::traits::ConstitutiveModel;

/// Isotropic elastic properties of a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticProperties {
    /// Human-readable name (e.g., "rubber").
    #[serde(default)]
    pub name: String,
    /// Mass density ρ in kg/m³ (kg/m² in 2-D).
    pub density: f64,
    /// Lamé's first parameter λ.
    pub lambda: f64,
    /// Shear modulus μ.
    pub mu: f64,
}

impl ElasticProperties {
    /// From Young's modulus `E` and Poisson's ratio `ν`.
    pub fn from_young_poisson(youngs_modulus: f64, poisson_ratio: f64, density: f64) -> GroveResult<Self> {
        if youngs_modulus <= 0.0 {
            return Err(GroveError::InvalidMaterial(format!(
                "Young's modulus must be positive, got {youngs_modulus}"
            )));
        }
        if poisson_ratio <= -1.0 || poisson_ratio >= 0.5 {
            return Err(GroveError::InvalidMaterial(format!(
                "Poisson's ratio must lie in (-1, 0.5), got {poisson_ratio}"
            )));
        }
        let lambda = youngs_modulus * poisson_ratio / ((1.0 + poisson_ratio) * (1.0 - 2.0 * poisson_ratio));
        let mu = youngs_modulus / (2.0 * (1.0 + poisson_ratio));
        Self::from_lame(lambda, mu, density)
    }

    /// From bulk modulus `K` and shear modulus `μ` (`λ = K − 2μ/3`).
    pub fn from_bulk_shear(bulk_modulus: f64, shear_modulus: f64, density: f64) -> GroveResult<Self> {
        Self::from_lame(bulk_modulus - 2.0 * shear_modulus / 3.0, shear_modulus, density)
    }

    /// From Lamé parameters directly.
    pub fn from_lame(lambda: f64, mu: f64, density: f64) -> GroveResult<Self> {
        let props = Self {
            name: String::new(),
            density,
            lambda,
            mu,
        };
        props.validate()?;
        Ok(props)
    }

    /// Sets the name (builder style).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn validate(&self) -> GroveResult<()> {
        if self.density <= 0.0 || !self.density.is_finite() {
            return Err(GroveError::InvalidMaterial(format!(
                "Density must be positive, got {}",
                self.density
            )));
        }
        if self.mu <= 0.0 {
            return Err(GroveError::InvalidMaterial(format!(
                "Shear modulus must be positive, got {}",
                self.mu
            )));
        }
        if self.lambda + 2.0 * self.mu / 3.0 <= 0.0 {
            return Err(GroveError::InvalidMaterial(
                "Bulk modulus must be positive".into(),
            ));
        }
        Ok(())
    }

    /// `(λ, μ)`.
    pub fn lame(&self) -> (f64, f64) {
        (self.lambda, self.mu)
    }

    pub fn bulk_modulus(&self) -> f64 {
        self.lambda + 2.0 * self.mu / 3.0
    }

    pub fn youngs_modulus(&self) -> f64 {
        self.mu * (3.0 * self.lambda + 2.0 * self.mu) / (self.lambda + self.mu)
    }

    pub fn poisson_ratio(&self) -> f64 {
        self.lambda / (2.0 * (self.lambda + self.mu))
    }

    /// P-wave speed `√((λ + 2μ) / ρ)`.
    pub fn wave_speed(&self) -> f64 {
        ((self.lambda + 2.0 * self.mu) / self.density).sqrt()
    }
}

/// Serializable choice of constitutive law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialModel {
    #[default]
    NeoHookean,
    LinearElastic,
}

impl MaterialModel {
    /// Instantiates the model with the given properties.
    pub fn build<const D: usize>(self, props: &ElasticProperties) -> Box<dyn ConstitutiveModel<D>> {
        match self {
            Self::NeoHookean => Box::new(NeoHookean::new(props.lambda, props.mu)),
            Self::LinearElastic => Box::new(LinearElastic::new(props.lambda, props.mu)),
        }
    }
}
