//! Material database with elastic presets.
//!
//! The presets carry the parameters of the reference benchmark
//! problems: a soft rubber beam, a soft tissue disc, a compliant gel and
//! the stiff elastic rings of the impact test.

use std::collections::HashMap;

use crate::properties::ElasticProperties;

/// A named collection of material presets.
///
/// Materials are looked up by name (e.g., "rubber", "elastic_ring").
/// Custom materials can be registered at runtime.
#[derive(Debug, Clone)]
pub struct MaterialDatabase {
    materials: HashMap<String, ElasticProperties>,
}

impl MaterialDatabase {
    /// Creates a new database with the built-in presets.
    pub fn with_defaults() -> Self {
        let mut db = Self::empty();

        db.register(rubber());
        db.register(soft_tissue());
        db.register(gel());
        db.register(elastic_ring());

        db
    }

    /// Creates an empty database.
    pub fn empty() -> Self {
        Self {
            materials: HashMap::new(),
        }
    }

    /// Registers a material. Overwrites if the name already exists.
    pub fn register(&mut self, props: ElasticProperties) {
        self.materials.insert(props.name.clone(), props);
    }

    /// Looks up a material by name. Returns `None` if not found.
    pub fn get(&self, name: &str) -> Option<&ElasticProperties> {
        self.materials.get(name)
    }

    /// Returns all registered material names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.materials.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialDatabase {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ─── Built-in Presets ─────────────────────────────────────────────────

fn preset(name: &str, lambda: f64, mu: f64, density: f64) -> ElasticProperties {
    ElasticProperties {
        name: name.into(),
        density,
        lambda,
        mu,
    }
}

fn lame_from_young_poisson(e: f64, nu: f64) -> (f64, f64) {
    (e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu)), e / (2.0 * (1.0 + nu)))
}

/// Soft rubber (E = 1 MPa, ν = 0.3, ρ = 500). Cantilever beam.
pub fn rubber() -> ElasticProperties {
    let (lambda, mu) = lame_from_young_poisson(1e6, 0.3);
    preset("rubber", lambda, mu, 500.0)
}

/// Soft tissue (E = 1 MPa, ν = 0.3, ρ = 1000). Vortex disc.
pub fn soft_tissue() -> ElasticProperties {
    let (lambda, mu) = lame_from_young_poisson(1e6, 0.3);
    preset("soft_tissue", lambda, mu, 1000.0)
}

/// Compliant gel (E = 500 Pa, ν = 0.3, ρ = 1000). Colliding disks.
pub fn gel() -> ElasticProperties {
    let (lambda, mu) = lame_from_young_poisson(500.0, 0.3);
    preset("gel", lambda, mu, 1000.0)
}

/// Elastic ring (K = 121.7 MPa, μ = 26.1 MPa, ρ = 1010). Impact test.
pub fn elastic_ring() -> ElasticProperties {
    let (k, mu) = (121.7e6, 26.1e6);
    preset("elastic_ring", k - 2.0 * mu / 3.0, mu, 1.01e3)
}
