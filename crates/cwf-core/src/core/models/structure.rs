use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised when constructing or deriving a [`Structure`].
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("a structure must contain at least one site")]
    Empty,

    #[error("site {index} ({symbol}) has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize, symbol: String },

    #[error("lattice matrix is singular (volume is zero)")]
    SingularLattice,

    #[error("scale factor must be a positive finite real, got {0}")]
    InvalidScaleFactor(f64),
}

/// A periodic lattice described by three row vectors in Ångstrom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    matrix: Matrix3<f64>,
}

impl Lattice {
    /// Creates a lattice from three row vectors `[a, b, c]`.
    pub fn from_vectors(vectors: [[f64; 3]; 3]) -> Self {
        Self {
            matrix: Matrix3::from_rows(&[
                Vector3::from(vectors[0]).transpose(),
                Vector3::from(vectors[1]).transpose(),
                Vector3::from(vectors[2]).transpose(),
            ]),
        }
    }

    /// Creates a cubic lattice with edge length `a`.
    pub fn cubic(a: f64) -> Self {
        Self::from_vectors([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    /// The lattice vectors as a row matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// The `i`-th lattice vector.
    pub fn vector(&self, i: usize) -> Vector3<f64> {
        self.matrix.row(i).transpose()
    }

    /// The cell volume in Å³.
    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// The norms of the three reciprocal lattice vectors (2π · |row_i of (Aᵀ)⁻¹|),
    /// in 1/Å. Returns `None` for a singular lattice.
    pub fn reciprocal_norms(&self) -> Option<[f64; 3]> {
        let inverse = self.matrix.try_inverse()?;
        // b_i is 2π times column i of A⁻¹ (rows of A are the direct vectors).
        let two_pi = 2.0 * std::f64::consts::PI;
        Some([
            two_pi * inverse.column(0).norm(),
            two_pi * inverse.column(1).norm(),
            two_pi * inverse.column(2).norm(),
        ])
    }

    fn scaled(&self, linear_factor: f64) -> Self {
        Self {
            matrix: self.matrix * linear_factor,
        }
    }
}

/// A single atomic site: element symbol and Cartesian position in Ångstrom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub symbol: String,
    pub position: Point3<f64>,
}

impl Site {
    pub fn new(symbol: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            symbol: symbol.into(),
            position: Point3::from(Vector3::from(position)),
        }
    }
}

/// An atomic structure: a list of sites with an optional periodic lattice.
///
/// Structures are immutable once created. Derived structures (such as the uniformly
/// scaled copies sampled by the equation-of-state workflow) are produced by
/// [`Structure::scaled`], which preserves species and site order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    sites: Vec<Site>,
    lattice: Option<Lattice>,
}

impl Structure {
    /// Creates a periodic structure.
    pub fn crystal(lattice: Lattice, sites: Vec<Site>) -> Result<Self, StructureError> {
        if lattice.volume() <= f64::EPSILON {
            return Err(StructureError::SingularLattice);
        }
        Self::validated(sites, Some(lattice))
    }

    /// Creates a non-periodic structure (a molecule).
    pub fn molecule(sites: Vec<Site>) -> Result<Self, StructureError> {
        Self::validated(sites, None)
    }

    fn validated(sites: Vec<Site>, lattice: Option<Lattice>) -> Result<Self, StructureError> {
        if sites.is_empty() {
            return Err(StructureError::Empty);
        }
        for (index, site) in sites.iter().enumerate() {
            if !site.position.coords.iter().all(|c| c.is_finite()) {
                return Err(StructureError::NonFiniteCoordinate {
                    index,
                    symbol: site.symbol.clone(),
                });
            }
        }
        Ok(Self { sites, lattice })
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn lattice(&self) -> Option<&Lattice> {
        self.lattice.as_ref()
    }

    pub fn is_periodic(&self) -> bool {
        self.lattice.is_some()
    }

    /// The cell volume in Å³, or `None` for a molecule.
    pub fn volume(&self) -> Option<f64> {
        self.lattice.as_ref().map(Lattice::volume)
    }

    /// Returns a copy whose volume is scaled by `volume_factor`.
    ///
    /// Lattice vectors and Cartesian positions are multiplied by the cube root of the
    /// factor, so fractional coordinates are preserved. For molecules only the
    /// coordinates are scaled. Species and site order are unchanged.
    pub fn scaled(&self, volume_factor: f64) -> Result<Self, StructureError> {
        if !volume_factor.is_finite() || volume_factor <= 0.0 {
            return Err(StructureError::InvalidScaleFactor(volume_factor));
        }
        let linear = volume_factor.cbrt();
        let sites = self
            .sites
            .iter()
            .map(|site| Site {
                symbol: site.symbol.clone(),
                position: Point3::from(site.position.coords * linear),
            })
            .collect();
        Ok(Self {
            sites,
            lattice: self.lattice.as_ref().map(|l| l.scaled(linear)),
        })
    }

    /// The chemical formula with alphabetically ordered element counts, e.g. `Cl4Na4`.
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for site in &self.sites {
            *counts.entry(site.symbol.as_str()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(symbol, count)| {
                if count == 1 {
                    symbol.to_string()
                } else {
                    format!("{symbol}{count}")
                }
            })
            .collect()
    }
}
