//! Shoe catalog and foot samples.
//!
//! The catalog is read-only reference data. It ships with four shoes and two
//! foot samples; a JSON file with the same shape can replace it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A shoe on sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shoe {
    /// Stable identifier, e.g. `shoe_1`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Formatted sale price.
    pub price: String,
    /// Catalog image of the shoe.
    pub image_path: PathBuf,
}

/// A sample foot photo the shoe can be tried on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootSample {
    /// Stable identifier, e.g. `sample_1`.
    pub id: String,
    /// Foot photo.
    pub image_path: PathBuf,
}

impl FootSample {
    /// Human-readable label built from the numeric suffix of the id.
    #[must_use]
    pub fn label(&self) -> String {
        let suffix = self.id.rsplit('_').next().unwrap_or(&self.id);
        format!("Foot sample {suffix}")
    }
}

/// The shoe and foot sample selected for one try-on.
#[derive(Debug, Clone, Copy)]
pub struct TryOnRequest<'a> {
    pub shoe: &'a Shoe,
    pub foot: &'a FootSample,
}

/// Static registry of shoes and foot samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Original price shown struck through next to every sale price.
    #[serde(default = "default_list_price")]
    pub list_price: String,
    shoes: Vec<Shoe>,
    foot_samples: Vec<FootSample>,
}

fn default_list_price() -> String {
    "Rp9.999.000".to_string()
}

impl Default for Catalog {
    fn default() -> Self {
        let shoe = |n: u32, name: &str, price: &str| Shoe {
            id: format!("shoe_{n}"),
            name: name.to_string(),
            price: price.to_string(),
            image_path: PathBuf::from(format!("static/shoe_{n}.jpg")),
        };
        let sample = |n: u32| FootSample {
            id: format!("sample_{n}"),
            image_path: PathBuf::from(format!("static/foot_sample_{n}.jpg")),
        };

        Self {
            list_price: default_list_price(),
            shoes: vec![
                shoe(1, "DUNK LOW SEAN CLIVER", "Rp1.150.000"),
                shoe(2, "DUNK LOW BLEACHED AQUA", "Rp7.200.000"),
                shoe(3, "AIR MAX 1 PATTA WAVES", "Rp3.600.000"),
                shoe(4, "DUNK LOW GREY FOG", "Rp1.600.000"),
            ],
            foot_samples: vec![sample(1), sample(2)],
        }
    }
}

impl Catalog {
    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid catalog.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;

        serde_json::from_str(&raw).map_err(|source| Error::Catalog {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve every relative image path against `root`.
    #[must_use]
    pub fn with_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        let root = root.as_ref();
        let rebase = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        };

        self.shoes.iter_mut().for_each(|s| rebase(&mut s.image_path));
        self.foot_samples
            .iter_mut()
            .for_each(|f| rebase(&mut f.image_path));
        self
    }

    /// Shoes in catalog order.
    pub fn shoes(&self) -> impl Iterator<Item = &Shoe> {
        self.shoes.iter()
    }

    /// Foot samples in catalog order.
    pub fn foot_samples(&self) -> impl Iterator<Item = &FootSample> {
        self.foot_samples.iter()
    }

    /// Look up a shoe by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEntry`] if no shoe has this id.
    pub fn shoe(&self, id: &str) -> Result<&Shoe> {
        self.shoes
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::UnknownEntry {
                kind: "shoe",
                id: id.to_string(),
            })
    }

    /// Look up a foot sample by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEntry`] if no sample has this id.
    pub fn foot_sample(&self, id: &str) -> Result<&FootSample> {
        self.foot_samples
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| Error::UnknownEntry {
                kind: "foot sample",
                id: id.to_string(),
            })
    }

    /// Select a shoe and a foot sample for one try-on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEntry`] if either id is not registered.
    pub fn request(&self, shoe_id: &str, foot_id: &str) -> Result<TryOnRequest<'_>> {
        Ok(TryOnRequest {
            shoe: self.shoe(shoe_id)?,
            foot: self.foot_sample(foot_id)?,
        })
    }
}
