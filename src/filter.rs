//! Predicates over summary records.
//!
//! The query pipeline only sees `dyn Filter`: it calls each filter in order and
//! drops the candidate on the first rejection. [`SprFilter`] is the stock
//! implementation covering placetypes, existential flags and alternate
//! geometries; any `Fn(&StandardPlacesResult) -> Result<(), Rejection>` works
//! too.
//!
//! ```
//! use spatial_rtree::filter::{Filter, SprFilter};
//! use spatial_types::{Existential, StandardPlacesResult};
//!
//! let filter = SprFilter::from_query("is_current=1&placetype=microhood").unwrap();
//!
//! let spr = StandardPlacesResult {
//!     placetype: "microhood".to_string(),
//!     is_current: Existential::True,
//!     ..Default::default()
//! };
//! assert!(filter.evaluate(&spr).is_ok());
//! ```

use crate::error::{Result, SpatialError};
use rustc_hash::FxHashSet;
use spatial_types::existential::Existential;
use spatial_types::spr::StandardPlacesResult;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Why a filter turned a record away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Rejection(pub String);

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

pub trait Filter: Send + Sync {
    fn evaluate(&self, spr: &StandardPlacesResult) -> std::result::Result<(), Rejection>;
}

impl<F> Filter for F
where
    F: Fn(&StandardPlacesResult) -> std::result::Result<(), Rejection> + Send + Sync,
{
    fn evaluate(&self, spr: &StandardPlacesResult) -> std::result::Result<(), Rejection> {
        self(spr)
    }
}

/// Shared handle the query pipeline hands to its workers.
pub type SharedFilter = Arc<dyn Filter>;

/// Run every filter in order, stopping at the first rejection.
pub fn apply_filters(
    filters: &[SharedFilter],
    spr: &StandardPlacesResult,
) -> std::result::Result<(), Rejection> {
    filters.iter().try_for_each(|filter| filter.evaluate(spr))
}

/// Which geometry variants a query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometriesMode {
    #[default]
    All,
    /// Alternate geometries only.
    Alternate,
    /// Default geometries only.
    Default,
}

impl FromStr for GeometriesMode {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "all" => Ok(Self::All),
            "alt" | "alternate" => Ok(Self::Alternate),
            "default" => Ok(Self::Default),
            other => Err(SpatialError::InvalidInput(format!(
                "Invalid geometries mode '{}', expected all, alt or default",
                other
            ))),
        }
    }
}

impl fmt::Display for GeometriesMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::All => "all",
            Self::Alternate => "alt",
            Self::Default => "default",
        };
        f.write_str(label)
    }
}

/// Raw filter criteria. An empty set does not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SprInputs {
    pub placetypes: Vec<String>,
    pub is_current: Vec<i64>,
    pub is_ceased: Vec<i64>,
    pub is_deprecated: Vec<i64>,
    pub is_superseded: Vec<i64>,
    pub is_superseding: Vec<i64>,
    pub alternate_geometries: Vec<String>,
    pub geometries: GeometriesMode,
}

/// Compiled [`SprInputs`].
#[derive(Debug, Clone, Default)]
pub struct SprFilter {
    placetypes: FxHashSet<String>,
    is_current: FxHashSet<Existential>,
    is_ceased: FxHashSet<Existential>,
    is_deprecated: FxHashSet<Existential>,
    is_superseded: FxHashSet<Existential>,
    is_superseding: FxHashSet<Existential>,
    alternate_geometries: FxHashSet<String>,
    geometries: GeometriesMode,
}

impl SprFilter {
    pub fn from_inputs(inputs: &SprInputs) -> Result<Self> {
        Ok(Self {
            placetypes: inputs.placetypes.iter().cloned().collect(),
            is_current: flag_set("is_current", &inputs.is_current)?,
            is_ceased: flag_set("is_ceased", &inputs.is_ceased)?,
            is_deprecated: flag_set("is_deprecated", &inputs.is_deprecated)?,
            is_superseded: flag_set("is_superseded", &inputs.is_superseded)?,
            is_superseding: flag_set("is_superseding", &inputs.is_superseding)?,
            alternate_geometries: inputs.alternate_geometries.iter().cloned().collect(),
            geometries: inputs.geometries,
        })
    }

    /// Build a filter from a URL query string such as
    /// `placetype=microhood&is_current=1&is_current=-1`.
    pub fn from_query(query: &str) -> Result<Self> {
        Self::from_inputs(&SprInputs::from_query(query)?)
    }

    fn check_flag(
        name: &str,
        allowed: &FxHashSet<Existential>,
        value: Existential,
    ) -> std::result::Result<(), Rejection> {
        if allowed.is_empty() || allowed.contains(&value) {
            Ok(())
        } else {
            Err(Rejection(format!("{} is {}", name, value)))
        }
    }
}

impl Filter for SprFilter {
    fn evaluate(&self, spr: &StandardPlacesResult) -> std::result::Result<(), Rejection> {
        if !self.placetypes.is_empty() && !self.placetypes.contains(&spr.placetype) {
            return Err(Rejection(format!("placetype is {}", spr.placetype)));
        }

        Self::check_flag("is_current", &self.is_current, spr.is_current)?;
        Self::check_flag("is_ceased", &self.is_ceased, spr.is_ceased)?;
        Self::check_flag("is_deprecated", &self.is_deprecated, spr.is_deprecated)?;
        Self::check_flag("is_superseded", &self.is_superseded, spr.is_superseded)?;
        Self::check_flag("is_superseding", &self.is_superseding, spr.is_superseding)?;

        match self.geometries {
            GeometriesMode::Alternate if !spr.is_alternate() => {
                return Err(Rejection::new("not an alternate geometry"));
            }
            GeometriesMode::Default if spr.is_alternate() => {
                return Err(Rejection::new("not a default geometry"));
            }
            _ => {}
        }

        if !self.alternate_geometries.is_empty()
            && !self.alternate_geometries.contains(&spr.alt_label)
        {
            return Err(Rejection(format!(
                "alternate geometry label is '{}'",
                spr.alt_label
            )));
        }

        Ok(())
    }
}

impl SprInputs {
    /// Collect criteria from a URL query string. Unknown keys are ignored.
    pub fn from_query(query: &str) -> Result<Self> {
        let mut inputs = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "placetype" => inputs.placetypes.push(value.into_owned()),
                "is_current" => inputs.is_current.push(parse_flag(&key, &value)?),
                "is_ceased" => inputs.is_ceased.push(parse_flag(&key, &value)?),
                "is_deprecated" => inputs.is_deprecated.push(parse_flag(&key, &value)?),
                "is_superseded" => inputs.is_superseded.push(parse_flag(&key, &value)?),
                "is_superseding" => inputs.is_superseding.push(parse_flag(&key, &value)?),
                "alternate_geometry" => inputs.alternate_geometries.push(value.into_owned()),
                "geometries" => inputs.geometries = value.parse()?,
                _ => {}
            }
        }

        Ok(inputs)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| SpatialError::InvalidInput(format!("Invalid {} flag: '{}'", name, value)))
}

fn flag_set(name: &str, flags: &[i64]) -> Result<FxHashSet<Existential>> {
    flags
        .iter()
        .map(|&flag| {
            Existential::from_flag(flag).ok_or_else(|| {
                SpatialError::InvalidInput(format!(
                    "Invalid {} flag {}, expected -1, 0 or 1",
                    name, flag
                ))
            })
        })
        .collect()
}
