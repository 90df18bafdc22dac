//! Run configuration for the ground filter.
//!
//! Every recognized option is a field of [`SmrfConfig`]. Unrecognized keys
//! in a JSON option bag are rejected rather than ignored.

use serde::{Deserialize, Serialize};
use smrf_core::raster::{validate_cell_size, EdgeClamp};
use smrf_core::{Error, Result};

use super::net_cut::net_stride;
use crate::interpolation::{Aggregation, GapFillMethod};

/// Default gap-fill method code (springs).
pub const DEFAULT_GAP_FILL_METHOD: u8 = 4;

/// Window radii for the progressive filter, in map units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WindowSpec {
    /// Largest radius; the filter steps through every whole pixel up to it
    Max(f64),
    /// Explicit ascending radii
    Sequence(Vec<f64>),
}

impl WindowSpec {
    fn validate(&self) -> Result<()> {
        match self {
            WindowSpec::Max(radius) => check_positive("window", *radius),
            WindowSpec::Sequence(radii) => {
                if radii.is_empty() {
                    return Err(Error::InvalidParameter {
                        name: "window",
                        value: "[]".into(),
                        reason: "window sequence must not be empty".into(),
                    });
                }
                for &r in radii {
                    check_positive("window", r)?;
                }
                if radii.windows(2).any(|w| w[1] < w[0]) {
                    return Err(Error::InvalidParameter {
                        name: "window",
                        value: format!("{radii:?}"),
                        reason: "window radii must be ascending".into(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Options for one ground-filter run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmrfConfig {
    /// Grid spacing in map units. Not needed when `grid_x`/`grid_y` are set.
    #[serde(alias = "cellSize")]
    pub cell_size: Option<f64>,
    /// Terrain slope (dz/dx) the progressive filter tolerates
    #[serde(alias = "slopeThreshold")]
    pub slope_threshold: Option<f64>,
    #[serde(
        alias = "maxWindow",
        alias = "max_window",
        alias = "windowSequence",
        alias = "window_sequence"
    )]
    pub window: Option<WindowSpec>,
    /// Fixed part of the per-point vertical tolerance
    #[serde(alias = "elevationThreshold")]
    pub elevation_threshold: Option<f64>,
    /// Slope-proportional part of the per-point vertical tolerance
    #[serde(alias = "elevationScaler")]
    pub elevation_scaler: Option<f64>,
    /// Explicit x coordinates of the grid nodes
    #[serde(alias = "explicitGridX")]
    pub grid_x: Option<Vec<f64>>,
    /// Explicit y coordinates of the grid nodes
    #[serde(alias = "explicitGridY")]
    pub grid_y: Option<Vec<f64>>,
    #[serde(alias = "gapFillMethod")]
    pub gap_fill_method: u8,
    /// Row/column spacing of the net cut, in map units
    #[serde(alias = "netSpacing")]
    pub net_spacing: Option<f64>,
    #[serde(alias = "edgeClamp")]
    pub edge_clamp: EdgeClamp,
    /// Reduction of the elevations sharing a cell
    pub aggregation: Aggregation,
}

impl Default for SmrfConfig {
    fn default() -> Self {
        Self {
            cell_size: None,
            slope_threshold: None,
            window: None,
            elevation_threshold: None,
            elevation_scaler: None,
            grid_x: None,
            grid_y: None,
            gap_fill_method: DEFAULT_GAP_FILL_METHOD,
            net_spacing: None,
            edge_clamp: EdgeClamp::default(),
            aggregation: Aggregation::default(),
        }
    }
}

impl SmrfConfig {
    /// Configuration with the three required options set.
    pub fn new(cell_size: f64, slope_threshold: f64, window: WindowSpec) -> Self {
        Self {
            cell_size: Some(cell_size),
            slope_threshold: Some(slope_threshold),
            window: Some(window),
            ..Default::default()
        }
    }

    pub fn with_elevation_threshold(mut self, threshold: f64) -> Self {
        self.elevation_threshold = Some(threshold);
        self
    }

    pub fn with_elevation_scaler(mut self, scaler: f64) -> Self {
        self.elevation_scaler = Some(scaler);
        self
    }

    /// Use explicit node coordinates instead of deriving the grid from the cloud.
    pub fn with_grid(mut self, xi: Vec<f64>, yi: Vec<f64>) -> Self {
        self.grid_x = Some(xi);
        self.grid_y = Some(yi);
        self
    }

    pub fn with_gap_fill_method(mut self, code: u8) -> Self {
        self.gap_fill_method = code;
        self
    }

    pub fn with_net_spacing(mut self, spacing: f64) -> Self {
        self.net_spacing = Some(spacing);
        self
    }

    pub fn with_edge_clamp(mut self, clamp: EdgeClamp) -> Self {
        self.edge_clamp = clamp;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Parse a JSON option bag.
    ///
    /// Unrecognized keys yield [`Error::UnknownOption`]; malformed values
    /// yield [`Error::InvalidParameter`]. The result is not validated.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            let msg = e.to_string();
            match unknown_field(&msg) {
                Some(field) => Error::UnknownOption(field),
                None => Error::InvalidParameter {
                    name: "config",
                    value: json.chars().take(64).collect(),
                    reason: msg,
                },
            }
        })
    }

    /// Check that the required options are present and consistent.
    pub fn validate(&self) -> Result<()> {
        match (&self.grid_x, &self.grid_y) {
            (Some(_), None) => return Err(Error::MissingParameter("grid_y")),
            (None, Some(_)) => return Err(Error::MissingParameter("grid_x")),
            (None, None) => {
                validate_cell_size(self.cell_size.ok_or(Error::MissingParameter("cell_size"))?)?
            }
            (Some(_), Some(_)) => {
                if let Some(c) = self.cell_size {
                    validate_cell_size(c)?;
                }
            }
        }

        let slope = self.slope_threshold.ok_or(Error::MissingParameter("slope_threshold"))?;
        if !(slope.is_finite() && slope >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "slope_threshold",
                value: slope.to_string(),
                reason: "slope threshold must be non-negative".into(),
            });
        }

        self.window.as_ref().ok_or(Error::MissingParameter("window"))?.validate()?;

        if let Some(et) = self.elevation_threshold {
            check_non_negative("elevation_threshold", et)?;
        }
        if let Some(es) = self.elevation_scaler {
            if self.elevation_threshold.is_none() {
                return Err(Error::MissingParameter("elevation_threshold"));
            }
            check_non_negative("elevation_scaler", es)?;
        }

        if let Some(spacing) = self.net_spacing {
            match self.cell_size {
                Some(c) => {
                    net_stride(spacing, c)?;
                }
                None => check_positive("net_spacing", spacing)?,
            }
        }

        self.gap_fill_kind()?;
        Ok(())
    }

    /// Kernel selected by `gap_fill_method`.
    pub fn gap_fill_kind(&self) -> Result<GapFillMethod> {
        GapFillMethod::from_code(self.gap_fill_method)
    }

    /// `(threshold, scaler)` of the per-point tolerance, if reclassification
    /// is requested. A missing scaler counts as 0.
    pub fn elevation_tolerance(&self) -> Option<(f64, f64)> {
        self.elevation_threshold
            .map(|et| (et, self.elevation_scaler.unwrap_or(0.0)))
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "must be strictly positive".into(),
        })
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "must be non-negative".into(),
        })
    }
}

/// Field name out of serde's "unknown field `name`, expected ..." message
fn unknown_field(msg: &str) -> Option<String> {
    let rest = msg.strip_prefix("unknown field `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_defaults() {
        let cfg =
            SmrfConfig::from_json(r#"{"cell_size": 1.0, "slope_threshold": 0.15, "window": 18}"#)
                .unwrap();
        assert_eq!(cfg.window, Some(WindowSpec::Max(18.0)));
        assert_eq!(cfg.gap_fill_method, 4);
        assert_eq!(cfg.edge_clamp, EdgeClamp::LowSide);
        assert_eq!(cfg.aggregation, Aggregation::Min);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json_camel_case_and_sequence() {
        let cfg = SmrfConfig::from_json(
            r#"{"cellSize": 0.5, "slopeThreshold": 0.2, "windowSequence": [1, 2.5, 4],
                "elevationThreshold": 0.3, "netSpacing": 10, "edgeClamp": "symmetric"}"#,
        )
        .unwrap();
        assert_eq!(cfg.window, Some(WindowSpec::Sequence(vec![1.0, 2.5, 4.0])));
        assert_eq!(cfg.edge_clamp, EdgeClamp::Symmetric);
        assert_eq!(cfg.elevation_tolerance(), Some((0.3, 0.0)));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = SmrfConfig::from_json(r#"{"cell_size": 1.0, "cutnet": 5}"#).unwrap_err();
        assert!(matches!(err, Error::UnknownOption(ref k) if k == "cutnet"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_malformed_value_is_configuration_error() {
        let err = SmrfConfig::from_json(r#"{"cell_size": "big"}"#).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_required() {
        let mut cfg = SmrfConfig::new(1.0, 0.1, WindowSpec::Max(5.0));
        cfg.slope_threshold = None;
        assert!(matches!(cfg.validate(), Err(Error::MissingParameter("slope_threshold"))));

        let mut cfg = SmrfConfig::new(1.0, 0.1, WindowSpec::Max(5.0));
        cfg.window = None;
        assert!(matches!(cfg.validate(), Err(Error::MissingParameter("window"))));

        let mut cfg = SmrfConfig::new(1.0, 0.1, WindowSpec::Max(5.0));
        cfg.cell_size = None;
        assert!(matches!(cfg.validate(), Err(Error::MissingParameter("cell_size"))));
    }

    #[test]
    fn test_explicit_grid_replaces_cell_size() {
        let mut cfg = SmrfConfig::new(1.0, 0.1, WindowSpec::Max(5.0))
            .with_grid(vec![0.0, 1.0], vec![1.0, 0.0]);
        cfg.cell_size = None;
        assert!(cfg.validate().is_ok());

        cfg.grid_y = None;
        assert!(matches!(cfg.validate(), Err(Error::MissingParameter("grid_y"))));
    }

    #[test]
    fn test_invalid_values() {
        assert!(SmrfConfig::new(0.0, 0.1, WindowSpec::Max(5.0)).validate().is_err());
        assert!(SmrfConfig::new(-1.0, 0.1, WindowSpec::Max(5.0)).validate().is_err());
        assert!(SmrfConfig::new(1.0, -0.1, WindowSpec::Max(5.0)).validate().is_err());
        assert!(SmrfConfig::new(1.0, 0.1, WindowSpec::Max(0.0)).validate().is_err());
        assert!(SmrfConfig::new(1.0, 0.1, WindowSpec::Sequence(vec![])).validate().is_err());
        assert!(SmrfConfig::new(1.0, 0.1, WindowSpec::Sequence(vec![3.0, 1.0]))
            .validate()
            .is_err());
        assert!(SmrfConfig::new(1.0, 0.1, WindowSpec::Max(5.0))
            .with_gap_fill_method(3)
            .validate()
            .unwrap_err()
            .is_configuration());
        assert!(SmrfConfig::new(1.0, 0.1, WindowSpec::Max(5.0))
            .with_net_spacing(0.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_net_spacing_must_exceed_cell_size() {
        let base = SmrfConfig::new(1.0, 0.1, WindowSpec::Max(5.0));
        for spacing in [0.5, 1.0] {
            let err = base.clone().with_net_spacing(spacing).validate().unwrap_err();
            assert!(err.is_configuration());
            assert!(matches!(err, Error::InvalidParameter { name: "net_spacing", .. }));
        }
        assert!(base.clone().with_net_spacing(2.0).validate().is_ok());
        let coarse = SmrfConfig::new(2.0, 0.1, WindowSpec::Max(5.0)).with_net_spacing(2.0);
        assert!(coarse.validate().is_err());
    }

    #[test]
    fn test_scaler_needs_threshold() {
        let cfg = SmrfConfig::new(1.0, 0.1, WindowSpec::Max(5.0)).with_elevation_scaler(1.2);
        assert!(matches!(cfg.validate(), Err(Error::MissingParameter("elevation_threshold"))));
        let cfg = cfg.with_elevation_threshold(0.5);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.elevation_tolerance(), Some((0.5, 1.2)));
    }
}
