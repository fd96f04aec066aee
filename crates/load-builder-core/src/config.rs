use serde::{Deserialize, Serialize};

/// Minimum fraction of an overhanging footprint's length that must rest
/// inside the trailer bed. Independent from the coverage floors below.
pub const SBOT: f64 = 0.70;

/// Guard on configuration branching; enumeration is truncated past this.
pub const MAX_CONFIGURATIONS: usize = 4096;

/// Geometry and selection knobs for packing one trailer.
///
/// `bin_width`/`bin_length` are the trailer interior; `overhang` extends the
/// usable length past the rear for overhang-eligible footprints. `plc_lb` is
/// the coverage floor a packing must reach to be accepted; `patching` drops
/// that floor to zero (leftover-distribution mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackConfig {
    pub bin_width: f64,
    pub bin_length: f64,
    pub bin_height: f64,
    /// Inches past the rear edge; 0 disables overhang for this bin.
    pub overhang: f64,
    /// Allow the completion pass to rotate freely.
    pub allow_rotation: bool,
    /// Loosen the coverage floor to 0 and accept any non-empty packing.
    pub patching: bool,
    /// Coverage floor: max placed extent / bin_length must reach this.
    pub plc_lb: f64,
    /// Cap on enumerated rotation configurations.
    #[serde(default = "default_max_configurations")]
    pub max_configurations: usize,
}

fn default_max_configurations() -> usize {
    MAX_CONFIGURATIONS
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            bin_width: 98.0,
            bin_length: 628.0,
            bin_height: 120.0,
            overhang: 0.0,
            allow_rotation: true,
            patching: false,
            plc_lb: 0.75,
            max_configurations: MAX_CONFIGURATIONS,
        }
    }
}

impl PackConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::LoadBuilderError;

        if self.bin_width <= 0.0 || self.bin_length <= 0.0 || self.bin_height <= 0.0 {
            return Err(LoadBuilderError::InvalidDimensions {
                what: "bin".into(),
                length: self.bin_length,
                width: self.bin_width,
                height: self.bin_height,
            });
        }
        if self.overhang < 0.0 {
            return Err(LoadBuilderError::InvalidInput(format!(
                "negative overhang: {}",
                self.overhang
            )));
        }
        if !(0.0..=1.0).contains(&self.plc_lb) {
            return Err(LoadBuilderError::InvalidInput(format!(
                "plc_lb out of range: {}",
                self.plc_lb
            )));
        }
        if self.max_configurations == 0 {
            return Err(LoadBuilderError::InvalidInput(
                "max_configurations must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Create a fluent builder for `PackConfig`.
    pub fn builder() -> PackConfigBuilder {
        PackConfigBuilder::new()
    }
}

/// Builder for `PackConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackConfigBuilder {
    cfg: PackConfig,
}

impl PackConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackConfig::default(),
        }
    }
    pub fn with_bin(mut self, width: f64, length: f64, height: f64) -> Self {
        self.cfg.bin_width = width;
        self.cfg.bin_length = length;
        self.cfg.bin_height = height;
        self
    }
    pub fn overhang(mut self, v: f64) -> Self {
        self.cfg.overhang = v;
        self
    }
    pub fn allow_rotation(mut self, v: bool) -> Self {
        self.cfg.allow_rotation = v;
        self
    }
    pub fn patching(mut self, v: bool) -> Self {
        self.cfg.patching = v;
        self
    }
    pub fn plc_lb(mut self, v: f64) -> Self {
        self.cfg.plc_lb = v;
        self
    }
    pub fn max_configurations(mut self, v: usize) -> Self {
        self.cfg.max_configurations = v;
        self
    }
    pub fn build(self) -> PackConfig {
        self.cfg
    }
}

/// Per-phase knobs for the planning pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Coverage floor in the perfect-match phase.
    #[serde(default = "default_perfect_floor")]
    pub perfect_match_floor: f64,
    /// Coverage floor in the satisfy-minimum phase.
    #[serde(default = "default_min_floor")]
    pub satisfy_min_floor: f64,
    /// Coverage floor in the satisfy-maximum phase.
    #[serde(default = "default_max_floor")]
    pub satisfy_max_floor: f64,
    /// Restrict the satisfy-maximum phase to wishes with good credit.
    #[serde(default)]
    pub credit_filter: bool,
    /// Verify used trailers against the catalog after each lane.
    #[serde(default = "default_true")]
    pub check_trailer_mix: bool,
    #[serde(default = "default_max_configurations_phase")]
    pub max_configurations: usize,
}

fn default_perfect_floor() -> f64 {
    0.75
}
fn default_min_floor() -> f64 {
    0.74
}
fn default_max_floor() -> f64 {
    0.80
}
fn default_true() -> bool {
    true
}
fn default_max_configurations_phase() -> usize {
    MAX_CONFIGURATIONS
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            perfect_match_floor: default_perfect_floor(),
            satisfy_min_floor: default_min_floor(),
            satisfy_max_floor: default_max_floor(),
            credit_filter: false,
            check_trailer_mix: true,
            max_configurations: MAX_CONFIGURATIONS,
        }
    }
}
