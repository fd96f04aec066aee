use crate::config::SBOT;
use crate::error::{LoadBuilderError, Result};
use crate::geom::Rect;
use serde::{Deserialize, Serialize};

/// Material of a crate; decides how strict footprint matching is when stacking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaterialKind {
    Wood,
    Metal,
}

/// An indivisible box carrying one or more shippable units.
///
/// Footprint is canonicalized so that `length >= width`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crate {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    /// Max crates stackable on top of each other for this crate type.
    pub stack_limit: u32,
    pub overhang_allowed: bool,
    pub mandatory: bool,
    pub ranking: i32,
    pub material: MaterialKind,
    /// Unit identifiers contained in this crate.
    pub models: Vec<String>,
}

impl Crate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        length: f64,
        width: f64,
        height: f64,
        stack_limit: u32,
        overhang_allowed: bool,
        mandatory: bool,
        ranking: i32,
        material: MaterialKind,
        models: Vec<String>,
    ) -> Result<Self> {
        if length <= 0.0 || width <= 0.0 || height <= 0.0 {
            return Err(LoadBuilderError::InvalidDimensions {
                what: "crate".into(),
                length,
                width,
                height,
            });
        }
        if stack_limit == 0 {
            return Err(LoadBuilderError::InvalidInput(
                "crate stack_limit must be >= 1".into(),
            ));
        }
        // canonical footprint: long side is the length
        let (length, width) = if length >= width {
            (length, width)
        } else {
            (width, length)
        };
        Ok(Self {
            length,
            width,
            height,
            stack_limit,
            overhang_allowed,
            mandatory,
            ranking,
            material,
            models,
        })
    }
}

/// A vertical pile of crates with compatible base footprints.
///
/// Wood crates only need matching widths; metal crates must also match in
/// length. The base length of a wood stack is the longest crate in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stack {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub material: MaterialKind,
    pub overhang_allowed: bool,
    pub nb_of_mandatory: usize,
    pub average_ranking: f64,
    /// Unit identifiers across all contained crates.
    pub models: Vec<String>,
    /// Number of crates in the pile.
    pub nb_of_crates: usize,
}

impl Stack {
    /// Builds a stack from crates already checked for compatibility by the
    /// stack builder (same width; same length too for metal).
    pub fn from_crates(crates: &[Crate]) -> Self {
        debug_assert!(!crates.is_empty());
        debug_assert!(crates.iter().all(|c| (c.width - crates[0].width).abs() < 1e-9));
        debug_assert!(
            crates[0].material == MaterialKind::Wood
                || crates
                    .iter()
                    .all(|c| (c.length - crates[0].length).abs() < 1e-9)
        );
        let length = crates.iter().map(|c| c.length).fold(0.0, f64::max);
        let width = crates[0].width;
        let height = crates.iter().map(|c| c.height).sum();
        let nb_of_mandatory = crates.iter().filter(|c| c.mandatory).count();
        let average_ranking =
            crates.iter().map(|c| c.ranking as f64).sum::<f64>() / crates.len() as f64;
        let models = crates.iter().flat_map(|c| c.models.iter().cloned()).collect();
        Self {
            length,
            width,
            height,
            material: crates[0].material,
            overhang_allowed: crates.iter().all(|c| c.overhang_allowed),
            nb_of_mandatory,
            average_ranking,
            models,
            nb_of_crates: crates.len(),
        }
    }

    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Number of unit identifiers the stack carries.
    pub fn nb_of_models(&self) -> usize {
        self.models.len()
    }
}

/// One catalog record: trailer interior dimensions per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailerSpec {
    pub category: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    /// Authorized rear extension in inches; 0 if the category disallows it.
    pub overhang: f64,
    /// Higher priority trailers are loaded first.
    pub priority: i32,
}

impl TrailerSpec {
    pub fn validate(&self) -> Result<()> {
        if self.length <= 0.0 || self.width <= 0.0 || self.height <= 0.0 {
            return Err(LoadBuilderError::InvalidDimensions {
                what: format!("trailer {}", self.category),
                length: self.length,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn floor_area(&self) -> f64 {
        self.length * self.width
    }
}

/// A trailer being loaded for one lane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trailer {
    pub category: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub overhang: f64,
    pub priority: i32,
    pub stacks: Vec<PlacedStack>,
    /// Max forward extent among placed footprints; may exceed `length`
    /// when an overhanging stack hangs past the rear.
    pub length_used: f64,
}

impl Trailer {
    pub fn from_spec(spec: &TrailerSpec) -> Self {
        Self {
            category: spec.category.clone(),
            length: spec.length,
            width: spec.width,
            height: spec.height,
            overhang: spec.overhang,
            priority: spec.priority,
            stacks: Vec::new(),
            length_used: 0.0,
        }
    }

    pub fn floor_area(&self) -> f64 {
        self.length * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// True if `stack` fits through the door un-rotated (width across).
    pub fn admits(&self, stack: &Stack) -> bool {
        stack.width <= self.width && self.length_fits(stack.length, stack.overhang_allowed)
            && stack.height <= self.height
    }

    /// True if `stack` fits rotated (length across, width along).
    pub fn admits_rotated(&self, stack: &Stack) -> bool {
        stack.length <= self.width && self.length_fits(stack.width, stack.overhang_allowed)
            && stack.height <= self.height
    }

    /// Length admissibility with the rear-overhang rule: an overhanging
    /// footprint must keep at least `SBOT` of its length inside the bed.
    pub fn length_fits(&self, l: f64, overhang_allowed: bool) -> bool {
        l <= self.length
            || (overhang_allowed && SBOT * l <= self.length && l <= self.length + self.overhang)
    }
}

/// A stack committed to a trailer at a concrete floor position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedStack {
    pub rect: Rect,
    pub rotated: bool,
    pub stack: Stack,
}

/// A desired shipment of exactly one crate's worth of units on a lane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wish {
    /// Unit identifier of the shipment (audit key: sales doc/item).
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub material_number: String,
    /// Size-dimension label of the crate ("model").
    pub model: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub stack_limit: u32,
    /// Lower rank = higher priority.
    pub rank: i32,
    pub mandatory: bool,
    pub overhang_allowed: bool,
    pub material: MaterialKind,
    /// One wish = one crate; anything above 1 is a legacy input error.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default = "default_true")]
    pub credit_ok: bool,
    /// Index into the inventory pool while a unit is reserved.
    #[serde(skip)]
    pub reserved: Option<usize>,
    #[serde(default)]
    pub finished: bool,
}

fn default_quantity() -> u32 {
    1
}
fn default_true() -> bool {
    true
}

impl Wish {
    pub fn validate(&self) -> Result<()> {
        if self.length <= 0.0 || self.width <= 0.0 || self.height <= 0.0 {
            return Err(LoadBuilderError::InvalidDimensions {
                what: format!("wish {}", self.id),
                length: self.length,
                width: self.width,
                height: self.height,
            });
        }
        if self.quantity > 1 {
            return Err(LoadBuilderError::InvalidInput(format!(
                "wish {} has legacy quantity {} (one wish = one crate)",
                self.id, self.quantity
            )));
        }
        if self.stack_limit == 0 {
            return Err(LoadBuilderError::InvalidInput(format!(
                "wish {} has stack_limit 0",
                self.id
            )));
        }
        Ok(())
    }

    /// One crate per wish, carrying the wish id as its unit identifier.
    pub fn to_crate(&self) -> Result<Crate> {
        Crate::new(
            self.length,
            self.width,
            self.height,
            self.stack_limit,
            self.overhang_allowed,
            self.mandatory,
            self.rank,
            self.material,
            vec![self.id.clone()],
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryStatus {
    Inventory,
    QaHold,
    ProductionPlan,
}

/// One inventory record at an origin point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub origin: String,
    pub material_number: String,
    pub quantity: u32,
    /// Days until the stock becomes available; 0 = on hand today.
    #[serde(default)]
    pub available_in_days: u32,
    pub status: InventoryStatus,
}

impl InventoryItem {
    pub fn is_future(&self) -> bool {
        self.available_in_days > 0
    }
}

/// Per-lane parameters for one origin -> destination pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanePlan {
    pub origin: String,
    pub destination: String,
    pub load_min: u32,
    pub load_max: u32,
    pub flatbed_qty: u32,
    pub drybox_qty: u32,
    /// Quota on the 53-ft flatbed pool shared across configured origins.
    pub flatbed_53_qty: u32,
    pub priority: i32,
    pub transit_days: u32,
    /// Future-availability horizon; 0 restricts to on-hand stock.
    pub days_to: u32,
}

/// A finished trailer as reported to collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedTrailer {
    pub category: String,
    pub length: f64,
    pub length_used: f64,
    pub stacks: Vec<PlacedStack>,
}

/// Result of building one lane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneResult {
    pub origin: String,
    pub destination: String,
    pub trailers: Vec<LoadedTrailer>,
    /// Unit identifiers that stayed on the warehouse floor.
    pub unused_models: Vec<String>,
    pub elapsed_ms: u64,
}

/// Result of a full pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub lanes: Vec<LaneResult>,
    /// Inventory reserved by some wish but never placed: destination ->
    /// material number -> quantity.
    pub booked_unused: std::collections::BTreeMap<String, std::collections::BTreeMap<String, u32>>,
    /// Inventory never reserved at all: material number -> quantity.
    pub unbooked: std::collections::BTreeMap<String, u32>,
    /// Destinations each unbooked material could in principle have served.
    pub unbooked_destinations:
        std::collections::BTreeMap<String, std::collections::BTreeSet<String>>,
}
