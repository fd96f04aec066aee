//! Core library for building trailer loads on plant-to-plant lanes.
//!
//! - Stacking: loose crates are piled into stacks under material rules
//! - Packing: a skyline placer fills each trailer floor, with rotation and
//!   a bounded rear overhang
//! - Allocation: per-lane trailers are driven in priority order until the
//!   lane's minimum, then maximum load counts are reached
//! - Pipeline: `run_pipeline` executes the four phases (perfect match,
//!   satisfy-min, satisfy-max, leftover distribution) over a shared
//!   inventory pool
//!
//! Quick example:
//! ```ignore
//! use load_builder_core::prelude::*;
//!
//! # fn main() -> load_builder_core::Result<()> {
//! let catalog = TrailerCatalog { specs: vec![/* per-category records */] };
//! let mut pool = InventoryPool::new(vec![/* inventory snapshot */]);
//! let mut ctx = PipelineContext::new(NestedOrigins::default(), SharedPoolDef::default());
//! let mut wishes = vec![/* one wish per crate */];
//! let result = run_pipeline(
//!     vec![/* lane parameters */],
//!     &mut wishes,
//!     &mut pool,
//!     &catalog,
//!     &mut ctx,
//!     &PhaseConfig::default(),
//! )?;
//! println!("{}", result.stats().summary());
//! # Ok(()) }
//! ```

pub mod allocator;
pub mod config;
pub mod error;
pub mod geom;
pub mod loader;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod pool;
pub mod stacking;
pub mod stats;
pub mod warehouse;

pub use config::*;
pub use error::*;
pub use geom::Rect;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use pool::*;
pub use stats::*;

/// Convenience prelude for common types and functions.
/// Importing `load_builder_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::allocator::{BuildOptions, BuildReport, LaneAllocator};
    pub use crate::config::{PackConfig, PackConfigBuilder, PhaseConfig, MAX_CONFIGURATIONS, SBOT};
    pub use crate::geom::Rect;
    pub use crate::loader::load_trailer;
    pub use crate::model::{
        Crate, InventoryItem, InventoryStatus, LanePlan, LaneResult, LoadedTrailer, MaterialKind,
        PipelineResult, PlacedStack, Stack, Trailer, TrailerSpec, Wish,
    };
    pub use crate::packer::{Placement, SkylinePacker};
    pub use crate::pipeline::{
        build_lane, run_pipeline, PipelineContext, SharedPoolDef, TrailerCatalog, CAT_DRYBOX,
        CAT_FLATBED, CAT_FLATBED_53,
    };
    pub use crate::pool::{InventoryPool, NestedOrigins};
    pub use crate::stacking::build_stacks;
    pub use crate::stats::LoadStats;
    pub use crate::warehouse::{MergeOutcome, Warehouse};
}
