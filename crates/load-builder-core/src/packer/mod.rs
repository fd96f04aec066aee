use crate::geom::Rect;
use serde::{Deserialize, Serialize};

pub mod skyline;

pub use skyline::SkylinePacker;

/// A rectangle placed on the trailer floor, with its rotation decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Placement {
    pub rect: Rect,
    pub rotated: bool,
}
