use crate::config::{PackConfig, MAX_CONFIGURATIONS};
use crate::loader::load_trailer;
use crate::model::{Trailer, TrailerSpec};
use crate::warehouse::Warehouse;
use tracing::{debug, warn};

/// Per-round knobs for building one lane.
#[derive(Debug, Clone)]
pub struct BuildOptions<'a> {
    /// Coverage floor forwarded to the per-trailer driver.
    pub plc_lb: f64,
    pub patching: bool,
    pub max_configurations: usize,
    /// Stop after this many trailers have been completed in this round.
    pub max_trailers: usize,
    /// Verify completed trailers against the catalog (may be disabled for
    /// performance).
    pub check_trailer_mix: bool,
    pub catalog: Option<&'a [TrailerSpec]>,
}

impl Default for BuildOptions<'_> {
    fn default() -> Self {
        Self {
            plc_lb: 0.75,
            patching: false,
            max_configurations: MAX_CONFIGURATIONS,
            max_trailers: usize::MAX,
            check_trailer_mix: false,
            catalog: None,
        }
    }
}

/// Outcome of one allocation round on a lane.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Trailers completed in this round.
    pub built: usize,
    /// Unit identifiers left on the warehouse floor after the round.
    pub unused_models: Vec<String>,
}

/// Owns one lane's trailers and drives per-trailer packing in priority order.
///
/// Trailers that receive at least one stack migrate to `trailers_done`;
/// empty ones stay in `trailers` and return to the quota pool for later
/// phases.
#[derive(Debug, Clone, Default)]
pub struct LaneAllocator {
    pub origin: String,
    pub destination: String,
    pub trailers: Vec<Trailer>,
    pub trailers_done: Vec<Trailer>,
    pub warehouse: Warehouse,
}

impl LaneAllocator {
    pub fn new(origin: String, destination: String, trailers: Vec<Trailer>) -> Self {
        Self {
            origin,
            destination,
            trailers,
            trailers_done: Vec::new(),
            warehouse: Warehouse::default(),
        }
    }

    /// Runs one allocation round: tries every remaining trailer in
    /// (priority desc, floor area desc) order until the warehouse empties
    /// or the round's trailer cap is reached, then drains the leftover
    /// stacks into `unused_models`.
    pub fn build(&mut self, opts: &BuildOptions<'_>) -> BuildReport {
        self.trailers.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(b.floor_area().total_cmp(&a.floor_area()))
        });

        let mut built = 0usize;
        let mut kept: Vec<Trailer> = Vec::new();
        let pending: Vec<Trailer> = std::mem::take(&mut self.trailers);
        for mut trailer in pending {
            if self.warehouse.is_empty() || built >= opts.max_trailers {
                kept.push(trailer);
                continue;
            }
            if !self.any_item_admissible(&trailer) {
                warn!(
                    category = %trailer.category,
                    origin = %self.origin,
                    destination = %self.destination,
                    "trailer cannot admit any item on this lane"
                );
                kept.push(trailer);
                continue;
            }
            let cfg = PackConfig {
                bin_width: trailer.width,
                bin_length: trailer.length,
                bin_height: trailer.height,
                overhang: trailer.overhang,
                allow_rotation: true,
                patching: opts.patching,
                plc_lb: opts.plc_lb,
                max_configurations: opts.max_configurations,
            };
            if load_trailer(&mut trailer, &mut self.warehouse, &cfg) {
                built += 1;
                self.trailers_done.push(trailer);
            } else {
                kept.push(trailer);
            }
        }
        self.trailers = kept;

        if opts.check_trailer_mix {
            if let Some(catalog) = opts.catalog {
                self.check_mix(catalog);
            }
        }

        let unused_models = self.warehouse.drain_models();
        debug!(
            origin = %self.origin,
            destination = %self.destination,
            built,
            unused = unused_models.len(),
            "allocation round finished"
        );
        BuildReport {
            built,
            unused_models,
        }
    }

    fn any_item_admissible(&self, trailer: &Trailer) -> bool {
        self.warehouse
            .stacks()
            .iter()
            .any(|s| trailer.admits(s) || trailer.admits_rotated(s))
    }

    fn check_mix(&self, catalog: &[TrailerSpec]) {
        for t in &self.trailers_done {
            let reference = catalog.iter().find(|s| s.category == t.category);
            match reference {
                Some(spec)
                    if (spec.length - t.length).abs() < 1e-9
                        && (spec.width - t.width).abs() < 1e-9 => {}
                _ => warn!(
                    category = %t.category,
                    "used trailer does not match its catalog definition"
                ),
            }
        }
    }
}
