use crate::allocator::{BuildOptions, LaneAllocator};
use crate::config::PhaseConfig;
use crate::error::{LoadBuilderError, Result};
use crate::geom::{EPS, Rect};
use crate::model::{
    InventoryItem, LanePlan, LaneResult, LoadedTrailer, MaterialKind, PipelineResult, PlacedStack,
    Trailer, TrailerSpec, Wish,
};
use crate::packer::SkylinePacker;
use crate::pool::{InventoryPool, NestedOrigins};
use crate::stacking::build_stacks;
use crate::warehouse::Warehouse;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Catalog categories that lane quotas refer to.
pub const CAT_FLATBED: &str = "FLATBED";
pub const CAT_DRYBOX: &str = "DRYBOX";
pub const CAT_FLATBED_53: &str = "FLATBED_53";

/// Trailer catalog: one record per category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrailerCatalog {
    pub specs: Vec<TrailerSpec>,
}

impl TrailerCatalog {
    pub fn get(&self, category: &str) -> Option<&TrailerSpec> {
        self.specs.iter().find(|s| s.category == category)
    }
}

/// Definition of the trailer pool shared across a subset of origins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedPoolDef {
    pub category: String,
    pub origins: Vec<String>,
    pub quantity: u32,
}

/// Orchestrator state threaded explicitly through the phases: the nesting
/// table, the shared trailer pool and the residuals-per-destination counter.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub nested: NestedOrigins,
    pub shared_origins: BTreeSet<String>,
    pub shared_category: String,
    pub shared_remaining: u32,
    pub residuals: BTreeMap<String, u32>,
}

impl PipelineContext {
    pub fn new(nested: NestedOrigins, shared: SharedPoolDef) -> Self {
        Self {
            nested,
            shared_origins: shared.origins.into_iter().collect(),
            shared_category: if shared.category.is_empty() {
                CAT_FLATBED_53.to_string()
            } else {
                shared.category
            },
            shared_remaining: shared.quantity,
            residuals: BTreeMap::new(),
        }
    }

    fn is_shared_origin(&self, origin: &str) -> bool {
        self.shared_origins.contains(origin)
    }
}

/// Per-lane run state carried across the four phases.
struct LaneRun {
    plan: LanePlan,
    alloc: LaneAllocator,
    flatbed_left: u32,
    drybox_left: u32,
    flatbed_53_left: u32,
    elapsed_ms: u64,
}

impl LaneRun {
    fn new(plan: LanePlan) -> Self {
        let alloc = LaneAllocator::new(plan.origin.clone(), plan.destination.clone(), Vec::new());
        Self {
            flatbed_left: plan.flatbed_qty,
            drybox_left: plan.drybox_qty,
            flatbed_53_left: plan.flatbed_53_qty,
            plan,
            alloc,
            elapsed_ms: 0,
        }
    }

    fn built(&self) -> u32 {
        self.alloc.trailers_done.len() as u32
    }

    /// Opens up to `cap` trailers for one round, highest catalog priority
    /// first. Quotas are only debited once a trailer actually completes.
    fn open_trailers(
        &self,
        catalog: &TrailerCatalog,
        ctx: &PipelineContext,
        cap: usize,
    ) -> Vec<Trailer> {
        let shared = ctx.is_shared_origin(&self.plan.origin);
        let mut avail: Vec<(&TrailerSpec, u32)> = Vec::new();
        for (category, quota) in [
            (CAT_FLATBED, self.flatbed_left),
            (CAT_DRYBOX, self.drybox_left),
            (
                CAT_FLATBED_53,
                if shared {
                    self.flatbed_53_left.min(ctx.shared_remaining)
                } else {
                    self.flatbed_53_left
                },
            ),
        ] {
            if quota == 0 {
                continue;
            }
            match catalog.get(category) {
                Some(spec) => avail.push((spec, quota)),
                None => warn!(category, "lane quota names a category absent from the catalog"),
            }
        }
        avail.sort_by(|a, b| b.0.priority.cmp(&a.0.priority));

        let mut out = Vec::new();
        let mut left = cap;
        for (spec, quota) in avail {
            let n = (quota as usize).min(left);
            for _ in 0..n {
                out.push(Trailer::from_spec(spec));
            }
            left -= n;
            if left == 0 {
                break;
            }
        }
        out
    }

    fn consume_quota(&mut self, category: &str, ctx: &mut PipelineContext) {
        if category == CAT_FLATBED {
            self.flatbed_left = self.flatbed_left.saturating_sub(1);
        } else if category == CAT_DRYBOX {
            self.drybox_left = self.drybox_left.saturating_sub(1);
        } else if category == ctx.shared_category {
            self.flatbed_53_left = self.flatbed_53_left.saturating_sub(1);
            if ctx.is_shared_origin(&self.plan.origin) {
                ctx.shared_remaining = ctx.shared_remaining.saturating_sub(1);
            }
        }
    }

    /// One reservation-and-pack round: builds stacks from the lane's
    /// reserved unfinished wishes, opens trailers and packs up to the cap.
    #[allow(clippy::too_many_arguments)]
    fn round(
        &mut self,
        wishes: &mut [Wish],
        pool: &mut InventoryPool,
        catalog: &TrailerCatalog,
        ctx: &mut PipelineContext,
        floor: f64,
        cap_total: u32,
        cfg: &PhaseConfig,
    ) -> Result<()> {
        let started = Instant::now();
        let done = self.built();
        if cap_total <= done {
            return Ok(());
        }
        let cap_round = (cap_total - done) as usize;

        let mut crates = Vec::new();
        for w in wishes.iter() {
            if !wish_on_lane(w, &self.plan) || w.finished || w.reserved.is_none() {
                continue;
            }
            crates.push(w.to_crate()?);
        }
        if crates.is_empty() {
            return Ok(());
        }
        let stacks = build_stacks(crates);
        self.alloc.warehouse = Warehouse::new(stacks);
        self.alloc.trailers = self.open_trailers(catalog, ctx, cap_round);

        let before = self.alloc.trailers_done.len();
        let opts = BuildOptions {
            plc_lb: floor,
            patching: false,
            max_configurations: cfg.max_configurations,
            max_trailers: cap_round,
            check_trailer_mix: cfg.check_trailer_mix,
            catalog: Some(&catalog.specs),
        };
        self.alloc.build(&opts);

        let categories: Vec<String> = self.alloc.trailers_done[before..]
            .iter()
            .map(|t| t.category.clone())
            .collect();
        for category in categories {
            self.consume_quota(&category, ctx);
        }
        // unopened and empty trailers return to the quota pool
        self.alloc.trailers.clear();

        assign_wishes(&self.alloc.trailers_done[before..], wishes, pool)?;
        self.elapsed_ms += started.elapsed().as_millis() as u64;
        Ok(())
    }

    /// Leftover distribution: patch still-unassigned stacks into the
    /// already-built trailers' spare length. No new trailers are opened.
    fn patch_round(
        &mut self,
        wishes: &mut [Wish],
        pool: &mut InventoryPool,
    ) -> Result<()> {
        let started = Instant::now();
        let mut crates = Vec::new();
        for w in wishes.iter() {
            if !wish_on_lane(w, &self.plan) || w.finished || w.reserved.is_none() {
                continue;
            }
            crates.push(w.to_crate()?);
        }
        if crates.is_empty() {
            return Ok(());
        }
        let mut warehouse = Warehouse::new(build_stacks(crates));

        for trailer in &mut self.alloc.trailers_done {
            if warehouse.is_empty() {
                break;
            }
            let rects: Vec<Rect> = trailer.stacks.iter().map(|p| p.rect).collect();
            let mut packer =
                SkylinePacker::from_placements(trailer.width, trailer.length, trailer.overhang, &rects);
            let mut appended = 0usize;
            let mut i = 0usize;
            while i < warehouse.len() {
                let s = warehouse.get(i);
                if s.height > trailer.height {
                    i += 1;
                    continue;
                }
                match packer.place(s.width, s.length, s.overhang_allowed) {
                    Some(p) => {
                        let stack = warehouse.remove(i);
                        trailer.length_used = trailer.length_used.max(p.rect.top());
                        trailer.stacks.push(PlacedStack {
                            rect: p.rect,
                            rotated: p.rotated,
                            stack,
                        });
                        appended += 1;
                    }
                    None => i += 1,
                }
            }
            if appended > 0 {
                let start = trailer.stacks.len() - appended;
                assign_placed(&trailer.stacks[start..], wishes, pool)?;
                debug!(
                    category = %trailer.category,
                    appended,
                    "leftover stacks patched into built trailer"
                );
            }
        }
        self.elapsed_ms += started.elapsed().as_millis() as u64;
        Ok(())
    }

    fn into_result(self, wishes: &[Wish]) -> LaneResult {
        let unused_models = wishes
            .iter()
            .filter(|w| wish_on_lane(w, &self.plan) && w.quantity == 1 && !w.finished)
            .map(|w| w.id.clone())
            .collect();
        LaneResult {
            origin: self.plan.origin,
            destination: self.plan.destination,
            trailers: self
                .alloc
                .trailers_done
                .into_iter()
                .map(|t| LoadedTrailer {
                    category: t.category,
                    length: t.length,
                    length_used: t.length_used,
                    stacks: t.stacks,
                })
                .collect(),
            unused_models,
            elapsed_ms: self.elapsed_ms,
        }
    }
}

fn wish_on_lane(wish: &Wish, plan: &LanePlan) -> bool {
    wish.origin == plan.origin && wish.destination == plan.destination
}

/// Binds every unit placed on the given trailers to an unfinished wish.
fn assign_wishes(
    new_trailers: &[Trailer],
    wishes: &mut [Wish],
    pool: &mut InventoryPool,
) -> Result<()> {
    for trailer in new_trailers {
        assign_placed(&trailer.stacks, wishes, pool)?;
    }
    Ok(())
}

/// Consumes one unfinished wish per placed unit. The unit identifier is
/// tried first; a footprint-and-material match in rank order is the
/// fallback. A unit with no surviving candidate is a fatal logic error.
fn assign_placed(
    placed: &[PlacedStack],
    wishes: &mut [Wish],
    pool: &mut InventoryPool,
) -> Result<()> {
    for ps in placed {
        for unit in &ps.stack.models {
            let direct = wishes
                .iter()
                .position(|w| !w.finished && w.id == *unit);
            let chosen = direct.or_else(|| {
                footprint_candidates(wishes, &ps.stack.material, ps.stack.width, ps.stack.length)
            });
            let Some(wi) = chosen else {
                return Err(LoadBuilderError::UnmatchedPlacement {
                    model: unit.clone(),
                    length: ps.stack.length,
                    width: ps.stack.width,
                });
            };
            wishes[wi].finished = true;
            if let Some(item_idx) = wishes[wi].reserved.take() {
                pool.consume(item_idx)?;
            }
        }
    }
    Ok(())
}

fn footprint_candidates(
    wishes: &[Wish],
    material: &MaterialKind,
    width: f64,
    length: f64,
) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, w) in wishes.iter().enumerate() {
        if w.finished || w.quantity != 1 {
            continue;
        }
        if w.material != *material {
            continue;
        }
        if (w.width - width).abs() > EPS || w.length > length + EPS {
            continue;
        }
        match best {
            Some(b) if wishes[b].rank <= w.rank => {}
            _ => best = Some(i),
        }
    }
    best
}

fn validate_inputs(wishes: &[Wish], catalog: &TrailerCatalog) -> Result<()> {
    for spec in &catalog.specs {
        spec.validate()?;
    }
    for w in wishes {
        if w.quantity == 0 {
            // zero-quantity wishes are ignored
            continue;
        }
        w.validate()?;
    }
    Ok(())
}

/// Reserves one inventory unit for each candidate wish, in the given order.
fn reserve_wishes(
    order: &[usize],
    wishes: &mut [Wish],
    pool: &mut InventoryPool,
    nested: &NestedOrigins,
    horizon_by_lane: &BTreeMap<(String, String), u32>,
) {
    for &wi in order {
        let w = &wishes[wi];
        if w.finished || w.quantity != 1 || w.reserved.is_some() {
            continue;
        }
        let horizon = horizon_by_lane
            .get(&(w.origin.clone(), w.destination.clone()))
            .copied()
            .unwrap_or(0);
        let reserved = pool.reserve(&w.origin, &w.material_number, horizon, nested);
        wishes[wi].reserved = reserved;
    }
}

/// Releases every reservation still held by an unfinished wish.
fn release_unassigned(wishes: &mut [Wish], pool: &mut InventoryPool) -> Result<()> {
    for w in wishes.iter_mut() {
        if !w.finished {
            if let Some(idx) = w.reserved.take() {
                pool.release(idx)?;
            }
        }
    }
    Ok(())
}

/// Builds one lane in isolation: rank-ordered reservation, one packing
/// round capped at `load_max`, leftover reservations returned to the pool.
#[instrument(skip_all, fields(origin = %plan.origin, destination = %plan.destination))]
pub fn build_lane(
    plan: &LanePlan,
    wishes: &mut [Wish],
    pool: &mut InventoryPool,
    catalog: &TrailerCatalog,
    ctx: &mut PipelineContext,
    cfg: &PhaseConfig,
) -> Result<LaneResult> {
    validate_inputs(wishes, catalog)?;
    let mut run = LaneRun::new(plan.clone());

    let mut order: Vec<usize> = (0..wishes.len())
        .filter(|&i| wish_on_lane(&wishes[i], plan))
        .collect();
    order.sort_by_key(|&i| wishes[i].rank);
    let horizons = BTreeMap::from([(
        (plan.origin.clone(), plan.destination.clone()),
        plan.days_to,
    )]);
    reserve_wishes(&order, wishes, pool, &ctx.nested, &horizons);

    run.round(
        wishes,
        pool,
        catalog,
        ctx,
        cfg.perfect_match_floor,
        plan.load_max,
        cfg,
    )?;
    release_unassigned(wishes, pool)?;
    Ok(run.into_result(wishes))
}

/// Runs the four allocation phases across all lanes.
///
/// Phases: perfect-match reservations in rank order, satisfy-minimum,
/// satisfy-maximum (fed by sibling residuals), then leftover distribution
/// into already-built trailers. The pool, the shared trailer pool and the
/// residuals counter are mutated through `ctx`.
#[instrument(skip_all, fields(lanes = lanes.len(), wishes = wishes.len()))]
pub fn run_pipeline(
    lanes: Vec<LanePlan>,
    wishes: &mut [Wish],
    pool: &mut InventoryPool,
    catalog: &TrailerCatalog,
    ctx: &mut PipelineContext,
    cfg: &PhaseConfig,
) -> Result<PipelineResult> {
    validate_inputs(wishes, catalog)?;
    if lanes.is_empty() {
        return Err(LoadBuilderError::Empty);
    }

    let horizons: BTreeMap<(String, String), u32> = lanes
        .iter()
        .map(|p| ((p.origin.clone(), p.destination.clone()), p.days_to))
        .collect();

    // lanes processed in configured priority order, stable on input order
    let mut runs: Vec<LaneRun> = lanes.into_iter().map(LaneRun::new).collect();
    runs.sort_by(|a, b| b.plan.priority.cmp(&a.plan.priority));

    // phase 1: perfect match, wishes in rank order
    info!("phase 1: perfect match");
    let mut rank_order: Vec<usize> = (0..wishes.len()).collect();
    rank_order.sort_by_key(|&i| wishes[i].rank);
    reserve_wishes(&rank_order, wishes, pool, &ctx.nested, &horizons);
    for run in runs.iter_mut() {
        let cap = run.plan.load_max;
        run.round(
            wishes,
            pool,
            catalog,
            ctx,
            cfg.perfect_match_floor,
            cap,
            cfg,
        )?;
    }
    release_unassigned(wishes, pool)?;

    // residuals: unused quota of shared-origin lanes, keyed by destination
    for run in runs.iter() {
        if ctx.is_shared_origin(&run.plan.origin) {
            let slack = run.plan.load_max.saturating_sub(run.built());
            *ctx.residuals
                .entry(run.plan.destination.clone())
                .or_insert(0) += slack;
        }
    }

    // phase 2: satisfy minimums, aggressive per-lane reservation (input
    // order, no rank filter); shared-origin lanes leave their destination's
    // residuals budget to the siblings
    info!("phase 2: satisfy minimums");
    for run in runs.iter_mut() {
        let budgeted = if ctx.is_shared_origin(&run.plan.origin) {
            ctx.residuals
                .get(&run.plan.destination)
                .copied()
                .unwrap_or(0)
        } else {
            0
        };
        let cap = run.plan.load_min.saturating_sub(budgeted);
        if run.built() >= cap {
            continue;
        }
        let lane_order: Vec<usize> = (0..wishes.len())
            .filter(|&i| wish_on_lane(&wishes[i], &run.plan))
            .collect();
        reserve_wishes(&lane_order, wishes, pool, &ctx.nested, &horizons);
        run.round(wishes, pool, catalog, ctx, cfg.satisfy_min_floor, cap, cfg)?;
    }
    release_unassigned(wishes, pool)?;

    // phase 3: satisfy maximums, sibling residuals released
    info!("phase 3: satisfy maximums");
    for run in runs.iter_mut() {
        let extra = if ctx.is_shared_origin(&run.plan.origin) {
            ctx.residuals
                .get(&run.plan.destination)
                .copied()
                .unwrap_or(0)
        } else {
            0
        };
        let cap = run.plan.load_max + extra;
        if run.built() >= cap {
            continue;
        }
        let lane_order: Vec<usize> = (0..wishes.len())
            .filter(|&i| {
                wish_on_lane(&wishes[i], &run.plan) && (!cfg.credit_filter || wishes[i].credit_ok)
            })
            .collect();
        reserve_wishes(&lane_order, wishes, pool, &ctx.nested, &horizons);
        let before = run.built();
        run.round(wishes, pool, catalog, ctx, cfg.satisfy_max_floor, cap, cfg)?;
        let over_max = run.built().saturating_sub(run.plan.load_max.max(before));
        if over_max > 0 {
            if let Some(r) = ctx.residuals.get_mut(&run.plan.destination) {
                *r = r.saturating_sub(over_max);
            }
        }
    }
    release_unassigned(wishes, pool)?;

    // phase 4: leftover distribution into built trailers, floor dropped to 0
    info!("phase 4: leftover distribution");
    for run in runs.iter_mut() {
        let lane_order: Vec<usize> = (0..wishes.len())
            .filter(|&i| wish_on_lane(&wishes[i], &run.plan))
            .collect();
        reserve_wishes(&lane_order, wishes, pool, &ctx.nested, &horizons);
        run.patch_round(wishes, pool)?;
    }

    // residues: reservations that never placed stay booked
    let mut booked_unused: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
    for w in wishes.iter() {
        if !w.finished && w.reserved.is_some() {
            *booked_unused
                .entry(w.destination.clone())
                .or_default()
                .entry(w.material_number.clone())
                .or_insert(0) += 1;
        }
    }

    let mut unbooked: BTreeMap<String, u32> = BTreeMap::new();
    let mut unbooked_destinations: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let items: Vec<InventoryItem> = pool.items().to_vec();
    for item in items.iter().filter(|it| it.quantity > 0) {
        *unbooked.entry(item.material_number.clone()).or_insert(0) += item.quantity;
        let served: &mut BTreeSet<String> = unbooked_destinations
            .entry(item.material_number.clone())
            .or_default();
        for run in runs.iter() {
            if ctx.nested.sees(&run.plan.origin, &item.origin)
                && wishes.iter().any(|w| {
                    wish_on_lane(w, &run.plan) && w.material_number == item.material_number
                })
            {
                served.insert(run.plan.destination.clone());
            }
        }
    }

    let lanes_out: Vec<LaneResult> = runs
        .into_iter()
        .map(|run| run.into_result(wishes))
        .collect();
    Ok(PipelineResult {
        lanes: lanes_out,
        booked_unused,
        unbooked,
        unbooked_destinations,
    })
}
