use crate::config::PackConfig;
use crate::geom::EPS;
use crate::model::{PlacedStack, Trailer};
use crate::packer::{Placement, SkylinePacker};
use crate::warehouse::Warehouse;
use std::collections::BTreeMap;
use tracing::{debug, warn};

struct Evaluated {
    placements: Vec<(usize, Placement)>,
    coverage: f64,
    units: usize,
    mandatory: usize,
    avg_ranking: f64,
}

/// Packs one trailer from the warehouse. On success the selected stacks are
/// transferred into `trailer` and `true` is returned; when no configuration
/// reaches the coverage floor the trailer stays empty and `false` is
/// returned (never an error).
pub fn load_trailer(trailer: &mut Trailer, warehouse: &mut Warehouse, cfg: &PackConfig) -> bool {
    if warehouse.is_empty() {
        return false;
    }

    // 1. pair-and-pre-rotate commits a prefix of rotation decisions
    let merge = warehouse.merge_for_trailer(trailer);
    let prefix = merge.rotations.len();

    // 2. cap the enumeration with the recursive upper bound
    let mut bound = warehouse
        .upper_bound(trailer)
        .max(prefix)
        .min(warehouse.len());

    // 3. branch rotation choices for the stacks past the prefix
    let mut configs: Vec<Vec<bool>> = vec![merge.rotations];
    let mut i = prefix;
    let mut stalled = 0usize;
    while i < bound {
        let s = warehouse.get(i);
        let fits_straight = trailer.admits(s);
        let fits_rotated = trailer.admits_rotated(s);
        if !fits_straight && !fits_rotated {
            // everything left in [i..] cycled through without fitting
            if stalled >= warehouse.len() - i {
                break;
            }
            stalled += 1;
            let moved = warehouse.remove(i);
            warehouse.push(moved);
            bound = (bound + 1).min(warehouse.len());
            continue;
        }
        stalled = 0;
        if fits_straight && fits_rotated {
            let mut branched = Vec::with_capacity(configs.len() * 2);
            for c in &configs {
                let mut straight = c.clone();
                straight.push(false);
                branched.push(straight);
            }
            for mut c in configs {
                c.push(true);
                branched.push(c);
            }
            if branched.len() > cfg.max_configurations {
                warn!(
                    configurations = branched.len(),
                    cap = cfg.max_configurations,
                    "configuration branching exceeded the guard, truncating"
                );
                branched.truncate(cfg.max_configurations);
            }
            configs = branched;
        } else {
            // only one orientation fits: append deterministically
            for c in &mut configs {
                c.push(fits_rotated && !fits_straight);
            }
        }
        i += 1;
    }

    // 4. pack every configuration, completion pass included, and keep the
    //    best qualified one (evaluation in generation order)
    let floor = if cfg.patching { 0.0 } else { cfg.plc_lb };
    let mut best: Option<Evaluated> = None;
    for config in &configs {
        let Some(ev) = evaluate(config, warehouse, cfg) else {
            continue;
        };
        if ev.coverage + EPS < floor {
            continue;
        }
        let better = match &best {
            None => true,
            Some(b) => {
                ev.units > b.units
                    || (ev.units == b.units
                        && (ev.mandatory > b.mandatory
                            || (ev.mandatory == b.mandatory
                                && ev.avg_ranking < b.avg_ranking - EPS)))
            }
        };
        if better {
            best = Some(ev);
        }
    }

    let Some(chosen) = best else {
        debug!(
            category = %trailer.category,
            configurations = configs.len(),
            "no configuration met the coverage floor"
        );
        return false;
    };

    // 5. commit: move placed stacks from the warehouse onto the trailer
    let mut indices: Vec<usize> = chosen.placements.iter().map(|(i, _)| *i).collect();
    indices.sort_unstable_by(|a, b| b.cmp(a));
    let mut taken: BTreeMap<usize, crate::model::Stack> = BTreeMap::new();
    for idx in indices {
        taken.insert(idx, warehouse.remove(idx));
    }
    let mut length_used = 0.0f64;
    for (idx, p) in &chosen.placements {
        length_used = length_used.max(p.rect.top());
        // placement indices are unique, every remove hits
        let Some(stack) = taken.remove(idx) else {
            continue;
        };
        trailer.stacks.push(PlacedStack {
            rect: p.rect,
            rotated: p.rotated,
            stack,
        });
    }
    trailer.length_used = trailer.length_used.max(length_used);
    debug!(
        category = %trailer.category,
        stacks = trailer.stacks.len(),
        coverage = chosen.coverage,
        "trailer packed"
    );
    true
}

/// Packs one rotation configuration into a fresh skyline, then runs the
/// completion pass with rotation unlocked over the stacks the configuration
/// excluded or failed to place.
fn evaluate(config: &[bool], warehouse: &Warehouse, cfg: &PackConfig) -> Option<Evaluated> {
    let mut packer = SkylinePacker::new(cfg.bin_width, cfg.bin_length, cfg.overhang);
    let mut placements: Vec<(usize, Placement)> = Vec::new();
    let mut skipped: Vec<usize> = Vec::new();

    for (idx, &rotated) in config.iter().enumerate() {
        let s = warehouse.get(idx);
        if s.height > cfg.bin_height + EPS {
            continue;
        }
        let (w, l) = if rotated {
            (s.length, s.width)
        } else {
            (s.width, s.length)
        };
        match packer.place_oriented(w, l, s.overhang_allowed) {
            Some(rect) => placements.push((idx, Placement { rect, rotated })),
            None => skipped.push(idx),
        }
    }

    if cfg.allow_rotation {
        for idx in skipped.into_iter().chain(config.len()..warehouse.len()) {
            let s = warehouse.get(idx);
            // leftovers moved past the enumeration were never height-checked
            if s.height > cfg.bin_height + EPS {
                continue;
            }
            if let Some(p) = packer.place(s.width, s.length, s.overhang_allowed) {
                placements.push((idx, p));
            }
        }
    }

    if placements.is_empty() {
        return None;
    }

    let coverage = placements
        .iter()
        .map(|(_, p)| p.rect.top())
        .fold(0.0, f64::max)
        / cfg.bin_length;
    let units: usize = placements
        .iter()
        .map(|(i, _)| warehouse.get(*i).nb_of_models())
        .sum();
    let mandatory: usize = placements
        .iter()
        .map(|(i, _)| warehouse.get(*i).nb_of_mandatory)
        .sum();
    let avg_ranking = placements
        .iter()
        .map(|(i, _)| warehouse.get(*i).average_ranking)
        .sum::<f64>()
        / placements.len() as f64;

    Some(Evaluated {
        placements,
        coverage,
        units,
        mandatory,
        avg_ranking,
    })
}
