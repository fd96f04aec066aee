use crate::model::{Stack, Trailer};

/// Ordered sequence of stacks awaiting placement.
///
/// Order is load-bearing: the per-trailer driver feeds the packer in
/// warehouse order, and `merge_for_trailer` commits a prefix of rotation
/// decisions. Stacks that fit a trailer in neither orientation are pushed
/// to the end and reported as leftovers.
#[derive(Debug, Clone, Default)]
pub struct Warehouse {
    stacks: Vec<Stack>,
}

/// Outcome of the pair-and-pre-rotate walk: rotation flags for the committed
/// prefix plus how many stacks were pushed to the end as leftovers.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub rotations: Vec<bool>,
    pub leftovers: usize,
}

impl Warehouse {
    pub fn new(stacks: Vec<Stack>) -> Self {
        Self { stacks }
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn get(&self, i: usize) -> &Stack {
        &self.stacks[i]
    }

    pub fn push(&mut self, stack: Stack) {
        self.stacks.push(stack);
    }

    pub fn remove(&mut self, i: usize) -> Stack {
        self.stacks.remove(i)
    }

    /// Drains every remaining stack into a flat list of unit identifiers.
    pub fn drain_models(&mut self) -> Vec<String> {
        self.stacks
            .drain(..)
            .flat_map(|s| s.models.into_iter())
            .collect()
    }

    pub fn sort_by_volume_desc(&mut self) {
        // stable: equal volumes keep their order
        self.stacks
            .sort_by(|a, b| b.volume().total_cmp(&a.volume()));
    }

    /// Walks the warehouse in volume-descending order and pre-decides
    /// rotations for a prefix.
    ///
    /// For each stack that fits the trailer, a partner whose width fits
    /// alongside is searched further down; a found pair is committed
    /// un-rotated side-by-side (the partner is pulled adjacent). A stack
    /// without a partner is committed with the rotation that wastes the
    /// least side space. Stacks fitting in neither orientation move to the
    /// end. The walk stops once the committed footprints already span the
    /// usable length; the remaining rotation choices are left to the
    /// configuration enumeration.
    pub fn merge_for_trailer(&mut self, trailer: &Trailer) -> MergeOutcome {
        self.sort_by_volume_desc();

        let usable_length = trailer.length + trailer.overhang;
        let mut rotations: Vec<bool> = Vec::new();
        let mut leftovers = 0usize;
        let mut committed_length = 0.0f64;
        let mut i = 0usize;

        while i < self.stacks.len() - leftovers {
            if committed_length >= usable_length {
                break;
            }
            let s = &self.stacks[i];
            let fits_straight = trailer.admits(s);
            let fits_rotated = trailer.admits_rotated(s);
            if !fits_straight && !fits_rotated {
                let moved = self.stacks.remove(i);
                self.stacks.push(moved);
                leftovers += 1;
                continue;
            }
            if fits_straight {
                let partner = self.find_partner(i, leftovers, trailer);
                if let Some(j) = partner {
                    let p = self.stacks.remove(j);
                    self.stacks.insert(i + 1, p);
                    let row = self.stacks[i].length.max(self.stacks[i + 1].length);
                    rotations.push(false);
                    rotations.push(false);
                    committed_length += row;
                    i += 2;
                    continue;
                }
            }
            // no partner: pick the orientation wasting the least side space
            let s = &self.stacks[i];
            let waste_straight = if fits_straight {
                trailer.width - s.width
            } else {
                f64::INFINITY
            };
            let waste_rotated = if fits_rotated {
                trailer.width - s.length
            } else {
                f64::INFINITY
            };
            let rotate = waste_rotated < waste_straight;
            rotations.push(rotate);
            committed_length += if rotate { s.width } else { s.length };
            i += 1;
        }

        MergeOutcome {
            rotations,
            leftovers,
        }
    }

    fn find_partner(&self, i: usize, leftovers: usize, trailer: &Trailer) -> Option<usize> {
        let s = &self.stacks[i];
        let end = self.stacks.len() - leftovers;
        (i + 1..end).find(|&j| {
            let p = &self.stacks[j];
            trailer.admits(p) && s.width + p.width <= trailer.width
        })
    }

    /// Upper bound on how many stacks could possibly be loaded, refined
    /// recursively: over the footprints of a bounded prefix, take the
    /// minimum per-piece length assuming side-by-side packing in width,
    /// and divide the usable length by it until the bound is stable.
    pub fn upper_bound(&self, trailer: &Trailer) -> usize {
        let usable_length = trailer.length + trailer.overhang;
        let mut bound = self.stacks.len();
        loop {
            let mut min_contrib = f64::INFINITY;
            for s in &self.stacks[..bound] {
                if s.width <= trailer.width {
                    let per_row = (trailer.width / s.width).floor().max(1.0);
                    min_contrib = min_contrib.min(s.length / per_row);
                }
                if s.length <= trailer.width {
                    let per_row = (trailer.width / s.length).floor().max(1.0);
                    min_contrib = min_contrib.min(s.width / per_row);
                }
            }
            if !min_contrib.is_finite() || min_contrib <= 0.0 {
                return 0;
            }
            let refined = ((usable_length / min_contrib).floor() as usize).min(self.stacks.len());
            if refined >= bound {
                return bound;
            }
            if refined == 0 {
                return 0;
            }
            bound = refined;
        }
    }
}
