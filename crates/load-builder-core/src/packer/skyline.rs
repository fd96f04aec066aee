use super::Placement;
use crate::config::SBOT;
use crate::geom::{EPS, Rect};

#[derive(Clone, Copy, Debug)]
struct SkylineNode {
    x: f64,
    w: f64,
    /// Current top of this column strip along the trailer length.
    y: f64,
}

impl SkylineNode {
    #[inline]
    fn left(&self) -> f64 {
        self.x
    }
    #[inline]
    fn right(&self) -> f64 {
        self.x + self.w
    }
}

/// Skyline packer over the trailer floor.
///
/// The bin is `width` across by `length` along; `overhang` extends the usable
/// length past the rear for overhang-eligible rectangles, subject to the
/// `SBOT` in-bed rule. The packer places whole rectangles or reports no-fit;
/// it never places partially.
pub struct SkylinePacker {
    width: f64,
    length: f64,
    overhang: f64,
    skylines: Vec<SkylineNode>,
}

struct Candidate {
    rect: Rect,
    waste: f64,
}

impl SkylinePacker {
    pub fn new(width: f64, length: f64, overhang: f64) -> Self {
        Self {
            width,
            length,
            overhang,
            skylines: vec![SkylineNode {
                x: 0.0,
                w: width,
                y: 0.0,
            }],
        }
    }

    /// Rebuilds a packer over an already-loaded bin by replaying its
    /// placements in order. Used to resume a built trailer's skyline for
    /// the leftover-distribution pass.
    pub fn from_placements(width: f64, length: f64, overhang: f64, placed: &[Rect]) -> Self {
        let mut packer = Self::new(width, length, overhang);
        for r in placed {
            packer.occupy(r);
        }
        packer
    }

    /// Marks `rect` as occupied without any admissibility check.
    pub fn occupy(&mut self, rect: &Rect) {
        self.raise(rect.x, rect.right(), rect.top());
    }

    /// Max forward extent of the skyline; 0.0 for an empty bin.
    pub fn used_length(&self) -> f64 {
        self.skylines.iter().map(|s| s.y).fold(0.0, f64::max)
    }

    fn length_admissible(&self, y: f64, h: f64, overhang_ok: bool) -> bool {
        if y + h <= self.length + EPS {
            return true;
        }
        overhang_ok
            && y + SBOT * h <= self.length + EPS
            && y + h <= self.length + self.overhang + EPS
    }

    /// Candidate placement starting at segment `i`: x is the segment's left
    /// edge, y the max top among all segments covered by the rectangle.
    fn candidate(&self, i: usize, w: f64, h: f64, overhang_ok: bool) -> Option<Candidate> {
        let x = self.skylines[i].left();
        if x + w > self.width + EPS {
            return None;
        }
        let mut y: f64 = 0.0;
        let mut waste = 0.0;
        let right = x + w;
        for seg in &self.skylines[i..] {
            if seg.left() >= right - EPS {
                break;
            }
            y = y.max(seg.y);
        }
        if !self.length_admissible(y, h, overhang_ok) {
            return None;
        }
        for seg in &self.skylines[i..] {
            if seg.left() >= right - EPS {
                break;
            }
            let overlap = seg.right().min(right) - seg.left();
            waste += (y - seg.y) * overlap;
        }
        Some(Candidate {
            rect: Rect::new(x, y, w, h),
            waste,
        })
    }

    /// Best admissible position for a `w` across by `h` along rectangle,
    /// scored by wasted area, then lower y, then lower x.
    fn find(&self, w: f64, h: f64, overhang_ok: bool) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for i in 0..self.skylines.len() {
            if let Some(c) = self.candidate(i, w, h, overhang_ok) {
                let better = match &best {
                    None => true,
                    Some(b) => {
                        c.waste < b.waste - EPS
                            || ((c.waste - b.waste).abs() <= EPS
                                && (c.rect.y < b.rect.y - EPS
                                    || ((c.rect.y - b.rect.y).abs() <= EPS
                                        && c.rect.x < b.rect.x - EPS)))
                    }
                };
                if better {
                    best = Some(c);
                }
            }
        }
        best
    }

    /// Places a rectangle with a preset orientation (`w` across the trailer
    /// width, `h` along the length). Returns `None` when no admissible
    /// position exists.
    pub fn place_oriented(&mut self, w: f64, h: f64, overhang_ok: bool) -> Option<Rect> {
        let c = self.find(w, h, overhang_ok)?;
        self.raise(c.rect.x, c.rect.right(), c.rect.top());
        Some(c.rect)
    }

    /// Places a footprint trying both orientations and keeping the better
    /// scoring one. `w` x `l` is the stack base (width across, length along
    /// when un-rotated).
    pub fn place(&mut self, w: f64, l: f64, overhang_ok: bool) -> Option<Placement> {
        let straight = self.find(w, l, overhang_ok);
        let turned = self.find(l, w, overhang_ok);
        let (c, rotated) = match (straight, turned) {
            (None, None) => return None,
            (Some(c), None) => (c, false),
            (None, Some(c)) => (c, true),
            (Some(a), Some(b)) => {
                let keep_a = a.waste < b.waste - EPS
                    || ((a.waste - b.waste).abs() <= EPS
                        && (a.rect.y < b.rect.y + EPS));
                if keep_a { (a, false) } else { (b, true) }
            }
        };
        self.raise(c.rect.x, c.rect.right(), c.rect.top());
        Some(Placement {
            rect: c.rect,
            rotated,
        })
    }

    /// Raises the skyline over `[x0, x1)` to `y`, trimming partial overlaps
    /// and merging equal-height neighbors.
    fn raise(&mut self, x0: f64, x1: f64, y: f64) {
        let mut out: Vec<SkylineNode> = Vec::with_capacity(self.skylines.len() + 2);
        for seg in &self.skylines {
            if seg.right() <= x0 + EPS || seg.left() >= x1 - EPS {
                out.push(*seg);
                continue;
            }
            if seg.left() < x0 - EPS {
                out.push(SkylineNode {
                    x: seg.x,
                    w: x0 - seg.x,
                    y: seg.y,
                });
            }
            if seg.right() > x1 + EPS {
                out.push(SkylineNode {
                    x: x1,
                    w: seg.right() - x1,
                    y: seg.y,
                });
            }
        }
        out.push(SkylineNode {
            x: x0,
            w: x1 - x0,
            y,
        });
        out.sort_by(|a, b| a.x.total_cmp(&b.x));
        // merge equal-height neighbors
        let mut merged: Vec<SkylineNode> = Vec::with_capacity(out.len());
        for seg in out {
            match merged.last_mut() {
                Some(last) if (last.y - seg.y).abs() <= EPS => {
                    last.w += seg.w;
                }
                _ => merged.push(seg),
            }
        }
        self.skylines = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skyline_starts_flat_and_raises() {
        let mut p = SkylinePacker::new(98.0, 628.0, 0.0);
        let r = p.place_oriented(48.0, 100.0, false).unwrap();
        assert_eq!(r.x, 0.0);
        assert_eq!(r.y, 0.0);
        assert!((p.used_length() - 100.0).abs() < 1e-9);
        // second one lands beside, not on top
        let r2 = p.place_oriented(48.0, 100.0, false).unwrap();
        assert_eq!(r2.y, 0.0);
        assert!((r2.x - 48.0).abs() < 1e-9);
    }

    #[test]
    fn never_places_past_the_width() {
        let mut p = SkylinePacker::new(98.0, 628.0, 0.0);
        assert!(p.place_oriented(99.0, 10.0, false).is_none());
    }
}
