use crate::model::{Crate, MaterialKind, Stack};

fn sort_for_stacking(crates: &mut [Crate]) {
    // stable: equal footprints keep their input order
    crates.sort_by(|a, b| {
        b.width
            .total_cmp(&a.width)
            .then(b.length.total_cmp(&a.length))
    });
}

fn compatible(reference: &Crate, other: &Crate) -> bool {
    if other.material != reference.material {
        return false;
    }
    if (other.width - reference.width).abs() > 1e-9 {
        return false;
    }
    match reference.material {
        MaterialKind::Metal => (other.length - reference.length).abs() <= 1e-9,
        MaterialKind::Wood => true,
    }
}

/// Groups loose crates into stacks.
///
/// First pass emits only complete stacks (exactly `stack_limit` crates with
/// matching footprints, consumed in sort order); crates that cannot head a
/// complete stack go to stand-by. The second pass combines the stand-by
/// residue into shorter-than-maximum stacks, so every input crate ends up in
/// exactly one emitted stack.
pub fn build_stacks(mut crates: Vec<Crate>) -> Vec<Stack> {
    let mut stacks = Vec::new();
    let mut stand_by: Vec<Crate> = Vec::new();

    // first pass: complete stacks only
    sort_for_stacking(&mut crates);
    while !crates.is_empty() {
        let limit = crates[0].stack_limit as usize;
        if crates.len() < limit {
            stand_by.push(crates.remove(0));
            continue;
        }
        let head = &crates[0];
        let all_match = crates[1..limit].iter().all(|c| compatible(head, c));
        if all_match {
            let group: Vec<Crate> = crates.drain(..limit).collect();
            stacks.push(Stack::from_crates(&group));
        } else {
            stand_by.push(crates.remove(0));
        }
    }

    // second pass: partial sets are acceptable here
    sort_for_stacking(&mut stand_by);
    while !stand_by.is_empty() {
        let limit = stand_by[0].stack_limit as usize;
        let mut take = 1;
        while take < limit && take < stand_by.len() && compatible(&stand_by[0], &stand_by[take]) {
            take += 1;
        }
        let group: Vec<Crate> = stand_by.drain(..take).collect();
        stacks.push(Stack::from_crates(&group));
    }

    stacks
}
