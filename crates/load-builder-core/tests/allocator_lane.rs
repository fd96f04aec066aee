use load_builder_core::allocator::{BuildOptions, LaneAllocator};
use load_builder_core::model::{Crate, MaterialKind, Stack, Trailer, TrailerSpec};
use load_builder_core::warehouse::Warehouse;

fn trailer(category: &str, length: f64, width: f64, priority: i32) -> Trailer {
    Trailer::from_spec(&TrailerSpec {
        category: category.to_string(),
        length,
        width,
        height: 120.0,
        overhang: 0.0,
        priority,
    })
}

fn stack(id: &str, length: f64, width: f64, height: f64) -> Stack {
    let c = Crate::new(
        length,
        width,
        height,
        1,
        false,
        false,
        0,
        MaterialKind::Wood,
        vec![id.to_string()],
    )
    .unwrap();
    Stack::from_crates(&[c])
}

fn alloc_with(trailers: Vec<Trailer>, stacks: Vec<Stack>) -> LaneAllocator {
    let mut alloc = LaneAllocator::new("GR".to_string(), "MX".to_string(), trailers);
    alloc.warehouse = Warehouse::new(stacks);
    alloc
}

#[test]
fn higher_priority_trailer_is_loaded_first() {
    let mut alloc = alloc_with(
        vec![
            trailer("SLOW", 628.0, 98.0, 1),
            trailer("FAST", 628.0, 98.0, 5),
        ],
        vec![stack("a", 628.0, 98.0, 100.0)],
    );
    let report = alloc.build(&BuildOptions::default());
    assert_eq!(report.built, 1);
    assert_eq!(alloc.trailers_done.len(), 1);
    assert_eq!(alloc.trailers_done[0].category, "FAST");
    // the other trailer returns to the pool untouched
    assert_eq!(alloc.trailers.len(), 1);
    assert!(alloc.trailers[0].is_empty());
}

#[test]
fn floor_area_breaks_priority_ties() {
    let mut alloc = alloc_with(
        vec![
            trailer("SMALL", 628.0, 98.0, 2),
            trailer("BIG", 636.0, 102.0, 2),
        ],
        vec![stack("a", 628.0, 98.0, 100.0)],
    );
    let report = alloc.build(&BuildOptions::default());
    assert_eq!(report.built, 1);
    assert_eq!(alloc.trailers_done[0].category, "BIG");
}

#[test]
fn round_cap_limits_completed_trailers() {
    let mut alloc = alloc_with(
        vec![
            trailer("T1", 628.0, 98.0, 2),
            trailer("T2", 628.0, 98.0, 2),
        ],
        vec![
            stack("a", 628.0, 98.0, 100.0),
            stack("b", 628.0, 98.0, 100.0),
        ],
    );
    let opts = BuildOptions {
        max_trailers: 1,
        ..BuildOptions::default()
    };
    let report = alloc.build(&opts);
    assert_eq!(report.built, 1);
    // the second stack could not load and is reported back
    assert_eq!(report.unused_models, vec!["b"]);
    assert!(alloc.warehouse.is_empty());
}

#[test]
fn trailer_admitting_nothing_is_skipped() {
    let mut alloc = alloc_with(
        vec![trailer("NARROW", 628.0, 40.0, 2)],
        vec![stack("wide", 628.0, 98.0, 100.0)],
    );
    let report = alloc.build(&BuildOptions::default());
    assert_eq!(report.built, 0);
    assert_eq!(alloc.trailers.len(), 1);
    assert_eq!(report.unused_models, vec!["wide"]);
}

#[test]
fn stacks_spread_over_successive_trailers() {
    let mut alloc = alloc_with(
        vec![
            trailer("T1", 628.0, 98.0, 2),
            trailer("T2", 628.0, 98.0, 2),
            trailer("T3", 628.0, 98.0, 2),
        ],
        vec![
            stack("a", 628.0, 98.0, 100.0),
            stack("b", 628.0, 98.0, 100.0),
        ],
    );
    let report = alloc.build(&BuildOptions::default());
    assert_eq!(report.built, 2);
    assert!(report.unused_models.is_empty());
    assert_eq!(alloc.trailers_done.len(), 2);
    assert_eq!(alloc.trailers.len(), 1);
    for t in &alloc.trailers_done {
        assert_eq!(t.stacks.len(), 1);
    }
}

#[test]
fn coverage_floor_is_taken_from_the_options() {
    let stacks = vec![stack("short", 100.0, 98.0, 50.0)];
    let mut alloc = alloc_with(vec![trailer("T", 628.0, 98.0, 2)], stacks.clone());
    let report = alloc.build(&BuildOptions::default());
    assert_eq!(report.built, 0);

    let mut alloc = alloc_with(vec![trailer("T", 628.0, 98.0, 2)], stacks);
    let opts = BuildOptions {
        plc_lb: 0.1,
        ..BuildOptions::default()
    };
    let report = alloc.build(&opts);
    assert_eq!(report.built, 1);
}
