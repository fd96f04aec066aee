use load_builder_core::config::{PackConfig, PhaseConfig};
use load_builder_core::error::LoadBuilderError;
use load_builder_core::model::{
    Crate, InventoryItem, InventoryStatus, LanePlan, MaterialKind, TrailerSpec, Wish,
};
use load_builder_core::pipeline::{run_pipeline, PipelineContext, SharedPoolDef, TrailerCatalog};
use load_builder_core::pool::{InventoryPool, NestedOrigins};

fn base_wish(id: &str) -> Wish {
    Wish {
        id: id.to_string(),
        origin: "GR".to_string(),
        destination: "MX".to_string(),
        material_number: "M1".to_string(),
        model: "628x48".to_string(),
        length: 628.0,
        width: 48.0,
        height: 100.0,
        stack_limit: 1,
        rank: 1,
        mandatory: false,
        overhang_allowed: false,
        material: MaterialKind::Wood,
        quantity: 1,
        credit_ok: true,
        reserved: None,
        finished: false,
    }
}

fn flatbed_catalog() -> TrailerCatalog {
    TrailerCatalog {
        specs: vec![TrailerSpec {
            category: "FLATBED".to_string(),
            length: 628.0,
            width: 98.0,
            height: 120.0,
            overhang: 0.0,
            priority: 2,
        }],
    }
}

fn one_lane() -> Vec<LanePlan> {
    vec![LanePlan {
        origin: "GR".to_string(),
        destination: "MX".to_string(),
        load_min: 0,
        load_max: 1,
        flatbed_qty: 1,
        drybox_qty: 0,
        flatbed_53_qty: 0,
        priority: 1,
        transit_days: 2,
        days_to: 0,
    }]
}

#[test]
fn pack_config_rejects_bad_geometry() {
    let mut cfg = PackConfig::default();
    cfg.bin_width = 0.0;
    assert!(matches!(
        cfg.validate(),
        Err(LoadBuilderError::InvalidDimensions { .. })
    ));

    let mut cfg = PackConfig::default();
    cfg.overhang = -1.0;
    assert!(matches!(cfg.validate(), Err(LoadBuilderError::InvalidInput(_))));

    let mut cfg = PackConfig::default();
    cfg.plc_lb = 1.5;
    assert!(matches!(cfg.validate(), Err(LoadBuilderError::InvalidInput(_))));

    assert!(PackConfig::default().validate().is_ok());
}

#[test]
fn crate_constructor_guards_its_inputs() {
    let bad = Crate::new(
        0.0,
        48.0,
        100.0,
        1,
        false,
        false,
        0,
        MaterialKind::Wood,
        vec!["u".to_string()],
    );
    assert!(matches!(bad, Err(LoadBuilderError::InvalidDimensions { .. })));

    let bad = Crate::new(
        100.0,
        48.0,
        100.0,
        0,
        false,
        false,
        0,
        MaterialKind::Wood,
        vec!["u".to_string()],
    );
    assert!(matches!(bad, Err(LoadBuilderError::InvalidInput(_))));

    // the footprint is canonicalized so the long side is the length
    let c = Crate::new(
        40.0,
        90.0,
        100.0,
        1,
        false,
        false,
        0,
        MaterialKind::Wood,
        vec!["u".to_string()],
    )
    .unwrap();
    assert_eq!(c.length, 90.0);
    assert_eq!(c.width, 40.0);
}

#[test]
fn pipeline_rejects_an_empty_lane_list() {
    let mut wishes = vec![base_wish("w1")];
    let mut pool = InventoryPool::new(vec![]);
    let mut ctx = PipelineContext::new(NestedOrigins::default(), SharedPoolDef::default());
    let err = run_pipeline(
        Vec::new(),
        &mut wishes,
        &mut pool,
        &flatbed_catalog(),
        &mut ctx,
        &PhaseConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LoadBuilderError::Empty));
}

#[test]
fn legacy_multi_quantity_wishes_are_rejected() {
    let mut w = base_wish("w1");
    w.quantity = 2;
    let mut wishes = vec![w];
    let mut pool = InventoryPool::new(vec![]);
    let mut ctx = PipelineContext::new(NestedOrigins::default(), SharedPoolDef::default());
    let err = run_pipeline(
        one_lane(),
        &mut wishes,
        &mut pool,
        &flatbed_catalog(),
        &mut ctx,
        &PhaseConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LoadBuilderError::InvalidInput(_)));
}

#[test]
fn zero_quantity_wishes_are_ignored_not_rejected() {
    let mut dead = base_wish("dead");
    dead.quantity = 0;
    dead.length = -5.0; // invalid, but the wish is inert
    let mut wishes = vec![dead, base_wish("live")];
    let mut pool = InventoryPool::new(vec![InventoryItem {
        origin: "GR".to_string(),
        material_number: "M1".to_string(),
        quantity: 1,
        available_in_days: 0,
        status: InventoryStatus::Inventory,
    }]);
    let mut ctx = PipelineContext::new(NestedOrigins::default(), SharedPoolDef::default());
    let result = run_pipeline(
        one_lane(),
        &mut wishes,
        &mut pool,
        &flatbed_catalog(),
        &mut ctx,
        &PhaseConfig::default(),
    )
    .unwrap();
    let units: Vec<String> = result.lanes[0]
        .trailers
        .iter()
        .flat_map(|t| t.stacks.iter())
        .flat_map(|p| p.stack.models.iter().cloned())
        .collect();
    assert_eq!(units, vec!["live".to_string()]);
    assert!(!result.lanes[0].unused_models.contains(&"dead".to_string()));
}

#[test]
fn bad_catalog_geometry_is_a_fatal_input_error() {
    let catalog = TrailerCatalog {
        specs: vec![TrailerSpec {
            category: "FLATBED".to_string(),
            length: -628.0,
            width: 98.0,
            height: 120.0,
            overhang: 0.0,
            priority: 2,
        }],
    };
    let mut wishes = vec![base_wish("w1")];
    let mut pool = InventoryPool::new(vec![]);
    let mut ctx = PipelineContext::new(NestedOrigins::default(), SharedPoolDef::default());
    let err = run_pipeline(
        one_lane(),
        &mut wishes,
        &mut pool,
        &catalog,
        &mut ctx,
        &PhaseConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LoadBuilderError::InvalidDimensions { .. }));
}

#[test]
fn reserve_release_round_trips_the_pool() {
    let mut pool = InventoryPool::new(vec![InventoryItem {
        origin: "GR".to_string(),
        material_number: "M1".to_string(),
        quantity: 2,
        available_in_days: 0,
        status: InventoryStatus::Inventory,
    }]);
    let nested = NestedOrigins::default();
    let idx = pool.reserve("GR", "M1", 0, &nested).unwrap();
    assert_eq!(pool.items()[idx].quantity, 1);
    assert_eq!(pool.reserved_quantity(idx), 1);
    assert!(pool.was_ever_reserved(idx));
    pool.release(idx).unwrap();
    assert_eq!(pool.items()[idx].quantity, 2);
    assert_eq!(pool.reserved_quantity(idx), 0);
    // the history flag survives the release
    assert!(pool.was_ever_reserved(idx));
}

#[test]
fn releasing_an_unreserved_slot_underflows() {
    let mut pool = InventoryPool::new(vec![InventoryItem {
        origin: "GR".to_string(),
        material_number: "M1".to_string(),
        quantity: 1,
        available_in_days: 0,
        status: InventoryStatus::Inventory,
    }]);
    assert!(matches!(
        pool.release(0),
        Err(LoadBuilderError::PoolUnderflow { index: 0 })
    ));
    assert!(matches!(
        pool.consume(0),
        Err(LoadBuilderError::PoolUnderflow { index: 0 })
    ));
}

#[test]
fn identical_inventory_records_merge_on_intake() {
    let rec = |qty: u32, days: u32| InventoryItem {
        origin: "GR".to_string(),
        material_number: "M1".to_string(),
        quantity: qty,
        available_in_days: days,
        status: InventoryStatus::Inventory,
    };
    let pool = InventoryPool::new(vec![rec(2, 0), rec(3, 0), rec(1, 5)]);
    // on-hand records merged, the future one kept apart
    assert_eq!(pool.items().len(), 2);
    assert_eq!(pool.items()[0].quantity, 5);
    assert_eq!(pool.initial_quantity(0), 5);
    assert_eq!(pool.items()[1].quantity, 1);
}

#[test]
fn reservation_ignores_foreign_origins_without_nesting() {
    let mut pool = InventoryPool::new(vec![InventoryItem {
        origin: "P1".to_string(),
        material_number: "M1".to_string(),
        quantity: 1,
        available_in_days: 0,
        status: InventoryStatus::Inventory,
    }]);
    let nested = NestedOrigins::default();
    assert!(pool.reserve("P2", "M1", 0, &nested).is_none());
    let nested = NestedOrigins::new(vec![("P2".to_string(), "P1".to_string())]);
    assert!(pool.reserve("P2", "M1", 0, &nested).is_some());
    // nesting is directional
    assert!(pool.reserve("P1", "M2", 0, &nested).is_none());
}
