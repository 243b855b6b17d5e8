use emporium_core::{demand::desired_qty, engine::GameEngine, rng::SubsystemRng};

/// Category tree + one product; bands are added per test.
fn engine_with_catalog() -> GameEngine {
    let engine = GameEngine::build_test(42).unwrap();
    let store = &engine.store;
    store.insert_category("electronics", None, 2, "Electronics").unwrap();
    store
        .insert_category("phones", Some("electronics"), 3, "Phones")
        .unwrap();
    store
        .insert_product_template("tpl-phone", "phones", 2, "Phone X", 100.0)
        .unwrap();
    engine
}

fn rng() -> SubsystemRng {
    SubsystemRng::new(42, 0, 0)
}

#[test]
fn band_midpoint_drives_the_quantity() {
    let engine = engine_with_catalog();
    engine
        .store
        .insert_sales_band("band-1", "phones", 2, 1, 10, 8.0, 12.0, None)
        .unwrap();
    let template = engine.store.get_product_template("tpl-phone").unwrap();

    // Midpoint 10, ±15% jitter: every draw lands in [8, 12].
    let mut rng = rng();
    for _ in 0..200 {
        let qty = desired_qty(&engine.store, &engine.config, &mut rng, &template, 1, 1.0).unwrap();
        assert!((8..=12).contains(&qty), "qty {qty} outside the jitter band");
    }
}

#[test]
fn expected_mode_overrides_the_midpoint() {
    let engine = engine_with_catalog();
    engine
        .store
        .insert_sales_band("band-1", "phones", 2, 1, 10, 8.0, 12.0, Some(20.0))
        .unwrap();
    let template = engine.store.get_product_template("tpl-phone").unwrap();

    let mut rng = rng();
    for _ in 0..200 {
        let qty = desired_qty(&engine.store, &engine.config, &mut rng, &template, 1, 1.0).unwrap();
        assert!((17..=23).contains(&qty), "qty {qty} outside the jitter band");
    }
}

#[test]
fn falls_back_to_the_l2_parent_band() {
    let engine = engine_with_catalog();
    // Band only at the L2 level; the L3 lookup must retry the parent.
    engine
        .store
        .insert_sales_band("band-l2", "electronics", 2, 1, 10, 30.0, 50.0, None)
        .unwrap();
    let template = engine.store.get_product_template("tpl-phone").unwrap();

    let mut rng = rng();
    let qty = desired_qty(&engine.store, &engine.config, &mut rng, &template, 1, 1.0).unwrap();
    assert!((34..=46).contains(&qty), "qty {qty} not from the L2 band");
}

#[test]
fn baseline_keeps_a_bandless_product_selling() {
    let engine = engine_with_catalog();
    let template = engine.store.get_product_template("tpl-phone").unwrap();

    // No band at any level: baseline 1.0 with ±15% jitter rounds to 1.
    let mut rng = rng();
    for _ in 0..50 {
        let qty = desired_qty(&engine.store, &engine.config, &mut rng, &template, 1, 1.0).unwrap();
        assert_eq!(qty, 1);
    }
}

#[test]
fn tier_outside_every_band_range_uses_the_baseline() {
    let engine = engine_with_catalog();
    engine
        .store
        .insert_sales_band("band-1", "phones", 2, 3, 5, 80.0, 120.0, None)
        .unwrap();
    let template = engine.store.get_product_template("tpl-phone").unwrap();

    let mut rng = rng();
    let qty = desired_qty(&engine.store, &engine.config, &mut rng, &template, 1, 1.0).unwrap();
    assert_eq!(qty, 1);
}

#[test]
fn zero_price_multiplier_suppresses_demand_entirely() {
    let engine = engine_with_catalog();
    engine
        .store
        .insert_sales_band("band-1", "phones", 2, 1, 10, 8.0, 12.0, None)
        .unwrap();
    let template = engine.store.get_product_template("tpl-phone").unwrap();

    let mut rng = rng();
    for _ in 0..50 {
        let qty = desired_qty(&engine.store, &engine.config, &mut rng, &template, 1, 0.0).unwrap();
        assert_eq!(qty, 0);
    }
}

#[test]
fn stress_multiplier_scales_the_whole_result() {
    let mut engine = engine_with_catalog();
    engine
        .store
        .insert_sales_band("band-1", "phones", 2, 1, 10, 8.0, 12.0, None)
        .unwrap();
    engine.config.demand.stress_multiplier = Some(10.0);
    let template = engine.store.get_product_template("tpl-phone").unwrap();

    let mut rng = rng();
    let qty = desired_qty(&engine.store, &engine.config, &mut rng, &template, 1, 1.0).unwrap();
    assert!((85..=115).contains(&qty), "qty {qty} not scaled by the stress hook");
}

#[test]
fn demand_is_never_negative() {
    let engine = engine_with_catalog();
    let template = engine.store.get_product_template("tpl-phone").unwrap();

    let mut rng = rng();
    for multiplier in [0.0, 0.6, 1.0, 1.3] {
        for _ in 0..50 {
            let qty =
                desired_qty(&engine.store, &engine.config, &mut rng, &template, 1, multiplier)
                    .unwrap();
            assert!(qty >= 0);
        }
    }
}
