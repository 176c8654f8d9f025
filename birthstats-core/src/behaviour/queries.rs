//! Behavioural tests for the aggregate queries using rstest-bdd.

use std::cell::RefCell;

use crate::{
    BirthStore, Gender, InvalidRequest, QueryError, QueryService, ReadCache, RegionTotal,
    RegionYearTotal, Year,
    test_support::{MemoryStore, record},
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Default)]
struct QueryWorld {
    service: RefCell<Option<QueryService<MemoryStore>>>,
    aggregates: RefCell<Vec<RegionYearTotal>>,
    top: RefCell<Vec<RegionTotal>>,
    error: RefCell<Option<QueryError>>,
}

impl QueryWorld {
    fn seed(&self, records: &[crate::BirthRecord]) {
        let store = MemoryStore::default();
        store.upsert_records(records).expect("seed store");
        self.service
            .replace(Some(QueryService::new(store, ReadCache::default())));
    }

    fn with_service<T>(&self, f: impl FnOnce(&QueryService<MemoryStore>) -> T) -> T {
        let borrowed = self.service.borrow();
        let service = borrowed
            .as_ref()
            .expect("service should be initialised by a given step");
        f(service)
    }
}

#[fixture]
fn world() -> QueryWorld {
    QueryWorld::default()
}

#[given("region A recorded 10 boys and 5 girls in 2016")]
fn given_region_a(world: &QueryWorld) {
    world.seed(&[
        record("A", Gender::Male, 2016, 10),
        record("A", Gender::Female, 2016, 5),
    ]);
}

#[given("three regions with 30, 10 and 20 births in 2020")]
fn given_three_regions(world: &QueryWorld) {
    world.seed(&[
        record("A", Gender::Male, 2020, 30),
        record("B", Gender::Male, 2020, 10),
        record("C", Gender::Male, 2020, 20),
    ]);
}

#[when("I aggregate by region and year")]
fn when_aggregate(world: &QueryWorld) {
    let totals = world.with_service(|service| service.region_year_totals().expect("aggregate"));
    world.aggregates.replace(totals);
}

#[when("I request the top 2 regions for 2020")]
fn when_top_two(world: &QueryWorld) {
    let top = world.with_service(|service| {
        service
            .top_regions(Some(Year::new(2020)), Some(2))
            .expect("top list")
    });
    world.top.replace(top);
}

#[when("I compare an empty set of regions")]
fn when_compare_empty(world: &QueryWorld) {
    let result = world.with_service(|service| service.compare_regions(&[]));
    world.error.replace(result.err());
}

#[when("I request the top list without a year")]
fn when_top_without_year(world: &QueryWorld) {
    let result = world.with_service(|service| service.top_regions(None, None));
    world.error.replace(result.err());
}

#[then("region A has 15 births in 2016")]
fn then_region_a_total(world: &QueryWorld) {
    let aggregates = world.aggregates.borrow();
    let [total] = aggregates.as_slice() else {
        panic!("expected one aggregate row, found {}", aggregates.len());
    };
    assert_eq!(total.region_code.as_str(), "A");
    assert_eq!(total.year, Year::new(2016));
    assert_eq!(total.total_births, 15);
}

#[then("the top list totals are 30 then 20")]
fn then_top_totals(world: &QueryWorld) {
    let totals: Vec<_> = world
        .top
        .borrow()
        .iter()
        .map(|row| row.total_births)
        .collect();
    assert_eq!(totals, [30, 20]);
}

#[then("the request is rejected as invalid")]
fn then_invalid(world: &QueryWorld) {
    let error = world.error.borrow();
    assert!(
        matches!(
            error.as_ref(),
            Some(QueryError::InvalidRequest(
                InvalidRequest::EmptyRegionSet | InvalidRequest::MissingYear
            ))
        ),
        "unexpected outcome: {error:?}"
    );
}

#[then("the store was not aggregated")]
fn then_store_untouched(world: &QueryWorld) {
    assert_eq!(
        world.with_service(|service| service.store().aggregate_calls()),
        0
    );
}

#[scenario(path = "tests/features/queries.feature", index = 0)]
fn region_totals(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/queries.feature", index = 1)]
fn top_list(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/queries.feature", index = 2)]
fn empty_comparison(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/queries.feature", index = 3)]
fn top_list_without_year(world: QueryWorld) {
    let _ = world;
}
