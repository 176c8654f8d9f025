//! Behavioural tests for the cached record listing using rstest-bdd.

use std::{cell::RefCell, sync::Arc, time::Duration};

use crate::{
    BirthRecord, BirthStore, Clock, Gender, QueryService, ReadCache,
    test_support::{ManualClock, MemoryStore, record},
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const TTL: Duration = Duration::from_secs(3600);

struct CacheWorld {
    clock: Arc<ManualClock>,
    service: RefCell<Option<QueryService<MemoryStore>>>,
    listings: RefCell<Vec<Arc<[BirthRecord]>>>,
}

impl CacheWorld {
    fn new() -> Self {
        Self {
            clock: Arc::new(ManualClock::default()),
            service: RefCell::new(None),
            listings: RefCell::new(Vec::new()),
        }
    }

    fn with_service<T>(&self, f: impl FnOnce(&QueryService<MemoryStore>) -> T) -> T {
        let borrowed = self.service.borrow();
        let service = borrowed
            .as_ref()
            .expect("service should be initialised by a given step");
        f(service)
    }

    fn list(&self) {
        let records = self.with_service(|service| service.all_records().expect("list records"));
        self.listings.borrow_mut().push(records);
    }
}

#[fixture]
fn world() -> CacheWorld {
    CacheWorld::new()
}

#[given("a store holding {count} birth records")]
fn given_store(world: &CacheWorld, count: u16) {
    let store = MemoryStore::default();
    let records: Vec<_> = (0..count)
        .map(|index| record(&format!("{index:04}"), Gender::Female, 2020, u64::from(index)))
        .collect();
    store.upsert_records(&records).expect("seed store");
    let cache = ReadCache::with_clock(TTL, Arc::clone(&world.clock) as Arc<dyn Clock>);
    world.service.replace(Some(QueryService::new(store, cache)));
}

#[when("I list all records twice")]
fn when_list_twice(world: &CacheWorld) {
    world.list();
    world.list();
}

#[when("I list all records")]
fn when_list(world: &CacheWorld) {
    world.list();
}

#[when("the cache is invalidated")]
fn when_invalidated(world: &CacheWorld) {
    world.with_service(QueryService::invalidate_cache);
}

#[when("the cache lifetime elapses")]
fn when_ttl_elapses(world: &CacheWorld) {
    world.clock.advance(TTL);
}

#[when("a new record is applied")]
fn when_record_applied(world: &CacheWorld) {
    world.with_service(|service| {
        service
            .apply_records(&[record("9999", Gender::Male, 2020, 7)])
            .expect("apply record");
    });
}

#[then("both listings share the same records")]
fn then_shared(world: &CacheWorld) {
    let listings = world.listings.borrow();
    let [first, second] = listings.as_slice() else {
        panic!("expected exactly two listings, found {}", listings.len());
    };
    assert!(Arc::ptr_eq(first, second), "cache hit must reuse the list");
}

#[then("the store listing count is {count}")]
fn then_listing_count(world: &CacheWorld, count: usize) {
    assert_eq!(world.with_service(|service| service.store().list_calls()), count);
}

#[then("the listing contains {count} records")]
fn then_listing_len(world: &CacheWorld, count: usize) {
    let listings = world.listings.borrow();
    let last = listings.last().expect("at least one listing");
    assert_eq!(last.len(), count);
}

#[scenario(path = "tests/features/cache_coherence.feature", index = 0)]
fn repeated_listings_hit_cache(world: CacheWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/cache_coherence.feature", index = 1)]
fn invalidation_reloads(world: CacheWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/cache_coherence.feature", index = 2)]
fn expiry_reloads(world: CacheWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/cache_coherence.feature", index = 3)]
fn applied_records_visible(world: CacheWorld) {
    let _ = world;
}
