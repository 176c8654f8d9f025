//! Behavioural coverage for normalising raw statistics entries.

use super::super::{NormalizedBatch, RecordNormalizer};
use crate::scb::{ScbResponse, test_support::raw_entry};
use birthstats_core::{Gender, RegionNames, Year};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;
use std::cell::RefCell;

#[fixture]
pub fn region_names() -> RefCell<RegionNames> {
    RefCell::new(RegionNames::default())
}

#[fixture]
pub fn response() -> RefCell<ScbResponse> {
    RefCell::new(ScbResponse::default())
}

#[fixture]
pub fn batch() -> RefCell<Option<NormalizedBatch>> {
    RefCell::new(None)
}

#[given("a region table mapping 0114 to Upplands Väsby")]
fn upplands_vasby(#[from(region_names)] cell: &RefCell<RegionNames>) {
    *cell.borrow_mut() = RegionNames::from_pairs([("0114", "Upplands Väsby")]);
}

#[given("a response with one entry for 0114 boys in 2020 valued 123")]
fn single_entry(#[from(response)] cell: &RefCell<ScbResponse>) {
    cell.borrow_mut().data = vec![raw_entry(["0114", "1", "2020"], json!("123"))];
}

#[given("a response mixing valid and suppressed values")]
fn mixed_entries(#[from(response)] cell: &RefCell<ScbResponse>) {
    cell.borrow_mut().data = vec![
        raw_entry(["0114", "2", "2020"], json!("..")),
        raw_entry(["0114", "1", "2020"], json!("123")),
        raw_entry(["0114", "1", "2019"], json!(null)),
    ];
}

#[when("the response is normalised")]
fn normalise(
    #[from(region_names)] names: &RefCell<RegionNames>,
    #[from(response)] response: &RefCell<ScbResponse>,
    #[from(batch)] batch: &RefCell<Option<NormalizedBatch>>,
) {
    let normalizer = RecordNormalizer::new(names.borrow().clone());
    *batch.borrow_mut() = Some(normalizer.normalize(&response.borrow()));
}

#[then("one record for Upplands Väsby with 123 births is produced")]
fn one_record(#[from(batch)] batch: &RefCell<Option<NormalizedBatch>>) {
    let borrowed = batch.borrow();
    let batch = borrowed.as_ref().expect("batch should be normalised");
    let [record] = batch.records.as_slice() else {
        panic!("expected one record, found {}", batch.records.len());
    };
    assert_eq!(record.region_code.as_str(), "0114");
    assert_eq!(record.region_name, "Upplands Väsby");
    assert_eq!(record.gender, Gender::Male);
    assert_eq!(record.year, Year::new(2020));
    assert_eq!(record.value, 123);
}

#[then("{count} entries are skipped")]
fn some_skipped(count: usize, #[from(batch)] batch: &RefCell<Option<NormalizedBatch>>) {
    let borrowed = batch.borrow();
    let batch = borrowed.as_ref().expect("batch should be normalised");
    assert_eq!(batch.skipped_count(), count);
}

#[scenario(path = "tests/features/normalize_entries.feature", index = 0)]
fn well_formed_entry(
    region_names: RefCell<RegionNames>,
    response: RefCell<ScbResponse>,
    batch: RefCell<Option<NormalizedBatch>>,
) {
    let _ = (region_names, response, batch);
}

#[scenario(path = "tests/features/normalize_entries.feature", index = 1)]
fn suppressed_values(
    region_names: RefCell<RegionNames>,
    response: RefCell<ScbResponse>,
    batch: RefCell<Option<NormalizedBatch>>,
) {
    let _ = (region_names, response, batch);
}
