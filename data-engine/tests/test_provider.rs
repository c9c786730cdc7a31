//! FILENAME: tests/test_provider.rs
//! Integration tests for the resolve/accumulate flow.

mod common;

use common::{region_year_universe, ScriptedSource};
use data_engine::{CodeFilter, DataProvider, EngineError};
use table_model::{Observation, Selection};

fn selection(region: &[&str], year: &[&str]) -> Selection {
    Selection::new()
        .with_variable("region", region.iter().copied())
        .with_variable("year", year.iter().copied())
}

#[test]
fn test_first_resolve_fetches_and_builds_session() {
    let source = ScriptedSource::new(region_year_universe());
    let mut provider = DataProvider::new(&source);

    let requested = selection(&["R1", "R2"], &["2020"]);
    let view = provider.resolve("TAB01", "en", &requested).unwrap();

    assert_eq!(source.call_count(), 1);
    assert_eq!(view.metadata.variables.len(), 2);
    assert_eq!(
        view.cube.get(&["R1", "2020"]),
        Some(&Observation::Number(
            source.expected(&[("region", "R1"), ("year", "2020")])
        ))
    );
    assert_eq!(
        view.cube.get(&["R2", "2020"]),
        Some(&Observation::Number(
            source.expected(&[("region", "R2"), ("year", "2020")])
        ))
    );
}

#[test]
fn test_covered_selection_never_refetches() {
    let source = ScriptedSource::new(region_year_universe());
    let mut provider = DataProvider::new(&source);

    let requested = selection(&["R1", "R2"], &["2020", "2021"]);
    provider.resolve("TAB01", "en", &requested).unwrap();
    provider.resolve("TAB01", "en", &requested).unwrap();
    assert_eq!(source.call_count(), 1);

    // A subset of what is accumulated is covered as well.
    let narrower = selection(&["R2"], &["2021"]);
    let view = provider.resolve("TAB01", "en", &narrower).unwrap();
    assert_eq!(source.call_count(), 1);
    assert_eq!(view.metadata.variables[0].values.len(), 1);
    assert_eq!(view.metadata.variables[1].values.len(), 1);
}

#[test]
fn test_single_variable_merge_under_remapped_dimension_order() {
    let source = ScriptedSource::new(region_year_universe());
    let mut provider = DataProvider::new(&source);

    provider
        .resolve("TAB01", "en", &selection(&["R1", "R2"], &["2020"]))
        .unwrap();

    // The service now declares year before region; the merge must translate
    // paths through the permutation instead of assuming stable order.
    source.set_response_order(&["year", "region"]);
    provider
        .resolve("TAB01", "en", &selection(&["R1", "R2"], &["2020", "2021"]))
        .unwrap();

    assert_eq!(source.call_count(), 2);

    // The second request was minimal: only the missing year, full regions.
    let calls = source.calls.borrow();
    let second = &calls[1];
    assert_eq!(
        second.filter_for("year"),
        Some(&CodeFilter::Codes(vec!["2021".to_string()]))
    );
    assert_eq!(
        second.filter_for("region"),
        Some(&CodeFilter::Codes(vec!["R1".to_string(), "R2".to_string()]))
    );

    let session = provider.session().unwrap();
    let year_codes: Vec<&str> = session.metadata.variables[1].codes().collect();
    assert_eq!(year_codes, vec!["2020", "2021"]);

    // Accumulated combinations are untouched, merged ones match the source.
    for region in ["R1", "R2"] {
        for year in ["2020", "2021"] {
            assert_eq!(
                session.cube.get(&[region, year]),
                Some(&Observation::Number(
                    source.expected(&[("region", region), ("year", year)])
                )),
                "cell {region}/{year}"
            );
        }
    }
}

#[test]
fn test_merge_inserts_value_at_requested_position() {
    let source = ScriptedSource::new(region_year_universe());
    let mut provider = DataProvider::new(&source);

    provider
        .resolve("TAB01", "en", &selection(&["R1"], &["2020", "2022"]))
        .unwrap();
    provider
        .resolve("TAB01", "en", &selection(&["R1"], &["2020", "2021", "2022"]))
        .unwrap();

    let session = provider.session().unwrap();
    let year_codes: Vec<&str> = session.metadata.variables[1].codes().collect();
    assert_eq!(year_codes, vec!["2020", "2021", "2022"]);
}

#[test]
fn test_multi_variable_diff_discards_old_session() {
    let source = ScriptedSource::new(region_year_universe());
    let mut provider = DataProvider::new(&source);

    provider
        .resolve("TAB01", "en", &selection(&["R1"], &["2020"]))
        .unwrap();
    // Both variables gain a code at once: no merge, the fetched slice
    // becomes the session and accumulated history is gone.
    provider
        .resolve("TAB01", "en", &selection(&["R1", "R2"], &["2020", "2021"]))
        .unwrap();

    assert_eq!(source.call_count(), 2);

    let session = provider.session().unwrap();
    let region_codes: Vec<&str> = session.metadata.variables[0].codes().collect();
    let year_codes: Vec<&str> = session.metadata.variables[1].codes().collect();
    assert_eq!(region_codes, vec!["R2"]);
    assert_eq!(year_codes, vec!["2021"]);

    assert_eq!(session.cube.get(&["R1", "2020"]), None);
    assert_eq!(
        session.cube.get(&["R2", "2021"]),
        Some(&Observation::Number(
            source.expected(&[("region", "R2"), ("year", "2021")])
        ))
    );
}

#[test]
fn test_language_change_discards_session() {
    let source = ScriptedSource::new(region_year_universe());
    let mut provider = DataProvider::new(&source);

    let requested = selection(&["R1"], &["2020"]);
    provider.resolve("TAB01", "en", &requested).unwrap();
    provider.resolve("TAB01", "sv", &requested).unwrap();

    assert_eq!(source.call_count(), 2);
    let session = provider.session().unwrap();
    assert_eq!(session.metadata.language, "sv");

    // The replacement request was a full one, not a diff.
    let calls = source.calls.borrow();
    let second = &calls[1];
    assert_eq!(
        second.filter_for("region"),
        Some(&CodeFilter::Codes(vec!["R1".to_string()]))
    );
}

#[test]
fn test_session_key_comparison_is_case_insensitive() {
    let source = ScriptedSource::new(region_year_universe());
    let mut provider = DataProvider::new(&source);

    let requested = selection(&["R1"], &["2020"]);
    provider.resolve("TAB01", "en", &requested).unwrap();
    provider.resolve("tab01", "EN", &requested).unwrap();

    assert_eq!(source.call_count(), 1);
}

#[test]
fn test_fetch_failure_leaves_session_untouched() {
    let source = ScriptedSource::new(region_year_universe());
    let mut provider = DataProvider::new(&source);

    provider
        .resolve("TAB01", "en", &selection(&["R1"], &["2020"]))
        .unwrap();

    source.fail_next();
    let err = provider
        .resolve("TAB01", "en", &selection(&["R1"], &["2020", "2021"]))
        .unwrap_err();
    assert!(matches!(err, EngineError::FetchFailed(_)));

    let session = provider.session().unwrap();
    let year_codes: Vec<&str> = session.metadata.variables[1].codes().collect();
    assert_eq!(year_codes, vec!["2020"]);

    // The identical resolve is a valid retry.
    provider
        .resolve("TAB01", "en", &selection(&["R1"], &["2020", "2021"]))
        .unwrap();
    assert_eq!(source.call_count(), 3);
}

#[test]
fn test_malformed_payload_is_a_fetch_failure() {
    let source = ScriptedSource::new(region_year_universe());
    let mut provider = DataProvider::new(&source);

    provider
        .resolve("TAB01", "en", &selection(&["R1"], &["2020"]))
        .unwrap();

    source.corrupt_next();
    let err = provider
        .resolve("TAB01", "en", &selection(&["R1"], &["2020", "2021"]))
        .unwrap_err();
    assert!(matches!(err, EngineError::FetchFailed(_)));

    // No partially populated cube was kept.
    let session = provider.session().unwrap();
    assert_eq!(session.cube.get(&["R1", "2021"]), None);
}

#[test]
fn test_open_ended_variable_maps_to_all_filter() {
    let source = ScriptedSource::new(region_year_universe());
    let mut provider = DataProvider::new(&source);

    let requested = Selection::new()
        .with_variable("region", ["R1"])
        .with_variable("year", Vec::<String>::new());
    let view = provider.resolve("TAB01", "en", &requested).unwrap();

    let calls = source.calls.borrow();
    let first = &calls[0];
    assert_eq!(first.filter_for("year"), Some(&CodeFilter::All));
    // The projection keeps the full fetched catalog for the open variable.
    assert_eq!(view.metadata.variables[1].values.len(), 3);
}
