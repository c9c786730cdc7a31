//! FILENAME: data-engine/src/provider.rs
//! Data provider - session lifecycle and the resolve flow.
//!
//! One [`DataProvider`] owns at most one [`Session`]: the accumulated
//! metadata/cube pair for the (table, language) pair currently being
//! browsed. Every selection change funnels through [`DataProvider::resolve`],
//! which decides between serving from the session, fetching a minimal
//! slice and merging it in, or starting over.
//!
//! The provider is strictly single-writer: `resolve` takes `&mut self`, so
//! overlapping resolves against one session are ruled out at compile time.
//! Callers coalescing rapid selection changes should drop superseded
//! results rather than apply them out of order.

use table_model::{Metadata, Selection, TableView};

use crate::error::EngineError;
use crate::merge::merge_slice;
use crate::source::{CodeFilter, DataQuery, DataSource, VariableQuery};

/// The accumulated data for one (table, language) pair.
///
/// Created on first fetch, replaced whenever the table or language changes,
/// and otherwise only ever grown: values and variables are added by merges,
/// never evicted, for the lifetime of one viewing session.
#[derive(Debug, Clone)]
pub struct Session {
    pub metadata: Metadata,
    pub cube: table_model::Cube,
}

impl Session {
    /// Whether this session holds data for the given table and language.
    pub fn matches(&self, table_id: &str, language: &str) -> bool {
        self.metadata.id.eq_ignore_ascii_case(table_id)
            && self.metadata.language.eq_ignore_ascii_case(language)
    }
}

/// Owns the session and the fetch collaborator.
pub struct DataProvider<S> {
    source: S,
    session: Option<Session>,
}

impl<S: DataSource> DataProvider<S> {
    pub fn new(source: S) -> Self {
        DataProvider {
            source,
            session: None,
        }
    }

    /// The accumulated session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Discards the accumulated session.
    pub fn reset(&mut self) {
        self.session = None;
    }

    /// Resolves a selection change into a projected table view, fetching
    /// only what the session does not already hold.
    ///
    /// A session for a different table or language (compared
    /// case-insensitively) counts as no session at all: the new slice
    /// replaces it wholesale. On fetch failure the session is left exactly
    /// as it was, so the same resolve can simply be retried.
    pub fn resolve(
        &mut self,
        table_id: &str,
        language: &str,
        requested: &Selection,
    ) -> Result<TableView<'_>, EngineError> {
        let usable = self
            .session
            .as_ref()
            .is_some_and(|s| s.matches(table_id, language));

        if usable {
            self.refresh(table_id, language, requested)?;
        } else {
            if self.session.is_some() {
                log::debug!("session key changed to {table_id}/{language}, starting over");
            }
            let slice = fetch_slice(&self.source, table_id, language, &full_query(requested))?;
            self.session = Some(slice);
        }

        match self.session.as_ref() {
            Some(session) => Ok(view_of(session, requested)),
            None => unreachable!("resolve installs a session before projecting"),
        }
    }

    /// Brings a usable session up to date with the requested selection.
    fn refresh(
        &mut self,
        table_id: &str,
        language: &str,
        requested: &Selection,
    ) -> Result<(), EngineError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        if is_all_loaded(&session.metadata, requested) {
            log::debug!("selection fully covered by session, skipping fetch");
            return Ok(());
        }

        let diff = diff_selection(&session.metadata, requested);
        let query = minimal_query(requested, &diff);
        let slice = fetch_slice(&self.source, table_id, language, &query)?;

        match diff.entries() {
            [changed] => {
                log::debug!(
                    "merging {} new code(s) for variable {}",
                    changed.codes.len(),
                    changed.variable_id
                );
                merge_slice(session, slice, &changed.variable_id, requested)?;
            }
            [] => {
                *session = slice;
            }
            entries => {
                log::debug!(
                    "merge skipped: {} variables changed at once, replacing session",
                    entries.len()
                );
                *session = slice;
            }
        }
        Ok(())
    }
}

/// Projects the session onto the requested selection. Metadata is narrowed;
/// the cube is borrowed as-is, since lookups address by code.
fn view_of<'a>(session: &'a Session, requested: &Selection) -> TableView<'a> {
    TableView {
        metadata: session.metadata.project(requested),
        cube: &session.cube,
    }
}

fn fetch_slice<S: DataSource>(
    source: &S,
    table_id: &str,
    language: &str,
    query: &DataQuery,
) -> Result<Session, EngineError> {
    let dataset = source.fetch(table_id, language, query)?;
    let (metadata, cube) = dataset.into_table()?;
    Ok(Session { metadata, cube })
}

/// Whether every explicitly requested code is already present in the
/// session metadata. Variables requested without an explicit code list
/// impose no coverage constraint.
fn is_all_loaded(metadata: &Metadata, requested: &Selection) -> bool {
    requested.entries().iter().all(|sel| {
        if sel.codes.is_empty() {
            return true;
        }
        match metadata.variable(&sel.variable_id) {
            Some(var) => sel.codes.iter().all(|code| var.has_code(code)),
            None => false,
        }
    })
}

/// The part of the request the session does not already hold: per variable,
/// only the codes missing from the session metadata. Variables with nothing
/// missing are dropped; variables unknown to the session are kept in full.
fn diff_selection(metadata: &Metadata, requested: &Selection) -> Selection {
    let mut diff = Selection::new();
    for sel in requested.entries() {
        match metadata.variable(&sel.variable_id) {
            Some(var) => {
                let missing: Vec<String> = sel
                    .codes
                    .iter()
                    .filter(|code| !var.has_code(code))
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    diff = diff.with_variable(sel.variable_id.clone(), missing);
                }
            }
            None => diff.push(sel.clone()),
        }
    }
    diff
}

/// The request actually sent: diff codes where a diff exists, the original
/// per-variable selection everywhere else. Sending the full variable list
/// keeps the response shape unambiguous for the receiver.
fn minimal_query(requested: &Selection, diff: &Selection) -> DataQuery {
    DataQuery {
        selections: requested
            .entries()
            .iter()
            .map(|sel| {
                let codes = diff.codes_for(&sel.variable_id).unwrap_or(&sel.codes);
                VariableQuery {
                    variable_id: sel.variable_id.clone(),
                    filter: to_filter(codes),
                }
            })
            .collect(),
    }
}

fn full_query(requested: &Selection) -> DataQuery {
    DataQuery {
        selections: requested
            .entries()
            .iter()
            .map(|sel| VariableQuery {
                variable_id: sel.variable_id.clone(),
                filter: to_filter(&sel.codes),
            })
            .collect(),
    }
}

fn to_filter(codes: &[String]) -> CodeFilter {
    if codes.is_empty() {
        CodeFilter::All
    } else {
        CodeFilter::Codes(codes.to_vec())
    }
}
