//! FILENAME: tests/common/mod.rs
//! Shared test harness: a scripted data source over a fixture universe.

use std::cell::RefCell;

use data_engine::{CodeFilter, DataQuery, DataSource, Dataset, Dimension, DimensionValue, SourceError};
use table_model::VariableKind;

/// A deterministic in-memory data service.
///
/// Holds the full catalog ("universe") of one table and answers queries by
/// slicing it. Cell values are a function of the universe position of each
/// coordinate, so tests can compute the expected value of any combination
/// independently of which request delivered it.
pub struct ScriptedSource {
    dimensions: Vec<Dimension>,
    response_order: RefCell<Vec<String>>,
    fail_next: RefCell<bool>,
    corrupt_next: RefCell<bool>,
    pub calls: RefCell<Vec<DataQuery>>,
}

impl ScriptedSource {
    pub fn new(dimensions: Vec<Dimension>) -> Self {
        let order = dimensions.iter().map(|d| d.id.clone()).collect();
        ScriptedSource {
            dimensions,
            response_order: RefCell::new(order),
            fail_next: RefCell::new(false),
            corrupt_next: RefCell::new(false),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Declares responses in a different dimension order from now on,
    /// simulating a service that reorders dimensions between calls.
    pub fn set_response_order(&self, ids: &[&str]) {
        *self.response_order.borrow_mut() = ids.iter().map(|s| s.to_string()).collect();
    }

    /// The next fetch fails with a transport error.
    pub fn fail_next(&self) {
        *self.fail_next.borrow_mut() = true;
    }

    /// The next response drops one observation, making the payload
    /// inconsistent with its declared dimension sizes.
    pub fn corrupt_next(&self) {
        *self.corrupt_next.borrow_mut() = true;
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// The deterministic value of a combination, given as
    /// (variable id, code) pairs in any order.
    pub fn expected(&self, codes: &[(&str, &str)]) -> f64 {
        let mut total = 0.0;
        for (variable_id, code) in codes {
            let pos = self
                .dimensions
                .iter()
                .position(|d| d.id == *variable_id)
                .expect("unknown variable in expected()");
            let idx = self.dimensions[pos]
                .values
                .iter()
                .position(|v| v.code == *code)
                .expect("unknown code in expected()");
            total += ((idx + 1) as f64) * 100f64.powi(pos as i32);
        }
        total
    }
}

impl DataSource for ScriptedSource {
    fn fetch(
        &self,
        table_id: &str,
        language: &str,
        query: &DataQuery,
    ) -> Result<Dataset, SourceError> {
        self.calls.borrow_mut().push(query.clone());

        if std::mem::take(&mut *self.fail_next.borrow_mut()) {
            return Err(SourceError::Transport("scripted failure".to_string()));
        }

        let order = self.response_order.borrow().clone();
        let mut dimensions = Vec::new();
        for id in &order {
            let Some(filter) = query.filter_for(id) else {
                continue;
            };
            let universe = self
                .dimensions
                .iter()
                .find(|d| &d.id == id)
                .expect("query mentions a dimension outside the universe");
            let values: Vec<DimensionValue> = match filter {
                CodeFilter::All => universe.values.clone(),
                CodeFilter::Codes(codes) => universe
                    .values
                    .iter()
                    .filter(|v| codes.contains(&v.code))
                    .cloned()
                    .collect(),
            };
            dimensions.push(Dimension {
                id: universe.id.clone(),
                label: universe.label.clone(),
                kind: universe.kind,
                mandatory: universe.mandatory,
                values,
            });
        }

        let mut values = Vec::new();
        let mut combo = Vec::new();
        self.append_values(&dimensions, 0, &mut combo, &mut values);

        if std::mem::take(&mut *self.corrupt_next.borrow_mut()) {
            values.pop();
        }

        Ok(Dataset {
            table_id: table_id.to_string(),
            language: language.to_string(),
            dimensions,
            values,
        })
    }
}

impl ScriptedSource {
    fn append_values(
        &self,
        dimensions: &[Dimension],
        depth: usize,
        combo: &mut Vec<(String, String)>,
        out: &mut Vec<Option<f64>>,
    ) {
        if depth == dimensions.len() {
            let pairs: Vec<(&str, &str)> = combo
                .iter()
                .map(|(id, code)| (id.as_str(), code.as_str()))
                .collect();
            out.push(Some(self.expected(&pairs)));
            return;
        }
        for value in &dimensions[depth].values {
            combo.push((dimensions[depth].id.clone(), value.code.clone()));
            self.append_values(dimensions, depth + 1, combo, out);
            combo.pop();
        }
    }
}

fn dimension(id: &str, label: &str, kind: VariableKind, codes: &[&str]) -> Dimension {
    Dimension {
        id: id.to_string(),
        label: label.to_string(),
        kind,
        mandatory: false,
        values: codes
            .iter()
            .map(|c| DimensionValue {
                code: c.to_string(),
                label: c.to_string(),
            })
            .collect(),
    }
}

/// A three-region, three-year fixture universe.
pub fn region_year_universe() -> Vec<Dimension> {
    vec![
        dimension(
            "region",
            "Region",
            VariableKind::Geographical,
            &["R1", "R2", "R3"],
        ),
        dimension("year", "Year", VariableKind::Time, &["2020", "2021", "2022"]),
    ]
}
