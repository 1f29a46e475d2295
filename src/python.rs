use std::sync::LazyLock;

use pyo3::{exceptions::PyValueError, prelude::*};

use crate::{
    config::LookupConfig,
    logging::init_tracing,
    memoize::PipelinePool,
    normalize,
};

static PIPELINES: LazyLock<PipelinePool> = LazyLock::new(PipelinePool::new);

/// Resolve a chemical name to SMILES. Returns `(smiles, status, matched_name)`
/// where `smiles` is `None` if no service knew the name.
#[pyfunction]
#[pyo3(signature = (chemical_name, retries = 3, delay = 1.0))]
fn fetch_best_smiles(
    py: Python<'_>,
    chemical_name: &str,
    retries: u32,
    delay: f64,
) -> PyResult<(Option<String>, String, String)> {
    let config = LookupConfig::with_retries(retries, delay)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let pipeline = PIPELINES
        .get(&config)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let res = py.allow_threads(|| pipeline.fetch_best_smiles(chemical_name));
    Ok((res.smiles, res.status.to_string(), res.matched_name))
}

#[pyfunction]
#[pyo3(signature = (chemical_name, keep_apostrophe = true))]
fn normalize_name(chemical_name: &str, keep_apostrophe: bool) -> String {
    normalize::normalize_name(chemical_name, keep_apostrophe)
}

#[pyfunction]
fn smart_clean_name(name: &str) -> String {
    normalize::smart_clean_name(name)
}

#[pyfunction]
fn try_variants(name: &str) -> Vec<String> {
    normalize::try_variants(name)
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn smiles_lookup(m: &Bound<'_, PyModule>) -> PyResult<()> {
    init_tracing(false);
    m.add_function(wrap_pyfunction!(fetch_best_smiles, m)?)?;
    m.add_function(wrap_pyfunction!(normalize_name, m)?)?;
    m.add_function(wrap_pyfunction!(smart_clean_name, m)?)?;
    m.add_function(wrap_pyfunction!(try_variants, m)?)?;

    Ok(())
}
