//! Best-effort resolution of noisy chemical names to SMILES.
//!
//! Names from inventories and procurement sheets are normalized into a list of
//! candidate spellings, which are then queried against PubChem and OPSIN in a
//! fixed priority order until one of them returns a structure. Every result
//! records which service and which spelling matched.
//!
//! ```no_run
//! use smiles_lookup::{config::LookupConfig, pipeline::Pipeline};
//!
//! let pipeline = Pipeline::from_config(&LookupConfig::default())?;
//! let res = pipeline.fetch_best_smiles("ethylbenzoate");
//! println!("{:?} via {}", res.smiles, res.status);
//! # Ok::<(), smiles_lookup::error::LookupError>(())
//! ```

// Name cleanup and variant spellings
pub mod normalize;

// Audit trail of which tier matched
pub mod status;

// External service clients
pub mod services;

// The tier loop
pub mod pipeline;

// Per-run lookup cache
pub mod memoize;

// CSV and list I/O
pub mod batch;

pub mod config;
pub mod error;
pub mod logging;

// Python library
#[cfg(feature = "python")]
pub mod python;
