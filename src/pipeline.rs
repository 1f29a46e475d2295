//! Walk the name variants through the service tiers until one answers.
//!
//! Tier order for a raw name:
//! 1. PubChem REST, then PubChem compound, on the normalized name;
//! 2. the same two on the cleaned name, if cleaning changed anything;
//! 3. the same two on every remaining variant;
//! 4. OPSIN on every variant, normalized and cleaned names included.
//!
//! The first hit wins.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::LookupConfig,
    error::Result,
    normalize::NameForms,
    services::{http_client, Hit, Opsin, PubChemCompound, PubChemRest, Resolver},
    status::{Label, Status},
};

/// Final outcome for one raw name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub smiles: Option<String>,
    pub status: Status,
    /// Spelling or synonym that produced the match; empty when unresolved.
    pub matched_name: String,
}

impl Resolution {
    pub fn not_found() -> Self {
        Self {
            smiles: None,
            status: Status::NotFound,
            matched_name: String::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.smiles.is_some()
    }
}

impl From<Hit> for Resolution {
    fn from(hit: Hit) -> Self {
        Self {
            smiles: Some(hit.smiles),
            status: hit.status,
            matched_name: hit.matched_name,
        }
    }
}

pub struct Pipeline {
    rest: Box<dyn Resolver>,
    compound: Box<dyn Resolver>,
    opsin: Box<dyn Resolver>,
}

impl Pipeline {
    pub fn new(
        rest: Box<dyn Resolver>,
        compound: Box<dyn Resolver>,
        opsin: Box<dyn Resolver>,
    ) -> Self {
        Self {
            rest,
            compound,
            opsin,
        }
    }

    /// Pipeline over the live PubChem and OPSIN services.
    pub fn from_config(config: &LookupConfig) -> Result<Self> {
        config.validate()?;
        let client = http_client(config)?;
        Ok(Self::new(
            Box::new(PubChemRest::new(client.clone(), config)),
            Box::new(PubChemCompound::new(client.clone(), config)),
            Box::new(Opsin::new(client, config)),
        ))
    }

    pub fn fetch_best_smiles(&self, chemical_name: &str) -> Resolution {
        self.resolve_forms(&NameForms::new(chemical_name))
    }

    pub fn resolve_forms(&self, forms: &NameForms) -> Resolution {
        if forms.is_blank() {
            warn!(raw = %forms.raw, "nothing left to look up after normalization");
            return Resolution::not_found();
        }

        let pubchem: [&dyn Resolver; 2] = [self.rest.as_ref(), self.compound.as_ref()];
        for (name, label) in pubchem_plan(forms) {
            for resolver in pubchem {
                if let Some(hit) = attempt(resolver, name, label) {
                    return hit.into();
                }
            }
        }

        for variant in &forms.variants {
            if let Some(hit) = attempt(self.opsin.as_ref(), variant, label_of(forms, variant)) {
                return hit.into();
            }
        }

        debug!(raw = %forms.raw, "no tier resolved the name");
        Resolution::not_found()
    }
}

/// Spellings for the PubChem tiers, in query order.
fn pubchem_plan(forms: &NameForms) -> Vec<(&str, Label)> {
    let mut plan = vec![(forms.normalized.as_str(), Label::OriginalName)];
    if forms.has_distinct_cleaned() {
        plan.push((forms.cleaned.as_str(), Label::CleanedName));
    }
    plan.extend(
        forms
            .variants
            .iter()
            .filter(|v| **v != forms.normalized && **v != forms.cleaned)
            .map(|v| (v.as_str(), Label::Variant)),
    );
    plan
}

fn label_of(forms: &NameForms, variant: &str) -> Label {
    if variant == forms.normalized {
        Label::OriginalName
    } else if variant == forms.cleaned {
        Label::CleanedName
    } else {
        Label::Variant
    }
}

fn attempt(resolver: &dyn Resolver, name: &str, label: Label) -> Option<Hit> {
    match resolver.resolve(name, label) {
        Ok(hit) => {
            info!(name, smiles = %hit.smiles, status = %hit.status, "resolved");
            Some(hit)
        }
        Err(status) => {
            debug!(name, service = %resolver.service(), %status, "tier missed");
            None
        }
    }
}

/// Resolve one name against the live services with `config`. Builds a fresh
/// HTTP client; keep a [`Pipeline`] around for repeated lookups.
pub fn fetch_best_smiles(chemical_name: &str, config: &LookupConfig) -> Result<Resolution> {
    Ok(Pipeline::from_config(config)?.fetch_best_smiles(chemical_name))
}
