//! In-process stand-ins for the external services.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use smiles_lookup::{
    pipeline::Pipeline,
    services::{Hit, Resolver},
    status::{Label, Service, Status},
};

pub type CallLog = Arc<Mutex<Vec<(Service, String, Label)>>>;

/// A resolver that knows a fixed set of spellings and records every query.
pub struct Scripted {
    service: Service,
    known: HashMap<String, String>,
    calls: CallLog,
}

impl Resolver for Scripted {
    fn service(&self) -> Service {
        self.service
    }

    fn resolve(&self, name: &str, label: Label) -> Result<Hit, Status> {
        self.calls
            .lock()
            .unwrap()
            .push((self.service, name.to_string(), label));
        match self.known.get(name) {
            Some(smiles) => Ok(Hit {
                smiles: smiles.clone(),
                matched_name: name.to_string(),
                status: Status::found(self.service, label, 1),
            }),
            None => Err(Status::missed(self.service, label, 1)),
        }
    }
}

fn scripted(service: Service, known: &[(&str, &str)], calls: &CallLog) -> Box<dyn Resolver> {
    Box::new(Scripted {
        service,
        known: known
            .iter()
            .map(|(name, smiles)| (name.to_string(), smiles.to_string()))
            .collect(),
        calls: calls.clone(),
    })
}

/// Build a pipeline whose tiers know only the given spellings.
pub fn scripted_pipeline(
    rest: &[(&str, &str)],
    compound: &[(&str, &str)],
    opsin: &[(&str, &str)],
) -> (Pipeline, CallLog) {
    let calls = CallLog::default();
    let pipeline = Pipeline::new(
        scripted(Service::PubChemRest, rest, &calls),
        scripted(Service::PubChemCompound, compound, &calls),
        scripted(Service::Opsin, opsin, &calls),
    );
    (pipeline, calls)
}

pub fn calls(log: &CallLog) -> Vec<(Service, String, Label)> {
    log.lock().unwrap().clone()
}
