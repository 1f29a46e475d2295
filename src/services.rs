//! Clients for the external name-to-structure services.
//!
//! Each service implements [`Resolver`]: given one spelling of a name it
//! either returns a [`Hit`] or the [`Status::Missed`] line describing the
//! failed tier. Network and payload errors are logged here and never
//! propagate, so a flaky service only costs its own tier.

use std::{collections::HashMap, thread, time::Duration};

use reqwest::{blocking::Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    config::LookupConfig,
    error::{LookupError, Result},
    status::{Label, MatchKind, Service, Status},
};

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub smiles: String,
    /// The spelling or synonym that produced the match.
    pub matched_name: String,
    pub status: Status,
}

/// One tier of the lookup pipeline.
pub trait Resolver: Send + Sync {
    fn service(&self) -> Service;

    /// Look up a single spelling. The error side is the tier's
    /// [`Status::Missed`] line.
    fn resolve(&self, name: &str, label: Label) -> std::result::Result<Hit, Status>;
}

/// Build the blocking HTTP client shared by all tiers.
pub fn http_client(config: &LookupConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.as_str())
        .build()?)
}

/// Append `segments` to `base`, percent-encoding each one as a single path
/// segment (so a `/` inside a name cannot change the route).
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| LookupError::Url {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    {
        let mut path = url.path_segments_mut().map_err(|_| LookupError::Url {
            url: base.to_string(),
            reason: "cannot be a base".into(),
        })?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// GET `url` and return the body of a 200 response.
fn get_text(client: &Client, url: Url) -> Result<String> {
    let response = client.get(url.clone()).send()?;
    if response.status() != StatusCode::OK {
        return Err(LookupError::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.text()?)
}

/// First non-empty line of a plain-text response. PubChem answers with one
/// line per compound when a name is ambiguous.
fn first_line(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Non-200 answers are the normal "no such name" path; only transport and
/// payload problems deserve a warning.
fn log_failure(service: Service, name: &str, attempt: u32, err: &LookupError) {
    match err {
        LookupError::Status { status, .. } => {
            debug!(%service, name, attempt, status, "service declined name")
        }
        _ => warn!(%service, name, attempt, error = %err, "service request failed"),
    }
}

/// PubChem PUG REST, `compound/name/{name}/property/{property}/TXT`.
pub struct PubChemRest {
    client: Client,
    base: String,
    property: String,
    retries: u32,
    delay: Duration,
}

impl PubChemRest {
    pub fn new(client: Client, config: &LookupConfig) -> Self {
        Self {
            client,
            base: config.pubchem_url.clone(),
            property: config.smiles_property.clone(),
            retries: config.retries,
            delay: config.delay,
        }
    }

    fn fetch(&self, name: &str) -> Result<String> {
        let url = endpoint(
            &self.base,
            &["compound", "name", name, "property", &self.property, "TXT"],
        )?;
        let body = get_text(&self.client, url)?;
        first_line(&body).ok_or(LookupError::EmptyRecord)
    }
}

impl Resolver for PubChemRest {
    fn service(&self) -> Service {
        Service::PubChemRest
    }

    fn resolve(&self, name: &str, label: Label) -> std::result::Result<Hit, Status> {
        for attempt in 1..=self.retries {
            match self.fetch(name) {
                Ok(smiles) => {
                    return Ok(Hit {
                        smiles,
                        matched_name: name.to_string(),
                        status: Status::found(Service::PubChemRest, label, attempt),
                    })
                }
                Err(e) => log_failure(Service::PubChemRest, name, attempt, &e),
            }
            if attempt < self.retries {
                thread::sleep(self.delay);
            }
        }
        Err(Status::missed(Service::PubChemRest, label, self.retries))
    }
}

#[derive(Deserialize)]
struct PropertyResponse {
    #[serde(rename = "PropertyTable")]
    table: PropertyTable,
}

#[derive(Deserialize)]
struct PropertyTable {
    #[serde(rename = "Properties", default)]
    properties: Vec<PropertyRecord>,
}

#[derive(Deserialize)]
struct PropertyRecord {
    #[serde(rename = "CID")]
    cid: u64,
    #[serde(flatten)]
    fields: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct SynonymResponse {
    #[serde(rename = "InformationList")]
    list: InformationList,
}

#[derive(Deserialize)]
struct InformationList {
    #[serde(rename = "Information", default)]
    information: Vec<Information>,
}

#[derive(Deserialize)]
struct Information {
    #[serde(rename = "Synonym", default)]
    synonyms: Vec<String>,
}

/// Extract the CID and SMILES of the first record of a JSON property table.
pub(crate) fn parse_property_table(body: &str, property: &str) -> Result<(u64, String)> {
    let response: PropertyResponse = serde_json::from_str(body)?;
    let record = response
        .table
        .properties
        .into_iter()
        .next()
        .ok_or(LookupError::EmptyRecord)?;
    // PubChem renamed `CanonicalSMILES` in its output; accept the newer keys.
    let keys = [property, "ConnectivitySMILES", "SMILES"];
    let smiles = keys
        .iter()
        .find_map(|key| record.fields.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(LookupError::EmptyRecord)?;
    Ok((record.cid, smiles.to_string()))
}

/// Extract the synonym list of the first record of a JSON synonym response.
pub(crate) fn parse_synonyms(body: &str) -> Result<Vec<String>> {
    let response: SynonymResponse = serde_json::from_str(body)?;
    Ok(response
        .list
        .information
        .into_iter()
        .next()
        .map(|info| info.synonyms)
        .unwrap_or_default())
}

/// Decide between an exact and a synonym match: if PubChem knows synonyms for
/// the compound but the queried name is not among them, report the first
/// synonym as the name that matched.
pub(crate) fn classify_match(name: &str, synonyms: &[String]) -> (MatchKind, String) {
    match synonyms.first() {
        Some(first) if !synonyms.iter().any(|s| s == name) => (MatchKind::Synonym, first.clone()),
        _ => (MatchKind::Exact, name.to_string()),
    }
}

/// PubChem compound record lookup with synonym resolution.
pub struct PubChemCompound {
    client: Client,
    base: String,
    property: String,
}

impl PubChemCompound {
    pub fn new(client: Client, config: &LookupConfig) -> Self {
        Self {
            client,
            base: config.pubchem_url.clone(),
            property: config.smiles_property.clone(),
        }
    }

    fn synonyms(&self, cid: u64) -> Result<Vec<String>> {
        let cid = cid.to_string();
        let url = endpoint(&self.base, &["compound", "cid", &cid, "synonyms", "JSON"])?;
        parse_synonyms(&get_text(&self.client, url)?)
    }

    fn fetch(&self, name: &str) -> Result<(String, MatchKind, String)> {
        let url = endpoint(
            &self.base,
            &["compound", "name", name, "property", &self.property, "JSON"],
        )?;
        let (cid, smiles) = parse_property_table(&get_text(&self.client, url)?, &self.property)?;
        let synonyms = self.synonyms(cid).unwrap_or_else(|e| {
            debug!(cid, error = %e, "synonym lookup failed, treating match as exact");
            Vec::new()
        });
        let (kind, matched) = classify_match(name, &synonyms);
        Ok((smiles, kind, matched))
    }
}

impl Resolver for PubChemCompound {
    fn service(&self) -> Service {
        Service::PubChemCompound
    }

    fn resolve(&self, name: &str, label: Label) -> std::result::Result<Hit, Status> {
        match self.fetch(name) {
            Ok((smiles, kind, matched_name)) => Ok(Hit {
                smiles,
                matched_name,
                status: Status::Found {
                    service: Service::PubChemCompound,
                    kind: Some(kind),
                    label,
                    attempt: 1,
                },
            }),
            Err(e) => {
                log_failure(Service::PubChemCompound, name, 1, &e);
                Err(Status::missed(Service::PubChemCompound, label, 1))
            }
        }
    }
}

/// OPSIN web service, `{name}.smi`.
pub struct Opsin {
    client: Client,
    base: String,
}

impl Opsin {
    pub fn new(client: Client, config: &LookupConfig) -> Self {
        Self {
            client,
            base: config.opsin_url.clone(),
        }
    }

    fn fetch(&self, name: &str) -> Result<String> {
        let url = endpoint(&self.base, &[&format!("{name}.smi")])?;
        let body = get_text(&self.client, url)?;
        let smiles = body.trim();
        if smiles.is_empty() {
            return Err(LookupError::EmptyRecord);
        }
        Ok(smiles.to_string())
    }
}

impl Resolver for Opsin {
    fn service(&self) -> Service {
        Service::Opsin
    }

    fn resolve(&self, name: &str, label: Label) -> std::result::Result<Hit, Status> {
        match self.fetch(name) {
            Ok(smiles) => Ok(Hit {
                smiles,
                matched_name: name.to_string(),
                status: Status::found(Service::Opsin, label, 1),
            }),
            Err(e) => {
                log_failure(Service::Opsin, name, 1, &e);
                Err(Status::missed(Service::Opsin, label, 1))
            }
        }
    }
}
