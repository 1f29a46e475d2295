//! Settings shared by every service tier.

use std::time::Duration;

use crate::error::{LookupError, Result};

pub const DEFAULT_PUBCHEM_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";
pub const DEFAULT_OPSIN_URL: &str = "https://opsin.ch.cam.ac.uk/opsin";
pub const DEFAULT_SMILES_PROPERTY: &str = "CanonicalSMILES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    /// Network attempts per PubChem REST query.
    pub retries: u32,
    /// Pause between PubChem REST attempts.
    pub delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Base of the PubChem PUG REST API, without trailing slash.
    pub pubchem_url: String,
    /// Base of the OPSIN web service, without trailing slash.
    pub opsin_url: String,
    /// PubChem property holding the SMILES string.
    pub smiles_property: String,
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
            pubchem_url: DEFAULT_PUBCHEM_URL.to_string(),
            opsin_url: DEFAULT_OPSIN_URL.to_string(),
            smiles_property: DEFAULT_SMILES_PROPERTY.to_string(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl LookupConfig {
    /// Defaults with `retries` attempts and a pause of `delay` seconds.
    pub fn with_retries(retries: u32, delay: f64) -> Result<Self> {
        let delay = Duration::try_from_secs_f64(delay)
            .map_err(|e| LookupError::Config(format!("invalid delay {delay}: {e}")))?;
        let config = Self {
            retries,
            delay,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retries == 0 {
            return Err(LookupError::Config("retries must be at least 1".into()));
        }
        if self.smiles_property.trim().is_empty() {
            return Err(LookupError::Config("smiles property must not be empty".into()));
        }
        for url in [&self.pubchem_url, &self.opsin_url] {
            reqwest::Url::parse(url).map_err(|e| LookupError::Url {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}
