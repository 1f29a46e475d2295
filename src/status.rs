//! Audit trail for a lookup: which service, which spelling, which attempt.
//!
//! Every [`Status`] renders to a single human-readable line that ends up in
//! the `status` column of batch output, e.g.
//! `method: PubChem REST (cleaned name), attempt: 2`.

use std::fmt::{self, Display};

use serde::{Serialize, Serializer};

/// Which spelling of the input name a service was queried with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// The normalized input name.
    OriginalName,
    /// The output of [`crate::normalize::smart_clean_name`].
    CleanedName,
    /// Any other entry of [`crate::normalize::try_variants`].
    Variant,
}

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::OriginalName => write!(f, "original name"),
            Label::CleanedName => write!(f, "cleaned name"),
            Label::Variant => write!(f, "variant"),
        }
    }
}

/// External name-to-structure service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Service {
    /// PubChem PUG REST, plain-text property lookup.
    PubChemRest,
    /// PubChem compound record plus synonym list.
    PubChemCompound,
    /// OPSIN systematic name parser.
    Opsin,
}

impl Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::PubChemRest => write!(f, "PubChem REST"),
            Service::PubChemCompound => write!(f, "PubChem compound"),
            Service::Opsin => write!(f, "OPSIN"),
        }
    }
}

/// How a PubChem compound record matched the queried name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// The queried name is one of the compound's synonyms, or PubChem
    /// lists none.
    Exact,
    /// PubChem resolved the name to a compound that does not list it.
    Synonym,
}

impl Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Exact => write!(f, "exact"),
            MatchKind::Synonym => write!(f, "synonym"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Found {
        service: Service,
        kind: Option<MatchKind>,
        label: Label,
        attempt: u32,
    },
    Missed {
        service: Service,
        label: Label,
        attempts: u32,
    },
    NotFound,
}

impl Status {
    pub fn found(service: Service, label: Label, attempt: u32) -> Self {
        Status::Found {
            service,
            kind: None,
            label,
            attempt,
        }
    }

    pub fn missed(service: Service, label: Label, attempts: u32) -> Self {
        Status::Missed {
            service,
            label,
            attempts,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Status::Found { .. })
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Found {
                service,
                kind,
                label,
                attempt,
            } => match kind {
                Some(kind) => write!(f, "method: {service} {kind} ({label}), attempt: {attempt}"),
                None => write!(f, "method: {service} ({label}), attempt: {attempt}"),
            },
            // Only the REST tier retries, so only it reports an attempt count.
            Status::Missed {
                service: Service::PubChemRest,
                label,
                attempts,
            } => write!(
                f,
                "method: {} ({label}) (not found), attempts: {attempts}",
                Service::PubChemRest
            ),
            Status::Missed { service, label, .. } => {
                write!(f, "method: {service} ({label}) (not found)")
            }
            Status::NotFound => write!(f, "Not found with any method"),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
