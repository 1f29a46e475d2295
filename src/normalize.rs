//! Rewrite raw chemical names into spellings that name services accept.
//!
//! Inventory and procurement sheets carry names like
//! `adamantane@carboxylic_acid` or `benzoicacidanhydride`: stray symbols,
//! underscores instead of spaces, and functional-group suffixes run together
//! with the parent name. The functions here strip the noise
//! ([`normalize_name`]), re-space the common concatenations
//! ([`smart_clean_name`]) and enumerate a prioritized list of alternative
//! spellings ([`try_variants`]) for the lookup pipeline to walk through.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

/// Functional-group suffixes that are often glued onto the preceding word.
/// Order matters: each suffix is applied to the output of the previous one.
pub const GROUP_SUFFIXES: [&str; 42] = [
    "acid",
    "ester",
    "ether",
    "alcohol",
    "anhydride",
    "acetate",
    "amine",
    "amide",
    "sulfide",
    "sulfone",
    "oxide",
    "formate",
    "propionate",
    "butyrate",
    "phenol",
    "nitrate",
    "chloride",
    "fluoride",
    "bromide",
    "iodide",
    "hydrazide",
    "phosphonate",
    "phosphinate",
    "phosphite",
    "phosphine",
    "isocyanate",
    "thiocyanate",
    "thioamide",
    "peroxide",
    "hydroperoxide",
    "nitrile",
    "carboxylate",
    "carboxylic acid",
    "carbamate",
    "benzoate",
    "benzamide",
    "oxalate",
    "tartrate",
    "thiophosphate",
    "arsonic acid",
    "arsenate",
    "arsenite",
];

/// Suffixes that databases sometimes list first (`acid benzoic`).
pub const SWAP_SUFFIXES: [&str; 6] = ["acid", "ester", "ether", "alcohol", "anhydride", "acetate"];

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9,'\-().\s]").expect("valid pattern"));

static DISALLOWED_NO_APOSTROPHE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9,\-().\s]").expect("valid pattern"));

static SUFFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    GROUP_SUFFIXES
        .iter()
        .map(|suf| Regex::new(&format!("(?i){}", regex::escape(suf))).expect("valid pattern"))
        .collect()
});

static PREFIX_HYPHEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([nst]?)-").expect("valid pattern"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid pattern"));

static BIS_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)bis\(([^)]+)\)").expect("valid pattern"));

/// Drop every character other than ASCII letters and digits, whitespace and
/// `, . - ( )`. Apostrophes survive only when `keep_apostrophe` is set, since
/// primes are meaningful in names like `1,1'-thiobisethene`.
pub fn normalize_name(name: &str, keep_apostrophe: bool) -> String {
    let pattern = if keep_apostrophe {
        &*DISALLOWED
    } else {
        &*DISALLOWED_NO_APOSTROPHE
    };
    pattern.replace_all(name, "").into_owned()
}

/// Re-space a (normalized) name so that run-together group suffixes and
/// `n-`/`t-` style prefixes become separate words, then title-case it.
///
/// Only meant as a second attempt once the plain normalized name has failed.
pub fn smart_clean_name(name: &str) -> String {
    let mut name = name.replace('_', " ");
    for suffix in SUFFIXES.iter() {
        name = space_before(&name, suffix);
    }
    let name = PREFIX_HYPHEN.replace_all(&name, "${1} ");
    let name = WHITESPACE.replace_all(&name, " ");
    title_case(&name).trim().to_string()
}

/// Generate the ordered, duplicate-free list of spellings to query for a
/// normalized name. The first entry is always the name itself.
pub fn try_variants(name: &str) -> Vec<String> {
    let mut variants = vec![name.to_string()];
    if name.contains('\'') {
        variants.push(name.replace('\'', ""));
    }

    let cleaned = smart_clean_name(name);
    variants.push(cleaned.clone());
    if cleaned.contains('\'') {
        variants.push(cleaned.replace('\'', ""));
    }

    for suffix in SWAP_SUFFIXES {
        if let Some(core) = strip_suffix_ignore_case(&cleaned, suffix) {
            variants.push(format!("{suffix} {}", core.trim()));
        }
    }

    if cleaned.to_lowercase().contains("bis(") {
        variants.push(BIS_GROUP.replace_all(&cleaned, "$1").into_owned());
    }

    let mut seen = HashSet::new();
    variants.retain(|v| seen.insert(v.clone()));
    variants
}

/// Every spelling the pipeline derives from one raw name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameForms {
    pub raw: String,
    pub normalized: String,
    pub cleaned: String,
    pub variants: Vec<String>,
}

impl NameForms {
    pub fn new(raw: &str) -> Self {
        let normalized = normalize_name(raw, true);
        let cleaned = smart_clean_name(&normalized);
        let variants = try_variants(&normalized);
        Self {
            raw: raw.to_string(),
            normalized,
            cleaned,
            variants,
        }
    }

    /// Return `true` iff nothing queryable survived normalization.
    pub fn is_blank(&self) -> bool {
        self.normalized.trim().is_empty()
    }

    /// Return `true` iff cleaning produced a spelling of its own.
    pub fn has_distinct_cleaned(&self) -> bool {
        self.cleaned != self.normalized
    }
}

/// Insert a space before every match of `suffix` that directly follows an
/// ASCII letter or digit.
fn space_before(name: &str, suffix: &Regex) -> String {
    let mut out = String::with_capacity(name.len() + 8);
    let mut last = 0;
    for m in suffix.find_iter(name) {
        out.push_str(&name[last..m.start()]);
        if name[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            out.push(' ');
        }
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&name[last..]);
    out
}

/// Uppercase the first cased character of every run of cased characters and
/// lowercase the rest. Digits and punctuation start a new run, so
/// `bis(2-ethylhexyl)ester` becomes `Bis(2-Ethylhexyl)Ester`.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        if prev_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_cased = c.is_lowercase() || c.is_uppercase();
    }
    out
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    let tail = s.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &s[..split])
}
