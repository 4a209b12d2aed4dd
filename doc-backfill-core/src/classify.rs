//! Key classification: maps a legacy storage key onto a registry [`Document`].
//!
//! Dispatch happens on the root folder (first `/`-separated segment):
//!
//! ```text
//! tax/...                                   -> skipped
//! iocc/... ownership_documents/... ...      -> fixed type, no owner
//! sto_zips/{seller_id}/...                  -> STO
//! seller/{user_id}/_/{doc}/...              -> {doc} (translated), with inventory refinements
//! reports/{kind}/{seller_id}/...            -> sales-performance | availability | soa
//! reports/{kind}/_/{seller_id}/...          -> movement_invoice | daily-ageing
//! ```
//!
//! Classification never fails hard: anything that does not fit a rule becomes a
//! [`SkipReason`] and is logged.

use std::collections::{HashMap, HashSet};
use std::num::ParseIntError;

use thiserror::Error;
use tracing::{debug, warn};

use crate::contract::Document;

/// Root folder that is never migrated.
pub const EXCLUDED_ROOT: &str = "tax";

const STO_ROOT: &str = "sto_zips";
const SELLER_ROOT: &str = "seller";
const REPORTS_ROOT: &str = "reports";

const DASHBOARD_TOKEN: &str = "active_sellers";
const INTERNAL_DASHBOARD: &str = "INTERNAL_DASHBOARD";
const INVENTORY_TOKEN: &str = "inventory";
const SOH_SHEET: &str = "SOH_SHEET";
const SOH_SHEET_FILENAME: &str = "InventoryData.xlsx";
const BULK_STO: &str = "BULK_STO";
const BULK_SHIPMENT_PREFIX: &str = "SELLER_BULK_SHIPMENT";

/// Report kinds whose seller id sits directly under the kind folder.
const SHALLOW_REPORTS: [&str; 3] = ["sales-performance", "availability", "soa"];
/// Report kinds with one extra folder between the kind and the seller id.
const DEEP_REPORTS: [&str; 2] = ["movement_invoice", "daily-ageing"];

const COMMON_FOLDERS: [&str; 4] = [
    "iocc",
    "ownership_documents",
    "terms_and_condition",
    "search_insights",
];

const DOCUMENT_TYPES: [(&str, &str); 24] = [
    ("iocc", "IOCC"),
    ("ownership_documents", "OWNERSHIP"),
    ("terms_and_condition", "T_AND_C"),
    ("search_insights", "SEARCH_INSIGHTS"),
    ("sto_zips", "STO"),
    ("payout", "PAYOUT"),
    ("GST", "GST"),
    ("PAN", "PAN"),
    ("FSSAI", "FSSAI"),
    ("Brand_Authorization", "Brand_Authorization"),
    ("Brand_Trademark", "Brand_Trademark"),
    ("Brand_Logo", "Brand_Logo"),
    ("ARN_Certificate", "ARN_Certificate"),
    ("Digital_Signature", "Digital_Signature"),
    ("CIN", "CIN"),
    ("MSME", "MSME"),
    ("Cancelled_Cheque", "Cancelled_Cheque"),
    ("noc", "NOC"),
    ("serviceability", "SERVICEABILITY"),
    ("soa", "SOA"),
    ("availability", "AVAILABILITY"),
    ("daily-ageing", "DAILY_AGEING"),
    ("movement_invoice", "MOVEMENT_INVOICE"),
    ("sales-performance", "SALES_PERFORMANCE"),
];

/// Why a key produced no document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("root folder `{0}` is excluded from migration")]
    ExcludedRoot(String),
    #[error("root folder `{0}` has no classification rule")]
    UnsupportedRoot(String),
    #[error("`{root}` keys need at least {required} segments, found {found}")]
    TooFewSegments {
        root: &'static str,
        required: usize,
        found: usize,
    },
    #[error("report kind `{0}` has no classification rule")]
    UnsupportedReportKind(String),
    #[error("{field} `{value}` is not a valid integer: {source}")]
    InvalidIdentifier {
        field: &'static str,
        value: String,
        source: ParseIntError,
    },
}

/// Outcome of classifying one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Document(Document),
    Skip(SkipReason),
}

impl Classification {
    pub fn into_document(self) -> Option<Document> {
        match self {
            Classification::Document(doc) => Some(doc),
            Classification::Skip(_) => None,
        }
    }
}

/// Lookup tables for document types and common folders.
#[derive(Debug, Clone)]
pub struct DocumentRules {
    document_types: HashMap<&'static str, &'static str>,
    common_folders: HashSet<&'static str>,
}

impl Default for DocumentRules {
    fn default() -> Self {
        Self {
            document_types: DOCUMENT_TYPES.into_iter().collect(),
            common_folders: COMMON_FOLDERS.into_iter().collect(),
        }
    }
}

impl DocumentRules {
    /// Registry document type for a folder or token, if one is defined.
    pub fn document_type(&self, token: &str) -> Option<&'static str> {
        self.document_types.get(token).copied()
    }

    /// Fixed document type when `root` is a common folder.
    pub fn common_type(&self, root: &str) -> Option<&'static str> {
        if self.common_folders.contains(root) {
            self.document_type(root)
        } else {
            None
        }
    }

    pub fn common_folders(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.common_folders.iter().copied()
    }
}

/// Which owner identifier a branch captured, still in string form.
enum Owner<'a> {
    User(&'a str),
    Seller(&'a str),
}

/// Classifies storage keys using a rule table built once at construction.
#[derive(Debug, Clone, Default)]
pub struct KeyClassifier {
    rules: DocumentRules,
}

impl KeyClassifier {
    pub fn new(rules: DocumentRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &DocumentRules {
        &self.rules
    }

    /// Classify a single key, logging the reason when it is skipped.
    pub fn classify(&self, key: &str) -> Classification {
        match self.resolve(key) {
            Ok(doc) => {
                debug!(key, document_type = %doc.document_type, "Classified key");
                Classification::Document(doc)
            }
            Err(reason @ SkipReason::ExcludedRoot(_)) => {
                debug!(key, %reason, "Skipping excluded key");
                Classification::Skip(reason)
            }
            Err(reason) => {
                warn!(key, %reason, "Skipping unclassifiable key");
                Classification::Skip(reason)
            }
        }
    }

    fn resolve(&self, key: &str) -> Result<Document, SkipReason> {
        let parts: Vec<&str> = key.split('/').collect();
        let root = parts.first().copied().unwrap_or_default();

        if root == EXCLUDED_ROOT {
            return Err(SkipReason::ExcludedRoot(root.to_owned()));
        }

        // Common folders win over any dedicated branch with the same name.
        if let Some(document_type) = self.rules.common_type(root) {
            return Ok(Document::new(document_type, key));
        }

        let (document_type, owner) = match root {
            STO_ROOT => self.inventory_transfer(&parts)?,
            SELLER_ROOT => self.seller(&parts)?,
            REPORTS_ROOT => self.report(&parts)?,
            other => return Err(SkipReason::UnsupportedRoot(other.to_owned())),
        };

        let mut doc = Document::new(document_type, key);
        match owner {
            Owner::User(raw) => doc.user_id = Some(parse_id("user id", raw)?),
            Owner::Seller(raw) => doc.seller_id = Some(parse_id("seller id", raw)?),
        }
        Ok(doc)
    }

    fn inventory_transfer<'a>(&self, parts: &[&'a str]) -> Result<(String, Owner<'a>), SkipReason> {
        require_segments(STO_ROOT, parts, 2)?;
        let document_type = self.rules.document_type(STO_ROOT).unwrap_or(STO_ROOT);
        Ok((document_type.to_owned(), Owner::Seller(parts[1])))
    }

    fn seller<'a>(&self, parts: &[&'a str]) -> Result<(String, Owner<'a>), SkipReason> {
        require_segments(SELLER_ROOT, parts, 4)?;
        let token = parts[3];
        let mut document_type = self.rules.document_type(token).unwrap_or(token);

        if document_type == DASHBOARD_TOKEN {
            document_type = INTERNAL_DASHBOARD;
        }
        if document_type == INVENTORY_TOKEN {
            match parts.len() {
                7 if parts[6] == SOH_SHEET_FILENAME => document_type = SOH_SHEET,
                6 if parts[5].starts_with(BULK_SHIPMENT_PREFIX) => document_type = BULK_STO,
                _ => {}
            }
        }

        Ok((document_type.to_owned(), Owner::User(parts[1])))
    }

    fn report<'a>(&self, parts: &[&'a str]) -> Result<(String, Owner<'a>), SkipReason> {
        require_segments(REPORTS_ROOT, parts, 4)?;
        let kind = parts[1];
        let seller = if SHALLOW_REPORTS.contains(&kind) {
            parts[2]
        } else if DEEP_REPORTS.contains(&kind) {
            parts[3]
        } else {
            return Err(SkipReason::UnsupportedReportKind(kind.to_owned()));
        };
        let document_type = self
            .rules
            .document_type(kind)
            .ok_or_else(|| SkipReason::UnsupportedReportKind(kind.to_owned()))?;
        Ok((document_type.to_owned(), Owner::Seller(seller)))
    }
}

fn require_segments(root: &'static str, parts: &[&str], required: usize) -> Result<(), SkipReason> {
    if parts.len() < required {
        return Err(SkipReason::TooFewSegments {
            root,
            required,
            found: parts.len(),
        });
    }
    Ok(())
}

fn parse_id(field: &'static str, raw: &str) -> Result<i64, SkipReason> {
    raw.parse::<i64>()
        .map_err(|source| SkipReason::InvalidIdentifier {
            field,
            value: raw.to_owned(),
            source,
        })
}
