use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Vendor {
    Intel,
    #[serde(rename = "AMD")]
    Amd,
}

impl Vendor {
    /// Lowercase token used in filenames and URL slugs.
    pub fn slug(&self) -> &'static str {
        match self {
            Vendor::Intel => "intel",
            Vendor::Amd => "amd",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::Intel => write!(f, "Intel"),
            Vendor::Amd => write!(f, "AMD"),
        }
    }
}

impl FromStr for Vendor {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intel" => Ok(Vendor::Intel),
            "amd" => Ok(Vendor::Amd),
            other => Err(EtlError::ProcessingError {
                message: format!("Unknown CPU vendor: {}", other),
            }),
        }
    }
}

/// One row of a supported-CPU table after extraction and noise stripping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuRecord {
    pub model_key: String,
    pub manufacturer: Vendor,
    pub brand: String,
}

/// Per-model metadata as persisted in the snapshot JSON files:
/// `{"x7211E": {"Manufacturer": "Intel", "Brand": "Atom"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuMeta {
    #[serde(rename = "Manufacturer")]
    pub manufacturer: Vendor,
    #[serde(rename = "Brand")]
    pub brand: String,
}

/// The supported-CPU set of one vendor in one Windows release.
///
/// Construction goes through [`Snapshot::from_records`], which is the
/// validation gate in front of the engine: empty model keys, duplicate keys
/// and rows for a foreign vendor are rejected there. Once built a snapshot is
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    release_label: String,
    vendor: Vendor,
    records: BTreeMap<String, CpuMeta>,
}

impl Snapshot {
    pub fn from_records(
        release_label: impl Into<String>,
        vendor: Vendor,
        records: Vec<CpuRecord>,
    ) -> Result<Self> {
        let release_label = release_label.into();
        let mut map = BTreeMap::new();

        for record in records {
            if record.model_key.trim().is_empty() {
                return Err(EtlError::MalformedSnapshotError {
                    release: release_label,
                    reason: "empty model key".to_string(),
                });
            }
            if record.manufacturer != vendor {
                return Err(EtlError::MalformedSnapshotError {
                    release: release_label,
                    reason: format!(
                        "record '{}' belongs to {} but snapshot vendor is {}",
                        record.model_key, record.manufacturer, vendor
                    ),
                });
            }
            // Keys are case-sensitive; no folding before the duplicate check.
            let previous = map.insert(
                record.model_key.clone(),
                CpuMeta {
                    manufacturer: record.manufacturer,
                    brand: record.brand,
                },
            );
            if previous.is_some() {
                return Err(EtlError::MalformedSnapshotError {
                    release: release_label,
                    reason: format!("duplicate model key '{}'", record.model_key),
                });
            }
        }

        Ok(Self {
            release_label,
            vendor,
            records: map,
        })
    }

    pub fn release_label(&self) -> &str {
        &self.release_label
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, model_key: &str) -> bool {
        self.records.contains_key(model_key)
    }

    pub fn model_keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Persisted JSON shape: `model_key -> {"Manufacturer", "Brand"}`.
    pub fn records(&self) -> &BTreeMap<String, CpuMeta> {
        &self.records
    }
}

/// Chronologically ordered snapshots of one vendor, oldest first. The last
/// element is the baseline (most recent release).
#[derive(Debug, Clone)]
pub struct SnapshotSeries {
    vendor: Vendor,
    snapshots: Vec<Snapshot>,
}

impl SnapshotSeries {
    pub fn new(vendor: Vendor, snapshots: Vec<Snapshot>) -> Result<Self> {
        if snapshots.is_empty() {
            return Err(EtlError::InvalidInputError {
                message: format!(
                    "{} snapshot series is empty, no baseline release to compare against",
                    vendor
                ),
            });
        }
        for snapshot in &snapshots {
            if snapshot.vendor() != vendor {
                return Err(EtlError::InvalidInputError {
                    message: format!(
                        "snapshot '{}' is a {} snapshot, expected {}",
                        snapshot.release_label(),
                        snapshot.vendor(),
                        vendor
                    ),
                });
            }
        }
        Ok(Self { vendor, snapshots })
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }
}

/// Per-release statistics emitted by the engine, one per input snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub release_label: String,
    pub total_supported: usize,
    pub unsupported_this_step: usize,
    pub master_size_after_step: usize,
    pub added_this_step: usize,
}

/// Master-set entry as persisted: `{"Manufacturer": "Intel"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterEntry {
    #[serde(rename = "Manufacturer")]
    pub manufacturer: Vendor,
}

/// Deduplicated union, across all non-baseline releases, of models absent
/// from the baseline. Keys iterate in lexicographic (ordinal) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterUnsupportedSet {
    vendor: Vendor,
    entries: BTreeMap<String, MasterEntry>,
}

impl MasterUnsupportedSet {
    pub fn new(vendor: Vendor, model_keys: BTreeSet<String>) -> Self {
        let entries = model_keys
            .into_iter()
            .map(|key| (key, MasterEntry { manufacturer: vendor }))
            .collect();
        Self { vendor, entries }
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, model_key: &str) -> bool {
        self.entries.contains_key(model_key)
    }

    pub fn model_keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Persisted JSON shape: `model_key -> {"Manufacturer"}`.
    pub fn entries(&self) -> &BTreeMap<String, MasterEntry> {
        &self.entries
    }
}

/// One configured release page, in chronological position within the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSource {
    pub title: Option<String>,
    pub label: String,
    pub vendor: Vendor,
    pub url: String,
}

/// Raw page markup captured for one release source.
#[derive(Debug, Clone)]
pub struct PageCapture {
    pub source: ReleaseSource,
    pub html: String,
}

/// A validated snapshot together with everything the load phase needs to
/// persist it.
#[derive(Debug, Clone)]
pub struct SnapshotDocument {
    pub source: ReleaseSource,
    pub snapshot: Snapshot,
    pub document_date: Option<NaiveDate>,
    pub file_stem: String,
}

#[derive(Debug, Clone)]
pub struct SnapshotBatch {
    pub documents: Vec<SnapshotDocument>,
}

/// Engine output for one vendor, ready for export.
#[derive(Debug, Clone)]
pub struct VendorReport {
    pub master: MasterUnsupportedSet,
    pub steps: Vec<StepReport>,
}

pub const MANIFEST_FILE: &str = "snapshots-manifest.json";

/// One line of the ordered snapshot manifest. Entry order is the configured
/// (chronological) release order; the analysis stage trusts it instead of
/// sorting filenames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub label: String,
    pub vendor: Vendor,
    pub file: String,
    pub document_date: Option<NaiveDate>,
}
