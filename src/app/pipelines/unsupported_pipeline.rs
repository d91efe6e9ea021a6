use crate::core::engine::DiscontinuationEngine;
use crate::domain::model::{
    CpuMeta, CpuRecord, ManifestEntry, Snapshot, SnapshotSeries, Vendor, VendorReport,
    MANIFEST_FILE,
};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{EtlError, Result};
use std::collections::BTreeMap;

/// Stage 2: read the ordered snapshot manifest, assemble one
/// [`SnapshotSeries`] per vendor, run the discontinuation engine, and export
/// the master set plus step statistics per vendor.
pub struct UnsupportedPipeline<S: Storage> {
    snapshot_storage: S,
    output_storage: S,
    output_path: String,
}

impl<S: Storage> UnsupportedPipeline<S> {
    pub fn new(snapshot_storage: S, output_storage: S, output_path: String) -> Self {
        Self {
            snapshot_storage,
            output_storage,
            output_path,
        }
    }

    async fn load_snapshot(&self, entry: &ManifestEntry) -> Result<Snapshot> {
        let data = self.snapshot_storage.read_file(&entry.file).await?;
        let records: BTreeMap<String, CpuMeta> = serde_json::from_slice(&data)?;

        let records = records
            .into_iter()
            .map(|(model_key, meta)| CpuRecord {
                model_key,
                manufacturer: meta.manufacturer,
                brand: meta.brand,
            })
            .collect();

        // Snapshot files are hand-editable; run them through the same gate as
        // freshly extracted data.
        Snapshot::from_records(entry.label.clone(), entry.vendor, records)
    }

    fn step_report_csv(report: &VendorReport) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for step in &report.steps {
            writer.serialize(step)?;
        }
        writer
            .into_inner()
            .map_err(|e| EtlError::ProcessingError {
                message: format!("CSV buffer error: {}", e),
            })
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for UnsupportedPipeline<S> {
    type Raw = SnapshotSeries;
    type Transformed = Vec<VendorReport>;

    async fn extract(&self) -> Result<Vec<SnapshotSeries>> {
        let manifest_data = self.snapshot_storage.read_file(MANIFEST_FILE).await?;
        let entries: Vec<ManifestEntry> = serde_json::from_slice(&manifest_data)?;

        if entries.is_empty() {
            return Err(EtlError::InvalidInputError {
                message: "snapshot manifest is empty; run the snapshot stage first".to_string(),
            });
        }

        // Group by vendor, preserving manifest order within each group. The
        // manifest order is the chronological order; nothing is re-sorted.
        let mut groups: Vec<(Vendor, Vec<ManifestEntry>)> = Vec::new();
        for entry in entries {
            match groups.iter_mut().find(|(vendor, _)| *vendor == entry.vendor) {
                Some((_, group)) => group.push(entry),
                None => groups.push((entry.vendor, vec![entry])),
            }
        }

        let mut series_list = Vec::with_capacity(groups.len());
        for (vendor, group) in groups {
            let mut snapshots = Vec::with_capacity(group.len());
            for entry in &group {
                let snapshot = self.load_snapshot(entry).await?;
                tracing::info!(
                    "{} [{}]: {} supported models",
                    entry.label,
                    vendor,
                    snapshot.len()
                );
                snapshots.push(snapshot);
            }
            series_list.push(SnapshotSeries::new(vendor, snapshots)?);
        }

        Ok(series_list)
    }

    async fn transform(&self, series_list: Vec<SnapshotSeries>) -> Result<Vec<VendorReport>> {
        let mut reports = Vec::with_capacity(series_list.len());

        for series in &series_list {
            let (master, steps) = DiscontinuationEngine::compute(series)?;

            for step in &steps {
                tracing::info!(
                    "{:<20} supported: {:>4}  unsupported: {:>4}  master: {:>4}  added: {:>4}",
                    step.release_label,
                    step.total_supported,
                    step.unsupported_this_step,
                    step.master_size_after_step,
                    step.added_this_step
                );
            }
            tracing::info!(
                "Total unsupported {} CPU's: {:>4}",
                series.vendor(),
                master.len()
            );

            reports.push(VendorReport { master, steps });
        }

        Ok(reports)
    }

    async fn load(&self, reports: Vec<VendorReport>) -> Result<String> {
        for report in &reports {
            let slug = report.master.vendor().slug();

            let master_name = format!("master_unsupported_{}.json", slug);
            let master_data = serde_json::to_vec_pretty(report.master.entries())?;
            self.output_storage.write_file(&master_name, &master_data).await?;

            let steps_name = format!("step_report_{}.csv", slug);
            let steps_data = Self::step_report_csv(report)?;
            self.output_storage.write_file(&steps_name, &steps_data).await?;

            tracing::info!(
                "{} CPU's not supported by the latest release: {} ({})",
                report.master.vendor(),
                report.master.len(),
                master_name
            );
            for model_key in report.master.model_keys() {
                tracing::debug!("{}", model_key);
            }
        }

        Ok(self.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put_file(&self, path: &str, data: &[u8]) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn snapshot_json(models: &[(&str, &str, &str)]) -> Vec<u8> {
        let mut map = serde_json::Map::new();
        for (model, manufacturer, brand) in models {
            map.insert(
                model.to_string(),
                serde_json::json!({"Manufacturer": manufacturer, "Brand": brand}),
            );
        }
        serde_json::to_vec_pretty(&map).unwrap()
    }

    fn manifest_json(entries: &[(&str, &str, &str)]) -> Vec<u8> {
        let entries: Vec<serde_json::Value> = entries
            .iter()
            .map(|(label, vendor, file)| {
                serde_json::json!({
                    "label": label,
                    "vendor": vendor,
                    "file": file,
                    "document_date": null,
                })
            })
            .collect();
        serde_json::to_vec_pretty(&entries).unwrap()
    }

    async fn seeded_storage() -> MockStorage {
        let storage = MockStorage::new();

        // Intel: A supported in 22h2 only, B in both; AMD: C dropped.
        storage
            .put_file(
                "windows-10-22h2-intel.json",
                &snapshot_json(&[("A", "Intel", "Core"), ("B", "Intel", "Core")]),
            )
            .await;
        storage
            .put_file(
                "windows-11-24h2-intel.json",
                &snapshot_json(&[("B", "Intel", "Core")]),
            )
            .await;
        storage
            .put_file(
                "windows-10-22h2-amd.json",
                &snapshot_json(&[("C", "AMD", "Ryzen"), ("D", "AMD", "Ryzen")]),
            )
            .await;
        storage
            .put_file(
                "windows-11-24h2-amd.json",
                &snapshot_json(&[("D", "AMD", "Ryzen")]),
            )
            .await;
        storage
            .put_file(
                MANIFEST_FILE,
                &manifest_json(&[
                    ("windows-10-22h2", "Intel", "windows-10-22h2-intel.json"),
                    ("windows-10-22h2", "AMD", "windows-10-22h2-amd.json"),
                    ("windows-11-24h2", "Intel", "windows-11-24h2-intel.json"),
                    ("windows-11-24h2", "AMD", "windows-11-24h2-amd.json"),
                ]),
            )
            .await;

        storage
    }

    #[tokio::test]
    async fn test_extract_builds_one_series_per_vendor_in_manifest_order() {
        let storage = seeded_storage().await;
        let pipeline =
            UnsupportedPipeline::new(storage.clone(), storage, ".".to_string());

        let series_list = pipeline.extract().await.unwrap();

        assert_eq!(series_list.len(), 2);
        assert_eq!(series_list[0].vendor(), Vendor::Intel);
        assert_eq!(series_list[1].vendor(), Vendor::Amd);

        let intel = &series_list[0];
        assert_eq!(intel.snapshots().len(), 2);
        assert_eq!(intel.snapshots()[0].release_label(), "windows-10-22h2");
        assert_eq!(intel.snapshots()[1].release_label(), "windows-11-24h2");
    }

    #[tokio::test]
    async fn test_extract_fails_on_missing_manifest() {
        let storage = MockStorage::new();
        let pipeline =
            UnsupportedPipeline::new(storage.clone(), storage, ".".to_string());

        let result = pipeline.extract().await;
        assert!(matches!(result, Err(EtlError::IoError(_))));
    }

    #[tokio::test]
    async fn test_extract_fails_on_empty_manifest() {
        let storage = MockStorage::new();
        storage.put_file(MANIFEST_FILE, b"[]").await;
        let pipeline =
            UnsupportedPipeline::new(storage.clone(), storage, ".".to_string());

        let result = pipeline.extract().await;
        assert!(matches!(result, Err(EtlError::InvalidInputError { .. })));
    }

    #[tokio::test]
    async fn test_transform_computes_master_per_vendor() {
        let storage = seeded_storage().await;
        let pipeline =
            UnsupportedPipeline::new(storage.clone(), storage, ".".to_string());

        let series_list = pipeline.extract().await.unwrap();
        let reports = pipeline.transform(series_list).await.unwrap();

        assert_eq!(reports.len(), 2);

        let intel = &reports[0];
        assert_eq!(intel.master.vendor(), Vendor::Intel);
        let intel_keys: Vec<&str> = intel.master.model_keys().collect();
        assert_eq!(intel_keys, vec!["A"]);
        assert_eq!(intel.steps.len(), 2);
        assert_eq!(intel.steps[1].unsupported_this_step, 0);

        let amd = &reports[1];
        let amd_keys: Vec<&str> = amd.master.model_keys().collect();
        assert_eq!(amd_keys, vec!["C"]);
    }

    #[tokio::test]
    async fn test_load_writes_master_and_step_report() {
        let snapshot_storage = seeded_storage().await;
        let output_storage = MockStorage::new();
        let pipeline = UnsupportedPipeline::new(
            snapshot_storage,
            output_storage.clone(),
            "out".to_string(),
        );

        let series_list = pipeline.extract().await.unwrap();
        let reports = pipeline.transform(series_list).await.unwrap();
        let output = pipeline.load(reports).await.unwrap();
        assert_eq!(output, "out");

        let master = output_storage
            .get_file("master_unsupported_intel.json")
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&master).unwrap();
        assert_eq!(parsed["A"]["Manufacturer"], "Intel");
        assert!(parsed.get("B").is_none());

        let amd_master = output_storage
            .get_file("master_unsupported_amd.json")
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&amd_master).unwrap();
        assert_eq!(parsed["C"]["Manufacturer"], "AMD");

        let steps = output_storage
            .get_file("step_report_intel.csv")
            .await
            .unwrap();
        let steps_text = String::from_utf8(steps).unwrap();
        assert!(steps_text.starts_with(
            "release_label,total_supported,unsupported_this_step,master_size_after_step,added_this_step"
        ));
        assert!(steps_text.contains("windows-10-22h2,2,1,1,1"));
        assert!(steps_text.contains("windows-11-24h2,1,0,1,0"));
    }

    #[tokio::test]
    async fn test_malformed_snapshot_file_is_rejected() {
        let storage = MockStorage::new();
        storage
            .put_file(
                MANIFEST_FILE,
                &manifest_json(&[("windows-11-24h2", "Intel", "bad.json")]),
            )
            .await;
        // AMD row inside a manifest entry declared Intel.
        storage
            .put_file("bad.json", &snapshot_json(&[("3015e", "AMD", "Ryzen")]))
            .await;

        let pipeline =
            UnsupportedPipeline::new(storage.clone(), storage, ".".to_string());

        let result = pipeline.extract().await;
        assert!(matches!(
            result,
            Err(EtlError::MalformedSnapshotError { .. })
        ));
    }
}
