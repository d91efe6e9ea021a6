use crate::core::extract::{extract_cpu_rows, extract_document_date, file_stem_from_url};
use crate::domain::model::{
    CpuRecord, ManifestEntry, PageCapture, Snapshot, SnapshotBatch, SnapshotDocument, Vendor,
    MANIFEST_FILE,
};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Stage 1: fetch the configured release pages, extract each supported-CPU
/// table into a validated snapshot, and persist one JSON + one CSV file per
/// release plus the ordered manifest.
pub struct SnapshotPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> SnapshotPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    fn snapshot_csv(snapshot: &Snapshot) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["model", "manufacturer", "brand"])?;
        for (model_key, meta) in snapshot.records() {
            let manufacturer = meta.manufacturer.to_string();
            writer.write_record([
                model_key.as_str(),
                manufacturer.as_str(),
                meta.brand.as_str(),
            ])?;
        }
        writer
            .into_inner()
            .map_err(|e| EtlError::ProcessingError {
                message: format!("CSV buffer error: {}", e),
            })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SnapshotPipeline<S, C> {
    type Raw = PageCapture;
    type Transformed = SnapshotBatch;

    /// 以設定的並發上限抓取所有頁面，結果保持配置中的順序。
    async fn extract(&self) -> Result<Vec<PageCapture>> {
        let sources: Vec<_> = self.config.releases().to_vec();
        let limit = self.config.concurrent_requests().max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut join_set = JoinSet::new();

        for (index, source) in sources.into_iter().enumerate() {
            let client = self.client.clone();
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                let _permit =
                    semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| EtlError::ProcessingError {
                            message: "fetch semaphore closed".to_string(),
                        })?;

                tracing::debug!("Fetching {} ({})", source.label, source.url);
                let response = client
                    .get(&source.url)
                    .send()
                    .await?
                    // A missing page means an incomplete series, which would
                    // silently skew the master set: abort instead.
                    .error_for_status()?;
                let html = response.text().await?;

                Ok::<_, EtlError>((index, PageCapture { source, html }))
            });
        }

        let mut captures: Vec<Option<PageCapture>> =
            (0..self.config.releases().len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            let (index, capture) = joined.map_err(|e| EtlError::ProcessingError {
                message: format!("fetch task failed: {}", e),
            })??;
            captures[index] = Some(capture);
        }

        captures
            .into_iter()
            .map(|capture| {
                capture.ok_or_else(|| EtlError::ProcessingError {
                    message: "fetch task produced no result".to_string(),
                })
            })
            .collect()
    }

    async fn transform(&self, pages: Vec<PageCapture>) -> Result<SnapshotBatch> {
        let mut documents = Vec::with_capacity(pages.len());

        for page in pages {
            let rows = extract_cpu_rows(&page.html);
            if rows.is_empty() {
                return Err(EtlError::MalformedSnapshotError {
                    release: page.source.label.clone(),
                    reason: "no supported-CPU table rows found on the page".to_string(),
                });
            }

            let mut records = Vec::with_capacity(rows.len());
            for row in rows {
                let manufacturer: Vendor = row.manufacturer.parse().map_err(|_| {
                    EtlError::MalformedSnapshotError {
                        release: page.source.label.clone(),
                        reason: format!("unrecognized manufacturer '{}'", row.manufacturer),
                    }
                })?;
                records.push(CpuRecord {
                    model_key: row.model_key,
                    manufacturer,
                    brand: row.brand,
                });
            }

            // 驗證關卡：空鍵、重複鍵、異廠商列在此被拒絕
            let snapshot =
                Snapshot::from_records(page.source.label.clone(), page.source.vendor, records)?;

            let document_date = extract_document_date(&page.html);
            let mut file_stem = file_stem_from_url(&page.source.url)?;
            if let Some(date) = document_date {
                file_stem = format!("{}-{}", file_stem, date.format("%Y-%m-%d"));
            }

            tracing::info!(
                "{} [{}]: {} supported models",
                page.source.label,
                page.source.vendor,
                snapshot.len()
            );

            documents.push(SnapshotDocument {
                source: page.source,
                snapshot,
                document_date,
                file_stem,
            });
        }

        Ok(SnapshotBatch { documents })
    }

    async fn load(&self, batch: SnapshotBatch) -> Result<String> {
        let mut manifest = Vec::with_capacity(batch.documents.len());

        for document in &batch.documents {
            let json_name = format!("{}.json", document.file_stem);
            let json_data = serde_json::to_vec_pretty(document.snapshot.records())?;
            self.storage.write_file(&json_name, &json_data).await?;

            let csv_name = format!("{}.csv", document.file_stem);
            let csv_data = Self::snapshot_csv(&document.snapshot)?;
            self.storage.write_file(&csv_name, &csv_data).await?;

            tracing::debug!("Wrote {} and {}", json_name, csv_name);

            manifest.push(ManifestEntry {
                label: document.source.label.clone(),
                vendor: document.source.vendor,
                file: json_name,
                document_date: document.document_date,
            });
        }

        // 清單保持配置順序；分析階段依賴它而非檔名排序
        let manifest_data = serde_json::to_vec_pretty(&manifest)?;
        self.storage.write_file(MANIFEST_FILE, &manifest_data).await?;

        Ok(self.config.output_path().to_string())
    }
}
