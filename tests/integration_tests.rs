use httpmock::prelude::*;
use tempfile::TempDir;
use win_cpu_etl::domain::model::{ManifestEntry, ReleaseSource, Vendor, MANIFEST_FILE};
use win_cpu_etl::{EtlEngine, LocalStorage, RunConfig, SnapshotPipeline, UnsupportedPipeline};

fn page(date: &str, rows: &[(&str, &str, &str)]) -> String {
    let mut html = format!(
        r#"<html><body>
        <ul class="metadata page-metadata" data-bi-name="page info">
            <li><local-time datetime="{date}T11:55:00.000Z">{date}</local-time></li>
        </ul>
        <table>
        <tr><th>Manufacturer</th><th>Brand</th><th>Model</th></tr>"#
    );
    for (manufacturer, brand, model) in rows {
        html.push_str(&format!(
            "<tr><td>{manufacturer}</td><td>{brand}</td><td>{model}</td></tr>"
        ));
    }
    html.push_str("</table></body></html>");
    html
}

fn release(label: &str, vendor: Vendor, url: String) -> ReleaseSource {
    ReleaseSource {
        title: None,
        label: label.to_string(),
        vendor,
        url,
    }
}

#[tokio::test]
async fn test_end_to_end_snapshot_and_analysis_stages() {
    let snapshots_dir = TempDir::new().unwrap();
    let snapshots_path = snapshots_dir.path().to_str().unwrap().to_string();

    // Two releases per vendor. For Intel, x5-Z8350 is gone by 24H2; for AMD,
    // FX-8350 is gone. Core brands carry trademark glyphs and footnotes the
    // way the real pages do.
    let server = MockServer::start();
    let old_intel = server.mock(|when, then| {
        when.method(GET)
            .path("/windows-10-22h2-supported-intel-processors");
        then.status(200).body(page(
            "2023-05-23",
            &[
                ("Intel", "Atom®", "x5-Z8350"),
                ("Intel", "Core™ i7[1]", "i7-8700"),
            ],
        ));
    });
    let new_intel = server.mock(|when, then| {
        when.method(GET)
            .path("/windows-11-24h2-supported-intel-processors");
        then.status(200).body(page(
            "2025-02-28",
            &[("Intel", "Core™ i7", "i7-8700")],
        ));
    });
    let old_amd = server.mock(|when, then| {
        when.method(GET)
            .path("/windows-10-22h2-supported-amd-processors");
        then.status(200).body(page(
            "2023-05-23",
            &[("AMD", "FX", "FX-8350"), ("AMD", "Ryzen™ 3", "3015e")],
        ));
    });
    let new_amd = server.mock(|when, then| {
        when.method(GET)
            .path("/windows-11-24h2-supported-amd-processors");
        then.status(200)
            .body(page("2025-04-08", &[("AMD", "Ryzen™ 3", "3015e")]));
    });

    // Stage 1: fetch and persist snapshots.
    let config = RunConfig::new(
        vec![
            release(
                "windows-10-22h2",
                Vendor::Intel,
                server.url("/windows-10-22h2-supported-intel-processors"),
            ),
            release(
                "windows-10-22h2",
                Vendor::Amd,
                server.url("/windows-10-22h2-supported-amd-processors"),
            ),
            release(
                "windows-11-24h2",
                Vendor::Intel,
                server.url("/windows-11-24h2-supported-intel-processors"),
            ),
            release(
                "windows-11-24h2",
                Vendor::Amd,
                server.url("/windows-11-24h2-supported-amd-processors"),
            ),
        ],
        snapshots_path.clone(),
        2,
    );

    let storage = LocalStorage::new(snapshots_path.clone());
    let pipeline = SnapshotPipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    let output = engine.run().await.unwrap();
    assert_eq!(output, snapshots_path);

    old_intel.assert();
    new_intel.assert();
    old_amd.assert();
    new_amd.assert();

    // Snapshot files carry the URL-derived stem plus the document date.
    let old_intel_json = snapshots_dir
        .path()
        .join("windows-10-22h2-intel-2023-05-23.json");
    assert!(old_intel_json.exists());
    assert!(snapshots_dir
        .path()
        .join("windows-10-22h2-intel-2023-05-23.csv")
        .exists());
    assert!(snapshots_dir
        .path()
        .join("windows-11-24h2-amd-2025-04-08.json")
        .exists());

    let parsed: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&old_intel_json).unwrap()).unwrap();
    // Noise stripped before the key/brand are persisted.
    assert_eq!(parsed["x5-Z8350"]["Manufacturer"], "Intel");
    assert_eq!(parsed["i7-8700"]["Brand"], "Core i7");

    // The manifest preserves the configured chronological order.
    let manifest_path = snapshots_dir.path().join(MANIFEST_FILE);
    let entries: Vec<ManifestEntry> =
        serde_json::from_slice(&std::fs::read(&manifest_path).unwrap()).unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].label, "windows-10-22h2");
    assert_eq!(entries[3].label, "windows-11-24h2");

    // Stage 2: analysis over the files stage 1 wrote.
    let output_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_str().unwrap().to_string();

    let pipeline = UnsupportedPipeline::new(
        LocalStorage::new(snapshots_path.clone()),
        LocalStorage::new(output_path.clone()),
        output_path.clone(),
    );
    let engine = EtlEngine::new(pipeline);

    let output = engine.run().await.unwrap();
    assert_eq!(output, output_path);

    let intel_master: serde_json::Value = serde_json::from_slice(
        &std::fs::read(output_dir.path().join("master_unsupported_intel.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(intel_master["x5-Z8350"]["Manufacturer"], "Intel");
    assert!(intel_master.get("i7-8700").is_none());

    let amd_master: serde_json::Value = serde_json::from_slice(
        &std::fs::read(output_dir.path().join("master_unsupported_amd.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(amd_master["FX-8350"]["Manufacturer"], "AMD");
    assert!(amd_master.get("3015e").is_none());

    let steps = std::fs::read_to_string(output_dir.path().join("step_report_intel.csv")).unwrap();
    assert!(steps.contains("windows-10-22h2,2,1,1,1"));
    assert!(steps.contains("windows-11-24h2,1,0,1,0"));
}

#[tokio::test]
async fn test_snapshot_stage_aborts_on_missing_page() {
    let snapshots_dir = TempDir::new().unwrap();
    let snapshots_path = snapshots_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let missing = server.mock(|when, then| {
        when.method(GET)
            .path("/windows-11-24h2-supported-intel-processors");
        then.status(404);
    });

    let config = RunConfig::new(
        vec![release(
            "windows-11-24h2",
            Vendor::Intel,
            server.url("/windows-11-24h2-supported-intel-processors"),
        )],
        snapshots_path.clone(),
        2,
    );

    let storage = LocalStorage::new(snapshots_path.clone());
    let pipeline = SnapshotPipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    let result = engine.run().await;
    assert!(result.is_err());
    missing.assert();

    // All-or-nothing: no manifest was written.
    assert!(!snapshots_dir.path().join(MANIFEST_FILE).exists());
}

#[tokio::test]
async fn test_analysis_stage_without_snapshots_fails_cleanly() {
    let empty_dir = TempDir::new().unwrap();
    let path = empty_dir.path().to_str().unwrap().to_string();

    let pipeline = UnsupportedPipeline::new(
        LocalStorage::new(path.clone()),
        LocalStorage::new(path.clone()),
        path,
    );
    let engine = EtlEngine::new(pipeline);

    let result = engine.run().await;
    assert!(result.is_err());
}
