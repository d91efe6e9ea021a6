use clap::Parser;
use win_cpu_etl::config::releases::ReleasesConfig;
use win_cpu_etl::utils::{logger, validation::Validate};
use win_cpu_etl::{CliConfig, EtlEngine, LocalStorage, RunConfig, SnapshotPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("🚀 Starting win-cpu-etl snapshot stage");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證 CLI 配置
    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 載入發行版清單（無檔案時使用內建的 Microsoft 清單）
    let releases = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading release list from: {}", path);
            match ReleasesConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            }
        }
        None => {
            tracing::info!("📁 Using the built-in Microsoft release list");
            ReleasesConfig::builtin()
        }
    };

    if let Err(e) = releases.validate() {
        tracing::error!("❌ Release list validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!(
        "✅ Release list loaded: {} pages, output: {}",
        releases.releases.len(),
        cli.output_path.as_deref().unwrap_or(&releases.load.output_path)
    );

    let monitor_enabled = cli.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // CLI 的輸出路徑優先於配置檔
    let output_path = cli
        .output_path
        .clone()
        .unwrap_or_else(|| releases.load.output_path.clone());
    let config = RunConfig::new(releases.releases, output_path.clone(), cli.concurrent_requests);

    // 創建存儲和管道
    let storage = LocalStorage::new(output_path);
    let pipeline = SnapshotPipeline::new(storage, config);

    // 創建ETL引擎並運行
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Snapshot stage completed successfully!");
            tracing::info!("📁 Snapshots saved to: {}", output_path);
            println!("✅ Snapshot stage completed successfully!");
            println!("📁 Snapshots saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Snapshot stage failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                win_cpu_etl::utils::error::ErrorSeverity::Low => 0,
                win_cpu_etl::utils::error::ErrorSeverity::Medium => 2,
                win_cpu_etl::utils::error::ErrorSeverity::High => 1,
                win_cpu_etl::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
