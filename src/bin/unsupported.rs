use clap::Parser;
use win_cpu_etl::utils::logger;
use win_cpu_etl::{EtlEngine, LocalStorage, UnsupportedPipeline};

#[derive(Parser)]
#[command(name = "unsupported")]
#[command(about = "Compute the CPU models no longer supported by the latest Windows release")]
struct Args {
    /// Directory holding the persisted snapshots and manifest
    #[arg(long, default_value = "./win_cpu")]
    snapshots_path: String,

    /// Directory for the master sets and step reports
    #[arg(long, default_value = ".")]
    output_path: String,

    /// Enable verbose output (also dumps every unsupported model key)
    #[arg(long)]
    verbose: bool,

    /// Log CPU/memory usage per pipeline phase
    #[arg(long)]
    monitor: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting win-cpu-etl analysis stage");
    tracing::info!("📁 Reading snapshots from: {}", args.snapshots_path);

    let monitor_enabled = args.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管道
    let snapshot_storage = LocalStorage::new(args.snapshots_path.clone());
    let output_storage = LocalStorage::new(args.output_path.clone());
    let pipeline =
        UnsupportedPipeline::new(snapshot_storage, output_storage, args.output_path.clone());

    // 創建ETL引擎並運行
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Analysis completed successfully!");
            tracing::info!("📁 Master sets saved to: {}", output_path);
            println!("✅ Analysis completed successfully!");
            println!("📁 Master sets saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
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
