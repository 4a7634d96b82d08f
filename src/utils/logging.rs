use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\nマイソク转换日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `server`: 转换服务器地址
/// - `mode`: 转换模式
pub fn log_startup(server: &str, mode: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 物件PDF批量转换");
    info!("🌐 转换服务器: {}", server);
    info!("⚙️ 转换模式: {}", mode);
    info!("{}", "=".repeat(60));
}

/// 记录文件加载信息
pub fn log_files_loaded(total: usize, folder: &str) {
    info!("✓ 在 {} 中找到 {} 个文件", folder, total);
    info!("💡 将按文件名顺序逐个处理\n");
}

/// 记录阶段开始信息
///
/// # 参数
/// - `stage`: 阶段名称
/// - `total`: 本阶段文件数
pub fn log_stage_start(stage: &str, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始{}: 共 {} 个文件", stage, total);
    info!("{}", "=".repeat(60));
}

/// 记录阶段完成信息
///
/// # 参数
/// - `stage`: 阶段名称
/// - `success`: 成功数量
/// - `total`: 本阶段文件数
pub fn log_stage_complete(stage: &str, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ {}完成: 成功 {}/{}", stage, success, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 生成成功数量
/// - `failed`: 失败数量
/// - `total`: 文件总数
/// - `output_dir`: PDF 输出目录
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    success: usize,
    failed: usize,
    total: usize,
    output_dir: &str,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("📁 PDF 已保存至: {}", output_dir);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
