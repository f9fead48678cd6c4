//! # Tilt Viewer
//!
//! 串口 IMU 姿态查看器：
//!
//! ```bash
//! # 默认配置（38400 波特，60Hz 刷新）
//! tilt-viewer /dev/ttyUSB0
//!
//! # 覆盖波特率与刷新率
//! tilt-viewer /dev/ttyUSB0 --baud 115200 --rate 30
//!
//! # 配置文件
//! tilt-viewer /dev/ttyUSB0 --config viewer.toml
//! ```
//!
//! 进程退出码：未指定设备打印用法并以 0 退出；设备打开失败以非零退出。
//! Ctrl+C 请求关闭：展示循环先退出，随后摄取线程被停止并 join——
//! 不留孤儿线程，收尾开始后不再触碰传输句柄。

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tilt_driver::Ingestor;
use tilt_serial::SerialLineTransport;
use tracing::info;

mod config;
mod pose;
mod present;
mod sink;

use config::ViewerConfig;
use present::{PresentConfig, run_present_loop};
use sink::ConsoleSink;

/// Tilt Viewer - 串口 IMU 姿态查看器
#[derive(Parser, Debug)]
#[command(name = "tilt-viewer")]
#[command(about = "Render IMU orientation telemetry from a serial device", long_about = None)]
#[command(version)]
struct Cli {
    /// 遥测设备路径（如 /dev/ttyUSB0）
    device: Option<String>,

    /// 波特率（覆盖配置文件）
    #[arg(long)]
    baud: Option<u32>,

    /// 展示刷新率 Hz（覆盖配置文件）
    #[arg(long)]
    rate: Option<f64>,

    /// 配置文件路径（TOML）
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tilt_viewer=info".parse().unwrap())
                .add_directive("tilt_driver=info".parse().unwrap())
                .add_directive("tilt_serial=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    // 未指定设备不是错误：打印用法，退出码 0
    let Some(device) = cli.device else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(baud) = cli.baud {
        config.serial.baud = baud;
    }
    if let Some(rate) = cli.rate {
        config.display.rate_hz = rate;
    }

    // 打开失败在进程边界报告，退出码非零
    let transport = SerialLineTransport::open(&device, &config.serial_config())
        .with_context(|| format!("cannot open telemetry device {device}"))?;

    // 先起摄取线程，展示循环再开始自己的节拍
    let ingestor = Ingestor::spawn(transport, config.ingest_config());

    let close_requested = Arc::new(AtomicBool::new(false));
    {
        let close = close_requested.clone();
        ctrlc::set_handler(move || {
            // Release: pairs with the present loop's Acquire load
            close.store(true, Ordering::Release);
        })?;
    }

    info!(device = %device, rate_hz = config.display.rate_hz, "viewer started");

    let mut sink = ConsoleSink;
    let ticks = run_present_loop(
        &ingestor.context(),
        &mut sink,
        &config.display.axis_map,
        &PresentConfig {
            rate_hz: config.display.rate_hz,
            max_ticks: None,
        },
        &close_requested,
    )?;

    let metrics = ingestor.metrics();
    info!(
        ticks,
        lines = metrics.lines_total,
        published = metrics.publishes,
        dropped = metrics.decode_failures,
        "session finished"
    );

    // 展示循环退出后：请求停止、限时 join 摄取线程
    ingestor.shutdown(Duration::from_secs(2))?;

    Ok(())
}
