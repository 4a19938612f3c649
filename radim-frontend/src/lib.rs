pub mod cli;
pub mod errors;
pub mod recent;

use std::io::{self, BufRead};

use errors::FrontendError;
use radim_config::AppConfig;
use tracing::{info, warn};

use cli::{DEMO_SCRIPT, Session};

/// 在内置示例图面上执行演示脚本，并打印结果概览。
pub fn run_demo(config: &AppConfig) -> Result<(), FrontendError> {
    info!("启动半径标注演示");
    let mut session = Session::new(&config.drawing, config.frontend.history_size);
    let ids = session.populate_demo();

    println!("已构建内置示例图元：");
    println!("  - 基础线段 ID = {}", ids.baseline.get());
    println!("  - 标注圆 ID = {}", ids.circle.get());
    println!("  - 圆弧 ID = {}", ids.arc.get());
    println!("  - 文字 ID = {}", ids.label.get());

    let committed = session.run_script(DEMO_SCRIPT);
    info!(count = committed.len(), "演示脚本执行完毕");
    session.print_summary();
    Ok(())
}

/// 从标准输入逐行读取脚本，直到输入结束。
pub fn run_interactive(config: &AppConfig) -> Result<(), FrontendError> {
    info!("启动交互模式");
    let mut session = Session::new(&config.drawing, config.frontend.history_size);
    session.populate_demo();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if let Err(err) = session.execute(&line) {
            warn!(error = %err, "脚本行执行失败");
            println!("[错误] {err}");
        }
    }
    session.print_summary();
    Ok(())
}
