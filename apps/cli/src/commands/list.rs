//! list 命令

use anyhow::Result;
use mogo_auton::Routine;

/// 列出内置程序
pub fn execute() -> Result<()> {
    println!("📋 内置程序:");
    for routine in Routine::ALL {
        let script = routine.script()?;
        let marker = if routine == Routine::DEFAULT { " (default)" } else { "" };
        println!(
            "  {:<12} {:>3} 步  {:>2}s{}",
            routine.name(),
            script.steps.len(),
            routine.period_limit().as_secs(),
            marker
        );
        if !script.description.is_empty() {
            println!("               {}", script.description);
        }
    }
    Ok(())
}
