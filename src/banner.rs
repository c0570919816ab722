//! Startup banner and shutdown line.

use std::time::Duration;

use crate::config::GatewayConfig;
use crate::consts::{AUTHOR, HOMEPAGE, REPO, VERSION};

/// Render the startup banner for the given configuration.
pub fn render_banner(config: &GatewayConfig) -> String {
    let worker = match &config.worker.script {
        Some(script) => format!(
            "{} {}",
            config.worker.program.display(),
            script.display()
        ),
        None => config.worker.program.display().to_string(),
    };

    format!(
        r#"
   ╔═══════════════════════════════════════╗
   ║          T E X T G A T E              ║
   ║   text in, one worker out, JSON back  ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   listen    {}
   origin    {}
   worker    {}
   timeout   {}s
"#,
        VERSION,
        AUTHOR,
        HOMEPAGE,
        REPO,
        config.bind_address(),
        config.allowed_origin,
        worker,
        config.worker.timeout.as_secs(),
    )
}

/// Print the startup banner.
pub fn print_banner(config: &GatewayConfig) {
    println!("{}", render_banner(config));
}

/// Print the shutdown line with total uptime.
pub fn print_shutdown(uptime: Duration) {
    println!("served for {}s. goodbye.", uptime.as_secs());
}
