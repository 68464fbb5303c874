use anyhow::Result;
use std::path::PathBuf;

use crate::cli::commands::{load_config, Command};
use crate::license::{gate, LicenseGate};

pub struct AuthCommand {
    pub config_path: Option<PathBuf>,
}

impl AuthCommand {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }
}

impl Command for AuthCommand {
    async fn execute(&self) -> Result<()> {
        let config = load_config(self.config_path.as_deref())?;
        let gate = LicenseGate::from_config(&config)?;

        println!("🔐 LICENSE");
        println!("────────────────────");
        let result = gate.initialize().await;
        if result.success {
            println!("✅ Installation is licensed");
        } else {
            for error in &result.errors {
                println!("❌ {error}");
            }
        }

        if let Some(banner) = gate.trial_banner(&config.plugin.name, gate::today()) {
            println!("🕒 {banner}");
        }
        Ok(())
    }
}
