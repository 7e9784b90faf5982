use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spendlens_core::{Classifier, Rule};
use spendlens_ingest::{CommandExtractor, PdfTextExtractor, TextExtractor};
use spendlens_report::{Analyzer, ReportFormat};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::state::{default_config_path, ensure_spendlens_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extractor: ExtractorSection,
    pub server: ServerSection,
    pub report: ReportFormat,
    /// Extra keyword rules, tried before the built-in table.
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorBackend {
    /// In-process text extraction
    #[default]
    Builtin,
    /// External tool that prints page text to stdout
    Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSection {
    pub backend: ExtractorBackend,

    /// For backend = "command": program to run (default: "pdftotext")
    pub command: String,
    /// For backend = "command": args before the password flag and file path
    pub args: Vec<String>,
    /// For backend = "command": flag that precedes the PDF password
    pub password_flag: Option<String>,

    pub timeout_secs: u64,
}

impl Default for ExtractorSection {
    fn default() -> Self {
        let pdftotext = CommandExtractor::pdftotext();
        Self {
            backend: ExtractorBackend::Builtin,
            command: pdftotext.program.display().to_string(),
            args: pdftotext.args,
            password_flag: pdftotext.password_flag,
            timeout_secs: 30,
        }
    }
}

impl ExtractorSection {
    pub fn build(&self) -> Arc<dyn TextExtractor> {
        match self.backend {
            ExtractorBackend::Builtin => Arc::new(PdfTextExtractor),
            ExtractorBackend::Command => Arc::new(
                CommandExtractor::new(&self.command, self.args.clone())
                    .with_password_flag(self.password_flag.clone()),
            ),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub max_upload_mb: usize,
    /// Extra attempts when the extractor process cannot be started.
    pub spawn_retries: u32,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            max_upload_mb: 20,
            spawn_retries: 2,
        }
    }
}

impl ServerSection {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl Config {
    pub fn classifier(&self) -> Result<Classifier> {
        Classifier::with_overrides(&self.rules).context("compile [[rules]] keywords")
    }

    pub fn analyzer(&self) -> Result<Analyzer> {
        Ok(
            Analyzer::new(self.extractor.build(), Arc::new(self.classifier()?))
                .with_format(self.report.clone())
                .with_extraction_timeout(self.extractor.timeout()),
        )
    }
}

pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

/// Missing file means defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let p = config_path(explicit)?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config, explicit: Option<&Path>) -> Result<PathBuf> {
    let p = match explicit {
        Some(p) => p.to_path_buf(),
        None => ensure_spendlens_home()?.join("config.toml"),
    };
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_config(explicit: Option<&Path>) -> Result<()> {
    let p = config_path(explicit)?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let written = save_config(&Config::default(), explicit)?;
    println!("Wrote {}", written.display());
    Ok(())
}
