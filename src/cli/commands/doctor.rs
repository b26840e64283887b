//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{Provider, Settings};
use crate::ollama::OllamaClient;
use console::style;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Primer Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    let tools = vec![check_tool(&settings.youtube.ytdlp_path, install_hint_ytdlp())];
    section("External Tools", &tools);
    checks.extend(tools);

    let backends = check_backends(settings).await;
    section("Model Backends", &backends);
    checks.extend(backends);

    let dirs = check_directories(settings);
    section("Directories", &dirs);
    checks.extend(dirs);

    let config = vec![check_config_file(config_path)];
    section("Configuration", &config);
    checks.extend(config);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Primer.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Primer is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .chars()
                .take(50)
                .collect::<String>();
            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check each provider in use once.
async fn check_backends(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();
    let providers = [settings.embedding.provider, settings.llm.provider];

    if providers.contains(&Provider::Ollama) {
        results.push(check_ollama(settings).await);
    }
    if providers.contains(&Provider::OpenAI) {
        results.push(check_openai_api_key());
    }

    results.push(CheckResult::ok(
        "Models",
        &format!(
            "embedding {} ({}), llm {} ({})",
            settings.embedding.model,
            settings.embedding.provider,
            settings.llm.model,
            settings.llm.provider
        ),
    ));

    results
}

async fn check_ollama(settings: &Settings) -> CheckResult {
    let client = match OllamaClient::new(&settings.ollama, Duration::from_secs(5)) {
        Ok(client) => client,
        Err(e) => return CheckResult::error("Ollama", &e.to_string(), "Check ollama.base_url"),
    };

    if client.is_reachable().await {
        CheckResult::ok("Ollama", &format!("reachable at {}", client.base_url()))
    } else {
        CheckResult::error(
            "Ollama",
            &format!("no response from {}", client.base_url()),
            "Start it with: ollama serve",
        )
    }
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask_key(&key)))
        }
        Ok(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check data directories and the persisted index.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = vec![
        check_writable("Data directory", &settings.data_dir()),
        check_writable("PDF directory", &settings.pdf_dir()),
    ];

    let index_path = settings.index_path();
    if index_path.exists() {
        let size = std::fs::metadata(&index_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Index",
            &format!("{} ({})", index_path.display(), size),
        ));
    } else {
        results.push(CheckResult::warning(
            "Index",
            &format!("{} (not created yet)", index_path.display()),
            "Created on the first upload",
        ));
    }

    results
}

fn check_writable(name: &str, dir: &Path) -> CheckResult {
    if !dir.exists() {
        return CheckResult::warning(
            name,
            &format!("{} (will be created)", dir.display()),
            "Directory will be created on first use",
        );
    }

    match tempfile::tempfile_in(dir) {
        Ok(_) => CheckResult::ok(name, &dir.display().to_string()),
        Err(e) => CheckResult::error(
            name,
            &format!("{} is not writable: {}", dir.display(), e),
            "Fix permissions or change storage paths in the config",
        ),
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: primer config set <key> <value>",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Keep the first 7 and last 4 characters of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
