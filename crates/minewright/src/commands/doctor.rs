//! `minewright doctor` — diagnose configuration and environment issues.

use std::path::Path;

use anyhow::{Result, bail};
use serde::Serialize;

use minewright::config::{Config, ConfigError};

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warn,
    Error,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: CheckStatus,
    message: String,
}

#[derive(Debug, Serialize)]
struct Section {
    name: String,
    checks: Vec<CheckResult>,
}

#[derive(Debug, Serialize)]
struct Summary {
    ok: usize,
    warn: usize,
    error: usize,
}

#[derive(Debug, Serialize)]
struct Report {
    status: CheckStatus,
    sections: Vec<Section>,
    summary: Summary,
}

impl Report {
    fn from_sections(sections: Vec<Section>) -> Self {
        let mut ok = 0;
        let mut warn = 0;
        let mut error = 0;
        for section in &sections {
            for check in &section.checks {
                match check.status {
                    CheckStatus::Ok => ok += 1,
                    CheckStatus::Warn => warn += 1,
                    CheckStatus::Error => error += 1,
                }
            }
        }
        let status = if error > 0 {
            CheckStatus::Error
        } else if warn > 0 {
            CheckStatus::Warn
        } else {
            CheckStatus::Ok
        };
        Report {
            status,
            sections,
            summary: Summary { ok, warn, error },
        }
    }

    fn render(&self, format: &str) -> Result<()> {
        match format {
            "json" => {
                println!("{}", serde_json::to_string_pretty(self)?);
            }
            _ => self.render_text(),
        }
        Ok(())
    }

    fn render_text(&self) {
        println!("Minewright Doctor");
        println!("{}", "=".repeat(50));

        for section in &self.sections {
            println!();
            println!("{}", section.name);
            println!("{}", "-".repeat(section.name.len()));
            for check in &section.checks {
                let label = match check.status {
                    CheckStatus::Ok => "  OK   ",
                    CheckStatus::Warn => "  WARN ",
                    CheckStatus::Error => "  ERROR",
                };
                println!("{} {}", label, check.message);
            }
        }

        println!();
        let status_label = match self.status {
            CheckStatus::Ok => "PASS",
            CheckStatus::Warn => "PASS (with warnings)",
            CheckStatus::Error => "FAIL",
        };
        println!(
            "{}: {} ok, {} warning(s), {} error(s)",
            status_label, self.summary.ok, self.summary.warn, self.summary.error,
        );
    }
}

// ============================================================================
// Entry Point
// ============================================================================

pub async fn run(config_path: &str, format: &str) -> Result<()> {
    let mut sections = Vec::new();

    let config = check_config(&mut sections, config_path).await;
    check_environment(&mut sections);
    if let Some(config) = config {
        check_bridge(&mut sections, &config);
    }

    let report = Report::from_sections(sections);
    report.render(format)?;

    if report.summary.error > 0 {
        bail!("{} error(s) found", report.summary.error);
    }
    Ok(())
}

// ============================================================================
// Check: Configuration
// ============================================================================

async fn check_config(sections: &mut Vec<Section>, config_path: &str) -> Option<Config> {
    let mut checks = Vec::new();

    if Path::new(config_path).exists() {
        checks.push(CheckResult {
            status: CheckStatus::Ok,
            message: format!("Config file '{}' found", config_path),
        });
    } else {
        checks.push(CheckResult {
            status: CheckStatus::Warn,
            message: format!("Config file '{}' not found, using defaults", config_path),
        });
    }

    let mut config = match Config::load(config_path).await {
        Ok(c) => c,
        Err(e) => {
            let message = match &e {
                ConfigError::Yaml(_) => format!("Invalid YAML: {e}"),
                ConfigError::MissingEnvVar(var) => {
                    format!("Environment variable '{var}' is not set")
                }
                _ => format!("Failed to load config: {e}"),
            };
            checks.push(CheckResult {
                status: CheckStatus::Error,
                message,
            });
            sections.push(Section {
                name: "Configuration".to_string(),
                checks,
            });
            return None;
        }
    };
    config.apply_env();

    if config.server.host.trim().is_empty() {
        checks.push(CheckResult {
            status: CheckStatus::Error,
            message: "Game server host is empty".to_string(),
        });
    } else if config.server.username.trim().is_empty() {
        checks.push(CheckResult {
            status: CheckStatus::Error,
            message: "Username is empty".to_string(),
        });
    } else {
        checks.push(CheckResult {
            status: CheckStatus::Ok,
            message: format!(
                "Will join {}:{} as '{}' (game version {})",
                config.server.host, config.server.port, config.server.username,
                config.server.version,
            ),
        });
    }

    if config.reconnect.max_attempts == 0 {
        checks.push(CheckResult {
            status: CheckStatus::Warn,
            message: "reconnect.max_attempts is 0, the agent gives up after the first disconnect"
                .to_string(),
        });
    }

    if config.http.enabled {
        checks.push(CheckResult {
            status: CheckStatus::Ok,
            message: format!("Status server enabled on port {}", config.http.port),
        });
    }

    sections.push(Section {
        name: "Configuration".to_string(),
        checks,
    });
    Some(config)
}

// ============================================================================
// Check: Environment
// ============================================================================

fn check_environment(sections: &mut Vec<Section>) {
    let mut checks = Vec::new();

    for name in ["HOST", "USERNAME"] {
        match std::env::var(name) {
            Ok(value) => checks.push(CheckResult {
                status: CheckStatus::Ok,
                message: format!("{name} override '{value}'"),
            }),
            Err(_) => checks.push(CheckResult {
                status: CheckStatus::Ok,
                message: format!("{name} not set"),
            }),
        }
    }

    for name in ["PORT", "HTTP_PORT"] {
        match std::env::var(name) {
            Ok(value) => match value.parse::<u16>() {
                Ok(port) => checks.push(CheckResult {
                    status: CheckStatus::Ok,
                    message: format!("{name} override {port}"),
                }),
                Err(_) => checks.push(CheckResult {
                    status: CheckStatus::Warn,
                    message: format!("{name} value '{value}' is not a port number, ignored at runtime"),
                }),
            },
            Err(_) => checks.push(CheckResult {
                status: CheckStatus::Ok,
                message: format!("{name} not set"),
            }),
        }
    }

    if std::env::var("RAILWAY_ENVIRONMENT").is_ok() {
        checks.push(CheckResult {
            status: CheckStatus::Ok,
            message: "RAILWAY_ENVIRONMENT set, status server enabled".to_string(),
        });
    } else {
        checks.push(CheckResult {
            status: CheckStatus::Ok,
            message: "RAILWAY_ENVIRONMENT not set".to_string(),
        });
    }

    sections.push(Section {
        name: "Environment".to_string(),
        checks,
    });
}

// ============================================================================
// Check: Bridge
// ============================================================================

fn check_bridge(sections: &mut Vec<Section>, config: &Config) {
    let mut checks = Vec::new();

    if command_in_path(&config.bridge.command) {
        checks.push(CheckResult {
            status: CheckStatus::Ok,
            message: format!("Bridge command '{}' found", config.bridge.command),
        });
    } else {
        checks.push(CheckResult {
            status: CheckStatus::Error,
            message: format!(
                "Bridge command '{}' not found in PATH",
                config.bridge.command,
            ),
        });
    }

    sections.push(Section {
        name: "Bridge".to_string(),
        checks,
    });
}

fn command_in_path(command: &str) -> bool {
    // Explicit paths are checked directly, anything else goes through PATH
    let path = Path::new(command);
    if path.is_absolute() || command.contains('/') {
        return path.exists();
    }
    std::process::Command::new("which")
        .arg(command)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

// ============================================================================
// Tests
// ============================================================================
