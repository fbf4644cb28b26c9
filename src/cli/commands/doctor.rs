//! `viralclip doctor` - verify system requirements and configuration.

use std::process::Command;
use std::time::Duration;

use crate::cli::Output;
use crate::config::Settings;

#[derive(Debug, PartialEq)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    message: String,
    hint: Option<&'static str>,
}

impl CheckResult {
    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => "OK",
            CheckStatus::Warning => "!!",
            CheckStatus::Error => "XX",
        };
        Output::kv(&format!("[{icon}] {}", self.name), &self.message);
        if let Some(hint) = self.hint {
            println!("      -> {hint}");
        }
    }
}

/// Runs all diagnostic checks: external tools on PATH, LLM endpoint reachability,
/// speech model availability, and output/temp directory writability.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("viralclip doctor");
    println!();

    let mut checks = Vec::new();
    checks.push(check_tool("ffmpeg", "-version"));
    checks.push(check_tool("ffprobe", "-version"));
    checks.push(check_whisper_model(settings));
    checks.push(check_llm_endpoint(settings));
    checks.extend(check_directories(settings));

    for check in &checks {
        check.print();
    }
    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!("{errors} check(s) failed"));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("all checks passed with {warnings} warning(s)"));
    } else {
        Output::success("all checks passed");
    }

    Ok(())
}

fn check_tool(name: &'static str, version_arg: &str) -> CheckResult {
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult { name, status: CheckStatus::Ok, message: version, hint: None }
        }
        Ok(_) => CheckResult {
            name,
            status: CheckStatus::Error,
            message: "installed but not working".into(),
            hint: Some("reinstall from your package manager"),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult {
            name,
            status: CheckStatus::Error,
            message: "not found on PATH".into(),
            hint: Some("install ffmpeg (provides both ffmpeg and ffprobe)"),
        },
        Err(e) => CheckResult {
            name,
            status: CheckStatus::Error,
            message: format!("error: {e}"),
            hint: None,
        },
    }
}

fn check_whisper_model(settings: &Settings) -> CheckResult {
    let path = std::path::Path::new(&settings.whisper_model);
    if path.exists() {
        CheckResult {
            name: "whisper_model",
            status: CheckStatus::Ok,
            message: format!("{} (file)", settings.whisper_model),
            hint: None,
        }
    } else {
        CheckResult {
            name: "whisper_model",
            status: CheckStatus::Warning,
            message: format!("{:?} is not a local path", settings.whisper_model),
            hint: Some("set whisper_model to a local whisper.cpp GGML/GGUF model file"),
        }
    }
}

fn check_llm_endpoint(settings: &Settings) -> CheckResult {
    let url = format!("{}/api/tags", settings.llm_base_url);
    let client = match reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return CheckResult {
                name: "llm_base_url",
                status: CheckStatus::Error,
                message: format!("could not build HTTP client: {e}"),
                hint: None,
            }
        }
    };

    match client.get(&url).send() {
        Ok(resp) if resp.status().is_success() => CheckResult {
            name: "llm_base_url",
            status: CheckStatus::Ok,
            message: format!("{} reachable", settings.llm_base_url),
            hint: None,
        },
        Ok(resp) => CheckResult {
            name: "llm_base_url",
            status: CheckStatus::Warning,
            message: format!("{} returned {}", settings.llm_base_url, resp.status()),
            hint: Some("check that llm_model is pulled and the server is healthy"),
        },
        Err(e) => CheckResult {
            name: "llm_base_url",
            status: CheckStatus::Warning,
            message: format!("{} unreachable: {e}", settings.llm_base_url),
            hint: Some("start the LLM server before running the pipeline"),
        },
    }
}

fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();
    for (name, dir) in [("output_dir", settings.output_dir()), ("temp_dir", settings.temp_dir())] {
        match std::fs::create_dir_all(&dir) {
            Ok(_) => results.push(CheckResult {
                name,
                status: CheckStatus::Ok,
                message: dir.display().to_string(),
                hint: None,
            }),
            Err(e) => results.push(CheckResult {
                name,
                status: CheckStatus::Error,
                message: format!("{}: {e}", dir.display()),
                hint: Some("check permissions on the configured path"),
            }),
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_reports_missing_binary() {
        let result = check_tool("definitely-not-a-real-binary", "--version");
        assert_eq!(result.status, CheckStatus::Error);
    }
}
