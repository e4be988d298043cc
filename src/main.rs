use anyhow::{bail, Context};
use clap::Parser;
use std::io::Read;
use std::path::{Path, PathBuf};

use codecritic::args::{Args, Command};
use codecritic::input::is_valid_github_url;
use codecritic::normalize::AnalysisReport;
use codecritic::scanner::scan_for_secrets;
use codecritic::{AiConfig, CodebaseAnalyzer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    match args.command {
        Command::Analyze {
            path,
            model,
            api_key,
            format,
            allow_secrets,
        } => handle_analyze(path, model, api_key, &format, allow_secrets).await,
        Command::Scan { path } => handle_scan(path),
    }
}

async fn handle_analyze(
    path: Option<PathBuf>,
    model: Option<String>,
    api_key: Option<String>,
    format: &str,
    allow_secrets: bool,
) -> anyhow::Result<()> {
    let mut config = AiConfig::load()?;
    // Per-invocation overrides beat config and environment.
    if let Some(model) = model {
        config.model = model;
    }
    if let Some(key) = api_key {
        config.api_key = Some(key);
    }
    tracing::debug!(model = %config.model, "resolved configuration");

    let input = read_input(path.as_deref())?;

    if is_valid_github_url(input.trim()) && !input.trim().contains('\n') {
        bail!("that looks like a repository URL, not code; pass the checked-out sources instead");
    }

    let findings = scan_for_secrets(&input);
    if !findings.is_empty() {
        tracing::warn!("input appears to contain secrets: {}", findings.join(", "));
        if !allow_secrets {
            bail!(
                "refusing to submit input that looks like it contains secrets ({}); \
                 redact them or pass --allow-secrets to proceed",
                findings.join(", ")
            );
        }
    }

    let analyzer = CodebaseAnalyzer::new(&config)?;
    let report = analyzer.analyze_codebase(&input).await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_text_report(&report),
        other => bail!("unknown output format '{other}', expected json or text"),
    }
    Ok(())
}

fn handle_scan(path: Option<PathBuf>) -> anyhow::Result<()> {
    let input = read_input(path.as_deref())?;
    let findings = scan_for_secrets(&input);
    if findings.is_empty() {
        println!("No secret-shaped strings detected.");
    } else {
        println!("Possible secrets detected:");
        for label in findings {
            println!("  - {label}");
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display())),
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn print_text_report(report: &AnalysisReport) {
    if let Some(score) = report.overall_score {
        println!("Overall score: {score}/10");
    }
    if let Some(language) = &report.language {
        println!("Language: {language}");
    }
    for (category, score) in &report.scores {
        println!("  {category}: {score}/10");
    }

    print_section("What's great", &report.whats_great);
    print_section("Needs improvement", &report.needs_improvement);
    print_section("Security concerns", &report.security_concerns);

    if let Some(docs) = &report.documentation {
        println!("\nGenerated documentation:\n{docs}");
    }
    if let Some(diagram) = &report.architecture_diagram {
        println!("\nArchitecture diagram:\n{diagram}");
    }
}

fn print_section(title: &str, items: &[serde_json::Value]) {
    if items.is_empty() {
        return;
    }
    println!("\n{title}:");
    for item in items {
        match item {
            serde_json::Value::String(s) => println!("  - {s}"),
            other => {
                // Model-chosen object shapes: print the field values.
                if let Some(map) = other.as_object() {
                    let line: Vec<String> = map
                        .values()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect();
                    println!("  - {}", line.join(" | "));
                } else {
                    println!("  - {other}");
                }
            }
        }
    }
}
