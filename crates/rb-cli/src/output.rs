// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use rb_engine::RunResult;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a fleet's [`RunResult`]s and return the number that failed
/// (not counting skipped runs, which are not failures).
pub fn render(results: &[RunResult], format: OutputFormat) -> usize {
    match format {
        OutputFormat::Text => render_text(results),
        OutputFormat::Json => render_json(results),
    }
}

fn render_text(results: &[RunResult]) -> usize {
    let mut failed = 0;
    for r in results {
        let status = if r.skipped {
            "skip"
        } else if r.err.is_some() {
            failed += 1;
            "fail"
        } else {
            "ok"
        };
        println!(
            "{status:>4}  {:>8.2?}  {}{}",
            r.elapsed,
            r.book_path,
            r.desc.as_deref().map(|d| format!("  # {d}")).unwrap_or_default(),
        );
        if let Some(err) = &r.err {
            println!("        {err}");
        }
        for step in &r.step_results {
            let step_status = if step.skipped {
                "skip"
            } else {
                match step.outcome {
                    rb_core::Outcome::Success => "ok",
                    rb_core::Outcome::Failure => "fail",
                    rb_core::Outcome::Skipped => "skip",
                }
            };
            let label = step.key.clone().unwrap_or_else(|| step.index.to_string());
            let desc = step.desc.as_deref().unwrap_or("");
            println!("      {step_status:>4}  {label}: {desc}");
            if let Some(err) = &step.err {
                println!("            {err}");
            }
        }
    }
    let total = results.len();
    let skipped = results.iter().filter(|r| r.skipped).count();
    println!(
        "\n{total} runbook(s): {} passed, {failed} failed, {skipped} skipped",
        total - failed - skipped
    );
    failed
}

fn render_json(results: &[RunResult]) -> usize {
    let failed = results.iter().filter(|r| !r.skipped && r.err.is_some()).count();
    let envelope = serde_json::json!({
        "runbooks": results,
        "total": results.len(),
        "failed": failed,
    });
    println!("{}", serde_json::to_string_pretty(&envelope).unwrap_or_default());
    failed
}
