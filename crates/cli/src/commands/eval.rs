//! Eval command handler.
//!
//! Runs the fixed question set against the base model and, optionally, a
//! tuned model, and prints a summary per model.

use super::setup;
use clap::Args;
use copilot_agent::{run_eval, summarize, EvalRecord, EvalSummary, EVAL_QUESTIONS};
use copilot_core::{config::AppConfig, AppResult};
use serde::Serialize;

/// Compare generation models over the built-in question set
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// Fine-tuned model to compare against the base model
    #[arg(long)]
    pub tuned_model: Option<String>,

    /// Questions evaluated in parallel
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// Per-question records shown for each model
    #[arg(long, default_value_t = 2)]
    pub samples: usize,

    /// Use the built-in demo knowledge base instead of the corpora
    #[arg(long)]
    pub demo: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ModelReport {
    label: &'static str,
    model: String,
    summary: EvalSummary,
    records: Vec<EvalRecord>,
}

impl EvalCommand {
    /// Execute the eval command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing eval command");
        tracing::debug!("Eval command options: {:?}", self);

        let kb_k = setup::breadth(None, config.retrieval.kb_k, "kbK")?;
        let tickets_k = setup::breadth(None, config.retrieval.tickets_k, "ticketsK")?;

        let store = setup::open_store(config, self.demo)?;
        let client = setup::llm_client(config)?;
        let judge_model = config.effective_judge_model();

        let mut models = vec![("base", config.model.clone())];
        if let Some(tuned) = &self.tuned_model {
            models.push(("tuned", tuned.clone()));
        }

        let mut reports = Vec::with_capacity(models.len());
        for (label, model) in models {
            let orchestrator =
                setup::orchestrator(config, store.clone(), client.clone(), &model, judge_model)?;
            let records =
                run_eval(&orchestrator, EVAL_QUESTIONS, kb_k, tickets_k, self.concurrency).await?;

            reports.push(ModelReport {
                label,
                model,
                summary: summarize(&records),
                records,
            });
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            for report in &reports {
                print_report(report, self.samples);
            }
        }

        Ok(())
    }
}

fn print_report(report: &ModelReport, samples: usize) {
    let summary = &report.summary;

    println!("== {} ({}) ==", report.label.to_uppercase(), report.model);
    println!("Decisions:");
    for (decision, count) in &summary.decisions {
        println!("  {:<26} {}", decision, count);
    }
    println!("Confidence:");
    for (confidence, count) in &summary.confidence {
        println!("  {:<26} {}", confidence, count);
    }
    println!("Avg citations:     {:.2}", summary.avg_citations);
    println!("Avg similar cases: {:.2}", summary.avg_similar_cases);
    println!("Retry rate:        {:.0}%", summary.retry_rate * 100.0);

    for record in report.records.iter().take(samples) {
        println!();
        println!("Q: {}", record.question);
        println!(
            "   decision={} confidence={} citations={} retries={}",
            record.decision.as_deref().unwrap_or("none"),
            record.confidence.as_deref().unwrap_or("none"),
            record.num_citations,
            record.retries
        );
        if let Some(feedback) = &record.feedback {
            println!("   {}", feedback);
        }
    }
    println!();
}
