use anyhow::{Context, Result, anyhow};
use std::env;
use std::sync::Arc;

use study_planner::{
    config::Config, ingest::read_study_material, llm_providers::LLMProviderFactory,
    plan_client::PlanRequestClient,
};

const DEFAULT_DAYS: u32 = 3;

fn print_usage() {
    println!("Usage: plan_file <path> [days]");
    println!();
    println!("Generate a study plan from a .txt, .md or .csv file and print it as JSON.");
    println!("  days    number of study days, 1-14 (default {})", DEFAULT_DAYS);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let path = &args[0];
    let days = match args.get(1) {
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| anyhow!("Invalid day count '{}'", value))?,
        None => DEFAULT_DAYS,
    };

    let config = Config::from_env()?;
    config.validate()?;

    let content = read_study_material(path).await?;

    let provider = LLMProviderFactory::from_config(&config.llm)?;
    let client =
        PlanRequestClient::with_content_limit(Arc::new(provider), config.planner.max_content_chars);

    eprintln!(
        "Generating a {}-day plan from {} with {} ({})...",
        days,
        path,
        client.provider_name(),
        client.model_name()
    );

    let plan = client.generate(&content, days).await?;

    let json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
    println!("{}", json);

    eprintln!(
        "\n=== {} ===\n{} days, {} flashcards, {} quiz questions",
        plan.plan_name,
        plan.total_days,
        plan.flashcard_count(),
        plan.quiz_question_count()
    );

    Ok(())
}
