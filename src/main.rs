use clap::Parser;
use program_eval::utils::error::ErrorSeverity;
use program_eval::utils::{logger, validation::Validate};
use program_eval::{
    CanonicalRecord, CliConfig, EtlEngine, EvaluationPipeline, Evaluator, FieldResolver,
    LocalStorage, OpenAiClient, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 可提供 OPENAI_API_KEY
    dotenvy::dotenv().ok();

    let config = CliConfig::parse();
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting program-eval CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 請求驗證：在任何模型呼叫之前
    if let Err(e) = config.validate() {
        tracing::error!("❌ Request validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let mut settings = match &config.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => TomlConfig::default(),
    };

    if let Some(model) = &config.model {
        settings.model.model = model.clone();
    }
    if let Some(api_base) = &config.api_base {
        settings.model.api_base = api_base.clone();
    }

    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let client = match OpenAiClient::from_config(settings.model.clone()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let resolver = FieldResolver::new(settings.field_aliases()?);
    let evaluator = Evaluator::new(client, resolver);
    let storage = LocalStorage::new(".".to_string());
    let pipeline = EvaluationPipeline::new(storage, config, evaluator);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(report) => {
            print_results(&report.records);
            tracing::info!("✅ Evaluation completed successfully!");
            println!("✅ Evaluation completed successfully!");
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Evaluation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn print_results(records: &[CanonicalRecord]) {
    println!(
        "{:<24} {:<32} {:>14}  C I M R",
        "Department", "Program", "Total Cost"
    );
    for record in records {
        println!(
            "{:<24} {:<32} {:>14.2}  {} {} {} {}",
            truncate(&record.department, 24),
            truncate(&record.program, 32),
            record.total_cost,
            record.cost,
            record.impact,
            record.mandate,
            record.reliance
        );
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
