use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

mod catalog;
mod config;
mod event_bus;
mod extractor;
mod filter;
mod llm;
mod logger;
mod providers;
mod report;
mod ui;

use config::Config;
use event_bus::{Event, EventBus};
use extractor::{CriteriaExtractor, ExtractError};
use llm::LLMManager;
use providers::openai::OpenAIProvider;
use ui::UIHandler;

#[derive(Parser)]
#[command(name = "shopscout", version, about = "Natural-language product search and service analysis")]
struct Args {
    /// Path to a config file (defaults to shopscout.toml lookup)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Uncolored output
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter the product catalog from a natural-language query
    Search {
        /// Override the products file path
        #[arg(short, long)]
        products: Option<String>,

        /// One-shot query; omit for an interactive loop
        #[arg(last = true)]
        query: Vec<String>,
    },
    /// Generate a markdown analysis report for a service or product
    Analyze {
        /// Override the report output directory
        #[arg(short, long)]
        output: Option<String>,

        /// Save the report without asking
        #[arg(short, long)]
        save: bool,

        /// Service name or description; omit to be prompted
        #[arg(last = true)]
        input: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    logger::init(args.verbose);

    let config = Arc::new(Config::load(&args.config)?);
    let bus = Arc::new(EventBus::new(100));
    let ui = UIHandler::new(args.plain || !config.ui.colorful);

    if args.verbose {
        mirror_events_to_log(&bus);
    }

    let llm = build_llm(&config, &bus)?;

    match args.command {
        Command::Search { products, query } => {
            let path = products.unwrap_or_else(|| config.catalog.path.clone());
            run_search(&ui, &llm, &bus, &path, &query.join(" ")).await
        }
        Command::Analyze { output, save, input } => {
            let output_dir = output.unwrap_or_else(|| config.report.output_dir.clone());
            run_analyze(&ui, &llm, &bus, &output_dir, save, &input.join(" ")).await
        }
    }
}

fn build_llm(config: &Arc<Config>, bus: &Arc<EventBus>) -> Result<LLMManager> {
    let mut provider = OpenAIProvider::new(config.openai.model.clone(), config.openai.temperature)?
        .with_max_tokens(config.report.max_tokens)
        .with_event_bus(bus.clone())
        .with_cost_per_1m_input_tokens(config.openai.cost_per_1m_input_tokens)
        .with_cost_per_1m_output_tokens(config.openai.cost_per_1m_output_tokens);
    if let Some(base_url) = &config.openai.base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    Ok(LLMManager::new(Box::new(provider), bus.clone(), config.clone()))
}

/// Mirror API events into the log for `--verbose` runs.
fn mirror_events_to_log(bus: &Arc<EventBus>) {
    let mut receiver = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = receiver.recv().await {
            match event {
                Event::APICallStarted { provider, model } => {
                    info!("API call started: {} ({})", provider, model);
                }
                Event::APICallCompleted { provider, tokens, cost } => {
                    info!("API call completed: {} ({} tokens, ${:.4})", provider, tokens, cost);
                }
                Event::APIError { provider, error } => {
                    warn!("API error from {}: {}", provider, error);
                }
                _ => {}
            }
        }
    });
}

async fn run_search(
    ui: &UIHandler,
    llm: &LLMManager,
    bus: &Arc<EventBus>,
    products_path: &str,
    query: &str,
) -> Result<()> {
    // A missing or malformed catalog is fatal; everything after this point
    // keeps the loop alive.
    let products = catalog::load_products(products_path)
        .context("Could not load the product catalog")?;
    let _ = bus.emit(Event::CatalogLoaded { count: products.len() }).await;

    if !query.is_empty() {
        search_once(ui, llm, bus, &products, query).await;
        return Ok(());
    }

    ui.search_banner(products.len());
    loop {
        println!();
        let line = match ui.read_line("Enter your product preferences (or 'quit' to exit): ")? {
            Some(line) => line,
            None => break,
        };

        match line.to_lowercase().as_str() {
            "quit" | "exit" | "q" => break,
            "" => {
                println!("Please enter your preferences.");
                continue;
            }
            _ => search_once(ui, llm, bus, &products, &line).await,
        }
    }

    ui.print_summary(&bus.get_metrics().await);
    Ok(())
}

async fn search_once(
    ui: &UIHandler,
    llm: &LLMManager,
    bus: &Arc<EventBus>,
    products: &[catalog::Product],
    query: &str,
) {
    let spinner = ui.spinner("Extracting filters from your query...");
    let extractor = CriteriaExtractor::new(llm, products.len());
    let result = extractor.extract(query).await;
    spinner.finish_and_clear();

    match result {
        Ok(criteria) => {
            if criteria.is_empty() {
                println!("No specific filters extracted; showing the full catalog.");
            } else if let Ok(shown) = serde_json::to_string(&criteria) {
                println!("Extracted filters: {}", shown);
            }
            let matches = filter::apply(products, &criteria);
            let _ = bus.emit(Event::SearchCompleted { matches: matches.len() }).await;
            ui.print_results(&matches);
        }
        Err(ExtractError::NoCriteria) | Err(ExtractError::InvalidArguments(_)) => {
            ui.print_error("Could not extract search criteria from your query. Please try rephrasing.");
            println!("Example: 'I want electronics under $100 with good rating'");
        }
        Err(ExtractError::Provider(e)) => {
            info!("Provider error: {:#}", e);
            ui.print_error("Error processing request. Please check your API key and try again.");
        }
    }
}

async fn run_analyze(
    ui: &UIHandler,
    llm: &LLMManager,
    bus: &Arc<EventBus>,
    output_dir: &str,
    save: bool,
    input: &str,
) -> Result<()> {
    ui.analyze_banner();

    let input = if input.is_empty() {
        println!();
        match ui.read_line("Enter a service name or description: ")? {
            Some(line) if !line.is_empty() => line,
            _ => {
                ui.print_error("Input cannot be empty.");
                return Ok(());
            }
        }
    } else {
        input.to_string()
    };

    let service_name = report::is_service_name(&input);
    if service_name {
        println!("Detected as service name: '{}'", input);
    } else {
        println!("Detected as service description text");
    }

    let spinner = ui.spinner("Generating analysis report...");
    let result = report::generate(llm, &input, service_name).await;
    spinner.finish_and_clear();

    let generated = match result {
        Ok(report) => report,
        Err(e) => {
            info!("Report generation failed: {:#}", e);
            ui.print_error("Failed to generate the report. Please check your API key and try again.");
            return Ok(());
        }
    };

    ui.print_report(&generated);

    let wants_save = save
        || matches!(
            ui.read_line("Save this report to a file? (y/n): ")?.as_deref(),
            Some("y") | Some("yes") | Some("Y")
        );

    if wants_save {
        let filename = report::report_filename(&input, service_name);
        let path = report::save_report(Path::new(output_dir), &filename, &generated)?;
        let _ = bus
            .emit(Event::ReportSaved { path: path.display().to_string() })
            .await;
        println!("Report saved to: {}", path.display());
    }

    Ok(())
}
