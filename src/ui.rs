use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::Product;
use crate::event_bus::Metrics;

/// Terminal output for both flows. `plain` drops colors for piped output.
pub struct UIHandler {
    plain: bool,
}

impl UIHandler {
    pub fn new(plain: bool) -> Self {
        if plain {
            colored::control::set_override(false);
        }
        Self { plain }
    }

    pub fn search_banner(&self, product_count: usize) {
        println!("{}", "=".repeat(60).bright_blue());
        println!("{}", "Product Search".bright_white().bold());
        println!("{}", "=".repeat(60).bright_blue());
        println!("Search for products using natural language.");
        println!("Example: 'I need a smartphone under $800 with good rating'");
        println!("Loaded {} products from the catalog.", product_count);
    }

    pub fn analyze_banner(&self) {
        println!("{}", "=".repeat(60).bright_blue());
        println!("{}", "Service Analyzer".bright_white().bold());
        println!("{}", "=".repeat(60).bright_blue());
        println!("Generates a markdown analysis report for a service or product.");
        println!("Enter a known name ('Spotify') or paste a description.");
    }

    /// Spinner shown while a request is in flight. Finished and cleared by
    /// the caller.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.plain {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    /// One line per product: 1-based index, name, price to two decimals,
    /// rating, stock status.
    pub fn print_results(&self, products: &[&Product]) {
        if products.is_empty() {
            println!();
            println!("No products found matching your criteria.");
            return;
        }

        println!();
        println!("{}", "Filtered Products:".bright_white().bold());
        println!("{}", "-".repeat(50));

        for (i, product) in products.iter().enumerate() {
            let stock_status = if product.in_stock {
                "In Stock".green()
            } else {
                "Out of Stock".red()
            };
            println!(
                "{}. {} - ${:.2}, Rating: {}, {}",
                i + 1,
                product.name,
                product.price,
                product.rating,
                stock_status
            );
        }
    }

    pub fn print_report(&self, report: &str) {
        println!();
        println!("{}", "=".repeat(60).bright_blue());
        println!("{}", "Generated Report".bright_white().bold());
        println!("{}", "=".repeat(60).bright_blue());
        println!();
        println!("{}", report);
        println!();
        println!("{}", "=".repeat(60).bright_blue());
    }

    pub fn print_error(&self, message: &str) {
        println!("{} {}", "✗".red().bold(), message);
    }

    /// Session summary printed when the interactive search loop exits.
    pub fn print_summary(&self, metrics: &Metrics) {
        println!();
        println!("{}", "-".repeat(60));
        println!(
            "Session: {} searches, {} API calls, {} tokens, ${:.4}",
            metrics.searches_run,
            metrics.total_api_calls,
            metrics.total_tokens,
            metrics.total_cost
        );
    }

    /// Prompt on stdout and read one trimmed line from stdin. `None` on EOF.
    pub fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
