use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;

use crate::llm::LLMManager;

/// System prompt for the analyst persona.
pub const ANALYST_SYSTEM: &str = "You are an expert business and technology analyst. You provide \
comprehensive, accurate, and well-structured reports about services and products.";

/// Words that mark free text as a description rather than a bare service name.
const DESCRIPTION_INDICATORS: [&str; 11] = [
    "provides", "offers", "allows", "enables", "helps", "service", "platform", "solution",
    "company", "we", "our",
];

/// Guess whether the input is a service name ("Spotify") or description text.
/// Short inputs without description-indicator words are treated as names.
pub fn is_service_name(input: &str) -> bool {
    let lowered = input.to_lowercase();
    let word_count = input.split_whitespace().count();
    let has_description_words = DESCRIPTION_INDICATORS
        .iter()
        .any(|word| lowered.split_whitespace().any(|w| w == *word));

    word_count <= 3 && !has_description_words
}

/// Build the fixed analysis prompt for the given input.
pub fn build_prompt(input: &str, service_name: bool) -> String {
    let base = if service_name {
        format!(
            "You are tasked with creating a comprehensive analysis of the service/product: \
\"{input}\".\n\nBased on your knowledge of this service/product, generate a detailed markdown \
report covering all the specified sections.\n"
        )
    } else {
        format!(
            "You are tasked with analyzing the following service/product description and \
creating a comprehensive report:\n\nINPUT TEXT:\n{input}\n\nBased on this description and any \
additional knowledge you may have about this service/product, generate a detailed markdown \
report covering all the specified sections.\n"
        )
    };

    let requirements = "
Please create a comprehensive markdown-formatted analysis report that includes the following sections:

## Brief History
- Founding year and key milestones
- Important events in the company's development
- Evolution of the service/product

## Target Audience
- Primary user segments
- Demographics and characteristics of typical users
- Market positioning

## Core Features
- Top 2-4 key functionalities
- Main capabilities that define the service
- Primary use cases

## Unique Selling Points
- Key differentiators from competitors
- What makes this service/product stand out
- Competitive advantages

## Business Model
- How the service makes money
- Revenue streams
- Pricing strategy (if known)

## Tech Stack Insights
- Technologies likely used or known to be used
- Technical architecture hints
- Platform and infrastructure details

## Perceived Strengths
- Mentioned positives or standout features
- User-praised aspects
- Market advantages

## Perceived Weaknesses
- Cited drawbacks or limitations
- Common user complaints or concerns
- Areas for improvement

Please ensure each section is well-detailed and informative. Use markdown formatting with proper \
headers, bullet points, and emphasis where appropriate. If specific information is not available, \
make reasonable inferences based on industry standards and similar services, but clearly indicate \
when you're making educated assumptions.";

    base + requirements
}

/// Generate the markdown report for the given input.
pub async fn generate(llm: &LLMManager, input: &str, service_name: bool) -> Result<String> {
    let prompt = build_prompt(input, service_name);
    llm.complete(ANALYST_SYSTEM, &prompt)
        .await
        .context("Failed to generate analysis report")
}

/// Derive the output filename from the input.
pub fn report_filename(input: &str, service_name: bool) -> String {
    if service_name {
        format!(
            "{}_analysis_report.md",
            input.to_lowercase().replace(' ', "_")
        )
    } else {
        "service_analysis_report.md".to_string()
    }
}

/// Persist a report under `output_dir`, returning the written path.
pub fn save_report(output_dir: &Path, filename: &str, report: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create report directory: {}", output_dir.display()))?;

    let path = output_dir.join(filename);
    let contents = format!(
        "{}\n\n---\n_Generated on {}_\n",
        report.trim_end(),
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    );

    fs::write(&path, contents)
        .with_context(|| format!("Failed to write report file: {}", path.display()))?;

    info!("Report saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names_are_service_names() {
        assert!(is_service_name("Spotify"));
        assert!(is_service_name("Notion Calendar"));
        assert!(is_service_name("Smart Watch Hub"));
    }

    #[test]
    fn test_indicator_words_mark_descriptions() {
        assert!(!is_service_name("our platform"));
        assert!(!is_service_name("Acme offers widgets"));
        assert!(!is_service_name(
            "A service that provides music streaming to millions of listeners"
        ));
    }

    #[test]
    fn test_long_inputs_are_descriptions() {
        assert!(!is_service_name("a tool for tracking daily workout sessions"));
    }

    #[test]
    fn test_prompt_contains_all_sections() {
        let prompt = build_prompt("Spotify", true);
        for section in [
            "## Brief History",
            "## Target Audience",
            "## Core Features",
            "## Unique Selling Points",
            "## Business Model",
            "## Tech Stack Insights",
            "## Perceived Strengths",
            "## Perceived Weaknesses",
        ] {
            assert!(prompt.contains(section), "missing section {}", section);
        }
        assert!(prompt.contains("\"Spotify\""));
    }

    #[test]
    fn test_description_prompt_embeds_input_text() {
        let prompt = build_prompt("We build billing software", false);
        assert!(prompt.contains("INPUT TEXT:\nWe build billing software"));
    }

    #[test]
    fn test_filename_from_service_name() {
        assert_eq!(
            report_filename("Notion Calendar", true),
            "notion_calendar_analysis_report.md"
        );
        assert_eq!(report_filename("spotify", true), "spotify_analysis_report.md");
    }

    #[test]
    fn test_filename_for_descriptions_is_fixed() {
        assert_eq!(
            report_filename("a long description of some product", false),
            "service_analysis_report.md"
        );
    }

    #[test]
    fn test_save_report_writes_footer() {
        let dir = std::env::temp_dir().join("shopscout_report_test");
        let path = save_report(&dir, "test_analysis_report.md", "## Brief History\nBody").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("## Brief History"));
        assert!(contents.contains("_Generated on "));
        fs::remove_file(&path).ok();
    }
}
