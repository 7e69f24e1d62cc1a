use log::info;
use thiserror::Error;

use crate::catalog::Category;
use crate::filter::FilterCriteria;
use crate::llm::{FunctionSpec, LLMManager};

/// Failures of the criteria extraction flow. The interactive loop stays
/// alive on any of these; only the catalog load is fatal.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("the model did not return structured filter criteria")]
    NoCriteria,
    #[error("failed to parse filter criteria: {0}")]
    InvalidArguments(#[from] serde_json::Error),
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

/// The fixed `filter_products` schema handed to the model. No field is
/// required; an empty call means "no constraints".
pub fn criteria_function() -> FunctionSpec {
    FunctionSpec {
        name: "filter_products".to_string(),
        description: "Filter products based on user preferences like category, price range, \
                      rating, and stock status"
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "description": "Product category (Electronics, Fitness, Kitchen, Books, Clothing)",
                    "enum": Category::names(),
                },
                "max_price": {
                    "type": "number",
                    "description": "Maximum price filter"
                },
                "min_price": {
                    "type": "number",
                    "description": "Minimum price filter"
                },
                "min_rating": {
                    "type": "number",
                    "description": "Minimum rating filter (0-5)"
                },
                "in_stock_only": {
                    "type": "boolean",
                    "description": "Filter for only in-stock products"
                },
                "keywords": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Keywords to search in product names"
                }
            },
            "required": []
        }),
    }
}

/// Instructions given to the model alongside each query.
pub fn system_prompt(product_count: usize) -> String {
    format!(
        "You are a product search assistant. You have access to {product_count} products across \
categories: Electronics, Fitness, Kitchen, Books, and Clothing.

Each product has: name, category, price, rating (0-5), and in_stock status.

Based on the user's natural language query, extract the relevant filtering criteria and call \
the filter_products function with appropriate parameters.

Available categories: Electronics, Fitness, Kitchen, Books, Clothing

Be intelligent about interpreting natural language:
- \"cheap\" or \"affordable\" might mean max_price around 50
- \"expensive\" or \"premium\" might mean min_price around 200
- \"good rating\" might mean min_rating of 4.0
- \"great\" or \"excellent\" rating might mean min_rating of 4.5
- \"smartphone\", \"phone\" should look for keywords like [\"smartphone\", \"phone\"]
- \"laptop\", \"computer\" should look for keywords like [\"laptop\", \"computer\"]"
    )
}

/// Turns free-text shopping preferences into `FilterCriteria` via a forced
/// function call.
pub struct CriteriaExtractor<'a> {
    llm: &'a LLMManager,
    product_count: usize,
}

impl<'a> CriteriaExtractor<'a> {
    pub fn new(llm: &'a LLMManager, product_count: usize) -> Self {
        Self { llm, product_count }
    }

    pub async fn extract(&self, query: &str) -> Result<FilterCriteria, ExtractError> {
        let function = criteria_function();
        let system = system_prompt(self.product_count);

        let arguments = self
            .llm
            .call_function(&system, query, &function)
            .await?
            .ok_or(ExtractError::NoCriteria)?;

        let criteria: FilterCriteria = serde_json::from_value(arguments)?;
        info!("Extracted criteria: {:?}", criteria);
        Ok(criteria)
    }
}
