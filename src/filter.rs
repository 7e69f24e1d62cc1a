use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// Minimum keyword length before the length-ratio fallback applies.
const RATIO_MIN_KEYWORD_LEN: usize = 4;

/// A keyword embedded in a longer word only counts when it makes up more than
/// this share of the word ("phone" in "smartphone" is 0.5 and fails; "watch"
/// in "watchdog" is 0.625 and passes).
const RATIO_THRESHOLD: f64 = 0.6;

/// Filter constraints extracted from a natural-language query.
///
/// Every field is independently optional; an absent field imposes no
/// constraint. This deserializes directly from the arguments JSON of the
/// `filter_products` function call, tolerating any subset of missing keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub in_stock_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl FilterCriteria {
    /// True when no field imposes any constraint.
    pub fn is_empty(&self) -> bool {
        *self == FilterCriteria::default()
    }
}

/// Apply filter criteria to a product list.
///
/// Pure and order-preserving: the result is a subsequence of `products`, the
/// input is never mutated, and no input combination is an error. A product
/// survives only if every supplied constraint holds.
pub fn apply<'a>(products: &'a [Product], criteria: &FilterCriteria) -> Vec<&'a Product> {
    products.iter().filter(|p| matches(p, criteria)).collect()
}

fn matches(product: &Product, criteria: &FilterCriteria) -> bool {
    // Case-sensitive exact match; out-of-enum values never match anything.
    if let Some(category) = &criteria.category {
        if product.category.as_str() != category {
            return false;
        }
    }
    if let Some(max_price) = criteria.max_price {
        if product.price > max_price {
            return false;
        }
    }
    if let Some(min_price) = criteria.min_price {
        if product.price < min_price {
            return false;
        }
    }
    if let Some(min_rating) = criteria.min_rating {
        if product.rating < min_rating {
            return false;
        }
    }
    if criteria.in_stock_only && !product.in_stock {
        return false;
    }
    if !criteria.keywords.is_empty() && !any_keyword_matches(&product.name, &criteria.keywords) {
        return false;
    }
    true
}

/// True when at least one keyword matches the product name. Stops scanning at
/// the first match.
fn any_keyword_matches(name: &str, keywords: &[String]) -> bool {
    let name = name.to_lowercase();
    keywords.iter().any(|keyword| {
        let keyword = keyword.to_lowercase();
        matches_whole_word(&name, &keyword) || matches_within_word(&name, &keyword)
    })
}

/// Whole-word match: the keyword equals one of the name's tokens, where
/// tokens are runs of alphanumeric characters. Expects both arguments
/// lowercased.
fn matches_whole_word(name: &str, keyword: &str) -> bool {
    name.split(|c: char| !c.is_alphanumeric())
        .any(|word| word == keyword)
}

/// Length-ratio fallback: the keyword is a substring of a single token and
/// takes up more than `RATIO_THRESHOLD` of it. Lets "phone" match inside
/// "smartphone"-style compounds without matching every word it appears in.
/// Expects both arguments lowercased.
fn matches_within_word(name: &str, keyword: &str) -> bool {
    let keyword_len = keyword.chars().count();
    if keyword_len < RATIO_MIN_KEYWORD_LEN {
        return false;
    }
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.contains(keyword))
        .any(|word| keyword_len as f64 / word.chars().count() as f64 > RATIO_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    fn product(name: &str, category: Category, price: f64, rating: f64, in_stock: bool) -> Product {
        Product {
            name: name.to_string(),
            category,
            price,
            rating,
            in_stock,
        }
    }

    fn sample_catalog() -> Vec<Product> {
        vec![
            product("Wireless Headphones Pro", Category::Electronics, 89.99, 4.3, true),
            product("Budget Phone X1", Category::Electronics, 199.00, 3.8, false),
            product("Smart Watch Series 5", Category::Electronics, 249.99, 4.6, true),
            product("Yoga Mat Premium", Category::Fitness, 34.99, 4.1, true),
            product("Chef Knife Set", Category::Kitchen, 120.00, 4.8, false),
            product("Rust in Action", Category::Books, 44.50, 4.7, true),
        ]
    }

    fn names<'a>(result: &[&'a Product]) -> Vec<&'a str> {
        result.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        // No constraints returns every product in order.
        let catalog = sample_catalog();
        let result = apply(&catalog, &FilterCriteria::default());
        assert_eq!(result.len(), catalog.len());
        for (got, expected) in result.iter().zip(catalog.iter()) {
            assert_eq!(**got, *expected);
        }
    }

    #[test]
    fn test_apply_is_pure_and_deterministic() {
        // The input list is untouched and repeat calls agree.
        let catalog = sample_catalog();
        let before = catalog.clone();
        let criteria = FilterCriteria {
            min_rating: Some(4.0),
            in_stock_only: true,
            ..Default::default()
        };
        let first = names(&apply(&catalog, &criteria));
        let second = names(&apply(&catalog, &criteria));
        assert_eq!(catalog, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_order_is_preserved() {
        // Survivors keep their relative input order.
        let catalog = sample_catalog();
        let criteria = FilterCriteria {
            category: Some("Electronics".to_string()),
            ..Default::default()
        };
        assert_eq!(
            names(&apply(&catalog, &criteria)),
            vec!["Wireless Headphones Pro", "Budget Phone X1", "Smart Watch Series 5"]
        );
    }

    #[test]
    fn test_all_constraints_are_anded() {
        // Every supplied constraint must hold.
        let catalog = sample_catalog();
        let criteria = FilterCriteria {
            category: Some("Electronics".to_string()),
            max_price: Some(250.0),
            min_rating: Some(4.0),
            in_stock_only: true,
            ..Default::default()
        };
        let result = apply(&catalog, &criteria);
        assert_eq!(
            names(&result),
            vec!["Wireless Headphones Pro", "Smart Watch Series 5"]
        );
        for p in &result {
            assert_eq!(p.category, Category::Electronics);
            assert!(p.price <= 250.0);
            assert!(p.rating >= 4.0);
            assert!(p.in_stock);
        }
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let catalog = sample_catalog();
        let criteria = FilterCriteria {
            min_price: Some(89.99),
            max_price: Some(89.99),
            ..Default::default()
        };
        assert_eq!(names(&apply(&catalog, &criteria)), vec!["Wireless Headphones Pro"]);
    }

    #[test]
    fn test_unknown_category_matches_nothing() {
        // Values outside the closed enum produce an empty result, not an
        // error, regardless of other fields.
        let catalog = sample_catalog();
        let criteria = FilterCriteria {
            category: Some("Toys".to_string()),
            max_price: Some(10_000.0),
            keywords: vec!["phone".to_string()],
            ..Default::default()
        };
        assert!(apply(&catalog, &criteria).is_empty());
    }

    #[test]
    fn test_category_match_is_case_sensitive() {
        let catalog = sample_catalog();
        let criteria = FilterCriteria {
            category: Some("electronics".to_string()),
            ..Default::default()
        };
        assert!(apply(&catalog, &criteria).is_empty());
    }

    #[test]
    fn test_whole_word_keyword_match() {
        // "watch" is a whole word in "Smart Watch Series 5".
        assert!(any_keyword_matches("Smart Watch Series 5", &["watch".to_string()]));
    }

    #[test]
    fn test_watchdog_boundary_case() {
        // Boundary case: "watch" is not a whole word in "Watchdog Security
        // Camera", but 5/8 = 0.625 > 0.6, so the ratio fallback fires.
        assert!(!matches_whole_word("watchdog security camera", "watch"));
        assert!(matches_within_word("watchdog security camera", "watch"));
        assert!(any_keyword_matches("Watchdog Security Camera", &["watch".to_string()]));
    }

    #[test]
    fn test_ratio_at_half_fails() {
        // "phone" in "smartphone" is 5/10 = 0.5, which does not exceed
        // 0.6, and "phone" is not a whole word there either.
        assert!(!matches_whole_word("smartphone", "phone"));
        assert!(!matches_within_word("smartphone", "phone"));
        assert!(!any_keyword_matches("Smartphone", &["phone".to_string()]));

        // "smart" in "smartphone" is the same 0.5 ratio.
        assert!(!any_keyword_matches("Smartphone", &["smart".to_string()]));
    }

    #[test]
    fn test_ratio_just_above_threshold_passes() {
        // "headphone" in "headphones" is 9/10 = 0.9.
        assert!(matches_within_word("headphones", "headphone"));
        // "phones" in "headphones" is 6/10 = 0.6 exactly, which must fail the
        // strict > comparison.
        assert!(!matches_within_word("headphones", "phones"));
    }

    #[test]
    fn test_short_keywords_never_use_ratio() {
        // "pho" is a substring of "phone" at ratio 0.6, but keywords under
        // four characters only match as whole words.
        assert!(!matches_within_word("phone", "pho"));
        assert!(any_keyword_matches("Pho Bowl", &["pho".to_string()]));
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        assert!(any_keyword_matches("WIRELESS HEADPHONES PRO", &["wireless".to_string()]));
        assert!(any_keyword_matches("yoga mat", &["YOGA".to_string()]));
    }

    #[test]
    fn test_one_matching_keyword_suffices() {
        let catalog = sample_catalog();
        let criteria = FilterCriteria {
            keywords: vec!["nonexistent".to_string(), "yoga".to_string()],
            ..Default::default()
        };
        assert_eq!(names(&apply(&catalog, &criteria)), vec!["Yoga Mat Premium"]);
    }

    #[test]
    fn test_headphones_do_not_match_phone() {
        // "phone" must select Budget Phone X1 only.
        // "Headphones" contains "phone" but 5/10 = 0.5 fails the threshold.
        let catalog = vec![
            product("Wireless Headphones Pro", Category::Electronics, 89.99, 4.3, true),
            product("Budget Phone X1", Category::Electronics, 199.00, 3.8, false),
        ];
        let criteria = FilterCriteria {
            keywords: vec!["phone".to_string()],
            in_stock_only: false,
            ..Default::default()
        };
        assert_eq!(names(&apply(&catalog, &criteria)), vec!["Budget Phone X1"]);
    }

    #[test]
    fn test_criteria_deserializes_with_missing_fields() {
        let criteria: FilterCriteria = serde_json::from_str(r#"{"max_price": 100}"#).unwrap();
        assert_eq!(criteria.max_price, Some(100.0));
        assert_eq!(criteria.category, None);
        assert!(!criteria.in_stock_only);
        assert!(criteria.keywords.is_empty());

        let criteria: FilterCriteria = serde_json::from_str("{}").unwrap();
        assert!(criteria.is_empty());
    }
}
