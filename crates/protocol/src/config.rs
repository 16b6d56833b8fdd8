use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{AnalysisRequest, Keywords, Location};

/// Structured job description the analysis script consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub business_name: String,
    pub location: Location,
    pub keywords: BTreeMap<String, Vec<String>>,
    pub output_prefix: String,
}

/// Converts a request into the grouped config shape.
///
/// Returns `None` when no non-blank keyword survives.
pub fn normalize(request: &AnalysisRequest) -> Option<AnalysisConfig> {
    let keywords = match &request.keywords {
        Keywords::Grouped(groups) => groups
            .iter()
            .filter_map(|(name, keywords)| {
                let kept: Vec<String> = keywords
                    .iter()
                    .map(|keyword| keyword.trim())
                    .filter(|keyword| !keyword.is_empty())
                    .map(str::to_string)
                    .collect();
                (!kept.is_empty()).then(|| (name.clone(), kept))
            })
            .collect::<BTreeMap<_, _>>(),
        Keywords::Flat(_) => split_flat(request.keywords.lines()),
    };
    if keywords.is_empty() {
        return None;
    }
    let output_prefix = request
        .output_prefix
        .as_deref()
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| derive_output_prefix(&request.business_name));
    Some(AnalysisConfig {
        business_name: request.business_name.clone(),
        location: request.location.clone(),
        keywords,
        output_prefix,
    })
}

pub fn derive_output_prefix(business_name: &str) -> String {
    business_name
        .to_lowercase()
        .replace(' ', "-")
        .replace('&', "and")
}

/// Distributes flat keyword lines as 60% core, 20% upsell, 10% efficiency and
/// 10% emergency. Empty buckets are dropped.
fn split_flat(lines: Vec<String>) -> BTreeMap<String, Vec<String>> {
    let n = lines.len();
    let core_end = (n * 6 / 10).max(1).min(n);
    let upsell_end = (n * 8 / 10).max(core_end);
    let efficiency_end = (n * 9 / 10).max(upsell_end);
    let buckets = [
        ("core", 0, core_end),
        ("upsell", core_end, upsell_end),
        ("efficiency", upsell_end, efficiency_end),
        ("emergency", efficiency_end, n),
    ];
    buckets
        .into_iter()
        .filter(|(_, start, end)| end > start)
        .map(|(name, start, end)| (name.to_string(), lines[start..end].to_vec()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(keywords: Keywords) -> AnalysisRequest {
        AnalysisRequest {
            business_name: "Bob's Plumbing & Heating".to_string(),
            location: Location {
                city: "Spokane".to_string(),
                state: "WA".to_string(),
            },
            keywords,
            output_prefix: None,
        }
    }

    #[test]
    fn flat_keywords_split_by_share() {
        let text = (1..=10)
            .map(|i| format!("kw{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let config = normalize(&request(Keywords::Flat(text))).expect("config");
        assert_eq!(config.keywords["core"].len(), 6);
        assert_eq!(config.keywords["upsell"], vec!["kw7", "kw8"]);
        assert_eq!(config.keywords["efficiency"], vec!["kw9"]);
        assert_eq!(config.keywords["emergency"], vec!["kw10"]);
    }

    #[test]
    fn single_flat_keyword_lands_in_core_only() {
        let config = normalize(&request(Keywords::Flat("  drain cleaning \n\n".into())))
            .expect("config");
        assert_eq!(config.keywords.len(), 1);
        assert_eq!(config.keywords["core"], vec!["drain cleaning"]);
    }

    #[test]
    fn blank_flat_keywords_are_rejected() {
        assert!(normalize(&request(Keywords::Flat(" \n \n".into()))).is_none());
    }

    #[test]
    fn grouped_keywords_drop_blanks_and_empty_groups() {
        let groups = BTreeMap::from([
            ("core".to_string(), vec!["a".to_string(), " ".to_string()]),
            ("empty".to_string(), vec!["".to_string()]),
        ]);
        let config = normalize(&request(Keywords::Grouped(groups))).expect("config");
        assert_eq!(config.keywords.len(), 1);
        assert_eq!(config.keywords["core"], vec!["a"]);
    }

    #[test]
    fn output_prefix_defaults_from_business_name() {
        let config = normalize(&request(Keywords::Flat("a".into()))).expect("config");
        assert_eq!(config.output_prefix, "bob's-plumbing-and-heating");

        let mut explicit = request(Keywords::Flat("a".into()));
        explicit.output_prefix = Some("bob".to_string());
        assert_eq!(normalize(&explicit).expect("config").output_prefix, "bob");
    }
}
