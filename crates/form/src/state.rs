use protocol::{AnalysisRequest, Keywords, Location};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const DEFAULT_GROUP: &str = "core";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub name: String,
    pub keywords: Vec<String>,
}

impl KeywordGroup {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keywords: vec![String::new()],
        }
    }

    pub fn new<I, S>(name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut group = Self {
            name: name.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        };
        if group.keywords.is_empty() {
            group.keywords.push(String::new());
        }
        group
    }
}

/// Everything the form holds between edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub output_prefix: String,
    pub keyword_groups: Vec<KeywordGroup>,
    #[serde(default)]
    pub suggestions_generated: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            business_name: String::new(),
            city: String::new(),
            state: String::new(),
            output_prefix: String::new(),
            keyword_groups: vec![KeywordGroup::empty(DEFAULT_GROUP)],
            suggestions_generated: false,
        }
    }
}

impl FormState {
    /// Restores the group invariants on state that came from storage.
    /// Returns `None` when nothing usable is left.
    pub(crate) fn repaired(mut self) -> Option<Self> {
        if self.keyword_groups.is_empty() {
            return None;
        }
        for group in &mut self.keyword_groups {
            if group.keywords.is_empty() {
                group.keywords.push(String::new());
            }
        }
        Some(self)
    }

    pub fn add_group(&mut self) {
        self.keyword_groups.push(KeywordGroup::empty(""));
    }

    pub fn rename_group(&mut self, group: usize, name: impl Into<String>) -> anyhow::Result<()> {
        self.group_mut(group)?.name = name.into();
        Ok(())
    }

    /// Drops a group unless it is the only one left.
    pub fn remove_group(&mut self, group: usize) -> anyhow::Result<()> {
        self.group_mut(group)?;
        if self.keyword_groups.len() > 1 {
            self.keyword_groups.remove(group);
        }
        Ok(())
    }

    pub fn add_keyword(&mut self, group: usize) -> anyhow::Result<()> {
        self.group_mut(group)?.keywords.push(String::new());
        Ok(())
    }

    pub fn update_keyword(
        &mut self,
        group: usize,
        keyword: usize,
        value: impl Into<String>,
    ) -> anyhow::Result<()> {
        let slot = self
            .group_mut(group)?
            .keywords
            .get_mut(keyword)
            .ok_or_else(|| anyhow::anyhow!("group {group} has no keyword at index {keyword}"))?;
        *slot = value.into();
        Ok(())
    }

    /// Removes a keyword; a group never ends up without a keyword slot.
    pub fn remove_keyword(&mut self, group: usize, keyword: usize) -> anyhow::Result<()> {
        let entry = self.group_mut(group)?;
        if keyword >= entry.keywords.len() {
            anyhow::bail!("group {group} has no keyword at index {keyword}");
        }
        entry.keywords.remove(keyword);
        if entry.keywords.is_empty() {
            entry.keywords.push(String::new());
        }
        Ok(())
    }

    pub fn has_identity(&self) -> bool {
        !self.business_name.trim().is_empty()
            && !self.city.trim().is_empty()
            && !self.state.trim().is_empty()
    }

    pub fn effective_output_prefix(&self) -> String {
        if self.output_prefix.is_empty() {
            default_output_prefix(&self.business_name)
        } else {
            self.output_prefix.clone()
        }
    }

    fn group_mut(&mut self, group: usize) -> anyhow::Result<&mut KeywordGroup> {
        let count = self.keyword_groups.len();
        self.keyword_groups
            .get_mut(group)
            .ok_or_else(|| anyhow::anyhow!("no keyword group at index {group} (have {count})"))
    }
}

/// Lower-cases the business name and collapses each whitespace run to `-`.
pub fn default_output_prefix(business_name: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    whitespace
        .replace_all(&business_name.to_lowercase(), "-")
        .into_owned()
}

/// Shapes the form into the payload the proxy expects.
///
/// Unnamed groups and groups without a non-blank keyword are left out.
pub fn to_request(state: &FormState) -> AnalysisRequest {
    let mut keywords = BTreeMap::new();
    for group in &state.keyword_groups {
        let kept: Vec<String> = group
            .keywords
            .iter()
            .filter(|keyword| !keyword.trim().is_empty())
            .cloned()
            .collect();
        if !group.name.is_empty() && !kept.is_empty() {
            keywords.insert(group.name.clone(), kept);
        }
    }
    AnalysisRequest {
        business_name: state.business_name.clone(),
        location: Location {
            city: state.city.clone(),
            state: state.state.clone(),
        },
        keywords: Keywords::Grouped(keywords),
        output_prefix: Some(state.effective_output_prefix()),
    }
}
