use std::time::{Duration, Instant};

use protocol::AnalysisRequest;

use crate::state::{to_request, FormState};
use crate::store::DraftStore;
use crate::suggest::{classify, suggested_groups, Industry};

pub const DEFAULT_SUGGESTION_DEBOUNCE: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    BusinessName,
    City,
    State,
    OutputPrefix,
}

/// Form state bound to a draft store. Every mutation is persisted before the
/// call returns.
pub struct FormCollector<S: DraftStore> {
    state: FormState,
    store: S,
    debounce: Duration,
    last_edit: Option<Instant>,
}

impl<S: DraftStore> FormCollector<S> {
    pub fn load(store: S) -> Self {
        let state = store.load();
        Self {
            state,
            store,
            debounce: DEFAULT_SUGGESTION_DEBOUNCE,
            last_edit: None,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn request(&self) -> AnalysisRequest {
        to_request(&self.state)
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> anyhow::Result<()> {
        let value = value.into();
        match field {
            Field::BusinessName => self.state.business_name = value,
            Field::City => self.state.city = value,
            Field::State => self.state.state = value,
            Field::OutputPrefix => self.state.output_prefix = value,
        }
        self.last_edit = Some(Instant::now());
        self.persist()
    }

    pub fn add_group(&mut self) -> anyhow::Result<()> {
        self.state.add_group();
        self.persist()
    }

    pub fn rename_group(&mut self, group: usize, name: impl Into<String>) -> anyhow::Result<()> {
        self.state.rename_group(group, name)?;
        self.persist()
    }

    pub fn remove_group(&mut self, group: usize) -> anyhow::Result<()> {
        self.state.remove_group(group)?;
        self.persist()
    }

    pub fn add_keyword(&mut self, group: usize) -> anyhow::Result<()> {
        self.state.add_keyword(group)?;
        self.persist()
    }

    pub fn update_keyword(
        &mut self,
        group: usize,
        keyword: usize,
        value: impl Into<String>,
    ) -> anyhow::Result<()> {
        self.state.update_keyword(group, keyword, value)?;
        self.persist()
    }

    pub fn remove_keyword(&mut self, group: usize, keyword: usize) -> anyhow::Result<()> {
        self.state.remove_keyword(group, keyword)?;
        self.persist()
    }

    /// Resets the form and erases the stored draft.
    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.state = FormState::default();
        self.last_edit = None;
        self.store.clear()
    }

    pub fn suggestions_pending(&self) -> bool {
        self.state.has_identity() && !self.state.suggestions_generated
    }

    /// Applies suggestions once the identity fields have been quiet for the
    /// debounce window. Returns the industry when groups were replaced.
    pub fn poll_suggestions(&mut self, now: Instant) -> anyhow::Result<Option<Industry>> {
        if !self.suggestions_pending() {
            return Ok(None);
        }
        if let Some(last_edit) = self.last_edit {
            if now.saturating_duration_since(last_edit) < self.debounce {
                return Ok(None);
            }
        }
        self.apply_suggestions()
    }

    /// Replaces the keyword groups with canned suggestions, at most once per
    /// draft.
    pub fn apply_suggestions(&mut self) -> anyhow::Result<Option<Industry>> {
        if !self.suggestions_pending() {
            return Ok(None);
        }
        let industry = classify(&self.state.business_name);
        self.state.keyword_groups = suggested_groups(industry, &self.state.city, &self.state.state);
        self.state.suggestions_generated = true;
        tracing::debug!(industry = ?industry, "keyword suggestions applied");
        self.persist()?;
        Ok(Some(industry))
    }

    fn persist(&self) -> anyhow::Result<()> {
        self.store.save(&self.state)
    }
}
