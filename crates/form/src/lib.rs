pub mod client;
pub mod collector;
pub mod state;
pub mod store;
pub mod suggest;
#[cfg(test)]
mod test_utils;

pub use collector::{Field, FormCollector};
pub use state::{default_output_prefix, to_request, FormState, KeywordGroup};
pub use store::{DraftStore, FileDraftStore, MemoryDraftStore, STORAGE_KEY};
