pub mod browse;
pub mod catalog;
pub mod claims_batch;
pub mod entry_detail;
pub mod hybrid;
pub mod lexical;
pub mod related;
pub mod semantic;

pub use browse::{browse, BrowseFilters, Page};
pub use catalog::{project_catalog, CatalogCluster};
pub use claims_batch::{claims_batch, EntryClaimsSummary};
pub use entry_detail::{entry_detail, EntryDetail};
pub use hybrid::{hybrid_search, HybridResponse, HybridResult};
pub use lexical::{lexical_search, LexicalResult, SearchIn};
pub use related::{related, RelatedDirection, RelatedEntry};
pub use semantic::{semantic_search, SemanticResult};
