use serde::{Deserialize, Serialize};

/// The synchronous, crude structural-disruption signal computed at write time (§4.2).
/// Immutable once computed; a pure function of the candidate entry plus the pre-write
/// snapshot — never observes claims or comparisons.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IntegrationCost {
    pub entries_revised: u32,
    pub references_broken: u32,
    pub catalog_shift: f32,
    pub orphan: bool,
}

impl IntegrationCost {
    /// The weighted scalar the catalog projector accumulates per cluster (§4.5).
    pub fn weighted(&self) -> f32 {
        self.entries_revised as f32 * 0.3 + self.references_broken as f32 * 0.5 + self.catalog_shift
    }
}
