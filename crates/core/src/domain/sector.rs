use serde::{Deserialize, Serialize};

use super::ids::SectorId;

/// Business-category grouping for templates (e-commerce, car rental, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub id: SectorId,
    pub slug: String,
    pub name: String,
}
