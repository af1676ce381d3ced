use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct IngredientResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "flour")]
    pub name: String,
    #[schema(example = "g")]
    pub measurement_unit: String,
}

impl From<crate::entity::ingredient::Model> for IngredientResponse {
    fn from(m: crate::entity::ingredient::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            measurement_unit: m.measurement_unit,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct IngredientSearchQuery {
    /// Case-insensitive name prefix. Missing or empty returns no ingredients.
    pub name: Option<String>,
}

/// One entry of an ingredient catalog file.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub measurement_unit: String,
}
