use std::collections::HashSet;
use std::path::Path;

use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{ingredient, recipe, recipe_ingredient};
use crate::models::ingredient::CatalogEntry;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed catalog file: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Trim names and units, skip blank names and keep repeated (name, unit)
/// pairs once.
fn normalize(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .map(|e| CatalogEntry {
            name: e.name.trim().to_string(),
            measurement_unit: e.measurement_unit.trim().to_string(),
        })
        .filter(|e| !e.name.is_empty())
        .filter(|e| seen.insert((e.name.clone(), e.measurement_unit.clone())))
        .collect()
}

/// Parse a JSON catalog: an array of `{name, measurement_unit}`.
pub fn parse_catalog(raw: &str) -> Result<Vec<CatalogEntry>, serde_json::Error> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(raw)?;
    Ok(normalize(entries))
}

/// Parse a CSV catalog: headerless `name,measurement_unit` rows.
pub fn parse_catalog_csv(raw: &str) -> Result<Vec<CatalogEntry>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());
    let entries = reader
        .deserialize::<CatalogEntry>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(normalize(entries))
}

/// Insert the catalog entries that are not stored yet. Returns how many
/// ingredients were added; running it twice adds nothing the second time.
pub async fn load_ingredients<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    entries: Vec<CatalogEntry>,
) -> Result<usize, SeedError> {
    let txn = db.begin().await?;

    let existing: HashSet<(String, String)> = ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Name)
        .column(ingredient::Column::MeasurementUnit)
        .into_tuple::<(String, String)>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();

    let missing: Vec<ingredient::ActiveModel> = entries
        .into_iter()
        .filter(|e| !existing.contains(&(e.name.clone(), e.measurement_unit.clone())))
        .map(|e| ingredient::ActiveModel {
            name: Set(e.name),
            measurement_unit: Set(e.measurement_unit),
            ..Default::default()
        })
        .collect();

    let inserted = missing.len();
    if inserted > 0 {
        ingredient::Entity::insert_many(missing)
            .exec_without_returning(&txn)
            .await?;
    }
    txn.commit().await?;

    if inserted > 0 {
        info!("Seeded {} new ingredients", inserted);
    }
    Ok(inserted)
}

/// Read a catalog file and load it with [`load_ingredients`]. Files ending
/// in `.csv` are read as CSV, anything else as JSON.
pub async fn load_ingredients_file<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    path: impl AsRef<Path>,
) -> Result<usize, SeedError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await?;
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let entries = if is_csv {
        parse_catalog_csv(&raw)?
    } else {
        parse_catalog(&raw)?
    };
    load_ingredients(db, entries).await
}

async fn create_index(db: &DatabaseConnection, name: &str, stmt: IndexCreateStatement) {
    let sql = match db.get_database_backend() {
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(PostgresQueryBuilder),
    };

    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
    }
}

/// Ensure secondary indexes that schema sync does not create.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Recipe listing: WHERE author_id = ? ORDER BY pub_date DESC
    create_index(
        db,
        "idx_recipe_author_pub_date",
        Index::create()
            .if_not_exists()
            .name("idx_recipe_author_pub_date")
            .table(recipe::Entity)
            .col(recipe::Column::AuthorId)
            .col(recipe::Column::PubDate)
            .to_owned(),
    )
    .await;

    // Reverse lookup from an ingredient to the recipes using it.
    create_index(
        db,
        "idx_recipe_ingredient_ingredient",
        Index::create()
            .if_not_exists()
            .name("idx_recipe_ingredient_ingredient")
            .table(recipe_ingredient::Entity)
            .col(recipe_ingredient::Column::IngredientId)
            .to_owned(),
    )
    .await;

    Ok(())
}
