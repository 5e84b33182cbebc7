use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams, RepoError,
        UpdateCategoryParams,
    },
    domain::categories::{CategoryColor, CategoryRecord, SwapPlan},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    color: String,
    display_order: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<CategoryRow> for CategoryRecord {
    type Error = RepoError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let color = row
            .color
            .parse::<CategoryColor>()
            .map_err(|err| RepoError::Integrity {
                message: err.to_string(),
            })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            color,
            display_order: row.display_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const CATEGORY_COLUMNS: &str = "id, name, slug, color, display_order, created_at, updated_at";

#[async_trait]
impl CategoriesRepo for PostgresRepositories {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY display_order ASC, created_at ASC, id ASC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(CategoryRecord::try_from).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(CategoryRecord::try_from).transpose()
    }
}

#[async_trait]
impl CategoriesWriteRepo for PostgresRepositories {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO categories (id, name, slug, color, display_order) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&params.name)
        .bind(&params.slug)
        .bind(params.color.as_str())
        .bind(params.display_order)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn update_category(
        &self,
        params: UpdateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "UPDATE categories \
             SET name = $2, slug = $3, color = $4, updated_at = now() \
             WHERE id = $1 \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(params.id)
        .bind(&params.name)
        .bind(&params.slug)
        .bind(params.color.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        row.try_into()
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn swap_display_order(&self, plan: &SwapPlan) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        for assignment in [plan.moved, plan.displaced] {
            let result = sqlx::query(
                "UPDATE categories SET display_order = $3, updated_at = now() \
                 WHERE id = $1 AND display_order = $2",
            )
            .bind(assignment.id)
            .bind(assignment.from)
            .bind(assignment.to)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            if result.rows_affected() != 1 {
                tx.rollback().await.map_err(map_sqlx_error)?;
                return Err(RepoError::Integrity {
                    message: format!(
                        "category {} no longer holds display_order {}",
                        assignment.id, assignment.from
                    ),
                });
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
