use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams, RepoError, UpdateCategoryParams,
};
use crate::domain::categories::{
    CategoryColor, CategoryRecord, MoveDirection, next_display_order, plan_swap, sort_categories,
};
use crate::domain::error::DomainError;
use crate::domain::slug::{SlugError, resolve_category_slug};

#[derive(Debug, Error)]
pub enum AdminCategoryError {
    #[error("{0} must not be empty")]
    ConstraintViolation(&'static str),
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error("category not found")]
    NotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateCategoryCommand {
    pub name: String,
    pub slug: Option<String>,
    pub color: CategoryColor,
}

#[derive(Debug, Clone)]
pub struct UpdateCategoryCommand {
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub color: CategoryColor,
}

/// Category list after a move request. `swapped` is false for boundary
/// no-ops, in which case nothing was written.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryMoveOutcome {
    pub swapped: bool,
    pub categories: Vec<CategoryRecord>,
}

#[derive(Clone)]
pub struct AdminCategoryService {
    reader: Arc<dyn CategoriesRepo>,
    writer: Arc<dyn CategoriesWriteRepo>,
    move_lock: Arc<Mutex<()>>,
}

impl AdminCategoryService {
    pub fn new(reader: Arc<dyn CategoriesRepo>, writer: Arc<dyn CategoriesWriteRepo>) -> Self {
        Self {
            reader,
            writer,
            move_lock: Arc::new(Mutex::new(())),
        }
    }

    /// All categories in display order.
    pub async fn list(&self) -> Result<Vec<CategoryRecord>, AdminCategoryError> {
        let mut categories = self.reader.list_categories().await?;
        sort_categories(&mut categories);
        Ok(categories)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, AdminCategoryError> {
        self.reader
            .find_by_id(id)
            .await
            .map_err(AdminCategoryError::from)
    }

    pub async fn create(
        &self,
        command: CreateCategoryCommand,
    ) -> Result<CategoryRecord, AdminCategoryError> {
        let name = normalize_name(&command.name)?;
        let slug = resolve_category_slug(command.slug.as_deref(), &name)?;

        // Serialized with moves.
        let _guard = self.move_lock.lock().await;
        let existing = self.reader.list_categories().await?;
        let display_order = next_display_order(&existing);

        let category = self
            .writer
            .create_category(CreateCategoryParams {
                name,
                slug,
                color: command.color,
                display_order,
            })
            .await?;

        info!(
            target = "application::categories",
            category_id = %category.id,
            display_order,
            "category created"
        );
        Ok(category)
    }

    pub async fn update(
        &self,
        command: UpdateCategoryCommand,
    ) -> Result<CategoryRecord, AdminCategoryError> {
        let name = normalize_name(&command.name)?;
        let slug = resolve_category_slug(command.slug.as_deref(), &name)?;

        if self.reader.find_by_id(command.id).await?.is_none() {
            return Err(AdminCategoryError::NotFound);
        }

        let category = self
            .writer
            .update_category(UpdateCategoryParams {
                id: command.id,
                name,
                slug,
                color: command.color,
            })
            .await?;
        Ok(category)
    }

    /// Remove a category. Posts keep the category name they were filed under.
    pub async fn delete(&self, id: Uuid) -> Result<(), AdminCategoryError> {
        let _guard = self.move_lock.lock().await;
        if self.reader.find_by_id(id).await?.is_none() {
            return Err(AdminCategoryError::NotFound);
        }
        self.writer.delete_category(id).await?;
        info!(
            target = "application::categories",
            category_id = %id,
            "category deleted"
        );
        Ok(())
    }

    pub async fn move_up(&self, index: usize) -> Result<CategoryMoveOutcome, AdminCategoryError> {
        self.move_at(index, MoveDirection::Up).await
    }

    pub async fn move_down(&self, index: usize) -> Result<CategoryMoveOutcome, AdminCategoryError> {
        self.move_at(index, MoveDirection::Down).await
    }

    /// Move the category at `index` of the current display order one step.
    pub async fn move_at(
        &self,
        index: usize,
        direction: MoveDirection,
    ) -> Result<CategoryMoveOutcome, AdminCategoryError> {
        let _guard = self.move_lock.lock().await;
        let categories = self.list().await?;
        self.swap_locked(categories, index, direction).await
    }

    /// Move a category addressed by id, independent of any list the caller
    /// may hold.
    pub async fn move_category(
        &self,
        id: Uuid,
        direction: MoveDirection,
    ) -> Result<CategoryMoveOutcome, AdminCategoryError> {
        let _guard = self.move_lock.lock().await;
        let categories = self.list().await?;
        let index = categories
            .iter()
            .position(|category| category.id == id)
            .ok_or(AdminCategoryError::NotFound)?;
        self.swap_locked(categories, index, direction).await
    }

    async fn swap_locked(
        &self,
        categories: Vec<CategoryRecord>,
        index: usize,
        direction: MoveDirection,
    ) -> Result<CategoryMoveOutcome, AdminCategoryError> {
        let Some(plan) = plan_swap(&categories, index, direction)? else {
            counter!("folio_category_move_noop_total").increment(1);
            debug!(
                target = "application::categories",
                index,
                ?direction,
                "category already at boundary"
            );
            return Ok(CategoryMoveOutcome {
                swapped: false,
                categories,
            });
        };

        self.writer.swap_display_order(&plan).await?;
        counter!("folio_category_move_total").increment(1);
        info!(
            target = "application::categories",
            moved = %plan.moved.id,
            displaced = %plan.displaced.id,
            ?direction,
            "category order swapped"
        );

        let categories = self.list().await?;
        Ok(CategoryMoveOutcome {
            swapped: true,
            categories,
        })
    }
}

fn normalize_name(value: &str) -> Result<String, AdminCategoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AdminCategoryError::ConstraintViolation("name"));
    }
    Ok(trimmed.to_string())
}
