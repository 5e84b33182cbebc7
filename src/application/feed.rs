//! Public read models: home page, blog listing and post detail.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::render::{PreviewRenderer, RenderError};
use crate::application::repos::{CategoriesRepo, PostListScope, PostsRepo, RepoError};
use crate::domain::categories::{
    CategoryColor, CategoryRecord, ColorClasses, classes_for, sort_categories,
};
use crate::domain::posts::{
    DETAIL_WORDS_PER_MINUTE, LISTING_WORDS_PER_MINUTE, PostRecord, ReadingTime,
    home_reading_time, reading_time,
};

/// Number of posts featured on the home page.
pub const HOME_POST_LIMIT: usize = 3;

/// Category filter value that disables filtering.
pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub category_classes: ColorClasses,
    pub cover_image: Option<String>,
    pub spotify_track_id: Option<String>,
    pub author: String,
    pub reading_time: ReadingTime,
    pub reading_time_label: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryFilterEntry {
    pub name: String,
    pub slug: String,
    pub color: CategoryColor,
    pub classes: ColorClasses,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogListing {
    pub selected: String,
    pub categories: Vec<CategoryFilterEntry>,
    pub posts: Vec<PostSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeFeed {
    pub latest: Vec<PostSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub summary: PostSummary,
    pub html: String,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    categories: Arc<dyn CategoriesRepo>,
    renderer: Arc<dyn PreviewRenderer>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        categories: Arc<dyn CategoriesRepo>,
        renderer: Arc<dyn PreviewRenderer>,
    ) -> Self {
        Self {
            posts,
            categories,
            renderer,
        }
    }

    /// The most recent published posts.
    pub async fn home(&self) -> Result<HomeFeed, FeedError> {
        let palette = self.palette().await?;
        let latest = self
            .posts
            .list_posts(PostListScope::Public)
            .await?
            .iter()
            .take(HOME_POST_LIMIT)
            .map(|post| summarize(post, &palette, home_reading_time(&post.body_markdown)))
            .collect();
        Ok(HomeFeed { latest })
    }

    /// Published posts, optionally restricted to one category name. `None`,
    /// blank input and [`ALL_CATEGORIES`] return every post.
    pub async fn list(&self, category: Option<&str>) -> Result<BlogListing, FeedError> {
        let mut categories = self.categories.list_categories().await?;
        sort_categories(&mut categories);
        let palette = palette_of(&categories);

        let selected = category
            .map(str::trim)
            .filter(|value| !value.is_empty() && *value != ALL_CATEGORIES);

        let posts = self
            .posts
            .list_posts(PostListScope::Public)
            .await?
            .iter()
            .filter(|post| selected.is_none_or(|name| post.category == name))
            .map(|post| {
                let minutes = reading_time(&post.body_markdown, LISTING_WORDS_PER_MINUTE);
                summarize(post, &palette, minutes)
            })
            .collect();

        let categories = categories
            .into_iter()
            .map(|category| CategoryFilterEntry {
                classes: category.color.classes(),
                name: category.name,
                slug: category.slug,
                color: category.color,
            })
            .collect();

        Ok(BlogListing {
            selected: selected.unwrap_or(ALL_CATEGORIES).to_string(),
            categories,
            posts,
        })
    }

    /// A published post with its rendered body. Drafts are not found.
    pub async fn post(&self, id: Uuid) -> Result<PostDetail, FeedError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .filter(|post| post.published)
            .ok_or(FeedError::NotFound)?;

        let palette = self.palette().await?;
        let rendered = self.renderer.render(&post.body_markdown)?;

        Ok(PostDetail {
            summary: summarize(
                &post,
                &palette,
                reading_time(&post.body_markdown, DETAIL_WORDS_PER_MINUTE),
            ),
            html: rendered.html,
        })
    }

    async fn palette(&self) -> Result<HashMap<String, CategoryColor>, FeedError> {
        let categories = self.categories.list_categories().await?;
        Ok(palette_of(&categories))
    }
}

fn palette_of(categories: &[CategoryRecord]) -> HashMap<String, CategoryColor> {
    categories
        .iter()
        .map(|category| (category.name.clone(), category.color))
        .collect()
}

fn summarize(
    post: &PostRecord,
    palette: &HashMap<String, CategoryColor>,
    reading_time: ReadingTime,
) -> PostSummary {
    PostSummary {
        id: post.id,
        title: post.title.clone(),
        excerpt: post.excerpt.clone(),
        category: post.category.clone(),
        category_classes: classes_for(palette.get(&post.category).map(|color| color.as_str())),
        cover_image: post.cover_image.clone(),
        spotify_track_id: post.spotify_track_id.clone(),
        author: post.author.clone(),
        reading_time,
        reading_time_label: reading_time.to_string(),
        created_at: post.created_at,
    }
}
