#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, header};
use folio::application::categories::AdminCategoryService;
use folio::application::comments::{AdminCommentService, PublicCommentService};
use folio::application::feed::FeedService;
use folio::application::posts::AdminPostService;
use folio::application::render::{MarkdownRenderer, PreviewRenderer};
use folio::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, CommentsRepo, CreateCategoryParams, CreateCommentParams,
    CreatePostParams, PostListScope, PostsRepo, PostsWriteRepo, RepoError, UpdateCategoryParams,
    UpdatePostParams,
};
use folio::application::uploads::ImageUploadService;
use folio::domain::categories::{CategoryColor, CategoryRecord, SwapPlan};
use folio::domain::comments::CommentRecord;
use folio::domain::posts::PostRecord;
use folio::infra::http::{AdminCredentials, AppState, build_router};
use folio::infra::uploads::FilesystemObjectStore;
use http_body_util::BodyExt;
use tempfile::TempDir;
use time::{Duration as TimeDuration, OffsetDateTime};
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

pub const ADMIN_TOKEN: &str = "test-admin-token";

#[derive(Default)]
pub struct MemoryCategories {
    rows: Mutex<Vec<CategoryRecord>>,
    swaps: Mutex<usize>,
}

impl MemoryCategories {
    pub fn seed(&self, name: &str, display_order: i32) -> Uuid {
        let id = Uuid::new_v4();
        let created_at = OffsetDateTime::UNIX_EPOCH + TimeDuration::seconds(display_order.into());
        self.rows.lock().unwrap().push(CategoryRecord {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
            color: CategoryColor::Blue,
            display_order,
            created_at,
            updated_at: created_at,
        });
        id
    }

    pub fn swaps(&self) -> usize {
        *self.swaps.lock().unwrap()
    }
}

#[async_trait]
impl CategoriesRepo for MemoryCategories {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self.rows.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }
}

#[async_trait]
impl CategoriesWriteRepo for MemoryCategories {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|c| c.name == params.name) {
            return Err(RepoError::Duplicate {
                constraint: "categories_name_key".into(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let category = CategoryRecord {
            id: Uuid::new_v4(),
            name: params.name,
            slug: params.slug,
            color: params.color,
            display_order: params.display_order,
            created_at: now,
            updated_at: now,
        };
        rows.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        params: UpdateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|c| c.id == params.id)
            .ok_or(RepoError::NotFound)?;
        row.name = params.name;
        row.slug = params.slug;
        row.color = params.color;
        Ok(row.clone())
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| c.id != id);
        if rows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn swap_display_order(&self, plan: &SwapPlan) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().unwrap();
        for assignment in [plan.moved, plan.displaced] {
            let current = rows
                .iter()
                .find(|c| c.id == assignment.id)
                .map(|c| c.display_order);
            if current != Some(assignment.from) {
                return Err(RepoError::Integrity {
                    message: "display order changed concurrently".into(),
                });
            }
        }
        for assignment in [plan.moved, plan.displaced] {
            if let Some(row) = rows.iter_mut().find(|c| c.id == assignment.id) {
                row.display_order = assignment.to;
            }
        }
        *self.swaps.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPosts {
    rows: Mutex<Vec<PostRecord>>,
}

impl MemoryPosts {
    pub fn seed(&self, title: &str, category: &str, published: bool, age_days: i64) -> Uuid {
        let id = Uuid::new_v4();
        let created_at = OffsetDateTime::now_utc() - TimeDuration::days(age_days);
        self.rows.lock().unwrap().push(PostRecord {
            id,
            title: title.to_string(),
            excerpt: format!("{title} excerpt"),
            body_markdown: format!("# {title}\n\nSome words here."),
            category: category.to_string(),
            cover_image: None,
            spotify_track_id: None,
            published,
            author: "admin".into(),
            created_at,
            updated_at: created_at,
        });
        id
    }
}

#[async_trait]
impl PostsRepo for MemoryPosts {
    async fn list_posts(&self, scope: PostListScope) -> Result<Vec<PostRecord>, RepoError> {
        let mut rows: Vec<PostRecord> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|post| scope == PostListScope::Admin || post.published)
            .cloned()
            .collect();
        rows.sort_by(|lhs, rhs| rhs.created_at.cmp(&lhs.created_at));
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryPosts {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let post = PostRecord {
            id: Uuid::new_v4(),
            title: params.title,
            excerpt: params.excerpt,
            body_markdown: params.body_markdown,
            category: params.category,
            cover_image: params.cover_image,
            spotify_track_id: params.spotify_track_id,
            published: params.published,
            author: params.author,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        row.title = params.title;
        row.excerpt = params.excerpt;
        row.body_markdown = params.body_markdown;
        row.category = params.category;
        row.cover_image = params.cover_image;
        row.spotify_track_id = params.spotify_track_id;
        if let Some(published) = params.published {
            row.published = published;
        }
        Ok(row.clone())
    }

    async fn set_published(&self, id: Uuid, published: bool) -> Result<PostRecord, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        row.published = published;
        Ok(row.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryComments {
    rows: Mutex<Vec<CommentRecord>>,
}

#[async_trait]
impl CommentsRepo for MemoryComments {
    async fn list_comments(&self) -> Result<Vec<CommentRecord>, RepoError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|lhs, rhs| rhs.created_at.cmp(&lhs.created_at));
        Ok(rows)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = self.list_comments().await?;
        Ok(rows.into_iter().filter(|c| c.post_id == post_id).collect())
    }

    async fn create_comment(&self, params: CreateCommentParams) -> Result<CommentRecord, RepoError> {
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_name: params.author_name,
            content: params.content,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| c.id != id);
        if rows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| c.post_id != post_id);
        Ok((before - rows.len()) as u64)
    }
}

pub struct TestApp {
    pub router: Router,
    pub categories: Arc<MemoryCategories>,
    pub posts: Arc<MemoryPosts>,
    pub comments: Arc<MemoryComments>,
    pub media_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let categories = Arc::new(MemoryCategories::default());
        let posts = Arc::new(MemoryPosts::default());
        let comments = Arc::new(MemoryComments::default());
        let media_dir = tempfile::tempdir().expect("tempdir");

        let media = Arc::new(FilesystemObjectStore::new(
            media_dir.path().to_path_buf(),
            Url::parse("http://localhost:3000/media/").expect("url"),
        ));
        let renderer: Arc<dyn PreviewRenderer> = Arc::new(MarkdownRenderer::new());

        let state = AppState {
            feed: Arc::new(FeedService::new(
                posts.clone(),
                categories.clone(),
                renderer.clone(),
            )),
            categories: Arc::new(AdminCategoryService::new(
                categories.clone(),
                categories.clone(),
            )),
            posts: Arc::new(AdminPostService::new(posts.clone(), posts.clone())),
            comments: Arc::new(AdminCommentService::new(comments.clone())),
            public_comments: Arc::new(PublicCommentService::new(
                comments.clone(),
                posts.clone(),
            )),
            uploads: Arc::new(ImageUploadService::new(media.clone(), 1024 * 1024)),
            media,
            renderer,
            admin: AdminCredentials::new(ADMIN_TOKEN, "Site Admin"),
            scroll_debounce: Duration::from_millis(50),
            upload_limit_bytes: 2 * 1024 * 1024,
            db: None,
        };

        Self {
            router: build_router(state),
            categories,
            posts,
            comments,
            media_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
    }

    pub async fn admin_json(
        &self,
        method: Method,
        uri: &str,
        body: serde_json::Value,
    ) -> Response<Body> {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request should build"),
        )
        .await
    }

    pub async fn admin_get(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
    }
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be json")
}

pub const BOUNDARY: &str = "folio-test-boundary";

/// One part of a hand-built `multipart/form-data` body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn admin_multipart(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("request should build")
}
