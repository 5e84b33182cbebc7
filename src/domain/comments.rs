use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_name: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Moderation filter applied to an already fetched comment list.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub post_id: Option<Uuid>,
    pub search: Option<String>,
}

impl CommentFilter {
    pub fn matches(&self, comment: &CommentRecord) -> bool {
        if let Some(post_id) = self.post_id
            && comment.post_id != post_id
        {
            return false;
        }

        match self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        {
            Some(term) => {
                let needle = term.to_lowercase();
                comment.author_name.to_lowercase().contains(&needle)
                    || comment.content.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }

    pub fn apply(&self, comments: Vec<CommentRecord>) -> Vec<CommentRecord> {
        comments
            .into_iter()
            .filter(|comment| self.matches(comment))
            .collect()
    }
}
