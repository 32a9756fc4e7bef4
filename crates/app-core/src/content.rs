//! Meme posts and comments
//!
//! The feed is currently served from a static list bundled with the app.
//! [`StaticContent`] holds that list and plugs into the pagination loader as
//! a [`ContentSource`].

use app_state::ContentSource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content loading errors
#[derive(Debug, Error)]
pub enum ContentError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for content operations
pub type Result<T> = std::result::Result<T, ContentError>;

/// A meme post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post id
    pub id: u64,
    /// Author uid
    pub author_id: String,
    /// Caption or image reference
    pub content: String,
    /// Like count
    #[serde(default)]
    pub likes: u32,
}

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment id
    pub id: u64,
    /// Post the comment belongs to
    pub post_id: u64,
    /// Author uid
    pub author_id: String,
    /// Comment text
    pub content: String,
    /// Like count
    #[serde(default)]
    pub likes: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ContentBundle {
    #[serde(default)]
    posts: Vec<Post>,
    #[serde(default)]
    comments: Vec<Comment>,
}

/// In-memory list of posts and comments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticContent {
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl StaticContent {
    /// Create from a list of posts
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts, comments: Vec::new() }
    }

    /// Attach comments
    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self
    }

    /// Parse a bundle of the form `{"posts": [...], "comments": [...]}`
    pub fn from_json(json: &str) -> Result<Self> {
        let bundle: ContentBundle = serde_json::from_str(json)?;
        Ok(Self { posts: bundle.posts, comments: bundle.comments })
    }

    /// All posts in feed order
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Look up a post by id
    pub fn post(&self, id: u64) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    /// Posts by one author
    pub fn posts_by<'a>(&'a self, author_id: &'a str) -> impl Iterator<Item = &'a Post> + 'a {
        self.posts.iter().filter(move |p| p.author_id == author_id)
    }

    /// Comments on a post, in insertion order
    pub fn comments_for(&self, post_id: u64) -> Vec<&Comment> {
        self.comments.iter().filter(|c| c.post_id == post_id).collect()
    }
}

impl ContentSource for StaticContent {
    fn len(&self) -> usize {
        self.posts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_state::{FeedLoader, LoadOutcome};

    fn sample() -> StaticContent {
        StaticContent::from_json(
            r#"{
                "posts": [
                    {"id": 1, "authorId": "alice", "content": "cat.png", "likes": 3},
                    {"id": 2, "authorId": "bob", "content": "dog.png"}
                ],
                "comments": [
                    {"id": 10, "postId": 1, "authorId": "bob", "content": "kkkk", "likes": 1},
                    {"id": 11, "postId": 2, "authorId": "alice", "content": "lol"},
                    {"id": 12, "postId": 1, "authorId": "carol", "content": "top"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_from_json() {
        let content = sample();
        assert_eq!(content.posts().len(), 2);
        assert_eq!(content.post(2).unwrap().likes, 0);
        assert!(content.post(3).is_none());
    }

    #[test]
    fn test_comments_for() {
        let content = sample();
        let ids: Vec<u64> = content.comments_for(1).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![10, 12]);
        assert!(content.comments_for(99).is_empty());
    }

    #[test]
    fn test_posts_by() {
        let content = sample();
        assert_eq!(content.posts_by("alice").count(), 1);
    }

    #[test]
    fn test_invalid_json() {
        assert!(StaticContent::from_json("{\"posts\": 3}").is_err());
    }

    #[test]
    fn test_as_content_source() {
        let posts = (0..12)
            .map(|id| Post { id, author_id: "a".into(), content: String::new(), likes: 0 })
            .collect();
        let mut loader = FeedLoader::new(StaticContent::new(posts));

        assert_eq!(loader.load_next(), LoadOutcome::Advanced { page: 2, total: 2 });
    }
}
