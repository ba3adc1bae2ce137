use crate::{
    error::{AppError, AppResult},
    posts::{
        dto::{CreatePostRequest, UpdatePostRequest},
        repo_types::{NewPost, PostChanges},
    },
};
use uuid::Uuid;

pub const STATUSES: [&str; 3] = ["draft", "published", "archived"];

/// Lowercases, turns spaces into dashes and drops `. , ! ?`.
pub fn generate_slug(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '!' | '?'))
        .collect()
}

fn title_and_slug(title: &str) -> AppResult<(String, String)> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    let slug = generate_slug(title);
    if slug.is_empty() {
        return Err(AppError::validation("Title must contain more than punctuation"));
    }
    Ok((title.to_string(), slug))
}

fn check_status(status: &str) -> AppResult<String> {
    let status = status.trim().to_lowercase();
    if STATUSES.contains(&status.as_str()) {
        Ok(status)
    } else {
        Err(AppError::validation(format!(
            "Invalid status, expected one of {}",
            STATUSES.join(", ")
        )))
    }
}

pub fn new_post(author_id: Uuid, req: CreatePostRequest) -> AppResult<NewPost> {
    let (title, slug) = title_and_slug(&req.title)?;
    let status = match req.status {
        Some(s) => check_status(&s)?,
        None => "draft".to_string(),
    };
    Ok(NewPost {
        title,
        content: req.content.unwrap_or_default(),
        slug,
        author_id,
        status,
    })
}

pub fn post_changes(req: UpdatePostRequest) -> AppResult<PostChanges> {
    let (title, slug) = match req.title {
        Some(t) => {
            let (title, slug) = title_and_slug(&t)?;
            (Some(title), Some(slug))
        }
        None => (None, None),
    };
    let status = req.status.as_deref().map(check_status).transpose()?;
    Ok(PostChanges {
        title,
        slug,
        content: req.content,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_title() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("  Why Rust? v1.2 "), "why-rust-v12");
        assert_eq!(generate_slug("already-slugged"), "already-slugged");
    }

    #[test]
    fn new_post_defaults_to_draft() {
        let post = new_post(
            Uuid::new_v4(),
            CreatePostRequest {
                title: "First Post".into(),
                content: None,
                status: None,
            },
        )
        .unwrap();
        assert_eq!(post.status, "draft");
        assert_eq!(post.slug, "first-post");
        assert_eq!(post.content, "");
    }

    #[test]
    fn new_post_requires_title_and_valid_status() {
        let blank = CreatePostRequest {
            title: "  ".into(),
            content: None,
            status: None,
        };
        assert!(matches!(new_post(Uuid::new_v4(), blank), Err(AppError::Validation(_))));

        let punct = CreatePostRequest {
            title: "?!".into(),
            content: None,
            status: None,
        };
        assert!(matches!(new_post(Uuid::new_v4(), punct), Err(AppError::Validation(_))));

        let bad_status = CreatePostRequest {
            title: "ok".into(),
            content: None,
            status: Some("live".into()),
        };
        assert!(matches!(new_post(Uuid::new_v4(), bad_status), Err(AppError::Validation(_))));
    }

    #[test]
    fn retitling_regenerates_slug() {
        let changes = post_changes(UpdatePostRequest {
            title: Some("New Title".into()),
            status: Some("Published".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.slug.as_deref(), Some("new-title"));
        assert_eq!(changes.status.as_deref(), Some("published"));
        assert!(changes.content.is_none());

        let untouched = post_changes(UpdatePostRequest::default()).unwrap();
        assert!(untouched.title.is_none() && untouched.slug.is_none());
    }
}
