//! Customer stories

use shared::models::{NewStory, Story};

use super::{BookingService, StoryRequest, text};
use crate::error::ServiceResult;
use crate::validation::{
    MAX_NAME_LEN, MAX_STORY_LEN, present, require_fields, validate_email, validate_required_text,
};

impl BookingService {
    pub async fn submit_story(&self, req: StoryRequest) -> ServiceResult<Story> {
        require_fields(&[("name", present(&req.name)), ("content", present(&req.content))])?;
        let new = NewStory {
            name: validate_required_text(text(&req.name), "name", MAX_NAME_LEN)?,
            email: validate_email(req.email.as_deref())?,
            content: validate_required_text(text(&req.content), "content", MAX_STORY_LEN)?,
        };
        let story = self.store.insert_story(new, self.now_millis()).await?;
        tracing::info!(id = story.id, "Story submitted");
        Ok(story)
    }

    pub async fn list_stories(&self) -> ServiceResult<Vec<Story>> {
        Ok(self.store.list_stories().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use chrono::Duration;
    use shared::error::ErrorCode;

    #[tokio::test]
    async fn stories_list_newest_first() {
        let (service, clock) = service();
        service
            .submit_story(StoryRequest {
                name: Some("Kim".into()),
                email: None,
                content: Some("Lovely evening".into()),
            })
            .await
            .unwrap();
        clock.advance(Duration::minutes(5));
        service
            .submit_story(StoryRequest {
                name: Some("Lee".into()),
                email: Some("lee@example.com".into()),
                content: Some("Best pasta in town".into()),
            })
            .await
            .unwrap();

        let stories = service.list_stories().await.unwrap();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].name, "Lee");
    }

    #[tokio::test]
    async fn story_needs_content_within_limit() {
        let (service, _) = service();
        let missing = service
            .submit_story(StoryRequest {
                name: Some("Kim".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(missing.code(), Some(ErrorCode::RequiredField));

        let long = service
            .submit_story(StoryRequest {
                name: Some("Kim".into()),
                email: None,
                content: Some("x".repeat(MAX_STORY_LEN + 1)),
            })
            .await
            .unwrap_err();
        assert_eq!(long.code(), Some(ErrorCode::ValidationFailed));
    }
}
