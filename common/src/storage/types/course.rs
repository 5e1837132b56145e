use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};
use uuid::Uuid;

use super::{
    course_job::CourseJob, course_video::CourseVideo, quiz::Quiz, summary::Summary,
    transcript_chunk::TranscriptChunk, video::Video,
};

stored_object!(Course, "course", {
    title: String,
    description: String,
    owner_id: Option<String>,
    is_public: bool
});

impl Course {
    pub fn new(
        title: String,
        description: String,
        owner_id: Option<String>,
        is_public: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            title,
            description,
            owner_id,
            is_public,
        }
    }

    pub async fn ids_for_owner(
        db: &SurrealDbClient,
        owner_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let courses: Vec<Course> = db
            .client
            .query("SELECT * FROM type::table($table) WHERE owner_id = $owner_id")
            .bind(("table", Self::table_name()))
            .bind(("owner_id", owner_id.to_string()))
            .await?
            .take(0)?;
        Ok(courses.into_iter().map(|course| course.id).collect())
    }

    /// Delete a course and everything hanging off it. Derived content goes
    /// first so a crash mid-way never leaves orphans pointing at a deleted
    /// course.
    pub async fn delete_cascade(db: &SurrealDbClient, course_id: &str) -> Result<(), AppError> {
        let video_ids = CourseVideo::video_ids_for_course(db, course_id).await?;

        Quiz::delete_by_video_ids(db, &video_ids).await?;
        Summary::delete_by_video_ids(db, &video_ids).await?;
        TranscriptChunk::delete_by_video_ids(db, &video_ids).await?;
        Video::delete_many(db, &video_ids).await?;
        CourseVideo::delete_by_course(db, course_id).await?;
        CourseJob::delete_by_course(db, course_id).await?;
        db.delete_item::<Course>(course_id).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::quiz::QuizQuestion;

    #[tokio::test]
    async fn test_delete_cascade_removes_all_derived_content() {
        let db = SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .expect("in-memory surrealdb");

        let course = Course::new("Rust basics".to_string(), "Intro".to_string(), None, true);
        db.store_item(course.clone()).await.expect("store course");

        let video = Video::new(
            "vid_a".to_string(),
            "Ownership".to_string(),
            String::new(),
            "Channel".to_string(),
            None,
            None,
            Some("transcript text".to_string()),
        );
        video.upsert(&db).await.expect("store video");

        db.store_item(CourseVideo::new(
            course.id.clone(),
            "vid_a".to_string(),
            0,
        ))
        .await
        .expect("store link");
        db.store_item(TranscriptChunk::new(
            "vid_a".to_string(),
            0,
            "chunk text".to_string(),
            vec![0.1, 0.2],
        ))
        .await
        .expect("store chunk");
        db.store_item(Summary::new(
            "vid_a".to_string(),
            course.id.clone(),
            "summary".to_string(),
        ))
        .await
        .expect("store summary");
        db.store_item(Quiz::new(
            "vid_a".to_string(),
            course.id.clone(),
            vec![QuizQuestion {
                id: "q1".to_string(),
                question: "?".to_string(),
                choices: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: "a".to_string(),
                difficulty: 1,
            }],
        ))
        .await
        .expect("store quiz");
        db.store_item(CourseJob::new(course.id.clone(), "vid_a".to_string(), 2, 5, 3))
            .await
            .expect("store job");

        // An unrelated course survives the cascade
        let other = Course::new("Other".to_string(), String::new(), None, false);
        db.store_item(other.clone()).await.expect("store other");

        Course::delete_cascade(&db, &course.id)
            .await
            .expect("cascade delete");

        assert!(db
            .get_item::<Course>(&course.id)
            .await
            .expect("fetch")
            .is_none());
        assert!(db.get_all_stored_items::<Video>().await.expect("fetch").is_empty());
        assert!(db
            .get_all_stored_items::<TranscriptChunk>()
            .await
            .expect("fetch")
            .is_empty());
        assert!(db
            .get_all_stored_items::<Summary>()
            .await
            .expect("fetch")
            .is_empty());
        assert!(db.get_all_stored_items::<Quiz>().await.expect("fetch").is_empty());
        assert!(db
            .get_all_stored_items::<CourseVideo>()
            .await
            .expect("fetch")
            .is_empty());
        assert!(db
            .get_all_stored_items::<CourseJob>()
            .await
            .expect("fetch")
            .is_empty());
        assert!(db
            .get_item::<Course>(&other.id)
            .await
            .expect("fetch")
            .is_some());
    }
}
