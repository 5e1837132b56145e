use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};
use uuid::Uuid;

pub const CHOICES_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub choices: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    pub difficulty: i64,
}

impl QuizQuestion {
    /// A question is usable only when it has exactly four choices, the
    /// correct answer is one of them, and difficulty sits in 1..=5.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.choices.len() != CHOICES_PER_QUESTION {
            return Err(AppError::QuizValidation(format!(
                "Question '{}' has {} choices, expected {}",
                self.id,
                self.choices.len(),
                CHOICES_PER_QUESTION
            )));
        }
        if !self.choices.contains(&self.correct_answer) {
            return Err(AppError::QuizValidation(format!(
                "Question '{}' lists a correct answer that is not among its choices",
                self.id
            )));
        }
        if !(1..=5).contains(&self.difficulty) {
            return Err(AppError::QuizValidation(format!(
                "Question '{}' has difficulty {}, expected 1..=5",
                self.id, self.difficulty
            )));
        }
        Ok(())
    }
}

stored_object!(Quiz, "quiz", {
    video_id: String,
    course_id: String,
    questions: Vec<QuizQuestion>
});

impl Quiz {
    pub fn new(video_id: String, course_id: String, questions: Vec<QuizQuestion>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            video_id,
            course_id,
            questions,
        }
    }

    pub async fn find_by_video(
        db: &SurrealDbClient,
        video_id: &str,
    ) -> Result<Option<Quiz>, AppError> {
        let quiz: Option<Quiz> = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE video_id = $video_id \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(("table", Self::table_name()))
            .bind(("video_id", video_id.to_string()))
            .await?
            .take(0)?;
        Ok(quiz)
    }

    pub async fn delete_by_video_ids(
        db: &SurrealDbClient,
        video_ids: &[String],
    ) -> Result<(), AppError> {
        if video_ids.is_empty() {
            return Ok(());
        }
        db.client
            .query("DELETE type::table($table) WHERE video_id IN $video_ids")
            .bind(("table", Self::table_name()))
            .bind(("video_ids", video_ids.to_vec()))
            .await?;
        Ok(())
    }
}
