use common::{
    error::AppError,
    storage::types::{quiz::Quiz, summary::Summary, video::Video},
};
use state_machines::core::GuardError;
use tracing::{debug, instrument};

use super::{
    context::JobContext,
    state::{ChunksStored, CourseMachine, Generated, Persisted, Ready, Retrieved, VideoLoaded},
};

#[instrument(level = "trace", skip_all, fields(job_id = %ctx.job_id, video_id = %ctx.video_id))]
pub async fn load_video(
    machine: CourseMachine<(), Ready>,
    ctx: &mut JobContext<'_>,
) -> Result<CourseMachine<(), VideoLoaded>, AppError> {
    let bundle = ctx.services.fetch_bundle(&ctx.video_id).await?;

    let Some(transcript) = bundle.transcript.clone() else {
        return Err(AppError::MissingTranscript(format!(
            "Video {} has no caption track",
            ctx.video_id
        )));
    };

    let video = Video::new(
        ctx.video_id.clone(),
        bundle.metadata.title.clone(),
        bundle.metadata.description.clone(),
        bundle.metadata.channel_title.clone(),
        bundle.channel_thumbnail.clone(),
        bundle.metadata.thumbnail.clone(),
        Some(transcript.clone()),
    );
    video.upsert(ctx.db).await?;

    debug!(
        job_id = %ctx.job_id,
        video_id = %ctx.video_id,
        title = %bundle.metadata.title,
        transcript_chars = transcript.chars().count(),
        "video loaded"
    );

    ctx.bundle = Some(bundle);

    machine
        .load()
        .map_err(|(_, guard)| map_guard_error("load", &guard))
}

#[instrument(level = "trace", skip_all, fields(job_id = %ctx.job_id, video_id = %ctx.video_id))]
pub async fn store_chunks(
    machine: CourseMachine<(), VideoLoaded>,
    ctx: &mut JobContext<'_>,
) -> Result<CourseMachine<(), ChunksStored>, AppError> {
    let transcript = ctx.transcript()?.to_string();
    let batch = ctx.services.store_chunks(&ctx.video_id, &transcript).await?;

    if batch.stored == 0 && !batch.failed.is_empty() {
        return Err(AppError::EmbeddingService(format!(
            "All {} chunks failed to embed for video {}",
            batch.failed.len(),
            ctx.video_id
        )));
    }

    debug!(
        job_id = %ctx.job_id,
        video_id = %ctx.video_id,
        stored = batch.stored,
        failed = batch.failed.len(),
        "chunks stored"
    );

    ctx.batch = Some(batch);

    machine
        .store_chunks()
        .map_err(|(_, guard)| map_guard_error("store_chunks", &guard))
}

#[instrument(level = "trace", skip_all, fields(job_id = %ctx.job_id, video_id = %ctx.video_id))]
pub async fn retrieve(
    machine: CourseMachine<(), ChunksStored>,
    ctx: &mut JobContext<'_>,
) -> Result<CourseMachine<(), Retrieved>, AppError> {
    let transcript = ctx.transcript()?.to_string();
    let chunks = ctx
        .services
        .retrieve_chunks(&ctx.video_id, &transcript)
        .await?;

    let retrieved_text = chunks
        .iter()
        .map(|chunk| format!("- {}", chunk.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n");

    debug!(
        job_id = %ctx.job_id,
        video_id = %ctx.video_id,
        chunk_count = chunks.len(),
        "relevant chunks retrieved"
    );

    ctx.retrieved_text = Some(retrieved_text);

    machine
        .retrieve()
        .map_err(|(_, guard)| map_guard_error("retrieve", &guard))
}

#[instrument(level = "trace", skip_all, fields(job_id = %ctx.job_id, video_id = %ctx.video_id))]
pub async fn generate(
    machine: CourseMachine<(), Retrieved>,
    ctx: &mut JobContext<'_>,
) -> Result<CourseMachine<(), Generated>, AppError> {
    let text = ctx.retrieved_text()?.to_string();
    let params = ctx.params;

    let (summary, quiz) = tokio::join!(
        ctx.services.generate_summary(&text, params.summary_detail),
        ctx.services
            .generate_quiz(&text, params.difficulty, params.question_count),
    );

    ctx.summary = Some(summary?);
    ctx.quiz = Some(quiz?);

    machine
        .generate()
        .map_err(|(_, guard)| map_guard_error("generate", &guard))
}

#[instrument(level = "trace", skip_all, fields(job_id = %ctx.job_id, video_id = %ctx.video_id))]
pub async fn persist(
    machine: CourseMachine<(), Generated>,
    ctx: &mut JobContext<'_>,
) -> Result<CourseMachine<(), Persisted>, AppError> {
    let summary = ctx.take_summary()?;
    let quiz = ctx.take_quiz()?;
    let question_count = quiz.len();

    ctx.db
        .store_item(Summary::new(
            ctx.video_id.clone(),
            ctx.course_id.clone(),
            summary,
        ))
        .await?;
    ctx.db
        .store_item(Quiz::new(
            ctx.video_id.clone(),
            ctx.course_id.clone(),
            quiz,
        ))
        .await?;

    debug!(
        job_id = %ctx.job_id,
        video_id = %ctx.video_id,
        question_count,
        "summary and quiz persisted"
    );

    machine
        .persist()
        .map_err(|(_, guard)| map_guard_error("persist", &guard))
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid course pipeline transition during {event}: {guard:?}"
    ))
}
