use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgPool;

/**
 * A poll prompt. Rows are created out of band (fixtures, psql); no handler
 * in this application ever mutates one.
 */
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Question {
    pub id: i32,
    pub text: String,
    pub published_at: DateTime<Utc>,
}

impl Question {
    /**
     * The most recently published questions, newest first, at most `limit`
     */
    pub async fn latest(limit: i64, db: &PgPool) -> Result<Vec<Question>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            "SELECT id, text, published_at FROM questions ORDER BY published_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(db)
        .await
    }

    /**
     * Look the question up by its identifier, yielding None when no such
     * row exists so callers can branch into their own not-found response
     */
    pub async fn find(id: i32, db: &PgPool) -> Result<Option<Question>, sqlx::Error> {
        sqlx::query_as::<_, Question>("SELECT id, text, published_at FROM questions WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

/**
 * One selectable answer under a question, carrying its accumulated vote count
 */
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Choice {
    pub id: i32,
    pub question_id: i32,
    pub text: String,
    pub votes: i32,
}

impl Choice {
    pub async fn of_question(question_id: i32, db: &PgPool) -> Result<Vec<Choice>, sqlx::Error> {
        sqlx::query_as::<_, Choice>(
            "SELECT id, question_id, text, votes FROM choices WHERE question_id = $1 ORDER BY id ASC",
        )
        .bind(question_id)
        .fetch_all(db)
        .await
    }

    /**
     * Count a single vote for the given choice.
     *
     * The increment is one relative UPDATE so simultaneous votes cannot
     * clobber each other, and the question_id guard means a choice id
     * belonging to some other question matches zero rows. Returns whether
     * a vote was actually counted.
     */
    pub async fn record_vote(
        question_id: i32,
        choice_id: i32,
        db: &PgPool,
    ) -> Result<bool, sqlx::Error> {
        let done =
            sqlx::query("UPDATE choices SET votes = votes + 1 WHERE id = $1 AND question_id = $2")
                .bind(choice_id)
                .bind(question_id)
                .execute(db)
                .await?;
        Ok(done.rows_affected() > 0)
    }
}
