/**
 * The routes module contains all the tide routes and the logic to fulfill
 * the responses for each route.
 */
use serde::Deserialize;
use tide::{Request, Response, StatusCode};

use crate::AppState;

/**
 * Error shown on the detail page when a vote submission names no usable choice
 */
pub const NO_CHOICE_ERROR: &str = "No choice selected.";

/**
 * The voting form body. `choice` is optional so an empty submission
 * deserializes rather than erroring.
 */
#[derive(Debug, Deserialize)]
struct VoteForm {
    choice: Option<i32>,
}

/**
 * Pull the submitted choice id out of a form-encoded body. A missing field,
 * empty value, or non-numeric value all read as "nothing selected".
 */
fn submitted_choice(form_body: &str) -> Option<i32> {
    serde_qs::from_str::<VoteForm>(form_body)
        .ok()
        .and_then(|form| form.choice)
}

/**
 * Where a successful vote for the question gets redirected to
 */
pub fn results_path(question_id: i32) -> String {
    format!("/{}/results", question_id)
}

fn html(body: String) -> Response {
    Response::builder(StatusCode::Ok)
        .content_type(tide::http::mime::HTML)
        .body(body)
        .build()
}

fn not_found() -> Response {
    Response::new(StatusCode::NotFound)
}

pub mod questions {
    use log::*;
    use serde_json::json;
    use tide::{Redirect, Request};

    use super::{html, not_found, requested_question, submitted_choice};
    use crate::models::{Choice, Question};
    use crate::AppState;

    /**
     *  GET /
     */
    pub async fn index(req: Request<AppState>) -> tide::Result {
        let latest = Question::latest(5, &req.state().db).await?;
        let body = req
            .state()
            .templates
            .render("index", &json!({ "latest_questions": latest }))?;
        Ok(html(body))
    }

    /**
     *  GET /:question_id
     */
    pub async fn detail(req: Request<AppState>) -> tide::Result {
        match requested_question(&req).await? {
            Some(question) => {
                let choices = Choice::of_question(question.id, &req.state().db).await?;
                let body = req.state().templates.render(
                    "detail",
                    &json!({ "question": question, "choices": choices }),
                )?;
                Ok(html(body))
            }
            None => Ok(not_found()),
        }
    }

    /**
     *  GET /:question_id/results
     */
    pub async fn results(req: Request<AppState>) -> tide::Result {
        match requested_question(&req).await? {
            Some(question) => {
                let choices = Choice::of_question(question.id, &req.state().db).await?;
                let body = req.state().templates.render(
                    "results",
                    &json!({ "question": question, "choices": choices }),
                )?;
                Ok(html(body))
            }
            None => Ok(not_found()),
        }
    }

    /**
     *  POST /:question_id/vote
     */
    pub async fn vote(mut req: Request<AppState>) -> tide::Result {
        let form_body = req.body_string().await?;

        let question = match requested_question(&req).await? {
            Some(question) => question,
            None => return Ok(not_found()),
        };

        let counted = match submitted_choice(&form_body) {
            Some(choice_id) => {
                debug!("Vote received for choice {} on question {}", choice_id, question.id);
                Choice::record_vote(question.id, choice_id, &req.state().db).await?
            }
            None => false,
        };

        if counted {
            // Redirect-after-post, so a back-button or reload doesn't
            // resubmit the vote
            Ok(Redirect::see_other(super::results_path(question.id)).into())
        } else {
            let choices = Choice::of_question(question.id, &req.state().db).await?;
            let body = req.state().templates.render(
                "detail",
                &json!({
                    "question": question,
                    "choices": choices,
                    "error_message": super::NO_CHOICE_ERROR,
                }),
            )?;
            Ok(html(body))
        }
    }
}

/**
 * Look up the question named by the `question_id` path parameter.
 *
 * An unparseable segment reads the same as an unknown id: None, which the
 * handlers turn into a 404.
 */
async fn requested_question(
    req: &Request<AppState>,
) -> Result<Option<crate::models::Question>, tide::Error> {
    let id: i32 = match req.param("question_id") {
        Ok(id) => id,
        Err(_) => return Ok(None),
    };
    Ok(crate::models::Question::find(id, &req.state().db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submitted_choice_parses_the_choice_field() {
        assert_eq!(submitted_choice("choice=3"), Some(3));
    }

    #[test]
    fn empty_body_reads_as_no_selection() {
        assert_eq!(submitted_choice(""), None);
    }

    #[test]
    fn unrelated_fields_read_as_no_selection() {
        assert_eq!(submitted_choice("voter=alice"), None);
    }

    #[test]
    fn malformed_choice_reads_as_no_selection() {
        assert_eq!(submitted_choice("choice=abc"), None);
        assert_eq!(submitted_choice("choice="), None);
    }

    #[test]
    fn results_path_points_at_the_results_page() {
        assert_eq!(results_path(1), "/1/results");
        assert_eq!(results_path(42), "/42/results");
    }

    fn sample_question() -> serde_json::Value {
        json!({ "id": 1, "text": "Which backend?", "published_at": "2026-08-01T00:00:00Z" })
    }

    fn sample_choices() -> serde_json::Value {
        json!([
            { "id": 1, "question_id": 1, "text": "Postgres", "votes": 0 },
            { "id": 2, "question_id": 1, "text": "SQLite", "votes": 3 },
        ])
    }

    #[test]
    fn detail_template_lists_every_choice() {
        let templates = crate::load_templates().unwrap();
        let body = templates
            .render(
                "detail",
                &json!({ "question": sample_question(), "choices": sample_choices() }),
            )
            .unwrap();

        assert!(body.contains("Which backend?"));
        assert!(body.contains("Postgres"));
        assert!(body.contains("SQLite"));
        assert!(!body.contains(NO_CHOICE_ERROR));
    }

    #[test]
    fn detail_template_surfaces_the_error_message() {
        let templates = crate::load_templates().unwrap();
        let body = templates
            .render(
                "detail",
                &json!({
                    "question": sample_question(),
                    "choices": sample_choices(),
                    "error_message": NO_CHOICE_ERROR,
                }),
            )
            .unwrap();

        assert!(body.contains(NO_CHOICE_ERROR));
    }

    #[test]
    fn results_template_shows_current_counts() {
        let templates = crate::load_templates().unwrap();
        let body = templates
            .render(
                "results",
                &json!({ "question": sample_question(), "choices": sample_choices() }),
            )
            .unwrap();

        assert!(body.contains("Which backend?"));
        assert!(body.contains("3"));
    }

    #[test]
    fn index_template_links_each_question() {
        let templates = crate::load_templates().unwrap();
        let body = templates
            .render(
                "index",
                &json!({ "latest_questions": [sample_question()] }),
            )
            .unwrap();

        assert!(body.contains("/1"));
        assert!(body.contains("Which backend?"));
    }

    #[test]
    fn index_template_handles_an_empty_store() {
        let templates = crate::load_templates().unwrap();
        let body = templates
            .render("index", &json!({ "latest_questions": [] }))
            .unwrap();

        assert!(body.contains("No polls are available."));
    }
}
