use dotenv::dotenv;
use handlebars::Handlebars;
use log::*;
use sqlx::postgres::{PgPool, PgPoolOptions};

use std::env;
use std::sync::Arc;

mod models;
mod routes;

/**
 * Struct for carrying application state into tide request handlers
 */
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub templates: Arc<Handlebars<'static>>,
}

/**
 * Create the sqlx connection pool for postgresql
 */
async fn create_pool() -> Result<PgPool, sqlx::Error> {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
}

/**
 * Load every .hbs file under templates/ into the render registry
 */
fn load_templates() -> Result<Handlebars<'static>, handlebars::TemplateFileError> {
    let mut templates = Handlebars::new();
    templates.register_templates_directory(".hbs", "templates")?;
    Ok(templates)
}

#[async_std::main]
async fn main() -> Result<(), std::io::Error> {
    pretty_env_logger::init();

    match create_pool().await {
        Ok(db) => {
            if let Err(err) = sqlx::migrate!().run(&db).await {
                error!("Could not run migrations! {:?}", err);
                return Err(std::io::Error::new(std::io::ErrorKind::Other, err));
            }

            let templates = load_templates()
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;

            let state = AppState {
                db,
                templates: Arc::new(templates),
            };
            let mut app = tide::with_state(state);
            app.with(driftwood::ApacheCombinedLogger);
            app.at("/").get(routes::questions::index);
            app.at("/:question_id").get(routes::questions::detail);
            app.at("/:question_id/results").get(routes::questions::results);
            app.at("/:question_id/vote").post(routes::questions::vote);

            let bind = env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
            app.listen(bind).await?;
            Ok(())
        }
        Err(err) => {
            error!("Could not initialize pool! {:?}", err);
            Err(std::io::Error::new(std::io::ErrorKind::Other, err))
        }
    }
}
