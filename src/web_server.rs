use anyhow::Context;
use axum::{
    extract::{Form, Query, Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    serve, Router,
};
use chrono::{Datelike, NaiveDate};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::app_state::AppState;
use crate::chat::ChatService;
use crate::date_resolver::TodaySource;
use crate::error::FoodyError;
use crate::picker::{select_date, SpinOutcome};

/// Inline message shown above the page after an action.
#[derive(Debug, Clone, Serialize)]
struct Notice {
    kind: &'static str,
    text: String,
}

impl Notice {
    fn success(text: impl Into<String>) -> Self {
        Self {
            kind: "success",
            text: text.into(),
        }
    }

    fn error(err: &FoodyError) -> Self {
        Self {
            kind: "error",
            text: err.to_string(),
        }
    }
}

// Shared state handed to every handler
#[derive(Clone)]
pub struct WebState {
    templates: Arc<AutoReloader>,
    // One lock for the whole app: actions run one at a time, to completion.
    app: Arc<Mutex<AppState>>,
    today: Arc<dyn TodaySource>,
    chat: Arc<dyn ChatService>,
}

impl WebState {
    pub fn new(
        app: AppState,
        today: Arc<dyn TodaySource>,
        chat: Arc<dyn ChatService>,
        templates_dir: impl Into<String>,
    ) -> Self {
        Self {
            templates: Arc::new(create_minijinja_env(templates_dir.into())),
            app: Arc::new(Mutex::new(app)),
            today,
            chat,
        }
    }
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: String) -> AutoReloader {
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&templates_dir));
        // Watch the templates directory for changes
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    })
}

/// Fatal action failures. Validation problems never get here; they are
/// rendered inline as a [`Notice`].
#[derive(Debug)]
pub struct WebError(FoodyError);

impl From<FoodyError> for WebError {
    fn from(err: FoodyError) -> Self {
        Self(err)
    }
}

impl From<minijinja::Error> for WebError {
    fn from(err: minijinja::Error) -> Self {
        Self(FoodyError::Template(err))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            FoodyError::InvalidDate { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(%status, "Action failed: {}", self.0);
        (status, format!("Error: {}", self.0)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct FoodForm {
    #[serde(default)]
    name: String,
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

impl FoodForm {
    fn date(&self) -> DateQuery {
        DateQuery {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    message: String,
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

impl ChatForm {
    fn date(&self) -> DateQuery {
        DateQuery {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }
}

/// Resolves (today, selected). Missing picker fields default to today's.
async fn resolve_dates(
    state: &WebState,
    query: &DateQuery,
) -> Result<(NaiveDate, NaiveDate), WebError> {
    let today = state.today.today().await;
    let selected = match (query.year, query.month, query.day) {
        (None, None, None) => today,
        (year, month, day) => select_date(
            year.unwrap_or_else(|| today.year()),
            month.unwrap_or_else(|| today.month()),
            day.unwrap_or_else(|| today.day()),
        )?,
    };
    Ok((today, selected))
}

fn render_page(
    state: &WebState,
    app: &AppState,
    selected: NaiveDate,
    today: NaiveDate,
    notice: Option<Notice>,
    spin: Option<SpinOutcome>,
) -> Result<Html<String>, WebError> {
    let env = state.templates.acquire_env()?;
    let tmpl = env.get_template("index.html")?;
    let html = tmpl.render(minijinja::context! {
        title => "Hôm Nay Ăn Gì?",
        page => app.page(selected, today),
        notice => notice,
        spin => spin,
    })?;
    Ok(Html(html))
}

/// Turns a user-facing failure into a notice and lets fatal ones through.
fn notice_or_fail(result: Result<Notice, FoodyError>) -> Result<Notice, WebError> {
    match result {
        Ok(notice) => Ok(notice),
        Err(e) if e.is_user_facing() => {
            warn!("Rejected action: {}", e);
            Ok(Notice::error(&e))
        }
        Err(e) => Err(e.into()),
    }
}

async fn index_handler(
    State(state): State<WebState>,
    Query(query): Query<DateQuery>,
) -> Result<Html<String>, WebError> {
    let (today, selected) = resolve_dates(&state, &query).await?;
    let app = state.app.lock().await;
    render_page(&state, &app, selected, today, None, None)
}

async fn add_food_handler(
    State(state): State<WebState>,
    Form(form): Form<FoodForm>,
) -> Result<Html<String>, WebError> {
    let (today, selected) = resolve_dates(&state, &form.date()).await?;
    let mut app = state.app.lock().await;
    let notice = notice_or_fail(
        app.add_food(&form.name)
            .map(|()| Notice::success(format!("Added: {}", form.name))),
    )?;
    render_page(&state, &app, selected, today, Some(notice), None)
}

async fn remove_food_handler(
    State(state): State<WebState>,
    Form(form): Form<FoodForm>,
) -> Result<Html<String>, WebError> {
    let (today, selected) = resolve_dates(&state, &form.date()).await?;
    let mut app = state.app.lock().await;
    let notice = notice_or_fail(
        app.remove_food(&form.name)
            .map(|()| Notice::success(format!("Removed: {}", form.name))),
    )?;
    render_page(&state, &app, selected, today, Some(notice), None)
}

async fn spin_handler(
    State(state): State<WebState>,
    Form(query): Form<DateQuery>,
) -> Result<Html<String>, WebError> {
    let (today, selected) = resolve_dates(&state, &query).await?;
    let mut app = state.app.lock().await;
    let mut rng = StdRng::from_entropy();
    let (notice, spin) = match app.spin(selected, today, &mut rng) {
        Ok(outcome) => (
            Notice::success(format!("You got: {} ({} left)", outcome.food, outcome.remaining)),
            Some(outcome),
        ),
        Err(e) => (notice_or_fail(Err(e))?, None),
    };
    render_page(&state, &app, selected, today, Some(notice), spin)
}

async fn chat_handler(
    State(state): State<WebState>,
    Form(form): Form<ChatForm>,
) -> Result<Html<String>, WebError> {
    let (today, selected) = resolve_dates(&state, &form.date()).await?;
    let mut app = state.app.lock().await;
    let notice = match app.send_chat(state.chat.as_ref(), &form.message).await {
        Ok(_) => None,
        Err(e) => Some(notice_or_fail(Err(e))?),
    };
    render_page(&state, &app, selected, today, notice, None)
}

pub fn build_router(state: WebState, static_dir: &str) -> Router {
    // Serve static files from the configured directory
    let static_files_service =
        ServeDir::new(static_dir).not_found_service(tower::service_fn(|_req: Request| async {
            Ok::<_, std::convert::Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
        }));

    Router::new()
        .route("/", get(index_handler))
        .route("/foods", post(add_food_handler))
        .route("/foods/delete", post(remove_food_handler))
        .route("/spin", post(spin_handler))
        .route("/chat", post(chat_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(addr: SocketAddr, state: WebState, static_dir: &str) -> anyhow::Result<()> {
    let app = build_router(state, static_dir);
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
