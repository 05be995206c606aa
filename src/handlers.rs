//! HTTP route handlers for the papers page.
//!
//! Every control on the page is a small form; its handler applies one
//! transition to the shared state and redirects back to the listing.

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::export::{Download, ExportFormat, PaperHeading};
use crate::filter::{FacetChoice, QuickToggle, SortKey};
use crate::notes::NoteForm;
use crate::selection::FRAGMENT_PREFIX;
use crate::templates::{render_note_editor, render_papers_page, render_share_page};
use crate::AppState;

// ============================================================================
// Router
// ============================================================================

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Listing
        .route("/", get(index))
        .route("/search", post(search))
        .route("/search/clear", post(clear_search))
        .route("/filters/year/{value}", post(toggle_year))
        .route("/filters/category/{value}", post(toggle_category))
        .route("/filters/quick/{toggle}", post(toggle_quick))
        .route("/filters/reset", post(reset_filters))
        .route("/sort", post(set_sort))
        // Selection
        .route("/selection/mode", post(toggle_selection_mode))
        .route("/selection/toggle/{id}", post(toggle_paper))
        .route("/selection/visible", post(select_all_visible))
        .route("/selection/clear", post(clear_selection))
        .route("/selection/share", get(share_selection))
        .route("/export/{file}", get(export_selection))
        // Notes
        .route("/notes/{id}", get(notes_page).post(save_note))
        .route("/notes/{id}/draft", post(update_draft))
        .route("/notes/{id}/close", post(close_notes))
        .route("/notes/{id}/delete", post(delete_note))
        .route("/notes/{id}/export", get(export_note).post(export_note_form))
        .route("/api/notes/{id}", get(note_api))
        // Misc
        .route("/theme", post(cycle_theme))
        .route("/api/state", get(state_api))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn back_to_list() -> Redirect {
    Redirect::to("/")
}

/// Attachment response for an export.
fn download(dl: Download) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", dl.filename);
    (
        [
            (header::CONTENT_TYPE, dl.mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        dl.content,
    )
        .into_response()
}

// ============================================================================
// Listing Handlers
// ============================================================================

/// `selected=…` from the raw query string, still percent-encoded per id.
fn selected_param(query: Option<&str>) -> Option<&str> {
    query?
        .split('&')
        .find(|pair| pair.starts_with(FRAGMENT_PREFIX))
}

/// Render the listing. `?selected=a,b` starts a fresh session the way
/// opening a `#selected=a,b` share link does.
pub async fn index(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Html<String> {
    if let Some(fragment) = selected_param(query.as_deref()) {
        state.notes.close().await;
        state.reload(Some(fragment));
        info!(fragment, "loaded shared selection");
    }
    let theme = state.theme.current();
    let app = state.app();
    Html(render_papers_page(&app, state.notes.store(), theme))
}

#[derive(Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub q: String,
}

pub async fn search(State(state): State<Arc<AppState>>, Form(form): Form<SearchForm>) -> Redirect {
    state.app().set_search(&form.q);
    back_to_list()
}

pub async fn clear_search(State(state): State<Arc<AppState>>) -> Redirect {
    state.app().clear_search();
    back_to_list()
}

pub async fn toggle_year(State(state): State<Arc<AppState>>, Path(value): Path<String>) -> Redirect {
    match FacetChoice::<i64>::parse(&value) {
        Some(choice) => state.app().toggle_year(choice),
        None => debug!(value = %value, "ignoring unknown year filter"),
    }
    back_to_list()
}

pub async fn toggle_category(
    State(state): State<Arc<AppState>>,
    Path(value): Path<String>,
) -> Redirect {
    match FacetChoice::<String>::parse(&value) {
        Some(choice) => state.app().toggle_category(choice),
        None => debug!(value = %value, "ignoring unknown category filter"),
    }
    back_to_list()
}

pub async fn toggle_quick(
    State(state): State<Arc<AppState>>,
    Path(toggle): Path<String>,
) -> Redirect {
    match QuickToggle::parse(&toggle) {
        Some(toggle) => state.app().toggle_quick(toggle),
        None => debug!(toggle = %toggle, "ignoring unknown quick filter"),
    }
    back_to_list()
}

#[derive(Deserialize)]
pub struct SortForm {
    #[serde(default)]
    pub sort: String,
}

pub async fn set_sort(State(state): State<Arc<AppState>>, Form(form): Form<SortForm>) -> Redirect {
    state.app().set_sort(SortKey::parse(&form.sort));
    back_to_list()
}

pub async fn reset_filters(State(state): State<Arc<AppState>>) -> Redirect {
    state.app().reset_filters();
    back_to_list()
}

// ============================================================================
// Selection Handlers
// ============================================================================

pub async fn toggle_selection_mode(State(state): State<Arc<AppState>>) -> Redirect {
    state.app().toggle_selection_mode();
    back_to_list()
}

pub async fn toggle_paper(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Redirect {
    if state.app().toggle_paper(&id).is_none() {
        debug!(paper_id = %id, "ignoring selection of unknown paper");
    }
    back_to_list()
}

pub async fn select_all_visible(State(state): State<Arc<AppState>>) -> Redirect {
    state.app().select_all_visible();
    back_to_list()
}

pub async fn clear_selection(State(state): State<Arc<AppState>>) -> Redirect {
    state.app().clear_selection();
    back_to_list()
}

pub async fn share_selection(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    let (url, count) = {
        let app = state.app();
        (app.share_url(&state.config.page_url)?, app.selection().len())
    };
    Ok(Html(render_share_page(&url, count, state.theme.current())))
}

pub async fn export_selection(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<Response> {
    let Some(format) = ExportFormat::from_filename(&file) else {
        return Ok((StatusCode::NOT_FOUND, "Unknown export").into_response());
    };
    let dl = state.app().export(format)?;
    info!(file = %dl.filename, "exported selection");
    Ok(download(dl))
}

// ============================================================================
// Notes Handlers
// ============================================================================

fn heading_for(state: &AppState, paper_id: &str) -> Result<PaperHeading> {
    let app = state.app();
    if app.store().card(paper_id).is_none() {
        return Err(Error::UnknownPaper(paper_id.to_string()));
    }
    Ok(PaperHeading::from_store(app.store(), paper_id))
}

/// Open the editor for a paper and start autosaving.
pub async fn notes_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let heading = heading_for(&state, &id)?;
    let editor = state.notes.open(&id).await;
    Ok(Html(render_note_editor(&editor, &heading, state.theme.current())))
}

/// Save button: store the submitted fields and close the editor.
pub async fn save_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<NoteForm>,
) -> Result<Redirect> {
    heading_for(&state, &id)?;
    state.notes.open(&id).await;
    state.notes.save(&id, &form).await?;
    state.notes.close().await;
    Ok(back_to_list())
}

/// Field values pushed by the open editor page; saved by the next autosave.
pub async fn update_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<NoteForm>,
) -> Result<Json<serde_json::Value>> {
    let editor = state.notes.update(&id, &form).await?;
    Ok(Json(serde_json::json!({
        "paper_id": editor.paper_id(),
        "last_saved": editor.last_saved_label(),
    })))
}

pub async fn close_notes(State(state): State<Arc<AppState>>) -> Redirect {
    state.notes.close().await;
    back_to_list()
}

pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Redirect> {
    state.notes.delete(&id).await?;
    Ok(back_to_list())
}

pub async fn export_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response> {
    note_download(&state, &id, &NoteForm::default()).await
}

/// Export button inside the editor form: the submitted fields land in the
/// draft before it is saved and exported.
pub async fn export_note_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<NoteForm>,
) -> Result<Response> {
    note_download(&state, &id, &form).await
}

async fn note_download(state: &AppState, id: &str, form: &NoteForm) -> Result<Response> {
    let heading = heading_for(state, id)?;
    let dl = state.notes.export(id, form, &heading).await?;
    info!(file = %dl.filename, "exported note");
    Ok(download(dl))
}

pub async fn note_api(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.notes.store().load(&id) {
        Some(note) => Json(note).into_response(),
        None => (StatusCode::NOT_FOUND, "Note not found").into_response(),
    }
}

// ============================================================================
// Theme & State
// ============================================================================

/// Same-site path of the referring page, so the toggle keeps the user where
/// they were.
fn referer_path(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| url::Url::parse(v).ok())
        .map(|u| u.path().to_string())
        .filter(|p| p.starts_with('/') && !p.starts_with("//"))
        .unwrap_or_else(|| "/".to_string())
}

pub async fn cycle_theme(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Redirect> {
    state.theme.cycle()?;
    Ok(Redirect::to(&referer_path(&headers)))
}

pub async fn state_api(State(state): State<Arc<AppState>>) -> Json<crate::AppSnapshot> {
    Json(state.app().snapshot())
}
