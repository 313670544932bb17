//! Create, view, edit and delete handlers for contacts.
//!
//! Forms are validated in full before touching the store; an invalid
//! submission is rendered again with status 422 and the user's input intact.
//! Every successful write sets a flash message and redirects with 303.

use crate::domain::contact::{validate_contact_form, ContactForm};
use crate::domain::validator::Validator;
use crate::storage::StoreError;
use crate::transport::http::error::{AppError, AppResult};
use crate::transport::http::session::Session;
use crate::transport::http::types::AppState;
use crate::transport::http::views::{self, PageContext};
use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;

pub const FLASH_CREATED: &str = "Contact successfully created!";
pub const FLASH_UPDATED: &str = "Contact successfully updated!";
pub const FLASH_DELETED: &str = "Contact successfully deleted!";
pub const FLASH_CONFLICT: &str = "Another user has updated this contact. Please reload and try again.";

/// Parses a path id. Anything that is not a positive integer is a 404.
fn parse_id(raw: &str) -> AppResult<i32> {
    match raw.parse::<i32>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::NotFound),
    }
}

fn decode_form(form: Result<Form<ContactForm>, FormRejection>) -> AppResult<ContactForm> {
    form.map(|Form(f)| f)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn view_path(id: i32) -> String {
    format!("/contacts/view/{id}")
}

pub async fn contact_view(
    State(state): State<AppState>,
    session: Session,
    Path(raw_id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_id(&raw_id)?;
    let contact = state.contacts.get(id).await?;
    let page = PageContext::new(&session);
    Ok(Html(views::contact_view(&page, &contact, false)))
}

pub async fn contact_create(session: Session) -> Html<String> {
    let page = PageContext::with_form(&session);
    Html(views::contact_create(&page, &ContactForm::default(), &Validator::new()))
}

pub async fn contact_create_post(
    State(state): State<AppState>,
    session: Session,
    form: Result<Form<ContactForm>, FormRejection>,
) -> AppResult<Response> {
    let form = decode_form(form)?;

    let errors = validate_contact_form(&form);
    if !errors.valid() {
        let page = PageContext::with_form(&session);
        let body = views::contact_create(&page, &form, &errors);
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response());
    }

    let id = state
        .contacts
        .insert(&form.first, &form.last, &form.phone, &form.email)
        .await?;
    tracing::info!(contact_id = id, "contact created");

    session.put_flash(FLASH_CREATED);
    Ok(Redirect::to(&view_path(id)).into_response())
}

pub async fn contact_edit(
    State(state): State<AppState>,
    session: Session,
    Path(raw_id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_id(&raw_id)?;
    let contact = state.contacts.get(id).await?;
    let page = PageContext::with_form(&session);
    let form = ContactForm::from_contact(&contact);
    Ok(Html(views::contact_edit(&page, id, &form, &Validator::new())))
}

/// Applies an edit using the version the form was rendered with. If someone
/// else saved in between, the user is sent back to the edit page with a flash
/// instead of getting an error page.
pub async fn contact_edit_post(
    State(state): State<AppState>,
    session: Session,
    Path(raw_id): Path<String>,
    form: Result<Form<ContactForm>, FormRejection>,
) -> AppResult<Response> {
    let id = parse_id(&raw_id)?;
    let mut form = decode_form(form)?;
    form.id = Some(id);

    let errors = validate_contact_form(&form);
    if !errors.valid() {
        let page = PageContext::with_form(&session);
        let body = views::contact_edit(&page, id, &form, &errors);
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response());
    }

    // Update cannot tell a vanished row from a stale version.
    state.contacts.get(id).await?;

    match state.contacts.update(&form.into_contact(id)).await {
        Ok(version) => {
            tracing::info!(contact_id = id, version, "contact updated");
            session.put_flash(FLASH_UPDATED);
            Ok(Redirect::to(&view_path(id)).into_response())
        }
        Err(StoreError::EditConflict) => {
            tracing::warn!(contact_id = id, "edit conflict");
            session.put_flash(FLASH_CONFLICT);
            Ok(Redirect::to(&format!("/contacts/edit/{id}")).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn contact_delete(
    State(state): State<AppState>,
    session: Session,
    Path(raw_id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_id(&raw_id)?;
    let contact = state.contacts.get(id).await?;
    let page = PageContext::with_form(&session);
    Ok(Html(views::contact_view(&page, &contact, true)))
}

pub async fn contact_delete_post(
    State(state): State<AppState>,
    session: Session,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    let id = parse_id(&raw_id)?;
    state.contacts.delete(id).await?;
    tracing::info!(contact_id = id, "contact deleted");

    session.put_flash(FLASH_DELETED);
    Ok(Redirect::to("/").into_response())
}
