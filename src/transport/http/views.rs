//! Server-rendered HTML pages.
//!
//! Every page is wrapped in the same layout (nav bar, flash banner, footer).
//! All user-supplied text goes through [`escape`] before it is interpolated.

use crate::domain::contact::{Contact, ContactForm};
use crate::domain::validator::Validator;
use crate::transport::http::csrf::CSRF_FIELD;
use crate::transport::http::session::Session;
use axum::http::StatusCode;
use chrono::{Datelike, Utc};

/// Data shared by every page: the one-shot flash message and, on pages that
/// render a form, the CSRF token.
pub struct PageContext {
    pub flash: Option<String>,
    pub csrf_token: Option<String>,
}

impl PageContext {
    /// Consumes the session's flash message. Leaves an untouched session unmodified.
    pub fn new(session: &Session) -> Self {
        Self {
            flash: session.pop_flash(),
            csrf_token: None,
        }
    }

    /// Like [`PageContext::new`], and issues the session's CSRF token if it has none yet.
    pub fn with_form(session: &Session) -> Self {
        Self {
            flash: session.pop_flash(),
            csrf_token: Some(session.csrf_token()),
        }
    }
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn human_date(contact: &Contact) -> String {
    contact.created.format("%d %b %Y at %H:%M").to_string()
}

fn layout(title: &str, flash: Option<&str>, main: &str) -> String {
    let flash = flash
        .map(|msg| format!("<div class=\"flash\">{}</div>", escape(msg)))
        .unwrap_or_default();
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Contacts</title>
<link rel="stylesheet" href="/static/main.css">
</head>
<body>
<header><h1><a href="/">Contacts</a></h1></header>
<nav>
<div><a href="/">Home</a> <a href="/about">About</a></div>
<div><a href="/contacts/create">Create contact</a></div>
</nav>
<main>
{flash}
{main}
</main>
<footer>Contacts app, {year}</footer>
</body>
</html>
"#,
        title = escape(title),
        year = Utc::now().year(),
    )
}

fn csrf_input(page: &PageContext) -> String {
    format!(
        "<input type=\"hidden\" name=\"{CSRF_FIELD}\" value=\"{}\">",
        escape(page.csrf_token.as_deref().unwrap_or_default())
    )
}

pub fn home(page: &PageContext, contacts: &[Contact]) -> String {
    let mut main = String::from("<h2>All contacts</h2>\n");
    if contacts.is_empty() {
        main.push_str("<p>There's nothing to see here... yet!</p>\n");
    } else {
        main.push_str("<table>\n<tr><th>Name</th><th>Phone</th><th>Email</th></tr>\n");
        for c in contacts {
            main.push_str(&format!(
                "<tr><td><a href=\"/contacts/view/{}\">{}</a></td><td>{}</td><td>{}</td></tr>\n",
                c.id,
                escape(&c.full_name()),
                escape(&c.phone),
                escape(&c.email),
            ));
        }
        main.push_str("</table>\n");
    }
    layout("Home", page.flash.as_deref(), &main)
}

pub fn about(page: &PageContext) -> String {
    let main = "<h2>About</h2>\n<p>A small address book: create, view, edit and delete contacts.</p>\n";
    layout("About", page.flash.as_deref(), main)
}

/// Shows one contact. With `confirm_delete` set, a delete confirmation form is
/// rendered below the details.
pub fn contact_view(page: &PageContext, contact: &Contact, confirm_delete: bool) -> String {
    let mut main = format!(
        r#"<div class="contact">
<div class="metadata"><strong>{name}</strong><span>#{id}</span></div>
<dl>
<dt>Phone</dt><dd>{phone}</dd>
<dt>Email</dt><dd>{email}</dd>
</dl>
<div class="metadata"><time>Created: {created}</time></div>
</div>
"#,
        name = escape(&contact.full_name()),
        id = contact.id,
        phone = escape(&contact.phone),
        email = escape(&contact.email),
        created = human_date(contact),
    );

    if confirm_delete {
        main.push_str(&format!(
            r#"<form action="/contacts/delete/{id}" method="POST">
{csrf}
<p>Delete this contact? This cannot be undone.</p>
<input type="submit" value="Delete">
<a href="/contacts/view/{id}">Cancel</a>
</form>
"#,
            id = contact.id,
            csrf = csrf_input(page),
        ));
    } else {
        main.push_str(&format!(
            "<p><a href=\"/contacts/edit/{id}\">Edit</a> <a href=\"/contacts/delete/{id}\">Delete</a></p>\n",
            id = contact.id,
        ));
    }

    layout(&format!("Contact #{}", contact.id), page.flash.as_deref(), &main)
}

fn form_field(label: &str, name: &str, kind: &str, value: &str, errors: &Validator) -> String {
    let error = errors
        .field_error(name)
        .map(|msg| format!("<label class=\"error\">{}</label>\n", escape(msg)))
        .unwrap_or_default();
    format!(
        "<div>\n<label for=\"{name}\">{label}:</label>\n{error}<input type=\"{kind}\" id=\"{name}\" name=\"{name}\" value=\"{}\">\n</div>\n",
        escape(value)
    )
}

fn contact_form(action: &str, page: &PageContext, form: &ContactForm, errors: &Validator, submit: &str) -> String {
    let mut out = format!("<form action=\"{action}\" method=\"POST\">\n{}\n", csrf_input(page));
    for msg in &errors.non_field_errors {
        out.push_str(&format!("<div class=\"error\">{}</div>\n", escape(msg)));
    }
    if let Some(id) = form.id {
        out.push_str(&format!(
            "<input type=\"hidden\" name=\"id\" value=\"{id}\">\n<input type=\"hidden\" name=\"version\" value=\"{}\">\n",
            form.version
        ));
    }
    out.push_str(&form_field("First name", "first", "text", &form.first, errors));
    out.push_str(&form_field("Last name", "last", "text", &form.last, errors));
    out.push_str(&form_field("Phone", "phone", "tel", &form.phone, errors));
    out.push_str(&form_field("Email", "email", "email", &form.email, errors));
    out.push_str(&format!("<div><input type=\"submit\" value=\"{submit}\"></div>\n</form>\n"));
    out
}

pub fn contact_create(page: &PageContext, form: &ContactForm, errors: &Validator) -> String {
    let main = format!(
        "<h2>Create a new contact</h2>\n{}",
        contact_form("/contacts/create", page, form, errors, "Create contact")
    );
    layout("Create a new contact", page.flash.as_deref(), &main)
}

pub fn contact_edit(page: &PageContext, id: i32, form: &ContactForm, errors: &Validator) -> String {
    let main = format!(
        "<h2>Edit contact #{id}</h2>\n{}",
        contact_form(&format!("/contacts/edit/{id}"), page, form, errors, "Save changes")
    );
    layout(&format!("Edit contact #{id}"), page.flash.as_deref(), &main)
}

/// Error page for `status`. `detail` is only passed when running with `--debug`.
pub fn error_page(status: StatusCode, detail: Option<&str>) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    let mut main = format!("<h2>{} {}</h2>\n", status.as_u16(), escape(reason));
    if let Some(detail) = detail {
        main.push_str(&format!("<pre>{}</pre>\n", escape(detail)));
    }
    layout(reason, None, &main)
}
