//! Response construction.
//!
//! # Responsibilities
//! - Render error pages (404/403/500/...) from the server-wide views
//! - Build redirect responses with exact status codes
//!
//! # Design Decisions
//! - Error views are looked up as `errors/<code>` then `error`
//! - Every error page carries the numeric code and a contact address
//! - If no error view renders, a minimal built-in page is sent so an error
//!   response never fails

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde_json::Value;

use crate::environment::Environment;
use crate::http::request::Origin;
use crate::templates::TemplateEngine;

/// Renders error pages.
#[derive(Clone)]
pub struct ErrorPages {
    templates: Arc<dyn TemplateEngine>,
    support_email: Option<String>,
}

impl ErrorPages {
    pub fn new(templates: Arc<dyn TemplateEngine>, support_email: Option<String>) -> Self {
        Self {
            templates,
            support_email,
        }
    }

    /// Contact address shown on error pages for this origin.
    pub fn email_for(&self, origin: &Origin) -> String {
        self.support_email
            .clone()
            .unwrap_or_else(|| format!("webmaster@{}", origin.hostname()))
    }

    /// Render the error page for `status`.
    pub async fn render(&self, status: StatusCode, origin: &Origin) -> Response {
        let email = self.email_for(origin);
        let mut env = Environment::new();
        env.insert("code".into(), Value::from(status.as_u16()));
        env.insert("email".into(), Value::from(email.clone()));

        for view in [format!("/errors/{}", status.as_u16()), "/error".to_string()] {
            if !self.templates.view_exists(&view).await {
                continue;
            }
            match self.templates.render(&view, &env) {
                Ok(html) => return (status, Html(html)).into_response(),
                Err(e) => {
                    tracing::warn!(view = %view, error = %e, "Error page failed to render");
                }
            }
        }

        (status, Html(fallback_page(status, &email))).into_response()
    }
}

/// Redirect with an exact status code (301, 302, ...).
pub fn redirect(status: StatusCode, location: &str) -> Result<Response, header::InvalidHeaderValue> {
    let value = HeaderValue::from_str(location)?;
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response.headers_mut().insert(header::LOCATION, value);
    Ok(response)
}

fn fallback_page(status: StatusCode, email: &str) -> String {
    let code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        "<!DOCTYPE html>\n<html><head><title>{code} {reason}</title></head>\
         <body><h1>{code} {reason}</h1>\
         <p>If you believe this is a mistake, contact <a href=\"mailto:{email}\">{email}</a>.</p>\
         </body></html>\n",
        code = code,
        reason = reason,
        email = escape_html(email),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
