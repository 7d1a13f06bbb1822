/*!
Server-side HTML rendering.

Templates are compiled into the binary and registered once at startup; handlers
hand over plain serializable data and never touch template details.
*/
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, trace};

use crate::error::AppError;
use crate::models::Flash;

static HTML_500: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>rollbook | Error</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<h1>Internal Server Error</h1>
<p>Something went wrong on our end. No further information is available.</p>
</body>
</html>"#;

const PARTIALS: &[(&str, &str)] = &[
    ("header", include_str!("../templates/partials/header.html")),
    ("footer", include_str!("../templates/partials/footer.html")),
];

const TEMPLATES: &[(&str, &str)] = &[
    ("index", include_str!("../templates/index.html")),
    ("student_form", include_str!("../templates/student_form.html")),
    ("attendance", include_str!("../templates/attendance.html")),
    ("mark_attendance", include_str!("../templates/mark_attendance.html")),
    ("view_attendance", include_str!("../templates/view_attendance.html")),
    ("report", include_str!("../templates/report.html")),
    ("attendance_dates", include_str!("../templates/attendance_dates.html")),
    ("login", include_str!("../templates/login.html")),
    ("register", include_str!("../templates/register.html")),
    ("not_found", include_str!("../templates/not_found.html")),
];

pub const STYLESHEET: &str = include_str!("../static/style.css");

pub struct Views {
    registry: Handlebars<'static>,
}

impl Views {
    pub fn new() -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);

        for (name, source) in PARTIALS {
            registry
                .register_partial(name, *source)
                .map_err(|e| AppError::Internal(format!("partial {}: {}", name, e)))?;
        }
        for (name, source) in TEMPLATES {
            registry
                .register_template_string(name, *source)
                .map_err(|e| AppError::Internal(format!("template {}: {}", name, e)))?;
        }

        Ok(Self { registry })
    }

    pub fn render<S: Serialize>(&self, code: StatusCode, template: &str, data: &S) -> Response {
        trace!("render({}, {:?})", code, template);

        match self.registry.render(template, data) {
            Ok(body) => (code, Html(body)).into_response(),
            Err(e) => {
                error!("error rendering template {:?}: {}", template, e);
                html_500()
            }
        }
    }

    /// Renders a full page: `data` plus the logged-in user's name and any flash
    /// message.
    pub fn page(
        &self,
        code: StatusCode,
        template: &str,
        username: Option<&str>,
        flash: Option<Flash>,
        mut data: Value,
    ) -> Response {
        if let Value::Object(map) = &mut data {
            map.insert("username".to_string(), json!(username));
            map.insert("flash".to_string(), json!(flash));
        }
        self.render(code, template, &data)
    }
}

pub fn html_500() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Html(HTML_500)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_registers() {
        let views = Views::new().unwrap();
        for (name, _) in TEMPLATES {
            assert!(views.registry.get_template(name).is_some(), "{}", name);
        }
    }

    #[test]
    fn flash_and_values_are_escaped() {
        let views = Views::new().unwrap();
        let body = views
            .registry
            .render(
                "login",
                &json!({
                    "flash": Flash::error("<b>nope</b>"),
                    "form": { "username": "a&b" },
                }),
            )
            .unwrap();
        assert!(body.contains("&lt;b&gt;nope&lt;/b&gt;"));
        assert!(body.contains("a&amp;b"));
    }
}
