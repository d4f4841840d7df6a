//! Template rendering.
//!
//! Handlebars with HTML escaping turned off (the output is plain text that
//! carries issue titles and JSON verbatim) and one helper:
//! - hours: format a number with two decimals

use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde_json::Value;

use crate::templates::TemplatesFile;

handlebars_helper!(hours: |v: f64| format!("{:.2}", v));

pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new(templates: &TemplatesFile) -> Result<Self, String> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(no_escape);
        handlebars.register_helper("hours", Box::new(hours));

        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| format!("Template {} is invalid: {}", name, e))?;
        }
        Ok(Self { handlebars })
    }

    pub fn render(&self, template_name: &str, data: &Value) -> Result<String, String> {
        self.handlebars
            .render(template_name, data)
            .map_err(|e| format!("Render error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renderer(yaml: &str) -> Result<TemplateRenderer, String> {
        let file: TemplatesFile = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
        TemplateRenderer::new(&file)
    }

    #[test]
    fn test_hours_helper() {
        let r = renderer(
            r#"
version: "1.0"
templates:
  t:
    template: "{{hours h}} h"
"#,
        )
        .unwrap();
        assert_eq!(r.render("t", &json!({ "h": 1.5 })).unwrap(), "1.50 h");
        assert_eq!(r.render("t", &json!({ "h": 0 })).unwrap(), "0.00 h");
    }

    #[test]
    fn test_no_html_escaping() {
        let r = renderer(
            r#"
version: "1.0"
templates:
  t:
    template: "{{v}}"
"#,
        )
        .unwrap();
        assert_eq!(
            r.render("t", &json!({ "v": "summary ~ \"a & b\"" })).unwrap(),
            "summary ~ \"a & b\""
        );
    }

    #[test]
    fn test_broken_template_reported() {
        let err = renderer(
            r#"
version: "1.0"
templates:
  broken:
    template: "{{#if x}}never closed"
"#,
        )
        .err()
        .unwrap();
        assert!(err.starts_with("Template broken is invalid"));
    }
}
