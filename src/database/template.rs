use std::collections::HashMap;

use super::Ulid;

/// A reusable embed-code fragment for events needing custom player markup.
/// `{{ key }}` placeholders in the content are filled in at render time.
#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize)]
pub struct Template {
    pub id: Ulid,
    pub name: String,
    pub content: String,
}

impl Template {
    /// Substitutes `{{ key }}` placeholders with the given values. Unknown
    /// placeholders are left untouched so a bad render is visible rather
    /// than silently blank.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        let mut out = self.content.clone();
        for (key, value) in vars {
            out = out.replace(&format!("{{{{ {} }}}}", key), value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholders() {
        let template = Template {
            content: r#"<iframe src="{{ url }}" width="{{ width }}"></iframe>"#.to_string(),
            ..Default::default()
        };

        let rendered = template.render(&HashMap::from([("url", "https://example.com/v/1"), ("width", "640")]));
        assert_eq!(rendered, r#"<iframe src="https://example.com/v/1" width="640"></iframe>"#);
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let template = Template {
            content: "{{ url }} and {{ mystery }}".to_string(),
            ..Default::default()
        };

        let rendered = template.render(&HashMap::from([("url", "x")]));
        assert_eq!(rendered, "x and {{ mystery }}");
    }
}
