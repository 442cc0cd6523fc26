use scraper::{Html, Selector};

const CSRF_COOKIE: &str = "csrftoken";

/// Where an anti-forgery token can come from, mirroring what a rendered page exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    /// Value of the hidden `csrfmiddlewaretoken` form field.
    pub hidden_field: Option<String>,
    /// Raw `Cookie` header, also sent as the session cookie.
    pub cookie_header: Option<String>,
    /// Content of `<meta name="csrf-token">`.
    pub meta_token: Option<String>,
}

impl PageContext {
    /// Collects the hidden field and meta tag from a saved page.
    pub fn from_html(html: &str) -> Self {
        let doc = Html::parse_document(html);
        let hidden_sel = Selector::parse(r#"input[name="csrfmiddlewaretoken"]"#).ok();
        let meta_sel = Selector::parse(r#"meta[name="csrf-token"]"#).ok();

        let first_attr = |selector: &Option<Selector>, attr: &str| {
            selector.as_ref().and_then(|sel| {
                doc.select(sel)
                    .filter_map(|el| el.value().attr(attr))
                    .map(str::trim)
                    .find(|value| !value.is_empty())
                    .map(str::to_string)
            })
        };

        Self {
            hidden_field: first_attr(&hidden_sel, "value"),
            cookie_header: None,
            meta_token: first_attr(&meta_sel, "content"),
        }
    }

    pub fn with_cookie_header(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    /// Token by preference: hidden field, `csrftoken` cookie, meta tag. Blank counts as absent.
    pub fn resolve_token(&self) -> Option<String> {
        non_blank(self.hidden_field.as_deref())
            .or_else(|| self.cookie_header.as_deref().and_then(cookie_token))
            .or_else(|| non_blank(self.meta_token.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn cookie_token(header: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == CSRF_COOKIE)
        .and_then(|(_, value)| {
            let decoded = urlencoding::decode(value.trim()).ok()?;
            non_blank(Some(&decoded))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><meta name="csrf-token" content="meta-tok"></head>
        <body><form><input type="hidden" name="csrfmiddlewaretoken" value="field-tok"></form></body></html>"#;

    #[test]
    fn hidden_field_wins_over_cookie_and_meta() {
        let ctx = PageContext::from_html(PAGE).with_cookie_header("csrftoken=cookie-tok");
        assert_eq!(ctx.resolve_token().as_deref(), Some("field-tok"));
    }

    #[test]
    fn cookie_is_percent_decoded() {
        let ctx = PageContext::default().with_cookie_header("sessionid=abc; csrftoken=a%2Bb%3D");
        assert_eq!(ctx.resolve_token().as_deref(), Some("a+b="));
    }

    #[test]
    fn meta_is_last_resort_and_blank_is_absent() {
        let ctx = PageContext {
            hidden_field: Some("  ".to_string()),
            cookie_header: Some("csrftoken=".to_string()),
            meta_token: Some("meta-tok".to_string()),
        };
        assert_eq!(ctx.resolve_token().as_deref(), Some("meta-tok"));
        assert_eq!(PageContext::default().resolve_token(), None);
    }

    #[test]
    fn from_html_reads_both_sources() {
        let ctx = PageContext::from_html(PAGE);
        assert_eq!(ctx.hidden_field.as_deref(), Some("field-tok"));
        assert_eq!(ctx.meta_token.as_deref(), Some("meta-tok"));
        assert_eq!(ctx.cookie_header, None);
    }
}
