//! Declarative extraction schemas
//!
//! A schema maps field names to CSS selectors and says which value each
//! matched element contributes. Renderers evaluate schemas against the loaded
//! document, so extraction logic is plain data and can be tested against HTML
//! fixtures without a browser.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use url::Url;

use crate::render::text::inner_text;
use crate::utils::error::ExtractionError;

/// Which value a matched element contributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Rendered inner text
    Text,
    /// Raw attribute value, empty when missing
    Attr(String),
    /// Attribute value when present and non-empty, inner text otherwise
    AttrOrText(String),
    /// `href` resolved against the document URL
    Href,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// First matching element only
    First,
    /// Every matching element, in document order
    All,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub selector: String,
    pub cardinality: Cardinality,
    pub source: ValueSource,
    compiled: Selector,
}

/// Named set of fields evaluated together against one document
#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl ExtractionSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Add a field that reads the first matching element
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidSelector` if `selector` does not parse
    pub fn first(
        self,
        name: &str,
        selector: &str,
        source: ValueSource,
    ) -> Result<Self, ExtractionError> {
        self.field(name, selector, Cardinality::First, source)
    }

    /// Add a field that reads every matching element
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidSelector` if `selector` does not parse
    pub fn all(
        self,
        name: &str,
        selector: &str,
        source: ValueSource,
    ) -> Result<Self, ExtractionError> {
        self.field(name, selector, Cardinality::All, source)
    }

    fn field(
        mut self,
        name: &str,
        selector: &str,
        cardinality: Cardinality,
        source: ValueSource,
    ) -> Result<Self, ExtractionError> {
        let compiled =
            Selector::parse(selector).map_err(|_| ExtractionError::InvalidSelector {
                field: name.to_string(),
                selector: selector.to_string(),
            })?;

        self.fields.push(FieldSpec {
            name: name.to_string(),
            selector: selector.to_string(),
            cardinality,
            source,
            compiled,
        });
        Ok(self)
    }

    /// Evaluate every field against `html`
    ///
    /// `base` is the URL the document was loaded from; it resolves relative
    /// `href` values. Missing elements never fail: `First` fields become `None`
    /// and `All` fields become empty.
    pub fn evaluate(&self, html: &str, base: Option<&Url>) -> Extracted {
        let document = Html::parse_document(html);
        let mut values = HashMap::with_capacity(self.fields.len());

        for field in &self.fields {
            let mut matches = document.select(&field.compiled);
            let value = match field.cardinality {
                Cardinality::First => {
                    FieldValue::One(matches.next().map(|el| read_value(el, &field.source, base)))
                }
                Cardinality::All => FieldValue::Many(
                    matches
                        .map(|el| read_value(el, &field.source, base))
                        .collect(),
                ),
            };
            values.insert(field.name.clone(), value);
        }

        Extracted { values }
    }
}

fn read_value(element: ElementRef<'_>, source: &ValueSource, base: Option<&Url>) -> String {
    match source {
        ValueSource::Text => inner_text(element),
        ValueSource::Attr(name) => element
            .value()
            .attr(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default(),
        ValueSource::AttrOrText(name) => match element.value().attr(name).map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => inner_text(element),
        },
        ValueSource::Href => {
            let href = element.value().attr("href").unwrap_or_default().trim();
            resolve_href(href, base)
        }
    }
}

fn resolve_href(href: &str, base: Option<&Url>) -> String {
    if href.is_empty() {
        return String::new();
    }
    match Url::parse(href) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => base
            .and_then(|b| b.join(href).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| href.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    One(Option<String>),
    Many(Vec<String>),
}

/// Result of evaluating a schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    values: HashMap<String, FieldValue>,
}

impl Extracted {
    /// Value of a `First` field (or the first value of an `All` field)
    pub fn first(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            FieldValue::One(value) => value.as_deref(),
            FieldValue::Many(values) => values.first().map(String::as_str),
        }
    }

    /// Values of an `All` field (a `First` field yields zero or one value)
    pub fn all(&self, name: &str) -> &[String] {
        match self.values.get(name) {
            Some(FieldValue::Many(values)) => values,
            Some(FieldValue::One(Some(value))) => std::slice::from_ref(value),
            _ => &[],
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <table><tbody>
          <tr class="ub-content">
            <td class="gall_tit"><a href="/board/view/?id=wow_new3&no=10">첫 글</a><a class="reply_numbox">[2]</a></td>
            <td class="gall_date" title="2025-02-20 13:45:12">02.20</td>
          </tr>
          <tr class="ub-content">
            <td class="gall_tit"><a href="https://gall.dcinside.com/board/view/?id=wow_new3&no=9">둘째 글</a></td>
            <td class="gall_date">01/20</td>
          </tr>
        </tbody></table>"#;

    fn listing_schema() -> ExtractionSchema {
        ExtractionSchema::new("listing")
            .all("links", ".gall_tit a:first-child", ValueSource::Href)
            .unwrap()
            .all("titles", ".gall_tit a:first-child", ValueSource::Text)
            .unwrap()
            .all("dates", ".gall_date", ValueSource::AttrOrText("title".into()))
            .unwrap()
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let err = ExtractionSchema::new("broken")
            .first("title", "div[", ValueSource::Text)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidSelector { ref field, .. } if field == "title"));
    }

    #[test]
    fn test_evaluate_parallel_lists() {
        let base = Url::parse("https://gall.dcinside.com/board/lists/?id=wow_new3&page=1").unwrap();
        let extracted = listing_schema().evaluate(LISTING, Some(&base));

        assert_eq!(
            extracted.all("links"),
            [
                "https://gall.dcinside.com/board/view/?id=wow_new3&no=10".to_string(),
                "https://gall.dcinside.com/board/view/?id=wow_new3&no=9".to_string(),
            ]
        );
        assert_eq!(extracted.all("titles"), ["첫 글".to_string(), "둘째 글".to_string()]);
        assert_eq!(
            extracted.all("dates"),
            ["2025-02-20 13:45:12".to_string(), "01/20".to_string()]
        );
    }

    #[test]
    fn test_schema_fields_in_order() {
        let schema = listing_schema();
        assert_eq!(schema.name(), "listing");
        let names: Vec<_> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["links", "titles", "dates"]);
        assert_eq!(schema.fields()[0].cardinality, Cardinality::All);
        assert_eq!(schema.fields()[2].selector, ".gall_date");
    }

    #[test]
    fn test_missing_fields_degrade() {
        let schema = ExtractionSchema::new("post")
            .first("title", ".title_subject", ValueSource::Text)
            .unwrap()
            .all("comments", ".comment_box .usertxt", ValueSource::Text)
            .unwrap();
        let extracted = schema.evaluate("<html><body><p>nothing</p></body></html>", None);

        assert_eq!(extracted.first("title"), None);
        assert!(extracted.all("comments").is_empty());
        assert_eq!(extracted.first("unknown"), None);
    }

    #[test]
    fn test_relative_href_without_base_is_kept() {
        assert_eq!(resolve_href("/board/view/?no=1", None), "/board/view/?no=1");
        assert_eq!(resolve_href("", None), "");
    }
}
