use crate::core::source::{SourceUnit, TextSource};
use crate::error::SeferError;
use crate::{err, map_err};
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SEFARIA_URL: &str = "https://www.sefaria.org";

/// Which version of the text to read from a Sefaria response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextField {
    /// The Hebrew text, `he`.
    #[default]
    Hebrew,

    /// The translation, `text`.
    Translation,
}

impl TextField {
    fn key(self) -> &'static str {
        match self {
            Self::Hebrew => "he",
            Self::Translation => "text",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SefariaConfig {
    pub base_url: String,
    pub field: TextField,
    pub timeout: Duration,
}

impl Default for SefariaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SEFARIA_URL.to_string(),
            field: TextField::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fetches units from `{base_url}/api/texts/{reference}`,
/// where references are Sefaria refs such as `Genesis 1`.
#[derive(Debug, Clone)]
pub struct SefariaSource {
    base_url: String,
    field: TextField,
    client: reqwest::Client,
}

impl SefariaSource {
    pub fn new(config: &SefariaConfig) -> Result<Self, SeferError> {
        let client = map_err!(reqwest::Client::builder().timeout(config.timeout).build());

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            field: config.field,
            client,
        })
    }
}

#[async_trait::async_trait]
impl TextSource for SefariaSource {
    fn id(&self) -> &'static str {
        "sefaria"
    }

    async fn fetch(&self, reference: &str) -> Result<SourceUnit, SeferError> {
        let url = format!("{}/api/texts/{reference}", self.base_url);

        debug!("Fetching {url}");

        let response = match self.client.get(&url).send().await {
            Ok(res) => res,
            Err(e) => return err!(Fetch, "{reference}: {e}"),
        };

        let status = response.status();
        if !status.is_success() {
            return err!(Fetch, "{reference}: {url} responded with {status}");
        }

        let body = match response.json::<Value>().await {
            Ok(body) => body,
            Err(e) => return err!(Fetch, "{reference}: invalid response; {e}"),
        };

        parse_unit(reference, &body, self.field)
    }
}

/// References to chapters `chapters` of `book`, e.g. `Genesis 1`.
pub fn chapter_references(book: &str, chapters: RangeInclusive<usize>) -> Vec<String> {
    chapters.map(|chapter| format!("{book} {chapter}")).collect()
}

/// Extract the plain text of `field` from a texts API response.
fn parse_unit(reference: &str, body: &Value, field: TextField) -> Result<SourceUnit, SeferError> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return err!(Fetch, "{reference}: {error}");
    }

    let mut segments = vec![];
    if let Some(value) = body.get(field.key()) {
        flatten(value, &mut segments);
    }

    let text = strip_html(&segments.join("\n"));
    let text = text.trim();

    if text.is_empty() {
        return err!(Fetch, "{reference}: no '{}' text in response", field.key());
    }

    let label = body
        .get("ref")
        .and_then(Value::as_str)
        .unwrap_or(reference);

    Ok(SourceUnit::new(label, text))
}

/// Collect strings from arbitrarily nested arrays, in order.
fn flatten<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(values) => {
            for value in values {
                flatten(value, out);
            }
        }
        _ => {}
    }
}

/// Keep only the text nodes of `html`.
fn strip_html(html: &str) -> String {
    Html::parse_fragment(html).root_element().text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeferErr;
    use serde_json::json;

    #[test]
    fn parse_flattens_verses() {
        let body = json!({
            "ref": "Genesis 1",
            "he": ["בְּרֵאשִׁית בָּרָא", "<b>וְהָאָרֶץ</b> הָיְתָה"],
            "text": ["In the beginning", "Now the earth"]
        });

        let unit = parse_unit("Genesis.1", &body, TextField::Hebrew).unwrap();

        assert_eq!("Genesis 1", unit.label);
        assert_eq!("בְּרֵאשִׁית בָּרָא\nוְהָאָרֶץ הָיְתָה", unit.text);
    }

    #[test]
    fn parse_nested_sections() {
        let body = json!({
            "text": [["One <i class=\"footnote\">note</i>", "Two"], ["Three"]]
        });

        let unit = parse_unit("Genesis 1-2", &body, TextField::Translation).unwrap();

        assert_eq!("Genesis 1-2", unit.label);
        assert_eq!("One note\nTwo\nThree", unit.text);
    }

    #[test]
    fn parse_single_string() {
        let body = json!({ "he": "<span>שלום</span>" });

        let unit = parse_unit("x", &body, TextField::Hebrew).unwrap();

        assert_eq!("שלום", unit.text);
    }

    #[test]
    fn parse_empty_is_a_fetch_error() {
        let body = json!({ "ref": "Genesis 99", "he": [] });

        let err = parse_unit("Genesis 99", &body, TextField::Hebrew).unwrap_err();

        assert!(matches!(err.error, SeferErr::Fetch(_)));
    }

    #[test]
    fn parse_error_response() {
        let body = json!({ "error": "Could not find title in reference: Genesys 1" });

        let err = parse_unit("Genesys 1", &body, TextField::Hebrew).unwrap_err();

        assert!(err.to_string().contains("Could not find title"));
    }

    #[test]
    fn chapters() {
        assert_eq!(
            vec!["Genesis 1", "Genesis 2", "Genesis 3"],
            chapter_references("Genesis", 1..=3)
        );
    }
}
