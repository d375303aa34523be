//! Live-search configuration attached to chat requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Whether the service augments the conversation with live search.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Off,
    On,
    #[default]
    Auto,
    Invalid,
}

impl<'de> serde::Deserialize<'de> for SearchMode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

impl SearchMode {
    /// Parses a mode string. Unknown modes convert to the invalid sentinel,
    /// which request validation rejects.
    pub fn parse(mode: &str) -> Self {
        match mode {
            "off" => Self::Off,
            "on" => Self::On,
            "auto" => Self::Auto,
            _ => Self::Invalid,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Auto => "auto",
            Self::Invalid => "invalid",
        }
    }
}

/// How far back search results may reach.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchRecency {
    #[default]
    Default,
    Day,
    Week,
    Month,
    Year,
}

impl SearchRecency {
    fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

/// General web search source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebSource {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_websites: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_websites: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub safe_search: bool,
}

impl WebSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allowed_websites<I, S>(mut self, websites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_websites = websites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_excluded_websites<I, S>(mut self, websites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_websites = websites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_safe_search(mut self, safe_search: bool) -> Self {
        self.safe_search = safe_search;
        self
    }
}

/// News outlet search source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewsSource {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_websites: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub safe_search: bool,
}

impl NewsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_excluded_websites<I, S>(mut self, websites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_websites = websites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_safe_search(mut self, safe_search: bool) -> Self {
        self.safe_search = safe_search;
        self
    }
}

/// X post search source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct XSource {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_x_handles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_x_handles: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub post_favorite_count: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub post_view_count: u32,
}

impl XSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_included_handles<I, S>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.included_x_handles = handles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_excluded_handles<I, S>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_x_handles = handles.into_iter().map(Into::into).collect();
        self
    }

    /// Only consider posts with at least this many favorites.
    pub fn with_post_favorite_count(mut self, count: u32) -> Self {
        self.post_favorite_count = count;
        self
    }

    /// Only consider posts with at least this many views.
    pub fn with_post_view_count(mut self, count: u32) -> Self {
        self.post_view_count = count;
        self
    }
}

/// RSS feed search source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RssSource {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

impl RssSource {
    pub fn new<I, S>(links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            links: links.into_iter().map(Into::into).collect(),
        }
    }
}

/// One place live search may draw results from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchSource {
    Web(WebSource),
    News(NewsSource),
    X(XSource),
    Rss(RssSource),
}

macro_rules! search_source_from {
    ($config:ty, $variant:ident) => {
        impl From<$config> for SearchSource {
            fn from(config: $config) -> Self {
                Self::$variant(config)
            }
        }
    };
}

search_source_from!(WebSource, Web);
search_source_from!(NewsSource, News);
search_source_from!(XSource, X);
search_source_from!(RssSource, Rss);

/// Live-search settings for a chat request.
///
/// The defaults ask for automatic mode with up to five results; attach via
/// `ChatRequest::with_search_parameters`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchParameters {
    pub mode: SearchMode,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    #[serde(default, skip_serializing_if = "SearchRecency::is_default")]
    pub recency: SearchRecency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_citations: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_search_results: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SearchSource>,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            mode: SearchMode::Auto,
            count: 5,
            domains: Vec::new(),
            recency: SearchRecency::Default,
            return_citations: None,
            max_search_results: None,
            from_date: None,
            to_date: None,
            sources: Vec::new(),
        }
    }
}

impl SearchParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_recency(mut self, recency: SearchRecency) -> Self {
        self.recency = recency;
        self
    }

    pub fn with_return_citations(mut self, return_citations: bool) -> Self {
        self.return_citations = Some(return_citations);
        self
    }

    pub fn with_max_search_results(mut self, max: u32) -> Self {
        self.max_search_results = Some(max);
        self
    }

    pub fn with_from_date(mut self, date: NaiveDate) -> Self {
        self.from_date = Some(date);
        self
    }

    pub fn with_to_date(mut self, date: NaiveDate) -> Self {
        self.to_date = Some(date);
        self
    }

    /// Replaces the source list.
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SearchSource>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Appends one source.
    pub fn with_source(mut self, source: impl Into<SearchSource>) -> Self {
        self.sources.push(source.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.mode == SearchMode::Invalid {
            return Err(Error::validation("search mode is invalid"));
        }
        if self.count > 50 {
            return Err(Error::validation(format!(
                "search count must be between 0 and 50, got {}",
                self.count
            )));
        }
        for domain in &self.domains {
            if domain.is_empty() {
                return Err(Error::validation("search domain cannot be empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults() {
        let params = SearchParameters::new();
        assert_eq!(params.mode, SearchMode::Auto);
        assert_eq!(params.count, 5);
        assert!(params.validate().is_ok());

        let wire = serde_json::to_value(&params).unwrap();
        assert_eq!(wire, serde_json::json!({"mode": "auto", "count": 5}));
    }

    #[test]
    fn test_count_bounds() {
        assert!(SearchParameters::new().with_count(0).validate().is_ok());
        assert!(SearchParameters::new().with_count(50).validate().is_ok());

        let err = SearchParameters::new().with_count(51).validate().unwrap_err();
        assert_eq!(
            err.message(),
            "search count must be between 0 and 50, got 51"
        );
    }

    #[test]
    fn test_mode_parse_sentinel() {
        assert_eq!(SearchMode::parse("off"), SearchMode::Off);
        assert_eq!(SearchMode::parse("on"), SearchMode::On);
        assert_eq!(SearchMode::parse("auto"), SearchMode::Auto);
        assert_eq!(SearchMode::parse("aggressive"), SearchMode::Invalid);

        let parsed: SearchMode = serde_json::from_str(r#""aggressive""#).unwrap();
        assert_eq!(parsed, SearchMode::Invalid);
        assert!(
            SearchParameters::new()
                .with_mode(SearchMode::Invalid)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_empty_domain_rejected() {
        let params = SearchParameters::new().with_domains(["example.com", ""]);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_date_window_wire_format() {
        let params = SearchParameters::new()
            .with_from_date(date(2024, 1, 15))
            .with_to_date(date(2024, 3, 1));

        let wire = serde_json::to_value(&params).unwrap();
        assert_eq!(wire["from_date"], "2024-01-15");
        assert_eq!(wire["to_date"], "2024-03-01");
    }

    #[test]
    fn test_sources_wire_format() {
        let params = SearchParameters::new()
            .with_mode(SearchMode::On)
            .with_return_citations(true)
            .with_max_search_results(20)
            .with_sources([
                SearchSource::from(
                    WebSource::new()
                        .with_allowed_websites(["example.com"])
                        .with_country("DE")
                        .with_safe_search(true),
                ),
                SearchSource::from(
                    XSource::new()
                        .with_included_handles(["grok"])
                        .with_post_favorite_count(100),
                ),
                SearchSource::from(RssSource::new(["https://example.com/feed.xml"])),
            ]);

        let wire = serde_json::to_value(&params).unwrap();
        assert_eq!(wire["return_citations"], true);
        assert_eq!(wire["max_search_results"], 20);

        let sources = wire["sources"].as_array().unwrap();
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0]["type"], "web");
        assert_eq!(sources[0]["country"], "DE");
        assert_eq!(sources[0]["safe_search"], true);
        assert_eq!(sources[1]["type"], "x");
        assert_eq!(sources[1]["included_x_handles"][0], "grok");
        assert_eq!(sources[1]["post_favorite_count"], 100);
        assert!(sources[1].get("post_view_count").is_none());
        assert_eq!(sources[2]["type"], "rss");
        assert_eq!(sources[2]["links"][0], "https://example.com/feed.xml");
    }

    #[test]
    fn test_with_source_appends() {
        let params = SearchParameters::new()
            .with_source(WebSource::new())
            .with_source(NewsSource::new().with_country("GB"));
        assert_eq!(params.sources.len(), 2);
        assert!(matches!(params.sources[1], SearchSource::News(_)));
    }

    #[test]
    fn test_recency_serialization() {
        let params = SearchParameters::new().with_recency(SearchRecency::Week);
        let wire = serde_json::to_value(&params).unwrap();
        assert_eq!(wire["recency"], "week");

        let quiet = serde_json::to_value(SearchParameters::new()).unwrap();
        assert!(quiet.get("recency").is_none());
    }
}
