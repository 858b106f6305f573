use super::http_client::HttpClient;
use super::parsers::{DatalabResponse, KeywordToolResponse, SearchResponse};
use super::TrendDataSource;
use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::models::{DemographicGroup, KeywordStats, MentionCounts, TrendSeries};
use async_trait::async_trait;
use base64::Engine;
use chrono::{Days, Local, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use sha2::Sha256;
use tracing::{debug, info};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

// ── DataLab request body ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DatalabRequest<'a> {
    start_date: NaiveDate,
    end_date: NaiveDate,
    time_unit: &'static str,
    keyword_groups: Vec<KeywordGroup<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<&'static str>,
    #[serde(skip_serializing_if = "no_ages")]
    ages: &'static [&'static str],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KeywordGroup<'a> {
    group_name: &'a str,
    keywords: Vec<&'a str>,
}

fn no_ages(ages: &&[&str]) -> bool {
    ages.is_empty()
}

impl<'a> DatalabRequest<'a> {
    fn new(query: &'a str, start: NaiveDate, end: NaiveDate, time_unit: &'static str) -> Self {
        Self {
            start_date: start,
            end_date: end,
            time_unit,
            keyword_groups: vec![KeywordGroup {
                group_name: query,
                keywords: query
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .collect(),
            }],
            gender: None,
            ages: &[],
        }
    }

    fn for_group(mut self, group: DemographicGroup) -> Self {
        match group {
            DemographicGroup::Female => self.gender = Some("f"),
            DemographicGroup::Male => self.gender = Some("m"),
            DemographicGroup::Age10 => self.ages = &["1", "2"],
            DemographicGroup::Age20 => self.ages = &["3", "4"],
            DemographicGroup::Age30 => self.ages = &["5", "6"],
            DemographicGroup::Age40 => self.ages = &["7", "8"],
            DemographicGroup::Age50 => self.ages = &["9", "10"],
        }
        self
    }
}

// ── Request signing ───────────────────────────────────────────────────────────

/// Search-ad API signature: base64(HMAC-SHA256(secret, "{timestamp}.{method}.{uri}")).
pub fn sign(timestamp: &str, method: &str, uri: &str, secret: &str) -> Result<String, FetchError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| FetchError::Credentials(format!("HMAC key: {e}")))?;
    mac.update(format!("{timestamp}.{method}.{uri}").as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

fn header(map: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), FetchError> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| FetchError::Credentials(format!("{name} is not a valid header value")))?;
    map.insert(HeaderName::from_static(name), value);
    Ok(())
}

fn require<'a>(value: &'a str, key: &str) -> Result<&'a str, FetchError> {
    if value.trim().is_empty() {
        Err(FetchError::Credentials(format!("source.{key} is not configured")))
    } else {
        Ok(value)
    }
}

// ── Naver source ──────────────────────────────────────────────────────────────

/// Naver DataLab, blog/news search and search-ad keyword tool.
pub struct NaverSource {
    client: HttpClient,
    config: SourceConfig,
}

impl NaverSource {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: HttpClient::new(config)?,
            config: config.clone(),
        })
    }

    fn openapi_headers(&self) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        header(&mut headers, "x-naver-client-id", require(&self.config.client_id, "client_id")?)?;
        header(
            &mut headers,
            "x-naver-client-secret",
            require(&self.config.client_secret, "client_secret")?,
        )?;
        Ok(headers)
    }

    fn keyword_tool_headers(&self, uri: &str) -> Result<HeaderMap, FetchError> {
        let timestamp = Utc::now().timestamp_millis().to_string();
        let secret = require(&self.config.ad_secret_key, "ad_secret_key")?;
        let signature = sign(&timestamp, "GET", uri, secret)?;

        let mut headers = HeaderMap::new();
        header(&mut headers, "x-timestamp", &timestamp)?;
        header(&mut headers, "x-api-key", require(&self.config.ad_api_key, "ad_api_key")?)?;
        header(
            &mut headers,
            "x-customer",
            require(&self.config.ad_customer_id, "ad_customer_id")?,
        )?;
        header(&mut headers, "x-signature", &signature)?;
        Ok(headers)
    }

    /// Demographic slices cover the last `demographic_lookback_days` up to yesterday.
    fn demographic_window(&self) -> (NaiveDate, NaiveDate) {
        let today = Local::now().date_naive();
        let end = today - Days::new(1);
        let start = end - Days::new(u64::from(self.config.demographic_lookback_days));
        (start, end)
    }

    async fn datalab(&self, request: &DatalabRequest<'_>) -> Result<TrendSeries, FetchError> {
        let url = Url::parse(&self.config.datalab_url)?;
        let response: DatalabResponse = self
            .client
            .post_json(&url, &self.openapi_headers()?, request)
            .await?;
        response.into_series()
    }

    async fn search_total(&self, kind: &str, query: &str) -> Result<u64, FetchError> {
        let base = self.config.search_url.trim_end_matches('/');
        let url = Url::parse_with_params(
            &format!("{base}/{kind}.json"),
            &[("query", query), ("display", "1"), ("start", "1")],
        )?;
        let response: SearchResponse = self.client.get_json(&url, &self.openapi_headers()?).await?;
        Ok(response.total)
    }
}

#[async_trait]
impl TrendDataSource for NaverSource {
    async fn fetch_overall_trend(
        &self,
        query: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TrendSeries, FetchError> {
        let series = self
            .datalab(&DatalabRequest::new(query, start, end, "date"))
            .await?;
        info!("{}: {} daily trend points ({} → {})", query, series.len(), start, end);
        Ok(series)
    }

    async fn fetch_demographic_trend(
        &self,
        query: &str,
        group: DemographicGroup,
    ) -> Result<TrendSeries, FetchError> {
        let (start, end) = self.demographic_window();
        let request = DatalabRequest::new(query, start, end, "month").for_group(group);
        let series = self.datalab(&request).await?;
        debug!("{}: {} points for {}", query, series.len(), group);
        Ok(series)
    }

    async fn fetch_keyword_stats(&self, query: &str) -> Result<KeywordStats, FetchError> {
        let hint: String = query.chars().filter(|c| !c.is_whitespace()).collect();
        let url = Url::parse_with_params(
            &self.config.keyword_tool_url,
            &[("hintKeywords", hint.as_str()), ("showDetail", "1")],
        )?;
        let headers = self.keyword_tool_headers(url.path())?;

        let response: KeywordToolResponse = self.client.get_json(&url, &headers).await?;
        let stats = response.into_stats(query)?;
        info!(
            "{}: seed {:?} pc={} mobile={}, {} candidates",
            query,
            stats.seed.keyword,
            stats.seed.monthly_pc_count,
            stats.seed.monthly_mobile_count,
            stats.candidates.len()
        );
        Ok(stats)
    }

    async fn fetch_mention_counts(&self, query: &str) -> Result<MentionCounts, FetchError> {
        let (blog_count, news_count) =
            tokio::try_join!(self.search_total("blog", query), self.search_total("news", query))?;
        Ok(MentionCounts {
            blog_count,
            news_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_matches_reference() {
        let sig = sign("1700000000000", "GET", "/keywordstool", "secret-key").unwrap();
        assert_eq!(sig, "W36UoKa4A2YA0CeiPcIkr6EEjdpEfLZmO+/k+2kP8CY=");
    }

    #[test]
    fn test_datalab_request_body() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let overall = serde_json::to_value(DatalabRequest::new("rust, 러스트", start, end, "date"))
            .unwrap();
        assert_eq!(overall["startDate"], "2024-01-01");
        assert_eq!(overall["timeUnit"], "date");
        assert_eq!(overall["keywordGroups"][0]["groupName"], "rust, 러스트");
        assert_eq!(overall["keywordGroups"][0]["keywords"][1], "러스트");
        assert!(overall.get("gender").is_none());
        assert!(overall.get("ages").is_none());

        let female = serde_json::to_value(
            DatalabRequest::new("rust", start, end, "month").for_group(DemographicGroup::Female),
        )
        .unwrap();
        assert_eq!(female["gender"], "f");

        let age = serde_json::to_value(
            DatalabRequest::new("rust", start, end, "month").for_group(DemographicGroup::Age50),
        )
        .unwrap();
        assert_eq!(age["ages"], serde_json::json!(["9", "10"]));
    }

    #[test]
    fn test_missing_credentials_reported() {
        let source = NaverSource::new(&SourceConfig::default()).unwrap();
        assert!(matches!(source.openapi_headers(), Err(FetchError::Credentials(_))));
        assert!(matches!(
            source.keyword_tool_headers("/keywordstool"),
            Err(FetchError::Credentials(_))
        ));
    }

    #[test]
    fn test_demographic_window_ends_yesterday() {
        let source = NaverSource::new(&SourceConfig::default()).unwrap();
        let (start, end) = source.demographic_window();
        assert_eq!(end, Local::now().date_naive() - Days::new(1));
        assert_eq!((end - start).num_days(), 30);
    }
}
