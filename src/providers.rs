//! The monitored providers and the rules that turn their status pages into
//! a [`Severity`].
//!
//! Every rule is tied to the current markup or API shape of one vendor. The
//! checks within a rule are ordered: the first one that matches decides.

use crate::fetch::{Fetch, FetchError};
use crate::Severity;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use thiserror::Error;
use tracing::{debug, warn};

const SLACK_API_URL: &str = "https://slack-status.com/api/v2.0.0/current";
const GITHUB_API_URL: &str = "https://www.githubstatus.com/api/v2/status.json";
const CONFLUENCE_STATUS_URL: &str = "https://confluence.status.atlassian.com/api/v2/status.json";
const CONFLUENCE_COMPONENTS_URL: &str =
    "https://confluence.status.atlassian.com/api/v2/components.json";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad selector: {0}")]
    Selector(String),
    #[error("unexpected JSON shape: {0}")]
    Shape(&'static str),
}

/// A monitored third party.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    GoogleCloud,
    GitHub,
    Slack,
    Docker,
    Jira,
    Cloudflare,
    Confluence,
}

/// Human-readable information about a `Provider`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub slug: &'static str,
    pub status_url: &'static str,
    /// Font Awesome class list.
    pub icon: &'static str,
}

impl Provider {
    pub const ALL: [Provider; 9] = [
        Self::Aws,
        Self::GoogleCloud,
        Self::Azure,
        Self::Jira,
        Self::Cloudflare,
        Self::Slack,
        Self::Docker,
        Self::GitHub,
        Self::Confluence,
    ];

    #[must_use]
    pub fn descriptor(self) -> Descriptor {
        let (name, slug, status_url, icon) = match self {
            Self::Aws => (
                "Amazon Web Services",
                "aws",
                "https://status.aws.amazon.com/",
                "fab fa-aws",
            ),
            Self::Azure => (
                "Microsoft Azure",
                "azure",
                "https://azure.status.microsoft/en-us/status",
                "fab fa-microsoft",
            ),
            Self::GoogleCloud => (
                "Google Cloud",
                "gcloud",
                "https://status.cloud.google.com/",
                "fab fa-google",
            ),
            Self::GitHub => (
                "GitHub",
                "github",
                "https://www.githubstatus.com/",
                "fab fa-github",
            ),
            Self::Slack => (
                "Slack",
                "slack",
                "https://status.slack.com/",
                "fab fa-slack",
            ),
            Self::Docker => (
                "Docker",
                "docker",
                "https://status.docker.com/",
                "fab fa-docker",
            ),
            Self::Jira => (
                "Atlassian Jira",
                "jira",
                "https://jira-software.status.atlassian.com/",
                "fab fa-jira",
            ),
            Self::Cloudflare => (
                "Cloudflare",
                "cloudflare",
                "https://www.cloudflarestatus.com/",
                "fab fa-cloudflare",
            ),
            Self::Confluence => (
                "Atlassian Confluence",
                "confluence",
                CONFLUENCE_STATUS_URL,
                "fab fa-confluence",
            ),
        };
        Descriptor {
            name,
            slug,
            status_url,
            icon,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Looks a provider up by slug or display name, ignoring case.
    #[must_use]
    pub fn find(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.into_iter().find(|p| {
            let d = p.descriptor();
            d.slug.eq_ignore_ascii_case(key) || d.name.eq_ignore_ascii_case(key)
        })
    }

    /// The URL the extractor reads, which is an API endpoint for some
    /// providers rather than the human-facing page.
    #[must_use]
    pub fn fetch_url(self) -> &'static str {
        match self {
            Self::Slack => SLACK_API_URL,
            Self::GitHub => GITHUB_API_URL,
            _ => self.descriptor().status_url,
        }
    }

    /// Fetches and classifies this provider's status. Never fails: anything
    /// that goes wrong is reported as `Unavailable`.
    pub async fn check(self, fetcher: &dyn Fetch) -> Severity {
        match self.extract(fetcher).await {
            Ok(severity) => {
                debug!(provider = self.name(), %severity, "status classified");
                severity
            }
            Err(e) => {
                warn!(provider = self.name(), error = %e, "status check failed");
                Severity::Unavailable
            }
        }
    }

    async fn extract(self, fetcher: &dyn Fetch) -> Result<Severity, ExtractError> {
        let body = fetcher.get(self.fetch_url()).await?;
        match self {
            Self::Aws => Ok(aws(&body)),
            Self::Azure => azure(&body),
            Self::GoogleCloud => gcloud(&body),
            Self::GitHub => github(&body),
            Self::Slack => slack(&body),
            Self::Docker => Ok(docker(&body)),
            Self::Jira | Self::Cloudflare => status_page(&body),
            Self::Confluence => {
                if let Some(severity) = confluence_indicator(&body)? {
                    return Ok(severity);
                }
                let components = fetcher.get(CONFLUENCE_COMPONENTS_URL).await?;
                confluence_components(&components)
            }
        }
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(e.to_string()))
}

fn aws(body: &str) -> Severity {
    if body.contains("Service is operating normally")
        || body.contains("status0.gif")
        || body.contains("No recent issues")
    {
        Severity::Ok
    } else if body.contains("status1.gif") {
        // Informational notice only.
        Severity::Ok
    } else if body.contains("status2.gif") {
        Severity::Minor
    } else if body.contains("status3.gif") {
        Severity::Critical
    } else {
        Severity::Ok
    }
}

fn azure(body: &str) -> Result<Severity, ExtractError> {
    let document = Html::parse_document(body);
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if ["fewer than 3", "good", "all services are healthy", "no active events"]
        .iter()
        .any(|phrase| text.contains(phrase))
    {
        return Ok(Severity::Ok);
    }

    let sections = selector(".section-content, .status-content, main")?;
    let any = selector("*")?;
    let mut warning = false;
    for section in document.select(&sections) {
        let nodes = std::iter::once(section).chain(section.select(&any));
        for token in nodes.flat_map(|el| el.value().classes()) {
            let token = token.to_lowercase();
            if token.contains("error") || token.contains("critical") {
                return Ok(Severity::Critical);
            }
            warning |= token.contains("warning");
        }
    }
    if warning {
        return Ok(Severity::Minor);
    }

    if text.contains("degradation") || text.contains("service advisory") {
        Ok(Severity::Minor)
    } else if text.contains("outage") || text.contains("unavailable") {
        Ok(Severity::Critical)
    } else {
        Ok(Severity::Ok)
    }
}

fn gcloud(body: &str) -> Result<Severity, ExtractError> {
    if body.contains("Available") || body.contains("No incidents") {
        return Ok(Severity::Ok);
    }

    let document = Html::parse_document(body);
    let bar = document
        .select(&selector(".subheader")?)
        .next()
        .and_then(|el| class_with_prefix(el, "open-incident-bar-"));
    Ok(match bar.as_deref() {
        Some("open-incident-bar-medium") => Severity::Major,
        Some("open-incident-bar-high") => Severity::Critical,
        // Nothing negative found. The page is reachable, so call it ok.
        _ => Severity::Ok,
    })
}

fn github(body: &str) -> Result<Severity, ExtractError> {
    let data: Value = serde_json::from_str(body)?;
    let Value::Object(top) = &data else {
        return Err(ExtractError::Shape("top level is not an object"));
    };
    // A missing `status` reads as an empty one; anything but an object is
    // a different API.
    let indicator = match top.get("status") {
        None => None,
        Some(Value::Object(status)) => status.get("indicator").and_then(Value::as_str),
        Some(_) => return Err(ExtractError::Shape("`status` is not an object")),
    };
    Ok(match indicator {
        Some("minor") => Severity::Minor,
        Some("major") => Severity::Major,
        Some("critical") => Severity::Critical,
        Some("maintenance") => Severity::Maintenance,
        _ => Severity::Ok,
    })
}

fn slack(body: &str) -> Result<Severity, ExtractError> {
    let data: Value = serde_json::from_str(body)?;
    let Value::Object(top) = &data else {
        return Err(ExtractError::Shape("top level is not an object"));
    };
    if top.get("status").and_then(Value::as_str) == Some("ok") {
        return Ok(Severity::Ok);
    }

    let incidents = match top.get("active_incidents") {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(list)) => list.as_slice(),
        Some(_) => return Err(ExtractError::Shape("`active_incidents` is not a list")),
    };
    if incidents.is_empty() {
        // Not ok, but nothing public: treat as just cleared.
        return Ok(Severity::Ok);
    }

    let mut maintenance = false;
    for incident in incidents {
        let Value::Object(incident) = incident else {
            return Err(ExtractError::Shape("incident is not an object"));
        };
        let kind = match incident.get("type") {
            None => String::new(),
            Some(Value::String(kind)) => kind.to_lowercase(),
            Some(_) => return Err(ExtractError::Shape("incident `type` is not a string")),
        };
        match kind.as_str() {
            "incident" => return Ok(Severity::Major),
            "maintenance" => maintenance = true,
            _ => {}
        }
    }
    Ok(if maintenance {
        Severity::Maintenance
    } else {
        Severity::Minor
    })
}

fn docker(body: &str) -> Severity {
    if body.contains("All Systems Operational") {
        Severity::Ok
    } else if body.contains("Incident") {
        Severity::Major
    } else {
        Severity::Unavailable
    }
}

/// Pages hosted by Atlassian Statuspage carry the overall state as a
/// `status-*` class on the first `.status` or `.index` node.
fn status_page(body: &str) -> Result<Severity, ExtractError> {
    let document = Html::parse_document(body);
    let Some(node) = document.select(&selector(".status, .index")?).next() else {
        return Ok(if body.contains("All Systems Operational") {
            Severity::Ok
        } else {
            Severity::Unavailable
        });
    };

    Ok(match class_with_prefix(node, "status-").as_deref() {
        Some("status-none") => Severity::Ok,
        Some("status-critical") => Severity::Critical,
        Some("status-major") => Severity::Major,
        Some("status-minor") => Severity::Minor,
        Some("status-maintenance") => Severity::Maintenance,
        _ => Severity::Unavailable,
    })
}

/// `None` means the indicator is inconclusive and components must be read.
fn confluence_indicator(body: &str) -> Result<Option<Severity>, ExtractError> {
    let data: Value = serde_json::from_str(body)?;
    let indicator = data
        .get("indicator")
        .or_else(|| data.get("status").and_then(|s| s.get("indicator")))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    Ok(match indicator.as_str() {
        "none" => Some(Severity::Ok),
        "minor" => Some(Severity::Minor),
        "major" | "critical" => Some(Severity::Critical),
        _ => None,
    })
}

fn confluence_components(body: &str) -> Result<Severity, ExtractError> {
    let data: Value = serde_json::from_str(body)?;
    let components = data
        .get("components")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for component in components {
        match component.get("status").and_then(Value::as_str) {
            Some("major_outage" | "partial_outage") => return Ok(Severity::Critical),
            Some("degraded_performance") => return Ok(Severity::Minor),
            _ => {}
        }
    }
    Ok(Severity::Ok)
}

fn class_with_prefix(el: ElementRef<'_>, prefix: &str) -> Option<String> {
    el.value()
        .classes()
        .find(|c| c.starts_with(prefix))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::CannedFetcher;

    async fn classify(provider: Provider, body: &str) -> Severity {
        let fetcher = CannedFetcher::new().with(provider.fetch_url(), body);
        provider.check(&fetcher).await
    }

    #[tokio::test]
    async fn aws_fixtures() {
        let healthy = r#"<td><img src="/images/status0.gif"></td><td>Service is operating normally</td>"#;
        let outage = r#"<td><img src="/images/status3.gif"></td><td>Service disruption</td>"#;
        let degraded = r#"<td><img src="/images/status2.gif"></td>"#;
        assert_eq!(classify(Provider::Aws, healthy).await, Severity::Ok);
        assert_eq!(classify(Provider::Aws, outage).await, Severity::Critical);
        assert_eq!(classify(Provider::Aws, degraded).await, Severity::Minor);
        assert_eq!(classify(Provider::Aws, "<html></html>").await, Severity::Ok);
    }

    #[tokio::test]
    async fn azure_fixtures() {
        let healthy = "<html><body><main><p>All services are healthy</p></main></body></html>";
        let outage = r#"<html><body><div class="section-content">
            <span class="status-icon status-error"></span><span>Compute</span>
            </div></body></html>"#;
        let warning = r#"<html><body><div class="section-content">
            <span class="icon warning-icon"></span><span>Storage</span>
            </div></body></html>"#;
        assert_eq!(classify(Provider::Azure, healthy).await, Severity::Ok);
        assert_eq!(classify(Provider::Azure, outage).await, Severity::Critical);
        assert_eq!(classify(Provider::Azure, warning).await, Severity::Minor);
    }

    #[tokio::test]
    async fn azure_falls_back_to_page_text() {
        let outage = "<html><body><h2>Active outage in West Europe</h2></body></html>";
        let advisory = "<html><body><h2>Service advisory: Key Vault</h2></body></html>";
        assert_eq!(classify(Provider::Azure, outage).await, Severity::Critical);
        assert_eq!(classify(Provider::Azure, advisory).await, Severity::Minor);

        // Degradation wins over a mention of an earlier outage.
        let both = "<p>Minor degradation following an earlier outage</p>";
        let unavailable = "<p>Portal unavailable in West Europe</p>";
        assert_eq!(classify(Provider::Azure, both).await, Severity::Minor);
        assert_eq!(classify(Provider::Azure, unavailable).await, Severity::Critical);
    }

    #[tokio::test]
    async fn gcloud_fixtures() {
        let healthy = "<html><body><p>No incidents reported</p></body></html>";
        let outage = r#"<html><body>
            <div class="subheader open-incident-bar-high">Multiple services impacted</div>
            </body></html>"#;
        let medium = r#"<div class="subheader open-incident-bar-medium"></div>"#;
        assert_eq!(classify(Provider::GoogleCloud, healthy).await, Severity::Ok);
        assert_eq!(classify(Provider::GoogleCloud, outage).await, Severity::Critical);
        assert_eq!(classify(Provider::GoogleCloud, medium).await, Severity::Major);
        assert_eq!(classify(Provider::GoogleCloud, "<p></p>").await, Severity::Ok);
    }

    #[tokio::test]
    async fn github_fixtures() {
        let healthy = r#"{"status":{"indicator":"none","description":"All Systems Operational"}}"#;
        let outage = r#"{"status":{"indicator":"critical","description":"Major Service Outage"}}"#;
        let maintenance = r#"{"status":{"indicator":"maintenance"}}"#;
        let unknown = r#"{"status":{"indicator":"sideways"}}"#;
        assert_eq!(classify(Provider::GitHub, healthy).await, Severity::Ok);
        assert_eq!(classify(Provider::GitHub, outage).await, Severity::Critical);
        assert_eq!(classify(Provider::GitHub, maintenance).await, Severity::Maintenance);
        assert_eq!(classify(Provider::GitHub, unknown).await, Severity::Ok);
        assert_eq!(classify(Provider::GitHub, "<html>").await, Severity::Unavailable);
    }

    #[tokio::test]
    async fn github_rejects_unexpected_shapes() {
        for body in [r#"{"status":"major"}"#, "[1,2]", r#"{"status":null}"#] {
            assert_eq!(classify(Provider::GitHub, body).await, Severity::Unavailable, "{body}");
        }
        // No `status` at all reads as an empty one.
        assert_eq!(classify(Provider::GitHub, "{}").await, Severity::Ok);
        assert_eq!(
            classify(Provider::GitHub, r#"{"status":{}}"#).await,
            Severity::Ok
        );
    }

    #[tokio::test]
    async fn slack_rejects_unexpected_shapes() {
        let bodies = [
            r#"{"status":"active","active_incidents":{"type":"incident"}}"#,
            r#"{"status":"active","active_incidents":[{"type":null}]}"#,
            r#"{"status":"active","active_incidents":["incident"]}"#,
            "[]",
        ];
        for body in bodies {
            assert_eq!(classify(Provider::Slack, body).await, Severity::Unavailable, "{body}");
        }
        let untyped = r#"{"status":"active","active_incidents":[{"title":"Slow uploads"}]}"#;
        assert_eq!(classify(Provider::Slack, untyped).await, Severity::Minor);
        let null = r#"{"status":"active","active_incidents":null}"#;
        assert_eq!(classify(Provider::Slack, null).await, Severity::Ok);
    }

    #[tokio::test]
    async fn slack_fixtures() {
        let healthy = r#"{"status":"ok","active_incidents":[]}"#;
        let incident = r#"{"status":"active","active_incidents":[
            {"type":"notice"},{"type":"incident"},{"type":"maintenance"}]}"#;
        let maintenance = r#"{"status":"active","active_incidents":[{"type":"Maintenance"}]}"#;
        let other = r#"{"status":"active","active_incidents":[{"type":"notice"}]}"#;
        let cleared = r#"{"status":"active","active_incidents":[]}"#;
        assert_eq!(classify(Provider::Slack, healthy).await, Severity::Ok);
        assert_eq!(classify(Provider::Slack, incident).await, Severity::Major);
        assert_eq!(classify(Provider::Slack, maintenance).await, Severity::Maintenance);
        assert_eq!(classify(Provider::Slack, other).await, Severity::Minor);
        assert_eq!(classify(Provider::Slack, cleared).await, Severity::Ok);
    }

    #[tokio::test]
    async fn docker_fixtures() {
        assert_eq!(
            classify(Provider::Docker, "<h1>All Systems Operational</h1>").await,
            Severity::Ok
        );
        assert_eq!(
            classify(Provider::Docker, "<h2>Incident with Docker Hub</h2>").await,
            Severity::Major
        );
        assert_eq!(
            classify(Provider::Docker, "<h2>Welcome</h2>").await,
            Severity::Unavailable
        );
    }

    #[tokio::test]
    async fn status_page_fixtures() {
        let healthy = r#"<body><div class="layout-content status index status-none"></div></body>"#;
        let outage = r#"<body><div class="layout-content status index status-critical"></div></body>"#;
        let maintenance = r#"<body><div class="layout-content status index status-maintenance"></div></body>"#;
        for provider in [Provider::Jira, Provider::Cloudflare] {
            assert_eq!(classify(provider, healthy).await, Severity::Ok);
            assert_eq!(classify(provider, outage).await, Severity::Critical);
            assert_eq!(classify(provider, maintenance).await, Severity::Maintenance);
        }
    }

    #[tokio::test]
    async fn status_page_reads_only_the_first_status_node() {
        // The headline span comes first and has no `status-*` class.
        let body = r#"<span class="status font-large">All Systems Operational</span>
            <div class="status index status-none"></div>"#;
        assert_eq!(classify(Provider::Jira, body).await, Severity::Unavailable);
    }

    #[tokio::test]
    async fn status_page_without_status_node() {
        let healthy = "<body><h1>All Systems Operational</h1></body>";
        let blank = "<body><h1>Hello</h1></body>";
        assert_eq!(classify(Provider::Cloudflare, healthy).await, Severity::Ok);
        assert_eq!(classify(Provider::Cloudflare, blank).await, Severity::Unavailable);
    }

    #[tokio::test]
    async fn confluence_uses_indicator_then_components() {
        let healthy = r#"{"status":{"indicator":"none"}}"#;
        assert_eq!(classify(Provider::Confluence, healthy).await, Severity::Ok);

        let fetcher = CannedFetcher::new()
            .with(CONFLUENCE_STATUS_URL, r#"{"page":{}}"#)
            .with(
                CONFLUENCE_COMPONENTS_URL,
                r#"{"components":[{"status":"operational"},{"status":"partial_outage"}]}"#,
            );
        assert_eq!(Provider::Confluence.check(&fetcher).await, Severity::Critical);

        let fetcher = CannedFetcher::new()
            .with(CONFLUENCE_STATUS_URL, r#"{"indicator":"major"}"#);
        assert_eq!(Provider::Confluence.check(&fetcher).await, Severity::Critical);

        // Components endpoint down after an inconclusive indicator.
        let fetcher = CannedFetcher::new().with(CONFLUENCE_STATUS_URL, "{}");
        assert_eq!(Provider::Confluence.check(&fetcher).await, Severity::Unavailable);
    }

    #[tokio::test]
    async fn fetch_failure_is_unavailable_for_every_provider() {
        let fetcher = CannedFetcher::new();
        for provider in Provider::ALL {
            assert_eq!(provider.check(&fetcher).await, Severity::Unavailable, "{provider}");
        }
    }

    #[test]
    fn confluence_status_url_is_its_api_endpoint() {
        let d = Provider::Confluence.descriptor();
        assert_eq!(
            d.status_url,
            "https://confluence.status.atlassian.com/api/v2/status.json"
        );
        assert_eq!(Provider::Confluence.fetch_url(), d.status_url);
    }

    #[test]
    fn find_accepts_slug_or_name() {
        assert_eq!(Provider::find("aws"), Some(Provider::Aws));
        assert_eq!(Provider::find("google cloud"), Some(Provider::GoogleCloud));
        assert_eq!(Provider::find("GitHub"), Some(Provider::GitHub));
        assert_eq!(Provider::find("myspace"), None);
    }

    #[test]
    fn slugs_and_names_are_unique() {
        let mut slugs: Vec<_> = Provider::ALL.iter().map(|p| p.descriptor().slug).collect();
        let mut names: Vec<_> = Provider::ALL.iter().map(|p| p.name()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        names.sort_unstable();
        names.dedup();
        assert_eq!(slugs.len(), Provider::ALL.len());
        assert_eq!(names.len(), Provider::ALL.len());
    }
}
