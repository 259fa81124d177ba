use crate::api_util::escape_html;
use statusdeck::history::HistoryStats;
use statusdeck::mock::{overall_uptime, Component, DayUptime};
use statusdeck::{Provider, Sample, Severity};
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;margin:2em;background:#f6f7f9}\
table{border-collapse:collapse}td,th{padding:.4em .8em;text-align:left}\
.badge{padding:.1em .6em;border-radius:.8em;color:#fff}\
.green{background:#2ecc71}.blue{background:#3498db}.yellow{background:#f1c40f}\
.orange{background:#e67e22}.red{background:#e74c3c}.gray{background:#95a5a6}\
.spark{display:inline-block;width:4px;margin-right:1px;background:#3498db}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <link rel=\"stylesheet\" href=\"https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.0/css/all.min.css\">\
         <style>{STYLE}</style></head><body>\
         <nav><a href=\"/\">Overview</a> | <a href=\"/monitoring\">Monitoring</a> | \
         <a href=\"/download_report\">Excel report</a> | <a href=\"/download_daily_report\">Daily report</a> | \
         <a href=\"/get_report_text\">Text report</a></nav><h1>{title}</h1>{body}</body></html>",
        title = escape_html(title),
    )
}

fn badge(severity: Severity) -> String {
    format!(
        "<span class=\"badge {}\">{}</span>",
        severity.color(),
        severity.label()
    )
}

/// One row per sample, linking to the detail page.
pub fn overview(title: &str, samples: &[Sample]) -> String {
    let mut body = String::from(
        "<table><tr><th></th><th>Service</th><th>Status</th><th>Latency</th><th>Status page</th></tr>",
    );
    for sample in samples {
        let Some(provider) = Provider::find(&sample.provider) else {
            continue;
        };
        let d = provider.descriptor();
        let _ = write!(
            body,
            "<tr><td><i class=\"{icon}\"></i></td><td><a href=\"/service/{slug}\">{name}</a></td>\
             <td>{badge}</td><td>{latency} ms</td><td><a href=\"{url}\">{url}</a></td></tr>",
            icon = d.icon,
            slug = d.slug,
            name = escape_html(d.name),
            badge = badge(sample.severity),
            latency = sample.latency_ms,
            url = d.status_url,
        );
    }
    body.push_str("</table>");
    page(title, &body)
}

pub struct Detail<'a> {
    pub provider: Provider,
    pub current: &'a Sample,
    pub history: &'a [Sample],
    pub stats: Option<&'a HistoryStats>,
    pub components: &'a [Component],
    pub uptime: &'a [DayUptime],
}

pub fn detail(d: &Detail<'_>) -> String {
    let desc = d.provider.descriptor();
    let mut body = String::new();
    let _ = write!(
        body,
        "<p><i class=\"{}\"></i> {} <a href=\"{url}\">{url}</a></p>",
        desc.icon,
        badge(d.current.severity),
        url = desc.status_url,
    );

    if let Some(stats) = d.stats {
        let _ = write!(
            body,
            "<h2>Response time</h2><p>last {} ms, avg {:.0} ms, min {} ms, max {} ms \
             over {} checks, {:.1}% reachable</p>",
            stats.last_ms, stats.avg_ms, stats.min_ms, stats.max_ms, stats.samples, stats.availability
        );
    }

    let peak = d.history.iter().map(|s| s.latency_ms).max().unwrap_or(1).max(1);
    body.push_str("<div>");
    for sample in d.history {
        let height = 4 + sample.latency_ms * 60 / peak;
        let _ = write!(
            body,
            "<span class=\"spark\" style=\"height:{height}px\" title=\"{} ms\"></span>",
            sample.latency_ms
        );
    }
    body.push_str("</div>");

    body.push_str("<h2>Components</h2><table>");
    for component in d.components {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(&component.name),
            badge(component.severity)
        );
    }
    body.push_str("</table>");

    let _ = write!(
        body,
        "<h2>Uptime</h2><p>{:.2}% over the last {} days</p>",
        overall_uptime(d.uptime),
        d.uptime.len()
    );

    page(desc.name, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(provider: Provider, severity: Severity) -> Sample {
        Sample {
            provider: provider.name().to_string(),
            severity,
            latency_ms: 120,
            time: Utc::now(),
        }
    }

    #[test]
    fn overview_links_every_service() {
        let samples: Vec<_> = Provider::ALL
            .iter()
            .map(|&p| sample(p, Severity::Ok))
            .collect();
        let html = overview("Service status", &samples);
        for provider in Provider::ALL {
            assert!(html.contains(&format!("/service/{}", provider.descriptor().slug)));
        }
    }

    #[test]
    fn detail_shows_components_and_uptime() {
        let current = sample(Provider::Docker, Severity::Major);
        let components = vec![Component {
            name: "Hub".into(),
            severity: Severity::Minor,
        }];
        let uptime = vec![DayUptime {
            days_ago: 0,
            percent: 99.5,
        }];
        let html = detail(&Detail {
            provider: Provider::Docker,
            current: &current,
            history: std::slice::from_ref(&current),
            stats: None,
            components: &components,
            uptime: &uptime,
        });
        assert!(html.contains("Major outage"));
        assert!(html.contains("Hub"));
        assert!(html.contains("99.50%"));
    }
}
