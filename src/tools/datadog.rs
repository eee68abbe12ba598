//! Interactive Datadog link builder
//!
//! Asks for services, identifiers, a time range and the pages to open, then
//! opens the matching logs and/or APM traces search in the browser.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use inquire::{MultiSelect, Select, Text};
use url::form_urlencoded;

use crate::config_file::{Config, DatadogInstance, DatadogService};
use crate::executor::Cmd;

use super::ToolError;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// How far back to search; `None` means live tail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    label: &'static str,
    window: Option<Duration>,
}

impl TimeRange {
    pub const LIVE: TimeRange = TimeRange {
        label: "Live",
        window: None,
    };

    pub const ALL: [TimeRange; 9] = [
        TimeRange::LIVE,
        TimeRange::past("Past 15 minutes", 15 * MINUTE),
        TimeRange::past("Past 1 hour", HOUR),
        TimeRange::past("Past 4 hours", 4 * HOUR),
        TimeRange::past("Past 1 day", DAY),
        TimeRange::past("Past 2 days", 2 * DAY),
        TimeRange::past("Past 3 days", 3 * DAY),
        TimeRange::past("Past 7 days", 7 * DAY),
        TimeRange::past("Past 15 days", 15 * DAY),
    ];

    const fn past(label: &'static str, secs: u64) -> TimeRange {
        TimeRange {
            label,
            window: Some(Duration::from_secs(secs)),
        }
    }

    /// Start and end in unix milliseconds, ending at `now_ms`.
    fn bounds(self, now_ms: u64) -> Option<(u64, u64)> {
        let window = u64::try_from(self.window?.as_millis()).unwrap_or(u64::MAX);
        Some((now_ms.saturating_sub(window), now_ms))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Logs,
    Traces,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Page::Logs => "Logs",
            Page::Traces => "Traces",
        })
    }
}

struct Labeled<T>(T, String);

impl<T> fmt::Display for Labeled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.1)
    }
}

/// Everything the form collects
#[derive(Debug, Clone, Default)]
pub struct Search {
    pub subdomain: String,
    pub services: Vec<DatadogService>,
    pub environment_id: String,
    pub account_id: String,
    pub error_message: String,
    pub live: bool,
    /// Unix milliseconds; ignored when `live`
    pub from_ms: u64,
    pub to_ms: u64,
    pub log_status: Vec<String>,
    pub trace_status: Vec<String>,
}

fn or_group(field: &str, values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(format!("{field}:({})", values.join(" OR ")))
    }
}

impl Search {
    /// Query terms shared by logs and traces
    fn base_terms(&self) -> Vec<String> {
        let mut terms = Vec::new();
        let names: Vec<String> = self.services.iter().map(|s| s.name.clone()).collect();
        terms.extend(or_group("service", &names));

        let mut attributes = Vec::new();
        for service in &self.services {
            let Some(prefix) = &service.attribute_prefix else {
                continue;
            };
            if !self.environment_id.is_empty() {
                attributes.push(format!("{prefix}environment_id:{}", self.environment_id));
            }
            if !self.account_id.is_empty() {
                attributes.push(format!("{prefix}account_id:{}", self.account_id));
            }
        }
        if !attributes.is_empty() {
            terms.push(format!("({})", attributes.join(" OR ")));
        }

        if !self.error_message.trim().is_empty() {
            terms.push(self.error_message.trim().to_string());
        }
        terms
    }

    #[must_use]
    pub fn logs_url(&self) -> String {
        let mut terms = self.base_terms();
        terms.extend(or_group("status", &self.log_status));
        if self.live {
            format!(
                "https://{}.datadoghq.com/logs/livetail?{}",
                self.subdomain,
                query_param(&terms)
            )
        } else {
            format!(
                "https://{}.datadoghq.com/logs?from_ts={}&to_ts={}&{}",
                self.subdomain,
                self.from_ms,
                self.to_ms,
                query_param(&terms)
            )
        }
    }

    #[must_use]
    pub fn traces_url(&self) -> String {
        let mut terms = self.base_terms();
        terms.extend(or_group("status", &self.trace_status));
        let range = if self.live {
            String::new()
        } else {
            format!("start={}&end={}&", self.from_ms, self.to_ms)
        };
        format!(
            "https://{}.datadoghq.com/apm/traces?{range}{}historicalData={}",
            self.subdomain,
            query_param(&terms),
            !self.live
        )
    }
}

/// `query=<encoded>&`, or nothing when there are no terms
fn query_param(terms: &[String]) -> String {
    let query = terms.join(" ");
    let query = query.trim();
    if query.is_empty() {
        return String::new();
    }
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("query={encoded}&")
}

fn now_ms() -> u64 {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX)
}

fn open(url: &str) -> Result<(), ToolError> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    Cmd::from_tokens([opener, url]).run()?;
    Ok(())
}

fn select_statuses(title: &str, options: &[&str]) -> Result<Vec<String>, ToolError> {
    Ok(MultiSelect::new(title, options.to_vec())
        .prompt()?
        .into_iter()
        .map(ToString::to_string)
        .collect())
}

/// Ask for a search and open it in the browser.
///
/// # Errors
///
/// Returns `ToolError::Prompt` if the form is cancelled, or the failing opener.
pub fn form(config: &Config) -> Result<(), ToolError> {
    let environment_id = Text::new("Environment Id").prompt()?;
    let account_id = Text::new("Account Id").prompt()?;
    let services = MultiSelect::new(
        "Service",
        config
            .datadog_services
            .iter()
            .map(|s| Labeled(s.clone(), s.label.clone()))
            .collect(),
    )
    .prompt()?;
    let instance: Labeled<DatadogInstance> = Select::new(
        "DataDog Instance",
        config
            .datadog_instances
            .iter()
            .map(|i| Labeled(i.clone(), i.label.clone()))
            .collect(),
    )
    .prompt()?;
    let time_range = Select::new("Time Range", TimeRange::ALL.to_vec()).prompt()?;
    let pages = MultiSelect::new("Page", vec![Page::Logs, Page::Traces]).prompt()?;
    let error_message = Text::new("Error Message").prompt()?;

    let log_status = if pages.contains(&Page::Logs) {
        select_statuses("Log Status", &["info", "warn", "error"])?
    } else {
        Vec::new()
    };
    let trace_status = if pages.contains(&Page::Traces) {
        select_statuses("Trace Status", &["ok", "error"])?
    } else {
        Vec::new()
    };

    let (from_ms, to_ms) = time_range.bounds(now_ms()).unwrap_or_default();
    let search = Search {
        subdomain: instance.0.subdomain,
        services: services.into_iter().map(|s| s.0).collect(),
        environment_id,
        account_id,
        error_message,
        live: time_range == TimeRange::LIVE,
        from_ms,
        to_ms,
        log_status,
        trace_status,
    };

    if pages.contains(&Page::Logs) {
        open(&search.logs_url())?;
    }
    if pages.contains(&Page::Traces) {
        open(&search.traces_url())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, prefix: Option<&str>) -> DatadogService {
        DatadogService {
            label: name.to_string(),
            name: name.to_string(),
            attribute_prefix: prefix.map(ToString::to_string),
        }
    }

    fn search() -> Search {
        Search {
            subdomain: "app".to_string(),
            services: vec![service("gateway", Some("@")), service("elb", None)],
            environment_id: "42".to_string(),
            from_ms: 1_000,
            to_ms: 2_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_base_terms() {
        assert_eq!(
            search().base_terms(),
            vec!["service:(gateway OR elb)", "(@environment_id:42)"]
        );
    }

    #[test]
    fn test_logs_url_with_range_and_status() {
        let mut search = search();
        search.log_status = vec!["warn".to_string(), "error".to_string()];
        assert_eq!(
            search.logs_url(),
            "https://app.datadoghq.com/logs?from_ts=1000&to_ts=2000&\
             query=service%3A%28gateway+OR+elb%29+%28%40environment_id%3A42%29+status%3A%28warn+OR+error%29&"
        );
    }

    #[test]
    fn test_traces_url_live() {
        let search = Search {
            subdomain: "app".to_string(),
            live: true,
            ..Default::default()
        };
        assert_eq!(
            search.traces_url(),
            "https://app.datadoghq.com/apm/traces?historicalData=false"
        );
        assert_eq!(search.logs_url(), "https://app.datadoghq.com/logs/livetail?");
    }

    #[test]
    fn test_traces_url_with_message() {
        let search = Search {
            subdomain: "eu".to_string(),
            error_message: " timeout ".to_string(),
            trace_status: vec!["error".to_string()],
            from_ms: 5,
            to_ms: 10,
            ..Default::default()
        };
        assert_eq!(
            search.traces_url(),
            "https://eu.datadoghq.com/apm/traces?start=5&end=10&query=timeout+status%3A%28error%29&historicalData=true"
        );
    }

    #[test]
    fn test_time_range_bounds() {
        assert_eq!(TimeRange::LIVE.bounds(10_000), None);
        let past_hour = TimeRange::ALL[2];
        assert_eq!(past_hour.to_string(), "Past 1 hour");
        assert_eq!(
            past_hour.bounds(10_000_000),
            Some((10_000_000 - 3_600_000, 10_000_000))
        );
    }
}
