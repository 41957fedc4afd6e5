//! trace command - Drive a headless navigation session
//!
//! # Example
//!
//! ```bash
//! softnav trace https://example.com /about /blog --back 1
//! ```
//!
//! The start page is fetched and parsed into an in-memory document, the
//! controller is booted on it, and every requested hop goes through the real
//! pipeline (cache, history, transitions) with the in-memory host standing in
//! for the browser. Failed hops are reported and the trace continues.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use url::Url;

use crate::cache::{MarkerParser, MarkupParser};
use crate::cli::Context;
use crate::core::config::Config;
use crate::core::types::NavigationState;
use crate::core::urls::cache_key;
use crate::engine::{ControllerBuilder, NavigationOutcome};
use crate::events::{Event, EventBus, EventData};
use crate::fetch::{FetchRequest, Fetcher, HttpFetcher};
use crate::host::memory::{MemoryDocument, MemoryWindow};
use crate::transition::TransitionDescriptor;

/// Arguments of `softnav trace`.
#[derive(Debug, Clone, Default)]
pub struct TraceOptions {
    pub origin: String,
    pub paths: Vec<String>,
    pub back: usize,
    pub transition: Option<String>,
    pub config: Option<PathBuf>,
}

/// Everything a trace observed.
#[derive(Debug, Default)]
pub struct TraceReport {
    pub events: Vec<(Event, EventData)>,
    /// One line per hop, in order.
    pub outcomes: Vec<String>,
    pub history: Vec<NavigationState>,
    pub pointer: usize,
}

/// Run the trace command.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn trace(ctx: &Context, options: TraceOptions) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(run(Arc::new(HttpFetcher::new()), options))?;
    print_report(ctx, &report);
    Ok(())
}

/// Async implementation of trace, with the fetcher injectable.
pub async fn run(fetcher: Arc<dyn Fetcher>, options: TraceOptions) -> Result<TraceReport> {
    let config = Config::load(options.config.as_deref())
        .context("Failed to load configuration")?
        .config;
    let origin = Url::parse(&options.origin)
        .with_context(|| format!("Invalid origin '{}'", options.origin))?;

    let response = fetcher
        .fetch(&origin, &FetchRequest::get())
        .await
        .with_context(|| format!("Failed to fetch start page {}", origin))?;
    if !response.is_success() {
        bail!(
            "Start page {} returned {} {}",
            origin,
            response.status,
            response.status_text
        );
    }

    let parser = MarkerParser::new(&config.wrapper_attr).context("Invalid wrapper_attr")?;
    let mut initial = parser.parse(&response.body);
    match initial.wrapper.as_mut() {
        Some(wrapper) => wrapper.page = cache_key(&origin),
        None => bail!(
            "Start page {} has no element with {}",
            origin,
            config.wrapper_attr
        ),
    }

    let window = Arc::new(MemoryWindow::new(origin.clone()));
    let document = Arc::new(MemoryDocument::new(initial));
    let bus = Arc::new(EventBus::new());
    let recording = bus.record(&Event::ALL);

    let mut builder = ControllerBuilder::new(document, window.clone(), window.clone())
        .config(config)
        .bus(bus)
        .fetcher(fetcher)
        .parser(Arc::new(parser));
    if let Some(name) = &options.transition {
        builder = builder.transition(TransitionDescriptor::instant(name.as_str()));
    }
    let controller = builder.build().context("Invalid configuration")?;
    controller.boot().await.context("Failed to boot")?;

    let mut outcomes = Vec::new();
    for path in &options.paths {
        let line = match controller.go(path, options.transition.as_deref()).await {
            Ok(outcome) => format!("{}: {}", path, describe_outcome(&outcome)),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "hop failed");
                format!("{}: error: {}", path, e)
            }
        };
        outcomes.push(line);
    }

    for step in 0..options.back {
        let Some(payload) = window.traverse(-1) else {
            outcomes.push(format!("back {}: start of history", step + 1));
            break;
        };
        let line = match controller.on_popstate(Some(payload)).await {
            Ok(outcome) => format!("back {}: {}", step + 1, describe_outcome(&outcome)),
            Err(e) => format!("back {}: error: {}", step + 1, e),
        };
        outcomes.push(line);
    }

    Ok(TraceReport {
        events: recording.stop(),
        outcomes,
        history: controller.history(),
        pointer: controller.history_pointer(),
    })
}

fn describe_outcome(outcome: &NavigationOutcome) -> String {
    match outcome {
        NavigationOutcome::Completed { url, transition } => {
            format!("completed {} ({})", url, transition)
        }
        NavigationOutcome::Unchanged => "unchanged".to_string(),
        NavigationOutcome::Blocked => "blocked".to_string(),
        NavigationOutcome::HardNavigated(url) => format!("hard navigation to {}", url),
        NavigationOutcome::Rejected(reason) => format!("rejected: {}", reason),
    }
}

fn describe_data(data: &EventData) -> String {
    match data {
        EventData::None => String::new(),
        EventData::Link { href } => href.clone(),
        EventData::Navigation { from, to, trigger } => format!("{} -> {} [{}]", from, to, trigger),
        EventData::History { state } => format!("#{} {}", state.index, state.url),
        EventData::Popstate { direction, index } => format!("{} to #{}", direction, index),
        EventData::Transition { name, .. } => name.clone(),
        EventData::Error { url, message } => format!("{}: {}", url, message),
    }
}

fn print_report(ctx: &Context, report: &TraceReport) {
    if !ctx.quiet {
        println!("events:");
        for (event, data) in &report.events {
            let detail = describe_data(data);
            if detail.is_empty() {
                println!("  {}", event);
            } else {
                println!("  {:<22} {}", event.as_str(), detail);
            }
        }
        println!();
        println!("hops:");
        for line in &report.outcomes {
            println!("  {}", line);
        }
        println!();
    }

    println!("history:");
    for state in &report.history {
        let marker = if state.index == report.pointer { "*" } else { " " };
        println!(
            "{} {:>3}  {}  {}",
            marker, state.index, state.url, state.transition_name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockFetcher;

    fn page(name: &str) -> String {
        format!(
            "<html><head><title>{0}</title></head><body><main data-softnav-wrapper>{0}</main></body></html>",
            name
        )
    }

    fn site() -> MockFetcher {
        MockFetcher::new()
            .with_page("/", page("Home"))
            .with_page("/a", page("A"))
            .with_page("/b", page("B"))
    }

    fn options(paths: &[&str], back: usize) -> TraceOptions {
        TraceOptions {
            origin: "https://example.com/".into(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
            back,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn walks_paths_and_records_history() {
        let report = run(Arc::new(site()), options(&["/a", "/b"], 0))
            .await
            .unwrap();

        assert_eq!(report.history.len(), 3);
        assert_eq!(report.pointer, 2);
        assert_eq!(report.events.first().map(|(e, _)| *e), Some(Event::Ready));
        assert_eq!(report.events.last().map(|(e, _)| *e), Some(Event::NavigationEnd));
        assert!(report.outcomes[1].starts_with("/b: completed"));
    }

    #[tokio::test]
    async fn back_steps_replay_history() {
        let report = run(Arc::new(site()), options(&["/a", "/b"], 2))
            .await
            .unwrap();

        assert_eq!(report.pointer, 0);
        assert!(report
            .events
            .iter()
            .any(|(e, _)| *e == Event::PopstateBack));
    }

    #[tokio::test]
    async fn failed_hop_is_reported_and_trace_continues() {
        let fetcher = site().with_status("/missing", 404, "Not Found");
        let report = run(Arc::new(fetcher), options(&["/missing", "/a"], 0))
            .await
            .unwrap();

        assert!(report.outcomes[0].contains("error"));
        assert!(report.outcomes[1].contains("completed"));
        assert_eq!(report.history.len(), 2);
    }

    #[tokio::test]
    async fn start_page_without_wrapper_fails() {
        let fetcher = MockFetcher::new().with_page("/", "<p>nothing here</p>");
        let err = run(Arc::new(fetcher), options(&["/a"], 0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no element with"));
    }

    #[tokio::test]
    async fn unreachable_start_page_fails() {
        let err = run(Arc::new(MockFetcher::new()), options(&["/a"], 0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("returned 404"));
    }
}
