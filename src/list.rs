//! Read-only CLI commands: `list`, `officials`, `counties`, `slideshow`.

use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use govwatch_core::counties::CountyRegistry;
use govwatch_core::filter::Criteria;
use govwatch_core::models::MediaKind;
use govwatch_core::Report;

use crate::export::notice_error;
use crate::tracker::Tracker;

/// One report as a block of text.
pub fn format_report(report: &Report, counties: &CountyRegistry) -> String {
    let mut out = String::new();
    out.push_str(&format!("[{}] {}\n", report.issue_label(), report.title));

    let official = &report.official;
    match (official.name.is_empty(), official.position.is_empty()) {
        (true, true) => {}
        (false, true) => out.push_str(&format!("    official: {}\n", official.name)),
        (true, false) => out.push_str(&format!("    official: ({})\n", official.position)),
        (false, false) => out.push_str(&format!(
            "    official: {} ({})\n",
            official.name, official.position
        )),
    }
    let county = report
        .county_name
        .clone()
        .or_else(|| counties.name_for(&report.county).map(str::to_string))
        .unwrap_or_else(|| report.county.clone());
    if !county.is_empty() {
        out.push_str(&format!("    county: {}\n", county));
    }
    let date = report
        .parsed_date()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| report.date.clone());
    out.push_str(&format!("    date: {}\n", date));
    out.push_str(&format!("    reported by: {}\n", report.reporter_display()));

    let description = report.plain_description();
    if !description.is_empty() {
        out.push_str(&format!("    \"{}\"\n", description));
    }
    for media in &report.media {
        let kind = match media.kind() {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Other => "file",
        };
        out.push_str(&format!("    {}: {} ({})\n", kind, media.name, media.mime_type));
    }
    if let Some(id) = &report.id {
        out.push_str(&format!("    id: {}\n", id));
    }
    out
}

pub async fn run_list(tracker: &Tracker, criteria: Criteria) -> Result<()> {
    tracker.set_criteria(criteria).await.map_err(notice_error)?;
    let reports = tracker.display_list().await;
    if reports.is_empty() {
        println!("No reports.");
        return Ok(());
    }
    for (i, report) in reports.iter().enumerate() {
        print!("{}. {}", i + 1, format_report(report, tracker.counties()));
        println!();
    }
    Ok(())
}

pub async fn run_officials(tracker: &Tracker) -> Result<()> {
    for name in tracker.officials().await {
        println!("{}", name);
    }
    Ok(())
}

pub fn run_counties(counties: &CountyRegistry) -> Result<()> {
    for county in counties.iter() {
        println!("{}", county.label());
    }
    Ok(())
}

fn print_slide(tracker: &Tracker) {
    let state = tracker.slideshow_state();
    match tracker.slideshow().current() {
        Some(report) => {
            println!("--- {} ---", state.counter());
            print!("{}", format_report(&report, tracker.counties()));
        }
        None => println!("No reports to show."),
    }
}

/// Terminal slideshow. `n` / `p` navigate, `q` or end of input quits.
pub async fn run_slideshow(tracker: &Tracker, criteria: Criteria) -> Result<()> {
    tracker.set_criteria(criteria).await.map_err(notice_error)?;
    print_slide(tracker);
    if tracker.slideshow_state().total == 0 {
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut poll = tokio::time::interval(Duration::from_millis(200));
    let mut shown = tracker.slideshow_state().index;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(cmd)) => match cmd.trim() {
                        "n" | "" => tracker.slideshow().next(),
                        "p" => tracker.slideshow().previous(),
                        "q" => break,
                        other => {
                            eprintln!("unknown key '{}': n = next, p = previous, q = quit", other);
                            continue;
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "stdin closed");
                        break;
                    }
                }
                shown = tracker.slideshow_state().index;
                print_slide(tracker);
            }
            _ = poll.tick() => {
                let index = tracker.slideshow_state().index;
                if index != shown {
                    shown = index;
                    print_slide(tracker);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracker.shutdown();
    Ok(())
}
