use crate::model::{CheckReport, CheckedApplication, UpdateDecision};
use crate::version::{self, SemanticVersion};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct DecisionRow {
    #[tabled(rename = "Application")]
    name: String,
    #[tabled(rename = "Publisher")]
    publisher: String,
    #[tabled(rename = "Installed")]
    installed: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn print_cli_table(report: &CheckReport) -> Result<()> {
    println!();
    println!(
        "Checked at: {}",
        report.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    if report.results.is_empty() {
        println!("No applications to check.");
        return Ok(());
    }

    let rows: Vec<DecisionRow> = report.results.iter().map(decision_row).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    print_download_links(report);

    println!();
    print_summary(report);

    Ok(())
}

fn decision_row(checked: &CheckedApplication) -> DecisionRow {
    let decision = &checked.decision;

    DecisionRow {
        name: truncate(&checked.application.name, 30),
        publisher: truncate(&checked.application.publisher, 25),
        installed: decision.current_version.clone(),
        latest: decision
            .latest_version
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string()),
        status: format_status(decision),
    }
}

fn format_status(decision: &UpdateDecision) -> String {
    if let Some(note) = &decision.note {
        return truncate(note, 45);
    }

    match &decision.latest_version {
        Some(latest) if decision.has_update => {
            let current = version::normalize(&decision.current_version);
            match classify_update(&current, latest) {
                "major" => "\x1b[31mMAJOR update\x1b[0m".to_string(),
                "minor" => "\x1b[33mminor update\x1b[0m".to_string(),
                _ => "\x1b[32mpatch update\x1b[0m".to_string(),
            }
        }
        _ => "up to date".to_string(),
    }
}

/// Classify version update as major, minor, or patch
fn classify_update(current: &SemanticVersion, latest: &SemanticVersion) -> &'static str {
    if latest.major() > current.major() {
        "major"
    } else if latest.major() == current.major() && latest.minor() > current.minor() {
        "minor"
    } else {
        "patch"
    }
}

/// Print download pages for applications with updates
fn print_download_links(report: &CheckReport) {
    let links: Vec<(&str, &str)> = report
        .updates()
        .filter_map(|r| {
            let url = r.decision.download_url.as_deref()?;
            Some((r.application.name.as_str(), url))
        })
        .collect();

    if links.is_empty() {
        return;
    }

    println!();
    println!("Downloads:");
    for (name, url) in links {
        println!("  {:<30} {}", truncate(name, 30), url);
    }
}

fn print_summary(report: &CheckReport) {
    let updates = report.updates().count();
    let unresolved = report.unresolved().count();
    let major = report
        .updates()
        .filter(|r| {
            r.decision.latest_version.as_ref().is_some_and(|latest| {
                classify_update(&version::normalize(&r.decision.current_version), latest) == "major"
            })
        })
        .count();

    println!("Summary:");
    println!("  Applications: {}", report.results.len());
    if major > 0 {
        println!("  Updates available: {} ({} major)", updates, major);
    } else {
        println!("  Updates available: {}", updates);
    }
    if unresolved > 0 {
        println!("  Not determined: {}", unresolved);
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApplicationDescriptor;

    #[test]
    fn test_classify_update() {
        let current = SemanticVersion::new(1, 2, 3);
        assert_eq!(classify_update(&current, &SemanticVersion::new(2, 0, 0)), "major");
        assert_eq!(classify_update(&current, &SemanticVersion::new(1, 3, 0)), "minor");
        assert_eq!(classify_update(&current, &SemanticVersion::new(1, 2, 4)), "patch");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long application name", 10), "a very ...");
    }

    #[test]
    fn test_status_for_note() {
        let decision = UpdateDecision::unresolved("1.0", "offline");
        assert_eq!(format_status(&decision), "offline");
    }

    #[test]
    fn test_status_up_to_date() {
        let decision = UpdateDecision::resolved("2.0", "2.0", None);
        assert_eq!(format_status(&decision), "up to date");
    }

    #[test]
    fn test_decision_row_without_latest() {
        let checked = CheckedApplication {
            application: ApplicationDescriptor::new("Tool", "Acme", "1.0", "/opt/tool"),
            decision: UpdateDecision::skipped("1.0"),
        };

        let row = decision_row(&checked);

        assert_eq!(row.latest, "-");
        assert_eq!(row.installed, "1.0");
    }
}
