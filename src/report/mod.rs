use crate::apply::{RunReport, TargetDiff};

fn header(label: &str) -> Vec<String> {
    let title = format!("HOST : {label}");
    let underline = "-".repeat(title.len());
    vec![title, underline]
}

fn join_sections(sections: Vec<String>) -> String {
    if sections.is_empty() {
        return String::new();
    }
    let mut out = sections.join("\n\n");
    out.push('\n');
    out
}

/// Every slave's statements under a host header, or an "Already sync" line.
pub fn render_diff(targets: &[TargetDiff]) -> String {
    let sections = targets
        .iter()
        .map(|target| {
            if target.diff.statements.is_empty() {
                return format!("Already sync : {}", target.label());
            }
            let mut lines = header(&target.label());
            lines.extend(target.diff.statements.iter().cloned());
            lines.join("\n")
        })
        .collect();
    join_sections(sections)
}

/// `action :: identifier` lines per object kind; in-sync slaves are omitted.
pub fn render_summary(targets: &[TargetDiff]) -> String {
    let sections = targets
        .iter()
        .filter(|target| !target.diff.summary.is_empty())
        .map(|target| {
            let mut lines = header(&target.label());
            for (kind, actions) in target.diff.summary.iter() {
                lines.push(kind.to_string());
                for (action, identifiers) in actions {
                    lines.extend(
                        identifiers
                            .iter()
                            .map(|identifier| format!(" {action} :: {identifier}")),
                    );
                }
            }
            lines.join("\n")
        })
        .collect();
    join_sections(sections)
}

/// Failed statements per slave, for the `run` command.
pub fn render_run(report: &RunReport) -> String {
    let sections = report
        .iter()
        .map(|run| {
            let mut lines = header(&run.label);
            if run.failures.is_empty() {
                lines.push("OK".to_string());
            }
            for failure in &run.failures {
                lines.push(failure.statement.clone());
                lines.push(format!("  ERROR: {}", failure.message));
            }
            lines.join("\n")
        })
        .collect();
    join_sections(sections)
}
