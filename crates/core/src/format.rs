use crate::{
    events::TelemetryEvent,
    ingest::Summary,
    quote::{QuoteRequest, SubmitOutcome},
};

/// Format milliseconds as `850ms`, `1.2s` or `MM:SS`
pub fn format_duration(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{:.0}ms", ms)
    } else if ms < 60_000.0 {
        format!("{:.1}s", ms / 1000.0)
    } else {
        let total = (ms / 1000.0) as u64;
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

/// One line per stored event
pub fn format_event_line(event: &TelemetryEvent) -> String {
    let metadata = event
        .payload
        .metadata()
        .ok()
        .flatten()
        .map(|m| m.to_string())
        .unwrap_or_default();
    format!(
        "{} {:<20} {:<16} {}",
        event.timestamp,
        event.name(),
        event.page.as_deref().unwrap_or("-"),
        metadata
    )
}

pub fn format_summary_readable(summary: &Summary) -> String {
    let mut output = String::new();
    output.push_str("# Analytics summary\n\n");
    output.push_str(&format!(
        "**Range:** {} – {}\n\n",
        summary.time_range.start_date, summary.time_range.end_date
    ));

    output.push_str("## Page views\n\n");
    output.push_str(&format!(
        "{} total, {} unique pages\n",
        summary.page_views.total, summary.page_views.unique
    ));
    for (page, count) in &summary.page_views.by_page {
        output.push_str(&format!("• {} ({})\n", page, count));
    }
    output.push('\n');

    output.push_str("## Conversions\n\n");
    output.push_str(&format!("{} total\n", summary.conversions.total));
    for (kind, count) in &summary.conversions.by_type {
        output.push_str(&format!("• {} ({})\n", kind, count));
    }
    output.push('\n');

    let perf = &summary.performance;
    output.push_str("## Performance\n\n");
    output.push_str(&format!(
        "LCP {} | FID {} | CLS {:.3} | Load {}\n\n",
        format_duration(perf.avg_lcp),
        format_duration(perf.avg_fid),
        perf.avg_cls,
        format_duration(perf.avg_load_time)
    ));

    output.push_str("## Errors\n\n");
    output.push_str(&format!("{} total\n", summary.errors.total));
    for (kind, count) in &summary.errors.by_type {
        output.push_str(&format!("• {} ({})\n", kind, count));
    }

    output
}

pub fn format_quote_readable(request: &QuoteRequest, outcome: Option<&SubmitOutcome>) -> String {
    let mut output = String::new();
    output.push_str(&format!("# Quote: {}\n\n", request.project.project_type));

    let contact = &request.contact;
    output.push_str(&format!("**Contact:** {} <{}>", contact.name, contact.email));
    if !contact.company.is_empty() {
        output.push_str(&format!(" | **Company:** {}", contact.company));
    }
    if !contact.phone.is_empty() {
        output.push_str(&format!(" | **Phone:** {}", contact.phone));
    }
    output.push_str("\n\n");

    let req = &request.requirements;
    output.push_str(&format!(
        "**Budget:** {} | **Timeline:** {}\n\n",
        req.budget, req.timeline
    ));
    output.push_str("## Description\n\n");
    output.push_str(&req.description);
    output.push_str("\n\n");

    if !req.features.is_empty() {
        output.push_str("## Features\n\n");
        for feature in &req.features {
            output.push_str(&format!("• {}\n", feature));
        }
        output.push('\n');
    }

    if !request.has_design.is_empty() {
        output.push_str(&format!("**Has design:** {}\n", request.has_design));
    }
    if !request.needs_hosting.is_empty() {
        output.push_str(&format!("**Needs hosting:** {}\n", request.needs_hosting));
    }
    if let Some(file) = &request.attachment {
        output.push_str(&format!("**Attachment:** {}\n", file.file_name));
    }
    if !request.additional_info.is_empty() {
        output.push_str(&format!("\n{}\n", request.additional_info));
    }

    match outcome {
        Some(SubmitOutcome::Accepted(id)) => {
            output.push_str(&format!("\n**Lead:** {}\n", id));
        }
        Some(SubmitOutcome::Failed(reason)) => {
            output.push_str(&format!("\n**Not stored:** {}\n", reason));
        }
        None => {}
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(850.0), "850ms");
        assert_eq!(format_duration(1234.0), "1.2s");
        assert_eq!(format_duration(125_000.0), "02:05");
    }
}
