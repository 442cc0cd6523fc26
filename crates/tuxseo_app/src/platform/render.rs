//! Typed HTML fragments, one function per entity, plus a plain-text summary of the view.
//!
//! Every interpolated value goes through `html_escape`.

use std::fmt::Write as _;

use tuxseo_core::trend::{self, ChartLayout, NO_TREND_DATA};
use tuxseo_core::{
    AppViewModel, Competitor, ContentPhase, GeneratedContent, KeyValueRows, KeywordRowView,
    Notification, ProjectRowView, ScanPhase, Score, Severity, SuggestionRowView,
};
use url::Url;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Only http(s) URLs become links; anything else is shown as text.
fn is_web_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

pub fn project_card(project: &ProjectRowView) -> String {
    let url = html_escape(&project.url);
    let link = if is_web_url(&project.url) {
        format!(r#"<a class="project-url" href="{url}">{url}</a>"#)
    } else {
        format!(r#"<span class="project-url">{url}</span>"#)
    };
    format!(
        concat!(
            r#"<div class="project-card" data-project-id="{id}">"#,
            r#"<h3 class="project-name">{name}</h3>"#,
            r#"<span class="project-type">{kind}</span>"#,
            "{link}",
            r#"<p class="project-summary">{summary}</p>"#,
            "</div>"
        ),
        id = project.project_id,
        name = html_escape(&project.name),
        kind = html_escape(&project.kind),
        link = link,
        summary = html_escape(&project.summary),
    )
}

pub fn suggestion_card(row: &SuggestionRowView) -> String {
    let mut html = format!(
        r#"<div class="suggestion" data-suggestion-id="{}" data-category="{}" data-score="{}"{}>"#,
        row.suggestion_id,
        html_escape(&row.category),
        row.score.value(),
        if row.pending { r#" aria-busy="true""# } else { "" },
    );
    let _ = write!(
        html,
        r#"<h4 class="suggestion-title">{}</h4><p class="suggestion-description">{}</p>"#,
        html_escape(&row.title),
        html_escape(&row.description),
    );
    let _ = write!(
        html,
        r#"<span class="score {}">{}</span>"#,
        score_class(row.score),
        score_label(row.score),
    );
    match &row.content {
        ContentPhase::Idle => {}
        ContentPhase::Generating => html.push_str(r#"<p class="content-status">Generating...</p>"#),
        ContentPhase::Ready(content) => html.push_str(&content_form(content)),
        ContentPhase::Failed { message } => {
            let _ = write!(
                html,
                r#"<p class="content-error">{}</p><button data-action="retry">Retry</button>"#,
                html_escape(message)
            );
        }
    }
    html.push_str("</div>");
    html
}

pub fn content_form(content: &GeneratedContent) -> String {
    format!(
        concat!(
            r#"<form class="generated-content">"#,
            r#"<input name="slug" value="{slug}">"#,
            r#"<input name="tags" value="{tags}">"#,
            r#"<textarea name="description">{description}</textarea>"#,
            r#"<textarea name="content">{content}</textarea>"#,
            "</form>"
        ),
        slug = html_escape(&content.slug),
        tags = html_escape(&content.tags),
        description = html_escape(&content.description),
        content = html_escape(&content.content),
    )
}

pub fn keyword_row(row: &KeywordRowView) -> String {
    let volume = row
        .volume
        .map(|volume| volume.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        r#"<tr data-keyword-id="{}"><td>{}</td><td>{}</td><td><input type="checkbox"{}{}></td></tr>"#,
        row.keyword_id,
        html_escape(&row.text),
        volume,
        if row.in_use { " checked" } else { "" },
        if row.pending { " disabled" } else { "" },
    )
}

pub fn competitor_card(competitor: &Competitor) -> String {
    let name = if competitor.name.trim().is_empty() {
        &competitor.url
    } else {
        &competitor.name
    };
    format!(
        r#"<div class="competitor"><h4>{}</h4><a href="{}">{}</a><p>{}</p></div>"#,
        html_escape(name),
        html_escape(&competitor.url),
        html_escape(&competitor.url),
        html_escape(&competitor.description),
    )
}

pub fn notification(notification: &Notification) -> String {
    let class = match notification.severity {
        Severity::Success => "success",
        Severity::Error => "error",
    };
    format!(
        r#"<div class="notification {class}" role="status">{}</div>"#,
        html_escape(&notification.text)
    )
}

pub fn key_value_rows(rows: &KeyValueRows) -> String {
    let mut html = String::from(r#"<div class="key-value-rows">"#);
    for (index, (key, value)) in rows.rows().iter().enumerate() {
        let _ = write!(
            html,
            r#"<div class="row" data-index="{index}"><input name="key" value="{}"><input name="value" value="{}"></div>"#,
            html_escape(key),
            html_escape(value),
        );
    }
    html.push_str("</div>");
    html
}

/// SVG bar chart, or the placeholder paragraph when there are no points.
pub fn trend_chart(points: &[trend::TrendPoint], width: f64, height: f64) -> String {
    match trend::layout(points, width, height) {
        Some(layout) => chart_svg(&layout),
        None => format!(r#"<p class="trend-empty">{NO_TREND_DATA}</p>"#),
    }
}

fn chart_svg(layout: &ChartLayout) -> String {
    let mut svg = format!(
        r#"<svg class="trend-chart" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}">"#,
        layout.width, layout.height, layout.width, layout.height
    );
    for tick in &layout.y_ticks {
        let _ = write!(
            svg,
            r#"<text class="tick" x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
            layout.plot_left - 4.0,
            tick.y,
            html_escape(&tick.label),
        );
    }
    for bar in &layout.bars {
        let _ = write!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}"><title>{}</title></rect>"#,
            bar.x,
            bar.y,
            bar.width,
            bar.height,
            html_escape(&bar.tooltip),
        );
        let label_x = bar.x + bar.width / 2.0;
        let _ = write!(
            svg,
            r#"<text class="label" transform="translate({label_x:.1},{:.1}) rotate(-45)" text-anchor="end">{}</text>"#,
            layout.baseline.max(0.0) + 12.0,
            html_escape(&bar.label),
        );
    }
    let _ = write!(
        svg,
        r#"<line x1="{:.1}" x2="{:.1}" y1="{:.1}" y2="{:.1}"/>"#,
        layout.plot_left, layout.plot_right, layout.baseline, layout.baseline
    );
    svg.push_str("</svg>");
    svg
}

/// Shown once the pricing page of a project has been analyzed.
pub fn pricing_agent_link(project_id: u64) -> String {
    format!(
        r#"<a class="pricing-agent" href="/pricing-agent/{project_id}/">Use Agent</a>"#
    )
}

/// All fragments of the current view, for `--html` output.
pub fn view_html(view: &AppViewModel) -> String {
    let mut html = String::new();
    for project in &view.projects {
        html.push_str(&project_card(project));
    }
    for group in &view.groups {
        let _ = write!(
            html,
            r#"<section class="suggestions" data-group="{}">"#,
            group.id
        );
        for row in &group.suggestions {
            html.push_str(&suggestion_card(row));
        }
        html.push_str("</section>");
    }
    if !view.keywords.is_empty() {
        html.push_str("<table class=\"keywords\">");
        for row in &view.keywords {
            html.push_str(&keyword_row(row));
        }
        html.push_str("</table>");
    }
    for competitor in &view.competitors {
        html.push_str(&competitor_card(competitor));
    }
    for project_id in &view.pricing_agents {
        html.push_str(&pricing_agent_link(*project_id));
    }
    html
}

pub fn view_text(view: &AppViewModel) -> String {
    let mut out = String::new();
    for toggle in &view.toggles {
        let _ = writeln!(
            out,
            "project {} auto-submission: {}",
            toggle.project_id,
            if toggle.enabled { "on" } else { "off" }
        );
    }
    match &view.scan {
        ScanPhase::Idle => {}
        ScanPhase::Submitting { url } => {
            let _ = writeln!(out, "scan: submitting {url}");
        }
        ScanPhase::Analyzing { job } => {
            let _ = writeln!(out, "scan: analyzing {}", job.display_name());
        }
        ScanPhase::Complete { job } => {
            let _ = writeln!(out, "scan: complete {}", job.display_name());
        }
        ScanPhase::Failed { message } => {
            let _ = writeln!(out, "scan: failed: {message}");
        }
    }
    for project in &view.projects {
        let _ = writeln!(
            out,
            "project {} {} [{}] {}",
            project.project_id, project.name, project.kind, project.url
        );
    }
    for group in &view.groups {
        for row in &group.suggestions {
            let _ = writeln!(
                out,
                "{:<8} #{} {} ({})",
                group.id,
                row.suggestion_id,
                row.title,
                score_label(row.score)
            );
            if let ContentPhase::Ready(content) = &row.content {
                let _ = writeln!(out, "  slug: {}\n  tags: {}", content.slug, content.tags);
                let _ = writeln!(out, "{}", content.content);
            }
        }
    }
    for row in &view.keywords {
        let _ = writeln!(
            out,
            "keyword #{} {} volume={} used={}",
            row.keyword_id,
            row.text,
            row.volume.map_or_else(|| "-".to_string(), |v| v.to_string()),
            row.in_use
        );
    }
    for competitor in &view.competitors {
        let _ = writeln!(out, "competitor {} {}", competitor.name, competitor.url);
    }
    for project_id in &view.pricing_agents {
        let _ = writeln!(out, "pricing agent: /pricing-agent/{project_id}/");
    }
    out
}

fn score_class(score: Score) -> &'static str {
    match score {
        Score::Liked => "liked",
        Score::Neutral => "neutral",
        Score::Disliked => "disliked",
    }
}

fn score_label(score: Score) -> &'static str {
    match score {
        Score::Liked => "liked",
        Score::Neutral => "no score",
        Score::Disliked => "disliked",
    }
}
