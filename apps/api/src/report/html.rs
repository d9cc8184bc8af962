//! Self-contained HTML match report. No external assets: all CSS is inline so the
//! file renders the same from S3, email attachments or a browser download.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::interview::questions::InterviewQuestion;
use crate::matching::scorer::MatchOutcome;

const FINGERPRINT_PREFIX_CHARS: usize = 12;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; color: #1f2933; margin: 0; background: #f5f7fa; }
main { max-width: 860px; margin: 32px auto; background: #fff; padding: 32px 40px; border-radius: 8px; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
header { display: flex; justify-content: space-between; align-items: center; border-bottom: 1px solid #e4e7eb; padding-bottom: 20px; }
h1 { font-size: 24px; margin: 0 0 4px; }
h2 { font-size: 16px; margin: 28px 0 12px; text-transform: uppercase; letter-spacing: .04em; color: #52606d; }
.subtitle { color: #616e7c; margin: 0; }
.gauge { width: 96px; height: 96px; border-radius: 50%; display: flex; flex-direction: column; align-items: center; justify-content: center; color: #fff; font-weight: 700; }
.gauge .value { font-size: 32px; line-height: 1; }
.gauge .unit { font-size: 12px; opacity: .85; }
.badge { display: inline-block; padding: 4px 12px; border-radius: 999px; color: #fff; font-size: 13px; font-weight: 600; margin-top: 8px; }
.row { display: grid; grid-template-columns: 120px 1fr 64px; gap: 12px; align-items: center; margin: 8px 0; }
.bar { background: #e4e7eb; border-radius: 4px; height: 10px; overflow: hidden; }
.bar span { display: block; height: 100%; }
.points { text-align: right; font-variant-numeric: tabular-nums; }
.rationale { grid-column: 2 / 4; color: #616e7c; font-size: 13px; margin-top: -4px; }
.chip { display: inline-block; padding: 3px 10px; margin: 3px; border-radius: 999px; font-size: 13px; }
.chip.matched { background: #e3f9e5; color: #207227; }
.chip.missing { background: #ffe3e3; color: #a61b1b; }
ul { padding-left: 20px; }
li { margin: 4px 0; }
.kind { font-size: 12px; font-weight: 600; color: #52606d; text-transform: uppercase; margin-right: 6px; }
.why { color: #616e7c; font-size: 13px; }
footer { margin-top: 32px; border-top: 1px solid #e4e7eb; padding-top: 12px; color: #9aa5b1; font-size: 12px; }
"#;

pub struct ReportInput<'a> {
    pub match_id: Uuid,
    pub candidate_name: &'a str,
    pub job_title: &'a str,
    pub outcome: &'a MatchOutcome,
    pub questions: Option<&'a [InterviewQuestion]>,
    pub generated_at: DateTime<Utc>,
}

/// Escapes `& < > " '` for use in text and attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn score_color(score: u8) -> &'static str {
    match score {
        80.. => "#2f9e44",
        65..=79 => "#0c8599",
        45..=64 => "#f08c00",
        _ => "#e03131",
    }
}

pub fn render_match_report(input: ReportInput<'_>) -> String {
    let outcome = input.outcome;
    let color = score_color(outcome.overall_score);
    let candidate = escape_html(input.candidate_name);
    let job_title = escape_html(input.job_title);

    let mut html = String::with_capacity(8 * 1024);
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{candidate} for {job_title}: match report</title>
<style>{STYLE}</style>
</head>
<body>
<main>
<header>
<div>
<h1>{candidate}</h1>
<p class="subtitle">{job_title}</p>
<span class="badge" style="background:{color}">{recommendation}</span>
</div>
<div class="gauge" style="background:{color}"><span class="value">{score}</span><span class="unit">/ 100</span></div>
</header>
"#,
        recommendation = outcome.recommendation.label(),
        score = outcome.overall_score,
    ));

    html.push_str("<section>\n<h2>Score breakdown</h2>\n");
    for category in &outcome.categories {
        let percent = if category.max_points == 0 {
            0
        } else {
            category.points as u32 * 100 / category.max_points as u32
        };
        html.push_str(&format!(
            r#"<div class="row"><span>{label}</span><div class="bar"><span style="width:{percent}%;background:{color}"></span></div><span class="points">{points} / {max}</span>"#,
            label = category.category.label(),
            points = category.points,
            max = category.max_points,
        ));
        if !category.rationale.is_empty() {
            html.push_str(&format!(
                r#"<span class="rationale">{}</span>"#,
                escape_html(&category.rationale)
            ));
        }
        html.push_str("</div>\n");
    }
    html.push_str("</section>\n");

    let evidence = &outcome.evidence;
    if !evidence.required_matched.is_empty()
        || !evidence.required_missing.is_empty()
        || !evidence.preferred_matched.is_empty()
    {
        html.push_str("<section>\n<h2>Skills</h2>\n<div>");
        for skill in evidence
            .required_matched
            .iter()
            .chain(evidence.preferred_matched.iter())
        {
            html.push_str(&format!(
                r#"<span class="chip matched">{}</span>"#,
                escape_html(skill)
            ));
        }
        for skill in &evidence.required_missing {
            html.push_str(&format!(
                r#"<span class="chip missing">{}</span>"#,
                escape_html(skill)
            ));
        }
        html.push_str("</div>\n</section>\n");
    }

    push_list(&mut html, "Strengths", &outcome.strengths);
    push_list(&mut html, "Concerns", &outcome.concerns);

    html.push_str(&format!(
        "<section>\n<h2>Summary</h2>\n<p>{}</p>\n</section>\n",
        escape_html(&outcome.summary)
    ));

    if let Some(questions) = input.questions.filter(|q| !q.is_empty()) {
        html.push_str("<section>\n<h2>Interview questions</h2>\n<ol>\n");
        for q in questions {
            html.push_str(&format!(
                r#"<li><span class="kind">{kind}</span>{question}"#,
                kind = q.kind.label(),
                question = escape_html(&q.question),
            ));
            if !q.rationale.is_empty() {
                html.push_str(&format!(
                    r#"<div class="why">{}</div>"#,
                    escape_html(&q.rationale)
                ));
            }
            html.push_str("</li>\n");
        }
        html.push_str("</ol>\n</section>\n");
    }

    let fingerprint_prefix: String = outcome
        .fingerprint
        .chars()
        .take(FINGERPRINT_PREFIX_CHARS)
        .collect();
    html.push_str(&format!(
        r#"<footer>Match {match_id} · fingerprint {fp} · scored by {backend}{adjusted} · generated {generated}</footer>
</main>
</body>
</html>
"#,
        match_id = input.match_id,
        fp = escape_html(&fingerprint_prefix),
        backend = escape_html(&outcome.scorer_backend),
        adjusted = if outcome.adjusted { " (adjusted to evidence)" } else { "" },
        generated = input.generated_at.format("%Y-%m-%d %H:%M UTC"),
    ));

    html
}

fn push_list(html: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    html.push_str(&format!("<section>\n<h2>{title}</h2>\n<ul>\n"));
    for item in items {
        html.push_str(&format!("<li>{}</li>\n", escape_html(item)));
    }
    html.push_str("</ul>\n</section>\n");
}
