use std::fmt::Write;

use crate::models::query::{QualityGrade, SpeciesType, DEFAULT_RESULT_COUNT};
use crate::services::presenter::{ErrorReport, LeastObservedReport};
use crate::utils::format::{escape_html, thousands};

pub enum PageContent<'a> {
    Form,
    Results(&'a LeastObservedReport),
    Error(&'a ErrorReport),
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Least Observed Species</title>
    <style>
        body { font-family: sans-serif; margin: 2rem auto; max-width: 60rem; color: #222; }
        form { display: grid; gap: 0.6rem; margin-bottom: 2rem; }
        table { border-collapse: collapse; width: 100%; }
        th, td { border-bottom: 1px solid #ddd; padding: 0.4rem; text-align: left; }
        td.count { text-align: right; }
        .error { color: #a40000; border: 1px solid #a40000; padding: 0.8rem; }
    </style>
</head>
<body>
<h1>Least Observed Species</h1>
"#;

const TAIL: &str = "</body>\n</html>\n";

fn render_form(out: &mut String) {
    out.push_str(r#"<form method="post" action="/">
    <label>Observer ID <input type="text" name="observer_id" required></label>
    <label><input type="checkbox" name="filter_by_species_type"> Filter by species type</label>
    <select name="species_type">
"#);
    for species_type in SpeciesType::ALL {
        let _ = writeln!(
            out,
            r#"        <option value="{}">{}</option>"#,
            species_type.api_name(),
            species_type.label()
        );
    }
    out.push_str("    </select>\n");
    out.push_str(
        r#"    <label><input type="checkbox" name="filter_by_quality_grade"> Filter by quality grade</label>
    <select name="quality_grade">
"#,
    );
    for grade in QualityGrade::ALL {
        let _ = writeln!(
            out,
            r#"        <option value="{}">{}</option>"#,
            grade.api_name(),
            grade.label()
        );
    }
    out.push_str("    </select>\n");
    let _ = writeln!(
        out,
        r#"    <label>Number of results <input type="number" name="number_of_results" min="1" value="{}"></label>"#,
        DEFAULT_RESULT_COUNT
    );
    out.push_str("    <button type=\"submit\">Search</button>\n</form>\n");
}

fn render_results(out: &mut String, report: &LeastObservedReport) {
    let query = &report.query;
    let species_type = query
        .species_type_filter
        .map(|t| t.label())
        .unwrap_or("all species");
    let quality_grade = query
        .quality_grade_filter
        .map(|g| g.label())
        .unwrap_or("any");

    let _ = writeln!(
        out,
        "<h2>{} least observed {} for {}</h2>",
        query.result_count,
        escape_html(species_type),
        escape_html(&query.observer_id)
    );
    let _ = writeln!(
        out,
        "<p>Quality grade: {}. {} distinct species, {} observations in total.</p>",
        escape_html(quality_grade),
        thousands(report.distinct_species as u64),
        thousands(report.total_observations)
    );
    out.push_str(
        "<table>\n<tr><th></th><th>Name</th><th>Taxon ID</th><th>Observations</th><th>Type</th><th></th></tr>\n",
    );
    for result in &report.results {
        let _ = writeln!(
            out,
            r#"<tr><td><img src="{}" alt="" width="75" height="75"></td><td>{}</td><td>{}</td><td class="count">{}</td><td>{}</td><td><a href="{}">Observations</a></td></tr>"#,
            escape_html(&result.image_url),
            escape_html(&result.display_name),
            result.species_id,
            thousands(result.observation_count),
            escape_html(&result.iconic_type),
            escape_html(&result.observation_link)
        );
    }
    out.push_str("</table>\n");
}

pub fn render_page(content: PageContent<'_>) -> String {
    let mut out = String::from(HEAD);
    render_form(&mut out);
    match content {
        PageContent::Form => {}
        PageContent::Results(report) => render_results(&mut out, report),
        PageContent::Error(report) => {
            let _ = writeln!(out, r#"<p class="error">{}</p>"#, escape_html(&report.message));
        }
    }
    out.push_str(TAIL);
    out
}
