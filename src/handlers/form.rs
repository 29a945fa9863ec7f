//! Form page handlers
//!
//! Server-rendered single page: the input form, then whatever the last
//! submission produced (verdict, warnings or an error indicator).

use std::fmt::Write;

use axum::{extract::State, response::Html, Form};

use crate::logic::SubmissionOutcome;
use crate::models::{TransactionForm, LANE_TYPES, VEHICLE_DIMENSIONS, VEHICLE_TYPES};
use crate::AppState;

/// Render the empty form
pub async fn show(State(state): State<AppState>) -> Html<String> {
    let defaults = TransactionForm {
        vehicle_type: VEHICLE_TYPES[0].to_string(),
        vehicle_dimensions: VEHICLE_DIMENSIONS[0].to_string(),
        lane_type: LANE_TYPES[0].to_string(),
        ..TransactionForm::default()
    };
    Html(render_page(&state, &defaults, None))
}

/// Handle the "Detect Fraud" button
pub async fn detect(
    State(state): State<AppState>,
    Form(form): Form<TransactionForm>,
) -> Html<String> {
    let outcome = state.controller.submit_form(&form).await;
    Html(render_page(&state, &form, Some(&outcome)))
}

fn render_page(state: &AppState, form: &TransactionForm, outcome: Option<&SubmissionOutcome>) -> String {
    let mut html = String::with_capacity(4096);

    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Real-time FASTAG Fraud Detection</title>\n</head>\n<body>\n\
         <h1>Real-time FASTAG Fraud Detection</h1>\n",
    );

    for err in &state.controller.resources().errors {
        let _ = writeln!(html, "<div class=\"error startup\">{}</div>", escape_html(&err.to_string()));
    }

    html.push_str("<p>Enter the following information to detect fraud:</p>\n");
    html.push_str("<form method=\"post\" action=\"/detect\">\n");

    text_input(&mut html, "vehicle_plate", "Vehicle Plate", &form.vehicle_plate);
    text_input(&mut html, "fastag_id", "FASTAG ID", &form.fastag_id);
    text_input(&mut html, "toll_booth_id", "Toll Booth ID", &form.toll_booth_id);
    select(&mut html, "vehicle_type", "Vehicle Type", VEHICLE_TYPES, &form.vehicle_type);
    select(&mut html, "vehicle_dimensions", "Vehicle Dimensions", VEHICLE_DIMENSIONS, &form.vehicle_dimensions);
    select(&mut html, "lane_type", "Lane Type", LANE_TYPES, &form.lane_type);
    number_input(&mut html, "transaction_amount", "Transaction Amount", &form.transaction_amount);
    number_input(&mut html, "amount_paid", "Amount Paid", &form.amount_paid);
    text_input(
        &mut html,
        "geographical_location",
        "Geographical Location (latitude, longitude)",
        &form.geographical_location,
    );

    html.push_str("<button type=\"submit\">Detect Fraud</button>\n</form>\n");

    if let Some(outcome) = outcome {
        render_outcome(&mut html, outcome);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_outcome(html: &mut String, outcome: &SubmissionOutcome) {
    for warning in outcome.warnings() {
        let _ = writeln!(html, "<div class=\"error\">{}</div>", escape_html(&warning.message));
    }

    match (outcome.verdict(), outcome.error()) {
        (Some(verdict), _) => {
            let _ = writeln!(
                html,
                "<div class=\"verdict\" data-label=\"{}\" data-submission=\"{}\">{}</div>",
                verdict.label as u8,
                outcome.submission_id(),
                verdict.message
            );
        }
        (None, Some(error)) => {
            let _ = writeln!(
                html,
                "<div class=\"error submit\">An error occurred: {}</div>",
                escape_html(&error.to_string())
            );
        }
        (None, None) => {}
    }
}

fn text_input(html: &mut String, name: &str, label: &str, value: &str) {
    let _ = writeln!(
        html,
        "<label>{label}<input type=\"text\" name=\"{name}\" value=\"{}\"></label>",
        escape_html(value)
    );
}

fn number_input(html: &mut String, name: &str, label: &str, value: &str) {
    let value = if value.is_empty() { "0.00" } else { value };
    let _ = writeln!(
        html,
        "<label>{label}<input type=\"number\" step=\"0.01\" name=\"{name}\" value=\"{}\"></label>",
        escape_html(value)
    );
}

fn select(html: &mut String, name: &str, label: &str, options: &[&str], selected: &str) {
    let _ = writeln!(html, "<label>{label}<select name=\"{name}\">");
    for option in options {
        let marker = if *option == selected { " selected" } else { "" };
        let _ = writeln!(html, "<option value=\"{option}\"{marker}>{option}</option>");
    }
    html.push_str("</select></label>\n");
}

pub(crate) fn escape_html(raw: &str) -> String {
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
