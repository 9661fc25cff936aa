//! Server-side HTML for the console. Every value coming from the backend or the
//! user passes through [`escape_html`] before it reaches the page.

use crate::controller::{Action, ConsoleView, RequestState};
use crate::models::SearchResult;

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// One `<p>` per result, in backend order.
pub fn render_search_results(results: &[SearchResult]) -> String {
    let mut out = String::with_capacity(results.len() * 64);
    for result in results {
        out.push_str("<p><strong>");
        out.push_str(&escape_html(&result.date));
        out.push_str(":</strong> ");
        out.push_str(&escape_html(&result.content));
        out.push_str("</p>");
    }
    out
}

/// Plain-text listing for the terminal.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No relevant results found.".to_string();
    }

    let mut out = String::from("\nTop Results:\n");
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("\nResult {}:\n", i + 1));
        out.push_str(&format!("Date: {}\n", result.date));
        if let Some(path) = &result.path {
            out.push_str(&format!("Path: {}\n", path));
        }
        if let Some(score) = result.score {
            out.push_str(&format!("Score: {:.2}\n", score));
        }
        out.push_str(&format!("Content:\n{}\n", result.content));
    }
    out
}

fn render_state(action: Action, state: &RequestState) -> String {
    let label = match state {
        RequestState::Idle => "idle".to_string(),
        RequestState::Pending { .. } => "pending".to_string(),
        RequestState::Succeeded { .. } => "done".to_string(),
        RequestState::Failed { message, .. } => format!("failed: {}", escape_html(message)),
    };
    format!(
        "<li data-action=\"{}\" data-state=\"{}\">{}: {}</li>",
        action.name(),
        state.name(),
        action.name(),
        label
    )
}

pub fn render_page(view: &ConsoleView) -> String {
    let mut page = String::with_capacity(2048);
    page.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Meeting Assistant</title>\n</head>\n<body>\n<h1>Meeting Assistant</h1>\n",
    );

    if let Some(alert) = &view.alert {
        page.push_str("<div id=\"alert\" role=\"alert\">");
        page.push_str(&escape_html(alert));
        page.push_str("</div>\n");
    }

    page.push_str(
        "<section id=\"recording\">\n\
         <form method=\"post\" action=\"/ui/record\"><button id=\"startRecording\">Start Recording</button></form>\n\
         <form method=\"post\" action=\"/ui/stop\"><button id=\"stopRecording\">Stop Recording</button></form>\n\
         </section>\n",
    );

    page.push_str(
        "<section id=\"summarize\">\n\
         <form method=\"post\" action=\"/ui/summarize\" enctype=\"multipart/form-data\">\
         <input type=\"file\" id=\"fileInput\" name=\"file\"><button id=\"summarizeBtn\">Summarize</button></form>\n\
         <form method=\"post\" action=\"/ui/summarize-text\">\
         <textarea name=\"text\" rows=\"6\" placeholder=\"Paste your text here...\"></textarea>\
         <button id=\"summarizeTextBtn\">Summarize text</button></form>\n",
    );
    page.push_str("<pre id=\"summaryOutput\">");
    if let Some(summary) = &view.summary {
        page.push_str(&escape_html(summary));
    }
    page.push_str("</pre>\n</section>\n");

    page.push_str(
        "<section id=\"search\">\n\
         <form method=\"get\" action=\"/ui/search\">\
         <input type=\"text\" id=\"searchQuery\" name=\"query\"><button id=\"searchBtn\">Search</button></form>\n\
         <div id=\"searchResults\">",
    );
    page.push_str(&render_search_results(&view.search_results));
    page.push_str("</div>\n</section>\n");

    page.push_str("<ul id=\"requests\">\n");
    for status in &view.requests {
        page.push_str(&render_state(status.action, &status.state));
        page.push('\n');
    }
    page.push_str("</ul>\n</body>\n</html>\n");
    page
}
