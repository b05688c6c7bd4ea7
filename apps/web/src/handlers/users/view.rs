use std::fmt::Write;

use authsweep_domain::{UserRecord, tester_local_part};

/// Renders the review form for tester accounts of `username`.
///
/// Each row is a checkbox named by uid; submitting posts the ticked uids to
/// the delete endpoint.
pub(super) fn render_tester_list(username: &str, candidates: &[UserRecord]) -> String {
    let mut rows = String::new();
    for candidate in candidates {
        let uid = escape_html(candidate.uid());
        let email = escape_html(candidate.email().unwrap_or_default());
        // Writing to a String cannot fail.
        let _ = write!(
            rows,
            "<tr><td><input type=\"checkbox\" name=\"{uid}\" id=\"{uid}\"></td>\
             <td><label for=\"{uid}\">{uid}</label></td><td>{email}</td></tr>"
        );
    }

    let heading = escape_html(tester_local_part(username));
    let body = if candidates.is_empty() {
        format!("<p>No tester accounts found for {heading}.</p>")
    } else {
        format!(
            "<form method=\"post\" action=\"/user/delete/uuids\">\
             <table><thead><tr><th></th><th>uid</th><th>email</th></tr></thead>\
             <tbody>{rows}</tbody></table>\
             <button type=\"submit\">Delete selected</button></form>"
        )
    };

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <title>Tester accounts for {heading}</title></head>\
         <body><h1>Tester accounts for {heading}+</h1><p>{count} found</p>{body}</body></html>",
        count = candidates.len()
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
