//! One-line human summaries of tool results.

use serde_json::Value;

const PREVIEW_CHARS: usize = 200;

/// Short, human-friendly line describing a tool result.
///
/// Known demo tools get a tailored sentence; anything else falls back to
/// `"<name> result: <json>"` with the JSON cut to 200 characters.
pub fn synthesize_tool_result_text(name: &str, result: &Value) -> String {
    let name = if name.is_empty() { "tool" } else { name };
    known_tool_summary(name, result).unwrap_or_else(|| fallback(name, result))
}

fn known_tool_summary(name: &str, result: &Value) -> Option<String> {
    match name {
        "get_emails" => {
            let emails = result.as_array()?;
            if emails.is_empty() {
                return Some("No matching emails found.".to_string());
            }
            let head = format!("Found {} email{}", emails.len(), plural(emails.len()));
            let subjects = string_fields(emails, "subject");
            if subjects.is_empty() {
                Some(format!("{head}."))
            } else {
                Some(format!("{head}. Subjects: {}.", preview(&subjects)))
            }
        }
        "search_policies" => {
            let policies = result.as_array()?;
            if policies.is_empty() {
                return Some("No relevant policies found.".to_string());
            }
            let titles = string_fields(policies, "title");
            if titles.is_empty() {
                return Some(format!("Matched {} policies.", policies.len()));
            }
            let noun = if policies.len() == 1 { "policy" } else { "policies" };
            Some(format!("Matched {} {noun}: {}.", policies.len(), preview(&titles)))
        }
        "send_email" => {
            let sent = result.as_object()?;
            let to = non_empty_str(sent.get("to")).or_else(|| non_empty_str(sent.get("to_addr")));
            match (to, non_empty_str(sent.get("subject"))) {
                (Some(to), Some(subject)) => {
                    Some(format!("Sent email to {to} with subject '{subject}'."))
                }
                _ => Some("Email sent.".to_string()),
            }
        }
        "search_open_tickets" => {
            let tickets = result.as_array()?;
            if tickets.is_empty() {
                return Some("No open tickets matched.".to_string());
            }
            let titles = string_fields(tickets, "title");
            if titles.is_empty() {
                return Some(format!("Found {} open tickets.", tickets.len()));
            }
            Some(format!(
                "Found {} open ticket{}: {}.",
                tickets.len(),
                plural(tickets.len()),
                preview(&titles)
            ))
        }
        "add_ticket_comment" => Some(match result {
            Value::Null => "Could not add comment (ticket not found).".to_string(),
            Value::Array(comments) => format!("Comment added. Total comments: {}.", comments.len()),
            _ => "Comment added.".to_string(),
        }),
        "write_document" => {
            let doc = result.as_object()?;
            let id = doc.get("id").filter(|v| truthy(v));
            match (id, non_empty_str(doc.get("title"))) {
                (Some(id), Some(title)) => Some(format!("Saved document {}: {title}.", scalar_text(id))),
                _ => Some("Document saved.".to_string()),
            }
        }
        "read_document" | "get_runbook_by_category" => {
            if !truthy(result) {
                return Some("No runbook found.".to_string());
            }
            let doc = result.as_object()?;
            let title = doc.get("title").and_then(Value::as_str).unwrap_or("runbook");
            Some(format!("Opened {title}."))
        }
        "get_weather" => {
            let weather = result.as_object()?;
            let city = non_empty_str(weather.get("city"));
            let parts: Vec<&str> = [weather.get("temperature"), weather.get("condition")]
                .into_iter()
                .filter_map(non_empty_str)
                .collect();
            match city {
                Some(city) if !parts.is_empty() => {
                    Some(format!("Weather in {city}: {}.", parts.join(", ")))
                }
                _ => Some("Weather retrieved.".to_string()),
            }
        }
        "get_time" => {
            let time = result.as_object()?;
            let location = non_empty_str(time.get("location_resolved"))
                .or_else(|| non_empty_str(time.get("tz")))
                .unwrap_or("location");
            match (
                non_empty_str(time.get("formatted")),
                non_empty_str(time.get("abbr")),
            ) {
                (Some(formatted), Some(abbr)) => {
                    Some(format!("Time in {location}: {formatted} ({abbr})."))
                }
                (Some(formatted), None) => Some(format!("Time in {location}: {formatted}.")),
                _ => Some(format!("Time in {location} available.")),
            }
        }
        _ => None,
    }
}

fn fallback(name: &str, result: &Value) -> String {
    let json = result.to_string();
    let cut: String = json.chars().take(PREVIEW_CHARS).collect();
    format!("{name} result: {cut}")
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn preview(values: &[&str]) -> String {
    values.iter().take(2).copied().collect::<Vec<_>>().join("; ")
}

fn string_fields<'a>(items: &'a [Value], key: &str) -> Vec<&'a str> {
    items
        .iter()
        .filter_map(|item| non_empty_str(item.get(key)))
        .collect()
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
