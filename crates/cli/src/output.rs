//! Output formatting for produced login attempts

use anyhow::Result;
use serde_json::{json, Value};
use std::time::Duration;
use defcred_common::LoginAttempt;

/// Print login attempts in the specified format
pub fn print_results(results: &[LoginAttempt], format: &str, scan_duration: Duration) -> Result<()> {
    let format = format.trim().to_lowercase();
    match format.as_str() {
        "json" | "j" => println!("{}", render_json(results, scan_duration)?),
        "csv" | "c" => print!("{}", render_csv(results)),
        "table" | "text" | "t" | "" => print!("{}", render_table(results, scan_duration)),
        _ => {
            eprintln!("Warning: Unknown format '{}', using default table format", format);
            print!("{}", render_table(results, scan_duration));
        }
    }
    Ok(())
}

/// ASCII table sorted by URL, then product
fn render_table(results: &[LoginAttempt], scan_duration: Duration) -> String {
    if results.is_empty() {
        return "\nNo login attempts to run.\n\n".to_string();
    }

    let mut sorted: Vec<&LoginAttempt> = results.iter().collect();
    sorted.sort_by(|a, b| a.url.cmp(&b.url).then_with(|| a.product().cmp(b.product())));

    let mut out = String::new();
    out.push_str(&format!("\n{:-<100}\n", ""));
    out.push_str(&format!(
        "{:<28} {:<11} {:<40} {:<20}\n",
        "PRODUCT", "TYPE", "URL", "CREDENTIAL"
    ));
    out.push_str(&format!("{:-<100}\n", ""));

    for attempt in &sorted {
        out.push_str(&format!(
            "{:<28} {:<11} {:<40} {:<20}\n",
            truncate(attempt.product(), 28),
            attempt.submission.kind().as_str(),
            truncate(&attempt.url, 40),
            format!("{}:{}", attempt.username, attempt.password)
        ));
    }

    let mut products: Vec<&str> = results.iter().map(|a| a.product()).collect();
    products.sort_unstable();
    products.dedup();

    out.push_str(&format!("{:-<100}\n", ""));
    out.push_str("\nSummary:\n");
    out.push_str(&format!("  Login attempts: {}\n", results.len()));
    out.push_str(&format!("  Products: {}\n", products.len()));
    out.push_str(&format!("  Duration: {}\n\n", format_duration(scan_duration)));
    out
}

fn attempt_json(attempt: &LoginAttempt) -> Value {
    json!({
        "product": attempt.product(),
        "type": attempt.submission.kind().as_str(),
        "url": attempt.url,
        "username": attempt.username,
        "password": attempt.password,
        "cookies": attempt.cookies,
        "csrf": attempt.submission.csrf(),
    })
}

fn render_json(results: &[LoginAttempt], scan_duration: Duration) -> Result<String> {
    let output = json!({
        "scan_info": {
            "finished_at": chrono::Utc::now().to_rfc3339(),
            "duration_seconds": scan_duration.as_secs_f64(),
            "duration_formatted": format_duration(scan_duration),
            "total_attempts": results.len()
        },
        "attempts": results.iter().map(attempt_json).collect::<Vec<_>>()
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

fn render_csv(results: &[LoginAttempt]) -> String {
    let mut out = String::from("product,type,url,username,password,csrf\n");
    for attempt in results {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_field(attempt.product()),
            attempt.submission.kind().as_str(),
            csv_field(&attempt.url),
            csv_field(&attempt.username),
            csv_field(&attempt.password),
            csv_field(attempt.submission.csrf().unwrap_or(""))
        ));
    }
    out
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\"").replace(['\n', '\r'], " "))
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

/// Format duration in a human-readable way
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs == 0 {
        format!("{}ms", millis)
    } else if total_secs < 60 {
        if millis > 0 {
            format!("{}.{:03}s", total_secs, millis)
        } else {
            format!("{}s", total_secs)
        }
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defcred_common::{
        Auth, AuthType, CatalogEntry, Fingerprint, RunConfig, Submission, SuccessCriteria,
    };
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn attempt(user: &str, submission: Submission) -> LoginAttempt {
        let entry = CatalogEntry {
            name: "Acme \"Pro\" Router".into(),
            protocol: "http".into(),
            category: None,
            contributor: None,
            default_port: 80,
            ssl: false,
            references: Vec::new(),
            fingerprint: Fingerprint::default(),
            auth: Auth {
                kind: submission.kind(),
                url: vec!["/login".into()],
                csrf: None,
                sessionid: None,
                credentials: Vec::new(),
                post: BTreeMap::new(),
                headers: BTreeMap::new(),
                success: SuccessCriteria::default(),
            },
        };
        LoginAttempt {
            entry: Arc::new(entry),
            url: "http://10.0.0.1/login".into(),
            username: user.into(),
            password: "admin".into(),
            config: Arc::new(RunConfig::default()),
            cookies: BTreeMap::from([("sid".to_string(), "1".to_string())]),
            submission,
        }
    }

    #[test]
    fn test_render_json() {
        let results = vec![attempt("admin", Submission::Post { csrf: Some("tok".into()) })];
        let rendered = render_json(&results, Duration::from_secs(5)).unwrap();
        let v: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(v["scan_info"]["total_attempts"], 1);
        assert_eq!(v["attempts"][0]["type"], "post");
        assert_eq!(v["attempts"][0]["csrf"], "tok");
        assert_eq!(v["attempts"][0]["cookies"]["sid"], "1");
    }

    #[test]
    fn test_render_csv_escapes_quotes() {
        let results = vec![attempt("admin", Submission::Get)];
        let csv = render_csv(&results);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("product,type,url,username,password,csrf"));
        assert_eq!(
            lines.next(),
            Some("\"Acme \"\"Pro\"\" Router\",get,\"http://10.0.0.1/login\",\"admin\",\"admin\",\"\"")
        );
    }

    #[test]
    fn test_render_table() {
        let results = vec![
            attempt("root", Submission::BasicAuth),
            attempt("admin", Submission::BasicAuth),
        ];
        let table = render_table(&results, Duration::from_millis(1500));
        assert!(table.contains("basic_auth"));
        assert!(table.contains("Login attempts: 2"));
        assert!(table.contains("Products: 1"));
        assert!(table.contains("1.500s"));
        assert!(render_table(&[], Duration::ZERO).contains("No login attempts"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_millis(5500)), "5.500s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_duration(Duration::from_secs(120)), "2m");
    }
}
