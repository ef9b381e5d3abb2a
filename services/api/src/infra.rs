use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Process-level state for the infrastructure routes.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keep the first character of each part of an email and mask the rest.
pub(crate) fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => format!("{}@{}", mask_tail(local), domain),
        None => mask_tail(email),
    }
}

/// Show only the last four characters of an identifier.
pub(crate) fn redact_identifier(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}

fn mask_tail(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => format!("{first}{}", "*".repeat(chars.count())),
        None => String::new(),
    }
}
