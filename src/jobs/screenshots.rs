use crate::jobs::Screenshot;

pub const DEFAULT_CAPTURE_BASE_URL: &str = "http://localhost:3001";

pub fn placeholder_url(job_id: &str, base_url: &str) -> String {
    format!(
        "{}/data/job_{job_id}/screenshots/desktop/placeholder.png",
        base_url.trim_end_matches('/')
    )
}

/// Resolves where a captured screenshot can be fetched from.
///
/// Failed captures always get the placeholder. Custom uploads saved under
/// `uploads/` are served from the app root; other custom uploads fall back to
/// their inline data URL.
pub fn screenshot_url(screenshot: &Screenshot, job_id: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let Some(data) = screenshot.data.as_ref().filter(|_| screenshot.success) else {
        return placeholder_url(job_id, base);
    };

    if data.is_custom {
        if let Some(path) = non_blank(data.path.as_deref()) {
            if path.starts_with("uploads/") {
                return format!("/{path}");
            }
        }
        return match non_blank(data.data_url.as_deref()) {
            Some(data_url) => data_url.to_string(),
            None => placeholder_url(job_id, base),
        };
    }

    if let Some(path) = non_blank(data.path.as_deref()) {
        return format!(
            "{base}/data/job_{job_id}/screenshots/{}",
            path.trim_start_matches('/')
        );
    }
    if let Some(filename) = non_blank(data.filename.as_deref()) {
        return format!("{base}/data/job_{job_id}/screenshots/desktop/{filename}");
    }
    placeholder_url(job_id, base)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
