//! Outlet naming: derived titles, slugified handles, collision suffixes.

/// Title suffix marking a product as the outlet derivative.
pub const OUTLET_TITLE_SUFFIX: &str = " - Outlet";

/// Tag applied to every outlet product.
pub const OUTLET_TAG: &str = "outlet";

/// Derived outlet title for a source product title.
#[must_use]
pub fn outlet_title(source_title: &str) -> String {
    format!("{}{OUTLET_TITLE_SUFFIX}", source_title.trim())
}

/// Lowercase URL slug: alphanumeric runs survive, every other run folds to
/// a single dash, with no leading or trailing dash.
#[must_use]
pub fn slugify_handle(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Target handle for a source title's outlet derivative.
#[must_use]
pub fn outlet_handle(source_title: &str) -> String {
    format!("{}-outlet", slugify_handle(source_title))
}

/// Numbered alternate for a taken handle.
#[must_use]
pub fn suffixed_handle(base: &str, attempt: u32) -> String {
    format!("{base}-{attempt}")
}
