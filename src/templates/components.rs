//! Shared HTML components: the page header with the theme toggle, and the
//! base document every page is wrapped in.

use crate::notes::html_escape;
use crate::theme::ThemeMode;

use super::styles::STYLE;

// ============================================================================
// Header
// ============================================================================

/// Theme toggle button. Submitting it advances the theme one step.
pub fn theme_toggle(theme: ThemeMode) -> String {
    format!(
        r#"<form class="inline" action="/theme" method="post">
            <button type="submit" id="papers-theme-toggle" data-theme="{mode}" title="Theme: {mode} (click to change)">{label}</button>
        </form>"#,
        mode = theme.as_str(),
        label = theme.label(),
    )
}

pub fn header_bar(theme: Option<ThemeMode>) -> String {
    let toggle = theme.map(theme_toggle).unwrap_or_default();
    format!(
        r#"<nav class="toolbar">
            <a href="/"><strong>Papers</strong></a>
            <span class="spacer"></span>
            {}
        </nav>"#,
        toggle
    )
}

// ============================================================================
// Base HTML Template
// ============================================================================

/// Full HTML document. `theme` sets the body class and shows the toggle;
/// `None` renders a bare page (error pages).
pub fn base_html(title: &str, content: &str, theme: Option<ThemeMode>) -> String {
    let body_class = theme
        .and_then(|t| t.body_class())
        .map(|c| format!(r#" class="{}""#, c))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body{body_class}>
    {header}
    <div class="container">
        {content}
    </div>
</body>
</html>"#,
        title = html_escape(title),
        header = header_bar(theme),
    )
}
