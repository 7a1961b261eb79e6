//! Standalone boot page

use crate::EmulatorOptions;
use gotd_config::EmulatorConfig;
use std::fmt::Write;

/// Render an HTML page that boots `options` in the configured container
pub fn render_boot_page(config: &EmulatorConfig, options: &EmulatorOptions, title: &str) -> String {
    let mut globals = String::new();
    for (name, value) in options.globals() {
        // `</` would close the inline script early
        let json = value.to_string().replace("</", "<\\/");
        let _ = writeln!(globals, "window.{} = {};", name, json);
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" id="{css_id}" href="{css_url}">
</head>
<body>
<div id="{container}" style="width:100%;height:100%;"></div>
<script>
{globals}</script>
<script id="{script_id}" src="{script_url}"></script>
</body>
</html>
"#,
        title = escape_html(title),
        css_id = escape_html(&config.css_id),
        css_url = escape_html(&config.css_url),
        container = escape_html(&config.container_id),
        globals = globals,
        script_id = escape_html(&config.script_id),
        script_url = escape_html(&config.script_url),
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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
