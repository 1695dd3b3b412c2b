use bb_core::hierarchy::Hierarchy;
use bb_core::model::{BlockKind, Styles};

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
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

/// ` style="..."` for the set properties, or an empty string.
pub fn style_attr(styles: &Styles) -> String {
    let decls: Vec<String> = [
        ("color", &styles.color),
        ("background-color", &styles.background_color),
        ("font-size", &styles.font_size),
    ]
    .into_iter()
    .filter_map(|(prop, value)| value.as_ref().map(|v| format!("{prop}: {v}")))
    .collect();

    if decls.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_html(&decls.join("; ")))
    }
}

/// Render every root of the forest, in order, as indented HTML.
///
/// Follows `Hierarchy::walk_rendered`: only divisions show children, and
/// blocks detached by a parent cycle are not rendered.
pub fn render_html(hierarchy: &Hierarchy) -> String {
    let mut html = String::new();
    // Depths of the divisions still open, innermost last.
    let mut open: Vec<usize> = Vec::new();

    for (depth, idx) in hierarchy.walk_rendered() {
        close_until(&mut open, depth, &mut html);
        let block = &hierarchy.node(idx).block;
        let indent = "  ".repeat(depth);
        let id = escape_html(block.id.as_str());
        let style = style_attr(&block.styles);

        match &block.kind {
            BlockKind::Button { text, .. } => {
                html.push_str(&format!(
                    "{indent}<div><button type=\"button\" data-id=\"{id}\"{style}>{}</button></div>\n",
                    escape_html(text)
                ));
            }
            BlockKind::Paragraph { text } => {
                html.push_str(&format!(
                    "{indent}<p data-id=\"{id}\"{style}>{}</p>\n",
                    escape_html(text)
                ));
            }
            BlockKind::Image { src, alt } => {
                html.push_str(&format!(
                    "{indent}<img data-id=\"{id}\" src=\"{}\" alt=\"{}\"{style}>\n",
                    escape_html(src),
                    escape_html(alt.as_deref().unwrap_or(""))
                ));
            }
            BlockKind::Division => {
                html.push_str(&format!(
                    "{indent}<div class=\"block-division\" data-id=\"{id}\"{style}>\n"
                ));
                open.push(depth);
            }
        }
    }
    close_until(&mut open, 0, &mut html);
    html
}

/// Close every open division at `depth` or deeper.
fn close_until(open: &mut Vec<usize>, depth: usize, html: &mut String) {
    while let Some(&d) = open.last() {
        if d < depth {
            break;
        }
        open.pop();
        html.push_str(&format!("{}</div>\n", "  ".repeat(d)));
    }
}
