/// Escape text for embedding in HTML body or attribute context.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

/// Build the result page. Both the submitted text and the model output are
/// untrusted and get escaped here.
pub fn result_page(input: &str, output: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
    <body>
        <h2>Translation Result</h2>
        <p><strong>Input:</strong> {}</p>
        <p><strong>Translation:</strong> {}</p>
        <a href="/">Translate Another</a>
    </body>
</html>
"#,
        escape_html(input),
        escape_html(output)
    )
}
