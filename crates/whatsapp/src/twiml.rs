use zafra_core::Reply;

/// Render reply segments as a TwiML messaging response, one `<Message>` per
/// segment, in order.
pub fn message_response(reply: &Reply) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
    for segment in &reply.segments {
        xml.push_str("<Message>");
        xml.push_str(&escape_xml(segment));
        xml.push_str("</Message>");
    }
    xml.push_str("</Response>");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
