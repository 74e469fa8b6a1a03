use serenity::all::{ChannelId, UserId};

/// Format a user mention
pub fn mention_user(user_id: UserId) -> String {
    format!("<@{}>", user_id)
}

/// Format a channel mention
pub fn mention_channel(channel_id: ChannelId) -> String {
    format!("<#{}>", channel_id)
}

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Embed colour for a severity: yellow below 1, orange below 3, red otherwise
pub fn severity_color(severity: f64) -> u32 {
    if severity >= 3.0 {
        0xFF0000
    } else if severity >= 1.0 {
        0xFF9100
    } else {
        0xFFFF00
    }
}

/// One filled dot per whole strike, then a quarter glyph for the remainder
pub fn severity_dots(severity: f64) -> String {
    let severity = if severity.is_finite() { severity.max(0.0) } else { 0.0 };
    let whole = severity.floor();

    let mut dots = "●".repeat(whole as usize);
    let remaining = severity - whole;
    let tail = match remaining {
        r if r < 0.125 => "○",
        r if r < 0.375 => "◔",
        r if r < 0.625 => "◑",
        r if r < 0.875 => "◕",
        _ => "●",
    };
    dots.push_str(tail);
    dots
}

/// Fixed precision with trailing zeros (and a dangling point) removed
pub fn format_float_up_to_prec(num: f64, prec: usize) -> String {
    let formatted = format!("{:.*}", prec, num);
    if !formatted.contains('.') {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
