//! Game asset URLs

/// Join a games base URL with a catalog image path
///
/// Each path segment is percent-encoded. When `base` already ends with
/// `/games` a leading `/games` on the path is not repeated.
pub fn game_url(base: &str, image_path: &str) -> String {
    if base.ends_with("/games")
        && let Some(rest) = image_path.strip_prefix("/games")
    {
        return format!("{}{}", base, encode_segments(rest));
    }

    let path = image_path.strip_prefix('/').unwrap_or(image_path);
    format!("{}/{}", base.trim_end_matches('/'), encode_segments(path))
}

fn encode_segments(path: &str) -> String {
    path.split('/')
        .map(encode_component)
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_component(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
