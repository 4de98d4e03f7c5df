//! Address normalization helpers shared by the recorder and the resolver.

use url::{Position, Url};

/// Strip scheme, host, port and credentials, keeping the server-relative part.
///
/// `https://user@example.com:8080/a?b` becomes `/a?b`; protocol-relative
/// `//example.com/a` becomes `/a`; relative input is returned unchanged.
pub fn local(address: &str) -> String {
    let absolute = if address.starts_with("//") {
        Url::parse(&format!("http:{address}")).ok()
    } else if address.starts_with("http://") || address.starts_with("https://") {
        Url::parse(address).ok()
    } else {
        None
    };

    match absolute {
        Some(url) if url.has_host() => url[Position::BeforePath..].to_string(),
        _ => address.to_string(),
    }
}

/// Normalize a request target: no origin, no query string, no repeated separators.
///
/// Absolute targets go through [`local`]. A target starting with `//` is an
/// origin-form path with an empty first segment, not a protocol-relative address.
pub fn clean_request_url(request_url: &str) -> String {
    let relative = if request_url.starts_with("//") {
        request_url.to_string()
    } else {
        local(request_url)
    };
    let without_query = relative.split('?').next().unwrap_or_default();
    let without_fragment = without_query.split('#').next().unwrap_or_default();

    let mut cleaned = String::with_capacity(without_fragment.len());
    let mut previous_slash = false;
    for c in without_fragment.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        cleaned.push(c);
    }
    cleaned
}

/// Every ancestor path of `path`, longest first.
///
/// `/child/moved/param1` yields `/child/moved/param1`, `/child/moved`, `/child`.
/// The path is split on every `/` except a leading one, so `/` yields itself.
pub fn prefix_segments(path: &str) -> Vec<String> {
    let first_len = path.chars().next().map_or(0, char::len_utf8);
    let (first, rest) = path.split_at(first_len);

    let mut prefixes: Vec<String> = Vec::new();
    for segment in rest.split('/') {
        let next = match prefixes.last() {
            None => format!("{first}{segment}"),
            Some(previous) => format!("{previous}/{segment}"),
        };
        prefixes.push(next);
    }
    prefixes.reverse();
    prefixes
}

/// Depth of a path, counted in `/`-delimited pieces.
pub fn segment_count(path: &str) -> usize {
    path.split('/').count()
}
