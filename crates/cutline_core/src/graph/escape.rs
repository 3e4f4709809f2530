//! Escaping for values spliced into a filter graph description.
//!
//! ffmpeg parses a `-filter_complex` string twice: the graph parser splits
//! on `[ ] , ;` and the filter option parser splits on `:`. A value is
//! escaped for the option level first, then the result is escaped for the
//! graph level, so after both unescaping passes the filter sees the value
//! verbatim and nothing in it can open a new pad, filter or chain.

/// Characters the option parser treats specially.
const OPTION_RESERVED: &[char] = &['\\', '\'', ':'];

/// Characters the graph parser treats specially.
const GRAPH_RESERVED: &[char] = &['\\', '\'', '[', ']', ',', ';'];

/// Escape a parameter value for both parser levels.
pub fn escape_value(value: &str) -> String {
    escape_with(&escape_with(value, OPTION_RESERVED), GRAPH_RESERVED)
}

/// Escape only for the filter option level.
pub fn escape_option_value(value: &str) -> String {
    escape_with(value, OPTION_RESERVED)
}

fn escape_with(value: &str, reserved: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if reserved.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Whether `name` is safe to emit unescaped as a filter name or option key.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_pass_through() {
        assert_eq!(escape_value("PTS-STARTPTS"), "PTS-STARTPTS");
        assert_eq!(escape_value("1150|1150"), "1150|1150");
        assert_eq!(escape_value("main_w-overlay_w-10"), "main_w-overlay_w-10");
    }

    #[test]
    fn colon_is_escaped_twice() {
        // a:b -> a\:b (option) -> a\\:b (graph)
        assert_eq!(escape_value("a:b"), "a\\\\:b");
    }

    #[test]
    fn graph_separators_are_escaped() {
        assert_eq!(escape_value("between(t,1,2)"), "between(t\\,1\\,2)");
        assert_eq!(escape_value("x;y"), "x\\;y");
        assert_eq!(escape_value("[out]"), "\\[out\\]");
    }

    #[test]
    fn quote_cannot_close_a_quoted_section() {
        // it's -> it\'s (option) -> it\\\'s (graph)
        assert_eq!(escape_value("it's"), "it\\\\\\'s");
    }

    #[test]
    fn injection_attempt_stays_inside_value() {
        let hostile = "hello'[0:v]null[x];[x]";
        let escaped = escape_value(hostile);
        for (i, c) in escaped.char_indices() {
            if matches!(c, '[' | ']' | ';' | '\'') {
                assert_eq!(&escaped[i - 1..i], "\\", "unescaped {c} at {i} in {escaped}");
            }
        }
    }

    #[test]
    fn option_level_only() {
        assert_eq!(escape_option_value("12:30"), "12\\:30");
        assert_eq!(escape_option_value("a,b"), "a,b");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("atrim"));
        assert!(is_identifier("luma_msize_x"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("trim,setpts"));
        assert!(!is_identifier("a=b"));
    }
}
