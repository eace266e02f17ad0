//! Comment stripping for hand-edited plan files.
//!
//! Plan files are JSON with `//` and `/* */` comments. Comments are removed
//! line by line before the text is handed to `serde_json`.

/// Removes `//` and `/* */` comments from JSON text.
///
/// Comment markers inside string literals are kept. Block comments may span
/// lines; an unterminated block comment runs to the end of the input. Every
/// output line is trimmed, blank lines are dropped, and each kept line ends
/// with `\n`. Applying the function twice gives the same result as once.
#[must_use]
pub fn strip_json_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut in_block = false;

    for line in input.lines() {
        let mut clean = String::with_capacity(line.len());
        let mut in_string = false;
        let mut escaped = false;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            if in_block {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    in_block = false;
                }
                continue;
            }

            if in_string {
                clean.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }

            match (c, chars.peek()) {
                ('/', Some('/')) => {
                    trim_end_in_place(&mut clean);
                    break;
                }
                ('/', Some('*')) => {
                    chars.next();
                    trim_end_in_place(&mut clean);
                    in_block = true;
                }
                _ => {
                    // A removed block comment must not glue two slashes together.
                    if matches!(c, '/' | '*') && clean.ends_with('/') {
                        clean.push(' ');
                    }
                    if c == '"' {
                        in_string = true;
                    }
                    clean.push(c);
                }
            }
        }

        let clean = clean.trim();
        if !clean.is_empty() {
            result.push_str(clean);
            result.push('\n');
        }
    }

    result
}

fn trim_end_in_place(s: &mut String) {
    let len = s.trim_end().len();
    s.truncate(len);
}
