/// Removes C-style comments (`//` and `/* ... */`) from source text.
///
/// String and character literals are copied verbatim, including escapes, so a
/// `//` inside `"http://..."` survives. Newlines that terminate line comments
/// are kept; newlines inside block comments are dropped. Trailing whitespace
/// left on each line is trimmed afterwards.
///
/// # Examples
/// ```
/// use foldcat::processing::extract::strip_comments;
///
/// let code = "let x = 1; // one\n/* gone */let y = \"//kept\";";
/// assert_eq!(strip_comments(code), "let x = 1;\nlet y = \"//kept\";");
/// ```
pub fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                // Line comment: skip to (but not past) the newline.
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            '"' | '\'' => {
                out.push(c);
                let quote = c;
                while let Some(next) = chars.next() {
                    out.push(next);
                    if next == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if next == quote || next == '\n' {
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_block_comments() {
        let input = "a = 1; // note\n/* block\nspanning */b = 2;";
        assert_eq!(strip_comments(input), "a = 1;\nb = 2;");
    }

    #[test]
    fn test_comment_markers_in_literals_survive() {
        let input = "url = \"http://x/*y*/\"; c = '/';";
        assert_eq!(strip_comments(input), input);
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let input = "s = \"a\\\"//b\"; // trailing";
        assert_eq!(strip_comments(input), "s = \"a\\\"//b\";");
    }

    #[test]
    fn test_division_is_not_a_comment() {
        assert_eq!(strip_comments("x = a / b;"), "x = a / b;");
    }

    #[test]
    fn test_unterminated_block_comment_drops_rest() {
        assert_eq!(strip_comments("keep /* never closed"), "keep");
    }
}
