//! Line tokenizer for the command prompt.

/// Splits a line on whitespace, keeping double-quoted sections together.
///
/// Quote characters are dropped. An unterminated quote runs to the end of
/// the line. Tokens are trimmed and blank tokens are discarded, so `""`
/// yields nothing.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.trim().chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch.is_whitespace() && !in_quotes {
            push_token(&mut tokens, &mut current);
        } else {
            current.push(ch);
        }
    }
    push_token(&mut tokens, &mut current);

    tokens
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
    let token = current.trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::tokenize;

    #[test]
    fn splits_on_runs_of_whitespace() {
        assert_eq!(tokenize("  vt   work\thome "), vec!["vt", "work", "home"]);
    }

    #[test]
    fn quoted_section_is_one_token() {
        assert_eq!(
            tokenize(r#"nt "buy milk and eggs" 01/02/2025 18:00 home"#),
            vec!["nt", "buy milk and eggs", "01/02/2025", "18:00", "home"]
        );
    }

    #[test]
    fn quotes_glue_adjacent_text() {
        assert_eq!(tokenize(r#"a"b c"d e"#), vec!["ab cd", "e"]);
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        assert_eq!(tokenize(r#"nl "long name"#), vec!["nl", "long name"]);
    }

    #[test]
    fn empty_quotes_and_blank_lines_yield_nothing() {
        assert!(tokenize("   ").is_empty());
        assert_eq!(tokenize(r#"vt """#), vec!["vt"]);
    }
}
