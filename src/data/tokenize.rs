//! Line tokenizer for block files

/// Whether a line carries content (not blank, not a comment)
pub(crate) fn is_content(line: &str) -> bool {
    let trimmed = line.trim_start();
    !(trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with('!')
        || trimmed.starts_with("//"))
}

/// Split a line into whitespace-separated tokens, honoring quotes
///
/// Quotes are removed from the returned tokens. Commas separate tokens like
/// whitespace does.
pub(crate) fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                quoted = true;
            }
            None if c.is_whitespace() || c == ',' => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                    quoted = false;
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize("  1 1 1 0.001 'bound A'"),
            vec!["1", "1", "1", "0.001", "bound A"]
        );
        assert_eq!(tokenize("TS6 FILEIN \"my file.ts\""), vec!["TS6", "FILEIN", "my file.ts"]);
        assert_eq!(tokenize("name ''"), vec!["name", ""]);
    }

    #[test]
    fn test_comment_lines() {
        assert!(!is_content("# comment"));
        assert!(!is_content("   ! comment"));
        assert!(!is_content("// comment"));
        assert!(!is_content("   "));
        assert!(is_content("  FIXED_CELL"));
    }
}
