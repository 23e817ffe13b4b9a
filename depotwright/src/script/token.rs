//! Line-oriented tokenizer for install scripts.

use super::ScriptError;

/// Kind of a script token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `{`
    BlockStart,
    /// `}`
    BlockEnd,
    /// `//` up to the end of the line.
    Comment,
    /// Quoted string, or a run of non-blank characters.
    Value,
    WhiteSpace,
    /// Synthetic token closing every source line.
    NewLine,
}

/// A token with its 0-based position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    /// Raw text; quoted values keep their quotes.
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, line: usize, column: usize, chars: &[char]) -> Self {
        Self {
            kind,
            line,
            column,
            text: chars.iter().collect(),
        }
    }

    /// Text of a value token without surrounding quotes.
    pub fn value_text(&self) -> &str {
        let text = self.text.as_str();
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            &text[1..text.len() - 1]
        } else {
            text
        }
    }
}

fn is_special(c: char) -> bool {
    matches!(c, '{' | '}' | '"')
}

/// Splits `source` into tokens. `file` names the script in syntax errors.
pub fn tokenize(file: &str, source: &str) -> Result<Vec<Token>, ScriptError> {
    let mut tokens = Vec::new();

    for (line_index, line) in source.lines().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        let mut j = 0;

        while j < chars.len() {
            let c = chars[j];
            let start = j;

            let kind = if c == '{' {
                j += 1;
                TokenKind::BlockStart
            } else if c == '}' {
                j += 1;
                TokenKind::BlockEnd
            } else if c == '/' && chars.get(j + 1) == Some(&'/') {
                j = chars.len();
                TokenKind::Comment
            } else if c == '"' {
                let mut end = j + 1;
                while end < chars.len() {
                    if chars[end] == '\\' {
                        end += 2;
                    } else if chars[end] == '"' {
                        break;
                    } else {
                        end += 1;
                    }
                }
                if end >= chars.len() {
                    return Err(ScriptError::Syntax {
                        file: file.to_string(),
                        line: line_index + 1,
                        column: start + 1,
                        message: "unexpected end of token".to_string(),
                    });
                }
                j = end + 1;
                TokenKind::Value
            } else if c.is_whitespace() {
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                TokenKind::WhiteSpace
            } else {
                while j < chars.len()
                    && !chars[j].is_whitespace()
                    && !is_special(chars[j])
                    && !(chars[j] == '/' && chars.get(j + 1) == Some(&'/'))
                {
                    j += 1;
                }
                TokenKind::Value
            };

            tokens.push(Token::new(kind, line_index, start, &chars[start..j]));
        }

        tokens.push(Token {
            kind: TokenKind::NewLine,
            line: line_index,
            column: chars.len(),
            text: String::new(),
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_line() {
        let tokens = tokenize("s.vdf", "\"Key\" { // note").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Value,
                TokenKind::WhiteSpace,
                TokenKind::BlockStart,
                TokenKind::WhiteSpace,
                TokenKind::Comment,
                TokenKind::NewLine,
            ]
        );
        assert_eq!(tokens[0].value_text(), "Key");
        assert_eq!(tokens[4].text, "// note");
        assert_eq!(tokens[2].column, 6);
    }

    #[test]
    fn test_escaped_quote_does_not_end_value() {
        let tokens = tokenize("s.vdf", r#""say \"hi\"" "c:\\dir\\""#).unwrap();
        assert_eq!(tokens[0].value_text(), r#"say \"hi\""#);
        assert_eq!(tokens[2].value_text(), r#"c:\\dir\\"#);
    }

    #[test]
    fn test_unterminated_value() {
        let err = tokenize("setup.vdf", "\"ok\"\n   \"broken").unwrap_err();
        match err {
            ScriptError::Syntax {
                file, line, column, ..
            } => {
                assert_eq!(file, "setup.vdf");
                assert_eq!(line, 2);
                assert_eq!(column, 4);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_trailing_escape_is_unterminated() {
        assert!(tokenize("s.vdf", r#""abc\""#).is_err());
    }

    #[test]
    fn test_bare_words_are_values() {
        let tokens = tokenize("s.vdf", "InstallScript{x}").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Value,
                TokenKind::BlockStart,
                TokenKind::Value,
                TokenKind::BlockEnd,
                TokenKind::NewLine,
            ]
        );
        assert_eq!(tokens[0].text, "InstallScript");
    }

    #[test]
    fn test_newline_per_line() {
        let tokens = tokenize("s.vdf", "\n\n{\n").unwrap();
        let newlines = tokens.iter().filter(|t| t.kind == TokenKind::NewLine).count();
        assert_eq!(newlines, 3);
    }
}
