//! The scanner: source text to a lazy token stream.
//!
//! Tokens reference the *processed* source (line continuations removed, final
//! newline guaranteed) through a shared `Rc<str>` and carry byte offsets into
//! it; the lexeme is derived by slicing. Block structure is synthesized:
//! the scanner tracks the current indentation level and emits `INDENT` /
//! `DEDENT` tokens in front of the first real token of a line whose leading
//! spaces changed depth, closing all open indents before the final `EOF`.
//!
//! Indentation is exactly four spaces per level; tabs in leading whitespace
//! are an error. Parentheses do not suppress newlines or indentation.

use std::{collections::VecDeque, rc::Rc};

use crate::exceptions::Exception;

/// The dialect's keywords. `True`, `False`, and `None` are deliberately not
/// keywords; the parser gives those names literal meaning in the atom
/// production.
const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "break", "class", "continue", "def", "elif", "else", "except", "finally", "for", "from",
    "global", "if", "import", "in", "is", "not", "or", "pass", "raise", "return", "try", "while",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// End of a logical line (`\n`).
    Newline,
    /// Synthetic: indentation increased by one level.
    Indent,
    /// Synthetic: indentation decreased by one level.
    Dedent,
    /// Synthetic: end of input. Emitted exactly once.
    Eof,
    /// Identifier that is not a keyword.
    Name,
    Keyword,
    Number,
    /// Quoted string literal; the lexeme includes the quotes.
    Str,
    /// Operator or punctuation.
    Op,
}

/// A token: shared source reference plus start/end byte offsets.
#[derive(Debug, Clone)]
pub(crate) struct Token {
    source: Rc<str>,
    start: usize,
    end: usize,
    kind: TokenKind,
}

impl Token {
    fn new(source: &Rc<str>, start: usize, end: usize, kind: TokenKind) -> Self {
        Self {
            source: Rc::clone(source),
            start,
            end,
            kind,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The token's text. Synthetic tokens have an empty lexeme.
    pub fn lexeme(&self) -> &str {
        &self.source[self.start..self.end]
    }

    /// 1-based source line, counting newlines up to the token's start.
    pub fn line(&self) -> usize {
        self.source[..self.start].matches('\n').count() + 1
    }

    pub fn is_keyword(&self) -> bool {
        self.kind == TokenKind::Keyword
    }

    /// An identifier that is not a keyword.
    pub fn is_name(&self) -> bool {
        self.kind == TokenKind::Name
    }

    pub fn is_number(&self) -> bool {
        self.kind == TokenKind::Number
    }

    pub fn is_string(&self) -> bool {
        self.kind == TokenKind::Str
    }
}

impl PartialEq for Token {
    /// Tokens compare by lexeme.
    fn eq(&self, other: &Self) -> bool {
        self.lexeme() == other.lexeme()
    }
}

/// Removes line continuations (backslash immediately followed by a newline)
/// and guarantees the text ends with a newline, so the scanner always reaches
/// end-of-input at the start of a line.
fn normalize(source: &str) -> Rc<str> {
    let mut text = source.replace("\\\n", "");
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Rc::from(text)
}

/// Decodes a string literal lexeme (quotes included) into its value.
///
/// Supported escapes are `\n`, `\'`, `\"`, and `\\`; any other escaped
/// character keeps the backslash.
pub(crate) fn decode_string(lexeme: &str) -> String {
    let inner = &lexeme[1..lexeme.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Lazy tokenizer. Yields `Result<Token, Exception>`; after the single `EOF`
/// token (or the first error) it yields `None`.
#[derive(Debug)]
pub(crate) struct Scanner {
    source: Rc<str>,
    pos: usize,
    /// Current indentation level in units of four spaces.
    indent: usize,
    /// Indentation of the current line, applied in front of its first token.
    pending: Option<usize>,
    at_line_start: bool,
    queue: VecDeque<Token>,
    finished: bool,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            source: normalize(source),
            pos: 0,
            indent: 0,
            pending: None,
            at_line_start: true,
            queue: VecDeque::new(),
            finished: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn line_at(&self, pos: usize) -> usize {
        self.source[..pos].matches('\n').count() + 1
    }

    fn error(&self, message: impl Into<String>) -> Exception {
        Exception::syntax(message, self.line_at(self.pos))
    }

    fn push(&mut self, start: usize, kind: TokenKind) {
        let token = Token::new(&self.source, start, self.pos, kind);
        self.queue.push_back(token);
    }

    fn push_synthetic(&mut self, kind: TokenKind) {
        let token = Token::new(&self.source, self.pos, self.pos, kind);
        self.queue.push_back(token);
    }

    /// Closes open indentation and emits the final `EOF`.
    fn finish(&mut self) {
        while self.indent > 0 {
            self.push_synthetic(TokenKind::Dedent);
            self.indent -= 1;
        }
        self.push_synthetic(TokenKind::Eof);
        self.finished = true;
    }

    /// Scans forward until at least one token is queued.
    fn scan_some(&mut self) -> Result<(), Exception> {
        loop {
            if self.at_line_start {
                let mut spaces = 0usize;
                loop {
                    match self.peek() {
                        Some(' ') => {
                            spaces += 1;
                            self.pos += 1;
                        }
                        Some('\t') => return Err(self.error("tab in leading whitespace")),
                        _ => break,
                    }
                }
                match self.peek() {
                    None => {
                        self.finish();
                        return Ok(());
                    }
                    // Blank and comment-only lines do not affect indentation.
                    Some('\n') => {
                        self.pos += 1;
                        continue;
                    }
                    Some('#') => {
                        while let Some(c) = self.peek() {
                            self.pos += c.len_utf8();
                            if c == '\n' {
                                break;
                            }
                        }
                        continue;
                    }
                    Some(_) => {
                        if spaces % 4 != 0 {
                            return Err(self.error("indentation is not a multiple of four spaces"));
                        }
                        self.pending = Some(spaces / 4);
                        self.at_line_start = false;
                    }
                }
            }
            while self.peek() == Some(' ') {
                self.pos += 1;
            }
            match self.peek() {
                None => {
                    self.finish();
                    return Ok(());
                }
                Some('\t') => return Err(self.error("tab characters are not allowed")),
                Some('\n') => {
                    let start = self.pos;
                    self.pos += 1;
                    self.push(start, TokenKind::Newline);
                    self.at_line_start = true;
                    return Ok(());
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += c.len_utf8();
                    }
                }
                Some(c) => {
                    if let Some(new) = self.pending.take() {
                        while new > self.indent {
                            self.push_synthetic(TokenKind::Indent);
                            self.indent += 1;
                        }
                        while self.indent > new {
                            self.push_synthetic(TokenKind::Dedent);
                            self.indent -= 1;
                        }
                    }
                    self.scan_token(c)?;
                    return Ok(());
                }
            }
        }
    }

    fn scan_token(&mut self, first: char) -> Result<(), Exception> {
        let start = self.pos;
        match first {
            '0'..='9' => {
                self.scan_digits();
                if self.peek() == Some('.') && self.source[self.pos + 1..].starts_with(|c: char| c.is_ascii_digit()) {
                    self.pos += 1;
                    self.scan_digits();
                }
                self.push(start, TokenKind::Number);
            }
            c if c.is_alphanumeric() || c == '_' => {
                while let Some(c) = self.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        self.pos += c.len_utf8();
                    } else {
                        break;
                    }
                }
                let kind = if KEYWORDS.contains(&&self.source[start..self.pos]) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Name
                };
                self.push(start, kind);
            }
            '(' | ')' | '[' | ']' | '{' | '}' | ':' | '.' | ',' | ';' => {
                self.pos += 1;
                self.push(start, TokenKind::Op);
            }
            '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '|' | '&' => {
                self.pos += 1;
                if self.peek() == Some('=') {
                    self.pos += 1;
                }
                self.push(start, TokenKind::Op);
            }
            '!' => {
                self.pos += 1;
                if self.peek() == Some('=') {
                    self.pos += 1;
                    self.push(start, TokenKind::Op);
                } else {
                    return Err(self.error("unexpected character '!'"));
                }
            }
            quote @ ('\'' | '"') => {
                let unterminated = |scanner: &Self| {
                    Exception::syntax("unterminated string literal", scanner.line_at(start))
                };
                self.pos += 1;
                loop {
                    match self.bump() {
                        None | Some('\n') => return Err(unterminated(self)),
                        Some('\\') => {
                            // The escaped character is consumed blindly; it is
                            // decoded later by `decode_string`.
                            if self.bump().is_none() {
                                return Err(unterminated(self));
                            }
                        }
                        Some(c) if c == quote => break,
                        Some(_) => {}
                    }
                }
                self.push(start, TokenKind::Str);
            }
            other => return Err(self.error(format!("unexpected character '{other}'"))),
        }
        Ok(())
    }

    fn scan_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }
}

impl Iterator for Scanner {
    type Item = Result<Token, Exception>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.queue.pop_front() {
            return Some(Ok(token));
        }
        if self.finished {
            return None;
        }
        match self.scan_some() {
            Ok(()) => self.queue.pop_front().map(Ok),
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source).map(|t| t.unwrap().kind()).collect()
    }

    fn lexemes(source: &str) -> Vec<String> {
        Scanner::new(source)
            .map(|t| t.unwrap().lexeme().to_string())
            .collect()
    }

    #[test]
    fn ends_with_single_eof() {
        let tokens: Vec<_> = Scanner::new("x = 1").map(Result::unwrap).collect();
        let eofs = tokens.iter().filter(|t| t.kind() == TokenKind::Eof).count();
        assert_eq!(eofs, 1);
        assert_eq!(tokens.last().unwrap().kind(), TokenKind::Eof);
    }

    #[test]
    fn indent_and_dedent_balance() {
        let source = "if a:\n    if b:\n        c\nd\n";
        let kinds = kinds(source);
        let indents = kinds.iter().filter(|k| **k == TokenKind::Indent).count();
        let dedents = kinds.iter().filter(|k| **k == TokenKind::Dedent).count();
        assert_eq!(indents, 2);
        assert_eq!(indents, dedents);
    }

    #[test]
    fn dedents_closed_at_end_of_input() {
        let kinds = kinds("while a:\n    b\n");
        assert_eq!(
            kinds[kinds.len() - 2..],
            [TokenKind::Dedent, TokenKind::Eof]
        );
    }

    #[test]
    fn blank_and_comment_lines_do_not_change_indent() {
        let source = "if a:\n    b\n\n# comment\n    c\n";
        let kinds = kinds(source);
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Indent).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Dedent).count(), 1);
    }

    #[test]
    fn line_continuation_joins_lines() {
        let lex = lexemes("a = \\\n1\n");
        assert!(lex.contains(&"1".to_string()));
        // one logical line: a single newline token
        let kinds = kinds("a = \\\n1\n");
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
    }

    #[test]
    fn two_char_operators() {
        let lex = lexemes("a <= b != c == d |= e\n");
        for op in ["<=", "!=", "==", "|="] {
            assert!(lex.contains(&op.to_string()), "missing {op}");
        }
    }

    #[test]
    fn number_with_fraction() {
        assert!(lexemes("3.25\n").contains(&"3.25".to_string()));
        // a dot not followed by a digit is punctuation
        let lex = lexemes("3.x\n");
        assert!(lex.contains(&"3".to_string()));
        assert!(lex.contains(&".".to_string()));
    }

    #[test]
    fn string_escapes_decode() {
        assert_eq!(decode_string(r"'a\nb'"), "a\nb");
        assert_eq!(decode_string(r#""say \"hi\"""#), "say \"hi\"");
        assert_eq!(decode_string(r"'back\\slash'"), "back\\slash");
    }

    #[test]
    fn keywords_are_not_names() {
        let tokens: Vec<_> = Scanner::new("while x\n").map(Result::unwrap).collect();
        assert!(tokens[0].is_keyword());
        assert!(tokens[1].is_name());
        // True/False/None are plain names at the token level
        let tokens: Vec<_> = Scanner::new("True\n").map(Result::unwrap).collect();
        assert!(tokens[0].is_name());
    }

    #[test]
    fn token_line_numbers() {
        let tokens: Vec<_> = Scanner::new("a\nb\nc\n").map(Result::unwrap).collect();
        let lines: Vec<_> = tokens
            .iter()
            .filter(|t| t.is_name())
            .map(Token::line)
            .collect();
        assert_eq!(lines, [1, 2, 3]);
    }

    #[test]
    fn leading_tab_is_an_error() {
        let result: Result<Vec<_>, _> = Scanner::new("if a:\n\tb\n").collect();
        let err = result.unwrap_err();
        assert_eq!(
            err,
            Exception::syntax("tab in leading whitespace", 2)
        );
    }

    #[test]
    fn ragged_indent_is_an_error() {
        let result: Result<Vec<_>, _> = Scanner::new("if a:\n   b\n").collect();
        assert!(matches!(result, Err(Exception::Syntax { line: 2, .. })));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let result: Result<Vec<_>, _> = Scanner::new("x = 'abc\n").collect();
        assert!(matches!(result, Err(Exception::Syntax { .. })));
    }
}
