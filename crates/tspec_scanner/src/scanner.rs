//! The tspec scanner.
//!
//! Converts source text into a stream of tokens that the parser pulls one at
//! a time with [`Scanner::scan`]. String templates are scanned in pieces: a
//! string containing `${` yields a head token, and after the interpolated
//! expression the parser calls [`Scanner::rescan_template_token`] at the
//! closing `}` to obtain the middle or tail.

use crate::char_codes::*;
use tspec_ast::syntax_kind::SyntaxKind;
use tspec_ast::types::TokenFlags;
use tspec_core::text::TextRange;
use tspec_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage, DiagnosticTarget};

/// Saved scanner state for lookahead.
pub struct ScannerState {
    pos: usize,
    token_start: usize,
    token: SyntaxKind,
    token_value: String,
    token_flags: TokenFlags,
    diagnostic_count: usize,
}

pub struct Scanner {
    file_name: String,
    text: String,
    /// Byte offset of the next unread character.
    pos: usize,
    /// Start of the current token (after leading trivia).
    token_start: usize,
    token: SyntaxKind,
    /// Identifier spelling, unescaped string contents, or numeric text.
    token_value: String,
    token_flags: TokenFlags,
    diagnostics: DiagnosticCollection,
}

impl Scanner {
    pub fn new(file_name: &str, text: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            text: text.to_string(),
            pos: 0,
            token_start: 0,
            token: SyntaxKind::Unknown,
            token_value: String::new(),
            token_flags: TokenFlags::NONE,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    #[inline]
    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    #[inline]
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// End of the current token (exclusive).
    #[inline]
    pub fn token_end(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn token_flags(&self) -> TokenFlags {
        self.token_flags
    }

    #[inline]
    pub fn has_preceding_line_break(&self) -> bool {
        self.token_flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Take the accumulated diagnostics, leaving an empty collection.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn save_state(&self) -> ScannerState {
        ScannerState {
            pos: self.pos,
            token_start: self.token_start,
            token: self.token,
            token_value: self.token_value.clone(),
            token_flags: self.token_flags,
            diagnostic_count: self.diagnostics.len(),
        }
    }

    /// Restore a saved state, discarding diagnostics reported since.
    pub fn restore_state(&mut self, state: ScannerState) {
        self.pos = state.pos;
        self.token_start = state.token_start;
        self.token = state.token;
        self.token_value = state.token_value;
        self.token_flags = state.token_flags;
        self.diagnostics.truncate(state.diagnostic_count);
    }

    /// Run `f` and rewind to the current token afterwards.
    pub fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let state = self.save_state();
        let result = f(self);
        self.restore_state(state);
        result
    }

    // ========================================================================
    // Core scanning
    // ========================================================================

    #[inline]
    fn current_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// The character `offset` bytes past the current position. Only used
    /// with ASCII lookahead, so byte offsets and char offsets agree.
    #[inline]
    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn error(&mut self, message: &DiagnosticMessage, start: usize, end: usize) {
        let target = DiagnosticTarget::new(self.file_name.as_str(), TextRange::new(start as u32, end as u32));
        self.diagnostics.add(Diagnostic::with_target(target, message, &[]));
    }

    /// Skip whitespace and comments, recording line breaks in the flags.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current_char() {
            if is_line_break(ch) {
                self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                self.pos += ch.len_utf8();
            } else if is_white_space_single_line(ch) {
                self.pos += ch.len_utf8();
            } else if ch == '/' && self.byte_at(1) == Some(b'/') {
                let rest = &self.text.as_bytes()[self.pos..];
                self.pos += memchr::memchr(b'\n', rest).unwrap_or(rest.len());
            } else if ch == '/' && self.byte_at(1) == Some(b'*') {
                let start = self.pos;
                let body = &self.text.as_bytes()[self.pos + 2..];
                match memchr::memmem::find(body, b"*/") {
                    Some(offset) => {
                        if memchr::memchr(b'\n', &body[..offset]).is_some() {
                            self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                        }
                        self.pos += offset + 4;
                    }
                    None => {
                        self.pos = self.text.len();
                        self.error(&messages::UNTERMINATED_COMMENT, start, self.pos);
                    }
                }
            } else {
                return;
            }
        }
    }

    /// Scan the next token and return its kind.
    pub fn scan(&mut self) -> SyntaxKind {
        self.token_flags = TokenFlags::NONE;
        self.token_value.clear();

        self.skip_trivia();
        self.token_start = self.pos;

        let Some(ch) = self.current_char() else {
            self.token = SyntaxKind::EndOfFileToken;
            return self.token;
        };

        self.token = match ch {
            '(' => self.single(SyntaxKind::OpenParenToken),
            ')' => self.single(SyntaxKind::CloseParenToken),
            '{' => self.single(SyntaxKind::OpenBraceToken),
            '}' => self.single(SyntaxKind::CloseBraceToken),
            '[' => self.single(SyntaxKind::OpenBracketToken),
            ']' => self.single(SyntaxKind::CloseBracketToken),
            ';' => self.single(SyntaxKind::SemicolonToken),
            ',' => self.single(SyntaxKind::CommaToken),
            '<' => self.single(SyntaxKind::LessThanToken),
            '>' => self.single(SyntaxKind::GreaterThanToken),
            '=' => self.single(SyntaxKind::EqualsToken),
            '&' => self.single(SyntaxKind::AmpersandToken),
            '|' => self.single(SyntaxKind::BarToken),
            '?' => self.single(SyntaxKind::QuestionToken),

            '.' => {
                if self.byte_at(1) == Some(b'.') && self.byte_at(2) == Some(b'.') {
                    self.pos += 3;
                    SyntaxKind::DotDotDotToken
                } else {
                    self.single(SyntaxKind::DotToken)
                }
            }
            ':' => {
                if self.byte_at(1) == Some(b':') {
                    self.pos += 2;
                    SyntaxKind::ColonColonToken
                } else {
                    self.single(SyntaxKind::ColonToken)
                }
            }
            '@' => {
                if self.byte_at(1) == Some(b'@') {
                    self.pos += 2;
                    SyntaxKind::AtAtToken
                } else {
                    self.single(SyntaxKind::AtToken)
                }
            }
            '#' => match self.byte_at(1) {
                Some(b'{') => {
                    self.pos += 2;
                    SyntaxKind::HashBraceToken
                }
                Some(b'[') => {
                    self.pos += 2;
                    SyntaxKind::HashBracketToken
                }
                _ => self.invalid_character(ch),
            },

            '"' => self.scan_string(),
            '`' => self.scan_backtick_identifier(),

            '0'..='9' => self.scan_number(),
            '-' if self.byte_at(1).map_or(false, |b| b.is_ascii_digit()) => self.scan_number(),

            _ if is_identifier_start(ch) => self.scan_identifier(),

            _ => self.invalid_character(ch),
        };

        self.token
    }

    #[inline]
    fn single(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 1;
        kind
    }

    fn invalid_character(&mut self, ch: char) -> SyntaxKind {
        let start = self.pos;
        self.pos += ch.len_utf8();
        self.error(&messages::INVALID_CHARACTER, start, self.pos);
        SyntaxKind::Unknown
    }

    // ========================================================================
    // Strings and string templates
    // ========================================================================

    fn scan_string(&mut self) -> SyntaxKind {
        let triple = self.text[self.pos..].starts_with("\"\"\"");
        if triple {
            self.token_flags |= TokenFlags::TRIPLE_QUOTED;
            self.pos += 3;
        } else {
            self.pos += 1;
        }
        let kind = self.scan_string_body(triple, false);
        if triple && kind == SyntaxKind::StringLiteral {
            self.token_value = dedent_triple_quoted(&self.token_value);
        }
        kind
    }

    /// Scan the continuation of a string template at the `}` closing an
    /// interpolation. Returns a middle or tail token.
    pub fn rescan_template_token(&mut self, triple: bool) -> SyntaxKind {
        self.pos = self.token_start + 1;
        self.token_value.clear();
        if triple {
            self.token_flags |= TokenFlags::TRIPLE_QUOTED;
        }
        self.token = self.scan_string_body(triple, true);
        self.token
    }

    fn scan_string_body(&mut self, triple: bool, continuation: bool) -> SyntaxKind {
        let (literal, interpolated) = if continuation {
            (SyntaxKind::StringTemplateTail, SyntaxKind::StringTemplateMiddle)
        } else {
            (SyntaxKind::StringLiteral, SyntaxKind::StringTemplateHead)
        };
        let mut result = String::new();
        loop {
            let Some(ch) = self.current_char() else {
                self.token_flags |= TokenFlags::UNTERMINATED;
                self.error(&messages::UNTERMINATED_STRING, self.token_start, self.pos);
                break;
            };
            if ch == '"' {
                if !triple {
                    self.pos += 1;
                    break;
                }
                if self.text[self.pos..].starts_with("\"\"\"") {
                    self.pos += 3;
                    break;
                }
            }
            if ch == '$' && self.byte_at(1) == Some(b'{') {
                self.pos += 2;
                self.token_value = result;
                return interpolated;
            }
            if ch == '\\' {
                self.scan_escape(&mut result);
                continue;
            }
            if !triple && is_line_break(ch) {
                self.token_flags |= TokenFlags::UNTERMINATED;
                self.error(&messages::UNTERMINATED_STRING, self.token_start, self.pos);
                break;
            }
            result.push(ch);
            self.pos += ch.len_utf8();
        }
        self.token_value = result;
        literal
    }

    fn scan_escape(&mut self, out: &mut String) {
        let start = self.pos;
        self.pos += 1;
        self.token_flags |= TokenFlags::ESCAPED;
        let Some(ch) = self.current_char() else {
            return;
        };
        self.pos += ch.len_utf8();
        match ch {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '"' | '\\' | '$' | '@' | '`' => out.push(ch),
            _ => {
                self.error(&messages::INVALID_ESCAPE, start, self.pos);
                out.push(ch);
            }
        }
    }

    // ========================================================================
    // Numbers
    // ========================================================================

    fn scan_number(&mut self) -> SyntaxKind {
        let start = self.pos;
        if self.byte_at(0) == Some(b'-') {
            self.pos += 1;
        }

        if self.byte_at(0) == Some(b'0') {
            match self.byte_at(1) {
                Some(b'x') | Some(b'X') => {
                    self.token_flags |= TokenFlags::HEX_SPECIFIER;
                    return self.scan_radix_number(start, is_hex_digit, &messages::HEX_DIGIT_EXPECTED);
                }
                Some(b'b') | Some(b'B') => {
                    self.token_flags |= TokenFlags::BINARY_SPECIFIER;
                    return self.scan_radix_number(start, is_binary_digit, &messages::BINARY_DIGIT_EXPECTED);
                }
                _ => {}
            }
        }

        self.scan_digits();
        if self.byte_at(0) == Some(b'.') && self.byte_at(1).map_or(false, |b| b.is_ascii_digit()) {
            self.pos += 1;
            self.scan_digits();
        }

        if let Some(b'e') | Some(b'E') = self.byte_at(0) {
            self.pos += 1;
            self.token_flags |= TokenFlags::SCIENTIFIC;
            if let Some(b'+') | Some(b'-') = self.byte_at(0) {
                self.pos += 1;
            }
            let digits_start = self.pos;
            self.scan_digits();
            if self.pos == digits_start {
                self.token_flags |= TokenFlags::IS_INVALID;
                self.error(&messages::DIGIT_EXPECTED, digits_start, digits_start);
            }
        }

        self.token_value = self.text[start..self.pos].to_string();
        SyntaxKind::NumericLiteral
    }

    fn scan_radix_number(&mut self, start: usize, is_radix_digit: fn(char) -> bool, missing: &DiagnosticMessage) -> SyntaxKind {
        self.pos += 2;
        let digits_start = self.pos;
        while self.current_char().map_or(false, is_radix_digit) {
            self.pos += 1;
        }
        if self.pos == digits_start {
            self.token_flags |= TokenFlags::IS_INVALID;
            self.error(missing, digits_start, digits_start);
        }
        self.token_value = self.text[start..self.pos].to_string();
        SyntaxKind::NumericLiteral
    }

    fn scan_digits(&mut self) {
        while self.current_char().map_or(false, is_digit) {
            self.pos += 1;
        }
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    fn scan_identifier(&mut self) -> SyntaxKind {
        let start = self.pos;
        while let Some(ch) = self.current_char() {
            if !is_identifier_part(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        self.token_value = self.text[start..self.pos].to_string();
        SyntaxKind::from_keyword(&self.token_value).unwrap_or(SyntaxKind::Identifier)
    }

    /// `` `model` `` is an identifier spelled like a keyword.
    fn scan_backtick_identifier(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        let rest = &self.text.as_bytes()[self.pos..];
        match memchr::memchr2(b'`', b'\n', rest) {
            Some(offset) if rest[offset] == b'`' => {
                self.token_value = self.text[self.pos..self.pos + offset].to_string();
                self.pos += offset + 1;
            }
            found => {
                let end = found.map_or(self.text.len(), |offset| self.pos + offset);
                self.token_value = self.text[self.pos..end].to_string();
                self.pos = end;
                self.token_flags |= TokenFlags::UNTERMINATED;
                self.error(&messages::UNTERMINATED_STRING, start, self.pos);
            }
        }
        SyntaxKind::Identifier
    }
}

/// Strip the leading line break, the closing line's indentation, and that
/// same indentation from every line of a `"""` string.
fn dedent_triple_quoted(raw: &str) -> String {
    let body = raw
        .strip_prefix("\r\n")
        .or_else(|| raw.strip_prefix('\n'))
        .unwrap_or(raw);
    let Some(last_break) = body.rfind('\n') else {
        return body.to_string();
    };
    let indent = &body[last_break + 1..];
    if !indent.chars().all(is_white_space_single_line) {
        return body.to_string();
    }
    let content = body[..last_break].strip_suffix('\r').unwrap_or(&body[..last_break]);
    content
        .split('\n')
        .map(|line| line.strip_prefix(indent).unwrap_or(line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}
