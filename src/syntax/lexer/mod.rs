use crate::diagnostic::Diagnostic;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};

pub struct Lexer<'src> {
    source: &'src [u8],
    file_id: u16,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    /// Whether we've seen a non-whitespace token on the current line.
    token_on_line: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, file_id: u16) -> Self {
        Self {
            source: source.as_bytes(),
            file_id,
            pos: 0,
            diagnostics: Vec::new(),
            token_on_line: false,
        }
    }

    pub fn tokenize(mut self) -> (Vec<Spanned<Lexeme>>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.node == Lexeme::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Spanned<Lexeme> {
        loop {
            self.skip_whitespace_and_comments();

            if self.pos >= self.source.len() {
                return self.make_token(Lexeme::Eof, self.pos, self.pos);
            }

            let start = self.pos;
            let ch = self.source[self.pos];

            // Preprocessor lines are only recognised as the first token on a line
            if ch == b'#' && !self.token_on_line {
                return self.scan_directive();
            }

            self.token_on_line = true;

            if is_ident_start(ch) {
                return self.scan_ident_or_keyword();
            }

            if ch.is_ascii_digit() || (ch == b'.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())) {
                return self.scan_number();
            }

            if ch == b'"' {
                return self.scan_quoted(b'"');
            }

            if ch == b'\'' {
                return self.scan_quoted(b'\'');
            }

            if let Some(tok) = self.scan_symbol(start) {
                return tok;
            }
            // scan_symbol returned None → error was recorded, try again
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                if self.source[self.pos] == b'\n' {
                    self.token_on_line = false;
                }
                self.pos += 1;
            }

            if self.starts_with(b"//") {
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            if self.starts_with(b"/*") {
                let start = self.pos;
                self.pos += 2;
                while self.pos < self.source.len() && !self.starts_with(b"*/") {
                    if self.source[self.pos] == b'\n' {
                        self.token_on_line = false;
                    }
                    self.pos += 1;
                }
                if self.pos >= self.source.len() {
                    self.diagnostics.push(
                        Diagnostic::error(
                            "unterminated block comment".to_string(),
                            Span::new(self.file_id, start as u32, self.pos as u32),
                        )
                        .with_help("close the comment with `*/`".to_string()),
                    );
                } else {
                    self.pos += 2;
                }
                continue;
            }

            break;
        }
    }

    /// Scan a whole preprocessor line, following `\` line continuations.
    fn scan_directive(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        while self.pos < self.source.len() {
            match self.source[self.pos] {
                b'\\' if self.peek_at(1) == Some(b'\n') => self.pos += 2,
                b'\\' if self.peek_at(1) == Some(b'\r') && self.peek_at(2) == Some(b'\n') => {
                    self.pos += 3
                }
                b'\n' => break,
                _ => self.pos += 1,
            }
        }
        let text = self.text(start, self.pos).trim_end().to_string();
        self.make_token(Lexeme::Directive(text), start, self.pos)
    }

    fn scan_ident_or_keyword(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = self.text(start, self.pos);
        let token = Lexeme::from_keyword(text).unwrap_or_else(|| Lexeme::Ident(text.to_string()));
        self.make_token(token, start, self.pos)
    }

    fn scan_number(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;

        if self.starts_with(b"0x") || self.starts_with(b"0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_hexdigit() {
                self.pos += 1;
            }
            let digits = self.text(digits_start, self.pos).to_string();
            self.skip_integer_suffix();
            return self.finish_integer(&digits, 16, start);
        }

        while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        let int_end = self.pos;

        let mut is_float = false;
        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let save = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            } else {
                self.pos = save;
            }
        }
        if matches!(self.peek(), Some(b'f' | b'F')) {
            is_float = true;
            self.pos += 1;
        } else if is_float && matches!(self.peek(), Some(b'l' | b'L')) {
            self.pos += 1;
        }

        if is_float {
            let text = self.text(start, self.pos).to_string();
            return self.make_token(Lexeme::FloatLit(text), start, self.pos);
        }

        let digits = self.text(start, int_end).to_string();
        self.skip_integer_suffix();
        let radix = if digits.len() > 1 && digits.starts_with('0') { 8 } else { 10 };
        self.finish_integer(&digits, radix, start)
    }

    fn skip_integer_suffix(&mut self) {
        while matches!(self.peek(), Some(b'u' | b'U' | b'l' | b'L')) {
            self.pos += 1;
        }
    }

    fn finish_integer(&mut self, digits: &str, radix: u32, start: usize) -> Spanned<Lexeme> {
        match u64::from_str_radix(digits, radix) {
            Ok(n) => self.make_token(Lexeme::Integer(n), start, self.pos),
            Err(_) => {
                let text = self.text(start, self.pos).to_string();
                let help = if digits.is_empty() {
                    "hexadecimal literals need at least one digit after `0x`".to_string()
                } else {
                    format!("maximum integer value is {}", u64::MAX)
                };
                self.diagnostics.push(
                    Diagnostic::error(
                        format!("invalid integer literal '{}'", text),
                        Span::new(self.file_id, start as u32, self.pos as u32),
                    )
                    .with_help(help),
                );
                self.make_token(Lexeme::Integer(0), start, self.pos)
            }
        }
    }

    /// Scan a string or character literal; the lexeme keeps the raw body.
    fn scan_quoted(&mut self, quote: u8) -> Spanned<Lexeme> {
        let start = self.pos;
        self.pos += 1;
        let body_start = self.pos;
        let mut terminated = false;
        while self.pos < self.source.len() {
            match self.source[self.pos] {
                b'\\' => self.pos += 2,
                b'\n' => break,
                c if c == quote => {
                    terminated = true;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.source.len());
        let body = self.text(body_start, self.pos).to_string();
        if terminated {
            self.pos += 1;
        } else {
            let what = if quote == b'"' { "string" } else { "character" };
            self.diagnostics.push(Diagnostic::error(
                format!("unterminated {} literal", what),
                Span::new(self.file_id, start as u32, self.pos as u32),
            ));
        }
        let token = if quote == b'"' {
            Lexeme::Str(body)
        } else {
            Lexeme::CharLit(body)
        };
        self.make_token(token, start, self.pos)
    }

    fn scan_symbol(&mut self, start: usize) -> Option<Spanned<Lexeme>> {
        const SYMBOLS: &[(&str, Lexeme)] = &[
            ("<<<", Lexeme::LaunchOpen),
            (">>>", Lexeme::LaunchClose),
            ("<<=", Lexeme::ShlEq),
            (">>=", Lexeme::ShrEq),
            ("...", Lexeme::Ellipsis),
            ("->", Lexeme::Arrow),
            ("++", Lexeme::PlusPlus),
            ("--", Lexeme::MinusMinus),
            ("<<", Lexeme::Shl),
            (">>", Lexeme::Shr),
            ("<=", Lexeme::Le),
            (">=", Lexeme::Ge),
            ("==", Lexeme::EqEq),
            ("!=", Lexeme::Ne),
            ("&&", Lexeme::AmpAmp),
            ("||", Lexeme::PipePipe),
            ("+=", Lexeme::PlusEq),
            ("-=", Lexeme::MinusEq),
            ("*=", Lexeme::StarEq),
            ("/=", Lexeme::SlashEq),
            ("%=", Lexeme::PercentEq),
            ("&=", Lexeme::AmpEq),
            ("|=", Lexeme::PipeEq),
            ("^=", Lexeme::CaretEq),
            ("(", Lexeme::LParen),
            (")", Lexeme::RParen),
            ("{", Lexeme::LBrace),
            ("}", Lexeme::RBrace),
            ("[", Lexeme::LBracket),
            ("]", Lexeme::RBracket),
            (",", Lexeme::Comma),
            (";", Lexeme::Semicolon),
            (":", Lexeme::Colon),
            ("?", Lexeme::Question),
            (".", Lexeme::Dot),
            ("+", Lexeme::Plus),
            ("-", Lexeme::Minus),
            ("*", Lexeme::Star),
            ("/", Lexeme::Slash),
            ("%", Lexeme::Percent),
            ("&", Lexeme::Amp),
            ("|", Lexeme::Pipe),
            ("^", Lexeme::Caret),
            ("~", Lexeme::Tilde),
            ("!", Lexeme::Bang),
            ("<", Lexeme::Lt),
            (">", Lexeme::Gt),
            ("=", Lexeme::Eq),
        ];

        for (spelling, lexeme) in SYMBOLS {
            if self.starts_with(spelling.as_bytes()) {
                self.pos += spelling.len();
                return Some(self.make_token(lexeme.clone(), start, self.pos));
            }
        }

        let ch = self.source[self.pos];
        self.pos += 1;
        self.diagnostics.push(
            Diagnostic::error(
                format!("unexpected character '{}' (U+{:04X})", ch as char, ch),
                Span::new(self.file_id, start as u32, self.pos as u32),
            )
            .with_help("this character is not part of the supported CUDA C subset".to_string()),
        );
        None
    }

    fn starts_with(&self, s: &[u8]) -> bool {
        self.source[self.pos..].starts_with(s)
    }

    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.source.get(self.pos + n).copied()
    }

    fn text(&self, start: usize, end: usize) -> &'src str {
        std::str::from_utf8(&self.source[start..end]).unwrap_or("")
    }

    fn make_token(&self, token: Lexeme, start: usize, end: usize) -> Spanned<Lexeme> {
        Spanned::new(token, Span::new(self.file_id, start as u32, end as u32))
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}
