use crate::error::{LexerError, SgfError};
use miette::NamedSource;

/// Represents the different kinds of tokens that the lexer can produce.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenType {
    /// Left Parenthesis: `(`, opens a game tree.
    TreeStart,
    /// Right Parenthesis: `)`, closes the current game tree.
    TreeEnd,
    /// Semicolon: `;`, starts a new node.
    NodeStart,
    /// A property identifier made of uppercase ASCII letters, e.g. `FF`.
    PropertyIdent(String),
    /// The content of a `[...]` value with escapes already removed.
    PropertyValue(String),
}

/// A token with its type and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub ttype: TokenType,
    /// Byte offset of the first character of the token.
    pub pos_start: usize,
    /// Byte offset one past the last character of the token.
    pub pos_end: usize,
    /// 1-based line where the token starts.
    pub line: usize,
    /// 1-based column where the token starts.
    pub column: usize,
}

impl Token {
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize, line: usize, column: usize) -> Token {
        Token {
            ttype,
            pos_start,
            pos_end,
            line,
            column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerState {
    Control,
    Value,
}

/// Marks where the pending identifier or value started.
#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: usize,
    column: usize,
}

pub struct Lexer<'a> {
    name: String,
    input: &'a str,
    chars: std::str::CharIndices<'a>,
    state: LexerState,
    /// Byte offset just past the last consumed character.
    position: usize,
    line: usize,
    column: usize,
    pending: String,
    pending_start: Option<Mark>,
    escaped: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::new_with_name(input, "source.sgf")
    }

    pub fn new_with_name(input: &'a str, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input,
            chars: input.char_indices(),
            state: LexerState::Control,
            position: 0,
            line: 1,
            column: 1,
            pending: String::new(),
            pending_start: None,
            escaped: false,
        }
    }

    /// Tokenizes the whole input. The first lexical error aborts and no
    /// partial token list is returned.
    pub fn lex(&mut self) -> Result<Vec<Token>, SgfError> {
        let mut tokens = Vec::new();

        while let Some((offset, c)) = self.chars.next() {
            let here = Mark {
                pos: offset,
                line: self.line,
                column: self.column,
            };
            self.position = offset + c.len_utf8();

            match self.state {
                LexerState::Control => self.control(c, here, &mut tokens)?,
                LexerState::Value => self.value(c, &mut tokens),
            }

            self.advance_position(c);
        }

        match self.state {
            LexerState::Control => self.flush_ident(&mut tokens),
            LexerState::Value => {
                let start = self.pending_start.unwrap_or(Mark {
                    pos: self.position,
                    line: self.line,
                    column: self.column,
                });
                return Err(LexerError::ValueLeftOpen {
                    line: self.line,
                    column: self.column,
                    src: self.named_source(),
                    span: (start.pos, self.position - start.pos).into(),
                }
                .into());
            }
        }

        log::debug!("lexed {} tokens from {}", tokens.len(), self.name);
        Ok(tokens)
    }

    fn control(&mut self, c: char, here: Mark, tokens: &mut Vec<Token>) -> Result<(), SgfError> {
        match c {
            ' ' | '\t' | '\u{0B}' | '\r' | '\n' => {
                if !self.pending.is_empty() {
                    return Err(self.invalid_character(c, here));
                }
            }
            '(' | ')' | ';' => {
                self.flush_ident(tokens);
                let ttype = match c {
                    '(' => TokenType::TreeStart,
                    ')' => TokenType::TreeEnd,
                    _ => TokenType::NodeStart,
                };
                tokens.push(Token::new(ttype, here.pos, self.position, here.line, here.column));
            }
            '[' => {
                self.flush_ident(tokens);
                self.pending_start = Some(here);
                self.state = LexerState::Value;
            }
            'A'..='Z' => {
                if self.pending.is_empty() {
                    self.pending_start = Some(here);
                }
                self.pending.push(c);
            }
            _ => return Err(self.invalid_character(c, here)),
        }
        Ok(())
    }

    fn value(&mut self, c: char, tokens: &mut Vec<Token>) {
        if self.escaped {
            self.pending.push(c);
            self.escaped = false;
        } else if c == '\\' {
            self.escaped = true;
        } else if c == ']' {
            let start = self.take_start();
            tokens.push(Token::new(
                TokenType::PropertyValue(std::mem::take(&mut self.pending)),
                start.pos,
                self.position,
                start.line,
                start.column,
            ));
            self.state = LexerState::Control;
        } else {
            self.pending.push(c);
        }
    }

    fn flush_ident(&mut self, tokens: &mut Vec<Token>) {
        if self.pending.is_empty() {
            return;
        }
        let start = self.take_start();
        let ident = std::mem::take(&mut self.pending);
        let end = start.pos + ident.len();
        tokens.push(Token::new(
            TokenType::PropertyIdent(ident),
            start.pos,
            end,
            start.line,
            start.column,
        ));
    }

    fn take_start(&mut self) -> Mark {
        self.pending_start.take().unwrap_or(Mark {
            pos: self.position,
            line: self.line,
            column: self.column,
        })
    }

    fn advance_position(&mut self, c: char) {
        match c {
            '\n' => {
                // "\r\n" already counted at the '\r'.
                if !self.input[..self.position - 1].ends_with('\r') {
                    self.line += 1;
                }
                self.column = 1;
            }
            '\r' => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
    }

    fn invalid_character(&self, ch: char, here: Mark) -> SgfError {
        LexerError::InvalidCharacter {
            ch,
            line: here.line,
            column: here.column,
            src: self.named_source(),
            span: (here.pos, ch.len_utf8()).into(),
        }
        .into()
    }

    fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.input.to_string())
    }
}
