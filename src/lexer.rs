use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    Num(String),
    /// Run of operator characters, e.g. `=`, `===`, `&&`, `!`.
    Op(String),

    LBrace,   // {
    RBrace,   // }
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    Dot,       // .
    OptDot,    // ?.
    Spread,    // ...
    Arrow,     // =>
    At,        // @

    Eof,
}

/// A token and the 0-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub line: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character: {0}")]
    UnexpectedChar(char),
    #[error("Unterminated string starting on line {0}")]
    UnterminatedString(usize),
    #[error("Unterminated template literal starting on line {0}")]
    UnterminatedTemplate(usize),
    #[error("Unterminated block comment starting on line {0}")]
    UnterminatedComment(usize),
    #[error("Unterminated regular expression on line {0}")]
    UnterminatedRegex(usize),
}

const OP_CHARS: &str = "=!<>+-*/%&|^~?";

/// Keywords after which `/` opens a regular expression rather than dividing.
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    prev: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 0,
            prev: None,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() || *c == '\u{feff}' => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    match ahead.peek() {
                        Some('/') => {
                            while let Some(&c) = self.chars.peek() {
                                if c == '\n' {
                                    break;
                                }
                                self.bump();
                            }
                        }
                        Some('*') => {
                            let start = self.line;
                            self.bump();
                            self.bump();
                            let mut prev = '\0';
                            loop {
                                match self.bump() {
                                    Some('/') if prev == '*' => break,
                                    Some(c) => prev = c,
                                    None => return Err(LexError::UnterminatedComment(start)),
                                }
                            }
                        }
                        _ => break,
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.line;
        let mut s = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(s),
                Some('\\') => {
                    if let Some(c) = self.bump() {
                        match c {
                            'n' => s.push('\n'),
                            't' => s.push('\t'),
                            'r' => s.push('\r'),
                            _ => s.push(c),
                        }
                    }
                }
                Some('\n') | None => return Err(LexError::UnterminatedString(start)),
                Some(c) => s.push(c),
            }
        }
    }

    /// Template literal body, substitutions included verbatim.
    fn read_template(&mut self) -> Result<String, LexError> {
        let start = self.line;
        let mut s = String::new();
        let mut depth = 0usize;
        loop {
            match self.bump() {
                Some('`') if depth == 0 => return Ok(s),
                Some('\\') => {
                    s.push('\\');
                    if let Some(c) = self.bump() {
                        s.push(c);
                    }
                }
                Some('$') if self.chars.peek() == Some(&'{') => {
                    self.bump();
                    depth += 1;
                    s.push_str("${");
                }
                Some('}') if depth > 0 => {
                    depth -= 1;
                    s.push('}');
                }
                Some(c) => s.push(c),
                None => return Err(LexError::UnterminatedTemplate(start)),
            }
        }
    }

    fn read_number(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    /// `/` starts a regex literal when no operand precedes it.
    fn regex_allowed(&self) -> bool {
        match &self.prev {
            None => true,
            Some(Token::Ident(word)) => REGEX_KEYWORDS.contains(&word.as_str()),
            Some(
                Token::Str(_) | Token::Num(_) | Token::RParen | Token::RBracket | Token::RBrace,
            ) => false,
            Some(_) => true,
        }
    }

    /// Regex literal after the opening `/`, flags included, e.g. `^[a-z']+$/i`.
    fn read_regex(&mut self) -> Result<String, LexError> {
        let start = self.line;
        let mut s = String::from("/");
        let mut in_class = false;
        loop {
            match self.bump() {
                Some('\\') => {
                    s.push('\\');
                    match self.bump() {
                        Some('\n') | None => return Err(LexError::UnterminatedRegex(start)),
                        Some(c) => s.push(c),
                    }
                }
                Some('[') => {
                    in_class = true;
                    s.push('[');
                }
                Some(']') => {
                    in_class = false;
                    s.push(']');
                }
                Some('/') if !in_class => {
                    s.push('/');
                    break;
                }
                Some('\n') | None => return Err(LexError::UnterminatedRegex(start)),
                Some(c) => s.push(c),
            }
        }
        while let Some(&c) = self.chars.peek() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            s.push(c);
            self.bump();
        }
        Ok(s)
    }

    fn read_op(&mut self, first: char) -> Token {
        let mut s = String::from(first);
        if first == '=' && self.chars.peek() == Some(&'>') {
            self.bump();
            return Token::Arrow;
        }
        while let Some(&c) = self.chars.peek() {
            if c == '.' && s == "?" {
                self.bump();
                return Token::OptDot;
            }
            if !OP_CHARS.contains(c) || self.comment_ahead() {
                break;
            }
            s.push(c);
            self.bump();
        }
        Token::Op(s)
    }

    fn comment_ahead(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next() == Some('/') && matches!(ahead.next(), Some('/') | Some('*'))
    }

    pub fn next_lexeme(&mut self) -> Result<Lexeme, LexError> {
        self.skip_whitespace_and_comments()?;
        let line = self.line;

        let c = match self.bump() {
            Some(c) => c,
            None => {
                return Ok(Lexeme {
                    token: Token::Eof,
                    line,
                });
            }
        };

        let token = match c {
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            ':' => Token::Colon,
            '@' => Token::At,
            '.' => {
                if self.chars.peek() == Some(&'.') {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() == Some(&'.') {
                        self.bump();
                        self.bump();
                        Token::Spread
                    } else {
                        Token::Dot
                    }
                } else if self.chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    Token::Num(self.read_number('.'))
                } else {
                    Token::Dot
                }
            }
            '\'' | '"' => Token::Str(self.read_string(c)?),
            '`' => Token::Str(self.read_template()?),
            c if c.is_ascii_digit() => Token::Num(self.read_number(c)),
            c if c.is_alphabetic() || c == '_' || c == '$' || c == '#' => {
                Token::Ident(self.read_ident(c))
            }
            '/' if self.regex_allowed() => Token::Str(self.read_regex()?),
            c if OP_CHARS.contains(c) => self.read_op(c),
            _ => return Err(LexError::UnexpectedChar(c)),
        };

        self.prev = Some(token.clone());
        Ok(Lexeme { token, line })
    }

    pub fn tokenize(mut self) -> Result<Vec<Lexeme>, LexError> {
        let mut lexemes = Vec::new();
        loop {
            let lexeme = self.next_lexeme()?;
            if lexeme.token == Token::Eof {
                lexemes.push(lexeme);
                break;
            }
            lexemes.push(lexeme);
        }
        Ok(lexemes)
    }
}
