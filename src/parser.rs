//! Recursive-descent parser for the subset of TypeScript that table
//! definition files are written in.
//!
//! Only top-level variable declarations are parsed into expressions. Every
//! other statement is skipped as a balanced token run.

use crate::lexer::{LexError, Lexeme, Lexer, Token};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Unexpected token {0:?} on line {1}, expected {2}")]
    Unexpected(Token, usize, &'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub exported: bool,
    /// 0-based line of the statement's first token.
    pub line: usize,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Literal(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Object(Vec<Property>),
    Array(Vec<Expr>),
    Paren(Box<Expr>),
    Arrow(Box<Expr>),
    Block,
    /// Operators, indexing and other shapes nothing downstream looks into.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    /// 0-based line of the key.
    pub line: usize,
    pub value: Expr,
}

const STATEMENT_KEYWORDS: &[&str] = &[
    "export", "import", "const", "let", "var", "function", "class", "type", "interface", "enum",
    "declare",
];

pub struct Parser {
    tokens: Vec<Lexeme>,
    pos: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self { tokens, pos: 0 })
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map_or(&Token::Eof, |l| &l.token)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map_or(&Token::Eof, |l| &l.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |l| l.line)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<(), ParseError> {
        let line = self.line();
        let tok = self.advance();
        if tok == expected {
            Ok(())
        } else {
            Err(ParseError::Unexpected(tok, line, what))
        }
    }

    fn check_ident(&self, name: &str) -> bool {
        matches!(self.peek(), Token::Ident(s) if s == name)
    }

    fn check_op(&self, op: &str) -> bool {
        matches!(self.peek(), Token::Op(s) if s == op)
    }

    /// True when the current token starts a new line relative to the previous one.
    fn at_line_start(&self) -> bool {
        self.pos > 0
            && self
                .tokens
                .get(self.pos - 1)
                .is_some_and(|prev| prev.line < self.line())
    }

    pub fn parse(&mut self) -> Result<Module, ParseError> {
        let mut declarations = Vec::new();

        while *self.peek() != Token::Eof {
            if *self.peek() == Token::At {
                self.skip_decorator();
                continue;
            }

            let line = self.line();
            let mut exported = false;

            if self.check_ident("export") {
                self.advance();
                exported = true;
                if self.check_ident("default") {
                    self.skip_statement();
                    continue;
                }
            }
            if self.check_ident("declare") {
                self.advance();
            }

            if self.check_ident("const") || self.check_ident("let") || self.check_ident("var") {
                self.advance();
                declarations.extend(self.parse_declarators(exported, line)?);
            } else {
                self.skip_statement();
            }
        }

        Ok(Module { declarations })
    }

    fn parse_declarators(
        &mut self,
        exported: bool,
        line: usize,
    ) -> Result<Vec<Declaration>, ParseError> {
        let mut decls = Vec::new();

        loop {
            let name = match self.peek() {
                Token::Ident(name) => name.clone(),
                // destructuring patterns declare nothing we care about
                _ => {
                    self.skip_statement();
                    return Ok(decls);
                }
            };
            self.advance();

            if self.check_op("!") {
                self.advance();
            }
            if *self.peek() == Token::Colon {
                self.advance();
                self.skip_type();
            }

            let init = if self.check_op("=") {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };

            decls.push(Declaration {
                name,
                exported,
                line,
                init,
            });

            if *self.peek() == Token::Comma {
                self.advance();
                continue;
            }
            if *self.peek() == Token::Semicolon {
                self.advance();
            }
            return Ok(decls);
        }
    }

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_unary()?;
        let mut opaque = false;

        loop {
            match self.peek().clone() {
                Token::Op(op) if op == "?" => {
                    self.advance();
                    self.parse_expr()?;
                    self.expect(Token::Colon, "`:` in conditional expression")?;
                    self.parse_expr()?;
                    opaque = true;
                }
                Token::Op(op) if op != "!" && op != "~" => {
                    self.advance();
                    self.parse_unary()?;
                    opaque = true;
                }
                Token::Ident(kw) if kw == "as" || kw == "satisfies" => {
                    self.advance();
                    self.skip_type();
                    opaque = true;
                }
                Token::Ident(kw) if (kw == "instanceof" || kw == "in") && !self.at_line_start() => {
                    self.advance();
                    self.parse_unary()?;
                    opaque = true;
                }
                _ => break,
            }
        }

        Ok(if opaque { Expr::Other } else { first })
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().clone() {
            Token::Op(op) if matches!(op.as_str(), "!" | "!!" | "-" | "+" | "~" | "++" | "--") => {
                self.advance();
                self.parse_unary()?;
                Ok(Expr::Other)
            }
            Token::Ident(kw)
                if matches!(kw.as_str(), "typeof" | "void" | "await" | "delete" | "new")
                    && self.starts_operand(1) =>
            {
                self.advance();
                self.parse_unary()?;
                Ok(Expr::Other)
            }
            _ => {
                let primary = self.parse_primary()?;
                self.parse_postfix(primary)
            }
        }
    }

    fn starts_operand(&self, offset: usize) -> bool {
        matches!(
            self.peek_at(offset),
            Token::Ident(_)
                | Token::Str(_)
                | Token::Num(_)
                | Token::LParen
                | Token::LBrace
                | Token::LBracket
        )
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        loop {
            match self.peek().clone() {
                Token::Dot | Token::OptDot => {
                    self.advance();
                    match self.peek().clone() {
                        Token::Ident(property) => {
                            self.advance();
                            expr = Expr::Member {
                                object: Box::new(expr),
                                property,
                            };
                        }
                        // `a?.(x)` and `a?.[x]` are picked up on the next turn
                        Token::LParen | Token::LBracket => {}
                        tok => {
                            return Err(ParseError::Unexpected(tok, self.line(), "property name"));
                        }
                    }
                }
                Token::LParen => {
                    let args = self.parse_args()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                Token::LBracket => {
                    self.advance();
                    self.parse_expr()?;
                    self.expect(Token::RBracket, "`]`")?;
                    expr = Expr::Other;
                }
                Token::Op(op) if op == "!" => {
                    self.advance();
                }
                Token::Op(op) if op.starts_with('<') => {
                    if !self.skip_type_arguments() {
                        return Ok(expr);
                    }
                }
                // tagged template
                Token::Str(_) if !self.at_line_start() => {
                    self.advance();
                    expr = Expr::Other;
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        match self.peek().clone() {
            Token::Ident(name) => {
                if name == "async" && self.is_arrow_after(1) {
                    self.advance();
                    return self.parse_primary();
                }
                if name == "function" || name == "class" {
                    self.skip_until_block();
                    return Ok(Expr::Other);
                }
                self.advance();
                if *self.peek() == Token::Arrow {
                    self.advance();
                    return self.parse_arrow_body();
                }
                Ok(Expr::Ident(name))
            }
            Token::Str(s) | Token::Num(s) => {
                self.advance();
                Ok(Expr::Literal(s))
            }
            Token::LParen => {
                if self.is_arrow_after(0) {
                    self.skip_balanced();
                    while !matches!(self.peek(), Token::Arrow | Token::Eof) {
                        self.advance();
                    }
                    self.advance();
                    return self.parse_arrow_body();
                }
                self.advance();
                let mut inner = self.parse_expr()?;
                while *self.peek() == Token::Comma {
                    self.advance();
                    self.parse_expr()?;
                    inner = Expr::Other;
                }
                self.expect(Token::RParen, "`)`")?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            Token::LBrace => self.parse_object(),
            Token::LBracket => self.parse_array(),
            tok => Err(ParseError::Unexpected(tok, line, "expression")),
        }
    }

    fn parse_arrow_body(&mut self) -> Result<Expr, ParseError> {
        if *self.peek() == Token::LBrace {
            self.skip_balanced();
            Ok(Expr::Arrow(Box::new(Expr::Block)))
        } else {
            Ok(Expr::Arrow(Box::new(self.parse_expr()?)))
        }
    }

    /// Whether the token at `offset` begins arrow-function parameters.
    fn is_arrow_after(&self, offset: usize) -> bool {
        let mut i = self.pos + offset;
        match self.tokens.get(i).map(|l| &l.token) {
            Some(Token::Ident(_)) => {
                return matches!(self.tokens.get(i + 1).map(|l| &l.token), Some(Token::Arrow));
            }
            Some(Token::LParen) => {}
            _ => return false,
        }

        let Some(close) = self.matching_close(i) else {
            return false;
        };
        i = close + 1;
        match self.tokens.get(i).map(|l| &l.token) {
            Some(Token::Arrow) => true,
            // return type annotation
            Some(Token::Colon) => {
                let mut depth = 0usize;
                for lexeme in &self.tokens[i + 1..] {
                    match &lexeme.token {
                        Token::Arrow if depth == 0 => return true,
                        Token::LParen | Token::LBrace | Token::LBracket => depth += 1,
                        Token::RParen | Token::RBrace | Token::RBracket => {
                            if depth == 0 {
                                return false;
                            }
                            depth -= 1;
                        }
                        Token::Comma | Token::Semicolon if depth == 0 => return false,
                        Token::Eof => return false,
                        _ => {}
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, lexeme) in self.tokens.iter().enumerate().skip(open) {
            match lexeme.token {
                Token::LParen | Token::LBrace | Token::LBracket => depth += 1,
                Token::RParen | Token::RBrace | Token::RBracket => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                Token::Eof => return None,
                _ => {}
            }
        }
        None
    }

    fn parse_object(&mut self) -> Result<Expr, ParseError> {
        self.expect(Token::LBrace, "`{`")?;
        let mut props = Vec::new();

        loop {
            let line = self.line();
            match self.advance() {
                Token::RBrace => break,
                Token::Comma => continue,
                Token::Spread => {
                    self.parse_expr()?;
                }
                Token::Ident(key) | Token::Str(key) | Token::Num(key) => {
                    if let Some(value) = self.parse_property_value(&key)? {
                        props.push(Property { key, line, value });
                    }
                }
                Token::LBracket => {
                    let key = match self.parse_expr()? {
                        Expr::Literal(s) | Expr::Ident(s) => s,
                        _ => String::new(),
                    };
                    self.expect(Token::RBracket, "`]`")?;
                    if let Some(value) = self.parse_property_value(&key)? {
                        if !key.is_empty() {
                            props.push(Property { key, line, value });
                        }
                    }
                }
                Token::Eof => {
                    return Err(ParseError::Unexpected(Token::Eof, line, "`}`"));
                }
                tok => return Err(ParseError::Unexpected(tok, line, "property")),
            }
        }

        Ok(Expr::Object(props))
    }

    /// Parse what follows a property key. Methods and accessors yield `None`.
    fn parse_property_value(&mut self, key: &str) -> Result<Option<Expr>, ParseError> {
        if self.check_op("?") || self.check_op("!") {
            self.advance();
        }
        match self.peek().clone() {
            Token::Colon => {
                self.advance();
                Ok(Some(self.parse_expr()?))
            }
            Token::Comma | Token::RBrace => Ok(Some(Expr::Ident(key.to_string()))),
            Token::Op(op) if op == "=" => {
                self.advance();
                self.parse_expr()?;
                Ok(Some(Expr::Ident(key.to_string())))
            }
            Token::LParen => {
                self.skip_until_block();
                Ok(None)
            }
            // get/set/async modifiers before a method name
            Token::Ident(_) | Token::Op(_) if matches!(key, "get" | "set" | "async") => {
                self.skip_until_block();
                Ok(None)
            }
            tok => Err(ParseError::Unexpected(tok, self.line(), "`:` after property key")),
        }
    }

    fn parse_array(&mut self) -> Result<Expr, ParseError> {
        self.expect(Token::LBracket, "`[`")?;
        let mut items = Vec::new();

        loop {
            match self.peek() {
                Token::RBracket => {
                    self.advance();
                    break;
                }
                Token::Comma | Token::Spread => {
                    self.advance();
                }
                _ => items.push(self.parse_expr()?),
            }
        }

        Ok(Expr::Array(items))
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(Token::LParen, "`(`")?;
        let mut args = Vec::new();

        loop {
            match self.peek() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Comma | Token::Spread => {
                    self.advance();
                }
                _ => args.push(self.parse_expr()?),
            }
        }

        Ok(args)
    }

    /// Consume one bracketed group, nested groups included.
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.advance() {
                Token::LParen | Token::LBrace | Token::LBracket => depth += 1,
                Token::RParen | Token::RBrace | Token::RBracket => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                Token::Eof => return,
                _ => {}
            }
            if depth == 0 {
                return;
            }
        }
    }

    /// Skip a function, class or method head up to and including its body.
    fn skip_until_block(&mut self) {
        while !matches!(self.peek(), Token::LBrace | Token::Eof) {
            if matches!(self.peek(), Token::LParen | Token::LBracket) {
                self.skip_balanced();
            } else {
                self.advance();
            }
        }
        self.skip_balanced();
    }

    /// Skip a type annotation, stopping before `=`, `,`, `;` or a closing
    /// bracket at the outer level.
    fn skip_type(&mut self) {
        let mut angle = 0usize;
        loop {
            match self.peek() {
                Token::Eof | Token::Semicolon | Token::RParen | Token::RBrace | Token::RBracket => {
                    return;
                }
                Token::Comma if angle == 0 => return,
                Token::Op(op) if op == "=" && angle == 0 => return,
                Token::Ident(kw)
                    if angle == 0 && self.at_line_start() && is_statement_keyword(kw) =>
                {
                    return;
                }
                Token::LParen | Token::LBrace | Token::LBracket => self.skip_balanced(),
                Token::Op(op) => {
                    let opens = op.matches('<').count();
                    let closes = op.matches('>').count();
                    angle = (angle + opens).saturating_sub(closes);
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// At `<`, try to consume `<...>` type arguments directly followed by a
    /// call. Restores the position and returns false otherwise.
    fn skip_type_arguments(&mut self) -> bool {
        let start = self.pos;
        let mut angle = 0usize;

        loop {
            match self.peek().clone() {
                Token::Op(op) if op.chars().all(|c| c == '<' || c == '>') => {
                    let opens = op.matches('<').count();
                    let closes = op.matches('>').count();
                    self.advance();
                    if closes > angle + opens {
                        break;
                    }
                    angle = angle + opens - closes;
                    if angle == 0 {
                        if *self.peek() == Token::LParen {
                            return true;
                        }
                        break;
                    }
                }
                Token::Ident(_) | Token::Dot | Token::Comma | Token::Str(_) | Token::Num(_) => {
                    self.advance();
                }
                Token::LBrace | Token::LBracket => self.skip_balanced(),
                Token::Op(op) if op == "|" || op == "&" => {
                    self.advance();
                }
                _ => break,
            }
        }

        self.pos = start;
        false
    }

    /// Skip `@name`, `@a.b` or `@name(...)`.
    fn skip_decorator(&mut self) {
        self.advance();
        if matches!(self.peek(), Token::Ident(_)) {
            self.advance();
        }
        while *self.peek() == Token::Dot {
            self.advance();
            if matches!(self.peek(), Token::Ident(_)) {
                self.advance();
            }
        }
        if *self.peek() == Token::LParen {
            self.skip_balanced();
        }
    }

    /// Skip a statement this parser does not model.
    fn skip_statement(&mut self) {
        let start = self.pos;
        let mut depth = 0usize;

        loop {
            match self.peek() {
                Token::Eof => return,
                Token::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                Token::Ident(kw)
                    if depth == 0
                        && self.pos > start
                        && self.at_line_start()
                        && is_statement_keyword(kw) =>
                {
                    return;
                }
                Token::LParen | Token::LBrace | Token::LBracket => {
                    depth += 1;
                    self.advance();
                }
                Token::RParen | Token::RBrace | Token::RBracket => {
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn is_statement_keyword(word: &str) -> bool {
    STATEMENT_KEYWORDS.contains(&word)
}
