//! The bundled recursive-descent parser (§6.2 external collaborator).
//!
//! The specification treats the parser as swappable — "a faithful implementation
//! could substitute any reasonable parser generator; the AST shape is the contract" —
//! so this module is a plain hand-written lexer plus recursive-descent parser rather
//! than a `lalrpop`/`pest` grammar, kept entirely behind the `parse`/`parse_template`
//! contract so a future grammar-generator-based parser could replace it without
//! touching anything downstream.
//!
//! `use` takes an optional second identifier naming the library to bind, e.g.
//! `use math, Math;`; `use math;` alone capitalizes the first letter of the bound
//! identifier to find the library name, so `use math;` resolves `Math`.

mod lexer;

use lexer::{Lexer, Token};

use crate::ast::{BinOp, CastType, IdentifierInfo, MapEntry, Node, NodeKind, UnaryOp};
use crate::error::ParseErrorKind;
use crate::scope::hash_identifier;
use crate::string::{StringType, TangString};

/// The parser's result type: always a single root node, either a `Block` or a
/// `ParseError` singleton (§6.2).
pub type ParseOutcome = Node;

type PResult<T> = Result<T, ParseErrorKind>;

/// Parses `source` as a plain script: the whole input is Tang code.
pub fn parse(source: &str) -> ParseOutcome {
    let tokens = match Lexer::new(source).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => return Node::parse_error(e),
    };
    let mut p = Parser::new(tokens);
    match p.parse_program() {
        Ok(node) => node,
        Err(e) => Node::parse_error(e),
    }
}

/// Parses `source` as a template document: text outside `<%` … `%>` markers is
/// emitted verbatim (as an implicit `print`), text inside is Tang code (§6.2).
pub fn parse_template(source: &str) -> ParseOutcome {
    match parse_template_inner(source) {
        Ok(node) => node,
        Err(e) => Node::parse_error(e),
    }
}

fn parse_template_inner(source: &str) -> PResult<Node> {
    let mut statements = Vec::new();
    let mut rest = source;
    loop {
        match rest.find("<%") {
            None => {
                if !rest.is_empty() {
                    statements.push(literal_print(rest));
                }
                break;
            }
            Some(start) => {
                if start > 0 {
                    statements.push(literal_print(&rest[..start]));
                }
                let after_open = &rest[start + 2..];
                let Some(end) = after_open.find("%>") else {
                    return Err(ParseErrorKind::Message("unterminated '<%' template tag".to_string()));
                };
                let code = &after_open[..end];
                let tokens = Lexer::new(code).tokenize()?;
                let mut p = Parser::new(tokens);
                statements.extend(p.parse_statements_until_eof()?);
                rest = &after_open[end + 2..];
            }
        }
    }
    Ok(Node::new(NodeKind::Block(statements)))
}

fn literal_print(text: &str) -> Node {
    Node::new(NodeKind::Print(Box::new(Node::new(NodeKind::StringLiteral(TangString::new(
        text.to_string(),
        StringType::Trusted,
    ))))))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse_program(&mut self) -> PResult<Node> {
        let statements = self.parse_statements_until_eof()?;
        Ok(Node::new(NodeKind::Block(statements)))
    }

    fn parse_statements_until_eof(&mut self) -> PResult<Vec<Node>> {
        let mut statements = Vec::new();
        while !self.at(&Token::Eof) {
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    // --- token stream helpers -------------------------------------------------

    fn peek(&self) -> &Token {
        const EOF: Token = Token::Eof;
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    fn at(&self, t: &Token) -> bool {
        self.peek() == t
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, t: &Token) -> PResult<()> {
        if self.at(t) {
            self.advance();
            Ok(())
        } else {
            Err(ParseErrorKind::Message(format!("expected {t:?}, found {:?}", self.peek())))
        }
    }

    fn eat_ident(&mut self) -> PResult<String> {
        match self.advance() {
            Token::Identifier(s) => Ok(s),
            other => Err(ParseErrorKind::Message(format!("expected identifier, found {other:?}"))),
        }
    }

    // --- statements ------------------------------------------------------------

    fn statement(&mut self) -> PResult<Node> {
        match self.peek() {
            Token::Global => self.global_statement(),
            Token::Use => self.use_statement(),
            Token::If => self.if_statement(),
            Token::While => self.while_statement(),
            Token::Do => self.do_while_statement(),
            Token::For => self.for_statement(),
            Token::Break => {
                self.advance();
                self.eat(&Token::Semicolon)?;
                Ok(Node::new(NodeKind::Break))
            }
            Token::Continue => {
                self.advance();
                self.eat(&Token::Semicolon)?;
                Ok(Node::new(NodeKind::Continue))
            }
            Token::Return => {
                self.advance();
                let value = if self.at(&Token::Semicolon) { None } else { Some(Box::new(self.expression()?)) };
                self.eat(&Token::Semicolon)?;
                Ok(Node::new(NodeKind::Return(value)))
            }
            Token::Print => {
                self.advance();
                self.eat(&Token::LParen)?;
                let expr = self.expression()?;
                self.eat(&Token::RParen)?;
                self.eat(&Token::Semicolon)?;
                Ok(Node::new(NodeKind::Print(Box::new(expr))))
            }
            Token::Function => self.function_statement(),
            Token::LBrace => self.block(),
            _ => {
                let expr = self.expression()?;
                self.eat(&Token::Semicolon)?;
                Ok(expr)
            }
        }
    }

    fn block(&mut self) -> PResult<Node> {
        self.eat(&Token::LBrace)?;
        let mut statements = Vec::new();
        while !self.at(&Token::RBrace) {
            if self.at(&Token::Eof) {
                return Err(ParseErrorKind::Message("unterminated block".to_string()));
            }
            statements.push(self.statement()?);
        }
        self.eat(&Token::RBrace)?;
        Ok(Node::new(NodeKind::Block(statements)))
    }

    fn global_statement(&mut self) -> PResult<Node> {
        self.advance();
        let name = self.eat_ident()?;
        let initializer = if self.at(&Token::Assign) {
            self.advance();
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        self.eat(&Token::Semicolon)?;
        let hash = hash_identifier(&name);
        Ok(Node::new(NodeKind::Global { name, hash, initializer }))
    }

    /// `use IDENT (',' IDENT)? ';'`; with one identifier the library name is the
    /// identifier with its first letter capitalized (`use math;` binds `Math`).
    fn use_statement(&mut self) -> PResult<Node> {
        self.advance();
        let identifier = self.eat_ident()?;
        let library_name = if self.at(&Token::Comma) {
            self.advance();
            self.eat_ident()?
        } else {
            capitalize(&identifier)
        };
        self.eat(&Token::Semicolon)?;
        Ok(Node::new(NodeKind::Use { identifier, library_name }))
    }

    fn if_statement(&mut self) -> PResult<Node> {
        self.advance();
        self.eat(&Token::LParen)?;
        let cond = self.expression()?;
        self.eat(&Token::RParen)?;
        let if_block = self.block()?;
        let else_block = if self.at(&Token::Else) {
            self.advance();
            if self.at(&Token::If) {
                Some(Box::new(self.if_statement()?))
            } else {
                Some(Box::new(self.block()?))
            }
        } else {
            None
        };
        Ok(Node::new(NodeKind::IfElse {
            cond: Box::new(cond),
            if_block: Box::new(if_block),
            else_block,
        }))
    }

    fn while_statement(&mut self) -> PResult<Node> {
        self.advance();
        self.eat(&Token::LParen)?;
        let cond = self.expression()?;
        self.eat(&Token::RParen)?;
        let body = self.block()?;
        Ok(Node::new(NodeKind::While { cond: Box::new(cond), body: Box::new(body) }))
    }

    fn do_while_statement(&mut self) -> PResult<Node> {
        self.advance();
        let body = self.block()?;
        self.eat(&Token::While)?;
        self.eat(&Token::LParen)?;
        let cond = self.expression()?;
        self.eat(&Token::RParen)?;
        self.eat(&Token::Semicolon)?;
        Ok(Node::new(NodeKind::DoWhile { cond: Box::new(cond), body: Box::new(body) }))
    }

    /// Disambiguates `for (IDENT in expr) block` from the three-clause C-style form
    /// by looking one token past a leading identifier for the `in` keyword.
    fn for_statement(&mut self) -> PResult<Node> {
        self.advance();
        self.eat(&Token::LParen)?;
        if let Token::Identifier(name) = self.peek().clone() {
            if self.tokens.get(self.pos + 1) == Some(&Token::In) {
                self.advance();
                self.advance();
                let iterable = self.expression()?;
                self.eat(&Token::RParen)?;
                let body = self.block()?;
                let var_hash = hash_identifier(&name);
                return Ok(Node::new(NodeKind::RangedFor {
                    var_name: name,
                    var_hash,
                    var_slot: None,
                    iterable: Box::new(iterable),
                    body: Box::new(body),
                }));
            }
        }
        let init = if self.at(&Token::Semicolon) { None } else { Some(Box::new(self.expression()?)) };
        self.eat(&Token::Semicolon)?;
        let cond = if self.at(&Token::Semicolon) { None } else { Some(Box::new(self.expression()?)) };
        self.eat(&Token::Semicolon)?;
        let step = if self.at(&Token::RParen) { None } else { Some(Box::new(self.expression()?)) };
        self.eat(&Token::RParen)?;
        let body = self.block()?;
        Ok(Node::new(NodeKind::For { init, cond, step, body: Box::new(body) }))
    }

    fn function_statement(&mut self) -> PResult<Node> {
        self.advance();
        let name = self.eat_ident()?;
        self.eat(&Token::LParen)?;
        let mut params = Vec::new();
        if !self.at(&Token::RParen) {
            loop {
                params.push(self.eat_ident()?);
                if self.at(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.eat(&Token::RParen)?;
        let body_block = self.block()?;
        let body = match body_block.kind {
            NodeKind::Block(stmts) => stmts,
            _ => unreachable!("block() always returns NodeKind::Block"),
        };
        Ok(Node::new(NodeKind::Function { name, params, body, scope: None }))
    }

    // --- expressions, precedence climbing --------------------------------------

    fn expression(&mut self) -> PResult<Node> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<Node> {
        let target = self.ternary()?;
        if self.at(&Token::Assign) {
            if !is_assignable(&target.kind) {
                return Err(ParseErrorKind::Message("left-hand side of '=' is not assignable".to_string()));
            }
            self.advance();
            let value = self.assignment()?;
            return Ok(Node::new(NodeKind::Assign { target: Box::new(target), value: Box::new(value) }));
        }
        Ok(target)
    }

    fn ternary(&mut self) -> PResult<Node> {
        let cond = self.logic_or()?;
        if self.at(&Token::Question) {
            self.advance();
            let if_true = self.expression()?;
            self.eat(&Token::Colon)?;
            let if_false = self.expression()?;
            return Ok(Node::new(NodeKind::Ternary {
                cond: Box::new(cond),
                if_true: Box::new(if_true),
                if_false: Box::new(if_false),
            }));
        }
        Ok(cond)
    }

    fn logic_or(&mut self) -> PResult<Node> {
        let mut lhs = self.logic_and()?;
        while self.at(&Token::OrOr) {
            self.advance();
            let rhs = self.logic_and()?;
            lhs = Node::new(NodeKind::Binary { op: BinOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        Ok(lhs)
    }

    fn logic_and(&mut self) -> PResult<Node> {
        let mut lhs = self.equality()?;
        while self.at(&Token::AndAnd) {
            self.advance();
            let rhs = self.equality()?;
            lhs = Node::new(NodeKind::Binary { op: BinOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> PResult<Node> {
        let mut lhs = self.relational()?;
        loop {
            let op = match self.peek() {
                Token::EqualEqual => BinOp::Equal,
                Token::NotEqual => BinOp::NotEqual,
                _ => break,
            };
            self.advance();
            let rhs = self.relational()?;
            lhs = Node::new(NodeKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        Ok(lhs)
    }

    fn relational(&mut self) -> PResult<Node> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Token::Less => BinOp::LessThan,
                Token::LessEqual => BinOp::LessThanEqual,
                Token::Greater => BinOp::GreaterThan,
                Token::GreaterEqual => BinOp::GreaterThanEqual,
                _ => break,
            };
            self.advance();
            let rhs = self.additive()?;
            lhs = Node::new(NodeKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> PResult<Node> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = Node::new(NodeKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> PResult<Node> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                Token::Percent => BinOp::Modulo,
                _ => break,
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Node::new(NodeKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> PResult<Node> {
        match self.peek() {
            Token::Minus => {
                self.advance();
                let operand = self.unary()?;
                Ok(Node::new(NodeKind::Unary { op: UnaryOp::Negate, operand: Box::new(operand) }))
            }
            Token::Bang => {
                self.advance();
                let operand = self.unary()?;
                Ok(Node::new(NodeKind::Unary { op: UnaryOp::Not, operand: Box::new(operand) }))
            }
            Token::LParen => {
                if let Some(target) = self.try_cast_type() {
                    self.advance(); // '('
                    self.advance(); // cast keyword
                    self.eat(&Token::RParen)?;
                    let expr = self.unary()?;
                    return Ok(Node::new(NodeKind::Cast { expr: Box::new(expr), target }));
                }
                self.postfix()
            }
            _ => self.postfix(),
        }
    }

    /// Looks ahead for the `'(' cast-keyword ')'` shape without consuming anything.
    fn try_cast_type(&self) -> Option<CastType> {
        let target = match self.tokens.get(self.pos + 1)? {
            Token::IntKeyword => CastType::Int,
            Token::FloatKeyword => CastType::Float,
            Token::BoolKeyword => CastType::Bool,
            Token::StringKeyword => CastType::String,
            _ => return None,
        };
        if self.tokens.get(self.pos + 2) == Some(&Token::RParen) {
            Some(target)
        } else {
            None
        }
    }

    fn postfix(&mut self) -> PResult<Node> {
        let mut node = self.primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let name = self.eat_ident()?;
                    node = Node::new(NodeKind::Period { receiver: Box::new(node), name });
                }
                Token::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.at(&Token::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if self.at(&Token::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.eat(&Token::RParen)?;
                    node = Node::new(NodeKind::FunctionCall { callee: Box::new(node), args });
                }
                Token::LBracket => {
                    node = self.index_or_slice(node)?;
                }
                _ => break,
            }
        }
        Ok(node)
    }

    /// `'[' expr ']'` is an index; `'[' expr? ':' expr? (':' expr?)? ']'` is a slice
    /// (§3.3: start/end/skip are each optional).
    fn index_or_slice(&mut self, receiver: Node) -> PResult<Node> {
        self.advance(); // '['
        let start = if self.at(&Token::Colon) || self.at(&Token::RBracket) { None } else { Some(self.expression()?) };
        if !self.at(&Token::Colon) {
            self.eat(&Token::RBracket)?;
            let index = start.ok_or_else(|| ParseErrorKind::Message("empty index expression".to_string()))?;
            return Ok(Node::new(NodeKind::Index { receiver: Box::new(receiver), index: Box::new(index) }));
        }
        self.advance(); // ':'
        let end = if self.at(&Token::Colon) || self.at(&Token::RBracket) { None } else { Some(self.expression()?) };
        let skip = if self.at(&Token::Colon) {
            self.advance();
            if self.at(&Token::RBracket) { None } else { Some(self.expression()?) }
        } else {
            None
        };
        self.eat(&Token::RBracket)?;
        Ok(Node::new(NodeKind::Slice {
            receiver: Box::new(receiver),
            start: start.map(Box::new),
            end: end.map(Box::new),
            skip: skip.map(Box::new),
        }))
    }

    fn primary(&mut self) -> PResult<Node> {
        match self.advance() {
            Token::Integer(i) => Ok(Node::new(NodeKind::Integer(i))),
            Token::Float(f) => Ok(Node::new(NodeKind::Float(f))),
            Token::StringLit(s) => Ok(Node::new(NodeKind::StringLiteral(TangString::new(s, StringType::Trusted)))),
            Token::True => Ok(Node::new(NodeKind::Boolean(true))),
            Token::False => Ok(Node::new(NodeKind::Boolean(false))),
            Token::Null => Ok(Node::new(NodeKind::Null)),
            Token::Identifier(name) => {
                let hash = hash_identifier(&name);
                Ok(Node::new(NodeKind::Identifier(IdentifierInfo { name, hash, resolved: None, mangled_name: None })))
            }
            Token::LParen => {
                let expr = self.expression()?;
                self.eat(&Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if !self.at(&Token::RBracket) {
                    loop {
                        items.push(self.expression()?);
                        if self.at(&Token::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.eat(&Token::RBracket)?;
                Ok(Node::new(NodeKind::Array(items)))
            }
            Token::LBrace => {
                let mut entries = Vec::new();
                if !self.at(&Token::RBrace) {
                    loop {
                        let key = match self.advance() {
                            Token::StringLit(s) => s,
                            Token::Identifier(s) => s,
                            other => return Err(ParseErrorKind::Message(format!("expected map key, found {other:?}"))),
                        };
                        self.eat(&Token::Colon)?;
                        let value = self.expression()?;
                        entries.push(MapEntry { key, value });
                        if self.at(&Token::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.eat(&Token::RBrace)?;
                Ok(Node::new(NodeKind::Map(entries)))
            }
            other => Err(ParseErrorKind::Message(format!("unexpected token {other:?}"))),
        }
    }
}

fn is_assignable(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Identifier(_) | NodeKind::Index { .. } | NodeKind::Period { .. })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_statements(source: &str) -> Vec<NodeKind> {
        let node = parse(source);
        match node.kind {
            NodeKind::Block(stmts) => stmts.into_iter().map(|s| s.kind).collect(),
            other => panic!("expected a Block root, got {other:?}"),
        }
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let stmts = root_statements("3 + 4 * 2;");
        assert_eq!(stmts.len(), 1);
        assert!(matches!(&stmts[0], NodeKind::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn parses_assignment_chain() {
        let stmts = root_statements("a = 5; a = a + 1; a;");
        assert_eq!(stmts.len(), 3);
        assert!(matches!(&stmts[1], NodeKind::Assign { .. }));
    }

    #[test]
    fn parses_if_else() {
        let stmts = root_statements(r#"if (1 < 2) { "yes"; } else { "no"; }"#);
        assert!(matches!(&stmts[0], NodeKind::IfElse { else_block: Some(_), .. }));
    }

    #[test]
    fn parses_use_with_single_identifier_capitalizing_library_name() {
        let stmts = root_statements("use math; math.pi;");
        match &stmts[0] {
            NodeKind::Use { identifier, library_name } => {
                assert_eq!(identifier, "math");
                assert_eq!(library_name, "Math");
            }
            other => panic!("expected Use, got {other:?}"),
        }
    }

    #[test]
    fn parses_while_loop() {
        let stmts = root_statements("i = 0; while (i < 3) { i = i + 1; } i;");
        assert!(matches!(&stmts[1], NodeKind::While { .. }));
    }

    #[test]
    fn malformed_input_yields_parse_error_node() {
        let node = parse("1 +;");
        assert!(node.is_parse_error());
    }

    #[test]
    fn parses_function_declaration() {
        let stmts = root_statements("function add(a, b) { return a + b; }");
        match &stmts[0] {
            NodeKind::Function { name, params, body, .. } => {
                assert_eq!(name, "add");
                assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected Function, got {other:?}"),
        }
    }

    #[test]
    fn template_mode_wraps_literal_text_in_print() {
        let node = parse_template("hi <% print(\"x\"); %> bye");
        match node.kind {
            NodeKind::Block(stmts) => assert_eq!(stmts.len(), 3),
            other => panic!("expected Block, got {other:?}"),
        }
    }
}
