//! Expression parser - PEST grammar plus a Pratt operator table
//!
//! Produces the raw AST, which `fixup` then normalizes. The operator table
//! lives in an [`ExpressionParser`] value that is built once and shared; there
//! is no global parser state.

use std::fmt;

use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::executor::types::values::parse_radix;
use crate::executor::types::{
    AssignOp, BinaryOp, Node, Property, TemplateElement, UnaryOp, UpdateOp, Value,
};

pub mod fixup;
pub mod references;


pub use fixup::fixup_expression;
pub use references::find_referenced_variables;

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "parser/expression.pest"]
struct ExpressionGrammar;

/* ===================== Error Types ===================== */

/// Location in the source text; `line` and `column` are 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Byte offset
    pub offset: usize,
    pub line: usize,
    /// Column in characters
    pub column: usize,
}

impl SourcePosition {
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;

        for (index, ch) in source.char_indices() {
            if index >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} ({position})")]
pub struct SyntaxError {
    pub message: String,
    pub position: SourcePosition,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, source: &str, offset: usize) -> Self {
        Self {
            message: message.into(),
            position: SourcePosition::from_offset(source, offset),
        }
    }
}

pub type ParseResult<T> = Result<T, SyntaxError>;

/// Symbols reported as "after operator" when input ends right behind them
const TRAILING_OPERATORS: &[&str] = &[
    "**=", "<<=", ">>=", "&&=", "||=", "??=", "===", "!==", "++", "--", "**", "<<", ">>", "<=",
    ">=", "==", "!=", "&&", "||", "??", "+=", "-=", "*=", "/=", "%=", "&=", "^=", "|=", "+", "-",
    "*", "/", "%", "&", "|", "^", "<", ">", "=", "!", "~", "?", ":",
];

/// Translate a PEST failure into a message about the construct that failed
fn translate_pest_error(source: &str, err: pest::error::Error<Rule>) -> SyntaxError {
    let offset = match err.location {
        pest::error::InputLocation::Pos(pos) => pos,
        pest::error::InputLocation::Span((start, _)) => start,
    };
    trace!(offset, error = %err, "pest error");

    // an open quote swallows the rest of the input, wherever pest gave up
    if let OpenDelimiter::Quote(quote) = scan_open_delimiters(source) {
        return SyntaxError::new(
            format!("Unterminated string literal, expected {}", quote),
            source,
            source.len(),
        );
    }

    let offset = offset.min(source.len());
    let rest = source.get(offset..).unwrap_or_default();

    let Some(unexpected) = rest.trim_start().chars().next() else {
        return end_of_input_error(source);
    };
    let token_offset = offset + (rest.len() - rest.trim_start().len());
    SyntaxError::new(format!("Unexpected token '{}'", unexpected), source, token_offset)
}

fn end_of_input_error(source: &str) -> SyntaxError {
    let before = source.trim_end();
    let end = source.len();

    if let Some(op) = TRAILING_OPERATORS.iter().find(|op| before.ends_with(**op)) {
        return SyntaxError::new(
            format!("Unexpected end of input after operator '{}'", op),
            source,
            end,
        );
    }

    let message = match scan_open_delimiters(source) {
        OpenDelimiter::Bracket(close) => format!("Expected '{}'", close),
        _ => "Unexpected end of input".to_string(),
    };
    SyntaxError::new(message, source, end)
}

#[derive(Debug, Clone, Copy)]
enum OpenDelimiter {
    None,
    Quote(char),
    Bracket(char),
}

/// Innermost delimiter still open at the end of the source
fn scan_open_delimiters(source: &str) -> OpenDelimiter {
    let mut stack: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = source.chars();

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            match ch {
                '\\' => {
                    chars.next();
                }
                c if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            '(' => stack.push(')'),
            '[' => stack.push(']'),
            '{' => stack.push('}'),
            ')' | ']' | '}' => {
                stack.pop();
            }
            _ => {}
        }
    }

    match (quote, stack.last()) {
        (Some(q), _) => OpenDelimiter::Quote(q),
        (None, Some(close)) => OpenDelimiter::Bracket(*close),
        (None, None) => OpenDelimiter::None,
    }
}

/* ===================== Public API ===================== */

/// Expression parser holding the operator precedence table
///
/// Build once and share; parsing takes `&self` and the parser is
/// `Send + Sync`.
pub struct ExpressionParser {
    pratt: PrattParser<Rule>,
}

impl Default for ExpressionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExpressionParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionParser").finish_non_exhaustive()
    }
}

impl ExpressionParser {
    pub fn new() -> Self {
        // lowest precedence first
        let pratt = PrattParser::new()
            .op(Op::infix(Rule::assign_op, Assoc::Right))
            .op(Op::infix(Rule::conditional_op, Assoc::Right))
            .op(Op::infix(Rule::nullish, Assoc::Left) | Op::infix(Rule::logical_or, Assoc::Left))
            .op(Op::infix(Rule::logical_and, Assoc::Left))
            .op(Op::infix(Rule::bit_or, Assoc::Left))
            .op(Op::infix(Rule::bit_xor, Assoc::Left))
            .op(Op::infix(Rule::bit_and, Assoc::Left))
            .op(Op::infix(Rule::strict_eq, Assoc::Left)
                | Op::infix(Rule::strict_ne, Assoc::Left)
                | Op::infix(Rule::loose_eq, Assoc::Left)
                | Op::infix(Rule::loose_ne, Assoc::Left))
            .op(Op::infix(Rule::lt, Assoc::Left)
                | Op::infix(Rule::gt, Assoc::Left)
                | Op::infix(Rule::le, Assoc::Left)
                | Op::infix(Rule::ge, Assoc::Left))
            .op(Op::infix(Rule::shl, Assoc::Left) | Op::infix(Rule::shr, Assoc::Left))
            .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
            .op(Op::infix(Rule::mul, Assoc::Left)
                | Op::infix(Rule::div, Assoc::Left)
                | Op::infix(Rule::rem, Assoc::Left))
            .op(Op::infix(Rule::pow, Assoc::Right))
            .op(Op::prefix(Rule::pre_increment)
                | Op::prefix(Rule::pre_decrement)
                | Op::prefix(Rule::logical_not)
                | Op::prefix(Rule::bitwise_not)
                | Op::prefix(Rule::negate)
                | Op::prefix(Rule::unary_plus))
            .op(Op::postfix(Rule::post_increment) | Op::postfix(Rule::post_decrement));

        Self { pratt }
    }

    /// Parse and normalize an expression
    pub fn parse(&self, source: &str) -> ParseResult<Node> {
        let raw = self.parse_raw(source)?;
        let node = fixup_expression(raw);
        debug!(kind = node.kind(), "parsed expression");
        Ok(node)
    }

    /// Parse without normalization
    ///
    /// The raw tree may still contain `Binary` assignments, `return` calls
    /// and other shapes only the normalizer resolves.
    pub fn parse_raw(&self, source: &str) -> ParseResult<Node> {
        trace!(len = source.len(), "parsing expression");
        let mut pairs = ExpressionGrammar::parse(Rule::program, source)
            .map_err(|err| translate_pest_error(source, err))?;

        let builder = AstBuilder {
            pratt: &self.pratt,
            source,
        };
        let program = builder.next_pair(&mut pairs, "program", 0)?;

        let mut body = Vec::new();
        for pair in program.into_inner() {
            if pair.as_rule() == Rule::statement {
                body.push(builder.build_expression(pair)?);
            }
        }

        Ok(match body.len() {
            1 => body.remove(0),
            _ => Node::Compound { body },
        })
    }
}

/// Parse and normalize with a freshly built parser
///
/// Prefer keeping an [`ExpressionParser`] around when parsing many
/// expressions.
pub fn parse_expression(source: &str) -> ParseResult<Node> {
    ExpressionParser::new().parse(source)
}

/* ===================== AST Builder ===================== */

struct AstBuilder<'p, 's> {
    pratt: &'p PrattParser<Rule>,
    source: &'s str,
}

impl<'p, 's> AstBuilder<'p, 's> {
    fn error(&self, message: impl Into<String>, pair: &Pair<'s, Rule>) -> SyntaxError {
        SyntaxError::new(message, self.source, pair.as_span().start())
    }

    fn next_pair(
        &self,
        pairs: &mut Pairs<'s, Rule>,
        what: &str,
        offset: usize,
    ) -> ParseResult<Pair<'s, Rule>> {
        pairs
            .next()
            .ok_or_else(|| SyntaxError::new(format!("Expected {}", what), self.source, offset))
    }

    fn build_expression(&self, pair: Pair<'s, Rule>) -> ParseResult<Node> {
        self.pratt
            .map_primary(|primary| self.build_primary(primary))
            .map_prefix(|op, argument| {
                let argument = argument?;
                let operator = match op.as_rule() {
                    Rule::pre_increment => return self.build_update(UpdateOp::Increment, argument, true, &op),
                    Rule::pre_decrement => return self.build_update(UpdateOp::Decrement, argument, true, &op),
                    Rule::logical_not => UnaryOp::Not,
                    Rule::bitwise_not => UnaryOp::BitNot,
                    Rule::negate => UnaryOp::Neg,
                    _ => UnaryOp::Plus,
                };
                Ok(Node::Unary {
                    operator,
                    argument: Box::new(argument),
                    prefix: true,
                })
            })
            .map_postfix(|argument, op| {
                let operator = match op.as_rule() {
                    Rule::post_increment => UpdateOp::Increment,
                    _ => UpdateOp::Decrement,
                };
                self.build_update(operator, argument?, false, &op)
            })
            .map_infix(|left, op, right| {
                let left = left?;
                let right = right?;
                match op.as_rule() {
                    Rule::conditional_op => {
                        let consequent = self.next_pair(
                            &mut op.clone().into_inner(),
                            "expression after '?'",
                            op.as_span().start(),
                        )?;
                        Ok(Node::Conditional {
                            test: Box::new(left),
                            consequent: Box::new(self.build_expression(consequent)?),
                            alternate: Box::new(right),
                        })
                    }
                    _ => {
                        let operator = self.binary_operator(&op)?;
                        Ok(Node::Binary {
                            operator,
                            left: Box::new(left),
                            right: Box::new(right),
                        })
                    }
                }
            })
            .parse(pair.into_inner())
    }

    fn binary_operator(&self, op: &Pair<'s, Rule>) -> ParseResult<BinaryOp> {
        let symbol = op.as_str();
        if op.as_rule() == Rule::assign_op {
            return AssignOp::from_symbol(symbol)
                .map(BinaryOp::Assign)
                .ok_or_else(|| self.error(format!("Unexpected token '{}'", symbol), op));
        }
        BinaryOp::from_symbol(symbol)
            .ok_or_else(|| self.error(format!("Unexpected token '{}'", symbol), op))
    }

    fn build_update(
        &self,
        operator: UpdateOp,
        argument: Node,
        prefix: bool,
        op: &Pair<'s, Rule>,
    ) -> ParseResult<Node> {
        if !argument.is_assignable() {
            return Err(self.error(format!("Unexpected {}", operator.as_str()), op));
        }
        Ok(Node::Update {
            operator,
            argument: Box::new(argument),
            prefix,
        })
    }

    fn build_primary(&self, pair: Pair<'s, Rule>) -> ParseResult<Node> {
        match pair.as_rule() {
            Rule::bare_return => Ok(Node::identifier("return")),
            Rule::variable_ref => {
                let name = pair
                    .into_inner()
                    .next()
                    .map(|inner| inner.as_str().to_string())
                    .unwrap_or_default();
                Ok(Node::VariableRef { name })
            }
            Rule::unterminated_ref => Err(self.error("Unterminated variable reference", &pair)),
            Rule::accessor_chain => self.build_accessor_chain(pair),
            _ => self.build_atom(pair),
        }
    }

    fn build_accessor_chain(&self, pair: Pair<'s, Rule>) -> ParseResult<Node> {
        let start = pair.as_span().start();
        let mut inner = pair.into_inner();
        let mut node = self.build_atom(self.next_pair(&mut inner, "operand", start)?)?;

        for accessor in inner {
            node = match accessor.as_rule() {
                Rule::call_args => {
                    let Node::Identifier { name } = node else {
                        return Err(self.error("Only named functions can be called", &accessor));
                    };
                    let arguments = accessor
                        .into_inner()
                        .map(|arg| self.build_expression(arg))
                        .collect::<ParseResult<Vec<_>>>()?;
                    Node::Call {
                        callee: name,
                        arguments,
                    }
                }
                Rule::member_dot => {
                    let start = accessor.as_span().start();
                    let name = self.next_pair(&mut accessor.into_inner(), "property name", start)?;
                    Node::Member {
                        object: Box::new(node),
                        property: Box::new(Node::identifier(name.as_str())),
                        computed: false,
                    }
                }
                Rule::member_index => {
                    let start = accessor.as_span().start();
                    let index = self.next_pair(&mut accessor.into_inner(), "index", start)?;
                    Node::Member {
                        object: Box::new(node),
                        property: Box::new(self.build_expression(index)?),
                        computed: true,
                    }
                }
                _ => return Err(self.error("Unexpected accessor", &accessor)),
            };
        }

        Ok(node)
    }

    fn build_atom(&self, pair: Pair<'s, Rule>) -> ParseResult<Node> {
        match pair.as_rule() {
            Rule::group => {
                let start = pair.as_span().start();
                let inner = self.next_pair(&mut pair.into_inner(), "expression", start)?;
                self.build_expression(inner)
            }
            Rule::number => self.build_number(&pair),
            Rule::string => self.build_string(pair),
            Rule::template => self.build_template(pair),
            Rule::boolean => Ok(Node::Literal {
                value: Value::Bool(pair.as_str() == "true"),
                raw: pair.as_str().to_string(),
            }),
            Rule::null_lit => Ok(Node::Literal {
                value: Value::Null,
                raw: pair.as_str().to_string(),
            }),
            Rule::array => self.build_array(pair),
            Rule::object => self.build_object(pair),
            Rule::identifier => Ok(Node::identifier(pair.as_str())),
            rule => Err(self.error(format!("Unexpected {:?}", rule), &pair)),
        }
    }

    /* ===== Literals ===== */

    fn build_number(&self, pair: &Pair<'s, Rule>) -> ParseResult<Node> {
        let raw = pair.as_str();
        let digits: String = raw.chars().filter(|c| *c != '_').collect();

        let radix = match digits.get(..2) {
            Some("0x") | Some("0X") => Some(16),
            Some("0b") | Some("0B") => Some(2),
            Some("0o") | Some("0O") => Some(8),
            _ => None,
        };
        let value = match radix {
            Some(radix) => parse_radix(&digits[2..], radix),
            None => digits.parse::<f64>().ok(),
        };

        let value = value.ok_or_else(|| self.error(format!("Invalid number '{}'", raw), pair))?;
        Ok(Node::Literal {
            value: Value::Number(value),
            raw: raw.to_string(),
        })
    }

    fn build_string(&self, pair: Pair<'s, Rule>) -> ParseResult<Node> {
        let raw = pair.as_str().to_string();
        let start = pair.as_span().start();
        let body = self.next_pair(&mut pair.into_inner(), "string contents", start)?;
        let value = self.unescape(&body)?;
        Ok(Node::Literal {
            value: Value::String(value),
            raw,
        })
    }

    fn unescape(&self, pair: &Pair<'s, Rule>) -> ParseResult<String> {
        let text = pair.as_str();
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            let Some(escaped) = chars.next() else {
                break;
            };
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                'v' => out.push('\u{b}'),
                '0' => out.push('\0'),
                'x' => {
                    let hex: String = chars.by_ref().take(2).collect();
                    out.push(self.code_point(&hex, pair)?);
                }
                'u' => {
                    let hex: String = if chars.peek() == Some(&'{') {
                        chars.next();
                        chars.by_ref().take_while(|c| *c != '}').collect()
                    } else {
                        chars.by_ref().take(4).collect()
                    };
                    out.push(self.code_point(&hex, pair)?);
                }
                // line continuation
                '\n' => {}
                other => out.push(other),
            }
        }

        Ok(out)
    }

    fn code_point(&self, hex: &str, pair: &Pair<'s, Rule>) -> ParseResult<char> {
        u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(format!("Invalid escape sequence '{}'", hex), pair))
    }

    /// Template quasis always number one more than the expressions
    fn build_template(&self, pair: Pair<'s, Rule>) -> ParseResult<Node> {
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        let mut current = String::new();

        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::template_chars => current.push_str(part.as_str()),
                Rule::template_subst => {
                    let start = part.as_span().start();
                    let expression = self.next_pair(&mut part.into_inner(), "expression", start)?;
                    quasis.push(TemplateElement {
                        raw: std::mem::take(&mut current),
                        tail: false,
                    });
                    expressions.push(self.build_expression(expression)?);
                }
                _ => return Err(self.error("Unexpected template content", &part)),
            }
        }
        quasis.push(TemplateElement {
            raw: current,
            tail: true,
        });

        Ok(Node::TemplateLiteral {
            quasis,
            expressions,
        })
    }

    /// `[1, , 3]` keeps the hole as `None`; a trailing comma adds nothing
    fn build_array(&self, pair: Pair<'s, Rule>) -> ParseResult<Node> {
        let mut elements = Vec::new();
        let mut expecting_element = true;

        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::array_comma => {
                    if expecting_element {
                        elements.push(None);
                    }
                    expecting_element = true;
                }
                _ => {
                    elements.push(Some(self.build_expression(part)?));
                    expecting_element = false;
                }
            }
        }

        Ok(Node::Array { elements })
    }

    fn build_object(&self, pair: Pair<'s, Rule>) -> ParseResult<Node> {
        let mut properties = Vec::new();

        for property in pair.into_inner() {
            let start = property.as_span().start();
            let mut inner = property.into_inner();
            let key_pair = self.next_pair(&mut inner, "property key", start)?;
            let mut computed = false;

            let key = match key_pair.as_rule() {
                Rule::shorthand => {
                    let name = key_pair.as_str();
                    properties.push(Property {
                        key: Node::identifier(name),
                        value: Node::identifier(name),
                        computed: false,
                    });
                    continue;
                }
                Rule::key_name => Node::identifier(key_pair.as_str()),
                Rule::computed_key => {
                    let start = key_pair.as_span().start();
                    let expression = self.next_pair(&mut key_pair.into_inner(), "key", start)?;
                    computed = true;
                    self.build_expression(expression)?
                }
                Rule::string => self.build_string(key_pair)?,
                _ => self.build_number(&key_pair)?,
            };
            let value = self.build_expression(self.next_pair(&mut inner, "property value", start)?)?;
            properties.push(Property {
                key,
                value,
                computed,
            });
        }

        Ok(Node::Object { properties })
    }
}
