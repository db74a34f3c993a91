use std::collections::HashMap;
use std::time::Instant;

use pest::error::{Error, ErrorVariant};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use tracing::debug;

use super::ast::*;
use crate::runner::eval::compiled::CompiledExpression;
use crate::runner::plugin::config::EngineConfig;

#[derive(Parser)]
#[grammar = "parser/expr_grammar.pest"] // relative to src
pub struct ExprParser;

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("syntax error: {0}")]
    Syntax(#[from] Box<Error<Rule>>),

    #[error("invalid literal '{literal}' at {start}..{end}: {reason}")]
    InvalidLiteral {
        literal: String,
        start: usize,
        end: usize,
        reason: String,
    },
}

impl From<Error<Rule>> for ParseError {
    fn from(err: Error<Rule>) -> Self {
        ParseError::Syntax(Box::new(err))
    }
}

lazy_static! {
    /// Binary operator tokens, lowercased. Textual and symbolic spellings
    /// map to the same operator.
    static ref BINARY_OPERATORS: HashMap<&'static str, BinaryOperator> = {
        let mut m = HashMap::new();
        m.insert("or", BinaryOperator::Or);
        m.insert("||", BinaryOperator::Or);
        m.insert("and", BinaryOperator::And);
        m.insert("&&", BinaryOperator::And);
        m.insert("==", BinaryOperator::Equal);
        m.insert("eq", BinaryOperator::Equal);
        m.insert("!=", BinaryOperator::NotEqual);
        m.insert("ne", BinaryOperator::NotEqual);
        m.insert("<", BinaryOperator::LessThan);
        m.insert("lt", BinaryOperator::LessThan);
        m.insert("<=", BinaryOperator::LessThanEqual);
        m.insert("le", BinaryOperator::LessThanEqual);
        m.insert(">", BinaryOperator::GreaterThan);
        m.insert("gt", BinaryOperator::GreaterThan);
        m.insert(">=", BinaryOperator::GreaterThanEqual);
        m.insert("ge", BinaryOperator::GreaterThanEqual);
        m.insert("+", BinaryOperator::Add);
        m.insert("-", BinaryOperator::Subtract);
        m.insert("*", BinaryOperator::Multiply);
        m.insert("/", BinaryOperator::Divide);
        m.insert("div", BinaryOperator::Divide);
        m.insert("%", BinaryOperator::Remainder);
        m.insert("mod", BinaryOperator::Remainder);
        m
    };
}

impl ExprParser {
    /// Parse and wrap in a reusable expression with the default configuration.
    pub fn parse_expression(source: &str) -> Result<CompiledExpression, ParseError> {
        Self::parse_expression_with_config(source, &EngineConfig::default())
    }

    pub fn parse_expression_with_config(
        source: &str,
        config: &EngineConfig,
    ) -> Result<CompiledExpression, ParseError> {
        let ast = Self::parse_to_ast(source)?;
        Ok(CompiledExpression::new(source, ast, config.resolution_cache))
    }

    pub fn parse_to_ast(source: &str) -> Result<ExprNode, ParseError> {
        let start = Instant::now();
        let mut pairs = ExprParser::parse(Rule::expression, source)?;
        let expression = pairs
            .next()
            .ok_or_else(|| Error::new_from_pos(
                ErrorVariant::CustomError {
                    message: "empty parse".to_string(),
                },
                pest::Position::from_start(source),
            ))?;
        let mut builder = AstBuilder::default();
        let root = match expression.into_inner().next() {
            Some(pair) => builder.build(pair)?,
            None => {
                return Err(Error::new_from_pos(
                    ErrorVariant::CustomError {
                        message: "expected an expression".to_string(),
                    },
                    pest::Position::from_start(source),
                )
                .into())
            }
        };
        debug!(
            nodes = builder.next_id,
            micros = start.elapsed().as_micros() as u64,
            "expression parsed"
        );
        Ok(root)
    }
}

fn get_unexpected_error(id: i32, pair: &Pair<Rule>) -> ParseError {
    let message = format!("Unexpected state reached [{:?}] - {}", pair.as_rule(), id);
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span()).into()
}

fn meta_of(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
    }
}

fn invalid_literal(pair: &Pair<Rule>, reason: impl ToString) -> ParseError {
    let span = pair.as_span();
    ParseError::InvalidLiteral {
        literal: pair.as_str().to_string(),
        start: span.start(),
        end: span.end(),
        reason: reason.to_string(),
    }
}

/// Builds nodes from the pest tree, numbering them in construction order.
#[derive(Default)]
struct AstBuilder {
    next_id: u32,
}

impl AstBuilder {
    fn node(&mut self, meta: Meta, kind: ExprKind) -> ExprNode {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        ExprNode { id, meta, kind }
    }

    fn build(&mut self, pair: Pair<Rule>) -> Result<ExprNode, ParseError> {
        match pair.as_rule() {
            Rule::assignment => self.build_assignment(pair),
            Rule::ternary => self.build_ternary(pair),
            Rule::logical_or
            | Rule::logical_and
            | Rule::relational
            | Rule::additive
            | Rule::multiplicative => self.build_binary(pair),
            Rule::unary => self.build_unary(pair),
            Rule::primary => self.build_primary(pair),
            Rule::parenthesised => match pair.clone().into_inner().next() {
                Some(inner) => self.build(inner),
                None => Err(get_unexpected_error(1, &pair)),
            },
            Rule::inline_list => {
                let meta = meta_of(&pair);
                let items = pair
                    .into_inner()
                    .map(|p| self.build(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.node(meta, ExprKind::InlineList(items)))
            }
            Rule::variable => {
                let meta = meta_of(&pair);
                let name = identifier_of(&pair)?;
                Ok(self.node(meta, ExprKind::VariableReference(name)))
            }
            Rule::property => {
                let meta = meta_of(&pair);
                let name = identifier_of(&pair)?;
                Ok(self.node(meta, ExprKind::PropertyOrFieldReference(name)))
            }
            Rule::method_call => self.build_method_call(pair),
            Rule::null_lit
            | Rule::bool_lit
            | Rule::real_lit
            | Rule::long_lit
            | Rule::int_lit
            | Rule::sq_string
            | Rule::dq_string => {
                let meta = meta_of(&pair);
                let literal = build_literal(&pair)?;
                Ok(self.node(meta, ExprKind::Literal(literal)))
            }
            _ => Err(get_unexpected_error(2, &pair)),
        }
    }

    fn build_assignment(&mut self, pair: Pair<Rule>) -> Result<ExprNode, ParseError> {
        let meta = meta_of(&pair);
        let mut inner = pair.clone().into_inner();
        let target = match inner.next() {
            Some(p) => self.build(p)?,
            None => return Err(get_unexpected_error(3, &pair)),
        };
        match inner.next() {
            None => Ok(target),
            Some(value) => {
                let value = self.build(value)?;
                Ok(self.node(
                    meta,
                    ExprKind::Assign {
                        target: Box::new(target),
                        value: Box::new(value),
                    },
                ))
            }
        }
    }

    fn build_ternary(&mut self, pair: Pair<Rule>) -> Result<ExprNode, ParseError> {
        let meta = meta_of(&pair);
        let mut inner = pair.clone().into_inner();
        let condition = match inner.next() {
            Some(p) => self.build(p)?,
            None => return Err(get_unexpected_error(4, &pair)),
        };
        match (inner.next(), inner.next()) {
            (None, _) => Ok(condition),
            (Some(if_true), Some(if_false)) => {
                let if_true = self.build(if_true)?;
                let if_false = self.build(if_false)?;
                Ok(self.node(
                    meta,
                    ExprKind::Ternary {
                        condition: Box::new(condition),
                        if_true: Box::new(if_true),
                        if_false: Box::new(if_false),
                    },
                ))
            }
            _ => Err(get_unexpected_error(5, &pair)),
        }
    }

    /// Left-associative fold of `operand (op operand)*`.
    fn build_binary(&mut self, pair: Pair<Rule>) -> Result<ExprNode, ParseError> {
        let start = pair.as_span().start();
        let mut inner = pair.clone().into_inner();
        let mut left = match inner.next() {
            Some(p) => self.build(p)?,
            None => return Err(get_unexpected_error(6, &pair)),
        };
        while let Some(op_pair) = inner.next() {
            let op = match BINARY_OPERATORS.get(op_pair.as_str().to_ascii_lowercase().as_str()) {
                Some(op) => *op,
                None => return Err(get_unexpected_error(7, &op_pair)),
            };
            let right = match inner.next() {
                Some(p) => self.build(p)?,
                None => return Err(get_unexpected_error(8, &op_pair)),
            };
            let meta = Meta {
                start_index: start,
                end_index: right.meta.end_index,
            };
            left = self.node(
                meta,
                ExprKind::BinaryOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn build_unary(&mut self, pair: Pair<Rule>) -> Result<ExprNode, ParseError> {
        let mut ops = vec![];
        let mut operand = None;
        for inner in pair.clone().into_inner() {
            match inner.as_rule() {
                Rule::unary_op => {
                    let op = match inner.as_str().to_ascii_lowercase().as_str() {
                        "!" | "not" => UnaryOperator::Not,
                        "-" => UnaryOperator::Minus,
                        "+" => UnaryOperator::Plus,
                        _ => return Err(get_unexpected_error(9, &inner)),
                    };
                    ops.push((op, inner.as_span().start()));
                }
                _ => operand = Some(self.build(inner)?),
            }
        }
        let mut node = match operand {
            Some(node) => node,
            None => return Err(get_unexpected_error(10, &pair)),
        };
        // The operator nearest the operand applies first.
        while let Some((op, start)) = ops.pop() {
            let meta = Meta {
                start_index: start,
                end_index: node.meta.end_index,
            };
            node = self.node(
                meta,
                ExprKind::UnaryOp {
                    op,
                    operand: Box::new(node),
                },
            );
        }
        Ok(node)
    }

    fn build_primary(&mut self, pair: Pair<Rule>) -> Result<ExprNode, ParseError> {
        let meta = meta_of(&pair);
        let mut segments = pair
            .clone()
            .into_inner()
            .map(|p| self.build(p))
            .collect::<Result<Vec<_>, _>>()?;
        match segments.len() {
            0 => Err(get_unexpected_error(11, &pair)),
            1 => Ok(segments.remove(0)),
            _ => Ok(self.node(meta, ExprKind::CompoundPath(segments))),
        }
    }

    fn build_method_call(&mut self, pair: Pair<Rule>) -> Result<ExprNode, ParseError> {
        let meta = meta_of(&pair);
        let mut inner = pair.clone().into_inner();
        let name = match inner.next() {
            Some(p) if p.as_rule() == Rule::identifier => p.as_str().to_string(),
            _ => return Err(get_unexpected_error(12, &pair)),
        };
        let args = inner.map(|p| self.build(p)).collect::<Result<Vec<_>, _>>()?;
        Ok(self.node(meta, ExprKind::MethodCall { name, args }))
    }
}

fn identifier_of(pair: &Pair<Rule>) -> Result<String, ParseError> {
    match pair.clone().into_inner().next() {
        Some(p) if p.as_rule() == Rule::identifier => Ok(p.as_str().to_string()),
        _ => Err(get_unexpected_error(13, pair)),
    }
}

fn build_literal(pair: &Pair<Rule>) -> Result<LiteralValue, ParseError> {
    let text = pair.as_str();
    Ok(match pair.as_rule() {
        Rule::null_lit => LiteralValue::Null,
        Rule::bool_lit => LiteralValue::Boolean(text.eq_ignore_ascii_case("true")),
        Rule::int_lit => LiteralValue::Int(text.parse().map_err(|e| invalid_literal(pair, e))?),
        Rule::long_lit => {
            let digits = &text[..text.len() - 1];
            LiteralValue::Long(digits.parse().map_err(|e| invalid_literal(pair, e))?)
        }
        Rule::real_lit => {
            let last = text.chars().last().map(|c| c.to_ascii_lowercase());
            match last {
                Some('f') => LiteralValue::Float(
                    text[..text.len() - 1].parse().map_err(|e| invalid_literal(pair, e))?,
                ),
                Some('d') => LiteralValue::Double(
                    text[..text.len() - 1].parse().map_err(|e| invalid_literal(pair, e))?,
                ),
                _ => LiteralValue::Double(text.parse().map_err(|e| invalid_literal(pair, e))?),
            }
        }
        Rule::sq_string => LiteralValue::String(string_body(pair).replace("''", "'")),
        Rule::dq_string => LiteralValue::String(string_body(pair).replace("\"\"", "\"")),
        _ => return Err(get_unexpected_error(14, pair)),
    })
}

fn string_body(pair: &Pair<Rule>) -> String {
    pair.clone()
        .into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kind(src: &str) -> ExprKind {
        ExprParser::parse_to_ast(src).unwrap().kind
    }

    #[test]
    fn test_literals() {
        assert_eq!(kind("null"), ExprKind::Literal(LiteralValue::Null));
        assert_eq!(kind("TRUE"), ExprKind::Literal(LiteralValue::Boolean(true)));
        assert_eq!(kind("42"), ExprKind::Literal(LiteralValue::Int(42)));
        assert_eq!(kind("42L"), ExprKind::Literal(LiteralValue::Long(42)));
        assert_eq!(kind("1.042"), ExprKind::Literal(LiteralValue::Double(1.042)));
        assert_eq!(kind("1.5f"), ExprKind::Literal(LiteralValue::Float(1.5)));
        assert_eq!(kind("2d"), ExprKind::Literal(LiteralValue::Double(2.0)));
        assert_eq!(kind("1e3"), ExprKind::Literal(LiteralValue::Double(1000.0)));
        assert_eq!(kind("'it''s'"), ExprKind::Literal(LiteralValue::String("it's".to_string())));
        assert_eq!(kind("\"a\"\"b\""), ExprKind::Literal(LiteralValue::String("a\"b".to_string())));
    }

    #[test]
    fn test_int_out_of_range() {
        let err = ExprParser::parse_to_ast("2147483648").unwrap_err();
        assert!(matches!(err, ParseError::InvalidLiteral { start: 0, end: 10, .. }));
        assert!(ExprParser::parse_to_ast("2147483648L").is_ok());
    }

    #[test]
    fn test_textual_operators_need_a_boundary() {
        match kind("order or other") {
            ExprKind::BinaryOp { op, left, right } => {
                assert_eq!(op, BinaryOperator::Or);
                assert_eq!(left.kind, ExprKind::PropertyOrFieldReference("order".to_string()));
                assert_eq!(right.kind, ExprKind::PropertyOrFieldReference("other".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_node_ids_are_unique() {
        let ast = ExprParser::parse_to_ast("(hasRole('A') or #a < 1.042) and f(1, {2, 3})").unwrap();
        let mut ids = vec![];
        let mut stack = vec![&ast];
        while let Some(node) = stack.pop() {
            ids.push(node.id);
            stack.extend(node.children());
        }
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count);
        assert_eq!(count, ast.node_count());
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(ExprParser::parse_to_ast("a +"), Err(ParseError::Syntax(_))));
        assert!(matches!(ExprParser::parse_to_ast(""), Err(ParseError::Syntax(_))));
    }
}
