use std::fmt;

use crate::runner::ds::value::Value;

/// Source position of a node, as byte offsets into the expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    pub start_index: usize,
    pub end_index: usize,
}

pub trait HasMeta {
    fn get_meta(&self) -> &Meta;
}

/// Identity of a node within its expression. Ids are unique per parse and
/// key the resolution cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub id: NodeId,
    pub meta: Meta,
    pub kind: ExprKind,
}

impl HasMeta for ExprNode {
    fn get_meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(LiteralValue),
    PropertyOrFieldReference(String),
    MethodCall {
        name: String,
        args: Vec<ExprNode>,
    },
    /// `#name`, including the reserved `#root` and `#this`.
    VariableReference(String),
    BinaryOp {
        op: BinaryOperator,
        left: Box<ExprNode>,
        right: Box<ExprNode>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<ExprNode>,
    },
    /// `a.b.c()`: each segment is evaluated against the previous result.
    CompoundPath(Vec<ExprNode>),
    Ternary {
        condition: Box<ExprNode>,
        if_true: Box<ExprNode>,
        if_false: Box<ExprNode>,
    },
    InlineList(Vec<ExprNode>),
    Assign {
        target: Box<ExprNode>,
        value: Box<ExprNode>,
    },
}

impl ExprNode {
    /// Direct children, left to right.
    pub fn children(&self) -> Vec<&ExprNode> {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::PropertyOrFieldReference(_) | ExprKind::VariableReference(_) => vec![],
            ExprKind::MethodCall { args, .. } => args.iter().collect(),
            ExprKind::BinaryOp { left, right, .. } => vec![left, right],
            ExprKind::UnaryOp { operand, .. } => vec![operand],
            ExprKind::CompoundPath(segments) => segments.iter().collect(),
            ExprKind::Ternary {
                condition,
                if_true,
                if_false,
            } => vec![condition, if_true, if_false],
            ExprKind::InlineList(items) => items.iter().collect(),
            ExprKind::Assign { target, value } => vec![target, value],
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl LiteralValue {
    pub fn to_value(&self) -> Value {
        match self {
            LiteralValue::Null => Value::Null,
            LiteralValue::Boolean(b) => Value::Boolean(*b),
            LiteralValue::Int(i) => Value::Int(*i),
            LiteralValue::Long(l) => Value::Long(*l),
            LiteralValue::Float(x) => Value::Float(*x),
            LiteralValue::Double(x) => Value::Double(*x),
            LiteralValue::String(s) => Value::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOperator::Or => "or",
            BinaryOperator::And => "and",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Minus,
    Plus,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOperator::Not => "not",
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
        })
    }
}
