use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::value::Value;

/// Stable identity of a function-call node.
///
/// Allocated once when the node is built and kept by clones, so the
/// per-node side table follows the node wherever the tree is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BinaryOperator {
    And,
    Or,
    Equal,
    NotEqual,
    Lesser,
    LesserOrEqual,
    Greater,
    GreaterOrEqual,
    Plus,
    Minus,
    Times,
    Div,
    Modulo,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LeftShift,
    RightShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum UnaryOperator {
    Not,
    Negate,
    BitwiseNot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub id: NodeId,
    pub name: String,
    pub arguments: Vec<Arc<Expression>>,
}

// Expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Value(Value),
    Identifier(String),
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Ternary {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    Function(FunctionCall),
}

impl Expression {
    pub fn value(value: impl Into<Value>) -> Self {
        Expression::Value(value.into())
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(name.into())
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn ternary(condition: Expression, then: Expression, otherwise: Expression) -> Self {
        Expression::Ternary {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Function call node with a freshly allocated [`NodeId`].
    pub fn call(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::Function(FunctionCall {
            id: NodeId::next(),
            name: name.into(),
            arguments: arguments.into_iter().map(Arc::new).collect(),
        })
    }

    /// Function-call nodes in depth-first, left-to-right order.
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        let mut calls = Vec::new();
        self.collect_calls(&mut calls);
        calls
    }

    fn collect_calls<'a>(&'a self, calls: &mut Vec<&'a FunctionCall>) {
        match self {
            Expression::Value(_) | Expression::Identifier(_) => {}
            Expression::Unary { operand, .. } => operand.collect_calls(calls),
            Expression::Binary { left, right, .. } => {
                left.collect_calls(calls);
                right.collect_calls(calls);
            }
            Expression::Ternary {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_calls(calls);
                then.collect_calls(calls);
                otherwise.collect_calls(calls);
            }
            Expression::Function(call) => {
                calls.push(call);
                for argument in &call.arguments {
                    argument.collect_calls(calls);
                }
            }
        }
    }
}
