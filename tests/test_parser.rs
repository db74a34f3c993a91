extern crate exprkit;

use exprkit::parser::ast::{BinaryOperator, ExprKind, HasMeta, LiteralValue, UnaryOperator};
use exprkit::parser::{ExprParser, ParseError};
use exprkit::runner::plugin::config::EngineConfig;
use pretty_assertions::assert_eq;

fn shape(src: &str) -> String {
    fn walk(kind: &ExprKind, out: &mut String) {
        match kind {
            ExprKind::Literal(LiteralValue::String(s)) => out.push_str(&format!("'{}'", s)),
            ExprKind::Literal(lit) => out.push_str(&format!("{:?}", lit)),
            ExprKind::PropertyOrFieldReference(name) => out.push_str(name),
            ExprKind::VariableReference(name) => out.push_str(&format!("#{}", name)),
            ExprKind::MethodCall { name, args } => {
                out.push_str(name);
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    walk(&arg.kind, out);
                }
                out.push(')');
            }
            ExprKind::BinaryOp { op, left, right } => {
                out.push('(');
                walk(&left.kind, out);
                out.push_str(&format!(" {} ", op));
                walk(&right.kind, out);
                out.push(')');
            }
            ExprKind::UnaryOp { op, operand } => {
                out.push_str(&format!("{}[", op));
                walk(&operand.kind, out);
                out.push(']');
            }
            ExprKind::CompoundPath(segments) => {
                for (i, seg) in segments.iter().enumerate() {
                    if i > 0 {
                        out.push('.');
                    }
                    walk(&seg.kind, out);
                }
            }
            ExprKind::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                out.push('(');
                walk(&condition.kind, out);
                out.push_str(" ? ");
                walk(&if_true.kind, out);
                out.push_str(" : ");
                walk(&if_false.kind, out);
                out.push(')');
            }
            ExprKind::InlineList(items) => {
                out.push('{');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    walk(&item.kind, out);
                }
                out.push('}');
            }
            ExprKind::Assign { target, value } => {
                out.push('(');
                walk(&target.kind, out);
                out.push_str(" = ");
                walk(&value.kind, out);
                out.push(')');
            }
        }
    }
    let ast = ExprParser::parse_to_ast(src).unwrap();
    let mut out = String::new();
    walk(&ast.kind, &mut out);
    out
}

#[test]
fn test_precedence() {
    assert_eq!(shape("1 + 2 * 3"), "(Int(1) + (Int(2) * Int(3)))");
    assert_eq!(shape("a or b and c"), "(a or (b and c))");
    assert_eq!(shape("a - b - c"), "((a - b) - c)");
    assert_eq!(shape("not a == b"), "(not[a] == b)");
    assert_eq!(shape("a < b ? x : y"), "((a < b) ? x : y)");
    assert_eq!(shape("a = b = 1"), "(a = (b = Int(1)))");
}

#[test]
fn test_security_expression_shape() {
    assert_eq!(
        shape("(hasRole('SUPERVISOR') or (#a <  1.042)) and hasIpAddress('10.10.0.0/16')"),
        "((hasRole('SUPERVISOR') or (#a < Double(1.042))) and hasIpAddress('10.10.0.0/16'))"
    );
}

#[test]
fn test_paths_and_calls() {
    assert_eq!(shape("p.name == principal.name"), "(p.name == principal.name)");
    assert_eq!(shape("#root.owner.toUpperCase()"), "#root.owner.toUpperCase()");
    assert_eq!(shape("{1, 'a'}.contains(x)"), "{Int(1), 'a'}.contains(x)");
    assert_eq!(shape("f()"), "f()");
    assert_eq!(shape("1.size()"), "Int(1).size()");
}

#[test]
fn test_textual_and_symbolic_operators_agree() {
    assert_eq!(shape("a AND b OR c"), shape("a && b || c"));
    assert_eq!(shape("a lt b"), shape("a < b"));
    assert_eq!(shape("a div b mod c"), shape("a / b % c"));
    assert_eq!(shape("!a"), shape("not a"));
    assert_eq!(shape("-a"), "-[a]");
}

#[test]
fn test_meta_spans() {
    let ast = ExprParser::parse_to_ast("  foo(1)  ").unwrap();
    assert_eq!(ast.get_meta().start_index, 2);
    assert_eq!(ast.get_meta().end_index, 8);
    match &ast.kind {
        ExprKind::MethodCall { args, .. } => assert_eq!(args[0].meta.start_index, 6),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unary_chain() {
    let ast = ExprParser::parse_to_ast("- -1").unwrap();
    match ast.kind {
        ExprKind::UnaryOp { op, operand } => {
            assert_eq!(op, UnaryOperator::Minus);
            assert!(matches!(operand.kind, ExprKind::UnaryOp { op: UnaryOperator::Minus, .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        ExprParser::parse_to_ast("1 != 2").unwrap().kind,
        ExprKind::BinaryOp { op: BinaryOperator::NotEqual, .. }
    ));
}

#[test]
fn test_syntax_errors() {
    for src in &["", "a +", "f(", "'unterminated", "a..b", "#", "a = = b"] {
        assert!(
            matches!(ExprParser::parse_to_ast(src), Err(ParseError::Syntax(_))),
            "expected a syntax error for {:?}",
            src
        );
    }
}

#[test]
fn test_parse_with_config() {
    let expr = ExprParser::parse_expression_with_config(
        "a.b",
        &EngineConfig::new().with_resolution_cache(false),
    )
    .unwrap();
    assert!(!expr.is_caching());
    assert_eq!(expr.ast().node_count(), 3);
}
