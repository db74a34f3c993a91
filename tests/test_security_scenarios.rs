//! Role and principal checks written as expressions, evaluated against
//! person objects with custom resolvers layered over the default one.

extern crate exprkit;


use std::cell::RefCell;
use std::rc::Rc;

use exprkit::parser::ExprParser;
use exprkit::runner::ds::value::Value;
use security_util::*;

#[test]
fn test_scenario_any_role() {
    let mut ctx = security_context();
    let expr = ExprParser::parse_expression("hasAnyRole('MANAGER','TELLER')").unwrap();

    ctx.set_root_object(Person::new(Kind::Person, "Ben"));
    assert!(!expr.get_value_as::<bool>(&ctx).unwrap());

    ctx.set_root_object(Person::new(Kind::Manager, "Luke"));
    assert!(expr.get_value_as::<bool>(&ctx).unwrap());

    ctx.set_root_object(Person::new(Kind::Teller, "Leia"));
    assert!(expr.get_value_as::<bool>(&ctx).unwrap());
}

#[test]
fn test_any_role_with_null_list_matches() {
    let mut ctx = security_context();
    ctx.set_root_object(Person::new(Kind::Person, "Ben"));
    let expr = ExprParser::parse_expression("hasAnyRole(null)").unwrap();
    assert!(expr.get_value_as::<bool>(&ctx).unwrap());
}

#[test]
fn test_any_role_with_prebuilt_list() {
    let mut ctx = security_context();
    ctx.set_root_object(Person::new(Kind::Supervisor, "Ben"));
    ctx.set_variable("wanted", vec!["TELLER", "SUPERVISOR"]);
    let expr = ExprParser::parse_expression("hasAnyRole(#wanted)").unwrap();
    assert!(expr.get_value_as::<bool>(&ctx).unwrap());
}

#[test]
fn test_scenario_comparing_names() {
    let mut ctx = security_context();
    ctx.add_property_resolver(Rc::new(SecurityPrincipalAccessor));

    let expr = ExprParser::parse_expression("name == principal.name").unwrap();
    ctx.set_root_object(Person::new(Kind::Person, "Andy"));
    assert!(expr.get_value_as::<bool>(&ctx).unwrap());

    ctx.set_root_object(Person::new(Kind::Person, "Christian"));
    assert!(!expr.get_value_as::<bool>(&ctx).unwrap());
}

#[test]
fn test_scenario_comparing_names_with_null_root() {
    let mut ctx = security_context();
    ctx.add_property_resolver(Rc::new(SecurityPrincipalAccessor));
    let people = Rc::new(PersonAccessor::default());
    ctx.add_property_resolver(people.clone());
    ctx.set_root_object(Value::Null);

    let expr = ExprParser::parse_expression("p.name == principal.name").unwrap();

    people.set_person(Person::new(Kind::Person, "Andy"));
    assert!(expr.get_value_as::<bool>(&ctx).unwrap());

    people.set_person(Person::new(Kind::Person, "Christian"));
    assert!(!expr.get_value_as::<bool>(&ctx).unwrap());
}

#[test]
fn test_scenario_arithmetic() {
    let mut ctx = security_context();
    let expr = ExprParser::parse_expression(
        "(hasRole('SUPERVISOR') or (#a <  1.042)) and hasIpAddress('10.10.0.0/16')",
    )
    .unwrap();

    ctx.set_variable("a", 1.0);
    ctx.set_root_object(Person::new(Kind::Supervisor, "Ben"));
    assert!(expr.get_value_as::<bool>(&ctx).unwrap());

    ctx.set_root_object(Person::new(Kind::Manager, "Luke"));
    ctx.set_variable("a", 1.043);
    assert!(!expr.get_value_as::<bool>(&ctx).unwrap());

    ctx.set_variable("a", 1.0);
    assert!(expr.get_value_as::<bool>(&ctx).unwrap());
}

#[test]
fn test_scenario_controlling_which_methods_run() {
    let mut ctx = security_context();
    ctx.set_root_object(Person::new(Kind::Supervisor, "Ben"));
    let calls = Rc::new(RefCell::new(vec![]));
    ctx.add_method_resolver(Rc::new(HasRoleResolver {
        calls: calls.clone(),
    }));
    ctx.set_variable("a", 1.0);

    let expr = ExprParser::parse_expression(
        "(hasRole(3) or (#a <  1.042)) and hasIpAddress('10.10.0.0/16')",
    )
    .unwrap();
    assert!(expr.get_value_as::<bool>(&ctx).unwrap());

    // The int argument arrives converted and packed into one sequence.
    assert_eq!(
        *calls.borrow(),
        vec![vec![Value::List(vec![Value::from("3")])]]
    );
}

#[test]
fn test_overriding_resolver_receives_every_call() {
    let mut ctx = security_context();
    ctx.set_root_object(Person::new(Kind::Person, "Ben"));
    let calls = Rc::new(RefCell::new(vec![]));
    ctx.add_method_resolver(Rc::new(HasRoleResolver {
        calls: calls.clone(),
    }));

    // Person has no SUPERVISOR role, so only the override can say yes.
    let expr = ExprParser::parse_expression("hasRole('SUPERVISOR') and hasRole('A', 'B')").unwrap();
    assert!(expr.get_value_as::<bool>(&ctx).unwrap());
    assert_eq!(calls.borrow().len(), 2);
    assert_eq!(
        calls.borrow()[1],
        vec![Value::List(vec![Value::from("A"), Value::from("B")])]
    );

    ctx.remove_method_resolver("has_role");
    assert!(!expr.get_value_as::<bool>(&ctx).unwrap());
}

#[test]
fn test_roles_property_and_list_methods() {
    let mut ctx = security_context();
    ctx.set_root_object(Person::new(Kind::Manager, "Luke"));
    let expr = ExprParser::parse_expression("roles.contains('MANAGER') and roles.size() == 1").unwrap();
    assert!(expr.get_value_as::<bool>(&ctx).unwrap());
}
