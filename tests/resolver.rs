use loxide::parser::Parser;
use loxide::resolver::{Locals, Resolver};
use loxide::scanner::Scanner;

fn resolve(source: &str) -> (Locals, Vec<String>) {
    let tokens = Scanner::new(source.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .expect("test source must be lexically valid");
    let (statements, parse_errors, _) = Parser::new(tokens).parse();
    assert!(parse_errors.is_empty(), "test source must parse cleanly");

    let (locals, errors) = Resolver::new().resolve(&statements);
    (locals, errors.iter().map(|e| e.to_string()).collect())
}

#[test]
fn local_in_the_same_scope_resolves_at_distance_zero() {
    let (locals, errors) = resolve("{ var a = 1; print a; }");

    assert!(errors.is_empty());
    // the read of `a` is the only resolvable expression
    assert_eq!(locals.len(), 1);
    assert_eq!(locals.values().copied().next(), Some(0));
}

#[test]
fn local_one_block_out_resolves_at_distance_one() {
    let (locals, errors) = resolve("{ var a = 1; { print a; } }");

    assert!(errors.is_empty());
    assert_eq!(locals.len(), 1);
    assert_eq!(locals.values().copied().next(), Some(1));
}

#[test]
fn globals_are_absent_from_the_side_table() {
    let (locals, errors) = resolve("var a = 1; print a;");

    assert!(errors.is_empty());
    assert!(locals.is_empty(), "globals resolve dynamically at runtime");
}

#[test]
fn captured_variable_counts_the_function_scope() {
    // inside count's body, `i` lives one scope out (makeCounter's body)
    let (locals, errors) = resolve(
        "fun makeCounter() { var i = 0; fun count() { print i; } return count; }",
    );

    assert!(errors.is_empty());
    assert_eq!(locals.len(), 2); // the read of `i` and the read of `count`
    let mut distances: Vec<usize> = locals.values().copied().collect();
    distances.sort_unstable();
    assert_eq!(distances, vec![0, 1]);
}

#[test]
fn this_resolves_through_the_synthetic_class_scope() {
    let (locals, errors) = resolve("class C { m() { print this; } }");

    assert!(errors.is_empty());
    // `this` sits in the scope just outside the method body
    assert_eq!(locals.len(), 1);
    assert_eq!(locals.values().copied().next(), Some(1));
}

#[test]
fn super_resolves_one_scope_beyond_this() {
    let source = "class A {} class B < A { m() { super.m(); } }";
    let (locals, errors) = resolve(source);

    assert!(errors.is_empty());
    // resolvable expressions: the superclass reference (global, unrecorded)
    // and `super` inside m
    assert_eq!(locals.len(), 1);
    assert_eq!(locals.values().copied().next(), Some(2));
}

#[test]
fn all_static_errors_in_one_pass() {
    let (_, errors) = resolve("{ var a = a; var a = 2; }\nreturn 1;");

    assert_eq!(errors.len(), 3);
    assert!(errors[0].contains("Can't read local variable in its own initializer."));
    assert!(errors[1].contains("Already a variable with this name in this scope."));
    assert!(errors[2].contains("Can't return from top-level code."));
}
