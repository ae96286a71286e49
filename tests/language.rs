//! End-to-end tests driving full source programs through `Lox::run` and
//! asserting on captured `print` output and on diagnostics.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use loxide::{Lox, Outcome};

/// A `Write` sink the test keeps a handle to after handing it to the
/// session.
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn run(source: &str) -> (Outcome, String, Vec<String>) {
    let buf = SharedBuf::default();
    let mut lox = Lox::with_output(Box::new(buf.clone()));

    let outcome = lox.run(source.as_bytes());

    let output = String::from_utf8(buf.0.borrow().clone()).expect("output is UTF-8");
    let diagnostics = lox.diagnostics().iter().map(|d| d.to_string()).collect();

    (outcome, output, diagnostics)
}

fn run_ok(source: &str) -> String {
    let (outcome, output, diagnostics) = run(source);
    assert_eq!(outcome, Outcome::Ok, "diagnostics: {:?}", diagnostics);
    output
}

fn run_static_error(source: &str) -> Vec<String> {
    let (outcome, output, diagnostics) = run(source);
    assert_eq!(outcome, Outcome::StaticError);
    assert!(output.is_empty(), "execution must be withheld, got {:?}", output);
    diagnostics
}

fn run_runtime_error(source: &str) -> (String, String) {
    let (outcome, output, mut diagnostics) = run(source);
    assert_eq!(outcome, Outcome::RuntimeError);
    assert_eq!(diagnostics.len(), 1, "runtime errors are fail-fast");
    (output, diagnostics.remove(0))
}

// ───────────────────────── stringification ─────────────────────────

#[test]
fn integral_numbers_print_without_trailing_decimal() {
    assert_eq!(run_ok("print 1 + 2;"), "3\n");
}

#[test]
fn fractional_numbers_print_as_is() {
    assert_eq!(run_ok("print 2.5;"), "2.5\n");
}

#[test]
fn nil_booleans_and_strings_print_verbatim() {
    assert_eq!(
        run_ok("print nil; print true; print false; print \"hi\";"),
        "nil\ntrue\nfalse\nhi\n"
    );
}

// ───────────────────────── operators ───────────────────────────────

#[test]
fn string_concatenation() {
    assert_eq!(run_ok("print \"a\" + \"b\";"), "ab\n");
}

#[test]
fn mixed_plus_is_a_runtime_error() {
    let (_, diagnostic) = run_runtime_error("print \"a\" + 1;");
    assert!(diagnostic.contains("Operands must be two numbers or two strings."));
}

#[test]
fn comparison_requires_numbers() {
    let (_, diagnostic) = run_runtime_error("print \"a\" < \"b\";");
    assert!(diagnostic.contains("Operands must be numbers."));
}

#[test]
fn unary_minus_requires_a_number() {
    let (_, diagnostic) = run_runtime_error("print -\"a\";");
    assert!(diagnostic.contains("Operand must be a number."));
}

#[test]
fn equality_has_no_coercion() {
    assert_eq!(
        run_ok("print nil == nil; print 1 == \"1\"; print \"a\" == \"a\"; print 1 != 2;"),
        "true\nfalse\ntrue\ntrue\n"
    );
}

#[test]
fn division_follows_ieee_754() {
    assert_eq!(run_ok("print 1 / 0;"), "inf\n");
}

#[test]
fn only_nil_and_false_are_falsy() {
    assert_eq!(
        run_ok("if (0) print \"zero\"; if (\"\") print \"empty\"; if (nil) print \"nil\";"),
        "zero\nempty\n"
    );
}

#[test]
fn logical_operators_short_circuit_and_yield_operands() {
    assert_eq!(
        run_ok("print nil or \"fallback\"; print 1 and 2; print false and 1;"),
        "fallback\n2\nfalse\n"
    );
}

// ───────────────────────── variables and scoping ───────────────────

#[test]
fn inner_declaration_shadows_outer() {
    assert_eq!(run_ok("var a = 1; { var a = 2; print a; } print a;"), "2\n1\n");
}

#[test]
fn reading_a_variable_in_its_own_initializer_is_static() {
    let diagnostics = run_static_error("{ var a = a; }");
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("Can't read local variable in its own initializer."));
}

#[test]
fn duplicate_declaration_in_one_scope_is_static() {
    let diagnostics = run_static_error("{ var a = 1; var a = 2; }");
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("Already a variable with this name in this scope."));
}

#[test]
fn duplicate_parameter_names_are_static() {
    let diagnostics = run_static_error("fun f(a, a) {}");
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("Already a variable with this name in this scope."));
}

#[test]
fn global_redeclaration_is_allowed() {
    assert_eq!(run_ok("var a = 1; var a = 2; print a;"), "2\n");
}

#[test]
fn undefined_variable_read_is_a_runtime_error() {
    let (_, diagnostic) = run_runtime_error("print missing;");
    assert!(diagnostic.contains("Undefined variable 'missing'."));
}

#[test]
fn undefined_variable_assignment_is_a_runtime_error() {
    let (_, diagnostic) = run_runtime_error("missing = 1;");
    assert!(diagnostic.contains("Undefined variable 'missing'."));
}

#[test]
fn a_local_never_sees_a_later_shadowing_declaration() {
    // the classic binding test: the closure keeps seeing the global it was
    // resolved against, not the shadowing local declared afterwards
    let source = r#"
var a = "global";
{
  fun show() { print a; }
  show();
  var a = "block";
  show();
}
"#;
    assert_eq!(run_ok(source), "global\nglobal\n");
}

// ───────────────────────── control flow ────────────────────────────

#[test]
fn for_loop_runs_initializer_condition_and_increment() {
    assert_eq!(
        run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );
}

#[test]
fn while_loop_with_mutation() {
    assert_eq!(
        run_ok("var i = 3; while (i > 0) { print i; i = i - 1; }"),
        "3\n2\n1\n"
    );
}

#[test]
fn else_branch() {
    assert_eq!(run_ok("if (1 > 2) print \"yes\"; else print \"no\";"), "no\n");
}

// ───────────────────────── functions and closures ──────────────────

#[test]
fn function_call_and_return_value() {
    assert_eq!(
        run_ok("fun add(a, b) { return a + b; } print add(1, 2);"),
        "3\n"
    );
}

#[test]
fn function_without_return_yields_nil() {
    assert_eq!(run_ok("fun noop() {} print noop();"), "nil\n");
}

#[test]
fn return_unwinds_only_to_the_invoking_call() {
    assert_eq!(
        run_ok("fun f() { while (true) { return \"early\"; } } print f(); print \"after\";"),
        "early\nafter\n"
    );
}

#[test]
fn arity_is_enforced_exactly() {
    let (_, diagnostic) = run_runtime_error("fun f(a, b) {} f(1);");
    assert!(diagnostic.contains("Expected 2 arguments but got 1."));
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
    let (_, diagnostic) = run_runtime_error("\"text\"();");
    assert!(diagnostic.contains("Can only call functions and classes."));
}

#[test]
fn top_level_return_is_static() {
    let diagnostics = run_static_error("return 1;");
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("Can't return from top-level code."));
}

#[test]
fn closure_survives_its_defining_frame() {
    let source = r#"
fun makeCounter() {
  var i = 0;
  fun count() {
    i = i + 1;
    print i;
  }
  return count;
}
var counter = makeCounter();
counter();
counter();
"#;
    assert_eq!(run_ok(source), "1\n2\n");
}

#[test]
fn two_closures_share_one_captured_frame() {
    let source = r#"
var bump;
var show;
fun make() {
  var value = 0;
  fun b() { value = value + 1; }
  fun s() { print value; }
  bump = b;
  show = s;
}
make();
bump();
bump();
show();
"#;
    assert_eq!(run_ok(source), "2\n");
}

#[test]
fn recursion_works_through_the_declaring_scope() {
    assert_eq!(
        run_ok("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);"),
        "55\n"
    );
}

#[test]
fn runaway_recursion_is_reported_not_fatal() {
    // must surface as a diagnostic on the default test-thread stack, not
    // crash the process
    let (_, diagnostic) = run_runtime_error("fun f() { f(); } f();");
    assert!(diagnostic.contains("Stack overflow."));
}

#[test]
fn recursion_below_the_depth_cap_completes() {
    let source = r#"
fun count(n) {
  if (n == 0) return 0;
  return count(n - 1) + 1;
}
print count(50);
"#;
    assert_eq!(run_ok(source), "50\n");
}

#[test]
fn clock_is_registered_and_returns_a_number() {
    assert_eq!(run_ok("print clock() >= 0;"), "true\n");
}

// ───────────────────────── classes ─────────────────────────────────

#[test]
fn instances_hold_fields() {
    let source = r#"
class Bag {}
var bag = Bag();
bag.item = "apple";
print bag.item;
"#;
    assert_eq!(run_ok(source), "apple\n");
}

#[test]
fn methods_bind_this_to_the_receiver() {
    let source = r#"
class Greeter {
  greet() { print "hello " + this.name; }
}
var g = Greeter();
g.name = "world";
g.greet();
"#;
    assert_eq!(run_ok(source), "hello world\n");
}

#[test]
fn bound_method_keeps_its_receiver_when_stored() {
    let source = r#"
class Cake {
  flavor() { print this.kind; }
}
var cake = Cake();
cake.kind = "chocolate";
var m = cake.flavor;
m();
"#;
    assert_eq!(run_ok(source), "chocolate\n");
}

#[test]
fn init_runs_on_construction_and_sets_arity() {
    let source = r#"
class Point {
  init(x, y) {
    this.x = x;
    this.y = y;
  }
}
var p = Point(3, 4);
print p.x + p.y;
"#;
    assert_eq!(run_ok(source), "7\n");
}

#[test]
fn constructing_with_wrong_arity_is_a_runtime_error() {
    let (_, diagnostic) = run_runtime_error("class P { init(x, y) {} } P(1);");
    assert!(diagnostic.contains("Expected 2 arguments but got 1."));
}

#[test]
fn init_always_yields_the_instance() {
    let source = r#"
class Thing {
  init() {
    this.tag = "made";
    return;
  }
}
var t = Thing();
print t.tag;
print t.init().tag;
"#;
    // bare return inside init still yields the instance; so does
    // re-invoking init on an existing instance
    assert_eq!(run_ok(source), "made\nmade\n");
}

#[test]
fn returning_a_value_from_init_is_static() {
    let diagnostics = run_static_error("class T { init() { return 1; } }");
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("Can't return a value from an initializer."));
}

#[test]
fn fields_shadow_methods() {
    let source = r#"
class C {
  label() { print "method"; }
}
var c = C();
fun replacement() { print "field"; }
c.label = replacement;
c.label();
"#;
    assert_eq!(run_ok(source), "field\n");
}

#[test]
fn undefined_property_is_a_runtime_error() {
    let (_, diagnostic) = run_runtime_error("class C {} print C().missing;");
    assert!(diagnostic.contains("Undefined property 'missing'."));
}

#[test]
fn property_access_on_non_instance_is_a_runtime_error() {
    let (_, diagnostic) = run_runtime_error("print \"str\".length;");
    assert!(diagnostic.contains("Only instances have properties."));
}

#[test]
fn property_assignment_on_non_instance_is_a_runtime_error() {
    let (_, diagnostic) = run_runtime_error("var x = 1; x.field = 2;");
    assert!(diagnostic.contains("Only instances have fields."));
}

#[test]
fn this_outside_a_class_is_static() {
    let diagnostics = run_static_error("print this;");
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("Can't use 'this' outside of a class."));
}

// ───────────────────────── inheritance ─────────────────────────────

#[test]
fn subclass_inherits_superclass_methods() {
    let source = r#"
class A { hello() { print "from A"; } }
class B < A {}
B().hello();
"#;
    assert_eq!(run_ok(source), "from A\n");
}

#[test]
fn override_shadows_the_superclass_method() {
    let source = r#"
class A { who() { print "A"; } }
class B < A { who() { print "B"; } }
B().who();
"#;
    assert_eq!(run_ok(source), "B\n");
}

#[test]
fn super_calls_the_parent_while_this_stays_derived() {
    let source = r#"
class Doughnut {
  cook() { print "Fry " + this.kind + "."; }
}
class BostonCream < Doughnut {
  cook() {
    super.cook();
    print "Fill with custard.";
  }
}
var d = BostonCream();
d.kind = "dough";
d.cook();
"#;
    assert_eq!(run_ok(source), "Fry dough.\nFill with custard.\n");
}

#[test]
fn super_resolves_from_the_defining_class_not_the_receiver() {
    let source = r#"
class A { method() { print "A method"; } }
class B < A {
  method() { print "B method"; }
  test() { super.method(); }
}
class C < B {}
C().test();
"#;
    assert_eq!(run_ok(source), "A method\n");
}

#[test]
fn non_class_superclass_is_a_runtime_error() {
    let (_, diagnostic) = run_runtime_error("var NotAClass = 1; class C < NotAClass {}");
    assert!(diagnostic.contains("Superclass must be a class."));
}

#[test]
fn class_inheriting_from_itself_is_static() {
    let diagnostics = run_static_error("class Ouroboros < Ouroboros {}");
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("A class can't inherit from itself."));
}

#[test]
fn super_outside_a_class_is_static() {
    let diagnostics = run_static_error("print super.x;");
    assert!(!diagnostics.is_empty());
    assert!(diagnostics[0].contains("Can't use 'super' outside of a class."));
}

#[test]
fn super_without_a_superclass_is_static() {
    let diagnostics = run_static_error("class A { m() { super.m(); } }");
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("Can't use 'super' in a class with no superclass."));
}

// ───────────────────────── error model ─────────────────────────────

#[test]
fn multiple_static_errors_are_all_reported() {
    let diagnostics = run_static_error("var = 1;\nvar ok = 2;\nprint +;\n");
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics[0].contains("[line 1]"));
    assert!(diagnostics[1].contains("[line 3]"));
}

#[test]
fn runtime_errors_abort_after_earlier_output() {
    let (output, diagnostic) = run_runtime_error("print \"first\"; print 1 + nil; print \"never\";");
    assert_eq!(output, "first\n");
    assert!(diagnostic.contains("Operands must be two numbers or two strings."));
}

#[test]
fn runtime_error_reports_the_line() {
    let (_, diagnostic) = run_runtime_error("var a = 1;\nprint a + nil;");
    assert!(diagnostic.contains("[line 2]"));
}

#[test]
fn static_errors_withhold_execution_entirely() {
    // the print on line 1 is fine, but the program has a parse error below
    let diagnostics = run_static_error("print \"should not appear\";\nvar = broken;");
    assert!(!diagnostics.is_empty());
}

#[test]
fn deterministic_output_across_runs() {
    let source = "for (var i = 0; i < 5; i = i + 1) print i * i;";
    let first = run_ok(source);
    let second = run_ok(source);
    assert_eq!(first, second);
}

// ───────────────────────── session reuse ───────────────────────────

#[test]
fn definitions_persist_across_runs_in_one_session() {
    let buf = SharedBuf::default();
    let mut lox = Lox::with_output(Box::new(buf.clone()));

    assert_eq!(lox.run(b"var x = 40;"), Outcome::Ok);
    assert_eq!(lox.run(b"fun bump(n) { return n + 2; }"), Outcome::Ok);
    assert_eq!(lox.run(b"print bump(x);"), Outcome::Ok);

    let output = String::from_utf8(buf.0.borrow().clone()).unwrap();
    assert_eq!(output, "42\n");
}

#[test]
fn a_failed_run_does_not_poison_the_session() {
    let buf = SharedBuf::default();
    let mut lox = Lox::with_output(Box::new(buf.clone()));

    assert_eq!(lox.run(b"var ="), Outcome::StaticError);
    assert_eq!(lox.run(b"print 7;"), Outcome::Ok);

    let output = String::from_utf8(buf.0.borrow().clone()).unwrap();
    assert_eq!(output, "7\n");
}
