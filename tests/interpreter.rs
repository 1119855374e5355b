mod common;

use common::{capturing_lox, on_large_stack, run};
use pretty_assertions::assert_eq;
use rox::lox::RunStatus;

fn prints(source: &str) -> Vec<String> {
    let outcome = run(source);
    assert_eq!(outcome.errors, Vec::<String>::new());
    assert_eq!(outcome.status, RunStatus::Ok);
    outcome.lines().into_iter().map(String::from).collect()
}

fn runtime_error(source: &str) -> String {
    let outcome = run(source);
    assert_eq!(outcome.status, RunStatus::RuntimeError);
    assert_eq!(outcome.errors.len(), 1);
    outcome.errors[0].clone()
}

#[test]
fn arithmetic_and_grouping() {
    assert_eq!(
        prints("print 2 + 3 * 4;\nprint (2 + 3) * 4;\nprint 7 / 2;\nprint -(1 - 4);"),
        vec!["14", "20", "3.5", "3"]
    );
}

#[test]
fn number_formatting() {
    assert_eq!(
        prints("print 1.5 + 1.5;\nprint 0.1;\nprint 100;\nprint 1 / 0;"),
        vec!["3", "0.1", "100", "inf"]
    );
}

#[test]
fn comparison_and_equality() {
    assert_eq!(
        prints(
            "print 1 < 2;\nprint 2 <= 1;\nprint nil == nil;\nprint 1 == \"1\";\n\
             print \"a\" == \"a\";\nprint nil == false;\nprint 3 != 4;"
        ),
        vec!["true", "false", "true", "false", "true", "false", "true"]
    );
}

#[test]
fn string_concatenation() {
    assert_eq!(
        prints("var a = \"foo\";\nprint a + \"bar\";"),
        vec!["foobar"]
    );
}

#[test]
fn truthiness() {
    assert_eq!(
        prints("print !nil;\nprint !false;\nprint !0;\nprint !\"\";\nprint !!\"x\";"),
        vec!["true", "true", "false", "false", "true"]
    );
}

#[test]
fn logical_operators_return_an_operand() {
    assert_eq!(
        prints("print nil or \"x\";\nprint 1 and 2;\nprint false and missing;\nprint \"a\" or missing;"),
        vec!["x", "2", "false", "a"]
    );
}

#[test]
fn logical_operators_short_circuit_side_effects() {
    let source = "\
var called = false;
fun touch() { called = true; return true; }
print true or touch();
print false and touch();
print called;
print false or touch();
print called;";

    assert_eq!(prints(source), vec!["true", "false", "false", "true", "true"]);
}

#[test]
fn control_flow() {
    let source = "\
var i = 0;
while (i < 3) { print i; i = i + 1; }
for (var j = 0; j < 2; j = j + 1) print \"j\" ;
if (i == 3) print \"three\"; else print \"other\";
if (nil) print \"never\";";

    assert_eq!(prints(source), vec!["0", "1", "2", "j", "j", "three"]);
}

#[test]
fn block_scoping_and_shadowing() {
    let source = "\
var a = \"global\";
{
  var a = \"outer\";
  {
    var a = \"inner\";
    print a;
  }
  print a;
}
print a;";

    assert_eq!(prints(source), vec!["inner", "outer", "global"]);
}

#[test]
fn closures_bind_lexically() {
    let source = "\
var a = \"global\";
{
  fun show() { print a; }
  show();
  var a = \"block\";
  show();
}";

    assert_eq!(prints(source), vec!["global", "global"]);
}

#[test]
fn closures_keep_independent_state() {
    let source = "\
fun makeCounter() {
  var i = 0;
  fun count() { i = i + 1; return i; }
  return count;
}
var a = makeCounter();
var b = makeCounter();
print a();
print a();
print b();";

    assert_eq!(prints(source), vec!["1", "2", "1"]);
}

#[test]
fn closures_share_captured_variables() {
    let source = "\
var get;
var set;
{
  var shared = 1;
  fun g() { return shared; }
  fun s(v) { shared = v; }
  get = g;
  set = s;
}
set(42);
print get();";

    assert_eq!(prints(source), vec!["42"]);
}

#[test]
fn recursion() {
    let source = "\
fun fib(n) {
  if (n < 2) return n;
  return fib(n - 1) + fib(n - 2);
}
print fib(10);";

    assert_eq!(prints(source), vec!["55"]);
}

#[test]
fn return_unwinds_out_of_loops() {
    let source = "\
fun find() {
  for (;;) {
    while (true) { return \"done\"; }
  }
}
print find();
fun nothing() { return; }
print nothing();
fun implicit() {}
print implicit();";

    assert_eq!(prints(source), vec!["done", "nil", "nil"]);
}

#[test]
fn callables_display() {
    assert_eq!(
        prints("fun f() {}\nclass K {}\nprint f;\nprint clock;\nprint K;\nprint K();"),
        vec!["<fn f>", "<native fn>", "K", "K instance"]
    );
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(prints("print clock() > 1000000000;"), vec!["true"]);
}

#[test]
fn fields_and_methods() {
    let source = "\
class Point {
  init(x, y) { this.x = x; this.y = y; }
  sum() { return this.x + this.y; }
}
var p = Point(1, 2);
print p.sum();
p.x = 10;
print p.sum();
var m = p.sum;
print m();";

    assert_eq!(prints(source), vec!["3", "12", "12"]);
}

#[test]
fn fields_shadow_methods() {
    let source = "\
class A { f() { return \"method\"; } }
var a = A();
a.f = \"field\";
print a.f;";

    assert_eq!(prints(source), vec!["field"]);
}

#[test]
fn initializer_returns_this() {
    let source = "\
class A {
  init() { this.v = 1; return; }
}
var a = A();
print a.init() == a;
print a.v;";

    assert_eq!(prints(source), vec!["true", "1"]);
}

#[test]
fn this_survives_in_nested_function() {
    let source = "\
class Thing {
  getCallback() {
    fun localFunction() { print this; }
    return localFunction;
  }
}
var callback = Thing().getCallback();
callback();";

    assert_eq!(prints(source), vec!["Thing instance"]);
}

#[test]
fn super_dispatch_through_hierarchy() {
    let source = "\
class A {
  method() { return \"A\"; }
  twice(n) { return n * 2; }
}
class B < A {
  method() { return \"B then \" + super.method(); }
  twice(n) { return super.twice(n) * 2; }
}
class C < B {}
print C().method();
print C().twice(3);";

    assert_eq!(prints(source), vec!["B then A", "12"]);
}

#[test]
fn initializer_is_inherited() {
    let source = "\
class A { init(x) { this.x = x; } }
class B < A {}
print B(5).x;";

    assert_eq!(prints(source), vec!["5"]);
}

#[test]
fn type_errors_abort_remaining_statements() {
    let outcome = run("print 1;\nprint -\"x\";\nprint 3;");

    assert_eq!(outcome.status, RunStatus::RuntimeError);
    assert_eq!(outcome.lines(), vec!["1"]);
    assert_eq!(outcome.errors, vec!["Operand must be a number.\n[line 2]"]);
}

#[test]
fn runtime_error_messages() {
    assert_eq!(
        runtime_error("print \"a\" + 1;"),
        "Operands must be two numbers or two strings.\n[line 1]"
    );
    assert_eq!(
        runtime_error("print 1 < \"2\";"),
        "Operands must be numbers.\n[line 1]"
    );
    assert_eq!(
        runtime_error("print y;"),
        "Undefined variable 'y'.\n[line 1]"
    );
    assert_eq!(
        runtime_error("y = 1;"),
        "Undefined variable 'y'.\n[line 1]"
    );
    assert_eq!(
        runtime_error("\"x\"();"),
        "Can only call functions and classes.\n[line 1]"
    );
    assert_eq!(
        runtime_error("class A {}\nA().x;"),
        "Undefined property 'x'.\n[line 2]"
    );
    assert_eq!(
        runtime_error("var s = \"s\";\nprint s.x;"),
        "Only instances have properties.\n[line 2]"
    );
    assert_eq!(
        runtime_error("var s = \"s\";\ns.x = 1;"),
        "Only instances have fields.\n[line 2]"
    );
    assert_eq!(
        runtime_error("var NotClass = 1;\nclass A < NotClass {}"),
        "Superclass must be a class.\n[line 2]"
    );
}

#[test]
fn arity_is_checked() {
    assert_eq!(
        runtime_error("fun f(a, b) {}\nf(1);"),
        "Expected 2 arguments but got 1.\n[line 2]"
    );
    assert_eq!(
        runtime_error("class A { init(x) {} }\nA();"),
        "Expected 1 arguments but got 0.\n[line 2]"
    );
    assert_eq!(
        runtime_error("clock(1);"),
        "Expected 0 arguments but got 1.\n[line 1]"
    );
}

#[test]
fn static_errors_prevent_execution() {
    let parse_error = run("print 1;\nprint ;");
    assert_eq!(parse_error.status, RunStatus::StaticError);
    assert_eq!(parse_error.stdout, "");
    assert_eq!(
        parse_error.errors,
        vec!["[line 2] Error at ';': Expect expression."]
    );

    let resolve_error = run("print 1;\nreturn 2;");
    assert_eq!(resolve_error.status, RunStatus::StaticError);
    assert_eq!(resolve_error.stdout, "");
}

#[test]
fn exit_codes() {
    assert_eq!(RunStatus::Ok.exit_code(), 0);
    assert_eq!(RunStatus::StaticError.exit_code(), 65);
    assert_eq!(RunStatus::RuntimeError.exit_code(), 70);
}

#[test]
fn session_state_persists_across_runs() {
    let (mut lox, buf) = capturing_lox();

    assert_eq!(lox.run("var a = 1;"), RunStatus::Ok);
    assert_eq!(lox.run("fun inc() { a = a + 1; return a; }"), RunStatus::Ok);
    assert_eq!(lox.run("print inc();"), RunStatus::Ok);

    assert_eq!(lox.run("print nope;"), RunStatus::RuntimeError);
    assert_eq!(lox.take_diagnostics().len(), 1);
    assert!(!lox.diagnostics().had_runtime_error());

    assert_eq!(lox.run("print ;"), RunStatus::StaticError);
    lox.take_diagnostics();

    assert_eq!(
        lox.run("fun mk() { var c = 0; fun f() { c = c + 1; return c; } return f; }"),
        RunStatus::Ok
    );
    assert_eq!(lox.run("var g = mk();"), RunStatus::Ok);
    assert_eq!(lox.run("print g(); print g(); print a;"), RunStatus::Ok);

    assert_eq!(buf.contents(), "2\n1\n2\n2\n");
}

#[test]
fn unbounded_recursion_is_a_runtime_error() {
    let outcome = run("fun f(n) { return f(n + 1); }\nf(0);");

    assert_eq!(outcome.status, RunStatus::RuntimeError);
    assert_eq!(outcome.errors, vec!["Stack overflow.\n[line 1]"]);
}

#[test]
fn call_depth_recovers_after_overflow() {
    let output = on_large_stack(|| {
        let (mut lox, buf) = capturing_lox();

        assert_eq!(
            lox.run("fun f() { return f(); }\nf();"),
            RunStatus::RuntimeError
        );
        lox.take_diagnostics();

        let status = lox.run(
            "fun down(n) { if (n == 0) return \"bottom\"; return down(n - 1); }\n\
             print down(500);",
        );
        assert_eq!(status, RunStatus::Ok);

        buf.contents()
    });

    assert_eq!(output, "bottom\n");
}

#[test]
fn runtime_error_in_block_restores_globals() {
    let (mut lox, buf) = capturing_lox();

    assert_eq!(
        lox.run("{ var x = 1; print nope; }"),
        RunStatus::RuntimeError
    );
    lox.take_diagnostics();

    assert_eq!(lox.run("print x;"), RunStatus::RuntimeError);
    let errors: Vec<String> = lox
        .take_diagnostics()
        .iter()
        .map(|d| d.to_string())
        .collect();
    assert_eq!(errors, vec!["Undefined variable 'x'.\n[line 1]"]);

    assert_eq!(lox.run("var y = 2; print y;"), RunStatus::Ok);
    assert_eq!(buf.contents(), "2\n");
}

#[test]
fn runtime_error_in_call_restores_globals() {
    let (mut lox, buf) = capturing_lox();

    assert_eq!(
        lox.run("fun boom() { var inner = 1; return missing; }\nboom();"),
        RunStatus::RuntimeError
    );
    lox.take_diagnostics();

    assert_eq!(lox.run("print inner;"), RunStatus::RuntimeError);
    lox.take_diagnostics();

    assert_eq!(lox.run("var z = 3; print z;"), RunStatus::Ok);
    assert_eq!(buf.contents(), "3\n");
}
