//! End-to-end tests for the front-end pipeline.

use pyfront::frontend::{parse, tokenize, Node, NodeKind, Role, Symbol, TokenKind};
use pyfront::Session;

fn find_symbol<'a>(symbols: &'a [Symbol], name: &str) -> &'a Symbol {
    symbols
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no symbol named {}", name))
}

#[test]
fn test_folded_assignment_pipeline() {
    let source = "x = 1 + 2";

    let (tokens, _) = tokenize(source);
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::IndentMarker,
            TokenKind::Identifier,
            TokenKind::Operator,
            TokenKind::Number,
            TokenKind::Operator,
            TokenKind::Number,
            TokenKind::EndOfInput,
        ]
    );

    let output = parse(source);
    assert!(output.errors.is_empty());
    assert_eq!(output.program.children.len(), 1);

    let assign = &output.program.children[0];
    assert_eq!(assign.kind, NodeKind::Assign);
    let rhs = &assign.children[1];
    assert_eq!(rhs.kind, NodeKind::BinaryOp);
    assert_eq!(rhs.token.lexeme, "+");

    let x = find_symbol(&output.symbols, "x");
    assert_eq!(x.data_type, "int");
    assert_eq!(x.value, "3.000000");
}

#[test]
fn test_division_by_zero() {
    let output = parse("x = 1/0");
    assert!(output.errors.is_empty());
    let x = find_symbol(&output.symbols, "x");
    assert_eq!(x.value, "DivisionByZeroError");
    assert_eq!(x.data_type, "int");
}

#[test]
fn test_if_elif_else_chain() {
    let source = "\
if a == 1:
    b = 2
elif a == 2:
    b = 3
else:
    b = 4
";
    let output = parse(source);
    assert!(output.errors.is_empty(), "errors: {:?}", output.errors);

    assert_eq!(output.program.children.len(), 1);
    let if_node = &output.program.children[0];
    assert_eq!(if_node.kind, NodeKind::If);
    assert_eq!(if_node.elif_branches().len(), 1);
    let else_branch = if_node.else_branch().expect("missing else branch");
    assert_eq!(else_branch.kind_name(), "Else");

    let bs: Vec<&Symbol> = output.symbols.iter().filter(|s| s.name == "b").collect();
    assert_eq!(bs.len(), 3);
    assert!(bs[0].id < bs[1].id && bs[1].id < bs[2].id);
    assert_eq!(
        bs.iter().map(|s| s.scope.as_str()).collect::<Vec<_>>(),
        vec!["if block", "elif block", "else block"]
    );
    assert_eq!(
        bs.iter().map(|s| s.value.as_str()).collect::<Vec<_>>(),
        vec!["2", "3", "4"]
    );
}

#[test]
fn test_leading_zero_error_token() {
    let (tokens, _) = tokenize("0123");
    let errors: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].lexeme, "Invalid number with leading zero: 0123");
}

#[test]
fn test_unterminated_string_error_token() {
    let (tokens, _) = tokenize("\"hello");
    let errors: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].lexeme, "Unterminated string");
}

#[test]
fn test_function_definition_and_call() {
    let source = "\
def f(a, b):
    return a + b
x = f(2, 3)
";
    let output = parse(source);
    assert!(output.errors.is_empty(), "errors: {:?}", output.errors);

    let def = &output.program.children[0];
    match &def.kind {
        NodeKind::FunctionDef { name, params } => {
            assert_eq!(name, "f");
            assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected FunctionDef, got {:?}", other),
    }

    let f = find_symbol(&output.symbols, "f");
    assert_eq!(f.role, Role::Function);
    assert_eq!(f.scope, "global");
    // The symbolic return overwrites the function's type and value
    assert_eq!(f.data_type, "unknown");
    assert_eq!(f.value, "a + b");

    let x = find_symbol(&output.symbols, "x");
    assert_eq!(x.scope, "global");
    assert_eq!(x.data_type, "expr");
}

#[test]
fn test_every_token_has_one_based_position() {
    let source = "x = 1\nif x:\n    y = \"s\"\n# comment\n";
    let (tokens, _) = tokenize(source);
    for token in tokens.iter().filter(|t| !t.is_end()) {
        assert!(token.location.line >= 1, "token {:?}", token);
        assert!(token.location.column >= 1, "token {:?}", token);
    }
}

#[test]
fn test_one_indent_marker_per_physical_line() {
    let source = "a = 1\n\n    \nb = 2";
    let (tokens, _) = tokenize(source);
    let markers: Vec<_> = tokens.iter().filter(|t| t.is_indent_marker()).collect();
    assert_eq!(markers.len(), 4);
    for (i, marker) in markers.iter().enumerate() {
        assert_eq!(marker.location.line, i + 1);
        assert_eq!(marker.location.column, 1);
    }
}

fn assert_binary_ops_have_two_children(node: &Node) {
    if node.kind == NodeKind::BinaryOp {
        assert_eq!(node.children.len(), 2, "BinaryOp at {:?}", node.token);
    }
    for child in &node.children {
        assert_binary_ops_have_two_children(child);
    }
}

#[test]
fn test_binary_ops_always_have_two_children() {
    let source = "x = 1 + 2 * 3 - 4 / 5\ny = a and b or not c\nz = (x < y) == (y > x)\n";
    let output = parse(source);
    assert_binary_ops_have_two_children(&output.program);
}

#[test]
fn test_symbol_ids_are_allocation_ordered() {
    let source = "\
a = 1
def f(p, q):
    b = 2
    return b
c = f(1, 2)
";
    let output = parse(source);
    for (i, symbol) in output.symbols.iter().enumerate() {
        assert_eq!(symbol.id, i);
    }
}

#[test]
fn test_comment_invariance() {
    let plain = tokenize("x = 1\ny = 2").0;
    let commented = tokenize("x = 1 # set x\ny = 2").0;
    let strip = |tokens: &[pyfront::frontend::Token]| {
        tokens
            .iter()
            .map(|t| (t.kind, t.lexeme.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(&plain), strip(&commented));
}

#[test]
fn test_intra_line_whitespace_invariance() {
    let tight = tokenize("x=1+2").0;
    let spaced = tokenize("x   =  1   +  2").0;
    let strip = |tokens: &[pyfront::frontend::Token]| {
        tokens
            .iter()
            .map(|t| (t.kind, t.lexeme.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(&tight), strip(&spaced));
}

#[test]
fn test_seed_and_fold_agree_on_numeric_literals() {
    let source = "a = 5\nb = 12\nc = 2.5\nd = 0.125\n";
    let (_, lex_symbols) = tokenize(source);
    let output = parse(source);

    for name in ["a", "b", "c", "d"] {
        let seeded = lex_symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("no lexer symbol {}", name));
        let folded = find_symbol(&output.symbols, name);
        assert_eq!(seeded.data_type, folded.data_type, "type of {}", name);
        assert_eq!(seeded.value, folded.value, "value of {}", name);
    }
}

#[test]
fn test_parser_terminates_and_recovers_on_garbage() {
    let source = "\
)( = ,
0123 + @
x = 2
";
    let output = parse(source);
    assert!(!output.errors.is_empty());
    // Recovery still picks up the trailing well-formed statement
    let x = find_symbol(&output.symbols, "x");
    assert_eq!(x.value, "2");
}

#[test]
fn test_session_full_run() {
    let mut session = Session::new();
    session.load("x = 1 + 2\n0123\n");
    let lex_report = session.run_lexer();
    assert_eq!(lex_report.errors.len(), 1);
    assert!(lex_report.symbols.contains(&"0,x,unknown,unknown".to_string()));

    let parse_report = session.run_parser();
    assert!(parse_report.tree.contains("Program"));
    assert!(parse_report
        .symbols
        .contains(&"ID: 0 ,x,int,3.000000,variable,global".to_string()));

    session.clear();
    assert!(session.tokens().is_empty());
}

#[test]
fn test_multiline_string_keeps_block_together() {
    let source = "if a:\n    s = \"\"\"line1\nline2\"\"\"\n    b = 2\n";
    let output = parse(source);
    assert!(output.errors.is_empty(), "errors: {:?}", output.errors);

    assert_eq!(output.program.children.len(), 1);
    let if_node = &output.program.children[0];
    assert_eq!(if_node.kind, NodeKind::If);
    let then_block = &if_node.children[1];
    assert_eq!(then_block.children.len(), 2);

    let s = find_symbol(&output.symbols, "s");
    assert_eq!(s.scope, "if block");
    assert_eq!(s.data_type, "string");
    let b = find_symbol(&output.symbols, "b");
    assert_eq!(b.scope, "if block");
    assert_eq!(b.value, "2");
}

#[test]
fn test_nested_function_with_loops() {
    let source = "\
def total(n):
    acc = 0
    while n > 0:
        acc = acc + n
        n = n - 1
    return acc
total(3)
";
    let output = parse(source);
    assert!(output.errors.is_empty(), "errors: {:?}", output.errors);

    let def = &output.program.children[0];
    assert!(matches!(def.kind, NodeKind::FunctionDef { .. }));
    let body = &def.children[1];
    assert_eq!(body.kind, NodeKind::Block);
    assert_eq!(body.children[1].kind, NodeKind::While);

    let acc_entries: Vec<&Symbol> = output.symbols.iter().filter(|s| s.name == "acc").collect();
    assert_eq!(acc_entries.len(), 2);
    assert_eq!(acc_entries[0].scope, "total (function)");
    assert_eq!(acc_entries[1].scope, "while block");
}
