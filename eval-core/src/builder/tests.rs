//! # Builder 测试

use super::*;
use crate::ast::NodeKind;
use crate::error::LifecycleError;
use crate::evaluator::TraceEvaluator;

// -------------------------------------------------------------------------
// 辅助函数
// -------------------------------------------------------------------------

fn build(source: &str) -> BuiltTree {
    build_source("test", source, &EvalConfig::default()).unwrap()
}

fn build_err(source: &str) -> AstError {
    build_source("test", source, &EvalConfig::default()).unwrap_err()
}

fn tokens(names: &[&str]) -> Vec<Token> {
    names.iter().map(|&n| Token::new(n)).collect()
}

fn first_of_kind(ast: &Ast, kind: NodeKind) -> NodeId {
    ast.descendants(ast.root())
        .into_iter()
        .find(|&id| ast.get(id).is_some_and(|n| n.kind() == kind))
        .unwrap()
}

/// 结构检查：树中没有闭括号与分组括号，父子链接双向一致
fn assert_well_formed(ast: &Ast) {
    for id in ast.descendants(ast.root()) {
        let node = ast.get(id).unwrap();
        if let Some(brace) = node.kind().brace() {
            assert!(brace.open, "树中不应有闭括号: {}", node.label());
            assert!(!brace.is_irrelevant(), "分组括号未被消除: {}", node.label());
        }
        for &child in node.children() {
            assert_eq!(ast.parent(child), Some(id));
        }
    }
}

fn evaluate(built: &mut BuiltTree) -> Vec<String> {
    let mut trace = TraceEvaluator::new();
    built.evaluate(&mut trace).unwrap();
    trace.trace
}

// -------------------------------------------------------------------------
// 插入与括号消除
// -------------------------------------------------------------------------

#[test]
fn test_paren_elision() {
    let built = build("[{(PLUS ID:'a' ID:'b')}]");
    let ast = &built.ast;
    let block = first_of_kind(ast, NodeKind::Block);

    assert_eq!(ast.print(block), "{(PLUS(ID:a ID:b))");
    assert_well_formed(ast);
    assert!(built.diagnostics.is_empty());
}

#[test]
fn test_nested_paren_elision() {
    let built = build("[{(PLUS (MINUS ID:'a' ID:'b') ID:'c')}]");
    insta::assert_snapshot!(
        built.ast.print(built.ast.root()),
        @"root([({(PLUS(MINUS(ID:a ID:b) ID:c))))"
    );
    assert_well_formed(&built.ast);
}

#[test]
fn test_elision_keeps_every_operand() {
    let cases = [
        ("[{(PLUS)}]", "{(PLUS)"),
        ("[{(MINUS ID:'x')}]", "{(MINUS(ID:x))"),
        ("[{(PLUS ID:'a' ID:'b' ID:'c')}]", "{(PLUS(ID:a ID:b ID:c))"),
    ];
    for (source, expected) in cases {
        let built = build(source);
        let block = first_of_kind(&built.ast, NodeKind::Block);
        assert_eq!(built.ast.print(block), expected, "{}", source);
        assert!(built.diagnostics.is_empty(), "{}", source);
        assert_well_formed(&built.ast);
    }
}

#[test]
fn test_bare_operator_leaf_in_block() {
    let mut built = build("[{ID:'a' PLUS ID:'b'}]");
    assert!(built.diagnostics.is_empty());
    assert_eq!(
        evaluate(&mut built),
        ["ID:a", "PLUS", "ID:b", "{", "["]
    );
}

#[test]
fn test_promoted_operator_keeps_block_scope() {
    let built = build("[{(PLUS ID:'a' ID:'b')}]");
    let ast = &built.ast;
    let block = ast.get(first_of_kind(ast, NodeKind::Block)).unwrap();
    let plus = ast.get(first_of_kind(ast, NodeKind::Operator)).unwrap();

    assert!(block.scope().is_some());
    assert_eq!(plus.parent_scope(), block.scope());
}

#[test]
fn test_every_node_ready_after_clean_build() {
    let built = build("[say {(PLUS ID:'a' ID:'b') {(isvar ID:'x')}}[nested]]");
    let ast = &built.ast;
    assert_well_formed(ast);
    for id in ast.descendants(ast.root()).into_iter().skip(1) {
        let node = ast.get(id).unwrap();
        assert!(node.lifecycle().is_ready(), "{} 未完成 setup", node.label());
    }
}

#[test]
fn test_focus_moves_with_braces() {
    let mut builder = TreeBuilder::new("test");
    let root = builder.current();

    builder.feed(Token::new("[")).unwrap();
    let cmd = builder.current();
    assert_ne!(cmd, root);

    builder.feed(Token::new("{")).unwrap();
    let block = builder.current();
    assert_eq!(builder.ast().parent(block), Some(cmd));

    builder.feed(Token::with_value("ID", "x")).unwrap();
    assert_eq!(builder.current(), block);

    builder.feed(Token::new("}")).unwrap();
    assert_eq!(builder.current(), cmd);
    builder.feed(Token::new("]")).unwrap();
    assert_eq!(builder.current(), root);

    let built = builder.finish().unwrap();
    assert_eq!(built.ast.print(root), "root([({(ID:x)))");
}

// -------------------------------------------------------------------------
// 致命错误
// -------------------------------------------------------------------------

#[test]
fn test_brace_mismatch_is_fatal() {
    assert_eq!(
        build_err("[{(PLUS ID:'a' ID:'b'}]"),
        AstError::Parse(ParseError::BraceMismatch {
            open: "(".to_string(),
            close: "}".to_string(),
        })
    );
}

#[test]
fn test_brace_mismatch_leaves_tree_untouched() {
    let mut ast = Ast::new();
    let mut current = ast.root();
    for token in [
        Token::new("["),
        Token::new("{"),
        Token::new("("),
        Token::new("PLUS"),
        Token::with_value("ID", "a"),
    ] {
        current = insert(&mut ast, current, make_node(token).unwrap()).unwrap();
    }
    let before = ast.print(ast.root());

    let result = insert(&mut ast, current, make_node(Token::new("]")).unwrap());

    assert!(matches!(
        result,
        Err(BuildError::Fatal(AstError::Parse(ParseError::BraceMismatch { .. })))
    ));
    assert_eq!(ast.print(ast.root()), before);
}

#[test]
fn test_empty_parens_rejected() {
    assert_eq!(
        build_err("[{()}]"),
        AstError::Parse(ParseError::EmptyParens)
    );
}

#[test]
fn test_promote_with_children_rejected() {
    assert_eq!(
        build_err("[{((PLUS ID:'a' ID:'b') ID:'c')}]"),
        AstError::Parse(ParseError::PromoteWithChildren {
            name: "PLUS".to_string(),
            count: 2,
        })
    );
}

#[test]
fn test_close_above_root() {
    let err = build_tree("test", tokens(&["]"])).unwrap_err();
    assert_eq!(
        err,
        AstError::Parse(ParseError::AboveRoot {
            name: "root".to_string(),
        })
    );
}

#[test]
fn test_close_on_non_brace_focus() {
    let mut ast = Ast::new();
    let root = ast.root();
    insert(&mut ast, root, make_node(Token::new("[")).unwrap()).unwrap();
    let cmd = ast.children(root)[0];
    insert(&mut ast, cmd, make_node(Token::with_value("cmd", "x")).unwrap()).unwrap();
    let leaf = ast.children(cmd)[0];

    let result = insert(&mut ast, leaf, make_node(Token::new("]")).unwrap());
    assert_eq!(
        result,
        Err(BuildError::Fatal(AstError::Parse(ParseError::NotOpenBrace {
            close: "]".to_string(),
            found: "cmd:x".to_string(),
        })))
    );
}

#[test]
fn test_insert_at_missing_node() {
    let mut ast = Ast::new();
    let root = ast.root();
    insert(&mut ast, root, make_node(Token::new("[")).unwrap()).unwrap();
    let cmd = ast.children(root)[0];
    ast.remove_children_starting_at(root, cmd).unwrap();

    let result = insert(&mut ast, cmd, make_node(Token::new("ID")).unwrap());
    assert_eq!(
        result,
        Err(BuildError::Fatal(LifecycleError::NoSuchNode(cmd).into()))
    );
}

#[test]
fn test_unsupported_token() {
    assert_eq!(
        build_err("[{+}]"),
        AstError::Parse(ParseError::UnsupportedToken {
            token: "+".to_string(),
        })
    );
}

#[test]
fn test_unclosed_at_finish() {
    let tokens = vec![Token::new("["), Token::with_value("cmd", "a")];
    assert_eq!(
        build_tree("test", tokens).unwrap_err(),
        AstError::Parse(ParseError::Unclosed {
            name: "[".to_string(),
        })
    );
}

#[test]
fn test_unclosed_damaged_statement_at_finish() {
    // 恢复后丢弃语句剩余部分时输入提前结束
    let err = build_tree("test", tokens(&["[", "{", "exp", "}"])).unwrap_err();
    assert!(matches!(
        err,
        AstError::Parse(ParseError::Unclosed { .. })
    ));
}

// -------------------------------------------------------------------------
// 错误恢复
// -------------------------------------------------------------------------

#[test]
fn test_recovery_truncates_damaged_statement() {
    let mut built = build("[{(PLUS ID:'a' ID:'b') (exp) (MINUS ID:'c')}]");
    let block = first_of_kind(&built.ast, NodeKind::Block);

    assert_eq!(built.ast.print(block), "{(PLUS(ID:a ID:b) MINUS(ID:c))");
    assert_well_formed(&built.ast);

    assert_eq!(built.diagnostics.warn_count(), 1);
    let diag = &built.diagnostics.diagnostics[0];
    assert_eq!(diag.token, Some(9));
    assert!(diag.message.contains("exp"));
    assert_eq!(diag.detail.as_deref(), Some("{(PLUS(ID:a ID:b))"));

    assert_eq!(
        evaluate(&mut built),
        ["ID:a", "ID:b", "PLUS", "ID:c", "MINUS", "{", "["]
    );
}

#[test]
fn test_recovery_resumes_at_enclosing_block() {
    let tokens = tokenize("[{(PLUS ID:'a' ID:'b') (exp) (MINUS ID:'c')}]").unwrap();
    // 第二条语句的 `)`
    let failing = 9;

    let mut ast = Ast::new();
    let mut current = ast.root();
    for token in tokens[..failing].iter().cloned() {
        current = insert(&mut ast, current, make_node(token).unwrap()).unwrap();
    }
    let block = first_of_kind(&ast, NodeKind::Block);
    let close = make_node(tokens[failing].clone()).unwrap();
    let recovered = match insert(&mut ast, current, close) {
        Err(BuildError::Recovered(recovered)) => recovered,
        other => panic!("期望已恢复的错误，实际 {:?}", other),
    };
    assert_eq!(recovered.resume_at, block);
    assert!(matches!(
        recovered.error,
        AstError::Parse(ParseError::OperandCount { actual: 0, .. })
    ));
    assert_eq!(ast.print(block), "{(PLUS(ID:a ID:b))");

    // 建树器的焦点回到同一个代码块，第三条语句继续挂在它下面
    let mut builder = TreeBuilder::new("test");
    let mut rest = tokens.into_iter();
    for token in rest.by_ref().take(failing + 1) {
        builder.feed(token).unwrap();
    }
    let block = first_of_kind(builder.ast(), NodeKind::Block);
    assert_eq!(builder.current(), block);

    builder.feed_all(rest).unwrap();
    let mut built = builder.finish().unwrap();
    assert_eq!(built.ast.print(block), "{(PLUS(ID:a ID:b) MINUS(ID:c))");
    assert_eq!(
        evaluate(&mut built),
        ["ID:a", "ID:b", "PLUS", "ID:c", "MINUS", "{", "["]
    );
}

#[test]
fn test_recovery_discards_rest_of_expression() {
    // 失败的表达式位于外层圆括号中：截断代码块，丢弃外层圆括号剩余的 token
    let built = build("[{ID:'a' (PLUS ID:'x' (exp)) ID:'b'}]");
    let block = first_of_kind(&built.ast, NodeKind::Block);

    assert_eq!(built.ast.print(block), "{(ID:a ID:b)");
    assert_well_formed(&built.ast);
    assert_eq!(built.diagnostics.warn_count(), 1);
}

#[test]
fn test_recovery_in_nested_block_stays_local() {
    let built = build("[{ID:'a' {ID:'z' {exp} ID:'y'} ID:'b'}]");
    let outer = first_of_kind(&built.ast, NodeKind::Block);

    assert_eq!(built.ast.print(outer), "{(ID:a {(ID:z ID:y) ID:b)");
    assert_well_formed(&built.ast);
}

#[test]
fn test_top_level_recovery_skips_statement() {
    let mut built = build("[x {exp} y [z]][{(PLUS ID:'a' ID:'b')}]");
    let root = built.ast.root();

    assert_eq!(built.ast.children(root).len(), 2);
    let damaged = built.ast.get(built.ast.children(root)[0]).unwrap();
    assert!(!damaged.lifecycle().is_setup());
    assert_eq!(built.diagnostics.warn_count(), 1);

    assert_eq!(
        evaluate(&mut built),
        ["ID:a", "ID:b", "PLUS", "{", "["]
    );
}

#[test]
fn test_recover_disabled_returns_original_error() {
    let config = EvalConfig {
        recover: false,
        ..EvalConfig::default()
    };
    assert_eq!(
        build_source("test", "[{exp}]", &config).unwrap_err(),
        AstError::Parse(ParseError::OperandCount {
            node: "exp".to_string(),
            expected: "至少 1".to_string(),
            actual: 0,
        })
    );
}

#[test]
fn test_invalid_child_is_recovered() {
    let built = build("[{ID:'ok' (new type)}]");
    let block = first_of_kind(&built.ast, NodeKind::Block);
    assert_eq!(built.ast.print(block), "{(ID:ok)");
    assert_eq!(built.diagnostics.warn_count(), 1);
}

#[test]
fn test_lex_error_surfaces() {
    assert!(matches!(build_err("x"), AstError::Lex(_)));
}
