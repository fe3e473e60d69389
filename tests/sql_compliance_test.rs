//! End-to-end scenarios and error-path coverage exercised purely through
//! the public `Parser` API: the concrete examples and boundary behaviors
//! the front-end design calls out by name, plus a handful of structural
//! invariants checked over the resulting tree.

use sql_front::ast::{NodeFlags, NodeId, NodeType, SemanticFlags};
use sql_front::error::ParseErrorKind;
use sql_front::{Parser, ParserConfig, ParserMode};

fn parse_ok(sql: &str) -> (Parser, NodeId) {
    let mut p = Parser::new();
    let root = p.parse(sql).expect("statement should parse");
    (p, root)
}

#[test]
fn select_star() {
    let (p, root) = parse_ok("SELECT * FROM widgets");
    assert_eq!(p.arena().node(root).node_type, NodeType::SelectStmt);
    p.validate_ast(root).unwrap();
}

#[test]
fn count_distinct() {
    let (p, root) = parse_ok("SELECT COUNT(DISTINCT customer_id) FROM orders");
    let list = p.arena().find_child(root, NodeType::SelectList).unwrap();
    let call = p.arena().children(list).next().unwrap();
    assert_eq!(p.arena().node(call).node_type, NodeType::FunctionCall);
    assert!(p.arena().node(call).flags.contains(NodeFlags::DISTINCT));
}

#[test]
fn not_in_predicate() {
    let (p, root) = parse_ok("SELECT id FROM users WHERE role NOT IN ('admin', 'owner')");
    let where_clause = p.arena().find_child(root, NodeType::WhereClause).unwrap();
    let pred = p.arena().children(where_clause).next().unwrap();
    assert_eq!(p.arena().node(pred).node_type, NodeType::InExpr);
}

#[test]
fn union_all_of_two_selects() {
    let (p, root) = parse_ok("SELECT id FROM a UNION ALL SELECT id FROM b");
    assert_eq!(p.arena().node(root).node_type, NodeType::UnionStmt);
    assert!(p.arena().node(root).flags.contains(NodeFlags::ALL));
    assert_eq!(p.arena().children(root).count(), 2);
}

#[test]
fn with_recursive_cte() {
    let (p, root) = parse_ok(
        "WITH RECURSIVE ancestry(id, parent_id) AS (
            SELECT id, parent_id FROM people WHERE parent_id IS NULL
            UNION ALL
            SELECT p.id, p.parent_id FROM people p JOIN ancestry a ON p.parent_id = a.id
         )
         SELECT * FROM ancestry",
    );
    let cte = p.arena().children(root).next().unwrap();
    assert_eq!(p.arena().node(cte).node_type, NodeType::CTEClause);
    assert!(p.arena().node(cte).semantic_flags.contains(SemanticFlags::RECURSIVE));
}

#[test]
fn window_function_with_frame_clause() {
    let (p, root) = parse_ok(
        "SELECT id, RANK() OVER (PARTITION BY dept ORDER BY salary DESC ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) FROM employees",
    );
    let list = p.arena().find_child(root, NodeType::SelectList).unwrap();
    let rank_call = p.arena().children(list).nth(1).unwrap();
    let spec = p.arena().find_child(rank_call, NodeType::WindowSpec).unwrap();
    assert!(p.arena().find_child(spec, NodeType::FrameClause).is_some());
}

fn expect_error(sql: &str) -> ParseErrorKind {
    let mut p = Parser::new();
    p.parse(sql).expect_err("statement should fail to parse").kind
}

#[test]
fn select_with_no_list_is_missing_select_list() {
    match expect_error("SELECT FROM widgets") {
        ParseErrorKind::MissingSelectList => {}
        other => panic!("expected MissingSelectList, got {other:?}"),
    }
}

#[test]
fn insert_without_into_is_unexpected_token() {
    match expect_error("INSERT VALUES (1)") {
        ParseErrorKind::UnexpectedToken(_) => {}
        other => panic!("expected UnexpectedToken, got {other:?}"),
    }
}

#[test]
fn between_without_and_is_unterminated_construct() {
    match expect_error("SELECT * FROM t WHERE x BETWEEN 1") {
        ParseErrorKind::UnterminatedConstruct(_) => {}
        other => panic!("expected UnterminatedConstruct, got {other:?}"),
    }
}

#[test]
fn depth_bomb_fails_with_depth_exceeded_not_a_crash() {
    let mut sql = String::from("SELECT ");
    sql.push_str(&"(".repeat(1001));
    sql.push('1');
    sql.push_str(&")".repeat(1001));
    sql.push_str(" FROM t");
    match expect_error(&sql) {
        ParseErrorKind::DepthExceeded(limit) => assert_eq!(limit, 1000),
        other => panic!("expected DepthExceeded, got {other:?}"),
    }
}

#[test]
fn double_equals_rejected_in_strict_mode() {
    let mut p = Parser::with_config(ParserMode::Production, ParserConfig {
        max_depth: 1000,
        strict_mode: true,
    });
    match p.parse("SELECT * FROM t WHERE a == b").unwrap_err().kind {
        ParseErrorKind::StrictOperator(_) => {}
        other => panic!("expected StrictOperator, got {other:?}"),
    }
}

#[test]
fn double_equals_ends_expression_in_lax_mode() {
    // In lax mode `==` is not a recognized operator, so the expression
    // parser stops after `a` and the leftover tokens surface as a plain
    // syntax error rather than StrictOperator.
    let mut p = Parser::new();
    let err = p.parse("SELECT * FROM t WHERE a == b").unwrap_err();
    assert!(!matches!(err.kind, ParseErrorKind::StrictOperator(_)));
}

#[test]
fn node_ids_are_unique_and_source_spans_are_ordered() {
    let sql = "SELECT a, b FROM t WHERE a > 1 AND b < 2 ORDER BY a DESC LIMIT 10";
    let (p, root) = parse_ok(sql);
    let mut seen = std::collections::HashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let node = p.arena().node(id);
        assert!(seen.insert(node.node_id), "duplicate node_id {}", node.node_id);
        assert!(node.source_start <= node.source_end);
        assert!((node.source_end as usize) <= sql.len());
        stack.extend(p.arena().children(id));
    }
    let root_node = p.arena().node(root);
    assert_eq!(root_node.source_start, 0, "root should open at the first byte");
    assert_eq!(
        root_node.source_end as usize,
        sql.len(),
        "root should close at the statement's last byte"
    );

    let where_clause = p.arena().find_child(root, NodeType::WhereClause).unwrap();
    let w = p.arena().node(where_clause);
    assert_eq!(&sql[w.source_start as usize..w.source_end as usize], "WHERE a > 1 AND b < 2");
}

#[test]
fn validate_ast_accepts_a_nontrivial_join_query() {
    let (p, root) = parse_ok(
        "SELECT o.id, c.name FROM orders o
         JOIN customers c ON o.customer_id = c.id
         WHERE o.total > 100
         GROUP BY o.id, c.name
         HAVING COUNT(*) > 1
         ORDER BY o.id
         LIMIT 50 OFFSET 10",
    );
    p.validate_ast(root).unwrap();
}
