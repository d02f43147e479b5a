///
/// # Join Support Integration Tests
///
/// Runs one five-table LEFT JOIN query against bundled SQLite and reads its
/// flat result through splitting adapters: flat scopes, nested scope pairs,
/// left-joined records that found no match, and a computed suffix column.
///

use rowscope::{
    DecodeError, FromRow, RowView, ScopeAdapter, SqlValue, SqliteStatement, StatementCursor,
    TableSelection, splitting_adapters,
};
use rusqlite::Connection;

struct T1Table;
impl TableSelection for T1Table {
    const TABLE_NAME: &'static str = "t1";
}

struct T2Table;
impl TableSelection for T2Table {
    const TABLE_NAME: &'static str = "t2";
}

struct T3Table;
impl TableSelection for T3Table {
    const TABLE_NAME: &'static str = "t3";

    fn selected_columns() -> Option<&'static [&'static str]> {
        Some(&["t1id", "name"])
    }
}

#[derive(Debug, Clone, PartialEq)]
struct T1 {
    id: i64,
    name: String,
}

impl FromRow for T1 {
    fn from_row(row: &RowView) -> Result<Self, DecodeError> {
        Ok(T1 {
            id: row.get_named("id")?,
            name: row.get_named("name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct T2 {
    id: i64,
    t1id: i64,
    name: String,
}

impl FromRow for T2 {
    fn from_row(row: &RowView) -> Result<Self, DecodeError> {
        Ok(T2 {
            id: row.get_named("id")?,
            t1id: row.get_named("t1id")?,
            name: row.get_named("name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct T3 {
    t1id: i64,
    name: String,
}

impl FromRow for T3 {
    fn from_row(row: &RowView) -> Result<Self, DecodeError> {
        Ok(T3 {
            t1id: row.get_named("t1id")?,
            name: row.get_named("name")?,
        })
    }
}

#[derive(Debug)]
struct FlatModel {
    t1: T1,
    t2_left: Option<T2>,
    t2_right: Option<T2>,
    t3: Option<T3>,
    t5count: i64,
}

impl FromRow for FlatModel {
    fn from_row(row: &RowView) -> Result<Self, DecodeError> {
        Ok(FlatModel {
            t1: row.decode_scope("t1")?,
            t2_left: row.decode_left_joined("t2Left")?,
            t2_right: row.decode_left_joined("t2Right")?,
            t3: row.decode_left_joined("t3")?,
            t5count: row.decode_scope::<RowView>("suffix")?.get_named("t5count")?,
        })
    }
}

#[derive(Debug)]
struct T2Pair {
    left: Option<T2>,
    right: Option<T2>,
}

impl FromRow for T2Pair {
    fn from_row(row: &RowView) -> Result<Self, DecodeError> {
        Ok(T2Pair {
            left: row.decode_left_joined("left")?,
            right: row.decode_left_joined("right")?,
        })
    }
}

#[derive(Debug)]
struct NestedModel {
    t1: T1,
    optional_t2_pair: Option<T2Pair>,
    t2_pair: T2Pair,
    t3: Option<T3>,
    t5count: i64,
}

impl FromRow for NestedModel {
    fn from_row(row: &RowView) -> Result<Self, DecodeError> {
        Ok(NestedModel {
            t1: row.decode_scope("t1")?,
            optional_t2_pair: row.decode_left_joined("optionalT2Pair")?,
            t2_pair: row.decode_scope("t2Pair")?,
            t3: row.decode_left_joined("t3")?,
            t5count: row.get_named("t5count")?,
        })
    }
}

fn setup() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
    conn.execute_batch(
        r#"
        CREATE TABLE t1 (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
        CREATE TABLE t2 (
            id INTEGER PRIMARY KEY,
            t1id INTEGER NOT NULL REFERENCES t1(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            UNIQUE (t1id, name)
        );
        CREATE TABLE t3 (
            t1id INTEGER PRIMARY KEY REFERENCES t1(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            ignored INTEGER
        );
        CREATE TABLE t4 (
            t1id INTEGER PRIMARY KEY REFERENCES t1(id) ON DELETE CASCADE,
            name TEXT NOT NULL
        );
        CREATE TABLE t5 (
            id INTEGER PRIMARY KEY,
            t3id INTEGER REFERENCES t3(t1id) ON DELETE CASCADE,
            t4id INTEGER REFERENCES t4(t1id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            CHECK ((t3id IS NOT NULL) + (t4id IS NOT NULL) = 1)
        );

        INSERT INTO t1 (id, name) VALUES (1, 'A1');
        INSERT INTO t1 (id, name) VALUES (2, 'A2');
        INSERT INTO t1 (id, name) VALUES (3, 'A3');
        INSERT INTO t2 (id, t1id, name) VALUES (1, 1, 'left');
        INSERT INTO t2 (id, t1id, name) VALUES (2, 1, 'right');
        INSERT INTO t2 (id, t1id, name) VALUES (3, 2, 'left');
        INSERT INTO t3 (t1id, name) VALUES (1, 'A3');
        INSERT INTO t4 (t1id, name) VALUES (1, 'A4');
        INSERT INTO t4 (t1id, name) VALUES (2, 'B4');
        INSERT INTO t5 (id, t3id, t4id, name) VALUES (1, 1, NULL, 'A5');
        INSERT INTO t5 (id, t3id, t4id, name) VALUES (2, 1, NULL, 'B5');
        INSERT INTO t5 (id, t3id, t4id, name) VALUES (3, NULL, 1, 'C5');
        INSERT INTO t5 (id, t3id, t4id, name) VALUES (4, NULL, 1, 'D5');
        INSERT INTO t5 (id, t3id, t4id, name) VALUES (5, NULL, 1, 'E5');
        INSERT INTO t5 (id, t3id, t4id, name) VALUES (6, NULL, 2, 'F5');
        INSERT INTO t5 (id, t3id, t4id, name) VALUES (7, NULL, 2, 'G5');
        "#,
    )
    .expect("Failed to seed database");
    conn
}

const EXPECTED_SQL: &str = r#"SELECT
    "t1".*,
    "t2Left".*,
    "t2Right".*,
    "t3"."t1id", "t3"."name",
    COUNT(DISTINCT t5.id) AS t5count
FROM t1
LEFT JOIN t2 t2Left ON t2Left.t1id = t1.id AND t2Left.name = 'left'
LEFT JOIN t2 t2Right ON t2Right.t1id = t1.id AND t2Right.name = 'right'
LEFT JOIN t3 ON t3.t1id = t1.id
LEFT JOIN t4 ON t4.t1id = t1.id
LEFT JOIN t5 ON t5.t3id = t3.t1id OR t5.t4id = t4.t1id
GROUP BY t1.id
ORDER BY t1.id"#;

fn tested_sql() -> String {
    format!(
        r#"SELECT
    {},
    {},
    {},
    {},
    COUNT(DISTINCT t5.id) AS t5count
FROM t1
LEFT JOIN t2 t2Left ON t2Left.t1id = t1.id AND t2Left.name = 'left'
LEFT JOIN t2 t2Right ON t2Right.t1id = t1.id AND t2Right.name = 'right'
LEFT JOIN t3 ON t3.t1id = t1.id
LEFT JOIN t4 ON t4.t1id = t1.id
LEFT JOIN t5 ON t5.t3id = t3.t1id OR t5.t4id = t4.t1id
GROUP BY t1.id
ORDER BY t1.id"#,
        T1Table::selection_sql(None),
        T2Table::selection_sql(Some("t2Left")),
        T2Table::selection_sql(Some("t2Right")),
        T3Table::selection_sql(None),
    )
}

fn split_adapters(conn: &Connection, total_columns: usize) -> Vec<ScopeAdapter> {
    let sizes = [
        T1Table::selected_column_count(conn).unwrap(),
        T2Table::selected_column_count(conn).unwrap(),
        T2Table::selected_column_count(conn).unwrap(),
        T3Table::selected_column_count(conn).unwrap(),
    ];
    assert_eq!(sizes, [2, 3, 3, 2]);
    splitting_adapters(&sizes, total_columns).unwrap()
}

fn flat_adapter(adapters: &[ScopeAdapter]) -> ScopeAdapter {
    ScopeAdapter::scopes([
        ("t1", adapters[0].clone()),
        ("t2Left", adapters[1].clone()),
        ("t2Right", adapters[2].clone()),
        ("t3", adapters[3].clone()),
        ("suffix", adapters[4].clone()),
    ])
    .unwrap()
}

fn nested_adapter(adapters: &[ScopeAdapter]) -> ScopeAdapter {
    let pair = || {
        ScopeAdapter::nested([("left", adapters[1].clone()), ("right", adapters[2].clone())])
            .unwrap()
    };
    ScopeAdapter::scopes([
        ("t1", adapters[0].clone()),
        ("optionalT2Pair", pair()),
        ("t2Pair", pair()),
        ("t3", adapters[3].clone()),
    ])
    .unwrap()
}

fn int(i: i64) -> SqlValue {
    SqlValue::Integer(i)
}

fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

fn pairs(row: &RowView) -> Vec<(String, SqlValue)> {
    row.to_pairs()
}

fn named(entries: &[(&str, SqlValue)]) -> Vec<(String, SqlValue)> {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[test]
fn test_tested_sql_matches_expected_sql() {
    assert_eq!(tested_sql(), EXPECTED_SQL);
}

#[test]
fn test_sample_data_unscoped() {
    let conn = setup();
    let stmt = SqliteStatement::prepare(&conn, EXPECTED_SQL).unwrap();
    let mut cursor = StatementCursor::open(stmt).unwrap();
    let rows: Vec<RowView> = cursor.fetch_all().unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(
        pairs(&rows[0]),
        named(&[
            ("id", int(1)),
            ("name", text("A1")),
            ("id", int(1)),
            ("t1id", int(1)),
            ("name", text("left")),
            ("id", int(2)),
            ("t1id", int(1)),
            ("name", text("right")),
            ("t1id", int(1)),
            ("name", text("A3")),
            ("t5count", int(5)),
        ])
    );
    assert_eq!(rows[1].get_named::<i64>("t5count").unwrap(), 2);
    assert_eq!(rows[2].get_named::<i64>("t5count").unwrap(), 0);
}

#[test]
fn test_splitting_row_adapters() {
    let conn = setup();
    let stmt = SqliteStatement::prepare(&conn, &tested_sql()).unwrap();
    let mut cursor = StatementCursor::open(stmt).unwrap();
    let adapters = split_adapters(&conn, cursor.column_count());
    assert_eq!(adapters.len(), 5);

    let rows: Vec<RowView> = cursor
        .adapted_rows(Some(flat_adapter(&adapters)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].unscoped().len(), 11);
    assert_eq!(rows[0], rows[0].unscoped(), "root scope keeps every column");
    assert_eq!(
        pairs(&rows[0].scoped("t1").unwrap()),
        named(&[("id", int(1)), ("name", text("A1"))])
    );
    assert_eq!(
        pairs(&rows[0].scoped("t2Left").unwrap()),
        named(&[("id", int(1)), ("t1id", int(1)), ("name", text("left"))])
    );
    assert_eq!(
        pairs(&rows[0].scoped("t2Right").unwrap()),
        named(&[("id", int(2)), ("t1id", int(1)), ("name", text("right"))])
    );
    assert_eq!(
        pairs(&rows[0].scoped("t3").unwrap()),
        named(&[("t1id", int(1)), ("name", text("A3"))])
    );
    assert_eq!(
        pairs(&rows[0].scoped("suffix").unwrap()),
        named(&[("t5count", int(5))])
    );

    assert_eq!(
        pairs(&rows[1].scoped("t2Left").unwrap()),
        named(&[("id", int(3)), ("t1id", int(2)), ("name", text("left"))])
    );
    assert_eq!(
        pairs(&rows[1].scoped("t2Right").unwrap()),
        named(&[
            ("id", SqlValue::Null),
            ("t1id", SqlValue::Null),
            ("name", SqlValue::Null)
        ])
    );
    assert_eq!(
        pairs(&rows[1].scoped("t3").unwrap()),
        named(&[("t1id", SqlValue::Null), ("name", SqlValue::Null)])
    );
    assert_eq!(
        pairs(&rows[1].scoped("suffix").unwrap()),
        named(&[("t5count", int(2))])
    );

    assert_eq!(
        pairs(&rows[2].scoped("t1").unwrap()),
        named(&[("id", int(3)), ("name", text("A3"))])
    );
    assert!(!rows[2].scoped("t2Left").unwrap().contains_non_null_value());
    assert_eq!(
        pairs(&rows[2].scoped("suffix").unwrap()),
        named(&[("t5count", int(0))])
    );
    assert!(rows[2].scoped("t4").is_none());
}

#[test]
fn test_flat_model() {
    let conn = setup();
    let stmt = SqliteStatement::prepare(&conn, &tested_sql()).unwrap();
    let mut cursor = StatementCursor::open(stmt).unwrap();
    let adapters = split_adapters(&conn, cursor.column_count());
    cursor.set_adapter(Some(flat_adapter(&adapters))).unwrap();

    let models: Vec<FlatModel> = cursor.fetch_all().unwrap();
    assert_eq!(models.len(), 3);

    assert_eq!(models[0].t1, T1 { id: 1, name: "A1".into() });
    assert_eq!(
        models[0].t2_left,
        Some(T2 { id: 1, t1id: 1, name: "left".into() })
    );
    assert_eq!(
        models[0].t2_right,
        Some(T2 { id: 2, t1id: 1, name: "right".into() })
    );
    assert_eq!(models[0].t3, Some(T3 { t1id: 1, name: "A3".into() }));
    assert_eq!(models[0].t5count, 5);

    assert_eq!(models[1].t1, T1 { id: 2, name: "A2".into() });
    assert_eq!(
        models[1].t2_left,
        Some(T2 { id: 3, t1id: 2, name: "left".into() })
    );
    assert_eq!(models[1].t2_right, None);
    assert_eq!(models[1].t3, None);
    assert_eq!(models[1].t5count, 2);

    assert_eq!(models[2].t1, T1 { id: 3, name: "A3".into() });
    assert_eq!(models[2].t2_left, None);
    assert_eq!(models[2].t2_right, None);
    assert_eq!(models[2].t3, None);
    assert_eq!(models[2].t5count, 0);
}

#[test]
fn test_nested_model() {
    let conn = setup();
    let stmt = SqliteStatement::prepare(&conn, &tested_sql()).unwrap();
    let mut cursor = StatementCursor::open(stmt).unwrap();
    let adapters = split_adapters(&conn, cursor.column_count());
    cursor.set_adapter(Some(nested_adapter(&adapters))).unwrap();

    let models: Vec<NestedModel> = cursor.fetch_all().unwrap();
    assert_eq!(models.len(), 3);

    let pair = models[0].optional_t2_pair.as_ref().unwrap();
    assert_eq!(pair.left, Some(T2 { id: 1, t1id: 1, name: "left".into() }));
    assert_eq!(pair.right, Some(T2 { id: 2, t1id: 1, name: "right".into() }));
    assert_eq!(models[0].t2_pair.left, pair.left);
    assert_eq!(models[0].t2_pair.right, pair.right);
    assert_eq!(models[0].t3, Some(T3 { t1id: 1, name: "A3".into() }));
    assert_eq!(models[0].t5count, 5);

    let pair = models[1].optional_t2_pair.as_ref().unwrap();
    assert_eq!(pair.left, Some(T2 { id: 3, t1id: 2, name: "left".into() }));
    assert_eq!(pair.right, None);
    assert_eq!(models[1].t2_pair.right, None);
    assert_eq!(models[1].t3, None);
    assert_eq!(models[1].t5count, 2);

    assert_eq!(models[2].t1, T1 { id: 3, name: "A3".into() });
    assert!(models[2].optional_t2_pair.is_none());
    assert_eq!(models[2].t2_pair.left, None);
    assert_eq!(models[2].t2_pair.right, None);
    assert_eq!(models[2].t5count, 0);
}

#[test]
fn test_nested_scopes_resolve_like_top_level_scopes() {
    let conn = setup();
    let stmt = SqliteStatement::prepare(&conn, &tested_sql()).unwrap();
    let mut cursor = StatementCursor::open(stmt).unwrap();
    let adapters = split_adapters(&conn, cursor.column_count());
    let adapter = flat_adapter(&adapters)
        .with_scope("pair", nested_adapter(&adapters).scope("t2Pair").unwrap().clone())
        .unwrap();
    cursor.set_adapter(Some(adapter)).unwrap();

    for row in cursor.rows() {
        let row = row.unwrap();
        assert_eq!(
            row.scoped_path(&["pair", "left"]).unwrap(),
            row.scoped("t2Left").unwrap()
        );
        assert_eq!(
            row.scoped("pair").unwrap().scoped("right").unwrap(),
            row.scoped("t2Right").unwrap()
        );
    }
}

#[test]
fn test_grouped_scenario_with_suffix_count() {
    let conn = setup();
    let sql = "SELECT t1.id, t1.name, t2Left.id, t2Left.t1id, t2Left.name, \
               t2Right.id, t2Right.t1id, t2Right.name, t3.t1id, t3.name, 5 AS count \
               FROM t1 \
               LEFT JOIN t2 t2Left ON t2Left.t1id = t1.id AND t2Left.name = 'left' \
               LEFT JOIN t2 t2Right ON t2Right.t1id = t1.id AND t2Right.name = 'right' \
               LEFT JOIN t3 ON t3.t1id = t1.id \
               WHERE t1.id = ?";
    let stmt = SqliteStatement::compile(&conn, sql, &[int(1)]).unwrap();
    let mut cursor = StatementCursor::open(stmt).unwrap();
    let adapters = splitting_adapters(&[2, 3, 3, 2], cursor.column_count()).unwrap();
    let adapter = ScopeAdapter::scopes([
        ("g1", adapters[0].clone()),
        ("g2", adapters[1].clone()),
        ("g3", adapters[3].clone()),
        ("suffix", adapters[4].clone()),
    ])
    .unwrap();

    let row = cursor.adapted_rows(Some(adapter)).unwrap().next().unwrap().unwrap();
    assert_eq!(
        row.unscoped().to_values(),
        vec![
            int(1),
            text("A1"),
            int(1),
            int(1),
            text("left"),
            int(2),
            int(1),
            text("right"),
            int(1),
            text("A3"),
            int(5),
        ]
    );
    assert_eq!(row.scoped("g1").unwrap().to_values(), vec![int(1), text("A1")]);
    assert_eq!(row.scoped("g3").unwrap().to_values(), vec![int(1), text("A3")]);
    assert_eq!(row.scoped("suffix").unwrap().value_named("count"), Some(&int(5)));
    assert!(cursor.next_row().unwrap().is_none());
    assert!(cursor.next_row().unwrap().is_none());
}

#[test]
fn test_adapter_exceeding_layout_fails_before_fetching() {
    let conn = setup();
    let stmt = SqliteStatement::prepare(&conn, "SELECT id, name FROM t1").unwrap();
    let cursor = StatementCursor::open(stmt).unwrap();
    assert!(splitting_adapters(&[2, 1], cursor.column_count()).is_err());
}
