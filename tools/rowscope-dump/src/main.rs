///
/// rowscope-dump - Print scoped query results as JSON lines
///
/// Runs one query with a splitting adapter and prints every row as a JSON
/// object:
///
/// ```text
/// rowscope-dump app.db "SELECT t1.*, t2.*, COUNT(*) AS n FROM ..." \
///     --split 2,3 --scopes t1,t2 --suffix extra
/// {"columns":[["id",1],...],"row":{...},"scopes":{"t1":{"row":{...}},...}}
/// ```
///
/// `row` maps names to values (first column wins when names repeat),
/// `columns` keeps every column in order, and `scopes` holds one entry per
/// split scope plus the suffix scope.
///

use clap::Parser;
use serde_json::{Map, Value as Json, json};
use std::path::{Path, PathBuf};
use tracing::{Level, debug};

use rowscope::{
    AccessConfig, RowView, ScopeAdapter, SqlValue, SqliteStatement, StatementCursor,
    splitting_adapters,
};
use rusqlite::{Connection, OpenFlags};

#[derive(Parser)]
#[command(name = "rowscope-dump")]
#[command(author, version, about = "Dump scoped SQLite query results as JSON lines", long_about = None)]
struct Cli {
    /// SQLite database file
    database: PathBuf,

    /// The query to run
    sql: String,

    /// Positional parameter; integers and finite reals are bound as numbers, anything else as text
    #[arg(long = "param")]
    params: Vec<String>,

    /// Column counts of consecutive scopes, e.g. 2,3,3
    #[arg(long, value_delimiter = ',')]
    split: Vec<usize>,

    /// Names of the split scopes, one per --split entry
    #[arg(long, value_delimiter = ',')]
    scopes: Vec<String>,

    /// Name of the scope holding the columns left after the split
    #[arg(long, default_value = "suffix")]
    suffix: String,

    /// Access configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log cursor activity to stderr
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => AccessConfig::from_path(path).map_err(|e| e.to_string())?,
        None => AccessConfig::default(),
    };

    let conn = open_database(&cli.database)?;
    let params: Vec<SqlValue> = cli.params.iter().map(|p| parse_param(p)).collect();
    let statement =
        SqliteStatement::compile(&conn, &cli.sql, &params).map_err(|e| e.to_string())?;
    let mut cursor =
        StatementCursor::with_config(statement, &config).map_err(|e| e.to_string())?;

    let adapter = build_adapter(&cli.split, &cli.scopes, &cli.suffix, cursor.column_count())?;
    let mut printed = 0usize;
    for row in cursor.adapted_rows(adapter).map_err(|e| e.to_string())? {
        let row = row.map_err(|e| e.to_string())?;
        println!("{}", row_to_json(&row));
        printed += 1;
    }
    debug!(rows = printed, "dump finished");
    Ok(())
}

fn open_database(path: &Path) -> Result<Connection, String> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| format!("Cannot open {}: {}", path.display(), e))
}

fn parse_param(param: &str) -> SqlValue {
    if let Ok(i) = param.parse::<i64>() {
        SqlValue::Integer(i)
    } else if let Some(f) = param.parse::<f64>().ok().filter(|f| f.is_finite()) {
        SqlValue::Real(f)
    } else {
        SqlValue::Text(param.to_string())
    }
}

fn build_adapter(
    split: &[usize],
    names: &[String],
    suffix: &str,
    total_columns: usize,
) -> Result<Option<ScopeAdapter>, String> {
    if split.is_empty() {
        if !names.is_empty() {
            return Err("--scopes requires --split".to_string());
        }
        return Ok(None);
    }
    if !names.is_empty() && names.len() != split.len() {
        return Err(format!(
            "--scopes names {} scopes but --split defines {}",
            names.len(),
            split.len()
        ));
    }

    let adapters = splitting_adapters(split, total_columns).map_err(|e| e.to_string())?;
    let scope_names = (0..split.len())
        .map(|i| {
            names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("scope{}", i + 1))
        })
        .chain(std::iter::once(suffix.to_string()));

    ScopeAdapter::scopes(scope_names.zip(adapters))
        .map(Some)
        .map_err(|e| e.to_string())
}

fn value_to_json(value: &SqlValue) -> Json {
    match value {
        SqlValue::Null => Json::Null,
        SqlValue::Integer(i) => json!(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        SqlValue::Text(s) => Json::String(s.clone()),
        SqlValue::Blob(b) => json!(b),
    }
}

fn view_to_json(view: &RowView) -> Map<String, Json> {
    let mut values = Map::new();
    for (name, value) in view.columns() {
        values
            .entry(name.to_string())
            .or_insert_with(|| value_to_json(value));
    }

    let mut object = Map::new();
    object.insert("row".to_string(), Json::Object(values));

    let scopes: Map<String, Json> = view
        .scope_names()
        .filter_map(|name| {
            view.scoped(name)
                .map(|scope| (name.to_string(), Json::Object(view_to_json(&scope))))
        })
        .collect();
    if !scopes.is_empty() {
        object.insert("scopes".to_string(), Json::Object(scopes));
    }
    object
}

fn row_to_json(row: &RowView) -> Json {
    let mut object = view_to_json(row);
    let columns: Vec<Json> = row
        .unscoped()
        .columns()
        .map(|(name, value)| json!([name, value_to_json(value)]))
        .collect();
    object.insert("columns".to_string(), Json::Array(columns));
    Json::Object(object)
}
