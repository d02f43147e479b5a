///
/// # Statement Cursor
///
/// `StatementCursor` drives a compiled statement forward one row at a time.
/// Its state is explicit:
///
/// ```text
///            next_row: row            next_row: done
///   Ready ───────────────▶ Stepped ─────────────────▶ Exhausted
///     ▲                      │  ▲ row                    │
///     │                      └──┘                        │
///     │       next_row: engine error                     │
///     │   Ready/Stepped ─────────────▶ Failed(error)     │
///     └──────────────── reset ◀──────────┴───────────────┘
/// ```
///
/// `Exhausted` keeps answering `None` and `Failed` keeps returning the same
/// error; neither steps the engine again until `reset`.
///
/// ## Iteration
///
/// `rows()` returns an iterator borrowing the cursor. Because the iteration
/// state lives in the cursor, dropping the iterator and calling `rows()` again
/// continues where the previous iterator stopped, and the borrow rules prevent
/// two iterators from walking the same statement at once.
///
/// ## Layout and Scopes
///
/// The column layout is read from the statement on first use and cached until
/// `reset`. An attached `ScopeAdapter` is resolved against that layout when it
/// is attached, so layout mistakes surface before any row is fetched.
///

use std::cell::OnceCell;
use std::iter::FusedIterator;
use std::sync::Arc;

use rusqlite::ffi;
use tracing::{debug, trace, warn};

use crate::adapter::{ResolvedScope, ScopeAdapter};
use crate::config::AccessConfig;
use crate::decode::FromRow;
use crate::engine::{StatementHandle, Step};
use crate::errors::{CursorError, EngineError, LayoutError};
use crate::layout::ColumnLayout;
use crate::row::RowView;
use crate::value::{NumericPolicy, SqlValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorState {
    Ready,
    Stepped,
    Exhausted,
    Failed(EngineError),
}

struct ResolvedViews {
    root: Arc<ResolvedScope>,
    unscoped: Arc<ResolvedScope>,
}

pub struct StatementCursor<S: StatementHandle> {
    statement: S,
    layout: OnceCell<ColumnLayout>,
    state: CursorState,
    adapter: Option<ScopeAdapter>,
    views: Option<ResolvedViews>,
    policy: NumericPolicy,
    trace_rows: bool,
    rows_read: u64,
}

impl<S: StatementHandle> StatementCursor<S> {
    pub fn open(statement: S) -> Result<Self, CursorError> {
        if !statement.is_ready() {
            return Err(CursorError::Statement(
                "statement is already executing".to_string(),
            ));
        }
        Ok(Self {
            statement,
            layout: OnceCell::new(),
            state: CursorState::Ready,
            adapter: None,
            views: None,
            policy: NumericPolicy::default(),
            trace_rows: false,
            rows_read: 0,
        })
    }

    pub fn with_config(statement: S, config: &AccessConfig) -> Result<Self, CursorError> {
        let mut cursor = Self::open(statement)?;
        cursor.policy = config.decode.numeric;
        cursor.trace_rows = config.cursor.trace_rows;
        Ok(cursor)
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn statement(&self) -> &S {
        &self.statement
    }

    pub fn into_statement(self) -> S {
        self.statement
    }

    pub fn layout(&self) -> &ColumnLayout {
        self.layout
            .get_or_init(|| ColumnLayout::from_statement(&self.statement))
    }

    pub fn column_count(&self) -> usize {
        self.layout().column_count()
    }

    pub fn column_names(&self) -> &[String] {
        self.layout().column_names()
    }

    pub fn adapter(&self) -> Option<&ScopeAdapter> {
        self.adapter.as_ref()
    }

    /// Attaches (or with `None`, detaches) the adapter applied to every
    /// subsequent row. The adapter is validated against the layout right away.
    pub fn set_adapter(&mut self, adapter: Option<ScopeAdapter>) -> Result<(), LayoutError> {
        let views = self.resolve_views(adapter.as_ref())?;
        self.adapter = adapter;
        self.views = Some(views);
        Ok(())
    }

    fn resolve_views(&self, adapter: Option<&ScopeAdapter>) -> Result<ResolvedViews, LayoutError> {
        let layout = self.layout();
        let unscoped = Arc::new(ResolvedScope::unscoped(layout));
        let root = match adapter {
            Some(adapter) => Arc::new(adapter.resolve(layout)?),
            None => Arc::clone(&unscoped),
        };
        Ok(ResolvedViews { root, unscoped })
    }

    /// Advances the statement one row.
    ///
    /// Returns `Ok(None)` at the end of the results, and on every later call
    /// until `reset`. The adapter is resolved against the layout before the
    /// engine is stepped, so a `LayoutError` never consumes a row.
    pub fn next_row(&mut self) -> Result<Option<RowView>, CursorError> {
        match &self.state {
            CursorState::Exhausted => return Ok(None),
            CursorState::Failed(err) => return Err(CursorError::Engine(err.clone())),
            CursorState::Ready | CursorState::Stepped => {}
        }

        let (root, unscoped) = self.resolved_views()?;
        match self.statement.step() {
            Ok(Step::Row) => {
                let expected = self.column_count();
                let actual = self.statement.column_count();
                if actual != expected {
                    let err = EngineError::new(
                        ffi::SQLITE_SCHEMA,
                        format!(
                            "statement returns {} columns but its layout has {}",
                            actual, expected
                        ),
                    );
                    return Err(self.fail(err));
                }

                self.state = CursorState::Stepped;
                self.rows_read += 1;
                let values: Arc<[SqlValue]> = (0..expected)
                    .map(|i| self.statement.column_value(i))
                    .collect();
                let row = RowView::new(values, root, unscoped, self.policy);
                if self.trace_rows {
                    trace!(row = self.rows_read, values = ?row.unscoped(), "stepped row");
                } else {
                    trace!(row = self.rows_read, "stepped row");
                }
                Ok(Some(row))
            }
            Ok(Step::Done) => {
                debug!(rows = self.rows_read, "statement exhausted");
                self.state = CursorState::Exhausted;
                Ok(None)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn fail(&mut self, err: EngineError) -> CursorError {
        warn!(code = err.code, message = %err.message, "statement step failed");
        self.state = CursorState::Failed(err.clone());
        CursorError::Engine(err)
    }

    fn resolved_views(&mut self) -> Result<(Arc<ResolvedScope>, Arc<ResolvedScope>), LayoutError> {
        let views = match self.views.take() {
            Some(views) => views,
            None => self.resolve_views(self.adapter.as_ref())?,
        };
        let shared = (Arc::clone(&views.root), Arc::clone(&views.unscoped));
        self.views = Some(views);
        Ok(shared)
    }

    /// Returns the cursor to `Ready` so the statement runs again from its
    /// first row. A one-shot statement that already completed stays
    /// `Exhausted`.
    ///
    /// The layout is read again and the attached adapter re-resolved against
    /// it. If the adapter no longer fits, the error is returned here and by
    /// every `next_row` until the adapter is replaced; no row is stepped.
    pub fn reset(&mut self) -> Result<(), CursorError> {
        if self.state == CursorState::Exhausted && !self.statement.is_reexecutable() {
            debug!("reset ignored for exhausted one-shot statement");
            return Ok(());
        }
        self.statement.reset()?;
        debug!(rows = self.rows_read, "statement reset");
        self.state = CursorState::Ready;
        self.layout = OnceCell::new();
        self.views = None;
        self.rows_read = 0;
        self.views = Some(self.resolve_views(self.adapter.as_ref())?);
        Ok(())
    }

    pub fn rows(&mut self) -> Rows<'_, S> {
        Rows {
            cursor: self,
            fused: false,
        }
    }

    /// Attaches `adapter` and iterates the remaining rows.
    pub fn adapted_rows(&mut self, adapter: Option<ScopeAdapter>) -> Result<Rows<'_, S>, CursorError> {
        self.set_adapter(adapter)?;
        Ok(self.rows())
    }

    pub fn fetch_all<T: FromRow>(&mut self) -> Result<Vec<T>, CursorError> {
        let mut records = Vec::new();
        while let Some(row) = self.next_row()? {
            records.push(T::from_row(&row)?);
        }
        Ok(records)
    }

    pub fn fetch_one<T: FromRow>(&mut self) -> Result<Option<T>, CursorError> {
        match self.next_row()? {
            Some(row) => Ok(Some(T::from_row(&row)?)),
            None => Ok(None),
        }
    }
}

/// Iterates a statement with an optional adapter. Equivalent to
/// `cursor.adapted_rows(adapter)`.
pub fn iterate<S: StatementHandle>(
    cursor: &mut StatementCursor<S>,
    adapter: Option<ScopeAdapter>,
) -> Result<Rows<'_, S>, CursorError> {
    cursor.adapted_rows(adapter)
}

/// Row iterator over a `StatementCursor`. Stops after yielding an error.
pub struct Rows<'c, S: StatementHandle> {
    cursor: &'c mut StatementCursor<S>,
    fused: bool,
}

impl<S: StatementHandle> Iterator for Rows<'_, S> {
    type Item = Result<RowView, CursorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.cursor.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(err) => {
                self.fused = true;
                Some(Err(err))
            }
        }
    }
}

impl<S: StatementHandle> FusedIterator for Rows<'_, S> {}
