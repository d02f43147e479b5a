///
/// The statement interface consumed by `StatementCursor`.
///
/// A `StatementHandle` is a compiled, bound statement. The cursor only needs
/// to step it, read the current row's columns, and reset it. `SqliteStatement`
/// is the SQLite implementation; tests drive the cursor with scripted handles.
///

use crate::errors::EngineError;
use crate::value::SqlValue;

/// Outcome of a successful step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Row,
    Done,
}

pub trait StatementHandle {
    /// Advances the statement by one row.
    fn step(&mut self) -> Result<Step, EngineError>;

    fn column_count(&self) -> usize;

    fn column_name(&self, index: usize) -> String;

    /// Value of column `index` in the current row. Only meaningful after
    /// `step` returned `Step::Row`.
    fn column_value(&self, index: usize) -> SqlValue;

    /// Rewinds the statement so it can execute again from the first row.
    fn reset(&mut self) -> Result<(), EngineError>;

    /// False while the statement is in the middle of an execution.
    fn is_ready(&self) -> bool {
        true
    }

    /// False for one-shot statements that cannot run again after completion.
    fn is_reexecutable(&self) -> bool {
        true
    }
}

impl<S: StatementHandle + ?Sized> StatementHandle for &mut S {
    fn step(&mut self) -> Result<Step, EngineError> {
        (**self).step()
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn column_name(&self, index: usize) -> String {
        (**self).column_name(index)
    }

    fn column_value(&self, index: usize) -> SqlValue {
        (**self).column_value(index)
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        (**self).reset()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn is_reexecutable(&self) -> bool {
        (**self).is_reexecutable()
    }
}
