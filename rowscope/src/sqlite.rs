///
/// SQLite implementation of `StatementHandle`.
///
/// `SqliteStatement` owns one raw `sqlite3_stmt` compiled on a
/// `rusqlite::Connection`. rusqlite's own `Statement` only steps through a
/// borrowing `Rows` iterator, which cannot be suspended, rewound and resumed
/// by an outside state machine, so the statement is driven through
/// `rusqlite::ffi` directly:
///
/// - prepare: `sqlite3_prepare_v2` on the connection handle
/// - bind:    `sqlite3_bind_*`, text and blobs copied (`SQLITE_TRANSIENT`)
/// - step:    `SQLITE_ROW` → row, `SQLITE_DONE` → done, anything else →
///            `EngineError` with `sqlite3_errmsg`
/// - reset:   `sqlite3_reset`, bindings kept
/// - drop:    `sqlite3_finalize`
///
/// The raw pointers make the type neither `Send` nor `Sync`: a statement
/// stays with the thread that compiled it.
///

use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use rusqlite::{Connection, ffi};
use tracing::debug;

use crate::engine::{StatementHandle, Step};
use crate::errors::{CursorError, EngineError};
use crate::value::SqlValue;

pub struct SqliteStatement<'conn> {
    raw: NonNull<ffi::sqlite3_stmt>,
    db: *mut ffi::sqlite3,
    sql: String,
    _conn: PhantomData<&'conn Connection>,
}

fn engine_error(db: *mut ffi::sqlite3, code: c_int) -> EngineError {
    let message = unsafe {
        let ptr = ffi::sqlite3_errmsg(db);
        if ptr.is_null() {
            String::new()
        } else {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    };
    EngineError::new(code, message)
}

impl<'conn> SqliteStatement<'conn> {
    /// Compiles a single SQL statement.
    pub fn prepare(conn: &'conn Connection, sql: &str) -> Result<Self, CursorError> {
        let c_sql = CString::new(sql)
            .map_err(|_| CursorError::Statement("SQL contains a NUL byte".to_string()))?;
        let db = unsafe { conn.handle() };
        let mut raw: *mut ffi::sqlite3_stmt = ptr::null_mut();
        let mut tail: *const c_char = ptr::null();

        let rc = unsafe {
            ffi::sqlite3_prepare_v2(db, c_sql.as_ptr(), -1, &mut raw, &mut tail)
        };
        if rc != ffi::SQLITE_OK {
            return Err(engine_error(db, rc).into());
        }

        let Some(raw) = NonNull::new(raw) else {
            return Err(CursorError::Statement("SQL contains no statement".to_string()));
        };
        let statement = Self {
            raw,
            db,
            sql: sql.to_string(),
            _conn: PhantomData,
        };

        if !tail.is_null() {
            let remainder = unsafe { CStr::from_ptr(tail) };
            if !remainder.to_string_lossy().trim().is_empty() {
                return Err(CursorError::Statement(
                    "SQL contains more than one statement".to_string(),
                ));
            }
        }

        debug!(sql = %statement.sql, "prepared statement");
        Ok(statement)
    }

    /// Prepares `sql` and binds `params` positionally.
    pub fn compile(
        conn: &'conn Connection,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Self, CursorError> {
        let mut statement = Self::prepare(conn, sql)?;
        statement.bind(params)?;
        Ok(statement)
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter_count(&self) -> usize {
        unsafe { ffi::sqlite3_bind_parameter_count(self.raw.as_ptr()) as usize }
    }

    pub fn is_readonly(&self) -> bool {
        unsafe { ffi::sqlite3_stmt_readonly(self.raw.as_ptr()) != 0 }
    }

    /// Binds every positional parameter. The statement must not be executing.
    pub fn bind(&mut self, params: &[SqlValue]) -> Result<(), CursorError> {
        if !self.is_ready() {
            return Err(CursorError::Misuse(
                "cannot bind parameters while the statement is executing".to_string(),
            ));
        }
        let expected = self.parameter_count();
        if params.len() != expected {
            return Err(CursorError::Statement(format!(
                "expected {} parameters, got {}",
                expected,
                params.len()
            )));
        }

        let stmt = self.raw.as_ptr();
        for (i, param) in params.iter().enumerate() {
            let index = (i + 1) as c_int;
            let rc = unsafe {
                match param {
                    SqlValue::Null => ffi::sqlite3_bind_null(stmt, index),
                    SqlValue::Integer(v) => ffi::sqlite3_bind_int64(stmt, index, *v),
                    SqlValue::Real(v) => ffi::sqlite3_bind_double(stmt, index, *v),
                    SqlValue::Text(s) => ffi::sqlite3_bind_text(
                        stmt,
                        index,
                        s.as_ptr() as *const c_char,
                        s.len() as c_int,
                        ffi::SQLITE_TRANSIENT(),
                    ),
                    SqlValue::Blob(b) => ffi::sqlite3_bind_blob(
                        stmt,
                        index,
                        b.as_ptr() as *const c_void,
                        b.len() as c_int,
                        ffi::SQLITE_TRANSIENT(),
                    ),
                }
            };
            if rc != ffi::SQLITE_OK {
                return Err(engine_error(self.db, rc).into());
            }
        }
        Ok(())
    }
}

impl StatementHandle for SqliteStatement<'_> {
    fn step(&mut self) -> Result<Step, EngineError> {
        let rc = unsafe { ffi::sqlite3_step(self.raw.as_ptr()) };
        match rc {
            ffi::SQLITE_ROW => Ok(Step::Row),
            ffi::SQLITE_DONE => Ok(Step::Done),
            code => Err(engine_error(self.db, code)),
        }
    }

    fn column_count(&self) -> usize {
        unsafe { ffi::sqlite3_column_count(self.raw.as_ptr()) as usize }
    }

    fn column_name(&self, index: usize) -> String {
        unsafe {
            let ptr = ffi::sqlite3_column_name(self.raw.as_ptr(), index as c_int);
            if ptr.is_null() {
                String::new()
            } else {
                CStr::from_ptr(ptr).to_string_lossy().into_owned()
            }
        }
    }

    fn column_value(&self, index: usize) -> SqlValue {
        let stmt = self.raw.as_ptr();
        let col = index as c_int;
        unsafe {
            match ffi::sqlite3_column_type(stmt, col) {
                ffi::SQLITE_INTEGER => SqlValue::Integer(ffi::sqlite3_column_int64(stmt, col)),
                ffi::SQLITE_FLOAT => SqlValue::Real(ffi::sqlite3_column_double(stmt, col)),
                ffi::SQLITE_TEXT => {
                    let ptr = ffi::sqlite3_column_text(stmt, col);
                    let len = ffi::sqlite3_column_bytes(stmt, col) as usize;
                    if ptr.is_null() {
                        SqlValue::Text(String::new())
                    } else {
                        let bytes = std::slice::from_raw_parts(ptr, len);
                        SqlValue::Text(String::from_utf8_lossy(bytes).into_owned())
                    }
                }
                ffi::SQLITE_BLOB => {
                    let ptr = ffi::sqlite3_column_blob(stmt, col) as *const u8;
                    let len = ffi::sqlite3_column_bytes(stmt, col) as usize;
                    if ptr.is_null() {
                        SqlValue::Blob(Vec::new())
                    } else {
                        SqlValue::Blob(std::slice::from_raw_parts(ptr, len).to_vec())
                    }
                }
                _ => SqlValue::Null,
            }
        }
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        // sqlite3_reset repeats the code of a failed last step; that failure
        // was already reported by `step`.
        let rc = unsafe { ffi::sqlite3_reset(self.raw.as_ptr()) };
        if rc != ffi::SQLITE_OK {
            debug!(code = rc, "reset after failed step");
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        unsafe { ffi::sqlite3_stmt_busy(self.raw.as_ptr()) == 0 }
    }
}

impl Drop for SqliteStatement<'_> {
    fn drop(&mut self) {
        unsafe {
            ffi::sqlite3_finalize(self.raw.as_ptr());
        }
    }
}
