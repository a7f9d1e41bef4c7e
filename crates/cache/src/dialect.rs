//! SQL dialect differences that the annotation queries depend on.
//!
//! Only the handful of expressions that genuinely differ between engines are
//! rendered here; everything else is plain SQL shared by every dialect.

/// Target SQL engine of a [`Database`](crate::Database).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Aggregate that is true iff every aggregated boolean is true.
    ///
    /// SQLite has no boolean AND aggregate; booleans are stored as 0/1, so
    /// `MIN` over the column gives the same answer.
    pub fn bool_and(self, expr: &str) -> String {
        match self {
            Self::Sqlite => format!("MIN({expr})"),
            Self::Postgres => format!("bool_and({expr})"),
        }
    }

    /// Boolean literal.
    pub fn boolean(self, value: bool) -> &'static str {
        match (self, value) {
            (Self::Sqlite, true) => "1",
            (Self::Sqlite, false) => "0",
            (Self::Postgres, true) => "TRUE",
            (Self::Postgres, false) => "FALSE",
        }
    }

    /// Positional bind parameter (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::Sqlite => format!("?{index}"),
            Self::Postgres => format!("${index}"),
        }
    }
}
