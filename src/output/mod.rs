//! Output formatting and display system
//!
//! Results are written twice: appended to the results file through a
//! [`ReportFormatter`] and echoed to the terminal by the [`ConsoleReporter`].

mod console;
mod formatter;
mod sink;
mod table;

pub use console::{ColorScheme, ConsoleReporter, SweepSummary};
pub use formatter::{
    JsonFormatter, ReportContext, ReportFormatter, ReportFormatterFactory, TableFormatter, SAMPLE_COLUMNS,
};
pub use sink::ResultFileSink;
pub use table::{Alignment, Column, RowData, Table};
