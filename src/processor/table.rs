use std::collections::HashSet;
use std::{fs::File, path::Path};

use chrono::NaiveDate;
use memchr::memchr_iter;
use memmap2::Mmap;
use tracing::{debug, info};

use crate::{
    helpers::dates::parse_date,
    processor::{
        AnalysisError, Value,
        column::{Column, ColumnType},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub column_type: ColumnType,
}

impl Field {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Field {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered, uniquely named column declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Result<Self, AnalysisError> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(AnalysisError::Schema(format!(
                    "duplicate column name '{}'",
                    field.name
                )));
            }
        }
        Ok(Schema { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// CSV loading options
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field separator byte
    pub delimiter: u8,
    /// Columns that must parse as dates
    pub date_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            delimiter: b',',
            date_columns: Vec::new(),
        }
    }
}

/// Immutable, column-oriented table with a typed schema.
///
/// Every operation that narrows the rows returns a new `Table`; a loaded table
/// is never modified in place.
///
/// # Example
/// ```rust
/// # use spend_analyzer::{Column, Table};
/// let table = Table::from_columns(vec![
///     ("category", Column::Str(vec![Some("A".into()), Some("B".into())])),
///     ("amount", Column::Int64(vec![Some(10), Some(20)])),
/// ])
/// .unwrap();
/// assert_eq!(table.row_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Builds a table, checking every column against its declared type and
    /// that all columns have the same length
    pub fn new(schema: Schema, columns: Vec<Column>) -> Result<Self, AnalysisError> {
        if schema.fields.len() != columns.len() {
            return Err(AnalysisError::Schema(format!(
                "schema declares {} columns, got {}",
                schema.fields.len(),
                columns.len()
            )));
        }

        let row_count = columns.first().map_or(0, Column::len);
        for (field, column) in schema.fields.iter().zip(&columns) {
            if column.column_type() != field.column_type {
                return Err(AnalysisError::Schema(format!(
                    "column '{}' declared {} but holds {}",
                    field.name,
                    field.column_type,
                    column.column_type()
                )));
            }
            if column.len() != row_count {
                return Err(AnalysisError::Schema(format!(
                    "column '{}' has {} rows, expected {}",
                    field.name,
                    column.len(),
                    row_count
                )));
            }
        }

        Ok(Table {
            schema,
            columns,
            row_count,
        })
    }

    /// Builds a table whose schema is taken from the columns themselves
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Column)>) -> Result<Self, AnalysisError> {
        let (fields, columns): (Vec<Field>, Vec<Column>) = columns
            .into_iter()
            .map(|(name, col)| (Field::new(name, col.column_type()), col))
            .unzip();
        Table::new(Schema::new(fields)?, columns)
    }

    /// Loads a delimited file through a memory map
    ///
    /// The first line is the header. Column types are inferred from every
    /// non-empty field: integer, then float, then date, then string. Empty
    /// fields are missing values.
    ///
    /// # Errors
    /// Returns an [`AnalysisError`] if:
    /// - the file cannot be opened or mapped
    /// - the header is missing or repeats a column name
    /// - a row's field count differs from the header
    /// - a column listed in [`LoadOptions::date_columns`] holds a non-date
    pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<Table, AnalysisError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let table = Self::from_csv_bytes(&mmap[..], options)?;

        info!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.schema().fields().len(),
            "loaded table"
        );
        Ok(table)
    }

    pub fn from_csv_bytes(buf: &[u8], options: &LoadOptions) -> Result<Table, AnalysisError> {
        let buf = buf.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(buf);

        let mut lines = Self::split_lines(buf);
        let (_, header_line) = lines
            .find(|(_, line)| !line.is_empty())
            .ok_or_else(|| AnalysisError::Schema("missing header line".into()))?;

        let headers: Vec<String> = Self::split_fields(header_line, options.delimiter)
            .into_iter()
            .map(|s| String::from_utf8_lossy(s).to_string())
            .collect();
        let num_cols = headers.len();

        // Column-major raw fields
        let mut raw: Vec<Vec<&[u8]>> = vec![Vec::new(); num_cols];
        for (line_no, line) in lines {
            if line.is_empty() {
                continue;
            }
            let fields = Self::split_fields(line, options.delimiter);
            if fields.len() != num_cols {
                return Err(AnalysisError::Schema(format!(
                    "line {}: expected {} fields, got {}",
                    line_no,
                    num_cols,
                    fields.len()
                )));
            }
            for (col_idx, field) in fields.into_iter().enumerate() {
                raw[col_idx].push(field);
            }
        }

        for name in &options.date_columns {
            if !headers.contains(name) {
                return Err(AnalysisError::ColumnNotFound(name.clone()));
            }
        }

        let mut fields = Vec::with_capacity(num_cols);
        let mut columns = Vec::with_capacity(num_cols);
        for (name, values) in headers.into_iter().zip(&raw) {
            let column = if options.date_columns.contains(&name) {
                Self::parse_date_column(&name, values)?
            } else {
                Self::parse_column(Self::infer_type(values), values)
            };
            debug!(column = %name, column_type = %column.column_type(), "inferred column type");
            fields.push(Field::new(name, column.column_type()));
            columns.push(column);
        }

        Table::new(Schema::new(fields)?, columns)
    }

    /// Non-terminated lines with 1-based line numbers; trailing `\r` removed
    fn split_lines(buf: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
        let mut ends: Vec<usize> = memchr_iter(b'\n', buf).collect();
        if buf.last().is_some_and(|&b| b != b'\n') {
            ends.push(buf.len());
        }

        let mut start = 0;
        ends.into_iter().enumerate().map(move |(i, end)| {
            let line = &buf[start..end];
            start = end + 1;
            (i + 1, line.strip_suffix(b"\r").unwrap_or(line))
        })
    }

    fn split_fields(line: &[u8], delimiter: u8) -> Vec<&[u8]> {
        let mut fields = Vec::new();
        let mut field_start = 0;
        for pos in memchr_iter(delimiter, line) {
            fields.push(line[field_start..pos].trim_ascii());
            field_start = pos + 1;
        }
        fields.push(line[field_start..].trim_ascii());
        fields
    }

    fn infer_type(values: &[&[u8]]) -> ColumnType {
        let mut present = values.iter().filter(|f| !f.is_empty()).peekable();
        if present.peek().is_none() {
            return ColumnType::Str;
        }

        let present: Vec<&[u8]> = present.copied().collect();
        if present.iter().all(|f| atoi_simd::parse::<i64>(f).is_ok()) {
            ColumnType::Int64
        } else if present.iter().all(|f| parse_float(f).is_some()) {
            ColumnType::Float64
        } else if present.iter().all(|f| parse_date_bytes(f).is_some()) {
            ColumnType::Date
        } else {
            ColumnType::Str
        }
    }

    // Only called with the type `infer_type` chose, so every present field parses.
    fn parse_column(column_type: ColumnType, values: &[&[u8]]) -> Column {
        fn present(f: &[u8]) -> Option<&[u8]> {
            (!f.is_empty()).then_some(f)
        }

        match column_type {
            ColumnType::Int64 => Column::Int64(
                values
                    .iter()
                    .map(|f| present(f).and_then(|f| atoi_simd::parse::<i64>(f).ok()))
                    .collect(),
            ),
            ColumnType::Float64 => Column::Float64(
                values
                    .iter()
                    .map(|f| present(f).and_then(parse_float))
                    .collect(),
            ),
            ColumnType::Date => Column::Date(
                values
                    .iter()
                    .map(|f| present(f).and_then(parse_date_bytes))
                    .collect(),
            ),
            ColumnType::Str => Column::Str(
                values
                    .iter()
                    .map(|f| present(f).map(|f| String::from_utf8_lossy(f).to_string()))
                    .collect(),
            ),
        }
    }

    fn parse_date_column(name: &str, values: &[&[u8]]) -> Result<Column, AnalysisError> {
        let dates = values
            .iter()
            .map(|f| {
                if f.is_empty() {
                    return Ok(None);
                }
                parse_date_bytes(f)
                    .map(Some)
                    .ok_or_else(|| AnalysisError::Parse {
                        column: name.to_string(),
                        value: String::from_utf8_lossy(f).to_string(),
                        reason: "not a recognised date".into(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Column::Date(dates))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column(&self, name: &str) -> Result<&Column, AnalysisError> {
        self.schema
            .index_of(name)
            .and_then(|idx| self.columns.get(idx))
            .ok_or_else(|| AnalysisError::ColumnNotFound(name.to_string()))
    }

    pub fn value(&self, row: usize, column: &str) -> Result<Value, AnalysisError> {
        Ok(self.column(column)?.get(row))
    }

    /// New table holding the given rows in the given order
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            schema: self.schema.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            row_count: rows.len(),
        }
    }

    /// Checks that every required column exists and drops rows with a missing
    /// value in any column
    pub fn validate(&self, required: &[&str]) -> Result<Table, AnalysisError> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| self.schema.index_of(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(AnalysisError::Schema(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let keep: Vec<usize> = (0..self.row_count)
            .filter(|&row| !self.columns.iter().any(|c| c.is_missing(row)))
            .collect();
        debug!(
            dropped = self.row_count - keep.len(),
            "dropped rows with missing values"
        );
        Ok(self.take_rows(&keep))
    }

    /// Rows whose date in `column` lies in `[start, end]`
    pub fn filter_by_date_range(
        &self,
        column: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Table, AnalysisError> {
        let dates = self.dates(column)?;
        let keep: Vec<usize> = dates
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_some_and(|d| d >= start && d <= end))
            .map(|(i, _)| i)
            .collect();
        Ok(self.take_rows(&keep))
    }

    /// Rows whose value in `column` renders as one of `categories`
    pub fn filter_by_categories<S: AsRef<str>>(
        &self,
        column: &str,
        categories: &[S],
    ) -> Result<Table, AnalysisError> {
        let col = self.column(column)?;
        let wanted: HashSet<&str> = categories.iter().map(AsRef::as_ref).collect();
        let keep: Vec<usize> = (0..self.row_count)
            .filter(|&row| {
                let v = col.get(row);
                !v.is_missing() && wanted.contains(v.to_string().as_str())
            })
            .collect();
        Ok(self.take_rows(&keep))
    }

    /// Interprets `column` as calendar dates, parsing string columns
    pub fn dates(&self, column: &str) -> Result<Vec<Option<NaiveDate>>, AnalysisError> {
        match self.column(column)? {
            Column::Date(values) => Ok(values.clone()),
            Column::Str(values) => values
                .iter()
                .map(|v| match v {
                    None => Ok(None),
                    Some(s) => parse_date(s).map(Some).ok_or_else(|| AnalysisError::Parse {
                        column: column.to_string(),
                        value: s.clone(),
                        reason: "not a recognised date".into(),
                    }),
                })
                .collect(),
            other => {
                let value = (0..other.len())
                    .map(|i| other.get(i))
                    .find(|v| !v.is_missing())
                    .map_or_else(String::new, |v| v.to_string());
                Err(AnalysisError::Parse {
                    column: column.to_string(),
                    value,
                    reason: format!("{} column cannot be read as dates", other.column_type()),
                })
            }
        }
    }
}

fn parse_float(field: &[u8]) -> Option<f64> {
    fast_float::parse::<f64, _>(field)
        .ok()
        .filter(|v| v.is_finite())
}

fn parse_date_bytes(field: &[u8]) -> Option<NaiveDate> {
    std::str::from_utf8(field).ok().and_then(parse_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Table {
        Table::from_csv_bytes(csv.as_bytes(), &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_row_count() {
        let table = load("id,value\n1,10\n2,20\n3,30\n");
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_infers_column_types() {
        let table = load("date,category,amount,qty\n2023-01-01,A,1.5,2\n2023-01-02,B,2,3\n");
        let types: Vec<ColumnType> = table
            .schema()
            .fields()
            .iter()
            .map(|f| f.column_type)
            .collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Date,
                ColumnType::Str,
                ColumnType::Float64,
                ColumnType::Int64
            ]
        );
    }

    #[test]
    fn test_empty_fields_are_missing() {
        let table = load("category,amount\r\nA,\r\n,5\r\n");
        assert!(table.value(0, "amount").unwrap().is_missing());
        assert!(table.value(1, "category").unwrap().is_missing());
        assert_eq!(table.value(1, "amount").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_field_count_mismatch_is_schema_error() {
        let err = Table::from_csv_bytes(b"a,b\n1,2\n3\n", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(msg) if msg.contains("line 3")));
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let err = Table::from_csv_bytes(b"a,a\n1,2\n", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(_)));
    }

    #[test]
    fn test_declared_date_column_must_parse() {
        let options = LoadOptions {
            date_columns: vec!["date".into()],
            ..LoadOptions::default()
        };
        let err = Table::from_csv_bytes(b"date,v\n2023-01-01,1\nsoon,2\n", &options).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { value, .. } if value == "soon"));
    }

    #[test]
    fn test_custom_delimiter() {
        let options = LoadOptions {
            delimiter: b';',
            ..LoadOptions::default()
        };
        let table = Table::from_csv_bytes(b"k;v\nx;1.25\n", &options).unwrap();
        assert_eq!(table.value(0, "v").unwrap(), Value::Float(1.25));
    }

    #[test]
    fn test_new_rejects_type_mismatch() {
        let schema = Schema::new(vec![Field::new("v", ColumnType::Float64)]).unwrap();
        let err = Table::new(schema, vec![Column::Int64(vec![Some(1)])]).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(_)));
    }

    #[test]
    fn test_validate_drops_missing_rows_without_touching_source() {
        let table = load("category,amount\nA,1\nB,\nC,3\n");
        let clean = table.validate(&["category", "amount"]).unwrap();
        assert_eq!(clean.row_count(), 2);
        assert_eq!(table.row_count(), 3);

        let err = table.validate(&["category", "customer"]).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(msg) if msg.contains("customer")));
    }

    #[test]
    fn test_filters_return_new_tables() {
        let table =
            load("date,category,value\n2023-01-01,A,10\n2023-01-02,B,20\n2023-01-03,A,30\n");

        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();
        let by_date = table.filter_by_date_range("date", start, end).unwrap();
        assert_eq!(by_date.row_count(), 2);
        assert_eq!(by_date.value(0, "category").unwrap(), Value::from("B"));

        let by_cat = table.filter_by_categories("category", &["A"]).unwrap();
        assert_eq!(by_cat.row_count(), 2);
        assert_eq!(by_cat.value(1, "value").unwrap(), Value::Int(30));

        assert_eq!(table.row_count(), 3);
    }
}
