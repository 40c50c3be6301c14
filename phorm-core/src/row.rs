use crate::{Result, Value, util::position_of};
use futures::{Stream, StreamExt};
use std::{collections::VecDeque, sync::Arc};

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(names: RowNames, values: Row) -> Self {
        Self {
            labels: names,
            values,
        }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    /// Case-insensitive lookup by column name.
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        position_of(self.labels.iter(), name).map(|i| &self.values[i])
    }
    pub fn contains(&self, name: &str) -> bool {
        position_of(self.labels.iter(), name).is_some()
    }
}

/// Items of a result stream: rows, separated by result set boundaries.
#[derive(Debug)]
pub enum QueryResult {
    Row(RowLabeled),
    /// The rows that follow belong to the next result set.
    NextResultSet,
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowLabeled> for Row {
    fn from(value: RowLabeled) -> Self {
        value.values
    }
}

/// Forward-only reader over one or more result sets.
pub trait RowSource {
    /// Columns of the current row.
    fn field_count(&self) -> usize;
    fn name(&self, i: usize) -> &str;
    fn value(&self, i: usize) -> Value;
    /// Moves to the next row of the current result set, `false` once exhausted.
    fn advance(&mut self) -> Result<bool>;
    /// Moves to the next result set, `false` when there is none.
    fn next_result_set(&mut self) -> bool;

    /// Snapshot of the current row.
    fn current(&self) -> RowLabeled {
        let count = self.field_count();
        RowLabeled::new(
            (0..count).map(|i| self.name(i).to_string()).collect(),
            (0..count).map(|i| self.value(i)).collect(),
        )
    }
}

/// In-memory row source.
///
/// Row read failures are kept in place and surface from [`RowSource::advance`] when reached.
#[derive(Debug, Default)]
pub struct BufferedResults {
    sets: VecDeque<VecDeque<Result<RowLabeled>>>,
    current: Option<RowLabeled>,
}

impl BufferedResults {
    pub fn new() -> Self {
        Default::default()
    }

    /// Single result set with shared labels.
    pub fn from_rows<N, R>(labels: N, rows: impl IntoIterator<Item = R>) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        R: IntoIterator<Item = Value>,
    {
        let mut result = Self::new();
        result.push_set(labels, rows);
        result
    }

    /// Appends a result set.
    pub fn push_set<N, R>(&mut self, labels: N, rows: impl IntoIterator<Item = R>) -> &mut Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        R: IntoIterator<Item = Value>,
    {
        let labels: RowNames = labels.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|v| Ok(RowLabeled::new(labels.clone(), v.into_iter().collect())))
            .collect();
        self.sets.push_back(rows);
        self
    }

    /// Appends a read failure to the last result set.
    pub fn push_error(&mut self, error: crate::Error) -> &mut Self {
        if self.sets.is_empty() {
            self.sets.push_back(VecDeque::new());
        }
        if let Some(last) = self.sets.back_mut() {
            last.push_back(Err(error));
        }
        self
    }

    /// Buffers a result stream. Stream errors are stored as row failures and do not stop the
    /// collection.
    pub async fn collect<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<QueryResult>>,
    {
        let mut result = Self {
            sets: VecDeque::from([VecDeque::new()]),
            current: None,
        };
        let mut stream = std::pin::pin!(stream);
        while let Some(item) = stream.next().await {
            match item {
                Ok(QueryResult::Row(row)) => {
                    if let Some(last) = result.sets.back_mut() {
                        last.push_back(Ok(row));
                    }
                }
                Ok(QueryResult::NextResultSet) => result.sets.push_back(VecDeque::new()),
                Err(e) => {
                    log::debug!("Row read failed while buffering: {e:#}");
                    result.push_error(e);
                }
            }
        }
        log::trace!(
            "Buffered {} result set(s), {} row(s)",
            result.sets.len(),
            result.sets.iter().map(VecDeque::len).sum::<usize>()
        );
        result
    }

    /// Remaining rows of the current result set.
    pub fn remaining(&self) -> usize {
        self.sets.front().map(VecDeque::len).unwrap_or_default()
    }
}

impl RowSource for BufferedResults {
    fn field_count(&self) -> usize {
        self.current.as_ref().map(|v| v.values.len()).unwrap_or_default()
    }
    fn name(&self, i: usize) -> &str {
        self.current
            .as_ref()
            .and_then(|v| v.labels.get(i))
            .map(String::as_str)
            .unwrap_or_default()
    }
    fn value(&self, i: usize) -> Value {
        self.current
            .as_ref()
            .and_then(|v| v.values.get(i))
            .cloned()
            .unwrap_or_default()
    }
    fn advance(&mut self) -> Result<bool> {
        self.current = None;
        match self.sets.front_mut().and_then(VecDeque::pop_front) {
            Some(Ok(row)) => {
                self.current = Some(row);
                Ok(true)
            }
            Some(Err(e)) => Err(e),
            None => Ok(false),
        }
    }
    fn next_result_set(&mut self) -> bool {
        self.current = None;
        self.sets.pop_front();
        !self.sets.is_empty()
    }
    fn current(&self) -> RowLabeled {
        self.current
            .clone()
            .unwrap_or_else(|| RowLabeled::new(Arc::new([]), Box::new([])))
    }
}
