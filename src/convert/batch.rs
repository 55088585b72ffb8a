//! Batch conversion with a resumable date watermark.

use std::borrow::Borrow;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use super::record::RecordConverter;
use crate::config::DEFAULT_MAX_SYNCED_DATE;
use crate::contacts::ContactDirectory;
use crate::model::message::ConversionResult;
use crate::model::row::Row;

/// Drives a [`RecordConverter`] over a stream of rows.
pub struct BatchConverter<D> {
    converter: RecordConverter<D>,
}

impl<D: ContactDirectory> BatchConverter<D> {
    pub fn new(converter: RecordConverter<D>) -> Self {
        Self { converter }
    }

    pub fn converter(&self) -> &RecordConverter<D> {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut RecordConverter<D> {
        &mut self.converter
    }

    pub fn into_inner(self) -> RecordConverter<D> {
        self.converter
    }

    /// Convert rows in order until `max_entries` messages were produced or
    /// the rows run out.
    ///
    /// Skipped rows are consumed but do not count toward the limit. The
    /// returned `max_date` is the highest date over every row visited,
    /// skipped or not, and never below `floor_date`.
    pub fn convert_batch<I>(&mut self, rows: I, max_entries: usize, floor_date: i64) -> ConversionResult
    where
        I: IntoIterator,
        I::Item: Borrow<Row>,
    {
        self.run(rows, max_entries, floor_date, None)
    }

    /// Like [`convert_batch`](Self::convert_batch), checking `cancel` before
    /// each row.
    ///
    /// On cancellation the result covers exactly the rows visited so far.
    pub fn convert_batch_cancellable<I>(
        &mut self,
        rows: I,
        max_entries: usize,
        floor_date: i64,
        cancel: &AtomicBool,
    ) -> ConversionResult
    where
        I: IntoIterator,
        I::Item: Borrow<Row>,
    {
        self.run(rows, max_entries, floor_date, Some(cancel))
    }

    fn run<I>(
        &mut self,
        rows: I,
        max_entries: usize,
        floor_date: i64,
        cancel: Option<&AtomicBool>,
    ) -> ConversionResult
    where
        I: IntoIterator,
        I::Item: Borrow<Row>,
    {
        let mut messages = Vec::with_capacity(max_entries.min(1024));
        let mut max_date = floor_date;
        let mut visited: u64 = 0;
        let mut rows = rows.into_iter();

        while messages.len() < max_entries {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                info!(visited, converted = messages.len(), "Conversion cancelled");
                break;
            }
            let Some(row) = rows.next() else {
                break;
            };
            let row: &Row = row.borrow();
            visited += 1;

            if let Some(date) = row.date_millis() {
                max_date = max_date.max(date);
            }

            match self.converter.convert(row) {
                Some(message) => messages.push(message),
                None => debug!(visited, "Row skipped"),
            }
        }

        info!(
            visited,
            converted = messages.len(),
            max_date,
            "Batch converted"
        );

        ConversionResult { max_date, messages }
    }
}

/// Rows dated after `floor`, oldest first, as the store query returns them.
///
/// Rows without a parsable date never compare greater than a real
/// watermark, so they are only kept when `floor` is
/// [`DEFAULT_MAX_SYNCED_DATE`], i.e. on a full backup.
pub fn pending_rows(rows: Vec<Row>, floor: i64) -> Vec<Row> {
    let full = floor == DEFAULT_MAX_SYNCED_DATE;
    let mut pending: Vec<Row> = rows
        .into_iter()
        .filter(|r| match r.date_millis() {
            Some(date) => date > floor,
            None => full,
        })
        .collect();
    pending.sort_by_key(|r| r.date_millis().unwrap_or(i64::MIN));
    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::directory::StaticDirectory;
    use crate::convert::record::ConversionContext;
    use crate::model::address::EmailAddress;
    use crate::model::row::columns;

    fn batch() -> BatchConverter<StaticDirectory> {
        let ctx = ConversionContext::new(EmailAddress::bare("me@example.com"), "tok", true, "1");
        BatchConverter::new(RecordConverter::new(ctx, StaticDirectory::default()))
    }

    fn row(address: &str, date: &str) -> Row {
        Row::new()
            .with(columns::ADDRESS, address)
            .with(columns::DATE, date)
            .with(columns::TYPE, "1")
    }

    #[test]
    fn test_converts_all_rows() {
        let rows = vec![row("+1", "10"), row("+2", "20"), row("+3", "15")];
        let result = batch().convert_batch(&rows, 10, -1);
        assert_eq!(result.messages.len(), 3);
        assert_eq!(result.max_date, 20);
        assert_eq!(result.messages[1].header("X-smssync-address"), Some("+2"));
    }

    #[test]
    fn test_max_entries_limits_messages_not_rows() {
        let rows = vec![
            row("", "50"),
            row("+1", "10"),
            row("  ", "60"),
            row("+2", "20"),
            row("+3", "99"),
        ];
        let mut iter = rows.iter();
        let result = batch().convert_batch(iter.by_ref(), 2, -1);
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.max_date, 60);
        // the fifth row was never pulled
        assert_eq!(iter.next().map(|r| r.date_millis()), Some(Some(99)));
    }

    #[test]
    fn test_zero_max_entries_consumes_nothing() {
        let rows = vec![row("+1", "10")];
        let result = batch().convert_batch(&rows, 0, 5);
        assert!(result.messages.is_empty());
        assert_eq!(result.max_date, 5);
    }

    #[test]
    fn test_watermark_counts_skipped_rows() {
        let rows = vec![row("+1", "10"), row("", "500")];
        let result = batch().convert_batch(&rows, 10, -1);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.max_date, 500);
    }

    #[test]
    fn test_watermark_never_below_floor() {
        let rows = vec![row("+1", "10"), row("+2", "bogus")];
        let result = batch().convert_batch(&rows, 10, 1000);
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.max_date, 1000);
    }

    #[test]
    fn test_empty_input() {
        let result = batch().convert_batch(Vec::<Row>::new(), 10, -1);
        assert!(result.messages.is_empty());
        assert_eq!(result.max_date, -1);
    }

    #[test]
    fn test_cancelled_before_start() {
        let rows = vec![row("+1", "10")];
        let cancel = AtomicBool::new(true);
        let result = batch().convert_batch_cancellable(&rows, 10, -1, &cancel);
        assert!(result.messages.is_empty());
        assert_eq!(result.max_date, -1);
    }

    #[test]
    fn test_cancel_between_rows() {
        let cancel = AtomicBool::new(false);
        let rows = vec![row("+1", "10"), row("+2", "20"), row("+3", "30")];
        // flip the flag once the first row has been handed out
        let iter = rows.iter().enumerate().map(|(i, r)| {
            if i == 0 {
                cancel.store(true, Ordering::Relaxed);
            }
            r
        });
        let mut conv = batch();
        let result = conv.convert_batch_cancellable(iter, 10, -1, &cancel);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.max_date, 10);
        assert_eq!(conv.converter().resolver().cache().len(), 1);
    }

    fn dates(rows: &[Row]) -> Vec<Option<&str>> {
        rows.iter().map(|r| r.get(columns::DATE)).collect()
    }

    #[test]
    fn test_pending_rows_strictly_after_floor() {
        let rows = vec![row("+1", "100"), row("+2", "200"), row("+3", "300")];
        let pending = pending_rows(rows, 200);
        assert_eq!(dates(&pending), vec![Some("300")]);
    }

    #[test]
    fn test_pending_rows_undated_only_on_full_backup() {
        let rows = vec![row("+1", "bogus"), row("+2", "50"), Row::new().with(columns::ADDRESS, "+3")];
        let incremental = pending_rows(rows.clone(), 10);
        assert_eq!(dates(&incremental), vec![Some("50")]);

        let full = pending_rows(rows, DEFAULT_MAX_SYNCED_DATE);
        assert_eq!(full.len(), 3);
        assert_eq!(full[2].get(columns::DATE), Some("50"));
    }

    #[test]
    fn test_pending_rows_sorted_oldest_first() {
        let rows = vec![row("+1", "30"), row("+2", "10"), row("+3", "20")];
        let pending = pending_rows(rows, DEFAULT_MAX_SYNCED_DATE);
        assert_eq!(dates(&pending), vec![Some("10"), Some("20"), Some("30")]);
    }
}
