//! Batch ingestion of transactions from uploaded CSV files.
//!
//! The expected format is a headered CSV with at least the columns
//! `Date, Category, Amount, Income/Expense` (`Description` is optional,
//! column order and header casing are irrelevant). Rows that cannot be
//! parsed are skipped and counted, never fatal to the batch.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, transaction::Transaction};

/// Dates as exported by most banking tools, e.g. `2024-07-15`.
const ISO_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
/// Dates as found in the sample household data set, e.g. `15/07/2024`.
const SLASH_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[day]/[month]/[year]");

/// The outcome of parsing one CSV document.
#[derive(Debug, PartialEq)]
pub struct CsvImportResult {
    /// The rows that parsed into valid transactions, in document order.
    pub transactions: Vec<Transaction>,
    /// How many rows were dropped because a field could not be parsed.
    pub skipped: usize,
}

/// Positions of the known columns within a CSV header row.
struct ColumnLayout {
    date: usize,
    category: usize,
    description: Option<usize>,
    amount: usize,
    class: usize,
}

impl ColumnLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, Error> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::InvalidCsv(format!("missing column '{name}'")))
        };

        Ok(Self {
            date: require("Date")?,
            category: require("Category")?,
            description: find("Description"),
            amount: require("Amount")?,
            class: require("Income/Expense")?,
        })
    }
}

/// Parses transactions from CSV `text`.
///
/// Partial success is the default policy: a row with an unparseable date,
/// amount or class is excluded from the result and counted in
/// [CsvImportResult::skipped] without aborting the rest of the batch.
///
/// # Errors
/// Returns [Error::InvalidCsv] if the header row is missing one of the
/// required columns, since in that case no row could ever parse.
pub fn parse_transactions_csv(text: &str) -> Result<CsvImportResult, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| Error::InvalidCsv(format!("could not read header row: {error}")))?;
    let layout = ColumnLayout::from_headers(headers)?;

    let mut transactions = Vec::new();
    let mut skipped = 0;

    for (row_number, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                tracing::debug!("skipping malformed CSV row {row_number}: {error}");
                skipped += 1;
                continue;
            }
        };

        match parse_row(&record, &layout) {
            Some(transaction) => transactions.push(transaction),
            None => {
                tracing::debug!("skipping CSV row {row_number}: {record:?}");
                skipped += 1;
            }
        }
    }

    Ok(CsvImportResult {
        transactions,
        skipped,
    })
}

fn parse_row(record: &csv::StringRecord, layout: &ColumnLayout) -> Option<Transaction> {
    let date = parse_date(record.get(layout.date)?)?;
    let class = record.get(layout.class)?.parse().ok()?;
    let amount: f64 = record.get(layout.amount)?.trim().parse().ok()?;

    let category = record.get(layout.category).unwrap_or_default().trim();
    let description = layout
        .description
        .and_then(|index| record.get(index))
        .unwrap_or_default()
        .trim();

    Transaction::new(
        date,
        category.to_owned(),
        description.to_owned(),
        amount,
        class,
    )
    .ok()
}

fn parse_date(text: &str) -> Option<Date> {
    let trimmed = text.trim();

    Date::parse(trimmed, ISO_DATE_FORMAT)
        .or_else(|_| Date::parse(trimmed, SLASH_DATE_FORMAT))
        .ok()
}
