use crate::db::repository;
use crate::error::{LedgerError, Result};
use crate::models::donation::{DATE_TIME_FORMAT, DonationRecord, PaymentMethod, ZakatType};
use crate::models::report::{DateRange, PeriodSummary};
use crate::operations::stats::donation_stats;
use chrono::{Local, NaiveDate};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const SPREADSHEET_NS: &str = "urn:schemas-microsoft-com:office:spreadsheet";
const REPORT_FILE_STEM: &str = "laporan-zakat";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    /// SpreadsheetML 2003 workbook, opened natively by Excel and LibreOffice.
    Excel,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xml",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xls" | "xml" => Ok(ExportFormat::Excel),
            _ => Err(LedgerError::validation(format!(
                "Unsupported export format '{}'. Use csv or excel.",
                s.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportInclude {
    Summary,
    Signatures,
    Notes,
}

impl FromStr for ExportInclude {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "summary" => Ok(ExportInclude::Summary),
            "signatures" => Ok(ExportInclude::Signatures),
            "notes" => Ok(ExportInclude::Notes),
            _ => Err(LedgerError::validation(format!(
                "Unknown export section '{}'. Use summary, signatures or notes.",
                s.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Empty selects every category.
    pub zakat_types: Vec<ZakatType>,
    /// `None` selects every payment method.
    pub payment_method: Option<PaymentMethod>,
    pub formats: Vec<ExportFormat>,
    pub includes: Vec<ExportInclude>,
}

impl ExportConfig {
    pub fn includes(&self, section: ExportInclude) -> bool {
        self.includes.contains(&section)
    }

    pub fn validate(&self) -> Result<()> {
        if self.formats.is_empty() {
            return Err(LedgerError::validation("Select at least one export format"));
        }
        if self
            .start_date
            .zip(self.end_date)
            .is_some_and(|(start, end)| start > end)
        {
            return Err(LedgerError::validation("Start date must not be after end date"));
        }
        Ok(())
    }

    fn matches(&self, donation: &DonationRecord) -> bool {
        DateRange::new(self.start_date, self.end_date).contains(donation.date.date())
            && (self.zakat_types.is_empty() || self.zakat_types.contains(&donation.category))
            && self.payment_method.is_none_or(|m| donation.payment_method == m)
    }
}

enum Cell {
    Text(String),
    Number(Decimal),
}

impl Cell {
    fn as_csv(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(value) => value.to_string(),
        }
    }
}

struct Sheet {
    name: &'static str,
    headers: Vec<&'static str>,
    rows: Vec<Vec<Cell>>,
}

pub fn filter_donations<'a>(
    donations: &'a [DonationRecord],
    config: &ExportConfig,
) -> Vec<&'a DonationRecord> {
    donations.iter().filter(|d| config.matches(d)).collect()
}

pub fn export_filename(format: ExportFormat, date: NaiveDate) -> String {
    format!("zakat_export_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

pub fn export_donations(conn: &Connection, config: &ExportConfig, dir: &Path) -> Result<Vec<PathBuf>> {
    config.validate()?;
    let donations = repository::get_donations_in_range(conn, config.start_date, config.end_date)?;
    export_donations_at(&donations, config, dir, Local::now().date_naive())
}

pub fn export_donations_at(
    donations: &[DonationRecord],
    config: &ExportConfig,
    dir: &Path,
    today: NaiveDate,
) -> Result<Vec<PathBuf>> {
    config.validate()?;
    let selected = filter_donations(donations, config);
    let data = donation_sheet(&selected, config);
    let summary = config
        .includes(ExportInclude::Summary)
        .then(|| summary_sheet(&selected));

    let mut written = Vec::new();
    for &format in &config.formats {
        let path = dir.join(export_filename(format, today));
        match format {
            ExportFormat::Csv => write_csv(&path, &data, summary.as_ref())?,
            ExportFormat::Excel => {
                let mut sheets = vec![&data];
                sheets.extend(summary.as_ref());
                write_workbook(&path, &sheets)?;
            }
        }
        written.push(path);
    }

    tracing::info!(rows = selected.len(), files = written.len(), "exported donations");
    Ok(written)
}

pub fn export_report(summaries: &[PeriodSummary], format: ExportFormat, dir: &Path) -> Result<PathBuf> {
    let sheet = report_sheet(summaries);
    let path = dir.join(format!("{}.{}", REPORT_FILE_STEM, format.extension()));
    match format {
        ExportFormat::Csv => write_csv(&path, &sheet, None)?,
        ExportFormat::Excel => write_workbook(&path, &[&sheet])?,
    }
    tracing::info!(periods = summaries.len(), path = %path.display(), "exported report");
    Ok(path)
}

fn donation_sheet(donations: &[&DonationRecord], config: &ExportConfig) -> Sheet {
    let with_notes = config.includes(ExportInclude::Notes);
    let with_signatures = config.includes(ExportInclude::Signatures);

    let mut headers = vec![
        "ID",
        "Date",
        "Donor",
        "Recipient",
        "On Behalf Of",
        "Amount",
        "Zakat Type",
        "Payment Method",
    ];
    if with_notes {
        headers.push("Notes");
    }
    if with_signatures {
        headers.extend(["Donor Signature", "Recipient Signature"]);
    }

    let rows = donations
        .iter()
        .map(|d| {
            let mut row = vec![
                Cell::Text(d.id.clone()),
                Cell::Text(d.date.format(DATE_TIME_FORMAT).to_string()),
                Cell::Text(d.donor_name.clone()),
                Cell::Text(d.recipient_name.clone()),
                Cell::Text(d.on_behalf_of_summary()),
                Cell::Number(d.amount),
                Cell::Text(d.category.label().to_string()),
                Cell::Text(d.payment_method.label().to_string()),
            ];
            if with_notes {
                row.push(Cell::Text(d.notes.clone().unwrap_or_default()));
            }
            if with_signatures {
                row.push(Cell::Text(d.donor_signature.clone().unwrap_or_default()));
                row.push(Cell::Text(d.recipient_signature.clone().unwrap_or_default()));
            }
            row
        })
        .collect();

    Sheet {
        name: "Donations",
        headers,
        rows,
    }
}

fn summary_sheet(donations: &[&DonationRecord]) -> Sheet {
    let stats = donation_stats(donations.iter().copied());

    let mut rows: Vec<Vec<Cell>> = stats
        .by_category
        .iter()
        .map(|(category, stat)| {
            vec![
                Cell::Text(category.label().to_string()),
                Cell::Number(Decimal::from(stat.count)),
                Cell::Number(stat.total),
            ]
        })
        .collect();
    rows.push(vec![
        Cell::Text("Total".to_string()),
        Cell::Number(Decimal::from(stats.total_count)),
        Cell::Number(stats.total_amount),
    ]);

    Sheet {
        name: "Summary",
        headers: vec!["Category", "Transactions", "Amount"],
        rows,
    }
}

fn report_sheet(summaries: &[PeriodSummary]) -> Sheet {
    let rows = summaries
        .iter()
        .map(|s| {
            let mut row = vec![Cell::Text(s.period_label.clone())];
            row.extend(s.amount_by_category.iter().map(|(_, amount)| Cell::Number(amount)));
            row.push(Cell::Number(s.total));
            row.push(Cell::Number(Decimal::from(s.transaction_count)));
            row
        })
        .collect();

    Sheet {
        name: "Report",
        headers: vec!["Period", "Fitrah", "Mal", "Infak", "Other", "Total", "Transactions"],
        rows,
    }
}

fn write_csv(path: &Path, data: &Sheet, summary: Option<&Sheet>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    write_csv_section(&mut writer, data)?;
    if let Some(summary) = summary {
        writer.write_record([""])?;
        writer.write_record([summary.name])?;
        write_csv_section(&mut writer, summary)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_csv_section<W: Write>(writer: &mut csv::Writer<W>, sheet: &Sheet) -> Result<()> {
    writer.write_record(&sheet.headers)?;
    for row in &sheet.rows {
        writer.write_record(row.iter().map(Cell::as_csv))?;
    }
    Ok(())
}

fn write_workbook(path: &Path, sheets: &[&Sheet]) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    let mut writer = Writer::new_with_indent(file, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("Workbook").with_attributes([("xmlns", SPREADSHEET_NS), ("xmlns:ss", SPREADSHEET_NS)]),
    ))?;
    for sheet in sheets {
        writer.write_event(Event::Start(
            BytesStart::new("Worksheet").with_attributes([("ss:Name", sheet.name)]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("Table")))?;

        let header: Vec<Cell> = sheet.headers.iter().map(|h| Cell::Text(h.to_string())).collect();
        write_row(&mut writer, &header)?;
        for row in &sheet.rows {
            write_row(&mut writer, row)?;
        }

        writer.write_event(Event::End(BytesEnd::new("Table")))?;
        writer.write_event(Event::End(BytesEnd::new("Worksheet")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Workbook")))?;

    writer.into_inner().flush()?;
    Ok(())
}

fn write_row<W: Write>(writer: &mut Writer<W>, cells: &[Cell]) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("Row")))?;
    for cell in cells {
        let (kind, value) = match cell {
            Cell::Text(text) => ("String", text.clone()),
            Cell::Number(number) => ("Number", number.to_string()),
        };
        writer.write_event(Event::Start(BytesStart::new("Cell")))?;
        writer.write_event(Event::Start(
            BytesStart::new("Data").with_attributes([("ss:Type", kind)]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(&value)))?;
        writer.write_event(Event::End(BytesEnd::new("Data")))?;
        writer.write_event(Event::End(BytesEnd::new("Cell")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Row")))?;
    Ok(())
}
