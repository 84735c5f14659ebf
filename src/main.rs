use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use zakat_ledger::config::Config;
use zakat_ledger::db::{connection, repository};
use zakat_ledger::error::{LedgerError, Result};
use zakat_ledger::format::format_currency;
use zakat_ledger::logging::init_tracing;
use zakat_ledger::models::donation::{DATE_TIME_FORMAT, DonationRecord, OnBehalfOf, ZakatType};
use zakat_ledger::models::report::{DateRange, Granularity};
use zakat_ledger::operations::add::{NewDonation, add_donation_to_db, parse_on_behalf_of};
use zakat_ledger::operations::export::{
    ExportConfig, ExportFormat, ExportInclude, export_donations, export_report,
};
use zakat_ledger::operations::import::{ImportFormat, import_donations_to_db};
use zakat_ledger::operations::list::{ListQuery, PageMarker, list_donations, page_window};
use zakat_ledger::operations::receipt::render_receipt;
use zakat_ledger::operations::remove::remove_donation_from_db;
use zakat_ledger::operations::report::{load_report, render_report_text, run_report};
use zakat_ledger::operations::search_by_category::search_donations_by_category_db;
use zakat_ledger::operations::stats::{DEFAULT_RECENT_LIMIT, load_stats, recent_donations};
use zakat_ledger::operations::update::{DonationUpdate, update_donation_in_db};
use zakat_ledger::operations::verify::{VerificationStatus, canonical_base_string, verify_donation};

/// Zakat donation ledger
#[derive(Parser)]
#[command(name = "zakat", version, about, long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Label language for reports (en, id)
    #[arg(long, global = true)]
    locale: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct DonationArgs {
    /// Donor name
    #[arg(long)]
    donor: String,
    /// Recipient name
    #[arg(long)]
    recipient: String,
    /// On-behalf-of entry as kind:name (repeatable)
    #[arg(long = "on-behalf-of", required = true, value_parser = parse_on_behalf_of_arg)]
    on_behalf_of: Vec<OnBehalfOf>,
    /// Amount in rupiah
    #[arg(long)]
    amount: String,
    /// fitrah, mal, infak or other
    #[arg(long = "type", default_value = "fitrah")]
    zakat_type: String,
    /// cash, bank_transfer, e_wallet or other
    #[arg(long, default_value = "cash")]
    method: String,
    #[arg(long)]
    notes: Option<String>,
    /// Donor signature reference (data URL or file path)
    #[arg(long)]
    donor_signature: Option<String>,
    /// Recipient signature reference (data URL or file path)
    #[arg(long)]
    recipient_signature: Option<String>,
}

/// Fields for `update`; type and method keep their stored values when omitted.
#[derive(clap::Args)]
struct UpdateArgs {
    #[arg(long)]
    donor: String,
    #[arg(long)]
    recipient: String,
    #[arg(long = "on-behalf-of", required = true, value_parser = parse_on_behalf_of_arg)]
    on_behalf_of: Vec<OnBehalfOf>,
    #[arg(long)]
    amount: String,
    #[arg(long = "type")]
    zakat_type: Option<String>,
    #[arg(long)]
    method: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    donor_signature: Option<String>,
    #[arg(long)]
    recipient_signature: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new donation
    Add(DonationArgs),
    /// Edit an existing donation
    Update {
        id: String,
        #[command(flatten)]
        fields: UpdateArgs,
    },
    /// Delete a donation
    Remove { id: String },
    /// Show one donation
    Show { id: String },
    /// List donations page by page
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Match donor, recipient or on-behalf-of names
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "type")]
        zakat_type: Option<String>,
    },
    /// List donations of one zakat type
    Search { category: String },
    /// Import donations from a header-less CSV file
    Import { file: PathBuf },
    /// Export donations to CSV and/or Excel
    Export {
        #[arg(long, value_parser = parse_date_arg)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date_arg)]
        to: Option<NaiveDate>,
        /// Zakat types to include, all when omitted
        #[arg(long = "type", value_delimiter = ',')]
        zakat_types: Vec<String>,
        #[arg(long)]
        method: Option<String>,
        /// csv, excel
        #[arg(long = "format", value_delimiter = ',', default_value = "csv")]
        formats: Vec<String>,
        /// summary, signatures, notes
        #[arg(long = "include", value_delimiter = ',')]
        includes: Vec<String>,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Aggregate donations by period
    Report {
        /// daily, weekly, monthly or yearly
        #[arg(default_value = "monthly")]
        period: String,
        #[arg(long, value_parser = parse_date_arg)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date_arg)]
        to: Option<NaiveDate>,
        /// Print a table instead of the interactive view
        #[arg(long)]
        plain: bool,
        /// Write the report as csv or excel instead of displaying it
        #[arg(long)]
        export: Option<String>,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Per-category totals
    Stats,
    /// Most recent donations
    Recent {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Print a receipt for a donation
    Receipt { id: String },
    /// Check a receipt id against the ledger
    Verify {
        id: String,
        /// Also print the canonical record string
        #[arg(long)]
        verbose: bool,
    },
}

fn parse_date_arg(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", raw))
}

fn parse_on_behalf_of_arg(raw: &str) -> std::result::Result<OnBehalfOf, String> {
    parse_on_behalf_of(raw).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?
        .with_db_path(cli.db)
        .with_locale(cli.locale.as_deref())?;
    let conn = connection::establish_connection(&config.db_path)?;

    match cli.command {
        Commands::Add(args) => {
            let donation = add_donation_to_db(
                &conn,
                &NewDonation {
                    donor_name: args.donor,
                    recipient_name: args.recipient,
                    on_behalf_of: args.on_behalf_of,
                    amount: args.amount,
                    zakat_type: args.zakat_type,
                    payment_method: args.method,
                    notes: args.notes,
                    donor_signature: args.donor_signature,
                    recipient_signature: args.recipient_signature,
                },
            )?;
            println!("Donation recorded with id {}", donation.id);
        }
        Commands::Update { id, fields } => {
            let donation = update_donation_in_db(
                &conn,
                &id,
                &DonationUpdate {
                    donor_name: fields.donor,
                    recipient_name: fields.recipient,
                    on_behalf_of: fields.on_behalf_of,
                    amount: fields.amount,
                    zakat_type: fields.zakat_type,
                    payment_method: fields.method,
                    notes: fields.notes,
                    donor_signature: fields.donor_signature,
                    recipient_signature: fields.recipient_signature,
                },
            )?;
            println!("Donation {} updated.", donation.id);
        }
        Commands::Remove { id } => {
            remove_donation_from_db(&conn, &id)?;
            println!("Donation removed successfully.");
        }
        Commands::Show { id } => {
            let donation = repository::get_donation_by_id(&conn, id.trim())?
                .ok_or_else(|| LedgerError::NotFound(format!("Donation {}", id.trim())))?;
            print_details(&donation);
        }
        Commands::List {
            page,
            limit,
            search,
            zakat_type,
        } => {
            let query = ListQuery {
                page,
                limit,
                search,
                category: zakat_type.as_deref().map(ZakatType::from_raw),
            };
            let page = list_donations(&conn, &query)?;
            print_table(&page.items);
            println!(
                "Page {} of {} ({} donations)  {}",
                page.page,
                page.total_pages,
                page.total_items,
                page_bar(page.page, page.total_pages)
            );
        }
        Commands::Search { category } => {
            let donations = search_donations_by_category_db(&conn, &category)?;
            if donations.is_empty() {
                println!("No donations found for type: {}", category);
            } else {
                print_table(&donations);
            }
        }
        Commands::Import { file } => {
            let count = import_donations_to_db(&conn, ImportFormat::Csv, &file)?;
            println!("Successfully imported {} donations.", count);
        }
        Commands::Export {
            from,
            to,
            zakat_types,
            method,
            formats,
            includes,
            out,
        } => {
            let config = ExportConfig {
                start_date: from,
                end_date: to,
                zakat_types: zakat_types.iter().map(|t| ZakatType::from_raw(t)).collect(),
                payment_method: method.as_deref().map(str::parse).transpose()?,
                formats: formats
                    .iter()
                    .map(|f| f.parse())
                    .collect::<Result<Vec<ExportFormat>>>()?,
                includes: includes
                    .iter()
                    .map(|i| i.parse())
                    .collect::<Result<Vec<ExportInclude>>>()?,
            };
            for path in export_donations(&conn, &config, &out)? {
                println!("Wrote {}", path.display());
            }
        }
        Commands::Report {
            period,
            from,
            to,
            plain,
            export,
            out,
        } => {
            let granularity: Granularity = period.parse()?;
            let range = DateRange::new(from, to);
            if let Some(format) = export {
                let summaries = load_report(&conn, granularity, range, config.locale)?;
                let path = export_report(&summaries, format.parse()?, &out)?;
                println!("Wrote {}", path.display());
            } else if plain {
                let summaries = load_report(&conn, granularity, range, config.locale)?;
                print!("{}", render_report_text(&summaries));
            } else {
                run_report(&conn, granularity, range, config.locale)?;
            }
        }
        Commands::Stats => {
            let stats = load_stats(&conn)?;
            println!("{:<10} {:>8} {:>18}", "Type", "Count", "Amount");
            for (category, stat) in &stats.by_category {
                println!(
                    "{:<10} {:>8} {:>18}",
                    category.label(),
                    stat.count,
                    format_currency(stat.total)
                );
            }
            println!(
                "{:<10} {:>8} {:>18}",
                "Total",
                stats.total_count,
                format_currency(stats.total_amount)
            );
        }
        Commands::Recent { limit } => {
            print_table(&recent_donations(&conn, limit)?);
        }
        Commands::Receipt { id } => {
            let donation = repository::get_donation_by_id(&conn, id.trim())?
                .ok_or_else(|| LedgerError::NotFound(format!("Donation {}", id.trim())))?;
            println!("{}", render_receipt(&donation, &config.base_url));
        }
        Commands::Verify { id, verbose } => match verify_donation(&conn, &id)? {
            VerificationStatus::Valid(donation) => {
                println!("Valid receipt.");
                print_details(&donation);
                if verbose {
                    println!("Canonical:      {}", canonical_base_string(&donation));
                }
            }
            VerificationStatus::NotFound => println!("No donation matches id '{}'.", id.trim()),
            VerificationStatus::Invalid => println!("Invalid receipt id."),
        },
    }

    Ok(())
}

fn print_table(donations: &[DonationRecord]) {
    if donations.is_empty() {
        println!("No donations.");
        return;
    }
    println!(
        "{:<36}  {:<19}  {:<20}  {:<20}  {:<7}  {:>15}",
        "ID", "Date", "Donor", "Recipient", "Type", "Amount"
    );
    for d in donations {
        println!(
            "{:<36}  {:<19}  {:<20}  {:<20}  {:<7}  {:>15}",
            d.id,
            d.date.format(DATE_TIME_FORMAT).to_string(),
            truncate(&d.donor_name, 20),
            truncate(&d.recipient_name, 20),
            d.category.label(),
            format_currency(d.amount)
        );
    }
}

fn print_details(donation: &DonationRecord) {
    println!("ID:             {}", donation.id);
    println!("Date:           {}", donation.date.format(DATE_TIME_FORMAT));
    println!("Donor:          {}", donation.donor_name);
    println!("Recipient:      {}", donation.recipient_name);
    println!("On behalf of:   {}", donation.on_behalf_of_summary());
    println!("Type:           {}", donation.category.label());
    println!("Payment method: {}", donation.payment_method.label());
    println!("Amount:         {}", format_currency(donation.amount));
    if let Some(notes) = &donation.notes {
        println!("Notes:          {}", notes);
    }
}

fn page_bar(current: usize, total_pages: usize) -> String {
    page_window(current, total_pages)
        .into_iter()
        .map(|marker| match marker {
            PageMarker::Page(n) if n == current => format!("[{}]", n),
            PageMarker::Page(n) => n.to_string(),
            PageMarker::Gap => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
