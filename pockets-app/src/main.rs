use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use pockets_app::config::CliOverrides;
use pockets_app::forms::{TaxForm, TaxInput, TransactionForm, parse_deduction_arg};
use pockets_app::logging::{enable_file_logging, env_filter_active, init_logging, set_log_level};
use pockets_app::preferences::{PreferenceStore, Preferences, Theme};
use pockets_app::scanner::{MockReceiptScanner, TextReceiptScanner};
use pockets_app::utils::parse_decimal;
use pockets_app::{AppConfig, Pockets, Session};
use pockets_core::Deduction;
use pockets_core::calculations::RegimeComparison;
use pockets_core::scan::{ReceiptScanner, ScanInput};
use pockets_core::{TaxCalculationResult, UserId};
use pockets_data::export_file_name;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Personal finance tracker with an Indian income tax calculator.
#[derive(Debug, Parser)]
#[command(name = "pockets", version)]
struct Cli {
    /// Configuration file. Defaults to `pockets.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend, overriding the config file.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string, e.g. `pockets.db` or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Signed-in user. Create one with `pockets user new`.
    #[arg(long, global = true, env = "POCKETS_USER_ID")]
    user: Option<UserId>,

    /// Log level or filter directive. `RUST_LOG` takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage user identities.
    #[command(subcommand)]
    User(UserCommand),
    /// Record and list income and expenses.
    #[command(subcommand)]
    Tx(TxCommand),
    /// Monthly budget categories.
    #[command(subcommand)]
    Budget(BudgetCommand),
    /// Income tax under the old and new regimes.
    #[command(subcommand)]
    Tax(TaxCommand),
    /// Summaries over recorded transactions.
    #[command(subcommand)]
    Report(ReportCommand),
    /// Write transactions to a file.
    #[command(subcommand)]
    Export(ExportCommand),
    /// Read a receipt into an expense.
    Scan(ScanArgs),
    /// Display preferences.
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    /// Print a fresh user id.
    New,
}

#[derive(Debug, Subcommand)]
enum TxCommand {
    Add(TxAddArgs),
    List,
    Delete { id: i64 },
    /// Import a CSV file with the export header.
    Import { file: PathBuf },
}

#[derive(Debug, Args)]
struct TxAddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    amount: String,
    #[arg(long)]
    category: String,
    /// YYYY-MM-DD, today when omitted.
    #[arg(long)]
    date: Option<String>,
    /// `income` or `expense`.
    #[arg(long = "type", default_value = "expense")]
    kind: String,
    #[arg(long)]
    payment_method: Option<String>,
}

#[derive(Debug, Subcommand)]
enum BudgetCommand {
    Add { name: String, allocated: String },
    /// Change a category's allocation.
    Set { id: i64, allocated: String },
    /// Spending against each category for a month.
    List {
        /// Any date in the month, today when omitted.
        #[arg(long)]
        month: Option<NaiveDate>,
    },
    Remove { id: i64 },
}

#[derive(Debug, Args)]
struct TaxArgs {
    /// Gross annual income.
    #[arg(long)]
    income: String,
    /// `id=amount`, repeatable. See `pockets tax deductions`.
    #[arg(long = "deduction", short = 'd', value_parser = parse_deduction_arg)]
    deductions: Vec<(String, String)>,
}

#[derive(Debug, Subcommand)]
enum TaxCommand {
    /// Tax under one regime.
    Calc {
        #[command(flatten)]
        args: TaxArgs,
        #[arg(long, default_value = "new")]
        regime: String,
    },
    /// Both regimes side by side.
    Compare {
        #[command(flatten)]
        args: TaxArgs,
    },
    /// Calculate and store as the latest calculation.
    Save {
        #[command(flatten)]
        args: TaxArgs,
        #[arg(long, default_value = "new")]
        regime: String,
    },
    /// The latest saved calculation.
    Show,
    /// Deductions the old regime recognises.
    Deductions,
}

#[derive(Debug, Subcommand)]
enum ReportCommand {
    Summary,
    Categories,
    Monthly,
}

#[derive(Debug, Subcommand)]
enum ExportCommand {
    Csv {
        /// Defaults to `pockets-export-<date>.csv`.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    Json {
        /// Defaults to `pockets-export-<date>.json`.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Receipt file. Plain text unless `--mock` is given.
    file: Option<PathBuf>,
    /// Receipt text instead of a file.
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,
    /// Use the mock scanner, which accepts any input.
    #[arg(long)]
    mock: bool,
    /// Store the scanned expense.
    #[arg(long)]
    save: bool,
}

#[derive(Debug, Subcommand)]
enum PrefsCommand {
    Show,
    Currency { symbol: String },
    Theme { theme: String },
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging("info");

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config.apply_overrides(&CliOverrides {
        backend: cli.backend.clone(),
        db: cli.db.clone(),
        log_level: cli.log_level.clone(),
    });
    if !env_filter_active() {
        set_log_level(&config.logging.level)?;
    }
    if let Some(file) = &config.logging.file {
        enable_file_logging(file)?;
    }

    let prefs = PreferenceStore::load(&config.preferences.path).context("loading preferences")?;
    let session = cli.user.map(Session::signed_in).unwrap_or_default();

    match cli.command {
        Command::User(UserCommand::New) => {
            let id = UserId::new();
            info!(user = %id, "created user id");
            println!("{id}");
            println!("export POCKETS_USER_ID={id}");
            Ok(())
        }
        Command::Prefs(cmd) => run_prefs(&prefs, cmd),
        cmd => {
            let app = Pockets::connect(&config, session)
                .await
                .with_context(|| format!("opening {} database", config.database.backend))?;
            let fmt = prefs.current();
            match cmd {
                Command::Tx(cmd) => run_tx(&app, &fmt, cmd).await,
                Command::Budget(cmd) => run_budget(&app, &fmt, cmd).await,
                Command::Tax(cmd) => run_tax(&app, &fmt, cmd).await,
                Command::Report(cmd) => run_report(&app, &fmt, cmd).await,
                Command::Export(cmd) => run_export(&app, cmd).await,
                Command::Scan(args) => run_scan(&app, &fmt, args).await,
                Command::User(_) | Command::Prefs(_) => Ok(()),
            }
        }
    }
}

// ─── handlers ────────────────────────────────────────────────────────────────

async fn run_tx(
    app: &Pockets,
    fmt: &Preferences,
    cmd: TxCommand,
) -> Result<()> {
    match cmd {
        TxCommand::Add(args) => {
            let mut form = TransactionForm::new();
            form.title = args.title;
            form.amount = args.amount;
            form.category = args.category;
            form.kind = args.kind;
            form.payment_method = args.payment_method.unwrap_or_default();
            if let Some(date) = args.date {
                form.date = date;
            }
            let tx = app.add_transaction(&mut form).await?;
            println!("added #{} {} {}", tx.id, tx.title, fmt.format_amount(tx.amount));
        }
        TxCommand::List => {
            let transactions = app.transactions().await?;
            if transactions.is_empty() {
                println!("no transactions");
            }
            for tx in transactions {
                println!(
                    "{:>5}  {}  {:<7}  {:<14}  {:>14}  {}",
                    tx.id,
                    tx.date,
                    tx.kind.as_str(),
                    tx.category,
                    fmt.format_amount(tx.amount),
                    tx.title
                );
            }
        }
        TxCommand::Delete { id } => {
            app.delete_transaction(id).await?;
            println!("deleted #{id}");
        }
        TxCommand::Import { file } => {
            let csv = read_file(&file)?;
            let imported = app.import_transactions(&csv).await?;
            println!("imported {} transactions", imported.len());
        }
    }
    Ok(())
}

async fn run_budget(
    app: &Pockets,
    fmt: &Preferences,
    cmd: BudgetCommand,
) -> Result<()> {
    match cmd {
        BudgetCommand::Add { name, allocated } => {
            let category = app
                .add_budget_category(&name, parse_amount(&allocated)?)
                .await?;
            println!(
                "added #{} {} {}",
                category.id,
                category.name,
                fmt.format_amount(category.allocated)
            );
        }
        BudgetCommand::Set { id, allocated } => {
            let category = app.set_budget_allocation(id, parse_amount(&allocated)?).await?;
            println!("{} now {}", category.name, fmt.format_amount(category.allocated));
        }
        BudgetCommand::List { month } => {
            let month_of = month.unwrap_or_else(|| Local::now().date_naive());
            let status = app.budget_status(month_of).await?;
            println!("{}", month_of.format("%B %Y"));
            for line in &status.lines {
                println!(
                    "{:>5}  {:<16}  {:>14} of {:>14}  {:>6}%{}",
                    line.category.id,
                    line.category.name,
                    fmt.format_amount(line.spent),
                    fmt.format_amount(line.category.allocated),
                    line.percent_used,
                    if line.over_budget { "  over budget" } else { "" }
                );
            }
            println!("income       {}", fmt.format_amount(status.income));
            println!("allocated    {}", fmt.format_amount(status.total_allocated));
            println!("spent        {}", fmt.format_amount(status.total_spent));
            println!("unallocated  {}", fmt.format_amount(status.unallocated));
        }
        BudgetCommand::Remove { id } => {
            app.remove_budget_category(id).await?;
            println!("removed #{id}");
        }
    }
    Ok(())
}

async fn run_tax(
    app: &Pockets,
    fmt: &Preferences,
    cmd: TaxCommand,
) -> Result<()> {
    match cmd {
        TaxCommand::Calc { args, regime } => {
            let input = tax_input(args, &regime)?;
            let result = app.calculate(input.income, input.regime, &input.deductions);
            println!("{}", input.regime.label());
            print_result(fmt, &result);
        }
        TaxCommand::Compare { args } => {
            let input = tax_input(args, "new")?;
            let comparison = app.compare(input.income, &input.deductions);
            print_comparison(fmt, &comparison);
        }
        TaxCommand::Save { args, regime } => {
            let input = tax_input(args, &regime)?;
            let saved = app
                .save_calculation(input.income, input.regime, &input.deductions)
                .await?;
            println!("saved {} calculation", saved.regime.label());
            print_result(fmt, &saved.result());
        }
        TaxCommand::Show => match app.latest_calculation().await? {
            Some(saved) => {
                println!(
                    "{} on income {} (saved {})",
                    saved.regime.label(),
                    fmt.format_amount(saved.income),
                    saved.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                );
                print_result(fmt, &saved.result());
            }
            None => println!("no saved calculation"),
        },
        TaxCommand::Deductions => {
            for deduction in Deduction::catalog() {
                let cap = deduction
                    .cap
                    .map_or_else(|| "no limit".to_string(), |c| fmt.format_amount(c));
                println!("{:<10}  {:<40}  {cap}", deduction.id, deduction.name);
            }
        }
    }
    Ok(())
}

async fn run_report(
    app: &Pockets,
    fmt: &Preferences,
    cmd: ReportCommand,
) -> Result<()> {
    match cmd {
        ReportCommand::Summary => {
            let summary = app.summary().await?;
            println!("income        {}", fmt.format_amount(summary.total_income));
            println!("expenses      {}", fmt.format_amount(summary.total_expense));
            println!("balance       {}", fmt.format_amount(summary.balance));
            println!("savings rate  {}%", summary.savings_rate);
            println!("transactions  {}", summary.transaction_count);
        }
        ReportCommand::Categories => {
            for total in app.category_breakdown().await? {
                println!(
                    "{:<16}  {:>14}  {:>6}%",
                    total.category,
                    fmt.format_amount(total.total),
                    total.share
                );
            }
        }
        ReportCommand::Monthly => {
            for month in app.monthly_trend().await? {
                println!(
                    "{}  in {:>14}  out {:>14}  net {:>14}",
                    month.month,
                    fmt.format_amount(month.income),
                    fmt.format_amount(month.expense),
                    fmt.format_amount(month.net)
                );
            }
        }
    }
    Ok(())
}

async fn run_export(
    app: &Pockets,
    cmd: ExportCommand,
) -> Result<()> {
    let today = Local::now().date_naive();
    let (path, content) = match cmd {
        ExportCommand::Csv { output } => (
            output.unwrap_or_else(|| PathBuf::from(export_file_name("csv", today))),
            app.export_csv().await?,
        ),
        ExportCommand::Json { output } => (
            output.unwrap_or_else(|| PathBuf::from(export_file_name("json", today))),
            app.export_json(Utc::now()).await?,
        ),
    };
    std::fs::write(&path, content)
        .with_context(|| format!("writing export to '{}'", path.display()))?;
    info!(path = %path.display(), "export written");
    println!("wrote {}", path.display());
    Ok(())
}

async fn run_scan(
    app: &Pockets,
    fmt: &Preferences,
    args: ScanArgs,
) -> Result<()> {
    let input = match (&args.file, args.text) {
        (_, Some(text)) => ScanInput::Text(text),
        (Some(file), None) if args.mock => ScanInput::Image(
            std::fs::read(file).with_context(|| format!("reading '{}'", file.display()))?,
        ),
        (Some(file), None) => ScanInput::Text(read_file(file)?),
        (None, None) => anyhow::bail!("give a receipt file or --text"),
    };

    let scanner: Box<dyn ReceiptScanner> = if args.mock {
        Box::new(MockReceiptScanner::with_delay(Duration::from_millis(500)))
    } else {
        Box::new(TextReceiptScanner)
    };
    let mut form = app.scan_receipt(scanner.as_ref(), input).await?;
    println!("title     {}", form.title);
    println!("amount    {}", form.amount);
    println!("category  {}", form.category);
    println!("date      {}", form.date);

    if args.save {
        let tx = app.add_transaction(&mut form).await?;
        println!("added #{} {}", tx.id, fmt.format_amount(tx.amount));
    }
    Ok(())
}

fn run_prefs(
    store: &PreferenceStore,
    cmd: PrefsCommand,
) -> Result<()> {
    match cmd {
        PrefsCommand::Show => {}
        PrefsCommand::Currency { symbol } => store.set_currency_symbol(&symbol)?,
        PrefsCommand::Theme { theme } => {
            let theme = Theme::parse(&theme)
                .with_context(|| format!("unknown theme '{theme}', expected light or dark"))?;
            store.set_theme(theme)?;
        }
    }
    let prefs = store.current();
    println!("currency  {}", prefs.currency_symbol);
    println!("theme     {}", prefs.theme);
    if let Some(path) = store.path() {
        debug!(path = %path.display(), "preferences file");
    }
    Ok(())
}

// ─── helpers ─────────────────────────────────────────────────────────────────

fn tax_input(
    args: TaxArgs,
    regime: &str,
) -> Result<TaxInput> {
    let mut form = TaxForm {
        income: args.income,
        regime: regime.to_string(),
        deductions: args.deductions,
        ..TaxForm::new()
    };
    Ok(form.validate()?)
}

fn parse_amount(raw: &str) -> Result<rust_decimal::Decimal> {
    parse_decimal(raw).with_context(|| format!("'{raw}' is not an amount"))
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))
}

fn print_result(
    fmt: &Preferences,
    result: &TaxCalculationResult,
) {
    println!("  taxable income  {}", fmt.format_amount(result.taxable_income));
    println!("  tax             {}", fmt.format_amount(result.tax));
    println!("  effective rate  {}%", result.effective_rate);
    println!("  in hand         {}", fmt.format_amount(result.in_hand));
}

fn print_comparison(
    fmt: &Preferences,
    comparison: &RegimeComparison,
) {
    println!("income {}", fmt.format_amount(comparison.income));
    println!("Old regime");
    print_result(fmt, &comparison.old);
    println!("New regime");
    print_result(fmt, &comparison.new);
    println!(
        "recommended: {} ({}: {})",
        comparison.better_regime.label(),
        comparison.direction,
        fmt.format_amount(comparison.savings)
    );
}
