//! CLI binary for managing personal finances from the terminal.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use fintrack::calc::{self, DashboardSummary};
use fintrack::draft::{BudgetDraft, PaymentDraft};
use fintrack::format::{format_currency, format_date, normalize_date, parse_formatted_number};
use fintrack::models::{
    Budget, Classification, CompletedDebt, CompletedSaving, Contribution, Currency, Debt, Income,
    IncomeFrequency, InterestType, MonthKey, NaiveDate, NewDebt, Payment, SavingsGoal,
    SubCategory, Transaction,
};
use fintrack::storage::{FileStorage, StateStorage};
use fintrack::store::{Action, FinanceStore};
use owo_colors::OwoColorize;

/// Track budgets, expenses, debts, income and savings goals.
#[derive(Debug, Parser)]
#[command(name = "fintrack", version, about)]
struct Cli {
    /// Override the data directory (default: $FINTRACK_DATA_DIR or the
    /// XDG data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Show income, spendable balance, expenses, savings and debt.
    Summary,
    /// List budget categories with their allocations.
    Budgets,
    /// Add a budget category.
    AddBudget(BudgetArgs),
    /// Set (or remove) one subcategory allocation of a budget.
    SetAllocation {
        /// Budget id, id prefix or category name.
        budget: String,
        /// Subcategory name.
        sub_category: String,
        /// Amount to allocate.
        #[arg(value_parser = parse_amount, required_unless_present = "remove")]
        amount: Option<f64>,
        /// Remove the subcategory instead.
        #[arg(long)]
        remove: bool,
    },
    /// Delete a budget category.
    DeleteBudget {
        /// Budget id, id prefix or category name.
        budget: String,
    },
    /// List recorded expenses.
    Expenses,
    /// Record an expense.
    AddExpense {
        /// Amount spent (e.g. "1,250.00").
        #[arg(value_parser = parse_amount)]
        amount: f64,
        /// What the money was spent on.
        description: String,
        /// Budget category label.
        #[arg(long, default_value = "Uncategorized")]
        category: String,
        /// Date of the expense (YYYY-MM-DD, default: today).
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// List active debts.
    Debts,
    /// Add a debt.
    AddDebt(DebtArgs),
    /// Record a payment on a debt.
    Pay {
        /// Debt id, id prefix or name.
        debt: String,
        /// Amount paid.
        #[arg(value_parser = parse_amount)]
        amount: f64,
        /// Payment date (YYYY-MM-DD, default: today).
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Change the amount of a recorded payment.
    EditPayment {
        /// Debt id, id prefix or name.
        debt: String,
        /// Payment id or id prefix.
        payment: String,
        /// New amount.
        #[arg(value_parser = parse_amount)]
        amount: f64,
    },
    /// Delete a recorded payment.
    DeletePayment {
        /// Debt id, id prefix or name.
        debt: String,
        /// Payment id or id prefix.
        payment: String,
    },
    /// Remove a debt, moving it to the completed list.
    DeleteDebt {
        /// Debt id, id prefix or name.
        debt: String,
    },
    /// List completed debts.
    CompletedDebts,
    /// Forget all completed debts.
    ClearCompletedDebts,
    /// List this month's income and the monthly archive.
    Incomes,
    /// Record income; past months go to the archive.
    AddIncome {
        /// Where the money came from.
        source: String,
        /// Amount received.
        #[arg(value_parser = parse_amount)]
        amount: f64,
        /// Date received (YYYY-MM-DD, default: today).
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Delete an income entry.
    DeleteIncome {
        /// Income id, id prefix or source.
        income: String,
        /// Archive month key (e.g. "2024-0" for January 2024); omit for
        /// the current month.
        #[arg(long, value_parser = parse_month_key)]
        month: Option<MonthKey>,
    },
    /// Delete a whole month from the income archive.
    DeleteIncomeMonth {
        /// Archive month key (e.g. "2024-0").
        #[arg(value_parser = parse_month_key)]
        month: MonthKey,
    },
    /// Empty the income archive.
    ClearIncomeHistory,
    /// List savings goals.
    Savings,
    /// Add a savings goal.
    AddSavingsGoal {
        /// Goal label.
        goal: String,
        /// Amount to save.
        #[arg(long, value_parser = parse_amount)]
        target: f64,
        /// Start date (YYYY-MM-DD, default: today).
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        /// Target date (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        end: NaiveDate,
    },
    /// Contribute towards a savings goal.
    Contribute {
        /// Goal id, id prefix or label.
        goal: String,
        /// Amount contributed.
        #[arg(value_parser = parse_amount)]
        amount: f64,
        /// Contribution date (YYYY-MM-DD, default: today).
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// List the contributions made towards a savings goal.
    Contributions {
        /// Goal id, id prefix or label.
        goal: String,
    },
    /// Delete a contribution from a savings goal.
    DeleteContribution {
        /// Goal id, id prefix or label.
        goal: String,
        /// Contribution id or id prefix.
        contribution: String,
    },
    /// List savings goals whose target was reached.
    CompletedSavings,
    /// Delete one completed saving.
    DeleteCompletedSaving {
        /// Completed saving id, id prefix or label.
        saving: String,
    },
    /// Forget all completed savings.
    ClearCompletedSavings,
    /// Show or set the display currency.
    Currency {
        /// ISO 4217 code such as EUR.
        code: Option<String>,
    },
    /// Show or set the dark theme preference.
    DarkMode {
        /// "on" or "off".
        #[arg(value_parser = parse_toggle)]
        enabled: Option<bool>,
    },
    /// Convert a periodic amount to its monthly equivalent.
    MonthlyEquivalent {
        /// Amount per period.
        #[arg(value_parser = parse_amount)]
        amount: f64,
        /// weekly, bi-weekly, monthly or annually.
        #[arg(value_parser = parse_frequency)]
        frequency: IncomeFrequency,
    },
}

/// Arguments for the `add-budget` subcommand.
#[derive(Debug, Args)]
struct BudgetArgs {
    /// Category name.
    category: String,
    /// needs, wants or savings.
    #[arg(long, short, value_parser = parse_classification, default_value = "needs")]
    classification: Classification,
    /// Subcategory allocation as NAME=AMOUNT; repeatable.
    #[arg(long = "sub", value_name = "NAME=AMOUNT", value_parser = parse_sub_category)]
    sub_categories: Vec<SubCategory>,
}

/// Arguments for the `add-debt` subcommand.
#[derive(Debug, Args)]
struct DebtArgs {
    /// Display name.
    name: String,
    /// Amount borrowed.
    #[arg(long, value_parser = parse_amount)]
    principal: f64,
    /// Interest rate in percent.
    #[arg(long, default_value_t = 0.0)]
    rate: f64,
    /// Whether the rate is monthly or annual.
    #[arg(long, value_parser = parse_interest_type, default_value = "annual")]
    interest: InterestType,
    /// Repayment horizon in months.
    #[arg(long)]
    months: f64,
    /// Minimum monthly payment.
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    minimum_payment: f64,
}

// ── Argument parsers ─────────────────────────────────────────────────

/// Parses a date for clap, rolling over out-of-range months and days.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    normalize_date(s).map_err(|err| err.to_string())
}

/// Parses a user-typed amount leniently; never fails.
#[allow(
    clippy::unnecessary_wraps,
    reason = "clap value parsers must return a Result"
)]
fn parse_amount(s: &str) -> Result<f64, String> {
    Ok(parse_formatted_number(s))
}

/// Parses a budget classification name.
fn parse_classification(s: &str) -> Result<Classification, String> {
    Classification::ALL
        .into_iter()
        .find(|class| class.label().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("expected needs, wants or savings, got {s:?}"))
}

/// Parses an income frequency name.
fn parse_frequency(s: &str) -> Result<IncomeFrequency, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "weekly" => Ok(IncomeFrequency::Weekly),
        "bi-weekly" | "biweekly" => Ok(IncomeFrequency::BiWeekly),
        "monthly" => Ok(IncomeFrequency::Monthly),
        "annually" | "yearly" => Ok(IncomeFrequency::Annually),
        _ => Err(format!(
            "expected weekly, bi-weekly, monthly or annually, got {s:?}"
        )),
    }
}

/// Parses an interest period name.
fn parse_interest_type(s: &str) -> Result<InterestType, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "monthly" => Ok(InterestType::Monthly),
        "annual" | "annually" | "yearly" => Ok(InterestType::Annual),
        _ => Err(format!("expected monthly or annual, got {s:?}")),
    }
}

/// Parses `NAME=AMOUNT` into a subcategory.
fn parse_sub_category(s: &str) -> Result<SubCategory, String> {
    let (name, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=AMOUNT, got {s:?}"))?;
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(format!("subcategory name is empty in {s:?}"));
    }
    Ok(SubCategory::new(trimmed, parse_formatted_number(amount)))
}

/// Parses an archive month key such as `2024-0`.
fn parse_month_key(s: &str) -> Result<MonthKey, String> {
    s.parse().map_err(|err: fintrack::FinanceError| err.to_string())
}

/// Parses an on/off switch.
fn parse_toggle(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("expected on or off, got {s:?}")),
    }
}

// ── Setup ────────────────────────────────────────────────────────────

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    // `.env` may set RUST_LOG, so it is loaded before the filter is built.
    let _dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let storage = match create_storage(cli.data_dir) {
        Ok(storage) => storage,
        Err(err) => return fail(&format!("failed to initialize storage: {err}")),
    };
    let data_dir = storage.dir().to_path_buf();

    let mut store = match FinanceStore::open(storage) {
        Ok(store) => store,
        Err(err) => {
            let mut stderr = io::stderr().lock();
            writeln!(
                stderr,
                "{} failed to load saved state: {err}",
                "error:".red().bold()
            )?;
            writeln!(
                stderr,
                "  {} remove {} to start over",
                "hint:".cyan(),
                data_dir.join("financeState.json").display()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };
    store.subscribe(|state| {
        tracing::debug!(
            dark_mode = state.dark_mode,
            currency = %state.currency,
            "state updated"
        );
    });

    dispatch(&mut store, cli.command, calc::today())
}

/// Log filter from `RUST_LOG`, defaulting to warnings only.
fn log_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

/// Creates the file storage backend in the resolved data directory.
fn create_storage(data_dir: Option<PathBuf>) -> fintrack::Result<FileStorage> {
    FileStorage::new(FileStorage::resolve_dir(data_dir)?)
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch<S: StateStorage>(
    store: &mut FinanceStore<S>,
    command: Command,
    today: NaiveDate,
) -> io::Result<ExitCode> {
    match command {
        Command::Summary => cmd_summary(store),
        Command::Budgets => cmd_budgets(store),
        Command::AddBudget(args) => cmd_add_budget(store, args),
        Command::SetAllocation {
            budget,
            sub_category,
            amount,
            remove,
        } => cmd_set_allocation(store, &budget, &sub_category, amount.filter(|_| !remove)),
        Command::DeleteBudget { budget } => cmd_delete_budget(store, &budget),
        Command::Expenses => cmd_expenses(store),
        Command::AddExpense {
            amount,
            description,
            category,
            date,
        } => apply(
            store,
            Action::AddTransaction(Transaction::expense(
                amount,
                description,
                category,
                date.unwrap_or(today),
            )),
            "expense recorded",
        ),
        Command::Debts => cmd_debts(store),
        Command::AddDebt(args) => cmd_add_debt(store, args, today),
        Command::Pay { debt, amount, date } => {
            cmd_pay(store, &debt, amount, date.unwrap_or(today))
        }
        Command::EditPayment {
            debt,
            payment,
            amount,
        } => cmd_edit_payment(store, &debt, &payment, Some(amount)),
        Command::DeletePayment { debt, payment } => {
            cmd_edit_payment(store, &debt, &payment, None)
        }
        Command::DeleteDebt { debt } => cmd_delete_debt(store, &debt),
        Command::CompletedDebts => cmd_completed_debts(store),
        Command::ClearCompletedDebts => apply(
            store,
            Action::ClearCompletedDebts,
            "completed debts cleared",
        ),
        Command::Incomes => cmd_incomes(store),
        Command::AddIncome {
            source,
            amount,
            date,
        } => cmd_add_income(
            store,
            Income::new(source, amount, date.unwrap_or(today)),
            today,
        ),
        Command::DeleteIncome { income, month } => cmd_delete_income(store, &income, month),
        Command::DeleteIncomeMonth { month } => cmd_delete_income_month(store, month),
        Command::ClearIncomeHistory => apply(
            store,
            Action::ClearMonthlyIncomes,
            "income history cleared",
        ),
        Command::Savings => cmd_savings(store),
        Command::AddSavingsGoal {
            goal,
            target,
            start,
            end,
        } => apply(
            store,
            Action::AddSavingsGoal(SavingsGoal::new(
                goal,
                target,
                start.unwrap_or(today),
                end,
            )),
            "savings goal added",
        ),
        Command::Contribute { goal, amount, date } => {
            cmd_contribute(store, &goal, amount, date.unwrap_or(today))
        }
        Command::Contributions { goal } => cmd_contributions(store, &goal),
        Command::DeleteContribution { goal, contribution } => {
            cmd_delete_contribution(store, &goal, &contribution)
        }
        Command::CompletedSavings => cmd_completed_savings(store),
        Command::DeleteCompletedSaving { saving } => cmd_delete_completed_saving(store, &saving),
        Command::ClearCompletedSavings => apply(
            store,
            Action::ClearCompletedSavings,
            "completed savings cleared",
        ),
        Command::Currency { code } => cmd_currency(store, code.as_deref()),
        Command::DarkMode { enabled } => cmd_dark_mode(store, enabled),
        Command::MonthlyEquivalent { amount, frequency } => {
            cmd_monthly_equivalent(store, amount, frequency)
        }
    }
}

// ── Shared helpers ───────────────────────────────────────────────────

/// Prints an error line and returns a failing exit code.
fn fail(message: &str) -> io::Result<ExitCode> {
    writeln!(io::stderr().lock(), "{} {message}", "error:".red().bold())?;
    Ok(ExitCode::FAILURE)
}

/// Dispatches an action and reports the outcome.
fn apply<S: StateStorage>(
    store: &mut FinanceStore<S>,
    action: Action,
    done: &str,
) -> io::Result<ExitCode> {
    match store.dispatch(action) {
        Ok(_state) => {
            writeln!(io::stdout().lock(), "{} {done}", "ok:".green().bold())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail(&format!("failed to save: {err}")),
    }
}

/// Finds one entity by exact id, unique id prefix, or case-insensitive
/// name, printing an error when nothing or more than one thing matches.
fn resolve<'items, T>(
    label: &str,
    query: &str,
    items: &'items [T],
    key: fn(&T) -> (&str, &str),
) -> io::Result<Option<&'items T>> {
    if let Some(exact) = items.iter().find(|item| key(item).0 == query) {
        return Ok(Some(exact));
    }
    let wanted = query.to_lowercase();
    let matches: Vec<&T> = items
        .iter()
        .filter(|item| {
            let (id, name) = key(item);
            id.starts_with(query) || name.to_lowercase() == wanted
        })
        .collect();
    match *matches.as_slice() {
        [one] => Ok(Some(one)),
        [] => {
            let _code = fail(&format!("{label} not found: {query}"))?;
            Ok(None)
        }
        _ => {
            let _code = fail(&format!(
                "{label} {query:?} is ambiguous ({} matches)",
                matches.len()
            ))?;
            Ok(None)
        }
    }
}

/// Lookup key for budgets.
fn budget_key(budget: &Budget) -> (&str, &str) {
    (budget.id.as_inner(), &budget.category)
}

/// Lookup key for debts.
fn debt_key(debt: &Debt) -> (&str, &str) {
    (debt.id.as_inner(), &debt.name)
}

/// Lookup key for payments (ids only).
fn payment_key(payment: &Payment) -> (&str, &str) {
    (payment.id.as_inner(), "")
}

/// Lookup key for incomes.
fn income_key(income: &Income) -> (&str, &str) {
    (income.id.as_inner(), &income.source)
}

/// Lookup key for savings goals.
fn goal_key(goal: &SavingsGoal) -> (&str, &str) {
    (goal.id.as_inner(), &goal.goal)
}

/// Lookup key for contributions (ids only).
fn contribution_key(contribution: &Contribution) -> (&str, &str) {
    (contribution.id.as_inner(), "")
}

/// Lookup key for completed savings.
fn completed_saving_key(saving: &CompletedSaving) -> (&str, &str) {
    (saving.id.as_inner(), &saving.goal)
}

/// Id shortened to its prefix plus eight characters, enough to type back.
///
/// Ids without a word prefix (bare UUIDs) keep their first eight
/// characters.
fn short_id(id: &str) -> String {
    match id.split_once('-') {
        Some((prefix, rest))
            if prefix.len() != 8 && prefix.chars().all(|ch| ch.is_ascii_lowercase()) =>
        {
            format!("{prefix}-{}", rest.chars().take(8).collect::<String>())
        }
        _ => id.chars().take(8).collect(),
    }
}

/// Builds a table with a colored header row.
///
/// The header color follows the theme preference.
fn new_table(headers: &[&str], dark_mode: bool) -> Table {
    let color = if dark_mode { Color::Cyan } else { Color::Blue };
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(
        headers
            .iter()
            .map(|title| Cell::new(title).fg(color))
            .collect::<Vec<_>>(),
    );
    table
}

/// Formats a percentage with one decimal.
fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

// ── Commands ─────────────────────────────────────────────────────────

/// Executes the `summary` subcommand.
fn cmd_summary<S: StateStorage>(store: &FinanceStore<S>) -> io::Result<ExitCode> {
    let state = store.state();
    let summary = DashboardSummary::from_state(state);
    let money = |amount: f64| format_currency(amount, &state.currency);

    let mut table = new_table(&["Figure", "Amount"], state.dark_mode);
    let spendable = if summary.spendable_balance < 0.0 {
        Cell::new(money(summary.spendable_balance)).fg(Color::Red)
    } else {
        Cell::new(money(summary.spendable_balance)).fg(Color::Green)
    };
    _ = table.add_row(vec![
        Cell::new("Monthly income"),
        Cell::new(money(summary.monthly_income)),
    ]);
    _ = table.add_row(vec![
        Cell::new("Minimum debt payments"),
        Cell::new(money(summary.minimum_payments)),
    ]);
    _ = table.add_row(vec![Cell::new("Spendable balance"), spendable]);
    _ = table.add_row(vec![
        Cell::new("Total expenses"),
        Cell::new(money(summary.total_expenses)),
    ]);
    _ = table.add_row(vec![
        Cell::new("Total savings"),
        Cell::new(money(summary.total_savings)),
    ]);
    _ = table.add_row(vec![
        Cell::new("Debt remaining"),
        Cell::new(money(summary.total_debt)),
    ]);

    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} {}",
        "Summary".green().bold(),
        format_args!("({})", state.currency).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `budgets` subcommand.
fn cmd_budgets<S: StateStorage>(store: &FinanceStore<S>) -> io::Result<ExitCode> {
    let state = store.state();
    let mut out = io::stdout().lock();
    if state.budgets.is_empty() {
        writeln!(out, "{}", "No budgets found.".dimmed())?;
        return Ok(ExitCode::SUCCESS);
    }
    let money = |amount: f64| format_currency(amount, &state.currency);
    let grand_total = calc::budgets_total(&state.budgets);

    let mut table = new_table(
        &["ID", "Category", "Class", "Allocations", "Total", "Share"],
        state.dark_mode,
    );
    for budget in calc::sort_by_amount_descending(&state.budgets) {
        let allocations = budget
            .sub_categories
            .iter()
            .map(|sub| format!("{} {}", sub.name, money(sub.amount)))
            .collect::<Vec<_>>()
            .join("\n");
        let total = budget.total();
        _ = table.add_row(vec![
            Cell::new(short_id(budget.id.as_inner())).fg(Color::DarkGrey),
            Cell::new(&budget.category),
            Cell::new(budget.classification.label()),
            Cell::new(allocations),
            Cell::new(money(total)),
            Cell::new(percent(calc::percentage(total, grand_total))),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Budgets".green().bold(),
        format_args!("({})", state.budgets.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    for class in Classification::ALL {
        let class_total = calc::classification_total(&state.budgets, class);
        writeln!(
            out,
            "  {:<8} {} {}",
            class.label().bold(),
            money(class_total),
            format_args!("({})", percent(calc::percentage(class_total, grand_total))).dimmed()
        )?;
    }
    writeln!(out, "  {:<8} {}", "Total".bold(), money(grand_total))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `add-budget` subcommand.
fn cmd_add_budget<S: StateStorage>(
    store: &mut FinanceStore<S>,
    args: BudgetArgs,
) -> io::Result<ExitCode> {
    let budget = Budget::new(args.category, args.classification, args.sub_categories);
    apply(store, Action::AddBudget(budget), "budget added")
}

/// Executes the `set-allocation` subcommand; `amount == None` removes the
/// subcategory.
fn cmd_set_allocation<S: StateStorage>(
    store: &mut FinanceStore<S>,
    budget_query: &str,
    sub_category: &str,
    amount: Option<f64>,
) -> io::Result<ExitCode> {
    let Some(budget) =
        resolve("budget", budget_query, &store.state().budgets, budget_key)?.cloned()
    else {
        return Ok(ExitCode::FAILURE);
    };
    let mut draft = BudgetDraft::new(&budget);
    let existing = draft.find_sub_category(sub_category);
    match (existing, amount) {
        (Some(index), Some(value)) => {
            let _found = draft.set_sub_category_amount(index, value);
        }
        (None, Some(value)) => draft.add_sub_category(SubCategory::new(sub_category, value)),
        (Some(index), None) => {
            let _removed = draft.remove_sub_category(index);
        }
        (None, None) => {
            return fail(&format!(
                "{} has no subcategory named {sub_category:?}",
                budget.category
            ));
        }
    }
    if !draft.is_dirty() {
        writeln!(io::stdout().lock(), "{}", "Nothing to change.".dimmed())?;
        return Ok(ExitCode::SUCCESS);
    }
    apply(store, draft.commit(), "budget updated")
}

/// Executes the `delete-budget` subcommand.
fn cmd_delete_budget<S: StateStorage>(
    store: &mut FinanceStore<S>,
    budget_query: &str,
) -> io::Result<ExitCode> {
    let Some(id) = resolve("budget", budget_query, &store.state().budgets, budget_key)?
        .map(|budget| budget.id.clone())
    else {
        return Ok(ExitCode::FAILURE);
    };
    apply(store, Action::DeleteBudget(id), "budget deleted")
}

/// Executes the `expenses` subcommand.
fn cmd_expenses<S: StateStorage>(store: &FinanceStore<S>) -> io::Result<ExitCode> {
    let state = store.state();
    let mut out = io::stdout().lock();
    if state.transactions.is_empty() {
        writeln!(out, "{}", "No expenses found.".dimmed())?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut table = new_table(&["Date", "Description", "Category", "Amount"], state.dark_mode);
    for tx in &state.transactions {
        _ = table.add_row(vec![
            Cell::new(format_date(tx.date)),
            Cell::new(&tx.description),
            Cell::new(&tx.category),
            Cell::new(format_currency(tx.amount, &state.currency)).fg(Color::Red),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Expenses".green().bold(),
        format_args!("({})", state.transactions.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    writeln!(
        out,
        "  {} {}",
        "Total".bold(),
        format_currency(calc::total_expenses(&state.transactions), &state.currency)
    )?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `debts` subcommand.
fn cmd_debts<S: StateStorage>(store: &FinanceStore<S>) -> io::Result<ExitCode> {
    let state = store.state();
    let mut out = io::stdout().lock();
    if state.debts.is_empty() {
        writeln!(out, "{}", "No debts found.".dimmed())?;
        return Ok(ExitCode::SUCCESS);
    }
    let money = |amount: f64| format_currency(amount, &state.currency);

    let mut table = new_table(
        &[
            "ID", "Name", "Rate", "Total", "Paid", "Remaining", "Progress", "Min. payment",
        ],
        state.dark_mode,
    );
    for debt in calc::sort_debts_by_total(&state.debts) {
        let rate = match debt.interest_type {
            InterestType::Monthly => format!("{}% / month", debt.interest_rate),
            InterestType::Annual => format!("{}% / year", debt.interest_rate),
        };
        _ = table.add_row(vec![
            Cell::new(short_id(debt.id.as_inner())).fg(Color::DarkGrey),
            Cell::new(&debt.name),
            Cell::new(rate),
            Cell::new(money(debt.total_amount)),
            Cell::new(money(debt.total_paid())).fg(Color::Green),
            Cell::new(money(calc::remaining_balance(&debt))),
            Cell::new(percent(calc::payoff_percentage(&debt))),
            Cell::new(money(debt.minimum_payment)),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Debts".green().bold(),
        format_args!("({})", state.debts.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    writeln!(
        out,
        "  {} {}",
        "Remaining".bold(),
        money(calc::total_remaining_debt(&state.debts))
    )?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `add-debt` subcommand.
fn cmd_add_debt<S: StateStorage>(
    store: &mut FinanceStore<S>,
    args: DebtArgs,
    today: NaiveDate,
) -> io::Result<ExitCode> {
    let debt = NewDebt {
        name: args.name,
        principal: args.principal,
        interest_rate: args.rate,
        interest_type: args.interest,
        months: args.months,
        minimum_payment: args.minimum_payment,
    }
    .build(today);
    let total = format_currency(debt.total_amount, &store.state().currency);
    apply(
        store,
        Action::AddDebt(debt),
        &format!("debt added, {total} to repay"),
    )
}

/// Executes the `pay` subcommand.
fn cmd_pay<S: StateStorage>(
    store: &mut FinanceStore<S>,
    debt_query: &str,
    amount: f64,
    date: NaiveDate,
) -> io::Result<ExitCode> {
    let Some(id) = resolve("debt", debt_query, &store.state().debts, debt_key)?
        .map(|debt| debt.id.clone())
    else {
        return Ok(ExitCode::FAILURE);
    };
    if let Err(err) = store.add_payment(&id, amount, date) {
        return fail(&format!("failed to save: {err}"));
    }
    let state = store.state();
    let mut out = io::stdout().lock();
    match state.debts.iter().find(|debt| debt.id == id) {
        Some(debt) => writeln!(
            out,
            "{} payment recorded, {} remaining",
            "ok:".green().bold(),
            format_currency(calc::remaining_balance(debt), &state.currency)
        )?,
        None => writeln!(
            out,
            "{} payment recorded, debt paid off!",
            "ok:".green().bold()
        )?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `edit-payment` (`amount == Some`) and `delete-payment`
/// (`amount == None`).
fn cmd_edit_payment<S: StateStorage>(
    store: &mut FinanceStore<S>,
    debt_query: &str,
    payment_query: &str,
    amount: Option<f64>,
) -> io::Result<ExitCode> {
    let Some(debt) = resolve("debt", debt_query, &store.state().debts, debt_key)?.cloned() else {
        return Ok(ExitCode::FAILURE);
    };
    let Some(payment_id) = resolve("payment", payment_query, &debt.payments, payment_key)?
        .map(|payment| payment.id.clone())
    else {
        return Ok(ExitCode::FAILURE);
    };

    let mut draft = PaymentDraft::new(&debt);
    let done = match amount {
        Some(value) => {
            let _started = draft.begin_amount_edit(&payment_id);
            let _found = draft.set_amount(&payment_id, value);
            if !draft.finish_amount_edit() {
                writeln!(io::stdout().lock(), "{}", "Nothing to change.".dimmed())?;
                return Ok(ExitCode::SUCCESS);
            }
            "payment updated"
        }
        None => {
            let _deleted = draft.delete(&payment_id);
            "payment deleted"
        }
    };
    apply(store, draft.commit(), done)
}

/// Executes the `delete-debt` subcommand.
fn cmd_delete_debt<S: StateStorage>(
    store: &mut FinanceStore<S>,
    debt_query: &str,
) -> io::Result<ExitCode> {
    let Some(id) = resolve("debt", debt_query, &store.state().debts, debt_key)?
        .map(|debt| debt.id.clone())
    else {
        return Ok(ExitCode::FAILURE);
    };
    match store.delete_debt(&id) {
        Ok(_state) => {
            writeln!(
                io::stdout().lock(),
                "{} debt moved to completed debts",
                "ok:".green().bold()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail(&format!("failed to save: {err}")),
    }
}

/// Executes the `completed-debts` subcommand.
fn cmd_completed_debts<S: StateStorage>(store: &FinanceStore<S>) -> io::Result<ExitCode> {
    let state = store.state();
    let mut out = io::stdout().lock();
    if state.completed_debts.is_empty() {
        writeln!(out, "{}", "No completed debts found.".dimmed())?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut table = new_table(
        &["Name", "Principal", "Amount paid", "Cleared"],
        state.dark_mode,
    );
    for debt in &state.completed_debts {
        _ = table.add_row(completed_row(debt, &state.currency));
    }

    writeln!(
        out,
        "{} {}",
        "Completed Debts".green().bold(),
        format_args!("({})", state.completed_debts.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(ExitCode::SUCCESS)
}

/// Table row for a completed debt.
fn completed_row(debt: &CompletedDebt, currency: &Currency) -> Vec<Cell> {
    vec![
        Cell::new(&debt.name),
        Cell::new(format_currency(debt.principal, currency)),
        Cell::new(format_currency(debt.amount_paid, currency)).fg(Color::Green),
        Cell::new(format_date(debt.date_cleared)),
    ]
}

/// Executes the `incomes` subcommand.
fn cmd_incomes<S: StateStorage>(store: &FinanceStore<S>) -> io::Result<ExitCode> {
    let state = store.state();
    let money = |amount: f64| format_currency(amount, &state.currency);
    let mut out = io::stdout().lock();

    writeln!(
        out,
        "{} {}",
        "This Month".green().bold(),
        format_args!("({})", money(calc::total_income(&state.current_month_incomes))).dimmed()
    )?;
    if state.current_month_incomes.is_empty() {
        writeln!(out, "{}", "No income recorded this month.".dimmed())?;
    } else {
        let mut table = new_table(&["ID", "Date", "Source", "Amount"], state.dark_mode);
        for income in &state.current_month_incomes {
            _ = table.add_row(vec![
                Cell::new(short_id(income.id.as_inner())).fg(Color::DarkGrey),
                Cell::new(format_date(income.date)),
                Cell::new(&income.source),
                Cell::new(money(income.amount)).fg(Color::Green),
            ]);
        }
        writeln!(out, "{table}")?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "{} {}",
        "Income History".green().bold(),
        format_args!("({} months)", state.monthly_incomes.len()).dimmed()
    )?;
    if state.monthly_incomes.is_empty() {
        writeln!(out, "{}", "No income history found.".dimmed())?;
        return Ok(ExitCode::SUCCESS);
    }
    let mut table = new_table(&["Key", "Month", "Entries", "Total"], state.dark_mode);
    for bucket in &state.monthly_incomes {
        _ = table.add_row(vec![
            Cell::new(bucket.month_key).fg(Color::DarkGrey),
            Cell::new(&bucket.month_name),
            Cell::new(bucket.incomes.len()),
            Cell::new(money(bucket.total_income)),
        ]);
    }
    writeln!(out, "{table}")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `add-income` subcommand.
fn cmd_add_income<S: StateStorage>(
    store: &mut FinanceStore<S>,
    income: Income,
    today: NaiveDate,
) -> io::Result<ExitCode> {
    let current = calc::is_same_month(income.date, today);
    let month = income.month_key().month_name();
    if let Err(err) = store.record_income(income, today) {
        return fail(&format!("failed to save: {err}"));
    }
    let mut out = io::stdout().lock();
    if current {
        writeln!(out, "{} income added to this month", "ok:".green().bold())?;
    } else {
        writeln!(out, "{} income archived under {month}", "ok:".green().bold())?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `delete-income` subcommand.
fn cmd_delete_income<S: StateStorage>(
    store: &mut FinanceStore<S>,
    income_query: &str,
    month: Option<MonthKey>,
) -> io::Result<ExitCode> {
    let state = store.state();
    let action = match month {
        Some(month_key) => {
            let Some(bucket) = state
                .monthly_incomes
                .iter()
                .find(|bucket| bucket.month_key == month_key)
            else {
                return fail(&format!("no archived income for {month_key}"));
            };
            let Some(income) = resolve("income", income_query, &bucket.incomes, income_key)?
            else {
                return Ok(ExitCode::FAILURE);
            };
            Action::DeleteMonthlyIncome {
                month_key,
                income_id: income.id.clone(),
            }
        }
        None => {
            let Some(income) = resolve(
                "income",
                income_query,
                &state.current_month_incomes,
                income_key,
            )?
            else {
                return Ok(ExitCode::FAILURE);
            };
            Action::DeleteCurrentIncome(income.id.clone())
        }
    };
    apply(store, action, "income deleted")
}

/// Executes the `delete-income-month` subcommand.
fn cmd_delete_income_month<S: StateStorage>(
    store: &mut FinanceStore<S>,
    month: MonthKey,
) -> io::Result<ExitCode> {
    let exists = store
        .state()
        .monthly_incomes
        .iter()
        .any(|bucket| bucket.month_key == month);
    if !exists {
        return fail(&format!("no archived income for {month}"));
    }
    apply(
        store,
        Action::DeleteMonthlyBucket(month),
        &format!("{} removed from history", month.month_name()),
    )
}

/// Executes the `savings` subcommand.
fn cmd_savings<S: StateStorage>(store: &FinanceStore<S>) -> io::Result<ExitCode> {
    let state = store.state();
    let mut out = io::stdout().lock();
    if state.savings_goals.is_empty() {
        writeln!(out, "{}", "No savings goals found.".dimmed())?;
        return Ok(ExitCode::SUCCESS);
    }
    let money = |amount: f64| format_currency(amount, &state.currency);

    let mut table = new_table(
        &["ID", "Goal", "Target", "Saved", "Remaining", "Progress", "Ends"],
        state.dark_mode,
    );
    for goal in &state.savings_goals {
        let remaining = goal.remaining();
        let remaining_cell = if remaining <= 0.0 {
            Cell::new("reached").fg(Color::Green)
        } else {
            Cell::new(money(remaining))
        };
        _ = table.add_row(vec![
            Cell::new(short_id(goal.id.as_inner())).fg(Color::DarkGrey),
            Cell::new(&goal.goal),
            Cell::new(money(goal.target_amount)),
            Cell::new(money(goal.total_contributed())),
            remaining_cell,
            Cell::new(percent(calc::percentage(
                goal.total_contributed(),
                goal.target_amount,
            ))),
            Cell::new(format_date(goal.end_date)),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Savings Goals".green().bold(),
        format_args!("({})", state.savings_goals.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `contribute` subcommand.
fn cmd_contribute<S: StateStorage>(
    store: &mut FinanceStore<S>,
    goal_query: &str,
    amount: f64,
    date: NaiveDate,
) -> io::Result<ExitCode> {
    if amount <= 0.0 {
        return fail("contribution must be a positive amount");
    }
    let Some(goal_id) = resolve("savings goal", goal_query, &store.state().savings_goals, goal_key)?
        .map(|goal| goal.id.clone())
    else {
        return Ok(ExitCode::FAILURE);
    };
    if let Err(err) = store.add_contribution(&goal_id, amount, date) {
        return fail(&format!("failed to save: {err}"));
    }
    let state = store.state();
    let mut out = io::stdout().lock();
    match state.savings_goals.iter().find(|goal| goal.id == goal_id) {
        Some(goal) => writeln!(
            out,
            "{} contribution recorded, {} to go",
            "ok:".green().bold(),
            format_currency(goal.remaining(), &state.currency)
        )?,
        None => writeln!(
            out,
            "{} contribution recorded, goal reached!",
            "ok:".green().bold()
        )?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `contributions` subcommand.
fn cmd_contributions<S: StateStorage>(
    store: &FinanceStore<S>,
    goal_query: &str,
) -> io::Result<ExitCode> {
    let state = store.state();
    let Some(goal) = resolve("savings goal", goal_query, &state.savings_goals, goal_key)? else {
        return Ok(ExitCode::FAILURE);
    };
    let mut out = io::stdout().lock();
    if goal.contributions.is_empty() {
        writeln!(out, "{}", "No contributions found.".dimmed())?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut table = new_table(&["ID", "Date", "Amount"], state.dark_mode);
    for contribution in &goal.contributions {
        _ = table.add_row(vec![
            Cell::new(short_id(contribution.id.as_inner())).fg(Color::DarkGrey),
            Cell::new(format_date(contribution.date)),
            Cell::new(format_currency(contribution.amount, &state.currency)).fg(Color::Green),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        goal.goal.green().bold(),
        format_args!("({} contributions)", goal.contributions.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `delete-contribution` subcommand.
fn cmd_delete_contribution<S: StateStorage>(
    store: &mut FinanceStore<S>,
    goal_query: &str,
    contribution_query: &str,
) -> io::Result<ExitCode> {
    let state = store.state();
    let Some(goal) = resolve("savings goal", goal_query, &state.savings_goals, goal_key)? else {
        return Ok(ExitCode::FAILURE);
    };
    let Some(contribution) = resolve(
        "contribution",
        contribution_query,
        &goal.contributions,
        contribution_key,
    )?
    else {
        return Ok(ExitCode::FAILURE);
    };
    let action = Action::DeleteContribution {
        goal_id: goal.id.clone(),
        contribution_id: contribution.id.clone(),
    };
    apply(store, action, "contribution deleted")
}

/// Executes the `completed-savings` subcommand.
fn cmd_completed_savings<S: StateStorage>(store: &FinanceStore<S>) -> io::Result<ExitCode> {
    let state = store.state();
    let mut out = io::stdout().lock();
    if state.completed_savings.is_empty() {
        writeln!(out, "{}", "No completed savings found.".dimmed())?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut table = new_table(&["ID", "Goal", "Target", "Completed"], state.dark_mode);
    for saving in &state.completed_savings {
        _ = table.add_row(vec![
            Cell::new(short_id(saving.id.as_inner())).fg(Color::DarkGrey),
            Cell::new(&saving.goal),
            Cell::new(format_currency(saving.target_amount, &state.currency)).fg(Color::Green),
            Cell::new(format_date(saving.date_completed)),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Completed Savings".green().bold(),
        format_args!("({})", state.completed_savings.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `delete-completed-saving` subcommand.
fn cmd_delete_completed_saving<S: StateStorage>(
    store: &mut FinanceStore<S>,
    saving_query: &str,
) -> io::Result<ExitCode> {
    let Some(id) = resolve(
        "completed saving",
        saving_query,
        &store.state().completed_savings,
        completed_saving_key,
    )?
    .map(|saving| saving.id.clone()) else {
        return Ok(ExitCode::FAILURE);
    };
    apply(
        store,
        Action::DeleteCompletedSaving(id),
        "completed saving deleted",
    )
}

/// Executes the `currency` subcommand.
fn cmd_currency<S: StateStorage>(
    store: &mut FinanceStore<S>,
    code: Option<&str>,
) -> io::Result<ExitCode> {
    match code {
        Some(value) => {
            let currency = Currency::new(value);
            let code_ok = currency.code().len() == 3
                && currency.code().chars().all(|ch| ch.is_ascii_alphabetic());
            if !code_ok {
                return fail(&format!("not a currency code: {value:?}"));
            }
            let done = format!("currency set to {currency}");
            apply(store, Action::SetCurrency(currency), &done)
        }
        None => {
            let currency = &store.state().currency;
            writeln!(
                io::stdout().lock(),
                "{} {}",
                currency.code().bold(),
                format_currency(1234.56, currency).dimmed()
            )?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the `dark-mode` subcommand.
fn cmd_dark_mode<S: StateStorage>(
    store: &mut FinanceStore<S>,
    enabled: Option<bool>,
) -> io::Result<ExitCode> {
    match enabled {
        Some(value) => apply(
            store,
            Action::SetDarkMode(value),
            if value { "dark mode on" } else { "dark mode off" },
        ),
        None => {
            let label = if store.state().dark_mode { "on" } else { "off" };
            writeln!(io::stdout().lock(), "dark mode {}", label.bold())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the `monthly-equivalent` subcommand.
fn cmd_monthly_equivalent<S: StateStorage>(
    store: &FinanceStore<S>,
    amount: f64,
    frequency: IncomeFrequency,
) -> io::Result<ExitCode> {
    let monthly = calc::monthly_equivalent(amount, frequency);
    writeln!(
        io::stdout().lock(),
        "{} {}",
        format_currency(monthly, &store.state().currency).bold(),
        "per month".dimmed()
    )?;
    Ok(ExitCode::SUCCESS)
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // Last-resort error output; if stderr itself failed there is
            // nothing left to report to.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}
