use clap::{Args, Parser, Subcommand, ValueEnum};
use pocketbook::{
    ConfigOverrides,
    reports::{Period, SortField, TypeFilter},
};

#[derive(Debug, Parser)]
#[command(name = "pocketbook", version, about = "Personal finance client")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:3000).
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Override the file holding the token and language.
    #[arg(long, global = true)]
    pub state_path: Option<String>,
    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config: self.config.clone(),
            base_url: self.base_url.clone(),
            state_path: self.state_path.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct Credentials {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "POCKETBOOK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account; a verification code is emailed.
    Register {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        credentials: Credentials,
        /// Repeat the password; defaults to --password.
        #[arg(long)]
        confirm: Option<String>,
        /// Currency id, see `currencies`.
        #[arg(long, default_value_t = 1)]
        currency: i64,
    },
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },
    Logout,
    /// Confirm the email address with the 6-digit code.
    Verify {
        code: String,
        /// Defaults to the logged-in user's email.
        #[arg(long)]
        email: Option<String>,
    },
    ResendCode {
        #[arg(long)]
        email: Option<String>,
    },
    /// Restore the stored session and show the current user.
    Whoami,
    /// Account currency.
    Currency {
        #[command(subcommand)]
        command: CurrencyCommand,
    },
    ChangePassword {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        confirm: Option<String>,
    },
    /// List the available currencies.
    Currencies,
    Categories {
        #[command(subcommand)]
        command: CategoryCommand,
    },
    Transactions {
        #[command(subcommand)]
        command: TransactionCommand,
    },
    /// Balance, recent activity and top expense categories.
    Dashboard,
    /// Spending breakdown for a period.
    Report {
        #[arg(long, default_value = "month")]
        period: Period,
        #[arg(long, value_enum, default_value_t = ChartKind::Bar)]
        chart: ChartKind,
    },
    /// Show or change the interface language.
    Lang { language: Option<String> },
}

#[derive(Debug, Subcommand)]
pub enum CurrencyCommand {
    Set { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Add {
        name: String,
        icon: String,
    },
    Rename {
        id: String,
        name: String,
    },
    Icon {
        id: String,
        icon: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TransactionCommand {
    List {
        #[arg(long = "type", default_value = "all")]
        filter: TypeFilter,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "date")]
        sort: SortField,
        /// Ascending instead of the default descending order.
        #[arg(long)]
        asc: bool,
    },
    Add {
        /// Amount, `.` or `,` as decimal separator.
        amount: String,
        #[arg(long = "type", value_enum, default_value_t = Kind::Expense)]
        kind: Kind,
        #[arg(long)]
        category: String,
        #[arg(long)]
        desc: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long = "type", value_enum)]
        kind: Option<Kind>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        desc: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Income,
    Expense,
}

impl From<Kind> for api_types::transaction::TransactionType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Income => Self::Income,
            Kind::Expense => Self::Expense,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartKind {
    Bar,
    Pie,
}
