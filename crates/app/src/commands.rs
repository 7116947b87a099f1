use api_types::{
    category::{CategoryNew, CategoryUpdate},
    transaction::{TransactionNew, TransactionUpdate},
};
use chrono::Utc;
use pocketbook::{
    AppContext, Language, Result, StoreError,
    categories::search_categories,
    money::{UserFormatter, parse_amount},
    reports::{self, LedgerQuery, Period, SortOrder},
    validation,
};

use crate::{
    cli::{CategoryCommand, ChartKind, Command, CurrencyCommand, TransactionCommand},
    render,
};

pub async fn run(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Register {
            name,
            credentials,
            confirm,
            currency,
        } => {
            let confirm = confirm.unwrap_or_else(|| credentials.password.clone());
            validation::check_register(&name, &credentials.email, &credentials.password, &confirm)
                .map_err(StoreError::from)?;
            let user = ctx
                .session
                .register(&name, &credentials.email, &credentials.password, currency)
                .await?;
            println!("Registered as {}.", user.name);
            render::verification_banner(&user);
        }
        Command::Login { credentials } => {
            validation::check_login(&credentials.email, &credentials.password)
                .map_err(StoreError::from)?;
            let user = ctx
                .session
                .login(&credentials.email, &credentials.password)
                .await?;
            println!("Welcome back, {}.", user.name);
            render::verification_banner(&user);
        }
        Command::Logout => {
            ctx.session.check_auth().await;
            ctx.session.logout().await?;
            println!("Logged out.");
        }
        Command::Verify { code, email } => {
            let code = validation::parse_code(&code).map_err(StoreError::from)?;
            let email = email_or_session(ctx, email).await?;
            ctx.session.verify_code(&email, code).await?;
            println!("Email verified.");
        }
        Command::ResendCode { email } => {
            let email = email_or_session(ctx, email).await?;
            ctx.session.resend_code(&email).await?;
            println!("A new code was sent to {email}.");
        }
        Command::Whoami => {
            if !ctx.session.check_auth().await {
                println!("Not logged in.");
                return Ok(());
            }
            let fmt = formatter(ctx).await;
            if let Some(user) = ctx.session.user() {
                render::user(&user, &fmt);
            }
        }
        Command::Currency {
            command: CurrencyCommand::Set { id },
        } => {
            require_session(ctx).await?;
            let user = ctx.session.update_user(id).await?;
            let fmt = formatter(ctx).await;
            render::user(&user, &fmt);
        }
        Command::ChangePassword {
            credentials,
            confirm,
        } => {
            let confirm = confirm.unwrap_or_else(|| credentials.password.clone());
            validation::check_change_password(
                &credentials.email,
                &credentials.password,
                &confirm,
            )
            .map_err(StoreError::from)?;
            ctx.session
                .change_password(&credentials.email, &credentials.password)
                .await?;
            println!("Password changed.");
        }
        Command::Currencies => {
            ctx.currencies.fetch_all().await?;
            render::currencies(&ctx.currencies.items());
        }
        Command::Categories { command } => categories(ctx, command).await?,
        Command::Transactions { command } => transactions(ctx, command).await?,
        Command::Dashboard => dashboard(ctx).await?,
        Command::Report { period, chart } => report(ctx, period, chart).await?,
        Command::Lang { language } => {
            if let Some(language) = language {
                let language: Language = language
                    .parse()
                    .map_err(StoreError::Validation)?;
                ctx.language.set(language).map_err(StoreError::from)?;
            }
            println!("{}", ctx.language.current());
        }
    }
    Ok(())
}

/// Restores the stored session and loads the session-scoped caches.
async fn require_session(ctx: &AppContext) -> Result<()> {
    if !ctx.session.check_auth().await {
        return Err(StoreError::NoSession.into());
    }
    ctx.sync_identity(ctx.session.identity().as_ref()).await?;
    Ok(())
}

async fn email_or_session(ctx: &AppContext, email: Option<String>) -> Result<String> {
    if let Some(email) = email {
        return Ok(email);
    }
    ctx.session.check_auth().await;
    ctx.session
        .user()
        .map(|user| user.email)
        .ok_or_else(|| StoreError::NoSession.into())
}

/// Formatter for the session user. Currencies are only fetched when the
/// user payload does not embed its currency.
async fn formatter(ctx: &AppContext) -> UserFormatter {
    let user = ctx.session.user();
    if user.as_ref().is_some_and(|u| u.currency.is_none()) {
        if let Err(err) = ctx.currencies.ensure_loaded().await {
            tracing::warn!(error = %err, "currencies unavailable, amounts left unformatted");
        }
    }
    UserFormatter::new(user.as_ref(), &ctx.currencies.items())
}

async fn categories(ctx: &AppContext, command: CategoryCommand) -> Result<()> {
    require_session(ctx).await?;
    match command {
        CategoryCommand::List { search } => {
            let items = ctx.categories.items();
            let hits = search_categories(&items, search.as_deref().unwrap_or(""));
            render::categories(&hits);
        }
        CategoryCommand::Add { name, icon } => {
            let name = name.trim().to_string();
            ctx.categories.add(&CategoryNew { name, icon }).await?;
        }
        CategoryCommand::Rename { id, name } => {
            let patch = CategoryUpdate {
                name: Some(name.trim().to_string()),
                icon: None,
            };
            ctx.categories.update(&id, &patch).await?;
        }
        CategoryCommand::Icon { id, icon } => {
            let patch = CategoryUpdate {
                name: None,
                icon: Some(icon),
            };
            ctx.categories.update(&id, &patch).await?;
        }
        CategoryCommand::Delete { id } => ctx.categories.delete(&id).await?,
    }
    Ok(())
}

async fn transactions(ctx: &AppContext, command: TransactionCommand) -> Result<()> {
    require_session(ctx).await?;
    match command {
        TransactionCommand::List {
            filter,
            search,
            sort,
            asc,
        } => {
            let query = LedgerQuery {
                filter,
                search: search.unwrap_or_default(),
                sort,
                order: if asc { SortOrder::Asc } else { SortOrder::Desc },
            };
            let items = ctx.transactions.items();
            let categories = ctx.categories.items();
            let fmt = formatter(ctx).await;
            render::transactions(&query.apply(&items, &categories), &categories, &fmt);
        }
        TransactionCommand::Add {
            amount,
            kind,
            category,
            desc,
        } => {
            let data = TransactionNew {
                amount: parse_amount(&amount).map_err(StoreError::Validation)?,
                kind: kind.into(),
                desc,
                category_id: category,
            };
            ctx.transactions.add(&data).await?;
        }
        TransactionCommand::Edit {
            id,
            amount,
            kind,
            category,
            desc,
        } => {
            let amount = amount
                .as_deref()
                .map(parse_amount)
                .transpose()
                .map_err(StoreError::Validation)?;
            let patch = TransactionUpdate {
                amount,
                kind: kind.map(Into::into),
                desc,
                category_id: category,
            };
            ctx.transactions.update(&id, &patch).await?;
        }
        TransactionCommand::Delete { id } => ctx.transactions.delete(&id).await?,
    }
    Ok(())
}

async fn dashboard(ctx: &AppContext) -> Result<()> {
    require_session(ctx).await?;
    let fmt = formatter(ctx).await;
    if let Some(user) = ctx.session.user() {
        println!("Hello, {}.", user.name);
        render::verification_banner(&user);
    }

    if let Some(summary) = ctx.amount_summary().await? {
        println!();
        render::summary(&summary, &fmt);
    }

    let items = ctx.transactions.items();
    let categories = ctx.categories.items();

    println!("\nRecent transactions");
    let recent = reports::recent(&items, Utc::now(), reports::RECENT_COUNT);
    render::transactions(&recent, &categories, &fmt);

    println!("\nTop expense categories");
    let top = reports::top_expense_categories(&items, &categories, Some(reports::DASHBOARD_TOP_N));
    let total = reports::totals(&items).expense;
    render::breakdown(&top, total, &fmt);
    Ok(())
}

async fn report(ctx: &AppContext, period: Period, chart: ChartKind) -> Result<()> {
    require_session(ctx).await?;
    let fmt = formatter(ctx).await;
    let items = ctx.transactions.items();
    let categories = ctx.categories.items();
    let in_period = reports::filter_by_period(&items, period, Utc::now());

    println!("{}", period.description());
    let totals = reports::totals(in_period.iter().copied());
    render::totals(&totals, &fmt);

    let ranked = reports::top_expense_categories(in_period.iter().copied(), &categories, None);
    println!("\nBreakdown");
    render::breakdown(&ranked, totals.expense, &fmt);

    println!("\nChart");
    render::chart(&reports::chart_series(&ranked), chart, &fmt);
    Ok(())
}
