/// Portal Console - command line front end
///
/// Thin operator CLI over the console library: sign in, manage admins and
/// their permission matrix, and watch subscription sync state.
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use portal_console::{
    admin::{AdminAccount, AdminRole, EditorState, Module, SaveOutcome, TEMPLATES},
    error::{ActionOutcome, Notice},
    list::{FetchOutcome, FilterPatch, ListController},
    subscriptions::{BatchOutcome, ContentSubscription, ContentType, SyncTriggerOutcome},
    validation::CreateAdminForm,
    ConsoleConfig, ConsoleContext,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "portal-console")]
#[command(about = "Admin console for the content portal", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        #[arg(short, long)]
        username: String,
        /// Falls back to PORTAL_ADMIN_PASSWORD
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Administrator accounts and permissions
    Admins {
        #[command(subcommand)]
        action: AdminCommands,
    },

    /// Content subscriptions and sync state
    Subs {
        #[command(subcommand)]
        action: SubscriptionCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List administrators
    List {
        #[arg(long)]
        role: Option<String>,
        #[arg(short, long)]
        keyword: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Create an administrator
    Create {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(long, default_value = "admin")]
        role: String,
    },
    /// Replace an admin's permissions with a template
    Grant {
        admin_id: i64,
        #[arg(short, long)]
        template: String,
    },
    /// Show an admin's permission matrix
    Permissions { admin_id: i64 },
    /// Replace an admin's tags
    Tags { admin_id: i64, tags: Vec<String> },
    /// Show an admin's audit trail
    Audit {
        admin_id: i64,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List permission templates
    Templates,
}

#[derive(Subcommand)]
enum SubscriptionCommands {
    /// List subscriptions
    List {
        #[arg(short = 't', long = "type")]
        content_type: Option<String>,
        #[arg(short, long)]
        keyword: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Enable or disable sync for one or more subscriptions
    Toggle {
        #[arg(required = true)]
        ids: Vec<i64>,
        /// Disable instead of enable
        #[arg(long)]
        off: bool,
    },
    /// Activate or deactivate a subscription
    Activate {
        id: i64,
        #[arg(long)]
        off: bool,
    },
    /// Delete a subscription
    Delete { id: i64 },
    /// Run a sync now
    Sync { id: i64 },
    /// Show the sync trend and recent history
    Trend {
        id: i64,
        #[arg(long)]
        days: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConsoleConfig::from_env().context("Failed to load configuration")?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("portal_console={}", config.logging.level).into());
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let ctx = ConsoleContext::new(config).context("Failed to initialize console")?;

    match cli.command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => std::env::var("PORTAL_ADMIN_PASSWORD")
                    .map_err(|_| anyhow!("No password given and PORTAL_ADMIN_PASSWORD is not set"))?,
            };
            let result = ctx.admins.service().login(&username, &password).await?;
            let role = result.role.map(|r| r.as_str()).unwrap_or("unknown");
            println!("Signed in as {} ({})", username, role);
        }
        Commands::Logout => {
            ctx.session.sign_out()?;
            println!("Signed out");
        }
        Commands::Admins { action } => {
            require_session(&ctx)?;
            run_admin_command(&ctx, action).await?;
        }
        Commands::Subs { action } => {
            require_session(&ctx)?;
            run_subscription_command(&ctx, action).await?;
        }
    }

    Ok(())
}

fn require_session(ctx: &ConsoleContext) -> Result<()> {
    if !ctx.session.is_authenticated() {
        bail!("Not signed in, run `portal-console login` first");
    }
    Ok(())
}

async fn run_admin_command(ctx: &ConsoleContext, action: AdminCommands) -> Result<()> {
    let directory = &ctx.admins;
    match action {
        AdminCommands::List { role, keyword, page } => {
            let role = role.map(|r| AdminRole::from_str(&r)).transpose()?;
            let list = directory.admins();
            directory.filter_by_role(role).await;
            if keyword.is_some() {
                list.set_filter(FilterPatch::new().maybe("keyword", keyword)).await;
            }
            load_page(list, page).await?;

            let state = list.snapshot();
            println!("{} admins (page {}/{})", state.total, state.page, state.to_page().total_pages().max(1));
            for admin in &state.items {
                print_admin(admin);
            }
        }
        AdminCommands::Create {
            username,
            email,
            password,
            role,
        } => {
            let form = CreateAdminForm {
                username,
                email,
                password,
                role: AdminRole::from_str(&role)?,
            };
            report_action(directory.create_admin(&form).await, directory.notice())?;
        }
        AdminCommands::Grant { admin_id, template } => {
            if !directory.session_policy().can_manage_admins() {
                bail!("Only super admins can change permissions");
            }
            let admin = find_admin(ctx, admin_id).await?;
            if !directory.editor().open_for(&admin).await {
                return Err(editor_error(directory.editor().state()));
            }
            if !directory.editor().apply_template(&template) {
                directory.editor().close();
                bail!("Unknown permission template `{}`", template);
            }
            match directory.editor().save().await {
                SaveOutcome::Saved => println!("Applied template {} to {}", template, admin.username),
                SaveOutcome::Failed(notice) => bail!(notice.text),
                SaveOutcome::NotOpen | SaveOutcome::InProgress => bail!("Editor is not ready"),
            }
        }
        AdminCommands::Permissions { admin_id } => {
            let admin = find_admin(ctx, admin_id).await?;
            if !directory.editor().open_for(&admin).await {
                return Err(editor_error(directory.editor().state()));
            }
            let matrix = directory
                .editor()
                .matrix()
                .ok_or_else(|| anyhow!("Permission editor closed unexpectedly"))?;
            directory.editor().close();

            println!("Permissions for {} ({})", admin.username, admin.role.as_str());
            println!("{:<14} view create update delete", "module");
            for (module, flags) in matrix.iter() {
                println!(
                    "{:<14} {:<4} {:<6} {:<6} {}",
                    module.as_str(),
                    mark(flags.view),
                    mark(flags.create),
                    mark(flags.update),
                    mark(flags.delete)
                );
            }
        }
        AdminCommands::Tags { admin_id, tags } => {
            report_action(directory.update_tags(admin_id, &tags).await, directory.notice())?;
        }
        AdminCommands::Audit { admin_id, page } => {
            let size = ctx.config.lists.page_size;
            let trail = directory
                .audit_trail(admin_id, page, size)
                .await
                .ok_or_else(|| notice_error(directory.notice()))?;
            println!("{} audit entries", trail.total);
            for entry in &trail.items {
                let at = entry
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "{:<17} {:<24} {}",
                    at,
                    entry.action,
                    entry.target.as_deref().unwrap_or("-")
                );
            }
        }
        AdminCommands::Templates => {
            for template in TEMPLATES {
                let granted = Module::ALL
                    .iter()
                    .filter(|m| template.flags_for(**m).any())
                    .count();
                println!("{:<22} {} ({} modules)", template.id, template.description, granted);
            }
        }
    }
    Ok(())
}

async fn run_subscription_command(ctx: &ConsoleContext, action: SubscriptionCommands) -> Result<()> {
    let tracker = &ctx.subscriptions;
    match action {
        SubscriptionCommands::List {
            content_type,
            keyword,
            page,
        } => {
            let content_type = match content_type {
                Some(t) => Some(ContentType::from_str(&t).ok_or_else(|| anyhow!("Unknown content type `{}`", t))?),
                None => None,
            };
            let list = tracker.list();
            list.set_filter(
                FilterPatch::new()
                    .maybe("contentType", content_type.map(|c| c.as_str().to_string()))
                    .maybe("keyword", keyword),
            )
            .await;
            load_page(list, page).await?;

            let state = list.snapshot();
            println!("{} subscriptions (page {}/{})", state.total, state.page, state.to_page().total_pages().max(1));
            for sub in &state.items {
                print_subscription(sub);
            }
        }
        SubscriptionCommands::Toggle { ids, off } => match tracker.batch_toggle_sync(&ids, !off).await {
            BatchOutcome::Applied { count } => println!("Updated {} subscriptions", count),
            BatchOutcome::Partial { succeeded, failed } => {
                println!("Updated {} subscriptions", succeeded.len());
                for (id, reason) in failed {
                    eprintln!("  {} not updated: {}", id, reason);
                }
            }
            BatchOutcome::Failed(notice) => bail!(notice.text),
            BatchOutcome::Rejected => bail!("No subscription ids given"),
            BatchOutcome::InProgress => bail!("Another batch update is running"),
        },
        SubscriptionCommands::Activate { id, off } => {
            report_action(tracker.set_active(id, !off).await, tracker.notice())?;
        }
        SubscriptionCommands::Delete { id } => {
            report_action(tracker.delete_subscription(id).await, tracker.notice())?;
        }
        SubscriptionCommands::Sync { id } => match tracker.trigger_manual_sync(id).await {
            SyncTriggerOutcome::Completed(report) => {
                println!(
                    "Sync finished: {} matched, {} new",
                    report.total_matched, report.new_count
                );
            }
            SyncTriggerOutcome::AlreadyRunning => println!("Sync already running for {}", id),
            SyncTriggerOutcome::Failed(notice) => bail!(notice.text),
        },
        SubscriptionCommands::Trend { id, days } => {
            let view = match days {
                Some(days) => tracker.view_trend_days(id, days).await,
                None => tracker.view_trend(id).await,
            }
            .ok_or_else(|| notice_error(tracker.notice()))?;

            println!("Subscription {} over {} days", view.subscription_id, view.days);
            for point in &view.trends {
                println!("{:<12} {:>6} matched {:>4} new", point.date, point.total_matched, point.new_count);
            }
            println!("Recent runs ({} total)", view.history.total);
            for run in &view.history.items {
                let at = run
                    .started_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("{:<17} {:?} {} new", at, run.status, run.new_count);
            }
        }
    }
    Ok(())
}

async fn load_page<T>(list: &ListController<T>, page: u32) -> Result<()>
where
    T: serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
{
    let outcome = if page > 1 {
        list.set_page(page).await
    } else {
        FetchOutcome::Applied
    };
    if outcome == FetchOutcome::Failed || list.error().is_some() {
        return Err(notice_error(list.error()));
    }
    Ok(())
}

async fn find_admin(ctx: &ConsoleContext, admin_id: i64) -> Result<AdminAccount> {
    match ctx.admins.find_admin(admin_id).await {
        Some(admin) => Ok(admin),
        None => match ctx.admins.admins().error() {
            Some(notice) => bail!(notice.text),
            None => bail!("No admin with id {}", admin_id),
        },
    }
}

fn report_action(outcome: ActionOutcome, notice: Option<Notice>) -> Result<()> {
    match outcome {
        ActionOutcome::Done => {
            if let Some(notice) = notice {
                println!("{}", notice.text);
            }
            Ok(())
        }
        ActionOutcome::Invalid(errors) => {
            for error in &errors {
                eprintln!("  {}: {}", error.field, error.message);
            }
            bail!("Invalid input")
        }
        ActionOutcome::Failed(notice) => bail!(notice.text),
    }
}

fn editor_error(state: EditorState) -> anyhow::Error {
    match state {
        EditorState::Failed { notice, .. } => anyhow!(notice.text),
        _ => anyhow!("Permission editor could not be opened"),
    }
}

fn notice_error(notice: Option<Notice>) -> anyhow::Error {
    anyhow!(notice.map(|n| n.text).unwrap_or_else(|| "Request failed".to_string()))
}

fn mark(granted: bool) -> &'static str {
    if granted {
        "x"
    } else {
        "."
    }
}

fn print_admin(admin: &AdminAccount) {
    let granted = admin
        .granted_modules()
        .map(|n| format!("{}/8", n))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:>5} {:<20} {:<12} {:<8} modules {:<4} tags [{}]",
        admin.id,
        admin.username,
        admin.role.as_str(),
        if admin.is_active { "active" } else { "disabled" },
        granted,
        admin.tags.join(", ")
    );
}

fn print_subscription(sub: &ContentSubscription) {
    let last = sub
        .last_sync_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());
    println!(
        "{:>5} {:<12} {:<9} matched {:>6} new {:>4} last {} keywords [{}]",
        sub.id,
        sub.content_type.as_str(),
        sub.status().as_str(),
        sub.total_matched,
        sub.new_count,
        last,
        sub.criteria.keywords.join(", ")
    );
}
