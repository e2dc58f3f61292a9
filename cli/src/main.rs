use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use profmed_client::config::{ClientConfig, ConfigError, normalize_api_url};
use profmed_client::net::resources::PartnershipTerms;
use profmed_client::net::types::UserProfile;
use profmed_client::util::{nav, phone};
use profmed_client::{
    ApiClient, ApiError, AuthSession, AuthStatus, FileStorage, GuardDecision, MemoryNavigator, Navigator, RouteGuard,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
    #[error("not logged in; run `profmed send-otp <phone>` and `profmed verify-otp <phone> <code>`")]
    NotLoggedIn,
    #[error("profile could not be loaded")]
    ProfileUnavailable,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("could not read {path}: {source}")]
    ReadFile { path: String, source: std::io::Error },
}

#[derive(Parser, Debug)]
#[command(name = "profmed", about = "ProfMed session and API CLI")]
struct Cli {
    /// API root, e.g. `http://localhost:8000/api`.
    #[arg(long, env = "PROFMED_API_URL")]
    api_url: Option<String>,

    /// Where the session is persisted between invocations.
    #[arg(long, env = "PROFMED_STATE_FILE", default_value = ".profmed-session.json")]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request a one-time login code over WhatsApp.
    SendOtp { phone: String },
    /// Log in with a one-time code.
    VerifyOtp { phone: String, code: String },
    /// Log in with a password.
    Login {
        phone: String,
        #[arg(long, env = "PROFMED_PASSWORD", hide_env_values = true)]
        password: String,
    },
    SetPassword {
        #[arg(long = "new")]
        new_password: String,
        #[arg(long = "current")]
        current_password: Option<String>,
    },
    ResetPassword(ResetPasswordCommand),
    Profile {
        /// Fetch from the backend instead of using the cached copy.
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },
    Status,
    /// Print the dashboard menu for the logged-in role.
    Menu,
    Logout,
    Api(ApiCommand),
}

#[derive(Args, Debug)]
struct ResetPasswordCommand {
    #[command(subcommand)]
    command: ResetPasswordSubcommand,
}

#[derive(Subcommand, Debug)]
enum ResetPasswordSubcommand {
    Request {
        phone: String,
    },
    Confirm {
        phone: String,
        code: String,
        #[arg(long = "new")]
        new_password: String,
    },
}

#[derive(Args, Debug)]
struct ApiCommand {
    #[command(subcommand)]
    command: ApiSubcommand,
}

#[derive(Subcommand, Debug)]
enum ApiSubcommand {
    #[command(subcommand)]
    Examinations(ExaminationSubcommand),
    #[command(subcommand)]
    Employees(EmployeeSubcommand),
    #[command(subcommand)]
    Organizations(OrganizationSubcommand),
    #[command(subcommand)]
    Documents(DocumentSubcommand),
    #[command(subcommand)]
    Partnerships(PartnershipSubcommand),
    #[command(subcommand)]
    Subscriptions(SubscriptionSubcommand),
}

#[derive(Subcommand, Debug)]
enum ExaminationSubcommand {
    List,
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Start {
        id: i64,
    },
    Complete {
        id: i64,
        #[arg(long)]
        result: String,
        #[arg(long)]
        profpathologist_id: Option<i64>,
    },
    ByQr {
        qr_code: String,
    },
}

#[derive(Subcommand, Debug)]
enum EmployeeSubcommand {
    List,
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: i64,
    },
    /// Upload an Excel roster.
    Import {
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum OrganizationSubcommand {
    List,
    Get { id: i64 },
    Clinics,
    Members { id: i64 },
}

#[derive(Subcommand, Debug)]
enum DocumentSubcommand {
    List,
    Get {
        id: i64,
    },
    Appendix3 {
        #[arg(long)]
        employer_id: i64,
        #[arg(long)]
        year: i32,
    },
    RequestSignature {
        id: i64,
        #[arg(long)]
        role: String,
    },
    Sign {
        id: i64,
        #[arg(long)]
        role: String,
        #[arg(long)]
        otp: String,
    },
}

#[derive(Subcommand, Debug)]
enum PartnershipSubcommand {
    List,
    Get {
        id: i64,
    },
    Request {
        #[arg(long)]
        employer_id: i64,
        #[arg(long)]
        clinic_id: i64,
        #[arg(long, default_value_t = 0.0)]
        default_price: f64,
    },
    AvailableClinics {
        #[arg(long)]
        employer_id: i64,
    },
    Confirm {
        id: i64,
        #[arg(long, default_value_t = 0.0)]
        default_price: f64,
        #[arg(long, default_value = "")]
        notes: String,
    },
    Reject {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum SubscriptionSubcommand {
    Plans,
    Current,
    Request {
        #[arg(long)]
        organization_id: i64,
        #[arg(long)]
        plan_id: i64,
    },
}

/// Hydrated session plus the client and navigator bound to it.
struct CliContext {
    client: ApiClient,
    navigator: Arc<MemoryNavigator>,
    login_route: String,
}

impl CliContext {
    fn auth(&self) -> &AuthSession {
        self.client.auth()
    }

    /// Run the route guard as a protected view would.
    async fn require_session(&self) -> Result<(), CliError> {
        let guard = RouteGuard::new(self.auth().clone(), self.navigator.clone(), self.login_route.clone());
        match guard.wait_for_verdict().await {
            GuardDecision::Render => Ok(()),
            GuardDecision::Redirect(_) | GuardDecision::Loading => Err(CliError::NotLoggedIn),
        }
    }

    async fn profile(&self, refresh: bool) -> Result<UserProfile, CliError> {
        let cached = if refresh { None } else { self.auth().profile().profile() };
        match cached {
            Some(profile) => Ok(profile),
            None => self.client.load_profile().await.ok_or(CliError::ProfileUnavailable),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(raw) = &cli.api_url {
        config.api_url = normalize_api_url("--api-url", raw)?;
    }

    let start = if is_auth_command(&cli.command) { config.login_route.clone() } else { "/dashboard".to_owned() };
    let navigator = Arc::new(MemoryNavigator::new(start));
    let auth = AuthSession::new(Arc::new(FileStorage::new(&cli.state_file)));
    auth.hydrate();
    tracing::debug!(state_file = %cli.state_file.display(), status = ?auth.status(), "session hydrated");

    let client = ApiClient::new(&config, auth, navigator.clone())?;
    let ctx = CliContext { client, navigator, login_route: config.login_route };

    let result = dispatch(&ctx, cli.command).await;
    if matches!(result, Err(CliError::Api(ApiError::Unauthorized))) {
        return Err(CliError::NotLoggedIn);
    }
    result
}

fn is_auth_command(command: &Command) -> bool {
    matches!(
        command,
        Command::SendOtp { .. } | Command::VerifyOtp { .. } | Command::Login { .. } | Command::ResetPassword(_)
    )
}

async fn dispatch(ctx: &CliContext, command: Command) -> Result<(), CliError> {
    match command {
        Command::SendOtp { phone: number } => {
            let sent = ctx.client.send_otp(&number).await?;
            let to = phone::mask(sent.phone_number.as_deref().unwrap_or(&number));
            println!("{} ({to})", sent.message);
            Ok(())
        }
        Command::VerifyOtp { phone, code } => {
            let profile = ctx.client.login_with_otp(&phone, &code).await?;
            print_login(ctx, profile.as_ref());
            Ok(())
        }
        Command::Login { phone, password } => {
            let profile = ctx.client.login_with_password(&phone, &password).await?;
            print_login(ctx, profile.as_ref());
            Ok(())
        }
        Command::SetPassword { new_password, current_password } => {
            ctx.require_session().await?;
            let ack = ctx.client.set_password(&new_password, current_password.as_deref()).await?;
            println!("{}", ack.message);
            Ok(())
        }
        Command::ResetPassword(reset) => run_reset_password(ctx, reset).await,
        Command::Profile { refresh } => {
            ctx.require_session().await?;
            let profile = ctx.profile(refresh).await?;
            print_json(&serde_json::to_value(&profile)?)
        }
        Command::Status => {
            print_status(ctx);
            Ok(())
        }
        Command::Menu => {
            ctx.require_session().await?;
            let profile = ctx.profile(false).await?;
            for item in nav::navigation_for(Some(&profile)) {
                println!("{}\t{}", item.path, item.label);
            }
            Ok(())
        }
        Command::Logout => {
            ctx.client.logout();
            println!("logged out");
            Ok(())
        }
        Command::Api(api) => {
            ctx.require_session().await?;
            let json = run_api(&ctx.client, api).await?;
            print_json(&json)
        }
    }
}

async fn run_reset_password(ctx: &CliContext, reset: ResetPasswordCommand) -> Result<(), CliError> {
    let ack = match reset.command {
        ResetPasswordSubcommand::Request { phone } => ctx.client.reset_password_request(&phone).await?,
        ResetPasswordSubcommand::Confirm { phone, code, new_password } => {
            ctx.client.reset_password_confirm(&phone, &code, &new_password).await?
        }
    };
    println!("{}", ack.message);
    Ok(())
}

async fn run_api(client: &ApiClient, api: ApiCommand) -> Result<Value, CliError> {
    let json = match api.command {
        ApiSubcommand::Examinations(command) => match command {
            ExaminationSubcommand::List => client.examinations().list().await?,
            ExaminationSubcommand::Get { id } => client.examinations().get(id).await?,
            ExaminationSubcommand::Create { data } => client.examinations().create(&parse_data(&data)?).await?,
            ExaminationSubcommand::Start { id } => client.examinations().start(id).await?,
            ExaminationSubcommand::Complete { id, result, profpathologist_id } => {
                client.examinations().complete(id, &result, profpathologist_id).await?
            }
            ExaminationSubcommand::ByQr { qr_code } => client.examinations().by_qr(&qr_code).await?,
        },
        ApiSubcommand::Employees(command) => match command {
            EmployeeSubcommand::List => client.employees().list().await?,
            EmployeeSubcommand::Get { id } => client.employees().get(id).await?,
            EmployeeSubcommand::Create { data } => client.employees().create(&parse_data(&data)?).await?,
            EmployeeSubcommand::Update { id, data } => client.employees().update(id, &parse_data(&data)?).await?,
            EmployeeSubcommand::Delete { id } => client.employees().delete(id).await?,
            EmployeeSubcommand::Import { file } => {
                let bytes = tokio::fs::read(&file)
                    .await
                    .map_err(|source| CliError::ReadFile { path: file.display().to_string(), source })?;
                let name = file.file_name().map_or_else(|| "import.xlsx".to_owned(), |n| n.to_string_lossy().into_owned());
                client.employees().import_excel(&name, bytes).await?
            }
        },
        ApiSubcommand::Organizations(command) => match command {
            OrganizationSubcommand::List => client.organizations().list().await?,
            OrganizationSubcommand::Get { id } => client.organizations().get(id).await?,
            OrganizationSubcommand::Clinics => client.organizations().all_clinics().await?,
            OrganizationSubcommand::Members { id } => client.organizations().members(id).await?,
        },
        ApiSubcommand::Documents(command) => match command {
            DocumentSubcommand::List => client.documents().list().await?,
            DocumentSubcommand::Get { id } => client.documents().get(id).await?,
            DocumentSubcommand::Appendix3 { employer_id, year } => {
                client.documents().get_or_generate_appendix_3(employer_id, year).await?
            }
            DocumentSubcommand::RequestSignature { id, role } => client.documents().request_signature(id, &role).await?,
            DocumentSubcommand::Sign { id, role, otp } => client.documents().verify_and_sign(id, &role, &otp).await?,
        },
        ApiSubcommand::Partnerships(command) => match command {
            PartnershipSubcommand::List => client.partnerships().list().await?,
            PartnershipSubcommand::Get { id } => client.partnerships().get(id).await?,
            PartnershipSubcommand::Request { employer_id, clinic_id, default_price } => {
                client.partnerships().request(employer_id, clinic_id, default_price).await?
            }
            PartnershipSubcommand::AvailableClinics { employer_id } => {
                client.partnerships().available_clinics(employer_id).await?
            }
            PartnershipSubcommand::Confirm { id, default_price, notes } => {
                let terms = PartnershipTerms { default_price, notes, ..PartnershipTerms::default() };
                client.partnerships().confirm(id, &terms).await?
            }
            PartnershipSubcommand::Reject { id } => client.partnerships().reject(id).await?,
        },
        ApiSubcommand::Subscriptions(command) => match command {
            SubscriptionSubcommand::Plans => client.subscriptions().plans().await?,
            SubscriptionSubcommand::Current => client.subscriptions().current().await?,
            SubscriptionSubcommand::Request { organization_id, plan_id } => {
                client.subscriptions().request(organization_id, plan_id).await?
            }
        },
    };
    Ok(json)
}

fn print_login(ctx: &CliContext, profile: Option<&UserProfile>) {
    let phone_number = ctx.auth().session().user().map(|u| phone::format(&u.phone_number)).unwrap_or_default();
    match profile {
        Some(profile) => {
            let name = profile.display_name().unwrap_or(phone_number);
            println!("logged in as {name} ({})", profile.primary_role);
        }
        None => println!("logged in as {phone_number}; profile could not be loaded"),
    }
}

fn print_status(ctx: &CliContext) {
    let auth = ctx.auth();
    match auth.status() {
        AuthStatus::Authenticated => {
            let phone_number = auth.session().user().map(|u| phone::mask(&u.phone_number)).unwrap_or_default();
            println!("authenticated: {phone_number}");
            if let Some(profile) = auth.profile().profile() {
                let roles: Vec<&str> = profile.roles().into_iter().map(|r| r.as_str()).collect();
                println!("primary role: {}", profile.primary_role);
                println!("roles: {}", roles.join(", "));
            }
        }
        AuthStatus::Unauthenticated | AuthStatus::Pending => {
            println!("not logged in (login route: {})", ctx.login_route);
        }
    }
    tracing::debug!(path = %ctx.navigator.current_path(), "status reported");
}

fn parse_data(raw: &str) -> Result<Value, CliError> {
    Ok(serde_json::from_str::<Value>(raw)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
