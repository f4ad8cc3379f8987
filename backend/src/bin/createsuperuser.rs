//! Administrative CLI creating a superuser account.
//!
//! ```text
//! createsuperuser --email admin@example.com --password <secret>
//! ```
//!
//! Connects with `DATABASE_URL` (flag, environment, or `.env`), applies any
//! pending migrations, and inserts an account with the staff and superuser
//! flags raised.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use backend::domain::auth::{PasswordHash, check_password_policy};
use backend::domain::ports::UserRepository;
use backend::domain::{EmailAddress, NewUser};
use backend::outbound::persistence::{
    DbPool, DieselUserRepository, PoolConfig, run_pending_migrations,
};

#[derive(Parser, Debug)]
#[command(name = "createsuperuser")]
#[command(about = "Creates a superuser account", long_about = None)]
struct Args {
    /// Email address for the superuser.
    #[arg(long)]
    email: String,

    /// Password for the superuser.
    #[arg(long)]
    password: String,

    /// Database connection string; defaults to the DATABASE_URL variable.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let _ = fmt().with_env_filter(EnvFilter::from_default_env()).try_init();

    let args = Args::parse();
    let database_url = match args.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL is not set and --database-url was not given")?,
    };

    let email = EmailAddress::parse(&args.email)?;
    check_password_policy(&args.password)?;
    let password_hash = PasswordHash::hash(&args.password)?;

    run_pending_migrations(&database_url)?;
    let pool = DbPool::new(PoolConfig::new(&database_url)).await?;
    let repository = DieselUserRepository::new(pool);

    let user = repository
        .insert(NewUser::superuser(email, password_hash))
        .await?;

    info!(email = %user.email, "superuser created");
    Ok(())
}
