use tracing_subscriber::EnvFilter;

use careers_backend::{auth::ROLE_ADMIN, bootstrap, config::AppConfig, db};

const USAGE: &str = "usage: maintenance <command>

commands:
  seed-admin <username> <password>   create an admin user if missing
  bootstrap-assessment               create the default assessment if missing";

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = AppConfig::from_env()?;
    let pool = db::init_pool_with_size(&config.database_url, 1)?;
    let mut conn = pool.get()?;

    match args.first().map(String::as_str) {
        Some("seed-admin") => {
            let (username, password) = match (args.get(1), args.get(2)) {
                (Some(username), Some(password)) => (username.as_str(), password.as_str()),
                _ => anyhow::bail!("seed-admin needs <username> and <password>\n\n{USAGE}"),
            };
            if password.len() < 8 {
                anyhow::bail!("password must be at least 8 characters");
            }
            let created =
                bootstrap::seed_user(&mut conn, username, password, ROLE_ADMIN, username)?;
            if created {
                println!("admin '{username}' created");
            } else {
                println!("user '{username}' already exists, nothing done");
            }
        }
        Some("bootstrap-assessment") => {
            let created = bootstrap::bootstrap_default_assessment(&mut conn)?;
            if created {
                println!("default assessment created");
            } else {
                println!("default assessment already present, nothing done");
            }
        }
        _ => anyhow::bail!("{USAGE}"),
    }

    Ok(())
}
