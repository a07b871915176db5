mod client;
mod ops;

use clap::{Parser, Subcommand};
use ops::OutputFormat;

/// CLI wrapper around the FoodNest HTTP API.
#[derive(Parser)]
#[command(
    name = "foodnest-cli",
    author,
    version,
    about = "Admin CLI for the FoodNest API"
)]
struct Cli {
    /// API base url
    #[arg(long, env = "FN_API_BASE", default_value = "http://127.0.0.1:8080")]
    api_base: String,

    /// Bearer token for authentication
    #[arg(long, env = "FN_TOKEN")]
    token: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print a bearer token
    Login {
        email: String,
        /// 密码明文（建议通过环境变量注入）
        #[arg(long, env = "FN_PASSWORD")]
        password: String,
    },
    // ==================== 用户管理 ====================
    /// List all users (superadmin)
    Users,
    /// Create a user (superadmin)
    CreateUser {
        name: String,
        email: String,
        /// superadmin / rider / cook / supervisor / refill
        role: String,
        #[arg(long, env = "FN_PASSWORD")]
        password: String,
    },
    /// Delete a user (superadmin)
    DeleteUser { id: String },
    // ==================== 注册申请 ====================
    /// List pending registration requests (superadmin)
    Requests,
    /// Approve a registration request (superadmin)
    Approve { id: String },
    /// Decline a registration request (superadmin)
    Decline { id: String },
    // ==================== 菜单 ====================
    /// List food items
    Foods,
    /// List combos
    Combos,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let client = client::build_client(&cli.token)?;
    let base = cli.api_base.trim_end_matches('/');

    match cli.command {
        Commands::Login { email, password } => {
            ops::login(&client, base, &email, &password, cli.output).await?;
        }
        Commands::Users => ops::list_users(&client, base, cli.output).await?,
        Commands::CreateUser {
            name,
            email,
            role,
            password,
        } => {
            ops::create_user(&client, base, &name, &email, &role, &password, cli.output).await?;
        }
        Commands::DeleteUser { id } => ops::delete_user(&client, base, &id).await?,
        Commands::Requests => ops::list_requests(&client, base, cli.output).await?,
        Commands::Approve { id } => ops::approve_request(&client, base, &id).await?,
        Commands::Decline { id } => ops::decline_request(&client, base, &id).await?,
        Commands::Foods => ops::list_foods(&client, base, cli.output).await?,
        Commands::Combos => ops::list_combos(&client, base, cli.output).await?,
    }

    Ok(())
}
