use clap::{Parser, Subcommand};
use rainbow_posts::{
    app,
    config::Config,
    models::{group::NewGroup, user::SignUpForm},
    state::AppState,
};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 后台清理过期缓存的间隔
const CACHE_JANITOR_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "rainbow-posts")]
#[command(about = "Group-and-follow social blogging site", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server (default)
    Serve,

    /// Create a community group
    CreateGroup {
        /// Group title
        #[arg(long)]
        title: String,

        /// URL slug, derived from the title when omitted
        #[arg(long)]
        slug: Option<String>,

        /// Group description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Create a user account
    CreateUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        email: Option<String>,
    },
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化日志
    init_tracing(&config);

    let cli = Cli::parse();
    let state = AppState::new(config.clone()).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, state).await,
        Commands::CreateGroup {
            title,
            slug,
            description,
        } => {
            let group = state
                .group_service
                .create(NewGroup {
                    title,
                    slug,
                    description,
                })
                .await?;
            info!("Group \"{}\" available at /group/{}/", group.title, group.slug);
            Ok(())
        }
        Commands::CreateUser {
            username,
            password,
            email,
        } => {
            let form = SignUpForm {
                username,
                password,
                email,
                ..SignUpForm::default()
            };
            let new_user = form
                .clean()
                .map_err(|errors| anyhow::anyhow!("Invalid user: {:?}", errors))?;
            let user = state.user_service.create_user(new_user).await?;
            info!("Created user {} ({})", user.username, user.id);
            Ok(())
        }
    }
}

async fn serve(config: Config, state: AppState) -> anyhow::Result<()> {
    info!("Starting Rainbow-Posts service...");
    if config.is_development() {
        warn!("Running in development mode, session cookies are sent without Secure");
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.media_root).await {
        warn!("Could not create media directory {}: {}", config.media_root, e);
    }

    // 启动后台任务
    state.page_cache.spawn_janitor(CACHE_JANITOR_INTERVAL);

    let app = app(Arc::new(state));

    // 启动主服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
