//! board - command-line client for the bulletin board proxy

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use board_api::{Attachment, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use board_client::pages::{self, FormMode};
use board_client::views::{render_board_detail, render_categories, render_header};
use board_client::{
    AuthedClient, BoardForm, HistoryNavigator, LoginForm, SessionLifecycle, SessionStore,
    SignupForm,
};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "board")]
#[command(about = "Bulletin board client")]
#[command(version)]
struct Cli {
    /// Base URL of the board proxy
    #[arg(long, global = true, env = "BOARD_SERVER_URL", default_value = "http://127.0.0.1:3000")]
    server: String,

    /// Where the signed-in session is kept
    #[arg(long, global = true, env = "BOARD_SESSION_FILE", default_value = "board-session.json")]
    session_file: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    timeout: u64,

    /// Refresh the session in the background every N seconds while a command runs
    #[arg(long, global = true)]
    keepalive_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        username: String,
        #[arg(long, env = "BOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account
    Signup {
        username: String,
        #[arg(long)]
        name: String,
        #[arg(long, env = "BOARD_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },

    /// Sign out and forget the session
    Logout,

    /// Show who is signed in
    Whoami,

    /// List posts
    List {
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
    },

    /// Show one post
    Show { id: String },

    /// List categories
    Categories,

    /// Write a new post
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        category: String,
        /// Attachment (max 1 MiB)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Edit a post; omitted fields keep their current value
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete a post
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let session = SessionStore::load(cli.session_file.clone())
        .await
        .with_context(|| format!("failed to load session from {}", cli.session_file.display()))?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()
        .context("failed to build HTTP client")?;
    let navigator = Arc::new(HistoryNavigator::new());
    let client = Arc::new(AuthedClient::new(
        http,
        cli.server.clone(),
        Arc::new(session),
        navigator.clone(),
    ));
    let lifecycle = SessionLifecycle::new(
        client.clone(),
        cli.keepalive_secs.map(Duration::from_secs),
    );
    lifecycle.resume().await;

    let outcome = run(cli.command, &lifecycle, &client).await;
    if let Some(route) = navigator.last() {
        debug!(%route, "final route");
        eprintln!("→ {route}");
    }
    outcome
}

async fn run(command: Command, lifecycle: &SessionLifecycle, client: &AuthedClient) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let user = lifecycle
                .login(&LoginForm { username, password })
                .await?;
            println!("{}", render_header(user.as_ref()));
        }
        Command::Signup {
            username,
            name,
            password,
            confirm_password,
        } => {
            lifecycle
                .signup(&SignupForm {
                    username,
                    name,
                    password,
                    confirm_password,
                })
                .await?;
            println!("회원가입이 완료되었습니다.");
        }
        Command::Logout => {
            lifecycle.logout().await?;
            println!("로그아웃 되었습니다.");
        }
        Command::Whoami => {
            let user = client.session().user().await;
            println!("{}", render_header(user.as_ref()));
        }
        Command::List { page, size } => {
            let view = pages::load_boards(client, page, size).await?;
            print!("{}", view.render());
        }
        Command::Show { id } => {
            let board = pages::load_board(client, &id).await?;
            print!("{}", render_board_detail(&board));
        }
        Command::Categories => {
            let categories = pages::load_categories(client).await?;
            print!("{}", render_categories(&categories));
        }
        Command::Create {
            title,
            content,
            category,
            file,
        } => {
            let form = BoardForm {
                title,
                content,
                category,
                file: read_attachment(file.as_deref()).await?,
            };
            let route = pages::submit_board(client, &FormMode::Create, &form).await?;
            println!("저장되었습니다: {route}");
        }
        Command::Edit {
            id,
            title,
            content,
            category,
            file,
        } => {
            let board = pages::load_board(client, &id).await?;
            let mut form = BoardForm::from_board(&board);
            if let Some(title) = title {
                form.title = title;
            }
            if let Some(content) = content {
                form.content = content;
            }
            if let Some(category) = category {
                form.category = category;
            }
            form.file = read_attachment(file.as_deref()).await?;
            let route = pages::submit_board(client, &FormMode::Edit(id), &form).await?;
            println!("저장되었습니다: {route}");
        }
        Command::Delete { id } => {
            pages::delete_board(client, &id).await?;
            println!("삭제되었습니다.");
        }
    }
    Ok(())
}

async fn read_attachment(path: Option<&Path>) -> Result<Option<Attachment>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_owned());
    Ok(Some(Attachment {
        content_type: guess_content_type(&file_name).map(str::to_owned),
        file_name,
        data: Bytes::from(data),
    }))
}

fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}
