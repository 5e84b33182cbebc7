use std::{process, sync::Arc};

use folio::{
    application::{
        categories::AdminCategoryService,
        comments::{AdminCommentService, PublicCommentService},
        error::AppError,
        feed::FeedService,
        posts::AdminPostService,
        render::{MarkdownRenderer, PreviewRenderer},
        repos::{CategoriesRepo, CategoriesWriteRepo, CommentsRepo, PostsRepo, PostsWriteRepo},
        uploads::{ImageUploadService, ObjectStore},
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminCredentials, AppState},
        telemetry,
        uploads::FilesystemObjectStore,
    },
};
use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    info!(
        target = "folio::migrate",
        "database schema is up to date"
    );
    repositories.pool().close().await;
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_app_state(repositories, &settings)?;
    serve_http(&settings, state).await
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_app_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<AppState, AppError> {
    let categories_repo: Arc<dyn CategoriesRepo> = repositories.clone();
    let categories_write_repo: Arc<dyn CategoriesWriteRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();

    let media = Arc::new(FilesystemObjectStore::new(
        settings.uploads.directory.clone(),
        settings.uploads.public_base_url.clone(),
    ));
    media
        .ensure_bucket()
        .map_err(|err| AppError::from(InfraError::Io(err)))?;
    let store: Arc<dyn ObjectStore> = media.clone();

    let renderer: Arc<dyn PreviewRenderer> = Arc::new(MarkdownRenderer::new());

    if settings.admin.token.is_empty() {
        warn!(
            target = "folio::startup",
            "admin token is not configured; admin routes will reject every request"
        );
    }

    Ok(AppState {
        feed: Arc::new(FeedService::new(
            posts_repo.clone(),
            categories_repo.clone(),
            renderer.clone(),
        )),
        categories: Arc::new(AdminCategoryService::new(
            categories_repo,
            categories_write_repo,
        )),
        posts: Arc::new(AdminPostService::new(posts_repo.clone(), posts_write_repo)),
        comments: Arc::new(AdminCommentService::new(comments_repo.clone())),
        public_comments: Arc::new(PublicCommentService::new(comments_repo, posts_repo)),
        uploads: Arc::new(ImageUploadService::new(
            store,
            settings.uploads.max_request_bytes_usize(),
        )),
        media,
        renderer,
        admin: AdminCredentials::new(
            settings.admin.token.as_str(),
            settings.admin.author.as_str(),
        ),
        scroll_debounce: settings.editor.scroll_debounce,
        upload_limit_bytes: settings.uploads.max_request_bytes_usize(),
        db: Some(repositories),
    })
}

async fn serve_http(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "folio::startup",
        addr = %settings.server.addr,
        "listening"
    );

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = stop_tx.send(true);
        },
    );

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            let _ = stop_rx.wait_for(|stopping| *stopping).await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = "folio::shutdown",
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!(target = "folio::shutdown", "shutdown signal received");
}
