use folio::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams, RepoError,
};
use folio::domain::categories::{
    CategoryColor, CategoryRecord, MoveDirection, plan_swap, sort_categories,
};
use folio::infra::db::PostgresRepositories;
use sqlx::PgPool;

async fn seed(repos: &PostgresRepositories, names: &[&str]) {
    for (position, name) in names.iter().enumerate() {
        repos
            .create_category(CreateCategoryParams {
                name: (*name).to_string(),
                slug: name.to_lowercase(),
                color: CategoryColor::Blue,
                display_order: position as i32 + 1,
            })
            .await
            .expect("create category");
    }
}

async fn ordered(repos: &PostgresRepositories) -> Vec<CategoryRecord> {
    let mut categories = repos.list_categories().await.expect("list");
    sort_categories(&mut categories);
    categories
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn swap_exchanges_order_keys(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    seed(&repos, &["Tech", "Life", "Travel"]).await;

    let before = ordered(&repos).await;
    let plan = plan_swap(&before, 1, MoveDirection::Up)
        .expect("in range")
        .expect("not a boundary");
    repos.swap_display_order(&plan).await.expect("swap");

    let names: Vec<String> = ordered(&repos)
        .await
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, ["Life", "Tech", "Travel"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn stale_plan_rolls_back(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    seed(&repos, &["Tech", "Life", "Travel"]).await;

    let stale = ordered(&repos).await;
    let first = plan_swap(&stale, 2, MoveDirection::Up)
        .expect("in range")
        .expect("not a boundary");
    repos.swap_display_order(&first).await.expect("first swap");

    let conflicting = plan_swap(&stale, 1, MoveDirection::Up)
        .expect("in range")
        .expect("not a boundary");
    let result = repos.swap_display_order(&conflicting).await;
    assert!(matches!(result, Err(RepoError::Integrity { .. })));

    let names: Vec<String> = ordered(&repos)
        .await
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, ["Tech", "Travel", "Life"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_names_are_rejected(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    seed(&repos, &["Tech"]).await;

    let result = repos
        .create_category(CreateCategoryParams {
            name: "Tech".into(),
            slug: "tech-2".into(),
            color: CategoryColor::Rose,
            display_order: 2,
        })
        .await;
    assert!(matches!(result, Err(RepoError::Duplicate { .. })));
}
