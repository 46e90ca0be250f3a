use sqlx::{PgExecutor, prelude::FromRow};

/// A row from the `catalog.category` table.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

pub async fn find_category<'c, E>(executor: E, name: &str) -> sqlx::Result<Option<CategoryRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, CategoryRow>(
        r#"
        select id, name, description
        from catalog.category
        where name = $1
        "#,
    )
    .bind(name)
    .fetch_optional(executor)
    .await
}

pub async fn insert_category<'c, E>(
    executor: E,
    name: &str,
    description: Option<&str>,
) -> sqlx::Result<CategoryRow>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, CategoryRow>(
        r#"
        insert into catalog.category (name, description)
        values ($1, $2)
        returning id, name, description
        "#,
    )
    .bind(name)
    .bind(description)
    .fetch_one(executor)
    .await
}
