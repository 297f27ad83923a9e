use std::collections::HashSet;

use log::debug;
use sqlx::{Pool, Postgres};

use crate::{
    error::Error,
    form::ProductForm,
    schema::{Product, Uuid},
};

/// Products whose name starts with `search`, case-insensitively. An empty search lists all.
pub async fn search_products(search: &str, pool: &Pool<Postgres>) -> Result<Vec<Product>, Error> {
    let pattern = format!("{}%", escape_like(search.trim()));

    let rows: Vec<Product> =
        sqlx::query_as("SELECT * FROM products WHERE name ILIKE $1 ORDER BY name, id")
            .bind(pattern)
            .fetch_all(pool)
            .await?;

    Ok(rows)
}

pub async fn get_product(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Product>, Error> {
    let row: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn create_product(form: &ProductForm, pool: &Pool<Postgres>) -> Result<Product, Error> {
    let form = form.validate()?;

    let product: Product = sqlx::query_as(
        "INSERT INTO products (name, measurement_unit) VALUES ($1, $2) RETURNING *",
    )
    .bind(&form.name)
    .bind(&form.measurement_unit)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

/// Drops repeated `(name, measurement_unit)` pairs, keeping the first occurrence.
fn unique_products(forms: Vec<ProductForm>) -> Vec<ProductForm> {
    let mut seen = HashSet::with_capacity(forms.len());
    forms
        .into_iter()
        .filter(|f| seen.insert((f.name.to_owned(), f.measurement_unit.to_owned())))
        .collect()
}

/// Seeds products in one transaction. Rows that fail validation abort the whole import;
/// repeated and already stored products are skipped.
pub async fn import_products(forms: &[ProductForm], pool: &Pool<Postgres>) -> Result<u64, Error> {
    let forms = forms
        .iter()
        .map(ProductForm::validate)
        .collect::<Result<Vec<_>, Error>>()?;
    let forms = unique_products(forms);

    let names: Vec<String> = forms.iter().map(|f| f.name.to_owned()).collect();
    let units: Vec<String> = forms.iter().map(|f| f.measurement_unit.to_owned()).collect();

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "
        INSERT INTO products (name, measurement_unit)
        SELECT name, unit FROM UNNEST($1::text[], $2::text[]) AS t(name, unit)
        ON CONFLICT (name, measurement_unit) DO NOTHING
    ",
    )
    .bind(&names)
    .bind(&units)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!(
        "Inserted {} of {} products",
        result.rows_affected(),
        forms.len()
    );

    Ok(result.rows_affected())
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, unit: &str) -> ProductForm {
        ProductForm {
            name: String::from(name),
            measurement_unit: String::from(unit),
        }
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("flour"), "flour");
    }

    #[test]
    fn repeated_products_are_imported_once() {
        let forms = unique_products(vec![
            product("Salt", "g"),
            product("Sugar", "g"),
            product("Salt", "g"),
            product("Salt", "pinch"),
        ]);

        assert_eq!(
            forms,
            vec![product("Salt", "g"), product("Sugar", "g"), product("Salt", "pinch")]
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn import_skips_duplicates_in_file_and_table(pool: Pool<Postgres>) {
        create_product(&product("Sugar", "g"), &pool).await.unwrap();

        let inserted = import_products(
            &[product("Salt", "g"), product("Salt", "g"), product("Sugar", "g")],
            &pool,
        )
        .await
        .unwrap();
        assert_eq!(inserted, 1);

        let found = search_products("sa", &pool).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Salt");
    }
}
