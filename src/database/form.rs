//! Request payloads and the validators run on them before anything touches the database.
//!
//! Each validator returns the cleaned value or an [`Error::Validation`]; handlers chain them
//! with `?` in a fixed order.

use std::{io::Read, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::Deserialize;
use url::form_urlencoded;

use super::{error::Error, pagination::PageQuery};
use crate::{
    constants::{
        EMAIL_MAX_LENGTH, NAME_MAX_LENGTH, PASSWORD_MIN_LENGTH, SLUG_MAX_LENGTH,
        USERNAME_MAX_LENGTH,
    },
    schema::Uuid,
};

#[derive(Deserialize, Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SetPasswordForm {
    pub new_password: String,
    pub current_password: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RecipeForm {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TagForm {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ProductForm {
    pub name: String,
    pub measurement_unit: String,
}

/// Reads `name,measurement_unit` rows. A first row naming those two columns is a header.
pub fn read_products_csv<R: Read>(reader: R) -> Result<Vec<ProductForm>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut products = vec![];
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::Validation(format!("Malformed CSV ({e})")))?;
        let (name, unit) = match (record.get(0), record.get(1)) {
            (Some(name), Some(unit)) => (name, unit),
            _ => {
                return Err(Error::Validation(format!(
                    "Row {} needs a name and a measurement unit",
                    index + 1
                )))
            }
        };
        if index == 0 && name == "name" && unit == "measurement_unit" {
            continue;
        }

        products.push(ProductForm {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        });
    }

    Ok(products)
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub recipes_limit: Option<i64>,
}

impl SubscriptionQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProductSearch {
    pub name: Option<String>,
}

/// Filters accepted by the recipe list: `tags` may repeat, flags accept `1/0/true/false`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeFilter {
    pub page: PageQuery,
    pub tags: Vec<String>,
    pub author: Option<Uuid>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeFilter {
    pub fn from_query(query: &str) -> Result<Self, Error> {
        let mut filter = Self::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "tags" => filter.tags.push(value.into_owned()),
                "author" => filter.author = Some(parse_number(&key, &value)?),
                "page" => filter.page.page = Some(parse_number(&key, &value)?),
                "limit" => filter.page.limit = Some(parse_number(&key, &value)?),
                "is_favorited" => filter.is_favorited = Some(parse_flag(&key, &value)?),
                "is_in_shopping_cart" => {
                    filter.is_in_shopping_cart = Some(parse_flag(&key, &value)?)
                }
                _ => {}
            }
        }

        Ok(filter)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, Error> {
    value
        .parse()
        .map_err(|_| Error::Validation(format!("Query parameter '{key}' must be a number")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, Error> {
    match value {
        "1" | "true" | "True" => Ok(true),
        "0" | "false" | "False" => Ok(false),
        _ => Err(Error::Validation(format!(
            "Query parameter '{key}' must be 0 or 1"
        ))),
    }
}

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"));
static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug pattern"));
static COLOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color pattern"));

pub fn validate_text(field: &str, value: &str, max_length: Option<usize>) -> Result<String, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("Field '{field}' is required")));
    }
    if let Some(max_length) = max_length {
        if value.chars().count() > max_length {
            return Err(Error::Validation(format!(
                "Field '{field}' must be at most {max_length} characters"
            )));
        }
    }
    Ok(value.to_string())
}

pub fn validate_username(username: &str) -> Result<String, Error> {
    let username = validate_text("username", username, Some(USERNAME_MAX_LENGTH))?;
    if !USERNAME_PATTERN.is_match(&username) {
        return Err(Error::validation(
            "Username may contain only letters, digits and @/./+/-/_",
        ));
    }
    Ok(username)
}

pub fn validate_email(email: &str) -> Result<String, Error> {
    let email = validate_text("email", email, Some(EMAIL_MAX_LENGTH))?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            Ok(email.to_lowercase())
        }
        _ => Err(Error::validation("Enter a valid email address")),
    }
}

pub fn validate_password(password: &str) -> Result<String, Error> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(Error::Validation(format!(
            "Password must contain at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::validation("Password can't be entirely numeric"));
    }
    Ok(password.to_string())
}

pub fn validate_cooking_time(cooking_time: i32) -> Result<i32, Error> {
    if cooking_time < 1 {
        return Err(Error::validation("Cooking time must be at least 1 minute"));
    }
    Ok(cooking_time)
}

pub fn validate_slug(slug: &str) -> Result<String, Error> {
    let slug = validate_text("slug", slug, Some(SLUG_MAX_LENGTH))?;
    if !SLUG_PATTERN.is_match(&slug) {
        return Err(Error::validation(
            "Slug may contain only latin letters, digits, '-' and '_'",
        ));
    }
    Ok(slug)
}

pub fn validate_color(color: &str) -> Result<String, Error> {
    let color = color.trim();
    if !COLOR_PATTERN.is_match(color) {
        return Err(Error::validation("Color must be a hex value like #E26C2D"));
    }
    Ok(color.to_uppercase())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidRegistration {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<ValidRegistration, Error> {
        Ok(ValidRegistration {
            email: validate_email(&self.email)?,
            username: validate_username(&self.username)?,
            first_name: validate_text("first_name", &self.first_name, Some(USERNAME_MAX_LENGTH))?,
            last_name: validate_text("last_name", &self.last_name, Some(USERNAME_MAX_LENGTH))?,
            password: validate_password(&self.password)?,
        })
    }
}

/// Scalar recipe fields after validation. Associations are checked separately.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeFields {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeForm {
    pub fn validate_fields(&self) -> Result<RecipeFields, Error> {
        Ok(RecipeFields {
            name: validate_text("name", &self.name, Some(NAME_MAX_LENGTH))?,
            text: validate_text("text", &self.text, None)?,
            image: validate_text("image", &self.image, None)?,
            cooking_time: validate_cooking_time(self.cooking_time)?,
        })
    }
}

impl TagForm {
    pub fn validate(&self) -> Result<TagForm, Error> {
        Ok(TagForm {
            name: validate_text("name", &self.name, Some(NAME_MAX_LENGTH))?,
            color: validate_color(&self.color)?,
            slug: validate_slug(&self.slug)?,
        })
    }
}

impl ProductForm {
    pub fn validate(&self) -> Result<ProductForm, Error> {
        Ok(ProductForm {
            name: validate_text("name", &self.name, Some(NAME_MAX_LENGTH))?,
            measurement_unit: validate_text(
                "measurement_unit",
                &self.measurement_unit,
                Some(NAME_MAX_LENGTH),
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_form() -> RecipeForm {
        RecipeForm {
            name: String::from(" Pancakes "),
            text: String::from("Mix and fry."),
            image: String::from("media/pancakes.png"),
            cooking_time: 20,
            tags: vec![1],
            ingredients: vec![IngredientAmount { id: 1, amount: 200 }],
        }
    }

    #[test]
    fn recipe_fields_are_trimmed() {
        let fields = recipe_form().validate_fields().unwrap();
        assert_eq!(fields.name, "Pancakes");
        assert_eq!(fields.cooking_time, 20);
    }

    #[test]
    fn recipe_needs_positive_cooking_time() {
        let mut form = recipe_form();
        form.cooking_time = 0;
        assert!(matches!(form.validate_fields(), Err(Error::Validation(_))));
    }

    #[test]
    fn recipe_name_length_is_bounded() {
        let mut form = recipe_form();
        form.name = "a".repeat(NAME_MAX_LENGTH + 1);
        assert!(matches!(form.validate_fields(), Err(Error::Validation(_))));

        form.name = "a".repeat(NAME_MAX_LENGTH);
        assert!(form.validate_fields().is_ok());
    }

    #[test]
    fn blank_text_is_rejected() {
        let mut form = recipe_form();
        form.text = String::from("   ");
        assert!(matches!(form.validate_fields(), Err(Error::Validation(_))));
    }

    #[test]
    fn registration() {
        let form = RegisterForm {
            email: String::from("Cook@Example.com"),
            username: String::from("cook.42"),
            first_name: String::from("Ada"),
            last_name: String::from("Lovelace"),
            password: String::from("s3cret-pass"),
        };
        let valid = form.validate().unwrap();
        assert_eq!(valid.email, "cook@example.com");
        assert_eq!(valid.username, "cook.42");
    }

    #[test]
    fn usernames_with_spaces_are_rejected() {
        assert!(validate_username("chef remy").is_err());
        assert!(validate_username("chef_remy+1@x").is_ok());
    }

    #[test]
    fn weak_passwords_are_rejected() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("1234567890").is_err());
        assert!(validate_password("correct horse").is_ok());
    }

    #[test]
    fn emails_need_a_domain() {
        assert!(validate_email("cook").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("cook@localhost").is_err());
    }

    #[test]
    fn recipe_filter_reads_repeated_tags() {
        let filter =
            RecipeFilter::from_query("tags=breakfast&tags=lunch&author=3&is_favorited=1&page=2")
                .unwrap();

        assert_eq!(filter.tags, vec!["breakfast", "lunch"]);
        assert_eq!(filter.author, Some(3));
        assert_eq!(filter.is_favorited, Some(true));
        assert_eq!(filter.is_in_shopping_cart, None);
        assert_eq!(filter.page.page, Some(2));
    }

    #[test]
    fn recipe_filter_rejects_garbage() {
        assert!(RecipeFilter::from_query("author=me").is_err());
        assert!(RecipeFilter::from_query("is_in_shopping_cart=maybe").is_err());
        assert_eq!(RecipeFilter::from_query("").unwrap(), RecipeFilter::default());
    }

    #[test]
    fn tags() {
        let tag = TagForm {
            name: String::from("Breakfast"),
            color: String::from("#e26c2d"),
            slug: String::from("breakfast"),
        }
        .validate()
        .unwrap();
        assert_eq!(tag.color, "#E26C2D");

        assert!(validate_color("red").is_err());
        assert!(validate_slug("first meal").is_err());
    }

    #[test]
    fn products_from_csv() {
        let data = "name,measurement_unit\nabricot jam,g\n\"salt, sea\",pinch\n";
        let products = read_products_csv(data.as_bytes()).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "abricot jam");
        assert_eq!(products[1].name, "salt, sea");
        assert_eq!(products[1].measurement_unit, "pinch");
    }

    #[test]
    fn headerless_csv_keeps_first_row() {
        let products = read_products_csv("flour,g\n".as_bytes()).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "flour");
    }

    #[test]
    fn csv_rows_need_two_columns() {
        assert!(matches!(
            read_products_csv("flour,g\nsugar\n".as_bytes()),
            Err(Error::Validation(_))
        ));
    }
}
