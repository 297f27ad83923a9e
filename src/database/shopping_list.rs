use std::{collections::HashMap, fmt};

use crate::{constants::SHOPPING_LIST_HEADER, schema::Uuid};

/// One ingredient line of a recipe that sits in a user's shopping cart.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct CartIngredient {
    pub product_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingListItem {
    pub product_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Ingredients of every recipe in a cart, summed per product.
///
/// Items keep the order in which their product was first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShoppingList {
    items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    pub fn aggregate<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = CartIngredient>,
    {
        let mut items: Vec<ShoppingListItem> = vec![];
        let mut positions: HashMap<Uuid, usize> = HashMap::new();

        for line in lines {
            match positions.get(&line.product_id) {
                Some(&position) => items[position].total_amount += i64::from(line.amount),
                None => {
                    positions.insert(line.product_id, items.len());
                    items.push(ShoppingListItem {
                        product_id: line.product_id,
                        name: line.name,
                        measurement_unit: line.measurement_unit,
                        total_amount: i64::from(line.amount),
                    });
                }
            }
        }

        Self { items }
    }

    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SHOPPING_LIST_HEADER}")?;
        for item in &self.items {
            writeln!(
                f,
                "{} - {} {}.",
                item.name, item.total_amount, item.measurement_unit
            )?;
        }
        Ok(())
    }
}
