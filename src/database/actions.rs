mod favorites;
mod products;
mod recipes;
mod shopping_cart;
mod subscriptions;
mod tags;
mod users;

pub use favorites::*;
pub use products::*;
pub use recipes::*;
pub use shopping_cart::*;
pub use subscriptions::*;
pub use tags::*;
pub use users::*;
