use crate::schema::UserRole;

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageOwnSubscriptions,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageAllRecipes,
            ActionType::ManageTags,
            ActionType::ManageProducts,
        ],
    ),
];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnShoppingCart,
    ManageOwnSubscriptions,

    ManageAllRecipes,
    ManageTags,
    ManageProducts,
}

impl ActionType {
    pub fn is_allowed_for(self, role: &UserRole) -> bool {
        ACTION_TABLE
            .iter()
            .find_map(|(uid, actions)| {
                if role != uid {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_manage_their_own_things() {
        assert!(ActionType::CreateRecipes.is_allowed_for(&UserRole::User));
        assert!(ActionType::ManageOwnShoppingCart.is_allowed_for(&UserRole::User));
        assert!(!ActionType::ManageAllRecipes.is_allowed_for(&UserRole::User));
        assert!(!ActionType::ManageTags.is_allowed_for(&UserRole::User));
        assert!(!ActionType::ManageProducts.is_allowed_for(&UserRole::User));
    }

    #[test]
    fn admins_manage_reference_data() {
        assert!(ActionType::ManageTags.is_allowed_for(&UserRole::Admin));
        assert!(ActionType::ManageProducts.is_allowed_for(&UserRole::Admin));
        assert!(ActionType::ManageAllRecipes.is_allowed_for(&UserRole::Admin));
    }
}
