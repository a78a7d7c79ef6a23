//! Remote table names and the `select` shapes used against them.

pub const PRODUCTS: &str = "products";
pub const CATEGORIES: &str = "categories";
pub const CART_ITEMS: &str = "cart_items";
pub const FAVORITES: &str = "favorites";
pub const REVIEWS: &str = "reviews";
pub const ARTICLES: &str = "articles";
pub const PROFILES: &str = "profiles";
pub const ORDERS: &str = "orders";

/// Products with the category fields the sidebar filter needs.
pub const PRODUCT_WITH_CATEGORY: &str = "*,categories(id,name,slug)";

/// Cart lines with the full product embedded.
pub const CART_LINE: &str = "quantity,products(*,categories(id,name,slug))";

/// Favorite rows with the full product embedded.
pub const FAVORITE_PRODUCT: &str = "product_id,products(*,categories(id,name,slug))";

/// Reviews with the author's public profile.
pub const REVIEW_WITH_AUTHOR: &str = "*,profiles(username,display_name,avatar_url)";

/// Articles with the author's public profile.
pub const ARTICLE_WITH_AUTHOR: &str = "*,author:profiles(username,display_name,avatar_url)";

/// Orders with the customer's contact fields.
pub const ORDER_WITH_CUSTOMER: &str = "*,profiles(email,username)";
