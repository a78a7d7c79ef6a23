//! Business logic services for the storefront.
//!
//! Each service borrows the shared [`SupabaseClient`](crate::supabase::SupabaseClient)
//! and, where rows belong to a user, the signed-in [`CurrentUser`](crate::models::CurrentUser)
//! whose token the backend's row-level policies check.
//!
//! # Services
//!
//! - `catalog` - Products, categories, best sellers, reviews (anonymous reads)
//! - `cart` - Cart lines in `cart_items`
//! - `favorites` - Favorite products in `favorites`
//! - `reviews` - Writing and editing one's own reviews
//! - `blog` - Published articles
//! - `profile` - Display name and avatar
//! - `auth` - Sign-in, sign-up, email confirmation, admin check
//! - `admin` - Product/article/order/user management
//! - `markdown` - Article rendering

pub mod admin;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod markdown;
pub mod profile;
pub mod reviews;

pub use admin::AdminService;
pub use auth::{AuthError, AuthService};
pub use blog::BlogService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use favorites::FavoritesService;
pub use profile::ProfileService;
pub use reviews::ReviewService;
