//! Data models
//!
//! Content documents (articles, courses, reels, reviews, shop, profiles,
//! newsletter, tips) keep the camelCase field names of the stored JSON.
//! Accounts, sessions and tokens map the relational auth tables.

mod account;
mod article;
mod course;
mod newsletter;
mod profile;
mod reel;
mod review;
mod session;
mod shop;
mod visibility;

pub use account::{Account, AccountRole};
pub use article::{Article, ArticlePreview, ArticleSummary};
pub use course::{Course, CourseLearnView, Video};
pub use newsletter::{Subscription, Tip};
pub use profile::{SocialLinks, UserProfile};
pub use reel::{Reel, ReelComment};
pub use review::{CourseReviews, RatingBucket, RatingSummary, Review, MAX_RATING, MIN_RATING};
pub use session::{AuthToken, Session, TokenPurpose};
pub use shop::{Price, Product, ShopCatalog, ShopCategory, ALL_CATEGORY};
pub use visibility::Visibility;
