//! Services layer - Business logic
//!
//! Each dashboard screen's fetch and mutate steps live here, on top of the
//! document collections and the account repositories:
//! - Accounts, sessions, email verification and password reset
//! - Articles, courses, reels (with the reel viewer state), reviews, shop
//! - Profile, newsletter and the dashboard home
//! - Admin editing of content collections

pub mod account;
pub mod admin;
pub mod article;
pub mod auth_events;
pub mod course;
pub mod credentials;
pub mod dashboard;
pub mod error;
pub mod mailer;
pub mod newsletter;
pub mod profile;
pub mod rate_limiter;
pub mod reel;
pub mod reel_viewer;
pub mod review;
pub mod shop;
pub mod slug;
pub mod storage;
pub mod validation;

pub use account::{AccountService, AccountServiceError, RegisterInput, SignInInput, SignedIn};
pub use admin::AdminContentService;
pub use article::ArticleService;
pub use auth_events::{spawn_login_audit, AuthEvent, AuthEvents, AuthSubscription};
pub use course::CourseService;
pub use dashboard::{DashboardHome, DashboardService};
pub use error::{ContentError, ContentResult};
pub use mailer::Mailer;
pub use newsletter::{NewsletterService, SubscribeInput};
pub use profile::ProfileService;
pub use rate_limiter::LoginRateLimiter;
pub use reel::{Commenter, ReelService, ShareLinks};
pub use reel_viewer::{NavDirection, ReelView, ReelViewer};
pub use review::{ReviewInput, ReviewService, Reviewer};
pub use shop::{ShopFilter, ShopService};
pub use slug::generate_slug;
pub use storage::FileStorage;
