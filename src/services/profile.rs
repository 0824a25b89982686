//! User profile documents

use crate::db::repositories::Collection;
use crate::db::FieldUpdate;
use crate::models::{Account, SocialLinks, UserProfile};
use crate::services::error::{ContentError, ContentResult};
use crate::services::validation::validate_link;

pub struct ProfileService {
    profiles: Collection<UserProfile>,
}

impl ProfileService {
    pub fn new(profiles: Collection<UserProfile>) -> Self {
        Self { profiles }
    }

    /// Profile document of the account. Accounts without one get a profile
    /// built from the account itself.
    pub async fn get(&self, account: &Account) -> ContentResult<UserProfile> {
        match self.profiles.get(&account.id).await? {
            Some(profile) => Ok(profile),
            None => Ok(UserProfile {
                id: account.id.clone(),
                display_name: account.display_name.clone(),
                email: account.email.clone(),
                photo_url: account.photo_url.clone(),
                social_links: SocialLinks::default(),
                created_at: Some(account.created_at.to_rfc3339()),
            }),
        }
    }

    /// Replace all four social links. Each must be an absolute http(s) URL.
    pub async fn update_social_links(
        &self,
        account: &Account,
        links: SocialLinks,
    ) -> ContentResult<UserProfile> {
        let mut errors = Vec::new();
        let mut check = |network: &str, raw: &str| match validate_link(raw) {
            Ok(link) => link,
            Err(e) => {
                errors.push(format!("{}: {}", network, e));
                String::new()
            }
        };
        let checked = SocialLinks {
            instagram: check("instagram", &links.instagram),
            facebook: check("facebook", &links.facebook),
            tiktok: check("tiktok", &links.tiktok),
            youtube: check("youtube", &links.youtube),
        };
        if !errors.is_empty() {
            return Err(ContentError::validation(errors.join("; ")));
        }

        let value = serde_json::to_value(&checked).map_err(anyhow::Error::from)?;
        if let Some(updated) = self
            .profiles
            .update(&account.id, &[FieldUpdate::set("socialLinks", value)])
            .await?
        {
            return Ok(updated);
        }

        // No profile document yet
        let mut profile = self.get(account).await?;
        profile.social_links = checked;
        Ok(self.profiles.set(&account.id, &profile).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use crate::models::AccountRole;
    use serde_json::json;

    async fn setup() -> (ProfileService, Collection<UserProfile>, Account) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let profiles = Collection::new(SqlxDocumentStore::boxed(pool));
        let account = Account::new(
            "ana@example.com".to_string(),
            "hash".to_string(),
            "Ana".to_string(),
            AccountRole::Member,
        );
        (ProfileService::new(profiles.clone()), profiles, account)
    }

    fn links(instagram: &str) -> SocialLinks {
        SocialLinks {
            instagram: instagram.to_string(),
            facebook: "https://facebook.com/ana".to_string(),
            tiktok: "https://tiktok.com/@ana".to_string(),
            youtube: "https://youtube.com/@ana".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_profile_built_from_account() {
        let (service, _, account) = setup().await;
        let profile = service.get(&account).await.unwrap();
        assert_eq!(profile.display_name, "Ana");
        assert_eq!(profile.email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_update_social_links() {
        let (service, profiles, account) = setup().await;
        let seeded: UserProfile = serde_json::from_value(json!({ "displayName": "Ana B." })).unwrap();
        profiles.set(&account.id, &seeded).await.unwrap();

        let updated = service
            .update_social_links(&account, links("https://instagram.com/ana"))
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Ana B.");
        assert_eq!(updated.social_links.instagram, "https://instagram.com/ana");
    }

    #[tokio::test]
    async fn test_update_social_links_creates_profile() {
        let (service, profiles, account) = setup().await;
        service
            .update_social_links(&account, links("https://instagram.com/ana"))
            .await
            .unwrap();
        let stored = profiles.get(&account.id).await.unwrap().unwrap();
        assert_eq!(stored.social_links.youtube, "https://youtube.com/@ana");
    }

    #[tokio::test]
    async fn test_invalid_link_rejected() {
        let (service, _, account) = setup().await;
        let err = service
            .update_social_links(&account, links("instagram.com/ana"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("instagram"));
    }
}
