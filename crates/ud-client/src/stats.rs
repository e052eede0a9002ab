//! Statistics page counts
//!
//! Each statistic is the `meta.total` of a one-row listing request filtered
//! by a preset rule set.

use chrono::{DateTime, Utc};
use tracing::debug;
use ud_core::{UdError, UdResult, ValidationErrors};
use ud_queries::presets;

use crate::users::UsersApi;

/// One statistic shown on the statistics page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatKind {
    /// All users
    Total,
    /// Users who joined within the last N days
    JoinedWithinDays(i64),
    /// Users whose country is the given one
    Country(String),
    /// Users with no country set
    UnknownCountry,
    /// Users outside the home country, excluding unknowns
    Foreigners,
}

impl StatKind {
    /// Stable identifier, usable on the command line
    pub fn id(&self) -> String {
        match self {
            Self::Total => "total".to_string(),
            Self::JoinedWithinDays(days) => format!("joined-{}d", days),
            Self::Country(name) => format!("country:{}", name),
            Self::UnknownCountry => "country-unknown".to_string(),
            Self::Foreigners => "foreigners".to_string(),
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Total => "کل کاربران".to_string(),
            Self::JoinedWithinDays(1) => "۲۴ ساعت گذشته".to_string(),
            Self::JoinedWithinDays(7) => "یک هفته گذشته".to_string(),
            Self::JoinedWithinDays(30) => "یک ماه گذشته".to_string(),
            Self::JoinedWithinDays(365) => "یک سال گذشته".to_string(),
            Self::JoinedWithinDays(days) => format!("{} روز گذشته", days),
            Self::Country(name) => name.clone(),
            Self::UnknownCountry => "نامشخص".to_string(),
            Self::Foreigners => "خارجی‌ها".to_string(),
        }
    }
}

/// The statistics page layout: join windows, then geography
pub fn default_stats(home_country: &str) -> Vec<StatKind> {
    vec![
        StatKind::Total,
        StatKind::JoinedWithinDays(1),
        StatKind::JoinedWithinDays(7),
        StatKind::JoinedWithinDays(30),
        StatKind::JoinedWithinDays(365),
        StatKind::Country(home_country.to_string()),
        StatKind::Country("آلمان".to_string()),
        StatKind::UnknownCountry,
        StatKind::Foreigners,
    ]
}

#[derive(Clone)]
pub struct StatsService {
    users: UsersApi,
    home_country: String,
}

impl StatsService {
    pub fn new(users: UsersApi, home_country: impl Into<String>) -> Self {
        Self {
            users,
            home_country: home_country.into(),
        }
    }

    pub async fn total(&self) -> UdResult<u64> {
        self.users.count(&presets::all_users()).await
    }

    pub async fn joined_within_days(&self, days: i64, now: DateTime<Utc>) -> UdResult<u64> {
        let rules = presets::joined_within_days(days, now).ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add("days", "is out of range");
            UdError::Validation(errors)
        })?;
        self.users.count(&rules).await
    }

    pub async fn country(&self, name: &str) -> UdResult<u64> {
        self.users.count(&presets::country_is(name)).await
    }

    pub async fn unknown_country(&self) -> UdResult<u64> {
        self.users.count(&presets::country_unknown()).await
    }

    /// Total minus home-country users minus users with no country
    pub async fn foreigners(&self) -> UdResult<u64> {
        let (total, home, unknown) = tokio::try_join!(
            self.total(),
            self.country(&self.home_country),
            self.unknown_country()
        )?;
        debug!(total, home, unknown, "Counted foreigners");
        Ok(total.saturating_sub(home).saturating_sub(unknown))
    }

    pub async fn compute(&self, kind: &StatKind, now: DateTime<Utc>) -> UdResult<u64> {
        match kind {
            StatKind::Total => self.total().await,
            StatKind::JoinedWithinDays(days) => self.joined_within_days(*days, now).await,
            StatKind::Country(name) => self.country(name).await,
            StatKind::UnknownCountry => self.unknown_country().await,
            StatKind::Foreigners => self.foreigners().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use crate::credentials::MemoryCredentialStore;
    use crate::test_support::spawn;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Pretends there are 100 users: 60 in Iran, 25 without a country
    async fn counts(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
        assert_eq!(query.get("size").map(String::as_str), Some("1"));
        let total = if query.get("no_country").is_some() {
            25
        } else if let Some(country) = query.get("country") {
            if country == "ایران" {
                60
            } else {
                3
            }
        } else if let Some(after) = query.get("joined_after_unix") {
            if after == "1709251200" {
                9
            } else {
                0
            }
        } else {
            100
        };
        Json(json!({
            "data": [],
            "meta": { "total": total, "page": 1, "size": 1, "pages": total },
            "error": {}
        }))
    }

    async fn stats() -> StatsService {
        let base = spawn(Router::new().route("/users-management/", get(counts))).await;
        let client = ApiClient::with_http(
            reqwest::Client::new(),
            base,
            Arc::new(MemoryCredentialStore::new()),
        );
        StatsService::new(UsersApi::new(client), "ایران")
    }

    #[tokio::test]
    async fn test_foreigners() {
        let stats = stats().await;
        assert_eq!(stats.foreigners().await.unwrap(), 15);
    }

    #[tokio::test]
    async fn test_simple_counts() {
        let stats = stats().await;
        let now = Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap();
        assert_eq!(stats.total().await.unwrap(), 100);
        assert_eq!(stats.unknown_country().await.unwrap(), 25);
        assert_eq!(stats.country("آلمان").await.unwrap(), 3);
        assert_eq!(stats.joined_within_days(7, now).await.unwrap(), 9);
        assert_eq!(
            stats.compute(&StatKind::Country("ایران".into()), now).await.unwrap(),
            60
        );
    }

    #[tokio::test]
    async fn test_join_window_out_of_range() {
        let stats = stats().await;
        let err = stats
            .compute(&StatKind::JoinedWithinDays(i64::MAX / 1000), Utc::now())
            .await
            .unwrap_err();
        match err {
            UdError::Validation(errors) => assert!(errors.has_error("days")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_stats() {
        let kinds = default_stats("ایران");
        assert_eq!(kinds.len(), 9);
        assert_eq!(kinds[1].title(), "۲۴ ساعت گذشته");
        assert_eq!(kinds[5], StatKind::Country("ایران".into()));
        assert_eq!(StatKind::JoinedWithinDays(7).id(), "joined-7d");
        assert_eq!(StatKind::Foreigners.title(), "خارجی‌ها");
    }
}
