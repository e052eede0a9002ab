//! Command handlers

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use ud_client::{
    default_stats, ApiClient, AuthApi, CredentialStore, FileCredentialStore,
    MemoryCredentialStore, StatKind, StatsService, UsersApi,
};
use ud_core::config::AppConfig;
use ud_core::{PageMeta, PageSlot, UdError};
use ud_models::{LoginRequest, User, UserUpdateRequest, UsersResponse};
use ud_queries::url_state::{self, SIZE};
use ud_queries::{
    coerce_input, encode, encode_count, operators_for, sortable_fields, user_catalog, FilterRule,
    QueryState, QueryStateDelta, RuleSet, SortSpec,
};

use crate::cli::{Commands, ListArgs, UsersCommand};

pub async fn run(command: Commands, config: AppConfig) -> Result<()> {
    match command {
        Commands::Encode { location, count } => {
            print!("{}", render_params(&location, count));
            Ok(())
        }
        Commands::Fields { sortable } => {
            print!("{}", render_fields(sortable));
            Ok(())
        }
        Commands::Login { username, password } => {
            let response = auth_api(&config)?
                .login(&LoginRequest::new(username, password))
                .await?;
            println!("Signed in as {}", response.username);
            Ok(())
        }
        Commands::Logout => {
            auth_api(&config)?.logout().await?;
            println!("Signed out");
            Ok(())
        }
        Commands::Users { command } => run_users(command, &config).await,
        Commands::Stats { days } => run_stats(&config, days).await,
    }
}

fn credential_path(config: &AppConfig) -> Option<PathBuf> {
    config
        .auth
        .credentials_path
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".userdesk").join("credentials.json"))
        })
}

fn api_client(config: &AppConfig) -> Result<ApiClient> {
    let store: Arc<dyn CredentialStore> = match credential_path(config) {
        Some(path) => {
            debug!(path = %path.display(), "Using file credential store");
            Arc::new(FileCredentialStore::new(path))
        }
        None => Arc::new(MemoryCredentialStore::new()),
    };
    Ok(ApiClient::new(&config.api, store)?)
}

fn auth_api(config: &AppConfig) -> Result<AuthApi> {
    Ok(AuthApi::new(api_client(config)?, &config.api.auth_base_url))
}

async fn run_users(command: UsersCommand, config: &AppConfig) -> Result<()> {
    let users = UsersApi::new(api_client(config)?);
    match command {
        UsersCommand::List(args) => {
            let state = build_state(&args, config.listing.default_page_size)?;
            let response = users.list_users(&state).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print!("{}", render_listing(&response, &state, args.links));
            }
        }
        UsersCommand::Show {
            user_id,
            json,
            from,
        } => {
            let user = users.get_user(user_id).await?.data;
            if json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                print!("{}", render_user(&user));
            }
            if let Some(location) = from.as_deref().and_then(listing_from_link) {
                println!("Back: userdesk users list --location '{}'", location);
            }
        }
        UsersCommand::Update {
            user_id,
            assignments,
        } => {
            let user = users.get_user(user_id).await?.data;
            let mut request = UserUpdateRequest::from_user(&user);
            for assignment in &assignments {
                let (field, raw) = assignment
                    .split_once('=')
                    .ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{}'", assignment))?;
                request
                    .set_field(field, assignment_value(field, raw)?)
                    .map_err(UdError::Validation)?;
            }
            let updated = users.update_user(&request).await?.data;
            info!(user_id, fields = assignments.len(), "User updated");
            print!("{}", render_user(&updated));
        }
    }
    Ok(())
}

async fn run_stats(config: &AppConfig, extra_days: Vec<i64>) -> Result<()> {
    let stats = StatsService::new(
        UsersApi::new(api_client(config)?),
        &config.listing.home_country,
    );
    let mut kinds = default_stats(&config.listing.home_country);
    kinds.extend(extra_days.into_iter().map(StatKind::JoinedWithinDays));

    let now = Utc::now();
    for kind in &kinds {
        let count = stats.compute(kind, now).await?;
        println!("{:<24} {:>10}", kind.title(), count);
    }
    Ok(())
}

/// The listing state described by the command-line flags
pub fn build_state(args: &ListArgs, default_size: u32) -> Result<QueryState> {
    let mut delta = QueryStateDelta::new();

    if !args.rules.is_empty() {
        let rules = args
            .rules
            .iter()
            .map(|raw| {
                serde_json::from_str::<FilterRule>(raw)
                    .with_context(|| format!("invalid rule JSON: {}", raw))
            })
            .collect::<Result<Vec<_>>>()?;
        delta = delta.rules(RuleSet::from_rules(rules)?);
    }
    if let Some(sort) = &args.sort {
        delta = delta.sort(SortSpec::parse(sort)?);
    }
    if let Some(search) = &args.search {
        delta = delta.search(search.clone());
    }
    if let Some(page) = args.page {
        delta = delta.page(page);
    }
    let size = args
        .size
        .or_else(|| (!url_state::has_param(&args.location, SIZE)).then_some(default_size));
    if let Some(size) = size {
        delta = delta.size(size);
    }

    Ok(url_state::decode(&args.location).apply(delta))
}

/// JSON value for a `--set FIELD=VALUE` assignment, typed by the catalog
pub fn assignment_value(field: &str, raw: &str) -> Result<Value> {
    let Some(descriptor) = user_catalog().lookup(field) else {
        return Ok(Value::String(raw.to_string()));
    };
    match coerce_input(descriptor.semantic_type, raw) {
        Some(value) => Ok(serde_json::to_value(value)?),
        None if raw.trim().is_empty() => Ok(Value::Null),
        None => bail!(
            "'{}' is not a valid {} value for {}",
            raw,
            descriptor.semantic_type,
            field
        ),
    }
}

pub fn render_params(location: &str, count: bool) -> String {
    let state = url_state::decode(location);
    let params = if count {
        encode_count(&state.rules)
    } else {
        encode(&state)
    };
    params
        .iter()
        .map(|(key, value)| format!("{}={}\n", key, value))
        .collect()
}

pub fn render_fields(sortable_only: bool) -> String {
    let fields = if sortable_only {
        sortable_fields()
    } else {
        user_catalog().iter().collect()
    };
    let mut out = String::new();
    for field in fields {
        let operators: Vec<&str> = operators_for(field.semantic_type)
            .iter()
            .map(|op| op.as_str())
            .collect();
        out.push_str(&format!(
            "{:<24} {:<13} {:<5} {:<40} {}\n",
            field.name,
            field.semantic_type,
            if field.sortable { "sort" } else { "" },
            operators.join(","),
            field.label
        ));
    }
    out
}

pub fn render_page_window(meta: &PageMeta) -> String {
    meta.page_window()
        .into_iter()
        .map(|slot| match slot {
            PageSlot::Page(page) if page == meta.page => format!("[{}]", page),
            PageSlot::Page(page) => page.to_string(),
            PageSlot::Ellipsis => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Listing location carried by a detail link, with or without its path
pub fn listing_from_link(link: &str) -> Option<String> {
    let query = link.split_once('?').map_or(link, |(_, query)| query);
    url_state::return_location(query)
}

fn render_listing(response: &UsersResponse, state: &QueryState, links: bool) -> String {
    let location = url_state::encode(state);
    let mut out = String::new();
    for user in &response.data {
        out.push_str(&format!(
            "{:>8} {:>14} {:<24} {:<12} {}",
            user.counter,
            user.user_id,
            user.display_name(),
            user.country.as_deref().unwrap_or("-"),
            user.score.map(|s| s.to_string()).unwrap_or_default()
        ));
        if links {
            out.push_str(&format!("  {}", url_state::detail_path(user.user_id, &location)));
        }
        out.push('\n');
    }

    let meta = &response.meta;
    match meta.item_range() {
        Some((first, last)) => out.push_str(&format!(
            "\n{}-{} of {} users\n",
            first, last, meta.total
        )),
        None => out.push_str("\nNo users match\n"),
    }
    if meta.has_multiple_pages() {
        out.push_str(&format!("Pages: {}\n", render_page_window(meta)));
    }
    out.push_str(&format!("Location: {}\n", location));
    out
}

fn render_user(user: &User) -> String {
    let mut out = format!("{} ({})\n", user.display_name(), user.user_id);
    if let Ok(Value::Object(fields)) = serde_json::to_value(user) {
        for descriptor in user_catalog().iter() {
            if let Some(value) = fields.get(descriptor.name).filter(|v| !v.is_null()) {
                let shown = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out.push_str(&format!("  {:<24} {}\n", descriptor.label, shown));
            }
        }
    }
    if let Some(url) = user.profile_image_url() {
        out.push_str(&format!("  {:<24} {}\n", "profile", url));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_args(location: &str) -> ListArgs {
        ListArgs {
            location: location.to_string(),
            rules: vec![],
            sort: None,
            search: None,
            page: None,
            size: None,
            json: false,
            links: false,
        }
    }

    #[test]
    fn test_build_state_from_location() {
        let state = build_state(&list_args("page=3&size=10&order_by=score"), 20).unwrap();
        assert_eq!(state.page, 3);
        assert_eq!(state.size, 10);
        assert_eq!(state.sort, SortSpec::asc("score").unwrap());
    }

    #[test]
    fn test_configured_page_size_applies_without_size_param() {
        let state = build_state(&list_args("page=3"), 50).unwrap();
        assert_eq!(state.size, 50);
        assert_eq!(state.page, 3);
    }

    #[test]
    fn test_flags_override_location_and_reset_page() {
        let mut args = list_args("page=4");
        args.rules = vec![r#"{"field":"score","operator":"gt","value":0}"#.to_string()];
        args.sort = Some("-join_date".to_string());
        let state = build_state(&args, 20).unwrap();
        assert_eq!(state.page, 1);
        assert_eq!(state.rules.len(), 1);
        assert_eq!(state.sort, SortSpec::desc("join_date").unwrap());
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        let mut args = list_args("");
        args.rules = vec![r#"{"field":"username","operator":"gt","value":"a"}"#.to_string()];
        assert!(build_state(&args, 20).is_err());

        let mut args = list_args("");
        args.sort = Some("profile_path".to_string());
        assert!(build_state(&args, 20).is_err());
    }

    #[test]
    fn test_assignment_values() {
        assert_eq!(assignment_value("score", "10").unwrap(), serde_json::json!(10));
        assert_eq!(assignment_value("is_ban", "no").unwrap(), Value::Bool(false));
        assert_eq!(assignment_value("password", "hunter2").unwrap(), "hunter2");
        assert_eq!(assignment_value("country", "").unwrap(), Value::Null);
        assert!(assignment_value("score", "lots").is_err());
    }

    #[test]
    fn test_render_params() {
        let rendered = render_params("page=2&order_by=counter", false);
        assert_eq!(rendered, "order_by=counter\npage=2\nsize=20\n");

        let rendered = render_params("page=2", true);
        assert_eq!(rendered, "page=1\nsize=1\n");
    }

    #[test]
    fn test_listing_from_link() {
        let location = "page=2&size=20&order_by=-score";
        let path = url_state::detail_path(42, location);
        assert_eq!(listing_from_link(&path).as_deref(), Some(location));
        let query = path.split_once('?').map(|(_, q)| q).unwrap();
        assert_eq!(listing_from_link(query).as_deref(), Some(location));
        assert_eq!(listing_from_link("/users/42"), None);
    }

    #[test]
    fn test_render_listing_links() {
        let response: UsersResponse = serde_json::from_value(serde_json::json!({
            "data": [{ "counter": 7, "user_id": 42, "username": "ali" }],
            "meta": { "total": 1, "page": 1, "size": 20, "pages": 1 },
            "error": {}
        }))
        .unwrap();
        let state = QueryState::new();
        let plain = render_listing(&response, &state, false);
        assert!(!plain.contains("/users/42"));
        let linked = render_listing(&response, &state, true);
        assert!(linked.contains("/users/42?from=page%3D1%26size%3D20%26order_by%3D-counter"));
        assert!(linked.contains("1-1 of 1 users"));
    }

    #[test]
    fn test_render_page_window() {
        let meta = PageMeta {
            total: 200,
            page: 5,
            size: 20,
            pages: 10,
        };
        assert_eq!(render_page_window(&meta), "1 ... 4 [5] 6 ... 10");
    }

    #[test]
    fn test_render_fields() {
        let all = render_fields(false);
        assert_eq!(all.lines().count(), 24);
        assert!(all.lines().next().unwrap().starts_with("counter"));
        assert_eq!(render_fields(true).lines().count(), 19);
    }
}
