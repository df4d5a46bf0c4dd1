//! Request bodies and response shaping.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use stockroom_auth::{AuthResponse, IssuedToken, UserProfile};
use stockroom_core::UserId;
use stockroom_directory::WorkspaceListing;
use stockroom_inventory::{Category, CategoryPermission, Item, UsageRecord};

// ── auth ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub name: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailChangeBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailConfirmBody {
    pub code: String,
}

// ── workspaces ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateWorkspaceBody {
    pub name: String,
    #[serde(default)]
    pub plan: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkspaceBody {
    pub name: Option<String>,
    pub archived: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberBody {
    pub user_id: UserId,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleBody {
    pub role: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    #[serde(default)]
    pub force: bool,
}

// ── categories ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCategoryBody {
    pub name: String,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryBody {
    pub name: Option<String>,
    pub public: Option<bool>,
    pub manager: Option<UserId>,
    /// Explicit flag, since an absent `manager` field means "leave alone".
    #[serde(default)]
    pub clear_manager: bool,
}

#[derive(Debug, Deserialize)]
pub struct PutGrantBody {
    pub level: String,
}

// ── items ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateItemBody {
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
    pub price: Option<i64>,
    pub purchased_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemBody {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub price: Option<i64>,
    pub purchased_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct QuantityBody {
    pub quantity: u32,
}

// ── response shaping ────────────────────────────────────────────────────

pub fn auth_to_json(response: &AuthResponse) -> serde_json::Value {
    json!({
        "access_token": response.tokens.access.token,
        "access_expires_at": response.tokens.access.expires_at,
        "refresh_token": response.tokens.refresh.token,
        "refresh_expires_at": response.tokens.refresh.expires_at,
        "user": user_to_json(&response.user),
    })
}

pub fn access_token_to_json(issued: &IssuedToken) -> serde_json::Value {
    json!({
        "access_token": issued.token,
        "access_expires_at": issued.expires_at,
    })
}

pub fn user_to_json(user: &UserProfile) -> serde_json::Value {
    json!({
        "id": user.id,
        "username": user.username,
        "name": user.name,
        "email": user.email,
        "is_admin": user.is_admin,
    })
}

pub fn listing_to_json(listing: &WorkspaceListing) -> serde_json::Value {
    json!({
        "id": listing.workspace.id,
        "name": listing.workspace.name,
        "plan": listing.workspace.plan,
        "archived": listing.workspace.archived,
        "role": listing.role,
    })
}

pub fn category_to_json(category: &Category) -> serde_json::Value {
    json!({
        "id": category.id,
        "workspace_id": category.workspace_id,
        "name": category.name,
        "owner": category.owner,
        "manager": category.manager,
        "public": category.public,
        "has_share_token": category.share_token.is_some(),
        "created_at": category.created_at,
    })
}

pub fn grant_to_json(grant: &CategoryPermission) -> serde_json::Value {
    json!({
        "category_id": grant.category_id,
        "user_id": grant.user_id,
        "level": grant.level,
        "granted_by": grant.granted_by,
        "granted_at": grant.granted_at,
    })
}

pub fn item_to_json(item: &Item) -> serde_json::Value {
    json!({
        "id": item.id,
        "category_id": item.category_id,
        "name": item.name,
        "quantity": item.quantity,
        "price": item.price,
        "purchased_on": item.purchased_on,
        "expires_on": item.expires_on,
        "created_at": item.created_at,
    })
}

pub fn record_to_json(record: &UsageRecord) -> serde_json::Value {
    json!({
        "id": record.id,
        "item_id": record.item_id,
        "kind": record.kind,
        "delta": record.delta,
        "actor": record.actor,
        "occurred_at": record.occurred_at,
    })
}
