//! Row types for the blog dataset.
//!
//! These double as GraphQL output types. Field names are kept snake_case on the wire. Timestamps
//! are carried as text.

use async_graphql::{InputObject, SimpleObject};
use sqlx::FromRow;

/// A user row. Only the columns picked by the `users` resolver are fetched; the rest stay `None`.
#[derive(Debug, Clone, Default, PartialEq, SimpleObject, FromRow)]
#[graphql(complex, rename_fields = "snake_case")]
#[sqlx(default)]
pub struct User {
    pub id: i32,
    pub name: Option<String>,
    pub email: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<String>,
    pub address: Option<String>,
    pub email_verified_at: Option<String>,
    pub password: Option<String>,
    pub remember_token: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, SimpleObject, FromRow)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct Post {
    pub post_id: i32,
    pub user_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, SimpleObject, FromRow)]
#[graphql(rename_fields = "snake_case")]
pub struct Comment {
    pub comment_id: i32,
    pub description: Option<String>,
    pub post_id: Option<i32>,
    pub user_id: Option<i32>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Client {
    pub id: i32,
    pub name: Option<String>,
    pub email: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct ClientInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

impl Client {
    /// A freshly inserted client: the generated key plus the submitted fields, unchanged.
    pub fn from_input(id: i32, input: ClientInput) -> Self {
        Self {
            id,
            name: input.name,
            email: input.email,
            last_name: input.last_name,
            birthday: input.birthday,
            address: input.address,
            created_at: input.created_at,
            updated_at: None,
        }
    }
}
