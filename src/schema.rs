//! GraphQL schema and resolvers for the blog gateway.
//!
//! Every resolver reads the [`RequestContext`] from the request data, so all storage access runs
//! inside that request's transaction.
//!
//! List fields are nullable, so a failed relation load resolves to `null` next to its error
//! instead of nulling out the parent object.

use async_graphql::{ComplexObject, Context, EmptySubscription, Object, Result, Schema};

use crate::columns::select_user_columns;
use crate::model::{Client, ClientInput, Comment, Post, User};
use crate::queries;
use crate::scope::RequestContext;

pub type BlogSchema = Schema<Query, Mutation, EmptySubscription>;

pub fn build_schema() -> BlogSchema {
    Schema::build(Query, Mutation, EmptySubscription).finish()
}

#[derive(Default)]
pub struct Query;

#[Object]
impl Query {
    async fn users(&self, ctx: &Context<'_>, first: Option<i32>) -> Result<Option<Vec<User>>> {
        let request = ctx.data::<RequestContext>()?;
        let columns = select_user_columns(ctx.field().selection_set().map(|field| field.name()));
        Ok(Some(queries::list_users(request.tx(), &columns, first).await?))
    }
}

#[derive(Default)]
pub struct Mutation;

#[Object]
impl Mutation {
    async fn create_client(&self, ctx: &Context<'_>, client: ClientInput) -> Result<Client> {
        let request = ctx.data::<RequestContext>()?;
        Ok(queries::insert_client(request.tx(), client).await?)
    }
}

#[ComplexObject]
impl User {
    async fn posts(&self, ctx: &Context<'_>) -> Result<Option<Vec<Post>>> {
        Ok(Some(ctx.data::<RequestContext>()?.load_child_posts(self.id).await?))
    }
}

#[ComplexObject]
impl Post {
    async fn comments(&self, ctx: &Context<'_>) -> Result<Option<Vec<Comment>>> {
        Ok(Some(ctx.data::<RequestContext>()?.load_child_comments(self.post_id).await?))
    }
}
