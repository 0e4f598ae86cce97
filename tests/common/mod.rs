#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blog_gateway::{
    ClientInput, Column, Comment, Post, Storage, StorageError, Transaction, TxHandle, User,
};

/// Everything the fake storage was asked to do, across all of its transactions.
#[derive(Debug, Default)]
pub struct Calls {
    pub begins: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub post_queries: Mutex<Vec<Vec<i32>>>,
    pub comment_queries: Mutex<Vec<Vec<i32>>>,
    pub user_queries: Mutex<Vec<(Vec<&'static str>, i64)>>,
    pub inserted: Mutex<Vec<ClientInput>>,
}

impl Calls {
    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    pub fn post_queries(&self) -> Vec<Vec<i32>> {
        self.post_queries.lock().unwrap().clone()
    }

    pub fn comment_queries(&self) -> Vec<Vec<i32>> {
        self.comment_queries.lock().unwrap().clone()
    }

    pub fn user_queries(&self) -> Vec<(Vec<&'static str>, i64)> {
        self.user_queries.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Fixture {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Failures {
    pub posts: bool,
    pub insert: bool,
    pub commit: bool,
    pub rollback: bool,
    /// Post queries never complete.
    pub stall_posts: bool,
}

pub struct FakeStorage {
    fixture: Arc<Fixture>,
    failures: Failures,
    next_id: Arc<AtomicI32>,
    pub calls: Arc<Calls>,
}

impl FakeStorage {
    pub fn new(fixture: Fixture) -> Self {
        Self::failing(fixture, Failures::default())
    }

    pub fn failing(fixture: Fixture, failures: Failures) -> Self {
        Self {
            fixture: Arc::new(fixture),
            failures,
            next_id: Arc::new(AtomicI32::new(1)),
            calls: Arc::new(Calls::default()),
        }
    }
}

#[async_trait]
impl Storage for FakeStorage {
    async fn begin(&self) -> Result<TxHandle, StorageError> {
        self.calls.begins.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeTransaction {
            fixture: self.fixture.clone(),
            failures: self.failures,
            next_id: self.next_id.clone(),
            calls: self.calls.clone(),
        }))
    }
}

pub struct FakeTransaction {
    fixture: Arc<Fixture>,
    failures: Failures,
    next_id: Arc<AtomicI32>,
    calls: Arc<Calls>,
}

#[async_trait]
impl Transaction for FakeTransaction {
    async fn posts_by_user_ids(&self, user_ids: &[i32]) -> Result<Vec<Post>, StorageError> {
        self.calls.post_queries.lock().unwrap().push(user_ids.to_vec());
        if self.failures.stall_posts {
            futures::future::pending::<()>().await;
        }
        if self.failures.posts {
            return Err(StorageError::Backend("relation \"posts\" does not exist".to_owned()));
        }
        let wanted = user_ids.iter().copied().collect::<HashSet<_>>();
        Ok(self
            .fixture
            .posts
            .iter()
            .filter(|post| post.user_id.map_or(false, |id| wanted.contains(&id)))
            .cloned()
            .collect())
    }

    async fn comments_by_post_ids(&self, post_ids: &[i32]) -> Result<Vec<Comment>, StorageError> {
        self.calls.comment_queries.lock().unwrap().push(post_ids.to_vec());
        let wanted = post_ids.iter().copied().collect::<HashSet<_>>();
        Ok(self
            .fixture
            .comments
            .iter()
            .filter(|comment| comment.post_id.map_or(false, |id| wanted.contains(&id)))
            .cloned()
            .collect())
    }

    async fn list_users(
        &self,
        columns: &[&'static Column],
        limit: i64,
    ) -> Result<Vec<User>, StorageError> {
        let fields = columns.iter().map(|column| column.field).collect::<Vec<_>>();
        self.calls.user_queries.lock().unwrap().push((fields, limit));
        Ok(self.fixture.users.iter().take(limit as usize).cloned().collect())
    }

    async fn insert_client(&self, client: &ClientInput) -> Result<i32, StorageError> {
        if self.failures.insert {
            return Err(StorageError::Backend(
                "duplicate key value violates unique constraint \"clients_email_unique\""
                    .to_owned(),
            ));
        }
        self.calls.inserted.lock().unwrap().push(client.clone());
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn commit(&self) -> Result<(), StorageError> {
        if self.failures.commit {
            return Err(StorageError::Backend("connection reset by peer".to_owned()));
        }
        self.calls.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StorageError> {
        if self.failures.rollback {
            return Err(StorageError::Backend("connection reset by peer".to_owned()));
        }
        self.calls.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn user(id: i32, name: &str) -> User {
    User { id, name: Some(name.to_owned()), ..Default::default() }
}

pub fn post(post_id: i32, user_id: i32, title: &str) -> Post {
    Post { post_id, user_id: Some(user_id), title: Some(title.to_owned()), ..Default::default() }
}

pub fn comment(comment_id: i32, post_id: i32, description: &str) -> Comment {
    Comment {
        comment_id,
        post_id: Some(post_id),
        description: Some(description.to_owned()),
        ..Default::default()
    }
}

/// Three users: Ada has two posts, Grace has one, Linus has none. Post 10 has two comments, post
/// 20 has one.
pub fn blog_fixture() -> Fixture {
    Fixture {
        users: vec![user(1, "Ada"), user(2, "Grace"), user(3, "Linus")],
        posts: vec![
            post(10, 1, "Notes on the Analytical Engine"),
            post(20, 2, "Compilers"),
            post(11, 1, "Bernoulli numbers"),
        ],
        comments: vec![
            comment(100, 10, "first!"),
            comment(200, 20, "nanoseconds"),
            comment(101, 10, "great read"),
        ],
    }
}
