//! Change interceptor: publishes a change event after every committed write.
//!
//! Wraps a `UserRepository` the way a decorator wraps a store: reads pass
//! straight through, writes are committed by the inner repository first and
//! then announced to the fan-out exchange.

use std::sync::Arc;

use async_trait::async_trait;

use cachesync_core::event::ChangeAction;
use cachesync_core::storage::{Result, UserRepository};
use cachesync_core::transport::Transport;
use cachesync_core::user::{NewUser, User};

use crate::publisher::EventPublisher;

/// Repository decorator publishing a change event for every committed
/// mutation.
///
/// Publishing happens after the commit and its failure never reaches the
/// caller: the store stays authoritative and the replicas simply miss the
/// event. A crash between commit and publish loses the event the same way.
///
/// # Type Parameters
///
/// * `R` - The underlying repository implementation
/// * `T` - The transport the publisher writes to
pub struct ChangeInterceptor<R, T>
where
    R: UserRepository,
    T: Transport,
{
    repository: Arc<R>,
    publisher: Arc<EventPublisher<T>>,
}

impl<R, T> ChangeInterceptor<R, T>
where
    R: UserRepository,
    T: Transport,
{
    pub fn new(repository: Arc<R>, publisher: Arc<EventPublisher<T>>) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    async fn announce(&self, action: ChangeAction, user: &User) {
        match self.publisher.publish_change(action, user).await {
            Ok(()) => {
                tracing::debug!(user_id = user.id, action = %action, "Change event published");
            }
            Err(err) => {
                tracing::error!(
                    user_id = user.id,
                    action = %action,
                    error = %err,
                    "Failed to publish change event, replicas will miss this mutation"
                );
            }
        }
    }
}

#[async_trait]
impl<R, T> UserRepository for ChangeInterceptor<R, T>
where
    R: UserRepository + 'static,
    T: Transport + 'static,
{
    async fn get_user(&self, id: u64) -> Result<Option<User>> {
        self.repository.get_user(id).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let created = self.repository.create_user(user).await?;
        self.announce(ChangeAction::Create, &created).await;
        Ok(created)
    }

    async fn update_user(&self, user: &User) -> Result<User> {
        let updated = self.repository.update_user(user).await?;
        self.announce(ChangeAction::Update, &updated).await;
        Ok(updated)
    }

    async fn delete_user(&self, id: u64) -> Result<User> {
        let deleted = self.repository.delete_user(id).await?;
        self.announce(ChangeAction::Delete, &deleted).await;
        Ok(deleted)
    }
}
