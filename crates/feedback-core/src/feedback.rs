use std::sync::Arc;

use tracing::{info, warn};

use feedback_db::Database;
use feedback_types::api::{CreateFeedbackRequest, UpdateFeedbackRequest};
use feedback_types::models::{Feedback, User};

use crate::error::{Error, Result};
use crate::gate::require_self;
use crate::validate::Validate;

/// A user together with everything they have posted.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub feedback: Vec<Feedback>,
}

/// Feedback CRUD scoped by owner. Every operation takes the caller's
/// identity and checks ownership before reading or writing anything else.
pub struct FeedbackService {
    db: Arc<Database>,
}

impl FeedbackService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn profile(&self, identity: Option<&str>, username: &str) -> Result<Profile> {
        require_self(identity, username)?;

        let user = self.db.get_user(username)?.ok_or(Error::Unauthorized)?.into_user();
        let feedback = self
            .db
            .list_feedback(username)?
            .into_iter()
            .map(|row| row.into_feedback())
            .collect();

        Ok(Profile { user, feedback })
    }

    pub fn create(
        &self,
        identity: Option<&str>,
        username: &str,
        req: &CreateFeedbackRequest,
    ) -> Result<Feedback> {
        require_self(identity, username)?;
        req.validate()?;

        let row = self.db.insert_feedback(username, &req.title, &req.content)?;
        info!("Feedback {} created by {}", row.id, username);
        Ok(row.into_feedback())
    }

    pub fn get(&self, identity: Option<&str>, id: i64) -> Result<Feedback> {
        self.owned(identity, id)
    }

    pub fn update(
        &self,
        identity: Option<&str>,
        id: i64,
        req: &UpdateFeedbackRequest,
    ) -> Result<Feedback> {
        self.owned(identity, id)?;
        req.validate()?;

        let row = self
            .db
            .update_feedback(id, req.title.as_deref(), req.content.as_deref())?
            .ok_or(Error::Unauthorized)?;
        info!("Feedback {} updated by {}", id, row.username);
        Ok(row.into_feedback())
    }

    pub fn delete(&self, identity: Option<&str>, id: i64) -> Result<()> {
        let feedback = self.owned(identity, id)?;

        if !self.db.delete_feedback(id)? {
            return Err(Error::Unauthorized);
        }
        info!("Feedback {} deleted by {}", id, feedback.username);
        Ok(())
    }

    /// Load a feedback item and check the caller owns it. A missing id is
    /// reported the same way as somebody else's item.
    fn owned(&self, identity: Option<&str>, id: i64) -> Result<Feedback> {
        let Some(row) = self.db.get_feedback(id)? else {
            warn!("Feedback {} not found for {:?}", id, identity);
            return Err(Error::Unauthorized);
        };

        require_self(identity, &row.username).inspect_err(|_| {
            warn!("{:?} denied access to feedback {} owned by {}", identity, id, row.username);
        })?;

        Ok(row.into_feedback())
    }
}
