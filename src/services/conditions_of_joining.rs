use std::sync::Arc;

use crate::{
    core::{clock::Clock, publishing::PublishGateway},
    domain::{ConditionsOfJoining, ConditionsOfJoiningSignedEvent},
    error::{AppError, Result},
};

/// Publishes "conditions of joining signed" events for programme memberships.
pub struct ConditionsOfJoiningPublisher {
    gateway: Arc<PublishGateway<ConditionsOfJoiningSignedEvent>>,
    clock: Arc<dyn Clock>,
}

impl ConditionsOfJoiningPublisher {
    pub fn new(
        gateway: Arc<PublishGateway<ConditionsOfJoiningSignedEvent>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { gateway, clock }
    }

    pub async fn conditions_of_joining_signed(
        &self,
        membership_id: &str,
        person_id: &str,
        programme_name: &str,
        version: &str,
    ) -> Result<ConditionsOfJoiningSignedEvent> {
        if membership_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "programme membership id is required".to_string(),
            ));
        }

        let event = ConditionsOfJoiningSignedEvent {
            membership_id: membership_id.to_string(),
            person_id: person_id.to_string(),
            programme_name: programme_name.to_string(),
            conditions_of_joining: ConditionsOfJoining {
                signed_at: self.clock.now(),
                version: version.to_string(),
            },
        };

        tracing::info!(
            membership_id = %event.membership_id,
            person_id = %event.person_id,
            "Publishing conditions of joining signed event"
        );
        self.gateway.publish(event.clone()).await?;
        Ok(event)
    }
}
