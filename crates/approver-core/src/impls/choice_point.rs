//! ChoicePoint - reference `PendingDecision` for workflow engines.
//!
//! The engine registers a `ChoicePoint` when a unit reaches a branch that
//! needs a human. The first valid choice is forwarded to the engine as a
//! [`ChoiceMade`] over a channel; the engine applies it and removes the
//! entry from the registry.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::{Element, PendingDecision};

/// One selectable chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOption {
    pub id: String,
    pub description: String,
}

impl ChainOption {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// Sent to the engine when a human picks a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceMade {
    pub job_uuid: String,
    pub chain: String,
    pub agent: String,
}

pub struct ChoicePoint {
    job_uuid: String,
    unit_type: String,
    unit_uuid: String,
    created_at: DateTime<Utc>,
    chains: Vec<ChainOption>,
    resolved: AtomicBool,
    engine: mpsc::UnboundedSender<ChoiceMade>,
}

impl ChoicePoint {
    pub fn new(
        job_uuid: impl Into<String>,
        unit_type: impl Into<String>,
        unit_uuid: impl Into<String>,
        chains: Vec<ChainOption>,
        engine: mpsc::UnboundedSender<ChoiceMade>,
    ) -> Self {
        Self {
            job_uuid: job_uuid.into(),
            unit_type: unit_type.into(),
            unit_uuid: unit_uuid.into(),
            created_at: Utc::now(),
            chains,
            resolved: AtomicBool::new(false),
            engine,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }
}

impl PendingDecision for ChoicePoint {
    fn job_uuid(&self) -> &str {
        &self.job_uuid
    }

    fn chains(&self) -> Vec<String> {
        self.chains.iter().map(|c| c.id.clone()).collect()
    }

    /// ```text
    /// <choicesAvailableForUnit>
    ///   <UUID>..</UUID>
    ///   <unit><type>..</type><unitUUID>..</unitUUID></unit>
    ///   <createdAt>..</createdAt>
    ///   <choices>
    ///     <choice><chainAvailable>..</chainAvailable><description>..</description></choice>
    ///   </choices>
    /// </choicesAvailableForUnit>
    /// ```
    fn to_element(&self) -> Element {
        let choices = self.chains.iter().fold(Element::new("choices"), |choices, chain| {
            choices.with_child(
                Element::new("choice")
                    .with_child(Element::text_node("chainAvailable", chain.id.as_str()))
                    .with_child(Element::text_node("description", chain.description.as_str())),
            )
        });

        Element::new("choicesAvailableForUnit")
            .with_child(Element::text_node("UUID", self.job_uuid.as_str()))
            .with_child(
                Element::new("unit")
                    .with_child(Element::text_node("type", self.unit_type.as_str()))
                    .with_child(Element::text_node("unitUUID", self.unit_uuid.as_str())),
            )
            .with_child(Element::text_node(
                "createdAt",
                self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ))
            .with_child(choices)
    }

    fn proceed_with_choice(&self, chain: &str, agent: &str) {
        if !self.chains.iter().any(|c| c.id == chain) {
            warn!(job_uuid = %self.job_uuid, chain, "chain is not offered by this decision, ignoring");
            return;
        }
        if self.resolved.swap(true, Ordering::AcqRel) {
            debug!(job_uuid = %self.job_uuid, chain, "decision already resolved, ignoring repeat");
            return;
        }
        let choice = ChoiceMade {
            job_uuid: self.job_uuid.clone(),
            chain: chain.to_string(),
            agent: agent.to_string(),
        };
        if self.engine.send(choice).is_err() {
            warn!(job_uuid = %self.job_uuid, "workflow engine stopped listening for choices");
        }
    }
}
