//! Message Bus
//!
//! The typed dispatch point connecting actions to the job board, the hauling
//! allocator, and the liquid allocator. Dispatch is synchronous: the handler
//! runs before `dispatch` returns, so a request's reply may already be in
//! hand on the same tick and callers must check the returned [`BusReply`]
//! immediately. Requests that cannot be answered yet (a job request with an
//! empty board) are parked and answered later through a per-agent mailbox.
//!
//! Call sites that may resolve immediately: `RequestJob` (when any job is
//! open), `RequestHaulingAllocation` and `RequestLiquidTransfer` (always).
//! Only job requests ever defer.
//!
//! Every message is appended to a sent log for same-tick consumers and for
//! tests; entity-lifecycle messages are additionally queued for external
//! trackers.

use bevy_ecs::prelude::*;
use std::collections::HashMap;
use tracing::debug;

use colony_messages::{
    AgentId, AllocationId, HaulingAllocation, ItemTypeId, Job, JobId, JobState,
    LiquidAllocation, MaterialId, Message, MessageKind,
};

/// Synchronous reply to a dispatched message.
#[derive(Debug, Clone)]
pub enum BusReply {
    /// No reply; the message was a notification, a cancellation, or a
    /// request that was parked for later fulfilment.
    None,
    /// Candidate jobs for a job request, best first.
    JobOffers(Vec<Job>),
    /// The reserved job record, or `None` if another agent got it first.
    JobAccepted(Option<Job>),
    /// The created hauling reservation, or `None` if nothing matched.
    HaulingAllocated(Option<HaulingAllocation>),
    /// The created liquid reservation, or `None` if no source had enough.
    LiquidAllocated(Option<LiquidAllocation>),
}

/// An item sitting in a stockpile, available for hauling.
#[derive(Debug, Clone)]
pub struct StockpileItem {
    pub item_type: ItemTypeId,
    pub material: MaterialId,
    pub location: String,
}

/// The settlement job board. Single writer for every job record.
#[derive(Debug, Default)]
pub struct JobBoard {
    jobs: HashMap<JobId, Job>,
    /// Insertion order, for deterministic offer ordering among equal
    /// priorities.
    order: Vec<JobId>,
    /// Agents whose job request could not be answered yet.
    pending_requests: Vec<AgentId>,
    completed_by: HashMap<AgentId, u32>,
}

impl JobBoard {
    pub fn post(&mut self, job: Job) {
        self.order.push(job.id.clone());
        self.jobs.insert(job.id.clone(), job);
    }

    /// Open jobs, highest priority first; insertion order breaks ties.
    pub fn open_offers(&self) -> Vec<Job> {
        let mut offers: Vec<Job> = self
            .order
            .iter()
            .filter_map(|id| self.jobs.get(id))
            .filter(|j| j.is_open())
            .cloned()
            .collect();
        offers.sort_by_key(|j| std::cmp::Reverse(j.priority));
        offers
    }

    fn accept(&mut self, agent: &AgentId, job_id: &JobId) -> Option<Job> {
        let job = self.jobs.get_mut(job_id)?;
        if !job.is_open() {
            return None;
        }
        job.state = JobState::Assigned(agent.clone());
        Some(job.clone())
    }

    /// Returns an assigned job to the board. No-op unless this agent holds
    /// it.
    fn cancel_assignment(&mut self, agent: &AgentId, job_id: &JobId) {
        if let Some(job) = self.jobs.get_mut(job_id) {
            if job.assigned_to() == Some(agent) {
                job.state = JobState::Open;
            }
        }
    }

    fn complete(&mut self, agent: &AgentId, job_id: &JobId) {
        if let Some(job) = self.jobs.get_mut(job_id) {
            job.state = JobState::Completed;
        }
        *self.completed_by.entry(agent.clone()).or_default() += 1;
    }

    fn register_pending(&mut self, agent: &AgentId) {
        if !self.pending_requests.contains(agent) {
            self.pending_requests.push(agent.clone());
        }
    }

    /// Removes a pending request. Idempotent.
    fn cancel_pending(&mut self, agent: &AgentId) {
        self.pending_requests.retain(|a| a != agent);
    }

    pub fn has_pending_request(&self, agent: &AgentId) -> bool {
        self.pending_requests.contains(agent)
    }

    pub fn get(&self, job_id: &JobId) -> Option<&Job> {
        self.jobs.get(job_id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn completed_count(&self, agent: &AgentId) -> u32 {
        self.completed_by.get(agent).copied().unwrap_or(0)
    }

    pub fn assigned_count(&self, agent: &AgentId) -> usize {
        self.jobs
            .values()
            .filter(|j| j.assigned_to() == Some(agent))
            .count()
    }
}

/// Reservation ledger for stockpiled items.
#[derive(Debug, Default)]
pub struct HaulingLedger {
    available: Vec<StockpileItem>,
    allocations: HashMap<AllocationId, HaulingAllocation>,
}

impl HaulingLedger {
    pub fn stock(&mut self, item: StockpileItem) {
        self.available.push(item);
    }

    fn allocate(
        &mut self,
        agent: &AgentId,
        item_type: &ItemTypeId,
        material: &MaterialId,
    ) -> Option<HaulingAllocation> {
        let index = self
            .available
            .iter()
            .position(|i| &i.item_type == item_type && &i.material == material)?;
        let item = self.available.remove(index);

        let allocation =
            HaulingAllocation::new(item.item_type, item.material, item.location)
                .with_owner(agent.clone());
        self.allocations
            .insert(allocation.id.clone(), allocation.clone());
        Some(allocation)
    }

    /// Releases a reservation and returns the item to the stockpile.
    /// Idempotent: unknown or already-released ids are no-ops.
    fn cancel(&mut self, id: &AllocationId) {
        let Some(allocation) = self.allocations.get_mut(id) else {
            return;
        };
        if allocation.cancelled {
            return;
        }
        allocation.release();
        self.available.push(StockpileItem {
            item_type: allocation.item_type.clone(),
            material: allocation.material.clone(),
            location: allocation.origin_location.clone(),
        });
    }

    /// Removes a fulfilled reservation without restocking; the item left
    /// with the agent.
    fn consume(&mut self, id: &AllocationId) {
        self.allocations.remove(id);
    }

    /// The next unreserved stockpile item, if any.
    pub fn peek_available(&self) -> Option<&StockpileItem> {
        self.available.first()
    }

    pub fn get(&self, id: &AllocationId) -> Option<&HaulingAllocation> {
        self.allocations.get(id)
    }

    pub fn allocations(&self) -> impl Iterator<Item = &HaulingAllocation> {
        self.allocations.values()
    }

    pub fn live_held_by(&self, agent: &AgentId) -> usize {
        self.allocations
            .values()
            .filter(|a| a.is_live() && a.owner.as_ref() == Some(agent))
            .count()
    }
}

/// A liquid source (well, barrel) with a remaining quantity.
#[derive(Debug, Clone)]
pub struct LiquidSource {
    pub location: String,
    pub material: MaterialId,
    pub available_litres: f32,
}

/// Reservation ledger for liquid quantities.
#[derive(Debug, Default)]
pub struct LiquidLedger {
    sources: Vec<LiquidSource>,
    allocations: HashMap<AllocationId, LiquidAllocation>,
}

impl LiquidLedger {
    pub fn add_source(&mut self, source: LiquidSource) {
        self.sources.push(source);
    }

    #[allow(clippy::too_many_arguments)]
    fn allocate(
        &mut self,
        agent: &AgentId,
        material: &MaterialId,
        amount: f32,
        target_location: &str,
        container_item_type: &ItemTypeId,
        profession: Option<String>,
        priority: i32,
    ) -> Option<LiquidAllocation> {
        let source = self
            .sources
            .iter_mut()
            .find(|s| &s.material == material && s.available_litres >= amount)?;
        source.available_litres -= amount;

        let mut allocation = LiquidAllocation::new(
            material.clone(),
            amount,
            source.location.clone(),
            target_location,
            container_item_type.clone(),
        )
        .with_priority(priority)
        .with_owner(agent.clone());
        allocation.profession = profession;

        self.allocations
            .insert(allocation.id.clone(), allocation.clone());
        Some(allocation)
    }

    /// Releases a reservation and returns the quantity to its source.
    /// Idempotent.
    fn cancel(&mut self, id: &AllocationId) {
        let Some(allocation) = self.allocations.get_mut(id) else {
            return;
        };
        if allocation.cancelled {
            return;
        }
        allocation.release();
        if let Some(source) = self
            .sources
            .iter_mut()
            .find(|s| s.location == allocation.source_location)
        {
            source.available_litres += allocation.amount;
        }
    }

    /// Removes a fulfilled reservation; the liquid was drunk or delivered,
    /// so nothing returns to the source.
    fn consume(&mut self, id: &AllocationId) {
        self.allocations.remove(id);
    }

    pub fn get(&self, id: &AllocationId) -> Option<&LiquidAllocation> {
        self.allocations.get(id)
    }

    pub fn allocations(&self) -> impl Iterator<Item = &LiquidAllocation> {
        self.allocations.values()
    }

    pub fn live_held_by(&self, agent: &AgentId) -> usize {
        self.allocations
            .values()
            .filter(|a| a.is_live() && a.owner.as_ref() == Some(agent))
            .count()
    }
}

/// Resource: the simulation message bus and the collaborator state it
/// routes to.
#[derive(Resource, Debug, Default)]
pub struct MessageBus {
    pub job_board: JobBoard,
    pub hauling: HaulingLedger,
    pub liquid: LiquidLedger,
    /// Job offers delivered after the original request tick.
    mailbox: HashMap<AgentId, Vec<Job>>,
    /// Every dispatched message, in order.
    sent: Vec<Message>,
    /// Entity-lifecycle messages queued for external trackers.
    entity_notifications: Vec<Message>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches a message to its handler and returns the synchronous
    /// reply, if the message has one.
    pub fn dispatch(&mut self, message: Message) -> BusReply {
        self.sent.push(message.clone());

        match message {
            Message::RequestJob { agent } => {
                let offers = self.job_board.open_offers();
                if offers.is_empty() {
                    debug!(agent = %agent, "job request parked, board empty");
                    self.job_board.register_pending(&agent);
                    BusReply::None
                } else {
                    BusReply::JobOffers(offers)
                }
            }
            Message::AcceptJob { agent, job } => {
                BusReply::JobAccepted(self.job_board.accept(&agent, &job))
            }
            Message::CancelJobRequest { agent } => {
                self.job_board.cancel_pending(&agent);
                self.mailbox.remove(&agent);
                BusReply::None
            }
            Message::CancelJobAssignment { agent, job } => {
                self.job_board.cancel_assignment(&agent, &job);
                BusReply::None
            }
            Message::JobCompleted { agent, job } => {
                self.job_board.complete(&agent, &job);
                BusReply::None
            }
            Message::RequestHaulingAllocation {
                agent,
                item_type,
                material,
                ..
            } => BusReply::HaulingAllocated(
                self.hauling.allocate(&agent, &item_type, &material),
            ),
            Message::CancelHaulingAllocation { allocation } => {
                self.hauling.cancel(&allocation);
                BusReply::None
            }
            Message::RequestLiquidTransfer {
                agent,
                material,
                amount,
                target_location,
                container_item_type,
                profession,
                priority,
                ..
            } => BusReply::LiquidAllocated(self.liquid.allocate(
                &agent,
                &material,
                amount,
                &target_location,
                &container_item_type,
                profession,
                priority,
            )),
            Message::CancelLiquidAllocation { allocation } => {
                self.liquid.cancel(&allocation);
                BusReply::None
            }
            Message::EntityCreated { .. }
            | Message::EntityDestroyed { .. }
            | Message::AssetUpdateRequired { .. } => {
                self.entity_notifications.push(message);
                BusReply::None
            }
        }
    }

    /// Marks a hauling reservation fulfilled: the item was picked up and
    /// ownership moved to the agent's inventory.
    pub fn consume_hauling_allocation(&mut self, id: &AllocationId) {
        self.hauling.consume(id);
    }

    /// Marks a liquid reservation fulfilled after the agent consumed or
    /// delivered the quantity.
    pub fn consume_liquid_allocation(&mut self, id: &AllocationId) {
        self.liquid.consume(id);
    }

    /// Answers parked job requests now that the board may have work.
    /// Offers land in the per-agent mailbox for the next action update.
    pub fn fulfill_pending_job_requests(&mut self) {
        let offers = self.job_board.open_offers();
        if offers.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.job_board.pending_requests);
        for agent in pending {
            debug!(agent = %agent, count = offers.len(), "delivering deferred job offers");
            self.mailbox.insert(agent, offers.clone());
        }
    }

    /// Polls the mailbox for offers delivered after the request tick.
    pub fn take_job_offers(&mut self, agent: &AgentId) -> Option<Vec<Job>> {
        self.mailbox.remove(agent)
    }

    /// True while delivered job offers sit unread in the agent's mailbox.
    pub fn has_job_offers(&self, agent: &AgentId) -> bool {
        self.mailbox.contains_key(agent)
    }

    /// All messages dispatched so far, in order.
    pub fn sent(&self) -> &[Message] {
        &self.sent
    }

    pub fn sent_count(&self, kind: MessageKind) -> usize {
        self.sent.iter().filter(|m| m.kind() == kind).count()
    }

    pub fn drain_sent(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.sent)
    }

    pub fn drain_entity_notifications(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.entity_notifications)
    }

    /// Live reservations (jobs, hauling, liquid) held by one agent. Zero
    /// after a clean goal teardown.
    pub fn allocations_held_by(&self, agent: &AgentId) -> usize {
        self.job_board.assigned_count(agent)
            + self.hauling.live_held_by(agent)
            + self.liquid.live_held_by(agent)
    }
}
