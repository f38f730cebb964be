//! Lockstep evaluation of one generation
//!
//! A [`Cohort`] owns one record per member: agent, world, policy handle,
//! fitness accumulator and fitness sink live together in a single
//! [`CohortMember`], so removing index `i` can never leave the policy of one
//! member paired with the agent of another.
//!
//! Each tick runs, for the whole cohort at once:
//! 1. status checks for every member, including members that filled the grid
//! 2. one batch removal of every terminated member, highest index first
//! 3. generation end if nobody is left
//! 4. sense, decide, move and score for every survivor
//! 5. best-so-far selection for presentation

use std::sync::atomic::{AtomicBool, Ordering};

use ahash::AHashSet;

use crate::agent::{Action, Agent, AgentStatus};
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::policy::{FitnessSink, Policy};
use crate::presentation::{CohortFrame, MemberView};
use crate::rng_trait::GridRng;
use crate::sensors::{FEATURE_COUNT, SensorFrame};
use crate::world::{Cell, World};

/// One cohort slot
#[derive(Debug)]
pub struct CohortMember<P, S> {
    slot: usize,
    agent: Agent,
    world: World,
    policy: P,
    fitness: f32,
    sink: S,
    /// Set once the body covers the whole grid
    filled: bool,
}

impl<P, S> CohortMember<P, S> {
    /// Position of this member in the sequence the generation was built from
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Current fitness; final once the member is removed
    pub fn fitness(&self) -> f32 {
        self.fitness
    }
}

/// Record of a member leaving the cohort
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Removal {
    pub slot: usize,
    /// `Alive` when the generation was cancelled with the member still running
    pub status: AgentStatus,
    pub fitness: f32,
    pub score: u32,
    pub length: usize,
    pub ticks_alive: u32,
    /// Tick whose removal batch took the member out
    pub tick: u64,
}

/// Summary of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub removed: Vec<Removal>,
    /// Members still active after the tick
    pub active: usize,
    /// Resources consumed during the tick
    pub consumed: usize,
    /// Index of the best member after the tick
    pub best: Option<usize>,
}

impl TickReport {
    /// True once no member is left
    pub fn generation_over(&self) -> bool {
        self.active == 0
    }
}

/// Result of running a generation to completion or cancellation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub ticks: u64,
    /// Every removal, in the order it happened
    pub removals: Vec<Removal>,
    pub aborted: bool,
}

impl GenerationOutcome {
    pub fn best_score(&self) -> u32 {
        self.removals.iter().map(|r| r.score).max().unwrap_or(0)
    }

    /// Count of removals per terminal status
    pub fn deaths(&self, status: AgentStatus) -> usize {
        self.removals.iter().filter(|r| r.status == status).count()
    }
}

/// All members of one generation, stepped in lockstep
pub struct Cohort<P, S, R> {
    config: SimConfig,
    max_idle: u32,
    members: Vec<CohortMember<P, S>>,
    rng: R,
    tick: u64,
    removals: Vec<Removal>,
}

impl<P, S, R> Cohort<P, S, R>
where
    P: Policy,
    S: FitnessSink,
    R: GridRng,
{
    /// Spawn one agent and one world per `(policy, sink)` pair.
    ///
    /// Configuration and policy arities are checked here, before any tick.
    pub fn new(
        config: SimConfig,
        entries: impl IntoIterator<Item = (P, S)>,
        mut rng: R,
    ) -> SimResult<Self> {
        config.validate()?;

        let mut members = Vec::new();
        for (slot, (policy, sink)) in entries.into_iter().enumerate() {
            if policy.input_arity() != FEATURE_COUNT {
                return Err(SimError::InputArityMismatch {
                    slot,
                    expected: FEATURE_COUNT,
                    actual: policy.input_arity(),
                });
            }
            if policy.output_arity() != Action::COUNT {
                return Err(SimError::OutputArityMismatch {
                    slot,
                    expected: Action::COUNT,
                    actual: policy.output_arity(),
                });
            }

            let agent = config.spawn_agent(&mut rng)?;
            let occupied: AHashSet<Cell> = agent.body().iter().copied().collect();
            let world = World::spawn(config.width, config.height, &occupied, &mut rng)?;

            members.push(CohortMember {
                slot,
                agent,
                world,
                policy,
                fitness: 0.0,
                sink,
                filled: false,
            });
        }

        log::debug!(
            "Spawned cohort of {} on a {}x{} grid (max idle {})",
            members.len(),
            config.width,
            config.height,
            config.max_idle()
        );

        Ok(Self {
            max_idle: config.max_idle(),
            config,
            members,
            rng,
            tick: 0,
            removals: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Ticks run so far, including the final one that found the cohort empty
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[CohortMember<P, S>] {
        &self.members
    }

    pub fn member(&self, index: usize) -> Option<&CohortMember<P, S>> {
        self.members.get(index)
    }

    /// Removals so far, in order
    pub fn removals(&self) -> &[Removal] {
        &self.removals
    }

    /// Mutable access to a member's agent and world, for scripted setups
    pub fn member_state_mut(&mut self, index: usize) -> Option<(&mut Agent, &mut World)> {
        self.members
            .get_mut(index)
            .map(|m| (&mut m.agent, &mut m.world))
    }

    /// Highest score, ties broken by the lowest index. Read-only.
    pub fn best_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, member) in self.members.iter().enumerate() {
            match best {
                Some(b) if member.agent.score() <= self.members[b].agent.score() => {}
                _ => best = Some(i),
            }
        }
        best
    }

    /// Advance the whole cohort by one tick
    pub fn tick(&mut self) -> SimResult<TickReport> {
        let terminated: Vec<(usize, AgentStatus)> = self
            .members
            .iter()
            .enumerate()
            .filter_map(|(i, m)| {
                let status = if m.filled {
                    AgentStatus::FilledGrid
                } else {
                    m.agent.status(&m.world, self.max_idle)
                };
                (!status.is_alive()).then_some((i, status))
            })
            .collect();

        self.tick += 1;
        let removed = self.remove_batch(&terminated)?;
        self.verify_order()?;

        let mut consumed = 0;
        for member in self.members.iter_mut() {
            let features = SensorFrame::encode(&member.agent, &member.world).to_vec();
            let scores = member.policy.evaluate(&features);
            let action = Action::decode(&scores, member.slot)?;

            let result = member.agent.step(action, &member.world);
            if result.consumed {
                consumed += 1;
                match member
                    .world
                    .relocate_resource(member.agent.body(), &mut self.rng, member.slot)
                {
                    Ok(_) => {}
                    Err(SimError::GridFull { .. }) => {
                        log::debug!("Slot {} filled the grid", member.slot);
                        member.filled = true;
                    }
                    Err(e) => return Err(e),
                }
            }

            member.fitness = self.config.fitness.fitness(&member.agent);
        }

        Ok(TickReport {
            tick: self.tick,
            removed,
            active: self.members.len(),
            consumed,
            best: self.best_index(),
        })
    }

    /// Tick until every member is gone or `abort` is raised
    pub fn run(&mut self, abort: &AtomicBool) -> SimResult<GenerationOutcome> {
        self.run_observed(abort, |_, _| {})
    }

    /// Like [`Cohort::run`], handing each tick's report and a read-only frame
    /// to `observer`
    pub fn run_observed(
        &mut self,
        abort: &AtomicBool,
        mut observer: impl FnMut(&TickReport, &CohortFrame<'_>),
    ) -> SimResult<GenerationOutcome> {
        loop {
            if abort.load(Ordering::Relaxed) {
                log::debug!(
                    "Generation cancelled at tick {} with {} members left",
                    self.tick,
                    self.members.len()
                );
                self.flush_remaining();
                return Ok(self.outcome(true));
            }

            let report = self.tick()?;
            observer(&report, &self.frame(report.best));

            if report.generation_over() {
                return Ok(self.outcome(false));
            }
        }
    }

    /// Remove every member, recording its current fitness. Used on cancel.
    pub fn flush_remaining(&mut self) {
        while let Some(index) = self.members.len().checked_sub(1) {
            self.remove_member(index, AgentStatus::Alive);
        }
    }

    /// Read-only snapshot of every active member
    pub fn frame(&self, best: Option<usize>) -> CohortFrame<'_> {
        CohortFrame {
            tick: self.tick,
            width: self.config.width,
            height: self.config.height,
            members: self
                .members
                .iter()
                .enumerate()
                .map(|(index, m)| MemberView {
                    index,
                    slot: m.slot,
                    body: m.agent.body(),
                    heading: m.agent.heading(),
                    resource: m.world.resource(),
                    score: m.agent.score(),
                })
                .collect(),
            best,
        }
    }

    fn outcome(&self, aborted: bool) -> GenerationOutcome {
        GenerationOutcome {
            ticks: self.tick,
            removals: self.removals.clone(),
            aborted,
        }
    }

    /// Remove all listed members as one batch.
    ///
    /// Indices are processed from highest to lowest so earlier removals never
    /// shift the ones still pending.
    fn remove_batch(&mut self, batch: &[(usize, AgentStatus)]) -> SimResult<Vec<Removal>> {
        let mut ordered = batch.to_vec();
        ordered.sort_by(|a, b| b.0.cmp(&a.0));

        for pair in ordered.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(SimError::invariant(
                    "removal-index",
                    pair[0].0,
                    "index listed twice in one removal batch",
                ));
            }
        }
        if let Some((index, _)) = ordered.first()
            && *index >= self.members.len()
        {
            return Err(SimError::invariant(
                "removal-index",
                *index,
                format!("cohort only has {} members", self.members.len()),
            ));
        }

        let mut removed: Vec<Removal> = ordered
            .into_iter()
            .map(|(index, status)| self.remove_member(index, status))
            .collect();
        // Report in cohort order
        removed.reverse();
        Ok(removed)
    }

    /// Remove one member and hand its final fitness to its sink
    fn remove_member(&mut self, index: usize, status: AgentStatus) -> Removal {
        let mut member = self.members.remove(index);
        member.sink.record(member.fitness);

        let removal = Removal {
            slot: member.slot,
            status,
            fitness: member.fitness,
            score: member.agent.score(),
            length: member.agent.len(),
            ticks_alive: member.agent.ticks_alive(),
            tick: self.tick,
        };
        log::debug!(
            "Removed slot {} ({}) at tick {} with fitness {:.2}",
            removal.slot,
            status.name(),
            removal.tick,
            removal.fitness
        );
        self.removals.push(removal);
        removal
    }

    /// Survivors keep their relative order, so slots stay strictly increasing
    fn verify_order(&self) -> SimResult<()> {
        for (i, pair) in self.members.windows(2).enumerate() {
            if pair[0].slot >= pair[1].slot {
                return Err(SimError::invariant(
                    "cohort-order",
                    pair[1].slot,
                    format!("member at index {} is out of order", i + 1),
                ));
            }
        }
        Ok(())
    }
}
