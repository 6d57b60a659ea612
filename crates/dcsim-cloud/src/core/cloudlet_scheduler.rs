//! Execution of cloudlets inside a VM.

use std::mem;

use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::processor::Processor;

// Cloudlet is finished when less than this length in MI is left.
const FINISH_TOLERANCE: f64 = 1e-6;

/// Executes cloudlets of a VM using the MIPS share granted to the VM by its host.
///
/// The datacenter drives the scheduler by calling [`update_processing`](Self::update_processing) whenever the
/// simulation time advances or the MIPS share changes, and collects finished cloudlets with
/// [`take_finished`](Self::take_finished). All other methods are invoked right after a processing update,
/// so implementations may assume that the progress is accounted up to `time`.
pub trait CloudletScheduler {
    /// Starts cloudlet execution after the input files are transferred and returns the estimated delay until
    /// its completion (infinite if the VM has no CPU share yet).
    fn submit(&mut self, cloudlet: Cloudlet, file_transfer_time: f64, time: f64) -> f64;

    /// Accounts progress since the previous update with the previous share, then switches to the new share.
    ///
    /// Returns the delay until the next cloudlet completes or finishes its input transfer, if any cloudlet is running.
    fn update_processing(&mut self, time: f64, mips_share: &[f64]) -> Option<f64>;

    /// Removes cloudlet from execution and returns it with the canceled status.
    fn cancel(&mut self, cloudlet_id: u32, time: f64) -> Option<Cloudlet>;

    /// Suspends cloudlet execution, returns `false` if the cloudlet is not running.
    fn pause(&mut self, cloudlet_id: u32, time: f64) -> bool;

    /// Resumes paused cloudlet and returns the estimated delay until its completion.
    fn resume(&mut self, cloudlet_id: u32, time: f64) -> Option<f64>;

    /// Returns cloudlets finished since the previous call.
    fn take_finished(&mut self) -> Vec<Cloudlet>;

    /// Stops all running and paused cloudlets with the failed status and returns them.
    fn fail_all(&mut self, time: f64) -> Vec<Cloudlet>;

    fn cloudlet_status(&self, cloudlet_id: u32) -> Option<CloudletStatus>;

    /// Checks whether there are running or paused cloudlets.
    fn has_unfinished(&self) -> bool;

    fn running_count(&self) -> usize;

    /// Returns the fraction of the VM CPU requested by running cloudlets.
    fn requested_utilization(&self, time: f64) -> f64;
}

#[derive(Clone)]
struct Execution {
    cloudlet: Cloudlet,
    // progress starts when input files are transferred
    ready_at: f64,
}

/// Shares the VM CPU equally between all running cloudlets.
#[derive(Clone, Default)]
pub struct TimeSharedCloudletScheduler {
    running: Vec<Execution>,
    paused: Vec<Execution>,
    finished: Vec<Cloudlet>,
    processor: Processor,
    previous_time: f64,
}

impl TimeSharedCloudletScheduler {
    pub fn new() -> Self {
        Default::default()
    }

    // MIPS available to each Pe of a running cloudlet
    fn capacity(&self, time: f64) -> f64 {
        let demanded_pes: u32 = self
            .running
            .iter()
            .filter(|e| e.ready_at <= time)
            .map(|e| e.cloudlet.pes.max(1))
            .sum();
        self.processor.available_mips_per_core(demanded_pes)
    }

    // The span is split at the moments when cloudlets become ready, each part uses its own share.
    fn account_progress(&mut self, time: f64) {
        let mut from = self.previous_time;
        while time > from {
            let to = self
                .running
                .iter()
                .map(|e| e.ready_at)
                .filter(|&ready_at| ready_at > from && ready_at < time)
                .fold(time, f64::min);
            let capacity = self.capacity(from);
            for execution in self.running.iter_mut().filter(|e| e.ready_at <= from) {
                execution.cloudlet.add_progress(capacity * (to - from));
            }
            from = to;
        }
        self.previous_time = self.previous_time.max(time);

        let mut idx = 0;
        while idx < self.running.len() {
            if self.running[idx].cloudlet.remaining_length() <= FINISH_TOLERANCE {
                let mut cloudlet = self.running.remove(idx).cloudlet;
                cloudlet.set_status(CloudletStatus::Success, time);
                self.finished.push(cloudlet);
            } else {
                idx += 1;
            }
        }
    }

    fn estimate(&self, execution: &Execution, time: f64) -> f64 {
        let capacity = self.capacity(time.max(execution.ready_at));
        if capacity <= 0. {
            return f64::INFINITY;
        }
        (execution.ready_at - time).max(0.) + execution.cloudlet.remaining_length() / capacity
    }

    /// Returns the delay until the next cloudlet completes or starts, a started cloudlet changes the share.
    fn next_finish_delay(&self, time: f64) -> Option<f64> {
        let starts = self
            .running
            .iter()
            .filter(|e| e.ready_at > time)
            .map(|e| e.ready_at - time);
        self.running
            .iter()
            .map(|e| self.estimate(e, time))
            .chain(starts)
            .filter(|delay| delay.is_finite())
            .min_by(|a, b| a.total_cmp(b))
    }
}

impl CloudletScheduler for TimeSharedCloudletScheduler {
    fn submit(&mut self, mut cloudlet: Cloudlet, file_transfer_time: f64, time: f64) -> f64 {
        self.account_progress(time);
        cloudlet.set_status(CloudletStatus::InExec, time);
        self.running.push(Execution {
            cloudlet,
            ready_at: time + file_transfer_time.max(0.),
        });
        let last = &self.running[self.running.len() - 1];
        self.estimate(last, time)
    }

    fn update_processing(&mut self, time: f64, mips_share: &[f64]) -> Option<f64> {
        self.account_progress(time);
        self.processor = Processor::from_mips_share(mips_share);
        self.next_finish_delay(time)
    }

    fn cancel(&mut self, cloudlet_id: u32, time: f64) -> Option<Cloudlet> {
        self.account_progress(time);
        let execution = if let Some(pos) = self.running.iter().position(|e| e.cloudlet.id == cloudlet_id) {
            self.running.remove(pos)
        } else {
            let pos = self.paused.iter().position(|e| e.cloudlet.id == cloudlet_id)?;
            self.paused.remove(pos)
        };
        let mut cloudlet = execution.cloudlet;
        cloudlet.set_status(CloudletStatus::Canceled, time);
        Some(cloudlet)
    }

    fn pause(&mut self, cloudlet_id: u32, time: f64) -> bool {
        self.account_progress(time);
        match self.running.iter().position(|e| e.cloudlet.id == cloudlet_id) {
            Some(pos) => {
                let mut execution = self.running.remove(pos);
                execution.cloudlet.set_status(CloudletStatus::Paused, time);
                self.paused.push(execution);
                true
            }
            None => false,
        }
    }

    fn resume(&mut self, cloudlet_id: u32, time: f64) -> Option<f64> {
        self.account_progress(time);
        let pos = self.paused.iter().position(|e| e.cloudlet.id == cloudlet_id)?;
        let mut execution = self.paused.remove(pos);
        execution.cloudlet.set_status(CloudletStatus::InExec, time);
        execution.ready_at = execution.ready_at.max(time);
        self.running.push(execution);
        let last = &self.running[self.running.len() - 1];
        Some(self.estimate(last, time))
    }

    fn take_finished(&mut self) -> Vec<Cloudlet> {
        mem::take(&mut self.finished)
    }

    fn fail_all(&mut self, time: f64) -> Vec<Cloudlet> {
        self.running
            .drain(..)
            .chain(self.paused.drain(..))
            .map(|e| {
                let mut cloudlet = e.cloudlet;
                cloudlet.set_status(CloudletStatus::Failed, time);
                cloudlet
            })
            .collect()
    }

    fn cloudlet_status(&self, cloudlet_id: u32) -> Option<CloudletStatus> {
        self.running
            .iter()
            .chain(self.paused.iter())
            .map(|e| &e.cloudlet)
            .chain(self.finished.iter())
            .find(|c| c.id == cloudlet_id)
            .map(|c| c.status())
    }

    fn has_unfinished(&self) -> bool {
        !self.running.is_empty() || !self.paused.is_empty()
    }

    fn running_count(&self) -> usize {
        self.running.len()
    }

    fn requested_utilization(&self, time: f64) -> f64 {
        let total: f64 = self.running.iter().map(|e| e.cloudlet.utilization(time)).sum();
        total.min(1.)
    }
}
