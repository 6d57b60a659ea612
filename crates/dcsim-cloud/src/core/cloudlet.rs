//! Cloudlet: a unit of work executed inside a VM.

use serde::Serialize;

use dcsim_core::Id;
use dcsim_models::utilization::{FullUtilizationModel, UtilizationModel};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CloudletStatus {
    Created,
    Queued,
    InExec,
    Paused,
    Success,
    Canceled,
    Failed,
}

impl CloudletStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            CloudletStatus::Success | CloudletStatus::Canceled | CloudletStatus::Failed
        )
    }
}

/// Cloudlet characterized by its length in MI to execute on each of its Pes.
///
/// The utilization model defines which fraction of the VM CPU the cloudlet requests while running,
/// it does not change the execution speed.
#[derive(Clone, Serialize)]
pub struct Cloudlet {
    pub id: u32,
    /// Component which receives the cloudlet when it is finished.
    pub owner: Id,
    pub vm_id: u32,
    pub length: u64,
    pub pes: u32,
    pub required_files: Vec<String>,
    #[serde(skip)]
    pub utilization_model: Box<dyn UtilizationModel>,
    status: CloudletStatus,
    finished_length: f64,
    exec_start_time: Option<f64>,
    finish_time: Option<f64>,
}

impl Cloudlet {
    pub fn new(id: u32, owner: Id, vm_id: u32, length: u64, pes: u32) -> Self {
        Self {
            id,
            owner,
            vm_id,
            length,
            pes,
            required_files: Vec::new(),
            utilization_model: Box::new(FullUtilizationModel),
            status: CloudletStatus::Created,
            finished_length: 0.,
            exec_start_time: None,
            finish_time: None,
        }
    }

    pub fn with_utilization_model(mut self, model: Box<dyn UtilizationModel>) -> Self {
        self.utilization_model = model;
        self
    }

    pub fn with_required_files(mut self, files: Vec<String>) -> Self {
        self.required_files = files;
        self
    }

    pub fn status(&self) -> CloudletStatus {
        self.status
    }

    pub fn set_status(&mut self, status: CloudletStatus, time: f64) {
        if status == CloudletStatus::InExec && self.exec_start_time.is_none() {
            self.exec_start_time = Some(time);
        }
        if status.is_finished() {
            self.finish_time = Some(time);
        }
        self.status = status;
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Executed length in MI per Pe.
    pub fn finished_length(&self) -> f64 {
        self.finished_length
    }

    pub fn remaining_length(&self) -> f64 {
        (self.length as f64 - self.finished_length).max(0.)
    }

    pub(crate) fn add_progress(&mut self, length: f64) {
        self.finished_length = (self.finished_length + length).min(self.length as f64);
    }

    pub fn exec_start_time(&self) -> Option<f64> {
        self.exec_start_time
    }

    pub fn finish_time(&self) -> Option<f64> {
        self.finish_time
    }

    pub fn utilization(&self, time: f64) -> f64 {
        self.utilization_model.utilization(time)
    }
}
