use serde::Serialize;

/// Identifier of a host within its datacenter.
pub type HostId = u32;

/// Outcome of searching a host for a VM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PlacementResult {
    Placed(HostId),
    NoSuitableHost,
}

impl PlacementResult {
    pub fn host(&self) -> Option<HostId> {
        match self {
            PlacementResult::Placed(host) => Some(*host),
            PlacementResult::NoSuitableHost => None,
        }
    }

    pub fn is_placed(&self) -> bool {
        matches!(self, PlacementResult::Placed(_))
    }
}

impl From<Option<HostId>> for PlacementResult {
    fn from(host: Option<HostId>) -> Self {
        match host {
            Some(host) => PlacementResult::Placed(host),
            None => PlacementResult::NoSuitableHost,
        }
    }
}
