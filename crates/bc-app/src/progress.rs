use bc_core::MemberYear;

#[derive(Debug, Clone, PartialEq)]
pub enum RunStage {
    LoadingConfig,
    FetchingObservations,
    FillingGaps,
    WritingForcing,
    BuildingSpecs,
    RunningEnsemble,
    MemberFinished { member: MemberYear, succeeded: bool },
    Aggregating,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LoadingConfig => "config",
            Self::FetchingObservations => "fetch",
            Self::FillingGaps => "fill",
            Self::WritingForcing => "write",
            Self::BuildingSpecs => "specs",
            Self::RunningEnsemble | Self::MemberFinished { .. } => "ensemble",
            Self::Aggregating => "aggregate",
            Self::Completed => "done",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnsembleProgress {
    pub members_done: usize,
    pub members_total: usize,
    pub members_failed: usize,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub ensemble: Option<EnsembleProgress>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            ensemble: None,
        }
    }
}
