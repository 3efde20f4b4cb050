/// When a read with no active computation produces a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReportUntracked {
    /// Every untracked read is reported.
    #[default]
    Always,
    /// Only reads made while rendering an unconnected component are reported.
    InRender,
    /// Untracked reads are never reported.
    Never,
}

impl ReportUntracked {
    pub(crate) fn should_report(self, in_render: bool) -> bool {
        match self {
            ReportUntracked::Always => true,
            ReportUntracked::InRender => in_render,
            ReportUntracked::Never => false,
        }
    }
}

/// Settings of a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RuntimeConfig {
    pub(crate) report_untracked: ReportUntracked,
    pub(crate) skip_equal_writes: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            report_untracked: ReportUntracked::Always,
            skip_equal_writes: true,
        }
    }
}

impl RuntimeConfig {
    pub fn report_untracked(mut self, report: ReportUntracked) -> Self {
        self.report_untracked = report;
        self
    }

    /// Whether writing a scalar equal to the stored one notifies subscribers.
    pub fn skip_equal_writes(mut self, skip: bool) -> Self {
        self.skip_equal_writes = skip;
        self
    }

    pub fn untracked_reporting(&self) -> ReportUntracked {
        self.report_untracked
    }

    pub fn skips_equal_writes(&self) -> bool {
        self.skip_equal_writes
    }
}
