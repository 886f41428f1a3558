/*
 * Debug Information Module
 *
 * Per-frame metrics the viewer shows in its overlay and control panel.
 */

use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    pub fps: f32,
    pub frame_time: Duration,
    /// Fixed simulation steps run during the last viewer frame.
    pub steps_per_frame: usize,
    /// Wall time of the last simulation step.
    pub step_time: Duration,
    pub agent_count: usize,
    /// Agents whose pose was reset to the origin during the last step.
    pub contained: usize,
}
