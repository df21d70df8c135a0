// Offline audio engine
// Records every call and evaluates amplitude automation without an output device

use super::engine::{AudioEngine, EngineError, SoundRequest, SourceHandle, SourceId};
use std::collections::{BTreeMap, HashSet};

/// How a lane point is reached from the previous point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    /// Value jumps at the point's time
    Set,
    /// Value ramps linearly from the previous point
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanePoint {
    pub time: f64,
    pub value: f64,
    pub kind: PointKind,
}

/// Amplitude automation timeline for one source
///
/// Points are kept sorted by time; points sharing a time keep insertion
/// order, so the last one inserted wins.
#[derive(Debug, Clone, Default)]
pub struct AmplitudeLane {
    points: Vec<LanePoint>,
}

impl AmplitudeLane {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, point: LanePoint) {
        let index = self.points.partition_point(|p| p.time <= point.time);
        self.points.insert(index, point);
    }

    pub fn set_value_at(&mut self, value: f64, time: f64) {
        self.insert(LanePoint {
            time,
            value,
            kind: PointKind::Set,
        });
    }

    pub fn linear_ramp_to(&mut self, value: f64, time: f64) {
        self.insert(LanePoint {
            time,
            value,
            kind: PointKind::Linear,
        });
    }

    /// Remove points at or after `time`, keeping the curve unchanged up to `time`
    pub fn cancel_and_hold(&mut self, time: f64) {
        let held = self.value_at(time);
        self.points.retain(|p| p.time < time);
        self.linear_ramp_to(held, time);
    }

    /// Evaluate the lane (0.0 before the first point)
    pub fn value_at(&self, time: f64) -> f64 {
        let next = self.points.partition_point(|p| p.time <= time);
        let previous = next.checked_sub(1).map(|i| self.points[i]);

        match (previous, self.points.get(next)) {
            (Some(prev), Some(upcoming)) if upcoming.kind == PointKind::Linear => {
                let span = upcoming.time - prev.time;
                if span <= 0.0 {
                    upcoming.value
                } else {
                    let progress = (time - prev.time) / span;
                    prev.value + (upcoming.value - prev.value) * progress
                }
            }
            (Some(prev), _) => prev.value,
            (None, _) => 0.0,
        }
    }

    pub fn points(&self) -> &[LanePoint] {
        &self.points
    }
}

/// A call received by the offline engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Create {
        source: SourceId,
        request: SoundRequest,
        at: f64,
    },
    SetAmplitude {
        source: SourceId,
        value: f64,
        at: f64,
    },
    RampAmplitude {
        source: SourceId,
        value: f64,
        at: f64,
    },
    CancelAndHold {
        source: SourceId,
        at: f64,
    },
    Stop {
        source: SourceId,
        at: f64,
    },
}

/// Everything the engine knows about one source
#[derive(Debug, Clone)]
struct SourceRecord {
    request: SoundRequest,
    start: f64,
    stop: Option<f64>,
    lane: AmplitudeLane,
}

/// Audio engine without an output device
///
/// Used for tests and for rendering amplitude curves. Initialization can be
/// made to fail and individual pitches can be rejected to exercise error paths.
#[derive(Debug, Default)]
pub struct OfflineEngine {
    ready: bool,
    init_failure: Option<String>,
    rejected_pitches: HashSet<u8>,
    next_source: u64,
    calls: Vec<EngineCall>,
    sources: BTreeMap<SourceId, SourceRecord>,
}

impl OfflineEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose initialization fails with `reason` (autoplay blocked, no device...)
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            init_failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Make the next `initialize` calls fail, or succeed again with `None`
    pub fn set_init_failure(&mut self, reason: Option<String>) {
        self.init_failure = reason;
    }

    /// Refuse to create sources for this pitch
    pub fn reject_pitch(&mut self, pitch: u8) {
        self.rejected_pitches.insert(pitch);
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Created sources in creation order
    pub fn created(&self) -> Vec<(SourceId, SoundRequest, f64)> {
        self.sources
            .iter()
            .map(|(id, record)| (*id, record.request, record.start))
            .collect()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn amplitude_at(&self, id: SourceId, time: f64) -> Option<f64> {
        self.sources.get(&id).map(|record| record.lane.value_at(time))
    }

    pub fn stop_time(&self, id: SourceId) -> Option<f64> {
        self.sources.get(&id).and_then(|record| record.stop)
    }

    /// Sources started at or before `time` and not yet stopped
    pub fn sounding_at(&self, time: f64) -> Vec<SourceId> {
        self.sources
            .iter()
            .filter(|(_, record)| {
                record.start <= time && record.stop.is_none_or(|stop| time < stop)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn record_mut(&mut self, source: &SourceHandle) -> Result<&mut SourceRecord, EngineError> {
        self.sources
            .get_mut(&source.id())
            .ok_or(EngineError::UnknownSource(source.id()))
    }
}

impl AudioEngine for OfflineEngine {
    fn initialize(&mut self) -> Result<(), EngineError> {
        if let Some(reason) = &self.init_failure {
            return Err(EngineError::DeviceUnavailable(reason.clone()));
        }
        self.ready = true;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn create_source(
        &mut self,
        request: &SoundRequest,
        at: f64,
    ) -> Result<SourceHandle, EngineError> {
        if !self.ready {
            return Err(EngineError::NotInitialized);
        }
        if let Some(pitch) = request.voice.pitch() {
            if self.rejected_pitches.contains(&pitch) {
                return Err(EngineError::SourceRejected(format!("pitch {pitch}")));
            }
        }

        self.next_source += 1;
        let id = SourceId(self.next_source);
        self.sources.insert(
            id,
            SourceRecord {
                request: *request,
                start: at,
                stop: None,
                lane: AmplitudeLane::new(),
            },
        );
        self.calls.push(EngineCall::Create {
            source: id,
            request: *request,
            at,
        });
        Ok(SourceHandle::new(id))
    }

    fn set_amplitude_at(
        &mut self,
        source: &SourceHandle,
        value: f64,
        at: f64,
    ) -> Result<(), EngineError> {
        self.record_mut(source)?.lane.set_value_at(value, at);
        self.calls.push(EngineCall::SetAmplitude {
            source: source.id(),
            value,
            at,
        });
        Ok(())
    }

    fn ramp_amplitude_to(
        &mut self,
        source: &SourceHandle,
        value: f64,
        at: f64,
    ) -> Result<(), EngineError> {
        self.record_mut(source)?.lane.linear_ramp_to(value, at);
        self.calls.push(EngineCall::RampAmplitude {
            source: source.id(),
            value,
            at,
        });
        Ok(())
    }

    fn cancel_and_hold_at(&mut self, source: &SourceHandle, at: f64) -> Result<(), EngineError> {
        self.record_mut(source)?.lane.cancel_and_hold(at);
        self.calls.push(EngineCall::CancelAndHold {
            source: source.id(),
            at,
        });
        Ok(())
    }

    fn stop_source(&mut self, source: SourceHandle, at: f64) -> Result<(), EngineError> {
        self.record_mut(&source)?.stop = Some(at);
        self.calls.push(EngineCall::Stop {
            source: source.id(),
            at,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::Voice;
    use approx::assert_abs_diff_eq;

    fn tone(pitch: u8) -> SoundRequest {
        SoundRequest::new(Voice::Tone { pitch }, 1.0)
    }

    #[test]
    fn test_lane_linear_ramps() {
        let mut lane = AmplitudeLane::new();
        lane.set_value_at(0.0, 0.0);
        lane.linear_ramp_to(1.0, 1.0);
        lane.linear_ramp_to(0.5, 2.0);

        assert_eq!(lane.value_at(-1.0), 0.0);
        assert_abs_diff_eq!(lane.value_at(0.25), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(lane.value_at(1.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lane.value_at(1.5), 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(lane.value_at(10.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_lane_cancel_and_hold_keeps_curve() {
        let mut lane = AmplitudeLane::new();
        lane.set_value_at(0.0, 0.0);
        lane.linear_ramp_to(1.0, 1.0);

        lane.cancel_and_hold(0.4);

        // Curve before the cancel point is untouched
        assert_abs_diff_eq!(lane.value_at(0.2), 0.2, epsilon = 1e-12);
        // Value is held from the cancel point on
        assert_abs_diff_eq!(lane.value_at(0.4), 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(lane.value_at(5.0), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_set_points_at_same_time_last_wins() {
        let mut lane = AmplitudeLane::new();
        lane.set_value_at(0.0, 1.0);
        lane.set_value_at(1.0, 1.0);
        assert_eq!(lane.value_at(1.0), 1.0);
    }

    #[test]
    fn test_create_requires_initialization() {
        let mut engine = OfflineEngine::new();
        assert_eq!(
            engine.create_source(&tone(60), 0.0),
            Err(EngineError::NotInitialized)
        );

        engine.initialize().unwrap();
        assert!(engine.is_ready());
        assert!(engine.create_source(&tone(60), 0.0).is_ok());
    }

    #[test]
    fn test_failing_initialization() {
        let mut engine = OfflineEngine::failing("autoplay blocked");
        assert!(matches!(
            engine.initialize(),
            Err(EngineError::DeviceUnavailable(_))
        ));
        assert!(!engine.is_ready());

        engine.set_init_failure(None);
        assert!(engine.initialize().is_ok());
    }

    #[test]
    fn test_rejected_pitch() {
        let mut engine = OfflineEngine::new();
        engine.initialize().unwrap();
        engine.reject_pitch(61);

        assert!(matches!(
            engine.create_source(&tone(61), 0.0),
            Err(EngineError::SourceRejected(_))
        ));
        assert!(engine.create_source(&tone(60), 0.0).is_ok());
        assert_eq!(engine.source_count(), 1);
    }

    #[test]
    fn test_source_lifetime_and_render() {
        let mut engine = OfflineEngine::new();
        engine.initialize().unwrap();

        let handle = engine.create_source(&tone(69), 0.0).unwrap();
        let id = handle.id();
        engine.set_amplitude_at(&handle, 1.0, 0.0).unwrap();
        engine.stop_source(handle, 0.5).unwrap();

        assert_eq!(engine.sounding_at(0.25), vec![id]);
        assert!(engine.sounding_at(0.5).is_empty());
        assert_eq!(engine.stop_time(id), Some(0.5));
        assert_eq!(engine.amplitude_at(id, 0.25), Some(1.0));
    }

    #[test]
    fn test_unknown_source() {
        let mut engine = OfflineEngine::new();
        engine.initialize().unwrap();
        let bogus = SourceHandle::new(SourceId(42));
        assert_eq!(
            engine.set_amplitude_at(&bogus, 1.0, 0.0),
            Err(EngineError::UnknownSource(SourceId(42)))
        );
    }
}
