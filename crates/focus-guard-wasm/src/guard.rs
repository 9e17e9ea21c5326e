//! 专注会话封装
//!
//! JS 侧在每帧检测回调中调用 `processLandmarks` 或 `processNoFace`，
//! 根据返回报告中的 `effect` 字段启动或停止报警音频。

use focus_guard::focus::{
    FocusConfig, FocusSession, FocusState, FrameInput, LandmarkFrame, SessionSummary, TickReport,
};
use focus_guard::FocusError;
use js_sys::Float64Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// 浏览器端专注监测器
///
/// 会话在 `start` 时创建，在 `stop` 时销毁；未启动时所有帧调用都会报错。
#[wasm_bindgen]
pub struct FocusGuard {
    config: FocusConfig,
    session: Option<FocusSession>,
}

#[wasm_bindgen]
impl FocusGuard {
    /// 创建监测器
    ///
    /// # 参数
    /// - `config`: 可选配置对象（camelCase 字段，可部分提供），
    ///   缺省时使用默认阈值
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<FocusGuard, JsError> {
        let config: FocusConfig = if config.is_undefined() || config.is_null() {
            FocusConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&e.to_string()))?
        };
        Self::with_config(config).map_err(to_js_error)
    }

    /// 开始新会话，状态重置为 FOCUSED，统计清零
    pub fn start(&mut self, timestamp: f64) -> Result<(), JsError> {
        self.start_session(timestamp).map_err(to_js_error)
    }

    /// 结束会话，返回会话摘要
    ///
    /// 若结束时处于 DISTRACTED，摘要中 `effect` 为 `stopAlarm`
    pub fn stop(&mut self, timestamp: f64) -> Result<JsValue, JsError> {
        let summary = self.stop_session(timestamp).map_err(to_js_error)?;
        to_js(&summary)
    }

    /// 处理一帧人脸关键点
    ///
    /// # 参数
    /// - `landmarks`: 扁平坐标 `Float64Array` `[x0, y0, z0, x1, y1, z1, ...]`，
    ///   至少 478 个点，x/y 含 NaN 时报错
    /// - `timestamp`: 当前时间戳（毫秒）
    #[wasm_bindgen(js_name = "processLandmarks")]
    pub fn process_landmarks(
        &mut self,
        landmarks: &Float64Array,
        timestamp: f64,
    ) -> Result<JsValue, JsError> {
        let coords = landmarks.to_vec();
        let report = self
            .landmarks_report(&coords, timestamp)
            .map_err(to_js_error)?;
        to_js(&report)
    }

    /// 未检测到人脸时调用，按持续分心处理
    #[wasm_bindgen(js_name = "processNoFace")]
    pub fn process_no_face(&mut self, timestamp: f64) -> Result<JsValue, JsError> {
        let report = self
            .tick(&FrameInput::NoFace, timestamp)
            .map_err(to_js_error)?;
        to_js(&report)
    }

    /// 当前状态标签："FOCUSED" | "READING" | "WARNING" | "DISTRACTED"
    #[wasm_bindgen(js_name = "getState")]
    pub fn get_state(&self) -> String {
        self.state().as_str().to_string()
    }

    #[wasm_bindgen(js_name = "getDistractionCount")]
    pub fn get_distraction_count(&self) -> u32 {
        self.session
            .as_ref()
            .map(|s| s.stats().distraction_count)
            .unwrap_or(0)
    }

    /// 累计专注时间（毫秒），包含 READING
    #[wasm_bindgen(js_name = "getFocusedMs")]
    pub fn get_focused_ms(&self) -> f64 {
        self.session
            .as_ref()
            .map(|s| s.stats().total_focused_ms)
            .unwrap_or(0.0)
    }

    #[wasm_bindgen(js_name = "isRunning")]
    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }
}

impl FocusGuard {
    pub fn with_config(config: FocusConfig) -> Result<Self, FocusError> {
        config.validate()?;
        Ok(Self {
            config,
            session: None,
        })
    }

    pub fn start_session(&mut self, timestamp: f64) -> Result<(), FocusError> {
        if self.session.is_some() {
            return Err(FocusError::AlreadyRunning);
        }
        self.session = Some(FocusSession::start(self.config, timestamp)?);
        Ok(())
    }

    pub fn stop_session(&mut self, timestamp: f64) -> Result<SessionSummary, FocusError> {
        let session = self.session.take().ok_or(FocusError::NotRunning)?;
        Ok(session.stop(timestamp))
    }

    pub fn landmarks_report(
        &mut self,
        landmarks: &[f64],
        timestamp: f64,
    ) -> Result<TickReport, FocusError> {
        let frame = LandmarkFrame::from_flat(landmarks)?;
        self.tick(&FrameInput::Face(frame), timestamp)
    }

    pub fn tick(&mut self, input: &FrameInput, timestamp: f64) -> Result<TickReport, FocusError> {
        let session = self.session.as_mut().ok_or(FocusError::NotRunning)?;
        Ok(session.process(input, timestamp))
    }

    pub fn state(&self) -> FocusState {
        self.session
            .as_ref()
            .map(FocusSession::state)
            .unwrap_or_default()
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsError::new(&e.to_string()))
}

fn to_js_error(err: FocusError) -> JsError {
    JsError::new(&err.to_string())
}

#[cfg(test)]
mod tests {
    use focus_guard::focus::SideEffect;

    use super::*;

    #[test]
    fn frames_before_start_are_rejected() {
        let mut guard = FocusGuard::with_config(FocusConfig::default()).expect("guard");
        assert!(matches!(
            guard.tick(&FrameInput::NoFace, 0.0),
            Err(FocusError::NotRunning)
        ));
        assert_eq!(guard.state(), FocusState::Focused);
    }

    #[test]
    fn short_landmark_buffer_is_an_error() {
        let mut guard = FocusGuard::with_config(FocusConfig::default()).expect("guard");
        guard.start_session(0.0).expect("start");
        assert!(matches!(
            guard.landmarks_report(&[0.5; 300], 10.0),
            Err(FocusError::Frame(_))
        ));
    }

    #[test]
    fn nan_landmark_is_rejected_and_session_continues() {
        let mut guard = FocusGuard::with_config(FocusConfig::default()).expect("guard");
        guard.start_session(0.0).expect("start");
        let mut coords = vec![0.5; 478 * 3];
        coords[10 * 3 + 1] = f64::NAN;
        assert!(matches!(
            guard.landmarks_report(&coords, 100.0),
            Err(FocusError::Frame(_))
        ));
        let report = guard.tick(&FrameInput::NoFace, 200.0).expect("tick");
        assert_eq!(report.state, FocusState::Warning);
    }

    #[test]
    fn no_face_session_alarms_and_stops() {
        let mut guard = FocusGuard::with_config(FocusConfig::default()).expect("guard");
        guard.start_session(0.0).expect("start");
        let mut effects = Vec::new();
        for t in (0..=5000).step_by(250) {
            let report = guard.tick(&FrameInput::NoFace, t as f64).expect("tick");
            effects.extend(report.effect);
        }
        assert_eq!(effects, vec![SideEffect::TriggerAlarm]);
        assert_eq!(guard.get_distraction_count(), 1);

        let summary = guard.stop_session(5500.0).expect("stop");
        assert_eq!(summary.effect, Some(SideEffect::StopAlarm));
        assert!(!guard.is_running());
        assert_eq!(guard.get_state(), "FOCUSED");
    }

    #[test]
    fn flat_neutral_frame_is_focused() {
        let mut guard = FocusGuard::with_config(FocusConfig::default()).expect("guard");
        guard.start_session(0.0).expect("start");
        // all points coincide: every metric falls back to its neutral value
        let report = guard.landmarks_report(&[0.5; 478 * 3], 100.0).expect("report");
        assert_eq!(report.state, FocusState::Focused);
        assert_eq!(guard.get_focused_ms(), 100.0);
    }
}
