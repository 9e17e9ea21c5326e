//! 专注监测 WASM 绑定
//!
//! 将 `focus-guard` 的会话状态机编译为 WebAssembly，供浏览器端在
//! MediaPipe FaceLandmarker 的每帧回调中调用。摄像头、模型推理、
//! DOM 渲染与音频播放都由 JS 宿主负责，本库只返回状态与副作用。
//!
//! ## 模块
//! - `guard`: `FocusGuard` 会话封装

pub mod guard;

pub use guard::FocusGuard;
